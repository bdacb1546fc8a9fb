//! The interview session: validated tale registry, shared state model, and
//! the top-level page sequence that drives tales to exhaustion.

use std::collections::HashMap;

use story_flow::{BoxedSequence, Page, PageSequence, Reply, Step, Store};
use thiserror::Error;

use crate::beats::Tale;
use crate::model::{InterviewState, TaleId, TaleLens, TaleState, TaleStore};
use crate::scheduling::rank_live_tales;

/// Spoken once every live tale has been exhausted, just before the ending.
pub const CLOSING_PASSAGE: &str = "Good, that covers everything we wanted to ask. Thank you!";

/// Terminal value of a completed interview sequence.
pub const INTERVIEW_ENDING: &str = "THE END";

/// A rejected interview declaration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InterviewError {
    #[error("an interview needs at least one tale")]
    NoTales,
    #[error("an interview needs at least one declared role")]
    NoRoles,
    #[error("tale id {0} is declared twice")]
    DuplicateTaleId(TaleId),
}

/// An ordered registry of tales, validated at construction.
#[derive(Clone)]
pub struct Interview {
    tales: Vec<(TaleId, Tale)>,
}

impl Interview {
    pub fn new(tales: Vec<(TaleId, Tale)>) -> Result<Self, InterviewError> {
        if tales.is_empty() {
            return Err(InterviewError::NoTales);
        }
        if tales.iter().all(|(_, tale)| tale.roles().is_empty()) {
            return Err(InterviewError::NoRoles);
        }
        for (position, (id, _)) in tales.iter().enumerate() {
            if tales[..position].iter().any(|(prior, _)| prior == id) {
                return Err(InterviewError::DuplicateTaleId(id.clone()));
            }
        }
        Ok(Self { tales })
    }

    /// Tales in declaration order.
    pub fn tales(&self) -> impl Iterator<Item = &(TaleId, Tale)> {
        self.tales.iter()
    }

    pub fn get(&self, id: &TaleId) -> Option<&Tale> {
        self.tales
            .iter()
            .find(|(tale_id, _)| tale_id == id)
            .map(|(_, tale)| tale)
    }

    pub fn len(&self) -> usize {
        self.tales.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tales.is_empty()
    }
}

/// The interview plus its shared reactive state: one root store holding
/// every tale's state, and one partition per tale handed to its sequences.
pub struct InterviewModel {
    interview: Interview,
    store: Store<InterviewState>,
    partitions: HashMap<TaleId, TaleStore>,
}

impl InterviewModel {
    pub fn new(interview: Interview) -> Self {
        let store = Store::new(InterviewState::new(
            interview.tales().map(|(id, _)| id.clone()),
        ));
        let partitions = interview
            .tales()
            .map(|(id, tale)| {
                (
                    id.clone(),
                    TaleStore::new(
                        store.clone(),
                        TaleLens::new(id.clone(), tale.roles().to_vec()),
                    ),
                )
            })
            .collect();
        Self {
            interview,
            store,
            partitions,
        }
    }

    pub fn interview(&self) -> &Interview {
        &self.interview
    }

    /// The root store over the whole interview state.
    pub fn store(&self) -> &Store<InterviewState> {
        &self.store
    }

    /// The per-tale partition of the root store.
    pub fn partition(&self, id: &TaleId) -> Option<&TaleStore> {
        self.partitions.get(id)
    }

    /// A point-in-time copy of the whole interview state.
    pub fn snapshot(&self) -> InterviewState {
        self.store.read()
    }
}

enum SessionPhase {
    Selecting,
    Running {
        id: TaleId,
        sequence: BoxedSequence,
        pages: u32,
        before: TaleState,
    },
    Farewell,
    Ended,
}

/// The top-level sequence over a whole interview.
///
/// Repeatedly selects the highest-priority live tale, runs its sequence to
/// completion while proxying pages and replies, and once no tale is live
/// serves one closing page and ends with [`INTERVIEW_ENDING`].
pub struct InterviewSequence {
    model: InterviewModel,
    phase: SessionPhase,
}

impl InterviewSequence {
    pub fn new(model: InterviewModel) -> Self {
        Self {
            model,
            phase: SessionPhase::Selecting,
        }
    }

    /// The model, for observing state while the sequence runs.
    pub fn model(&self) -> &InterviewModel {
        &self.model
    }

    fn select(&self) -> Option<TaleId> {
        let state = self.model.snapshot();
        rank_live_tales(self.model.interview(), &state)
            .into_iter()
            .next()
    }
}

impl PageSequence<String> for InterviewSequence {
    fn resume(&mut self, mut reply: Option<Reply>) -> Step<String> {
        loop {
            match &mut self.phase {
                SessionPhase::Selecting => {
                    let Some(id) = self.select() else {
                        self.phase = SessionPhase::Farewell;
                        return Step::Page(Page::tell(CLOSING_PASSAGE));
                    };
                    tracing::debug!(tale = %id, "selected next tale");
                    let tale = self
                        .model
                        .interview()
                        .get(&id)
                        .unwrap_or_else(|| panic!("ranked tale {id} is not declared"));
                    let store = self
                        .model
                        .partition(&id)
                        .unwrap_or_else(|| panic!("ranked tale {id} has no partition"));
                    let before = store.read();
                    let sequence = tale.sequence(store);
                    self.phase = SessionPhase::Running {
                        id,
                        sequence,
                        pages: 0,
                        before,
                    };
                }
                SessionPhase::Running {
                    id,
                    sequence,
                    pages,
                    before,
                } => match sequence.resume(reply.take()) {
                    Step::Page(page) => {
                        *pages += 1;
                        return Step::Page(page);
                    }
                    Step::Ending(()) => {
                        let tale = self
                            .model
                            .interview()
                            .get(id)
                            .unwrap_or_else(|| panic!("running tale {id} is not declared"));
                        let after = self
                            .model
                            .partition(id)
                            .unwrap_or_else(|| panic!("running tale {id} has no partition"))
                            .read();
                        let progressed = *pages > 0
                            || after.tagged != before.tagged
                            || after.flagged != before.flagged;
                        if !progressed && !after.tagged_all(tale.roles()) {
                            panic!(
                                "tale {id} stays live but cannot make progress; \
                                 it served no pages and changed no tags or flags"
                            );
                        }
                        self.phase = SessionPhase::Selecting;
                    }
                },
                SessionPhase::Farewell => match reply.take() {
                    Some(Reply::Told) => {
                        self.phase = SessionPhase::Ended;
                        return Step::Ending(INTERVIEW_ENDING.to_string());
                    }
                    other => panic!("a tell page expects Reply::Told, got {other:?}"),
                },
                SessionPhase::Ended => panic!("interview sequence resumed after its ending"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::beats::{tag, tale};

    fn two_tale_interview() -> Interview {
        Interview::new(vec![
            (
                "space".into(),
                tale(
                    ["astronaut"],
                    vec![
                        "So you are an astronaut.".into(),
                        tag(["astronaut"], vec!["I flew to the moon.".into()]).into(),
                    ],
                ),
            ),
            (
                "cake".into(),
                tale(
                    ["baker"],
                    vec![tag(["baker"], vec!["I baked a wedding cake.".into()]).into()],
                ),
            ),
        ])
        .expect("valid interview")
    }

    fn drive(sequence: &mut InterviewSequence) -> (Vec<String>, String) {
        let mut passages = Vec::new();
        let mut reply = None;
        loop {
            match sequence.resume(reply.take()) {
                Step::Page(page) => {
                    passages.push(page.passage().to_string());
                    reply = Some(Reply::Told);
                }
                Step::Ending(value) => return (passages, value),
            }
        }
    }

    #[test]
    fn test_rejects_empty_interview() {
        let error = Interview::new(vec![]).err().expect("must be rejected");
        assert_eq!(error, InterviewError::NoTales);
    }

    #[test]
    fn test_rejects_duplicate_tale_ids() {
        let error = Interview::new(vec![
            ("space".into(), tale(["astronaut"], vec!["one".into()])),
            ("space".into(), tale(["baker"], vec!["two".into()])),
        ])
        .err()
        .expect("must be rejected");
        assert_eq!(error, InterviewError::DuplicateTaleId("space".into()));
    }

    #[test]
    fn test_lookup_by_id() {
        let interview = two_tale_interview();
        assert_eq!(interview.len(), 2);
        assert!(interview.get(&"space".into()).is_some());
        assert!(interview.get(&"teeth".into()).is_none());
    }

    #[test]
    fn test_model_partitions_every_tale() {
        let model = InterviewModel::new(two_tale_interview());
        assert!(model.partition(&"space".into()).is_some());
        assert!(model.partition(&"cake".into()).is_some());
        assert!(model.partition(&"teeth".into()).is_none());
        assert_eq!(model.snapshot().len(), 2);
    }

    #[test]
    fn test_interview_runs_every_tale_then_ends() {
        let mut sequence = InterviewSequence::new(InterviewModel::new(two_tale_interview()));
        let (passages, ending) = drive(&mut sequence);

        assert_eq!(
            passages,
            vec![
                "So you are an astronaut.",
                "I flew to the moon.",
                "I baked a wedding cake.",
                CLOSING_PASSAGE,
            ]
        );
        assert_eq!(ending, INTERVIEW_ENDING);

        let state = sequence.model().snapshot();
        let space = state.get(&"space".into()).expect("present");
        let cake = state.get(&"cake".into()).expect("present");
        assert_eq!(space.invoked, 1);
        assert_eq!(cake.invoked, 1);
        assert!(!space.active);
        assert!(!cake.active);
        assert!(space.has_tag(&"astronaut".into()));
        assert!(cake.has_tag(&"baker".into()));
    }

    #[test]
    fn test_empty_coverage_still_serves_closing_page() {
        // both roles pre-tagged, so no tale is ever live
        let model = InterviewModel::new(two_tale_interview());
        model.store().edit(|state| {
            if let Some(space) = state.get_mut(&"space".into()) {
                space.tagged = vec!["astronaut".into()];
            }
            if let Some(cake) = state.get_mut(&"cake".into()) {
                cake.tagged = vec!["baker".into()];
            }
        });

        let mut sequence = InterviewSequence::new(model);
        let (passages, ending) = drive(&mut sequence);
        assert_eq!(passages, vec![CLOSING_PASSAGE]);
        assert_eq!(ending, INTERVIEW_ENDING);
    }

    #[test]
    #[should_panic(expected = "cannot make progress")]
    fn test_unproductive_live_tale_panics() {
        // no pages and no tag: reselection would loop forever
        let interview = Interview::new(vec![(
            "silent".into(),
            tale(["astronaut"], Vec::new()),
        )])
        .expect("valid interview");
        let mut sequence = InterviewSequence::new(InterviewModel::new(interview));
        let _ = sequence.resume(None);
    }

    #[test]
    #[should_panic(expected = "expects Reply::Told")]
    fn test_closing_page_rejects_choice_reply() {
        let mut sequence = InterviewSequence::new(InterviewModel::new(two_tale_interview()));
        let mut reply = None;
        loop {
            match sequence.resume(reply.take()) {
                Step::Page(page) if page.passage() == CLOSING_PASSAGE => break,
                Step::Page(_) => reply = Some(Reply::Told),
                Step::Ending(_) => panic!("closing page never appeared"),
            }
        }
        let _ = sequence.resume(Some(Reply::chose("anything")));
    }

    #[test]
    #[should_panic(expected = "resumed after its ending")]
    fn test_resume_after_ending_panics() {
        let mut sequence = InterviewSequence::new(InterviewModel::new(two_tale_interview()));
        let _ = drive(&mut sequence);
        let _ = sequence.resume(Some(Reply::Told));
    }
}
