//! Beat combinators: composable, stateful content units.
//!
//! A [`Beat`] is a factory that, handed a tale's store partition, produces a
//! fresh page sequence for one run. Content passed into a composition point
//! is either a bare passage or a nested beat - a two-case tagged variant,
//! dispatched explicitly. All coverage bookkeeping (tagging, flagging, entry
//! counting) is layered on by wrapping combinators, so plain content never
//! touches the store.

use std::rc::Rc;

use story_flow::{
    BoxedSequence, ChainSequence, DeferredSequence, HookedSequence, Page, PageSequence,
    PassageSequence, Reply, Step,
};

use crate::model::{
    flag_marker, mark_entered, mark_exited, tag_roles, Marker, Role, TaleStore,
};

/// Passage shown by every branch prompt.
pub const BRANCH_PASSAGE: &str = "Choose a question";

/// A composable coroutine-producing content unit, parametrized by a tale's
/// store. Cloning shares the factory.
#[derive(Clone)]
pub struct Beat {
    factory: Rc<dyn Fn(&TaleStore) -> BoxedSequence>,
}

impl Beat {
    /// Wrap a sequence factory as a beat.
    pub fn new(factory: impl Fn(&TaleStore) -> BoxedSequence + 'static) -> Self {
        Self {
            factory: Rc::new(factory),
        }
    }

    /// Start a fresh run of this beat against `store`.
    pub fn sequence(&self, store: &TaleStore) -> BoxedSequence {
        (self.factory)(store)
    }
}

impl std::fmt::Debug for Beat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Beat(..)")
    }
}

/// One item of composable content: a bare passage (shorthand for a single
/// choice-less page) or a nested beat.
#[derive(Debug, Clone)]
pub enum Content {
    Passage(String),
    Beat(Beat),
}

impl Content {
    /// Start a fresh sequence for this content against `store`.
    pub fn sequence(&self, store: &TaleStore) -> BoxedSequence {
        match self {
            Content::Passage(passage) => Box::new(PassageSequence::new(passage.clone())),
            Content::Beat(beat) => beat.sequence(store),
        }
    }
}

impl From<&str> for Content {
    fn from(passage: &str) -> Self {
        Content::Passage(passage.to_string())
    }
}

impl From<String> for Content {
    fn from(passage: String) -> Self {
        Content::Passage(passage)
    }
}

impl From<Beat> for Content {
    fn from(beat: Beat) -> Self {
        Content::Beat(beat)
    }
}

impl From<TaggingBeat> for Content {
    fn from(tagging: TaggingBeat) -> Self {
        Content::Beat(tagging.into_beat())
    }
}

impl From<FlaggingBeat> for Content {
    fn from(flagging: FlaggingBeat) -> Self {
        Content::Beat(flagging.into_beat())
    }
}

/// Delegate through each content item in order.
pub fn serve_content(store: &TaleStore, contents: &[Content]) -> ChainSequence {
    let children: Vec<BoxedSequence> = contents
        .iter()
        .map(|content| content.sequence(store))
        .collect();
    ChainSequence::new(children)
}

/// A named content unit with declared coverage roles.
///
/// Entering a tale bumps `invoked` and sets `active`; completing it clears
/// `active`. Everything else is added by wrapping combinators.
#[derive(Debug, Clone)]
pub struct Tale {
    roles: Vec<Role>,
    beat: Beat,
}

impl Tale {
    /// The tale's declared roles, in declaration order.
    pub fn roles(&self) -> &[Role] {
        &self.roles
    }

    pub fn beat(&self) -> &Beat {
        &self.beat
    }

    /// Start a fresh run of the tale against its store partition.
    pub fn sequence(&self, store: &TaleStore) -> BoxedSequence {
        self.beat.sequence(store)
    }
}

/// A beat annotated with the roles it tags on completion.
#[derive(Debug, Clone)]
pub struct TaggingBeat {
    roles: Vec<Role>,
    beat: Beat,
}

impl TaggingBeat {
    pub fn roles(&self) -> &[Role] {
        &self.roles
    }

    pub fn sequence(&self, store: &TaleStore) -> BoxedSequence {
        self.beat.sequence(store)
    }

    /// Drop the role annotation, keeping the behaviour.
    pub fn into_beat(self) -> Beat {
        self.beat
    }
}

/// A beat annotated with the one-shot marker it records when it runs.
#[derive(Debug, Clone)]
pub struct FlaggingBeat {
    marker: Marker,
    beat: Beat,
}

impl FlaggingBeat {
    pub fn marker(&self) -> Marker {
        self.marker
    }

    pub fn sequence(&self, store: &TaleStore) -> BoxedSequence {
        self.beat.sequence(store)
    }

    /// Drop the marker annotation, keeping the behaviour.
    pub fn into_beat(self) -> Beat {
        self.beat
    }
}

/// Validate a declared role set: non-empty, no duplicates, order preserved.
fn declared_roles(context: &str, roles: impl IntoIterator<Item = impl Into<Role>>) -> Vec<Role> {
    let mut declared: Vec<Role> = Vec::new();
    for role in roles {
        let role = role.into();
        if declared.contains(&role) {
            panic!("{context} declares role {role:?} twice");
        }
        declared.push(role);
    }
    if declared.is_empty() {
        panic!("{context} declared with an empty role set");
    }
    declared
}

/// Create a tale from its declared roles and content items.
///
/// Panics if `roles` is empty or contains duplicates - a tale that can never
/// contribute coverage is an authoring bug.
pub fn tale(
    roles: impl IntoIterator<Item = impl Into<Role>>,
    contents: Vec<Content>,
) -> Tale {
    let roles = declared_roles("tale", roles);
    let beat = Beat::new(move |store| {
        let entered = store.clone();
        let exited = store.clone();
        Box::new(
            HookedSequence::new(Box::new(serve_content(store, &contents)))
                .on_enter(move || mark_entered(&entered))
                .on_exit(move || mark_exited(&exited)),
        )
    });
    Tale { roles, beat }
}

/// Create a beat that delegates through `contents`, then unconditionally
/// unions `roles` into the tagged set on completion.
///
/// Panics if `roles` is empty or contains duplicates.
pub fn tag(
    roles: impl IntoIterator<Item = impl Into<Role>>,
    contents: Vec<Content>,
) -> TaggingBeat {
    let roles = declared_roles("tag", roles);
    let tagged = roles.clone();
    let beat = Beat::new(move |store| {
        let store = store.clone();
        let tagged = tagged.clone();
        let inner = Box::new(serve_content(&store, &contents));
        Box::new(HookedSequence::new(inner).on_exit(move || tag_roles(&store, &tagged)))
    });
    TaggingBeat { roles, beat }
}

/// Record `marker` the moment `content` begins, before its first page.
pub fn flag_with(content: impl Into<Content>, marker: Marker) -> FlaggingBeat {
    let content = content.into();
    let beat = Beat::new(move |store| {
        let flagged = store.clone();
        Box::new(
            HookedSequence::new(content.sequence(store))
                .on_enter(move || flag_marker(&flagged, marker)),
        )
    });
    FlaggingBeat { marker, beat }
}

/// [`flag_with`] using a freshly minted marker.
pub fn flag(content: impl Into<Content>) -> FlaggingBeat {
    flag_with(content, Marker::fresh())
}

/// Run `content` at most once per tale state: if `marker` is already
/// recorded, complete immediately with zero pages; otherwise flag and run.
pub fn flag_once_with(content: impl Into<Content>, marker: Marker) -> FlaggingBeat {
    let flagging = flag_with(content, marker);
    let once = flagging.beat.clone();
    let beat = Beat::new(move |store| {
        let store = store.clone();
        let once = once.clone();
        Box::new(DeferredSequence::new(move || {
            if store.read().has_flag(&marker) {
                None
            } else {
                Some(once.sequence(&store))
            }
        }))
    });
    FlaggingBeat { marker, beat }
}

/// [`flag_once_with`] using a freshly minted marker.
pub fn flag_once(content: impl Into<Content>) -> FlaggingBeat {
    flag_once_with(content, Marker::fresh())
}

/// At-most-once execution combined with role tagging:
/// `flag_once(tag(roles, contents))`.
pub fn tag_once(
    roles: impl IntoIterator<Item = impl Into<Role>>,
    contents: Vec<Content>,
) -> FlaggingBeat {
    flag_once(tag(roles, contents))
}

/// A branch point over question-labelled tagging beats.
///
/// At run time, options whose roles are all already tagged are eliminated.
/// With no live options left the branch completes immediately with zero
/// pages; otherwise it produces one prompt whose choice names are the
/// remaining question labels, then delegates to the chosen option.
///
/// Panics if `options` is empty.
pub fn branch(
    options: impl IntoIterator<Item = (impl Into<String>, TaggingBeat)>,
) -> Beat {
    let options: Vec<(String, TaggingBeat)> = options
        .into_iter()
        .map(|(question, beat)| (question.into(), beat))
        .collect();
    if options.is_empty() {
        panic!("branch declared with no options");
    }
    Beat::new(move |store| Box::new(BranchSequence::new(store.clone(), options.clone())))
}

enum BranchPhase {
    /// Not yet resumed; live options are computed on entry.
    Offering,
    /// The prompt is showing; only these question labels may be chosen.
    Asked { live: Vec<String> },
    /// Delegating to the chosen option's sequence.
    Delegating(BoxedSequence),
    Ended,
}

/// Runtime machine behind [`branch`].
pub struct BranchSequence {
    store: TaleStore,
    options: Vec<(String, TaggingBeat)>,
    phase: BranchPhase,
}

impl BranchSequence {
    fn new(store: TaleStore, options: Vec<(String, TaggingBeat)>) -> Self {
        Self {
            store,
            options,
            phase: BranchPhase::Offering,
        }
    }
}

impl PageSequence for BranchSequence {
    fn resume(&mut self, mut reply: Option<Reply>) -> Step<()> {
        loop {
            match &mut self.phase {
                BranchPhase::Offering => {
                    let state = self.store.read();
                    let live: Vec<String> = self
                        .options
                        .iter()
                        .filter(|(_, option)| !state.tagged_all(option.roles()))
                        .map(|(question, _)| question.clone())
                        .collect();
                    if live.is_empty() {
                        self.phase = BranchPhase::Ended;
                        return Step::Ending(());
                    }
                    let page = Page::prompt(
                        BRANCH_PASSAGE,
                        live.iter().map(|question| (question.clone(), question.clone())),
                    );
                    self.phase = BranchPhase::Asked { live };
                    return Step::Page(page);
                }
                BranchPhase::Asked { live } => {
                    let chosen = match reply.take() {
                        Some(Reply::Chose(name)) => name,
                        other => panic!("a prompt page expects Reply::Chose, got {other:?}"),
                    };
                    if !live.contains(&chosen) {
                        panic!("choice {chosen:?} is not offered by this prompt");
                    }
                    let sequence = match self
                        .options
                        .iter()
                        .find(|(question, _)| *question == chosen)
                    {
                        Some((_, option)) => option.sequence(&self.store),
                        None => panic!("choice {chosen:?} is not offered by this prompt"),
                    };
                    self.phase = BranchPhase::Delegating(sequence);
                }
                BranchPhase::Delegating(sequence) => match sequence.resume(reply.take()) {
                    Step::Page(page) => return Step::Page(page),
                    Step::Ending(()) => {
                        self.phase = BranchPhase::Ended;
                        return Step::Ending(());
                    }
                },
                BranchPhase::Ended => panic!("page sequence resumed after its ending"),
            }
        }
    }
}
