//! End-to-end drives of complete interviews, from authoring through the
//! reply loop to the terminal ending.

use interview_core::{
    branch, tag, tag_once, tale, Content, Interview, InterviewModel, InterviewSequence,
    TaleId, BRANCH_PASSAGE, CLOSING_PASSAGE, INTERVIEW_ENDING,
};
use story_flow::{run_loop, Page, PageSequence, Reply, Step};
use tokio::sync::mpsc;

/// An interview in the shape of a short biography session: one branch tale
/// offering two questions, plus a plain tale, with a shared intro each path
/// serves at most once.
fn biography() -> Interview {
    let intro = tag_once(
        ["interviewee"],
        vec!["Thanks for sitting down with us.".into()],
    );
    Interview::new(vec![
        (
            "career".into(),
            tale(
                ["interviewee", "astronaut", "baker"],
                vec![
                    intro.clone().into(),
                    branch([
                        (
                            "Have you been to space?",
                            tag(["astronaut"], vec!["I flew twice on the shuttle.".into()]),
                        ),
                        (
                            "Do you bake?",
                            tag(["baker"], vec!["Mostly sourdough these days.".into()]),
                        ),
                    ])
                    .into(),
                ],
            ),
        ),
        (
            "hobby".into(),
            tale(
                ["interviewee", "vlogger"],
                vec![
                    intro.into(),
                    tag(["vlogger"], vec!["I film every launch I attend.".into()]).into(),
                ],
            ),
        ),
    ])
    .expect("valid interview")
}

/// Drive a sequence synchronously, answering every prompt with its first
/// choice, and collect the pages served.
fn drive_first_choice(sequence: &mut InterviewSequence) -> (Vec<Page>, String) {
    let mut pages = Vec::new();
    let mut reply = None;
    loop {
        match sequence.resume(reply.take()) {
            Step::Page(page) => {
                reply = Some(match &page {
                    Page::Tell { .. } => Reply::Told,
                    Page::Prompt { choices, .. } => {
                        Reply::chose(choices[0].0.clone())
                    }
                });
                pages.push(page);
            }
            Step::Ending(value) => return (pages, value),
        }
    }
}

#[test]
fn test_interview_reaches_full_coverage() {
    let mut sequence = InterviewSequence::new(InterviewModel::new(biography()));
    let (pages, ending) = drive_first_choice(&mut sequence);
    assert_eq!(ending, INTERVIEW_ENDING);

    let passages: Vec<&str> = pages.iter().map(|page| page.passage()).collect();
    assert_eq!(passages.last(), Some(&CLOSING_PASSAGE));

    // every declared role is tagged somewhere once the interview ends
    let state = sequence.model().snapshot();
    let career = state.get(&TaleId::from("career")).expect("present");
    let hobby = state.get(&TaleId::from("hobby")).expect("present");
    assert!(career.has_tag(&"astronaut".into()));
    assert!(career.has_tag(&"baker".into()));
    assert!(career.has_tag(&"interviewee".into()));
    assert!(hobby.has_tag(&"vlogger".into()));
    assert!(hobby.has_tag(&"interviewee".into()));
}

#[test]
fn test_branch_tale_runs_once_per_pending_question() {
    let mut sequence = InterviewSequence::new(InterviewModel::new(biography()));
    let (pages, _) = drive_first_choice(&mut sequence);

    // the branch prompt appears twice: once per remaining question
    let prompts: Vec<&Page> = pages
        .iter()
        .filter(|page| matches!(page, Page::Prompt { .. }))
        .collect();
    assert_eq!(prompts.len(), 2);
    assert_eq!(prompts[0].passage(), BRANCH_PASSAGE);
    assert_eq!(
        prompts[0].choice_names(),
        vec!["Have you been to space?", "Do you bake?"]
    );
    // the answered question is eliminated on the second visit
    assert_eq!(prompts[1].choice_names(), vec!["Do you bake?"]);

    let state = sequence.model().snapshot();
    let career = state.get(&TaleId::from("career")).expect("present");
    assert_eq!(career.invoked, 2);
}

#[test]
fn test_shared_intro_served_at_most_once_per_tale() {
    let mut sequence = InterviewSequence::new(InterviewModel::new(biography()));
    let (pages, _) = drive_first_choice(&mut sequence);

    // career runs twice but carries its intro marker after the first run;
    // hobby keeps its own partition, so it greets once as well
    let greetings = pages
        .iter()
        .filter(|page| page.passage() == "Thanks for sitting down with us.")
        .count();
    assert_eq!(greetings, 2);
}

#[test]
fn test_tagged_roles_grow_monotonically() {
    let mut sequence = InterviewSequence::new(InterviewModel::new(biography()));
    let mut reply = None;
    let mut previous = 0usize;
    loop {
        let step = sequence.resume(reply.take());
        let tagged: usize = sequence
            .model()
            .snapshot()
            .iter()
            .map(|(_, state)| state.tagged.len())
            .sum();
        assert!(tagged >= previous, "tagged roles must never be removed");
        previous = tagged;
        match step {
            Step::Page(page) => {
                reply = Some(match &page {
                    Page::Tell { .. } => Reply::Told,
                    Page::Prompt { choices, .. } => Reply::chose(choices[0].0.clone()),
                });
            }
            Step::Ending(_) => break,
        }
    }
}

#[test]
fn test_state_snapshot_serialises() {
    let mut sequence = InterviewSequence::new(InterviewModel::new(biography()));
    let _ = drive_first_choice(&mut sequence);

    let state = sequence.model().snapshot();
    let json = serde_json::to_value(&state).expect("state serialises");
    let career = &json["entries"][0];
    assert_eq!(career[0], "career");
    assert_eq!(career[1]["invoked"], 2);
    assert_eq!(career[1]["active"], false);
}

#[tokio::test]
async fn test_reply_loop_plays_an_interview_to_its_ending() {
    let (replies_in, mut replies_out) = mpsc::channel(1);

    let mut transcript: Vec<String> = Vec::new();
    let ending = run_loop(
        || InterviewSequence::new(InterviewModel::new(biography())),
        |step| {
            if let Step::Page(page) = step {
                transcript.push(page.passage().to_string());
                let reply = match page {
                    Page::Tell { .. } => Reply::Told,
                    Page::Prompt { choices, .. } => Reply::chose(choices[0].0.clone()),
                };
                replies_in.try_send(reply).expect("room for one reply");
            }
        },
        &mut replies_out,
    )
    .await
    .expect("loop runs to the ending");

    assert_eq!(ending, INTERVIEW_ENDING);
    assert_eq!(transcript.last().map(String::as_str), Some(CLOSING_PASSAGE));
}

#[test]
fn test_single_tale_interview_is_a_plain_read() {
    let interview = Interview::new(vec![(
        "solo".into(),
        tale(
            ["poet"],
            vec![Content::from("Just one thing to say."), tag(["poet"], vec!["And I said it.".into()]).into()],
        ),
    )])
    .expect("valid interview");

    let mut sequence = InterviewSequence::new(InterviewModel::new(interview));
    let (pages, ending) = drive_first_choice(&mut sequence);
    let passages: Vec<&str> = pages.iter().map(|page| page.passage()).collect();
    assert_eq!(
        passages,
        vec!["Just one thing to say.", "And I said it.", CLOSING_PASSAGE]
    );
    assert_eq!(ending, INTERVIEW_ENDING);
}
