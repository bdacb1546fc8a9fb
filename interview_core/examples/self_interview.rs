//! A self-playing interview: every tell is acknowledged and every prompt is
//! answered with its first remaining choice, printing the transcript.
//!
//! Run with `RUST_LOG=debug` to watch tale selection and tagging decisions.

use interview_core::{branch, tag, tag_once, tale, Interview, InterviewModel, InterviewSequence};
use story_flow::{run_loop, Page, Reply, Step};
use tokio::sync::mpsc;

fn expedition() -> Interview {
    let intro = tag_once(
        ["interviewee"],
        vec!["Welcome back. Let's pick up where we left off.".into()],
    );
    Interview::new(vec![
        (
            "summit".into(),
            tale(
                ["interviewee", "climber", "photographer"],
                vec![
                    intro.clone().into(),
                    branch([
                        (
                            "What was the climb like?",
                            tag(
                                ["climber"],
                                vec!["The last ridge took us six hours.".into()],
                            ),
                        ),
                        (
                            "Did you get the shot?",
                            tag(
                                ["photographer"],
                                vec!["Sunrise over the glacier, first try.".into()],
                            ),
                        ),
                    ])
                    .into(),
                ],
            ),
        ),
        (
            "basecamp".into(),
            tale(
                ["interviewee", "cook"],
                vec![
                    intro.into(),
                    tag(
                        ["cook"],
                        vec!["Someone has to keep the stew going at altitude.".into()],
                    )
                    .into(),
                ],
            ),
        ),
    ])
    .expect("the expedition interview is well formed")
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let (replies_in, mut replies_out) = mpsc::channel(1);

    let ending = run_loop(
        || InterviewSequence::new(InterviewModel::new(expedition())),
        |step| {
            let Step::Page(page) = step else {
                return;
            };
            let reply = match page {
                Page::Tell { passage } => {
                    println!("  {passage}");
                    Reply::Told
                }
                Page::Prompt { passage, choices } => {
                    println!("? {passage}");
                    for (name, _) in choices {
                        println!("    - {name}");
                    }
                    let (first, _) = &choices[0];
                    println!("> {first}");
                    Reply::chose(first.clone())
                }
            };
            replies_in
                .try_send(reply)
                .expect("one reply slot per page");
        },
        &mut replies_out,
    )
    .await
    .expect("the reply channel stays open");

    println!("{ending}");
}
