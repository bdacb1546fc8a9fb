//! The outer loop that connects a page sequence to a renderer.
//!
//! A renderer is expected to present each page it is notified of: for a
//! `Tell`, one control that sends [`Reply::Told`]; for a `Prompt`, one
//! control per choice sending [`Reply::Chose`] with that choice's name. The
//! loop itself stays suspended between pages, pending exactly one external
//! event - the next reply.

use thiserror::Error;
use tokio::sync::mpsc;

use crate::page::{PageSequence, Reply, Step};

/// Errors from driving a sequence.
#[derive(Debug, Error)]
pub enum LoopError {
    /// The reply sender hung up while the sequence still had pages to show.
    #[error("reply channel closed before the sequence ended")]
    RepliesClosed,
}

/// Drive a fresh sequence to completion.
///
/// `make_sequence` is called once to build the sequence. `notify` is invoked
/// once per produced page and exactly once more with the terminal
/// [`Step::Ending`]. After each page, the loop awaits the next reply on
/// `replies` and resumes the sequence with it; no two resumptions ever
/// interleave. Abandonment is simply dropping the returned future.
pub async fn run_loop<E, S, F, N>(
    make_sequence: F,
    mut notify: N,
    replies: &mut mpsc::Receiver<Reply>,
) -> Result<E, LoopError>
where
    S: PageSequence<E>,
    F: FnOnce() -> S,
    N: FnMut(&Step<E>),
{
    let mut sequence = make_sequence();
    let mut reply: Option<Reply> = None;
    loop {
        let step = sequence.resume(reply.take());
        notify(&step);
        match step {
            Step::Page(_) => {
                let next = replies.recv().await.ok_or(LoopError::RepliesClosed)?;
                tracing::trace!(?next, "reply received");
                reply = Some(next);
            }
            Step::Ending(ending) => return Ok(ending),
        }
    }
}
