//! Page descriptors and the suspend/resume page-sequence protocol.
//!
//! A page sequence is a cooperative coroutine: it produces a finite, ordered
//! series of [`Page`] values, suspending after each one until the consumer
//! supplies the matching [`Reply`]. The very first resume carries no reply
//! and runs the sequence up to its first page (or straight to its ending).

use serde::{Deserialize, Serialize};

pub mod compose;

pub use compose::*;

/// A single externally-rendered unit, produced at one suspension point.
///
/// A `Tell` presents a passage with a single "next" interaction; a `Prompt`
/// presents a passage with one interaction per choice. Choices are an ordered
/// list of `(name, label)` pairs - the order they were declared in is the
/// order a renderer should present them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Page {
    /// A passage with no choices.
    Tell { passage: String },
    /// A passage plus a mapping from choice name to choice label.
    Prompt {
        passage: String,
        choices: Vec<(String, String)>,
    },
}

impl Page {
    /// Create a choice-less page.
    pub fn tell(passage: impl Into<String>) -> Self {
        Page::Tell {
            passage: passage.into(),
        }
    }

    /// Create a page offering the given choices.
    pub fn prompt(
        passage: impl Into<String>,
        choices: impl IntoIterator<Item = (String, String)>,
    ) -> Self {
        Page::Prompt {
            passage: passage.into(),
            choices: choices.into_iter().collect(),
        }
    }

    /// The passage of either page kind.
    pub fn passage(&self) -> &str {
        match self {
            Page::Tell { passage } => passage,
            Page::Prompt { passage, .. } => passage,
        }
    }

    /// The choice names offered by this page (empty for a `Tell`).
    pub fn choice_names(&self) -> Vec<&str> {
        match self {
            Page::Tell { .. } => Vec::new(),
            Page::Prompt { choices, .. } => {
                choices.iter().map(|(name, _)| name.as_str()).collect()
            }
        }
    }

    /// Rebuild this page with its passage replaced.
    pub fn with_passage(self, passage: impl Into<String>) -> Self {
        match self {
            Page::Tell { .. } => Page::Tell {
                passage: passage.into(),
            },
            Page::Prompt { choices, .. } => Page::Prompt {
                passage: passage.into(),
                choices,
            },
        }
    }
}

/// The resumption value fed back into a suspended sequence.
///
/// A `Tell` expects [`Reply::Told`]; a `Prompt` expects [`Reply::Chose`] with
/// one of the names present in its choices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// The unit acknowledgement of a `Tell` page.
    Told,
    /// The name of the choice taken on a `Prompt` page.
    Chose(String),
}

impl Reply {
    /// Convenience constructor for a choice reply.
    pub fn chose(name: impl Into<String>) -> Self {
        Reply::Chose(name.into())
    }
}

/// One step of a sequence: either the next page, or the terminal result.
#[derive(Debug, Clone, PartialEq)]
pub enum Step<E> {
    /// The sequence suspended after producing this page.
    Page(Page),
    /// The sequence completed with this value and accepts no further resume.
    Ending(E),
}

impl<E> Step<E> {
    /// True once the sequence has produced its terminal value.
    pub fn is_ending(&self) -> bool {
        matches!(self, Step::Ending(_))
    }
}

/// A cooperative, single-threaded page coroutine.
///
/// Contract: the first call passes `reply = None`; every later call passes
/// the reply matching the page last produced. Resuming after [`Step::Ending`]
/// or answering a prompt with an unrecognised choice name is a programmer
/// error and panics.
pub trait PageSequence<E = ()> {
    /// Advance to the next suspension point or the ending.
    fn resume(&mut self, reply: Option<Reply>) -> Step<E>;
}

/// An owned, type-erased page sequence.
pub type BoxedSequence<E = ()> = Box<dyn PageSequence<E>>;

impl<E, S: PageSequence<E> + ?Sized> PageSequence<E> for Box<S> {
    fn resume(&mut self, reply: Option<Reply>) -> Step<E> {
        (**self).resume(reply)
    }
}
