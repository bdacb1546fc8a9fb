//! Composition machines for page sequences.
//!
//! Rust has no native resumable generators, so each composition primitive is
//! an explicit machine of suspended frames. Delegation is the one structural
//! idea shared by all of them: drive a nested sequence to completion,
//! re-emitting every page it produces and relaying every reply back in.

use std::collections::VecDeque;

use super::{BoxedSequence, Page, PageSequence, Reply, Step};

const RESUMED_AFTER_ENDING: &str = "page sequence resumed after its ending";

/// A sequence that shows a single choice-less passage, then ends.
///
/// This is the normal form of bare passage content: a shorthand passage is
/// legal wherever a sequence is, and means exactly one `Tell`.
pub struct PassageSequence {
    passage: Option<String>,
    done: bool,
}

impl PassageSequence {
    /// Create a sequence for one bare passage.
    pub fn new(passage: impl Into<String>) -> Self {
        Self {
            passage: Some(passage.into()),
            done: false,
        }
    }
}

impl PageSequence for PassageSequence {
    fn resume(&mut self, reply: Option<Reply>) -> Step<()> {
        if self.done {
            panic!("{RESUMED_AFTER_ENDING}");
        }
        match self.passage.take() {
            Some(passage) => Step::Page(Page::Tell { passage }),
            None => match reply {
                Some(Reply::Told) => {
                    self.done = true;
                    Step::Ending(())
                }
                other => panic!("a tell page expects Reply::Told, got {other:?}"),
            },
        }
    }
}

/// Runs a queue of sub-sequences one after another, by delegation.
///
/// Pages from the current child pass straight out; replies pass straight in.
/// When a child ends, the next is started fresh. An empty queue ends
/// immediately, producing zero pages.
pub struct ChainSequence {
    queue: VecDeque<BoxedSequence>,
    current: Option<BoxedSequence>,
    done: bool,
}

impl ChainSequence {
    /// Create a chain over the given children, run in order.
    pub fn new(children: impl IntoIterator<Item = BoxedSequence>) -> Self {
        Self {
            queue: children.into_iter().collect(),
            current: None,
            done: false,
        }
    }
}

impl PageSequence for ChainSequence {
    fn resume(&mut self, mut reply: Option<Reply>) -> Step<()> {
        if self.done {
            panic!("{RESUMED_AFTER_ENDING}");
        }
        loop {
            if let Some(current) = self.current.as_mut() {
                // the reply belongs to the child that produced the last page;
                // a freshly started child sees None
                match current.resume(reply.take()) {
                    Step::Page(page) => return Step::Page(page),
                    Step::Ending(()) => {
                        self.current = None;
                    }
                }
            } else if let Some(next) = self.queue.pop_front() {
                self.current = Some(next);
            } else {
                self.done = true;
                return Step::Ending(());
            }
        }
    }
}

type Hook = Box<dyn FnOnce()>;

/// Delegates to an inner sequence, running an action on entry and/or exit.
///
/// The entry hook runs at the first resume, before the inner sequence has
/// produced anything; the exit hook runs when the inner sequence completes.
pub struct HookedSequence {
    on_enter: Option<Hook>,
    inner: BoxedSequence,
    on_exit: Option<Hook>,
    done: bool,
}

impl HookedSequence {
    /// Wrap a sequence with no hooks attached yet.
    pub fn new(inner: BoxedSequence) -> Self {
        Self {
            on_enter: None,
            inner,
            on_exit: None,
            done: false,
        }
    }

    /// Run `hook` at the first resume, before the first page.
    pub fn on_enter(mut self, hook: impl FnOnce() + 'static) -> Self {
        self.on_enter = Some(Box::new(hook));
        self
    }

    /// Run `hook` when the inner sequence completes.
    pub fn on_exit(mut self, hook: impl FnOnce() + 'static) -> Self {
        self.on_exit = Some(Box::new(hook));
        self
    }
}

impl PageSequence for HookedSequence {
    fn resume(&mut self, reply: Option<Reply>) -> Step<()> {
        if self.done {
            panic!("{RESUMED_AFTER_ENDING}");
        }
        if let Some(enter) = self.on_enter.take() {
            enter();
        }
        match self.inner.resume(reply) {
            Step::Page(page) => Step::Page(page),
            Step::Ending(()) => {
                if let Some(exit) = self.on_exit.take() {
                    exit();
                }
                self.done = true;
                Step::Ending(())
            }
        }
    }
}

type Deferral = Box<dyn FnOnce() -> Option<BoxedSequence>>;

/// Decides at its first resume whether to run a sequence at all.
///
/// The deferral returns `None` to complete immediately with zero pages, or
/// `Some` sequence to delegate to. Used for run-at-most-once content.
pub struct DeferredSequence {
    deferral: Option<Deferral>,
    inner: Option<BoxedSequence>,
    done: bool,
}

impl DeferredSequence {
    /// Create a sequence whose body is chosen by `deferral` at first resume.
    pub fn new(deferral: impl FnOnce() -> Option<BoxedSequence> + 'static) -> Self {
        Self {
            deferral: Some(Box::new(deferral)),
            inner: None,
            done: false,
        }
    }
}

impl PageSequence for DeferredSequence {
    fn resume(&mut self, reply: Option<Reply>) -> Step<()> {
        if self.done {
            panic!("{RESUMED_AFTER_ENDING}");
        }
        if let Some(deferral) = self.deferral.take() {
            match deferral() {
                Some(sequence) => self.inner = Some(sequence),
                None => {
                    self.done = true;
                    return Step::Ending(());
                }
            }
        }
        let Some(inner) = self.inner.as_mut() else {
            panic!("{RESUMED_AFTER_ENDING}");
        };
        match inner.resume(reply) {
            Step::Page(page) => Step::Page(page),
            Step::Ending(()) => {
                self.done = true;
                Step::Ending(())
            }
        }
    }
}

/// Applies a transform to every page of an inner sequence.
///
/// Replies and the ending pass through untouched, so the inner sequence never
/// knows it is decorated. See [`decorate`].
pub struct DecoratedSequence<S, F> {
    inner: S,
    transform: F,
}

impl<E, S, F> PageSequence<E> for DecoratedSequence<S, F>
where
    S: PageSequence<E>,
    F: FnMut(Page) -> Page,
{
    fn resume(&mut self, reply: Option<Reply>) -> Step<E> {
        match self.inner.resume(reply) {
            Step::Page(page) => Step::Page((self.transform)(page)),
            Step::Ending(ending) => Step::Ending(ending),
        }
    }
}

/// Re-emit every page of `sequence` through `transform`, non-invasively.
pub fn decorate<E, S, F>(sequence: S, transform: F) -> DecoratedSequence<S, F>
where
    S: PageSequence<E>,
    F: FnMut(Page) -> Page,
{
    DecoratedSequence {
        inner: sequence,
        transform,
    }
}

/// Decorate a sequence so every passage gains a leading section heading.
pub fn prefix_passages<E, S>(
    sequence: S,
    prefix: impl Into<String>,
) -> DecoratedSequence<S, impl FnMut(Page) -> Page>
where
    S: PageSequence<E>,
{
    let prefix = prefix.into();
    decorate(sequence, move |page| {
        let passage = format!("{}{}", prefix, page.passage());
        page.with_passage(passage)
    })
}

/// Decorate a sequence so every passage gains a trailing footer.
pub fn suffix_passages<E, S>(
    sequence: S,
    suffix: impl Into<String>,
) -> DecoratedSequence<S, impl FnMut(Page) -> Page>
where
    S: PageSequence<E>,
{
    let suffix = suffix.into();
    decorate(sequence, move |page| {
        let passage = format!("{}{}", page.passage(), suffix);
        page.with_passage(passage)
    })
}
