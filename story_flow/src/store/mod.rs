//! Reactive, copy-on-write state containers with keyed partitions.
//!
//! A [`Store`] holds one immutable snapshot of a value. Edits derive a new
//! snapshot from the current one and publish it atomically; subscribers are
//! never called back during the edit itself - they observe the change the
//! next time they are polled, so several edits issued before control yields
//! may be seen as a single combined update. This is exactly the semantics of
//! `tokio::sync::watch`, which backs both store kinds here.
//!
//! A [`Partition`] is a store derived from a parent plus a fixed keyed
//! projection: reads project the parent's field, edits rebuild the parent
//! snapshot with just that field replaced and publish through the parent, so
//! observers of either level see a consistent composite.

use std::sync::Arc;

use tokio::sync::watch;

/// Shared, copy-on-write state container.
///
/// Cloning a `Store` clones a handle to the same shared snapshot.
#[derive(Debug)]
pub struct Store<T> {
    publisher: Arc<watch::Sender<T>>,
}

impl<T> Clone for Store<T> {
    fn clone(&self) -> Self {
        Self {
            publisher: self.publisher.clone(),
        }
    }
}

impl<T: Clone> Store<T> {
    /// Create a store publishing `initial` as its first snapshot.
    pub fn new(initial: T) -> Self {
        let (publisher, _) = watch::channel(initial);
        Self {
            publisher: Arc::new(publisher),
        }
    }

    /// Clone the current snapshot.
    pub fn read(&self) -> T {
        self.publisher.borrow().clone()
    }

    /// Borrow the current snapshot without cloning it.
    pub fn with<R>(&self, inspect: impl FnOnce(&T) -> R) -> R {
        inspect(&self.publisher.borrow())
    }

    /// Derive a new snapshot by mutating a copy of the current one, then
    /// publish it atomically.
    ///
    /// If `mutate` panics the copy is discarded and the prior snapshot stays
    /// published; no notification fires.
    pub fn edit(&self, mutate: impl FnOnce(&mut T)) {
        let mut next = self.read();
        mutate(&mut next);
        tracing::trace!("store snapshot replaced");
        self.publisher.send_replace(next);
    }

    /// Subscribe to post-edit notifications.
    ///
    /// The receiver treats the snapshot current at subscription time as already seen;
    /// awaiting `changed` wakes on the next published edit.
    pub fn subscribe(&self) -> watch::Receiver<T> {
        self.publisher.subscribe()
    }
}

/// A fixed keyed view into a parent state: how to pull one field out and how
/// to push a replacement back in.
///
/// The projection must be stable for the life of the parent store, and
/// distinct partitions of one parent must not overlap.
pub trait Projection<Parent>: Clone {
    /// The projected field type.
    type Field: Clone;

    /// Project the field out of a parent snapshot.
    fn get(&self, parent: &Parent) -> Self::Field;

    /// Replace the field within a parent snapshot.
    fn put(&self, parent: &mut Parent, field: Self::Field);
}

/// A store scoped to one projected field of a parent [`Store`].
#[derive(Debug, Clone)]
pub struct Partition<P, L> {
    parent: Store<P>,
    lens: L,
}

impl<P, L> Partition<P, L>
where
    P: Clone,
    L: Projection<P>,
{
    /// Derive a partition of `parent` through `lens`.
    pub fn new(parent: Store<P>, lens: L) -> Self {
        Self { parent, lens }
    }

    /// The projection this partition reads and writes through.
    pub fn lens(&self) -> &L {
        &self.lens
    }

    /// Clone the current projected field.
    pub fn read(&self) -> L::Field {
        self.parent.with(|parent| self.lens.get(parent))
    }

    /// Edit the projected field; the parent snapshot is rebuilt with only
    /// this field replaced and published through the parent store, so both
    /// the partition's and the parent's subscribers observe the change.
    pub fn edit(&self, mutate: impl FnOnce(&mut L::Field)) {
        self.parent.edit(|parent| {
            let mut field = self.lens.get(parent);
            mutate(&mut field);
            self.lens.put(parent, field);
        });
    }

    /// Subscribe to changes, observed through the projection.
    pub fn subscribe(&self) -> PartitionWatch<P, L> {
        PartitionWatch {
            receiver: self.parent.subscribe(),
            lens: self.lens.clone(),
        }
    }
}

/// Subscription to a [`Partition`], yielding projected fields.
#[derive(Debug)]
pub struct PartitionWatch<P, L> {
    receiver: watch::Receiver<P>,
    lens: L,
}

impl<P, L> PartitionWatch<P, L>
where
    P: Clone,
    L: Projection<P>,
{
    /// Wait for the next published parent edit and project the field from it.
    ///
    /// Errs only when the parent store has been dropped entirely.
    pub async fn changed(&mut self) -> Result<L::Field, watch::error::RecvError> {
        self.receiver.changed().await?;
        let field = self.lens.get(&self.receiver.borrow_and_update());
        Ok(field)
    }

    /// Project the field from the latest snapshot without waiting.
    pub fn latest(&mut self) -> L::Field {
        self.lens.get(&self.receiver.borrow_and_update())
    }
}
