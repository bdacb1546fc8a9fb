//! Data model for tales, roles, and interview state.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod store;

pub use store::*;

/// A coverage label: one attribute a piece of content can evidence.
///
/// Roles are opaque, interview-defined strings with no imposed schema.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Role(String);

impl Role {
    /// Create a role from its label.
    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Role {
    fn from(label: &str) -> Self {
        Self::new(label)
    }
}

impl From<String> for Role {
    fn from(label: String) -> Self {
        Self(label)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a tale within its interview, fixed at declaration.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaleId(String);

impl TaleId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TaleId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for TaleId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for TaleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An opaque marker consumed by run-at-most-once wrappers.
///
/// A fresh marker is minted per wrapper at construction time, so the
/// once-guard holds across every run against the same state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Marker(Uuid);

impl Marker {
    /// Mint a marker distinct from every other.
    pub fn fresh() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for Marker {
    fn default() -> Self {
        Self::fresh()
    }
}

impl std::fmt::Display for Marker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Live execution and coverage record of one tale.
///
/// `flagged` and `tagged` are append-only and de-duplicated, preserving
/// first-appearance order; `invoked` never decreases. All mutation happens
/// through store edits during sequence execution.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaleState {
    /// How many times the tale's sequence has been entered.
    pub invoked: u32,
    /// True while the tale is mid-execution.
    pub active: bool,
    /// Markers recorded by one-shot wrappers.
    pub flagged: Vec<Marker>,
    /// Roles evidenced so far - kept within the tale's declared set.
    pub tagged: Vec<Role>,
}

impl TaleState {
    /// Whether a role has been evidenced.
    pub fn has_tag(&self, role: &Role) -> bool {
        self.tagged.contains(role)
    }

    /// Whether a one-shot marker has been recorded.
    pub fn has_flag(&self, marker: &Marker) -> bool {
        self.flagged.contains(marker)
    }

    /// Whether every one of `roles` has been evidenced.
    pub fn tagged_all(&self, roles: &[Role]) -> bool {
        roles.iter().all(|role| self.has_tag(role))
    }

    /// The subset of `roles` not yet evidenced, in declaration order.
    pub fn untagged(&self, roles: &[Role]) -> Vec<Role> {
        roles
            .iter()
            .filter(|role| !self.has_tag(role))
            .cloned()
            .collect()
    }
}

/// Aggregate state of a whole interview: one [`TaleState`] per tale id, in
/// declaration order. The id set is fixed when the interview model is built.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InterviewState {
    entries: Vec<(TaleId, TaleState)>,
}

impl InterviewState {
    /// Initialise default state for the given tale ids, in order.
    pub fn new(ids: impl IntoIterator<Item = TaleId>) -> Self {
        Self {
            entries: ids
                .into_iter()
                .map(|id| (id, TaleState::default()))
                .collect(),
        }
    }

    /// Look up one tale's state.
    pub fn get(&self, id: &TaleId) -> Option<&TaleState> {
        self.entries
            .iter()
            .find(|(entry_id, _)| entry_id == id)
            .map(|(_, state)| state)
    }

    /// Mutable lookup of one tale's state.
    pub fn get_mut(&mut self, id: &TaleId) -> Option<&mut TaleState> {
        self.entries
            .iter_mut()
            .find(|(entry_id, _)| entry_id == id)
            .map(|(_, state)| state)
    }

    /// Iterate entries in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&TaleId, &TaleState)> {
        self.entries.iter().map(|(id, state)| (id, state))
    }

    /// Iterate entries mutably, in declaration order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&TaleId, &mut TaleState)> {
        self.entries.iter_mut().map(|(id, state)| (&*id, state))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
