//! # Interview Core
//!
//! Storyloom's tale/role coverage model. An interview is a fixed, ordered set
//! of independent narrative fragments ("tales"), each declaring the coverage
//! labels ("roles") its content can evidence. A priority scheduler decides
//! which tale to run next so that role coverage converges evenly with minimal
//! repetition, and a top-level page sequence drives select-then-run cycles
//! until every tale is exhausted.
//!
//! ## Core Components
//!
//! - **model**: roles, markers, per-tale state, and the partitioned store
//!   each tale's logic is scoped to
//! - **beats**: composable content combinators - `tale`, `tag`, `flag`,
//!   `flag_once`, `tag_once`, `branch`
//! - **scheduling**: the multi-key priority comparator over live tales
//! - **session**: the interview model (one root store, one partition per
//!   tale) and the top-level interview sequence
//!
//! ## Design Philosophy
//!
//! - **State-Driven**: which question gets asked next is decided entirely
//!   from current coverage state, never hard-coded ordering
//! - **Store-Routed**: all mutation goes through store edits keyed by tale
//!   id; a tale never holds a direct mutable reference to its own state
//! - **Fail-Fast**: declaring content that can contribute nothing to
//!   coverage (an empty role set) is rejected at construction

pub mod beats;
pub mod model;
pub mod scheduling;
pub mod session;

pub use beats::*;
pub use model::*;
pub use scheduling::*;
pub use session::*;
