//! # Story Flow
//!
//! The foundation crate of Storyloom - a framework for ticking through an
//! interactive, choice-driven sequence of content, such as a Choose Your Own
//! Adventure story or a branching interview.
//!
//! ## Core Components
//!
//! - **page**: page descriptors (Tell/Prompt) and the cooperative
//!   suspend/resume protocol that produces them one at a time
//! - **store**: reactive, copy-on-write shared state with keyed partitions
//! - **drive**: the outer loop that proxies pages to a renderer and
//!   resumption values back into a sequence
//!
//! ## Design Philosophy
//!
//! - **Cooperative**: a sequence only ever advances when explicitly resumed,
//!   and suspends immediately after each page it produces
//! - **Composable**: sequences nest by delegation, so larger narratives are
//!   assembled from smaller ones without either side knowing the other
//! - **Renderer-agnostic**: passages are opaque to this crate; drawing pages
//!   and collecting choices belongs to the consumer

pub mod drive;
pub mod page;
pub mod store;

pub use drive::*;
pub use page::*;
pub use store::*;
