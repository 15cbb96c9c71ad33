//! Leaf utilities shared by every Docker language analyzer: URI/path
//! normalization, the per-URI debounce scheduler, and the error kinds
//! that flow out of document access.

#![cfg_attr(not(test), deny(clippy::unwrap_used))]

pub mod debounce;
pub mod error;
pub mod language;
pub mod line_index;
pub mod manager;
pub mod uri;

pub use debounce::Debouncer;
pub use error::CoreError;
pub use language::LanguageIdentifier;
pub use line_index::LineIndex;
pub use manager::{DocumentManager, DocumentParser, DocumentReader, Snapshot};
pub use uri::DocumentPath;
