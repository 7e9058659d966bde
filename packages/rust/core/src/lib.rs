//! Site indexing and the caller-facing tool operations for wikiscribe.
//!
//! This crate ties the crawler's typed operations together into the
//! workflows a caller sees: [`WikiTools`] for single lookups with rerouting
//! and readable diagnostics, and [`index_site`] for the full shelf → book
//! tree.

pub mod indexer;
pub mod tools;

pub use indexer::{IndexFailure, IndexProgress, IndexReport, SilentProgress, index_site};
pub use tools::{ToolOutput, WikiTools};
