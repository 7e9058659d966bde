//! Shared types, error model, and configuration for wikiscribe.
//!
//! This crate is the foundation depended on by all other wikiscribe crates.
//! It provides:
//! - [`WikiError`]: the unified error type
//! - Domain types ([`ShelfEntry`], [`BookEntry`], [`SearchHit`], [`SiteIndex`])
//! - Configuration ([`AppConfig`], [`WikiConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, DEFAULT_USER_AGENT, WikiConfig, WikiSection, config_dir, config_file_path,
    init_config, load_config, load_config_from,
};
pub use error::{Result, WikiError};
pub use types::{
    BookEntry, MAX_SEARCH_HITS, SearchHit, ShelfEntry, ShelfListing, SiteIndex, Tool,
};
