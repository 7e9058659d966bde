//! Fetching, URL routing and content extraction for a BookStack-style wiki.
//!
//! This crate provides:
//! - [`Router`]: classifies URLs into shelf, book and page routes
//! - [`Fetcher`]: HTTP GET with timeout and redirect limits
//! - [`extractors`]: HTML → typed listings and Markdown
//! - [`WikiClient`]: the three above wired together for one wiki

pub mod client;
pub mod extractors;
pub mod fetcher;
pub mod router;

pub use client::{Dispatched, Extracted, WikiClient};
pub use extractors::{parse_books, parse_page, parse_search, parse_shelf_cards, parse_shelves};
pub use fetcher::{FetchedBody, Fetcher};
pub use router::{Route, Router};
