//! Core domain types for wiki content.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Maximum number of search hits returned by a single search.
pub const MAX_SEARCH_HITS: usize = 5;

// ---------------------------------------------------------------------------
// ShelfEntry
// ---------------------------------------------------------------------------

/// A shelf card scraped from a shelf listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShelfEntry {
    /// Card header; key within one listing.
    pub name: String,
    /// Card description text.
    pub description: String,
    /// Absolute link target.
    pub href: String,
    /// `true` when `href` lies under `{base}/books/`.
    pub is_book: bool,
    /// Parent shelf name, set only by the site indexer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Book pages, set only by the site indexer.
    #[serde(default)]
    pub items: Vec<BookEntry>,
}

/// Shelf extractor output, keyed by [`ShelfEntry::name`].
pub type ShelfListing = BTreeMap<String, ShelfEntry>;

/// Site indexer output, keyed by [`ShelfEntry::name`].
pub type SiteIndex = BTreeMap<String, ShelfEntry>;

// ---------------------------------------------------------------------------
// BookEntry
// ---------------------------------------------------------------------------

/// One page link within a book listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookEntry {
    pub title: String,
    pub description: String,
    pub href: String,
}

// ---------------------------------------------------------------------------
// SearchHit
// ---------------------------------------------------------------------------

/// A single search result card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub header: String,
    pub description: String,
    /// Trimmed, non-empty breadcrumb fragments in document order.
    pub breadcrumbs: Vec<String>,
    pub href: String,
}

// ---------------------------------------------------------------------------
// Tool
// ---------------------------------------------------------------------------

/// Names the operation that produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tool {
    ReadPage,
    ListBooks,
    GetShelves,
    Search,
    ListShelves,
}

impl Tool {
    /// Wire name, as used in `tool_used` fields.
    pub fn as_str(&self) -> &'static str {
        match self {
            Tool::ReadPage => "read_page",
            Tool::ListBooks => "list_books",
            Tool::GetShelves => "get_shelves",
            Tool::Search => "search",
            Tool::ListShelves => "list_shelves",
        }
    }
}

impl std::fmt::Display for Tool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn top_level_shelf_omits_category() {
        let entry = ShelfEntry {
            name: "Engineering".into(),
            description: "Eng team docs".into(),
            href: "https://wiki.example.com/shelves/engineering".into(),
            is_book: false,
            category: None,
            items: Vec::new(),
        };

        let json = serde_json::to_value(&entry).expect("serialize");
        assert!(json.get("category").is_none());
        assert_eq!(json["items"], serde_json::json!([]));
    }

    #[test]
    fn tool_wire_names_match_display() {
        for tool in [
            Tool::ReadPage,
            Tool::ListBooks,
            Tool::GetShelves,
            Tool::Search,
            Tool::ListShelves,
        ] {
            let json = serde_json::to_string(&tool).expect("serialize");
            assert_eq!(json, format!("\"{tool}\""));
        }
    }
}
