//! URL classification for wiki links.
//!
//! Every entry point classifies its input here before touching the network.
//! Patterns are tried most-specific first so that a page URL, which also
//! starts with the book prefix, is never mistaken for a book listing.

use std::sync::LazyLock;

use regex::Regex;
use url::Url;

use wikiscribe_shared::Tool;

/// `/books/<book-slug>/page/<page-slug>`
static PAGE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^/books/[^/]+/page/[^/]+").expect("page regex"));

/// `/books/<book-slug>`
static BOOK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^/books/[^/]+").expect("book regex"));

/// Result of classifying a URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// A single page; handled by the page-content extractor.
    Page(Url),
    /// A book's page list; handled by the book-list extractor.
    BookList(Url),
    /// A shelf listing; handled by the shelf extractor.
    Shelf(Url),
    /// Outside the wiki or matching no known pattern. Holds the raw input.
    Unroutable(String),
}

impl Route {
    /// The extractor that handles this route, if any.
    pub fn tool(&self) -> Option<Tool> {
        match self {
            Route::Page(_) => Some(Tool::ReadPage),
            Route::BookList(_) => Some(Tool::ListBooks),
            Route::Shelf(_) => Some(Tool::GetShelves),
            Route::Unroutable(_) => None,
        }
    }
}

/// Classifies URLs relative to the configured wiki base.
#[derive(Debug, Clone)]
pub struct Router {
    base: Url,
    /// Base path without trailing slash (empty for a root base).
    prefix: String,
}

impl Router {
    pub fn new(base: &Url) -> Self {
        Self {
            base: base.clone(),
            prefix: base.path().trim_end_matches('/').to_string(),
        }
    }

    /// Classify an arbitrary URL string.
    pub fn classify(&self, raw: &str) -> Route {
        let raw = raw.trim();
        let Ok(url) = Url::parse(raw) else {
            return Route::Unroutable(raw.to_string());
        };
        let Some(path) = self.wiki_path(&url) else {
            return Route::Unroutable(raw.to_string());
        };

        if PAGE_RE.is_match(path) {
            Route::Page(url)
        } else if BOOK_RE.is_match(path) {
            Route::BookList(url)
        } else if path.starts_with("/shelves") {
            Route::Shelf(url)
        } else {
            Route::Unroutable(raw.to_string())
        }
    }

    /// Path of `url` relative to the wiki base, or `None` when `url` lies
    /// outside the base origin or path prefix.
    pub fn wiki_path<'a>(&self, url: &'a Url) -> Option<&'a str> {
        if url.origin() != self.base.origin() {
            return None;
        }
        let rest = url.path().strip_prefix(self.prefix.as_str())?;
        if rest.is_empty() || rest.starts_with('/') {
            Some(rest)
        } else {
            None
        }
    }

    /// `true` iff `url` is under `{base}/books/`.
    pub fn is_book_href(&self, url: &Url) -> bool {
        self.wiki_path(url)
            .is_some_and(|path| path.starts_with("/books/"))
    }

    /// Resolve a scraped `href` against the page it was found on.
    /// Returns `None` if the result leaves the wiki.
    pub fn resolve_href(&self, page_url: &Url, href: &str) -> Option<Url> {
        let mut resolved = page_url.join(href.trim()).ok()?;
        resolved.set_fragment(None);
        self.wiki_path(&resolved)?;
        Some(resolved)
    }
}
