//! Typed wiki operations: fetch a URL and run the matching extractor.

use tracing::{info, instrument};
use url::Url;

use wikiscribe_shared::{
    BookEntry, Result, SearchHit, ShelfEntry, ShelfListing, Tool, WikiConfig, WikiError,
};

use crate::extractors;
use crate::fetcher::Fetcher;
use crate::router::{Route, Router};

/// Output of whichever extractor a [`Route`] selected.
#[derive(Debug, Clone)]
pub enum Extracted {
    Shelves(ShelfListing),
    Books(Vec<BookEntry>),
    Page(String),
}

/// A routed extraction: which extractor ran, and what it returned.
#[derive(Debug, Clone)]
pub struct Dispatched {
    pub tool_used: Tool,
    pub result: Extracted,
}

/// Fetcher, router and configuration bundled for one wiki. Cheap to clone.
#[derive(Debug, Clone)]
pub struct WikiClient {
    config: WikiConfig,
    fetcher: Fetcher,
    router: Router,
}

impl WikiClient {
    /// Create a client for the configured wiki.
    pub fn new(config: WikiConfig) -> Result<Self> {
        let fetcher = Fetcher::new(&config)?;
        let router = Router::new(&config.base_url);
        Ok(Self {
            config,
            fetcher,
            router,
        })
    }

    pub fn config(&self) -> &WikiConfig {
        &self.config
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    /// Classify a URL against this wiki's patterns.
    pub fn classify(&self, url: &str) -> Route {
        self.router.classify(url)
    }

    /// Fetch a shelf listing.
    #[instrument(skip(self), fields(url = %url))]
    pub async fn get_shelves(&self, url: &Url) -> Result<ShelfListing> {
        let body = self.fetcher.fetch(url).await?.into_success()?;
        extractors::parse_shelves(&body, url, &self.router)
    }

    /// Fetch a shelf listing, keeping the cards in document order.
    #[instrument(skip(self), fields(url = %url))]
    pub async fn shelf_cards(&self, url: &Url) -> Result<Vec<ShelfEntry>> {
        let body = self.fetcher.fetch(url).await?.into_success()?;
        extractors::parse_shelf_cards(&body, url, &self.router)
    }

    /// Fetch a book's page list.
    #[instrument(skip(self), fields(url = %url))]
    pub async fn list_books(&self, url: &Url) -> Result<Vec<BookEntry>> {
        let body = self.fetcher.fetch(url).await?.into_success()?;
        extractors::parse_books(&body, url, &self.router)
    }

    /// Fetch a page and convert its content to Markdown.
    #[instrument(skip(self), fields(url = %url))]
    pub async fn read_page(&self, url: &Url) -> Result<String> {
        let body = self.fetcher.fetch(url).await?.into_success()?;
        extractors::parse_page(&body, url)
    }

    /// Run a full-text search.
    #[instrument(skip(self))]
    pub async fn search(&self, query: &str) -> Result<Vec<SearchHit>> {
        let url = self.search_url(query)?;
        let body = self.fetcher.fetch(&url).await?.into_success()?;
        extractors::parse_search(&body, &url, &self.router)
    }

    /// `{base}/search?term=<query>` with the query form-encoded.
    pub fn search_url(&self, query: &str) -> Result<Url> {
        let mut url = Url::parse(&self.config.search_url())
            .map_err(|e| WikiError::config(format!("invalid search URL: {e}")))?;
        url.query_pairs_mut().append_pair("term", query);
        Ok(url)
    }

    /// Invoke the single extractor matching `route`.
    pub async fn dispatch(&self, route: Route) -> Result<Dispatched> {
        let (tool_used, result) = match route {
            Route::Page(url) => (Tool::ReadPage, Extracted::Page(self.read_page(&url).await?)),
            Route::BookList(url) => (Tool::ListBooks, Extracted::Books(self.list_books(&url).await?)),
            Route::Shelf(url) => (Tool::GetShelves, Extracted::Shelves(self.get_shelves(&url).await?)),
            Route::Unroutable(url) => return Err(WikiError::Unroutable { url }),
        };

        info!(tool = %tool_used, "dispatched");

        Ok(Dispatched { tool_used, result })
    }

    /// Classify `url` and dispatch it.
    pub async fn dispatch_url(&self, url: &str) -> Result<Dispatched> {
        self.dispatch(self.classify(url)).await
    }
}
