//! Caller-facing operations.
//!
//! Every operation resolves to a [`ToolOutput`]: either data, or a short
//! message the caller can act on. Nothing here returns an error. Each
//! operation classifies its URL first; a URL of a different known shape is
//! rerouted to the matching extractor, and an unknown one gets a hint naming
//! the path it should start with.

use serde::Serialize;
use tracing::{info, instrument, warn};

use wikiscribe_crawler::{Extracted, Route, WikiClient};
use wikiscribe_shared::{
    BookEntry, Result, SearchHit, ShelfListing, SiteIndex, Tool, WikiConfig, WikiError,
};

use crate::indexer::{self, IndexProgress, SilentProgress};

pub const NOT_FOUND_MESSAGE: &str = "Wrong URL. Page not found.";
pub const HTTP_ERROR_MESSAGE: &str = "Page not found.";
pub const FETCH_ERROR_MESSAGE: &str = "Could not reach the wiki. Try again later.";
pub const PARSE_ERROR_MESSAGE: &str = "Could not read the page structure, try another URL.";
pub const SEARCH_FAILED_MESSAGE: &str = "Search failed, try again later.";

/// Everything an operation can hand back. Serializes as plain data.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ToolOutput {
    Shelves(ShelfListing),
    Books(Vec<BookEntry>),
    Page(String),
    Hits(Vec<SearchHit>),
    Index(SiteIndex),
    /// The URL belonged to another operation, which ran instead.
    Rerouted {
        message: String,
        tool_used: Tool,
        result: Box<ToolOutput>,
    },
    /// A diagnostic in place of data.
    Message(String),
}

impl ToolOutput {
    /// The diagnostic text, if this output is one.
    pub fn as_message(&self) -> Option<&str> {
        match self {
            ToolOutput::Message(msg) => Some(msg),
            _ => None,
        }
    }

    fn rerouted(tool_used: Tool, result: ToolOutput) -> Self {
        ToolOutput::Rerouted {
            message: format!("Rerouted to correct tool: {tool_used}"),
            tool_used,
            result: Box::new(result),
        }
    }
}

impl From<Extracted> for ToolOutput {
    fn from(extracted: Extracted) -> Self {
        match extracted {
            Extracted::Shelves(listing) => ToolOutput::Shelves(listing),
            Extracted::Books(books) => ToolOutput::Books(books),
            Extracted::Page(markdown) => ToolOutput::Page(markdown),
        }
    }
}

/// The operation set bound to one wiki.
#[derive(Debug, Clone)]
pub struct WikiTools {
    client: WikiClient,
}

impl WikiTools {
    pub fn new(client: WikiClient) -> Self {
        Self { client }
    }

    pub fn from_config(config: WikiConfig) -> Result<Self> {
        Ok(Self::new(WikiClient::new(config)?))
    }

    pub fn client(&self) -> &WikiClient {
        &self.client
    }

    /// Open any wiki URL with whichever extractor matches it.
    #[instrument(skip(self))]
    pub async fn route(&self, url: &str) -> ToolOutput {
        let route = self.client.classify(url);
        if matches!(route, Route::Unroutable(_)) {
            return self.unroutable(Tool::GetShelves, "try start with");
        }
        match self.client.dispatch(route).await {
            Ok(dispatched) => dispatched.result.into(),
            Err(e) => describe(&e),
        }
    }

    /// Read one page as Markdown.
    #[instrument(skip(self), fields(tool = %Tool::ReadPage))]
    pub async fn read_page(&self, url: &str) -> ToolOutput {
        match self.client.classify(url) {
            Route::Page(url) => settle(self.client.read_page(&url).await.map(ToolOutput::Page)),
            other => self.reroute_or_hint(Tool::ReadPage, other).await,
        }
    }

    /// List a book's pages.
    #[instrument(skip(self), fields(tool = %Tool::ListBooks))]
    pub async fn list_books(&self, url: &str) -> ToolOutput {
        match self.client.classify(url) {
            Route::BookList(url) => {
                settle(self.client.list_books(&url).await.map(ToolOutput::Books))
            }
            other => self.reroute_or_hint(Tool::ListBooks, other).await,
        }
    }

    /// List a shelf's entries; `None` lists the root shelves.
    #[instrument(skip(self), fields(tool = %Tool::GetShelves))]
    pub async fn get_shelves(&self, url: Option<&str>) -> ToolOutput {
        let url = url
            .map(str::to_string)
            .unwrap_or_else(|| self.client.config().shelves_url());

        match self.client.classify(&url) {
            Route::Shelf(url) => {
                settle(self.client.get_shelves(&url).await.map(ToolOutput::Shelves))
            }
            other => self.reroute_or_hint(Tool::GetShelves, other).await,
        }
    }

    /// Full-text search, at most five hits.
    #[instrument(skip(self), fields(tool = %Tool::Search))]
    pub async fn search(&self, query: &str) -> ToolOutput {
        match self.client.search(query).await {
            Ok(hits) => ToolOutput::Hits(hits),
            Err(e @ (WikiError::NotFound { .. } | WikiError::Http { .. })) => {
                warn!(error = %e, "search request failed");
                ToolOutput::Message(SEARCH_FAILED_MESSAGE.into())
            }
            Err(e) => describe(&e),
        }
    }

    /// Index every shelf and book on the site.
    pub async fn list_shelves(&self) -> ToolOutput {
        self.list_shelves_with(&SilentProgress).await
    }

    /// [`list_shelves`](Self::list_shelves) with a progress reporter.
    ///
    /// The output is the index alone. Shelves and books whose fetch failed
    /// are missing from it and logged at `warn`; callers that need the list
    /// of skipped URLs use [`index_site`](crate::index_site) directly.
    #[instrument(skip_all, fields(tool = %Tool::ListShelves))]
    pub async fn list_shelves_with(&self, progress: &dyn IndexProgress) -> ToolOutput {
        match indexer::index_site(&self.client, progress).await {
            Ok(report) => {
                if !report.errors.is_empty() {
                    warn!(skipped = report.errors.len(), "site index is partial");
                }
                ToolOutput::Index(report.index)
            }
            Err(e) => describe(&e),
        }
    }

    /// Run the extractor `route` belongs to and wrap it as rerouted, or hint
    /// at the path `tool` expects.
    async fn reroute_or_hint(&self, tool: Tool, route: Route) -> ToolOutput {
        if matches!(route, Route::Unroutable(_)) {
            return self.unroutable(tool, "must start with");
        }
        match self.client.dispatch(route).await {
            Ok(dispatched) => {
                info!(requested = %tool, used = %dispatched.tool_used, "rerouted");
                ToolOutput::rerouted(dispatched.tool_used, dispatched.result.into())
            }
            Err(e) => describe(&e),
        }
    }

    fn unroutable(&self, tool: Tool, verb: &str) -> ToolOutput {
        let config = self.client.config();
        let msg = match tool {
            Tool::ReadPage => format!(
                "Invalid URL, must be this pattern {}/books/*/page/*",
                config.base()
            ),
            Tool::ListBooks => format!("Invalid URL, {verb} {}", config.books_prefix()),
            Tool::GetShelves | Tool::Search | Tool::ListShelves => {
                format!("Invalid URL, {verb} {}", config.shelves_url())
            }
        };
        ToolOutput::Message(msg)
    }
}

fn settle(result: Result<ToolOutput>) -> ToolOutput {
    result.unwrap_or_else(|e| describe(&e))
}

/// Caller-facing text for an operation failure.
fn describe(err: &WikiError) -> ToolOutput {
    warn!(error = %err, "tool call failed");
    let msg = match err {
        WikiError::NotFound { .. } => NOT_FOUND_MESSAGE,
        WikiError::Http { .. } => HTTP_ERROR_MESSAGE,
        WikiError::Fetch { .. } | WikiError::Task(_) => FETCH_ERROR_MESSAGE,
        WikiError::Parse { .. } | WikiError::Conversion(_) => PARSE_ERROR_MESSAGE,
        other => return ToolOutput::Message(other.to_string()),
    };
    ToolOutput::Message(msg.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const PAGE_HTML: &str = r#"<html><body><div class="page-content"><h1>Title</h1><p>Body</p></div></body></html>"#;

    fn tools(server: &MockServer) -> WikiTools {
        WikiTools::from_config(WikiConfig::new(&server.uri()).unwrap()).unwrap()
    }

    async fn mount(server: &MockServer, at: &str, status: u16, body: &str) {
        Mock::given(method("GET"))
            .and(path(at))
            .respond_with(ResponseTemplate::new(status).set_body_string(body))
            .mount(server)
            .await;
    }

    /// Fails the test on drop if any request reaches the server.
    async fn forbid_requests(server: &MockServer) {
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn read_page_returns_markdown() {
        let server = MockServer::start().await;
        mount(&server, "/books/x/page/y", 200, PAGE_HTML).await;

        let out = tools(&server)
            .read_page(&format!("{}/books/x/page/y", server.uri()))
            .await;
        assert_eq!(out, ToolOutput::Page("# Title\n\nBody".into()));
    }

    #[tokio::test]
    async fn read_page_status_messages() {
        let server = MockServer::start().await;
        mount(&server, "/books/x/page/missing", 404, "").await;
        mount(&server, "/books/x/page/forbidden", 403, "").await;
        mount(&server, "/books/x/page/broken", 502, "").await;

        let tools = tools(&server);
        let base = server.uri();

        let out = tools.read_page(&format!("{base}/books/x/page/missing")).await;
        assert_eq!(out.as_message(), Some("Wrong URL. Page not found."));

        let out = tools.read_page(&format!("{base}/books/x/page/forbidden")).await;
        assert_eq!(out.as_message(), Some("Page not found."));

        let out = tools.read_page(&format!("{base}/books/x/page/broken")).await;
        assert_eq!(out.as_message(), Some("Page not found."));
    }

    #[tokio::test]
    async fn read_page_without_container_is_parse_message() {
        let server = MockServer::start().await;
        mount(&server, "/books/x/page/odd", 200, "<p>no container</p>").await;

        let out = tools(&server)
            .read_page(&format!("{}/books/x/page/odd", server.uri()))
            .await;
        assert_eq!(out.as_message(), Some(PARSE_ERROR_MESSAGE));
    }

    #[tokio::test]
    async fn unroutable_hints_make_no_requests() {
        let server = MockServer::start().await;
        forbid_requests(&server).await;

        let tools = tools(&server);
        let base = server.uri();
        let foreign = "https://elsewhere.example.org/books/x/page/y";

        assert_eq!(
            tools.route(foreign).await.as_message(),
            Some(format!("Invalid URL, try start with {base}/shelves").as_str())
        );
        assert_eq!(
            tools.get_shelves(Some(foreign)).await.as_message(),
            Some(format!("Invalid URL, must start with {base}/shelves").as_str())
        );
        assert_eq!(
            tools.list_books(foreign).await.as_message(),
            Some(format!("Invalid URL, must start with {base}/books/").as_str())
        );
        assert_eq!(
            tools.read_page(&format!("{base}/settings")).await.as_message(),
            Some(format!("Invalid URL, must be this pattern {base}/books/*/page/*").as_str())
        );
    }

    #[tokio::test]
    async fn route_opens_page_directly() {
        let server = MockServer::start().await;
        mount(&server, "/books/x/page/y", 200, PAGE_HTML).await;

        let out = tools(&server)
            .route(&format!("{}/books/x/page/y", server.uri()))
            .await;
        assert_eq!(out, ToolOutput::Page("# Title\n\nBody".into()));
    }

    #[tokio::test]
    async fn list_books_reroutes_page_url() {
        let server = MockServer::start().await;
        mount(&server, "/books/x/page/y", 200, PAGE_HTML).await;

        let out = tools(&server)
            .list_books(&format!("{}/books/x/page/y", server.uri()))
            .await;

        assert_eq!(
            out,
            ToolOutput::Rerouted {
                message: "Rerouted to correct tool: read_page".into(),
                tool_used: Tool::ReadPage,
                result: Box::new(ToolOutput::Page("# Title\n\nBody".into())),
            }
        );

        let json = serde_json::to_value(&out).unwrap();
        assert_eq!(json["message"], "Rerouted to correct tool: read_page");
        assert_eq!(json["tool_used"], "read_page");
        assert_eq!(json["result"], "# Title\n\nBody");
    }

    #[tokio::test]
    async fn read_page_reroutes_shelf_url() {
        let server = MockServer::start().await;
        mount(
            &server,
            "/shelves/eng",
            200,
            r#"<a class="grid-card" href="/books/eng"><div class="grid-card-content"><h2>Eng</h2><p>docs</p></div></a>"#,
        )
        .await;

        let out = tools(&server)
            .read_page(&format!("{}/shelves/eng", server.uri()))
            .await;

        let ToolOutput::Rerouted { tool_used, result, .. } = out else {
            panic!("expected reroute");
        };
        assert_eq!(tool_used, Tool::GetShelves);
        let ToolOutput::Shelves(listing) = *result else {
            panic!("expected shelves");
        };
        assert!(listing["Eng"].is_book);
    }

    #[tokio::test]
    async fn get_shelves_defaults_to_root() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/shelves"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"<a class="grid-card" href="/shelves/eng"><div class="grid-card-content"><h2>Eng</h2></div></a>"#,
            ))
            .expect(1)
            .mount(&server)
            .await;

        let out = tools(&server).get_shelves(None).await;
        let ToolOutput::Shelves(listing) = out else {
            panic!("expected shelves");
        };
        assert_eq!(listing.keys().collect::<Vec<_>>(), vec!["Eng"]);
        assert!(!listing["Eng"].is_book);
    }

    #[tokio::test]
    async fn search_caps_hits_and_reports_failures() {
        let server = MockServer::start().await;
        let cards: String = (1..=7)
            .map(|i| {
                format!(
                    r#"<a class="entity-list-item" href="/books/b/page/p{i}"><h4>Hit {i}</h4><p>s</p><span> Book </span><span></span></a>"#
                )
            })
            .collect();
        mount(&server, "/search", 200, &cards).await;

        let out = tools(&server).search("deploy").await;
        let ToolOutput::Hits(hits) = out else {
            panic!("expected hits");
        };
        assert_eq!(hits.len(), 5);
        assert_eq!(hits[4].header, "Hit 5");
        assert!(hits.iter().all(|h| h.breadcrumbs == vec!["Book"]));

        let failing = MockServer::start().await;
        mount(&failing, "/search", 500, "").await;
        let out = tools(&failing).search("deploy").await;
        assert_eq!(out.as_message(), Some(SEARCH_FAILED_MESSAGE));
    }

    #[tokio::test]
    async fn unreachable_wiki_is_a_message() {
        let tools = WikiTools::from_config(WikiConfig::new("http://127.0.0.1:9").unwrap()).unwrap();
        let out = tools.read_page("http://127.0.0.1:9/books/x/page/y").await;
        assert_eq!(out.as_message(), Some(FETCH_ERROR_MESSAGE));
    }

    #[tokio::test]
    async fn list_shelves_omits_failed_shelves() {
        let server = MockServer::start().await;
        let base = server.uri();
        mount(
            &server,
            "/shelves",
            200,
            &format!(
                r#"<a class="grid-card" href="{base}/shelves/ok"><div class="grid-card-content"><h2>Ok</h2></div></a>
                   <a class="grid-card" href="{base}/shelves/down"><div class="grid-card-content"><h2>Down</h2></div></a>"#
            ),
        )
        .await;
        mount(
            &server,
            "/shelves/ok",
            200,
            &format!(r#"<a class="grid-card" href="{base}/shelves/nested"><div class="grid-card-content"><h2>Nested</h2></div></a>"#),
        )
        .await;
        mount(&server, "/shelves/down", 500, "").await;

        let out = tools(&server).list_shelves().await;
        let ToolOutput::Index(index) = out else {
            panic!("expected index");
        };
        assert_eq!(index.keys().collect::<Vec<_>>(), vec!["Nested"]);

        let report = crate::index_site(tools(&server).client(), &SilentProgress)
            .await
            .unwrap();
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].url, format!("{base}/shelves/down"));
    }

    #[tokio::test]
    async fn list_shelves_returns_index() {
        let server = MockServer::start().await;
        let base = server.uri();
        mount(
            &server,
            "/shelves",
            200,
            &format!(r#"<a class="grid-card" href="{base}/shelves/eng"><div class="grid-card-content"><h2>Eng</h2></div></a>"#),
        )
        .await;
        mount(
            &server,
            "/shelves/eng",
            200,
            &format!(r#"<a class="grid-card" href="{base}/books/guide"><div class="grid-card-content"><h2>Guide</h2><p>how</p></div></a>"#),
        )
        .await;
        mount(
            &server,
            "/books/guide",
            200,
            r#"<a class="page" href="/books/guide/page/one"><h4>One</h4><p>first</p></a>"#,
        )
        .await;

        let out = tools(&server).list_shelves().await;
        let ToolOutput::Index(index) = out else {
            panic!("expected index");
        };
        let guide = &index["Guide"];
        assert_eq!(guide.category.as_deref(), Some("Eng"));
        assert_eq!(guide.items[0].href, format!("{base}/books/guide/page/one"));

        let json = serde_json::to_value(ToolOutput::Index(index)).unwrap();
        assert_eq!(json["Guide"]["items"][0]["title"], "One");
    }
}
