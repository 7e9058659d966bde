//! HTTP fetcher: the only network boundary.
//!
//! One GET per call, no retries. Non-2xx statuses come back as data so each
//! extractor can tell a 404 apart from other failures.

use std::time::Duration;

use reqwest::Client;
use tracing::{debug, instrument};
use url::Url;

use wikiscribe_shared::{Result, WikiConfig, WikiError};

/// Maximum number of redirects the client follows transparently.
const MAX_REDIRECTS: usize = 5;

/// Raw response of a single GET.
#[derive(Debug, Clone)]
pub struct FetchedBody {
    /// Requested URL.
    pub url: Url,
    /// HTTP status code.
    pub status: u16,
    /// Response body as text.
    pub body: String,
}

impl FetchedBody {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// The body on 2xx, otherwise the matching status error.
    pub fn into_success(self) -> Result<String> {
        if self.is_success() {
            Ok(self.body)
        } else {
            Err(WikiError::from_status(self.url.as_str(), self.status))
        }
    }
}

/// Thin wrapper over a configured `reqwest::Client`. Cheap to clone.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
}

impl Fetcher {
    /// Build a fetcher from the wiki configuration.
    pub fn new(config: &WikiConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .timeout(config.timeout)
            .connect_timeout(config.timeout.min(Duration::from_secs(10)))
            .build()
            .map_err(|e| WikiError::config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client })
    }

    /// Perform exactly one GET against `url`.
    #[instrument(skip(self), fields(url = %url))]
    pub async fn fetch(&self, url: &Url) -> Result<FetchedBody> {
        debug!("fetching");

        let response = self
            .client
            .get(url.as_str())
            .send()
            .await
            .map_err(|e| WikiError::fetch(url.as_str(), e.to_string()))?;

        let status = response.status().as_u16();

        let body = response
            .text()
            .await
            .map_err(|e| WikiError::fetch(url.as_str(), format!("body read failed: {e}")))?;

        debug!(status, len = body.len(), "fetched");

        Ok(FetchedBody {
            url: url.clone(),
            status,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn non_success_status_is_returned_as_data() {
        let server = wiremock::MockServer::start().await;

        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path("/books/missing"))
            .respond_with(wiremock::ResponseTemplate::new(404).set_body_string("gone"))
            .expect(1)
            .mount(&server)
            .await;

        let config = WikiConfig::new(&server.uri()).unwrap();
        let fetcher = Fetcher::new(&config).unwrap();
        let url = Url::parse(&format!("{}/books/missing", server.uri())).unwrap();

        let fetched = fetcher.fetch(&url).await.unwrap();
        assert_eq!(fetched.status, 404);
        assert_eq!(fetched.body, "gone");
        assert!(!fetched.is_success());
        assert!(matches!(fetched.into_success(), Err(WikiError::NotFound { .. })));
    }

    #[tokio::test]
    async fn success_body_is_returned() {
        let server = wiremock::MockServer::start().await;

        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path("/shelves"))
            .and(wiremock::matchers::header("user-agent", wikiscribe_shared::DEFAULT_USER_AGENT))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_string("<html></html>"))
            .mount(&server)
            .await;

        let config = WikiConfig::new(&server.uri()).unwrap();
        let fetcher = Fetcher::new(&config).unwrap();
        let url = Url::parse(&config.shelves_url()).unwrap();

        let body = fetcher.fetch(&url).await.unwrap().into_success().unwrap();
        assert_eq!(body, "<html></html>");
    }

    #[tokio::test]
    async fn connection_failure_is_fetch_error() {
        // Port 9 (discard) is closed on test hosts.
        let config = WikiConfig::new("http://127.0.0.1:9").unwrap();
        let fetcher = Fetcher::new(&config).unwrap();
        let url = Url::parse("http://127.0.0.1:9/shelves").unwrap();

        let err = fetcher.fetch(&url).await.unwrap_err();
        assert!(matches!(err, WikiError::Fetch { .. }), "got {err:?}");
    }

    #[tokio::test]
    async fn slow_response_times_out() {
        let server = wiremock::MockServer::start().await;

        wiremock::Mock::given(wiremock::matchers::path("/shelves"))
            .respond_with(
                wiremock::ResponseTemplate::new(200).set_delay(Duration::from_secs(3)),
            )
            .mount(&server)
            .await;

        let mut config = WikiConfig::new(&server.uri()).unwrap();
        config.timeout = Duration::from_millis(200);
        let fetcher = Fetcher::new(&config).unwrap();
        let url = Url::parse(&config.shelves_url()).unwrap();

        let err = fetcher.fetch(&url).await.unwrap_err();
        assert!(matches!(err, WikiError::Fetch { .. }));
    }
}
