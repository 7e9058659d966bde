//! Site indexer: shelves → child shelves → book lists.
//!
//! The tree is fixed at two levels. The root `/shelves` listing names the
//! top-level shelves; each top-level shelf's listing names the entries that
//! make up the index; each of those entries that is a book gets its page list
//! attached as `items`. That is `1 + T + C` fetches for `T` top-level shelves
//! and `C` discovered books.

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tokio::sync::Semaphore;
use tracing::{debug, info, instrument, warn};
use url::Url;

use wikiscribe_crawler::WikiClient;
use wikiscribe_shared::{Result, ShelfEntry, SiteIndex, WikiError};

/// A fetch the indexer skipped over.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexFailure {
    pub url: String,
    pub message: String,
}

/// Output of [`index_site`].
#[derive(Debug, Clone, Default, Serialize)]
pub struct IndexReport {
    pub index: SiteIndex,
    /// Shelf and book-list fetches that failed and were left out.
    pub errors: Vec<IndexFailure>,
}

/// Progress callback for reporting indexing status.
pub trait IndexProgress: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called when one fetch of the current phase finishes.
    fn fetched(&self, url: &str, current: usize, total: usize);
    /// Called when indexing completes.
    fn done(&self, report: &IndexReport);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl IndexProgress for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn fetched(&self, _url: &str, _current: usize, _total: usize) {}
    fn done(&self, _report: &IndexReport) {}
}

/// Build the full shelf → book index.
///
/// A failed root fetch aborts. Any other failed fetch is logged, recorded in
/// [`IndexReport::errors`] and skipped.
#[instrument(skip_all, fields(base = %client.config().base()))]
pub async fn index_site(client: &WikiClient, progress: &dyn IndexProgress) -> Result<IndexReport> {
    let start = Instant::now();
    let mut errors = Vec::new();

    // --- Phase 1: root listing ---
    progress.phase("Fetching shelves");
    let root = Url::parse(&client.config().shelves_url())
        .map_err(|e| WikiError::config(format!("invalid shelves URL: {e}")))?;
    let top = client.shelf_cards(&root).await?;

    let top_shelves: Vec<ShelfEntry> = top
        .into_iter()
        .filter(|entry| {
            if entry.is_book {
                debug!(name = %entry.name, "top-level entry is a book, not expanding");
            }
            !entry.is_book
        })
        .collect();

    info!(shelves = top_shelves.len(), "fetched top-level shelves");

    // --- Phase 2: child listings ---
    progress.phase("Fetching shelf contents");
    let targets = with_urls(&top_shelves, &mut errors);
    let urls = targets.iter().map(|(_, url)| url.clone()).collect();
    let listings = fan_out(client, urls, progress, |client, url| async move {
        client.shelf_cards(&url).await
    })
    .await;

    let mut index = SiteIndex::new();
    for ((parent, url), result) in targets.iter().zip(listings) {
        match result {
            Ok(children) => {
                for mut child in children {
                    child.category = Some(parent.name.clone());
                    if let Some(previous) = index.insert(child.name.clone(), child) {
                        debug!(name = %previous.name, "duplicate shelf name, keeping the later one");
                    }
                }
            }
            Err(e) => record_failure(&mut errors, url, &e),
        }
    }

    // --- Phase 3: book lists ---
    progress.phase("Fetching book lists");
    let books: Vec<ShelfEntry> = index.values().filter(|e| e.is_book).cloned().collect();
    let targets = with_urls(&books, &mut errors);
    let urls = targets.iter().map(|(_, url)| url.clone()).collect();
    let book_lists = fan_out(client, urls, progress, |client, url| async move {
        client.list_books(&url).await
    })
    .await;

    for ((book, url), result) in targets.iter().zip(book_lists) {
        match result {
            Ok(items) => {
                if let Some(entry) = index.get_mut(&book.name) {
                    entry.items = items;
                }
            }
            Err(e) => record_failure(&mut errors, url, &e),
        }
    }

    let report = IndexReport { index, errors };

    info!(
        entries = report.index.len(),
        errors = report.errors.len(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "site index complete"
    );

    progress.done(&report);
    Ok(report)
}

/// Pair each entry with its parsed href. Unparseable hrefs are recorded as
/// failures and dropped.
fn with_urls<'a>(
    entries: &'a [ShelfEntry],
    errors: &mut Vec<IndexFailure>,
) -> Vec<(&'a ShelfEntry, Url)> {
    entries
        .iter()
        .filter_map(|entry| match Url::parse(&entry.href) {
            Ok(url) => Some((entry, url)),
            Err(e) => {
                errors.push(IndexFailure {
                    url: entry.href.clone(),
                    message: e.to_string(),
                });
                None
            }
        })
        .collect()
}

fn record_failure(errors: &mut Vec<IndexFailure>, url: &Url, e: &WikiError) {
    warn!(%url, error = %e, "skipping failed fetch");
    errors.push(IndexFailure {
        url: url.to_string(),
        message: e.to_string(),
    });
}

/// Run `op` for every URL on the tokio runtime, at most
/// `config.concurrency` at a time, and collect results in submission order.
async fn fan_out<T, F, Fut>(
    client: &WikiClient,
    urls: Vec<Url>,
    progress: &dyn IndexProgress,
    op: F,
) -> Vec<Result<T>>
where
    T: Send + 'static,
    F: Fn(WikiClient, Url) -> Fut,
    Fut: Future<Output = Result<T>> + Send + 'static,
{
    let semaphore = Arc::new(Semaphore::new(client.config().concurrency));
    let mut handles = Vec::with_capacity(urls.len());

    for url in urls {
        let sem = semaphore.clone();
        let task = op(client.clone(), url.clone());
        handles.push((
            url,
            tokio::spawn(async move {
                let _permit = sem
                    .acquire_owned()
                    .await
                    .map_err(|e| WikiError::Task(e.to_string()))?;
                task.await
            }),
        ));
    }

    let total = handles.len();
    let mut results = Vec::with_capacity(total);

    for (i, (url, handle)) in handles.into_iter().enumerate() {
        let result = match handle.await {
            Ok(result) => result,
            Err(e) => Err(WikiError::Task(e.to_string())),
        };
        progress.fetched(url.as_str(), i + 1, total);
        results.push(result);
    }

    results
}
