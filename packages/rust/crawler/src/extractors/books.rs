//! Book page-list extractor (`a.page` items).

use std::sync::LazyLock;

use scraper::{Html, Selector};
use tracing::debug;
use url::Url;

use wikiscribe_shared::{BookEntry, Result};

use super::{first_text, recover_cards};
use crate::router::Router;

static ITEM_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a.page").expect("valid selector"));
static TITLE_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("h4").expect("valid selector"));
static DESC_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("p").expect("valid selector"));

/// Parse a book page into its page links, in document order.
pub fn parse_books(html: &str, page_url: &Url, router: &Router) -> Result<Vec<BookEntry>> {
    let doc = Html::parse_document(html);

    let entries = recover_cards("book page", doc.select(&ITEM_SEL), None, |item| {
        let title = first_text(&item, &TITLE_SEL)
            .filter(|t| !t.is_empty())
            .ok_or("missing h4 title")?;
        let description = first_text(&item, &DESC_SEL).ok_or("missing p description")?;
        let href = item.value().attr("href").ok_or("missing href")?;
        let href = router
            .resolve_href(page_url, href)
            .ok_or_else(|| format!("href {href:?} is outside the wiki"))?;

        Ok(BookEntry {
            title,
            description,
            href: href.to_string(),
        })
    })?;

    debug!(url = %page_url, count = entries.len(), "parsed book listing");

    Ok(entries)
}
