//! Search results extractor (`a.entity-list-item` cards).

use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};
use tracing::debug;
use url::Url;

use wikiscribe_shared::{MAX_SEARCH_HITS, Result, SearchHit};

use super::{first_text, recover_cards};
use crate::router::Router;

static HIT_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a.entity-list-item").expect("valid selector"));
static HEADER_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("h4").expect("valid selector"));
static DESC_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("p").expect("valid selector"));
static SPAN_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("span").expect("valid selector"));

/// Parse up to [`MAX_SEARCH_HITS`] result cards, in document order.
pub fn parse_search(html: &str, page_url: &Url, router: &Router) -> Result<Vec<SearchHit>> {
    let doc = Html::parse_document(html);

    let hits = recover_cards("search hit", doc.select(&HIT_SEL), Some(MAX_SEARCH_HITS), |card| {
        let header = first_text(&card, &HEADER_SEL)
            .filter(|h| !h.is_empty())
            .ok_or("missing h4 header")?;
        let description = first_text(&card, &DESC_SEL).ok_or("missing p description")?;
        let href = card.value().attr("href").ok_or("missing href")?;
        let href = router
            .resolve_href(page_url, href)
            .ok_or_else(|| format!("href {href:?} is outside the wiki"))?;

        Ok(SearchHit {
            header,
            description,
            breadcrumbs: breadcrumbs(&card),
            href: href.to_string(),
        })
    })?;

    debug!(url = %page_url, count = hits.len(), "parsed search results");

    Ok(hits)
}

/// Every text fragment inside a `span` of the card, in document order,
/// trimmed with blanks dropped. Nested spans contribute each fragment once.
fn breadcrumbs(card: &ElementRef) -> Vec<String> {
    card.descendants()
        .filter_map(|node| {
            let text = node.value().as_text()?;
            let in_span = node
                .ancestors()
                .take_while(|a| a.id() != card.id())
                .filter_map(ElementRef::wrap)
                .any(|a| SPAN_SEL.matches(&a));
            in_span.then(|| text.trim().to_string())
        })
        .filter(|text| !text.is_empty())
        .collect()
}
