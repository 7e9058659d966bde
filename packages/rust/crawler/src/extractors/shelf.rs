//! Shelf listing extractor (`a.grid-card` cards).

use std::sync::LazyLock;

use scraper::{Html, Selector};
use tracing::debug;
use url::Url;

use wikiscribe_shared::{Result, ShelfEntry, ShelfListing};

use super::{first_text, recover_cards, text_without};
use crate::router::Router;

static CARD_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a.grid-card").expect("valid selector"));
static HEADER_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("h2").expect("valid selector"));
static CONTENT_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(".grid-card-content").expect("valid selector"));

/// Parse a shelf listing into entries keyed by card header.
///
/// `category` and `items` are left empty; duplicate headers keep the last card.
pub fn parse_shelves(html: &str, page_url: &Url, router: &Router) -> Result<ShelfListing> {
    let entries = parse_shelf_cards(html, page_url, router)?;
    Ok(entries.into_iter().map(|e| (e.name.clone(), e)).collect())
}

/// Parse shelf cards in document order.
pub fn parse_shelf_cards(html: &str, page_url: &Url, router: &Router) -> Result<Vec<ShelfEntry>> {
    let doc = Html::parse_document(html);

    let entries = recover_cards("shelf", doc.select(&CARD_SEL), None, |card| {
        let name = first_text(&card, &HEADER_SEL)
            .filter(|n| !n.is_empty())
            .ok_or("missing h2 header")?;
        let content = card
            .select(&CONTENT_SEL)
            .next()
            .ok_or("missing .grid-card-content block")?;
        let description = text_without(&content, &HEADER_SEL);
        let href = card.value().attr("href").ok_or("missing href")?;
        let href = router
            .resolve_href(page_url, href)
            .ok_or_else(|| format!("href {href:?} is outside the wiki"))?;

        Ok(ShelfEntry {
            is_book: router.is_book_href(&href),
            name,
            description,
            href: href.to_string(),
            category: None,
            items: Vec::new(),
        })
    })?;

    debug!(url = %page_url, count = entries.len(), "parsed shelf listing");

    Ok(entries)
}
