//! HTML extractors, one per wiki page shape.
//!
//! Extractors are pure: they take an already-fetched body plus the URL it came
//! from and return typed records. All of them share one malformed-markup
//! policy, implemented by [`recover_cards`]: a card missing an expected
//! element is skipped with a warning, and the call fails only when cards were
//! present but none could be read.

mod books;
mod page;
mod search;
mod shelf;

use scraper::{ElementRef, Selector};
use tracing::warn;

use wikiscribe_shared::{Result, WikiError};

pub use books::parse_books;
pub use page::parse_page;
pub use search::parse_search;
pub use shelf::{parse_shelf_cards, parse_shelves};

/// Apply the skip-malformed policy to a sequence of cards.
///
/// `read` returns `Err(reason)` for a card it cannot use. At most `limit`
/// cards are recovered; cards past the limit are never read.
pub(crate) fn recover_cards<'a, T>(
    kind: &str,
    cards: impl Iterator<Item = ElementRef<'a>>,
    limit: Option<usize>,
    mut read: impl FnMut(ElementRef<'a>) -> std::result::Result<T, String>,
) -> Result<Vec<T>> {
    let limit = limit.unwrap_or(usize::MAX);
    let mut seen = 0usize;
    let mut recovered = Vec::new();

    for card in cards {
        if recovered.len() >= limit {
            break;
        }
        seen += 1;
        match read(card) {
            Ok(item) => recovered.push(item),
            Err(reason) => warn!(kind, index = seen - 1, %reason, "skipping malformed card"),
        }
    }

    if seen > 0 && recovered.is_empty() {
        return Err(WikiError::parse(format!(
            "found {seen} {kind} card(s) but none had the expected structure"
        )));
    }

    Ok(recovered)
}

/// Trimmed text of the first element matching `sel` inside `el`.
pub(crate) fn first_text(el: &ElementRef, sel: &Selector) -> Option<String> {
    el.select(sel)
        .next()
        .map(|found| found.text().collect::<String>().trim().to_string())
}

/// Trimmed text of `el`, leaving out any subtree matching `skip`.
pub(crate) fn text_without(el: &ElementRef, skip: &Selector) -> String {
    let mut out = String::new();
    for node in el.descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let skipped = node
            .ancestors()
            .take_while(|a| a.id() != el.id())
            .filter_map(ElementRef::wrap)
            .any(|a| skip.matches(&a));
        if !skipped {
            out.push_str(text);
        }
    }
    out.trim().to_string()
}
