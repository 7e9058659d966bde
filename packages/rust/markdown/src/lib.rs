//! HTML-to-Markdown conversion and cleanup passes.
//!
//! Converts wiki page bodies to Markdown using the `htmd` crate with ATX
//! headings, then applies a series of cleanup passes to normalize blank lines,
//! code blocks, stray HTML and links. The same input always yields the same
//! output.

mod cleanup;

use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;
use tracing::{debug, instrument};
use url::Url;

use htmd::options::{HeadingStyle, Options};
use wikiscribe_shared::{Result, WikiError};

/// Tags whose content never reaches the Markdown output.
const SKIPPED_TAGS: [&str; 6] = ["script", "style", "nav", "iframe", "noscript", "svg"];

static TABLE_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("table").expect("valid selector"));
static TR_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("tr").expect("valid selector"));
static TH_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("th").expect("valid selector"));
static TD_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("td").expect("valid selector"));

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// Options for the HTML-to-Markdown conversion.
#[derive(Debug, Clone, Default)]
pub struct ConvertOptions {
    /// Page URL used for resolving relative links.
    pub source_url: Option<String>,
}

// ---------------------------------------------------------------------------
// Converter
// ---------------------------------------------------------------------------

/// Convert a content HTML fragment to Markdown.
///
/// 1. Swaps top-level `<table>` elements for placeholders
/// 2. Converts HTML → Markdown via `htmd` (ATX headings)
/// 3. Splices pipe tables back in
/// 4. Runs the cleanup pipeline
#[instrument(skip_all, fields(url = opts.source_url.as_deref().unwrap_or("-")))]
pub fn convert(content_html: &str, opts: &ConvertOptions) -> Result<String> {
    let (content_html, tables) = extract_tables(content_html);

    let converter = htmd::HtmlToMarkdown::builder()
        .options(Options {
            heading_style: HeadingStyle::Atx,
            ..Default::default()
        })
        .skip_tags(SKIPPED_TAGS.to_vec())
        .build();

    let mut raw_markdown = converter
        .convert(&content_html)
        .map_err(|e| WikiError::Conversion(format!("htmd conversion failed: {e}")))?;

    for (i, table) in tables.iter().enumerate() {
        raw_markdown = raw_markdown.replacen(&table_placeholder(i), table.trim(), 1);
    }

    debug!(raw_len = raw_markdown.len(), tables = tables.len(), "htmd conversion complete");

    let base_url = opts.source_url.as_deref().and_then(|u| Url::parse(u).ok());
    Ok(cleanup::run_pipeline(&raw_markdown, base_url.as_ref()))
}

// ---------------------------------------------------------------------------
// Table pre-processing
// ---------------------------------------------------------------------------

/// Marker text that survives htmd untouched.
fn table_placeholder(index: usize) -> String {
    format!("WIKISCRIBETABLE{index}X")
}

/// Replace each top-level `<table>` with a placeholder paragraph.
///
/// `htmd` 0.1 doesn't convert tables, so they are rendered here and spliced
/// back into the Markdown after conversion. Returns the rewritten HTML and the
/// rendered tables in placeholder order.
fn extract_tables(html: &str) -> (String, Vec<String>) {
    let doc = Html::parse_fragment(html);

    let tables: Vec<ElementRef> = doc
        .select(&TABLE_SEL)
        .filter(|t| {
            !t.ancestors()
                .filter_map(ElementRef::wrap)
                .any(|a| a.value().name() == "table")
        })
        .collect();

    if tables.is_empty() {
        return (html.to_string(), Vec::new());
    }

    // Serialize through scraper so table outer HTML matches byte-for-byte.
    let mut result = doc.root_element().inner_html();
    let mut rendered = Vec::with_capacity(tables.len());

    for table in tables {
        let outer = table.html();
        let index = rendered.len();
        if result.contains(&outer) {
            result = result.replacen(&outer, &format!("<p>{}</p>", table_placeholder(index)), 1);
            rendered.push(html_table_to_markdown(&table));
        }
    }

    (result, rendered)
}

/// Convert a single HTML table element to a markdown table string.
fn html_table_to_markdown(table: &ElementRef) -> String {
    let mut rows: Vec<Vec<String>> = Vec::new();

    for tr in table.select(&TR_SEL) {
        let ths: Vec<String> = tr.select(&TH_SEL).map(|cell| cell_text(&cell)).collect();

        if !ths.is_empty() {
            rows.push(ths);
            continue;
        }

        let tds: Vec<String> = tr.select(&TD_SEL).map(|cell| cell_text(&cell)).collect();

        if !tds.is_empty() {
            rows.push(tds);
        }
    }

    let col_count = rows.iter().map(|r| r.len()).max().unwrap_or(0);
    if col_count == 0 {
        return String::new();
    }

    for row in &mut rows {
        row.resize(col_count, String::new());
    }

    let mut md = String::new();

    // Header row; header-less tables promote their first row
    md.push_str("| ");
    md.push_str(&rows[0].join(" | "));
    md.push_str(" |\n");

    md.push_str("| ");
    md.push_str(&vec!["---"; col_count].join(" | "));
    md.push_str(" |\n");

    for row in &rows[1..] {
        md.push_str("| ");
        md.push_str(&row.join(" | "));
        md.push_str(" |\n");
    }

    md
}

/// Cell text with whitespace collapsed and pipes escaped.
fn cell_text(cell: &ElementRef) -> String {
    cell.text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .replace('|', "\\|")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
