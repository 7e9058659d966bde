//! Page body extractor (`div.page-content` → Markdown).

use std::sync::LazyLock;

use scraper::{Html, Selector};
use url::Url;

use wikiscribe_markdown::ConvertOptions;
use wikiscribe_shared::{Result, WikiError};

static CONTENT_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div.page-content").expect("valid selector"));

/// Convert the page's content container to Markdown.
pub fn parse_page(html: &str, page_url: &Url) -> Result<String> {
    let doc = Html::parse_document(html);

    let content = doc.select(&CONTENT_SEL).next().ok_or_else(|| {
        WikiError::parse(format!("{page_url}: no div.page-content container"))
    })?;

    wikiscribe_markdown::convert(
        &content.inner_html(),
        &ConvertOptions {
            source_url: Some(page_url.to_string()),
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page_url() -> Url {
        Url::parse("https://wiki.example.com/books/guide/page/intro").unwrap()
    }

    #[test]
    fn title_and_body() {
        let html = r#"<div class="page-content"><h1>Title</h1><p>Body</p></div>"#;
        assert_eq!(parse_page(html, &page_url()).unwrap(), "# Title\n\nBody");
    }

    #[test]
    fn chrome_outside_container_is_ignored() {
        let html = r#"<html><body>
            <header><a href="/">Home</a></header>
            <div class="page-content clearfix"><h2>Only this</h2></div>
            <footer>Copyright</footer>
        </body></html>"#;
        let md = parse_page(html, &page_url()).unwrap();
        assert_eq!(md, "## Only this");
    }

    #[test]
    fn missing_container_is_parse_error() {
        let err = parse_page("<html><body><p>hi</p></body></html>", &page_url()).unwrap_err();
        assert!(matches!(err, WikiError::Parse { .. }));
    }
}
