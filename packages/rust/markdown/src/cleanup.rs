//! Post-conversion cleanup pipeline for Markdown output.
//!
//! Each cleanup pass is a function `&str -> String` applied in sequence.
//! Passes never change heading levels; the output is trimmed at both ends.

use std::sync::LazyLock;

use regex::Regex;
use url::Url;

/// Run the full cleanup pipeline on raw Markdown text.
pub(crate) fn run_pipeline(md: &str, base_url: Option<&Url>) -> String {
    let mut result = md.replace("\r\n", "\n");

    result = fix_code_block_languages(&result);
    result = strip_leftover_html(&result);
    result = resolve_links(&result, base_url);
    result = normalize_whitespace(&result);
    result = clean_blank_lines(&result);

    result.trim().to_string()
}

// ---------------------------------------------------------------------------
// Pass 1: Fix code block language hints
// ---------------------------------------------------------------------------

/// Detect and fix code block language hints from class names.
///
/// Handles patterns like `language-js`, `lang-python`, `highlight-rust`.
fn fix_code_block_languages(md: &str) -> String {
    static LANG_PREFIX_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"(?m)^```(?:language-|lang-|highlight-)(\w+)").expect("valid regex")
    });

    LANG_PREFIX_RE.replace_all(md, "```$1").to_string()
}

// ---------------------------------------------------------------------------
// Code-aware rewriting
// ---------------------------------------------------------------------------

/// Apply `rewrite` to prose only. Fenced code blocks and inline code spans
/// pass through verbatim.
fn map_prose(md: &str, mut rewrite: impl FnMut(&str) -> String) -> String {
    let mut lines = Vec::new();
    let mut in_code_block = false;

    for line in md.lines() {
        if line.trim_start().starts_with("```") {
            in_code_block = !in_code_block;
            lines.push(line.to_string());
        } else if in_code_block {
            lines.push(line.to_string());
        } else {
            lines.push(map_outside_inline_code(line, &mut rewrite));
        }
    }

    lines.join("\n")
}

/// Split `line` on inline code spans and rewrite only the text between them.
///
/// A span opens with a run of N backticks and closes at the next run of
/// exactly N. An unmatched run is ordinary text.
fn map_outside_inline_code(line: &str, rewrite: &mut impl FnMut(&str) -> String) -> String {
    let mut out = String::with_capacity(line.len());
    let mut prose_start = 0;
    let mut i = 0;

    while let Some(offset) = line[i..].find('`') {
        let open = i + offset;
        let run = backtick_run(&line[open..]);
        let body_start = open + run;

        match find_closing_run(&line[body_start..], run) {
            Some(close) => {
                let span_end = body_start + close + run;
                out.push_str(&rewrite(&line[prose_start..open]));
                out.push_str(&line[open..span_end]);
                prose_start = span_end;
                i = span_end;
            }
            None => i = body_start,
        }
    }

    out.push_str(&rewrite(&line[prose_start..]));
    out
}

fn backtick_run(s: &str) -> usize {
    s.bytes().take_while(|&b| b == b'`').count()
}

/// Offset of the next backtick run of exactly `len` in `s`.
fn find_closing_run(s: &str, len: usize) -> Option<usize> {
    let mut i = 0;
    while let Some(offset) = s[i..].find('`') {
        let start = i + offset;
        let run = backtick_run(&s[start..]);
        if run == len {
            return Some(start);
        }
        i = start + run;
    }
    None
}

// ---------------------------------------------------------------------------
// Pass 2: Strip leftover HTML tags
// ---------------------------------------------------------------------------

/// Remove stray layout tags that survived the conversion, keeping their text.
/// Code is left untouched.
fn strip_leftover_html(md: &str) -> String {
    static HTML_TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"</?(?:div|span|section|article|aside|header|footer|figure|figcaption|details|summary)(?:\s[^>]*)?>").expect("valid regex")
    });

    map_prose(md, |text| HTML_TAG_RE.replace_all(text, "").to_string())
}

// ---------------------------------------------------------------------------
// Pass 3: Resolve relative links
// ---------------------------------------------------------------------------

/// Resolve relative URLs in Markdown links against the page URL.
/// Link-like text inside code is left untouched.
fn resolve_links(md: &str, base_url: Option<&Url>) -> String {
    let Some(base) = base_url else {
        return md.to_string();
    };

    static LINK_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"\[([^\]]*)\]\(([^)\s]+)\)").expect("valid regex"));

    map_prose(md, |text| {
        LINK_RE
            .replace_all(text, |caps: &regex::Captures| {
                let label = &caps[1];
                let href = &caps[2];

                if href.starts_with("http://")
                    || href.starts_with("https://")
                    || href.starts_with('#')
                    || href.starts_with("mailto:")
                {
                    return caps[0].to_string();
                }

                match base.join(href) {
                    Ok(resolved) => format!("[{label}]({resolved})"),
                    Err(_) => caps[0].to_string(),
                }
            })
            .to_string()
    })
}

// ---------------------------------------------------------------------------
// Pass 4: Normalize whitespace
// ---------------------------------------------------------------------------

/// Strip trailing whitespace from every line.
fn normalize_whitespace(md: &str) -> String {
    md.lines()
        .map(|line| line.trim_end())
        .collect::<Vec<_>>()
        .join("\n")
}

// ---------------------------------------------------------------------------
// Pass 5: Collapse blank lines
// ---------------------------------------------------------------------------

/// Collapse runs of blank lines into a single blank line.
fn clean_blank_lines(md: &str) -> String {
    static MULTI_BLANK_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"\n{3,}").expect("valid regex"));

    MULTI_BLANK_RE.replace_all(md, "\n\n").to_string()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
