//! Legal document extraction and analysis.
//!
//! Parses raw HTML, removes non-content elements (scripts, styles, navigation),
//! finds the main content area, and returns clean readable text. On top of
//! that, [`analyze_document`] fetches a page and reports its document type,
//! the legal citations it contains and a short summary.

use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SearchError};
use crate::legal::{extract_citations, identify_document_type, Citation, DocumentType};
use crate::types::PageContent;

/// Default maximum characters to return from extracted content.
pub const DEFAULT_MAX_CHARS: usize = 100_000;

/// Characters kept in a document summary.
pub const SUMMARY_CHARS: usize = 500;

/// Selectors tried in order for the main text. The first three match the
/// document containers of the big Bulgarian legal databases.
const CONTENT_SELECTORS: [&str; 7] = [
    "#DocumentContent",
    ".document-content",
    ".act-content",
    "article",
    "main",
    "[role=\"main\"]",
    "body",
];

/// Result of analysing one legal document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentAnalysis {
    /// The URL that was analysed.
    pub url: String,
    /// Page title, empty when the page has none.
    pub title: String,
    /// Kind of act or decision.
    pub document_type: DocumentType,
    /// Citations found in the text, deduplicated and sorted.
    pub citations: Vec<Citation>,
    /// Opening of the text, cut at a word boundary.
    pub summary: String,
    /// Words in the extracted text.
    pub word_count: usize,
}

/// Extract readable text content from raw HTML.
///
/// # Errors
///
/// Returns [`SearchError::Document`] if no extractable content is found.
pub fn extract_content(html: &str, url: &str) -> Result<PageContent> {
    extract_content_with_limit(html, url, DEFAULT_MAX_CHARS)
}

/// Same as [`extract_content`] with a custom character limit.
///
/// # Errors
///
/// Returns [`SearchError::Document`] if no extractable content is found.
pub fn extract_content_with_limit(html: &str, url: &str, max_chars: usize) -> Result<PageContent> {
    let cleaned_html = strip_boilerplate_tags(html);
    let document = Html::parse_document(&cleaned_html);

    let title = extract_title(&document);
    let text = normalise_whitespace(&extract_main_text(&document));
    if text.is_empty() {
        return Err(SearchError::Document(format!(
            "no extractable content found at {url}"
        )));
    }

    let text = truncate_to_limit(&text, max_chars);
    let word_count = text.split_whitespace().count();

    Ok(PageContent {
        url: url.to_owned(),
        title,
        text,
        word_count,
    })
}

/// Analyse already extracted page content.
pub fn analyze_content(page: &PageContent) -> DocumentAnalysis {
    // The title usually names the act ("Закон за ..."), so it takes part in
    // type detection alongside the opening of the text.
    let head: String = page.text.chars().take(SUMMARY_CHARS).collect();
    let document_type = identify_document_type(&format!("{} {head}", page.title));

    DocumentAnalysis {
        url: page.url.clone(),
        title: page.title.clone(),
        document_type,
        citations: extract_citations(&page.text),
        summary: summarize(&page.text, SUMMARY_CHARS),
        word_count: page.word_count,
    }
}

/// Fetch a legal document and analyse it.
///
/// # Errors
///
/// Returns [`SearchError::Document`] if the page cannot be fetched, answers
/// with a non-success status, or has no readable text.
pub async fn analyze_document(client: &reqwest::Client, url: &str) -> Result<DocumentAnalysis> {
    let parsed = url::Url::parse(url)
        .map_err(|e| SearchError::Document(format!("invalid document URL {url}: {e}")))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(SearchError::Document(format!(
            "unsupported URL scheme: {}",
            parsed.scheme()
        )));
    }

    tracing::debug!(url, "fetching legal document");
    let response = client
        .get(parsed)
        .send()
        .await
        .map_err(|e| SearchError::Document(format!("fetching {url} failed: {}", e.without_url())))?;

    let status = response.status();
    if !status.is_success() {
        return Err(SearchError::Document(format!("{url} answered HTTP {status}")));
    }

    let html = response
        .text()
        .await
        .map_err(|e| SearchError::Document(format!("reading {url} failed: {}", e.without_url())))?;

    let page = extract_content(&html, url)?;
    let analysis = analyze_content(&page);
    tracing::info!(
        url,
        document_type = ?analysis.document_type,
        citations = analysis.citations.len(),
        words = analysis.word_count,
        "document analysed"
    );
    Ok(analysis)
}

/// First `max_chars` characters of `text` on one line, cut at the last
/// word boundary and marked with an ellipsis when shortened.
fn summarize(text: &str, max_chars: usize) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= max_chars {
        return flat;
    }

    let cut: String = flat.chars().take(max_chars).collect();
    let shortened = match cut.rfind(' ') {
        Some(space) if space > 0 => &cut[..space],
        _ => cut.as_str(),
    };
    format!("{}…", shortened.trim_end_matches([',', ';', ':']))
}

/// Extract the page title from the `<title>` element, falling back to the
/// first `<h1>`.
fn extract_title(document: &Html) -> String {
    ["title", "h1"]
        .iter()
        .filter_map(|s| Selector::parse(s).ok())
        .find_map(|selector| {
            let text = document
                .select(&selector)
                .next()?
                .text()
                .collect::<Vec<_>>()
                .join(" ");
            let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
            (!text.is_empty()).then_some(text)
        })
        .unwrap_or_default()
}

/// Extract text from the main content area of the document.
fn extract_main_text(document: &Html) -> String {
    for selector_str in &CONTENT_SELECTORS {
        let Ok(selector) = Selector::parse(selector_str) else {
            continue;
        };
        if let Some(element) = document.select(&selector).next() {
            let text: String = element.text().collect::<Vec<_>>().join(" ");
            let trimmed = text.trim();
            if !trimmed.is_empty() {
                return trimmed.to_owned();
            }
        }
    }

    String::new()
}

/// Remove boilerplate elements and their content before parsing.
fn strip_boilerplate_tags(html: &str) -> String {
    let tags = [
        "script", "style", "nav", "footer", "header", "aside", "noscript", "svg", "iframe", "form",
    ];

    let mut result = html.to_owned();
    for tag in &tags {
        result = strip_tag(&result, tag);
    }
    result
}

/// Remove all instances of a specific HTML tag and its content.
///
/// Matching is ASCII case-insensitive; the lowered copy keeps the byte
/// offsets of the original so Cyrillic text is never split.
fn strip_tag(html: &str, tag: &str) -> String {
    let mut result = String::with_capacity(html.len());
    let lower = html.to_ascii_lowercase();
    let open_tag = format!("<{tag}");
    let close_tag = format!("</{tag}>");

    let mut pos = 0;
    loop {
        let Some(offset) = lower[pos..].find(&open_tag) else {
            result.push_str(&html[pos..]);
            break;
        };
        let start = pos + offset;

        // <nav> must not swallow <navbar>.
        let after_tag = start + open_tag.len();
        if let Some(&next) = lower.as_bytes().get(after_tag) {
            if !matches!(next, b' ' | b'>' | b'/' | b'\n' | b'\r' | b'\t') {
                result.push_str(&html[pos..after_tag]);
                pos = after_tag;
                continue;
            }
        }

        result.push_str(&html[pos..start]);

        pos = match lower[start..].find(&close_tag) {
            Some(offset) => start + offset + close_tag.len(),
            None => match lower[start..].find('>') {
                Some(offset) => start + offset + 1,
                None => html.len(),
            },
        };
    }

    result
}

/// Collapse excess whitespace: multiple spaces become one, 3+ newlines become 2.
fn normalise_whitespace(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut prev_was_space = false;
    let mut newline_count: u32 = 0;

    for ch in text.chars() {
        if ch == '\n' || ch == '\r' {
            newline_count += 1;
            prev_was_space = false;
            if newline_count <= 2 {
                result.push('\n');
            }
        } else if ch.is_whitespace() {
            newline_count = 0;
            if !prev_was_space {
                result.push(' ');
                prev_was_space = true;
            }
        } else {
            newline_count = 0;
            prev_was_space = false;
            result.push(ch);
        }
    }

    result
        .lines()
        .map(str::trim)
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_owned()
}

/// Truncate text to the given byte limit, breaking at a char boundary.
fn truncate_to_limit(text: &str, max_chars: usize) -> String {
    if text.len() <= max_chars {
        return text.to_owned();
    }

    let mut end = max_chars;
    while !text.is_char_boundary(end) && end > 0 {
        end -= 1;
    }

    let mut truncated = text[..end].to_owned();
    truncated.push_str("\n\n[Текстът е съкратен]");
    truncated
}
