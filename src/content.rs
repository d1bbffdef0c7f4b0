//! Main-text extraction: strips boilerplate and returns readable text.
//!
//! Parses raw HTML, removes non-content elements (scripts, styles, navigation),
//! finds the main content area, and returns clean text. When the chosen area
//! looks too small compared with the whole body, the body wins: for product
//! and datasheet pages a stray spec table outside `<main>` matters more than
//! a tidy result.

use scraper::node::Node;
use scraper::{ElementRef, Html, Selector};

use crate::config::ContentConfig;
use crate::fetch::Payload;
use crate::pdf;

/// Default maximum characters to return from extracted content.
pub const DEFAULT_MAX_CHARS: usize = 100_000;

/// Elements removed together with everything inside them.
const STRIPPED_TAGS: &[&str] = &[
    "script", "style", "noscript", "svg", "iframe", "template", "nav", "header", "footer", "aside",
];

/// Elements that start a new line in the extracted text.
const BLOCK_TAGS: &[&str] = &[
    "address", "article", "blockquote", "body", "br", "caption", "dd", "details", "div", "dl",
    "dt", "fieldset", "figcaption", "figure", "h1", "h2", "h3", "h4", "h5", "h6", "hr", "li",
    "main", "ol", "p", "pre", "section", "summary", "table", "tbody", "td", "tfoot", "th",
    "thead", "tr", "ul",
];

/// Content roots, most specific first. `body` is the fallback.
const ROOT_SELECTORS: &[&str] = &["article", "main", "[role=\"main\"]"];

/// Turns fetched payloads into clean text on the blocking pool.
#[derive(Debug, Clone)]
pub struct ContentExtractor {
    max_chars: usize,
    pdf_max_pages: usize,
}

impl Default for ContentExtractor {
    fn default() -> Self {
        Self::new(&ContentConfig::default())
    }
}

impl ContentExtractor {
    /// Build from the content configuration.
    pub fn new(config: &ContentConfig) -> Self {
        Self {
            max_chars: config.max_chars,
            pdf_max_pages: config.pdf_max_pages,
        }
    }

    /// Extract text from `payload` without blocking the async runtime.
    ///
    /// A panic inside the parser yields empty text.
    pub async fn extract(&self, payload: Payload, url: &str) -> String {
        let extractor = self.clone();
        let owned_url = url.to_owned();
        match tokio::task::spawn_blocking(move || extractor.extract_blocking(&payload, &owned_url))
            .await
        {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(%url, error = %e, "content extraction worker failed");
                String::new()
            }
        }
    }

    /// Synchronous form of [`extract`](Self::extract).
    pub fn extract_blocking(&self, payload: &Payload, url: &str) -> String {
        if payload.is_empty() {
            tracing::trace!(%url, "empty payload");
            return String::new();
        }
        match payload {
            Payload::Html(html) => extract_main_text(html, url, self.max_chars),
            Payload::Pdf(bytes) => {
                let raw = pdf::pdf_text(bytes, self.pdf_max_pages);
                let text = truncate_to_limit(&normalise_whitespace(&raw), self.max_chars);
                tracing::trace!(%url, chars = text.chars().count(), "extracted PDF text");
                text
            }
        }
    }
}

/// Extract readable text from raw HTML, at most `max_chars` chars long.
///
/// Returns an empty string when the page holds no text at all.
pub fn extract_main_text(html: &str, url: &str, max_chars: usize) -> String {
    let cleaned_html = strip_boilerplate_tags(html);
    let document = Html::parse_document(&cleaned_html);

    let raw_text = select_content_root(&document);
    let text = truncate_to_limit(&normalise_whitespace(&raw_text), max_chars);
    tracing::trace!(%url, chars = text.chars().count(), "extracted main text");
    text
}

/// Pick the text of the most specific content root that still carries at
/// least half of the body's text.
fn select_content_root(document: &Html) -> String {
    let body_text = first_match(document, "body").map(block_text).unwrap_or_default();
    let body_len = visible_len(&body_text);

    for selector in ROOT_SELECTORS {
        let Some(root) = first_match(document, selector) else {
            continue;
        };
        let text = block_text(root);
        let len = visible_len(&text);
        if len == 0 {
            continue;
        }
        if len * 2 >= body_len {
            return text;
        }
        tracing::trace!(selector, root_len = len, body_len, "content root too small, using body");
        break;
    }

    body_text
}

fn first_match<'a>(document: &'a Html, selector: &str) -> Option<ElementRef<'a>> {
    let selector = Selector::parse(selector).ok()?;
    document.select(&selector).next()
}

/// Text of an element with a newline before every block-level element.
fn block_text(element: ElementRef<'_>) -> String {
    let mut out = String::new();
    for node in element.descendants() {
        match node.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(el) if BLOCK_TAGS.contains(&el.name()) => out.push('\n'),
            _ => {}
        }
    }
    out
}

fn visible_len(text: &str) -> usize {
    text.chars().filter(|c| !c.is_whitespace()).count()
}

/// Remove boilerplate HTML tags and their content before parsing.
fn strip_boilerplate_tags(html: &str) -> String {
    let mut result = html.to_owned();
    for tag in STRIPPED_TAGS {
        result = strip_tag(&result, tag);
    }
    result
}

/// Remove all instances of a specific HTML tag and its content.
fn strip_tag(html: &str, tag: &str) -> String {
    let mut result = String::with_capacity(html.len());
    // ASCII lowercasing keeps byte offsets aligned with `html`.
    let lower = html.to_ascii_lowercase();
    let open_tag = format!("<{tag}");
    let close_tag = format!("</{tag}>");

    let mut pos = 0;
    loop {
        let start = match lower[pos..].find(&open_tag) {
            Some(offset) => pos + offset,
            None => {
                result.push_str(&html[pos..]);
                break;
            }
        };

        // Reject prefixes of longer names, e.g. <navigate> for <nav>.
        let after_tag = start + open_tag.len();
        if after_tag < lower.len() {
            let next_byte = lower.as_bytes()[after_tag];
            if !matches!(next_byte, b' ' | b'>' | b'/' | b'\n' | b'\r' | b'\t') {
                result.push_str(&html[pos..after_tag]);
                pos = after_tag;
                continue;
            }
        }

        result.push_str(&html[pos..start]);

        let end = match lower[start..].find(&close_tag) {
            Some(offset) => start + offset + close_tag.len(),
            None => match lower[start..].find('>') {
                Some(offset) => start + offset + 1,
                None => html.len(),
            },
        };

        pos = end;
    }

    result
}

/// Collapse runs of whitespace inside each line and drop blank lines.
pub fn normalise_whitespace(text: &str) -> String {
    text.lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Truncate text to at most `max_chars` chars.
fn truncate_to_limit(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => text[..end].to_owned(),
        None => text.to_owned(),
    }
}
