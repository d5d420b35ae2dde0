//! Loading a content source into plain text.
//!
//! Files are read straight from disk. URLs are fetched with `reqwest` and,
//! when the body looks like HTML, reduced to text: script/style blocks are
//! dropped, headings become markdown headings (so the title chunker can
//! section them), block tags become line breaks, and the handful of common
//! entities are decoded.

use std::path::Path;

use sha2::{Digest, Sha256};
use thiserror::Error;

use super::source::ContentSource;

/// Errors from fetching or parsing content.
#[derive(Error, Debug)]
pub enum ContentError {
    #[error("Failed to read {path}: {source}")]
    FileRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to fetch {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{0} returned empty content")]
    Empty(String),
}

/// A loaded document ready for chunking.
#[derive(Debug, Clone)]
pub struct Document {
    /// Where the text came from.
    pub source: ContentSource,

    /// Plain text content.
    pub text: String,

    /// Document title when one could be extracted.
    pub title: Option<String>,

    /// SHA256 hex digest of the text, for change detection.
    pub content_hash: String,
}

impl Document {
    /// Build a document from already-loaded text.
    ///
    /// Line endings are normalized to `\n` so the chunker's blank-line
    /// paragraph splitting works on CRLF documents too.
    pub fn from_text(source: ContentSource, text: impl Into<String>) -> Self {
        let text = normalize_newlines(text.into());
        Self {
            content_hash: hash_content(&text),
            source,
            text,
            title: None,
        }
    }
}

fn normalize_newlines(text: String) -> String {
    if text.contains('\r') {
        text.replace("\r\n", "\n").replace('\r', "\n")
    } else {
        text
    }
}

fn hash_content(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Load a source into a plain-text document.
pub async fn parse_source(source: &ContentSource) -> Result<Document, ContentError> {
    match source {
        ContentSource::File(path) => parse_file(source, path),
        ContentSource::Url(url) => parse_url(source, url.as_str()).await,
    }
}

fn parse_file(source: &ContentSource, path: &Path) -> Result<Document, ContentError> {
    let text = std::fs::read_to_string(path).map_err(|e| ContentError::FileRead {
        path: path.display().to_string(),
        source: e,
    })?;

    if text.trim().is_empty() {
        return Err(ContentError::Empty(source.to_string()));
    }

    Ok(Document::from_text(source.clone(), text))
}

async fn parse_url(source: &ContentSource, url: &str) -> Result<Document, ContentError> {
    let fetch_err = |e: reqwest::Error| ContentError::Fetch {
        url: url.to_string(),
        source: e,
    };

    let response = reqwest::get(url)
        .await
        .and_then(|r| r.error_for_status())
        .map_err(fetch_err)?;

    let is_html = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|ct| ct.contains("text/html"))
        .unwrap_or(false);

    let body = response.text().await.map_err(fetch_err)?;

    let (text, title) = if is_html || looks_like_html(&body) {
        (html_to_text(&body), extract_title(&body))
    } else {
        (body, None)
    };

    if text.trim().is_empty() {
        return Err(ContentError::Empty(source.to_string()));
    }

    tracing::debug!(target: "content", "fetched {url} ({} bytes of text)", text.len());

    let mut doc = Document::from_text(source.clone(), text);
    doc.title = title;
    Ok(doc)
}

fn looks_like_html(body: &str) -> bool {
    let head = body.trim_start().get(..256).unwrap_or(body.trim_start());
    let lower = head.to_lowercase();
    lower.starts_with("<!doctype html") || lower.contains("<html")
}

/// Case-insensitive search for an ASCII needle, byte-offset safe on UTF-8.
fn find_ascii_ci(haystack: &str, needle: &str) -> Option<usize> {
    let haystack = haystack.as_bytes();
    let needle = needle.as_bytes();
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    (0..=haystack.len() - needle.len())
        .find(|&i| haystack[i..i + needle.len()].eq_ignore_ascii_case(needle))
}

/// Extract the `<title>` element text, if present.
fn extract_title(html: &str) -> Option<String> {
    let start = find_ascii_ci(html, "<title")?;
    let open_end = html[start..].find('>')? + start + 1;
    let close = find_ascii_ci(&html[open_end..], "</title>")? + open_end;
    let title = decode_entities(html[open_end..close].trim());
    (!title.is_empty()).then_some(title)
}

/// Reduce an HTML body to plain text with markdown-style headings.
pub fn html_to_text(html: &str) -> String {
    let mut out = String::with_capacity(html.len() / 2);
    let mut rest = html;

    while let Some(tag_start) = rest.find('<') {
        out.push_str(&rest[..tag_start]);
        rest = &rest[tag_start..];

        let Some(tag_end) = rest.find('>') else {
            // Unterminated tag, drop the remainder.
            rest = "";
            break;
        };

        let tag = &rest[1..tag_end];
        let name = tag
            .trim_start_matches('/')
            .split(|c: char| c.is_whitespace() || c == '/' || c == '>')
            .next()
            .unwrap_or("")
            .to_lowercase();
        let is_closing = tag.starts_with('/');

        rest = &rest[tag_end + 1..];

        match name.as_str() {
            // Drop script/style/head contents entirely.
            "script" | "style" | "head" if !is_closing => {
                let close_tag = format!("</{name}");
                if let Some(pos) = find_ascii_ci(rest, &close_tag) {
                    rest = &rest[pos..];
                    if let Some(end) = rest.find('>') {
                        rest = &rest[end + 1..];
                    }
                } else {
                    rest = "";
                }
            }
            // Headings become markdown so the chunker can section on them.
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                if is_closing {
                    out.push_str("\n\n");
                } else {
                    let level = name[1..].parse::<usize>().unwrap_or(1);
                    out.push_str("\n\n");
                    out.push_str(&"#".repeat(level));
                    out.push(' ');
                }
            }
            // Block-level tags break paragraphs.
            "p" | "div" | "section" | "article" | "table" | "ul" | "ol" | "blockquote" => {
                out.push_str("\n\n");
            }
            "br" | "li" | "tr" => out.push('\n'),
            _ => {}
        }
    }
    out.push_str(rest);

    collapse_whitespace(&decode_entities(&out))
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

/// Trim line ends and collapse runs of blank lines to a single blank line.
fn collapse_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut blank_run = 0;

    for line in text.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            blank_run += 1;
            continue;
        }
        if !out.is_empty() {
            out.push('\n');
            if blank_run > 0 {
                out.push('\n');
            }
        }
        blank_run = 0;
        out.push_str(trimmed);
    }

    out
}
