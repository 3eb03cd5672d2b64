//! Document loading: raw bytes → rich text + image table.
//!
//! Every loader produces the same shape: markup-safe rich text in which each
//! inline image has been replaced by an `IMAGE:<n>` token, plus an
//! [`ImageTable`] holding the decoded payloads by index. Downstream stages
//! never touch binary content, and swapping the DOCX decoder for another
//! format only means writing another loader.

use crate::error::ExtractError;
use crate::output::{Image, ImagePayload};
use crate::pipeline::docx;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// ZIP local-file header; every OOXML package starts with it.
const ZIP_MAGIC: &[u8] = b"PK\x03\x04";
/// OLE2 compound file header used by legacy `.doc`.
const OLE_MAGIC: &[u8] = &[0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];
const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// Format of a [`RawDocument`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MediaType {
    /// Office Open XML word-processing document (`.docx`).
    Docx,
    /// HTML, e.g. a word-processor "save as web page" export.
    Html,
    /// UTF-8 plain text.
    PlainText,
}

impl MediaType {
    pub fn mime(self) -> &'static str {
        match self {
            MediaType::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
            MediaType::Html => "text/html",
            MediaType::PlainText => "text/plain",
        }
    }

    /// Sniff the format from the leading bytes.
    pub fn sniff(bytes: &[u8]) -> Result<MediaType, ExtractError> {
        if bytes.starts_with(ZIP_MAGIC) {
            return Ok(MediaType::Docx);
        }
        if bytes.starts_with(OLE_MAGIC) {
            return Err(ExtractError::unsupported(
                "legacy binary Word (.doc) file; re-save it as .docx",
            ));
        }
        let body = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
        let text = std::str::from_utf8(body).map_err(|_| {
            let mut magic = [0u8; 4];
            let n = bytes.len().min(4);
            magic[..n].copy_from_slice(&bytes[..n]);
            ExtractError::unsupported(format!(
                "not a .docx package, HTML or UTF-8 text (first bytes: {magic:?})"
            ))
        })?;
        if RE_HTML_START.is_match(text) {
            Ok(MediaType::Html)
        } else {
            Ok(MediaType::PlainText)
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mime())
    }
}

/// Document bytes plus their declared (or sniffed) format.
///
/// Held only for the duration of one extraction call.
#[derive(Debug, Clone, Copy)]
pub struct RawDocument<'a> {
    pub bytes: &'a [u8],
    pub media_type: MediaType,
}

impl<'a> RawDocument<'a> {
    pub fn new(bytes: &'a [u8], media_type: MediaType) -> Self {
        Self { bytes, media_type }
    }

    /// Wrap bytes whose format is unknown, sniffing it from the content.
    pub fn sniff(bytes: &'a [u8]) -> Result<Self, ExtractError> {
        Ok(Self::new(bytes, MediaType::sniff(bytes)?))
    }
}

// ── Image table ──────────────────────────────────────────────────────────

/// Decoded images of one document, indexed in first-reference order.
///
/// Every `IMAGE:<n>` token a loader writes has an entry here; an entry may
/// be referenced zero times.
#[derive(Debug, Clone, Default)]
pub struct ImageTable {
    images: Vec<Image>,
}

impl ImageTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an image and return its index.
    pub fn push(&mut self, payload: ImagePayload) -> usize {
        self.images.push(Arc::new(payload));
        self.images.len() - 1
    }

    pub fn get(&self, index: usize) -> Option<&Image> {
        self.images.get(index)
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}

/// The `IMAGE:<n>` token standing in for image `index` in the text stream.
pub fn image_token(index: usize) -> String {
    format!("IMAGE:{index}")
}

/// Output of the loading stage.
#[derive(Debug, Clone)]
pub struct LoadedDocument {
    pub media_type: MediaType,
    /// Markup-safe rich text: literal `<`, `>` and `&` are entity-escaped.
    pub rich_text: String,
    pub images: ImageTable,
}

/// Decode a document into rich text and its image table.
///
/// # Errors
/// [`ExtractError::UnsupportedFormat`] when the bytes cannot be decoded as
/// the declared format. This is the only fatal failure in the pipeline.
pub fn load(doc: RawDocument<'_>) -> Result<LoadedDocument, ExtractError> {
    debug!("Loading {} ({} bytes)", doc.media_type, doc.bytes.len());
    let (rich_text, images) = match doc.media_type {
        MediaType::Docx => docx::decode(doc.bytes)?,
        MediaType::Html => load_html(utf8(doc.bytes)?),
        MediaType::PlainText => (escape_markup(utf8(doc.bytes)?), ImageTable::new()),
    };
    debug!(
        "Loaded {} chars of rich text, {} images",
        rich_text.len(),
        images.len()
    );
    Ok(LoadedDocument {
        media_type: doc.media_type,
        rich_text,
        images,
    })
}

fn utf8(bytes: &[u8]) -> Result<&str, ExtractError> {
    let body = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    std::str::from_utf8(body).map_err(|e| ExtractError::unsupported(format!("invalid UTF-8: {e}")))
}

/// Escape the three characters the normalizer treats as markup.
pub(crate) fn escape_markup(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

// ── HTML ─────────────────────────────────────────────────────────────────

static RE_HTML_START: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*(?:<!doctype\s+html|<html\b|<body\b|<(?:p|div|h[1-6]|ol|ul|table)\b)")
        .unwrap()
});

static RE_SCRIPT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)<script\b.*?</script\s*>").unwrap());
static RE_STYLE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)<style\b.*?</style\s*>").unwrap());
static RE_COMMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<!--.*?-->").unwrap());

static RE_IMG: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)<img\b[^>]*>").unwrap());
static RE_DATA_URI: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?is)\bsrc\s*=\s*["']data:([a-z0-9.+\-]+/[a-z0-9.+\-]+);base64,([^"']+)["']"#)
        .unwrap()
});

/// Tags after which a new line starts.
static RE_BLOCK_BREAK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)<br\s*/?>|</(?:p|div|li|h[1-6]|tr|table|ol|ul|blockquote)\s*>").unwrap()
});

/// Pull `data:` images out of HTML and mark line breaks; other markup is
/// left for the normalizer to strip.
fn load_html(html: &str) -> (String, ImageTable) {
    let html = RE_SCRIPT.replace_all(html, "");
    let html = RE_STYLE.replace_all(&html, "");
    let html = RE_COMMENT.replace_all(&html, "");

    let mut images = ImageTable::new();
    let html = RE_IMG.replace_all(&html, |caps: &regex::Captures<'_>| {
        let tag = &caps[0];
        match RE_DATA_URI.captures(tag) {
            Some(uri) => {
                let data: String = uri[2].chars().filter(|c| !c.is_whitespace()).collect();
                let index = images.push(ImagePayload {
                    content_type: uri[1].to_ascii_lowercase(),
                    data,
                });
                format!(" {} ", image_token(index))
            }
            None => {
                debug!("Dropping <img> without an inline data URI");
                String::new()
            }
        }
    });

    let text = RE_BLOCK_BREAK.replace_all(&html, "$0\n").into_owned();
    (text, images)
}
