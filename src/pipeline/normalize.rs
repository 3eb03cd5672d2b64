//! Text normalization: rich text → clean, line-oriented plain text.
//!
//! Deterministic and total; it never fails. Rules run in this order:
//!
//! 1. Canonicalise line endings (CRLF / CR → LF)
//! 2. Strip anything in markup-bracket form (`<...>`)
//! 3. Decode `&nbsp;` to a space
//! 4. Collapse horizontal whitespace runs to one space, trim every line and
//!    drop blank lines
//! 5. Decode `&lt;`, `&gt;` and finally `&amp;`
//!
//! Line breaks survive so start-of-line boundary markers stay detectable.
//! `IMAGE:<n>` tokens contain no whitespace or markup and pass through
//! untouched. Decoding `<`/`>` after tag stripping means escaped comparison
//! operators are never mistaken for tags.

use once_cell::sync::Lazy;
use regex::Regex;

static RE_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^<>]*>").unwrap());
static RE_HSPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\S\n]+").unwrap());

/// Normalize loader output into the text the pattern stages work on.
pub fn normalize(rich_text: &str) -> String {
    let s = normalise_line_endings(rich_text);
    let s = strip_markup(&s);
    let s = s.replace("&nbsp;", " ");
    let s = collapse_whitespace(&s);
    decode_entities(&s)
}

fn normalise_line_endings(input: &str) -> String {
    input.replace("\r\n", "\n").replace('\r', "\n")
}

fn strip_markup(input: &str) -> String {
    RE_TAG.replace_all(input, "").into_owned()
}

fn collapse_whitespace(input: &str) -> String {
    input
        .lines()
        .map(|line| RE_HSPACE.replace_all(line, " "))
        .map(|line| line.trim().to_string())
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn decode_entities(input: &str) -> String {
    input
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}
