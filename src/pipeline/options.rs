//! Option extraction: question block → stem + four option texts.
//!
//! Option-marker styles are tried in rank order; a style matches only if all
//! four markers appear in order. The fourth option runs until the first
//! answer/solution marker or the end of the block. The first style that
//! matches wins. No match is not an error: the caller drops the block.

use crate::output::{OptionLetter, PerOption};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// The option-marker convention a block used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OptionStyle {
    /// `a. b. c. d.`
    LowerDot,
    /// `A) B) C) D)`
    UpperParen,
    /// `(A) (B) (C) (D)`
    ParenUpper,
    /// `1. 2. 3. 4.`
    NumberDot,
    /// `A. B. C. D.`
    UpperDot,
    /// `a) b) c) d)`
    LowerParen,
    /// `(a) (b) (c) (d)`
    ParenLower,
}

impl OptionStyle {
    /// Rank order, most trusted first.
    const RANKED: [OptionStyle; 7] = [
        OptionStyle::LowerDot,
        OptionStyle::UpperParen,
        OptionStyle::ParenUpper,
        OptionStyle::NumberDot,
        OptionStyle::UpperDot,
        OptionStyle::LowerParen,
        OptionStyle::ParenLower,
    ];

    /// Regex fragment matching the marker of `letter` in this style.
    fn marker(self, letter: OptionLetter) -> String {
        let upper = letter.as_char();
        let lower = upper.to_ascii_lowercase();
        let digit = letter.index() + 1;
        match self {
            OptionStyle::LowerDot => format!(r"\b{lower}\."),
            OptionStyle::UpperParen => format!(r"(?:^|[^(\w]){upper}\)"),
            OptionStyle::ParenUpper => format!(r"\({upper}\)"),
            OptionStyle::NumberDot => format!(r"\b{digit}\.(?:\s|$)"),
            OptionStyle::UpperDot => format!(r"\b{upper}\."),
            OptionStyle::LowerParen => format!(r"(?:^|[^(\w]){lower}\)"),
            OptionStyle::ParenLower => format!(r"\({lower}\)"),
        }
    }
}

/// Where option D stops: the first answer or solution marker, in any case.
pub(crate) const TERMINATOR: &str =
    r"(?i:\b(?:correct\s+answer|answer|ans|solution|sol|explanation)\b)";

/// Runs of single-letter abbreviations (`a.m.`, `U.S.A.`), whose letters
/// would otherwise read as dotted option markers.
static RE_ABBREVIATION: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(?:[A-Za-z]\.){2,}").unwrap());

/// Replace the dots of abbreviation runs with `_`. Byte offsets are
/// unchanged, so matches on the result slice the original text.
fn mask_abbreviations(body: &str) -> Cow<'_, str> {
    RE_ABBREVIATION.replace_all(body, |caps: &Captures<'_>| caps[0].replace('.', "_"))
}

struct OptionPattern {
    style: OptionStyle,
    markers: [Regex; 4],
    full: Regex,
}

static OPTION_PATTERNS: Lazy<Vec<OptionPattern>> = Lazy::new(|| {
    OptionStyle::RANKED
        .into_iter()
        .map(|style| {
            let [a, b, c, d] = OptionLetter::ALL.map(|l| style.marker(l));
            let full = format!(
                r"(?s)^(?P<stem>.*?){a}(?P<a>.*?){b}(?P<b>.*?){c}(?P<c>.*?){d}(?P<d>.*?)(?P<tail>{TERMINATOR}.*)?$"
            );
            OptionPattern {
                style,
                markers: OptionLetter::ALL.map(|l| Regex::new(&style.marker(l)).unwrap()),
                full: Regex::new(&full).unwrap(),
            }
        })
        .collect()
});

/// Options found in a block body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedOptions<'a> {
    pub style: OptionStyle,
    /// Text before the first option marker: the question itself.
    pub stem: &'a str,
    /// Trimmed option texts; may be empty, which the caller rejects.
    pub texts: PerOption<&'a str>,
    /// From the first answer/solution marker after option D to the end.
    pub tail: &'a str,
}

impl ExtractedOptions<'_> {
    pub fn first_empty(&self) -> Option<OptionLetter> {
        self.texts
            .iter()
            .find(|(_, text)| text.is_empty())
            .map(|(letter, _)| letter)
    }
}

/// Extract the four options from a block body (boundary marker excluded).
pub fn extract_options<'a>(body: &'a str) -> Option<ExtractedOptions<'a>> {
    let masked = mask_abbreviations(body);
    OPTION_PATTERNS.iter().find_map(|pattern| {
        let caps = pattern.full.captures(&masked)?;
        let group = |name: &str| -> &'a str { caps.name(name).map_or("", |m| &body[m.range()]) };
        Some(ExtractedOptions {
            style: pattern.style,
            stem: group("stem"),
            texts: PerOption {
                a: group("a").trim(),
                b: group("b").trim(),
                c: group("c").trim(),
                d: group("d").trim(),
            },
            tail: group("tail"),
        })
    })
}

/// Most option markers any style finds in order; used to explain a miss.
pub fn markers_found(body: &str) -> usize {
    let masked = mask_abbreviations(body);
    OPTION_PATTERNS
        .iter()
        .map(|pattern| {
            let mut pos = 0;
            let mut found = 0;
            for marker in &pattern.markers {
                match marker.find_at(&masked, pos) {
                    Some(m) => {
                        found += 1;
                        pos = m.end();
                    }
                    None => break,
                }
            }
            found
        })
        .max()
        .unwrap_or(0)
}
