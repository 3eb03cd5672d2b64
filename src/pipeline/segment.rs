//! Question segmentation: normalized text → one block per question.
//!
//! Boundary patterns are tried most specific first. The first pattern with
//! at least two matches in the whole text wins; earlier patterns are less
//! prone to false positives against stray numerals inside question bodies.
//! Each block runs from one boundary (inclusive) to the next (exclusive);
//! the last block runs to end of text. Text before the first boundary is a
//! preamble (titles, instructions) and belongs to no block.
//!
//! If no pattern qualifies, the whole text is one degenerate block. The
//! caller rejects it without looking for options: a lone question with no
//! numbering cannot be told apart from prose that happens to contain
//! `a.` through `d.`.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Which boundary convention segmented the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BoundaryKind {
    /// `Q.1`, `Q.1.`, `Q12.`
    QDotNumber,
    /// `Q 12`
    QSpaceNumber,
    /// `12.` at the start of a line
    LineNumber,
    /// `Question 12` (any case)
    QuestionWord,
    /// `Q12)`
    QParenNumber,
}

struct BoundaryPattern {
    kind: BoundaryKind,
    regex: Regex,
}

static BOUNDARY_PATTERNS: Lazy<Vec<BoundaryPattern>> = Lazy::new(|| {
    [
        (BoundaryKind::QDotNumber, r"\bQ(?:\.[ \t]*\d+\.?|\d+\.)"),
        (BoundaryKind::QSpaceNumber, r"\bQ[ \t]+\d+\b"),
        (BoundaryKind::LineNumber, r"(?m)^\d{1,4}\.(?:[ \t]|$)"),
        (BoundaryKind::QuestionWord, r"(?i)\bquestion[ \t]*(?:no\.?[ \t]*)?\d+[.:)]?"),
        (BoundaryKind::QParenNumber, r"\bQ\d+\)"),
    ]
    .into_iter()
    .map(|(kind, pattern)| BoundaryPattern {
        kind,
        regex: Regex::new(pattern).unwrap(),
    })
    .collect()
});

/// One candidate question: a slice of the normalized text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuestionBlock<'a> {
    /// 1-based position in segmentation order.
    pub number: usize,
    /// The whole block, boundary marker included.
    pub text: &'a str,
    /// Byte length of the leading boundary marker within `text`.
    pub marker_len: usize,
}

impl<'a> QuestionBlock<'a> {
    /// The block without its boundary marker.
    pub fn body(&self) -> &'a str {
        &self.text[self.marker_len..]
    }
}

/// Result of segmentation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segmentation<'a> {
    pub blocks: Vec<QuestionBlock<'a>>,
    /// `None` when no pattern matched at least twice.
    pub boundary: Option<BoundaryKind>,
    /// Text before the first boundary.
    pub preamble: &'a str,
}

impl Segmentation<'_> {
    pub fn is_degenerate(&self) -> bool {
        self.boundary.is_none()
    }
}

/// Split normalized text into question blocks.
pub fn segment(text: &str) -> Segmentation<'_> {
    for pattern in BOUNDARY_PATTERNS.iter() {
        let matches: Vec<(usize, usize)> = pattern
            .regex
            .find_iter(text)
            .map(|m| (m.start(), m.end()))
            .collect();
        if matches.len() < 2 {
            continue;
        }

        let blocks = matches
            .iter()
            .enumerate()
            .map(|(i, &(start, end))| {
                let stop = matches.get(i + 1).map_or(text.len(), |&(next, _)| next);
                QuestionBlock {
                    number: i + 1,
                    text: &text[start..stop],
                    marker_len: end - start,
                }
            })
            .collect::<Vec<_>>();
        let preamble = text[..matches[0].0].trim();
        if !preamble.is_empty() {
            debug!("Skipping {} chars of preamble before first question", preamble.len());
        }
        debug!("Segmented with {:?}: {} blocks", pattern.kind, blocks.len());
        return Segmentation {
            blocks,
            boundary: Some(pattern.kind),
            preamble,
        };
    }

    debug!("No boundary pattern matched twice; treating the text as one block");
    Segmentation {
        blocks: vec![QuestionBlock {
            number: 1,
            text,
            marker_len: 0,
        }],
        boundary: None,
        preamble: "",
    }
}
