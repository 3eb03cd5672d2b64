//! Output types: the structured questions and the per-run diagnostics.
//!
//! Everything here is plain data. Ownership of an [`ExtractionOutput`]
//! passes entirely to the caller, who decides how to persist it; JSON field
//! names are camelCase so the serialised form can be handed straight to a
//! storage or HTTP layer.

use crate::error::BlockRejection;
use crate::pipeline::load::MediaType;
use crate::pipeline::options::OptionStyle;
use crate::pipeline::segment::BoundaryKind;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

// ── Option letters ───────────────────────────────────────────────────────

/// One of the four answer choices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum OptionLetter {
    #[default]
    A,
    B,
    C,
    D,
}

impl OptionLetter {
    pub const ALL: [OptionLetter; 4] = [OptionLetter::A, OptionLetter::B, OptionLetter::C, OptionLetter::D];

    /// Parse `a`–`d` (either case) or `1`–`4`.
    pub fn from_marker(c: char) -> Option<Self> {
        match c.to_ascii_uppercase() {
            'A' | '1' => Some(OptionLetter::A),
            'B' | '2' => Some(OptionLetter::B),
            'C' | '3' => Some(OptionLetter::C),
            'D' | '4' => Some(OptionLetter::D),
            _ => None,
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn as_char(self) -> char {
        (b'A' + self as u8) as char
    }
}

impl fmt::Display for OptionLetter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// One value per option letter.
///
/// Used for the option texts and for the per-option image lists, so the two
/// can never disagree about which letters exist.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PerOption<T> {
    #[serde(rename = "A")]
    pub a: T,
    #[serde(rename = "B")]
    pub b: T,
    #[serde(rename = "C")]
    pub c: T,
    #[serde(rename = "D")]
    pub d: T,
}

impl<T> PerOption<T> {
    pub fn get(&self, letter: OptionLetter) -> &T {
        match letter {
            OptionLetter::A => &self.a,
            OptionLetter::B => &self.b,
            OptionLetter::C => &self.c,
            OptionLetter::D => &self.d,
        }
    }

    pub fn get_mut(&mut self, letter: OptionLetter) -> &mut T {
        match letter {
            OptionLetter::A => &mut self.a,
            OptionLetter::B => &mut self.b,
            OptionLetter::C => &mut self.c,
            OptionLetter::D => &mut self.d,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (OptionLetter, &T)> {
        OptionLetter::ALL.into_iter().map(move |l| (l, self.get(l)))
    }

    pub fn map<U>(self, mut f: impl FnMut(OptionLetter, T) -> U) -> PerOption<U> {
        PerOption {
            a: f(OptionLetter::A, self.a),
            b: f(OptionLetter::B, self.b),
            c: f(OptionLetter::C, self.c),
            d: f(OptionLetter::D, self.d),
        }
    }
}

// ── Images ───────────────────────────────────────────────────────────────

/// A decoded inline image, base64-encoded for transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImagePayload {
    /// MIME type, e.g. `image/png`.
    pub content_type: String,
    /// Standard base64 of the raw image bytes.
    pub data: String,
}

impl ImagePayload {
    pub fn from_bytes(bytes: &[u8], content_type: impl Into<String>) -> Self {
        Self {
            content_type: content_type.into(),
            data: STANDARD.encode(bytes),
        }
    }

    /// `data:` URI suitable for an `<img src>`.
    pub fn data_uri(&self) -> String {
        format!("data:{};base64,{}", self.content_type, self.data)
    }

    pub fn decode(&self) -> Result<Vec<u8>, base64::DecodeError> {
        STANDARD.decode(&self.data)
    }
}

/// Images shared with the document's image table; cloning is a refcount bump.
pub type Image = Arc<ImagePayload>;

// ── Questions ────────────────────────────────────────────────────────────

/// A fully extracted multiple-choice question.
///
/// Every question in an [`ExtractionOutput`] has four non-empty options;
/// blocks that could not produce them are dropped and reported in
/// [`Diagnostics`] instead. Image lists are positionally aligned with the
/// `[Image n]` placeholders left in the matching text field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedQuestion {
    /// 1-based position in the final output, dense across the whole list.
    pub sequence_number: usize,
    pub question_text: String,
    pub options: PerOption<String>,
    pub correct_option: OptionLetter,
    /// Empty when the block carried no solution marker.
    pub solution_text: String,
    pub question_images: Vec<Image>,
    pub option_images: PerOption<Vec<Image>>,
    pub solution_images: Vec<Image>,
    /// Set only when sections were requested; `None` for unsectioned questions.
    pub section_name: Option<String>,
    pub marks: u32,
}

impl ParsedQuestion {
    /// The same question placed into a named section.
    pub fn with_section(self, name: impl Into<String>) -> Self {
        Self {
            section_name: Some(name.into()),
            ..self
        }
    }

    pub fn correct_text(&self) -> &str {
        self.options.get(self.correct_option)
    }
}

// ── Diagnostics ──────────────────────────────────────────────────────────

/// Where the correct-option letter came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AnswerSource {
    /// An explicit `Ans.` / `Answer:` marker was found.
    Explicit,
    /// No marker; the letter defaulted to `A`. Low confidence.
    Defaulted,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "status")]
pub enum BlockOutcome {
    Accepted { sequence_number: usize },
    Rejected { reason: BlockRejection },
}

/// What happened to one candidate block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockReport {
    /// 1-based block number in segmentation order.
    pub block: usize,
    pub option_style: Option<OptionStyle>,
    pub answer_source: Option<AnswerSource>,
    pub outcome: BlockOutcome,
}

/// How many questions one section asked for and received.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionSummary {
    /// `None` for the implicit unsectioned bucket.
    pub name: Option<String>,
    /// Declared question count; `None` for the unsectioned bucket.
    pub target: Option<usize>,
    pub assigned: usize,
}

/// Per-run record of what the pipeline saw and why blocks were dropped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostics {
    pub media_type: MediaType,
    /// Boundary pattern that segmented the text; `None` when segmentation
    /// fell back to a single block.
    pub boundary_pattern: Option<BoundaryKind>,
    pub degenerate: bool,
    /// Text before the first question boundary (titles, instructions).
    pub preamble: String,
    pub blocks_seen: usize,
    pub blocks_accepted: usize,
    pub rejected_reasons: Vec<String>,
    /// Sequence numbers whose answer letter was defaulted.
    pub low_confidence: Vec<usize>,
    pub blocks: Vec<BlockReport>,
    pub sections: Vec<SectionSummary>,
    pub duration_ms: u64,
}

impl Diagnostics {
    /// `true` when the document was readable but produced no questions.
    pub fn nothing_extracted(&self) -> bool {
        self.blocks_accepted == 0
    }
}

/// Result of one extraction call.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionOutput {
    pub questions: Vec<ParsedQuestion>,
    pub diagnostics: Diagnostics,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn option_letter_from_marker() {
        assert_eq!(OptionLetter::from_marker('b'), Some(OptionLetter::B));
        assert_eq!(OptionLetter::from_marker('D'), Some(OptionLetter::D));
        assert_eq!(OptionLetter::from_marker('3'), Some(OptionLetter::C));
        assert_eq!(OptionLetter::from_marker('e'), None);
        assert_eq!(OptionLetter::from_marker('5'), None);
    }

    #[test]
    fn per_option_serialises_with_letter_keys() {
        let opts = PerOption {
            a: "Paris".to_string(),
            b: "Rome".to_string(),
            c: "Berlin".to_string(),
            d: "Madrid".to_string(),
        };
        let json = serde_json::to_value(&opts).unwrap();
        assert_eq!(json["A"], "Paris");
        assert_eq!(json["D"], "Madrid");
        assert_eq!(opts.get(OptionLetter::C), "Berlin");
    }

    #[test]
    fn image_payload_data_uri_and_decode() {
        let img = ImagePayload::from_bytes(b"\x89PNG", "image/png");
        assert!(img.data_uri().starts_with("data:image/png;base64,"));
        assert_eq!(img.decode().unwrap(), b"\x89PNG");
    }

    #[test]
    fn with_section_keeps_everything_else() {
        let q = ParsedQuestion {
            sequence_number: 4,
            question_text: "2+2=?".into(),
            options: PerOption::default(),
            correct_option: OptionLetter::B,
            solution_text: String::new(),
            question_images: vec![],
            option_images: PerOption::default(),
            solution_images: vec![],
            section_name: None,
            marks: 2,
        };
        let moved = q.clone().with_section("Math");
        assert_eq!(moved.section_name.as_deref(), Some("Math"));
        assert_eq!(moved.sequence_number, 4);
        assert_eq!(moved.marks, 2);
    }
}
