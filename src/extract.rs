//! Single-document extraction entry points.
//!
//! [`extract`] is the one pipeline every caller goes through, sectional or
//! not: it is synchronous, deterministic and touches no shared state. The
//! file helpers only add reading and atomic writing around it. Use
//! [`crate::stream::extract_stream`] to process many documents at once.

use crate::config::{AnswerPolicy, ExtractionConfig};
use crate::error::{BlockRejection, ExtractError};
use crate::output::{
    AnswerSource, BlockOutcome, BlockReport, Diagnostics, ExtractionOutput, Image, OptionLetter,
    ParsedQuestion, PerOption,
};
use crate::pipeline::load::{self, ImageTable, RawDocument};
use crate::pipeline::options::{self, OptionStyle};
use crate::pipeline::segment::{self, QuestionBlock};
use crate::pipeline::{answer, images, normalize, sections, solution};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Extract questions from document bytes of unknown format.
///
/// This is the primary entry point for the library. The format is sniffed
/// from the content (DOCX, HTML or UTF-8 text).
///
/// # Returns
/// `Ok(ExtractionOutput)` whenever the bytes could be decoded, even if no
/// question survived (check `output.diagnostics.blocks_accepted`).
///
/// # Errors
/// Only [`ExtractError::UnsupportedFormat`].
///
/// # Example
/// ```rust
/// use doc2mcq::{extract, ExtractionConfig, OptionLetter};
///
/// let text = "Q.1. 2+2=? a. 3 b. 4 c. 5 d. 6 Ans. b Sol. basic addition \
///             Q.2. Capital of France? a. Paris b. Rome c. Berlin d. Madrid Ans. a";
/// let output = extract(text.as_bytes(), &ExtractionConfig::default()).unwrap();
/// assert_eq!(output.questions.len(), 2);
/// assert_eq!(output.questions[0].correct_option, OptionLetter::B);
/// assert_eq!(output.questions[0].solution_text, "basic addition");
/// ```
pub fn extract(bytes: &[u8], config: &ExtractionConfig) -> Result<ExtractionOutput, ExtractError> {
    extract_document(RawDocument::sniff(bytes)?, config)
}

/// Extract questions from a document whose format is already known.
pub fn extract_document(
    doc: RawDocument<'_>,
    config: &ExtractionConfig,
) -> Result<ExtractionOutput, ExtractError> {
    let start = Instant::now();
    info!("Starting extraction: {} ({} bytes)", doc.media_type, doc.bytes.len());

    // ── Step 1: Load ─────────────────────────────────────────────────────
    let loaded = load::load(doc)?;

    // ── Step 2: Normalize ────────────────────────────────────────────────
    let text = normalize::normalize(&loaded.rich_text);
    debug!("Normalized text: {} chars", text.len());

    // ── Step 3: Segment ──────────────────────────────────────────────────
    let segmentation = segment::segment(&text);
    if segmentation.is_degenerate() {
        warn!("No question numbering found; the document cannot be split into questions");
    }

    // ── Step 4: Per-block extraction ─────────────────────────────────────
    let mut questions: Vec<ParsedQuestion> = Vec::new();
    let mut reports = Vec::with_capacity(segmentation.blocks.len());
    let mut rejected_reasons = Vec::new();
    let mut low_confidence = Vec::new();

    for block in &segmentation.blocks {
        let parsed = if segmentation.is_degenerate() {
            BlockParse::rejected(
                None,
                BlockRejection::NoQuestionBoundaries { block: block.number },
            )
        } else {
            parse_block(block, &loaded.images, config)
        };
        let outcome = match parsed.result {
            Ok(mut question) => {
                let sequence_number = questions.len() + 1;
                question.sequence_number = sequence_number;
                if parsed.answer_source == Some(AnswerSource::Defaulted) {
                    low_confidence.push(sequence_number);
                }
                questions.push(question);
                BlockOutcome::Accepted { sequence_number }
            }
            Err(reason) => {
                warn!("{}", reason);
                rejected_reasons.push(reason.to_string());
                BlockOutcome::Rejected { reason }
            }
        };
        reports.push(BlockReport {
            block: block.number,
            option_style: parsed.style,
            answer_source: parsed.answer_source,
            outcome,
        });
    }

    // ── Step 5: Sections ─────────────────────────────────────────────────
    let mut section_summaries = Vec::new();
    if config.is_sectional() {
        let assigned = sections::assign(questions, &config.sections);
        section_summaries = assigned.iter().map(sections::Section::summary).collect();
        questions = assigned.into_iter().flat_map(|s| s.questions).collect();
    }

    // ── Step 6: Diagnostics ──────────────────────────────────────────────
    let diagnostics = Diagnostics {
        media_type: loaded.media_type,
        boundary_pattern: segmentation.boundary,
        degenerate: segmentation.is_degenerate(),
        preamble: segmentation.preamble.to_string(),
        blocks_seen: segmentation.blocks.len(),
        blocks_accepted: questions.len(),
        rejected_reasons,
        low_confidence,
        blocks: reports,
        sections: section_summaries,
        duration_ms: start.elapsed().as_millis() as u64,
    };

    info!(
        "Extraction complete: {}/{} blocks accepted, {} low confidence, {}ms",
        diagnostics.blocks_accepted,
        diagnostics.blocks_seen,
        diagnostics.low_confidence.len(),
        diagnostics.duration_ms
    );

    Ok(ExtractionOutput {
        questions,
        diagnostics,
    })
}

/// Read a document from disk and extract it.
///
/// # Errors
/// [`ExtractError::FileNotFound`], [`ExtractError::PermissionDenied`] or
/// [`ExtractError::ReadFailed`] when the file cannot be read, otherwise as
/// [`extract`].
pub async fn extract_file(
    path: impl AsRef<Path>,
    config: &ExtractionConfig,
) -> Result<ExtractionOutput, ExtractError> {
    let bytes = read_document(path.as_ref()).await?;
    extract(&bytes, config)
}

/// Extract a document and write the output as pretty JSON.
///
/// Uses atomic write (temp file + rename) to prevent partial files.
pub async fn extract_to_file(
    input: impl AsRef<Path>,
    output_path: impl AsRef<Path>,
    config: &ExtractionConfig,
) -> Result<Diagnostics, ExtractError> {
    let output = extract_file(input, config).await?;
    let path = output_path.as_ref();
    let json = serde_json::to_vec_pretty(&output)
        .map_err(|e| ExtractError::Internal(format!("JSON serialisation failed: {e}")))?;
    write_atomic(path, &json).await?;
    Ok(output.diagnostics)
}

// ── Internal helpers ─────────────────────────────────────────────────────

/// Read a whole document, mapping I/O failures to typed errors.
pub(crate) async fn read_document(path: &Path) -> Result<Vec<u8>, ExtractError> {
    tokio::fs::read(path).await.map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => ExtractError::FileNotFound {
            path: path.to_path_buf(),
        },
        std::io::ErrorKind::PermissionDenied => ExtractError::PermissionDenied {
            path: path.to_path_buf(),
        },
        _ => ExtractError::ReadFailed {
            path: path.to_path_buf(),
            source: e,
        },
    })
}

/// Write `contents` to `path` via a sibling temp file and a rename, creating
/// parent directories as needed.
pub async fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), ExtractError> {
    let write_err = |e: std::io::Error| ExtractError::OutputWriteFailed {
        path: path.to_path_buf(),
        source: e,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
    }

    let tmp_path = tmp_path_for(path);
    tokio::fs::write(&tmp_path, contents).await.map_err(write_err)?;
    tokio::fs::rename(&tmp_path, path).await.map_err(write_err)
}

fn tmp_path_for(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

/// What the per-block stages made of one block.
struct BlockParse {
    style: Option<OptionStyle>,
    answer_source: Option<AnswerSource>,
    /// Sequence number is filled in by the caller once the block is kept.
    result: Result<ParsedQuestion, BlockRejection>,
}

impl BlockParse {
    fn rejected(style: Option<OptionStyle>, reason: BlockRejection) -> Self {
        Self {
            style,
            answer_source: None,
            result: Err(reason),
        }
    }
}

fn parse_block(block: &QuestionBlock<'_>, table: &ImageTable, config: &ExtractionConfig) -> BlockParse {
    let body = block.body();

    let Some(opts) = options::extract_options(body) else {
        let found = options::markers_found(body);
        let reason = if found == 0 {
            BlockRejection::NoOptionMarkers { block: block.number }
        } else {
            BlockRejection::IncompleteOptions {
                block: block.number,
                found,
            }
        };
        return BlockParse::rejected(None, reason);
    };
    debug!("Block {}: options matched as {:?}", block.number, opts.style);

    if let Some(letter) = opts.first_empty() {
        return BlockParse::rejected(
            Some(opts.style),
            BlockRejection::EmptyOption {
                block: block.number,
                letter,
            },
        );
    }

    let (correct_option, answer_source) = match answer::resolve_answer(opts.tail) {
        Some(letter) => (letter, AnswerSource::Explicit),
        None => match config.answer_policy {
            AnswerPolicy::Reject => {
                return BlockParse::rejected(
                    Some(opts.style),
                    BlockRejection::MissingAnswer { block: block.number },
                );
            }
            AnswerPolicy::DefaultToA => {
                warn!("Block {}: no answer marker, defaulting to A", block.number);
                (OptionLetter::A, AnswerSource::Defaulted)
            }
        },
    };

    // ── Images, field by field ──
    let (question_text, question_images) = images::associate(opts.stem.trim(), table);
    let mut option_images: PerOption<Vec<Image>> = PerOption::default();
    let option_texts = opts.texts.map(|letter, text| {
        let (display, imgs) = images::associate(text, table);
        *option_images.get_mut(letter) = imgs.collect();
        display
    });
    let (solution_text, solution_images) =
        images::associate(solution::extract_solution(opts.tail), table);

    let question = ParsedQuestion {
        sequence_number: 0,
        question_text,
        options: option_texts,
        correct_option,
        solution_text,
        question_images: question_images.collect(),
        option_images,
        solution_images: solution_images.collect(),
        section_name: None,
        marks: config.default_marks,
    };

    BlockParse {
        style: Some(opts.style),
        answer_source: Some(answer_source),
        result: Ok(question),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SectionSpec;
    use crate::pipeline::load::MediaType;

    const SCENARIO: &str = "Q.1. 2+2=? a. 3 b. 4 c. 5 d. 6 Ans. b Sol. basic addition \
                            Q.2. Capital of France? a. Paris b. Rome c. Berlin d. Madrid Ans. a";

    #[test]
    fn scenario_yields_two_questions() {
        let out = extract(SCENARIO.as_bytes(), &ExtractionConfig::default()).unwrap();
        assert_eq!(out.questions.len(), 2);

        let q1 = &out.questions[0];
        assert_eq!(q1.sequence_number, 1);
        assert_eq!(q1.question_text, "2+2=?");
        assert_eq!(q1.options.b, "4");
        assert_eq!(q1.correct_option, OptionLetter::B);
        assert_eq!(q1.solution_text, "basic addition");
        assert_eq!(q1.marks, 1);

        let q2 = &out.questions[1];
        assert_eq!(q2.sequence_number, 2);
        assert_eq!(q2.question_text, "Capital of France?");
        assert_eq!(q2.correct_option, OptionLetter::A);
        assert_eq!(q2.solution_text, "");
        assert_eq!(q2.options.d, "Madrid");

        assert_eq!(out.diagnostics.blocks_seen, 2);
        assert_eq!(out.diagnostics.blocks_accepted, 2);
        assert!(out.diagnostics.low_confidence.is_empty());
    }

    #[test]
    fn unnumbered_question_is_rejected() {
        let out = extract(
            "What is 2+2? a. 3 b. 4 c. 5 d. 6 Ans. b".as_bytes(),
            &ExtractionConfig::default(),
        )
        .unwrap();
        assert!(out.questions.is_empty());
        assert!(out.diagnostics.degenerate);
        assert_eq!(out.diagnostics.blocks_seen, 1);
        assert_eq!(out.diagnostics.blocks_accepted, 0);
        assert_eq!(
            out.diagnostics.blocks[0].outcome,
            BlockOutcome::Rejected {
                reason: BlockRejection::NoQuestionBoundaries { block: 1 }
            }
        );
        assert_eq!(out.diagnostics.blocks[0].option_style, None);
    }

    #[test]
    fn preamble_is_reported() {
        let text = format!("Physics Paper 1\n{SCENARIO}");
        let out = extract(text.as_bytes(), &ExtractionConfig::default()).unwrap();
        assert_eq!(out.diagnostics.preamble, "Physics Paper 1");
        assert_eq!(out.questions.len(), 2);
    }

    #[test]
    fn lower_case_key_is_read() {
        let text = "Q.1. x? a. w b. x c. y d. z answer c \
                    Q.2. y? a. w b. x c. y d. z ans d";
        let out = extract(text.as_bytes(), &ExtractionConfig::default()).unwrap();
        assert_eq!(out.questions[0].options.d, "z");
        assert_eq!(out.questions[0].correct_option, OptionLetter::C);
        assert_eq!(out.questions[1].correct_option, OptionLetter::D);
        assert!(out.diagnostics.low_confidence.is_empty());
    }

    #[test]
    fn answer_prose_in_solution_is_not_a_key() {
        let text = "Q.1. 1+2=? a. 1 b. 2 c. 3 d. 4 Sol. the answer is 3 by addition \
                    Q.2. 2+2=? a. 1 b. 2 c. 3 d. 4 Ans. d";
        let out = extract(text.as_bytes(), &ExtractionConfig::default()).unwrap();
        assert_eq!(out.questions[0].correct_option, OptionLetter::A);
        assert_eq!(out.questions[0].solution_text, "the answer is 3 by addition");
        assert_eq!(out.diagnostics.low_confidence, vec![1]);
    }

    #[test]
    fn sequence_numbers_skip_rejected_blocks() {
        let text = "Q.1. first a. w b. x c. y d. z Ans. a \
                    Q.2. broken a. w b. x \
                    Q.3. third a. w b. x c. y d. z Ans. c";
        let out = extract(text.as_bytes(), &ExtractionConfig::default()).unwrap();
        let numbers: Vec<usize> = out.questions.iter().map(|q| q.sequence_number).collect();
        assert_eq!(numbers, vec![1, 2]);
        assert_eq!(out.questions[1].question_text, "third");
        assert_eq!(out.diagnostics.blocks_seen, 3);
        assert_eq!(
            out.diagnostics.rejected_reasons,
            vec!["Block 2: only 2 of 4 options found".to_string()]
        );
        assert_eq!(
            out.diagnostics.blocks[1].outcome,
            BlockOutcome::Rejected {
                reason: BlockRejection::IncompleteOptions { block: 2, found: 2 }
            }
        );
    }

    #[test]
    fn strict_policy_rejects_missing_answer() {
        let text = "Q.1. one a. w b. x c. y d. z Q.2. two a. w b. x c. y d. z Ans. d";
        let config = ExtractionConfig::builder()
            .answer_policy(AnswerPolicy::Reject)
            .build()
            .unwrap();
        let out = extract(text.as_bytes(), &config).unwrap();
        assert_eq!(out.questions.len(), 1);
        assert_eq!(out.questions[0].correct_option, OptionLetter::D);
        assert_eq!(out.diagnostics.rejected_reasons, vec!["Block 1: no answer marker found"]);

        let lenient = extract(text.as_bytes(), &ExtractionConfig::default()).unwrap();
        assert_eq!(lenient.questions.len(), 2);
        assert_eq!(lenient.diagnostics.low_confidence, vec![1]);
        assert_eq!(
            lenient.diagnostics.blocks[0].answer_source,
            Some(AnswerSource::Defaulted)
        );
    }

    #[test]
    fn empty_option_rejects_block() {
        let text = "Q.1. one a. w b. c. y d. z Ans. a Q.2. two a. w b. x c. y d. z Ans. a";
        let out = extract(text.as_bytes(), &ExtractionConfig::default()).unwrap();
        assert_eq!(out.questions.len(), 1);
        assert_eq!(out.diagnostics.rejected_reasons, vec!["Block 1: option B is empty"]);
    }

    #[test]
    fn sections_tag_questions_and_summarise() {
        let text = (1..=3)
            .map(|i| format!("Q.{i}. q{i} a. w b. x c. y d. z Ans. b"))
            .collect::<Vec<_>>()
            .join("\n");
        let config = ExtractionConfig::builder()
            .section(SectionSpec::new("English", 2))
            .default_marks(4)
            .build()
            .unwrap();
        let out = extract(text.as_bytes(), &config).unwrap();
        let names: Vec<Option<&str>> = out
            .questions
            .iter()
            .map(|q| q.section_name.as_deref())
            .collect();
        assert_eq!(names, vec![Some("English"), Some("English"), None]);
        assert!(out.questions.iter().all(|q| q.marks == 4));
        assert_eq!(out.diagnostics.sections.len(), 2);
        assert_eq!(out.diagnostics.sections[0].assigned, 2);
        assert_eq!(out.diagnostics.sections[1].name, None);
    }

    #[test]
    fn plain_text_comparison_survives() {
        let text = "Q.1. Is 2 < 3? a. yes b. no c. maybe d. never Ans. a \
                    Q.2. Is 5 > 3 & 1 < 2? a. yes b. no c. maybe d. never Ans. a";
        let doc = RawDocument::new(text.as_bytes(), MediaType::PlainText);
        let out = extract_document(doc, &ExtractionConfig::default()).unwrap();
        assert_eq!(out.questions[0].question_text, "Is 2 < 3?");
        assert_eq!(out.questions[1].question_text, "Is 5 > 3 & 1 < 2?");
    }

    #[test]
    fn tmp_path_keeps_directory() {
        assert_eq!(
            tmp_path_for(Path::new("out/result.json")),
            PathBuf::from("out/result.json.tmp")
        );
    }
}
