//! # doc2mcq
//!
//! Extract structured multiple-choice questions from loosely formatted
//! word-processor documents.
//!
//! ## Why this crate?
//!
//! Question papers arrive as `.docx` files written by many different
//! authors: some number questions `Q.1.`, some `1.`, some `Question 1`;
//! options are `a.` or `(A)` or Word's automatic list numbering; the key is
//! `Ans. b` or `Correct answer is (B)`. This crate turns all of them into the
//! same records (stem, four options, correct letter, solution, inline
//! images) and tells you exactly which blocks it could not parse and why.
//!
//! ## Pipeline Overview
//!
//! ```text
//! bytes
//!  │
//!  ├─ 1. Load       sniff DOCX / HTML / text; images → IMAGE:<n> + table
//!  ├─ 2. Normalize  strip markup, collapse whitespace, decode entities
//!  ├─ 3. Segment    split at the first boundary style seen twice
//!  ├─ 4. Per block  options → answer → solution → [Image k] placeholders
//!  ├─ 5. Sections   optional greedy assignment to named sections
//!  └─ 6. Output     questions + per-block diagnostics
//! ```
//!
//! Only step 1 can fail the document ([`ExtractError::UnsupportedFormat`]);
//! every later stage drops bad blocks and records why in [`Diagnostics`].
//!
//! ## Quick Start
//!
//! ```rust
//! use doc2mcq::{extract, ExtractionConfig, OptionLetter};
//!
//! let paper = "Q.1. 2+2=? a. 3 b. 4 c. 5 d. 6 Ans. b Sol. basic addition\n\
//!              Q.2. Capital of France? a. Paris b. Rome c. Berlin d. Madrid Ans. a";
//! let output = extract(paper.as_bytes(), &ExtractionConfig::default()).unwrap();
//!
//! assert_eq!(output.questions.len(), 2);
//! assert_eq!(output.questions[0].correct_option, OptionLetter::B);
//! assert_eq!(output.diagnostics.blocks_accepted, 2);
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `doc2mcq` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library to avoid pulling in CLI-only deps:
//! ```toml
//! doc2mcq = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod extract;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod stream;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{AnswerPolicy, ExtractionConfig, ExtractionConfigBuilder, SectionSpec};
pub use error::{BlockRejection, ExtractError};
pub use extract::{extract, extract_document, extract_file, extract_to_file};
pub use output::{
    AnswerSource, BlockOutcome, BlockReport, Diagnostics, ExtractionOutput, Image, ImagePayload,
    OptionLetter, ParsedQuestion, PerOption, SectionSummary,
};
pub use pipeline::load::{MediaType, RawDocument};
pub use progress::{ExtractionProgressCallback, NoopProgressCallback, ProgressCallback};
pub use stream::{extract_stream, DocumentResult, DocumentStream};
