//! Pipeline stages for document-to-question extraction.
//!
//! Each submodule implements exactly one transformation step. Keeping stages
//! separate makes each independently testable and lets us swap a decoder
//! (e.g. add another document format) without touching the pattern stages.
//!
//! ## Data Flow
//!
//! ```text
//! load ──▶ normalize ──▶ segment ──▶ per block: options ─▶ answer ─▶ solution ─▶ images ──▶ sections
//! (bytes)  (clean text)  (blocks)              (stem+A–D)  (letter)  (worked)   ([Image k])  (optional)
//! ```
//!
//! 1. [`load`]      — sniff the format and decode it to rich text plus an
//!    image table; the only stage that can fail the whole document
//! 2. [`normalize`] — strip markup, collapse whitespace, decode entities
//! 3. [`segment`]   — split the text at question-number boundaries
//! 4. [`options`]   — find the stem and the four option texts
//! 5. [`answer`]    — read the correct-option marker from the block tail
//! 6. [`solution`]  — take the worked solution, if any
//! 7. [`images`]    — turn `IMAGE:<n>` tokens into per-field image lists
//! 8. [`sections`]  — partition the questions for sectional tests
//!
//! Stages 4–7 run per block and never fail the document; a block that does
//! not yield four options is dropped and recorded in the diagnostics.

pub mod answer;
pub mod docx;
pub mod images;
pub mod load;
pub mod normalize;
pub mod options;
pub mod sections;
pub mod segment;
pub mod solution;
