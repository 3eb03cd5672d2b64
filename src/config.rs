//! Configuration types for question extraction.
//!
//! All extraction behaviour is controlled through [`ExtractionConfig`], built
//! via its [`ExtractionConfigBuilder`]. Sectional and non-sectional uploads go
//! through the same entry point; the only difference is whether
//! [`ExtractionConfig::sections`] is empty.

use crate::error::ExtractError;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// Configuration for an extraction run.
///
/// Built via [`ExtractionConfig::builder()`] or using
/// [`ExtractionConfig::default()`].
///
/// # Example
/// ```rust
/// use doc2mcq::{ExtractionConfig, SectionSpec};
///
/// let config = ExtractionConfig::builder()
///     .section(SectionSpec::new("English", 25))
///     .section(SectionSpec::new("Math", 25))
///     .default_marks(2)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ExtractionConfig {
    /// Named sections with target counts. Empty means a non-sectional test.
    pub sections: Vec<SectionSpec>,

    /// Mark value copied into every extracted question. Default: 1.
    pub default_marks: u32,

    /// What to do with a block that has no answer marker. Default: [`AnswerPolicy::DefaultToA`].
    pub answer_policy: AnswerPolicy,

    /// Number of documents extracted at once by [`crate::stream::extract_stream`]. Default: 4.
    ///
    /// Each document is a CPU-bound, self-contained computation, so this is
    /// effectively the number of blocking-pool threads the batch will occupy.
    pub concurrency: usize,

    /// Per-document time bound for batch extraction, in seconds. Default: none.
    ///
    /// A timed-out document yields [`ExtractError::Timeout`]; the pipeline is
    /// not resumable, so its partial work is discarded.
    pub timeout_secs: Option<u64>,

    /// Optional per-document progress events for batch extraction.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            sections: Vec::new(),
            default_marks: 1,
            answer_policy: AnswerPolicy::default(),
            concurrency: 4,
            timeout_secs: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ExtractionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractionConfig")
            .field("sections", &self.sections)
            .field("default_marks", &self.default_marks)
            .field("answer_policy", &self.answer_policy)
            .field("concurrency", &self.concurrency)
            .field("timeout_secs", &self.timeout_secs)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn ExtractionProgressCallback>"),
            )
            .finish()
    }
}

impl ExtractionConfig {
    /// Create a new builder for `ExtractionConfig`.
    pub fn builder() -> ExtractionConfigBuilder {
        ExtractionConfigBuilder {
            config: Self::default(),
        }
    }

    pub fn is_sectional(&self) -> bool {
        !self.sections.is_empty()
    }
}

/// Builder for [`ExtractionConfig`].
#[derive(Debug)]
pub struct ExtractionConfigBuilder {
    config: ExtractionConfig,
}

impl ExtractionConfigBuilder {
    pub fn section(mut self, spec: SectionSpec) -> Self {
        self.config.sections.push(spec);
        self
    }

    pub fn sections(mut self, specs: impl IntoIterator<Item = SectionSpec>) -> Self {
        self.config.sections.extend(specs);
        self
    }

    pub fn default_marks(mut self, marks: u32) -> Self {
        self.config.default_marks = marks;
        self
    }

    pub fn answer_policy(mut self, policy: AnswerPolicy) -> Self {
        self.config.answer_policy = policy;
        self
    }

    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.concurrency = n.max(1);
        self
    }

    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.config.timeout_secs = Some(secs);
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ExtractionConfig, ExtractError> {
        let c = &self.config;
        if c.concurrency == 0 {
            return Err(ExtractError::InvalidConfig("Concurrency must be ≥ 1".into()));
        }
        if c.timeout_secs == Some(0) {
            return Err(ExtractError::InvalidConfig("Timeout must be ≥ 1 second".into()));
        }
        let mut seen = HashSet::new();
        for spec in &c.sections {
            if spec.name.trim().is_empty() {
                return Err(ExtractError::InvalidConfig("Section names must not be empty".into()));
            }
            if !seen.insert(spec.name.as_str()) {
                return Err(ExtractError::InvalidConfig(format!(
                    "Duplicate section name '{}'",
                    spec.name
                )));
            }
        }
        Ok(self.config)
    }
}

// ── Sections ─────────────────────────────────────────────────────────────

/// A named section of a sectional test and how many questions it takes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionSpec {
    pub name: String,
    pub question_count: usize,
}

impl SectionSpec {
    pub fn new(name: impl Into<String>, question_count: usize) -> Self {
        Self {
            name: name.into(),
            question_count,
        }
    }
}

/// Parses `NAME:COUNT`, splitting on the last colon so names may contain one.
impl FromStr for SectionSpec {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, count) = s
            .rsplit_once(':')
            .ok_or_else(|| format!("expected NAME:COUNT, got '{s}'"))?;
        let name = name.trim();
        if name.is_empty() {
            return Err(format!("section name is empty in '{s}'"));
        }
        let count = count
            .trim()
            .parse::<usize>()
            .map_err(|_| format!("invalid question count '{}' in '{s}'", count.trim()))?;
        Ok(SectionSpec::new(name, count))
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Handling of blocks whose correct option is not marked.
///
/// Source documents routinely omit or garble the answer marker. The
/// historical behaviour is to assume `A` and flag the question as low
/// confidence; `Reject` drops such blocks instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AnswerPolicy {
    /// Use `A` and list the question in `Diagnostics::low_confidence`. (default)
    #[default]
    DefaultToA,
    /// Drop the block with [`crate::error::BlockRejection::MissingAnswer`].
    Reject,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = ExtractionConfig::default();
        assert!(!c.is_sectional());
        assert_eq!(c.default_marks, 1);
        assert_eq!(c.answer_policy, AnswerPolicy::DefaultToA);
        assert_eq!(c.concurrency, 4);
    }

    #[test]
    fn builder_clamps_concurrency() {
        let c = ExtractionConfig::builder().concurrency(0).build().unwrap();
        assert_eq!(c.concurrency, 1);
    }

    #[test]
    fn builder_rejects_duplicate_sections() {
        let err = ExtractionConfig::builder()
            .section(SectionSpec::new("Math", 2))
            .section(SectionSpec::new("Math", 3))
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("Duplicate section name 'Math'"));
    }

    #[test]
    fn builder_rejects_zero_timeout() {
        assert!(ExtractionConfig::builder().timeout_secs(0).build().is_err());
    }

    #[test]
    fn section_spec_from_str() {
        assert_eq!(
            "English:25".parse::<SectionSpec>().unwrap(),
            SectionSpec::new("English", 25)
        );
        assert_eq!(
            "Part A: Reasoning:10".parse::<SectionSpec>().unwrap(),
            SectionSpec::new("Part A: Reasoning", 10)
        );
        assert!("English".parse::<SectionSpec>().is_err());
        assert!(":5".parse::<SectionSpec>().is_err());
        assert!("Math:x".parse::<SectionSpec>().is_err());
    }
}
