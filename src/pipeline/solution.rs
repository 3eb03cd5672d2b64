//! Solution extraction: the worked explanation after a `Sol.` marker.
//!
//! The solution runs from its marker to the end of the block, or to a later
//! answer marker when the key is written after the explanation. A block
//! without a solution marker has an empty solution; that is not an error.

use once_cell::sync::Lazy;
use regex::Regex;
use std::ops::Range;

static RE_SOLUTION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:solution|sol|explanation)\b\s*[.:\-]?\s*").unwrap()
});

/// Answer markers that close a solution. Stricter than answer resolution
/// so prose like "the answer is a sum" inside an explanation survives.
static RE_ANSWER_AFTER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?:Correct\s+[Aa]nswer|CORRECT\s+ANSWER|Answer|ANSWER|Ans|ANS)\s*[.:\-]").unwrap()
});

/// Where the solution sits in a block tail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SolutionSpan {
    /// Byte offset of the `Sol.`/`Solution` marker.
    pub marker: usize,
    /// The solution text, marker excluded, untrimmed.
    pub text: Range<usize>,
}

pub(crate) fn locate(tail: &str) -> Option<SolutionSpan> {
    let marker = RE_SOLUTION.find(tail)?;
    let rest = &tail[marker.end()..];
    let len = RE_ANSWER_AFTER.find(rest).map_or(rest.len(), |m| m.start());
    Some(SolutionSpan {
        marker: marker.start(),
        text: marker.end()..marker.end() + len,
    })
}

/// Extract the solution text from a block tail. Empty if absent.
pub fn extract_solution(tail: &str) -> &str {
    locate(tail).map_or("", |span| tail[span.text].trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn solution_after_answer() {
        assert_eq!(extract_solution("Ans. b Sol. basic addition "), "basic addition");
    }

    #[test]
    fn solution_before_answer_stops_at_it() {
        assert_eq!(
            extract_solution("Solution: 2 and 2 make 4.\nAnswer: b"),
            "2 and 2 make 4."
        );
    }

    #[test]
    fn answer_prose_inside_explanation_is_kept() {
        assert_eq!(
            extract_solution("Ans: c Explanation: the answer is a sum of parts"),
            "the answer is a sum of parts"
        );
    }

    #[test]
    fn multiline_solution() {
        assert_eq!(
            extract_solution("Ans. a\nSOL. first line\nsecond line IMAGE:2"),
            "first line\nsecond line IMAGE:2"
        );
    }

    #[test]
    fn absent_solution_is_empty() {
        assert_eq!(extract_solution("Ans. a"), "");
        assert_eq!(extract_solution(""), "");
        // "solve" is not a solution marker.
        assert_eq!(extract_solution("Ans. a solve it"), "");
    }
}
