//! Answer resolution: find the explicit correct-option marker.
//!
//! Only the tail after option D is searched, so a stem that happens to say
//! "the answer is..." cannot be mistaken for the key. Solution text is
//! skipped as well; a key written after the explanation is still found
//! because the solution ends at it. Accepts `Ans. b`, `Answer: C`,
//! `Correct answer is (d)`, `ANS - 2` and similar; digits 1–4 map to A–D.
//! Returning `None` leaves the fallback to the caller.

use crate::output::OptionLetter;
use crate::pipeline::solution;
use once_cell::sync::Lazy;
use regex::Regex;

static RE_ANSWER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(?:correct\s+answer|answer|ans)\s*[.:\-]?\s*(?:is\s*[:\-]?\s*)?(?:option\s*)?[(\[]?([a-d1-4])\b",
    )
    .unwrap()
});

fn find_marker(text: &str) -> Option<OptionLetter> {
    let caps = RE_ANSWER.captures(text)?;
    caps[1].chars().next().and_then(OptionLetter::from_marker)
}

/// Find the correct option in `tail`, outside any solution text.
pub fn resolve_answer(tail: &str) -> Option<OptionLetter> {
    match solution::locate(tail) {
        Some(span) => find_marker(&tail[..span.marker])
            .or_else(|| find_marker(&tail[span.text.end..])),
        None => find_marker(tail),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn common_marker_forms() {
        assert_eq!(resolve_answer("Ans. b Sol. basic addition"), Some(OptionLetter::B));
        assert_eq!(resolve_answer("Answer: C"), Some(OptionLetter::C));
        assert_eq!(resolve_answer("ANS:d"), Some(OptionLetter::D));
        assert_eq!(resolve_answer("Correct Answer is (a)"), Some(OptionLetter::A));
        assert_eq!(resolve_answer("answer - option [b]"), Some(OptionLetter::B));
    }

    #[test]
    fn digits_map_to_letters() {
        assert_eq!(resolve_answer("Ans: 1"), Some(OptionLetter::A));
        assert_eq!(resolve_answer("Answer 4"), Some(OptionLetter::D));
    }

    #[test]
    fn letter_must_stand_alone() {
        assert_eq!(resolve_answer("Answer: another guess"), None);
        assert_eq!(resolve_answer("Ans: 12"), None);
        assert_eq!(resolve_answer("Ans: e"), None);
    }

    #[test]
    fn no_marker() {
        assert_eq!(resolve_answer(""), None);
        assert_eq!(resolve_answer("Sol. because"), None);
    }

    #[test]
    fn key_after_solution_is_found() {
        assert_eq!(resolve_answer("Sol. adds up. Ans. b"), Some(OptionLetter::B));
        assert_eq!(resolve_answer("Solution: 2 and 2.\nAnswer: d"), Some(OptionLetter::D));
    }

    #[test]
    fn answer_prose_inside_solution_is_ignored() {
        assert_eq!(resolve_answer("Sol. the answer is 3 by addition"), None);
        assert_eq!(resolve_answer("Ans: c Explanation: the answer is 1 of many"), Some(OptionLetter::C));
    }
}
