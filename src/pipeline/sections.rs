//! Section assignment for sectional tests.
//!
//! Greedy and single-pass: questions are consumed in order, each declared
//! section is filled up to its count before the next one starts, and any
//! remainder lands in an unsectioned bucket instead of being dropped.

use crate::config::SectionSpec;
use crate::output::{ParsedQuestion, SectionSummary};
use tracing::warn;

/// Questions placed into one section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    /// `None` for the unsectioned remainder.
    pub name: Option<String>,
    /// Declared count; `None` for the unsectioned remainder.
    pub target: Option<usize>,
    pub questions: Vec<ParsedQuestion>,
}

impl Section {
    pub fn summary(&self) -> SectionSummary {
        SectionSummary {
            name: self.name.clone(),
            target: self.target,
            assigned: self.questions.len(),
        }
    }
}

/// Partition `questions` across `specs`, preserving order.
///
/// Every declared section is returned, even when it receives nothing. The
/// unsectioned bucket is appended only when there is a remainder.
pub fn assign(questions: Vec<ParsedQuestion>, specs: &[SectionSpec]) -> Vec<Section> {
    let mut remaining = questions.into_iter();
    let mut sections: Vec<Section> = specs
        .iter()
        .map(|spec| {
            let questions: Vec<ParsedQuestion> = remaining
                .by_ref()
                .take(spec.question_count)
                .map(|q| q.with_section(spec.name.as_str()))
                .collect();
            if questions.len() < spec.question_count {
                warn!(
                    "Section '{}' wanted {} questions, only {} available",
                    spec.name,
                    spec.question_count,
                    questions.len()
                );
            }
            Section {
                name: Some(spec.name.clone()),
                target: Some(spec.question_count),
                questions,
            }
        })
        .collect();

    let rest: Vec<ParsedQuestion> = remaining
        .map(|q| ParsedQuestion {
            section_name: None,
            ..q
        })
        .collect();
    if !rest.is_empty() {
        warn!(
            "{} questions exceed the declared section counts; keeping them unsectioned",
            rest.len()
        );
        sections.push(Section {
            name: None,
            target: None,
            questions: rest,
        });
    }
    sections
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::{OptionLetter, PerOption};

    fn question(n: usize) -> ParsedQuestion {
        ParsedQuestion {
            sequence_number: n,
            question_text: format!("question {n}"),
            options: PerOption {
                a: "w".into(),
                b: "x".into(),
                c: "y".into(),
                d: "z".into(),
            },
            correct_option: OptionLetter::A,
            solution_text: String::new(),
            question_images: vec![],
            option_images: PerOption::default(),
            solution_images: vec![],
            section_name: None,
            marks: 1,
        }
    }

    fn numbers(section: &Section) -> Vec<usize> {
        section.questions.iter().map(|q| q.sequence_number).collect()
    }

    #[test]
    fn two_two_and_remainder() {
        let specs = [SectionSpec::new("English", 2), SectionSpec::new("Math", 2)];
        let sections = assign((1..=5).map(question).collect(), &specs);
        assert_eq!(sections.len(), 3);
        assert_eq!(numbers(&sections[0]), vec![1, 2]);
        assert_eq!(numbers(&sections[1]), vec![3, 4]);
        assert_eq!(numbers(&sections[2]), vec![5]);
        assert!(sections[0].questions.iter().all(|q| q.section_name.as_deref() == Some("English")));
        assert!(sections[1].questions.iter().all(|q| q.section_name.as_deref() == Some("Math")));
        assert_eq!(sections[2].name, None);
        assert_eq!(sections[2].questions[0].section_name, None);
    }

    #[test]
    fn underfilled_sections_are_kept() {
        let specs = [SectionSpec::new("English", 3), SectionSpec::new("Math", 2)];
        let sections = assign((1..=4).map(question).collect(), &specs);
        assert_eq!(sections.len(), 2);
        assert_eq!(numbers(&sections[0]), vec![1, 2, 3]);
        assert_eq!(numbers(&sections[1]), vec![4]);
        assert_eq!(
            sections[1].summary(),
            SectionSummary {
                name: Some("Math".into()),
                target: Some(2),
                assigned: 1
            }
        );
    }

    #[test]
    fn no_specs_puts_everything_unsectioned() {
        let sections = assign((1..=2).map(question).collect(), &[]);
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].target, None);
        assert_eq!(numbers(&sections[0]), vec![1, 2]);
    }

    #[test]
    fn nothing_in_nothing_out() {
        let specs = [SectionSpec::new("English", 2)];
        let sections = assign(Vec::new(), &specs);
        assert_eq!(sections.len(), 1);
        assert!(sections[0].questions.is_empty());
    }
}
