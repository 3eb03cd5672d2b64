//! Image association: `IMAGE:<n>` tokens → `[Image k]` placeholders.
//!
//! Run once per text field (stem, each option, solution), so an image in an
//! option is never counted against the stem. Ordinals restart at 1 in every
//! field and follow first occurrence; a token repeated within one field
//! reuses its ordinal and its image appears once in the list.

use crate::output::Image;
use crate::pipeline::load::ImageTable;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::iter::FusedIterator;
use tracing::warn;

static RE_IMAGE_TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bIMAGE:(\d+)\b").unwrap());

/// Images referenced by one text field, in placeholder order.
///
/// Lazily clones each payload handle out of the image table as it is
/// consumed. Finite and single-pass: once drained it stays empty.
#[derive(Debug)]
pub struct AssociatedImages<'t> {
    indices: std::vec::IntoIter<usize>,
    table: &'t ImageTable,
}

impl Iterator for AssociatedImages<'_> {
    type Item = Image;

    fn next(&mut self) -> Option<Image> {
        let index = self.indices.next()?;
        self.table.get(index).cloned()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.indices.size_hint()
    }
}

impl ExactSizeIterator for AssociatedImages<'_> {}
impl FusedIterator for AssociatedImages<'_> {}

/// Replace image tokens in `text` with ordinal placeholders.
///
/// Tokens whose index is missing from `table` are left in place and logged;
/// the loaders never produce them, so one showing up means the text was
/// typed by hand.
pub fn associate<'t>(text: &str, table: &'t ImageTable) -> (String, AssociatedImages<'t>) {
    let mut order: Vec<usize> = Vec::new();
    let display = RE_IMAGE_TOKEN.replace_all(text, |caps: &Captures<'_>| {
        let index = match caps[1].parse::<usize>() {
            Ok(i) if table.get(i).is_some() => i,
            _ => {
                warn!("Image token '{}' has no decoded image; leaving it as text", &caps[0]);
                return caps[0].to_string();
            }
        };
        let ordinal = match order.iter().position(|&seen| seen == index) {
            Some(pos) => pos + 1,
            None => {
                order.push(index);
                order.len()
            }
        };
        format!("[Image {ordinal}]")
    });
    let display = display.into_owned();
    (
        display,
        AssociatedImages {
            indices: order.into_iter(),
            table,
        },
    )
}
