// Copyright 2025 the SharpViews Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Editing: typing, deleting, line breaks, the clipboard and drag and drop.
//!
//! Text edits are written back to the observable value behind the edited
//! run. Structural edits (new, split and merged paragraphs) go through the
//! [`ParagraphOperations`] of the sequence displaying the paragraph; the
//! selection they ask for is made once the resulting notifications have
//! rebuilt the boxes.

mod clipboard;
mod editor;
mod rtf;

use alloc::string::String;
use core::ops::Range;

use crate::model::{Observable, ObservableList};

pub use self::clipboard::{DataObject, DragEffect, DragEffects};
pub use self::rtf::export_rtf;

/// Where to put the selection after a structural edit, relative to the
/// sequence that was edited.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MakeSelection {
    /// At the start of item `index`.
    ItemStart(usize),
    /// At the end of item `index`.
    ItemEnd(usize),
    /// At `offset` within the text of item `index`.
    ItemOffset {
        /// The item.
        index: usize,
        /// Byte offset within the item's first editable text.
        offset: usize,
    },
    /// Leave the selection to the caller.
    Unchanged,
}

/// Turns paragraph-level edits into changes of the list behind a sequence.
///
/// Every method returns `None` to decline the edit, or the selection to
/// make once the change has been displayed.
pub trait ParagraphOperations<T> {
    /// Stores `text` as the text of `item`. Returns false to decline.
    fn set_string(&self, item: &T, text: &str) -> bool;

    /// Inserts an empty item after item `index`.
    fn insert_following(&self, list: &ObservableList<T>, index: usize) -> Option<MakeSelection>;

    /// Inserts an empty item before item `index`.
    fn insert_preceding(&self, list: &ObservableList<T>, index: usize) -> Option<MakeSelection>;

    /// Splits item `index` in two at byte `offset` of its text.
    fn split(&self, list: &ObservableList<T>, index: usize, offset: usize) -> Option<MakeSelection>;

    /// Appends the text of item `index + 1` to item `index` and removes the
    /// former.
    fn merge_with_next(&self, list: &ObservableList<T>, index: usize) -> Option<MakeSelection>;

    /// Removes the items in `range`.
    fn remove_paragraphs(&self, list: &ObservableList<T>, range: Range<usize>) -> Option<MakeSelection> {
        if range.end > list.len() {
            return None;
        }
        list.remove(range);
        Some(MakeSelection::Unchanged)
    }
}

/// Paragraph operations for a list of plain strings.
#[derive(Copy, Clone, Debug, Default)]
pub struct StringListOps;

impl ParagraphOperations<Observable<String>> for StringListOps {
    fn set_string(&self, item: &Observable<String>, text: &str) -> bool {
        item.set(text.into());
        true
    }

    fn insert_following(&self, list: &ObservableList<Observable<String>>, index: usize) -> Option<MakeSelection> {
        list.insert(index + 1, Observable::default());
        Some(MakeSelection::ItemStart(index + 1))
    }

    fn insert_preceding(&self, list: &ObservableList<Observable<String>>, index: usize) -> Option<MakeSelection> {
        list.insert(index, Observable::default());
        Some(MakeSelection::ItemStart(index + 1))
    }

    fn split(&self, list: &ObservableList<Observable<String>>, index: usize, offset: usize) -> Option<MakeSelection> {
        let item = list.get(index)?;
        let text = item.get();
        if !text.is_char_boundary(offset) {
            return None;
        }
        item.set(text[..offset].into());
        list.insert(index + 1, Observable::new(text[offset..].into()));
        Some(MakeSelection::ItemStart(index + 1))
    }

    fn merge_with_next(&self, list: &ObservableList<Observable<String>>, index: usize) -> Option<MakeSelection> {
        let first = list.get(index)?;
        let second = list.get(index + 1)?;
        let mut text = first.get();
        let offset = text.len();
        text.push_str(&second.borrow());
        first.set(text);
        list.remove(index + 1..index + 2);
        Some(MakeSelection::ItemOffset { index, offset })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;

    fn list(items: &[&str]) -> ObservableList<Observable<String>> {
        ObservableList::new(items.iter().map(|s| Observable::new(String::from(*s))).collect())
    }

    fn texts(list: &ObservableList<Observable<String>>) -> Vec<String> {
        list.borrow().iter().map(Observable::get).collect()
    }

    #[test]
    fn split_and_merge_round_trip() {
        let items = list(&["hello world"]);
        assert_eq!(StringListOps.split(&items, 0, 5), Some(MakeSelection::ItemStart(1)));
        assert_eq!(texts(&items), ["hello", " world"]);
        assert_eq!(
            StringListOps.merge_with_next(&items, 0),
            Some(MakeSelection::ItemOffset { index: 0, offset: 5 })
        );
        assert_eq!(texts(&items), ["hello world"]);
    }

    #[test]
    fn declines_out_of_range_edits() {
        let items = list(&["a"]);
        assert_eq!(StringListOps.merge_with_next(&items, 0), None);
        assert_eq!(StringListOps.split(&items, 3, 0), None);
        assert_eq!(StringListOps.remove_paragraphs(&items, 0..2), None);
    }
}
