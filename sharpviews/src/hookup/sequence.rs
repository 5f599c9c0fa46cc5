// Copyright 2025 the SharpViews Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;
use core::ops::Range;

use super::HookupId;
use crate::boxes::BoxId;
use crate::builder::ViewBuilder;
use crate::editing::{MakeSelection, ParagraphOperations};
use crate::model::{Change, ObservableList, Subscription};
use crate::style::AssembledStyles;
use crate::{Error, Result};

/// How one stretch of a sequence is currently displayed.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum SeqSlot {
    /// A built item.
    Item(HookupId),
    /// A lazy box standing for `count` items.
    Lazy { id: BoxId, count: usize },
}

impl SeqSlot {
    pub(crate) fn count(&self) -> usize {
        match self {
            Self::Item(_) => 1,
            Self::Lazy { count, .. } => *count,
        }
    }
}

/// A structural edit of the list behind a sequence.
#[derive(Clone, Debug)]
pub(crate) enum ParagraphEdit {
    InsertFollowing(usize),
    InsertPreceding(usize),
    Split { index: usize, offset: usize },
    MergeWithNext(usize),
    Remove(Range<usize>),
    SetString { index: usize, text: String },
}

/// The list behind a sequence, with its item type erased.
pub(crate) trait SequenceBinding {
    fn len(&self) -> usize;

    /// Builds the boxes of item `index`.
    fn build_item(&self, builder: &mut ViewBuilder<'_>, index: usize);

    fn subscribe(&self, listener: Rc<dyn Fn(&Change)>) -> Subscription;

    /// Applies `edit` through the sequence's paragraph operations.
    ///
    /// `Ok(None)` means the operations declined the edit.
    fn edit(&self, edit: ParagraphEdit) -> Result<Option<MakeSelection>>;
}

pub(crate) struct ListBinding<T> {
    pub(crate) list: ObservableList<T>,
    pub(crate) build: Rc<dyn Fn(&mut ViewBuilder<'_>, &T)>,
    pub(crate) ops: Option<Rc<dyn ParagraphOperations<T>>>,
}

impl<T: Clone + 'static> SequenceBinding for ListBinding<T> {
    fn len(&self) -> usize {
        self.list.len()
    }

    fn build_item(&self, builder: &mut ViewBuilder<'_>, index: usize) {
        if let Some(item) = self.list.get(index) {
            (self.build)(builder, &item);
        }
    }

    fn subscribe(&self, listener: Rc<dyn Fn(&Change)>) -> Subscription {
        self.list.subscribe(move |change| listener(change))
    }

    fn edit(&self, edit: ParagraphEdit) -> Result<Option<MakeSelection>> {
        let Some(ops) = &self.ops else {
            return Err(Error::unsupported("sequence has no paragraph operations"));
        };
        let list = &self.list;
        Ok(match edit {
            ParagraphEdit::InsertFollowing(index) => ops.insert_following(list, index),
            ParagraphEdit::InsertPreceding(index) => ops.insert_preceding(list, index),
            ParagraphEdit::Split { index, offset } => ops.split(list, index, offset),
            ParagraphEdit::MergeWithNext(index) => ops.merge_with_next(list, index),
            ParagraphEdit::Remove(range) => ops.remove_paragraphs(list, range),
            ParagraphEdit::SetString { index, text } => {
                let item = list.get(index).ok_or(Error::invalid_selection("no such item"))?;
                ops.set_string(&item, &text).then_some(MakeSelection::Unchanged)
            }
        })
    }
}

/// A hookup displaying a list, one item after another in its own pile.
pub(crate) struct SequenceHookup {
    /// The div holding the item boxes.
    pub(crate) container: BoxId,
    pub(crate) binding: Rc<dyn SequenceBinding>,
    pub(crate) slots: Vec<SeqSlot>,
    /// Estimated item height of a lazy sequence.
    pub(crate) lazy_item_height: Option<f64>,
    pub(crate) style: AssembledStyles,
}

impl SequenceHookup {
    /// Finds the slot holding item `index`, as `(slot, first item of slot)`.
    pub(crate) fn locate(&self, index: usize) -> Option<(usize, usize)> {
        let mut first = 0;
        for (slot, entry) in self.slots.iter().enumerate() {
            let count = entry.count();
            if index < first + count {
                return Some((slot, first));
            }
            first += count;
        }
        None
    }

    /// The index of the item built by hookup `item`.
    pub(crate) fn index_of(&self, item: HookupId) -> Option<usize> {
        let mut first = 0;
        for entry in &self.slots {
            if *entry == SeqSlot::Item(item) {
                return Some(first);
            }
            first += entry.count();
        }
        None
    }

    /// The item hookup of item `index`, if that item is built.
    pub(crate) fn item_at(&self, index: usize) -> Option<HookupId> {
        let (slot, _) = self.locate(index)?;
        match self.slots[slot] {
            SeqSlot::Item(item) => Some(item),
            SeqSlot::Lazy { .. } => None,
        }
    }

    pub(crate) fn item_count(&self) -> usize {
        self.slots.iter().map(SeqSlot::count).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boxes::BoxTree;

    #[test]
    fn items_are_located_across_lazy_runs() {
        let mut tree = BoxTree::default();
        let style = crate::style::StyleCatalog::new().default_style();
        let lazy = tree.insert(crate::boxes::BoxNode::new(
            crate::boxes::BoxKind::Div(Default::default()),
            style.clone(),
        ));
        let item = HookupId::dangling();
        let sequence = SequenceHookup {
            container: lazy,
            binding: Rc::new(ListBinding::<u32> {
                list: ObservableList::default(),
                build: Rc::new(|_, _| {}),
                ops: None,
            }),
            slots: vec![SeqSlot::Lazy { id: lazy, count: 3 }, SeqSlot::Item(item)],
            lazy_item_height: Some(10.0),
            style,
        };
        assert_eq!(sequence.locate(2), Some((0, 0)));
        assert_eq!(sequence.locate(3), Some((1, 3)));
        assert_eq!(sequence.locate(4), None);
        assert_eq!(sequence.index_of(item), Some(3));
        assert_eq!(sequence.item_at(1), None);
        assert_eq!(sequence.item_count(), 4);
    }
}
