// Copyright 2025 the SharpViews Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Building lazy items on demand.

use alloc::vec::Vec;
use core::ops::Range;

use crate::boxes::{BoxId, BoxKind};
use crate::hookup::{HookupId, SeqSlot};

use super::RootBox;

impl RootBox {
    /// Builds the lazy items overlapping the vertical span `top..bottom`,
    /// in root coordinates, so that the span can be painted.
    ///
    /// Items are laid out as they are built; the host is told how much the
    /// document height differs from the estimate through
    /// [`Site::lazy_expanded`](super::Site::lazy_expanded).
    pub fn prepare_to_paint(&mut self, top: f64, bottom: f64) {
        if !self.is_laid_out() {
            return;
        }
        loop {
            let target = self.tree.lazy_boxes(self.root).into_iter().find_map(|id| {
                let node = &self.tree[id];
                if !node.laid_out {
                    return None;
                }
                let rect = self.tree.rect_in_root(id);
                let BoxKind::Lazy(lazy) = &node.kind else {
                    return None;
                };
                let items = lazy.items_between(top - rect.y0, bottom - rect.y0);
                (!items.is_empty()).then_some((id, items))
            });
            let Some((id, items)) = target else {
                break;
            };
            self.expand_lazy(id, items);
        }
    }

    /// Replaces items `items` (relative to the box) of lazy box `id` with
    /// real item boxes, splitting off lazy remainders before and after.
    pub(crate) fn expand_lazy(&mut self, id: BoxId, items: Range<usize>) {
        let BoxKind::Lazy(lazy) = &self.tree[id].kind else {
            return;
        };
        let (sequence, count) = (lazy.sequence, lazy.count);
        let Some(seq) = self.hookups.get(sequence).and_then(|hookup| hookup.sequence()) else {
            log::warn!("lazy box {id:?} outlived its sequence");
            return;
        };
        let Some(slot_index) = seq
            .slots
            .iter()
            .position(|slot| matches!(slot, SeqSlot::Lazy { id: lazy_id, .. } if *lazy_id == id))
        else {
            return;
        };
        let first_item: usize = seq.slots[..slot_index].iter().map(SeqSlot::count).sum();
        let container = seq.container;
        let old_height = self.size().height;
        let (before, after) = (items.start, count - items.end);
        log::debug!(
            "expanding items {}..{} of lazy box {id:?}",
            first_item + items.start,
            first_item + items.end
        );

        let mut slots = Vec::with_capacity(items.len() + 2);
        let mut reused = false;
        let mut anchor = if before > 0 {
            reused = true;
            self.set_lazy_count(id, before);
            slots.push(SeqSlot::Lazy { id, count: before });
            Some(id)
        } else {
            self.tree.children(container).take_while(|&child| child != id).last()
        };
        for index in items.clone() {
            let (item, last) = self.build_item(sequence, first_item + index, anchor);
            anchor = last.or(anchor);
            slots.push(SeqSlot::Item(item));
        }
        if after > 0 {
            if reused {
                slots.push(self.add_lazy(sequence, anchor, after));
            } else {
                // The box now follows the built items.
                reused = true;
                self.set_lazy_count(id, after);
                slots.push(SeqSlot::Lazy { id, count: after });
            }
        }
        let mut changed = vec![container];
        if reused {
            changed.push(id);
        } else {
            let rect = self.tree.rect_in_root(id);
            self.invalidate(rect);
            for hookup in self.tree.remove_subtree(id) {
                self.hookups.remove(hookup);
            }
        }
        if let Some(seq) = self.hookups[sequence].sequence_mut() {
            seq.slots.splice(slot_index..slot_index + 1, slots);
        }
        self.relayout_changed(&changed);
        let delta = self.size().height - old_height;
        log::debug!("lazy expansion changed the height by {delta}");
        self.site.lazy_expanded(delta);
    }

    fn set_lazy_count(&mut self, id: BoxId, count: usize) {
        if let BoxKind::Lazy(lazy) = &mut self.tree[id].kind {
            lazy.count = count;
        }
    }

    /// The item hookup of item `index` of `sequence`, building the item if
    /// it is still lazy.
    pub(crate) fn ensure_item(&mut self, sequence: HookupId, index: usize) -> Option<HookupId> {
        let seq = self.hookups.get(sequence)?.sequence()?;
        let (slot, first) = seq.locate(index)?;
        let slot = seq.slots[slot];
        match slot {
            SeqSlot::Item(item) => Some(item),
            SeqSlot::Lazy { id, .. } => {
                let relative = index - first;
                self.expand_lazy(id, relative..relative + 1);
                self.hookups.get(sequence)?.sequence()?.item_at(index)
            }
        }
    }
}
