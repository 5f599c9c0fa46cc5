// Copyright 2025 the SharpViews Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Applying data changes to the box tree.

use alloc::vec::Vec;

use crate::boxes::{BoxId, BoxKind};
use crate::hookup::{HookupId, HookupKind, Notification, SeqSlot};
use crate::model::Change;
use crate::selection::{InsertionPoint, Selection};

use super::RootBox;

/// One entry of the slot list a sequence will have after a change.
#[derive(Debug)]
enum Plan {
    Item(HookupId),
    /// A lazy run, reusing an existing lazy box when it has one.
    Lazy { reuse: Option<BoxId>, count: usize },
    /// The newly inserted items, built for real.
    Insert,
}

impl RootBox {
    /// Applies every pending change notification to the box tree, then runs
    /// the tasks queued with
    /// [`perform_after_notifications`](Self::perform_after_notifications).
    pub fn process_notifications(&mut self) {
        loop {
            let next = self.queue.borrow_mut().pop_front();
            if let Some(Notification { hookup, change }) = next {
                self.apply_notification(hookup, &change);
                continue;
            }
            match self.pop_deferred() {
                Some(task) => task(self),
                None => break,
            }
        }
    }

    fn apply_notification(&mut self, hookup: HookupId, change: &Change) {
        let Some(target) = self.hookups.get(hookup) else {
            log::warn!("dropping {change:?} for disposed hookup {hookup:?}");
            return;
        };
        match (&target.kind, change) {
            (HookupKind::Text { .. }, _) => self.text_changed(hookup),
            (
                HookupKind::Sequence(_),
                &Change::ListChanged {
                    index,
                    removed,
                    inserted,
                },
            ) => self.sequence_changed(hookup, index, removed, inserted),
            (HookupKind::Sequence(sequence), Change::ValueChanged) => {
                let count = sequence.item_count();
                let len = sequence.binding.len();
                self.sequence_changed(hookup, 0, count, len);
            }
            (HookupKind::Item { .. }, _) => {
                log::warn!("item hookup {hookup:?} does not observe anything");
            }
        }
    }

    fn text_changed(&mut self, hookup: HookupId) {
        let HookupKind::Text {
            para,
            run,
            text,
            style,
        } = &self.hookups[hookup].kind
        else {
            return;
        };
        let (para, run) = (*para, *run);
        let new_run = text.client_run(style, self.stylesheet.as_ref());
        let Some(data) = self.tree.get_mut(para).and_then(|node| node.para_mut()) else {
            log::warn!("text hookup {hookup:?} lost its paragraph {para:?}");
            return;
        };
        let change = data.source.client_run_changed(run, new_run);
        let unchanged = change.is_empty();
        data.pending_change = Some((change.start, change.delete_count, change.insert_count));
        data.source = change.new_source;
        let len = data.source.logical_len();
        if !unchanged {
            self.relayout_changed(&[para]);
        }
        self.clamp_selection(para, len);
    }

    /// Moves selection ends in `para` back onto valid insertion points of
    /// its new text of length `len`.
    fn clamp_selection(&mut self, para: BoxId, len: usize) {
        let Some(selection) = self.selection else {
            return;
        };
        let fix = |ip: InsertionPoint| {
            if ip.para() != para {
                return ip;
            }
            let clamped = InsertionPoint::new(para, ip.offset().min(len), ip.associate_previous());
            self.validate_ip(clamped).unwrap_or(clamped)
        };
        let fixed = match selection {
            Selection::Ip(ip) => Selection::Ip(fix(ip)),
            Selection::Range(range) => self.make_range(fix(range.anchor()), fix(range.drag_end())),
        };
        self.selection = Some(fixed);
    }

    fn sequence_changed(&mut self, sequence: HookupId, index: usize, removed: usize, inserted: usize) {
        let Some(seq) = self.hookups[sequence].sequence_mut() else {
            return;
        };
        let old_slots = core::mem::take(&mut seq.slots);
        let lazy = seq.lazy_item_height.is_some();
        let container = seq.container;
        let lazy_insert = lazy
            && inserted > 0
            && matches!(
                seq_locate(&old_slots, index),
                Some((SeqSlot::Lazy { .. }, first)) if index > first
            );
        log::debug!(
            "sequence {sequence:?}: {removed} removed and {inserted} inserted at {index}{}",
            if lazy_insert { " (lazily)" } else { "" }
        );

        let end = index + removed;
        let mut plan = Vec::with_capacity(old_slots.len() + 2);
        let mut doomed_items = Vec::new();
        let mut doomed_lazy = Vec::new();
        let mut placed = inserted == 0;
        let place = |plan: &mut Vec<Plan>, placed: &mut bool| {
            if !*placed {
                *placed = true;
                plan.push(if lazy_insert {
                    Plan::Lazy {
                        reuse: None,
                        count: inserted,
                    }
                } else {
                    Plan::Insert
                });
            }
        };
        let mut first = 0;
        for slot in old_slots {
            let (start, stop) = (first, first + slot.count());
            first = stop;
            match slot {
                SeqSlot::Item(item) => {
                    if stop <= index {
                        plan.push(Plan::Item(item));
                    } else if start < end {
                        doomed_items.push(item);
                    } else {
                        place(&mut plan, &mut placed);
                        plan.push(Plan::Item(item));
                    }
                }
                SeqSlot::Lazy { id, count } => {
                    let before = index.clamp(start, stop) - start;
                    let after = stop - end.clamp(start, stop);
                    if before == count {
                        plan.push(Plan::Lazy {
                            reuse: Some(id),
                            count,
                        });
                    } else if after == count {
                        place(&mut plan, &mut placed);
                        plan.push(Plan::Lazy {
                            reuse: Some(id),
                            count,
                        });
                    } else {
                        let mut reuse = Some(id);
                        if before > 0 {
                            plan.push(Plan::Lazy {
                                reuse: reuse.take(),
                                count: before,
                            });
                        }
                        place(&mut plan, &mut placed);
                        if after > 0 {
                            plan.push(Plan::Lazy {
                                reuse: reuse.take(),
                                count: after,
                            });
                        }
                        doomed_lazy.extend(reuse);
                    }
                }
            }
        }
        place(&mut plan, &mut placed);
        let plan = merge_lazy_runs(plan, &mut doomed_lazy);

        // Doomed boxes go first, so the remaining ones keep their order.
        let mut doomed_boxes = Vec::new();
        for item in doomed_items {
            doomed_boxes.extend(self.item_boxes(item));
            self.hookups.remove(item);
        }
        doomed_boxes.extend(doomed_lazy);
        for id in doomed_boxes {
            if self.tree[id].laid_out {
                let rect = self.tree.rect_in_root(id);
                self.invalidate(rect);
            }
            for hookup in self.tree.remove_subtree(id) {
                self.hookups.remove(hookup);
            }
        }

        let mut changed = vec![container];
        let mut slots = Vec::with_capacity(plan.len());
        let mut after: Option<BoxId> = None;
        for entry in plan {
            match entry {
                Plan::Item(item) => {
                    after = self.item_boxes(item).last().copied().or(after);
                    slots.push(SeqSlot::Item(item));
                }
                Plan::Lazy {
                    reuse: Some(id),
                    count,
                } => {
                    if let BoxKind::Lazy(data) = &mut self.tree[id].kind {
                        if data.count != count {
                            data.count = count;
                            changed.push(id);
                        }
                    }
                    after = Some(id);
                    slots.push(SeqSlot::Lazy { id, count });
                }
                Plan::Lazy { reuse: None, count } => {
                    let slot = self.add_lazy(sequence, after, count);
                    if let SeqSlot::Lazy { id, .. } = slot {
                        after = Some(id);
                    }
                    slots.push(slot);
                }
                Plan::Insert => {
                    for offset in 0..inserted {
                        let (item, last) = self.build_item(sequence, index + offset, after);
                        after = last.or(after);
                        slots.push(SeqSlot::Item(item));
                    }
                }
            }
        }
        if let Some(seq) = self.hookups[sequence].sequence_mut() {
            seq.slots = slots;
        }
        self.relayout_changed(&changed);
        self.drop_stale_selection();
    }

    /// Clears the selection if its paragraphs were removed.
    pub(crate) fn drop_stale_selection(&mut self) {
        let stale = match &self.selection {
            Some(Selection::Ip(ip)) => !self.tree.contains(ip.para()),
            Some(Selection::Range(range)) => {
                !self.tree.contains(range.anchor().para()) || !self.tree.contains(range.drag_end().para())
            }
            None => false,
        };
        if stale {
            log::debug!("selection lost its paragraph");
            self.selection = None;
        }
    }
}

fn seq_locate(slots: &[SeqSlot], index: usize) -> Option<(SeqSlot, usize)> {
    let mut first = 0;
    for slot in slots {
        if index < first + slot.count() {
            return Some((*slot, first));
        }
        first += slot.count();
    }
    None
}

/// Joins adjacent lazy runs, keeping the first box of each joined run.
fn merge_lazy_runs(plan: Vec<Plan>, doomed: &mut Vec<BoxId>) -> Vec<Plan> {
    let mut merged: Vec<Plan> = Vec::with_capacity(plan.len());
    for entry in plan {
        if let (
            Some(Plan::Lazy { reuse, count }),
            Plan::Lazy {
                reuse: next_reuse,
                count: next_count,
            },
        ) = (merged.last_mut(), &entry)
        {
            *count += next_count;
            match (reuse.is_some(), *next_reuse) {
                (true, Some(extra)) => doomed.push(extra),
                (false, next) => *reuse = next,
                (true, None) => {}
            }
            continue;
        }
        merged.push(entry);
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boxes::{BoxNode, BoxTree, GroupData};
    use crate::style::StyleCatalog;

    #[test]
    fn adjacent_lazy_runs_join() {
        let mut tree = BoxTree::default();
        let style = StyleCatalog::new().default_style();
        let a = tree.insert(BoxNode::new(BoxKind::Div(GroupData::default()), style.clone()));
        let b = tree.insert(BoxNode::new(BoxKind::Div(GroupData::default()), style));
        let mut doomed = Vec::new();
        let plan = merge_lazy_runs(
            vec![
                Plan::Lazy {
                    reuse: Some(a),
                    count: 2,
                },
                Plan::Lazy {
                    reuse: None,
                    count: 1,
                },
                Plan::Lazy {
                    reuse: Some(b),
                    count: 3,
                },
                Plan::Insert,
            ],
            &mut doomed,
        );
        assert_eq!(plan.len(), 2, "three lazy runs should become one");
        assert!(matches!(plan[0], Plan::Lazy { reuse: Some(id), count: 6 } if id == a));
        assert_eq!(doomed, [b]);
    }
}
