// Copyright 2025 the SharpViews Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Typing and deleting at the selection.

use alloc::string::String;
use alloc::vec::Vec;
use core::ops::Range;

use super::MakeSelection;
use crate::boxes::BoxId;
use crate::hookup::{BoundText, HookupId, HookupKind, ParagraphEdit};
use crate::root::RootBox;
use crate::selection::{InsertionPoint, Selection};
use crate::{Error, Result};

/// An editable client run: its hookup and logical range in the paragraph.
#[derive(Clone, Debug)]
struct EditTarget {
    hookup: HookupId,
    run: Range<usize>,
}

impl RootBox {
    /// The bound text of text hookup `hookup`.
    fn bound_text(&self, hookup: HookupId) -> Option<BoundText> {
        match &self.hookups.get(hookup)?.kind {
            HookupKind::Text { text, .. } => Some(text.clone()),
            _ => None,
        }
    }

    /// Editable runs of `para` touching `offset`, preferred first.
    fn edit_targets(&self, para: BoxId, offset: usize, associate_previous: bool) -> Result<Vec<EditTarget>> {
        let data = self.para_node(para)?;
        let starts = data.source.client_run_starts();
        let runs = data.source.client_runs();
        Ok(data
            .source
            .client_runs_at(offset, associate_previous)
            .into_iter()
            .filter_map(|(index, _)| {
                let hookup = (*data.run_hookups.get(index)?)?;
                self.bound_text(hookup)?;
                Some(EditTarget {
                    hookup,
                    run: starts[index]..starts[index] + runs[index].logical_len(),
                })
            })
            .collect())
    }

    fn edit_target(&self, para: BoxId, offset: usize, associate_previous: bool) -> Result<EditTarget> {
        self.edit_targets(para, offset, associate_previous)?
            .into_iter()
            .next()
            .ok_or(Error::not_editable(para, offset))
    }

    /// Logical offset of the first editable text of `para`.
    fn editable_start(&self, para: BoxId) -> usize {
        let Some(data) = self.tree.get(para).and_then(|node| node.para()) else {
            return 0;
        };
        let starts = data.source.client_run_starts();
        data.run_hookups
            .iter()
            .position(Option::is_some)
            .map_or(0, |index| starts[index])
    }

    /// Writes `text` in place of `range` of one editable run and applies
    /// the resulting change.
    fn replace_in_run(&mut self, target: &EditTarget, range: Range<usize>, text: &str) -> Result<()> {
        let bound = self
            .bound_text(target.hookup)
            .ok_or(Error::invalid_selection("edited run is gone"))?;
        bound.replace(range.start - target.run.start..range.end - target.run.start, text);
        self.process_notifications();
        Ok(())
    }

    /// Deletes logical `range` of `para`, which may span several editable
    /// runs.
    fn delete_in_para(&mut self, para: BoxId, range: Range<usize>) -> Result<()> {
        if range.is_empty() {
            return Ok(());
        }
        let data = self.para_node(para)?;
        let starts = data.source.client_run_starts();
        let mut pieces = Vec::new();
        for (index, run) in data.source.client_runs().iter().enumerate() {
            let run_range = starts[index]..starts[index] + run.logical_len();
            let (lo, hi) = (range.start.max(run_range.start), range.end.min(run_range.end));
            if lo >= hi {
                continue;
            }
            let hookup = data.run_hookups.get(index).copied().flatten();
            match hookup.filter(|&hookup| self.bound_text(hookup).is_some()) {
                Some(hookup) => pieces.push((EditTarget { hookup, run: run_range }, lo..hi)),
                None => return Err(Error::not_editable(para, lo)),
            }
        }
        // Back to front, so earlier offsets stay valid.
        for (target, piece) in pieces.into_iter().rev() {
            let bound = self
                .bound_text(target.hookup)
                .ok_or(Error::invalid_selection("edited run is gone"))?;
            bound.replace(piece.start - target.run.start..piece.end - target.run.start, "");
        }
        self.process_notifications();
        Ok(())
    }

    /// The caret, failing for ranges and when nothing is selected.
    fn caret(&self) -> Result<InsertionPoint> {
        match self.selection {
            Some(Selection::Ip(ip)) => Ok(ip),
            Some(Selection::Range(_)) => Err(Error::invalid_selection("expected a caret")),
            None => Err(Error::invalid_selection("nothing is selected")),
        }
    }

    /// Applies a structural edit to `sequence`, then makes the selection the
    /// paragraph operations ask for once the tree has caught up.
    fn structural_edit(&mut self, sequence: HookupId, edit: ParagraphEdit) -> Result<()> {
        let binding = self
            .hookups
            .get(sequence)
            .and_then(|hookup| hookup.sequence())
            .map(|seq| seq.binding.clone())
            .ok_or(Error::unsupported("paragraph is not part of a sequence"))?;
        log::debug!("structural edit {edit:?}");
        match binding.edit(edit)? {
            Some(make) => {
                self.perform_after_notifications(move |root| root.make_selection(sequence, make));
                self.process_notifications();
            }
            None => log::debug!("paragraph operations declined the edit"),
        }
        Ok(())
    }

    /// Puts the selection where `make` asks, relative to `sequence`.
    pub(crate) fn make_selection(&mut self, sequence: HookupId, make: MakeSelection) {
        let (index, at_end, offset) = match make {
            MakeSelection::Unchanged => return,
            MakeSelection::ItemStart(index) => (index, false, 0),
            MakeSelection::ItemEnd(index) => (index, true, 0),
            MakeSelection::ItemOffset { index, offset } => (index, false, offset),
        };
        let Some(item) = self.ensure_item(sequence, index) else {
            log::warn!("cannot select in missing item {index}");
            return;
        };
        let paras = self.item_paragraphs(item);
        let result = match (at_end, paras.first(), paras.last()) {
            (true, _, Some(&last)) => self.select_at_end(last),
            (false, Some(&first), _) => {
                let len = self.para_node(first).map_or(0, |data| data.source.logical_len());
                let offset = (self.editable_start(first) + offset).min(len);
                self.select_at(first, offset, offset > 0 && offset == len)
            }
            _ => Ok(()),
        };
        if let Err(err) = result {
            log::warn!("cannot make selection: {err}");
        }
    }

    /// Deletes the selected range, leaving a caret at its start.
    ///
    /// A range spanning several paragraphs must lie within one editable
    /// sequence, and each of its end paragraphs must show a single editable
    /// run. Returns false if the selection is not a range.
    pub fn delete_selection(&mut self) -> Result<bool> {
        let Some(Selection::Range(range)) = self.selection else {
            return Ok(false);
        };
        let (start, end) = (range.start(), range.end());
        if start.para == end.para {
            self.delete_in_para(start.para, start.offset..end.offset)?;
            self.select_at(start.para, start.offset, start.offset > 0)?;
            return Ok(true);
        }
        let (Some((_, sequence, first)), Some((_, end_sequence, last))) =
            (self.item_of_box(start.para), self.item_of_box(end.para))
        else {
            return Err(Error::unsupported("range spans paragraphs outside a sequence"));
        };
        if sequence != end_sequence {
            return Err(Error::unsupported("range spans several sequences"));
        }
        // The joined text is written to one item, which only holds it all
        // when each end paragraph shows a single editable run.
        for para in [start.para, end.para] {
            if self.para_node(para)?.run_hookups.iter().flatten().count() > 1 {
                return Err(Error::unsupported(
                    "range ends in a paragraph with several editable runs",
                ));
            }
        }
        let head = self.edit_target(start.para, start.offset, true)?;
        let tail = self.edit_target(end.para, end.offset, false)?;
        let mut text: String = self.bound_text(head.hookup).map(|t| t.text()).unwrap_or_default();
        text.truncate(start.offset - head.run.start);
        let rest = self.bound_text(tail.hookup).map(|t| t.text()).unwrap_or_default();
        text.push_str(rest.get(end.offset - tail.run.start..).unwrap_or_default());
        let offset = start.offset - head.run.start;

        self.structural_edit(sequence, ParagraphEdit::SetString { index: first, text })?;
        self.structural_edit(sequence, ParagraphEdit::Remove(first + 1..last + 1))?;
        self.make_selection(sequence, MakeSelection::ItemOffset { index: first, offset });
        Ok(true)
    }

    /// Types `text` at the caret, replacing the selected range if there is
    /// one. Line breaks in `text` split the paragraph.
    pub fn insert_text(&mut self, text: &str) -> Result<()> {
        self.delete_selection()?;
        for (index, line) in text.split('\n').enumerate() {
            if index > 0 {
                self.insert_line_break()?;
            }
            let line = line.strip_suffix('\r').unwrap_or(line);
            if line.is_empty() {
                continue;
            }
            let ip = self.caret()?;
            let target = self.edit_target(ip.para, ip.offset, ip.associate_previous)?;
            self.replace_in_run(&target, ip.offset..ip.offset, line)?;
            self.select_at(ip.para, ip.offset + line.len(), true)?;
        }
        Ok(())
    }

    /// Deletes the selected range, or the character before the caret.
    ///
    /// At the start of a paragraph the paragraph is merged into the
    /// previous one.
    pub fn backspace(&mut self) -> Result<()> {
        if self.delete_selection()? {
            return Ok(());
        }
        let ip = self.caret()?;
        if ip.offset() > 0 {
            let prev = self.para_node(ip.para())?.prev_ip(ip.offset()).unwrap_or(0);
            self.delete_in_para(ip.para(), prev..ip.offset())?;
            return self.select_at(ip.para(), prev, prev > 0);
        }
        match self.item_of_box(ip.para()) {
            Some((_, sequence, index)) if index > 0 => {
                self.structural_edit(sequence, ParagraphEdit::MergeWithNext(index - 1))
            }
            _ => Ok(()),
        }
    }

    /// Deletes the selected range, or the character after the caret.
    ///
    /// At the end of a paragraph the next paragraph is merged into it.
    pub fn delete_forward(&mut self) -> Result<()> {
        if self.delete_selection()? {
            return Ok(());
        }
        let ip = self.caret()?;
        if let Some(next) = self.para_node(ip.para())?.next_ip(ip.offset()) {
            self.delete_in_para(ip.para(), ip.offset()..next)?;
            return self.select_at(ip.para(), ip.offset(), ip.associate_previous());
        }
        let Some((_, sequence, index)) = self.item_of_box(ip.para()) else {
            return Ok(());
        };
        let count = self
            .hookups
            .get(sequence)
            .and_then(|hookup| hookup.sequence())
            .map_or(0, |seq| seq.item_count());
        if index + 1 < count {
            self.structural_edit(sequence, ParagraphEdit::MergeWithNext(index))?;
        }
        Ok(())
    }

    /// Breaks the paragraph at the caret.
    ///
    /// At the end of a paragraph a new one is inserted after it, at the
    /// start of a non-empty paragraph one is inserted before it, and
    /// anywhere else the paragraph is split.
    pub fn insert_line_break(&mut self) -> Result<()> {
        self.delete_selection()?;
        let ip = self.caret()?;
        let (_, sequence, index) = self
            .item_of_box(ip.para())
            .ok_or(Error::unsupported("paragraph is not part of a sequence"))?;
        let len = self.para_node(ip.para())?.source.logical_len();
        let edit = if ip.offset() == len {
            ParagraphEdit::InsertFollowing(index)
        } else if ip.offset() == 0 {
            ParagraphEdit::InsertPreceding(index)
        } else {
            let target = self.edit_target(ip.para(), ip.offset(), ip.associate_previous())?;
            ParagraphEdit::Split {
                index,
                offset: ip.offset() - target.run.start,
            }
        };
        self.structural_edit(sequence, edit)
    }
}
