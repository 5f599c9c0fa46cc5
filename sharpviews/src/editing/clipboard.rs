// Copyright 2025 the SharpViews Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Cut, copy, paste and drag and drop.

use alloc::string::String;
use alloc::vec::Vec;
use core::cmp::Ordering;

use peniko::kurbo::Point;

use super::export_rtf;
use crate::root::RootBox;
use crate::selection::{InsertionPoint, RangeSelection, Selection};
use crate::style::AssembledStyles;
use crate::text::{RunOrigin, ORC};
use crate::{Error, Result};

/// Data moved through the clipboard or by drag and drop.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DataObject {
    text: String,
    rtf: Option<String>,
}

impl DataObject {
    /// Plain text data.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            rtf: None,
        }
    }

    /// Adds a rich text rendering of the same data.
    #[must_use]
    pub fn with_rtf(mut self, rtf: impl Into<String>) -> Self {
        self.rtf = Some(rtf.into());
        self
    }

    /// The plain text; paragraphs are separated by `\n`.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The rich text rendering, if any.
    pub fn rtf(&self) -> Option<&str> {
        self.rtf.as_deref()
    }
}

/// What a drop target did with dragged data.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum DragEffect {
    /// Nothing was dropped.
    #[default]
    None,
    /// The data was copied.
    Copy,
    /// The data was moved; the source has to delete it.
    Move,
}

/// The effects a drag source allows.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub struct DragEffects(u8);

impl DragEffects {
    /// No effect is allowed.
    pub const NONE: Self = Self(0);
    /// The data may be copied.
    pub const COPY: Self = Self(1);
    /// The data may be moved.
    pub const MOVE: Self = Self(2);
    /// The data may be copied or moved.
    pub const COPY_OR_MOVE: Self = Self(3);

    /// Returns true if `effect` is allowed.
    pub fn contains(self, effect: DragEffect) -> bool {
        match effect {
            DragEffect::None => true,
            DragEffect::Copy => self.0 & Self::COPY.0 != 0,
            DragEffect::Move => self.0 & Self::MOVE.0 != 0,
        }
    }
}

impl core::ops::BitOr for DragEffects {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// The styled text of one paragraph's share of a range.
pub(crate) type StyledParagraph = Vec<(String, AssembledStyles)>;

impl RootBox {
    /// The styled pieces of `range`, one list per paragraph.
    ///
    /// Embedded boxes and their placeholders are left out.
    pub(crate) fn range_runs(&self, range: &RangeSelection) -> Vec<StyledParagraph> {
        let (start, end) = (range.start(), range.end());
        let mut paragraphs = Vec::new();
        let mut inside = false;
        for para_id in self.paragraphs() {
            inside |= para_id == start.para;
            if !inside {
                continue;
            }
            if let Some(para) = self.tree[para_id].para() {
                let text = para.source.logical_text();
                let min = if para_id == start.para { start.offset } else { 0 };
                let lim = if para_id == end.para { end.offset } else { text.len() };
                let mut runs = Vec::new();
                for run in para.source.runs() {
                    if run.origin != RunOrigin::Text {
                        continue;
                    }
                    let lo = run.log_start.max(min);
                    let hi = (run.log_start + run.log_len).min(lim);
                    if lo < hi {
                        let piece: String = text[lo..hi].chars().filter(|&ch| ch != ORC).collect();
                        runs.push((piece, run.style.clone()));
                    }
                }
                paragraphs.push(runs);
            }
            if para_id == end.para {
                break;
            }
        }
        paragraphs
    }

    /// The plain text of the selected range; paragraphs are separated by
    /// `\n`.
    pub fn selected_text(&self) -> Option<String> {
        let range = self.selection?.as_range().copied()?;
        let paragraphs: Vec<String> = self
            .range_runs(&range)
            .into_iter()
            .map(|runs| runs.into_iter().map(|(text, _)| text).collect())
            .collect();
        Some(paragraphs.join("\n"))
    }

    /// The selected range as plain and rich text.
    pub fn selection_data(&self) -> Option<DataObject> {
        let range = self.selection?.as_range().copied()?;
        let text = self.selected_text()?;
        Some(DataObject::new(text).with_rtf(export_rtf(&self.range_runs(&range))))
    }

    /// Puts the selected range on the clipboard. Returns false if there is
    /// no range.
    pub fn copy(&mut self) -> bool {
        let Some(data) = self.selection_data() else {
            return false;
        };
        self.site.set_clipboard(data);
        true
    }

    /// Moves the selected range to the clipboard.
    pub fn cut(&mut self) -> Result<bool> {
        if !self.copy() {
            return Ok(false);
        }
        self.delete_selection()
    }

    /// Types the clipboard text at the selection. Returns false if the
    /// clipboard has no data.
    pub fn paste(&mut self) -> Result<bool> {
        let Some(data) = self.site.clipboard() else {
            return Ok(false);
        };
        self.insert_text(data.text())?;
        Ok(true)
    }

    /// Drags the selected range out through the site.
    ///
    /// If the drop target moved the data, the range is deleted here.
    pub fn begin_drag(&mut self) -> Result<DragEffect> {
        let data = self
            .selection_data()
            .ok_or(Error::invalid_selection("nothing to drag"))?;
        let effect = self.site.do_drag_drop(&data, DragEffects::COPY_OR_MOVE);
        log::debug!("drag ended with {effect:?}");
        if effect == DragEffect::Move {
            self.delete_selection()?;
        }
        Ok(effect)
    }

    /// Inserts dropped data at `point`, in root coordinates.
    pub fn drop_data(&mut self, data: &DataObject, point: Point) -> Result<bool> {
        let Some(ip) = self.get_selection_at(point) else {
            return Ok(false);
        };
        self.select_at(ip.para(), ip.offset(), ip.associate_previous())?;
        self.insert_text(data.text())?;
        Ok(true)
    }

    /// Moves the selected range to `point` within this root.
    ///
    /// Dropping inside the range, or on one of its ends, does nothing.
    pub fn move_selection_to(&mut self, point: Point) -> Result<bool> {
        let Some(Selection::Range(range)) = self.selection else {
            return Ok(false);
        };
        let Some(dest) = self.get_selection_at(point) else {
            return Ok(false);
        };
        let (start, end) = (range.start(), range.end());
        if self.compare_ips(&dest, &start) != Ordering::Less
            && self.compare_ips(&dest, &end) != Ordering::Greater
        {
            return Ok(false);
        }
        let Some(text) = self.selected_text() else {
            return Ok(false);
        };
        let after_in_end_para = dest.para() == end.para() && dest.offset() > end.offset();
        self.delete_selection()?;
        let dest = if after_in_end_para {
            // The end paragraph now starts where the range started.
            let Some(Selection::Ip(caret)) = self.selection else {
                return Err(Error::invalid_selection("range deletion left no caret"));
            };
            InsertionPoint::new(
                caret.para(),
                caret.offset() + (dest.offset() - end.offset()),
                dest.associate_previous(),
            )
        } else {
            dest
        };
        self.select_at(dest.para(), dest.offset(), dest.associate_previous())?;
        self.insert_text(&text)?;
        Ok(true)
    }
}
