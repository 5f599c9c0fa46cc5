// Copyright 2025 the SharpViews Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Insertion points and range selections.
//!
//! Offsets are logical byte offsets into a paragraph's text. At a position
//! shared by two characters (a run boundary, a line boundary, the end of
//! the text) `associate_previous` tells which of them the insertion point
//! belongs to: it decides which line the caret is drawn on and which
//! formatting typed text takes.

mod hit;
mod navigate;

use alloc::vec::Vec;
use core::cmp::Ordering;

use peniko::kurbo::Rect;

use crate::boxes::BoxId;
use crate::root::RootBox;
use crate::{Error, Result};

pub use self::navigate::NavKey;

/// A caret position inside one paragraph.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct InsertionPoint {
    pub(crate) para: BoxId,
    pub(crate) offset: usize,
    pub(crate) associate_previous: bool,
}

impl InsertionPoint {
    /// Creates an insertion point; it is checked when it is installed.
    pub fn new(para: BoxId, offset: usize, associate_previous: bool) -> Self {
        Self {
            para,
            offset,
            associate_previous,
        }
    }

    /// The paragraph.
    pub fn para(&self) -> BoxId {
        self.para
    }

    /// Logical byte offset in the paragraph.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Whether the insertion point belongs to the character before it.
    pub fn associate_previous(&self) -> bool {
        self.associate_previous
    }
}

/// A selection between two insertion points, possibly in different
/// paragraphs.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct RangeSelection {
    anchor: InsertionPoint,
    drag_end: InsertionPoint,
    end_before_anchor: bool,
}

impl RangeSelection {
    /// Where the selection was started.
    pub fn anchor(&self) -> InsertionPoint {
        self.anchor
    }

    /// The end that moves when the selection is extended.
    pub fn drag_end(&self) -> InsertionPoint {
        self.drag_end
    }

    /// Returns true if the drag end comes first in the document.
    pub fn end_before_anchor(&self) -> bool {
        self.end_before_anchor
    }

    /// The end that comes first in the document.
    pub fn start(&self) -> InsertionPoint {
        if self.end_before_anchor {
            self.drag_end
        } else {
            self.anchor
        }
    }

    /// The end that comes last in the document.
    pub fn end(&self) -> InsertionPoint {
        if self.end_before_anchor {
            self.anchor
        } else {
            self.drag_end
        }
    }

    /// Returns true if `ip` lies inside the selection.
    ///
    /// An insertion point at either end is inside only if it belongs to the
    /// selected character there. Every position of a paragraph strictly
    /// between the two ends is inside.
    pub fn contains(&self, root: &RootBox, ip: &InsertionPoint) -> bool {
        let (start, end) = (self.start(), self.end());
        let after_start = match root.compare_paras(ip.para, start.para) {
            Some(Ordering::Greater) => true,
            Some(Ordering::Equal) => {
                ip.offset > start.offset || (ip.offset == start.offset && !ip.associate_previous)
            }
            Some(Ordering::Less) | None => false,
        };
        let before_end = match root.compare_paras(ip.para, end.para) {
            Some(Ordering::Less) => true,
            Some(Ordering::Equal) => {
                ip.offset < end.offset || (ip.offset == end.offset && ip.associate_previous)
            }
            Some(Ordering::Greater) | None => false,
        };
        after_start && before_end && start != end
    }
}

/// The selection installed in a [`RootBox`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Selection {
    /// A caret.
    Ip(InsertionPoint),
    /// A range.
    Range(RangeSelection),
}

impl Selection {
    /// The caret, if this is one.
    pub fn as_ip(&self) -> Option<&InsertionPoint> {
        match self {
            Self::Ip(ip) => Some(ip),
            Self::Range(_) => None,
        }
    }

    /// The range, if this is one.
    pub fn as_range(&self) -> Option<&RangeSelection> {
        match self {
            Self::Range(range) => Some(range),
            Self::Ip(_) => None,
        }
    }
}

impl RootBox {
    /// The installed selection.
    pub fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    /// Document order of two paragraphs; `None` if either is not a
    /// top-level paragraph of this root.
    pub(crate) fn compare_paras(&self, a: BoxId, b: BoxId) -> Option<Ordering> {
        if a == b {
            return self.tree.contains(a).then_some(Ordering::Equal);
        }
        let paras = self.paragraphs();
        let ia = paras.iter().position(|&p| p == a)?;
        let ib = paras.iter().position(|&p| p == b)?;
        Some(ia.cmp(&ib))
    }

    /// Document order of two insertion points.
    pub(crate) fn compare_ips(&self, a: &InsertionPoint, b: &InsertionPoint) -> Ordering {
        self.compare_paras(a.para, b.para)
            .unwrap_or(Ordering::Equal)
            .then(a.offset.cmp(&b.offset))
    }

    /// Checks `ip` and moves it back to a valid position if it falls inside
    /// a character or before a diacritic.
    pub(crate) fn validate_ip(&self, ip: InsertionPoint) -> Result<InsertionPoint> {
        let para = self.para_node(ip.para)?;
        let len = para.source.logical_len();
        if ip.offset > len {
            return Err(Error::invalid_offset(ip.para, ip.offset, len));
        }
        let offset = para.snap_ip(ip.offset);
        let associate_previous = if offset == 0 {
            false
        } else if offset == len {
            true
        } else {
            ip.associate_previous
        };
        Ok(InsertionPoint {
            offset,
            associate_previous,
            ..ip
        })
    }

    pub(crate) fn make_range(&self, anchor: InsertionPoint, drag_end: InsertionPoint) -> Selection {
        if anchor.para == drag_end.para && anchor.offset == drag_end.offset {
            return Selection::Ip(drag_end);
        }
        Selection::Range(RangeSelection {
            anchor,
            drag_end,
            end_before_anchor: self.compare_ips(&drag_end, &anchor) == Ordering::Less,
        })
    }

    /// Installs `selection`, invalidating the old and the new one.
    pub(crate) fn install_selection(&mut self, selection: Option<Selection>) {
        if self.selection == selection {
            return;
        }
        let old = self.selection.take();
        let rects: Vec<Rect> = [old, selection]
            .iter()
            .flatten()
            .flat_map(|s| self.selection_bounds(s))
            .collect();
        for rect in rects {
            self.invalidate(rect);
        }
        self.selection = selection;
        self.up_down_x = None;
    }

    /// Puts the caret at `offset` in paragraph `para`.
    pub fn select_at(&mut self, para: BoxId, offset: usize, associate_previous: bool) -> Result<()> {
        let ip = self.validate_ip(InsertionPoint::new(para, offset, associate_previous))?;
        self.install_selection(Some(Selection::Ip(ip)));
        Ok(())
    }

    /// Puts the caret at the end of paragraph `para`.
    pub fn select_at_end(&mut self, para: BoxId) -> Result<()> {
        let len = self.para_node(para)?.source.logical_len();
        self.select_at(para, len, true)
    }

    /// Selects from `anchor` to `drag_end`; equal ends make a caret.
    pub fn select_range(&mut self, anchor: InsertionPoint, drag_end: InsertionPoint) -> Result<()> {
        let anchor = self.validate_ip(anchor)?;
        let drag_end = self.validate_ip(drag_end)?;
        let selection = self.make_range(anchor, drag_end);
        self.install_selection(Some(selection));
        Ok(())
    }

    /// Selects everything. Returns false if there is no paragraph.
    pub fn select_all(&mut self) -> bool {
        let paras = self.paragraphs();
        let (Some(&first), Some(&last)) = (paras.first(), paras.last()) else {
            return false;
        };
        let end = self.tree[last].para().map_or(0, |para| para.source.logical_len());
        let selection = self.make_range(
            InsertionPoint::new(first, 0, false),
            InsertionPoint::new(last, end, true),
        );
        self.install_selection(Some(selection));
        true
    }

    /// Removes the selection.
    pub fn clear_selection(&mut self) {
        self.install_selection(None);
    }

    /// The area to repaint when `selection` appears or disappears.
    fn selection_bounds(&self, selection: &Selection) -> Vec<Rect> {
        match selection {
            Selection::Ip(ip) => self.ip_rect(ip).map(|rect| rect.inflate(1.0, 0.0)).into_iter().collect(),
            Selection::Range(range) => self.range_rects(range),
        }
    }
}
