// Copyright 2025 the SharpViews Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Geometry of selections and hit testing.

use alloc::vec::Vec;

use peniko::kurbo::{Point, Rect};

use super::{InsertionPoint, RangeSelection, Selection};
use crate::boxes::{BoxId, ParaData, ParaLine};
use crate::root::RootBox;
use crate::text::chars;

/// Index of the line an insertion point at rendered offset `ren` is drawn
/// on.
///
/// At a line boundary the insertion point goes to the line holding the
/// character it is associated with.
pub(crate) fn line_index(lines: &[ParaLine], ren: usize, associate_previous: bool) -> Option<usize> {
    let owns = |line: &ParaLine| {
        if associate_previous {
            line.ren_min < ren && ren <= line.ren_lim
        } else {
            line.ren_min <= ren && ren < line.ren_lim
        }
    };
    lines
        .iter()
        .position(owns)
        .or_else(|| lines.iter().position(|line| line.touches(ren)))
        .or_else(|| lines.len().checked_sub(1))
}

/// The line of `para` nearest to `y`, relative to the paragraph.
fn line_at_y(para: &ParaData, y: f64) -> Option<&ParaLine> {
    para.lines
        .iter()
        .find(|line| y < line.bottom())
        .or(para.lines.last())
}

/// Distance from `at` to the span `lo..hi`; zero inside.
fn gap(lo: f64, hi: f64, at: f64) -> f64 {
    if at < lo {
        lo - at
    } else if at > hi {
        at - hi
    } else {
        0.0
    }
}

impl RootBox {
    /// The caret rectangle of `ip`, in root coordinates.
    pub(crate) fn ip_rect(&self, ip: &InsertionPoint) -> Option<Rect> {
        let node = self.tree.get(ip.para)?;
        let para = node.para()?;
        if !node.laid_out {
            return None;
        }
        let ren = para.source.log_to_ren(ip.offset);
        let line = &para.lines[line_index(&para.lines, ren, ip.associate_previous)?];
        let origin = self.tree.origin_in_root(ip.para);
        let x = origin.x + line.x_of(ren, ip.associate_previous);
        Some(Rect::new(x, origin.y + line.top, x + 1.0, origin.y + line.bottom()))
    }

    /// Where the caret is drawn, if the selection is a laid out caret.
    pub fn caret_rect(&self) -> Option<Rect> {
        match &self.selection {
            Some(Selection::Ip(ip)) => self.ip_rect(ip),
            _ => None,
        }
    }

    /// The highlighted rectangles of `range`, one per line piece.
    pub(crate) fn range_rects(&self, range: &RangeSelection) -> Vec<Rect> {
        let (start, end) = (range.start(), range.end());
        let mut rects = Vec::new();
        let mut inside = false;
        for para_id in self.paragraphs() {
            if para_id == start.para {
                inside = true;
            }
            if !inside {
                continue;
            }
            let node = &self.tree[para_id];
            if let (Some(para), true) = (node.para(), node.laid_out) {
                let min = if para_id == start.para { start.offset } else { 0 };
                let lim = if para_id == end.para {
                    end.offset
                } else {
                    para.source.logical_len()
                };
                let (min, lim) = (para.source.log_to_ren(min), para.source.log_to_ren(lim));
                let origin = self.tree.origin_in_root(para_id);
                for line in &para.lines {
                    if let Some((a, b)) = line.extent(min, lim) {
                        rects.push(Rect::new(
                            origin.x + a,
                            origin.y + line.top,
                            origin.x + b,
                            origin.y + line.bottom(),
                        ));
                    }
                }
            }
            if para_id == end.para {
                break;
            }
        }
        rects
    }

    /// The highlighted rectangles of the selection, in root coordinates.
    pub fn selection_rects(&self) -> Vec<Rect> {
        match &self.selection {
            Some(Selection::Range(range)) => self.range_rects(range),
            _ => Vec::new(),
        }
    }

    /// The insertion point nearest to `point`, in root coordinates.
    ///
    /// The nearest paragraph is found first, then the nearest line in it,
    /// then the nearest character boundary on that line.
    pub fn get_selection_at(&self, point: Point) -> Option<InsertionPoint> {
        let (para_id, _) = self
            .paragraphs()
            .into_iter()
            .filter(|&id| self.tree[id].laid_out)
            .map(|id| {
                let rect = self.tree.rect_in_root(id);
                (id, (gap(rect.y0, rect.y1, point.y), gap(rect.x0, rect.x1, point.x)))
            })
            .min_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(core::cmp::Ordering::Equal))?;
        let para = self.tree[para_id].para()?;
        let origin = self.tree.origin_in_root(para_id);
        let line = line_at_y(para, point.y - origin.y)?;
        let (ren, associate_previous) = line.hit(point.x - origin.x);
        let offset = para.snap_ip(para.source.ren_to_log(ren));
        Some(InsertionPoint::new(
            para_id,
            offset,
            associate_previous && offset > 0,
        ))
    }

    /// Handles a click: puts the caret at `point`, or extends the selection
    /// to it when `extend` is set.
    ///
    /// Returns false if there is nothing to select.
    pub fn select_at_point(&mut self, point: Point, extend: bool) -> bool {
        let Some(ip) = self.get_selection_at(point) else {
            return false;
        };
        let anchor = match (&self.selection, extend) {
            (Some(Selection::Ip(anchor)), true) => *anchor,
            (Some(Selection::Range(range)), true) => range.anchor(),
            _ => ip,
        };
        let selection = self.make_range(anchor, ip);
        self.install_selection(Some(selection));
        true
    }

    /// Handles a double click: selects the word at `point`.
    pub fn select_word_at(&mut self, point: Point) -> bool {
        let Some(ip) = self.get_selection_at(point) else {
            return false;
        };
        let Some(para) = self.tree[ip.para].para() else {
            return false;
        };
        let word = chars::word_at(para.source.logical_text(), ip.offset);
        let selection = self.make_range(
            InsertionPoint::new(ip.para, word.start, false),
            InsertionPoint::new(ip.para, word.end, true),
        );
        self.install_selection(Some(selection));
        true
    }

    /// The paragraph before or after `para` in document order.
    pub(crate) fn adjacent_para(&self, para: BoxId, forward: bool) -> Option<BoxId> {
        let paras = self.paragraphs();
        let index = paras.iter().position(|&p| p == para)?;
        if forward {
            paras.get(index + 1).copied()
        } else {
            index.checked_sub(1).map(|i| paras[i])
        }
    }
}
