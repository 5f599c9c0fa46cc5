// Copyright 2025 the SharpViews Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Full and incremental layout of the box tree.
//!
//! [`BoxTree::layout`] computes sizes and positions from scratch.
//! [`BoxTree::relayout`] walks only the boxes named in a [`FixMap`] (the boxes
//! whose content changed, plus all of their containers) and reports the
//! rectangles that need repainting through [`LayoutCallbacks`].

use alloc::vec::Vec;
use core::mem;

use hashbrown::HashMap;
use peniko::kurbo::{Point, Rect};

use crate::boxes::{BoxId, BoxKind, BoxTree, ColumnWidth, LineBreaker, LineItem, ParaLine};
use crate::render::RenderEngineFactory;
use crate::style::{AssembledStyles, Thickness};

/// Previous root-relative rectangles of the boxes that need relayout.
pub type FixMap = HashMap<BoxId, Rect>;

/// Receives the rectangles invalidated by a relayout.
pub trait LayoutCallbacks {
    /// Marks `rect`, in root coordinates, as needing repaint.
    fn invalidate_in_root(&mut self, rect: Rect);
}

impl LayoutCallbacks for Vec<Rect> {
    fn invalidate_in_root(&mut self, rect: Rect) {
        self.push(rect);
    }
}

/// Converts millipoints to pixels at `dpi`.
///
/// Rounds to the nearest pixel, except that a non-zero length never becomes
/// zero pixels.
pub fn mp_to_pixels(mp: i32, dpi: f64) -> f64 {
    if mp == 0 {
        return 0.0;
    }
    let px = (f64::from(mp) * dpi / 72_000.0).round();
    if px == 0.0 {
        f64::from(mp.signum())
    } else {
        px
    }
}

/// Everything a box needs to lay itself out.
#[derive(Clone, Copy)]
pub struct LayoutInfo<'a> {
    /// Width available to the box, in pixels.
    pub available_width: f64,
    /// Horizontal resolution.
    pub dpi_x: f64,
    /// Vertical resolution.
    pub dpi_y: f64,
    /// Measures text.
    pub engines: &'a dyn RenderEngineFactory,
}

impl core::fmt::Debug for LayoutInfo<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("LayoutInfo")
            .field("available_width", &self.available_width)
            .field("dpi_x", &self.dpi_x)
            .field("dpi_y", &self.dpi_y)
            .finish_non_exhaustive()
    }
}

impl LayoutInfo<'_> {
    /// The same information with a different available width.
    #[must_use]
    pub fn with_width(&self, available_width: f64) -> Self {
        Self {
            available_width,
            ..*self
        }
    }

    /// Converts a horizontal length in millipoints to pixels.
    pub fn mp_to_pixels_x(&self, mp: i32) -> f64 {
        mp_to_pixels(mp, self.dpi_x)
    }

    /// Converts a vertical length in millipoints to pixels.
    pub fn mp_to_pixels_y(&self, mp: i32) -> f64 {
        mp_to_pixels(mp, self.dpi_y)
    }
}

/// Space taken by margins, borders and pads on each edge, in pixels.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub(crate) struct Gaps {
    pub(crate) left: f64,
    pub(crate) top: f64,
    pub(crate) right: f64,
    pub(crate) bottom: f64,
}

impl Gaps {
    pub(crate) fn of(style: &AssembledStyles, info: &LayoutInfo<'_>) -> Self {
        let mut gaps = Self::default();
        for thickness in [style.margins(), style.borders(), style.pads()] {
            gaps.add(thickness, info);
        }
        gaps
    }

    fn add(&mut self, t: Thickness, info: &LayoutInfo<'_>) {
        self.left += info.mp_to_pixels_x(t.left);
        self.right += info.mp_to_pixels_x(t.right);
        self.top += info.mp_to_pixels_y(t.top);
        self.bottom += info.mp_to_pixels_y(t.bottom);
    }

    fn horizontal(&self) -> f64 {
        self.left + self.right
    }
}

/// Splits `inner` among columns: fixed columns first, the rest by share.
fn column_widths(columns: &[ColumnWidth], count: usize, inner: f64, info: &LayoutInfo<'_>) -> Vec<f64> {
    let column = |i: usize| columns.get(i).copied().unwrap_or_default();
    let fixed: f64 = (0..count)
        .filter_map(|i| match column(i) {
            ColumnWidth::Fixed(mp) => Some(info.mp_to_pixels_x(mp)),
            ColumnWidth::Share(_) => None,
        })
        .sum();
    let shares: u32 = (0..count)
        .filter_map(|i| match column(i) {
            ColumnWidth::Share(share) => Some(share),
            ColumnWidth::Fixed(_) => None,
        })
        .sum();
    let left_over = (inner - fixed).max(0.0);
    (0..count)
        .map(|i| match column(i) {
            ColumnWidth::Fixed(mp) => info.mp_to_pixels_x(mp),
            ColumnWidth::Share(_) if shares == 0 => 0.0,
            ColumnWidth::Share(share) => left_over * f64::from(share) / f64::from(shares),
        })
        .collect()
}

/// Whether two line layouts show the same content, given that rendered text
/// `start..start + delete` was replaced by `insert` bytes.
fn same_line(old: &ParaLine, new: &ParaLine, change: Option<(usize, usize, usize)>) -> bool {
    let Some((start, delete, insert)) = change else {
        return false;
    };
    if old.top != new.top || old.height() != new.height() || old.left != new.left {
        return false;
    }
    if old.ren_lim <= start {
        return new.ren_min == old.ren_min && new.ren_lim == old.ren_lim;
    }
    if old.ren_min >= start + delete {
        let shift = |ren: usize| (ren + insert).checked_sub(delete);
        return Some(new.ren_min) == shift(old.ren_min) && Some(new.ren_lim) == shift(old.ren_lim);
    }
    false
}

fn line_rect(line: &ParaLine, origin: Point, width: f64) -> Rect {
    Rect::new(origin.x, origin.y + line.top, origin.x + width, origin.y + line.bottom())
}

impl BoxTree {
    /// Lays out `id` and everything inside it from scratch.
    pub(crate) fn layout(&mut self, id: BoxId, info: &LayoutInfo<'_>) {
        let gaps = Gaps::of(&self[id].style, info);
        let inner = (info.available_width - gaps.horizontal()).max(0.0);
        match &self[id].kind {
            BoxKind::Div(_) => self.layout_pile(id, info, gaps, inner),
            BoxKind::Row { .. } => self.layout_row(id, info, gaps, inner),
            BoxKind::Para(_) => self.layout_para(id, info, gaps, inner),
            BoxKind::Block(block) => {
                let width = if block.width == 0 {
                    inner
                } else {
                    info.mp_to_pixels_x(block.width)
                };
                let height = info.mp_to_pixels_y(block.height);
                let node = &mut self[id];
                node.width = width + gaps.horizontal();
                node.height = height + gaps.top + gaps.bottom;
                node.ascent = gaps.top + height;
            }
            BoxKind::Lazy(lazy) => {
                let height = lazy.estimated_height();
                let node = &mut self[id];
                node.width = info.available_width;
                node.height = height;
                node.ascent = height;
            }
        }
        self[id].laid_out = true;
    }

    fn layout_pile(&mut self, id: BoxId, info: &LayoutInfo<'_>, gaps: Gaps, inner: f64) {
        let child_info = info.with_width(inner);
        let children: Vec<BoxId> = self.children(id).collect();
        let mut y = gaps.top;
        for &child in &children {
            self.layout(child, &child_info);
            let node = &mut self[child];
            node.left = gaps.left;
            node.top = y;
            y += node.height;
        }
        let ascent = children
            .first()
            .map_or(y, |&first| self[first].top + self[first].ascent);
        let node = &mut self[id];
        node.width = info.available_width;
        node.height = y + gaps.bottom;
        node.ascent = ascent;
    }

    fn layout_row(&mut self, id: BoxId, info: &LayoutInfo<'_>, gaps: Gaps, inner: f64) {
        let children: Vec<BoxId> = self.children(id).collect();
        let widths = match &self[id].kind {
            BoxKind::Row { columns, .. } => column_widths(columns, children.len(), inner, info),
            _ => unreachable!("not a row"),
        };
        let mut x = gaps.left;
        let mut height: f64 = 0.0;
        let mut ascent: f64 = 0.0;
        for (&child, &width) in children.iter().zip(&widths) {
            self.layout(child, &info.with_width(width));
            let node = &mut self[child];
            node.left = x;
            node.top = gaps.top;
            x += width;
            height = height.max(node.height);
            ascent = ascent.max(node.ascent);
        }
        let node = &mut self[id];
        node.width = info.available_width;
        node.height = gaps.top + height + gaps.bottom;
        node.ascent = gaps.top + ascent;
    }

    fn layout_para(&mut self, id: BoxId, info: &LayoutInfo<'_>, gaps: Gaps, inner: f64) {
        let style = self[id].style.clone();
        let Some(para) = self[id].para_mut() else {
            unreachable!("not a paragraph");
        };
        let source = mem::take(&mut para.source);
        let indent = info.mp_to_pixels_x(style.first_line_indent());
        let line_height = if style.line_height() > 0 {
            info.mp_to_pixels_y(style.line_height())
        } else {
            0.0
        };
        let mut lines = LineBreaker::new(&source, &style, info.engines, inner)
            .first_indent(indent)
            .line_height(line_height)
            .run(&mut |child, width| {
                self.layout(child, &info.with_width(width));
                (self[child].width, self[child].height)
            });

        for line in &mut lines {
            line.top += gaps.top;
            line.left += gaps.left;
            for item in &line.items {
                if let LineItem::Embedded {
                    id: child,
                    left,
                    height,
                    ..
                } = item
                {
                    let node = &mut self[*child];
                    node.container = Some(id);
                    node.left = line.left + left;
                    node.top = line.top + line.ascent - height;
                }
            }
        }
        log::trace!("paragraph {id:?} broken into {} lines", lines.len());

        let bottom = lines.last().map_or(gaps.top, ParaLine::bottom) + gaps.bottom;
        let ascent = lines.first().map_or(gaps.top, |line| line.top + line.ascent);
        let node = &mut self[id];
        node.width = info.available_width;
        node.height = bottom;
        node.ascent = ascent;
        if let Some(para) = node.para_mut() {
            para.source = source;
            para.lines = lines;
        }
    }

    /// Brings the layout of `id` up to date after the changes recorded in
    /// `fixmap`, invalidating what changed on screen.
    ///
    /// Returns true if the size of the box changed, so that its container has
    /// to move the boxes after it.
    pub(crate) fn relayout(
        &mut self,
        id: BoxId,
        info: &LayoutInfo<'_>,
        fixmap: &FixMap,
        callbacks: &mut dyn LayoutCallbacks,
    ) -> bool {
        if !self[id].laid_out {
            self.layout(id, info);
            callbacks.invalidate_in_root(self.rect_in_root(id));
            return true;
        }
        let Some(&old) = fixmap.get(&id) else {
            return false;
        };
        let gaps = Gaps::of(&self[id].style, info);
        let inner = (info.available_width - gaps.horizontal()).max(0.0);
        match &self[id].kind {
            BoxKind::Div(_) | BoxKind::Row { .. } => {
                self.relayout_group(id, info, fixmap, callbacks, gaps, inner);
            }
            BoxKind::Para(_) => self.relayout_para(id, info, old, callbacks, gaps, inner),
            BoxKind::Block(_) | BoxKind::Lazy(_) => {
                self.layout(id, info);
                let new = self.rect_in_root(id);
                if new != old {
                    callbacks.invalidate_in_root(old);
                    callbacks.invalidate_in_root(new);
                }
            }
        }
        let new = self.rect_in_root(id);
        let resized = new.width() != old.width() || new.height() != old.height();
        if resized {
            // The strip the box grew into or vacated.
            let (lo, hi) = (old.y1.min(new.y1), old.y1.max(new.y1));
            if hi > lo {
                callbacks.invalidate_in_root(Rect::new(new.x0, lo, new.x0 + new.width().max(old.width()), hi));
            }
        }
        log::debug!("relayout of {id:?}: resized {resized}");
        resized
    }

    fn relayout_group(
        &mut self,
        id: BoxId,
        info: &LayoutInfo<'_>,
        fixmap: &FixMap,
        callbacks: &mut dyn LayoutCallbacks,
        gaps: Gaps,
        inner: f64,
    ) {
        let children: Vec<BoxId> = self.children(id).collect();
        let widths = match &self[id].kind {
            BoxKind::Row { columns, .. } => Some(column_widths(columns, children.len(), inner, info)),
            _ => None,
        };
        let mut pos = match widths {
            Some(_) => gaps.left,
            None => gaps.top,
        };
        let mut extent: f64 = 0.0;
        for (index, &child) in children.iter().enumerate() {
            let width = widths.as_ref().map_or(inner, |widths| widths[index]);
            let child_info = info.with_width(width);
            let (left, top) = match widths {
                Some(_) => (pos, gaps.top),
                None => (gaps.left, pos),
            };
            if self[child].laid_out {
                let old_rect = self.rect_in_root(child);
                let old_origin = (self[child].left, self[child].top);
                self.relayout(child, &child_info, fixmap, callbacks);
                let node = &mut self[child];
                node.left = left;
                node.top = top;
                if old_origin != (left, top) {
                    callbacks.invalidate_in_root(old_rect);
                    callbacks.invalidate_in_root(self.rect_in_root(child));
                }
            } else {
                self.layout(child, &child_info);
                let node = &mut self[child];
                node.left = left;
                node.top = top;
                callbacks.invalidate_in_root(self.rect_in_root(child));
            }
            let node = &self[child];
            match widths {
                Some(_) => {
                    pos += width;
                    extent = extent.max(node.height);
                }
                None => pos += node.height,
            }
        }
        let height = match widths {
            Some(_) => gaps.top + extent + gaps.bottom,
            None => pos + gaps.bottom,
        };
        let ascent = children
            .first()
            .map_or(height, |&first| self[first].top + self[first].ascent);
        let node = &mut self[id];
        node.width = info.available_width;
        node.height = height;
        node.ascent = ascent;
    }

    fn relayout_para(
        &mut self,
        id: BoxId,
        info: &LayoutInfo<'_>,
        old: Rect,
        callbacks: &mut dyn LayoutCallbacks,
        gaps: Gaps,
        inner: f64,
    ) {
        let Some(para) = self[id].para_mut() else {
            unreachable!("not a paragraph");
        };
        let old_lines = mem::take(&mut para.lines);
        let change = para.pending_change.take();
        self.layout_para(id, info, gaps, inner);

        let new_origin = self.origin_in_root(id);
        let width = self[id].width.max(old.width());
        let Some(para) = self[id].para() else {
            unreachable!("not a paragraph");
        };
        let mut invalid = Vec::new();
        for line in &para.lines {
            if !old_lines.iter().any(|old_line| same_line(old_line, line, change)) {
                invalid.push(line_rect(line, new_origin, width));
            }
        }
        for old_line in &old_lines {
            if !para.lines.iter().any(|line| same_line(old_line, line, change)) {
                invalid.push(line_rect(old_line, old.origin(), width));
            }
        }
        log::debug!("paragraph {id:?}: {} line rectangles invalidated", invalid.len());
        for rect in invalid {
            callbacks.invalidate_in_root(rect);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thin_lengths_never_vanish() {
        assert_eq!(mp_to_pixels(0, 96.0), 0.0);
        assert_eq!(mp_to_pixels(250, 96.0), 1.0);
        assert_eq!(mp_to_pixels(-250, 96.0), -1.0);
        assert_eq!(mp_to_pixels(750, 96.0), 1.0);
        assert_eq!(mp_to_pixels(1_000, 96.0), 1.0);
        assert_eq!(mp_to_pixels(72_000, 96.0), 96.0);
    }
}
