// Copyright 2025 the SharpViews Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Paragraph content and line breaking.

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::ops::Range;

use super::BoxId;
use crate::hookup::HookupId;
use crate::render::{
    BreakRequest, BreakResult, LineBreakPolicy, RenderEngineFactory, Segment, SegmentEnd,
};
use crate::style::{AssembledStyles, TextAlign};
use crate::text::{chars, TextSource, ORC_LEN};

/// The content of a paragraph box and its current lines.
#[derive(Debug, Default)]
pub(crate) struct ParaData {
    pub(crate) source: TextSource,
    pub(crate) lines: Vec<ParaLine>,
    /// The hookup supplying each client run; `None` for literals and
    /// embedded boxes.
    pub(crate) run_hookups: Vec<Option<HookupId>>,
    /// The rendered change `(start, delete, insert)` since the last layout.
    pub(crate) pending_change: Option<(usize, usize, usize)>,
}

impl ParaData {
    /// Whether an insertion point may be placed at logical `offset`.
    ///
    /// The text has to allow it, and so does every laid-out segment the
    /// position falls strictly inside of.
    pub(crate) fn is_valid_ip(&self, offset: usize) -> bool {
        chars::is_ip_boundary(self.source.logical_text(), offset) && self.segments_accept(offset)
    }

    fn segments_accept(&self, offset: usize) -> bool {
        let ren = self.source.log_to_ren(offset);
        self.lines
            .iter()
            .filter(|line| line.touches(ren))
            .all(|line| line.accepts_ip(ren))
    }

    /// The closest valid insertion point before `offset`.
    pub(crate) fn prev_ip(&self, offset: usize) -> Option<usize> {
        let text = self.source.logical_text();
        let mut pos = offset;
        loop {
            pos = chars::prev_ip(text, pos)?;
            if pos == 0 || self.segments_accept(pos) {
                return Some(pos);
            }
        }
    }

    /// The closest valid insertion point after `offset`.
    pub(crate) fn next_ip(&self, offset: usize) -> Option<usize> {
        let text = self.source.logical_text();
        let mut pos = offset;
        loop {
            pos = chars::next_ip(text, pos)?;
            if pos == text.len() || self.segments_accept(pos) {
                return Some(pos);
            }
        }
    }

    /// Moves `offset` back to the nearest valid insertion point at or
    /// before it.
    pub(crate) fn snap_ip(&self, offset: usize) -> usize {
        let snapped = chars::snap_ip(self.source.logical_text(), offset);
        if self.is_valid_ip(snapped) {
            snapped
        } else {
            self.prev_ip(snapped).unwrap_or(0)
        }
    }
}

/// One piece of a line.
#[derive(Debug)]
pub(crate) enum LineItem {
    Text {
        segment: Box<dyn Segment>,
        /// Offset from the left of the line.
        left: f64,
    },
    Embedded {
        id: BoxId,
        /// Rendered offset of the placeholder.
        ren: usize,
        left: f64,
        width: f64,
        height: f64,
    },
}

impl LineItem {
    pub(crate) fn left(&self) -> f64 {
        match self {
            Self::Text { left, .. } | Self::Embedded { left, .. } => *left,
        }
    }

    pub(crate) fn width(&self) -> f64 {
        match self {
            Self::Text { segment, .. } => segment.width(),
            Self::Embedded { width, .. } => *width,
        }
    }

    pub(crate) fn ren_range(&self) -> Range<usize> {
        match self {
            Self::Text { segment, .. } => segment.ich_min()..segment.ich_lim(),
            Self::Embedded { ren, .. } => *ren..*ren + ORC_LEN,
        }
    }

    fn set_left(&mut self, x: f64) {
        match self {
            Self::Text { left, .. } | Self::Embedded { left, .. } => *left = x,
        }
    }
}

/// One line of a paragraph.
#[derive(Debug)]
pub(crate) struct ParaLine {
    pub(crate) items: Vec<LineItem>,
    /// Top of the line relative to the paragraph.
    pub(crate) top: f64,
    /// Left of the line relative to the paragraph.
    pub(crate) left: f64,
    pub(crate) ascent: f64,
    pub(crate) descent: f64,
    pub(crate) ren_min: usize,
    pub(crate) ren_lim: usize,
}

impl ParaLine {
    pub(crate) fn height(&self) -> f64 {
        self.ascent + self.descent
    }

    pub(crate) fn bottom(&self) -> f64 {
        self.top + self.height()
    }

    /// Whether rendered offset `ren` can be displayed on this line.
    pub(crate) fn touches(&self, ren: usize) -> bool {
        self.ren_min <= ren && ren <= self.ren_lim
    }

    /// Whether the segments of this line allow an insertion point at
    /// rendered offset `ren`. Segment and box edges are always allowed.
    pub(crate) fn accepts_ip(&self, ren: usize) -> bool {
        self.items.iter().all(|item| match item {
            LineItem::Text { segment, .. } => {
                let range = item.ren_range();
                ren <= range.start || ren >= range.end || segment.is_valid_ip(ren)
            }
            LineItem::Embedded { .. } => true,
        })
    }

    /// Horizontal position of an insertion point, relative to the paragraph.
    pub(crate) fn x_of(&self, ren: usize, associate_previous: bool) -> f64 {
        let candidates = self.items.iter().filter(|item| {
            let range = item.ren_range();
            range.start <= ren && ren <= range.end
        });
        let mut fallback = None;
        for item in candidates {
            let range = item.ren_range();
            let x = match item {
                LineItem::Text { segment, left } => {
                    segment.position_of_ip(ren, associate_previous).map(|x| left + x)
                }
                LineItem::Embedded { left, width, .. } => {
                    Some(if ren == range.start { *left } else { left + width })
                }
            };
            let preferred = if associate_previous {
                ren > range.start || range.is_empty()
            } else {
                ren < range.end || range.is_empty()
            };
            if preferred {
                if let Some(x) = x {
                    return self.left + x;
                }
            }
            fallback = fallback.or(x);
        }
        self.left + fallback.unwrap_or(0.0)
    }

    /// The insertion point nearest to horizontal position `x`, relative to
    /// the paragraph, as `(ren, associate_previous)`.
    pub(crate) fn hit(&self, x: f64) -> (usize, bool) {
        let rel = x - self.left;
        let item = self
            .items
            .iter()
            .find(|item| rel < item.left() + item.width())
            .or(self.items.last());
        match item {
            Some(LineItem::Text { segment, left }) => segment.point_to_char(rel - left),
            Some(LineItem::Embedded {
                ren, left, width, ..
            }) => {
                if rel < left + width / 2.0 {
                    (*ren, false)
                } else {
                    (*ren + ORC_LEN, true)
                }
            }
            None => (self.ren_min, false),
        }
    }

    /// Horizontal extent of rendered range `min..lim` on this line, relative
    /// to the paragraph.
    pub(crate) fn extent(&self, min: usize, lim: usize) -> Option<(f64, f64)> {
        let mut extent: Option<(f64, f64)> = None;
        for item in &self.items {
            let range = item.ren_range();
            let piece = match item {
                LineItem::Text { segment, left } => segment
                    .range_extent(min, lim)
                    .map(|(a, b)| (left + a, left + b)),
                LineItem::Embedded { left, width, .. } => {
                    (min <= range.start && range.end <= lim).then_some((*left, left + width))
                }
            };
            if let Some((a, b)) = piece {
                extent = Some(match extent {
                    Some((lo, hi)) => (lo.min(a), hi.max(b)),
                    None => (a, b),
                });
            }
        }
        extent.map(|(a, b)| (self.left + a, self.left + b))
    }
}

struct PendingItem {
    item: LineItem,
    /// A line break may follow this item.
    breakable: bool,
    /// The request limit and width the item was measured with.
    ich_lim: usize,
    max_width: f64,
}

/// Breaks paragraph content into lines.
pub(crate) struct LineBreaker<'a> {
    source: &'a TextSource,
    style: &'a AssembledStyles,
    engines: &'a dyn RenderEngineFactory,
    /// Width available to lines.
    width: f64,
    first_indent: f64,
    /// Exact line height in pixels, or zero.
    line_height: f64,
    lines: Vec<ParaLine>,
    items: Vec<PendingItem>,
    x: f64,
}

impl<'a> LineBreaker<'a> {
    pub(crate) fn new(
        source: &'a TextSource,
        style: &'a AssembledStyles,
        engines: &'a dyn RenderEngineFactory,
        width: f64,
    ) -> Self {
        Self {
            source,
            style,
            engines,
            width,
            first_indent: 0.0,
            line_height: 0.0,
            lines: Vec::new(),
            items: Vec::new(),
            x: 0.0,
        }
    }

    pub(crate) fn first_indent(mut self, indent: f64) -> Self {
        self.first_indent = indent;
        self
    }

    pub(crate) fn line_height(mut self, height: f64) -> Self {
        self.line_height = height;
        self
    }

    fn line_width(&self) -> f64 {
        if self.lines.is_empty() {
            self.width - self.first_indent
        } else {
            self.width
        }
    }

    fn request(&self, ich: usize, ich_lim: usize, policy: LineBreakPolicy, style: &AssembledStyles) -> BreakResult {
        let max_width = (self.line_width() - self.x).max(0.0);
        let request = BreakRequest {
            source: self.source,
            style,
            ich_min: ich,
            ich_lim,
            max_width,
            policy,
            start_of_line: self.items.is_empty(),
            must_break_inside: false,
        };
        self.engines.engine(style.ws()).find_break_point(&request)
    }

    /// Breaks the whole paragraph. `embedded` lays out an embedded box at the
    /// given available width and returns its `(width, height)`.
    pub(crate) fn run(mut self, embedded: &mut dyn FnMut(BoxId, f64) -> (f64, f64)) -> Vec<ParaLine> {
        let len = self.source.len();
        let mut ich = 0;
        loop {
            let run = self.source.render_run_at(ich);
            let style = run.map_or(self.style, |run| &run.style);
            let run_lim = run.map_or(len, |run| run.range().end).max(ich);

            if let Some(id) = run.and_then(|run| run.embedded).filter(|_| ich < len) {
                let (width, height) = embedded(id, self.width);
                if !self.items.is_empty() && self.x + width > self.line_width() {
                    self.finish_line();
                }
                self.push(
                    LineItem::Embedded {
                        id,
                        ren: ich,
                        left: self.x,
                        width,
                        height,
                    },
                    true,
                    run_lim,
                    width,
                );
                ich = run_lim;
                if ich >= len {
                    self.finish_line();
                    break;
                }
                continue;
            }

            let style = style.clone();
            let mut result = self.request(ich, run_lim, LineBreakPolicy::Word, &style);
            if !Self::progressed(&result, ich, run_lim) && !self.items.is_empty() {
                ich = self.break_before(ich);
                continue;
            }
            for policy in [LineBreakPolicy::Letter, LineBreakPolicy::Clip] {
                if Self::progressed(&result, ich, run_lim) {
                    break;
                }
                log::trace!("nothing fit at {ich}, retrying with {policy:?}");
                result = self.request(ich, run_lim, policy, &style);
            }
            let Some(segment) = result.segment.filter(|_| Self::progressed_lim(result.lim, result.end, ich, run_lim)) else {
                log::warn!("render engine made no progress at {ich}; dropping the rest of the paragraph");
                self.finish_line();
                break;
            };

            let max_width = (self.line_width() - self.x).max(0.0);
            let breakable = result.end == SegmentEnd::OkayBreak;
            self.push(
                LineItem::Text {
                    segment,
                    left: self.x,
                },
                breakable,
                run_lim,
                max_width,
            );
            ich = result.lim;
            match result.end {
                SegmentEnd::NoMore => {
                    self.finish_line();
                    break;
                }
                SegmentEnd::MoreLines => {
                    self.finish_line();
                    if ich >= len {
                        break;
                    }
                }
                SegmentEnd::WsBreak | SegmentEnd::OkayBreak | SegmentEnd::NothingFit => {
                    if ich >= len {
                        self.finish_line();
                        break;
                    }
                }
            }
        }
        self.lines
    }

    fn progressed(result: &BreakResult, ich: usize, run_lim: usize) -> bool {
        result.segment.is_some() && Self::progressed_lim(result.lim, result.end, ich, run_lim)
    }

    fn progressed_lim(lim: usize, end: SegmentEnd, ich: usize, run_lim: usize) -> bool {
        end != SegmentEnd::NothingFit && (lim > ich || ich == run_lim)
    }

    /// Ends the current line before `ich` because the next run does not fit.
    ///
    /// If the last item does not allow a break after it, it is measured again
    /// and asked to break inside. Returns the offset to continue from.
    fn break_before(&mut self, ich: usize) -> usize {
        let last_breakable = self.items.last().is_none_or(|item| item.breakable || matches!(item.item, LineItem::Embedded { .. }));
        if last_breakable {
            self.finish_line();
            return ich;
        }
        let Some(last) = self.items.pop() else {
            return ich;
        };
        let LineItem::Text { segment, left } = &last.item else {
            unreachable!("embedded items are always breakable");
        };
        let ich_min = segment.ich_min();
        let style = self
            .source
            .render_run_at(ich_min)
            .map_or(self.style, |run| &run.style)
            .clone();
        let request = BreakRequest {
            source: self.source,
            style: &style,
            ich_min,
            ich_lim: last.ich_lim,
            max_width: last.max_width,
            policy: LineBreakPolicy::Word,
            start_of_line: self.items.is_empty(),
            must_break_inside: true,
        };
        let retry = self.engines.engine(style.ws()).find_break_point(&request);
        match retry.segment {
            Some(segment) if retry.end == SegmentEnd::MoreLines && retry.lim > ich_min => {
                log::trace!("backtracked into segment at {ich_min}, now ending at {}", retry.lim);
                let left = *left;
                self.x = left;
                self.push(LineItem::Text { segment, left }, true, last.ich_lim, last.max_width);
                self.finish_line();
                retry.lim
            }
            _ => {
                self.items.push(last);
                self.finish_line();
                ich
            }
        }
    }

    fn push(&mut self, item: LineItem, breakable: bool, ich_lim: usize, max_width: f64) {
        self.x = item.left() + item.width();
        self.items.push(PendingItem {
            item,
            breakable,
            ich_lim,
            max_width,
        });
    }

    fn finish_line(&mut self) {
        if self.items.is_empty() {
            return;
        }
        let mut items: Vec<LineItem> = self.items.drain(..).map(|pending| pending.item).collect();
        let mut ascent: f64 = 0.0;
        let mut descent: f64 = 0.0;
        for item in &items {
            match item {
                LineItem::Text { segment, .. } => {
                    ascent = ascent.max(segment.ascent());
                    descent = descent.max(segment.descent());
                }
                LineItem::Embedded { height, .. } => ascent = ascent.max(*height),
            }
        }
        if self.line_height > 0.0 {
            ascent = ascent.min(self.line_height);
            descent = self.line_height - ascent;
        }

        let content = self.x;
        let trailing = match items.last() {
            Some(LineItem::Text { segment, .. }) => segment.width() - segment.visible_width(),
            _ => 0.0,
        };
        let rtl = self.style.right_to_left();
        if rtl {
            for item in &mut items {
                let mirrored = content - item.left() - item.width();
                item.set_left(mirrored);
            }
        }
        let available = self.line_width();
        let slack = (available - (content - trailing)).max(0.0);
        let align = match (self.style.text_align(), rtl) {
            (TextAlign::Leading, false) | (TextAlign::Trailing, true) => 0.0,
            (TextAlign::Center, _) => slack / 2.0,
            (TextAlign::Trailing, false) => slack,
            (TextAlign::Leading, true) => (available - content).max(0.0),
        };
        let indent = if self.lines.is_empty() && !rtl {
            self.first_indent
        } else {
            0.0
        };
        let top = self.lines.last().map_or(0.0, ParaLine::bottom);
        let ren_min = items.iter().map(|item| item.ren_range().start).min().unwrap_or(0);
        let ren_lim = items.iter().map(|item| item.ren_range().end).max().unwrap_or(0);
        self.lines.push(ParaLine {
            items,
            top,
            left: indent + align,
            ascent,
            descent,
            ren_min,
            ren_lim,
        });
        self.x = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::FixedWidthEngine;
    use crate::style::StyleCatalog;
    use crate::text::{ClientRun, TextRun};

    fn lines_of(text: &str, width: f64) -> Vec<String> {
        let style = StyleCatalog::new().default_style();
        let source = TextSource::new(vec![ClientRun::Text(TextRun::new(text, &style))]);
        let engine = FixedWidthEngine::default();
        let lines = LineBreaker::new(&source, &style, &engine, width).run(&mut |_, _| (0.0, 0.0));
        lines
            .iter()
            .map(|line| source.fetch(line.ren_min, line.ren_lim).to_string())
            .collect()
    }

    #[test]
    fn breaks_at_spaces() {
        assert_eq!(lines_of("This is the day.", 110.0), ["This is the ", "day."]);
    }

    #[test]
    fn empty_paragraph_has_one_line() {
        assert_eq!(lines_of("", 110.0), [""]);
    }

    #[test]
    fn long_words_fall_back_to_letters() {
        assert_eq!(lines_of("abcdefgh ij", 40.0), ["abcd", "efgh ", "ij"]);
    }

    #[test]
    fn style_change_does_not_allow_a_break() {
        let catalog = StyleCatalog::new();
        let plain = catalog.default_style();
        let bold = plain.with_font_weight(crate::style::WEIGHT_BOLD);
        let source = TextSource::new(vec![
            ClientRun::Text(TextRun::new("aaa bb", &plain)),
            ClientRun::Text(TextRun::new("cc", &bold)),
        ]);
        let engine = FixedWidthEngine::default();
        let lines = LineBreaker::new(&source, &plain, &engine, 60.0).run(&mut |_, _| (0.0, 0.0));
        let texts: Vec<&str> = lines
            .iter()
            .map(|line| source.fetch(line.ren_min, line.ren_lim))
            .collect();
        assert_eq!(texts, ["aaa ", "bbcc"]);
    }
}
