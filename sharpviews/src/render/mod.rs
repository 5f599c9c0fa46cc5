// Copyright 2025 the SharpViews Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The render engine abstraction: measuring text and choosing line breaks.

mod fixed;

use alloc::boxed::Box;

use hashbrown::HashMap;

use crate::style::{AssembledStyles, WsId};
use crate::text::TextSource;

pub use self::fixed::{FixedSegment, FixedWidthEngine};

/// How eagerly a render engine may break text that does not fit.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub enum LineBreakPolicy {
    /// Break only at word boundaries.
    #[default]
    Word,
    /// Break between any two characters.
    Letter,
    /// Like [`Letter`](Self::Letter), but at the start of a line at least one
    /// character is always taken, even if it overflows.
    Clip,
}

/// Why a segment ended.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum SegmentEnd {
    /// The segment reaches the end of the paragraph.
    NoMore,
    /// The line is full; the paragraph continues on the next line.
    MoreLines,
    /// The segment stopped at the requested limit (a change of writing
    /// system or an embedded box), where a line break is not allowed.
    WsBreak,
    /// The segment stopped at the requested limit, where a line break is
    /// allowed.
    OkayBreak,
    /// Nothing fit with the requested policy; no segment was produced.
    NothingFit,
}

/// Parameters of a [`RenderEngine::find_break_point`] call.
#[derive(Debug)]
pub struct BreakRequest<'a> {
    /// The paragraph content.
    pub source: &'a TextSource,
    /// Style of the text being measured.
    pub style: &'a AssembledStyles,
    /// First rendered offset of the segment.
    pub ich_min: usize,
    /// The segment must not extend past this rendered offset.
    pub ich_lim: usize,
    /// Width available on the current line.
    pub max_width: f64,
    /// How the engine may break.
    pub policy: LineBreakPolicy,
    /// Whether the segment would be the first thing on its line.
    pub start_of_line: bool,
    /// When set, the engine must not end the segment at `ich_lim`; it has to
    /// find a break inside the range or report [`SegmentEnd::NothingFit`].
    pub must_break_inside: bool,
}

/// The result of a [`RenderEngine::find_break_point`] call.
#[derive(Debug)]
pub struct BreakResult {
    /// The measured segment, absent for [`SegmentEnd::NothingFit`].
    pub segment: Option<Box<dyn Segment>>,
    /// Rendered offset at which the segment ends.
    pub lim: usize,
    /// Why the segment ended.
    pub end: SegmentEnd,
}

impl BreakResult {
    /// A result reporting that nothing fit.
    pub fn nothing_fit(ich_min: usize) -> Self {
        Self {
            segment: None,
            lim: ich_min,
            end: SegmentEnd::NothingFit,
        }
    }
}

/// Measures text and chooses where lines may break.
pub trait RenderEngine {
    /// Produces the longest segment starting at `request.ich_min` that fits
    /// `request.max_width` under `request.policy`.
    fn find_break_point(&self, request: &BreakRequest<'_>) -> BreakResult;
}

/// A measured piece of one line of a paragraph.
///
/// Offsets are rendered offsets into the paragraph's [`TextSource`];
/// x coordinates are relative to the left edge of the segment.
pub trait Segment: core::fmt::Debug {
    /// First rendered offset covered.
    fn ich_min(&self) -> usize;

    /// Rendered offset just past the segment.
    fn ich_lim(&self) -> usize;

    /// Advance width of the segment.
    fn width(&self) -> f64;

    /// Width of the segment ignoring trailing whitespace.
    fn visible_width(&self) -> f64 {
        self.width()
    }

    /// Distance from the top of the segment to its baseline.
    fn ascent(&self) -> f64;

    /// Distance from the baseline to the bottom of the segment.
    fn descent(&self) -> f64;

    /// Total height of the segment.
    fn height(&self) -> f64 {
        self.ascent() + self.descent()
    }

    /// Whether an insertion point may be placed at `ich`.
    ///
    /// Positions between a base character and a following combining mark
    /// are rejected.
    fn is_valid_ip(&self, ich: usize) -> bool;

    /// The x position of an insertion point at `ich`, or `None` if `ich` is
    /// outside the segment.
    fn position_of_ip(&self, ich: usize, associate_previous: bool) -> Option<f64>;

    /// The insertion point closest to `x`, as `(ich, associate_previous)`.
    fn point_to_char(&self, x: f64) -> (usize, bool);

    /// Horizontal extent of the text in `min..lim` clipped to the segment,
    /// as `(left, right)`, or `None` if the range misses the segment.
    fn range_extent(&self, min: usize, lim: usize) -> Option<(f64, f64)>;
}

/// Supplies the render engine for each writing system.
pub trait RenderEngineFactory {
    /// The engine that measures text in `ws`.
    fn engine(&self, ws: WsId) -> &dyn RenderEngine;
}

impl<E: RenderEngine> RenderEngineFactory for E {
    fn engine(&self, _ws: WsId) -> &dyn RenderEngine {
        self
    }
}

/// A factory choosing engines by writing system, with a fallback.
pub struct WsEngines {
    engines: HashMap<WsId, Box<dyn RenderEngine>>,
    fallback: Box<dyn RenderEngine>,
}

impl core::fmt::Debug for WsEngines {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("WsEngines")
            .field("writing_systems", &self.engines.keys().collect::<alloc::vec::Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl WsEngines {
    /// Creates a factory that uses `fallback` for every writing system.
    pub fn new(fallback: impl RenderEngine + 'static) -> Self {
        Self {
            engines: HashMap::new(),
            fallback: Box::new(fallback),
        }
    }

    /// Uses `engine` for text in `ws`.
    #[must_use]
    pub fn with(mut self, ws: WsId, engine: impl RenderEngine + 'static) -> Self {
        self.engines.insert(ws, Box::new(engine));
        self
    }
}

impl RenderEngineFactory for WsEngines {
    fn engine(&self, ws: WsId) -> &dyn RenderEngine {
        self.engines
            .get(&ws)
            .map_or(&*self.fallback, |engine| &**engine)
    }
}
