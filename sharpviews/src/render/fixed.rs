// Copyright 2025 the SharpViews Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A render engine giving every character the same advance.
//!
//! Combining marks have no advance. This makes layout fully predictable,
//! which is what tests and simple character-cell hosts want.

use alloc::boxed::Box;
use alloc::string::String;
use alloc::vec::Vec;

use super::{BreakRequest, BreakResult, LineBreakPolicy, RenderEngine, Segment, SegmentEnd};
use crate::text::chars::{is_diacritic, is_ip_boundary};

const EPSILON: f64 = 1e-6;

/// A render engine where each character has a fixed advance.
#[derive(Clone, Debug)]
pub struct FixedWidthEngine {
    char_width: f64,
    ascent: f64,
    descent: f64,
}

impl Default for FixedWidthEngine {
    fn default() -> Self {
        Self::new(10.0, 12.0, 4.0)
    }
}

impl FixedWidthEngine {
    /// Creates an engine with the given advance and vertical metrics.
    pub fn new(char_width: f64, ascent: f64, descent: f64) -> Self {
        Self {
            char_width,
            ascent,
            descent,
        }
    }

    /// The advance of one character.
    pub fn char_width(&self) -> f64 {
        self.char_width
    }

    /// The height of one line of text.
    pub fn line_height(&self) -> f64 {
        self.ascent + self.descent
    }

    fn advance(&self, ch: char) -> f64 {
        if is_diacritic(ch) {
            0.0
        } else {
            self.char_width
        }
    }

    fn make_segment(&self, text: &str, ich_min: usize, rtl: bool) -> FixedSegment {
        let advances = text
            .char_indices()
            .map(|(i, ch)| (i, self.advance(ch)))
            .collect::<Vec<_>>();
        let width = advances.iter().map(|(_, w)| w).sum();
        let trailing = text
            .chars()
            .rev()
            .take_while(|ch| ch.is_whitespace())
            .map(|ch| self.advance(ch))
            .sum::<f64>();
        FixedSegment {
            ich_min,
            text: text.into(),
            advances,
            width,
            visible_width: width - trailing,
            ascent: self.ascent,
            descent: self.descent,
            rtl,
        }
    }

    fn visible_width_of(&self, text: &str) -> f64 {
        text.trim_end_matches(char::is_whitespace)
            .chars()
            .map(|ch| self.advance(ch))
            .sum()
    }

    fn is_break_opportunity(text: &str, offset: usize, policy: LineBreakPolicy) -> bool {
        if offset == 0 || offset >= text.len() || !is_ip_boundary(text, offset) {
            return false;
        }
        match policy {
            LineBreakPolicy::Word => {
                let before = text[..offset].chars().next_back();
                let after = text[offset..].chars().next();
                before.is_some_and(char::is_whitespace) && !after.is_some_and(char::is_whitespace)
            }
            LineBreakPolicy::Letter | LineBreakPolicy::Clip => true,
        }
    }
}

impl RenderEngine for FixedWidthEngine {
    fn find_break_point(&self, request: &BreakRequest<'_>) -> BreakResult {
        let source = request.source;
        let text = source.fetch(request.ich_min, request.ich_lim);
        let lim = request.ich_min + text.len();
        let rtl = request.style.right_to_left();
        let ends_paragraph = lim >= source.len();

        if text.is_empty() {
            return BreakResult {
                segment: Some(Box::new(self.make_segment("", request.ich_min, rtl))),
                lim,
                end: if ends_paragraph {
                    SegmentEnd::NoMore
                } else {
                    SegmentEnd::WsBreak
                },
            };
        }

        if !request.must_break_inside && self.visible_width_of(text) <= request.max_width + EPSILON {
            let end = if ends_paragraph {
                SegmentEnd::NoMore
            } else if text.ends_with(char::is_whitespace) {
                SegmentEnd::OkayBreak
            } else {
                SegmentEnd::WsBreak
            };
            log::trace!("whole range {}..{lim} fits: {end:?}", request.ich_min);
            return BreakResult {
                segment: Some(Box::new(self.make_segment(text, request.ich_min, rtl))),
                lim,
                end,
            };
        }

        let best = text
            .char_indices()
            .map(|(i, _)| i)
            .skip(1)
            .filter(|&i| Self::is_break_opportunity(text, i, request.policy))
            .filter(|&i| self.visible_width_of(&text[..i]) <= request.max_width + EPSILON)
            .last();

        let split = match best {
            Some(split) => split,
            None if request.policy == LineBreakPolicy::Clip && request.start_of_line => {
                // Take one whole character (with its diacritics) whatever its width.
                let mut split = text.len();
                for (i, _) in text.char_indices().skip(1) {
                    if is_ip_boundary(text, i) {
                        split = i;
                        break;
                    }
                }
                log::warn!(
                    "clipping: forcing one character at {} into width {}",
                    request.ich_min,
                    request.max_width
                );
                split
            }
            None => return BreakResult::nothing_fit(request.ich_min),
        };

        let end = if split == text.len() && ends_paragraph {
            SegmentEnd::NoMore
        } else {
            SegmentEnd::MoreLines
        };
        BreakResult {
            segment: Some(Box::new(self.make_segment(&text[..split], request.ich_min, rtl))),
            lim: request.ich_min + split,
            end,
        }
    }
}

/// A segment produced by [`FixedWidthEngine`].
#[derive(Clone, Debug)]
pub struct FixedSegment {
    ich_min: usize,
    text: String,
    /// `(offset within text, advance)` for each character.
    advances: Vec<(usize, f64)>,
    width: f64,
    visible_width: f64,
    ascent: f64,
    descent: f64,
    rtl: bool,
}

impl FixedSegment {
    /// The rendered text of the segment.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Logical-order distance from the start edge to `rel`.
    fn leading_x(&self, rel: usize) -> f64 {
        self.advances
            .iter()
            .take_while(|(i, _)| *i < rel)
            .map(|(_, w)| w)
            .sum()
    }

    fn to_visual(&self, x: f64) -> f64 {
        if self.rtl {
            self.width - x
        } else {
            x
        }
    }
}

impl Segment for FixedSegment {
    fn ich_min(&self) -> usize {
        self.ich_min
    }

    fn ich_lim(&self) -> usize {
        self.ich_min + self.text.len()
    }

    fn width(&self) -> f64 {
        self.width
    }

    fn visible_width(&self) -> f64 {
        self.visible_width
    }

    fn ascent(&self) -> f64 {
        self.ascent
    }

    fn descent(&self) -> f64 {
        self.descent
    }

    fn is_valid_ip(&self, ich: usize) -> bool {
        ich >= self.ich_min
            && ich <= self.ich_lim()
            && is_ip_boundary(&self.text, ich - self.ich_min)
    }

    fn position_of_ip(&self, ich: usize, _associate_previous: bool) -> Option<f64> {
        if ich < self.ich_min || ich > self.ich_lim() {
            return None;
        }
        Some(self.to_visual(self.leading_x(ich - self.ich_min)))
    }

    fn point_to_char(&self, x: f64) -> (usize, bool) {
        let target = self.to_visual(x);
        let mut start = 0.0;
        for &(rel, advance) in &self.advances {
            if advance > 0.0 && target < start + advance / 2.0 {
                let mut rel = rel;
                while !is_ip_boundary(&self.text, rel) {
                    rel -= 1;
                }
                return (self.ich_min + rel, false);
            }
            if advance > 0.0 && target < start + advance {
                let mut next = rel + 1;
                while !is_ip_boundary(&self.text, next) {
                    next += 1;
                }
                return (self.ich_min + next, true);
            }
            start += advance;
        }
        (self.ich_lim(), true)
    }

    fn range_extent(&self, min: usize, lim: usize) -> Option<(f64, f64)> {
        let min = min.max(self.ich_min);
        let lim = lim.min(self.ich_lim());
        if min > lim || (min == lim && !self.text.is_empty()) {
            return None;
        }
        let a = self.to_visual(self.leading_x(min - self.ich_min));
        let b = self.to_visual(self.leading_x(lim - self.ich_min));
        Some((a.min(b), a.max(b)))
    }
}
