// Copyright 2025 the SharpViews Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::vec::Vec;
use core::ops::Range;

use crate::style::{TextProps, WsId};

#[derive(Clone, Debug, PartialEq, Eq)]
struct RichRun {
    end: usize,
    props: TextProps,
}

/// A string whose runs carry formatting.
///
/// Runs cover the whole text without gaps; an empty string still has one
/// (empty) run so that its formatting is known.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RichString {
    text: String,
    runs: Vec<RichRun>,
}

impl Default for RichString {
    fn default() -> Self {
        Self::new("", TextProps::default())
    }
}

impl RichString {
    /// Creates a string with a single run.
    pub fn new(text: &str, props: TextProps) -> Self {
        Self {
            text: text.into(),
            runs: vec![RichRun {
                end: text.len(),
                props,
            }],
        }
    }

    /// Appends a run.
    #[must_use]
    pub fn push(mut self, text: &str, props: TextProps) -> Self {
        if text.is_empty() && !self.runs.is_empty() {
            return self;
        }
        if self.text.is_empty() && self.runs.len() == 1 {
            self.runs.clear();
        }
        self.text.push_str(text);
        if let Some(last) = self.runs.last_mut() {
            if last.props == props {
                last.end = self.text.len();
                return self;
            }
        }
        self.runs.push(RichRun {
            end: self.text.len(),
            props,
        });
        self
    }

    /// The plain text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Length of the text in bytes.
    pub fn len(&self) -> usize {
        self.text.len()
    }

    /// Returns true if the text is empty.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Iterates over the runs as `(range, props)`.
    pub fn runs(&self) -> impl Iterator<Item = (Range<usize>, &TextProps)> + '_ {
        let mut start = 0;
        self.runs.iter().map(move |run| {
            let range = start..run.end;
            start = run.end;
            (range, &run.props)
        })
    }

    /// Returns the formatting at `offset`.
    ///
    /// At a run boundary `associate_previous` picks the run before the
    /// boundary rather than the one after it.
    pub fn props_at(&self, offset: usize, associate_previous: bool) -> &TextProps {
        let mut chosen = &self.runs[0].props;
        for (range, props) in self.runs() {
            chosen = props;
            if offset < range.end || (associate_previous && offset == range.end) {
                break;
            }
        }
        chosen
    }

    /// Returns a copy with `range` replaced by `text` formatted with `props`.
    #[must_use]
    pub fn replace(&self, range: Range<usize>, text: &str, props: &TextProps) -> Self {
        let mut out = Self {
            text: String::new(),
            runs: Vec::new(),
        };
        let mut inserted = false;
        for (run_range, run_props) in self.runs() {
            let before = run_range.start.min(range.start)..run_range.end.min(range.start);
            if !before.is_empty() {
                out = out.push(&self.text[before], run_props.clone());
            }
            if !inserted && run_range.end >= range.start {
                out = out.push(text, props.clone());
                inserted = true;
            }
            let after = run_range.start.max(range.end)..run_range.end.max(range.end);
            if !after.is_empty() {
                out = out.push(&self.text[after], run_props.clone());
            }
        }
        if !inserted {
            out = out.push(text, props.clone());
        }
        if out.runs.is_empty() {
            out.runs.push(RichRun {
                end: 0,
                props: props.clone(),
            });
        }
        out
    }
}

/// A string with one alternative per writing system.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MultiString {
    alternatives: BTreeMap<WsId, String>,
}

impl MultiString {
    /// Creates a string with no alternatives.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the alternative for `ws`.
    #[must_use]
    pub fn with(mut self, ws: WsId, text: &str) -> Self {
        self.set(ws, text);
        self
    }

    /// Sets the alternative for `ws`.
    pub fn set(&mut self, ws: WsId, text: &str) {
        self.alternatives.insert(ws, text.into());
    }

    /// Returns the alternative for `ws`, or the empty string.
    pub fn get(&self, ws: WsId) -> &str {
        self.alternatives.get(&ws).map_or("", String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_merges_equal_props() {
        let s = RichString::new("ab", TextProps::ws(WsId(1))).push("cd", TextProps::ws(WsId(1)));
        assert_eq!(s.runs().count(), 1);
        let s = s.push("ef", TextProps::ws(WsId(2)));
        let runs: Vec<_> = s.runs().map(|(r, _)| r).collect();
        assert_eq!(runs, vec![0..4, 4..6]);
    }

    #[test]
    fn replace_inside_and_across_runs() {
        let s = RichString::new("abc", TextProps::ws(WsId(1))).push("def", TextProps::ws(WsId(2)));
        let r = s.replace(2..4, "X", &TextProps::ws(WsId(1)));
        assert_eq!(r.text(), "abXef");
        let runs: Vec<_> = r.runs().map(|(r, p)| (r, p.ws)).collect();
        assert_eq!(runs, vec![(0..3, Some(WsId(1))), (3..5, Some(WsId(2)))]);
    }

    #[test]
    fn props_at_boundary_respects_association() {
        let s = RichString::new("ab", TextProps::ws(WsId(1))).push("cd", TextProps::ws(WsId(2)));
        assert_eq!(s.props_at(2, true).ws, Some(WsId(1)));
        assert_eq!(s.props_at(2, false).ws, Some(WsId(2)));
    }
}
