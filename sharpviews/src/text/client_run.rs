// Copyright 2025 the SharpViews Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use alloc::rc::Rc;
use core::ops::Range;

use smallvec::{smallvec, SmallVec};

use super::{MultiString, RichString, ORC_LEN};
use crate::boxes::BoxId;
use crate::style::{AssembledStyles, Stylesheet, WsId};

/// Resolves an object replacement character found inside a [`TextRun`].
///
/// Receives the run and the byte offset of the character within it, and
/// returns the content the character stands for, or `None` to render the
/// character itself.
pub type OrcInterpreter = Rc<dyn Fn(&TextRun, usize) -> Option<ClientRun>>;

/// A run of text with one or more uniformly formatted segments.
#[derive(Clone, Debug, PartialEq)]
pub struct TextRun {
    text: Rc<str>,
    /// `(end, style)` pairs; the segments cover the text without gaps.
    styles: SmallVec<[(usize, AssembledStyles); 1]>,
}

impl TextRun {
    /// A run of plain text in a single style.
    pub fn new(text: &str, style: &AssembledStyles) -> Self {
        Self {
            text: Rc::from(text),
            styles: smallvec![(text.len(), style.clone())],
        }
    }

    /// A run displaying a rich string, each of its runs formatted by applying
    /// its properties to `base`.
    pub fn from_rich(rich: &RichString, base: &AssembledStyles, stylesheet: Option<&Stylesheet>) -> Self {
        let mut styles: SmallVec<[(usize, AssembledStyles); 1]> = SmallVec::new();
        for (range, props) in rich.runs() {
            let style = base.apply_text_props(props, stylesheet);
            match styles.last_mut() {
                Some((end, last)) if AssembledStyles::ptr_eq(last, &style) => *end = range.end,
                _ => styles.push((range.end, style)),
            }
        }
        if styles.is_empty() {
            styles.push((0, base.clone()));
        }
        Self {
            text: Rc::from(rich.text()),
            styles,
        }
    }

    /// A run displaying the `ws` alternative of a multi string.
    pub fn from_multi(multi: &MultiString, ws: WsId, base: &AssembledStyles) -> Self {
        Self::new(multi.get(ws), &base.with_ws(ws))
    }

    /// The text of the run.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Length of the text in bytes.
    pub fn len(&self) -> usize {
        self.text.len()
    }

    /// Returns true if the run has no text.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Iterates over the uniformly formatted segments as `(range, style)`.
    pub fn segments(&self) -> impl Iterator<Item = (Range<usize>, &AssembledStyles)> + '_ {
        let mut start = 0;
        self.styles.iter().map(move |(end, style)| {
            let range = start..*end;
            start = *end;
            (range, style)
        })
    }

    /// The style of the first segment.
    pub fn first_style(&self) -> &AssembledStyles {
        &self.styles[0].1
    }

    /// The style at `offset`, choosing the earlier segment at a boundary when
    /// `associate_previous` is set.
    pub fn style_at(&self, offset: usize, associate_previous: bool) -> &AssembledStyles {
        let mut chosen = self.first_style();
        for (range, style) in self.segments() {
            chosen = style;
            if offset < range.end || (associate_previous && offset == range.end) {
                break;
            }
        }
        chosen
    }
}

/// An embedded box occupying one object replacement character.
#[derive(Clone, Debug, PartialEq)]
pub struct EmbeddedRun {
    /// The embedded box.
    pub box_id: BoxId,
    /// Style of the placeholder character.
    pub style: AssembledStyles,
}

/// A unit of paragraph content contributed by the owning application.
#[derive(Clone, Debug, PartialEq)]
pub enum ClientRun {
    /// Literal, bound, rich or multilingual text.
    Text(TextRun),
    /// An embedded box.
    Embedded(EmbeddedRun),
}

impl ClientRun {
    /// Length of the run in logical text, in bytes.
    pub fn logical_len(&self) -> usize {
        match self {
            Self::Text(run) => run.len(),
            Self::Embedded(_) => ORC_LEN,
        }
    }

    /// Style of the start of the run.
    pub fn style(&self) -> &AssembledStyles {
        match self {
            Self::Text(run) => run.first_style(),
            Self::Embedded(run) => &run.style,
        }
    }
}

impl From<TextRun> for ClientRun {
    fn from(run: TextRun) -> Self {
        Self::Text(run)
    }
}
