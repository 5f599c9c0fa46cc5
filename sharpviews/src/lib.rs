// Copyright 2025 the SharpViews Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Box-tree rich text views: layout, selection and editing.
//!
//! A view is a tree of boxes owned by a [`RootBox`]. Containers stack their
//! children vertically ([`BoxType::Div`]) or side by side in columns
//! ([`BoxType::Row`]); paragraphs lay out styled text, wrapped to the
//! available width, and may embed other boxes inline. Views are built with a
//! [`ViewBuilder`] from [`Observable`] values and [`ObservableList`]s; when
//! the data changes, only the affected boxes are rebuilt and laid out again,
//! and the areas that need repainting are reported to the [`Site`].
//!
//! Long sequences can be displayed lazily: items stand in as estimated
//! placeholder boxes until [`RootBox::prepare_to_paint`] brings them into
//! view.
//!
//! ```
//! use sharpviews::model::Observable;
//! use sharpviews::render::FixedWidthEngine;
//! use sharpviews::{NullSite, RootBox, RootOptions};
//!
//! let text = Observable::new(String::from("This is the day."));
//! let mut root = RootBox::new(RootOptions::default(), FixedWidthEngine::default(), NullSite);
//! root.build(|view| {
//!     view.add_paragraph(|para| {
//!         para.add_string(&text);
//!     });
//! });
//! root.layout(110.0);
//! let para = root.paragraphs()[0];
//! assert_eq!(root.lines(para).unwrap().len(), 2);
//! ```

extern crate alloc;

mod boxes;
mod builder;
mod editing;
mod error;
mod hookup;
mod layout;
mod root;
mod selection;

pub mod model;
pub mod render;
pub mod style;
pub mod text;

#[cfg(test)]
mod tests;

pub use peniko::kurbo::{Point, Rect, Size};

pub use boxes::{BoxId, BoxType, ColumnWidth};
pub use builder::{ParaBuilder, ViewBuilder};
pub use editing::{
    export_rtf, DataObject, DragEffect, DragEffects, MakeSelection, ParagraphOperations,
    StringListOps,
};
pub use error::{Error, ErrorKind, Result};
pub use layout::{mp_to_pixels, FixMap, LayoutCallbacks, LayoutInfo};
pub use model::{Change, Observable, ObservableList, Subscription};
pub use root::{LineInfo, NullSite, RootBox, RootOptions, Site};
pub use selection::{InsertionPoint, NavKey, RangeSelection, Selection};
