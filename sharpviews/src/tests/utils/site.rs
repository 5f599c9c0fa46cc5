// Copyright 2025 the SharpViews Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use std::cell::RefCell;
use std::rc::Rc;

use crate::{DataObject, DragEffect, DragEffects, Rect, Site, Size};

/// Everything a [`RecordingSite`] was told.
#[derive(Debug, Default)]
pub(crate) struct SiteLog {
    pub(crate) invalidated: Vec<Rect>,
    pub(crate) sizes: Vec<Size>,
    pub(crate) lazy_deltas: Vec<f64>,
    /// Data handed to drag and drop, with the allowed effects.
    pub(crate) drags: Vec<(DataObject, DragEffects)>,
    /// What the next drop target does with dragged data.
    pub(crate) drop_effect: DragEffect,
    pub(crate) clipboard: Option<DataObject>,
}

/// A site recording every call into a log shared with the test.
#[derive(Clone, Debug, Default)]
pub(crate) struct RecordingSite(pub(crate) Rc<RefCell<SiteLog>>);

impl Site for RecordingSite {
    fn invalidate_in_root(&mut self, rect: Rect) {
        self.0.borrow_mut().invalidated.push(rect);
    }

    fn root_size_changed(&mut self, size: Size) {
        self.0.borrow_mut().sizes.push(size);
    }

    fn lazy_expanded(&mut self, delta: f64) {
        self.0.borrow_mut().lazy_deltas.push(delta);
    }

    fn do_drag_drop(&mut self, data: &DataObject, allowed: DragEffects) -> DragEffect {
        let mut log = self.0.borrow_mut();
        log.drags.push((data.clone(), allowed));
        log.drop_effect
    }

    fn set_clipboard(&mut self, data: DataObject) {
        self.0.borrow_mut().clipboard = Some(data);
    }

    fn clipboard(&mut self) -> Option<DataObject> {
        self.0.borrow().clipboard.clone()
    }
}
