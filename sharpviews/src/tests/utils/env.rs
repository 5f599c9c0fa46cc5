// Copyright 2025 the SharpViews Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use std::cell::{RefCell, RefMut};
use std::rc::Rc;

use super::{RecordingSite, SiteLog};
use crate::model::{Observable, ObservableList};
use crate::render::{FixedWidthEngine, RenderEngineFactory};
use crate::{BoxId, InsertionPoint, RootBox, RootOptions, Selection, StringListOps};

// Note: This module is only compiled when running tests, which requires std.

/// An observable list of observable strings.
pub(crate) fn strings(items: &[&str]) -> ObservableList<Observable<String>> {
    ObservableList::new(items.iter().map(|s| Observable::new(String::from(*s))).collect())
}

/// A root measured with the default [`FixedWidthEngine`] (10 pixels per
/// character, 16 pixel lines) and displayed in a [`RecordingSite`].
pub(crate) struct TestEnv {
    pub(crate) root: RootBox,
    log: Rc<RefCell<SiteLog>>,
}

impl TestEnv {
    pub(crate) fn new() -> Self {
        Self::with_options(RootOptions::default())
    }

    pub(crate) fn with_options(options: RootOptions) -> Self {
        Self::with_engine(options, FixedWidthEngine::default())
    }

    pub(crate) fn with_engine(options: RootOptions, engines: impl RenderEngineFactory + 'static) -> Self {
        let site = RecordingSite::default();
        let log = site.0.clone();
        Self {
            root: RootBox::new(options, engines, site),
            log,
        }
    }

    /// A root showing one editable paragraph per item of `list`, laid out
    /// at `width`.
    pub(crate) fn editable(list: &ObservableList<Observable<String>>, width: f64) -> Self {
        let mut env = Self::new();
        env.root.build(|view| {
            view.add_editable_sequence(list, StringListOps, |view, item: &Observable<String>| {
                view.add_paragraph(|para| {
                    para.add_string(item);
                });
            });
        });
        env.root.layout(width);
        env
    }

    pub(crate) fn log(&self) -> RefMut<'_, SiteLog> {
        self.log.borrow_mut()
    }

    /// Paragraph `index` in document order.
    #[track_caller]
    pub(crate) fn para(&self, index: usize) -> BoxId {
        let paras = self.root.paragraphs();
        let Some(&para) = paras.get(index) else {
            panic!("there is no paragraph {index}, only {}", paras.len());
        };
        para
    }

    pub(crate) fn texts(&self) -> Vec<String> {
        self.root
            .paragraphs()
            .into_iter()
            .map(|para| self.root.para_text(para).unwrap())
            .collect()
    }

    pub(crate) fn ip(&self, para: usize, offset: usize, associate_previous: bool) -> InsertionPoint {
        InsertionPoint::new(self.para(para), offset, associate_previous)
    }

    /// Offset of the first character of `needle` in paragraph `para`.
    #[track_caller]
    pub(crate) fn offset_of(&self, para: usize, needle: &str) -> usize {
        let text = self.root.para_text(self.para(para)).unwrap();
        let Some(offset) = text.find(needle) else {
            panic!("'{needle}' not found in paragraph {para} '{text}'");
        };
        offset
    }

    #[track_caller]
    pub(crate) fn assert_caret(&self, para: usize, offset: usize) {
        let expected = self.para(para);
        match self.root.selection() {
            Some(Selection::Ip(ip)) => {
                assert_eq!(
                    (ip.para(), ip.offset()),
                    (expected, offset),
                    "caret is at offset {} of {:?}, texts {:?}",
                    ip.offset(),
                    ip.para(),
                    self.texts()
                );
            }
            other => panic!("expected a caret at {offset} of paragraph {para}, got {other:?}"),
        }
    }
}
