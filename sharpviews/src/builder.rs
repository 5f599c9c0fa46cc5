// Copyright 2025 the SharpViews Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Fluent construction of the box tree.
//!
//! Builders add boxes in document order and create the hookups that keep
//! them in sync with bound data.

use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;

use crate::boxes::{BlockData, BoxId, BoxKind, BoxNode, ColumnWidth, GroupData, LazyData, ParaData};
use crate::editing::ParagraphOperations;
use crate::hookup::{
    BoundText, Hookup, HookupId, HookupKind, ListBinding, Notification, SeqSlot, SequenceBinding,
    SequenceHookup,
};
use crate::model::{Observable, ObservableList};
use crate::root::RootBox;
use crate::style::{AssembledStyles, Color, WsId};
use crate::text::{ClientRun, EmbeddedRun, MultiString, OrcInterpreter, RichString, TextRun, TextSource};

/// Adds boxes to a container.
pub struct ViewBuilder<'a> {
    root: &'a mut RootBox,
    container: BoxId,
    /// New boxes go after this one, or first when `None`.
    after: Option<BoxId>,
    parent_hookup: Option<HookupId>,
    style: AssembledStyles,
    added: Vec<BoxId>,
}

impl core::fmt::Debug for ViewBuilder<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ViewBuilder")
            .field("container", &self.container)
            .field("added", &self.added)
            .finish_non_exhaustive()
    }
}

impl<'a> ViewBuilder<'a> {
    pub(crate) fn new(
        root: &'a mut RootBox,
        container: BoxId,
        after: Option<BoxId>,
        parent_hookup: Option<HookupId>,
        style: AssembledStyles,
    ) -> Self {
        Self {
            root,
            container,
            after,
            parent_hookup,
            style,
            added: Vec::new(),
        }
    }

    /// The boxes added directly to the container, in order.
    pub(crate) fn finish(self) -> Vec<BoxId> {
        self.added
    }

    /// The style given to the next boxes.
    pub fn style(&self) -> &AssembledStyles {
        &self.style
    }

    /// Sets the style given to the next boxes.
    pub fn set_style(&mut self, style: AssembledStyles) {
        self.style = style;
    }

    /// The stylesheet of the root being built.
    pub fn stylesheet(&self) -> Option<&crate::style::Stylesheet> {
        self.root.stylesheet.as_ref()
    }

    fn add_box(&mut self, kind: BoxKind, style: AssembledStyles) -> BoxId {
        let id = self.root.tree.insert(BoxNode::new(kind, style));
        self.root.tree.insert_child(self.container, self.after, id);
        self.after = Some(id);
        self.added.push(id);
        id
    }

    fn nested(&mut self, container: BoxId) -> ViewBuilder<'_> {
        ViewBuilder::new(&mut *self.root, container, None, self.parent_hookup, self.style.clone())
    }

    /// Adds a paragraph whose content `build` supplies.
    pub fn add_paragraph(&mut self, build: impl FnOnce(&mut ParaBuilder<'_>)) -> BoxId {
        let mut para = ParaBuilder {
            root: &mut *self.root,
            style: self.style.clone(),
            runs: Vec::new(),
            bound: Vec::new(),
            embedded: Vec::new(),
            interpreter: None,
        };
        build(&mut para);
        let ParaBuilder {
            runs,
            bound,
            embedded,
            interpreter,
            ..
        } = para;

        let run_count = runs.len();
        let data = ParaData {
            source: TextSource::with_interpreter(runs, interpreter),
            lines: Vec::new(),
            run_hookups: vec![None; run_count],
            pending_change: None,
        };
        let id = self.add_box(BoxKind::Para(data), self.style.clone());
        for child in embedded {
            self.root.tree[child].container = Some(id);
        }
        for (run, text, style) in bound {
            let hookup = self.root.hookups.insert(Hookup::new(
                HookupKind::Text {
                    para: id,
                    run,
                    text: text.clone(),
                    style,
                },
                self.parent_hookup,
            ));
            let queue = self.root.queue.clone();
            let subscription = text.subscribe(move |change| {
                queue.borrow_mut().push_back(Notification {
                    hookup,
                    change: change.clone(),
                });
            });
            self.root.hookups[hookup].subscription = Some(subscription);
            if let Some(para) = self.root.tree[id].para_mut() {
                para.run_hookups[run] = Some(hookup);
            }
        }
        id
    }

    /// Adds a vertical pile of boxes.
    pub fn add_div(&mut self, build: impl FnOnce(&mut ViewBuilder<'_>)) -> BoxId {
        let id = self.add_box(BoxKind::Div(GroupData::default()), self.style.clone());
        build(&mut self.nested(id));
        id
    }

    /// Adds a row whose children are tiled left to right in `columns`.
    ///
    /// Children beyond the listed columns get an equal share.
    pub fn add_row(&mut self, columns: &[ColumnWidth], build: impl FnOnce(&mut ViewBuilder<'_>)) -> BoxId {
        let kind = BoxKind::Row {
            group: GroupData::default(),
            columns: columns.to_vec(),
        };
        let id = self.add_box(kind, self.style.clone());
        build(&mut self.nested(id));
        id
    }

    /// Adds a solid block; sizes are in millipoints, a zero width fills the
    /// available width.
    pub fn add_block(&mut self, width: i32, height: i32, color: Color) -> BoxId {
        let kind = BoxKind::Block(BlockData { width, height, color });
        self.add_box(kind, self.style.clone())
    }

    /// Adds a pile showing one group of boxes per item of `list`, built by
    /// `build` and kept up to date as the list changes.
    pub fn add_sequence<T: Clone + 'static>(
        &mut self,
        list: &ObservableList<T>,
        build: impl Fn(&mut ViewBuilder<'_>, &T) + 'static,
    ) -> BoxId {
        self.add_sequence_impl(list, None, None, Rc::new(build))
    }

    /// Like [`add_sequence`](Self::add_sequence), with paragraph operations
    /// that make the items editable as paragraphs.
    pub fn add_editable_sequence<T: Clone + 'static>(
        &mut self,
        list: &ObservableList<T>,
        ops: impl ParagraphOperations<T> + 'static,
        build: impl Fn(&mut ViewBuilder<'_>, &T) + 'static,
    ) -> BoxId {
        self.add_sequence_impl(list, Some(Rc::new(ops)), None, Rc::new(build))
    }

    /// Like [`add_sequence`](Self::add_sequence), but items are only built
    /// when they are about to be painted.
    ///
    /// Until then they are represented by lazy boxes whose height is
    /// estimated from the root's default item height.
    pub fn add_lazy_sequence<T: Clone + 'static>(
        &mut self,
        list: &ObservableList<T>,
        ops: Option<Rc<dyn ParagraphOperations<T>>>,
        build: impl Fn(&mut ViewBuilder<'_>, &T) + 'static,
    ) -> BoxId {
        let item_height = self.root.lazy_item_height;
        self.add_sequence_impl(list, ops, Some(item_height), Rc::new(build))
    }

    fn add_sequence_impl<T: Clone + 'static>(
        &mut self,
        list: &ObservableList<T>,
        ops: Option<Rc<dyn ParagraphOperations<T>>>,
        lazy_item_height: Option<f64>,
        build: Rc<dyn Fn(&mut ViewBuilder<'_>, &T)>,
    ) -> BoxId {
        let container = self.add_box(BoxKind::Div(GroupData::default()), self.style.clone());
        let binding: Rc<dyn SequenceBinding> = Rc::new(ListBinding {
            list: list.clone(),
            build,
            ops,
        });
        let sequence = self.root.hookups.insert(Hookup::new(
            HookupKind::Sequence(SequenceHookup {
                container,
                binding: binding.clone(),
                slots: Vec::new(),
                lazy_item_height,
                style: self.style.clone(),
            }),
            self.parent_hookup,
        ));
        self.root.tree[container].hookup = Some(sequence);
        let queue = self.root.queue.clone();
        let subscription = binding.subscribe(Rc::new(move |change| {
            queue.borrow_mut().push_back(Notification {
                hookup: sequence,
                change: change.clone(),
            });
        }));
        self.root.hookups[sequence].subscription = Some(subscription);

        let count = binding.len();
        let slots = match lazy_item_height {
            Some(_) if count > 0 => vec![self.root.add_lazy(sequence, None, count)],
            Some(_) => Vec::new(),
            None => {
                let mut after = None;
                let mut slots = Vec::with_capacity(count);
                for index in 0..count {
                    let (item, last) = self.root.build_item(sequence, index, after);
                    after = last.or(after);
                    slots.push(SeqSlot::Item(item));
                }
                slots
            }
        };
        if let Some(sequence) = self.root.hookups[sequence].sequence_mut() {
            sequence.slots = slots;
        }
        container
    }
}

/// Adds runs to a paragraph.
pub struct ParaBuilder<'a> {
    root: &'a mut RootBox,
    style: AssembledStyles,
    runs: Vec<ClientRun>,
    /// `(run index, text, style)` of each bound run.
    bound: Vec<(usize, BoundText, AssembledStyles)>,
    embedded: Vec<BoxId>,
    interpreter: Option<OrcInterpreter>,
}

impl core::fmt::Debug for ParaBuilder<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ParaBuilder")
            .field("runs", &self.runs.len())
            .finish_non_exhaustive()
    }
}

impl ParaBuilder<'_> {
    /// The style given to the next runs.
    pub fn style(&self) -> &AssembledStyles {
        &self.style
    }

    /// Sets the style given to the next runs.
    pub fn set_style(&mut self, style: AssembledStyles) -> &mut Self {
        self.style = style;
        self
    }

    /// Adds text that never changes.
    pub fn add_literal(&mut self, text: &str) -> &mut Self {
        self.runs.push(ClientRun::Text(TextRun::new(text, &self.style)));
        self
    }

    fn add_bound(&mut self, text: BoundText) -> &mut Self {
        let run = text.client_run(&self.style, self.root.stylesheet.as_ref());
        self.bound.push((self.runs.len(), text, self.style.clone()));
        self.runs.push(run);
        self
    }

    /// Adds a string that is displayed and edited live.
    pub fn add_string(&mut self, value: &Observable<String>) -> &mut Self {
        self.add_bound(BoundText::Plain(value.clone()))
    }

    /// Adds a rich string; its runs are formatted through the root's
    /// stylesheet.
    pub fn add_rich(&mut self, value: &Observable<RichString>) -> &mut Self {
        self.add_bound(BoundText::Rich(value.clone()))
    }

    /// Adds the `ws` alternative of a multi string.
    pub fn add_multi(&mut self, value: &Observable<MultiString>, ws: WsId) -> &mut Self {
        self.add_bound(BoundText::Multi {
            value: value.clone(),
            ws,
        })
    }

    /// Embeds a pile of boxes in the text, occupying one object replacement
    /// character.
    pub fn add_embedded(&mut self, build: impl FnOnce(&mut ViewBuilder<'_>)) -> &mut Self {
        let style = self.style.clone();
        let id = self
            .root
            .tree
            .insert(BoxNode::new(BoxKind::Div(GroupData::default()), style.clone()));
        build(&mut ViewBuilder::new(&mut *self.root, id, None, None, style.clone()));
        self.push_embedded(id, style)
    }

    /// Embeds a solid block in the text.
    pub fn add_embedded_block(&mut self, width: i32, height: i32, color: Color) -> &mut Self {
        let style = self.style.clone();
        let kind = BoxKind::Block(BlockData { width, height, color });
        let id = self.root.tree.insert(BoxNode::new(kind, style.clone()));
        self.push_embedded(id, style)
    }

    fn push_embedded(&mut self, id: BoxId, style: AssembledStyles) -> &mut Self {
        self.embedded.push(id);
        self.runs.push(ClientRun::Embedded(EmbeddedRun { box_id: id, style }));
        self
    }

    /// Interprets object replacement characters found in the text runs.
    pub fn set_orc_interpreter(&mut self, interpreter: OrcInterpreter) -> &mut Self {
        self.interpreter = Some(interpreter);
        self
    }
}

impl RootBox {
    /// Builds item `index` of `sequence` into its container after `after`.
    ///
    /// Returns the item hookup and the last box it built.
    pub(crate) fn build_item(
        &mut self,
        sequence: HookupId,
        index: usize,
        after: Option<BoxId>,
    ) -> (HookupId, Option<BoxId>) {
        let Some(seq) = self.hookups[sequence].sequence() else {
            unreachable!("items belong to sequences");
        };
        let (binding, container, style) = (seq.binding.clone(), seq.container, seq.style.clone());
        let item = self.hookups.insert(Hookup::new(
            HookupKind::Item {
                first: None,
                last: None,
            },
            Some(sequence),
        ));
        let mut builder = ViewBuilder::new(self, container, after, Some(item), style);
        binding.build_item(&mut builder, index);
        let added = builder.finish();
        for &id in &added {
            self.tree[id].hookup = Some(item);
        }
        let (first, last) = (added.first().copied(), added.last().copied());
        self.hookups[item].kind = HookupKind::Item { first, last };
        (item, last)
    }

    /// Adds a lazy box for `count` items of `sequence` after `after`.
    pub(crate) fn add_lazy(&mut self, sequence: HookupId, after: Option<BoxId>, count: usize) -> SeqSlot {
        let Some(seq) = self.hookups[sequence].sequence() else {
            unreachable!("lazy boxes belong to sequences");
        };
        let container = seq.container;
        let data = LazyData {
            sequence,
            count,
            item_height: seq.lazy_item_height.unwrap_or(self.lazy_item_height),
        };
        let id = self.tree.insert(BoxNode::new(BoxKind::Lazy(data), seq.style.clone()));
        self.tree.insert_child(container, after, id);
        SeqSlot::Lazy { id, count }
    }
}
