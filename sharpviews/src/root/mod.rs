// Copyright 2025 the SharpViews Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The root of a box tree and its connection to the host window.

mod lazy;
mod notify;

use alloc::boxed::Box;
use alloc::collections::VecDeque;
use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;
use core::cell::RefCell;
use core::ops::Range;

use peniko::kurbo::{Rect, Size};

use crate::boxes::{BoxId, BoxKind, BoxNode, BoxTree, BoxType, GroupData};
use crate::builder::ViewBuilder;
use crate::editing::{DataObject, DragEffect, DragEffects};
use crate::hookup::{HookupId, HookupKind, Hookups, NotificationQueue};
use crate::layout::{FixMap, LayoutCallbacks, LayoutInfo};
use crate::render::RenderEngineFactory;
use crate::selection::Selection;
use crate::style::{AssembledStyles, Color, StyleCatalog, Stylesheet};
use crate::{Error, Result};

/// Settings of a [`RootBox`].
#[derive(Clone, Debug)]
pub struct RootOptions {
    /// Horizontal resolution of the display, in dots per inch.
    pub dpi_x: f64,
    /// Vertical resolution of the display, in dots per inch.
    pub dpi_y: f64,
    /// Height assumed for list items that have not been built yet, in pixels.
    pub default_lazy_item_height: f64,
    /// Style of the root box, inherited by everything added to it.
    pub style: AssembledStyles,
    /// Named styles used by rich strings.
    pub stylesheet: Option<Stylesheet>,
}

impl Default for RootOptions {
    fn default() -> Self {
        Self {
            dpi_x: 96.0,
            dpi_y: 96.0,
            default_lazy_item_height: 20.0,
            style: StyleCatalog::shared().default_style(),
            stylesheet: None,
        }
    }
}

/// The host window a [`RootBox`] is displayed in.
///
/// Only invalidation is required; the other methods have do-nothing
/// defaults.
pub trait Site {
    /// Marks `rect`, in root coordinates, as needing repaint.
    fn invalidate_in_root(&mut self, rect: Rect);

    /// The root box changed size after a relayout.
    fn root_size_changed(&mut self, _size: Size) {}

    /// Lazy items were built; the document height changed by `delta` pixels
    /// relative to the estimate.
    fn lazy_expanded(&mut self, _delta: f64) {}

    /// Runs a drag and drop operation and reports what the drop target did.
    fn do_drag_drop(&mut self, _data: &DataObject, _allowed: DragEffects) -> DragEffect {
        DragEffect::None
    }

    /// Puts `data` on the clipboard.
    fn set_clipboard(&mut self, _data: DataObject) {}

    /// The current content of the clipboard.
    fn clipboard(&mut self) -> Option<DataObject> {
        None
    }
}

/// A site that ignores everything.
#[derive(Copy, Clone, Debug, Default)]
pub struct NullSite;

impl Site for NullSite {
    fn invalidate_in_root(&mut self, _rect: Rect) {}
}

struct SiteCallbacks<'a>(&'a mut dyn Site);

impl LayoutCallbacks for SiteCallbacks<'_> {
    fn invalidate_in_root(&mut self, rect: Rect) {
        self.0.invalidate_in_root(rect);
    }
}

/// The measuring services shared by every layout of one root.
pub(crate) struct LayoutEnv {
    engines: Box<dyn RenderEngineFactory>,
    dpi_x: f64,
    dpi_y: f64,
    /// The width of the last full layout.
    width: Option<f64>,
}

impl LayoutEnv {
    pub(crate) fn info(&self, available_width: f64) -> LayoutInfo<'_> {
        LayoutInfo {
            available_width,
            dpi_x: self.dpi_x,
            dpi_y: self.dpi_y,
            engines: &*self.engines,
        }
    }
}

/// One line of a laid out paragraph.
#[derive(Clone, Debug, PartialEq)]
pub struct LineInfo {
    /// The logical text shown on the line.
    pub text_range: Range<usize>,
    /// The line's rectangle in root coordinates.
    pub rect: Rect,
}

type Deferred = Box<dyn FnOnce(&mut RootBox)>;

/// The root of a box tree.
///
/// Owns the boxes, the hookups keeping them in sync with their data, and the
/// current selection.
pub struct RootBox {
    pub(crate) tree: BoxTree,
    pub(crate) hookups: Hookups,
    pub(crate) root: BoxId,
    pub(crate) style: AssembledStyles,
    pub(crate) stylesheet: Option<Stylesheet>,
    pub(crate) env: LayoutEnv,
    pub(crate) site: Box<dyn Site>,
    pub(crate) selection: Option<Selection>,
    /// Changes waiting to be applied to the tree.
    pub(crate) queue: NotificationQueue,
    /// Work to run once the queue is empty.
    deferred: VecDeque<Deferred>,
    /// The x position Up and Down aim for, kept across vertical moves.
    pub(crate) up_down_x: Option<f64>,
    pub(crate) lazy_item_height: f64,
}

impl core::fmt::Debug for RootBox {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RootBox")
            .field("root", &self.root)
            .field("hookups", &self.hookups)
            .field("selection", &self.selection)
            .field("width", &self.env.width)
            .finish_non_exhaustive()
    }
}

impl RootBox {
    /// Creates an empty root measuring text with `engines` and displayed in
    /// `site`.
    pub fn new(
        options: RootOptions,
        engines: impl RenderEngineFactory + 'static,
        site: impl Site + 'static,
    ) -> Self {
        let mut tree = BoxTree::default();
        let root = tree.insert(BoxNode::new(
            BoxKind::Div(GroupData::default()),
            options.style.clone(),
        ));
        Self {
            tree,
            hookups: Hookups::default(),
            root,
            style: options.style,
            stylesheet: options.stylesheet,
            env: LayoutEnv {
                engines: Box::new(engines),
                dpi_x: options.dpi_x,
                dpi_y: options.dpi_y,
                width: None,
            },
            site: Box::new(site),
            selection: None,
            queue: Rc::new(RefCell::new(VecDeque::new())),
            deferred: VecDeque::new(),
            up_down_x: None,
            lazy_item_height: options.default_lazy_item_height,
        }
    }

    /// Adds boxes at the end of the root.
    ///
    /// If the root has been laid out, the new boxes are laid out and
    /// invalidated.
    pub fn build(&mut self, build: impl FnOnce(&mut ViewBuilder<'_>)) {
        let root = self.root;
        let after = self.tree[root].kind.group().and_then(|group| group.last);
        let style = self.style.clone();
        let mut builder = ViewBuilder::new(self, root, after, None, style);
        build(&mut builder);
        let added = builder.finish();
        log::debug!("built {} top level boxes", added.len());
        self.relayout_changed(&[root]);
    }

    /// Lays out the whole tree for `width` pixels.
    pub fn layout(&mut self, width: f64) {
        let old = self.size();
        let info = self.env.info(width);
        self.tree.layout(self.root, &info);
        self.env.width = Some(width);
        let new = self.size();
        if new != old {
            self.site.root_size_changed(new);
        }
    }

    /// Returns true once [`layout`](Self::layout) has run.
    pub fn is_laid_out(&self) -> bool {
        self.env.width.is_some()
    }

    /// Size of the laid out tree; zero before layout.
    pub fn size(&self) -> Size {
        let node = &self.tree[self.root];
        Size::new(node.width, node.height)
    }

    /// The outermost box.
    pub fn root_box(&self) -> BoxId {
        self.root
    }

    /// The style of the root box.
    pub fn style(&self) -> &AssembledStyles {
        &self.style
    }

    /// The stylesheet rich strings are formatted with.
    pub fn stylesheet(&self) -> Option<&Stylesheet> {
        self.stylesheet.as_ref()
    }

    pub(crate) fn node(&self, id: BoxId) -> Result<&BoxNode> {
        self.tree.get(id).ok_or(Error::stale_box(id))
    }

    /// The kind of box `id`.
    pub fn box_type(&self, id: BoxId) -> Result<BoxType> {
        Ok(self.node(id)?.kind.box_type())
    }

    /// The rectangle of box `id` in root coordinates.
    pub fn box_rect(&self, id: BoxId) -> Result<Rect> {
        if !self.node(id)?.laid_out {
            return Err(Error::not_laid_out(id));
        }
        Ok(self.tree.rect_in_root(id))
    }

    /// The box directly containing `id`; `None` for the root.
    pub fn container(&self, id: BoxId) -> Result<Option<BoxId>> {
        Ok(self.node(id)?.container)
    }

    /// The children of container `id`, or the boxes embedded in paragraph
    /// `id`.
    pub fn children(&self, id: BoxId) -> Result<Vec<BoxId>> {
        let node = self.node(id)?;
        Ok(match node.kind {
            BoxKind::Para(_) => self.tree.embedded(id),
            _ => self.tree.children(id).collect(),
        })
    }

    /// Every paragraph in document order, not counting paragraphs embedded
    /// in other paragraphs.
    pub fn paragraphs(&self) -> Vec<BoxId> {
        self.tree.paragraphs(self.root)
    }

    /// The logical text of paragraph `id`.
    pub fn para_text(&self, id: BoxId) -> Result<String> {
        Ok(self.para_node(id)?.source.logical_text().into())
    }

    pub(crate) fn para_node(&self, id: BoxId) -> Result<&crate::boxes::ParaData> {
        self.node(id)?
            .para()
            .ok_or(Error::invalid_selection("box is not a paragraph"))
    }

    /// The lines of paragraph `id`.
    pub fn lines(&self, id: BoxId) -> Result<Vec<LineInfo>> {
        let para = self.para_node(id)?;
        if !self.tree[id].laid_out {
            return Err(Error::not_laid_out(id));
        }
        let origin = self.tree.origin_in_root(id);
        let width = self.tree[id].width;
        Ok(para
            .lines
            .iter()
            .map(|line| LineInfo {
                text_range: para.source.ren_to_log(line.ren_min)..para.source.ren_to_log(line.ren_lim),
                rect: Rect::new(origin.x, origin.y + line.top, origin.x + width, origin.y + line.bottom()),
            })
            .collect())
    }

    /// The number of items lazy box `id` stands for.
    pub fn lazy_item_count(&self, id: BoxId) -> Result<usize> {
        match &self.node(id)?.kind {
            BoxKind::Lazy(lazy) => Ok(lazy.count),
            _ => Err(Error::unsupported("box is not a lazy box")),
        }
    }

    /// The color of block `id`.
    pub fn block_color(&self, id: BoxId) -> Result<Color> {
        match &self.node(id)?.kind {
            BoxKind::Block(block) => Ok(block.color),
            _ => Err(Error::unsupported("box is not a block")),
        }
    }

    /// Number of live hookups, for diagnostics.
    pub fn hookup_count(&self) -> usize {
        self.hookups.live()
    }

    /// Runs `task` once pending change notifications have been applied.
    ///
    /// Tasks run in the order they were added, at the end of the next
    /// [`process_notifications`](Self::process_notifications).
    pub fn perform_after_notifications(&mut self, task: impl FnOnce(&mut Self) + 'static) {
        self.deferred.push_back(Box::new(task));
    }

    pub(crate) fn pop_deferred(&mut self) -> Option<Deferred> {
        self.deferred.pop_front()
    }

    pub(crate) fn invalidate(&mut self, rect: Rect) {
        self.site.invalidate_in_root(rect);
    }

    /// The old root rectangles of `changed` and all of their containers.
    fn fixmap_for(&self, changed: &[BoxId]) -> FixMap {
        let mut fixmap = FixMap::new();
        for &id in changed {
            if !self.tree.contains(id) {
                continue;
            }
            for current in core::iter::once(id).chain(self.tree.ancestors(id)) {
                if self.tree[current].laid_out && !fixmap.contains_key(&current) {
                    fixmap.insert(current, self.tree.rect_in_root(current));
                }
            }
        }
        fixmap
    }

    /// Relayouts after the content of `changed` changed, invalidating
    /// whatever moved on screen.
    ///
    /// Does nothing before the first full layout.
    pub(crate) fn relayout_changed(&mut self, changed: &[BoxId]) {
        let Some(width) = self.env.width else {
            return;
        };
        let fixmap = self.fixmap_for(changed);
        let old = self.size();
        let info = self.env.info(width);
        let mut callbacks = SiteCallbacks(&mut *self.site);
        self.tree.relayout(self.root, &info, &fixmap, &mut callbacks);
        let new = self.size();
        if new != old {
            self.site.root_size_changed(new);
        }
    }

    /// The item hookup that built `id` or one of its containers, with its
    /// sequence and its index there.
    pub(crate) fn item_of_box(&self, id: BoxId) -> Option<(HookupId, HookupId, usize)> {
        let hookup = core::iter::once(id)
            .chain(self.tree.ancestors(id))
            .find_map(|current| self.tree[current].hookup)?;
        let (item, sequence) = self.hookups.enclosing_item(hookup)?;
        let index = self.hookups[sequence].sequence()?.index_of(item)?;
        Some((item, sequence, index))
    }

    /// The boxes built for item hookup `item`, in order.
    pub(crate) fn item_boxes(&self, item: HookupId) -> Vec<BoxId> {
        let HookupKind::Item {
            first: Some(first),
            last: Some(last),
        } = self.hookups[item].kind
        else {
            return Vec::new();
        };
        let mut boxes = Vec::new();
        let mut current = Some(first);
        while let Some(id) = current {
            boxes.push(id);
            if id == last {
                break;
            }
            current = self.tree[id].next;
        }
        boxes
    }

    /// Paragraphs built for item hookup `item`, in document order.
    pub(crate) fn item_paragraphs(&self, item: HookupId) -> Vec<BoxId> {
        self.item_boxes(item)
            .into_iter()
            .flat_map(|id| self.tree.paragraphs(id))
            .collect()
    }
}
