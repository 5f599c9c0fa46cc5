// Copyright 2025 the SharpViews Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The box tree.
//!
//! Boxes live in an arena owned by the root and refer to each other by
//! [`BoxId`]. A container owns its children, which form a singly linked list
//! from `first` to `last` through `next`; the `container` link points back up
//! and is used for navigation only.

mod lazy;
mod para;

use alloc::vec::Vec;
use core::ops::{Index, IndexMut};

use peniko::kurbo::{Point, Rect};

use crate::hookup::HookupId;
use crate::style::{AssembledStyles, Color};
use crate::text::ClientRun;

pub(crate) use self::lazy::LazyData;
pub(crate) use self::para::{LineBreaker, LineItem, ParaData, ParaLine};

/// Identifies a box in the tree of a [`RootBox`](crate::RootBox).
///
/// Ids are never reused for a different box: once the box is removed, the
/// id is stale and operations addressed to it fail with
/// [`ErrorKind::StaleBox`](crate::ErrorKind::StaleBox).
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct BoxId {
    index: u32,
    generation: u32,
}

/// The kind of a box, as visible to hosts.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum BoxType {
    /// A vertical pile of boxes.
    Div,
    /// Boxes tiled horizontally in columns.
    Row,
    /// A paragraph of text, possibly with embedded boxes.
    Para,
    /// A solid rectangle.
    Block,
    /// A placeholder for list items that have not been built yet.
    Lazy,
}

/// The width of one column of a row.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum ColumnWidth {
    /// A fixed width in millipoints.
    Fixed(i32),
    /// A share of the width left over by fixed columns.
    Share(u32),
}

impl Default for ColumnWidth {
    fn default() -> Self {
        Self::Share(1)
    }
}

#[derive(Copy, Clone, Debug, Default)]
pub(crate) struct GroupData {
    pub(crate) first: Option<BoxId>,
    pub(crate) last: Option<BoxId>,
}

#[derive(Clone, Debug)]
pub(crate) struct BlockData {
    /// Width in millipoints; zero fills the available width.
    pub(crate) width: i32,
    /// Height in millipoints.
    pub(crate) height: i32,
    pub(crate) color: Color,
}

#[derive(Debug)]
pub(crate) enum BoxKind {
    Div(GroupData),
    Row {
        group: GroupData,
        columns: Vec<ColumnWidth>,
    },
    Para(ParaData),
    Block(BlockData),
    Lazy(LazyData),
}

impl BoxKind {
    pub(crate) fn box_type(&self) -> BoxType {
        match self {
            Self::Div(_) => BoxType::Div,
            Self::Row { .. } => BoxType::Row,
            Self::Para(_) => BoxType::Para,
            Self::Block(_) => BoxType::Block,
            Self::Lazy(_) => BoxType::Lazy,
        }
    }

    pub(crate) fn group(&self) -> Option<&GroupData> {
        match self {
            Self::Div(group) | Self::Row { group, .. } => Some(group),
            _ => None,
        }
    }

    pub(crate) fn group_mut(&mut self) -> Option<&mut GroupData> {
        match self {
            Self::Div(group) | Self::Row { group, .. } => Some(group),
            _ => None,
        }
    }
}

#[derive(Debug)]
pub(crate) struct BoxNode {
    pub(crate) kind: BoxKind,
    pub(crate) style: AssembledStyles,
    pub(crate) container: Option<BoxId>,
    pub(crate) next: Option<BoxId>,
    /// The hookup that built this box, if any.
    pub(crate) hookup: Option<HookupId>,
    /// Position relative to the container.
    pub(crate) left: f64,
    pub(crate) top: f64,
    pub(crate) width: f64,
    pub(crate) height: f64,
    pub(crate) ascent: f64,
    pub(crate) laid_out: bool,
}

impl BoxNode {
    pub(crate) fn new(kind: BoxKind, style: AssembledStyles) -> Self {
        Self {
            kind,
            style,
            container: None,
            next: None,
            hookup: None,
            left: 0.0,
            top: 0.0,
            width: 0.0,
            height: 0.0,
            ascent: 0.0,
            laid_out: false,
        }
    }

    /// The box's rectangle relative to its container.
    pub(crate) fn rect(&self) -> Rect {
        Rect::new(self.left, self.top, self.left + self.width, self.top + self.height)
    }

    pub(crate) fn para(&self) -> Option<&ParaData> {
        match &self.kind {
            BoxKind::Para(para) => Some(para),
            _ => None,
        }
    }

    pub(crate) fn para_mut(&mut self) -> Option<&mut ParaData> {
        match &mut self.kind {
            BoxKind::Para(para) => Some(para),
            _ => None,
        }
    }
}

#[derive(Debug)]
struct Slot {
    generation: u32,
    node: Option<BoxNode>,
}

/// Arena holding every box of one root.
#[derive(Debug, Default)]
pub(crate) struct BoxTree {
    slots: Vec<Slot>,
    free: Vec<u32>,
}

impl BoxTree {
    pub(crate) fn insert(&mut self, node: BoxNode) -> BoxId {
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.generation += 1;
            slot.node = Some(node);
            BoxId {
                index,
                generation: slot.generation,
            }
        } else {
            let index = u32::try_from(self.slots.len()).unwrap_or(u32::MAX);
            self.slots.push(Slot {
                generation: 0,
                node: Some(node),
            });
            BoxId {
                index,
                generation: 0,
            }
        }
    }

    pub(crate) fn get(&self, id: BoxId) -> Option<&BoxNode> {
        self.slots
            .get(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_ref())
    }

    pub(crate) fn get_mut(&mut self, id: BoxId) -> Option<&mut BoxNode> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_mut())
    }

    pub(crate) fn contains(&self, id: BoxId) -> bool {
        self.get(id).is_some()
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.node.is_some()).count()
    }

    /// The children of a container, in order. Non-containers have none.
    pub(crate) fn children(&self, id: BoxId) -> Children<'_> {
        Children {
            tree: self,
            next: self[id].kind.group().and_then(|group| group.first),
        }
    }

    /// Boxes embedded in a paragraph, in text order.
    pub(crate) fn embedded(&self, id: BoxId) -> Vec<BoxId> {
        let Some(para) = self[id].para() else {
            return Vec::new();
        };
        para.source
            .client_runs()
            .iter()
            .filter_map(|run| match run {
                ClientRun::Embedded(embedded) => Some(embedded.box_id),
                ClientRun::Text(_) => None,
            })
            .collect()
    }

    /// Links `child` into `container` directly after `after`, or first when
    /// `after` is `None`.
    pub(crate) fn insert_child(&mut self, container: BoxId, after: Option<BoxId>, child: BoxId) {
        let next = match after {
            Some(after) => self[after].next.replace(child),
            None => {
                let group = self.group_mut(container);
                let old_first = group.first.replace(child);
                if group.last.is_none() {
                    group.last = Some(child);
                }
                old_first
            }
        };
        if after.is_some() && next.is_none() {
            self.group_mut(container).last = Some(child);
        }
        let node = &mut self[child];
        node.container = Some(container);
        node.next = next;
    }

    pub(crate) fn append_child(&mut self, container: BoxId, child: BoxId) {
        let last = self[container].kind.group().and_then(|group| group.last);
        self.insert_child(container, last, child);
    }

    /// Unlinks `child` from its container without freeing it.
    pub(crate) fn unlink(&mut self, child: BoxId) {
        let Some(container) = self[child].container else {
            return;
        };
        if self[container].kind.group().is_none() {
            self[child].container = None;
            return;
        }
        let prev = self.children(container).take_while(|&id| id != child).last();
        let next = self[child].next.take();
        match prev {
            Some(prev) => self[prev].next = next,
            None => self.group_mut(container).first = next,
        }
        let group = self.group_mut(container);
        if group.last == Some(child) {
            group.last = prev;
        }
        self[child].container = None;
    }

    /// Unlinks `id` and frees it together with everything it contains.
    ///
    /// Returns the hookups of the freed boxes.
    pub(crate) fn remove_subtree(&mut self, id: BoxId) -> Vec<HookupId> {
        self.unlink(id);
        let mut hookups = Vec::new();
        let mut pending = vec![id];
        while let Some(current) = pending.pop() {
            pending.extend(self.children(current));
            pending.extend(self.embedded(current));
            let slot = &mut self.slots[current.index as usize];
            if let Some(node) = slot.node.take() {
                hookups.extend(node.hookup);
                if let BoxKind::Para(para) = node.kind {
                    hookups.extend(para.run_hookups.into_iter().flatten());
                }
                self.free.push(current.index);
            }
        }
        hookups
    }

    fn group_mut(&mut self, container: BoxId) -> &mut GroupData {
        match self[container].kind.group_mut() {
            Some(group) => group,
            None => unreachable!("box {container:?} is not a container"),
        }
    }

    /// Containers of `id` from the innermost outwards.
    pub(crate) fn ancestors(&self, id: BoxId) -> Ancestors<'_> {
        Ancestors {
            tree: self,
            next: self.get(id).and_then(|node| node.container),
        }
    }

    /// Top-left corner of `id` in root coordinates.
    pub(crate) fn origin_in_root(&self, id: BoxId) -> Point {
        let mut origin = Point::new(self[id].left, self[id].top);
        for ancestor in self.ancestors(id) {
            origin.x += self[ancestor].left;
            origin.y += self[ancestor].top;
        }
        origin
    }

    /// Rectangle of `id` in root coordinates.
    pub(crate) fn rect_in_root(&self, id: BoxId) -> Rect {
        let origin = self.origin_in_root(id);
        let node = &self[id];
        Rect::new(origin.x, origin.y, origin.x + node.width, origin.y + node.height)
    }

    /// Paragraphs below `root` in document order.
    ///
    /// Paragraphs embedded inside other paragraphs are not included.
    pub(crate) fn paragraphs(&self, root: BoxId) -> Vec<BoxId> {
        let mut out = Vec::new();
        let mut pending = vec![root];
        while let Some(id) = pending.pop() {
            match &self[id].kind {
                BoxKind::Para(_) => out.push(id),
                BoxKind::Div(_) | BoxKind::Row { .. } => {
                    let children: Vec<BoxId> = self.children(id).collect();
                    pending.extend(children.into_iter().rev());
                }
                BoxKind::Block(_) | BoxKind::Lazy(_) => {}
            }
        }
        out
    }

    /// Lazy boxes below `root` in document order.
    pub(crate) fn lazy_boxes(&self, root: BoxId) -> Vec<BoxId> {
        let mut out = Vec::new();
        let mut pending = vec![root];
        while let Some(id) = pending.pop() {
            if matches!(self[id].kind, BoxKind::Lazy(_)) {
                out.push(id);
            }
            let children: Vec<BoxId> = self.children(id).collect();
            pending.extend(children.into_iter().rev());
        }
        out
    }
}

impl Index<BoxId> for BoxTree {
    type Output = BoxNode;

    fn index(&self, id: BoxId) -> &BoxNode {
        match self.get(id) {
            Some(node) => node,
            None => panic!("stale box id {id:?}"),
        }
    }
}

impl IndexMut<BoxId> for BoxTree {
    fn index_mut(&mut self, id: BoxId) -> &mut BoxNode {
        match self.get_mut(id) {
            Some(node) => node,
            None => panic!("stale box id {id:?}"),
        }
    }
}

pub(crate) struct Children<'a> {
    tree: &'a BoxTree,
    next: Option<BoxId>,
}

impl Iterator for Children<'_> {
    type Item = BoxId;

    fn next(&mut self) -> Option<BoxId> {
        let current = self.next?;
        self.next = self.tree[current].next;
        Some(current)
    }
}

pub(crate) struct Ancestors<'a> {
    tree: &'a BoxTree,
    next: Option<BoxId>,
}

impl Iterator for Ancestors<'_> {
    type Item = BoxId;

    fn next(&mut self) -> Option<BoxId> {
        let current = self.next?;
        self.next = self.tree[current].container;
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::StyleCatalog;

    fn div(tree: &mut BoxTree) -> BoxId {
        let style = StyleCatalog::new().default_style();
        tree.insert(BoxNode::new(BoxKind::Div(GroupData::default()), style))
    }

    #[test]
    fn children_form_a_linked_list() {
        let mut tree = BoxTree::default();
        let root = div(&mut tree);
        let a = div(&mut tree);
        let b = div(&mut tree);
        let c = div(&mut tree);
        tree.append_child(root, a);
        tree.append_child(root, c);
        tree.insert_child(root, Some(a), b);
        assert_eq!(tree.children(root).collect::<Vec<_>>(), [a, b, c]);
        assert!(tree.children(root).all(|child| tree[child].container == Some(root)));

        tree.unlink(c);
        assert_eq!(tree[root].kind.group().and_then(|g| g.last), Some(b));
        tree.unlink(a);
        assert_eq!(tree.children(root).collect::<Vec<_>>(), [b]);
    }

    #[test]
    fn removed_ids_go_stale() {
        let mut tree = BoxTree::default();
        let root = div(&mut tree);
        let child = div(&mut tree);
        let grandchild = div(&mut tree);
        tree.append_child(root, child);
        tree.append_child(child, grandchild);
        tree.remove_subtree(child);
        assert!(!tree.contains(child));
        assert!(!tree.contains(grandchild));
        let reused = div(&mut tree);
        assert_ne!(reused, child, "ids are not reused for a new box");
        assert_eq!(tree.len(), 2);
    }
}
