// Copyright 2025 the SharpViews Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Live bindings between observable data and the boxes displaying it.
//!
//! A hookup subscribes to its data and forwards every change to the root's
//! notification queue. Hookups form a tree mirroring the sequences and items
//! that built them; removing a hookup removes its subordinates and drops
//! their subscriptions.

mod sequence;

use alloc::collections::VecDeque;
use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;
use core::cell::RefCell;
use core::ops::{Index, IndexMut, Range};

use crate::boxes::BoxId;
use crate::model::{Change, Observable, Subscription};
use crate::style::{AssembledStyles, Stylesheet, WsId};
use crate::text::{ClientRun, MultiString, RichString, TextRun};

pub(crate) use self::sequence::{ListBinding, ParagraphEdit, SeqSlot, SequenceBinding, SequenceHookup};

/// Identifies a hookup of a [`RootBox`](crate::RootBox).
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub(crate) struct HookupId {
    index: u32,
    generation: u32,
}

impl HookupId {
    #[cfg(test)]
    pub(crate) fn dangling() -> Self {
        Self {
            index: u32::MAX,
            generation: 0,
        }
    }
}

/// A change addressed to a hookup, waiting to be applied to the box tree.
#[derive(Clone, Debug)]
pub(crate) struct Notification {
    pub(crate) hookup: HookupId,
    pub(crate) change: Change,
}

pub(crate) type NotificationQueue = Rc<RefCell<VecDeque<Notification>>>;

/// The observable text behind one client run.
#[derive(Clone, Debug)]
pub(crate) enum BoundText {
    Plain(Observable<String>),
    Rich(Observable<RichString>),
    Multi {
        value: Observable<MultiString>,
        ws: WsId,
    },
}

impl BoundText {
    /// The client run displaying the current value.
    pub(crate) fn client_run(&self, style: &AssembledStyles, stylesheet: Option<&Stylesheet>) -> ClientRun {
        let run = match self {
            Self::Plain(value) => TextRun::new(&value.borrow(), style),
            Self::Rich(value) => TextRun::from_rich(&value.borrow(), style, stylesheet),
            Self::Multi { value, ws } => TextRun::from_multi(&value.borrow(), *ws, style),
        };
        ClientRun::Text(run)
    }

    /// The current text.
    pub(crate) fn text(&self) -> String {
        match self {
            Self::Plain(value) => value.get(),
            Self::Rich(value) => value.borrow().text().into(),
            Self::Multi { value, ws } => value.borrow().get(*ws).into(),
        }
    }

    /// Replaces `range` of the text with `text` and stores the result,
    /// which notifies listeners.
    ///
    /// Inserted rich text takes the formatting of the text before it.
    pub(crate) fn replace(&self, range: Range<usize>, text: &str) {
        match self {
            Self::Plain(value) => {
                let mut new = value.get();
                new.replace_range(range, text);
                value.set(new);
            }
            Self::Rich(value) => {
                let new = {
                    let old = value.borrow();
                    let props = old.props_at(range.start, true).clone();
                    old.replace(range, text, &props)
                };
                value.set(new);
            }
            Self::Multi { value, ws } => {
                let mut new = value.get();
                let mut alternative = String::from(new.get(*ws));
                alternative.replace_range(range, text);
                new.set(*ws, &alternative);
                value.set(new);
            }
        }
    }

    pub(crate) fn subscribe(&self, listener: impl Fn(&Change) + 'static) -> Subscription {
        match self {
            Self::Plain(value) => value.subscribe(listener),
            Self::Rich(value) => value.subscribe(listener),
            Self::Multi { value, .. } => value.subscribe(listener),
        }
    }
}

pub(crate) enum HookupKind {
    /// A bound string shown as client run `run` of paragraph `para`.
    Text {
        para: BoxId,
        run: usize,
        text: BoundText,
        style: AssembledStyles,
    },
    /// A list shown as a pile of item boxes.
    Sequence(SequenceHookup),
    /// One item of a sequence and the boxes it built.
    Item {
        first: Option<BoxId>,
        last: Option<BoxId>,
    },
}

pub(crate) struct Hookup {
    pub(crate) kind: HookupKind,
    pub(crate) parent: Option<HookupId>,
    pub(crate) children: Vec<HookupId>,
    pub(crate) subscription: Option<Subscription>,
}

impl Hookup {
    pub(crate) fn new(kind: HookupKind, parent: Option<HookupId>) -> Self {
        Self {
            kind,
            parent,
            children: Vec::new(),
            subscription: None,
        }
    }

    pub(crate) fn sequence(&self) -> Option<&SequenceHookup> {
        match &self.kind {
            HookupKind::Sequence(sequence) => Some(sequence),
            _ => None,
        }
    }

    pub(crate) fn sequence_mut(&mut self) -> Option<&mut SequenceHookup> {
        match &mut self.kind {
            HookupKind::Sequence(sequence) => Some(sequence),
            _ => None,
        }
    }
}

struct HookupSlot {
    generation: u32,
    hookup: Option<Hookup>,
}

/// Arena holding the hookups of one root.
#[derive(Default)]
pub(crate) struct Hookups {
    slots: Vec<HookupSlot>,
    free: Vec<u32>,
}

impl core::fmt::Debug for Hookups {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Hookups").field("live", &self.live()).finish()
    }
}

impl Hookups {
    /// Adds `hookup` and registers it with its parent.
    pub(crate) fn insert(&mut self, hookup: Hookup) -> HookupId {
        let parent = hookup.parent;
        let id = if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.generation += 1;
            slot.hookup = Some(hookup);
            HookupId {
                index,
                generation: slot.generation,
            }
        } else {
            let index = u32::try_from(self.slots.len()).unwrap_or(u32::MAX);
            self.slots.push(HookupSlot {
                generation: 0,
                hookup: Some(hookup),
            });
            HookupId {
                index,
                generation: 0,
            }
        };
        if let Some(parent) = parent.and_then(|parent| self.get_mut(parent)) {
            parent.children.push(id);
        }
        id
    }

    pub(crate) fn get(&self, id: HookupId) -> Option<&Hookup> {
        self.slots
            .get(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.hookup.as_ref())
    }

    pub(crate) fn get_mut(&mut self, id: HookupId) -> Option<&mut Hookup> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.hookup.as_mut())
    }

    /// Number of live hookups.
    pub(crate) fn live(&self) -> usize {
        self.slots.iter().filter(|slot| slot.hookup.is_some()).count()
    }

    /// Removes `id` and its subordinates, dropping their subscriptions.
    pub(crate) fn remove(&mut self, id: HookupId) {
        let Some(parent) = self.get(id).map(|hookup| hookup.parent) else {
            return;
        };
        if let Some(parent) = parent.and_then(|parent| self.get_mut(parent)) {
            parent.children.retain(|child| *child != id);
        }
        let mut pending = vec![id];
        while let Some(current) = pending.pop() {
            let slot = &mut self.slots[current.index as usize];
            if slot.generation != current.generation {
                continue;
            }
            if let Some(hookup) = slot.hookup.take() {
                pending.extend(hookup.children);
                self.free.push(current.index);
            }
        }
    }

    /// The nearest ancestor of `id` (or `id` itself) that is an item, with
    /// the sequence that owns it.
    pub(crate) fn enclosing_item(&self, id: HookupId) -> Option<(HookupId, HookupId)> {
        let mut current = id;
        loop {
            let hookup = self.get(current)?;
            let parent = hookup.parent?;
            if matches!(hookup.kind, HookupKind::Item { .. })
                && self.get(parent).and_then(Hookup::sequence).is_some()
            {
                return Some((current, parent));
            }
            current = parent;
        }
    }
}

impl Index<HookupId> for Hookups {
    type Output = Hookup;

    fn index(&self, id: HookupId) -> &Hookup {
        match self.get(id) {
            Some(hookup) => hookup,
            None => panic!("stale hookup id {id:?}"),
        }
    }
}

impl IndexMut<HookupId> for Hookups {
    fn index_mut(&mut self, id: HookupId) -> &mut Hookup {
        match self.get_mut(id) {
            Some(hookup) => hookup,
            None => panic!("stale hookup id {id:?}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn removing_a_hookup_removes_its_subordinates() {
        let mut hookups = Hookups::default();
        let item = hookups.insert(Hookup::new(
            HookupKind::Item {
                first: None,
                last: None,
            },
            None,
        ));
        let value = Observable::new(String::from("x"));
        let text = BoundText::Plain(value.clone());
        let child = hookups.insert(Hookup::new(
            HookupKind::Item {
                first: None,
                last: None,
            },
            Some(item),
        ));
        hookups[child].subscription = Some(text.subscribe(|_| {}));
        assert_eq!(value.listener_count(), 1);

        hookups.remove(item);
        assert!(hookups.get(child).is_none());
        assert_eq!(value.listener_count(), 0, "subscription outlived its hookup");
        assert_eq!(hookups.live(), 0);
    }

    #[test]
    fn rich_insertions_take_preceding_formatting() {
        use crate::style::TextProps;
        let rich = RichString::new("ab", TextProps::named("Emphasis")).push("cd", TextProps::default());
        let value = Observable::new(rich);
        BoundText::Rich(value.clone()).replace(2..2, "X");
        let value = value.borrow();
        assert_eq!(value.text(), "abXcd");
        assert_eq!(value.props_at(2, false), &TextProps::named("Emphasis"));
    }
}
