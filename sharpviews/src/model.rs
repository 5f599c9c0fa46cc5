// Copyright 2025 the SharpViews Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Observable data that views bind to.
//!
//! Values and lists report their changes to registered listeners. A listener
//! stays registered for as long as the [`Subscription`] returned by
//! `subscribe` is alive.

use alloc::rc::{Rc, Weak};
use alloc::vec::Vec;
use core::cell::{Ref, RefCell};
use core::ops::Range;

/// A change reported by an [`Observable`] or an [`ObservableList`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Change {
    /// The value was replaced.
    ValueChanged,
    /// `removed` items starting at `index` were replaced by `inserted` items.
    ListChanged {
        /// First affected index.
        index: usize,
        /// Number of items removed.
        removed: usize,
        /// Number of items inserted in their place.
        inserted: usize,
    },
}

type Listener = Rc<dyn Fn(&Change)>;

#[derive(Default)]
struct Listeners {
    next_key: u64,
    entries: Vec<(u64, Listener)>,
}

#[derive(Clone, Default)]
struct Notifier(Rc<RefCell<Listeners>>);

impl Notifier {
    fn subscribe(&self, listener: impl Fn(&Change) + 'static) -> Subscription {
        let mut listeners = self.0.borrow_mut();
        let key = listeners.next_key;
        listeners.next_key += 1;
        listeners.entries.push((key, Rc::new(listener)));
        Subscription {
            listeners: Rc::downgrade(&self.0),
            key,
        }
    }

    fn notify(&self, change: &Change) {
        // Listeners may subscribe or unsubscribe while being notified.
        let listeners: Vec<Listener> = self
            .0
            .borrow()
            .entries
            .iter()
            .map(|(_, listener)| listener.clone())
            .collect();
        for listener in listeners {
            listener(change);
        }
    }

    fn listener_count(&self) -> usize {
        self.0.borrow().entries.len()
    }
}

/// Keeps a listener registered; dropping it unregisters the listener.
#[must_use = "the listener is removed when the subscription is dropped"]
pub struct Subscription {
    listeners: Weak<RefCell<Listeners>>,
    key: u64,
}

impl core::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Subscription").field("key", &self.key).finish()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(listeners) = self.listeners.upgrade() {
            listeners
                .borrow_mut()
                .entries
                .retain(|(key, _)| *key != self.key);
        }
    }
}

struct ValueCell<T> {
    value: RefCell<T>,
    notifier: Notifier,
}

/// A shared, observable value.
///
/// Clones share the value: setting it through one clone notifies the
/// listeners of all of them.
pub struct Observable<T>(Rc<ValueCell<T>>);

impl<T> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<T: core::fmt::Debug> core::fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_tuple("Observable").field(&*self.0.value.borrow()).finish()
    }
}

impl<T: Default> Default for Observable<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T> Observable<T> {
    /// Creates an observable holding `value`.
    pub fn new(value: T) -> Self {
        Self(Rc::new(ValueCell {
            value: RefCell::new(value),
            notifier: Notifier::default(),
        }))
    }

    /// Borrows the current value.
    pub fn borrow(&self) -> Ref<'_, T> {
        self.0.value.borrow()
    }

    /// Replaces the value and notifies listeners.
    pub fn set(&self, value: T) {
        *self.0.value.borrow_mut() = value;
        self.0.notifier.notify(&Change::ValueChanged);
    }

    /// Registers `listener`, called after every change.
    pub fn subscribe(&self, listener: impl Fn(&Change) + 'static) -> Subscription {
        self.0.notifier.subscribe(listener)
    }

    /// Number of registered listeners.
    pub fn listener_count(&self) -> usize {
        self.0.notifier.listener_count()
    }

    /// Returns true if both refer to the same value.
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Rc::ptr_eq(&a.0, &b.0)
    }
}

impl<T: Clone> Observable<T> {
    /// A copy of the current value.
    pub fn get(&self) -> T {
        self.0.value.borrow().clone()
    }
}

struct ListCell<T> {
    items: RefCell<Vec<T>>,
    notifier: Notifier,
}

/// A shared, observable list.
pub struct ObservableList<T>(Rc<ListCell<T>>);

impl<T> Clone for ObservableList<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<T: core::fmt::Debug> core::fmt::Debug for ObservableList<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_list().entries(self.0.items.borrow().iter()).finish()
    }
}

impl<T> Default for ObservableList<T> {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl<T> ObservableList<T> {
    /// Creates a list holding `items`.
    pub fn new(items: Vec<T>) -> Self {
        Self(Rc::new(ListCell {
            items: RefCell::new(items),
            notifier: Notifier::default(),
        }))
    }

    /// Number of items.
    pub fn len(&self) -> usize {
        self.0.items.borrow().len()
    }

    /// Returns true if the list has no items.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Borrows the items.
    pub fn borrow(&self) -> Ref<'_, Vec<T>> {
        self.0.items.borrow()
    }

    /// Replaces the items in `range` with `items` and notifies listeners.
    ///
    /// # Panics
    ///
    /// Panics if `range` is out of bounds.
    pub fn splice(&self, range: Range<usize>, items: Vec<T>) {
        let change = Change::ListChanged {
            index: range.start,
            removed: range.len(),
            inserted: items.len(),
        };
        drop(self.0.items.borrow_mut().splice(range, items));
        self.0.notifier.notify(&change);
    }

    /// Inserts `item` at `index`.
    pub fn insert(&self, index: usize, item: T) {
        self.splice(index..index, vec![item]);
    }

    /// Appends `item`.
    pub fn push(&self, item: T) {
        let len = self.len();
        self.splice(len..len, vec![item]);
    }

    /// Removes the items in `range`.
    pub fn remove(&self, range: Range<usize>) {
        self.splice(range, Vec::new());
    }

    /// Registers `listener`, called after every change.
    pub fn subscribe(&self, listener: impl Fn(&Change) + 'static) -> Subscription {
        self.0.notifier.subscribe(listener)
    }

    /// Number of registered listeners.
    pub fn listener_count(&self) -> usize {
        self.0.notifier.listener_count()
    }
}

impl<T: Clone> ObservableList<T> {
    /// A copy of the item at `index`.
    pub fn get(&self, index: usize) -> Option<T> {
        self.0.items.borrow().get(index).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listeners_see_changes_until_dropped() {
        let value = Observable::new(String::from("a"));
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        let subscription = value.subscribe(move |change| sink.borrow_mut().push(change.clone()));
        value.set("b".into());
        assert_eq!(*seen.borrow(), [Change::ValueChanged]);
        assert_eq!(value.listener_count(), 1);

        drop(subscription);
        assert_eq!(value.listener_count(), 0);
        value.set("c".into());
        assert_eq!(seen.borrow().len(), 1);
        assert_eq!(value.get(), "c");
    }

    #[test]
    fn list_changes_report_ranges() {
        let list = ObservableList::new(vec![1, 2, 3]);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        let _subscription = list.subscribe(move |change| sink.borrow_mut().push(change.clone()));
        list.splice(1..3, vec![7]);
        list.push(9);
        assert_eq!(*list.borrow(), [1, 7, 9]);
        assert_eq!(
            *seen.borrow(),
            [
                Change::ListChanged {
                    index: 1,
                    removed: 2,
                    inserted: 1
                },
                Change::ListChanged {
                    index: 2,
                    removed: 0,
                    inserted: 1
                },
            ]
        );
    }
}
