// Copyright 2025 the SharpViews Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use core::ops::Range;

use crate::hookup::HookupId;

/// A placeholder for a run of list items that have not been built.
#[derive(Clone, Debug)]
pub(crate) struct LazyData {
    /// The sequence hookup the items belong to.
    pub(crate) sequence: HookupId,
    /// Number of items the box stands for.
    pub(crate) count: usize,
    /// Estimated height of one item, in pixels.
    pub(crate) item_height: f64,
}

impl LazyData {
    pub(crate) fn estimated_height(&self) -> f64 {
        self.count as f64 * self.item_height
    }

    /// Items (relative to the box) overlapping the vertical span
    /// `top..bottom`, given relative to the top of the box.
    ///
    /// At least one item is returned when the span touches the box at all.
    pub(crate) fn items_between(&self, top: f64, bottom: f64) -> Range<usize> {
        if self.count == 0 || bottom <= 0.0 || top >= self.estimated_height() {
            return 0..0;
        }
        if self.item_height <= 0.0 {
            return 0..self.count;
        }
        let first = (top.max(0.0) / self.item_height).floor() as usize;
        let last = (bottom / self.item_height).ceil() as usize;
        let first = first.min(self.count - 1);
        first..last.clamp(first + 1, self.count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lazy(count: usize) -> LazyData {
        LazyData {
            sequence: HookupId::dangling(),
            count,
            item_height: 16.0,
        }
    }

    #[test]
    fn overlapping_items() {
        let data = lazy(6);
        assert_eq!(data.items_between(0.0, 32.0), 0..2);
        assert_eq!(data.items_between(20.0, 40.0), 1..3);
        assert_eq!(data.items_between(95.0, 200.0), 5..6);
        assert_eq!(data.items_between(96.0, 200.0), 0..0);
        assert_eq!(data.items_between(-10.0, 0.0), 0..0);
    }
}
