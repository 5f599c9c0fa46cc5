// Copyright 2025 the SharpViews Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use alloc::vec::Vec;
use core::cell::Cell;

use super::{AssembledStyles, StyleProperty};
use crate::{Error, Result};

/// Batches several property changes into a single style derivation.
///
/// Once the setter has been applied it is frozen: further calls to
/// [`append`](Self::append) fail with
/// [`ErrorKind::SetterFrozen`](crate::ErrorKind::SetterFrozen).
#[derive(Debug, Default)]
pub struct PropertySetter {
    properties: Vec<StyleProperty>,
    applied: Cell<bool>,
}

impl PropertySetter {
    /// Creates an empty setter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a property to the batch.
    pub fn append(&mut self, property: StyleProperty) -> Result<()> {
        if self.applied.get() {
            return Err(Error::setter_frozen());
        }
        self.properties.push(property);
        Ok(())
    }

    /// Returns the properties collected so far.
    pub fn properties(&self) -> &[StyleProperty] {
        &self.properties
    }

    /// Derives the style equal to `base` with every collected property applied.
    pub fn apply(&self, base: &AssembledStyles) -> AssembledStyles {
        self.applied.set(true);
        base.with_all(&self.properties)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::{Color, StyleCatalog, WEIGHT_BOLD};
    use crate::ErrorKind;

    #[test]
    fn batch_matches_chained_derivation() {
        let base = StyleCatalog::new().default_style();
        let mut setter = PropertySetter::new();
        setter.append(StyleProperty::FontWeight(WEIGHT_BOLD)).unwrap();
        setter.append(StyleProperty::ForeColor(Color::BLUE)).unwrap();
        let batched = setter.apply(&base);
        let chained = base.with_font_weight(WEIGHT_BOLD).with_fore_color(Color::BLUE);
        assert!(AssembledStyles::ptr_eq(&batched, &chained), "batch was not interned");
    }

    #[test]
    fn append_after_apply_fails() {
        let base = StyleCatalog::new().default_style();
        let mut setter = PropertySetter::new();
        setter.append(StyleProperty::FontSize(12_000)).unwrap();
        let _ = setter.apply(&base);
        let err = setter.append(StyleProperty::FontSize(14_000)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SetterFrozen);
    }
}
