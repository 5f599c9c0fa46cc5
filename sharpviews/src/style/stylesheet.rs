// Copyright 2025 the SharpViews Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use alloc::rc::Rc;
use alloc::vec::Vec;

use hashbrown::HashMap;

use super::{AssembledStyles, StyleProperty, WsId};
use crate::{Error, Result};

/// A named style: character-level overrides, optionally per writing system.
#[derive(Clone, Debug, Default)]
pub struct NamedStyle {
    name: Rc<str>,
    based_on: Option<Rc<str>>,
    properties: Vec<StyleProperty>,
    ws_overrides: HashMap<WsId, Vec<StyleProperty>>,
}

impl NamedStyle {
    /// Creates a style with no overrides.
    pub fn new(name: &str) -> Self {
        Self {
            name: Rc::from(name),
            ..Self::default()
        }
    }

    /// Makes this style inherit the overrides of `parent`.
    #[must_use]
    pub fn based_on(mut self, parent: &str) -> Self {
        self.based_on = Some(Rc::from(parent));
        self
    }

    /// Adds an override that applies whatever the writing system.
    #[must_use]
    pub fn with(mut self, property: StyleProperty) -> Self {
        self.properties.push(property);
        self
    }

    /// Adds an override that only applies to text in `ws`.
    #[must_use]
    pub fn with_ws_override(mut self, ws: WsId, property: StyleProperty) -> Self {
        self.ws_overrides.entry(ws).or_default().push(property);
        self
    }

    /// The name of the style.
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// A collection of named styles, supplied by the host.
#[derive(Clone, Debug, Default)]
pub struct Stylesheet {
    styles: HashMap<Rc<str>, NamedStyle>,
}

impl Stylesheet {
    /// Creates an empty stylesheet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a named style.
    pub fn insert(&mut self, style: NamedStyle) {
        self.styles.insert(style.name.clone(), style);
    }

    /// Looks up a style by name.
    pub fn get(&self, name: &str) -> Option<&NamedStyle> {
        self.styles.get(name)
    }

    /// Returns the overrides of `name` for text in `ws`, ancestors first.
    pub fn resolve(&self, name: &str, ws: WsId) -> Result<Vec<StyleProperty>> {
        let mut chain = Vec::new();
        let mut next = Some(name);
        while let Some(current) = next {
            let style = self
                .get(current)
                .ok_or(Error::unknown_style("style not in stylesheet"))?;
            if chain.iter().any(|s: &&NamedStyle| s.name == style.name) {
                // Cyclic `based_on`; stop at the first repeat.
                break;
            }
            chain.push(style);
            next = style.based_on.as_deref();
        }
        let mut properties = Vec::new();
        for style in chain.iter().rev() {
            properties.extend(style.properties.iter().cloned());
            if let Some(overrides) = style.ws_overrides.get(&ws) {
                properties.extend(overrides.iter().cloned());
            }
        }
        Ok(properties)
    }
}

/// Formatting attached to a run of a [`RichString`](crate::text::RichString).
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct TextProps {
    /// Stylesheet style applied to the run.
    pub named_style: Option<Rc<str>>,
    /// Writing system of the run.
    pub ws: Option<WsId>,
    /// Direct formatting, applied after the named style.
    pub direct: Vec<StyleProperty>,
}

impl TextProps {
    /// Properties carrying only a writing system.
    pub fn ws(ws: WsId) -> Self {
        Self {
            ws: Some(ws),
            ..Self::default()
        }
    }

    /// Properties carrying only a named style.
    pub fn named(name: &str) -> Self {
        Self {
            named_style: Some(Rc::from(name)),
            ..Self::default()
        }
    }
}

impl AssembledStyles {
    /// Derives the style of text carrying `props`, looking named styles up in
    /// `stylesheet`.
    ///
    /// The writing system is applied first so that per-writing-system
    /// overrides of the named style are selected; direct formatting wins over
    /// the named style. Properties that neither mentions stay inherited.
    #[must_use]
    pub fn apply_text_props(&self, props: &TextProps, stylesheet: Option<&Stylesheet>) -> Self {
        let mut resolved = self.props().clone();
        if let Some(ws) = props.ws {
            resolved.ws = ws;
        }
        if let Some(name) = &props.named_style {
            match stylesheet.map(|sheet| sheet.resolve(name, resolved.ws)) {
                Some(Ok(overrides)) => {
                    for property in &overrides {
                        resolved.apply(property);
                    }
                }
                Some(Err(_)) | None => {
                    log::warn!("named style {name:?} is not defined; keeping inherited formatting");
                }
            }
            resolved.style_name = Some(name.clone());
        }
        for property in &props.direct {
            resolved.apply(property);
        }
        self.derive(resolved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::{Color, FontStyle, StyleCatalog, TextToggle, WEIGHT_BOLD};

    fn sheet() -> Stylesheet {
        let mut sheet = Stylesheet::new();
        sheet.insert(
            NamedStyle::new("Emphasis")
                .with(StyleProperty::Italic(TextToggle::ForceOn))
                .with_ws_override(WsId(2), StyleProperty::ForeColor(Color::RED)),
        );
        sheet.insert(
            NamedStyle::new("Strong Emphasis")
                .based_on("Emphasis")
                .with(StyleProperty::FontWeight(WEIGHT_BOLD)),
        );
        sheet
    }

    #[test]
    fn named_style_overrides_and_inherits() {
        let base = StyleCatalog::new().default_style().with_font_size(12_000);
        let styled = base.apply_text_props(&TextProps::named("Strong Emphasis"), Some(&sheet()));
        assert_eq!(styled.font_style(), FontStyle::Italic);
        assert_eq!(styled.font_weight(), WEIGHT_BOLD);
        assert_eq!(styled.font_size(), 12_000);
        assert_eq!(styled.fore_color(), Color::BLACK);
        assert_eq!(styled.style_name(), Some("Strong Emphasis"));
    }

    #[test]
    fn writing_system_overrides_apply() {
        let base = StyleCatalog::new().default_style();
        let props = TextProps {
            named_style: Some(Rc::from("Emphasis")),
            ws: Some(WsId(2)),
            direct: Vec::new(),
        };
        let styled = base.apply_text_props(&props, Some(&sheet()));
        assert_eq!(styled.fore_color(), Color::RED);
        assert_eq!(styled.ws(), WsId(2));
    }

    #[test]
    fn direct_formatting_wins() {
        let base = StyleCatalog::new().default_style();
        let props = TextProps {
            named_style: Some(Rc::from("Emphasis")),
            ws: None,
            direct: vec![StyleProperty::Italic(TextToggle::ForceOff)],
        };
        let styled = base.apply_text_props(&props, Some(&sheet()));
        assert_eq!(styled.font_style(), FontStyle::Normal);
    }

    #[test]
    fn repeated_application_is_interned() {
        let base = StyleCatalog::new().default_style();
        let sheet = sheet();
        let a = base.apply_text_props(&TextProps::named("Emphasis"), Some(&sheet));
        let b = base.apply_text_props(&TextProps::named("Emphasis"), Some(&sheet));
        assert!(AssembledStyles::ptr_eq(&a, &b), "stylesheet derivation not interned");
    }
}
