// Copyright 2025 the SharpViews Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use alloc::rc::{Rc, Weak};
use core::cell::RefCell;
use core::hash::{Hash, Hasher};

use hashbrown::HashMap;

use super::{
    Color, FontStyle, StyleProperty, TextAlign, TextToggle, Thickness, Underline, WsId,
    DEFAULT_FONT_SIZE, WEIGHT_BOLD, WEIGHT_NORMAL,
};

/// The complete set of formatting values a style carries.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub(crate) struct StyleProps {
    pub(crate) font_family: Rc<str>,
    pub(crate) font_size: i32,
    pub(crate) font_weight: u16,
    pub(crate) font_style: FontStyle,
    pub(crate) underline: Underline,
    pub(crate) underline_color: Color,
    pub(crate) fore_color: Color,
    pub(crate) back_color: Color,
    pub(crate) border_color: Color,
    pub(crate) margins: Thickness,
    pub(crate) borders: Thickness,
    pub(crate) pads: Thickness,
    pub(crate) ws: WsId,
    pub(crate) right_to_left: bool,
    pub(crate) line_height: i32,
    pub(crate) first_line_indent: i32,
    pub(crate) text_align: TextAlign,
    pub(crate) style_name: Option<Rc<str>>,
}

impl Default for StyleProps {
    fn default() -> Self {
        Self {
            font_family: Rc::from("Times New Roman"),
            font_size: DEFAULT_FONT_SIZE,
            font_weight: WEIGHT_NORMAL,
            font_style: FontStyle::Normal,
            underline: Underline::None,
            underline_color: Color::BLACK,
            fore_color: Color::BLACK,
            back_color: Color::TRANSPARENT,
            border_color: Color::BLACK,
            margins: Thickness::default(),
            borders: Thickness::default(),
            pads: Thickness::default(),
            ws: WsId::default(),
            right_to_left: false,
            line_height: 0,
            first_line_indent: 0,
            text_align: TextAlign::Leading,
            style_name: None,
        }
    }
}

impl StyleProps {
    pub(crate) fn apply(&mut self, property: &StyleProperty) {
        match property {
            StyleProperty::FontFamily(family) => self.font_family = family.clone(),
            StyleProperty::FontSize(size) => self.font_size = *size,
            StyleProperty::FontWeight(weight) => self.font_weight = *weight,
            StyleProperty::FontStyle(style) => self.font_style = *style,
            StyleProperty::Bold(toggle) => {
                let bold = match toggle {
                    TextToggle::ForceOff => false,
                    TextToggle::ForceOn => true,
                    TextToggle::Invert => self.font_weight < WEIGHT_BOLD,
                };
                self.font_weight = if bold { WEIGHT_BOLD } else { WEIGHT_NORMAL };
            }
            StyleProperty::Italic(toggle) => {
                let italic = match toggle {
                    TextToggle::ForceOff => false,
                    TextToggle::ForceOn => true,
                    TextToggle::Invert => self.font_style == FontStyle::Normal,
                };
                self.font_style = if italic {
                    FontStyle::Italic
                } else {
                    FontStyle::Normal
                };
            }
            StyleProperty::Underline(underline) => self.underline = *underline,
            StyleProperty::UnderlineColor(color) => self.underline_color = *color,
            StyleProperty::ForeColor(color) => self.fore_color = *color,
            StyleProperty::BackColor(color) => self.back_color = *color,
            StyleProperty::BorderColor(color) => self.border_color = *color,
            StyleProperty::Margins(margins) => self.margins = *margins,
            StyleProperty::Borders(borders) => self.borders = *borders,
            StyleProperty::Pads(pads) => self.pads = *pads,
            StyleProperty::Ws(ws) => self.ws = *ws,
            StyleProperty::RightToLeft(rtl) => self.right_to_left = *rtl,
            StyleProperty::LineHeight(height) => self.line_height = *height,
            StyleProperty::FirstLineIndent(indent) => self.first_line_indent = *indent,
            StyleProperty::TextAlign(align) => self.text_align = *align,
            StyleProperty::StyleName(name) => self.style_name = name.clone(),
        }
    }
}

struct CatalogInner {
    table: RefCell<HashMap<StyleProps, Weak<StyleNode>>>,
}

struct StyleNode {
    props: StyleProps,
    catalog: Rc<CatalogInner>,
}

impl Drop for StyleNode {
    fn drop(&mut self) {
        let mut table = self.catalog.table.borrow_mut();
        if table
            .get(&self.props)
            .is_some_and(|entry| entry.strong_count() == 0)
        {
            table.remove(&self.props);
        }
    }
}

/// An intern table for [`AssembledStyles`].
///
/// Every style derived from a style of this catalog is looked up here before a
/// new instance is allocated, so two structurally equal styles of the same
/// catalog are always the same instance. Entries disappear once the last
/// reference to their style is dropped.
#[derive(Clone)]
pub struct StyleCatalog(Rc<CatalogInner>);

impl core::fmt::Debug for StyleCatalog {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("StyleCatalog")
            .field("len", &self.len())
            .finish()
    }
}

impl Default for StyleCatalog {
    fn default() -> Self {
        Self::new()
    }
}

std::thread_local! {
    static SHARED_CATALOG: StyleCatalog = StyleCatalog::new();
}

impl StyleCatalog {
    /// Creates an empty catalog.
    ///
    /// Styles of different catalogs are never the same instance, even when
    /// they are equal. Use [`StyleCatalog::shared`] unless the styles of a
    /// view must be kept apart.
    pub fn new() -> Self {
        Self(Rc::new(CatalogInner {
            table: RefCell::new(HashMap::new()),
        }))
    }

    /// The catalog of the current thread, which the default styles of
    /// [`AssembledStyles`] and [`RootOptions`](crate::RootOptions) belong to.
    pub fn shared() -> Self {
        SHARED_CATALOG.with(Clone::clone)
    }

    /// Returns the style with all default values.
    pub fn default_style(&self) -> AssembledStyles {
        self.intern(StyleProps::default())
    }

    /// Returns the number of live styles in the catalog.
    pub fn len(&self) -> usize {
        self.0
            .table
            .borrow()
            .values()
            .filter(|entry| entry.strong_count() > 0)
            .count()
    }

    /// Returns true if no style of this catalog is alive.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn intern(&self, props: StyleProps) -> AssembledStyles {
        let mut table = self.0.table.borrow_mut();
        if let Some(existing) = table.get(&props).and_then(Weak::upgrade) {
            return AssembledStyles(existing);
        }
        let node = Rc::new(StyleNode {
            props: props.clone(),
            catalog: self.0.clone(),
        });
        table.insert(props, Rc::downgrade(&node));
        AssembledStyles(node)
    }
}

/// An immutable, interned description of all inherited text and paragraph
/// formatting.
///
/// Styles are never mutated. Each `with_*` method returns the style that
/// differs from `self` in exactly one property; structurally equal results are
/// the same instance (see [`AssembledStyles::ptr_eq`]).
#[derive(Clone)]
pub struct AssembledStyles(Rc<StyleNode>);

impl core::fmt::Debug for AssembledStyles {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_tuple("AssembledStyles").field(&self.0.props).finish()
    }
}

impl PartialEq for AssembledStyles {
    fn eq(&self, other: &Self) -> bool {
        Self::ptr_eq(self, other) || self.0.props == other.0.props
    }
}

impl Eq for AssembledStyles {}

impl Hash for AssembledStyles {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.props.hash(state);
    }
}

impl Default for AssembledStyles {
    fn default() -> Self {
        StyleCatalog::shared().default_style()
    }
}

impl AssembledStyles {
    /// Returns true if both handles refer to the same interned style.
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Rc::ptr_eq(&a.0, &b.0)
    }

    /// Returns the catalog this style is interned in.
    pub fn catalog(&self) -> StyleCatalog {
        StyleCatalog(self.0.catalog.clone())
    }

    pub(crate) fn props(&self) -> &StyleProps {
        &self.0.props
    }

    /// Returns the style with a single property changed.
    #[must_use]
    pub fn with(&self, property: StyleProperty) -> Self {
        let mut props = self.0.props.clone();
        props.apply(&property);
        self.derive(props)
    }

    /// Returns the style with every property in `properties` applied in order.
    #[must_use]
    pub fn with_all<'a>(&self, properties: impl IntoIterator<Item = &'a StyleProperty>) -> Self {
        let mut props = self.0.props.clone();
        for property in properties {
            props.apply(property);
        }
        self.derive(props)
    }

    pub(crate) fn derive(&self, props: StyleProps) -> Self {
        if props == self.0.props {
            return self.clone();
        }
        self.catalog().intern(props)
    }

    /// Derives a style with a different font family.
    #[must_use]
    pub fn with_font_family(&self, family: &str) -> Self {
        self.with(StyleProperty::FontFamily(Rc::from(family)))
    }

    /// Derives a style with a different font size (millipoints).
    #[must_use]
    pub fn with_font_size(&self, size: i32) -> Self {
        self.with(StyleProperty::FontSize(size))
    }

    /// Derives a style with a different font weight.
    #[must_use]
    pub fn with_font_weight(&self, weight: u16) -> Self {
        self.with(StyleProperty::FontWeight(weight))
    }

    /// Derives a style with a different font slant.
    #[must_use]
    pub fn with_font_style(&self, style: FontStyle) -> Self {
        self.with(StyleProperty::FontStyle(style))
    }

    /// Derives a style with bold forced on, off, or inverted.
    #[must_use]
    pub fn with_bold(&self, toggle: TextToggle) -> Self {
        self.with(StyleProperty::Bold(toggle))
    }

    /// Derives a style with italic forced on, off, or inverted.
    #[must_use]
    pub fn with_italic(&self, toggle: TextToggle) -> Self {
        self.with(StyleProperty::Italic(toggle))
    }

    /// Derives a style with a different underline.
    #[must_use]
    pub fn with_underline(&self, underline: Underline) -> Self {
        self.with(StyleProperty::Underline(underline))
    }

    /// Derives a style with a different text color.
    #[must_use]
    pub fn with_fore_color(&self, color: Color) -> Self {
        self.with(StyleProperty::ForeColor(color))
    }

    /// Derives a style with a different background color.
    #[must_use]
    pub fn with_back_color(&self, color: Color) -> Self {
        self.with(StyleProperty::BackColor(color))
    }

    /// Derives a style with different margins.
    #[must_use]
    pub fn with_margins(&self, margins: Thickness) -> Self {
        self.with(StyleProperty::Margins(margins))
    }

    /// Derives a style with different borders.
    #[must_use]
    pub fn with_borders(&self, borders: Thickness) -> Self {
        self.with(StyleProperty::Borders(borders))
    }

    /// Derives a style with different padding.
    #[must_use]
    pub fn with_pads(&self, pads: Thickness) -> Self {
        self.with(StyleProperty::Pads(pads))
    }

    /// Derives a style with a different writing system.
    #[must_use]
    pub fn with_ws(&self, ws: WsId) -> Self {
        self.with(StyleProperty::Ws(ws))
    }

    /// Derives a style with a different base direction.
    #[must_use]
    pub fn with_right_to_left(&self, rtl: bool) -> Self {
        self.with(StyleProperty::RightToLeft(rtl))
    }

    /// Derives a style with a different line alignment.
    #[must_use]
    pub fn with_text_align(&self, align: TextAlign) -> Self {
        self.with(StyleProperty::TextAlign(align))
    }

    /// Font family name.
    pub fn font_family(&self) -> &str {
        &self.0.props.font_family
    }

    /// Font size in millipoints.
    pub fn font_size(&self) -> i32 {
        self.0.props.font_size
    }

    /// Font weight.
    pub fn font_weight(&self) -> u16 {
        self.0.props.font_weight
    }

    /// Font slant.
    pub fn font_style(&self) -> FontStyle {
        self.0.props.font_style
    }

    /// Underline decoration.
    pub fn underline(&self) -> Underline {
        self.0.props.underline
    }

    /// Underline color.
    pub fn underline_color(&self) -> Color {
        self.0.props.underline_color
    }

    /// Text color.
    pub fn fore_color(&self) -> Color {
        self.0.props.fore_color
    }

    /// Background color.
    pub fn back_color(&self) -> Color {
        self.0.props.back_color
    }

    /// Border color.
    pub fn border_color(&self) -> Color {
        self.0.props.border_color
    }

    /// Outer margins.
    pub fn margins(&self) -> Thickness {
        self.0.props.margins
    }

    /// Border widths.
    pub fn borders(&self) -> Thickness {
        self.0.props.borders
    }

    /// Padding.
    pub fn pads(&self) -> Thickness {
        self.0.props.pads
    }

    /// Writing system.
    pub fn ws(&self) -> WsId {
        self.0.props.ws
    }

    /// Whether paragraphs with this style run right to left.
    pub fn right_to_left(&self) -> bool {
        self.0.props.right_to_left
    }

    /// Exact line height in millipoints, zero for "as measured".
    pub fn line_height(&self) -> i32 {
        self.0.props.line_height
    }

    /// First line indent in millipoints.
    pub fn first_line_indent(&self) -> i32 {
        self.0.props.first_line_indent
    }

    /// Alignment of paragraph lines.
    pub fn text_align(&self) -> TextAlign {
        self.0.props.text_align
    }

    /// Name of the stylesheet style applied last, if any.
    pub fn style_name(&self) -> Option<&str> {
        self.0.props.style_name.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_derivations_are_interned() {
        let base = StyleCatalog::new().default_style();
        let a = base.with_font_weight(WEIGHT_BOLD).with_fore_color(Color::RED);
        let b = base.with_font_weight(WEIGHT_BOLD).with_fore_color(Color::RED);
        assert!(AssembledStyles::ptr_eq(&a, &b), "derivations were not interned");
        let c = base.with_fore_color(Color::RED).with_font_weight(WEIGHT_BOLD);
        assert!(AssembledStyles::ptr_eq(&a, &c), "order of derivation mattered");
    }

    #[test]
    fn derivation_does_not_mutate_parent() {
        let base = StyleCatalog::new().default_style();
        let big = base.with_font_size(24_000);
        assert_eq!(base.font_size(), DEFAULT_FONT_SIZE);
        assert_eq!(big.font_size(), 24_000);
    }

    #[test]
    fn no_op_derivation_returns_same_instance() {
        let base = StyleCatalog::new().default_style();
        let same = base.with_font_weight(WEIGHT_NORMAL);
        assert!(AssembledStyles::ptr_eq(&base, &same), "no-op allocated a new style");
    }

    #[test]
    fn invert_collapses_to_canonical_instance() {
        let base = StyleCatalog::new().default_style();
        let italic = base.with_italic(TextToggle::Invert);
        assert_eq!(italic.font_style(), FontStyle::Italic);
        let back = italic.with_italic(TextToggle::Invert);
        assert!(AssembledStyles::ptr_eq(&base, &back), "inverting twice did not collapse");

        let bold = base.with_bold(TextToggle::Invert);
        assert_eq!(bold.font_weight(), WEIGHT_BOLD);
        assert!(AssembledStyles::ptr_eq(
            &bold.with_bold(TextToggle::Invert),
            &base
        ), "bold invert did not collapse");
        assert!(AssembledStyles::ptr_eq(
            &bold.with_bold(TextToggle::ForceOn),
            &bold
        ), "force on of bold style changed it");
    }

    #[test]
    fn dropped_styles_leave_the_catalog() {
        let catalog = StyleCatalog::new();
        let base = catalog.default_style();
        {
            let _red = base.with_fore_color(Color::RED);
            assert_eq!(catalog.len(), 2);
        }
        assert_eq!(catalog.len(), 1);
    }

    #[test]
    fn default_styles_share_one_catalog() {
        let a = AssembledStyles::default().with_fore_color(Color::BLUE);
        let b = crate::RootOptions::default().style.with_fore_color(Color::BLUE);
        assert!(AssembledStyles::ptr_eq(&a, &b), "defaults came from different catalogs");

        let own = StyleCatalog::new().default_style().with_fore_color(Color::BLUE);
        assert_eq!(own, a);
        assert!(!AssembledStyles::ptr_eq(&own, &a), "a new catalog is separate");
    }
}
