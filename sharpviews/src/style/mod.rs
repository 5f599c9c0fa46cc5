// Copyright 2025 the SharpViews Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Style model: immutable, interned text and paragraph formatting.

mod assembled;
mod setter;
mod stylesheet;

use alloc::rc::Rc;

pub use self::assembled::{AssembledStyles, StyleCatalog};
pub use self::setter::PropertySetter;
pub use self::stylesheet::{NamedStyle, Stylesheet, TextProps};

/// An sRGB color packed as `0xAARRGGBB`.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
pub struct Color(pub u32);

impl Color {
    /// Fully transparent.
    pub const TRANSPARENT: Self = Self(0x0000_0000);
    /// Opaque black.
    pub const BLACK: Self = Self(0xFF00_0000);
    /// Opaque white.
    pub const WHITE: Self = Self(0xFFFF_FFFF);
    /// Opaque red.
    pub const RED: Self = Self(0xFFFF_0000);
    /// Opaque green.
    pub const GREEN: Self = Self(0xFF00_8000);
    /// Opaque blue.
    pub const BLUE: Self = Self(0xFF00_00FF);

    /// Creates an opaque color from its components.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self(0xFF00_0000 | (r as u32) << 16 | (g as u32) << 8 | b as u32)
    }

    /// Returns the `(red, green, blue)` components.
    pub const fn components(self) -> (u8, u8, u8) {
        (
            (self.0 >> 16) as u8,
            (self.0 >> 8) as u8,
            self.0 as u8,
        )
    }

    /// Returns true if the color has no coverage at all.
    pub const fn is_transparent(self) -> bool {
        self.0 >> 24 == 0
    }
}

/// Identifies a writing system (language plus script conventions).
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default, PartialOrd, Ord)]
pub struct WsId(pub u32);

/// Slant of the font.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
pub enum FontStyle {
    /// Upright glyphs.
    #[default]
    Normal,
    /// Italic glyphs.
    Italic,
}

/// Underline decoration.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
pub enum Underline {
    /// No underline.
    #[default]
    None,
    /// A single solid line.
    Single,
    /// Two solid lines.
    Double,
    /// A dotted line.
    Dotted,
    /// A dashed line.
    Dashed,
    /// A wavy line, as used for spelling errors.
    Squiggle,
}

/// Horizontal alignment of the lines of a paragraph.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
pub enum TextAlign {
    /// Aligned to the start edge (left for left-to-right paragraphs).
    #[default]
    Leading,
    /// Centered.
    Center,
    /// Aligned to the end edge.
    Trailing,
}

/// How a boolean text property (bold, italic) is changed by a derivation.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum TextToggle {
    /// Turn the property off.
    ForceOff,
    /// Turn the property on.
    ForceOn,
    /// Flip the inherited value.
    Invert,
}

/// Widths of the four edges of a box, in millipoints.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
pub struct Thickness {
    /// Left edge.
    pub left: i32,
    /// Top edge.
    pub top: i32,
    /// Right edge.
    pub right: i32,
    /// Bottom edge.
    pub bottom: i32,
}

impl Thickness {
    /// The same thickness on all four edges.
    pub const fn uniform(mp: i32) -> Self {
        Self {
            left: mp,
            top: mp,
            right: mp,
            bottom: mp,
        }
    }

    /// Returns true if every edge is zero.
    pub const fn is_zero(&self) -> bool {
        self.left == 0 && self.top == 0 && self.right == 0 && self.bottom == 0
    }
}

/// Normal font weight.
pub const WEIGHT_NORMAL: u16 = 400;
/// Bold font weight.
pub const WEIGHT_BOLD: u16 = 700;

/// Default font size, in millipoints.
pub const DEFAULT_FONT_SIZE: i32 = 10_000;

/// A single formatting property.
///
/// Properties are applied to an [`AssembledStyles`] to derive a new style.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub enum StyleProperty {
    /// Font family name.
    FontFamily(Rc<str>),
    /// Font size in millipoints.
    FontSize(i32),
    /// Font weight (400 normal, 700 bold).
    FontWeight(u16),
    /// Font slant.
    FontStyle(FontStyle),
    /// Toggle of the bold habit.
    Bold(TextToggle),
    /// Toggle of the italic habit.
    Italic(TextToggle),
    /// Underline decoration.
    Underline(Underline),
    /// Underline color.
    UnderlineColor(Color),
    /// Foreground (text) color.
    ForeColor(Color),
    /// Background color.
    BackColor(Color),
    /// Border color.
    BorderColor(Color),
    /// Outer margins of a box.
    Margins(Thickness),
    /// Border widths of a box.
    Borders(Thickness),
    /// Padding inside the borders of a box.
    Pads(Thickness),
    /// Writing system of the text.
    Ws(WsId),
    /// Base direction of a paragraph.
    RightToLeft(bool),
    /// Exact line height in millipoints; zero means "as measured".
    LineHeight(i32),
    /// Indentation of the first line of a paragraph in millipoints.
    FirstLineIndent(i32),
    /// Alignment of paragraph lines.
    TextAlign(TextAlign),
    /// Name of the stylesheet style that produced this formatting.
    StyleName(Option<Rc<str>>),
}
