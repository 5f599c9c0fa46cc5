// Copyright 2025 the SharpViews Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Rich text format export.

use alloc::string::String;
use alloc::vec::Vec;
use core::fmt::{Arguments, Write};

use crate::style::{AssembledStyles, Color, FontStyle, Underline};

/// Index of `value` in `table`, adding it if needed.
fn intern<T: PartialEq>(table: &mut Vec<T>, value: T) -> usize {
    match table.iter().position(|v| *v == value) {
        Some(index) => index,
        None => {
            table.push(value);
            table.len() - 1
        }
    }
}

/// Appends formatted text. Writing to a `String` cannot fail.
fn push_fmt(out: &mut String, args: Arguments<'_>) {
    out.write_fmt(args).unwrap_or(());
}

fn escape(out: &mut String, text: &str) {
    for ch in text.chars() {
        match ch {
            '\\' | '{' | '}' => {
                out.push('\\');
                out.push(ch);
            }
            '\t' => out.push_str("\\tab "),
            ' '..='~' => out.push(ch),
            _ => {
                let mut units = [0_u16; 2];
                for unit in ch.encode_utf16(&mut units) {
                    // RTF takes signed 16-bit code units.
                    push_fmt(out, format_args!("\\u{}?", *unit as i16));
                }
            }
        }
    }
}

fn underline_word(underline: Underline) -> Option<&'static str> {
    match underline {
        Underline::None => None,
        Underline::Single => Some("\\ul"),
        Underline::Double => Some("\\uldb"),
        Underline::Dotted => Some("\\uld"),
        Underline::Dashed => Some("\\uldash"),
        Underline::Squiggle => Some("\\ulwave"),
    }
}

/// Renders styled paragraphs as RTF.
///
/// Each paragraph is a list of `(text, style)` pieces. Fonts, colors and
/// named styles are collected into the font table, the color table and the
/// stylesheet, and every piece becomes a group referring to them by index.
/// Font sizes are written in half points.
pub fn export_rtf(paragraphs: &[Vec<(String, AssembledStyles)>]) -> String {
    let mut fonts: Vec<&str> = Vec::new();
    let mut colors: Vec<Color> = Vec::new();
    let mut names: Vec<&str> = Vec::new();
    for (_, style) in paragraphs.iter().flatten() {
        intern(&mut fonts, style.font_family());
        intern(&mut colors, style.fore_color());
        if !style.back_color().is_transparent() {
            intern(&mut colors, style.back_color());
        }
        if let Some(name) = style.style_name() {
            intern(&mut names, name);
        }
    }

    let mut out = String::from("{\\rtf1\\ansi\\deff0\n{\\fonttbl");
    for (index, font) in fonts.iter().enumerate() {
        push_fmt(&mut out, format_args!("{{\\f{index} "));
        escape(&mut out, font);
        out.push_str(";}");
    }
    out.push_str("}\n{\\colortbl;");
    for color in &colors {
        let (r, g, b) = color.components();
        push_fmt(&mut out, format_args!("\\red{r}\\green{g}\\blue{b};"));
    }
    out.push_str("}\n{\\stylesheet{\\s0 Normal;}");
    for (index, name) in names.iter().enumerate() {
        push_fmt(&mut out, format_args!("{{\\*\\cs{} ", index + 1));
        escape(&mut out, name);
        out.push_str(";}");
    }
    out.push_str("}\n");

    for paragraph in paragraphs {
        out.push_str("\\pard\\plain ");
        for (text, style) in paragraph {
            out.push('{');
            if let Some(name) = style.style_name() {
                push_fmt(&mut out, format_args!("\\cs{}", intern(&mut names, name) + 1));
            }
            push_fmt(
                &mut out,
                format_args!(
                    "\\f{}\\fs{}\\cf{}",
                    intern(&mut fonts, style.font_family()),
                    style.font_size() / 500,
                    intern(&mut colors, style.fore_color()) + 1
                ),
            );
            if !style.back_color().is_transparent() {
                let index = intern(&mut colors, style.back_color()) + 1;
                push_fmt(&mut out, format_args!("\\highlight{index}"));
            }
            if style.font_weight() >= 600 {
                out.push_str("\\b");
            }
            if style.font_style() == FontStyle::Italic {
                out.push_str("\\i");
            }
            if let Some(word) = underline_word(style.underline()) {
                out.push_str(word);
            }
            out.push(' ');
            escape(&mut out, text);
            out.push('}');
        }
        out.push_str("\\par\n");
    }
    out.push('}');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::{StyleCatalog, TextToggle};

    #[test]
    fn tables_collect_distinct_entries() {
        let plain = StyleCatalog::new().default_style().with_font_family("Arial");
        let bold = plain.with_bold(TextToggle::ForceOn).with_fore_color(Color::RED);
        let rtf = export_rtf(&[vec![
            (String::from("a{b}"), plain.clone()),
            (String::from("c"), bold),
            (String::from("\u{e9}"), plain),
        ]]);
        assert!(rtf.starts_with("{\\rtf1"), "missing header: {rtf}");
        assert_eq!(rtf.matches("\\f0 Arial;").count(), 1, "fonts are listed once: {rtf}");
        assert!(rtf.contains("\\red255\\green0\\blue0;"), "red missing: {rtf}");
        assert!(rtf.contains("a\\{b\\}"), "braces not escaped: {rtf}");
        assert!(rtf.contains("\\cf2\\b c"), "bold red run: {rtf}");
        assert!(rtf.contains("\\u233?"), "non-ASCII not escaped: {rtf}");
        assert!(rtf.ends_with("\\par\n}"), "missing trailer: {rtf}");
    }
}
