// Copyright 2025 the SharpViews Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Character classification used to decide where an insertion point may stop.

use alloc::vec::Vec;
use core::ops::Range;

use icu_properties::props::GeneralCategory;
use icu_properties::CodePointMapData;
use icu_segmenter::options::WordBreakInvariantOptions;
use icu_segmenter::{GraphemeClusterSegmenter, WordSegmenter};

/// Returns true for combining marks, which stay glued to the preceding base
/// character.
pub(crate) fn is_diacritic(ch: char) -> bool {
    matches!(
        CodePointMapData::<GeneralCategory>::new().get(ch),
        GeneralCategory::NonspacingMark | GeneralCategory::EnclosingMark | GeneralCategory::SpacingMark
    )
}

/// Every offset of `text` an insertion point may be placed at, ascending.
///
/// These are the grapheme cluster boundaries that are not followed by a
/// combining mark. A mark with no base character starts a cluster of its
/// own, but the caret still does not stop in front of it.
pub(crate) fn ip_boundaries(text: &str) -> Vec<usize> {
    let mut boundaries: Vec<usize> = GraphemeClusterSegmenter::new()
        .segment_str(text)
        .filter(|&offset| {
            offset == 0
                || offset == text.len()
                || !text[offset..].chars().next().is_some_and(is_diacritic)
        })
        .collect();
    if boundaries.first() != Some(&0) {
        boundaries.insert(0, 0);
    }
    if boundaries.last() != Some(&text.len()) {
        boundaries.push(text.len());
    }
    boundaries
}

/// Returns true if an insertion point may be placed at `offset`.
///
/// Positions inside a grapheme cluster, and so inside a UTF-8 sequence, and
/// positions in front of a combining mark are rejected.
pub(crate) fn is_ip_boundary(text: &str, offset: usize) -> bool {
    if offset == 0 || offset == text.len() {
        return true;
    }
    if offset > text.len() || !text.is_char_boundary(offset) {
        return false;
    }
    ip_boundaries(text).binary_search(&offset).is_ok()
}

/// The closest insertion point boundary before `offset`.
pub(crate) fn prev_ip(text: &str, offset: usize) -> Option<usize> {
    ip_boundaries(text)
        .into_iter()
        .rev()
        .find(|&boundary| boundary < offset)
}

/// The closest insertion point boundary after `offset`.
pub(crate) fn next_ip(text: &str, offset: usize) -> Option<usize> {
    ip_boundaries(text)
        .into_iter()
        .find(|&boundary| boundary > offset)
}

/// Moves `offset` back to the nearest valid insertion point at or before it.
pub(crate) fn snap_ip(text: &str, offset: usize) -> usize {
    let offset = offset.min(text.len());
    ip_boundaries(text)
        .into_iter()
        .rev()
        .find(|&boundary| boundary <= offset)
        .unwrap_or(0)
}

/// Word boundaries of `text`, including `0` and `text.len()`.
pub(crate) fn word_boundaries(text: &str) -> Vec<usize> {
    if text.is_empty() {
        return vec![0];
    }
    let segmenter = WordSegmenter::new_for_non_complex_scripts(WordBreakInvariantOptions::default());
    let mut boundaries: Vec<usize> = segmenter.segment_str(text).collect();
    if boundaries.first() != Some(&0) {
        boundaries.insert(0, 0);
    }
    if boundaries.last() != Some(&text.len()) {
        boundaries.push(text.len());
    }
    boundaries
}

fn is_word_like(segment: &str) -> bool {
    segment.chars().any(char::is_alphanumeric)
}

/// The word segment containing `offset`.
///
/// At the end of the text the last segment is returned. When `offset`
/// falls on whitespace directly after a word, the word is preferred so that
/// double-clicking just after a word selects that word.
pub(crate) fn word_at(text: &str, offset: usize) -> Range<usize> {
    let boundaries = word_boundaries(text);
    let mut segments = boundaries.windows(2).map(|w| w[0]..w[1]);
    let Some(mut found) = segments.clone().find(|r| r.contains(&offset)) else {
        return segments.next_back().unwrap_or(0..0);
    };
    if !is_word_like(&text[found.clone()]) && found.start == offset {
        if let Some(prev) = boundaries
            .windows(2)
            .map(|w| w[0]..w[1])
            .find(|r| r.end == offset)
        {
            if is_word_like(&text[prev.clone()]) {
                found = prev;
            }
        }
    }
    found
}

/// The start of the next word after `offset`, or the end of the text.
pub(crate) fn next_word_start(text: &str, offset: usize) -> usize {
    let boundaries = word_boundaries(text);
    boundaries
        .windows(2)
        .filter(|w| w[0] > offset && is_word_like(&text[w[0]..w[1]]))
        .map(|w| w[0])
        .next()
        .unwrap_or(text.len())
}

/// The start of the word before `offset`, or `0`.
pub(crate) fn prev_word_start(text: &str, offset: usize) -> usize {
    let boundaries = word_boundaries(text);
    boundaries
        .windows(2)
        .filter(|w| w[0] < offset && is_word_like(&text[w[0]..w[1]]))
        .map(|w| w[0])
        .next_back()
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diacritics_are_glued() {
        let text = "ca\u{0301}t";
        assert!(!is_ip_boundary(text, 2), "stopped between base and diacritic");
        assert_eq!(next_ip(text, 1), Some(4));
        assert_eq!(prev_ip(text, 4), Some(1));
    }

    #[test]
    fn astral_characters_are_not_split() {
        let text = "ol\u{10000}d ";
        assert_eq!(prev_ip(text, 6), Some(2));
        assert_eq!(next_ip(text, 2), Some(6));
        assert!(!is_ip_boundary(text, 3), "stopped inside a code point");
    }

    #[test]
    fn clusters_are_not_split() {
        // A flag is two regional indicators of four bytes each.
        let flag = "a\u{1F1FA}\u{1F1F8}b";
        assert_eq!(prev_ip(flag, 9), Some(1));
        assert_eq!(next_ip(flag, 1), Some(9));
        assert!(!is_ip_boundary(flag, 5), "stopped between regional indicators");
        assert_eq!(snap_ip(flag, 5), 1);

        let family = "\u{1F469}\u{200D}\u{1F467}!";
        assert_eq!(next_ip(family, 0), Some(family.len() - 1));

        let crlf = "a\r\nb";
        assert_eq!(next_ip(crlf, 1), Some(3));
        assert!(!is_ip_boundary(crlf, 2), "stopped inside CR LF");

        // Conjoining jamo form one syllable.
        let jamo = "\u{1100}\u{1161}\u{11A8}";
        assert_eq!(ip_boundaries(jamo), [0, jamo.len()]);
    }

    #[test]
    fn words_are_found() {
        let text = "This is the day";
        assert_eq!(word_at(text, 6), 5..7);
        assert_eq!(word_at(text, 7), 5..7);
        assert_eq!(next_word_start(text, 0), 5);
        assert_eq!(prev_word_start(text, 8), 5);
        assert_eq!(prev_word_start(text, 5), 0);
    }
}
