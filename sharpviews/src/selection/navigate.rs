// Copyright 2025 the SharpViews Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Keyboard navigation.

use super::hit::line_index;
use super::{InsertionPoint, Selection};
use crate::boxes::BoxId;
use crate::root::RootBox;
use crate::text::chars;

/// A navigation key.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum NavKey {
    /// One character back.
    Left,
    /// One character forward.
    Right,
    /// To the start of the previous word.
    WordLeft,
    /// To the start of the next word.
    WordRight,
    /// To the start of the paragraph.
    Home,
    /// To the end of the paragraph.
    End,
    /// To the start of the document.
    DocHome,
    /// To the end of the document.
    DocEnd,
    /// One line up.
    Up,
    /// One line down.
    Down,
}

impl RootBox {
    /// Moves the caret, or the drag end of the selection when `extend` is
    /// set, as `key` asks.
    ///
    /// Left and Right collapse a range to its start or end. Up and Down
    /// aim for the horizontal position the first of a series of vertical
    /// moves started from. Returns false if nothing moved, as at the ends
    /// of the document.
    pub fn move_by_key(&mut self, key: NavKey, extend: bool) -> bool {
        let Some(selection) = self.selection else {
            return false;
        };
        if let (Selection::Range(range), false, NavKey::Left | NavKey::Right) = (&selection, extend, key) {
            let ip = if key == NavKey::Left {
                range.start()
            } else {
                range.end()
            };
            self.install_selection(Some(Selection::Ip(ip)));
            return true;
        }
        let (anchor, focus) = match selection {
            Selection::Ip(ip) => (ip, ip),
            Selection::Range(range) => (range.anchor(), range.drag_end()),
        };
        let vertical = matches!(key, NavKey::Up | NavKey::Down);
        let target_x = if vertical {
            self.up_down_x
                .or_else(|| self.ip_rect(&focus).map(|rect| rect.x0))
        } else {
            None
        };
        let moved = match (key, target_x) {
            (NavKey::Up | NavKey::Down, Some(x)) => self.vertical_move(focus, key == NavKey::Down, x),
            (NavKey::Up | NavKey::Down, None) => None,
            _ => self.horizontal_move(focus, key),
        };
        let Some(moved) = moved else {
            return false;
        };
        let selection = if extend {
            self.make_range(anchor, moved)
        } else {
            Selection::Ip(moved)
        };
        self.install_selection(Some(selection));
        if vertical {
            self.up_down_x = target_x;
        }
        true
    }

    fn para_len(&self, para: BoxId) -> usize {
        self.tree[para].para().map_or(0, |data| data.source.logical_len())
    }

    fn para_start(para: BoxId) -> InsertionPoint {
        InsertionPoint::new(para, 0, false)
    }

    fn para_end(&self, para: BoxId) -> InsertionPoint {
        InsertionPoint::new(para, self.para_len(para), true)
    }

    fn horizontal_move(&self, ip: InsertionPoint, key: NavKey) -> Option<InsertionPoint> {
        let para = ip.para;
        let data = self.tree.get(para)?.para()?;
        let text = data.source.logical_text();
        let at_start = ip.offset == 0;
        let at_end = ip.offset >= text.len();
        let previous = || self.adjacent_para(para, false).map(|p| self.para_end(p));
        let next = || self.adjacent_para(para, true).map(Self::para_start);
        match key {
            NavKey::Left => match data.prev_ip(ip.offset) {
                Some(offset) if !at_start => Some(InsertionPoint::new(para, offset, false)),
                _ => previous(),
            },
            NavKey::Right => match data.next_ip(ip.offset) {
                Some(offset) if !at_end => Some(InsertionPoint::new(para, offset, true)),
                _ => next(),
            },
            NavKey::WordLeft if at_start => previous(),
            NavKey::WordLeft => Some(InsertionPoint::new(
                para,
                chars::prev_word_start(text, ip.offset),
                false,
            )),
            NavKey::WordRight if at_end => next(),
            NavKey::WordRight => {
                let offset = chars::next_word_start(text, ip.offset);
                Some(InsertionPoint::new(para, offset, offset == text.len()))
            }
            NavKey::Home => Some(Self::para_start(para)),
            NavKey::End => Some(self.para_end(para)),
            NavKey::DocHome => self.paragraphs().first().map(|&p| Self::para_start(p)),
            NavKey::DocEnd => self.paragraphs().last().map(|&p| self.para_end(p)),
            NavKey::Up | NavKey::Down => None,
        }
    }

    /// The insertion point on the line above or below `ip` closest to `x`,
    /// in root coordinates. Paragraphs without lines are skipped.
    fn vertical_move(&self, ip: InsertionPoint, down: bool, x: f64) -> Option<InsertionPoint> {
        let node = self.tree.get(ip.para)?;
        let para = node.para()?;
        let ren = para.source.log_to_ren(ip.offset);
        let current = line_index(&para.lines, ren, ip.associate_previous)?;
        let (target, line) = if down && current + 1 < para.lines.len() {
            (ip.para, current + 1)
        } else if !down && current > 0 {
            (ip.para, current - 1)
        } else {
            let mut candidate = ip.para;
            loop {
                candidate = self.adjacent_para(candidate, down)?;
                let count = self.tree[candidate].para().map_or(0, |data| data.lines.len());
                if count > 0 && self.tree[candidate].laid_out {
                    break (candidate, if down { 0 } else { count - 1 });
                }
            }
        };
        let data = self.tree[target].para()?;
        let origin = self.tree.origin_in_root(target);
        let (ren, associate_previous) = data.lines[line].hit(x - origin.x);
        let offset = data.snap_ip(data.source.ren_to_log(ren));
        Some(InsertionPoint::new(target, offset, associate_previous && offset > 0))
    }
}
