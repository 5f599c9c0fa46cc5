// Copyright 2025 the SharpViews Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use super::utils::{strings, TestEnv};
use crate::model::Observable;
use crate::render::{BreakRequest, BreakResult, FixedWidthEngine, RenderEngine, Segment};
use crate::{ErrorKind, NavKey, Point, RootOptions, Selection, StringListOps};

fn single(text: &str, width: f64) -> TestEnv {
    TestEnv::editable(&strings(&[text]), width)
}

#[test]
fn left_never_splits_a_surrogate_pair() {
    let mut env = single("ol\u{10000}d ", 200.0);
    let para = env.para(0);
    env.root.select_at_end(para).unwrap();

    let mut offsets = Vec::new();
    while env.root.move_by_key(NavKey::Left, false) {
        offsets.push(env.root.selection().unwrap().as_ip().unwrap().offset());
    }
    assert_eq!(offsets, [7, 6, 2, 1, 0]);
}

#[test]
fn right_skips_diacritics() {
    let mut env = single("e\u{301}x", 200.0);
    env.root.select_at(env.para(0), 0, false).unwrap();
    assert!(env.root.move_by_key(NavKey::Right, false));
    env.assert_caret(0, 3);

    // An offset inside the cluster moves back to its start.
    env.root.select_at(env.para(0), 1, false).unwrap();
    env.assert_caret(0, 0);
}

#[test]
fn offsets_past_the_end_are_rejected() {
    let mut env = single("abc", 200.0);
    let err = env.root.select_at(env.para(0), 4, false).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidOffset);
    assert_eq!((err.offset(), err.text_len()), (Some(4), Some(3)));
}

#[test]
fn moves_cross_paragraphs_and_stop_at_the_ends() {
    let list = strings(&["ab", "cd"]);
    let mut env = TestEnv::editable(&list, 200.0);
    env.root.select_at_end(env.para(0)).unwrap();

    assert!(env.root.move_by_key(NavKey::Right, false));
    env.assert_caret(1, 0);
    assert!(env.root.move_by_key(NavKey::Left, false));
    env.assert_caret(0, 2);

    assert!(env.root.move_by_key(NavKey::DocEnd, false));
    env.assert_caret(1, 2);
    assert!(!env.root.move_by_key(NavKey::Right, false), "nothing after the end");
    assert!(env.root.move_by_key(NavKey::DocHome, false));
    env.assert_caret(0, 0);
    assert!(!env.root.move_by_key(NavKey::Left, false), "nothing before the start");
}

#[test]
fn left_and_right_collapse_a_range() {
    let mut env = single("This is the day", 300.0);
    let anchor = env.ip(0, 5, false);
    let end = env.ip(0, 7, true);
    env.root.select_range(anchor, end).unwrap();

    assert!(env.root.move_by_key(NavKey::Left, false));
    env.assert_caret(0, 5);

    env.root.select_range(anchor, end).unwrap();
    assert!(env.root.move_by_key(NavKey::Right, false));
    env.assert_caret(0, 7);
}

#[test]
fn shift_moves_extend_from_the_anchor() {
    let mut env = single("abcd", 200.0);
    env.root.select_at(env.para(0), 2, false).unwrap();
    assert!(env.root.move_by_key(NavKey::Right, true));
    assert!(env.root.move_by_key(NavKey::Right, true));
    let range = *env.root.selection().unwrap().as_range().unwrap();
    assert_eq!((range.anchor().offset(), range.drag_end().offset()), (2, 4));
    assert!(!range.end_before_anchor());

    assert!(env.root.move_by_key(NavKey::Home, true));
    let range = *env.root.selection().unwrap().as_range().unwrap();
    assert!(range.end_before_anchor());
    assert_eq!((range.start().offset(), range.end().offset()), (0, 2));

    // Extending back onto the anchor leaves a caret.
    assert!(env.root.move_by_key(NavKey::Right, true));
    assert!(env.root.move_by_key(NavKey::Right, true));
    env.assert_caret(0, 2);
}

#[test]
fn contains_respects_associate_previous_at_the_ends() {
    let list = strings(&["first", "", "third"]);
    let mut env = TestEnv::editable(&list, 200.0);
    env.root
        .select_range(env.ip(0, 2, false), env.ip(2, 3, true))
        .unwrap();
    let range = *env.root.selection().unwrap().as_range().unwrap();

    assert!(range.contains(&env.root, &env.ip(0, 2, false)));
    assert!(!range.contains(&env.root, &env.ip(0, 2, true)));
    assert!(!range.contains(&env.root, &env.ip(0, 1, false)));
    assert!(range.contains(&env.root, &env.ip(1, 0, false)), "the empty middle paragraph");
    assert!(range.contains(&env.root, &env.ip(2, 3, true)));
    assert!(!range.contains(&env.root, &env.ip(2, 3, false)));
    assert!(!range.contains(&env.root, &env.ip(2, 4, true)));
}

#[test]
fn up_and_down_keep_the_column() {
    // Lines of "This is the day." at width 110 are "This is the " and "day.".
    let list = strings(&["This is the day.", "", "abcdefghijk"]);
    let mut env = TestEnv::editable(&list, 110.0);
    let at_e = env.offset_of(0, "e d");
    env.root.select_at(env.para(0), at_e, false).unwrap();

    // The second line is too short, so the caret goes to its end.
    assert!(env.root.move_by_key(NavKey::Down, false));
    env.assert_caret(0, 16);
    // The empty paragraph has a line of its own.
    assert!(env.root.move_by_key(NavKey::Down, false));
    env.assert_caret(1, 0);
    // Back at full length the original column is found again.
    assert!(env.root.move_by_key(NavKey::Down, false));
    env.assert_caret(2, at_e);

    assert!(env.root.move_by_key(NavKey::Up, false));
    assert!(env.root.move_by_key(NavKey::Up, false));
    assert!(env.root.move_by_key(NavKey::Up, false));
    env.assert_caret(0, at_e);
    assert!(!env.root.move_by_key(NavKey::Up, false), "already on the first line");
}

#[test]
fn word_moves() {
    let mut env = single("one two three", 300.0);
    env.root.select_at(env.para(0), 0, false).unwrap();
    assert!(env.root.move_by_key(NavKey::WordRight, false));
    env.assert_caret(0, 4);
    assert!(env.root.move_by_key(NavKey::WordRight, false));
    env.assert_caret(0, 8);
    assert!(env.root.move_by_key(NavKey::WordLeft, false));
    env.assert_caret(0, 4);
    assert!(env.root.move_by_key(NavKey::End, false));
    env.assert_caret(0, 13);
}

#[test]
fn clicks_hit_the_nearer_half_of_a_character() {
    let mut env = single("This is the day.", 110.0);
    let para = env.para(0);

    let ip = env.root.get_selection_at(Point::new(42.0, 4.0)).unwrap();
    assert_eq!((ip.para(), ip.offset(), ip.associate_previous()), (para, 4, false));
    let ip = env.root.get_selection_at(Point::new(48.0, 4.0)).unwrap();
    assert_eq!((ip.offset(), ip.associate_previous()), (5, true));
    // Below the text the last line is used.
    let ip = env.root.get_selection_at(Point::new(12.0, 100.0)).unwrap();
    assert_eq!(ip.offset(), 13);

    assert!(env.root.select_at_point(Point::new(2.0, 4.0), false));
    assert!(env.root.select_at_point(Point::new(38.0, 4.0), true));
    let range = *env.root.selection().unwrap().as_range().unwrap();
    assert_eq!((range.start().offset(), range.end().offset()), (0, 4));
    assert_eq!(env.root.selected_text().as_deref(), Some("This"));
}

#[test]
fn double_click_selects_a_word() {
    let mut env = single("This is the day", 300.0);
    assert!(env.root.select_word_at(Point::new(55.0, 8.0)));
    assert_eq!(env.root.selected_text().as_deref(), Some("is"));
    let rects = env.root.selection_rects();
    assert_eq!(rects.len(), 1);
    assert_eq!((rects[0].x0, rects[0].x1), (50.0, 70.0));
}

#[test]
fn installing_a_selection_repaints_old_and_new() {
    let mut env = single("abcdef", 200.0);
    env.root.select_at(env.para(0), 1, false).unwrap();
    env.log().invalidated.clear();
    env.root.select_at(env.para(0), 5, false).unwrap();

    let invalidated = env.log().invalidated.clone();
    assert!(invalidated.iter().any(|rect| rect.contains(Point::new(10.0, 8.0))));
    assert!(invalidated.iter().any(|rect| rect.contains(Point::new(50.0, 8.0))));
    let caret = env.root.caret_rect().unwrap();
    assert_eq!((caret.x0, caret.y0, caret.y1), (50.0, 0.0, 16.0));
}

#[test]
fn edits_elsewhere_keep_the_caret_in_range() {
    let text = Observable::new(String::from("abcdef"));
    let mut env = TestEnv::new();
    env.root.build(|view| {
        view.add_paragraph(|para| {
            para.add_string(&text);
        });
    });
    env.root.layout(200.0);
    env.root.select_at_end(env.para(0)).unwrap();

    text.set(String::from("ab"));
    env.root.process_notifications();
    assert_eq!(env.root.selection(), Some(&Selection::Ip(env.ip(0, 2, true))));
}

#[test]
fn flags_move_and_delete_as_one_character() {
    let list = strings(&["a\u{1F1FA}\u{1F1F8}b"]);
    let mut env = TestEnv::editable(&list, 300.0);
    env.root.select_at_end(env.para(0)).unwrap();
    assert!(env.root.move_by_key(NavKey::Left, false));
    env.assert_caret(0, 9);
    assert!(env.root.move_by_key(NavKey::Left, false));
    env.assert_caret(0, 1);

    env.root.select_at(env.para(0), 9, false).unwrap();
    env.root.backspace().unwrap();
    assert_eq!(list.get(0).unwrap().get(), "ab");
    env.assert_caret(0, 1);
}

#[test]
fn outside_edits_snap_the_caret_to_a_character_boundary() {
    let list = strings(&["ab"]);
    let mut env = TestEnv::editable(&list, 200.0);
    env.root.select_at(env.para(0), 1, false).unwrap();

    // Offset 1 now falls inside the two bytes of "é".
    list.get(0).unwrap().set(String::from("\u{e9}a"));
    env.root.process_notifications();
    env.assert_caret(0, 0);

    assert!(env.root.move_by_key(NavKey::Right, false));
    env.assert_caret(0, 2);
    env.root.insert_text("x").unwrap();
    assert_eq!(list.get(0).unwrap().get(), "\u{e9}xa");
}

/// Wraps [`FixedWidthEngine`], refusing insertion points inside "ch".
struct DigraphEngine(FixedWidthEngine);

#[derive(Debug)]
struct DigraphSegment {
    inner: Box<dyn Segment>,
    rejected: Vec<usize>,
}

impl RenderEngine for DigraphEngine {
    fn find_break_point(&self, request: &BreakRequest<'_>) -> BreakResult {
        let mut result = self.0.find_break_point(request);
        let rejected = request
            .source
            .rendered_text()
            .match_indices("ch")
            .map(|(at, _)| at + 1)
            .collect();
        result.segment = result
            .segment
            .map(|inner| Box::new(DigraphSegment { inner, rejected }) as Box<dyn Segment>);
        result
    }
}

impl Segment for DigraphSegment {
    fn ich_min(&self) -> usize {
        self.inner.ich_min()
    }

    fn ich_lim(&self) -> usize {
        self.inner.ich_lim()
    }

    fn width(&self) -> f64 {
        self.inner.width()
    }

    fn ascent(&self) -> f64 {
        self.inner.ascent()
    }

    fn descent(&self) -> f64 {
        self.inner.descent()
    }

    fn is_valid_ip(&self, ich: usize) -> bool {
        !self.rejected.contains(&ich) && self.inner.is_valid_ip(ich)
    }

    fn position_of_ip(&self, ich: usize, associate_previous: bool) -> Option<f64> {
        self.inner.position_of_ip(ich, associate_previous)
    }

    fn point_to_char(&self, x: f64) -> (usize, bool) {
        self.inner.point_to_char(x)
    }

    fn range_extent(&self, min: usize, lim: usize) -> Option<(f64, f64)> {
        self.inner.range_extent(min, lim)
    }
}

#[test]
fn segments_can_refuse_insertion_points() {
    let list = strings(&["achb"]);
    let mut env = TestEnv::with_engine(RootOptions::default(), DigraphEngine(FixedWidthEngine::default()));
    env.root.build(|view| {
        view.add_editable_sequence(&list, StringListOps, |view, item: &Observable<String>| {
            view.add_paragraph(|para| {
                para.add_string(item);
            });
        });
    });
    env.root.layout(200.0);

    env.root.select_at(env.para(0), 1, false).unwrap();
    assert!(env.root.move_by_key(NavKey::Right, false));
    env.assert_caret(0, 3);
    assert!(env.root.move_by_key(NavKey::Left, false));
    env.assert_caret(0, 1);

    env.root.select_at(env.para(0), 2, false).unwrap();
    env.assert_caret(0, 1);
    // The first half of "h" is a hit between "c" and "h".
    let ip = env.root.get_selection_at(Point::new(21.0, 4.0)).unwrap();
    assert_eq!(ip.offset(), 1);
}
