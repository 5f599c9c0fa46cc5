// Copyright 2025 the SharpViews Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use super::utils::TestEnv;
use crate::model::Observable;
use crate::style::Color;
use crate::{BoxType, ColumnWidth, ErrorKind};

#[test]
fn lines_break_after_spaces() {
    let text = Observable::new(String::from("This is the day."));
    let mut env = TestEnv::new();
    env.root.build(|view| {
        view.add_paragraph(|para| {
            para.add_string(&text);
        });
    });
    env.root.layout(110.0);

    let lines = env.root.lines(env.para(0)).unwrap();
    let ranges: Vec<_> = lines.iter().map(|line| line.text_range.clone()).collect();
    assert_eq!(ranges, [0..12, 12..16]);
    assert_eq!(lines[1].rect.y0, 16.0, "second line starts below the first");
    assert_eq!(env.root.size().height, 32.0);
}

#[test]
fn typing_that_wraps_grows_by_one_line() {
    let text = Observable::new(String::from("This is the day."));
    let mut env = TestEnv::new();
    env.root.build(|view| {
        view.add_paragraph(|para| {
            para.add_string(&text);
        });
    });
    env.root.layout(110.0);
    let para = env.para(0);
    let before = env.root.box_rect(para).unwrap();
    env.log().sizes.clear();

    env.root.select_at_end(para).unwrap();
    env.root.insert_text(" We will be").unwrap();

    assert_eq!(text.get(), "This is the day. We will be");
    let after = env.root.box_rect(para).unwrap();
    assert_eq!(after.height() - before.height(), 16.0, "exactly one more line");
    let sizes = env.log().sizes.clone();
    assert_eq!(sizes.len(), 1, "one size notification: {sizes:?}");
    assert_eq!(sizes[0].height, 48.0);
    env.assert_caret(0, text.get().len());
}

#[test]
fn relayout_leaves_other_paragraphs_alone() {
    let middle = Observable::new(String::from("two"));
    let mut env = TestEnv::new();
    env.root.build(|view| {
        view.add_paragraph(|para| {
            para.add_literal("one");
        });
        view.add_paragraph(|para| {
            para.add_string(&middle);
        });
        view.add_paragraph(|para| {
            para.add_literal("three");
        });
    });
    env.root.layout(200.0);
    env.log().invalidated.clear();

    middle.set(String::from("too"));
    env.root.process_notifications();

    let invalidated = env.log().invalidated.clone();
    assert!(!invalidated.is_empty(), "the changed line is repainted");
    for rect in &invalidated {
        assert!(
            rect.y0 >= 16.0 && rect.y1 <= 32.0,
            "{rect:?} reaches outside the middle paragraph"
        );
    }
    assert_eq!(env.root.size().height, 48.0);
}

#[test]
fn longer_paragraph_moves_the_following_ones() {
    let first = Observable::new(String::from("short"));
    let mut env = TestEnv::new();
    env.root.build(|view| {
        view.add_paragraph(|para| {
            para.add_string(&first);
        });
        view.add_paragraph(|para| {
            para.add_literal("below");
        });
    });
    env.root.layout(100.0);
    assert_eq!(env.root.box_rect(env.para(1)).unwrap().y0, 16.0);

    first.set(String::from("now it wraps"));
    env.root.process_notifications();

    assert_eq!(env.root.box_rect(env.para(1)).unwrap().y0, 32.0);
    let invalidated = env.log().invalidated.clone();
    assert!(
        invalidated.iter().any(|rect| rect.y0 <= 16.0 && rect.y1 >= 32.0),
        "the old place of the moved paragraph is repainted: {invalidated:?}"
    );
}

#[test]
fn rows_put_fixed_columns_first() {
    let mut env = TestEnv::new();
    let mut block = None;
    env.root.build(|view| {
        view.add_row(&[ColumnWidth::Fixed(72_000), ColumnWidth::Share(1)], |row| {
            block = Some(row.add_block(0, 7_500, Color::RED));
            row.add_paragraph(|para| {
                para.add_literal("right");
            });
        });
    });
    env.root.layout(200.0);

    let block = block.unwrap();
    let block_rect = env.root.box_rect(block).unwrap();
    assert_eq!(block_rect.width(), 96.0, "one inch at 96 dpi");
    assert_eq!(block_rect.height(), 10.0);
    assert_eq!(env.root.block_color(block).unwrap(), Color::RED);
    let para_rect = env.root.box_rect(env.para(0)).unwrap();
    assert_eq!(para_rect.x0, 96.0);
    let row = env.root.container(block).unwrap().unwrap();
    assert_eq!(env.root.box_type(row).unwrap(), BoxType::Row);
}

#[test]
fn embedded_boxes_sit_on_the_baseline() {
    let mut env = TestEnv::new();
    env.root.build(|view| {
        view.add_paragraph(|para| {
            para.add_literal("ab")
                .add_embedded_block(15_000, 7_500, Color::BLUE)
                .add_literal("cd");
        });
    });
    env.root.layout(200.0);

    let para = env.para(0);
    let children = env.root.children(para).unwrap();
    assert_eq!(children.len(), 1);
    let rect = env.root.box_rect(children[0]).unwrap();
    assert_eq!((rect.x0, rect.width()), (20.0, 20.0));
    assert_eq!(rect.y1, 12.0, "bottom of the block is on the baseline");
    assert_eq!(env.root.container(children[0]).unwrap(), Some(para));
}

#[test]
fn geometry_needs_a_layout() {
    let mut env = TestEnv::new();
    env.root.build(|view| {
        view.add_paragraph(|para| {
            para.add_literal("not yet");
        });
    });
    let para = env.para(0);
    assert!(!env.root.is_laid_out());
    assert_eq!(env.root.box_rect(para).unwrap_err().kind(), ErrorKind::NotLaidOut);
    assert_eq!(env.root.lines(para).unwrap_err().kind(), ErrorKind::NotLaidOut);
}
