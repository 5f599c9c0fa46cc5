// Copyright 2025 the SharpViews Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use std::cell::RefCell;
use std::rc::Rc;

use super::utils::{strings, TestEnv};
use crate::model::{Observable, ObservableList};
use crate::style::{NamedStyle, StyleProperty, Stylesheet, TextProps, TextToggle};
use crate::text::RichString;
use crate::{BoxType, RootOptions};

fn plain_env(list: &ObservableList<Observable<String>>) -> TestEnv {
    let mut env = TestEnv::new();
    env.root.build(|view| {
        view.add_sequence(list, |view, item: &Observable<String>| {
            view.add_paragraph(|para| {
                para.add_string(item);
            });
        });
    });
    env.root.layout(200.0);
    env
}

#[test]
fn list_changes_rebuild_the_paragraphs() {
    let list = strings(&["a", "b", "c"]);
    let mut env = plain_env(&list);
    assert_eq!(env.texts(), ["a", "b", "c"]);

    list.insert(1, Observable::new(String::from("new")));
    list.remove(3..4);
    env.root.process_notifications();

    assert_eq!(env.texts(), ["a", "new", "b"]);
    assert_eq!(env.root.box_rect(env.para(2)).unwrap().y0, 32.0);
    assert_eq!(env.root.size().height, 48.0);

    list.splice(0..3, vec![Observable::new(String::from("only"))]);
    env.root.process_notifications();
    assert_eq!(env.texts(), ["only"]);
    assert_eq!(env.root.size().height, 16.0);
}

#[test]
fn removed_items_stop_listening() {
    let list = strings(&["a", "b", "c"]);
    let mut env = plain_env(&list);
    let removed = list.get(1).unwrap();
    let kept = list.get(2).unwrap();
    assert_eq!(removed.listener_count(), 1);

    list.remove(1..2);
    env.root.process_notifications();

    assert_eq!(removed.listener_count(), 0);
    assert_eq!(kept.listener_count(), 1);
    // Changing the removed item no longer reaches the root.
    removed.set(String::from("gone"));
    env.root.process_notifications();
    assert_eq!(env.texts(), ["a", "c"]);

    drop(env);
    assert_eq!(list.listener_count(), 0);
    assert_eq!(kept.listener_count(), 0);
}

#[test]
fn removing_the_selected_paragraph_clears_the_selection() {
    let list = strings(&["a", "b"]);
    let mut env = plain_env(&list);
    env.root.select_at(env.para(1), 1, true).unwrap();

    list.remove(0..1);
    env.root.process_notifications();
    assert!(env.root.selection().is_some(), "the selected paragraph survives");

    list.remove(0..1);
    env.root.process_notifications();
    assert!(env.root.selection().is_none());
}

#[test]
fn deferred_tasks_run_in_order_after_notifications() {
    let list = strings(&["a"]);
    let mut env = plain_env(&list);
    let seen = Rc::new(RefCell::new(Vec::new()));

    let log = seen.clone();
    env.root.perform_after_notifications(move |root| {
        // The pending list change has been applied by now.
        log.borrow_mut().push(format!("first {}", root.paragraphs().len()));
        let log = log.clone();
        root.perform_after_notifications(move |_| log.borrow_mut().push(String::from("queued")));
    });
    let log = seen.clone();
    env.root
        .perform_after_notifications(move |_| log.borrow_mut().push(String::from("second")));
    list.push(Observable::new(String::from("b")));

    env.root.process_notifications();
    assert_eq!(*seen.borrow(), ["first 2", "second", "queued"]);
}

#[test]
fn named_styles_reach_the_rich_text_export() {
    let mut stylesheet = Stylesheet::new();
    stylesheet.insert(NamedStyle::new("Loud").with(StyleProperty::Bold(TextToggle::ForceOn)));
    let mut env = TestEnv::with_options(RootOptions {
        stylesheet: Some(stylesheet),
        ..RootOptions::default()
    });
    let text = Observable::new(
        RichString::new("quiet ", TextProps::default()).push("loud", TextProps::named("Loud")),
    );
    env.root.build(|view| {
        view.add_paragraph(|para| {
            para.add_rich(&text);
        });
    });
    env.root.layout(300.0);
    assert_eq!(env.root.box_type(env.para(0)).unwrap(), BoxType::Para);

    assert!(env.root.select_all());
    assert!(env.root.copy());

    let clipboard = env.log().clipboard.clone().unwrap();
    assert_eq!(clipboard.text(), "quiet loud");
    let rtf = clipboard.rtf().unwrap();
    assert!(rtf.contains("{\\*\\cs1 Loud;}"), "{rtf}");
    assert!(rtf.contains("\\b loud}"), "{rtf}");
    assert!(!rtf.contains("\\b quiet"), "{rtf}");
}
