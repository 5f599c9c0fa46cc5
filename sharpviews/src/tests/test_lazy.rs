// Copyright 2025 the SharpViews Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use super::utils::{strings, TestEnv};
use crate::model::{Observable, ObservableList};
use crate::{BoxId, BoxType, RootOptions, StringListOps};

/// A root with one lazy sequence of `list`, items estimated at one line.
fn lazy_env(list: &ObservableList<Observable<String>>) -> (TestEnv, BoxId) {
    let mut env = TestEnv::with_options(RootOptions {
        default_lazy_item_height: 16.0,
        ..RootOptions::default()
    });
    let mut sequence = None;
    env.root.build(|view| {
        sequence = Some(view.add_lazy_sequence(
            list,
            Some(std::rc::Rc::new(StringListOps)),
            |view, item: &Observable<String>| {
                view.add_paragraph(|para| {
                    para.add_string(item);
                });
            },
        ));
    });
    env.root.layout(200.0);
    (env, sequence.unwrap())
}

fn kinds(env: &TestEnv, container: BoxId) -> Vec<BoxType> {
    env.root
        .children(container)
        .unwrap()
        .into_iter()
        .map(|id| env.root.box_type(id).unwrap())
        .collect()
}

fn six() -> ObservableList<Observable<String>> {
    strings(&["zero", "one", "two", "three", "four", "five"])
}

#[test]
fn nothing_is_built_before_painting() {
    let list = six();
    let (env, sequence) = lazy_env(&list);
    assert_eq!(kinds(&env, sequence), [BoxType::Lazy]);
    let lazy = env.root.children(sequence).unwrap()[0];
    assert_eq!(env.root.lazy_item_count(lazy).unwrap(), 6);
    assert_eq!(env.root.size().height, 96.0, "six estimated items");
    assert!(env.root.paragraphs().is_empty());
}

#[test]
fn painting_the_top_builds_only_visible_items() {
    let list = six();
    let (mut env, sequence) = lazy_env(&list);

    env.root.prepare_to_paint(0.0, 32.0);

    assert_eq!(kinds(&env, sequence), [BoxType::Para, BoxType::Para, BoxType::Lazy]);
    assert_eq!(env.texts(), ["zero", "one"]);
    let lazy = env.root.children(sequence).unwrap()[2];
    assert_eq!(env.root.lazy_item_count(lazy).unwrap(), 4);
    assert_eq!(env.root.box_rect(lazy).unwrap().y0, 32.0);
    assert_eq!(env.log().lazy_deltas, [0.0], "the estimate was exact");
}

#[test]
fn painting_the_middle_splits_the_lazy_box() {
    let list = six();
    let (mut env, sequence) = lazy_env(&list);

    env.root.prepare_to_paint(40.0, 56.0);

    assert_eq!(
        kinds(&env, sequence),
        [BoxType::Lazy, BoxType::Para, BoxType::Para, BoxType::Lazy]
    );
    assert_eq!(env.texts(), ["two", "three"]);
    let children = env.root.children(sequence).unwrap();
    assert_eq!(env.root.lazy_item_count(children[0]).unwrap(), 2);
    assert_eq!(env.root.lazy_item_count(children[3]).unwrap(), 2);

    // Painting everything leaves no lazy box behind.
    env.root.prepare_to_paint(0.0, 96.0);
    assert_eq!(env.texts(), ["zero", "one", "two", "three", "four", "five"]);
    assert!(kinds(&env, sequence).iter().all(|kind| *kind == BoxType::Para));
}

#[test]
fn list_changes_inside_a_lazy_run_stay_lazy() {
    let list = six();
    let (mut env, sequence) = lazy_env(&list);

    list.insert(3, Observable::new(String::from("inserted")));
    env.root.process_notifications();

    assert_eq!(kinds(&env, sequence), [BoxType::Lazy]);
    let lazy = env.root.children(sequence).unwrap()[0];
    assert_eq!(env.root.lazy_item_count(lazy).unwrap(), 7);

    list.remove(0..2);
    env.root.process_notifications();
    assert_eq!(env.root.lazy_item_count(lazy).unwrap(), 5);
    assert_eq!(env.root.size().height, 80.0);
}

#[test]
fn list_changes_next_to_built_items() {
    let list = six();
    let (mut env, sequence) = lazy_env(&list);
    env.root.prepare_to_paint(0.0, 16.0);
    assert_eq!(kinds(&env, sequence), [BoxType::Para, BoxType::Lazy]);

    // Inserting at a built item builds the new item too.
    list.insert(0, Observable::new(String::from("first")));
    env.root.process_notifications();
    assert_eq!(kinds(&env, sequence), [BoxType::Para, BoxType::Para, BoxType::Lazy]);
    assert_eq!(env.texts(), ["first", "zero"]);

    // Removing built and lazy items together keeps the rest lazy.
    list.remove(1..3);
    env.root.process_notifications();
    assert_eq!(kinds(&env, sequence), [BoxType::Para, BoxType::Lazy]);
    let lazy = env.root.children(sequence).unwrap()[1];
    assert_eq!(env.root.lazy_item_count(lazy).unwrap(), 4);
}

#[test]
fn merging_with_an_item_that_is_still_lazy() {
    let list = six();
    let (mut env, sequence) = lazy_env(&list);
    env.root.prepare_to_paint(0.0, 16.0);
    env.root.select_at_end(env.para(0)).unwrap();

    // The merged text comes from item 1, which has never been built.
    env.root.delete_forward().unwrap();

    assert_eq!(list.get(0).unwrap().get(), "zeroone");
    env.assert_caret(0, 4);
    let children = env.root.children(sequence).unwrap();
    assert_eq!(env.root.lazy_item_count(*children.last().unwrap()).unwrap(), 4);
}
