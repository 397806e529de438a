// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::borrow::Borrow;
use std::collections::HashMap;

#[test]
fn define_id_new_and_as_str() {
    let id = RunId::new("abc");
    assert_eq!(id.as_str(), "abc");
}

#[test]
fn define_id_display() {
    let id = RunbookId::new("hello");
    assert_eq!(format!("{}", id), "hello");
    assert_eq!(id.to_string(), "hello");
}

#[test]
fn define_id_from_string() {
    let id: ScheduleId = String::from("owned").into();
    assert_eq!(id.as_str(), "owned");
}

#[test]
fn define_id_partial_eq_str() {
    let id = AlertId::new("test");
    assert_eq!(id, *"test");
    assert_eq!(id, "test");
}

#[test]
fn define_id_borrow_str() {
    let id = RuleId::new("key");
    let borrowed: &str = id.borrow();
    assert_eq!(borrowed, "key");
}

#[test]
fn define_id_hash_map_lookup() {
    let mut map = HashMap::new();
    map.insert(RunId::new("k"), 42);
    assert_eq!(map.get("k"), Some(&42));
}

#[test]
fn define_id_short_truncates() {
    let id = SnapshotId::new("0123456789");
    assert_eq!(id.short(4), "0123");
    assert_eq!(id.short(20), "0123456789");
}

#[test]
fn uuid_id_gen_unique() {
    let gen = UuidIdGen;
    assert_ne!(gen.next(), gen.next());
}

#[test]
fn sequential_id_gen_counts_up() {
    let gen = SequentialIdGen::new("run");
    assert_eq!(gen.next(), "run-1");
    assert_eq!(gen.next(), "run-2");
}

#[test]
fn short_id_on_str() {
    assert_eq!("abcdef".short(3), "abc");
    assert_eq!("ab".short(3), "ab");
}
