// shared-core - bitdrift's common client/server libraries
// Copyright Bitdrift, Inc. All rights reserved.
//
// Use of this source code is governed by a source available license that can be found in the
// LICENSE file or at:
// https://polyformproject.org/wp-content/uploads/2020/06/PolyForm-Shield-1.0.0.txt

use super::{SchemaRegistry, global};
use pc_test_protos::test_messages::{ElitReply, IpsumReply, LoremRequest};
use pretty_assertions::assert_eq;
use protobuf::MessageFull;
use std::sync::{Arc, Barrier};
use std::thread;

#[test]
fn memoizes_schemas_per_type() {
  let registry = SchemaRegistry::new();

  let first = registry.get_or_build(&LoremRequest::descriptor()).unwrap();
  let second = registry.get_or_build(&LoremRequest::descriptor()).unwrap();

  assert!(Arc::ptr_eq(&first, &second));
  assert_eq!(1, registry.len());
}

#[test]
fn registries_are_independent() {
  let left = SchemaRegistry::new();
  let right = SchemaRegistry::new();

  let from_left = left.get_or_build(&LoremRequest::descriptor()).unwrap();
  let from_right = right.get_or_build(&LoremRequest::descriptor()).unwrap();

  assert!(!Arc::ptr_eq(&from_left, &from_right));
}

#[test]
fn concurrent_first_access_observes_one_schema() {
  let registry = Arc::new(SchemaRegistry::new());
  let barrier = Arc::new(Barrier::new(8));

  let handles: Vec<_> = (0 .. 8)
    .map(|_| {
      let registry = registry.clone();
      let barrier = barrier.clone();
      thread::spawn(move || {
        barrier.wait();
        registry.get_or_build(&IpsumReply::descriptor()).unwrap()
      })
    })
    .collect();

  let schemas: Vec<_> = handles
    .into_iter()
    .map(|handle| handle.join().unwrap())
    .collect();
  for schema in &schemas[1 ..] {
    assert!(Arc::ptr_eq(&schemas[0], schema));
  }
  assert_eq!(1, registry.len());
}

#[test]
fn classification_failures_are_not_cached() {
  let registry = SchemaRegistry::new();

  assert!(registry.get_or_build(&ElitReply::descriptor()).is_err());
  assert!(registry.is_empty());
  // Deterministic classification: the retry fails the same way.
  assert!(registry.get_or_build(&ElitReply::descriptor()).is_err());
}

#[test]
fn global_registry_is_shared() {
  let first = global().get_or_build(&LoremRequest::descriptor()).unwrap();
  let second = global().get_or_build(&LoremRequest::descriptor()).unwrap();
  assert!(Arc::ptr_eq(&first, &second));
}
