// shared-core - bitdrift's common client/server libraries
// Copyright Bitdrift, Inc. All rights reserved.
//
// Use of this source code is governed by a source available license that can be found in the
// LICENSE file or at:
// https://polyformproject.org/wp-content/uploads/2020/06/PolyForm-Shield-1.0.0.txt

#![deny(
  clippy::expect_used,
  clippy::panic,
  clippy::todo,
  clippy::unimplemented,
  clippy::unreachable,
  clippy::unwrap_used
)]

pub mod error;
pub mod registry;

mod classify;

pub use crate::classify::classify;
pub use crate::error::{Result, SchemaError};
pub use crate::registry::SchemaRegistry;

use protobuf::MessageDyn;
use protobuf::reflect::{FieldDescriptor, MessageDescriptor, OneofDescriptor, RuntimeType};
use std::collections::HashMap;

/// Reserved discriminator value meaning "no alternative is populated".
pub const ONEOF_NONE_CASE: &str = "none";

/// Normalizes a wire field name for schema lookup: ASCII-lowercased with `_`
/// separators removed, so `string_field`, `stringField` and `StringField`
/// all address the same slot.
#[must_use]
pub fn lookup_key(name: &str) -> String {
  name
    .chars()
    .filter(|c| *c != '_')
    .map(|c| c.to_ascii_lowercase())
    .collect()
}

#[must_use]
pub fn is_none_case(name: &str) -> bool {
  lookup_key(name) == ONEOF_NONE_CASE
}

//
// FieldSlot
//

// Where a wire field name lands within a classified schema. Indices point
// into the schema's field groups.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FieldSlot {
  Normal(usize),
  Repeated(usize),
  Discriminator(usize),
  Alternative { group: usize, case: usize },
}

//
// RepeatedField
//

/// An ordered, appendable sequence-valued field. The append operation is
/// `FieldDescriptor::mut_repeated(..).push(..)`.
pub struct RepeatedField {
  pub field: FieldDescriptor,
  pub element: RuntimeType,
}

//
// OneofGroup
//

/// A discriminated union of alternative fields. The group's name doubles as
/// the discriminator's wire name; which alternative is populated is derived
/// from the message contents and never stored separately.
pub struct OneofGroup {
  pub oneof: OneofDescriptor,
  pub cases: Vec<FieldDescriptor>,
}

impl OneofGroup {
  #[must_use]
  pub fn name(&self) -> &str {
    self.oneof.name()
  }

  /// Case lookup by wire name, any casing.
  #[must_use]
  pub fn case_by_name(&self, name: &str) -> Option<(usize, &FieldDescriptor)> {
    let key = lookup_key(name);
    self
      .cases
      .iter()
      .enumerate()
      .find(|(_, case)| lookup_key(case.name()) == key)
  }

  /// The populated alternative, if any.
  #[must_use]
  pub fn active_case<'a>(&'a self, message: &dyn MessageDyn) -> Option<&'a FieldDescriptor> {
    self.cases.iter().find(|case| case.has_field(message))
  }
}

//
// MessageSchema
//

/// A message type's fields, partitioned once into normal, repeated,
/// discriminator and alternative shapes. Immutable after construction;
/// instances are memoized per type by the registry.
pub struct MessageSchema {
  descriptor: MessageDescriptor,
  normal: Vec<FieldDescriptor>,
  repeated: Vec<RepeatedField>,
  groups: Vec<OneofGroup>,
  slots: HashMap<String, FieldSlot>,
}

impl MessageSchema {
  #[must_use]
  pub fn descriptor(&self) -> &MessageDescriptor {
    &self.descriptor
  }

  #[must_use]
  pub fn message_name(&self) -> &str {
    self.descriptor.full_name()
  }

  /// Plain scalar and nested-message fields, declaration order.
  #[must_use]
  pub fn normal_fields(&self) -> &[FieldDescriptor] {
    &self.normal
  }

  #[must_use]
  pub fn repeated_fields(&self) -> &[RepeatedField] {
    &self.repeated
  }

  #[must_use]
  pub fn oneof_groups(&self) -> &[OneofGroup] {
    &self.groups
  }

  /// Resolves a wire field name, any casing, to its slot.
  #[must_use]
  pub fn slot(&self, wire_name: &str) -> Option<FieldSlot> {
    self.slots.get(&lookup_key(wire_name)).copied()
  }
}
