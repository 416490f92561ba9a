// shared-core - bitdrift's common client/server libraries
// Copyright Bitdrift, Inc. All rights reserved.
//
// Use of this source code is governed by a source available license that can be found in the
// LICENSE file or at:
// https://polyformproject.org/wp-content/uploads/2020/06/PolyForm-Shield-1.0.0.txt

#[cfg(test)]
#[path = "./classify_test.rs"]
mod classify_test;

use crate::error::{Result, SchemaError};
use crate::{FieldSlot, MessageSchema, OneofGroup, RepeatedField, is_none_case, lookup_key};
use protobuf::reflect::{MessageDescriptor, RuntimeFieldType};
use std::collections::HashMap;
use std::collections::hash_map::Entry;

/// Partitions a message type's fields into normal, repeated, discriminator
/// and alternative shapes. Pure function of the descriptor; runs once per
/// type, after which the registry memoizes the result.
pub fn classify(descriptor: &MessageDescriptor) -> Result<MessageSchema> {
  // Discriminators first. Alternatives are recognized through their owning
  // oneof, so the groups must be fully enumerated before the field walk.
  let mut groups = Vec::new();
  for oneof in descriptor.oneofs() {
    let cases: Vec<_> = oneof.fields().collect();
    // A proto3 `optional` field is wrapped in a synthetic single-field
    // oneof; those stay ordinary fields.
    if cases.iter().any(|case| case.containing_oneof().is_none()) {
      continue;
    }
    if cases.is_empty() {
      return Err(SchemaError::EmptyOneof {
        message: descriptor.full_name().to_string(),
        oneof: oneof.name().to_string(),
      });
    }
    for case in &cases {
      if is_none_case(case.name()) {
        return Err(SchemaError::ReservedCaseName {
          message: descriptor.full_name().to_string(),
          field: case.name().to_string(),
        });
      }
    }
    groups.push(OneofGroup { oneof, cases });
  }

  let mut normal = Vec::new();
  let mut repeated = Vec::new();
  for field in descriptor.fields() {
    if field.containing_oneof().is_some() {
      // Collected above as an alternative of its group.
      continue;
    }
    match field.runtime_field_type() {
      RuntimeFieldType::Map(..) => {
        return Err(SchemaError::UnsupportedMapField {
          message: descriptor.full_name().to_string(),
          field: field.name().to_string(),
        });
      },
      RuntimeFieldType::Repeated(element) => repeated.push(RepeatedField { field, element }),
      RuntimeFieldType::Singular(_) => normal.push(field),
    }
  }

  // The slots must partition the wire namespace: every name resolves to
  // exactly one of the four shapes.
  let mut slots = HashMap::new();
  for (index, field) in normal.iter().enumerate() {
    claim(&mut slots, descriptor, field.name(), FieldSlot::Normal(index))?;
  }
  for (index, repeated_field) in repeated.iter().enumerate() {
    claim(
      &mut slots,
      descriptor,
      repeated_field.field.name(),
      FieldSlot::Repeated(index),
    )?;
  }
  for (group, oneof_group) in groups.iter().enumerate() {
    claim(
      &mut slots,
      descriptor,
      oneof_group.name(),
      FieldSlot::Discriminator(group),
    )?;
    for (case, case_field) in oneof_group.cases.iter().enumerate() {
      claim(
        &mut slots,
        descriptor,
        case_field.name(),
        FieldSlot::Alternative { group, case },
      )?;
    }
  }

  Ok(MessageSchema {
    descriptor: descriptor.clone(),
    normal,
    repeated,
    groups,
    slots,
  })
}

fn claim(
  slots: &mut HashMap<String, FieldSlot>,
  descriptor: &MessageDescriptor,
  name: &str,
  slot: FieldSlot,
) -> Result<()> {
  match slots.entry(lookup_key(name)) {
    Entry::Vacant(entry) => {
      entry.insert(slot);
      Ok(())
    },
    Entry::Occupied(_) => Err(SchemaError::AmbiguousFieldName {
      message: descriptor.full_name().to_string(),
      name: name.to_string(),
    }),
  }
}
