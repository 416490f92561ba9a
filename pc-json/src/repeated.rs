// shared-core - bitdrift's common client/server libraries
// Copyright Bitdrift, Inc. All rights reserved.
//
// Use of this source code is governed by a source available license that can be found in the
// LICENSE file or at:
// https://polyformproject.org/wp-content/uploads/2020/06/PolyForm-Shield-1.0.0.txt

use crate::error::{Error, Result};
use crate::reader::value_kind;
use protobuf::MessageDyn;
use protobuf::reflect::{FieldDescriptor, ReflectValueBox, ReflectValueRef};
use serde_json::Value;

/// Ordered-sequence writer, parameterized by an element codec. JSON arrays
/// are self-delimited, so the sequence is framed by the host encoding's own
/// brackets with no element count.
pub(crate) fn write_elements<F>(
  field: &FieldDescriptor,
  message: &dyn MessageDyn,
  mut element_codec: F,
) -> Result<Value>
where
  F: FnMut(ReflectValueRef<'_>) -> Result<Value>,
{
  let elements = field.get_repeated(message);
  let mut out = Vec::with_capacity(elements.len());
  for index in 0 .. elements.len() {
    out.push(element_codec(elements.get(index))?);
  }
  Ok(Value::Array(out))
}

/// Ordered-sequence reader: decodes every element, then appends each one
/// through the field's append operation, preserving pre-existing elements.
pub(crate) fn read_elements<F>(
  field: &FieldDescriptor,
  value: &Value,
  message: &mut dyn MessageDyn,
  mut element_codec: F,
) -> Result<()>
where
  F: FnMut(&Value) -> Result<ReflectValueBox>,
{
  let Value::Array(items) = value else {
    return Err(Error::MalformedSequence {
      field: field.name().to_string(),
      detail: format!("expected an array, found {}", value_kind(value)),
    });
  };

  let mut decoded = Vec::with_capacity(items.len());
  for item in items {
    decoded.push(element_codec(item)?);
  }

  let mut target = field.mut_repeated(message);
  for element in decoded {
    target.push(element);
  }
  Ok(())
}
