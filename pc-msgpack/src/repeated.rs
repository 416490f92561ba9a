// shared-core - bitdrift's common client/server libraries
// Copyright Bitdrift, Inc. All rights reserved.
//
// Use of this source code is governed by a source available license that can be found in the
// LICENSE file or at:
// https://polyformproject.org/wp-content/uploads/2020/06/PolyForm-Shield-1.0.0.txt

use crate::error::{Error, Result};
use protobuf::MessageDyn;
use protobuf::reflect::{FieldDescriptor, ReflectValueBox, ReflectValueRef};
use rmp::{decode, encode};

/// Count-prefixed ordered-sequence writer, parameterized by an element
/// codec: the element count goes first, then exactly that many encoded
/// elements, no terminator.
#[allow(clippy::cast_possible_truncation)]
pub(crate) fn write_elements<F>(
  out: &mut Vec<u8>,
  field: &FieldDescriptor,
  message: &dyn MessageDyn,
  mut element_codec: F,
) -> Result<()>
where
  F: FnMut(&mut Vec<u8>, ReflectValueRef<'_>) -> Result<()>,
{
  let elements = field.get_repeated(message);
  encode::write_array_len(out, elements.len() as u32)?;
  for index in 0 .. elements.len() {
    element_codec(out, elements.get(index))?;
  }
  Ok(())
}

/// Count-prefixed reader: consumes exactly the promised number of elements,
/// appending each through the field's append operation. A stream that ends
/// early is a malformed sequence.
pub(crate) fn read_elements<F>(
  input: &mut &[u8],
  field: &FieldDescriptor,
  message: &mut dyn MessageDyn,
  mut element_codec: F,
) -> Result<()>
where
  F: FnMut(&mut &[u8]) -> Result<ReflectValueBox>,
{
  let expected = decode::read_array_len(input).map_err(|error| match error {
    decode::ValueReadError::TypeMismatch(marker) => Error::MalformedSequence {
      field: field.name().to_string(),
      detail: format!("expected an array header, found {marker:?}"),
    },
    _ => Error::MalformedSequence {
      field: field.name().to_string(),
      detail: "truncated array header".to_string(),
    },
  })?;

  let mut decoded = Vec::with_capacity(expected.min(1024) as usize);
  for index in 0 .. expected {
    decoded.push(element_codec(input).map_err(|error| match error {
      Error::Truncated => Error::MalformedSequence {
        field: field.name().to_string(),
        detail: format!("stream ended at element {index} of {expected}"),
      },
      other => other,
    })?);
  }

  let mut target = field.mut_repeated(message);
  for element in decoded {
    target.push(element);
  }
  Ok(())
}
