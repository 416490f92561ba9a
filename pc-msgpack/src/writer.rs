// shared-core - bitdrift's common client/server libraries
// Copyright Bitdrift, Inc. All rights reserved.
//
// Use of this source code is governed by a source available license that can be found in the
// LICENSE file or at:
// https://polyformproject.org/wp-content/uploads/2020/06/PolyForm-Shield-1.0.0.txt

use crate::error::Result;
use crate::{MsgpackCodec, repeated};
use pc_schema::{MessageSchema, ONEOF_NONE_CASE, OneofGroup};
use protobuf::MessageDyn;
use protobuf::reflect::{FieldDescriptor, ReflectValueRef, RuntimeFieldType, RuntimeType};
use rmp::encode;

// One planned map entry. An active oneof contributes the discriminator and
// the alternative, so it spans two wire entries.
enum Entry<'a> {
  Normal(&'a FieldDescriptor),
  Repeated(&'a FieldDescriptor),
  OneofNone(&'a OneofGroup),
  OneofCase(&'a OneofGroup, &'a FieldDescriptor),
}

impl Entry<'_> {
  fn width(&self) -> u32 {
    match self {
      Self::OneofCase(..) => 2,
      _ => 1,
    }
  }
}

pub(crate) fn write_message(
  codec: &MsgpackCodec,
  out: &mut Vec<u8>,
  message: &dyn MessageDyn,
) -> Result<()> {
  let descriptor = message.descriptor_dyn();
  let schema = codec.registry().get_or_build(&descriptor)?;

  // The map header carries the entry count, so the plan is fixed before
  // anything is written.
  let plan = plan_entries(codec, &schema, message);
  encode::write_map_len(out, plan.iter().map(Entry::width).sum())?;

  for entry in plan {
    match entry {
      Entry::Normal(field) => {
        write_str(out, field.name())?;
        write_singular(codec, out, field, message)?;
      },
      Entry::Repeated(field) => {
        write_str(out, field.name())?;
        repeated::write_elements(out, field, message, |out, element| {
          write_value(codec, out, element)
        })?;
      },
      Entry::OneofNone(group) => {
        write_str(out, group.name())?;
        write_str(out, ONEOF_NONE_CASE)?;
      },
      Entry::OneofCase(group, case) => {
        // Discriminator value, then the alternative's own entry, in that
        // order; readers consume the pair together.
        write_str(out, group.name())?;
        write_str(out, case.name())?;
        write_str(out, case.name())?;
        match case.get_singular(message) {
          Some(value) => write_value(codec, out, value)?,
          None => encode::write_nil(out)?,
        }
      },
    }
  }
  Ok(())
}

fn plan_entries<'a>(
  codec: &MsgpackCodec,
  schema: &'a MessageSchema,
  message: &dyn MessageDyn,
) -> Vec<Entry<'a>> {
  let skip_defaults = codec.skip_defaults();
  let mut plan = Vec::new();

  for field in schema.normal_fields() {
    if skip_defaults && !field.has_field(message) {
      continue;
    }
    plan.push(Entry::Normal(field));
  }
  for repeated_field in schema.repeated_fields() {
    if skip_defaults && repeated_field.field.get_repeated(message).is_empty() {
      continue;
    }
    plan.push(Entry::Repeated(&repeated_field.field));
  }
  for group in schema.oneof_groups() {
    match group.active_case(message) {
      Some(case) => plan.push(Entry::OneofCase(group, case)),
      None if skip_defaults => {},
      None => plan.push(Entry::OneofNone(group)),
    }
  }

  plan
}

fn write_singular(
  codec: &MsgpackCodec,
  out: &mut Vec<u8>,
  field: &FieldDescriptor,
  message: &dyn MessageDyn,
) -> Result<()> {
  match field.runtime_field_type() {
    RuntimeFieldType::Singular(RuntimeType::Message(_)) => match field.get_singular(message) {
      Some(value) => write_value(codec, out, value),
      // Only reachable with skip_defaults off.
      None => {
        encode::write_nil(out)?;
        Ok(())
      },
    },
    _ => write_value(codec, out, field.get_singular_field_or_default(message)),
  }
}

#[allow(clippy::cast_possible_truncation)]
pub(crate) fn write_value(
  codec: &MsgpackCodec,
  out: &mut Vec<u8>,
  value: ReflectValueRef<'_>,
) -> Result<()> {
  match value {
    ReflectValueRef::Bool(value) => {
      encode::write_bool(out, value)?;
    },
    ReflectValueRef::I32(value) => {
      encode::write_sint(out, i64::from(value))?;
    },
    ReflectValueRef::I64(value) => {
      encode::write_sint(out, value)?;
    },
    ReflectValueRef::U32(value) => {
      encode::write_uint(out, u64::from(value))?;
    },
    ReflectValueRef::U64(value) => {
      encode::write_uint(out, value)?;
    },
    ReflectValueRef::F32(value) => {
      encode::write_f32(out, value)?;
    },
    ReflectValueRef::F64(value) => {
      encode::write_f64(out, value)?;
    },
    ReflectValueRef::String(value) => {
      encode::write_str(out, value)?;
    },
    ReflectValueRef::Bytes(value) => {
      encode::write_bin_len(out, value.len() as u32)?;
      out.extend_from_slice(value);
    },
    // Enums travel as their numeric value; names are accepted on read.
    ReflectValueRef::Enum(_, number) => {
      encode::write_sint(out, i64::from(number))?;
    },
    ReflectValueRef::Message(message) => {
      write_message(codec, out, &*message)?;
    },
  }
  Ok(())
}

fn write_str(out: &mut Vec<u8>, value: &str) -> Result<()> {
  encode::write_str(out, value)?;
  Ok(())
}
