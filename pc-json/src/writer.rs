// shared-core - bitdrift's common client/server libraries
// Copyright Bitdrift, Inc. All rights reserved.
//
// Use of this source code is governed by a source available license that can be found in the
// LICENSE file or at:
// https://polyformproject.org/wp-content/uploads/2020/06/PolyForm-Shield-1.0.0.txt

use crate::error::Result;
use crate::{JsonCodec, repeated};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use pc_schema::ONEOF_NONE_CASE;
use protobuf::MessageDyn;
use protobuf::reflect::{FieldDescriptor, ReflectValueRef, RuntimeFieldType, RuntimeType};
use serde_json::{Map, Number, Value};

pub(crate) fn write_message(codec: &JsonCodec, message: &dyn MessageDyn) -> Result<Value> {
  let descriptor = message.descriptor_dyn();
  let schema = codec.registry().get_or_build(&descriptor)?;
  let naming = codec.naming();

  let mut entries = Map::new();
  for field in schema.normal_fields() {
    entries.insert(
      naming.field_key(field),
      write_singular(codec, field, message)?,
    );
  }
  for repeated_field in schema.repeated_fields() {
    let value = repeated::write_elements(&repeated_field.field, message, |element| {
      write_value(codec, element)
    })?;
    entries.insert(naming.field_key(&repeated_field.field), value);
  }
  for group in schema.oneof_groups() {
    match group.active_case(message) {
      None => {
        entries.insert(
          naming.oneof_key(&group.oneof),
          Value::String(ONEOF_NONE_CASE.to_string()),
        );
      },
      Some(case) => {
        // The alternative's name and value follow the discriminator
        // directly; readers consume the pair in order.
        let case_key = naming.field_key(case);
        entries.insert(
          naming.oneof_key(&group.oneof),
          Value::String(case_key.clone()),
        );
        let value = match case.get_singular(message) {
          Some(value) => write_value(codec, value)?,
          None => Value::Null,
        };
        entries.insert(case_key, value);
      },
    }
  }

  Ok(Value::Object(entries))
}

fn write_singular(
  codec: &JsonCodec,
  field: &FieldDescriptor,
  message: &dyn MessageDyn,
) -> Result<Value> {
  match field.runtime_field_type() {
    RuntimeFieldType::Singular(RuntimeType::Message(_)) => match field.get_singular(message) {
      Some(value) => write_value(codec, value),
      // Unset nested messages are written explicitly; readers leave the
      // field unset when they see null.
      None => Ok(Value::Null),
    },
    _ => write_value(codec, field.get_singular_field_or_default(message)),
  }
}

pub(crate) fn write_value(codec: &JsonCodec, value: ReflectValueRef<'_>) -> Result<Value> {
  Ok(match value {
    ReflectValueRef::Bool(value) => Value::Bool(value),
    ReflectValueRef::I32(value) => Value::Number(Number::from(value)),
    ReflectValueRef::I64(value) => Value::Number(Number::from(value)),
    ReflectValueRef::U32(value) => Value::Number(Number::from(value)),
    ReflectValueRef::U64(value) => Value::Number(Number::from(value)),
    ReflectValueRef::F32(value) => float_value(f64::from(value)),
    ReflectValueRef::F64(value) => float_value(value),
    ReflectValueRef::String(value) => Value::String(value.to_string()),
    ReflectValueRef::Bytes(value) => Value::String(BASE64.encode(value)),
    ReflectValueRef::Enum(descriptor, number) => match descriptor.value_by_number(number) {
      Some(value) => Value::String(value.name().to_string()),
      // Open enums: unknown numbers survive as numbers.
      None => Value::Number(Number::from(number)),
    },
    ReflectValueRef::Message(message) => write_message(codec, &*message)?,
  })
}

// Non-finite floats have no JSON number form; the protobuf JSON mapping
// spells them as strings.
fn float_value(value: f64) -> Value {
  if value.is_nan() {
    Value::String("NaN".to_string())
  } else if value.is_infinite() {
    Value::String(if value > 0.0 { "Infinity" } else { "-Infinity" }.to_string())
  } else {
    Number::from_f64(value).map_or(Value::Null, Value::Number)
  }
}
