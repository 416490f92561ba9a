// shared-core - bitdrift's common client/server libraries
// Copyright Bitdrift, Inc. All rights reserved.
//
// Use of this source code is governed by a source available license that can be found in the
// LICENSE file or at:
// https://polyformproject.org/wp-content/uploads/2020/06/PolyForm-Shield-1.0.0.txt

use crate::error::{Error, Result};
use crate::{JsonCodec, repeated};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use pc_schema::{FieldSlot, OneofGroup, is_none_case, lookup_key};
use protobuf::MessageDyn;
use protobuf::reflect::{
  EnumDescriptor,
  FieldDescriptor,
  MessageDescriptor,
  ReflectValueBox,
  RuntimeFieldType,
  RuntimeType,
};
use serde_json::Value;

pub(crate) fn read_message(
  codec: &JsonCodec,
  tree: &Value,
  descriptor: &MessageDescriptor,
) -> Result<Box<dyn MessageDyn>> {
  let Value::Object(entries) = tree else {
    return Err(Error::ExpectedObject {
      message: descriptor.full_name().to_string(),
      found: value_kind(tree),
    });
  };

  let schema = codec.registry().get_or_build(descriptor)?;
  let mut message = descriptor.new_instance();

  let mut fields = entries.iter();
  while let Some((key, value)) = fields.next() {
    match schema.slot(key) {
      None => {
        return Err(Error::UnknownField {
          message: descriptor.full_name().to_string(),
          field: key.clone(),
        });
      },
      Some(FieldSlot::Normal(index)) => {
        let field = &schema.normal_fields()[index];
        read_singular(codec, field, value, &mut *message)?;
      },
      Some(FieldSlot::Repeated(index)) => {
        let field = &schema.repeated_fields()[index].field;
        repeated::read_elements(field, value, &mut *message, |element| {
          read_value(codec, field, element)
        })?;
      },
      Some(FieldSlot::Discriminator(index)) => {
        let group = &schema.oneof_groups()[index];
        read_oneof(codec, group, value, &mut fields, &mut *message)?;
      },
      Some(FieldSlot::Alternative { group, .. }) => {
        // An alternative is only valid directly after its discriminator.
        return Err(Error::OneofValueWithoutCase {
          oneof: schema.oneof_groups()[group].name().to_string(),
          field: key.clone(),
        });
      },
    }
  }

  Ok(message)
}

// The coupled read of a discriminator and, when a case is declared, the
// immediately following alternative entry.
fn read_oneof<'a>(
  codec: &JsonCodec,
  group: &OneofGroup,
  value: &Value,
  fields: &mut impl Iterator<Item = (&'a String, &'a Value)>,
  message: &mut dyn MessageDyn,
) -> Result<()> {
  let Value::String(case_name) = value else {
    return Err(Error::WrongValueType {
      field: group.name().to_string(),
      expected: "oneof case name",
      found: value_kind(value),
    });
  };

  if is_none_case(case_name) {
    // Nothing is populated; a fresh instance is already in that state.
    return Ok(());
  }

  let Some((_, case)) = group.case_by_name(case_name) else {
    return Err(Error::UnknownOneofCase {
      oneof: group.name().to_string(),
      case: case_name.clone(),
    });
  };

  let Some((next_key, next_value)) = fields.next() else {
    return Err(Error::ExpectedOneofValue {
      oneof: group.name().to_string(),
      expected: case.name().to_string(),
      found: None,
    });
  };
  if lookup_key(next_key) != lookup_key(case.name()) {
    return Err(Error::ExpectedOneofValue {
      oneof: group.name().to_string(),
      expected: case.name().to_string(),
      found: Some(next_key.clone()),
    });
  }

  let decoded = read_value(codec, case, next_value)?;
  case.set_singular_field(message, decoded);
  Ok(())
}

fn read_singular(
  codec: &JsonCodec,
  field: &FieldDescriptor,
  value: &Value,
  message: &mut dyn MessageDyn,
) -> Result<()> {
  if value.is_null() {
    // Null leaves the field unset; absent and null are equivalent.
    return Ok(());
  }
  let decoded = read_value(codec, field, value)?;
  field.set_singular_field(message, decoded);
  Ok(())
}

pub(crate) fn read_value(
  codec: &JsonCodec,
  field: &FieldDescriptor,
  value: &Value,
) -> Result<ReflectValueBox> {
  let declared = match field.runtime_field_type() {
    RuntimeFieldType::Singular(declared) | RuntimeFieldType::Repeated(declared) => declared,
    RuntimeFieldType::Map(..) => {
      // Map fields never classify, so they never reach a codec.
      return Err(Error::WrongValueType {
        field: field.name().to_string(),
        expected: "singular or repeated field",
        found: "map field",
      });
    },
  };

  match declared {
    RuntimeType::Bool => value
      .as_bool()
      .map(ReflectValueBox::Bool)
      .ok_or_else(|| type_error(field, "bool", value)),
    RuntimeType::I32 => {
      let number = read_i64(field, value)?;
      i32::try_from(number)
        .map(ReflectValueBox::I32)
        .map_err(|_| type_error(field, "32-bit integer", value))
    },
    RuntimeType::I64 => Ok(ReflectValueBox::I64(read_i64(field, value)?)),
    RuntimeType::U32 => {
      let number = read_u64(field, value)?;
      u32::try_from(number)
        .map(ReflectValueBox::U32)
        .map_err(|_| type_error(field, "32-bit unsigned integer", value))
    },
    RuntimeType::U64 => Ok(ReflectValueBox::U64(read_u64(field, value)?)),
    #[allow(clippy::cast_possible_truncation)]
    RuntimeType::F32 => Ok(ReflectValueBox::F32(read_f64(field, value)? as f32)),
    RuntimeType::F64 => Ok(ReflectValueBox::F64(read_f64(field, value)?)),
    RuntimeType::String => value
      .as_str()
      .map(|text| ReflectValueBox::String(text.to_string()))
      .ok_or_else(|| type_error(field, "string", value)),
    RuntimeType::VecU8 => {
      let text = value
        .as_str()
        .ok_or_else(|| type_error(field, "base64 string", value))?;
      BASE64
        .decode(text)
        .map(ReflectValueBox::Bytes)
        .map_err(|_| type_error(field, "base64 string", value))
    },
    RuntimeType::Enum(descriptor) => read_enum(field, &descriptor, value),
    RuntimeType::Message(descriptor) => Ok(ReflectValueBox::Message(read_message(
      codec,
      value,
      &descriptor,
    )?)),
  }
}

fn read_enum(
  field: &FieldDescriptor,
  descriptor: &EnumDescriptor,
  value: &Value,
) -> Result<ReflectValueBox> {
  match value {
    Value::String(name) => {
      let by_name = descriptor.value_by_name(name).or_else(|| {
        let key = lookup_key(name);
        descriptor
          .values()
          .find(|candidate| lookup_key(candidate.name()) == key)
      });
      match by_name {
        Some(matched) => Ok(ReflectValueBox::Enum(
          descriptor.clone(),
          matched.proto().number(),
        )),
        None => Err(Error::UnknownEnumValue {
          field: field.name().to_string(),
          value: name.clone(),
        }),
      }
    },
    Value::Number(_) => {
      let number = read_i64(field, value)?;
      // Open enums: any 32-bit number is storable, known or not.
      i32::try_from(number)
        .map(|number| ReflectValueBox::Enum(descriptor.clone(), number))
        .map_err(|_| type_error(field, "32-bit enum number", value))
    },
    _ => Err(type_error(field, "enum name or number", value)),
  }
}

fn read_i64(field: &FieldDescriptor, value: &Value) -> Result<i64> {
  match value {
    Value::Number(number) => number
      .as_i64()
      .ok_or_else(|| type_error(field, "integer", value)),
    // 64-bit values are commonly transported as decimal strings.
    Value::String(text) => text
      .parse()
      .map_err(|_| type_error(field, "integer", value)),
    _ => Err(type_error(field, "integer", value)),
  }
}

fn read_u64(field: &FieldDescriptor, value: &Value) -> Result<u64> {
  match value {
    Value::Number(number) => number
      .as_u64()
      .ok_or_else(|| type_error(field, "unsigned integer", value)),
    Value::String(text) => text
      .parse()
      .map_err(|_| type_error(field, "unsigned integer", value)),
    _ => Err(type_error(field, "unsigned integer", value)),
  }
}

fn read_f64(field: &FieldDescriptor, value: &Value) -> Result<f64> {
  match value {
    Value::Number(number) => number
      .as_f64()
      .ok_or_else(|| type_error(field, "number", value)),
    Value::String(text) => match text.as_str() {
      "NaN" => Ok(f64::NAN),
      "Infinity" => Ok(f64::INFINITY),
      "-Infinity" => Ok(f64::NEG_INFINITY),
      _ => Err(type_error(field, "number", value)),
    },
    _ => Err(type_error(field, "number", value)),
  }
}

fn type_error(field: &FieldDescriptor, expected: &'static str, value: &Value) -> Error {
  Error::WrongValueType {
    field: field.name().to_string(),
    expected,
    found: value_kind(value),
  }
}

pub(crate) fn value_kind(value: &Value) -> &'static str {
  match value {
    Value::Null => "null",
    Value::Bool(_) => "bool",
    Value::Number(_) => "number",
    Value::String(_) => "string",
    Value::Array(_) => "array",
    Value::Object(_) => "object",
  }
}
