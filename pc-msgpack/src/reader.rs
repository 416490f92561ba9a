// shared-core - bitdrift's common client/server libraries
// Copyright Bitdrift, Inc. All rights reserved.
//
// Use of this source code is governed by a source available license that can be found in the
// LICENSE file or at:
// https://polyformproject.org/wp-content/uploads/2020/06/PolyForm-Shield-1.0.0.txt

use crate::error::{Error, Result};
use crate::{MsgpackCodec, repeated};
use pc_schema::{FieldSlot, is_none_case, lookup_key};
use protobuf::MessageDyn;
use protobuf::reflect::{
  EnumDescriptor,
  FieldDescriptor,
  MessageDescriptor,
  ReflectValueBox,
  RuntimeFieldType,
  RuntimeType,
};
use rmp::Marker;
use rmp::decode;

pub(crate) fn read_message(
  codec: &MsgpackCodec,
  input: &mut &[u8],
  descriptor: &MessageDescriptor,
) -> Result<Box<dyn MessageDyn>> {
  let schema = codec.registry().get_or_build(descriptor)?;
  let mut message = descriptor.new_instance();

  let mut remaining = decode::read_map_len(input).map_err(|error| match error {
    decode::ValueReadError::TypeMismatch(marker) => Error::ExpectedMap {
      message: descriptor.full_name().to_string(),
      found: format!("{marker:?}"),
    },
    _ => Error::Truncated,
  })?;

  while remaining > 0 {
    remaining -= 1;
    let key = read_string(input, descriptor.full_name())?;
    match schema.slot(&key) {
      None => {
        return Err(Error::UnknownField {
          message: descriptor.full_name().to_string(),
          field: key,
        });
      },
      Some(FieldSlot::Normal(index)) => {
        let field = &schema.normal_fields()[index];
        read_singular(codec, input, field, &mut *message)?;
      },
      Some(FieldSlot::Repeated(index)) => {
        let field = &schema.repeated_fields()[index].field;
        repeated::read_elements(input, field, &mut *message, |input| {
          read_value(codec, input, field)
        })?;
      },
      Some(FieldSlot::Discriminator(index)) => {
        let group = &schema.oneof_groups()[index];
        let case_name = read_string(input, group.name())?;
        if is_none_case(&case_name) {
          continue;
        }
        let Some((_, case)) = group.case_by_name(&case_name) else {
          return Err(Error::UnknownOneofCase {
            oneof: group.name().to_string(),
            case: case_name,
          });
        };

        // The alternative entry is consumed together with its
        // discriminator and must match the declared case.
        if remaining == 0 {
          return Err(Error::ExpectedOneofValue {
            oneof: group.name().to_string(),
            expected: case.name().to_string(),
            found: None,
          });
        }
        remaining -= 1;
        let next_key = read_string(input, group.name())?;
        if lookup_key(&next_key) != lookup_key(case.name()) {
          return Err(Error::ExpectedOneofValue {
            oneof: group.name().to_string(),
            expected: case.name().to_string(),
            found: Some(next_key),
          });
        }
        let decoded = read_value(codec, input, case)?;
        case.set_singular_field(&mut *message, decoded);
      },
      Some(FieldSlot::Alternative { group, .. }) => {
        return Err(Error::OneofValueWithoutCase {
          oneof: schema.oneof_groups()[group].name().to_string(),
          field: key,
        });
      },
    }
  }

  Ok(message)
}

fn read_singular(
  codec: &MsgpackCodec,
  input: &mut &[u8],
  field: &FieldDescriptor,
  message: &mut dyn MessageDyn,
) -> Result<()> {
  if peek_marker(input)? == Marker::Null {
    // Nil leaves the field unset; absent and nil are equivalent.
    decode::read_nil(input).map_err(|error| data_error(field.name(), "nil", error))?;
    return Ok(());
  }
  let decoded = read_value(codec, input, field)?;
  field.set_singular_field(message, decoded);
  Ok(())
}

pub(crate) fn read_value(
  codec: &MsgpackCodec,
  input: &mut &[u8],
  field: &FieldDescriptor,
) -> Result<ReflectValueBox> {
  let declared = match field.runtime_field_type() {
    RuntimeFieldType::Singular(declared) | RuntimeFieldType::Repeated(declared) => declared,
    RuntimeFieldType::Map(..) => {
      // Map fields never classify, so they never reach a codec.
      return Err(Error::WrongValueType {
        field: field.name().to_string(),
        expected: "singular or repeated field",
        found: "map field".to_string(),
      });
    },
  };

  match declared {
    RuntimeType::Bool => Ok(ReflectValueBox::Bool(
      decode::read_bool(input).map_err(|error| data_error(field.name(), "bool", error))?,
    )),
    RuntimeType::I32 => Ok(ReflectValueBox::I32(read_i32(input, field.name())?)),
    RuntimeType::I64 => Ok(ReflectValueBox::I64(read_i64(input, field.name())?)),
    RuntimeType::U32 => {
      let number = read_u64(input, field.name())?;
      u32::try_from(number)
        .map(ReflectValueBox::U32)
        .map_err(|_| Error::WrongValueType {
          field: field.name().to_string(),
          expected: "32-bit unsigned integer",
          found: "out-of-range integer".to_string(),
        })
    },
    RuntimeType::U64 => Ok(ReflectValueBox::U64(read_u64(input, field.name())?)),
    #[allow(clippy::cast_possible_truncation)]
    RuntimeType::F32 => Ok(ReflectValueBox::F32(read_float(input, field.name())? as f32)),
    RuntimeType::F64 => Ok(ReflectValueBox::F64(read_float(input, field.name())?)),
    RuntimeType::String => Ok(ReflectValueBox::String(read_string(input, field.name())?)),
    RuntimeType::VecU8 => {
      let length =
        decode::read_bin_len(input).map_err(|error| data_error(field.name(), "bin", error))?;
      let bytes = take(input, length as usize)?;
      Ok(ReflectValueBox::Bytes(bytes.to_vec()))
    },
    RuntimeType::Enum(descriptor) => read_enum(input, field, &descriptor),
    RuntimeType::Message(descriptor) => Ok(ReflectValueBox::Message(read_message(
      codec,
      input,
      &descriptor,
    )?)),
  }
}

fn read_enum(
  input: &mut &[u8],
  field: &FieldDescriptor,
  descriptor: &EnumDescriptor,
) -> Result<ReflectValueBox> {
  if is_str_marker(peek_marker(input)?) {
    let name = read_string(input, field.name())?;
    let key = lookup_key(&name);
    let matched = descriptor.value_by_name(&name).or_else(|| {
      descriptor
        .values()
        .find(|candidate| lookup_key(candidate.name()) == key)
    });
    return match matched {
      Some(matched) => Ok(ReflectValueBox::Enum(
        descriptor.clone(),
        matched.proto().number(),
      )),
      None => Err(Error::UnknownEnumValue {
        field: field.name().to_string(),
        value: name,
      }),
    };
  }

  // Open enums: any 32-bit number is storable, known or not.
  let number = read_i32(input, field.name())?;
  Ok(ReflectValueBox::Enum(descriptor.clone(), number))
}

fn read_i32(input: &mut &[u8], field: &str) -> Result<i32> {
  decode::read_int(input).map_err(|error| num_error(field, error))
}

fn read_i64(input: &mut &[u8], field: &str) -> Result<i64> {
  decode::read_int(input).map_err(|error| num_error(field, error))
}

fn read_u64(input: &mut &[u8], field: &str) -> Result<u64> {
  decode::read_int(input).map_err(|error| num_error(field, error))
}

fn read_float(input: &mut &[u8], field: &str) -> Result<f64> {
  match peek_marker(input)? {
    Marker::F32 => Ok(f64::from(
      decode::read_f32(input).map_err(|error| data_error(field, "float", error))?,
    )),
    Marker::F64 => decode::read_f64(input).map_err(|error| data_error(field, "float", error)),
    #[allow(clippy::cast_precision_loss)]
    _ => Ok(read_i64(input, field)? as f64),
  }
}

fn read_string(input: &mut &[u8], field: &str) -> Result<String> {
  let length = decode::read_str_len(input).map_err(|error| data_error(field, "string", error))?;
  let bytes = take(input, length as usize)?;
  String::from_utf8(bytes.to_vec()).map_err(|_| Error::InvalidUtf8 {
    field: field.to_string(),
  })
}

fn take<'a>(input: &mut &'a [u8], length: usize) -> Result<&'a [u8]> {
  if input.len() < length {
    return Err(Error::Truncated);
  }
  let (head, tail) = input.split_at(length);
  *input = tail;
  Ok(head)
}

fn peek_marker(input: &[u8]) -> Result<Marker> {
  input
    .first()
    .map(|byte| Marker::from_u8(*byte))
    .ok_or(Error::Truncated)
}

fn is_str_marker(marker: Marker) -> bool {
  matches!(
    marker,
    Marker::FixStr(_) | Marker::Str8 | Marker::Str16 | Marker::Str32
  )
}

fn data_error(field: &str, expected: &'static str, error: decode::ValueReadError) -> Error {
  match error {
    decode::ValueReadError::TypeMismatch(marker) => Error::WrongValueType {
      field: field.to_string(),
      expected,
      found: format!("{marker:?}"),
    },
    _ => Error::Truncated,
  }
}

fn num_error(field: &str, error: decode::NumValueReadError) -> Error {
  match error {
    decode::NumValueReadError::TypeMismatch(marker) => Error::WrongValueType {
      field: field.to_string(),
      expected: "integer",
      found: format!("{marker:?}"),
    },
    decode::NumValueReadError::OutOfRange => Error::WrongValueType {
      field: field.to_string(),
      expected: "integer",
      found: "out-of-range integer".to_string(),
    },
    _ => Error::Truncated,
  }
}
