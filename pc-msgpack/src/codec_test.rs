// shared-core - bitdrift's common client/server libraries
// Copyright Bitdrift, Inc. All rights reserved.
//
// Use of this source code is governed by a source available license that can be found in the
// LICENSE file or at:
// https://polyformproject.org/wp-content/uploads/2020/06/PolyForm-Shield-1.0.0.txt

use crate::MsgpackCodec;
use crate::error::Error;
use assert_matches::assert_matches;
use pc_schema::registry::SchemaRegistry;
use pc_test_protos::test_messages::ipsum_reply::Status;
use pc_test_protos::test_messages::{
  AmetReply,
  DolorReply,
  IpsumReply,
  LoremReply,
  LoremRequest,
  NarutoReply,
  SitReply,
  TeletubbiesName,
};
use pretty_assertions::assert_eq;
use rmp::encode;
use std::sync::Arc;

fn codec() -> MsgpackCodec {
  MsgpackCodec::new().with_registry(Arc::new(SchemaRegistry::new()))
}

fn map_header(entries: u32) -> Vec<u8> {
  let mut out = Vec::new();
  encode::write_map_len(&mut out, entries).unwrap();
  out
}

#[test]
fn round_trips_scalar_fields() {
  let request = LoremRequest {
    string_field: "asdfg".to_string(),
    int_field: 123_456,
    bool_field: true,
    enum_field: TeletubbiesName::LALA.into(),
    ..Default::default()
  };

  let bytes = codec().serialize(&request).unwrap();
  let deserialized: LoremRequest = codec().deserialize(&bytes).unwrap();

  assert_eq!(request, deserialized);
}

#[test]
fn skip_defaults_elides_everything_on_a_default_message() {
  let bytes = codec().serialize(&LoremRequest::default()).unwrap();
  // An empty fixmap is the whole encoding.
  assert_eq!(vec![0x80], bytes);

  let deserialized: LoremRequest = codec().deserialize(&bytes).unwrap();
  assert_eq!(LoremRequest::default(), deserialized);
}

#[test]
fn explicit_defaults_round_trip() {
  let codec = codec().with_skip_defaults(false);

  let bytes = codec.serialize(&LoremRequest::default()).unwrap();
  let deserialized: LoremRequest = codec.deserialize(&bytes).unwrap();

  assert_eq!(LoremRequest::default(), deserialized);
}

#[test]
fn explicit_mode_writes_unset_messages_as_nil() {
  let codec = codec().with_skip_defaults(false);

  let bytes = codec.serialize(&SitReply::default()).unwrap();
  let deserialized: SitReply = codec.deserialize(&bytes).unwrap();

  assert!(deserialized.lorem.0.is_none());
  assert_eq!("", deserialized.string_field);
}

#[test]
fn round_trips_oneof_case() {
  let reply = IpsumReply {
    status: Some(Status::Naruto(NarutoReply {
      string_field: "hello world".to_string(),
      ..Default::default()
    })),
    ..Default::default()
  };

  let bytes = codec().serialize(&reply).unwrap();
  let deserialized: IpsumReply = codec().deserialize(&bytes).unwrap();

  assert_matches!(
    deserialized.status,
    Some(Status::Naruto(ref naruto)) if naruto.string_field == "hello world"
  );
}

#[test]
fn oneof_none_is_elided_by_default_and_spelled_out_otherwise() {
  let bytes = codec().serialize(&IpsumReply::new()).unwrap();
  assert_eq!(vec![0x80], bytes);

  let explicit = codec()
    .with_skip_defaults(false)
    .serialize(&IpsumReply::new())
    .unwrap();
  assert!(explicit.len() > 1);

  let deserialized: IpsumReply = codec().deserialize(&explicit).unwrap();
  assert_eq!(None, deserialized.status);
}

#[test]
fn rejects_mismatched_oneof_values() {
  let mut bytes = map_header(2);
  encode::write_str(&mut bytes, "status").unwrap();
  encode::write_str(&mut bytes, "naruto").unwrap();
  encode::write_str(&mut bytes, "sasuke").unwrap();
  encode::write_map_len(&mut bytes, 0).unwrap();

  assert_matches!(
    codec().deserialize::<IpsumReply>(&bytes),
    Err(Error::ExpectedOneofValue { expected, found: Some(found), .. })
      if expected == "naruto" && found == "sasuke"
  );
}

#[test]
fn rejects_discriminator_with_missing_value() {
  let mut bytes = map_header(1);
  encode::write_str(&mut bytes, "status").unwrap();
  encode::write_str(&mut bytes, "naruto").unwrap();

  assert_matches!(
    codec().deserialize::<IpsumReply>(&bytes),
    Err(Error::ExpectedOneofValue { found: None, .. })
  );
}

#[test]
fn rejects_alternatives_without_discriminator() {
  let mut bytes = map_header(1);
  encode::write_str(&mut bytes, "naruto").unwrap();
  encode::write_map_len(&mut bytes, 0).unwrap();

  assert_matches!(
    codec().deserialize::<IpsumReply>(&bytes),
    Err(Error::OneofValueWithoutCase { oneof, field })
      if oneof == "status" && field == "naruto"
  );
}

#[test]
fn rejects_unknown_fields() {
  let mut bytes = map_header(1);
  encode::write_str(&mut bytes, "bogus").unwrap();
  encode::write_sint(&mut bytes, 1).unwrap();

  assert_matches!(
    codec().deserialize::<LoremRequest>(&bytes),
    Err(Error::UnknownField { field, .. }) if field == "bogus"
  );
}

#[test]
fn accepts_any_key_casing_and_enum_names() {
  let mut bytes = map_header(2);
  encode::write_str(&mut bytes, "stringField").unwrap();
  encode::write_str(&mut bytes, "asdfg").unwrap();
  encode::write_str(&mut bytes, "ENUM_FIELD").unwrap();
  encode::write_str(&mut bytes, "lala").unwrap();

  let deserialized: LoremRequest = codec().deserialize(&bytes).unwrap();

  assert_eq!("asdfg", deserialized.string_field);
  assert_eq!(
    TeletubbiesName::LALA,
    deserialized.enum_field.enum_value_or_default()
  );
}

#[test]
fn repeated_fields_preserve_count_and_order() {
  let reply = DolorReply {
    string_array: vec!["quick".to_string(), "brown".to_string(), "fox".to_string()],
    lorem_array: vec![
      LoremReply {
        string_field: "jumps".to_string(),
        ..Default::default()
      },
      LoremReply {
        string_field: "over".to_string(),
        ..Default::default()
      },
      LoremReply {
        string_field: "the lazy dog".to_string(),
        ..Default::default()
      },
    ],
    ..Default::default()
  };

  let bytes = codec().serialize(&reply).unwrap();
  let deserialized: DolorReply = codec().deserialize(&bytes).unwrap();

  assert_eq!(vec!["quick", "brown", "fox"], deserialized.string_array);
  assert_eq!(3, deserialized.lorem_array.len());
  assert_eq!("jumps", deserialized.lorem_array[0].string_field);
  assert_eq!("over", deserialized.lorem_array[1].string_field);
  assert_eq!("the lazy dog", deserialized.lorem_array[2].string_field);
}

#[test]
fn explicit_mode_round_trips_empty_repeated_fields() {
  let codec = codec().with_skip_defaults(false);

  let bytes = codec.serialize(&DolorReply::default()).unwrap();
  let deserialized: DolorReply = codec.deserialize(&bytes).unwrap();

  assert!(deserialized.string_array.is_empty());
  assert!(deserialized.lorem_array.is_empty());
}

#[test]
fn truncated_repeated_streams_are_malformed_sequences() {
  let reply = DolorReply {
    string_array: vec!["quick".to_string(), "brown".to_string(), "fox".to_string()],
    ..Default::default()
  };
  let bytes = codec().serialize(&reply).unwrap();

  assert_matches!(
    codec().deserialize::<DolorReply>(&bytes[.. bytes.len() - 2]),
    Err(Error::MalformedSequence { field, .. }) if field == "string_array"
  );
}

#[test]
fn truncated_message_streams_fail() {
  let request = LoremRequest {
    string_field: "asdfg".to_string(),
    ..Default::default()
  };
  let bytes = codec().serialize(&request).unwrap();

  assert_matches!(
    codec().deserialize::<LoremRequest>(&bytes[.. 2]),
    Err(Error::Truncated)
  );
}

#[test]
fn rejects_wrong_container_tokens() {
  let mut bytes = Vec::new();
  encode::write_array_len(&mut bytes, 0).unwrap();

  assert_matches!(
    codec().deserialize::<LoremRequest>(&bytes),
    Err(Error::ExpectedMap { .. })
  );
}

#[test]
fn round_trips_scalar_kitchen_sink() {
  let reply = AmetReply {
    long_field: i64::MIN,
    unsigned_field: 4_000_000_000,
    big_unsigned_field: u64::MAX,
    float_field: 1.5,
    double_field: -2.25,
    bytes_field: b"\x00\x01binary".to_vec(),
    int_array: vec![3, -1, 0],
    ..Default::default()
  };

  let bytes = codec().serialize(&reply).unwrap();
  let deserialized: AmetReply = codec().deserialize(&bytes).unwrap();

  assert_eq!(reply, deserialized);
}

#[test]
fn convenience_functions_use_the_default_codec() {
  let request = LoremRequest {
    string_field: "asdfg".to_string(),
    ..Default::default()
  };

  let bytes = crate::serialize(&request).unwrap();
  let deserialized: LoremRequest = crate::deserialize(&bytes).unwrap();

  assert_eq!(request, deserialized);
}
