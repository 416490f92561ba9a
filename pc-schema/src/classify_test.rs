// shared-core - bitdrift's common client/server libraries
// Copyright Bitdrift, Inc. All rights reserved.
//
// Use of this source code is governed by a source available license that can be found in the
// LICENSE file or at:
// https://polyformproject.org/wp-content/uploads/2020/06/PolyForm-Shield-1.0.0.txt

use crate::error::{Result, SchemaError};
use crate::{FieldSlot, MessageSchema, classify};
use assert_matches::assert_matches;
use pc_test_protos::test_messages::{
  ConsecteturReply,
  DolorReply,
  ElitReply,
  IpsumReply,
  LoremRequest,
  NarutoReply,
  ipsum_reply,
};
use pretty_assertions::assert_eq;
use protobuf::MessageFull;
use protobuf::reflect::RuntimeType;

fn schema_of<M: MessageFull>() -> Result<MessageSchema> {
  classify(&M::descriptor())
}

#[test]
fn partitions_plain_scalar_messages() {
  let schema = schema_of::<LoremRequest>().unwrap();

  let names: Vec<_> = schema
    .normal_fields()
    .iter()
    .map(|field| field.name().to_string())
    .collect();
  assert_eq!(
    vec!["string_field", "int_field", "bool_field", "enum_field"],
    names
  );
  assert!(schema.repeated_fields().is_empty());
  assert!(schema.oneof_groups().is_empty());
}

#[test]
fn partitions_repeated_fields_with_element_types() {
  let schema = schema_of::<DolorReply>().unwrap();

  assert!(schema.normal_fields().is_empty());
  assert_eq!(2, schema.repeated_fields().len());
  assert_eq!("string_array", schema.repeated_fields()[0].field.name());
  assert_matches!(&schema.repeated_fields()[0].element, RuntimeType::String);
  assert_eq!("lorem_array", schema.repeated_fields()[1].field.name());
  assert_matches!(&schema.repeated_fields()[1].element, RuntimeType::Message(_));
}

#[test]
fn partitions_oneof_groups() {
  let schema = schema_of::<IpsumReply>().unwrap();

  assert!(schema.normal_fields().is_empty());
  assert!(schema.repeated_fields().is_empty());
  assert_eq!(1, schema.oneof_groups().len());

  let group = &schema.oneof_groups()[0];
  assert_eq!("status", group.name());
  let cases: Vec<_> = group
    .cases
    .iter()
    .map(|case| case.name().to_string())
    .collect();
  assert_eq!(vec!["naruto", "sasuke"], cases);
}

#[test]
fn slot_lookup_ignores_casing_and_separators() {
  let schema = schema_of::<LoremRequest>().unwrap();
  assert_eq!(Some(FieldSlot::Normal(0)), schema.slot("string_field"));
  assert_eq!(Some(FieldSlot::Normal(0)), schema.slot("stringField"));
  assert_eq!(Some(FieldSlot::Normal(0)), schema.slot("STRINGFIELD"));
  assert_eq!(Some(FieldSlot::Normal(3)), schema.slot("EnumField"));
  assert_eq!(None, schema.slot("missing"));

  let schema = schema_of::<IpsumReply>().unwrap();
  assert_eq!(Some(FieldSlot::Discriminator(0)), schema.slot("Status"));
  assert_eq!(
    Some(FieldSlot::Alternative { group: 0, case: 1 }),
    schema.slot("Sasuke")
  );
}

#[test]
fn rejects_map_fields() {
  assert_matches!(
    schema_of::<ElitReply>().map(|_| ()),
    Err(SchemaError::UnsupportedMapField { field, .. }) if field == "labels"
  );
}

#[test]
fn rejects_reserved_case_names() {
  assert_matches!(
    schema_of::<ConsecteturReply>().map(|_| ()),
    Err(SchemaError::ReservedCaseName { field, .. }) if field == "none"
  );
}

#[test]
fn active_case_reflects_the_stored_alternative() {
  let schema = schema_of::<IpsumReply>().unwrap();
  let group = &schema.oneof_groups()[0];

  let mut message = IpsumReply::new();
  assert!(group.active_case(&message).is_none());

  message.status = Some(ipsum_reply::Status::Naruto(NarutoReply::default()));
  assert_eq!("naruto", group.active_case(&message).unwrap().name());

  let (index, case) = group.case_by_name("SASUKE").unwrap();
  assert_eq!(1, index);
  assert_eq!("sasuke", case.name());
}
