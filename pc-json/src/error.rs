// shared-core - bitdrift's common client/server libraries
// Copyright Bitdrift, Inc. All rights reserved.
//
// Use of this source code is governed by a source available license that can be found in the
// LICENSE file or at:
// https://polyformproject.org/wp-content/uploads/2020/06/PolyForm-Shield-1.0.0.txt

use pc_schema::SchemaError;

#[derive(Debug, thiserror::Error)]
pub enum Error {
  #[error(transparent)]
  Schema(#[from] SchemaError),
  // The input is not parseable JSON at all.
  #[error("malformed JSON document: {0}")]
  Parse(#[from] serde_json::Error),
  #[error("expected an object for message '{message}', found {found}")]
  ExpectedObject { message: String, found: &'static str },
  #[error("unknown field '{field}' for message '{message}'")]
  UnknownField { message: String, field: String },
  #[error("oneof '{oneof}' has no case named '{case}'")]
  UnknownOneofCase { oneof: String, case: String },
  #[error("oneof '{oneof}' declares case '{expected}' but the next field is {found:?}")]
  ExpectedOneofValue {
    oneof: String,
    expected: String,
    found: Option<String>,
  },
  #[error("oneof value '{field}' is not preceded by its '{oneof}' discriminator")]
  OneofValueWithoutCase { oneof: String, field: String },
  #[error("repeated field '{field}': {detail}")]
  MalformedSequence { field: String, detail: String },
  #[error("field '{field}': expected {expected}, found {found}")]
  WrongValueType {
    field: String,
    expected: &'static str,
    found: &'static str,
  },
  #[error("field '{field}': '{value}' is not a known enum value")]
  UnknownEnumValue { field: String, value: String },
  #[error("deserialized message is '{found}', not the requested '{expected}'")]
  TypeMismatch { expected: String, found: String },
}

pub type Result<T> = std::result::Result<T, Error>;
