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
  #[error("failed to write to the output buffer: {0}")]
  Io(#[from] std::io::Error),
  #[error("failed to encode value: {0}")]
  Encode(#[from] rmp::encode::ValueWriteError),
  #[error("expected a map for message '{message}', found {found}")]
  ExpectedMap { message: String, found: String },
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
    found: String,
  },
  #[error("field '{field}': '{value}' is not a known enum value")]
  UnknownEnumValue { field: String, value: String },
  #[error("field '{field}' is not valid UTF-8")]
  InvalidUtf8 { field: String },
  #[error("stream ended before the message was complete")]
  Truncated,
  #[error("deserialized message is '{found}', not the requested '{expected}'")]
  TypeMismatch { expected: String, found: String },
}

pub type Result<T> = std::result::Result<T, Error>;
