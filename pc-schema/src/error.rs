// shared-core - bitdrift's common client/server libraries
// Copyright Bitdrift, Inc. All rights reserved.
//
// Use of this source code is governed by a source available license that can be found in the
// LICENSE file or at:
// https://polyformproject.org/wp-content/uploads/2020/06/PolyForm-Shield-1.0.0.txt

#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
  #[error("map field '{field}' in message '{message}' is not supported")]
  UnsupportedMapField { message: String, field: String },
  #[error("field name '{name}' in message '{message}' is ambiguous once casing is ignored")]
  AmbiguousFieldName { message: String, name: String },
  #[error("oneof '{oneof}' in message '{message}' declares no alternatives")]
  EmptyOneof { message: String, oneof: String },
  #[error(
    "oneof alternative '{field}' in message '{message}' collides with the reserved 'none' case"
  )]
  ReservedCaseName { message: String, field: String },
}

pub type Result<T> = std::result::Result<T, SchemaError>;
