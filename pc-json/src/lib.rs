// shared-core - bitdrift's common client/server libraries
// Copyright Bitdrift, Inc. All rights reserved.
//
// Use of this source code is governed by a source available license that can be found in the
// LICENSE file or at:
// https://polyformproject.org/wp-content/uploads/2020/06/PolyForm-Shield-1.0.0.txt


pub mod error;

mod reader;
mod repeated;
mod writer;

pub use crate::error::{Error, Result};

use pc_schema::registry::{self, SchemaRegistry};
use protobuf::reflect::{FieldDescriptor, MessageDescriptor, OneofDescriptor};
use protobuf::{MessageDyn, MessageFull};
use std::sync::{Arc, LazyLock};

//
// FieldNaming
//

/// Casing applied to field names on write. Reads accept any casing.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum FieldNaming {
  /// Protobuf JSON-mapping names: `stringField`.
  #[default]
  Camel,
  /// Declared proto names: `string_field`.
  Proto,
}

impl FieldNaming {
  pub(crate) fn field_key(self, field: &FieldDescriptor) -> String {
    match self {
      Self::Camel => {
        let json_name = field.proto().json_name();
        if json_name.is_empty() {
          camel_case(field.name())
        } else {
          json_name.to_string()
        }
      },
      Self::Proto => field.name().to_string(),
    }
  }

  pub(crate) fn oneof_key(self, oneof: &OneofDescriptor) -> String {
    match self {
      Self::Camel => camel_case(oneof.name()),
      Self::Proto => oneof.name().to_string(),
    }
  }
}

// `foo_bar_baz` -> `fooBarBaz`, the protobuf JSON-mapping convention.
fn camel_case(name: &str) -> String {
  let mut out = String::with_capacity(name.len());
  let mut upper_next = false;
  for c in name.chars() {
    if c == '_' {
      upper_next = true;
    } else if upper_next {
      out.extend(c.to_uppercase());
      upper_next = false;
    } else {
      out.push(c);
    }
  }
  out
}

//
// JsonCodec
//

/// Converts protobuf messages to and from the textual object encoding.
///
/// The codec walks one message graph per call through the schema registry's
/// cached field classification; scalar values are delegated to the host
/// JSON primitives.
#[derive(Clone)]
pub struct JsonCodec {
  registry: Arc<SchemaRegistry>,
  naming: FieldNaming,
}

impl Default for JsonCodec {
  fn default() -> Self {
    Self::new()
  }
}

impl JsonCodec {
  /// A codec over the process-wide schema registry with default naming.
  #[must_use]
  pub fn new() -> Self {
    Self {
      registry: registry::global(),
      naming: FieldNaming::default(),
    }
  }

  #[must_use]
  pub fn with_naming(mut self, naming: FieldNaming) -> Self {
    self.naming = naming;
    self
  }

  /// Codec over an isolated registry; schemas classified through it are not
  /// shared with the process-wide cache.
  #[must_use]
  pub fn with_registry(mut self, registry: Arc<SchemaRegistry>) -> Self {
    self.registry = registry;
    self
  }

  pub fn serialize(&self, message: &dyn MessageDyn) -> Result<String> {
    Ok(self.serialize_value(message)?.to_string())
  }

  /// The encoded tree prior to rendering, for callers that embed the
  /// message in a larger document.
  pub fn serialize_value(&self, message: &dyn MessageDyn) -> Result<serde_json::Value> {
    log::trace!(
      "serializing message '{}'",
      message.descriptor_dyn().full_name()
    );
    writer::write_message(self, message)
  }

  pub fn deserialize<M: MessageFull>(&self, json: &str) -> Result<M> {
    match self.deserialize_dyn(json, &M::descriptor())?.downcast_box() {
      Ok(message) => Ok(*message),
      Err(message) => Err(Error::TypeMismatch {
        expected: M::descriptor().full_name().to_string(),
        found: message.descriptor_dyn().full_name().to_string(),
      }),
    }
  }

  pub fn deserialize_dyn(
    &self,
    json: &str,
    descriptor: &MessageDescriptor,
  ) -> Result<Box<dyn MessageDyn>> {
    let tree: serde_json::Value = serde_json::from_str(json)?;
    self.deserialize_value(&tree, descriptor)
  }

  pub fn deserialize_value(
    &self,
    tree: &serde_json::Value,
    descriptor: &MessageDescriptor,
  ) -> Result<Box<dyn MessageDyn>> {
    log::trace!("deserializing message '{}'", descriptor.full_name());
    reader::read_message(self, tree, descriptor)
  }

  pub(crate) fn registry(&self) -> &SchemaRegistry {
    &self.registry
  }

  pub(crate) fn naming(&self) -> FieldNaming {
    self.naming
  }
}

static DEFAULT_CODEC: LazyLock<JsonCodec> = LazyLock::new(JsonCodec::new);

/// Serializes with the default codec: camel-case names, process-wide
/// registry.
pub fn serialize(message: &dyn MessageDyn) -> Result<String> {
  DEFAULT_CODEC.serialize(message)
}

pub fn deserialize<M: MessageFull>(json: &str) -> Result<M> {
  DEFAULT_CODEC.deserialize(json)
}
