// shared-core - bitdrift's common client/server libraries
// Copyright Bitdrift, Inc. All rights reserved.
//
// Use of this source code is governed by a source available license that can be found in the
// LICENSE file or at:
// https://polyformproject.org/wp-content/uploads/2020/06/PolyForm-Shield-1.0.0.txt

#[cfg(test)]
#[path = "./codec_test.rs"]
mod codec_test;

pub mod error;

mod reader;
mod repeated;
mod writer;

pub use crate::error::{Error, Result};

use pc_schema::registry::{self, SchemaRegistry};
use protobuf::reflect::MessageDescriptor;
use protobuf::{MessageDyn, MessageFull};
use std::sync::{Arc, LazyLock};

//
// MsgpackCodec
//

/// Converts protobuf messages to and from the binary map encoding. Same
/// walking logic as the textual codec, over MessagePack wire primitives:
/// every message is a count-prefixed map of UTF-8 field-name keys.
#[derive(Clone)]
pub struct MsgpackCodec {
  registry: Arc<SchemaRegistry>,
  skip_defaults: bool,
}

impl Default for MsgpackCodec {
  fn default() -> Self {
    Self::new()
  }
}

impl MsgpackCodec {
  /// A codec over the process-wide schema registry. Default-valued fields
  /// are omitted on write and synthesized on read.
  #[must_use]
  pub fn new() -> Self {
    Self {
      registry: registry::global(),
      skip_defaults: true,
    }
  }

  /// When `skip` is false every field is written out: explicit defaults,
  /// unset nested messages as nil, and `none` discriminators spelled out.
  #[must_use]
  pub fn with_skip_defaults(mut self, skip: bool) -> Self {
    self.skip_defaults = skip;
    self
  }

  /// Codec over an isolated registry; schemas classified through it are not
  /// shared with the process-wide cache.
  #[must_use]
  pub fn with_registry(mut self, registry: Arc<SchemaRegistry>) -> Self {
    self.registry = registry;
    self
  }

  pub fn serialize(&self, message: &dyn MessageDyn) -> Result<Vec<u8>> {
    log::trace!(
      "serializing message '{}'",
      message.descriptor_dyn().full_name()
    );
    let mut out = Vec::new();
    writer::write_message(self, &mut out, message)?;
    Ok(out)
  }

  pub fn deserialize<M: MessageFull>(&self, bytes: &[u8]) -> Result<M> {
    match self
      .deserialize_dyn(bytes, &M::descriptor())?
      .downcast_box()
    {
      Ok(message) => Ok(*message),
      Err(message) => Err(Error::TypeMismatch {
        expected: M::descriptor().full_name().to_string(),
        found: message.descriptor_dyn().full_name().to_string(),
      }),
    }
  }

  pub fn deserialize_dyn(
    &self,
    bytes: &[u8],
    descriptor: &MessageDescriptor,
  ) -> Result<Box<dyn MessageDyn>> {
    log::trace!("deserializing message '{}'", descriptor.full_name());
    let mut input = bytes;
    reader::read_message(self, &mut input, descriptor)
  }

  pub(crate) fn registry(&self) -> &SchemaRegistry {
    &self.registry
  }

  pub(crate) fn skip_defaults(&self) -> bool {
    self.skip_defaults
  }
}

static DEFAULT_CODEC: LazyLock<MsgpackCodec> = LazyLock::new(MsgpackCodec::new);

/// Serializes with the default codec: defaults omitted, process-wide
/// registry.
pub fn serialize(message: &dyn MessageDyn) -> Result<Vec<u8>> {
  DEFAULT_CODEC.serialize(message)
}

pub fn deserialize<M: MessageFull>(bytes: &[u8]) -> Result<M> {
  DEFAULT_CODEC.deserialize(bytes)
}
