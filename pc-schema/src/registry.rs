// shared-core - bitdrift's common client/server libraries
// Copyright Bitdrift, Inc. All rights reserved.
//
// Use of this source code is governed by a source available license that can be found in the
// LICENSE file or at:
// https://polyformproject.org/wp-content/uploads/2020/06/PolyForm-Shield-1.0.0.txt

#[cfg(test)]
#[path = "./registry_test.rs"]
mod registry_test;

use crate::MessageSchema;
use crate::classify::classify;
use crate::error::Result;
use protobuf::reflect::MessageDescriptor;
use std::collections::HashMap;
use std::sync::{Arc, LazyLock};

//
// SchemaRegistry
//

/// Cache of classified message schemas. Schemas are structurally static for
/// the process lifetime, so entries are written at most once per type and
/// never evicted.
#[derive(Default)]
pub struct SchemaRegistry {
  schemas: parking_lot::RwLock<HashMap<MessageDescriptor, Arc<MessageSchema>>>,
}

impl SchemaRegistry {
  #[must_use]
  pub fn new() -> Self {
    Self::default()
  }

  /// Returns the cached schema for `descriptor`, classifying it on first
  /// use. Concurrent first-time callers serialize on the write lock and all
  /// observe the same published instance.
  pub fn get_or_build(&self, descriptor: &MessageDescriptor) -> Result<Arc<MessageSchema>> {
    if let Some(schema) = self.schemas.read().get(descriptor) {
      return Ok(schema.clone());
    }

    let mut schemas = self.schemas.write();
    if let Some(schema) = schemas.get(descriptor) {
      return Ok(schema.clone());
    }

    log::debug!("classifying message type '{}'", descriptor.full_name());
    let schema = Arc::new(classify(descriptor)?);
    schemas.insert(descriptor.clone(), schema.clone());
    Ok(schema)
  }

  #[must_use]
  pub fn len(&self) -> usize {
    self.schemas.read().len()
  }

  #[must_use]
  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }
}

/// The process-wide registry backing the crate-level convenience codecs.
/// Tests that need isolation construct their own `SchemaRegistry`.
#[must_use]
pub fn global() -> Arc<SchemaRegistry> {
  static GLOBAL: LazyLock<Arc<SchemaRegistry>> = LazyLock::new(Arc::default);
  GLOBAL.clone()
}
