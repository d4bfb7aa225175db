//! # Item Pool
//!
//! Bidirectional registry between stable string identifiers and the arena
//! handles of attached items. Identifiers survive restructuring and
//! serialization, so a node can reference another node by identity (see
//! [`LinkedItem`](crate::standard_items::LinkedItem)) independent of its
//! position in the tree.

use crate::tree::ItemKey;
use arbor_common::{ModelError, ModelResult};
use std::collections::HashMap;
use uuid::Uuid;

/// Generate a process-unique identifier
pub fn new_identifier() -> String {
    Uuid::new_v4().to_string()
}

#[derive(Debug, Default)]
pub struct ItemPool {
    by_identifier: HashMap<String, ItemKey>,
    by_key: HashMap<ItemKey, String>,
}

impl ItemPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `key` under `identifier`, or under a fresh identifier when
    /// none is given. Returns the identifier used.
    pub fn register(&mut self, key: ItemKey, identifier: Option<&str>) -> ModelResult<String> {
        if let Some(existing) = self.by_key.get(&key) {
            return Err(ModelError::existing_key(format!(
                "item is already registered as '{}'",
                existing
            )));
        }
        let identifier = match identifier {
            Some(identifier) if identifier.is_empty() => {
                return Err(ModelError::null_argument("empty identifier"));
            }
            Some(identifier) => identifier.to_string(),
            None => new_identifier(),
        };
        if self.by_identifier.contains_key(&identifier) {
            return Err(ModelError::existing_key(format!(
                "identifier '{}' is already in use",
                identifier
            )));
        }
        self.by_identifier.insert(identifier.clone(), key);
        self.by_key.insert(key, identifier.clone());
        Ok(identifier)
    }

    pub fn unregister(&mut self, key: ItemKey) -> ModelResult<String> {
        let identifier = self
            .by_key
            .remove(&key)
            .ok_or_else(|| ModelError::not_found(format!("item {:?} is not registered", key)))?;
        self.by_identifier.remove(&identifier);
        Ok(identifier)
    }

    pub fn find(&self, identifier: &str) -> Option<ItemKey> {
        self.by_identifier.get(identifier).copied()
    }

    pub fn identifier_of(&self, key: ItemKey) -> Option<&str> {
        self.by_key.get(&key).map(String::as_str)
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.by_identifier.contains_key(identifier)
    }

    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }

    pub fn clear(&mut self) {
        self.by_identifier.clear();
        self.by_key.clear();
    }
}
