//! # Item Factory
//!
//! Catalogue of item constructors keyed by type name. Models use it to
//! create items by name (`insert_new_item`) and the converter uses it to
//! instantiate items while loading.

use crate::item::Item;
use crate::standard_items;
use arbor_common::{ModelError, ModelResult};
use std::collections::HashMap;
use std::fmt;
use tracing::trace;

pub type ItemConstructor = Box<dyn Fn() -> Item>;

struct FactoryEntry {
    model_type: String,
    label: String,
    constructor: ItemConstructor,
}

/// Constructors in registration order
#[derive(Default)]
pub struct ItemFactory {
    entries: Vec<FactoryEntry>,
    index: HashMap<String, usize>,
}

impl ItemFactory {
    /// Empty catalogue
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalogue holding the standard item types
    pub fn with_standard_items() -> Self {
        let mut factory = Self::new();
        standard_items::register_standard_items(&mut factory);
        factory
    }

    /// Register `constructor` under `model_type`; fails with `ExistingKey`
    /// when the name is taken
    pub fn register_item(
        &mut self,
        model_type: impl Into<String>,
        constructor: impl Fn() -> Item + 'static,
        label: impl Into<String>,
    ) -> ModelResult<()> {
        let model_type = model_type.into();
        if self.index.contains_key(&model_type) {
            return Err(ModelError::existing_key(format!(
                "item type '{}' is already registered",
                model_type
            )));
        }
        self.push_entry(model_type, Box::new(constructor), label.into());
        Ok(())
    }

    pub(crate) fn push_entry(&mut self, model_type: String, constructor: ItemConstructor, label: String) {
        self.index.insert(model_type.clone(), self.entries.len());
        self.entries.push(FactoryEntry {
            model_type,
            label,
            constructor,
        });
    }

    pub fn create_item(&self, model_type: &str) -> ModelResult<Item> {
        let entry = self
            .index
            .get(model_type)
            .map(|pos| &self.entries[*pos])
            .ok_or_else(|| ModelError::not_found(format!("item type '{}' is not registered", model_type)))?;
        let item = (entry.constructor)();
        if item.model_type() != model_type {
            return Err(ModelError::invalid_operation(format!(
                "constructor for '{}' produced a '{}'",
                model_type,
                item.model_type()
            )));
        }
        trace!(model_type, identifier = %item.identifier(), "created item");
        Ok(item)
    }

    pub fn contains(&self, model_type: &str) -> bool {
        self.index.contains_key(model_type)
    }

    pub fn registered_types(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.model_type.clone()).collect()
    }

    /// Display label registered with `model_type`
    pub fn label(&self, model_type: &str) -> Option<&str> {
        self.index
            .get(model_type)
            .map(|pos| self.entries[*pos].label.as_str())
    }
}

impl fmt::Debug for ItemFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ItemFactory")
            .field("types", &self.registered_types())
            .finish()
    }
}
