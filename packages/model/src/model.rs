//! # Model
//!
//! A tree of items rooted at a session item, with its own item pool, event
//! hub and (optionally) command stack. All changes go through the composer
//! pipeline; lookups read the tree directly.
//!
//! ## Example
//!
//! ```rust,ignore
//! let mut model = Model::new("SampleModel")?;
//! let root = model.root_item();
//! let key = model.insert_new_item(CONTAINER_ITEM, root, &TagIndex::append(""))?;
//! model.set_data(key, Variant::from("Box"), roles::DISPLAY)?;
//! model.undo()?;
//! ```

use crate::command_stack::CommandStack;
use crate::composer::{Composer, ComposerBuilder};
use crate::config::ModelConfig;
use crate::events::{EventHub, ModelEvent};
use crate::factory::ItemFactory;
use crate::item::{Item, ItemData};
use crate::pool::new_identifier;
use crate::standard_items;
use crate::tag::TagIndex;
use crate::tree::{ItemKey, ItemNode, ItemTree};
use arbor_common::roles::Role;
use arbor_common::{ModelError, ModelResult, Variant};
use std::cell::{Ref, RefCell};
use std::fmt;
use std::rc::Rc;
use tracing::debug;

pub struct Model {
    model_type: String,
    tree: ItemTree,
    factory: Rc<ItemFactory>,
    hub: EventHub,
    stack: Option<Rc<RefCell<CommandStack>>>,
    composer: Box<dyn Composer>,
    replay: Box<dyn Composer>,
}

impl Model {
    /// Model with the standard factory, a session root and undo enabled
    pub fn new(model_type: impl Into<String>) -> ModelResult<Self> {
        ModelBuilder::new(model_type).build()
    }

    pub fn builder(model_type: impl Into<String>) -> ModelBuilder {
        ModelBuilder::new(model_type)
    }

    pub fn model_type(&self) -> &str {
        &self.model_type
    }

    pub fn tree(&self) -> &ItemTree {
        &self.tree
    }

    pub fn factory(&self) -> &ItemFactory {
        &self.factory
    }

    pub fn event_hub(&self) -> &EventHub {
        &self.hub
    }

    pub fn root_item(&self) -> ItemKey {
        self.tree.root()
    }

    /// Number of attached items, root included
    pub fn len(&self) -> usize {
        self.tree.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    pub fn item(&self, key: ItemKey) -> ModelResult<&ItemNode> {
        self.tree.node(key)
    }

    pub fn find_item(&self, identifier: &str) -> Option<ItemKey> {
        self.tree.find(identifier)
    }

    pub fn parent_of(&self, key: ItemKey) -> ModelResult<Option<ItemKey>> {
        self.tree.parent_of(key)
    }

    pub fn tag_index_of(&self, key: ItemKey) -> ModelResult<TagIndex> {
        self.tree.tag_index_of(key)
    }

    pub fn get_item(&self, parent: ItemKey, tag_index: &TagIndex) -> ModelResult<ItemKey> {
        self.tree.get_item(parent, tag_index)
    }

    pub fn items(&self, parent: ItemKey, tag: &str) -> ModelResult<&[ItemKey]> {
        self.tree.items(parent, tag)
    }

    /// Children of the root item, across all its tags
    pub fn top_items(&self) -> Vec<ItemKey> {
        self.tree.children(self.tree.root()).unwrap_or_default()
    }

    pub fn data(&self, key: ItemKey, role: Role) -> ModelResult<Variant> {
        self.tree.data(key, role)
    }

    /// Detached copy of the subtree at `key`
    pub fn snapshot(&self, key: ItemKey) -> ModelResult<Item> {
        self.tree.snapshot(key)
    }

    pub fn insert_item(&mut self, item: Item, parent: ItemKey, tag_index: &TagIndex) -> ModelResult<ItemKey> {
        debug!(model_type = %item.model_type(), at = %tag_index, "insert item");
        self.composer
            .insert_item(&mut self.tree, item, parent, tag_index)
    }

    /// Create an item of `model_type` through the factory and insert it
    pub fn insert_new_item(&mut self, model_type: &str, parent: ItemKey, tag_index: &TagIndex) -> ModelResult<ItemKey> {
        let item = self.factory.create_item(model_type)?;
        self.insert_item(item, parent, tag_index)
    }

    /// Detach the child at `tag_index`; refused when its tag would drop
    /// under the minimum
    pub fn take_item(&mut self, parent: ItemKey, tag_index: &TagIndex) -> ModelResult<Item> {
        debug!(at = %tag_index, "take item");
        self.tree.check_take_minimum(parent, tag_index)?;
        self.composer.take_item(&mut self.tree, parent, tag_index)
    }

    pub fn remove_item(&mut self, parent: ItemKey, tag_index: &TagIndex) -> ModelResult<()> {
        self.take_item(parent, tag_index).map(drop)
    }

    /// Relocate `item`; the target index is read as if `item` were already
    /// gone from its current place
    pub fn move_item(&mut self, item: ItemKey, new_parent: ItemKey, tag_index: &TagIndex) -> ModelResult<TagIndex> {
        debug!(to = %tag_index, "move item");
        if let Some(old_parent) = self.tree.parent_of(item)? {
            let old_index = self.tree.tag_index_of(item)?;
            let target_tag = self
                .tree
                .node(new_parent)?
                .tags()
                .resolve_tag(&tag_index.tag)
                .map(str::to_string);
            let same_tag = old_parent == new_parent && target_tag.as_deref() == Some(old_index.tag.as_str());
            if !same_tag {
                self.tree.check_take_minimum(old_parent, &old_index)?;
            }
        }
        self.composer
            .move_item(&mut self.tree, item, new_parent, tag_index)
    }

    /// Store `value` under `role`; returns false when the value was already there
    pub fn set_data(&mut self, item: ItemKey, value: impl Into<Variant>, role: Role) -> ModelResult<bool> {
        self.composer
            .set_data(&mut self.tree, item, value.into(), role)
    }

    /// Replace the whole tree; drops the undo history
    pub fn replace_root(&mut self, root: Item) -> ModelResult<()> {
        debug!(model_type = %root.model_type(), "replace root");
        self.composer.replace_root(&mut self.tree, root)
    }

    /// Replace the root by a fresh one of the same type
    pub fn clear(&mut self) -> ModelResult<()> {
        let root = self.fresh_root()?;
        self.replace_root(root)
    }

    fn fresh_root(&self) -> ModelResult<Item> {
        let node = self.tree.node(self.tree.root())?;
        if self.factory.contains(node.model_type()) {
            return self.factory.create_item(node.model_type());
        }
        Ok(Item::from_parts(
            new_identifier(),
            node.model_type().to_string(),
            ItemData::new(),
            node.tags().schema(),
        ))
    }

    pub fn is_undo_enabled(&self) -> bool {
        self.stack.is_some()
    }

    /// Read access to the history, if undo is enabled
    pub fn command_stack(&self) -> Option<Ref<'_, CommandStack>> {
        self.stack.as_ref().and_then(|stack| stack.try_borrow().ok())
    }

    pub fn undo(&mut self) -> ModelResult<bool> {
        match &self.stack {
            Some(stack) => busy(stack)?.undo(&mut self.tree, self.replay.as_mut()),
            None => Ok(false),
        }
    }

    pub fn redo(&mut self) -> ModelResult<bool> {
        match &self.stack {
            Some(stack) => busy(stack)?.redo(&mut self.tree, self.replay.as_mut()),
            None => Ok(false),
        }
    }

    pub fn can_undo(&self) -> bool {
        self.command_stack().is_some_and(|stack| stack.can_undo())
    }

    pub fn can_redo(&self) -> bool {
        self.command_stack().is_some_and(|stack| stack.can_redo())
    }

    /// Group the following changes into one undo step; no-op without undo
    pub fn begin_macro(&mut self, name: impl Into<String>) -> ModelResult<()> {
        match &self.stack {
            Some(stack) => busy(stack)?.begin_macro(name),
            None => Ok(()),
        }
    }

    pub fn end_macro(&mut self) -> ModelResult<()> {
        match &self.stack {
            Some(stack) => busy(stack)?.end_macro(),
            None => Ok(()),
        }
    }

    pub fn set_undo_limit(&mut self, limit: usize) -> ModelResult<()> {
        if let Some(stack) = &self.stack {
            busy(stack)?.set_undo_limit(limit);
        }
        Ok(())
    }

    pub fn clear_history(&mut self) -> ModelResult<()> {
        if let Some(stack) = &self.stack {
            busy(stack)?.clear();
            debug!("history cleared");
        }
        Ok(())
    }

    /// Mark the current history position as saved
    pub fn set_clean(&mut self) -> ModelResult<()> {
        if let Some(stack) = &self.stack {
            busy(stack)?.set_clean();
        }
        Ok(())
    }
}

fn busy(stack: &Rc<RefCell<CommandStack>>) -> ModelResult<std::cell::RefMut<'_, CommandStack>> {
    stack
        .try_borrow_mut()
        .map_err(|_| ModelError::invalid_operation("the command stack is busy"))
}

impl Drop for Model {
    fn drop(&mut self) {
        self.hub.notify(ModelEvent::AboutToDestroy);
    }
}

impl fmt::Debug for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Model")
            .field("model_type", &self.model_type)
            .field("items", &self.tree.len())
            .field("undo", &self.stack.is_some())
            .finish()
    }
}

/// Configures a [`Model`] before it is built
pub struct ModelBuilder {
    model_type: String,
    root: Option<Item>,
    factory: Option<Rc<ItemFactory>>,
    hub: Option<EventHub>,
    undo_enabled: bool,
    undo_limit: usize,
}

impl ModelBuilder {
    pub fn new(model_type: impl Into<String>) -> Self {
        let config = ModelConfig::default();
        Self {
            model_type: model_type.into(),
            root: None,
            factory: None,
            hub: None,
            undo_enabled: config.undo_enabled,
            undo_limit: config.undo_limit,
        }
    }

    /// Take the undo settings from `config`
    pub fn config(mut self, config: &ModelConfig) -> Self {
        self.undo_enabled = config.undo_enabled;
        self.undo_limit = config.undo_limit;
        self
    }

    /// Start from `root` instead of a fresh session item
    pub fn root(mut self, root: Item) -> Self {
        self.root = Some(root);
        self
    }

    pub fn factory(mut self, factory: Rc<ItemFactory>) -> Self {
        self.factory = Some(factory);
        self
    }

    /// Emit events on an existing hub
    pub fn event_hub(mut self, hub: EventHub) -> Self {
        self.hub = Some(hub);
        self
    }

    pub fn undo(mut self, enabled: bool) -> Self {
        self.undo_enabled = enabled;
        self
    }

    pub fn undo_limit(mut self, limit: usize) -> Self {
        self.undo_limit = limit;
        self
    }

    pub fn build(self) -> ModelResult<Model> {
        let factory = self
            .factory
            .unwrap_or_else(|| Rc::new(ItemFactory::with_standard_items()));
        let root = match self.root {
            Some(root) => root,
            None if factory.contains(standard_items::SESSION_ITEM) => {
                factory.create_item(standard_items::SESSION_ITEM)?
            }
            None => standard_items::session_item(),
        };
        let tree = ItemTree::new(root)?;
        let hub = self.hub.unwrap_or_default();
        let stack = self
            .undo_enabled
            .then(|| Rc::new(RefCell::new(CommandStack::with_undo_limit(self.undo_limit))));

        let mut builder = ComposerBuilder::new().notifying(hub.clone());
        if let Some(stack) = &stack {
            builder = builder.undoable(Rc::clone(stack));
        }
        debug!(
            model_type = %self.model_type,
            undo = stack.is_some(),
            limit = self.undo_limit,
            "model created"
        );

        Ok(Model {
            model_type: self.model_type,
            tree,
            factory,
            hub,
            stack,
            composer: builder.build(),
            replay: builder.build_replay(),
        })
    }
}
