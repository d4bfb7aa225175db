//! # Composer Pipeline
//!
//! Every structural change and data write goes through a chain of
//! composers before it reaches the tree:
//!
//! ```text
//! Model ──▶ NotifyingComposer ──▶ CommandComposer ──▶ BaseComposer ──▶ ItemTree
//!           events around          records a command   applies the
//!           the change             on the stack        change
//! ```
//!
//! Each stage owns the next one. [`ComposerBuilder`] assembles the chain;
//! stages are left out when the model has no event hub or no undo.
//!
//! Undo and redo replay recorded commands through a second chain without the
//! command stage ([`ComposerBuilder::build_replay`]), so replayed changes
//! emit the same events as the original ones but are not recorded again.

use crate::command_stack::CommandStack;
use crate::commands::{
    Command, CommandOutcome, InsertItemCommand, MoveItemCommand, RemoveItemCommand, SetDataCommand,
};
use crate::events::{EventHub, ModelEvent};
use crate::item::Item;
use crate::tag::TagIndex;
use crate::tree::{ItemKey, ItemTree};
use arbor_common::roles::Role;
use arbor_common::{ModelError, ModelResult, Variant};
use std::cell::RefCell;
use std::rc::Rc;
use tracing::{debug, trace};

/// One stage of the mutation pipeline
pub trait Composer {
    fn insert_item(
        &mut self,
        tree: &mut ItemTree,
        item: Item,
        parent: ItemKey,
        tag_index: &TagIndex,
    ) -> ModelResult<ItemKey>;

    fn take_item(&mut self, tree: &mut ItemTree, parent: ItemKey, tag_index: &TagIndex) -> ModelResult<Item>;

    fn move_item(
        &mut self,
        tree: &mut ItemTree,
        item: ItemKey,
        new_parent: ItemKey,
        tag_index: &TagIndex,
    ) -> ModelResult<TagIndex>;

    fn set_data(&mut self, tree: &mut ItemTree, item: ItemKey, value: Variant, role: Role) -> ModelResult<bool>;

    fn replace_root(&mut self, tree: &mut ItemTree, root: Item) -> ModelResult<()>;

    fn name(&self) -> &'static str;

    /// Names of this stage and the ones behind it, outermost first
    fn stages(&self) -> Vec<&'static str> {
        vec![self.name()]
    }
}

/// Last stage: applies changes to the tree
#[derive(Debug, Default, Clone, Copy)]
pub struct BaseComposer;

impl Composer for BaseComposer {
    fn insert_item(
        &mut self,
        tree: &mut ItemTree,
        item: Item,
        parent: ItemKey,
        tag_index: &TagIndex,
    ) -> ModelResult<ItemKey> {
        let model_type = item.model_type().to_string();
        let (key, resolved) = tree.insert_item(item, parent, tag_index)?;
        trace!(model_type = %model_type, at = %resolved, "inserted");
        Ok(key)
    }

    fn take_item(&mut self, tree: &mut ItemTree, parent: ItemKey, tag_index: &TagIndex) -> ModelResult<Item> {
        let item = tree.take_item(parent, tag_index)?;
        trace!(identifier = %item.identifier(), at = %tag_index, "taken");
        Ok(item)
    }

    fn move_item(
        &mut self,
        tree: &mut ItemTree,
        item: ItemKey,
        new_parent: ItemKey,
        tag_index: &TagIndex,
    ) -> ModelResult<TagIndex> {
        let resolved = tree.move_item(item, new_parent, tag_index)?;
        trace!(at = %resolved, "moved");
        Ok(resolved)
    }

    fn set_data(&mut self, tree: &mut ItemTree, item: ItemKey, value: Variant, role: Role) -> ModelResult<bool> {
        tree.set_data(item, value, role)
    }

    fn replace_root(&mut self, tree: &mut ItemTree, root: Item) -> ModelResult<()> {
        tree.replace_root(root)?;
        debug!(items = tree.len(), "root replaced");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "base"
    }
}

/// Wraps every change into a command and executes it on the stack
pub struct CommandComposer {
    inner: Box<dyn Composer>,
    stack: Rc<RefCell<CommandStack>>,
}

impl CommandComposer {
    pub fn new(inner: Box<dyn Composer>, stack: Rc<RefCell<CommandStack>>) -> Self {
        Self { inner, stack }
    }

    fn run(&mut self, tree: &mut ItemTree, command: Command) -> ModelResult<CommandOutcome> {
        // the stack is borrowed for the whole run of a command
        let mut stack = self
            .stack
            .try_borrow_mut()
            .map_err(|_| ModelError::invalid_operation("cannot modify the model while a command is running"))?;
        stack.execute(command, tree, self.inner.as_mut())
    }
}

fn unexpected(outcome: CommandOutcome) -> ModelError {
    ModelError::invalid_operation(format!("unexpected command outcome {:?}", outcome))
}

impl Composer for CommandComposer {
    fn insert_item(
        &mut self,
        tree: &mut ItemTree,
        item: Item,
        parent: ItemKey,
        tag_index: &TagIndex,
    ) -> ModelResult<ItemKey> {
        let command = InsertItemCommand::new(tree, item, parent, tag_index.clone())?;
        match self.run(tree, Command::new(command))? {
            CommandOutcome::Inserted(key) => Ok(key),
            other => Err(unexpected(other)),
        }
    }

    fn take_item(&mut self, tree: &mut ItemTree, parent: ItemKey, tag_index: &TagIndex) -> ModelResult<Item> {
        let command = RemoveItemCommand::new(tree, parent, tag_index.clone())?;
        match self.run(tree, Command::new(command))? {
            CommandOutcome::Taken(item) => Ok(item),
            other => Err(unexpected(other)),
        }
    }

    fn move_item(
        &mut self,
        tree: &mut ItemTree,
        item: ItemKey,
        new_parent: ItemKey,
        tag_index: &TagIndex,
    ) -> ModelResult<TagIndex> {
        let command = MoveItemCommand::new(tree, item, new_parent, tag_index.clone())?;
        match self.run(tree, Command::new(command))? {
            CommandOutcome::Moved(resolved) => Ok(resolved),
            other => Err(unexpected(other)),
        }
    }

    fn set_data(&mut self, tree: &mut ItemTree, item: ItemKey, value: Variant, role: Role) -> ModelResult<bool> {
        let command = SetDataCommand::new(tree, item, value, role)?;
        match self.run(tree, Command::new(command))? {
            CommandOutcome::DataChanged(changed) => Ok(changed),
            other => Err(unexpected(other)),
        }
    }

    /// Not undoable: the history refers to items that no longer exist
    fn replace_root(&mut self, tree: &mut ItemTree, root: Item) -> ModelResult<()> {
        let mut stack = self
            .stack
            .try_borrow_mut()
            .map_err(|_| ModelError::invalid_operation("cannot reset the model while a command is running"))?;
        self.inner.replace_root(tree, root)?;
        stack.clear();
        Ok(())
    }

    fn name(&self) -> &'static str {
        "command"
    }

    fn stages(&self) -> Vec<&'static str> {
        let mut stages = vec![self.name()];
        stages.extend(self.inner.stages());
        stages
    }
}

/// Emits events around every change that reaches the inner stages.
///
/// Requests are validated before the first event goes out, so a rejected
/// change emits nothing.
pub struct NotifyingComposer {
    inner: Box<dyn Composer>,
    hub: EventHub,
}

impl NotifyingComposer {
    pub fn new(inner: Box<dyn Composer>, hub: EventHub) -> Self {
        Self { inner, hub }
    }
}

impl Composer for NotifyingComposer {
    fn insert_item(
        &mut self,
        tree: &mut ItemTree,
        item: Item,
        parent: ItemKey,
        tag_index: &TagIndex,
    ) -> ModelResult<ItemKey> {
        let resolved = tree.validate_insert(&item, parent, tag_index)?;
        self.hub.notify(ModelEvent::AboutToInsert {
            parent,
            tag_index: resolved.clone(),
        });
        let key = self.inner.insert_item(tree, item, parent, &resolved)?;
        self.hub.notify(ModelEvent::Inserted {
            parent,
            tag_index: resolved,
            item: key,
        });
        Ok(key)
    }

    fn take_item(&mut self, tree: &mut ItemTree, parent: ItemKey, tag_index: &TagIndex) -> ModelResult<Item> {
        let (key, resolved) = tree.validate_take(parent, tag_index)?;
        self.hub.notify(ModelEvent::AboutToRemove {
            parent,
            tag_index: resolved.clone(),
            item: key,
        });
        let item = self.inner.take_item(tree, parent, &resolved)?;
        self.hub.notify(ModelEvent::Removed {
            parent,
            tag_index: resolved,
            identifier: item.identifier().to_string(),
        });
        Ok(item)
    }

    fn move_item(
        &mut self,
        tree: &mut ItemTree,
        item: ItemKey,
        new_parent: ItemKey,
        tag_index: &TagIndex,
    ) -> ModelResult<TagIndex> {
        let target = tree.validate_move(item, new_parent, tag_index)?;
        let old_parent = tree
            .parent_of(item)?
            .ok_or_else(|| ModelError::invalid_move("the root item cannot be moved"))?;
        let old_index = tree.tag_index_of(item)?;
        let identifier = tree.node(item)?.identifier().to_string();

        self.hub.notify(ModelEvent::AboutToRemove {
            parent: old_parent,
            tag_index: old_index.clone(),
            item,
        });
        self.hub.notify(ModelEvent::AboutToInsert {
            parent: new_parent,
            tag_index: target.clone(),
        });
        let resolved = self.inner.move_item(tree, item, new_parent, &target)?;
        self.hub.notify(ModelEvent::Removed {
            parent: old_parent,
            tag_index: old_index,
            identifier,
        });
        self.hub.notify(ModelEvent::Inserted {
            parent: new_parent,
            tag_index: resolved.clone(),
            item,
        });
        Ok(resolved)
    }

    fn set_data(&mut self, tree: &mut ItemTree, item: ItemKey, value: Variant, role: Role) -> ModelResult<bool> {
        let changed = self.inner.set_data(tree, item, value, role)?;
        if changed {
            self.hub.notify(ModelEvent::DataChanged { item, role });
        }
        Ok(changed)
    }

    fn replace_root(&mut self, tree: &mut ItemTree, root: Item) -> ModelResult<()> {
        tree.validate_root(&root)?;
        self.hub.notify(ModelEvent::AboutToReset { root: tree.root() });
        self.inner.replace_root(tree, root)?;
        self.hub.notify(ModelEvent::Reset { root: tree.root() });
        Ok(())
    }

    fn name(&self) -> &'static str {
        "notifying"
    }

    fn stages(&self) -> Vec<&'static str> {
        let mut stages = vec![self.name()];
        stages.extend(self.inner.stages());
        stages
    }
}

/// Assembles composer chains
#[derive(Default)]
pub struct ComposerBuilder {
    hub: Option<EventHub>,
    stack: Option<Rc<RefCell<CommandStack>>>,
}

impl ComposerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Emit events on `hub`
    pub fn notifying(mut self, hub: EventHub) -> Self {
        self.hub = Some(hub);
        self
    }

    /// Record changes on `stack`
    pub fn undoable(mut self, stack: Rc<RefCell<CommandStack>>) -> Self {
        self.stack = Some(stack);
        self
    }

    /// The chain used for regular changes
    pub fn build(&self) -> Box<dyn Composer> {
        let mut composer: Box<dyn Composer> = Box::new(BaseComposer);
        if let Some(stack) = &self.stack {
            composer = Box::new(CommandComposer::new(composer, Rc::clone(stack)));
        }
        self.wrap_notifying(composer)
    }

    /// The chain used to replay recorded commands on undo and redo
    pub fn build_replay(&self) -> Box<dyn Composer> {
        self.wrap_notifying(Box::new(BaseComposer))
    }

    fn wrap_notifying(&self, composer: Box<dyn Composer>) -> Box<dyn Composer> {
        match &self.hub {
            Some(hub) => Box::new(NotifyingComposer::new(composer, hub.clone())),
            None => composer,
        }
    }
}
