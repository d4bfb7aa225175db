//! # Commands
//!
//! Undoable mutations recorded by the [`CommandStack`](crate::CommandStack).
//!
//! Commands address items by identifier and [`TagIndex`], never by arena
//! key: a key dies when its subtree is taken, while the identifier comes
//! back with the subtree on undo.
//!
//! ## Lifecycle
//!
//! ```text
//!  Initial ──execute──▶ AfterExecute ──undo──▶ AfterUndo
//!                            ▲                     │
//!                            └───────execute───────┘
//! ```
//!
//! A command that turned out to change nothing marks itself *obsolete*; the
//! stack drops it instead of recording it, and never undoes it.

use crate::composer::Composer;
use crate::item::Item;
use crate::tag::TagIndex;
use crate::tree::{ItemKey, ItemTree};
use arbor_common::roles::Role;
use arbor_common::{ModelError, ModelResult, Variant};
use std::fmt;
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandState {
    Initial,
    AfterExecute,
    AfterUndo,
}

/// What an executed command hands back to its caller
#[derive(Debug)]
pub enum CommandOutcome {
    Inserted(ItemKey),
    Taken(Item),
    Moved(TagIndex),
    DataChanged(bool),
    Nothing,
}

/// Trait for undoable operations
///
/// Implementations capture whatever they need to invert themselves while
/// executing, and must apply every change through the given composer.
pub trait CommandOp: fmt::Debug {
    fn execute(&mut self, tree: &mut ItemTree, composer: &mut dyn Composer) -> ModelResult<CommandOutcome>;

    fn undo(&mut self, tree: &mut ItemTree, composer: &mut dyn Composer) -> ModelResult<()>;

    /// Human readable text shown for undo/redo entries
    fn description(&self) -> String;

    /// Whether the last execution left the model unchanged
    fn is_obsolete(&self) -> bool {
        false
    }
}

/// A [`CommandOp`] together with its lifecycle state
#[derive(Debug)]
pub struct Command {
    op: Box<dyn CommandOp>,
    state: CommandState,
    obsolete: bool,
}

impl Command {
    pub fn new(op: impl CommandOp + 'static) -> Self {
        Self {
            op: Box::new(op),
            state: CommandState::Initial,
            obsolete: false,
        }
    }

    /// Wrap an operation whose effects are already applied
    pub(crate) fn executed(op: impl CommandOp + 'static) -> Self {
        let obsolete = op.is_obsolete();
        Self {
            op: Box::new(op),
            state: CommandState::AfterExecute,
            obsolete,
        }
    }

    pub fn state(&self) -> CommandState {
        self.state
    }

    pub fn is_obsolete(&self) -> bool {
        self.obsolete
    }

    pub fn set_obsolete(&mut self, obsolete: bool) {
        self.obsolete = obsolete;
    }

    pub fn description(&self) -> String {
        self.op.description()
    }

    /// Run the command; allowed on a fresh or an undone command
    pub fn execute(&mut self, tree: &mut ItemTree, composer: &mut dyn Composer) -> ModelResult<CommandOutcome> {
        if self.state == CommandState::AfterExecute {
            return Err(ModelError::invalid_operation(format!(
                "'{}' has already been executed",
                self.description()
            )));
        }
        let outcome = self.op.execute(tree, composer)?;
        self.state = CommandState::AfterExecute;
        self.obsolete = self.op.is_obsolete();
        trace!(command = %self.description(), obsolete = self.obsolete, "executed");
        Ok(outcome)
    }

    /// Revert the command; only an executed, non-obsolete command can be undone
    pub fn undo(&mut self, tree: &mut ItemTree, composer: &mut dyn Composer) -> ModelResult<()> {
        if self.state != CommandState::AfterExecute {
            return Err(ModelError::invalid_operation(format!(
                "'{}' has not been executed",
                self.description()
            )));
        }
        if self.obsolete {
            return Err(ModelError::invalid_operation(format!(
                "'{}' is obsolete",
                self.description()
            )));
        }
        self.op.undo(tree, composer)?;
        self.state = CommandState::AfterUndo;
        trace!(command = %self.description(), "undone");
        Ok(())
    }
}

fn find(tree: &ItemTree, identifier: &str) -> ModelResult<ItemKey> {
    tree.find(identifier)
        .ok_or_else(|| ModelError::not_found(format!("no item with identifier '{}'", identifier)))
}

fn identifier(tree: &ItemTree, key: ItemKey) -> ModelResult<String> {
    Ok(tree.node(key)?.identifier().to_string())
}

/// Insert a detached item under a parent
#[derive(Debug)]
pub struct InsertItemCommand {
    parent: String,
    tag_index: TagIndex,
    item: Option<Item>,
    model_type: String,
    inserted_at: Option<TagIndex>,
}

impl InsertItemCommand {
    pub fn new(tree: &ItemTree, item: Item, parent: ItemKey, tag_index: TagIndex) -> ModelResult<Self> {
        Ok(Self {
            parent: identifier(tree, parent)?,
            tag_index,
            model_type: item.model_type().to_string(),
            item: Some(item),
            inserted_at: None,
        })
    }
}

impl CommandOp for InsertItemCommand {
    fn execute(&mut self, tree: &mut ItemTree, composer: &mut dyn Composer) -> ModelResult<CommandOutcome> {
        let parent = find(tree, &self.parent)?;
        let item = self
            .item
            .as_ref()
            .ok_or_else(|| ModelError::null_argument("nothing to insert"))?;
        // keep the item if the insert is going to be rejected
        tree.validate_insert(item, parent, &self.tag_index)?;
        let item = self
            .item
            .take()
            .ok_or_else(|| ModelError::null_argument("nothing to insert"))?;
        let key = composer.insert_item(tree, item, parent, &self.tag_index)?;
        self.inserted_at = Some(tree.tag_index_of(key)?);
        Ok(CommandOutcome::Inserted(key))
    }

    fn undo(&mut self, tree: &mut ItemTree, composer: &mut dyn Composer) -> ModelResult<()> {
        let parent = find(tree, &self.parent)?;
        let at = self
            .inserted_at
            .clone()
            .ok_or_else(|| ModelError::invalid_operation("insert was never applied"))?;
        self.item = Some(composer.take_item(tree, parent, &at)?);
        Ok(())
    }

    fn description(&self) -> String {
        format!("Insert {}", self.model_type)
    }
}

/// Detach the item at a position; the subtree is kept to restore it on undo
#[derive(Debug)]
pub struct RemoveItemCommand {
    parent: String,
    tag_index: TagIndex,
    backup: Option<Item>,
    removed_from: Option<TagIndex>,
}

impl RemoveItemCommand {
    pub fn new(tree: &ItemTree, parent: ItemKey, tag_index: TagIndex) -> ModelResult<Self> {
        Ok(Self {
            parent: identifier(tree, parent)?,
            tag_index,
            backup: None,
            removed_from: None,
        })
    }
}

impl CommandOp for RemoveItemCommand {
    fn execute(&mut self, tree: &mut ItemTree, composer: &mut dyn Composer) -> ModelResult<CommandOutcome> {
        let parent = find(tree, &self.parent)?;
        let (_, resolved) = tree.validate_take(parent, &self.tag_index)?;
        let item = composer.take_item(tree, parent, &resolved)?;
        self.backup = Some(item.clone());
        self.removed_from = Some(resolved);
        Ok(CommandOutcome::Taken(item))
    }

    fn undo(&mut self, tree: &mut ItemTree, composer: &mut dyn Composer) -> ModelResult<()> {
        let parent = find(tree, &self.parent)?;
        let at = self
            .removed_from
            .clone()
            .ok_or_else(|| ModelError::invalid_operation("remove was never applied"))?;
        let backup = self
            .backup
            .as_ref()
            .ok_or_else(|| ModelError::invalid_operation("remove was never applied"))?;
        tree.validate_insert(backup, parent, &at)?;
        if let Some(item) = self.backup.take() {
            composer.insert_item(tree, item, parent, &at)?;
        }
        Ok(())
    }

    fn description(&self) -> String {
        format!("Remove item at {}", self.tag_index)
    }
}

/// Relocate an attached item
#[derive(Debug)]
pub struct MoveItemCommand {
    item: String,
    new_parent: String,
    tag_index: TagIndex,
    origin: Option<(String, TagIndex)>,
}

impl MoveItemCommand {
    pub fn new(tree: &ItemTree, item: ItemKey, new_parent: ItemKey, tag_index: TagIndex) -> ModelResult<Self> {
        Ok(Self {
            item: identifier(tree, item)?,
            new_parent: identifier(tree, new_parent)?,
            tag_index,
            origin: None,
        })
    }
}

impl CommandOp for MoveItemCommand {
    fn execute(&mut self, tree: &mut ItemTree, composer: &mut dyn Composer) -> ModelResult<CommandOutcome> {
        let key = find(tree, &self.item)?;
        let new_parent = find(tree, &self.new_parent)?;
        let old_parent = tree
            .parent_of(key)?
            .ok_or_else(|| ModelError::invalid_move("the root item cannot be moved"))?;
        let old_index = tree.tag_index_of(key)?;
        let old_parent = identifier(tree, old_parent)?;
        let resolved = composer.move_item(tree, key, new_parent, &self.tag_index)?;
        self.origin = Some((old_parent, old_index));
        Ok(CommandOutcome::Moved(resolved))
    }

    fn undo(&mut self, tree: &mut ItemTree, composer: &mut dyn Composer) -> ModelResult<()> {
        let (parent, index) = self
            .origin
            .clone()
            .ok_or_else(|| ModelError::invalid_operation("move was never applied"))?;
        let key = find(tree, &self.item)?;
        let parent = find(tree, &parent)?;
        composer.move_item(tree, key, parent, &index)?;
        Ok(())
    }

    fn description(&self) -> String {
        format!("Move item to {}", self.tag_index)
    }
}

/// Assign a role value; obsolete when the value was already there
#[derive(Debug)]
pub struct SetDataCommand {
    item: String,
    role: Role,
    value: Variant,
    previous: Option<Variant>,
    obsolete: bool,
}

impl SetDataCommand {
    pub fn new(tree: &ItemTree, item: ItemKey, value: Variant, role: Role) -> ModelResult<Self> {
        Ok(Self {
            item: identifier(tree, item)?,
            role,
            value,
            previous: None,
            obsolete: false,
        })
    }
}

impl CommandOp for SetDataCommand {
    fn execute(&mut self, tree: &mut ItemTree, composer: &mut dyn Composer) -> ModelResult<CommandOutcome> {
        let key = find(tree, &self.item)?;
        let previous = tree.data(key, self.role)?;
        let changed = composer.set_data(tree, key, self.value.clone(), self.role)?;
        self.obsolete = !changed;
        self.previous = Some(previous);
        Ok(CommandOutcome::DataChanged(changed))
    }

    fn undo(&mut self, tree: &mut ItemTree, composer: &mut dyn Composer) -> ModelResult<()> {
        let key = find(tree, &self.item)?;
        let previous = self
            .previous
            .clone()
            .ok_or_else(|| ModelError::invalid_operation("set data was never applied"))?;
        composer.set_data(tree, key, previous, self.role)?;
        Ok(())
    }

    fn description(&self) -> String {
        format!("Set role {} to {}", self.role, self.value)
    }

    fn is_obsolete(&self) -> bool {
        self.obsolete
    }
}

/// Commands recorded between `begin_macro` and `end_macro`, undone and
/// redone as one unit
#[derive(Debug)]
pub struct MacroCommand {
    name: String,
    children: Vec<Command>,
}

impl MacroCommand {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            children: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn push(&mut self, command: Command) {
        self.children.push(command);
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }
}

impl CommandOp for MacroCommand {
    fn execute(&mut self, tree: &mut ItemTree, composer: &mut dyn Composer) -> ModelResult<CommandOutcome> {
        for child in self.children.iter_mut().filter(|child| !child.is_obsolete()) {
            child.execute(tree, composer)?;
        }
        Ok(CommandOutcome::Nothing)
    }

    fn undo(&mut self, tree: &mut ItemTree, composer: &mut dyn Composer) -> ModelResult<()> {
        for child in self.children.iter_mut().rev().filter(|child| !child.is_obsolete()) {
            child.undo(tree, composer)?;
        }
        Ok(())
    }

    fn description(&self) -> String {
        self.name.clone()
    }

    fn is_obsolete(&self) -> bool {
        self.children.iter().all(Command::is_obsolete)
    }
}
