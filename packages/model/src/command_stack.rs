//! # Command Stack
//!
//! Undo/redo history of executed commands.
//!
//! ## Design
//!
//! - Executing a command records it on the undo stack
//! - Undo reverts the most recent command and moves it to the redo stack
//! - Redo executes it again
//! - New commands clear the redo stack
//! - Obsolete commands are dropped on execution and skipped on undo/redo
//! - Macros group everything executed between `begin_macro` and `end_macro`
//!   into one entry; macros nest
//! - The undo limit evicts the oldest top-level entries (0 = unlimited)
//!
//! ## Example
//!
//! ```rust,ignore
//! let mut stack = CommandStack::new();
//! stack.execute(Command::new(op), &mut tree, &mut composer)?;
//! stack.undo(&mut tree, &mut composer)?;
//! stack.redo(&mut tree, &mut composer)?;
//! ```

use crate::commands::{Command, CommandOutcome, MacroCommand};
use crate::composer::Composer;
use crate::tree::ItemTree;
use arbor_common::{ModelError, ModelResult};
use tracing::debug;

pub const DEFAULT_UNDO_LIMIT: usize = 100;

#[derive(Debug)]
pub struct CommandStack {
    /// Executed commands (most recent last)
    undo_stack: Vec<Command>,

    /// Undone commands (most recent last)
    redo_stack: Vec<Command>,

    /// Macros being recorded, innermost last
    open_macros: Vec<MacroCommand>,

    /// Maximum number of undo entries (0 = unlimited)
    undo_limit: usize,

    /// Undo stack depth at the last `set_clean`
    clean_index: Option<usize>,

    /// Set while a command is running
    active: bool,
}

impl Default for CommandStack {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandStack {
    pub fn new() -> Self {
        Self::with_undo_limit(DEFAULT_UNDO_LIMIT)
    }

    pub fn with_undo_limit(undo_limit: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            open_macros: Vec::new(),
            undo_limit,
            clean_index: Some(0),
            active: false,
        }
    }

    /// Execute `command` and record it for undo
    pub fn execute(
        &mut self,
        mut command: Command,
        tree: &mut ItemTree,
        composer: &mut dyn Composer,
    ) -> ModelResult<CommandOutcome> {
        self.ensure_idle()?;
        self.active = true;
        let result = command.execute(tree, composer);
        self.active = false;
        let outcome = result?;

        if command.is_obsolete() {
            debug!(command = %command.description(), "dropping obsolete command");
            return Ok(outcome);
        }
        match self.open_macros.last_mut() {
            Some(open) => open.push(command),
            None => self.push(command),
        }
        Ok(outcome)
    }

    /// Start recording a macro; nested calls open nested macros
    pub fn begin_macro(&mut self, name: impl Into<String>) -> ModelResult<()> {
        self.ensure_idle()?;
        let name = name.into();
        debug!(name = %name, depth = self.open_macros.len() + 1, "begin macro");
        self.open_macros.push(MacroCommand::new(name));
        Ok(())
    }

    /// Close the innermost macro and record it as one entry
    pub fn end_macro(&mut self) -> ModelResult<()> {
        self.ensure_idle()?;
        let closed = self
            .open_macros
            .pop()
            .ok_or_else(|| ModelError::invalid_operation("end_macro without a matching begin_macro"))?;
        debug!(name = %closed.name(), commands = closed.len(), "end macro");

        let command = Command::executed(closed);
        if command.is_obsolete() {
            return Ok(());
        }
        match self.open_macros.last_mut() {
            Some(parent) => parent.push(command),
            None => self.push(command),
        }
        Ok(())
    }

    /// Revert the most recent command; returns false when there is nothing to undo
    pub fn undo(&mut self, tree: &mut ItemTree, composer: &mut dyn Composer) -> ModelResult<bool> {
        self.ensure_idle()?;
        self.ensure_no_macro("undo")?;
        while let Some(mut command) = self.undo_stack.pop() {
            if command.is_obsolete() {
                continue;
            }
            self.active = true;
            let result = command.undo(tree, composer);
            self.active = false;
            if let Err(err) = result {
                self.undo_stack.push(command);
                return Err(err);
            }
            debug!(command = %command.description(), "undo");
            self.redo_stack.push(command);
            return Ok(true);
        }
        Ok(false)
    }

    /// Execute the most recently undone command again
    pub fn redo(&mut self, tree: &mut ItemTree, composer: &mut dyn Composer) -> ModelResult<bool> {
        self.ensure_idle()?;
        self.ensure_no_macro("redo")?;
        while let Some(mut command) = self.redo_stack.pop() {
            if command.is_obsolete() {
                continue;
            }
            self.active = true;
            let result = command.execute(tree, composer);
            self.active = false;
            if let Err(err) = result {
                self.redo_stack.push(command);
                return Err(err);
            }
            debug!(command = %command.description(), "redo");
            self.undo_stack.push(command);
            return Ok(true);
        }
        Ok(false)
    }

    pub fn can_undo(&self) -> bool {
        self.open_macros.is_empty() && self.undo_stack.iter().any(|c| !c.is_obsolete())
    }

    pub fn can_redo(&self) -> bool {
        self.open_macros.is_empty() && self.redo_stack.iter().any(|c| !c.is_obsolete())
    }

    /// Description of the entry `undo` would revert
    pub fn undo_text(&self) -> Option<String> {
        self.undo_stack
            .iter()
            .rev()
            .find(|c| !c.is_obsolete())
            .map(Command::description)
    }

    /// Description of the entry `redo` would execute
    pub fn redo_text(&self) -> Option<String> {
        self.redo_stack
            .iter()
            .rev()
            .find(|c| !c.is_obsolete())
            .map(Command::description)
    }

    /// Position in the history: number of entries that can be undone
    pub fn index(&self) -> usize {
        self.undo_stack.len()
    }

    /// Total number of recorded entries
    pub fn count(&self) -> usize {
        self.undo_stack.len() + self.redo_stack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    pub fn macro_depth(&self) -> usize {
        self.open_macros.len()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn undo_limit(&self) -> usize {
        self.undo_limit
    }

    /// Change the limit, evicting the oldest entries beyond it
    pub fn set_undo_limit(&mut self, undo_limit: usize) {
        self.undo_limit = undo_limit;
        self.evict();
    }

    /// Mark the current position as the saved state
    pub fn set_clean(&mut self) {
        self.clean_index = Some(self.undo_stack.len());
    }

    pub fn is_clean(&self) -> bool {
        self.clean_index == Some(self.undo_stack.len())
    }

    /// Drop the whole history, open macros included
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.open_macros.clear();
        self.clean_index = Some(0);
    }

    fn push(&mut self, command: Command) {
        if self.clean_index.is_some_and(|clean| clean > self.undo_stack.len()) {
            self.clean_index = None;
        }
        self.redo_stack.clear();
        self.undo_stack.push(command);
        self.evict();
    }

    fn evict(&mut self) {
        if self.undo_limit == 0 || self.undo_stack.len() <= self.undo_limit {
            return;
        }
        let excess = self.undo_stack.len() - self.undo_limit;
        self.undo_stack.drain(..excess);
        self.clean_index = self.clean_index.and_then(|clean| clean.checked_sub(excess));
        debug!(evicted = excess, limit = self.undo_limit, "undo limit reached");
    }

    fn ensure_idle(&self) -> ModelResult<()> {
        if self.active {
            return Err(ModelError::invalid_operation("a command is already running"));
        }
        Ok(())
    }

    fn ensure_no_macro(&self, action: &str) -> ModelResult<()> {
        if !self.open_macros.is_empty() {
            return Err(ModelError::invalid_operation(format!(
                "cannot {} while a macro is open",
                action
            )));
        }
        Ok(())
    }
}
