//! # Arbor Model
//!
//! Hierarchical item store with schema-checked children, undo/redo and
//! change notification.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ Model: public operations + lookups          │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ Composer pipeline                           │
//! │  - NotifyingComposer: events to EventHub    │
//! │  - CommandComposer: records on CommandStack │
//! │  - BaseComposer: applies to the tree        │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ ItemTree: arena of items + ItemPool         │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Core Principles
//!
//! 1. **Validate, then mutate**: a failing call leaves the model untouched
//! 2. **Identity over position**: items are referenced by identifier across
//!    moves, undo and serialization
//! 3. **One owner thread**: background work hands results back through a
//!    [`ThreadSafeQueue`]
//!
//! ## Usage
//!
//! ```rust,ignore
//! use arbor_model::{roles, standard_items::CONTAINER_ITEM, Model, ModelDocument, TagIndex};
//!
//! let mut model = Model::new("SampleModel")?;
//! let root = model.root_item();
//!
//! model.begin_macro("Add box")?;
//! let key = model.insert_new_item(CONTAINER_ITEM, root, &TagIndex::append(""))?;
//! model.set_data(key, "Box", roles::DISPLAY)?;
//! model.end_macro()?;
//!
//! model.undo()?; // both changes reverted
//!
//! let mut document = ModelDocument::new("arbor", vec![&mut model]);
//! document.save("session.json")?;
//! ```

mod command_stack;
mod commands;
mod composer;
mod config;
mod converter;
mod document;
mod error;
mod events;
mod factory;
mod item;
mod model;
mod pool;
mod progress;
mod queue;
mod tag;
mod tree;
mod visitor;

pub mod standard_items;

pub use command_stack::{CommandStack, DEFAULT_UNDO_LIMIT};
pub use commands::{
    Command, CommandOp, CommandOutcome, CommandState, InsertItemCommand, MacroCommand, MoveItemCommand,
    RemoveItemCommand, SetDataCommand,
};
pub use composer::{BaseComposer, CommandComposer, Composer, ComposerBuilder, NotifyingComposer};
pub use config::{ModelConfig, DEFAULT_CONFIG_NAME};
pub use converter::{copy_item, ConverterMode, ItemConverter, StructuredNode};
pub use document::{DocumentHeader, ModelDocument, DOCUMENT_VERSION};
pub use error::{StoreError, StoreResult};
pub use events::{Connection, EventHub, EventKind, ModelEvent, SubscriptionScope};
pub use factory::{ItemConstructor, ItemFactory};
pub use item::{Item, ItemData};
pub use model::{Model, ModelBuilder};
pub use pool::{new_identifier, ItemPool};
pub use progress::{ProgressCallback, ProgressHandler};
pub use queue::{QueueError, ThreadSafeQueue};
pub use tag::{TagContainer, TagIndex, TagInfo, TaggedItems, APPEND};
pub use tree::{ItemKey, ItemNode, ItemTree};
pub use visitor::{walk_item, walk_tag, IdentifierCollector, ItemVisitor};

// Re-export common types for convenience
pub use arbor_common::{roles, ModelError, ModelResult, Variant, VariantKind};
