//! # Tags
//!
//! Children of an item live in named, schema-constrained slots ("tags").
//! Each tag declares a cardinality range and an optional allow-list of child
//! types. Children are addressed exclusively through a [`TagIndex`]: a tag
//! name plus a position inside that tag, never a flat offset across tags.
//!
//! [`TaggedItems`] is generic over the child representation so the same
//! schema logic serves detached items (which own their children) and items
//! attached to a tree (which hold arena handles).

use arbor_common::{ModelError, ModelResult};
use std::fmt;

/// Position sentinel meaning "after the last child"
pub const APPEND: i32 = -1;

/// Schema of one named child slot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagInfo {
    name: String,
    min: i32,
    max: i32,
    allowed_types: Vec<String>,
}

impl TagInfo {
    /// `max == -1` means unbounded. An empty allow-list accepts any type.
    pub fn new(
        name: impl Into<String>,
        min: i32,
        max: i32,
        allowed_types: Vec<String>,
    ) -> ModelResult<Self> {
        let name = name.into();
        if min < 0 || max < -1 || (max >= 0 && min > max) {
            return Err(ModelError::invalid_operation(format!(
                "tag '{}' has invalid cardinality [{}, {}]",
                name, min, max
            )));
        }
        Ok(Self {
            name,
            min,
            max,
            allowed_types,
        })
    }

    /// Any number of children of any type
    pub fn universal(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            min: 0,
            max: -1,
            allowed_types: Vec::new(),
        }
    }

    /// Exactly one child of the given type
    pub fn property(name: impl Into<String>, model_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            min: 1,
            max: 1,
            allowed_types: vec![model_type.into()],
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn min(&self) -> i32 {
        self.min
    }

    pub fn max(&self) -> i32 {
        self.max
    }

    pub fn allowed_types(&self) -> &[String] {
        &self.allowed_types
    }

    pub fn is_unbounded(&self) -> bool {
        self.max == -1
    }

    pub fn is_valid_type(&self, model_type: &str) -> bool {
        self.allowed_types.is_empty() || self.allowed_types.iter().any(|t| t == model_type)
    }

    pub fn is_single_property(&self) -> bool {
        self.min == 1 && self.max == 1 && self.allowed_types.len() == 1
    }

    pub(crate) fn has_room(&self, count: usize) -> bool {
        self.is_unbounded() || (count as i64) < self.max as i64
    }
}

/// Address of a child: tag name plus position inside the tag.
///
/// An empty tag name addresses the owner's default tag; position
/// [`APPEND`] addresses the slot after the last child.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TagIndex {
    pub tag: String,
    pub index: i32,
}

impl TagIndex {
    pub fn new(tag: impl Into<String>, index: i32) -> Self {
        Self {
            tag: tag.into(),
            index,
        }
    }

    pub fn append(tag: impl Into<String>) -> Self {
        Self::new(tag, APPEND)
    }

    pub fn prepend(tag: impl Into<String>) -> Self {
        Self::new(tag, 0)
    }

    /// Position in the default tag
    pub fn default_tag(index: i32) -> Self {
        Self::new("", index)
    }

    pub fn is_append(&self) -> bool {
        self.index == APPEND
    }

    pub fn next(&self) -> Self {
        Self::new(self.tag.clone(), self.index + 1)
    }

    pub fn prev(&self) -> Self {
        Self::new(self.tag.clone(), self.index - 1)
    }
}

impl fmt::Display for TagIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "('{}', {})", self.tag, self.index)
    }
}

/// Children registered under one tag, in order
#[derive(Debug, Clone, PartialEq)]
pub struct TagContainer<C> {
    info: TagInfo,
    items: Vec<C>,
}

impl<C> TagContainer<C> {
    pub fn info(&self) -> &TagInfo {
        &self.info
    }

    pub fn items(&self) -> &[C] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Ordered list of tags with their children
#[derive(Debug, Clone, PartialEq)]
pub struct TaggedItems<C> {
    containers: Vec<TagContainer<C>>,
    default_tag: Option<String>,
}

impl<C> Default for TaggedItems<C> {
    fn default() -> Self {
        Self {
            containers: Vec::new(),
            default_tag: None,
        }
    }
}

impl<C> TaggedItems<C> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a tag; fails with `ExistingKey` if the name is taken
    pub fn register_tag(&mut self, info: TagInfo, set_as_default: bool) -> ModelResult<()> {
        if self.has_tag(info.name()) {
            return Err(ModelError::existing_key(format!(
                "tag '{}' is already registered",
                info.name()
            )));
        }
        self.push_container(info, Vec::new(), set_as_default);
        Ok(())
    }

    /// Append a tag already holding `items`. The name must not be registered.
    pub(crate) fn push_container(&mut self, info: TagInfo, items: Vec<C>, set_as_default: bool) {
        debug_assert!(!self.has_tag(info.name()), "duplicate tag '{}'", info.name());
        if set_as_default {
            self.default_tag = Some(info.name().to_string());
        }
        self.containers.push(TagContainer { info, items });
    }

    pub fn has_tag(&self, name: &str) -> bool {
        self.containers.iter().any(|c| c.info.name() == name)
    }

    pub fn default_tag(&self) -> Option<&str> {
        self.default_tag.as_deref()
    }

    pub fn set_default_tag(&mut self, name: &str) -> ModelResult<()> {
        if !self.has_tag(name) {
            return Err(ModelError::not_found(format!("tag '{}'", name)));
        }
        self.default_tag = Some(name.to_string());
        Ok(())
    }

    /// Map an empty tag name to the default tag
    pub fn resolve_tag<'a>(&'a self, tag: &'a str) -> Option<&'a str> {
        if tag.is_empty() {
            self.default_tag.as_deref()
        } else {
            Some(tag)
        }
    }

    fn position_of(&self, tag: &str) -> Option<usize> {
        let name = self.resolve_tag(tag)?;
        self.containers.iter().position(|c| c.info.name() == name)
    }

    pub fn container(&self, tag: &str) -> ModelResult<&TagContainer<C>> {
        self.position_of(tag)
            .map(|pos| &self.containers[pos])
            .ok_or_else(|| ModelError::not_found(format!("tag '{}'", tag)))
    }

    fn container_mut(&mut self, tag: &str) -> ModelResult<&mut TagContainer<C>> {
        match self.position_of(tag) {
            Some(pos) => Ok(&mut self.containers[pos]),
            None => Err(ModelError::not_found(format!("tag '{}'", tag))),
        }
    }

    pub fn tag_info(&self, tag: &str) -> ModelResult<&TagInfo> {
        self.container(tag).map(|c| &c.info)
    }

    pub fn containers(&self) -> impl Iterator<Item = &TagContainer<C>> {
        self.containers.iter()
    }

    pub fn count(&self, tag: &str) -> ModelResult<usize> {
        self.container(tag).map(|c| c.len())
    }

    /// Validate an insertion and return the index with the tag name and
    /// append position resolved
    pub fn insert_index(&self, model_type: &str, tag_index: &TagIndex) -> ModelResult<TagIndex> {
        let container = self
            .container(&tag_index.tag)
            .map_err(|_| ModelError::invalid_insert(format!("no tag {}", tag_index)))?;
        let info = &container.info;
        if !info.is_valid_type(model_type) {
            return Err(ModelError::invalid_insert(format!(
                "type '{}' is not allowed in tag '{}'",
                model_type,
                info.name()
            )));
        }
        let count = container.len();
        if !info.has_room(count) {
            return Err(ModelError::invalid_insert(format!(
                "tag '{}' is full ({} of {})",
                info.name(),
                count,
                info.max()
            )));
        }
        let position = if tag_index.is_append() {
            count
        } else if tag_index.index >= 0 && (tag_index.index as usize) <= count {
            tag_index.index as usize
        } else {
            return Err(ModelError::invalid_insert(format!(
                "position {} is outside tag '{}' of {} items",
                tag_index.index,
                info.name(),
                count
            )));
        };
        Ok(TagIndex::new(info.name(), position as i32))
    }

    pub fn can_insert(&self, model_type: &str, tag_index: &TagIndex) -> bool {
        self.insert_index(model_type, tag_index).is_ok()
    }

    /// Splice `child` into the addressed slot, returning the resolved index
    pub fn insert(&mut self, child: C, model_type: &str, tag_index: &TagIndex) -> ModelResult<TagIndex> {
        let resolved = self.insert_index(model_type, tag_index)?;
        let container = self.container_mut(&resolved.tag)?;
        container.items.insert(resolved.index as usize, child);
        Ok(resolved)
    }

    /// Resolve an index addressing an existing child
    pub fn existing_index(&self, tag_index: &TagIndex) -> ModelResult<TagIndex> {
        let container = self.container(&tag_index.tag)?;
        if tag_index.index < 0 || tag_index.index as usize >= container.len() {
            return Err(ModelError::not_found(format!("no item at {}", tag_index)));
        }
        Ok(TagIndex::new(container.info.name(), tag_index.index))
    }

    /// Whether the slot holds a child and removing it keeps the tag at or
    /// above its minimum
    pub fn can_take(&self, tag_index: &TagIndex) -> bool {
        match self.existing_index(tag_index) {
            Ok(resolved) => self
                .container(&resolved.tag)
                .map(|c| c.len() as i64 > c.info.min() as i64)
                .unwrap_or(false),
            Err(_) => false,
        }
    }

    /// Remove and return the child at `tag_index`. Tag minimums are not
    /// enforced here; see [`TaggedItems::can_take`].
    pub fn take(&mut self, tag_index: &TagIndex) -> ModelResult<C> {
        let resolved = self
            .existing_index(tag_index)
            .map_err(|_| ModelError::invalid_move(format!("no item to take at {}", tag_index)))?;
        let container = self.container_mut(&resolved.tag)?;
        Ok(container.items.remove(resolved.index as usize))
    }

    /// Remove every child of `tag`, ignoring its minimum
    pub(crate) fn clear_tag(&mut self, tag: &str) -> ModelResult<Vec<C>> {
        let container = self.container_mut(tag)?;
        Ok(std::mem::take(&mut container.items))
    }

    pub fn get(&self, tag_index: &TagIndex) -> ModelResult<&C> {
        let resolved = self.existing_index(tag_index)?;
        let container = self.container(&resolved.tag)?;
        Ok(&container.items[resolved.index as usize])
    }

    pub fn get_mut(&mut self, tag_index: &TagIndex) -> ModelResult<&mut C> {
        let resolved = self.existing_index(tag_index)?;
        let container = self.container_mut(&resolved.tag)?;
        Ok(&mut container.items[resolved.index as usize])
    }

    pub fn items(&self, tag: &str) -> ModelResult<&[C]> {
        self.container(tag).map(|c| c.items())
    }

    /// Children of every tag, in tag order
    pub fn all_items(&self) -> impl Iterator<Item = &C> {
        self.containers.iter().flat_map(|c| c.items.iter())
    }

    pub fn all_items_mut(&mut self) -> impl Iterator<Item = &mut C> {
        self.containers.iter_mut().flat_map(|c| c.items.iter_mut())
    }

    pub fn find_index(&self, mut predicate: impl FnMut(&C) -> bool) -> Option<TagIndex> {
        for container in &self.containers {
            if let Some(pos) = container.items.iter().position(&mut predicate) {
                return Some(TagIndex::new(container.info.name(), pos as i32));
            }
        }
        None
    }

    /// Convert every child, keeping tag schema and order
    pub fn try_map<D, E>(self, mut f: impl FnMut(C) -> Result<D, E>) -> Result<TaggedItems<D>, E> {
        let mut containers = Vec::with_capacity(self.containers.len());
        for container in self.containers {
            let items = container
                .items
                .into_iter()
                .map(&mut f)
                .collect::<Result<Vec<_>, E>>()?;
            containers.push(TagContainer {
                info: container.info,
                items,
            });
        }
        Ok(TaggedItems {
            containers,
            default_tag: self.default_tag,
        })
    }

    /// Same schema with no children
    pub fn schema<D>(&self) -> TaggedItems<D> {
        TaggedItems {
            containers: self
                .containers
                .iter()
                .map(|c| TagContainer {
                    info: c.info.clone(),
                    items: Vec::new(),
                })
                .collect(),
            default_tag: self.default_tag.clone(),
        }
    }
}
