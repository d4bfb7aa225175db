//! # Item Tree
//!
//! Arena holding the items attached to a model.
//!
//! Nodes live in a slab of generational entries; parent and child links are
//! [`ItemKey`] handles into that slab, so detaching and reattaching never
//! leaves a dangling reference behind (a stale key simply stops resolving).
//! Every attached node is registered in the tree's [`ItemPool`].
//!
//! All operations validate before touching anything: a failing call leaves
//! the arena and the pool exactly as they were.

use crate::item::{Item, ItemData};
use crate::pool::ItemPool;
use crate::tag::{TagIndex, TaggedItems};
use crate::visitor::IdentifierCollector;
use arbor_common::roles::{self, Role};
use arbor_common::{ModelError, ModelResult, Variant};
use std::collections::HashSet;

/// Generational handle of an attached item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemKey {
    index: u32,
    generation: u32,
}

impl ItemKey {
    pub(crate) fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }
}

/// An item attached to a tree
#[derive(Debug)]
pub struct ItemNode {
    identifier: String,
    model_type: String,
    data: ItemData,
    tags: TaggedItems<ItemKey>,
    parent: Option<ItemKey>,
}

impl ItemNode {
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn model_type(&self) -> &str {
        &self.model_type
    }

    pub fn data(&self, role: Role) -> Variant {
        self.data.data(role)
    }

    pub fn item_data(&self) -> &ItemData {
        &self.data
    }

    pub fn tags(&self) -> &TaggedItems<ItemKey> {
        &self.tags
    }

    pub fn parent(&self) -> Option<ItemKey> {
        self.parent
    }

    pub fn display_name(&self) -> String {
        self.data
            .data(roles::DISPLAY)
            .as_str()
            .map(str::to_string)
            .unwrap_or_else(|| self.model_type.clone())
    }

    pub fn can_insert(&self, candidate_type: &str, tag_index: &TagIndex) -> bool {
        self.tags.can_insert(candidate_type, tag_index)
    }
}

#[derive(Debug)]
enum Entry {
    Occupied { generation: u32, node: ItemNode },
    Vacant { generation: u32, next_free: Option<u32> },
}

#[derive(Debug)]
pub struct ItemTree {
    entries: Vec<Entry>,
    free_head: Option<u32>,
    len: usize,
    pool: ItemPool,
    root: ItemKey,
}

impl ItemTree {
    pub fn new(root: Item) -> ModelResult<Self> {
        validate_unique(&root, &ItemPool::new())?;
        let mut tree = Self {
            entries: Vec::new(),
            free_head: None,
            len: 0,
            pool: ItemPool::new(),
            root: ItemKey::new(0, 0),
        };
        tree.root = tree.spawn(root, None)?;
        Ok(tree)
    }

    pub fn root(&self) -> ItemKey {
        self.root
    }

    pub fn pool(&self) -> &ItemPool {
        &self.pool
    }

    /// Number of attached items, root included
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn contains(&self, key: ItemKey) -> bool {
        self.get(key).is_some()
    }

    pub fn get(&self, key: ItemKey) -> Option<&ItemNode> {
        match self.entries.get(key.index as usize) {
            Some(Entry::Occupied { generation, node }) if *generation == key.generation => Some(node),
            _ => None,
        }
    }

    pub fn node(&self, key: ItemKey) -> ModelResult<&ItemNode> {
        self.get(key)
            .ok_or_else(|| ModelError::not_found(format!("item {:?}", key)))
    }

    fn node_mut(&mut self, key: ItemKey) -> ModelResult<&mut ItemNode> {
        match self.entries.get_mut(key.index as usize) {
            Some(Entry::Occupied { generation, node }) if *generation == key.generation => Ok(node),
            _ => Err(ModelError::not_found(format!("item {:?}", key))),
        }
    }

    pub fn find(&self, identifier: &str) -> Option<ItemKey> {
        self.pool.find(identifier)
    }

    pub fn identifier_of(&self, key: ItemKey) -> Option<&str> {
        self.pool.identifier_of(key)
    }

    pub fn parent_of(&self, key: ItemKey) -> ModelResult<Option<ItemKey>> {
        self.node(key).map(|node| node.parent)
    }

    /// Location of `key` inside its parent
    pub fn tag_index_of(&self, key: ItemKey) -> ModelResult<TagIndex> {
        let parent = self
            .parent_of(key)?
            .ok_or_else(|| ModelError::not_found("the root item has no parent"))?;
        self.node(parent)?
            .tags
            .find_index(|child| *child == key)
            .ok_or_else(|| ModelError::not_found(format!("item {:?} is not a child of its parent", key)))
    }

    pub fn get_item(&self, parent: ItemKey, tag_index: &TagIndex) -> ModelResult<ItemKey> {
        self.node(parent)?.tags.get(tag_index).copied()
    }

    pub fn items(&self, parent: ItemKey, tag: &str) -> ModelResult<&[ItemKey]> {
        self.node(parent)?.tags.items(tag)
    }

    pub fn children(&self, key: ItemKey) -> ModelResult<Vec<ItemKey>> {
        Ok(self.node(key)?.tags.all_items().copied().collect())
    }

    /// `key` and all its descendants, depth first
    pub fn descendants(&self, key: ItemKey) -> ModelResult<Vec<ItemKey>> {
        let mut result = Vec::new();
        let mut pending = vec![key];
        while let Some(current) = pending.pop() {
            let node = self.node(current)?;
            result.push(current);
            let children: Vec<_> = node.tags.all_items().copied().collect();
            pending.extend(children.into_iter().rev());
        }
        Ok(result)
    }

    /// Whether `ancestor` lies on the parent chain of `key`
    pub fn is_ancestor(&self, ancestor: ItemKey, key: ItemKey) -> bool {
        let mut current = self.get(key).and_then(|node| node.parent);
        while let Some(parent) = current {
            if parent == ancestor {
                return true;
            }
            current = self.get(parent).and_then(|node| node.parent);
        }
        false
    }

    pub fn data(&self, key: ItemKey, role: Role) -> ModelResult<Variant> {
        self.node(key).map(|node| node.data(role))
    }

    /// Check that `item` can go to `tag_index` of `parent`; returns the
    /// resolved index
    pub fn validate_insert(&self, item: &Item, parent: ItemKey, tag_index: &TagIndex) -> ModelResult<TagIndex> {
        let resolved = self
            .node(parent)?
            .tags
            .insert_index(item.model_type(), tag_index)?;
        validate_unique(item, &self.pool)?;
        Ok(resolved)
    }

    pub fn insert_item(&mut self, item: Item, parent: ItemKey, tag_index: &TagIndex) -> ModelResult<(ItemKey, TagIndex)> {
        let resolved = self.validate_insert(&item, parent, tag_index)?;
        let model_type = item.model_type().to_string();
        let key = self.spawn(item, Some(parent))?;
        self.node_mut(parent)?
            .tags
            .insert(key, &model_type, &resolved)?;
        Ok((key, resolved))
    }

    /// Check that `tag_index` of `parent` holds a child; returns its key and
    /// the resolved index. Tag minimums are not checked here, see
    /// [`ItemTree::check_take_minimum`].
    pub fn validate_take(&self, parent: ItemKey, tag_index: &TagIndex) -> ModelResult<(ItemKey, TagIndex)> {
        let tags = &self.node(parent)?.tags;
        let resolved = tags
            .existing_index(tag_index)
            .map_err(|_| ModelError::invalid_move(format!("no item to take at {}", tag_index)))?;
        let key = *tags.get(&resolved)?;
        Ok((key, resolved))
    }

    /// Fail with `InvalidMove` when removing the child at `tag_index` would
    /// take its tag under the minimum
    pub fn check_take_minimum(&self, parent: ItemKey, tag_index: &TagIndex) -> ModelResult<()> {
        let tags = &self.node(parent)?.tags;
        if !tags.can_take(tag_index) {
            let tag = tags.resolve_tag(&tag_index.tag).unwrap_or_default();
            return Err(ModelError::invalid_move(format!(
                "taking {} would leave tag '{}' under its minimum",
                tag_index, tag
            )));
        }
        Ok(())
    }

    /// Detach the child at `tag_index` and hand it back as an owned subtree
    pub fn take_item(&mut self, parent: ItemKey, tag_index: &TagIndex) -> ModelResult<Item> {
        let (_, resolved) = self.validate_take(parent, tag_index)?;
        let key = self.node_mut(parent)?.tags.take(&resolved)?;
        self.collapse(key)
    }

    /// Check a relocation of `key` to `tag_index` of `new_parent`.
    ///
    /// The target position is expressed in the target tag as it looks after
    /// `key` has been removed from its current place. The source tag minimum
    /// is not checked.
    pub fn validate_move(&self, key: ItemKey, new_parent: ItemKey, tag_index: &TagIndex) -> ModelResult<TagIndex> {
        let node = self.node(key)?;
        let old_parent = node
            .parent
            .ok_or_else(|| ModelError::invalid_move("the root item cannot be moved"))?;
        if new_parent == key || self.is_ancestor(key, new_parent) {
            return Err(ModelError::invalid_move("cannot move an item into its own subtree"));
        }
        let old_index = self.tag_index_of(key)?;
        let tags = &self.node(new_parent)?.tags;
        let container = tags
            .container(&tag_index.tag)
            .map_err(|_| ModelError::invalid_move(format!("no tag {}", tag_index)))?;
        let info = container.info();
        if !info.is_valid_type(node.model_type()) {
            return Err(ModelError::invalid_move(format!(
                "type '{}' is not allowed in tag '{}'",
                node.model_type(),
                info.name()
            )));
        }
        let same_tag = old_parent == new_parent && old_index.tag == info.name();
        let count = container.len() - usize::from(same_tag);
        if !info.has_room(count) {
            return Err(ModelError::invalid_move(format!("tag '{}' is full", info.name())));
        }
        let position = if tag_index.is_append() {
            count
        } else if tag_index.index >= 0 && tag_index.index as usize <= count {
            tag_index.index as usize
        } else {
            return Err(ModelError::invalid_move(format!(
                "position {} is outside tag '{}'",
                tag_index.index,
                info.name()
            )));
        };
        Ok(TagIndex::new(info.name(), position as i32))
    }

    /// Relocate `key` without detaching it; keys and identifiers are kept
    pub fn move_item(&mut self, key: ItemKey, new_parent: ItemKey, tag_index: &TagIndex) -> ModelResult<TagIndex> {
        let resolved = self.validate_move(key, new_parent, tag_index)?;
        let old_index = self.tag_index_of(key)?;
        let old_parent = self
            .parent_of(key)?
            .ok_or_else(|| ModelError::invalid_move("the root item cannot be moved"))?;
        let model_type = self.node(key)?.model_type.clone();
        self.node_mut(old_parent)?.tags.take(&old_index)?;
        self.node_mut(new_parent)?
            .tags
            .insert(key, &model_type, &resolved)?;
        self.node_mut(key)?.parent = Some(new_parent);
        Ok(resolved)
    }

    /// Store `value` under `role`; returns whether the value changed
    pub fn set_data(&mut self, key: ItemKey, value: Variant, role: Role) -> ModelResult<bool> {
        self.node_mut(key)?.data.set_data(value, role)
    }

    /// Identifiers of a prospective root must be unique among themselves
    pub fn validate_root(&self, root: &Item) -> ModelResult<()> {
        validate_unique(root, &ItemPool::new())
    }

    /// Drop the whole tree and attach `root` in its place
    pub fn replace_root(&mut self, root: Item) -> ModelResult<()> {
        self.validate_root(&root)?;
        self.vacate_all();
        self.pool.clear();
        self.root = self.spawn(root, None)?;
        Ok(())
    }

    /// Owned copy of the subtree at `key`, identifiers included
    pub fn snapshot(&self, key: ItemKey) -> ModelResult<Item> {
        let node = self.node(key)?;
        let tags = node.tags.clone().try_map(|child| self.snapshot(child))?;
        Ok(Item::from_parts(
            node.identifier.clone(),
            node.model_type.clone(),
            node.data.clone(),
            tags,
        ))
    }

    fn spawn(&mut self, item: Item, parent: Option<ItemKey>) -> ModelResult<ItemKey> {
        let (identifier, model_type, data, tags) = item.into_parts();
        let node = ItemNode {
            identifier: identifier.clone(),
            model_type,
            data,
            tags: tags.schema(),
            parent,
        };
        let key = self.allocate(node);
        self.pool.register(key, Some(&identifier))?;
        let children = tags.try_map(|child| self.spawn(child, Some(key)))?;
        self.node_mut(key)?.tags = children;
        Ok(key)
    }

    fn collapse(&mut self, key: ItemKey) -> ModelResult<Item> {
        let node = self.release(key)?;
        self.pool.unregister(key)?;
        let tags = node.tags.try_map(|child| self.collapse(child))?;
        Ok(Item::from_parts(node.identifier, node.model_type, node.data, tags))
    }

    fn allocate(&mut self, node: ItemNode) -> ItemKey {
        self.len += 1;
        if let Some(index) = self.free_head {
            if let Entry::Vacant { generation, next_free } = self.entries[index as usize] {
                self.free_head = next_free;
                self.entries[index as usize] = Entry::Occupied { generation, node };
                return ItemKey::new(index, generation);
            }
        }
        let index = self.entries.len() as u32;
        self.entries.push(Entry::Occupied { generation: 0, node });
        ItemKey::new(index, 0)
    }

    /// Free every slot; occupied ones move to the next generation so keys
    /// handed out before stop resolving
    fn vacate_all(&mut self) {
        let mut next_free = None;
        for (index, entry) in self.entries.iter_mut().enumerate().rev() {
            let generation = match entry {
                Entry::Occupied { generation, .. } => generation.wrapping_add(1),
                Entry::Vacant { generation, .. } => *generation,
            };
            *entry = Entry::Vacant { generation, next_free };
            next_free = Some(index as u32);
        }
        self.free_head = next_free;
        self.len = 0;
    }

    fn release(&mut self, key: ItemKey) -> ModelResult<ItemNode> {
        if !self.contains(key) {
            return Err(ModelError::not_found(format!("item {:?}", key)));
        }
        let vacant = Entry::Vacant {
            generation: key.generation.wrapping_add(1),
            next_free: self.free_head,
        };
        match std::mem::replace(&mut self.entries[key.index as usize], vacant) {
            Entry::Occupied { node, .. } => {
                self.free_head = Some(key.index);
                self.len -= 1;
                Ok(node)
            }
            Entry::Vacant { .. } => Err(ModelError::not_found(format!("item {:?}", key))),
        }
    }
}

/// Identifiers in `item` must be unique among themselves and unknown to `pool`
fn validate_unique(item: &Item, pool: &ItemPool) -> ModelResult<()> {
    let mut seen = HashSet::new();
    for identifier in IdentifierCollector::collect(item) {
        if identifier.is_empty() {
            return Err(ModelError::null_argument("item without identifier"));
        }
        if pool.contains(&identifier) || !seen.insert(identifier.clone()) {
            return Err(ModelError::existing_key(format!(
                "identifier '{}' is already in use",
                identifier
            )));
        }
    }
    Ok(())
}
