//! # Items
//!
//! An [`Item`] is a typed node carrying role-keyed [`Variant`] data and
//! tag-organized children. Items built by the caller (or by the
//! [`ItemFactory`](crate::ItemFactory)) are *detached*: they own their whole
//! subtree and have no parent, no model and no pool registration. Inserting
//! one into a [`Model`](crate::Model) moves it into the model's arena; taking
//! it out hands back a detached [`Item`] again.

use crate::pool::new_identifier;
use crate::standard_items::PROPERTY_ITEM;
use crate::tag::{TagIndex, TagInfo, TaggedItems};
use arbor_common::roles::{self, Role};
use arbor_common::{ModelError, ModelResult, Variant};
use std::collections::BTreeMap;

/// Role → value storage of a single item
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemData {
    values: BTreeMap<Role, Variant>,
}

impl ItemData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Value of `role`, or the empty variant when unset
    pub fn data(&self, role: Role) -> Variant {
        self.values.get(&role).cloned().unwrap_or_default()
    }

    pub fn has_data(&self, role: Role) -> bool {
        self.values.contains_key(&role)
    }

    /// Store `value` under `role`.
    ///
    /// Returns whether the stored value changed. The new value must be
    /// compatible with the current one unless the role is still empty;
    /// the empty variant clears the role.
    pub fn set_data(&mut self, value: Variant, role: Role) -> ModelResult<bool> {
        if value.is_empty() {
            return Ok(self.values.remove(&role).is_some());
        }
        if let Some(current) = self.values.get(&role) {
            if !value.can_replace(current) {
                return Err(ModelError::invalid_operation(format!(
                    "role {} holds {} and cannot take {}",
                    role,
                    current.kind().name(),
                    value.kind().name()
                )));
            }
            if *current == value {
                return Ok(false);
            }
        }
        self.values.insert(role, value);
        Ok(true)
    }

    pub fn roles(&self) -> Vec<Role> {
        self.values.keys().copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Role, &Variant)> {
        self.values.iter().map(|(role, value)| (*role, value))
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Detached node owning its subtree
#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    identifier: String,
    model_type: String,
    data: ItemData,
    tags: TaggedItems<Item>,
}

impl Item {
    /// New item of `model_type` with a fresh identifier
    pub fn new(model_type: impl Into<String>) -> Self {
        Self::with_identifier(model_type, new_identifier())
    }

    pub fn with_identifier(model_type: impl Into<String>, identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            model_type: model_type.into(),
            data: ItemData::new(),
            tags: TaggedItems::new(),
        }
    }

    pub(crate) fn from_parts(
        identifier: String,
        model_type: String,
        data: ItemData,
        tags: TaggedItems<Item>,
    ) -> Self {
        Self {
            identifier,
            model_type,
            data,
            tags,
        }
    }

    pub(crate) fn into_parts(self) -> (String, String, ItemData, TaggedItems<Item>) {
        (self.identifier, self.model_type, self.data, self.tags)
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// Give this item and every descendant a fresh identifier
    pub fn regenerate_identifiers(&mut self) {
        self.identifier = new_identifier();
        for child in self.tags.all_items_mut() {
            child.regenerate_identifiers();
        }
    }

    pub fn model_type(&self) -> &str {
        &self.model_type
    }

    pub fn display_name(&self) -> String {
        self.data
            .data(roles::DISPLAY)
            .as_str()
            .map(str::to_string)
            .unwrap_or_else(|| self.model_type.clone())
    }

    pub fn set_display_name(&mut self, name: impl Into<String>) -> ModelResult<bool> {
        self.set_data(Variant::String(name.into()), roles::DISPLAY)
    }

    pub fn data(&self, role: Role) -> Variant {
        self.data.data(role)
    }

    pub fn set_data(&mut self, value: Variant, role: Role) -> ModelResult<bool> {
        self.data.set_data(value, role)
    }

    pub fn item_data(&self) -> &ItemData {
        &self.data
    }

    pub fn tags(&self) -> &TaggedItems<Item> {
        &self.tags
    }

    pub(crate) fn tags_mut(&mut self) -> &mut TaggedItems<Item> {
        &mut self.tags
    }

    pub fn register_tag(&mut self, info: TagInfo, set_as_default: bool) -> ModelResult<()> {
        self.tags.register_tag(info, set_as_default)
    }

    pub fn can_insert(&self, candidate_type: &str, tag_index: &TagIndex) -> bool {
        self.tags.can_insert(candidate_type, tag_index)
    }

    pub fn insert_item(&mut self, item: Item, tag_index: &TagIndex) -> ModelResult<TagIndex> {
        let model_type = item.model_type.clone();
        self.tags.insert(item, &model_type, tag_index)
    }

    pub fn take_item(&mut self, tag_index: &TagIndex) -> ModelResult<Item> {
        self.tags.take(tag_index)
    }

    pub fn get_item(&self, tag_index: &TagIndex) -> ModelResult<&Item> {
        self.tags.get(tag_index)
    }

    pub fn get_item_mut(&mut self, tag_index: &TagIndex) -> ModelResult<&mut Item> {
        self.tags.get_mut(tag_index)
    }

    pub fn get_items(&self, tag: &str) -> ModelResult<&[Item]> {
        self.tags.items(tag)
    }

    /// Location of a direct child, looked up by identifier
    pub fn tag_index_of_item(&self, identifier: &str) -> ModelResult<TagIndex> {
        self.tags
            .find_index(|child| child.identifier == identifier)
            .ok_or_else(|| ModelError::not_found(format!("'{}' is not a child", identifier)))
    }

    /// Direct children across all tags
    pub fn children(&self) -> impl Iterator<Item = &Item> {
        self.tags.all_items()
    }

    /// Register a single-property tag `name` holding a property item with
    /// `value` as its data
    pub fn add_property(&mut self, name: &str, value: impl Into<Variant>) -> ModelResult<()> {
        if self.tags.has_tag(name) {
            return Err(ModelError::existing_key(format!("tag '{}' is already registered", name)));
        }
        self.push_property(name, value.into());
        Ok(())
    }

    /// Builder form of [`Item::register_tag`] for freshly created items
    pub(crate) fn with_tag(mut self, info: TagInfo, set_as_default: bool) -> Self {
        self.tags.push_container(info, Vec::new(), set_as_default);
        self
    }

    /// Builder form of [`Item::add_property`] for freshly created items
    pub(crate) fn with_property(mut self, name: &str, value: impl Into<Variant>) -> Self {
        self.push_property(name, value.into());
        self
    }

    fn push_property(&mut self, name: &str, value: Variant) {
        let mut data = ItemData::new();
        data.values.insert(roles::DISPLAY, Variant::String(name.to_string()));
        if !value.is_empty() {
            data.values.insert(roles::DATA, value);
        }
        let property = Item::from_parts(
            new_identifier(),
            PROPERTY_ITEM.to_string(),
            data,
            TaggedItems::new(),
        );
        self.tags
            .push_container(TagInfo::property(name, PROPERTY_ITEM), vec![property], false);
    }

    /// Data of the property registered under `name`
    pub fn property(&self, name: &str) -> ModelResult<Variant> {
        self.get_item(&TagIndex::prepend(name))
            .map(|property| property.data(roles::DATA))
    }

    pub fn set_property(&mut self, name: &str, value: impl Into<Variant>) -> ModelResult<bool> {
        self.get_item_mut(&TagIndex::prepend(name))?
            .set_data(value.into(), roles::DATA)
    }

    /// Equality of types, data and tag structure, ignoring identifiers
    pub fn structurally_eq(&self, other: &Item) -> bool {
        if self.model_type != other.model_type || self.data != other.data {
            return false;
        }
        let mine: Vec<_> = self.tags.containers().collect();
        let theirs: Vec<_> = other.tags.containers().collect();
        mine.len() == theirs.len()
            && mine.iter().zip(theirs.iter()).all(|(a, b)| {
                a.info() == b.info()
                    && a.len() == b.len()
                    && a.items()
                        .iter()
                        .zip(b.items())
                        .all(|(x, y)| x.structurally_eq(y))
            })
            && self.tags.default_tag() == other.tags.default_tag()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_data_reports_change() {
        let mut item = Item::new("Leaf");
        assert_eq!(item.data(roles::DATA), Variant::Empty);

        assert!(item.set_data(Variant::Int(42), roles::DATA).unwrap());
        assert!(!item.set_data(Variant::Int(42), roles::DATA).unwrap());
        assert!(item.set_data(Variant::Int(43), roles::DATA).unwrap());

        let err = item.set_data(Variant::from("text"), roles::DATA).unwrap_err();
        assert!(matches!(err, ModelError::InvalidOperation(_)));
        assert_eq!(item.data(roles::DATA), Variant::Int(43));
    }

    #[test]
    fn test_empty_write_clears_role() {
        let mut item = Item::new("Leaf");
        assert!(!item.set_data(Variant::Empty, roles::TOOLTIP).unwrap());
        assert!(!item.item_data().has_data(roles::TOOLTIP));

        item.set_data(Variant::from("hint"), roles::TOOLTIP).unwrap();
        assert!(item.set_data(Variant::Empty, roles::TOOLTIP).unwrap());
        assert!(!item.item_data().has_data(roles::TOOLTIP));

        // kind is free again once cleared
        assert!(item.set_data(Variant::Int(1), roles::TOOLTIP).unwrap());
    }

    #[test]
    fn test_children_by_tag() {
        let mut parent = Item::new("Group");
        parent.register_tag(TagInfo::universal("children"), true).unwrap();

        let first = Item::new("Leaf");
        let first_id = first.identifier().to_string();
        parent.insert_item(first, &TagIndex::append("children")).unwrap();
        parent.insert_item(Item::new("Leaf"), &TagIndex::prepend("children")).unwrap();

        assert_eq!(parent.get_items("children").unwrap().len(), 2);
        assert_eq!(
            parent.tag_index_of_item(&first_id).unwrap(),
            TagIndex::new("children", 1)
        );

        let taken = parent.take_item(&TagIndex::new("children", 1)).unwrap();
        assert_eq!(taken.identifier(), first_id);
        assert!(parent.tag_index_of_item(&first_id).is_err());
    }

    #[test]
    fn test_properties() {
        let mut item = Item::new("Compound");
        item.add_property("thickness", 4.0).unwrap();
        assert_eq!(item.property("thickness").unwrap(), Variant::Float(4.0));

        assert!(item.set_property("thickness", 5.0).unwrap());
        assert_eq!(item.property("thickness").unwrap(), Variant::Float(5.0));

        let err = item.add_property("thickness", 1.0).unwrap_err();
        assert!(matches!(err, ModelError::ExistingKey(_)));
        assert_eq!(item.property("thickness").unwrap(), Variant::Float(5.0));
        assert!(item.property("missing").is_err());

        let property = item.get_item(&TagIndex::prepend("thickness")).unwrap();
        assert_eq!(property.display_name(), "thickness");
    }

    #[test]
    fn test_regenerated_identifiers_keep_structure() {
        let mut item = Item::new("Compound");
        item.add_property("x", 1.0).unwrap();
        let original = item.clone();

        item.regenerate_identifiers();
        assert_ne!(item.identifier(), original.identifier());
        assert_ne!(item, original);
        assert!(item.structurally_eq(&original));
    }
}
