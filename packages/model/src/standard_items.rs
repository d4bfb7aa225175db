//! # Standard Items
//!
//! Item types every factory knows about. Items are plain [`Item`]s; a
//! "type" is a name plus the constructor that lays out its data and tags.

use crate::factory::ItemFactory;
use crate::item::Item;
use crate::model::Model;
use crate::tag::{TagIndex, TagInfo};
use crate::tree::ItemKey;
use arbor_common::roles::{self, Role};
use arbor_common::{ModelError, ModelResult, Variant};

pub const SESSION_ITEM: &str = "SessionItem";
pub const PROPERTY_ITEM: &str = "PropertyItem";
pub const COMPOUND_ITEM: &str = "CompoundItem";
pub const VECTOR_ITEM: &str = "VectorItem";
pub const CONTAINER_ITEM: &str = "ContainerItem";
pub const LINKED_ITEM: &str = "LinkedItem";

/// Default tag of the session root
pub const ROOT_TAG: &str = "rootTag";

/// Default tag of container items
pub const CONTAINER_TAG: &str = "items";

pub const P_X: &str = "X";
pub const P_Y: &str = "Y";
pub const P_Z: &str = "Z";

/// Root of every model: one unbounded default tag
pub fn session_item() -> Item {
    Item::new(SESSION_ITEM).with_tag(TagInfo::universal(ROOT_TAG), true)
}

/// Leaf holding a single value under [`roles::DATA`]
pub fn property_item() -> Item {
    Item::new(PROPERTY_ITEM)
}

/// Item made of named properties; starts empty
pub fn compound_item() -> Item {
    Item::new(COMPOUND_ITEM)
}

/// Compound with X, Y and Z float properties
pub fn vector_item() -> Item {
    Item::new(VECTOR_ITEM)
        .with_property(P_X, 0.0)
        .with_property(P_Y, 0.0)
        .with_property(P_Z, 0.0)
}

/// Holds any number of items of any type
pub fn container_item() -> Item {
    Item::new(CONTAINER_ITEM).with_tag(TagInfo::universal(CONTAINER_TAG), true)
}

pub fn linked_item() -> Item {
    Item::new(LINKED_ITEM)
}

pub fn register_standard_items(factory: &mut ItemFactory) {
    let catalogue: [(&str, fn() -> Item, &str); 6] = [
        (SESSION_ITEM, session_item, "Session"),
        (PROPERTY_ITEM, property_item, "Property"),
        (COMPOUND_ITEM, compound_item, "Compound"),
        (VECTOR_ITEM, vector_item, "Vector"),
        (CONTAINER_ITEM, container_item, "Container"),
        (LINKED_ITEM, linked_item, "Link"),
    ];
    for (model_type, constructor, label) in catalogue {
        if !factory.contains(model_type) {
            factory.push_entry(model_type.to_string(), Box::new(constructor), label.to_string());
        }
    }
}

/// Reference to another item by identifier.
///
/// The link survives moves, undo and serialization since it never stores
/// an arena key.
pub struct LinkedItem;

impl LinkedItem {
    /// Role holding the target identifier
    pub const LINK_ROLE: Role = roles::DATA;

    /// Point the link at `target`; undoable like any data change
    pub fn set_link(model: &mut Model, link: ItemKey, target: ItemKey) -> ModelResult<bool> {
        Self::check(model, link)?;
        let identifier = model.item(target)?.identifier().to_string();
        model.set_data(link, Variant::String(identifier), Self::LINK_ROLE)
    }

    /// Remove the reference
    pub fn clear_link(model: &mut Model, link: ItemKey) -> ModelResult<bool> {
        Self::check(model, link)?;
        model.set_data(link, Variant::Empty, Self::LINK_ROLE)
    }

    /// Identifier the link points at, if any
    pub fn link_identifier(model: &Model, link: ItemKey) -> ModelResult<Option<String>> {
        Self::check(model, link)?;
        Ok(model
            .data(link, Self::LINK_ROLE)?
            .as_str()
            .map(str::to_string))
    }

    /// The linked item, if it is attached to the same model
    pub fn resolve(model: &Model, link: ItemKey) -> ModelResult<Option<ItemKey>> {
        Ok(Self::link_identifier(model, link)?.and_then(|id| model.find_item(&id)))
    }

    fn check(model: &Model, link: ItemKey) -> ModelResult<()> {
        let node = model.item(link)?;
        if node.model_type() != LINKED_ITEM {
            return Err(ModelError::invalid_operation(format!(
                "'{}' is not a {}",
                node.model_type(),
                LINKED_ITEM
            )));
        }
        Ok(())
    }
}

/// Typed access to the properties of a [`VECTOR_ITEM`] in a model
pub struct VectorItem;

impl VectorItem {
    pub fn set_xyz(model: &mut Model, vector: ItemKey, x: f64, y: f64, z: f64) -> ModelResult<()> {
        model.begin_macro("Set vector")?;
        let result = [(P_X, x), (P_Y, y), (P_Z, z)]
            .into_iter()
            .try_for_each(|(name, value)| {
                let property = model.get_item(vector, &TagIndex::prepend(name))?;
                model.set_data(property, value, roles::DATA).map(drop)
            });
        model.end_macro()?;
        result
    }

    pub fn xyz(model: &Model, vector: ItemKey) -> ModelResult<[f64; 3]> {
        let mut values = [0.0; 3];
        for (slot, name) in values.iter_mut().zip([P_X, P_Y, P_Z]) {
            let property = model.get_item(vector, &TagIndex::prepend(name))?;
            *slot = model.data(property, roles::DATA)?.as_float().unwrap_or_default();
        }
        Ok(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vector_layout() {
        let item = vector_item();
        assert_eq!(item.property(P_X).unwrap(), Variant::Float(0.0));
        assert_eq!(item.property(P_Z).unwrap(), Variant::Float(0.0));
        assert!(!item.can_insert(PROPERTY_ITEM, &TagIndex::append(P_Y)));
        let names: Vec<_> = item.tags().containers().map(|c| c.info().name()).collect();
        assert_eq!(names, vec![P_X, P_Y, P_Z]);
    }

    #[test]
    fn test_default_tags() {
        assert_eq!(session_item().tags().default_tag(), Some(ROOT_TAG));
        let container = container_item();
        assert_eq!(container.tags().default_tag(), Some(CONTAINER_TAG));
        assert!(container.can_insert(VECTOR_ITEM, &TagIndex::append("")));
    }

    #[test]
    fn test_vector_in_model() {
        let mut model = Model::new("Sample").unwrap();
        let root = model.root_item();
        let vector = model
            .insert_new_item(VECTOR_ITEM, root, &TagIndex::append(""))
            .unwrap();

        VectorItem::set_xyz(&mut model, vector, 1.0, 2.0, 3.0).unwrap();
        assert_eq!(VectorItem::xyz(&model, vector).unwrap(), [1.0, 2.0, 3.0]);

        // one undo step for the three properties
        model.undo().unwrap();
        assert_eq!(VectorItem::xyz(&model, vector).unwrap(), [0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_link_follows_target() {
        let mut model = Model::new("Sample").unwrap();
        let root = model.root_item();
        let box_item = model
            .insert_new_item(CONTAINER_ITEM, root, &TagIndex::append(""))
            .unwrap();
        let target = model
            .insert_new_item(COMPOUND_ITEM, root, &TagIndex::append(""))
            .unwrap();
        let link = model
            .insert_new_item(LINKED_ITEM, root, &TagIndex::append(""))
            .unwrap();

        assert_eq!(LinkedItem::resolve(&model, link).unwrap(), None);
        LinkedItem::set_link(&mut model, link, target).unwrap();
        assert_eq!(LinkedItem::resolve(&model, link).unwrap(), Some(target));

        // moving keeps the identifier
        model
            .move_item(target, box_item, &TagIndex::append(CONTAINER_TAG))
            .unwrap();
        assert_eq!(LinkedItem::resolve(&model, link).unwrap(), Some(target));

        LinkedItem::clear_link(&mut model, link).unwrap();
        assert_eq!(LinkedItem::link_identifier(&model, link).unwrap(), None);
    }

    #[test]
    fn test_link_on_wrong_type() {
        let mut model = Model::new("Sample").unwrap();
        let root = model.root_item();
        let plain = model
            .insert_new_item(COMPOUND_ITEM, root, &TagIndex::append(""))
            .unwrap();
        let err = LinkedItem::set_link(&mut model, plain, root).unwrap_err();
        assert!(matches!(err, ModelError::InvalidOperation(_)));
    }
}
