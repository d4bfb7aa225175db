//! # Converter
//!
//! Turns items and models into a neutral [`StructuredNode`] tree and back.
//! The structured form is what documents serialize (as JSON), so it stays
//! independent of the in-memory layout:
//!
//! ```text
//! Item {model, identifier}
//! ├── Data
//! │   └── Role {role, kind, value}
//! └── Tags {default}
//!     └── Tag {name, min, max}
//!         ├── Allowed {name}
//!         └── Item ...
//! ```
//!
//! Loading instantiates every item through the [`ItemFactory`], so unknown
//! types are rejected. Tags the factory already lays out are refilled from
//! the structure; any other tag is registered from its stored schema.

use crate::error::{StoreError, StoreResult};
use crate::factory::ItemFactory;
use crate::item::{Item, ItemData};
use crate::model::Model;
use crate::tag::{TagIndex, TagInfo};
use arbor_common::roles::Role;
use arbor_common::{Variant, VariantKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const MODEL_NODE: &str = "Model";
pub const ITEM_NODE: &str = "Item";
pub const DATA_NODE: &str = "Data";
pub const ROLE_NODE: &str = "Role";
pub const TAGS_NODE: &str = "Tags";
pub const TAG_NODE: &str = "Tag";
pub const ALLOWED_NODE: &str = "Allowed";

/// Named node with string attributes and ordered children
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StructuredNode {
    pub name: String,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<StructuredNode>,
}

impl StructuredNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn with_child(mut self, child: StructuredNode) -> Self {
        self.children.push(child);
        self
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    /// First child called `name`
    pub fn child(&self, name: &str) -> Option<&StructuredNode> {
        self.children.iter().find(|c| c.name == name)
    }

    fn require(&self, key: &str) -> StoreResult<&str> {
        self.attribute(key).ok_or_else(|| {
            StoreError::malformed(format!("<{}> is missing attribute '{}'", self.name, key))
        })
    }

    fn expect_name(&self, name: &str) -> StoreResult<()> {
        if self.name != name {
            return Err(StoreError::malformed(format!(
                "expected <{}>, found <{}>",
                name, self.name
            )));
        }
        Ok(())
    }
}

/// What happens to identifiers when structure becomes items
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConverterMode {
    /// Identifiers are kept, so references by identifier still resolve
    #[default]
    Clone,
    /// Every item gets a fresh identifier
    Copy,
}

pub struct ItemConverter<'a> {
    factory: &'a ItemFactory,
    mode: ConverterMode,
}

impl<'a> ItemConverter<'a> {
    pub fn new(factory: &'a ItemFactory, mode: ConverterMode) -> Self {
        Self { factory, mode }
    }

    pub fn mode(&self) -> ConverterMode {
        self.mode
    }

    pub fn to_structured(&self, item: &Item) -> StructuredNode {
        let data = StructuredNode {
            name: DATA_NODE.to_string(),
            attributes: BTreeMap::new(),
            children: item
                .item_data()
                .iter()
                .map(|(role, value)| {
                    StructuredNode::new(ROLE_NODE)
                        .with_attribute("role", role.to_string())
                        .with_attribute("kind", value.kind().name())
                        .with_attribute("value", value.to_text())
                })
                .collect(),
        };

        let mut tags = StructuredNode::new(TAGS_NODE);
        if let Some(default) = item.tags().default_tag() {
            tags = tags.with_attribute("default", default);
        }
        for container in item.tags().containers() {
            let info = container.info();
            let mut tag = StructuredNode::new(TAG_NODE)
                .with_attribute("name", info.name())
                .with_attribute("min", info.min().to_string())
                .with_attribute("max", info.max().to_string());
            for allowed in info.allowed_types() {
                tag = tag.with_child(StructuredNode::new(ALLOWED_NODE).with_attribute("name", allowed.as_str()));
            }
            for child in container.items() {
                tag = tag.with_child(self.to_structured(child));
            }
            tags = tags.with_child(tag);
        }

        StructuredNode::new(ITEM_NODE)
            .with_attribute("model", item.model_type())
            .with_attribute("identifier", item.identifier())
            .with_child(data)
            .with_child(tags)
    }

    pub fn from_structured(&self, node: &StructuredNode) -> StoreResult<Item> {
        let mut item = self.build_item(node)?;
        if self.mode == ConverterMode::Copy {
            item.regenerate_identifiers();
        }
        Ok(item)
    }

    fn build_item(&self, node: &StructuredNode) -> StoreResult<Item> {
        node.expect_name(ITEM_NODE)?;
        let model_type = node.require("model")?;
        let identifier = node.require("identifier")?;
        let (_, _, _, mut tags) = self.factory.create_item(model_type)?.into_parts();

        let mut data = ItemData::new();
        if let Some(data_node) = node.child(DATA_NODE) {
            for role_node in &data_node.children {
                role_node.expect_name(ROLE_NODE)?;
                let (role, value) = parse_role(role_node)?;
                data.set_data(value, role)?;
            }
        }

        if let Some(tags_node) = node.child(TAGS_NODE) {
            for tag_node in &tags_node.children {
                tag_node.expect_name(TAG_NODE)?;
                let name = tag_node.require("name")?;
                if tags.has_tag(name) {
                    tags.clear_tag(name)?;
                } else {
                    tags.register_tag(parse_tag_info(tag_node, name)?, false)?;
                }
                for child_node in tag_node.children.iter().filter(|c| c.name == ITEM_NODE) {
                    let child = self.build_item(child_node)?;
                    let child_type = child.model_type().to_string();
                    tags.insert(child, &child_type, &TagIndex::append(name))
                        .map_err(|err| StoreError::malformed(format!("tag '{}': {}", name, err)))?;
                }
            }
            if let Some(default) = tags_node.attribute("default") {
                tags.set_default_tag(default)?;
            }
        }

        Ok(Item::from_parts(identifier.to_string(), model_type.to_string(), data, tags))
    }

    /// The model's type and its whole tree
    pub fn model_to_structured(&self, model: &Model) -> StoreResult<StructuredNode> {
        let root = model.snapshot(model.root_item())?;
        Ok(StructuredNode::new(MODEL_NODE)
            .with_attribute("type", model.model_type())
            .with_child(self.to_structured(&root)))
    }

    /// Model type and root item stored in a `Model` node
    pub fn model_from_structured(&self, node: &StructuredNode) -> StoreResult<(String, Item)> {
        node.expect_name(MODEL_NODE)?;
        let model_type = node.require("type")?.to_string();
        let root = node
            .child(ITEM_NODE)
            .ok_or_else(|| StoreError::malformed(format!("model '{}' has no root item", model_type)))?;
        Ok((model_type, self.from_structured(root)?))
    }

    /// Replace the tree of `model` with the one stored in `node`
    pub fn populate_model(&self, model: &mut Model, node: &StructuredNode) -> StoreResult<()> {
        let (model_type, root) = self.model_from_structured(node)?;
        if model_type != model.model_type() {
            return Err(StoreError::ModelTypeMismatch {
                expected: model.model_type().to_string(),
                found: model_type,
            });
        }
        model.replace_root(root)?;
        Ok(())
    }
}

/// Deep copy of `item` with fresh identifiers throughout
pub fn copy_item(factory: &ItemFactory, item: &Item) -> StoreResult<Item> {
    let converter = ItemConverter::new(factory, ConverterMode::Copy);
    converter.from_structured(&converter.to_structured(item))
}

fn parse_role(node: &StructuredNode) -> StoreResult<(Role, Variant)> {
    let role: Role = node
        .require("role")?
        .parse()
        .map_err(|_| StoreError::malformed("role is not an integer"))?;
    let kind_name = node.require("kind")?;
    let kind = VariantKind::from_name(kind_name)
        .ok_or_else(|| StoreError::malformed(format!("unknown value kind '{}'", kind_name)))?;
    let text = node.require("value")?;
    let value = Variant::parse(kind, text)
        .ok_or_else(|| StoreError::malformed(format!("'{}' is not a valid {}", text, kind_name)))?;
    Ok((role, value))
}

fn parse_tag_info(node: &StructuredNode, name: &str) -> StoreResult<TagInfo> {
    let bound = |key: &str| -> StoreResult<i32> {
        node.require(key)?
            .parse()
            .map_err(|_| StoreError::malformed(format!("tag '{}' has a non-integer {}", name, key)))
    };
    let allowed = node
        .children
        .iter()
        .filter(|c| c.name == ALLOWED_NODE)
        .map(|c| c.require("name").map(str::to_string))
        .collect::<StoreResult<Vec<_>>>()?;
    Ok(TagInfo::new(name, bound("min")?, bound("max")?, allowed)?)
}
