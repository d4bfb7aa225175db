use crate::helpers::{append, factory, group, group_model, leaf, CHILDREN, GROUP, LEAF};
use arbor_model::{Item, ItemKey, Model, ModelError, TagIndex, TagInfo};

fn typed_holder() -> Item {
    let mut item = Item::new("Holder");
    item.register_tag(
        TagInfo::new("leaves", 0, 2, vec![LEAF.to_string()]).unwrap(),
        true,
    )
    .unwrap();
    item.register_tag(TagInfo::new("anchor", 1, -1, Vec::new()).unwrap(), false)
        .unwrap();
    item
}

fn holder_model() -> (Model, ItemKey) {
    let mut model = group_model();
    let root = model.root_item();
    let holder = model.insert_item(typed_holder(), root, &append()).unwrap();
    (model, holder)
}

#[test]
fn allowed_types_are_enforced() {
    let (mut model, holder) = holder_model();
    let err = model
        .insert_new_item(GROUP, holder, &TagIndex::append("leaves"))
        .unwrap_err();
    assert!(matches!(err, ModelError::InvalidInsert(_)));
    assert!(model
        .insert_new_item(LEAF, holder, &TagIndex::append("leaves"))
        .is_ok());
}

#[test]
fn maximum_is_enforced() {
    let (mut model, holder) = holder_model();
    for _ in 0..2 {
        model.insert_item(leaf(), holder, &TagIndex::default_tag(-1)).unwrap();
    }
    assert!(!model.item(holder).unwrap().can_insert(LEAF, &TagIndex::append("leaves")));
    assert!(model
        .insert_item(leaf(), holder, &TagIndex::append("leaves"))
        .is_err());
    assert_eq!(model.items(holder, "leaves").unwrap().len(), 2);
}

#[test]
fn minimum_blocks_take_and_cross_tag_move() {
    let (mut model, holder) = holder_model();
    let anchor = model
        .insert_item(leaf(), holder, &TagIndex::append("anchor"))
        .unwrap();

    let err = model
        .take_item(holder, &TagIndex::new("anchor", 0))
        .unwrap_err();
    assert!(matches!(err, ModelError::InvalidMove(_)));
    assert!(model
        .move_item(anchor, holder, &TagIndex::append("leaves"))
        .is_err());

    // reordering inside the tag keeps the count
    model
        .insert_item(leaf(), holder, &TagIndex::append("anchor"))
        .unwrap();
    model
        .move_item(anchor, holder, &TagIndex::append("anchor"))
        .unwrap();
    assert_eq!(model.tag_index_of(anchor).unwrap(), TagIndex::new("anchor", 1));
}

#[test]
fn unknown_tag_and_bad_positions() {
    let mut model = group_model();
    let root = model.root_item();
    assert!(model
        .insert_item(leaf(), root, &TagIndex::append("missing"))
        .is_err());
    assert!(model
        .insert_item(leaf(), root, &TagIndex::new(CHILDREN, 1))
        .is_err());
    assert!(model.take_item(root, &TagIndex::new(CHILDREN, 0)).is_err());
    assert_eq!(model.len(), 1);
}

#[test]
fn duplicate_identifier_is_rejected() {
    let mut model = group_model();
    let root = model.root_item();
    model
        .insert_item(Item::with_identifier(LEAF, "same"), root, &append())
        .unwrap();
    let err = model
        .insert_item(Item::with_identifier(LEAF, "same"), root, &append())
        .unwrap_err();
    assert!(matches!(err, ModelError::ExistingKey(_)));
    assert_eq!(model.items(root, CHILDREN).unwrap().len(), 1);
}

#[test]
fn item_cannot_move_into_own_subtree() {
    let mut model = group_model();
    let root = model.root_item();
    let outer = model.insert_item(group(), root, &append()).unwrap();
    let inner = model.insert_item(group(), outer, &append()).unwrap();

    let err = model.move_item(outer, inner, &append()).unwrap_err();
    assert!(matches!(err, ModelError::InvalidMove(_)));
    assert_eq!(model.parent_of(inner).unwrap(), Some(outer));
}

#[test]
fn move_index_counts_without_the_moved_item() {
    let mut model = group_model();
    let root = model.root_item();
    let keys: Vec<_> = (0..3)
        .map(|_| model.insert_item(leaf(), root, &append()).unwrap())
        .collect();

    // [a, b, c] -> [b, c, a]
    model
        .move_item(keys[0], root, &TagIndex::new(CHILDREN, 2))
        .unwrap();
    assert_eq!(
        model.items(root, CHILDREN).unwrap(),
        &[keys[1], keys[2], keys[0]]
    );
}

#[test]
fn factory_builds_registered_types_only() {
    let factory = factory();
    assert!(factory.create_item(GROUP).unwrap().tags().has_tag(CHILDREN));
    let err = factory.create_item("Nope").unwrap_err();
    assert!(matches!(err, ModelError::NotFound(_)));
}
