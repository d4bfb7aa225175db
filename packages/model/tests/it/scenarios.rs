use crate::helpers::{append, factory, group_model, EventLog, CHILDREN, LEAF};
use arbor_model::standard_items::{self, LinkedItem, LINKED_ITEM};
use arbor_model::{roles, EventKind, Item, Model, ModelDocument, ModelError, TagIndex, TagInfo, Variant};
use anyhow::Context;

#[test]
fn insert_twice_then_undo_twice() {
    let mut model = group_model();
    let root = model.root_item();

    model.insert_new_item("Group", root, &append()).unwrap();
    model.insert_new_item("Group", root, &append()).unwrap();
    assert_eq!(model.items(root, CHILDREN).unwrap().len(), 2);

    model.undo().unwrap();
    model.undo().unwrap();
    assert_eq!(model.items(root, CHILDREN).unwrap().len(), 0);
}

#[test]
fn second_leaf_in_single_slot_is_rejected() {
    let mut root = standard_items::session_item();
    root.register_tag(TagInfo::new("slot", 1, 1, vec![LEAF.to_string()]).unwrap(), false)
        .unwrap();
    let mut model = Model::builder("SlotModel")
        .root(root)
        .factory(factory())
        .build()
        .unwrap();
    let root = model.root_item();

    model
        .insert_new_item(LEAF, root, &TagIndex::append("slot"))
        .unwrap();
    let err = model
        .insert_new_item(LEAF, root, &TagIndex::append("slot"))
        .unwrap_err();
    assert!(matches!(err, ModelError::InvalidInsert(_)));
    assert_eq!(model.items(root, "slot").unwrap().len(), 1);
}

#[test]
fn repeated_write_reports_unchanged() {
    let mut model = group_model();
    let log = EventLog::attach(model.event_hub());
    let root = model.root_item();

    assert!(model.set_data(root, 42, roles::DATA).unwrap());
    assert!(!model.set_data(root, 42, roles::DATA).unwrap());
    assert_eq!(log.count(EventKind::DataChanged), 1);
    // the no-op write left no trace in the history
    assert_eq!(model.command_stack().unwrap().count(), 1);
}

#[test]
fn reference_by_identifier_survives_reload() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("linked.json");

    let mut source = group_model();
    let root = source.root_item();
    let target = source.insert_item(Item::with_identifier(LEAF, "abc123"), root, &append())?;
    let link = source.insert_new_item(LINKED_ITEM, root, &append())?;
    LinkedItem::set_link(&mut source, link, target)?;
    let link_id = source.item(link)?.identifier().to_string();

    ModelDocument::new("arbor", vec![&mut source]).save(&path)?;

    let mut reloaded = group_model();
    ModelDocument::new("arbor", vec![&mut reloaded]).load(&path)?;

    let link = reloaded.find_item(&link_id).context("link was not restored")?;
    assert_eq!(reloaded.data(link, roles::DATA)?, Variant::from("abc123"));
    let resolved = LinkedItem::resolve(&reloaded, link)?.context("link does not resolve")?;
    assert_eq!(reloaded.item(resolved)?.identifier(), "abc123");
    assert_eq!(reloaded.item(resolved)?.model_type(), LEAF);
    Ok(())
}
