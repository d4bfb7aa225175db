use crate::helpers::{append, group, group_model, leaf, CHILDREN};
use arbor_model::{roles, Model, ModelError, TagIndex, Variant};

/// Eight recorded changes of every kind
fn edit(model: &mut Model) {
    let root = model.root_item();
    let first = model.insert_item(group(), root, &append()).unwrap();
    let second = model.insert_item(group(), root, &append()).unwrap();
    let child = model.insert_item(leaf(), first, &append()).unwrap();
    model.set_data(child, "label", roles::DISPLAY).unwrap();
    model.set_data(child, 3.5, roles::DATA).unwrap();
    model.move_item(child, second, &append()).unwrap();
    model.move_item(second, root, &TagIndex::new(CHILDREN, 0)).unwrap();
    model.remove_item(root, &TagIndex::new(CHILDREN, 1)).unwrap();
}

#[test]
fn undo_all_restores_initial_state() {
    let mut model = group_model();
    let initial = model.snapshot(model.root_item()).unwrap();

    edit(&mut model);
    let edited = model.snapshot(model.root_item()).unwrap();
    let steps = model.command_stack().unwrap().count();
    assert_eq!(steps, 8);

    while model.undo().unwrap() {}
    assert_eq!(model.snapshot(model.root_item()).unwrap(), initial);

    while model.redo().unwrap() {}
    assert_eq!(model.snapshot(model.root_item()).unwrap(), edited);
}

#[test]
fn removed_subtree_comes_back_with_identifiers() {
    let mut model = group_model();
    let root = model.root_item();
    let parent = model.insert_item(group(), root, &append()).unwrap();
    let child = model.insert_item(leaf(), parent, &append()).unwrap();
    model.set_data(child, 7, roles::DATA).unwrap();
    let parent_id = model.item(parent).unwrap().identifier().to_string();
    let child_id = model.item(child).unwrap().identifier().to_string();

    let taken = model.take_item(root, &TagIndex::new(CHILDREN, 0)).unwrap();
    assert_eq!(taken.identifier(), parent_id);
    assert!(model.find_item(&child_id).is_none());

    model.undo().unwrap();
    let restored = model.find_item(&child_id).unwrap();
    assert_eq!(model.data(restored, roles::DATA).unwrap(), Variant::Int(7));
    assert_eq!(
        model.parent_of(restored).unwrap(),
        model.find_item(&parent_id)
    );
}

#[test]
fn macro_is_undone_as_one_step() {
    let mut model = group_model();
    let root = model.root_item();
    let initial = model.snapshot(root).unwrap();

    model.begin_macro("Populate").unwrap();
    let parent = model.insert_item(group(), root, &append()).unwrap();
    for _ in 0..3 {
        model.insert_item(leaf(), parent, &append()).unwrap();
    }
    model.set_data(parent, "Populated", roles::DISPLAY).unwrap();
    model.end_macro().unwrap();

    let after = model.snapshot(root).unwrap();
    {
        let stack = model.command_stack().unwrap();
        assert_eq!(stack.count(), 1);
        assert_eq!(stack.undo_text().as_deref(), Some("Populate"));
    }

    assert!(model.undo().unwrap());
    assert_eq!(model.snapshot(root).unwrap(), initial);
    assert!(model.redo().unwrap());
    assert_eq!(model.snapshot(model.root_item()).unwrap(), after);
}

#[test]
fn unbalanced_end_macro_fails() {
    let mut model = group_model();
    let err = model.end_macro().unwrap_err();
    assert!(matches!(err, ModelError::InvalidOperation(_)));
}

#[test]
fn undo_limit_bounds_history() {
    let mut model = Model::builder("Limited")
        .root(group())
        .undo_limit(3)
        .build()
        .unwrap();
    let root = model.root_item();
    for value in 0..10 {
        model.set_data(root, value, roles::DATA).unwrap();
    }

    let mut undone = 0;
    while model.undo().unwrap() {
        undone += 1;
    }
    assert_eq!(undone, 3);
    assert_eq!(model.data(root, roles::DATA).unwrap(), Variant::Int(6));
}

#[test]
fn new_change_discards_redo() {
    let mut model = group_model();
    let root = model.root_item();
    model.insert_item(group(), root, &append()).unwrap();
    model.undo().unwrap();
    assert!(model.can_redo());

    model.set_data(root, "fresh", roles::DISPLAY).unwrap();
    assert!(!model.can_redo());
    assert!(!model.redo().unwrap());
}

#[test]
fn undo_of_insert_into_required_slot() {
    let mut model = group_model();
    let root = model.root_item();
    let parent = model.insert_item(group(), root, &append()).unwrap();
    let mut holder = group();
    holder
        .register_tag(arbor_model::TagInfo::property("value", "Leaf"), false)
        .unwrap();
    let holder = model.insert_item(holder, parent, &append()).unwrap();
    model
        .insert_item(leaf(), holder, &TagIndex::append("value"))
        .unwrap();

    assert!(model.remove_item(holder, &TagIndex::new("value", 0)).is_err());
    // undo may still empty a required slot
    model.undo().unwrap();
    assert!(model.items(holder, "value").unwrap().is_empty());
}
