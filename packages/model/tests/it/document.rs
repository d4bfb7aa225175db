use crate::helpers::{append, group, group_model, leaf, CHILDREN};
use arbor_model::{
    roles, ModelConfig, ModelDocument, StoreError, TagIndex, Variant, DEFAULT_CONFIG_NAME,
};
use std::fs;

#[test]
fn two_models_round_trip_through_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");

    let mut first = group_model();
    let root = first.root_item();
    let parent = first.insert_item(group(), root, &append()).unwrap();
    let child = first.insert_item(leaf(), parent, &append()).unwrap();
    first.set_data(child, vec![1.0, 2.5], roles::DATA).unwrap();
    first.set_data(parent, "Parent", roles::DISPLAY).unwrap();
    let mut second = group_model();
    second.set_data(second.root_item(), true, roles::DATA).unwrap();

    let expected_first = first.snapshot(first.root_item()).unwrap();
    let expected_second = second.snapshot(second.root_item()).unwrap();

    {
        let mut document = ModelDocument::new("arbor", vec![&mut first, &mut second]);
        assert!(document.is_modified());
        document.save(&path).unwrap();
        assert!(!document.is_modified());
    }

    let mut loaded_first = group_model();
    let mut loaded_second = group_model();
    let header = ModelDocument::new("arbor", vec![&mut loaded_first, &mut loaded_second])
        .load(&path)
        .unwrap();
    assert_eq!(header.application_type, "arbor");

    assert_eq!(
        loaded_first.snapshot(loaded_first.root_item()).unwrap(),
        expected_first
    );
    assert_eq!(
        loaded_second.snapshot(loaded_second.root_item()).unwrap(),
        expected_second
    );
    let parent = loaded_first
        .get_item(loaded_first.root_item(), &TagIndex::new(CHILDREN, 0))
        .unwrap();
    assert_eq!(loaded_first.item(parent).unwrap().display_name(), "Parent");
}

#[test]
fn edits_after_save_mark_document_modified() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");
    let mut model = group_model();
    let root = model.root_item();

    let mut document = ModelDocument::new("arbor", vec![&mut model]);
    document.save(&path).unwrap();
    drop(document);

    model.insert_item(leaf(), root, &append()).unwrap();
    assert!(ModelDocument::new("arbor", vec![&mut model]).is_modified());
    model.undo().unwrap();
    assert!(!ModelDocument::new("arbor", vec![&mut model]).is_modified());
}

#[test]
fn corrupt_file_keeps_model() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.json");
    fs::write(&path, "{ not json").unwrap();

    let mut model = group_model();
    let root = model.root_item();
    model.set_data(root, 5, roles::DATA).unwrap();

    let err = ModelDocument::new("arbor", vec![&mut model])
        .load(&path)
        .unwrap_err();
    assert!(matches!(err, StoreError::Json(_)));
    assert_eq!(model.data(root, roles::DATA).unwrap(), Variant::Int(5));
    assert!(model.can_undo());
}

#[test]
fn config_drives_model_and_document() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join(DEFAULT_CONFIG_NAME),
        r#"{ "undoLimit": 2, "applicationType": "sketcher" }"#,
    )
    .unwrap();
    let config = ModelConfig::load(dir.path()).unwrap();
    assert!(config.undo_enabled);

    let mut model = arbor_model::Model::builder("GroupModel")
        .config(&config)
        .root(group())
        .build()
        .unwrap();
    let root = model.root_item();
    for value in 0..5 {
        model.set_data(root, value, roles::DATA).unwrap();
    }
    assert_eq!(model.command_stack().unwrap().count(), 2);

    let path = dir.path().join("doc.json");
    ModelDocument::new(config.application_type.clone(), vec![&mut model])
        .save(&path)
        .unwrap();
    let err = ModelDocument::new("arbor", vec![&mut model])
        .load(&path)
        .unwrap_err();
    assert!(matches!(err, StoreError::ApplicationMismatch { .. }));
}
