use crate::helpers::{append, group, group_model, leaf, EventLog, CHILDREN};
use arbor_model::{roles, EventHub, EventKind, Model, ModelEvent, SubscriptionScope, TagIndex};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

#[test]
fn insert_is_bracketed() {
    let mut model = group_model();
    let log = EventLog::attach(model.event_hub());
    let root = model.root_item();

    let key = model.insert_item(group(), root, &append()).unwrap();
    assert_eq!(log.kinds(), vec![EventKind::AboutToInsert, EventKind::Inserted]);
    assert_eq!(
        log.events()[1],
        ModelEvent::Inserted {
            parent: root,
            tag_index: TagIndex::new(CHILDREN, 0),
            item: key,
        }
    );
}

#[test]
fn removal_reports_identifier_after_detach() {
    let mut model = group_model();
    let root = model.root_item();
    let key = model.insert_item(leaf(), root, &append()).unwrap();
    let identifier = model.item(key).unwrap().identifier().to_string();
    let log = EventLog::attach(model.event_hub());

    model.remove_item(root, &TagIndex::new(CHILDREN, 0)).unwrap();
    let events = log.events();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].kind(), EventKind::AboutToRemove);
    match &events[1] {
        ModelEvent::Removed {
            identifier: removed, ..
        } => assert_eq!(removed, &identifier),
        other => panic!("unexpected event {:?}", other),
    }
    assert!(model.find_item(&identifier).is_none());
}

#[test]
fn move_emits_remove_and_insert_pairs() {
    let mut model = group_model();
    let root = model.root_item();
    let first = model.insert_item(group(), root, &append()).unwrap();
    let second = model.insert_item(group(), root, &append()).unwrap();
    let child = model.insert_item(leaf(), first, &append()).unwrap();
    let log = EventLog::attach(model.event_hub());

    model.move_item(child, second, &append()).unwrap();
    assert_eq!(
        log.kinds(),
        vec![
            EventKind::AboutToRemove,
            EventKind::AboutToInsert,
            EventKind::Removed,
            EventKind::Inserted,
        ]
    );
}

#[test]
fn rejected_changes_are_silent() {
    let mut model = group_model();
    let root = model.root_item();
    let child = model.insert_item(leaf(), root, &append()).unwrap();
    let log = EventLog::attach(model.event_hub());

    assert!(model
        .insert_item(leaf(), root, &TagIndex::new(CHILDREN, 5))
        .is_err());
    assert!(model.insert_item(group(), child, &append()).is_err());
    assert!(model.move_item(root, child, &append()).is_err());
    assert!(model.set_data(child, "text", roles::DATA).is_ok());
    assert!(model.set_data(child, 1, roles::DATA).is_err());
    assert_eq!(log.kinds(), vec![EventKind::DataChanged]);
}

#[test]
fn undo_and_redo_notify_like_direct_changes() {
    let mut model = group_model();
    let root = model.root_item();
    let log = EventLog::attach(model.event_hub());

    model.insert_item(group(), root, &append()).unwrap();
    log.clear();

    model.undo().unwrap();
    assert_eq!(log.kinds(), vec![EventKind::AboutToRemove, EventKind::Removed]);
    log.clear();

    model.redo().unwrap();
    assert_eq!(log.kinds(), vec![EventKind::AboutToInsert, EventKind::Inserted]);
}

#[test]
fn reset_and_destroy() {
    let hub = EventHub::new();
    let log = EventLog::attach(&hub);
    let mut model = Model::builder("GroupModel")
        .root(group())
        .event_hub(hub.clone())
        .build()
        .unwrap();

    model.clear().unwrap();
    assert_eq!(log.kinds(), vec![EventKind::AboutToReset, EventKind::Reset]);
    log.clear();

    drop(model);
    assert_eq!(log.kinds(), vec![EventKind::AboutToDestroy]);
}

#[test]
fn scope_drop_stops_delivery() {
    let mut model = group_model();
    let root = model.root_item();
    let hits = Rc::new(Cell::new(0));

    let scope = SubscriptionScope::new();
    let counter = Rc::clone(&hits);
    model
        .event_hub()
        .connect(EventKind::DataChanged, move |_| counter.set(counter.get() + 1), &scope);

    model.set_data(root, 1, roles::DATA).unwrap();
    drop(scope);
    model.set_data(root, 2, roles::DATA).unwrap();

    assert_eq!(hits.get(), 1);
    assert_eq!(model.event_hub().subscriber_count(EventKind::DataChanged), 0);
}

#[test]
fn subscriber_may_drop_its_own_scope() {
    let mut model = group_model();
    let root = model.root_item();
    let hits = Rc::new(Cell::new(0));

    let scope = Rc::new(RefCell::new(Some(SubscriptionScope::new())));
    let holder = Rc::clone(&scope);
    let counter = Rc::clone(&hits);
    let guard = scope.borrow();
    let active = guard.as_ref().unwrap();
    model.event_hub().connect(
        EventKind::DataChanged,
        move |_| {
            counter.set(counter.get() + 1);
            holder.borrow_mut().take();
        },
        active,
    );
    drop(guard);

    model.set_data(root, 1, roles::DATA).unwrap();
    model.set_data(root, 2, roles::DATA).unwrap();
    assert_eq!(hits.get(), 1);
}
