use arbor_model::{
    EventHub, EventKind, Item, ItemFactory, Model, ModelEvent, SubscriptionScope, TagIndex, TagInfo,
};
use std::cell::RefCell;
use std::rc::Rc;

pub const GROUP: &str = "Group";
pub const LEAF: &str = "Leaf";
pub const CHILDREN: &str = "children";

pub fn group() -> Item {
    let mut item = Item::new(GROUP);
    item.register_tag(TagInfo::universal(CHILDREN), true).unwrap();
    item
}

pub fn leaf() -> Item {
    Item::new(LEAF)
}

/// Standard items plus Group and Leaf
pub fn factory() -> Rc<ItemFactory> {
    let mut factory = ItemFactory::with_standard_items();
    factory.register_item(GROUP, group, "Group").unwrap();
    factory.register_item(LEAF, leaf, "Leaf").unwrap();
    Rc::new(factory)
}

/// Model whose root is a Group
pub fn group_model() -> Model {
    Model::builder("GroupModel")
        .root(group())
        .factory(factory())
        .build()
        .unwrap()
}

pub fn append() -> TagIndex {
    TagIndex::append(CHILDREN)
}

/// Records every event emitted on a hub while alive
pub struct EventLog {
    events: Rc<RefCell<Vec<ModelEvent>>>,
    _scope: SubscriptionScope,
}

impl EventLog {
    pub fn attach(hub: &EventHub) -> Self {
        let scope = SubscriptionScope::new();
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&events);
        hub.connect_many(&EventKind::ALL, move |event| sink.borrow_mut().push(event.clone()), &scope);
        Self { events, _scope: scope }
    }

    pub fn kinds(&self) -> Vec<EventKind> {
        self.events.borrow().iter().map(ModelEvent::kind).collect()
    }

    pub fn count(&self, kind: EventKind) -> usize {
        self.events.borrow().iter().filter(|e| e.kind() == kind).count()
    }

    pub fn events(&self) -> Vec<ModelEvent> {
        self.events.borrow().clone()
    }

    pub fn clear(&self) {
        self.events.borrow_mut().clear();
    }
}
