use crate::item::Item;
use crate::tag::TagContainer;
use arbor_common::roles::Role;
use arbor_common::Variant;

/// Visitor pattern for traversing detached item trees
///
/// Default implementations walk the entire subtree in tag order.
/// Override specific visit_* methods to act on particular nodes.
pub trait ItemVisitor: Sized {
    fn visit_item(&mut self, item: &Item) {
        walk_item(self, item);
    }

    fn visit_tag(&mut self, _owner: &Item, container: &TagContainer<Item>) {
        walk_tag(self, container);
    }

    fn visit_data(&mut self, _owner: &Item, _role: Role, _value: &Variant) {
        // Leaf, nothing to walk
    }
}

pub fn walk_item<V: ItemVisitor>(visitor: &mut V, item: &Item) {
    for (role, value) in item.item_data().iter() {
        visitor.visit_data(item, role, value);
    }
    for container in item.tags().containers() {
        visitor.visit_tag(item, container);
    }
}

pub fn walk_tag<V: ItemVisitor>(visitor: &mut V, container: &TagContainer<Item>) {
    for child in container.items() {
        visitor.visit_item(child);
    }
}

/// Identifiers of every item in a subtree, in visiting order
#[derive(Debug, Default)]
pub struct IdentifierCollector {
    pub identifiers: Vec<String>,
}

impl IdentifierCollector {
    pub fn collect(item: &Item) -> Vec<String> {
        let mut collector = Self::default();
        collector.visit_item(item);
        collector.identifiers
    }
}

impl ItemVisitor for IdentifierCollector {
    fn visit_item(&mut self, item: &Item) {
        self.identifiers.push(item.identifier().to_string());
        walk_item(self, item);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tag::{TagIndex, TagInfo};

    fn sample() -> Item {
        let mut root = Item::with_identifier("Group", "root");
        root.register_tag(TagInfo::universal("children"), true).unwrap();
        root.insert_item(Item::with_identifier("Leaf", "child"), &TagIndex::append("children"))
            .unwrap();
        root.insert_item(Item::with_identifier("Leaf", "other"), &TagIndex::append("children"))
            .unwrap();
        root
    }

    #[test]
    fn test_collect_identifiers() {
        assert_eq!(
            IdentifierCollector::collect(&sample()),
            vec!["root", "child", "other"]
        );
    }
}
