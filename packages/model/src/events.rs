//! # Event Hub
//!
//! Publish/subscribe dispatcher for model events.
//!
//! Every [`EventKind`] has its own channel, indexed by the kind's
//! discriminant. Subscriptions are always made through a
//! [`SubscriptionScope`]; dropping the scope severs every connection made
//! through it, so subscribers never have to unsubscribe by hand.
//!
//! Dispatch is synchronous and iterates over a snapshot of the channel, so a
//! callback may connect, disconnect, drop scopes or notify further events
//! without corrupting the list being walked.

use crate::tag::TagIndex;
use crate::tree::ItemKey;
use arbor_common::roles::Role;
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};
use tracing::{trace, warn};

/// Change notifications emitted by the composer pipeline
#[derive(Debug, Clone, PartialEq)]
pub enum ModelEvent {
    AboutToInsert {
        parent: ItemKey,
        tag_index: TagIndex,
    },
    Inserted {
        parent: ItemKey,
        tag_index: TagIndex,
        item: ItemKey,
    },
    AboutToRemove {
        parent: ItemKey,
        tag_index: TagIndex,
        item: ItemKey,
    },
    /// The removed subtree is no longer attached; only its identifier is left
    Removed {
        parent: ItemKey,
        tag_index: TagIndex,
        identifier: String,
    },
    DataChanged {
        item: ItemKey,
        role: Role,
    },
    AboutToReset {
        root: ItemKey,
    },
    Reset {
        root: ItemKey,
    },
    AboutToDestroy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    AboutToInsert = 0,
    Inserted = 1,
    AboutToRemove = 2,
    Removed = 3,
    DataChanged = 4,
    AboutToReset = 5,
    Reset = 6,
    AboutToDestroy = 7,
}

impl EventKind {
    pub const COUNT: usize = 8;

    pub const ALL: [EventKind; EventKind::COUNT] = [
        EventKind::AboutToInsert,
        EventKind::Inserted,
        EventKind::AboutToRemove,
        EventKind::Removed,
        EventKind::DataChanged,
        EventKind::AboutToReset,
        EventKind::Reset,
        EventKind::AboutToDestroy,
    ];

    fn channel(self) -> usize {
        self as usize
    }
}

impl ModelEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            ModelEvent::AboutToInsert { .. } => EventKind::AboutToInsert,
            ModelEvent::Inserted { .. } => EventKind::Inserted,
            ModelEvent::AboutToRemove { .. } => EventKind::AboutToRemove,
            ModelEvent::Removed { .. } => EventKind::Removed,
            ModelEvent::DataChanged { .. } => EventKind::DataChanged,
            ModelEvent::AboutToReset { .. } => EventKind::AboutToReset,
            ModelEvent::Reset { .. } => EventKind::Reset,
            ModelEvent::AboutToDestroy => EventKind::AboutToDestroy,
        }
    }
}

type Callback = Rc<RefCell<dyn FnMut(&ModelEvent)>>;

struct Subscriber {
    id: u64,
    callback: Callback,
}

#[derive(Default)]
struct HubState {
    channels: [Vec<Subscriber>; EventKind::COUNT],
    next_id: u64,
}

impl HubState {
    /// The removed subscriber is handed back so the caller can drop it after
    /// releasing the borrow: its callback may own scopes of this very hub.
    fn remove(&mut self, connection: Connection) -> Option<Subscriber> {
        let channel = &mut self.channels[connection.kind.channel()];
        let position = channel.iter().position(|s| s.id == connection.id)?;
        Some(channel.remove(position))
    }

    fn is_connected(&self, kind: EventKind, id: u64) -> bool {
        self.channels[kind.channel()].iter().any(|s| s.id == id)
    }
}

/// Handle identifying one callback registration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Connection {
    kind: EventKind,
    id: u64,
}

impl Connection {
    pub fn kind(&self) -> EventKind {
        self.kind
    }
}

/// Lifetime token for subscriptions.
///
/// Connections made through a scope are removed from their hub when the
/// scope is dropped.
#[derive(Default)]
pub struct SubscriptionScope {
    disconnectors: RefCell<Vec<Box<dyn FnOnce()>>>,
}

impl SubscriptionScope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of connections made through this scope
    pub fn len(&self) -> usize {
        self.disconnectors.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn push(&self, disconnect: Box<dyn FnOnce()>) {
        self.disconnectors.borrow_mut().push(disconnect);
    }
}

impl Drop for SubscriptionScope {
    fn drop(&mut self) {
        for disconnect in self.disconnectors.get_mut().drain(..) {
            disconnect();
        }
    }
}

impl fmt::Debug for SubscriptionScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriptionScope")
            .field("connections", &self.len())
            .finish()
    }
}

/// Shared handle to a dispatcher; clones refer to the same channels
#[derive(Clone, Default)]
pub struct EventHub {
    state: Rc<RefCell<HubState>>,
}

impl EventHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `callback` for events of `kind` for as long as `scope` lives
    pub fn connect(
        &self,
        kind: EventKind,
        callback: impl FnMut(&ModelEvent) + 'static,
        scope: &SubscriptionScope,
    ) -> Connection {
        self.connect_callback(kind, Rc::new(RefCell::new(callback)), scope)
    }

    /// Register the same callback on several channels.
    ///
    /// Every channel holds the one callback cell, so a notification raised
    /// from inside the callback is skipped like any re-entrant call.
    pub fn connect_many(
        &self,
        kinds: &[EventKind],
        callback: impl FnMut(&ModelEvent) + 'static,
        scope: &SubscriptionScope,
    ) -> Vec<Connection> {
        let shared: Callback = Rc::new(RefCell::new(callback));
        kinds
            .iter()
            .map(|kind| self.connect_callback(*kind, Rc::clone(&shared), scope))
            .collect()
    }

    fn connect_callback(&self, kind: EventKind, callback: Callback, scope: &SubscriptionScope) -> Connection {
        let connection = {
            let mut state = self.state.borrow_mut();
            state.next_id += 1;
            let id = state.next_id;
            state.channels[kind.channel()].push(Subscriber { id, callback });
            Connection { kind, id }
        };

        let hub: Weak<RefCell<HubState>> = Rc::downgrade(&self.state);
        scope.push(Box::new(move || {
            if let Some(state) = hub.upgrade() {
                let removed = state.borrow_mut().remove(connection);
                drop(removed);
            }
        }));
        connection
    }

    /// Remove one connection ahead of its scope; returns whether it was live
    pub fn disconnect(&self, connection: Connection) -> bool {
        let removed = self.state.borrow_mut().remove(connection);
        removed.is_some()
    }

    pub fn subscriber_count(&self, kind: EventKind) -> usize {
        self.state.borrow().channels[kind.channel()].len()
    }

    /// Invoke every live callback of the event's channel, in registration order
    pub fn notify(&self, event: ModelEvent) {
        let kind = event.kind();
        let snapshot: Vec<(u64, Callback)> = self.state.borrow().channels[kind.channel()]
            .iter()
            .map(|s| (s.id, Rc::clone(&s.callback)))
            .collect();
        trace!(?kind, subscribers = snapshot.len(), "Dispatching event");

        for (id, callback) in snapshot {
            if !self.state.borrow().is_connected(kind, id) {
                continue;
            }
            match callback.try_borrow_mut() {
                Ok(mut callback) => (&mut *callback)(&event),
                Err(_) => warn!(?kind, id, "Skipping re-entrant callback"),
            }
        }
    }
}

impl fmt::Debug for EventHub {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        let counts: Vec<usize> = state.channels.iter().map(Vec::len).collect();
        f.debug_struct("EventHub").field("subscribers", &counts).finish()
    }
}
