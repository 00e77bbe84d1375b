//! Change mapper: the model's publish/subscribe registry.
//!
//! A [`ModelMapper`] decouples "something changed in the tree" from "who
//! cares". Interested parties register callbacks per event kind under a
//! [`Subscriber`] identity; [`Model`] mutations notify the mapper after
//! the change has been applied and internal locks released.
//!
//! Notification is snapshot-then-iterate: the registration list at the
//! start of a notification is invoked in registration order, even if a
//! callback subscribes or unsubscribes anyone mid-flight. A panicking
//! callback propagates to the mutation call site; nothing is swallowed.
//!
//! [`Model`]: crate::model::Model

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::logging::targets;
use crate::model::ItemId;
use crate::role::Role;

/// Opaque identity for a group of registrations.
///
/// One subscriber typically owns several callbacks across event kinds;
/// [`ModelMapper::unsubscribe`] removes them all at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Subscriber(u64);

impl Subscriber {
    /// Allocates a fresh identity.
    pub fn new() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for Subscriber {
    fn default() -> Self {
        Self::new()
    }
}

/// Policy for repeated registration of the same subscriber on the same
/// event kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DuplicatePolicy {
    /// Every registration is kept; a duplicate appends a second entry.
    #[default]
    Accumulate,
    /// A duplicate replaces the subscriber's earlier registrations for
    /// that event kind.
    Replace,
}

/// Data stored for a role of an item has changed.
#[derive(Debug, Clone, PartialEq)]
pub struct DataChanged {
    /// The item whose data changed.
    pub item: ItemId,
    /// The role that changed.
    pub role: Role,
}

/// A named property of an item has changed.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyChanged {
    /// The item owning the property.
    pub item: ItemId,
    /// The property name.
    pub property: String,
}

/// A child item has been inserted.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemInserted {
    /// The parent receiving the child.
    pub parent: ItemId,
    /// The tag the child was inserted into.
    pub tag: String,
    /// The row within the tag.
    pub row: usize,
}

/// A child item (and its subtree) has been removed.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemRemoved {
    /// The parent the child was removed from.
    pub parent: ItemId,
    /// The tag the child was removed from.
    pub tag: String,
    /// The row the child occupied.
    pub row: usize,
    /// The removed child's model type.
    pub model_type: String,
}

type Callback<E> = Arc<dyn Fn(&E) + Send + Sync>;
type Registry<E> = Vec<(Callback<E>, Subscriber)>;

#[derive(Default)]
struct Registries {
    data_changed: Registry<DataChanged>,
    property_changed: Registry<PropertyChanged>,
    item_inserted: Registry<ItemInserted>,
    item_removed: Registry<ItemRemoved>,
}

/// Per-model registry fanning out change notifications.
pub struct ModelMapper {
    registries: Mutex<Registries>,
    active: AtomicBool,
    policy: DuplicatePolicy,
}

impl Default for ModelMapper {
    fn default() -> Self {
        Self::new()
    }
}

impl ModelMapper {
    /// Creates a mapper with the default [`DuplicatePolicy::Accumulate`].
    pub fn new() -> Self {
        Self::with_policy(DuplicatePolicy::default())
    }

    /// Creates a mapper with an explicit duplicate policy.
    pub fn with_policy(policy: DuplicatePolicy) -> Self {
        Self {
            registries: Mutex::new(Registries::default()),
            active: AtomicBool::new(true),
            policy,
        }
    }

    /// The duplicate policy this mapper was created with.
    pub fn policy(&self) -> DuplicatePolicy {
        self.policy
    }

    /// Registers a callback for data changes.
    pub fn on_data_changed<F>(&self, callback: F, subscriber: Subscriber)
    where
        F: Fn(&DataChanged) + Send + Sync + 'static,
    {
        let mut registries = self.registries.lock();
        Self::register(self.policy, &mut registries.data_changed, callback, subscriber);
    }

    /// Registers a callback for named property changes.
    pub fn on_property_changed<F>(&self, callback: F, subscriber: Subscriber)
    where
        F: Fn(&PropertyChanged) + Send + Sync + 'static,
    {
        let mut registries = self.registries.lock();
        Self::register(
            self.policy,
            &mut registries.property_changed,
            callback,
            subscriber,
        );
    }

    /// Registers a callback for item insertion.
    pub fn on_item_inserted<F>(&self, callback: F, subscriber: Subscriber)
    where
        F: Fn(&ItemInserted) + Send + Sync + 'static,
    {
        let mut registries = self.registries.lock();
        Self::register(self.policy, &mut registries.item_inserted, callback, subscriber);
    }

    /// Registers a callback for item removal.
    pub fn on_item_removed<F>(&self, callback: F, subscriber: Subscriber)
    where
        F: Fn(&ItemRemoved) + Send + Sync + 'static,
    {
        let mut registries = self.registries.lock();
        Self::register(self.policy, &mut registries.item_removed, callback, subscriber);
    }

    fn register<E, F>(
        policy: DuplicatePolicy,
        registry: &mut Registry<E>,
        callback: F,
        subscriber: Subscriber,
    ) where
        F: Fn(&E) + Send + Sync + 'static,
    {
        if policy == DuplicatePolicy::Replace {
            registry.retain(|(_, s)| *s != subscriber);
        }
        registry.push((Arc::new(callback), subscriber));
    }

    /// Removes every registration held by `subscriber`, across all event
    /// kinds.
    ///
    /// Safe to call from inside a callback of an in-flight notification;
    /// the current snapshot still runs to completion, subsequent
    /// notifications no longer reach the subscriber.
    pub fn unsubscribe(&self, subscriber: Subscriber) {
        let mut registries = self.registries.lock();
        registries.data_changed.retain(|(_, s)| *s != subscriber);
        registries.property_changed.retain(|(_, s)| *s != subscriber);
        registries.item_inserted.retain(|(_, s)| *s != subscriber);
        registries.item_removed.retain(|(_, s)| *s != subscriber);
        tracing::trace!(target: targets::MAPPER, ?subscriber, "unsubscribed");
    }

    /// While inactive, every notification is a no-op; mutations are not
    /// replayed on reactivation. Registration state is unaffected.
    ///
    /// Used to suppress notification storms during bulk operations such
    /// as document loading.
    pub fn set_active(&self, active: bool) {
        self.active.store(active, Ordering::SeqCst);
    }

    /// Whether notifications are currently delivered.
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    fn snapshot<E>(&self, select: impl FnOnce(&Registries) -> &Registry<E>) -> Registry<E> {
        select(&self.registries.lock()).clone()
    }

    pub(crate) fn notify_data_changed(&self, event: DataChanged) {
        if !self.is_active() {
            return;
        }
        let snapshot = self.snapshot(|r| &r.data_changed);
        tracing::trace!(target: targets::MAPPER, item = ?event.item, role = ?event.role, callbacks = snapshot.len(), "data changed");
        for (callback, _) in snapshot {
            callback(&event);
        }
    }

    pub(crate) fn notify_property_changed(&self, event: PropertyChanged) {
        if !self.is_active() {
            return;
        }
        let snapshot = self.snapshot(|r| &r.property_changed);
        tracing::trace!(target: targets::MAPPER, item = ?event.item, property = %event.property, callbacks = snapshot.len(), "property changed");
        for (callback, _) in snapshot {
            callback(&event);
        }
    }

    pub(crate) fn notify_item_inserted(&self, event: ItemInserted) {
        if !self.is_active() {
            return;
        }
        let snapshot = self.snapshot(|r| &r.item_inserted);
        tracing::trace!(target: targets::MAPPER, parent = ?event.parent, tag = %event.tag, row = event.row, "item inserted");
        for (callback, _) in snapshot {
            callback(&event);
        }
    }

    pub(crate) fn notify_item_removed(&self, event: ItemRemoved) {
        if !self.is_active() {
            return;
        }
        let snapshot = self.snapshot(|r| &r.item_removed);
        tracing::trace!(target: targets::MAPPER, parent = ?event.parent, tag = %event.tag, row = event.row, "item removed");
        for (callback, _) in snapshot {
            callback(&event);
        }
    }

    /// Total number of registrations across all event kinds.
    pub fn registration_count(&self) -> usize {
        let registries = self.registries.lock();
        registries.data_changed.len()
            + registries.property_changed.len()
            + registries.item_inserted.len()
            + registries.item_removed.len()
    }
}
