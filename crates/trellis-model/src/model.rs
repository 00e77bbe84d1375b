//! The item tree model.
//!
//! [`Model`] owns every item of one domain tree in an arena, hands out
//! stable [`ItemId`] handles, and notifies its [`ModelMapper`] after
//! each mutation. All mutators take `&self`: the arena lives behind a
//! lock that is always released before callbacks run, so callbacks may
//! freely query the model.
//!
//! Items are created from [`ItemCatalog`] blueprints. A blueprint's
//! named properties materialize as single-slot child items whose `Data`
//! role holds the value; property children are part of item
//! construction and do not produce insertion notifications of their own.

use std::sync::Arc;

use parking_lot::RwLock;
use slotmap::{new_key_type, SlotMap};

use crate::catalog::{Blueprint, ItemCatalog, PROPERTY_TYPE};
use crate::error::{ModelError, Result};
use crate::logging::targets;
use crate::mapper::{
    DataChanged, DuplicatePolicy, ItemInserted, ItemRemoved, ModelMapper, PropertyChanged,
};
use crate::role::{ItemData, Role};
use crate::tags::{ItemTags, TagInfo, TagRow};
use crate::value::Value;

new_key_type! {
    /// A stable handle to an item in the model's arena.
    ///
    /// Ids stay valid while the tree changes around them and become
    /// invalid when the item is removed.
    pub struct ItemId;
}

/// Model type of the invisible root item.
pub const ROOT_TYPE: &str = "Root";

/// Default child tag of the root item.
pub const ROOT_TAG: &str = "items";

pub(crate) struct ItemNode {
    pub(crate) model_type: String,
    pub(crate) data: ItemData,
    pub(crate) tags: ItemTags,
    pub(crate) parent: Option<ItemId>,
}

/// The domain model: an item tree plus its change mapper.
pub struct Model {
    pub(crate) items: RwLock<SlotMap<ItemId, ItemNode>>,
    root: ItemId,
    mapper: ModelMapper,
    catalog: Arc<ItemCatalog>,
}

impl Model {
    /// Creates an empty model over the given catalog.
    pub fn new(catalog: Arc<ItemCatalog>) -> Self {
        Self::with_policy(catalog, DuplicatePolicy::default())
    }

    /// Creates an empty model with an explicit mapper duplicate policy.
    pub fn with_policy(catalog: Arc<ItemCatalog>, policy: DuplicatePolicy) -> Self {
        let mut items = SlotMap::with_key();
        let root = items.insert(Self::root_node());
        Self {
            items: RwLock::new(items),
            root,
            mapper: ModelMapper::with_policy(policy),
            catalog,
        }
    }

    fn root_node() -> ItemNode {
        let mut tags = ItemTags::new();
        tags.register(TagInfo::universal(ROOT_TAG), true);
        ItemNode {
            model_type: ROOT_TYPE.to_string(),
            data: ItemData::new(),
            tags,
            parent: None,
        }
    }

    /// The invisible root item.
    pub fn root(&self) -> ItemId {
        self.root
    }

    /// The model's change mapper.
    pub fn mapper(&self) -> &ModelMapper {
        &self.mapper
    }

    /// The item catalog this model creates items from.
    pub fn catalog(&self) -> &Arc<ItemCatalog> {
        &self.catalog
    }

    /// Returns `true` if the id refers to a live item.
    pub fn contains(&self, id: ItemId) -> bool {
        self.items.read().contains_key(id)
    }

    /// The model type of an item.
    pub fn model_type(&self, id: ItemId) -> Result<String> {
        self.items
            .read()
            .get(id)
            .map(|node| node.model_type.clone())
            .ok_or(ModelError::InvalidItem)
    }

    /// The parent of an item; `None` for the root.
    pub fn parent(&self, id: ItemId) -> Result<Option<ItemId>> {
        self.items
            .read()
            .get(id)
            .map(|node| node.parent)
            .ok_or(ModelError::InvalidItem)
    }

    /// Registered tag names of an item, in registration order.
    pub fn tag_names(&self, id: ItemId) -> Result<Vec<String>> {
        self.items
            .read()
            .get(id)
            .map(|node| node.tags.tag_names())
            .ok_or(ModelError::InvalidItem)
    }

    /// The item's default tag name.
    pub fn default_tag(&self, id: ItemId) -> Result<String> {
        self.items
            .read()
            .get(id)
            .map(|node| node.tags.default_tag().to_string())
            .ok_or(ModelError::InvalidItem)
    }

    /// Children under a tag, in order. An empty tag name targets the
    /// default tag.
    pub fn children(&self, id: ItemId, tag: &str) -> Result<Vec<ItemId>> {
        let items = self.items.read();
        let node = items.get(id).ok_or(ModelError::InvalidItem)?;
        let tag = node.tags.resolve(Some(tag));
        Ok(node.tags.children(&tag)?.to_vec())
    }

    /// The child at `(tag, row)`.
    pub fn item_at(&self, id: ItemId, tag: &str, row: usize) -> Result<ItemId> {
        let items = self.items.read();
        let node = items.get(id).ok_or(ModelError::InvalidItem)?;
        let tag = node.tags.resolve(Some(tag));
        node.tags.item_at(&tag, row)
    }

    /// Locates an item within its parent, returning `(tag, row)`.
    pub fn position_of(&self, id: ItemId) -> Result<Option<(String, usize)>> {
        let items = self.items.read();
        let node = items.get(id).ok_or(ModelError::InvalidItem)?;
        let Some(parent) = node.parent else {
            return Ok(None);
        };
        let parent_node = items.get(parent).ok_or(ModelError::InvalidItem)?;
        Ok(parent_node.tags.position_of(id))
    }

    // -------------------------------------------------------------------------
    // Structure mutation
    // -------------------------------------------------------------------------

    /// Inserts a new item built from the catalog blueprint for
    /// `model_type`.
    ///
    /// Fails for unregistered types and for positions violating the tag's
    /// cardinality or model-type constraints. Notifies `ItemInserted`
    /// for the new item (not for its property children).
    pub fn insert_item(
        &self,
        model_type: &str,
        parent: ItemId,
        tagrow: &TagRow,
    ) -> Result<ItemId> {
        let blueprint = self.catalog.create(model_type)?;

        let (id, tag, row) = {
            let mut items = self.items.write();
            let parent_node = items.get(parent).ok_or(ModelError::InvalidItem)?;
            let tag = parent_node.tags.resolve(tagrow.tag.as_deref());
            let row = parent_node.tags.can_insert(&tag, tagrow.row, model_type)?;

            let id = Self::spawn(&mut items, model_type, blueprint, Some(parent))?;
            items
                .get_mut(parent)
                .ok_or(ModelError::InvalidItem)?
                .tags
                .insert(&tag, row, id)?;
            (id, tag, row)
        };

        tracing::debug!(target: targets::MODEL, %model_type, ?parent, %tag, row, "item inserted");
        self.mapper.notify_item_inserted(ItemInserted { parent, tag, row });
        Ok(id)
    }

    /// Materializes a blueprint into the arena, including property
    /// children.
    fn spawn(
        items: &mut SlotMap<ItemId, ItemNode>,
        model_type: &str,
        blueprint: Blueprint,
        parent: Option<ItemId>,
    ) -> Result<ItemId> {
        let mut data = ItemData::new();
        for (role, value) in blueprint.data {
            data.set(role, value);
        }

        let mut tags = ItemTags::new();
        for (info, set_default) in &blueprint.tags {
            tags.register(info.clone(), *set_default);
        }
        for (name, _) in &blueprint.properties {
            tags.register(TagInfo::property(name.clone(), PROPERTY_TYPE), false);
        }

        let id = items.insert(ItemNode {
            model_type: model_type.to_string(),
            data,
            tags,
            parent,
        });

        for (name, default) in blueprint.properties {
            let mut property_data = ItemData::new();
            property_data.set(Role::Data, default);
            property_data.set(Role::Display, Value::from(name.as_str()));
            let child = items.insert(ItemNode {
                model_type: PROPERTY_TYPE.to_string(),
                data: property_data,
                tags: ItemTags::new(),
                parent: Some(id),
            });
            items
                .get_mut(id)
                .ok_or(ModelError::InvalidItem)?
                .tags
                .insert(&name, 0, child)?;
        }

        Ok(id)
    }

    /// Removes the child at `(tag, row)` and its whole subtree.
    ///
    /// Fails if removal would violate the tag's minimum cardinality.
    /// Notifies `ItemRemoved` carrying the removed child's model type.
    pub fn remove_item(&self, parent: ItemId, tag: Option<&str>, row: usize) -> Result<()> {
        let (tag, model_type) = {
            let mut items = self.items.write();
            let parent_node = items.get(parent).ok_or(ModelError::InvalidItem)?;
            let tag = parent_node.tags.resolve(tag);
            parent_node.tags.can_remove(&tag, row)?;
            let child = parent_node.tags.item_at(&tag, row)?;
            let model_type = items
                .get(child)
                .ok_or(ModelError::InvalidItem)?
                .model_type
                .clone();

            let mut doomed = Vec::new();
            Self::collect_descendants(&items, child, &mut doomed);

            items
                .get_mut(parent)
                .ok_or(ModelError::InvalidItem)?
                .tags
                .remove(&tag, row)?;
            for id in doomed {
                items.remove(id);
            }
            items.remove(child);
            (tag, model_type)
        };

        tracing::debug!(target: targets::MODEL, ?parent, %tag, row, %model_type, "item removed");
        self.mapper.notify_item_removed(ItemRemoved {
            parent,
            tag,
            row,
            model_type,
        });
        Ok(())
    }

    pub(crate) fn collect_descendants(
        items: &SlotMap<ItemId, ItemNode>,
        id: ItemId,
        out: &mut Vec<ItemId>,
    ) {
        if let Some(node) = items.get(id) {
            for child in node.tags.all_children() {
                Self::collect_descendants(items, child, out);
                out.push(child);
            }
        }
    }

    /// Removes every top-level item, leaving an empty root.
    pub fn clear(&self) {
        let removed = {
            let mut items = self.items.write();
            let mut removed = Vec::new();
            let Some(root_node) = items.get(self.root) else {
                return;
            };
            let containers: Vec<(String, Vec<ItemId>)> = root_node
                .tags
                .tag_names()
                .into_iter()
                .filter_map(|tag| {
                    root_node
                        .tags
                        .children(&tag)
                        .ok()
                        .map(|children| (tag, children.to_vec()))
                })
                .collect();

            for (tag, children) in containers {
                // Back to front so rows stay meaningful in notifications.
                for (row, child) in children.iter().enumerate().rev() {
                    let model_type = items
                        .get(*child)
                        .map(|node| node.model_type.clone())
                        .unwrap_or_default();
                    let mut doomed = Vec::new();
                    Self::collect_descendants(&items, *child, &mut doomed);
                    for id in doomed {
                        items.remove(id);
                    }
                    items.remove(*child);
                    removed.push((tag.clone(), row, model_type));
                }
            }

            if let Some(root_node) = items.get_mut(self.root) {
                *root_node = Self::root_node();
            }
            removed
        };

        for (tag, row, model_type) in removed {
            self.mapper.notify_item_removed(ItemRemoved {
                parent: self.root,
                tag,
                row,
                model_type,
            });
        }
    }

    // -------------------------------------------------------------------------
    // Data access
    // -------------------------------------------------------------------------

    /// The value stored for a role, if any.
    pub fn data(&self, id: ItemId, role: Role) -> Result<Option<Value>> {
        self.items
            .read()
            .get(id)
            .map(|node| node.data.get(role).cloned())
            .ok_or(ModelError::InvalidItem)
    }

    /// Stores a value for a role. Notifies `DataChanged` only when the
    /// stored value actually changed; returns that change flag.
    pub fn set_data(&self, id: ItemId, role: Role, value: Value) -> Result<bool> {
        let changed = {
            let mut items = self.items.write();
            let node = items.get_mut(id).ok_or(ModelError::InvalidItem)?;
            node.data.set(role, value)
        };
        if changed {
            self.mapper.notify_data_changed(DataChanged { item: id, role });
        }
        Ok(changed)
    }

    /// Returns `true` if the item carries a named property.
    pub fn has_property(&self, id: ItemId, name: &str) -> Result<bool> {
        let items = self.items.read();
        let node = items.get(id).ok_or(ModelError::InvalidItem)?;
        Ok(node.tags.contains_tag(name) && node.tags.item_at(name, 0).is_ok())
    }

    fn property_child(
        items: &SlotMap<ItemId, ItemNode>,
        id: ItemId,
        name: &str,
    ) -> Result<ItemId> {
        let node = items.get(id).ok_or(ModelError::InvalidItem)?;
        if !node.tags.contains_tag(name) {
            return Err(ModelError::UnknownProperty {
                name: name.to_string(),
            });
        }
        node.tags
            .item_at(name, 0)
            .map_err(|_| ModelError::UnknownProperty {
                name: name.to_string(),
            })
    }

    /// The value of a named property.
    pub fn property(&self, id: ItemId, name: &str) -> Result<Value> {
        let items = self.items.read();
        let child = Self::property_child(&items, id, name)?;
        items
            .get(child)
            .and_then(|node| node.data.get(Role::Data).cloned())
            .ok_or_else(|| ModelError::UnknownProperty {
                name: name.to_string(),
            })
    }

    /// Sets a named property.
    ///
    /// Notifies `DataChanged` for the backing property item and
    /// `PropertyChanged` for the owner, in that order, when the value
    /// actually changed.
    pub fn set_property(&self, id: ItemId, name: &str, value: Value) -> Result<bool> {
        let (child, changed) = {
            let mut items = self.items.write();
            let child = Self::property_child(&items, id, name)?;
            let node = items.get_mut(child).ok_or(ModelError::InvalidItem)?;
            (child, node.data.set(Role::Data, value))
        };
        if changed {
            self.mapper.notify_data_changed(DataChanged {
                item: child,
                role: Role::Data,
            });
            self.mapper.notify_property_changed(PropertyChanged {
                item: id,
                property: name.to_string(),
            });
        }
        Ok(changed)
    }

    /// Sets several named properties as one batch.
    ///
    /// Every write is applied before any notification goes out, so
    /// observers never see a half-updated set (for example a rectangle
    /// with `xlow > xup`). Returns `true` if anything changed.
    pub fn set_properties(&self, id: ItemId, updates: &[(&str, Value)]) -> Result<bool> {
        let changed = {
            let mut items = self.items.write();
            // Resolve everything first so a bad name leaves the batch
            // unapplied.
            let children = updates
                .iter()
                .map(|(name, _)| Self::property_child(&items, id, name))
                .collect::<Result<Vec<_>>>()?;

            let mut changed = Vec::new();
            for ((name, value), child) in updates.iter().zip(children) {
                let node = items.get_mut(child).ok_or(ModelError::InvalidItem)?;
                if node.data.set(Role::Data, value.clone()) {
                    changed.push((child, name.to_string()));
                }
            }
            changed
        };

        let any = !changed.is_empty();
        for (child, name) in changed {
            self.mapper.notify_data_changed(DataChanged {
                item: child,
                role: Role::Data,
            });
            self.mapper.notify_property_changed(PropertyChanged {
                item: id,
                property: name,
            });
        }
        Ok(any)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    fn catalog() -> Arc<ItemCatalog> {
        let catalog = ItemCatalog::new();
        catalog.register("Container", || {
            Blueprint::new().with_universal_tag("items", true)
        });
        catalog.register("Axis", || {
            Blueprint::new()
                .with_property("min", Value::from(0.0))
                .with_property("max", Value::from(1.0))
        });
        catalog.register("Leaf", Blueprint::new);
        Arc::new(catalog)
    }

    #[test]
    fn test_insert_and_query() {
        let model = Model::new(catalog());
        let container = model
            .insert_item("Container", model.root(), &TagRow::append())
            .unwrap();
        let leaf = model
            .insert_item("Leaf", container, &TagRow::append())
            .unwrap();

        assert_eq!(model.model_type(container).unwrap(), "Container");
        assert_eq!(model.parent(leaf).unwrap(), Some(container));
        assert_eq!(model.children(container, "").unwrap(), vec![leaf]);
        assert_eq!(
            model.position_of(leaf).unwrap(),
            Some(("items".to_string(), 0))
        );
    }

    #[test]
    fn test_insert_unknown_type_fails() {
        let model = Model::new(catalog());
        assert!(matches!(
            model.insert_item("Ghost", model.root(), &TagRow::append()),
            Err(ModelError::UnknownType { .. })
        ));
    }

    #[test]
    fn test_insert_notifies_once() {
        let model = Model::new(catalog());
        let events = Arc::new(Mutex::new(Vec::new()));

        let events_clone = events.clone();
        model.mapper().on_item_inserted(
            move |event| {
                events_clone.lock().push((event.tag.clone(), event.row));
            },
            crate::mapper::Subscriber::new(),
        );

        // Property children are construction details, not insertions.
        model
            .insert_item("Axis", model.root(), &TagRow::append())
            .unwrap();
        assert_eq!(*events.lock(), vec![("items".to_string(), 0)]);
    }

    #[test]
    fn test_remove_cascades() {
        let model = Model::new(catalog());
        let container = model
            .insert_item("Container", model.root(), &TagRow::append())
            .unwrap();
        let axis = model
            .insert_item("Axis", container, &TagRow::append())
            .unwrap();
        let min_child = model.item_at(axis, "min", 0).unwrap();

        model.remove_item(model.root(), None, 0).unwrap();
        assert!(!model.contains(container));
        assert!(!model.contains(axis));
        assert!(!model.contains(min_child));
    }

    #[test]
    fn test_remove_notifies_model_type() {
        let model = Model::new(catalog());
        model
            .insert_item("Leaf", model.root(), &TagRow::append())
            .unwrap();

        let events = Arc::new(Mutex::new(Vec::new()));
        let events_clone = events.clone();
        model.mapper().on_item_removed(
            move |event| {
                events_clone
                    .lock()
                    .push((event.model_type.clone(), event.row));
            },
            crate::mapper::Subscriber::new(),
        );

        model.remove_item(model.root(), None, 0).unwrap();
        assert_eq!(*events.lock(), vec![("Leaf".to_string(), 0)]);
    }

    #[test]
    fn test_set_data_detects_change() {
        let model = Model::new(catalog());
        let leaf = model
            .insert_item("Leaf", model.root(), &TagRow::append())
            .unwrap();

        let count = Arc::new(Mutex::new(0));
        let count_clone = count.clone();
        model.mapper().on_data_changed(
            move |_| *count_clone.lock() += 1,
            crate::mapper::Subscriber::new(),
        );

        assert!(model.set_data(leaf, Role::Data, Value::from(5)).unwrap());
        assert!(!model.set_data(leaf, Role::Data, Value::from(5)).unwrap());
        assert_eq!(*count.lock(), 1);
        assert_eq!(
            model.data(leaf, Role::Data).unwrap(),
            Some(Value::from(5))
        );
    }

    #[test]
    fn test_properties() {
        let model = Model::new(catalog());
        let axis = model
            .insert_item("Axis", model.root(), &TagRow::append())
            .unwrap();

        assert!(model.has_property(axis, "min").unwrap());
        assert!(!model.has_property(axis, "center").unwrap());
        assert_eq!(model.property(axis, "min").unwrap(), Value::from(0.0));

        assert!(model
            .set_property(axis, "min", Value::from(-1.0))
            .unwrap());
        assert_eq!(model.property(axis, "min").unwrap(), Value::from(-1.0));

        assert!(matches!(
            model.property(axis, "center"),
            Err(ModelError::UnknownProperty { .. })
        ));
    }

    #[test]
    fn test_property_change_notifies_owner() {
        let model = Model::new(catalog());
        let axis = model
            .insert_item("Axis", model.root(), &TagRow::append())
            .unwrap();

        let events = Arc::new(Mutex::new(Vec::new()));
        let events_clone = events.clone();
        model.mapper().on_property_changed(
            move |event| {
                events_clone
                    .lock()
                    .push((event.item, event.property.clone()));
            },
            crate::mapper::Subscriber::new(),
        );

        model.set_property(axis, "max", Value::from(2.0)).unwrap();
        assert_eq!(*events.lock(), vec![(axis, "max".to_string())]);
    }

    #[test]
    fn test_set_properties_batch_before_notification() {
        let model = Model::new(catalog());
        let axis = model
            .insert_item("Axis", model.root(), &TagRow::append())
            .unwrap();

        // Record the full (min, max) pair at every notification: the
        // batch must never be observed half-applied.
        let observed = Arc::new(Mutex::new(Vec::new()));
        let observed_clone = observed.clone();
        let model_arc = Arc::new(model);
        let model_clone = model_arc.clone();
        model_arc.mapper().on_property_changed(
            move |event| {
                let min = model_clone.property(event.item, "min").unwrap();
                let max = model_clone.property(event.item, "max").unwrap();
                observed_clone.lock().push((min, max));
            },
            crate::mapper::Subscriber::new(),
        );

        model_arc
            .set_properties(axis, &[("min", Value::from(10.0)), ("max", Value::from(20.0))])
            .unwrap();

        let observed = observed.lock();
        assert_eq!(observed.len(), 2);
        for (min, max) in observed.iter() {
            assert_eq!(min, &Value::from(10.0));
            assert_eq!(max, &Value::from(20.0));
        }
    }

    #[test]
    fn test_set_properties_unknown_name_leaves_batch_unapplied() {
        let model = Model::new(catalog());
        let axis = model
            .insert_item("Axis", model.root(), &TagRow::append())
            .unwrap();

        let result =
            model.set_properties(axis, &[("min", Value::from(5.0)), ("bogus", Value::from(1))]);
        assert!(matches!(result, Err(ModelError::UnknownProperty { .. })));
        assert_eq!(model.property(axis, "min").unwrap(), Value::from(0.0));
    }

    #[test]
    fn test_clear() {
        let model = Model::new(catalog());
        let a = model
            .insert_item("Leaf", model.root(), &TagRow::append())
            .unwrap();
        let b = model
            .insert_item("Leaf", model.root(), &TagRow::append())
            .unwrap();

        model.clear();
        assert!(!model.contains(a));
        assert!(!model.contains(b));
        assert!(model.children(model.root(), "").unwrap().is_empty());
        assert!(model.contains(model.root()));
    }

    #[test]
    fn test_tag_cardinality_enforced_on_insert() {
        let catalog = ItemCatalog::new();
        catalog.register("Pair", || {
            Blueprint::new().with_tag(
                TagInfo::new("slots", 0, Some(2), vec!["Leaf".to_string()]),
                true,
            )
        });
        catalog.register("Leaf", Blueprint::new);
        catalog.register("Other", Blueprint::new);
        let model = Model::new(Arc::new(catalog));

        let pair = model
            .insert_item("Pair", model.root(), &TagRow::append())
            .unwrap();
        model.insert_item("Leaf", pair, &TagRow::append()).unwrap();
        model.insert_item("Leaf", pair, &TagRow::append()).unwrap();

        assert!(matches!(
            model.insert_item("Leaf", pair, &TagRow::append()),
            Err(ModelError::Cardinality { .. })
        ));
        assert!(matches!(
            model.insert_item("Other", model.root(), &TagRow::new("slots", 0)),
            Err(ModelError::UnknownTag { .. })
        ));
    }
}
