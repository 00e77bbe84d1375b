//! JSON tree serialization.
//!
//! An item subtree converts to an [`ItemDocument`]: a plain data
//! structure mirroring the tree with `modelType`, `itemData`, and
//! `itemTags` keys. Documents are self-describing; restoring one
//! recreates the exact tag layout it records rather than consulting
//! catalog blueprints.
//!
//! Restoration is validate-then-apply: the whole document is checked
//! against the target model's catalog and the role table before the
//! first arena write, so a bad document leaves the model untouched.
//! Population happens directly in the arena and emits no per-item
//! notifications; [`from_document`] announces the finished subtree with
//! a single `ItemInserted`.

use std::path::Path;

use serde::{Deserialize, Serialize};
use slotmap::SlotMap;

use crate::catalog::{ItemCatalog, PROPERTY_TYPE};
use crate::error::{ModelError, Result};
use crate::logging::targets;
use crate::mapper::ItemInserted;
use crate::model::{ItemId, ItemNode, Model, ROOT_TYPE};
use crate::role::{ItemData, Role};
use crate::tags::{ItemTags, TagInfo, TagRow};
use crate::value::Value;

/// One role/value pair of an item's data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataEntry {
    /// Numeric role, as defined by [`Role::value`].
    pub role: u32,
    /// The stored value.
    pub value: Value,
}

/// Serialized form of one tag container.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagDocument {
    /// Tag name.
    pub name: String,
    /// Minimum number of children.
    #[serde(default)]
    pub min: usize,
    /// Maximum number of children, if bounded.
    #[serde(default)]
    pub max: Option<usize>,
    /// Accepted model types; empty means unrestricted.
    #[serde(default)]
    pub model_types: Vec<String>,
    /// The children, in order.
    #[serde(default)]
    pub items: Vec<ItemDocument>,
}

/// Serialized form of an item's tag containers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagsDocument {
    /// Name of the default tag; empty if none is registered.
    #[serde(default)]
    pub default_tag: String,
    /// Registered tags in registration order.
    #[serde(default)]
    pub containers: Vec<TagDocument>,
}

/// Serialized form of an item subtree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemDocument {
    /// The item's model type.
    pub model_type: String,
    /// Role data in storage order.
    #[serde(default)]
    pub item_data: Vec<DataEntry>,
    /// Tag containers holding the children.
    #[serde(default)]
    pub item_tags: TagsDocument,
}

/// Converts the subtree rooted at `item` into a document.
pub fn to_document(model: &Model, item: ItemId) -> Result<ItemDocument> {
    let items = model.items.read();
    node_document(&items, item)
}

fn node_document(items: &SlotMap<ItemId, ItemNode>, id: ItemId) -> Result<ItemDocument> {
    let node = items.get(id).ok_or(ModelError::InvalidItem)?;

    let item_data = node
        .data
        .iter()
        .map(|(role, value)| DataEntry {
            role,
            value: value.clone(),
        })
        .collect();

    let containers = node
        .tags
        .containers()
        .iter()
        .map(|container| {
            Ok(TagDocument {
                name: container.info.name().to_string(),
                min: container.info.min(),
                max: container.info.max(),
                model_types: container.info.model_types().to_vec(),
                items: container
                    .items
                    .iter()
                    .map(|&child| node_document(items, child))
                    .collect::<Result<Vec<_>>>()?,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(ItemDocument {
        model_type: node.model_type.clone(),
        item_data,
        item_tags: TagsDocument {
            default_tag: node.tags.default_tag().to_string(),
            containers,
        },
    })
}

/// Checks a document against the catalog and the role table without
/// touching any model.
pub fn validate_document(catalog: &ItemCatalog, doc: &ItemDocument) -> Result<()> {
    if doc.model_type.is_empty() {
        return Err(ModelError::format("document item has an empty model type"));
    }
    // Property and root items are structural, not catalog entries.
    if doc.model_type != PROPERTY_TYPE
        && doc.model_type != ROOT_TYPE
        && !catalog.contains(&doc.model_type)
    {
        return Err(ModelError::UnknownType {
            model_type: doc.model_type.clone(),
        });
    }
    for entry in &doc.item_data {
        Role::from_value(entry.role).ok_or(ModelError::UnknownRole { role: entry.role })?;
    }
    for tag in &doc.item_tags.containers {
        if tag.name.is_empty() {
            return Err(ModelError::format(format!(
                "item '{}' declares a tag with an empty name",
                doc.model_type
            )));
        }
        if let Some(max) = tag.max {
            if tag.items.len() > max {
                return Err(ModelError::cardinality(
                    &tag.name,
                    format!("document holds {} items, maximum is {max}", tag.items.len()),
                ));
            }
        }
        if tag.items.len() < tag.min {
            return Err(ModelError::cardinality(
                &tag.name,
                format!("document holds {} items, minimum is {}", tag.items.len(), tag.min),
            ));
        }
        for child in &tag.items {
            if !tag.model_types.is_empty()
                && !tag.model_types.iter().any(|t| t == &child.model_type)
            {
                return Err(ModelError::cardinality(
                    &tag.name,
                    format!("does not accept model type '{}'", child.model_type),
                ));
            }
            validate_document(catalog, child)?;
        }
    }
    Ok(())
}

/// Materializes a validated document into the arena. The returned item
/// is not yet attached to any parent container.
fn build_subtree(
    items: &mut SlotMap<ItemId, ItemNode>,
    doc: &ItemDocument,
    parent: Option<ItemId>,
) -> Result<ItemId> {
    let (data, tags) = node_parts(doc)?;
    let id = items.insert(ItemNode {
        model_type: doc.model_type.clone(),
        data,
        tags,
        parent,
    });
    attach_children(items, id, doc)?;
    Ok(id)
}

fn node_parts(doc: &ItemDocument) -> Result<(ItemData, ItemTags)> {
    let mut data = ItemData::new();
    for entry in &doc.item_data {
        let role = Role::from_value(entry.role).ok_or(ModelError::UnknownRole { role: entry.role })?;
        data.set(role, entry.value.clone());
    }
    let mut tags = ItemTags::new();
    for tag in &doc.item_tags.containers {
        let set_default = tag.name == doc.item_tags.default_tag;
        tags.register(
            TagInfo::new(&tag.name, tag.min, tag.max, tag.model_types.clone()),
            set_default,
        );
    }
    Ok((data, tags))
}

fn attach_children(
    items: &mut SlotMap<ItemId, ItemNode>,
    id: ItemId,
    doc: &ItemDocument,
) -> Result<()> {
    for tag in &doc.item_tags.containers {
        for (row, child_doc) in tag.items.iter().enumerate() {
            let child = build_subtree(items, child_doc, Some(id))?;
            items
                .get_mut(id)
                .ok_or(ModelError::InvalidItem)?
                .tags
                .insert(&tag.name, row, child)?;
        }
    }
    Ok(())
}

/// Restores a document as a new child of `parent`.
///
/// Validates first; on failure the model is untouched. Emits one
/// `ItemInserted` for the restored top item, nothing for its interior.
pub fn from_document(
    model: &Model,
    parent: ItemId,
    tagrow: &TagRow,
    doc: &ItemDocument,
) -> Result<ItemId> {
    validate_document(model.catalog(), doc)?;

    let (id, tag, row) = {
        let mut items = model.items.write();
        let parent_node = items.get(parent).ok_or(ModelError::InvalidItem)?;
        let tag = parent_node.tags.resolve(tagrow.tag.as_deref());
        let row = parent_node
            .tags
            .can_insert(&tag, tagrow.row, &doc.model_type)?;

        let id = build_subtree(&mut items, doc, Some(parent))?;
        items
            .get_mut(parent)
            .ok_or(ModelError::InvalidItem)?
            .tags
            .insert(&tag, row, id)?;
        (id, tag, row)
    };

    tracing::debug!(target: targets::SERIALIZATION, model_type = %doc.model_type, %tag, row, "document restored");
    model
        .mapper()
        .notify_item_inserted(ItemInserted { parent, tag, row });
    Ok(id)
}

/// Replaces an item's data, tags, and children with a document's
/// content.
///
/// The item's model type must match the document's; on any failure the
/// item is left unmodified. Population is silent; callers rebuild their
/// views afterwards.
pub fn populate_item(model: &Model, item: ItemId, doc: &ItemDocument) -> Result<()> {
    validate_document(model.catalog(), doc)?;

    let mut items = model.items.write();
    let node = items.get(item).ok_or(ModelError::InvalidItem)?;
    if node.model_type != doc.model_type {
        return Err(ModelError::type_mismatch(&node.model_type, &doc.model_type));
    }

    let mut doomed = Vec::new();
    Model::collect_descendants(&items, item, &mut doomed);
    for id in doomed {
        items.remove(id);
    }

    let (data, tags) = node_parts(doc)?;
    let node = items.get_mut(item).ok_or(ModelError::InvalidItem)?;
    node.data = data;
    node.tags = tags;
    attach_children(&mut items, item, doc)?;

    tracing::debug!(target: targets::SERIALIZATION, model_type = %doc.model_type, "item populated from document");
    Ok(())
}

/// Parses a document from a JSON string.
pub fn from_json_str(json: &str) -> Result<ItemDocument> {
    serde_json::from_str(json).map_err(|e| ModelError::format(format!("invalid document: {e}")))
}

/// Serializes the subtree rooted at `item` to a JSON string.
pub fn to_json_string(model: &Model, item: ItemId) -> Result<String> {
    Ok(serde_json::to_string(&to_document(model, item)?)?)
}

/// Serializes the subtree rooted at `item` to pretty-printed JSON.
pub fn to_json_string_pretty(model: &Model, item: ItemId) -> Result<String> {
    Ok(serde_json::to_string_pretty(&to_document(model, item)?)?)
}

/// Writes the whole model, root included, to a JSON file.
pub fn save_document(model: &Model, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let json = to_json_string_pretty(model, model.root())?;
    std::fs::write(path, json)?;
    tracing::info!(target: targets::SERIALIZATION, path = %path.display(), "document saved");
    Ok(())
}

/// Loads a JSON file into the model, replacing all current content.
pub fn load_document(model: &Model, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let json = std::fs::read_to_string(path)?;
    let doc = from_json_str(&json)?;
    populate_item(model, model.root(), &doc)?;
    tracing::info!(target: targets::SERIALIZATION, path = %path.display(), "document loaded");
    Ok(())
}
