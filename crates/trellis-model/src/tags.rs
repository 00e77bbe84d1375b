//! Tagged child containers.
//!
//! Children of an item are grouped into named tags: ordered sequences
//! with cardinality constraints and optional model-type restrictions.
//! A property of an item is a single-slot tag holding one property item.

use crate::error::{ModelError, Result};
use crate::model::ItemId;

/// Describes a single tag: its name, cardinality, and which model types
/// it accepts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagInfo {
    name: String,
    min: usize,
    max: Option<usize>,
    model_types: Vec<String>,
}

impl TagInfo {
    /// A tag accepting any number of children of any model type.
    pub fn universal(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            min: 0,
            max: None,
            model_types: Vec::new(),
        }
    }

    /// A single-slot tag holding exactly one child of the given model type.
    ///
    /// Used for named properties: the child can be replaced but never
    /// removed.
    pub fn property(name: impl Into<String>, model_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            min: 1,
            max: Some(1),
            model_types: vec![model_type.into()],
        }
    }

    /// A tag with explicit cardinality and model-type restrictions.
    pub fn new(
        name: impl Into<String>,
        min: usize,
        max: Option<usize>,
        model_types: Vec<String>,
    ) -> Self {
        Self {
            name: name.into(),
            min,
            max,
            model_types,
        }
    }

    /// The tag name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Minimum number of children.
    pub fn min(&self) -> usize {
        self.min
    }

    /// Maximum number of children, if bounded.
    pub fn max(&self) -> Option<usize> {
        self.max
    }

    /// Accepted model types; empty means any type is accepted.
    pub fn model_types(&self) -> &[String] {
        &self.model_types
    }

    /// Returns `true` if a child of `model_type` may live under this tag.
    pub fn accepts(&self, model_type: &str) -> bool {
        self.model_types.is_empty() || self.model_types.iter().any(|t| t == model_type)
    }
}

/// Addresses an insertion or lookup position inside an item's tags.
///
/// `tag: None` targets the item's default tag; `row: None` means append.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagRow {
    /// Target tag; `None` for the default tag.
    pub tag: Option<String>,
    /// Target row; `None` to append.
    pub row: Option<usize>,
}

impl TagRow {
    /// Append to the default tag.
    pub fn append() -> Self {
        Self::default()
    }

    /// Insert at `row` in the default tag.
    pub fn at(row: usize) -> Self {
        Self {
            tag: None,
            row: Some(row),
        }
    }

    /// Append to the named tag.
    pub fn tag_append(tag: impl Into<String>) -> Self {
        Self {
            tag: Some(tag.into()),
            row: None,
        }
    }

    /// Insert at `row` in the named tag.
    pub fn new(tag: impl Into<String>, row: usize) -> Self {
        Self {
            tag: Some(tag.into()),
            row: Some(row),
        }
    }
}

/// One registered tag and its ordered children.
#[derive(Debug, Clone)]
pub(crate) struct TagContainer {
    pub(crate) info: TagInfo,
    pub(crate) items: Vec<ItemId>,
}

/// The ordered, tagged child containers of a single item.
#[derive(Debug, Clone, Default)]
pub struct ItemTags {
    containers: Vec<TagContainer>,
    default_tag: String,
}

impl ItemTags {
    /// Creates an item with no registered tags.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a tag. The first registered tag becomes the default
    /// unless `set_default` is given later.
    pub fn register(&mut self, info: TagInfo, set_default: bool) {
        if set_default || self.containers.is_empty() {
            self.default_tag = info.name().to_string();
        }
        self.containers.push(TagContainer {
            info,
            items: Vec::new(),
        });
    }

    /// The name of the default tag; empty if no tag is registered.
    pub fn default_tag(&self) -> &str {
        &self.default_tag
    }

    /// Returns `true` if a tag with this name is registered.
    pub fn contains_tag(&self, name: &str) -> bool {
        self.containers.iter().any(|c| c.info.name() == name)
    }

    /// Registered tag names in registration order.
    pub fn tag_names(&self) -> Vec<String> {
        self.containers
            .iter()
            .map(|c| c.info.name().to_string())
            .collect()
    }

    /// Resolves a possibly-empty tag name to a concrete one.
    pub fn resolve(&self, tag: Option<&str>) -> String {
        match tag {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => self.default_tag.clone(),
        }
    }

    fn container(&self, tag: &str) -> Result<&TagContainer> {
        self.containers
            .iter()
            .find(|c| c.info.name() == tag)
            .ok_or_else(|| ModelError::UnknownTag {
                tag: tag.to_string(),
            })
    }

    fn container_mut(&mut self, tag: &str) -> Result<&mut TagContainer> {
        self.containers
            .iter_mut()
            .find(|c| c.info.name() == tag)
            .ok_or_else(|| ModelError::UnknownTag {
                tag: tag.to_string(),
            })
    }

    /// The tag descriptor for `tag`.
    pub fn tag_info(&self, tag: &str) -> Result<&TagInfo> {
        self.container(tag).map(|c| &c.info)
    }

    /// Checks whether a child of `model_type` may be inserted at `row`.
    pub fn can_insert(&self, tag: &str, row: Option<usize>, model_type: &str) -> Result<usize> {
        let container = self.container(tag)?;
        let count = container.items.len();
        let row = row.unwrap_or(count);
        if row > count {
            return Err(ModelError::InvalidRow {
                tag: tag.to_string(),
                row,
            });
        }
        if let Some(max) = container.info.max() {
            if count >= max {
                return Err(ModelError::cardinality(
                    tag,
                    format!("already holds the maximum of {max} items"),
                ));
            }
        }
        if !container.info.accepts(model_type) {
            return Err(ModelError::cardinality(
                tag,
                format!("does not accept model type '{model_type}'"),
            ));
        }
        Ok(row)
    }

    /// Inserts a child at `row`. The position must have been validated
    /// with [`can_insert`](Self::can_insert).
    pub(crate) fn insert(&mut self, tag: &str, row: usize, id: ItemId) -> Result<()> {
        let container = self.container_mut(tag)?;
        container.items.insert(row, id);
        Ok(())
    }

    /// Checks whether the child at `row` may be removed.
    pub fn can_remove(&self, tag: &str, row: usize) -> Result<()> {
        let container = self.container(tag)?;
        if row >= container.items.len() {
            return Err(ModelError::InvalidRow {
                tag: tag.to_string(),
                row,
            });
        }
        if container.items.len() <= container.info.min() {
            return Err(ModelError::cardinality(
                tag,
                format!("holds the minimum of {} items", container.info.min()),
            ));
        }
        Ok(())
    }

    /// Removes and returns the child at `row`.
    pub(crate) fn remove(&mut self, tag: &str, row: usize) -> Result<ItemId> {
        self.can_remove(tag, row)?;
        let container = self.container_mut(tag)?;
        Ok(container.items.remove(row))
    }

    /// The child at `(tag, row)`, if present.
    pub fn item_at(&self, tag: &str, row: usize) -> Result<ItemId> {
        let container = self.container(tag)?;
        container
            .items
            .get(row)
            .copied()
            .ok_or(ModelError::InvalidRow {
                tag: tag.to_string(),
                row,
            })
    }

    /// The children under `tag` in order.
    pub fn children(&self, tag: &str) -> Result<&[ItemId]> {
        self.container(tag).map(|c| c.items.as_slice())
    }

    /// Locates a child, returning its `(tag, row)`.
    pub fn position_of(&self, id: ItemId) -> Option<(String, usize)> {
        for container in &self.containers {
            if let Some(row) = container.items.iter().position(|&item| item == id) {
                return Some((container.info.name().to_string(), row));
            }
        }
        None
    }

    /// Iterates over all children of all tags in registration order.
    pub fn all_children(&self) -> impl Iterator<Item = ItemId> + '_ {
        self.containers.iter().flat_map(|c| c.items.iter().copied())
    }

    pub(crate) fn containers(&self) -> &[TagContainer] {
        &self.containers
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::SlotMap;

    fn ids(count: usize) -> Vec<ItemId> {
        let mut map: SlotMap<ItemId, ()> = SlotMap::with_key();
        (0..count).map(|_| map.insert(())).collect()
    }

    #[test]
    fn test_universal_tag_insert_remove() {
        let mut tags = ItemTags::new();
        tags.register(TagInfo::universal("items"), false);
        assert_eq!(tags.default_tag(), "items");

        let children = ids(2);
        let row = tags.can_insert("items", None, "Anything").unwrap();
        tags.insert("items", row, children[0]).unwrap();
        let row = tags.can_insert("items", Some(0), "Other").unwrap();
        tags.insert("items", row, children[1]).unwrap();

        assert_eq!(tags.children("items").unwrap(), &[children[1], children[0]]);
        assert_eq!(tags.remove("items", 0).unwrap(), children[1]);
        assert_eq!(tags.children("items").unwrap(), &[children[0]]);
    }

    #[test]
    fn test_property_tag_cardinality() {
        let mut tags = ItemTags::new();
        tags.register(TagInfo::property("width", "Property"), false);

        let children = ids(2);
        let row = tags.can_insert("width", None, "Property").unwrap();
        tags.insert("width", row, children[0]).unwrap();

        // Full: a second insert is rejected.
        assert!(matches!(
            tags.can_insert("width", None, "Property"),
            Err(ModelError::Cardinality { .. })
        ));
        // At minimum: removal is rejected.
        assert!(matches!(
            tags.can_remove("width", 0),
            Err(ModelError::Cardinality { .. })
        ));
    }

    #[test]
    fn test_model_type_restriction() {
        let mut tags = ItemTags::new();
        tags.register(
            TagInfo::new("axes", 0, None, vec!["Axis".to_string()]),
            false,
        );
        assert!(tags.can_insert("axes", None, "Axis").is_ok());
        assert!(matches!(
            tags.can_insert("axes", None, "Graph"),
            Err(ModelError::Cardinality { .. })
        ));
    }

    #[test]
    fn test_unknown_tag() {
        let tags = ItemTags::new();
        assert!(matches!(
            tags.children("missing"),
            Err(ModelError::UnknownTag { .. })
        ));
    }

    #[test]
    fn test_position_of() {
        let mut tags = ItemTags::new();
        tags.register(TagInfo::universal("a"), false);
        tags.register(TagInfo::universal("b"), false);

        let children = ids(2);
        tags.insert("a", 0, children[0]).unwrap();
        tags.insert("b", 0, children[1]).unwrap();

        assert_eq!(tags.position_of(children[1]), Some(("b".to_string(), 0)));
        assert_eq!(tags.position_of(children[0]), Some(("a".to_string(), 0)));
    }

    #[test]
    fn test_resolve_default() {
        let mut tags = ItemTags::new();
        tags.register(TagInfo::universal("items"), false);
        assert_eq!(tags.resolve(None), "items");
        assert_eq!(tags.resolve(Some("")), "items");
        assert_eq!(tags.resolve(Some("other")), "other");
    }
}
