//! Item catalog: the factory mapping model-type strings to blueprints.
//!
//! The catalog is the single place where item types are registered. The
//! model consults it when inserting items; the serializer consults it
//! when restoring documents. Neither owns registration.

use std::collections::HashMap;

use parking_lot::RwLock;

use crate::error::{ModelError, Result};
use crate::role::Role;
use crate::tags::TagInfo;
use crate::value::Value;

/// Model type of the items backing named properties.
pub const PROPERTY_TYPE: &str = "Property";

/// Declares the initial shape of an item: role data, named properties,
/// and child tags.
#[derive(Debug, Clone, Default)]
pub struct Blueprint {
    pub(crate) data: Vec<(Role, Value)>,
    pub(crate) properties: Vec<(String, Value)>,
    pub(crate) tags: Vec<(TagInfo, bool)>,
}

impl Blueprint {
    /// An empty blueprint: no data, no properties, no tags.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an initial role value.
    pub fn with_data(mut self, role: Role, value: Value) -> Self {
        self.data.push((role, value));
        self
    }

    /// Adds a named property with its default value.
    ///
    /// Properties materialize as single-slot child items of type
    /// [`PROPERTY_TYPE`] under a tag of the same name.
    pub fn with_property(mut self, name: impl Into<String>, default: Value) -> Self {
        self.properties.push((name.into(), default));
        self
    }

    /// Registers a universal child tag.
    pub fn with_universal_tag(mut self, name: impl Into<String>, set_default: bool) -> Self {
        self.tags.push((TagInfo::universal(name), set_default));
        self
    }

    /// Registers a child tag with explicit constraints.
    pub fn with_tag(mut self, info: TagInfo, set_default: bool) -> Self {
        self.tags.push((info, set_default));
        self
    }
}

type Builder = Box<dyn Fn() -> Blueprint + Send + Sync>;

/// Registry of item types known to a model.
///
/// # Example
///
/// ```
/// use trellis_model::{Blueprint, ItemCatalog, Value};
///
/// let catalog = ItemCatalog::new();
/// catalog.register("ViewportAxis", || {
///     Blueprint::new()
///         .with_property("min", Value::from(0.0))
///         .with_property("max", Value::from(1.0))
/// });
/// assert!(catalog.contains("ViewportAxis"));
/// ```
pub struct ItemCatalog {
    builders: RwLock<HashMap<String, Builder>>,
}

impl Default for ItemCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl ItemCatalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self {
            builders: RwLock::new(HashMap::new()),
        }
    }

    /// Registers a model type. A later registration under the same name
    /// replaces the earlier one.
    pub fn register<F>(&self, model_type: impl Into<String>, builder: F)
    where
        F: Fn() -> Blueprint + Send + Sync + 'static,
    {
        self.builders
            .write()
            .insert(model_type.into(), Box::new(builder));
    }

    /// Returns `true` if the model type is registered.
    pub fn contains(&self, model_type: &str) -> bool {
        self.builders.read().contains_key(model_type)
    }

    /// Builds the blueprint for a model type.
    pub fn create(&self, model_type: &str) -> Result<Blueprint> {
        let builders = self.builders.read();
        let builder = builders
            .get(model_type)
            .ok_or_else(|| ModelError::UnknownType {
                model_type: model_type.to_string(),
            })?;
        Ok(builder())
    }

    /// Registered model types, unordered.
    pub fn model_types(&self) -> Vec<String> {
        self.builders.read().keys().cloned().collect()
    }
}
