//! Item-tree model core for Trellis.
//!
//! The crate provides the model half of a model/view architecture:
//! a tree of items with typed property values ([`Value`]), role-indexed
//! data ([`Role`], [`ItemData`]), and tagged child containers
//! ([`TagInfo`], [`ItemTags`]). A [`Model`] owns one tree, creates items
//! from [`ItemCatalog`] blueprints, and publishes every mutation through
//! its [`ModelMapper`]. Trees serialize to and from JSON documents via
//! the [`serialization`] module.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use trellis_model::{Blueprint, ItemCatalog, Model, TagRow, Value};
//!
//! let catalog = ItemCatalog::new();
//! catalog.register("ViewportAxis", || {
//!     Blueprint::new()
//!         .with_property("min", Value::from(0.0))
//!         .with_property("max", Value::from(1.0))
//! });
//!
//! let model = Model::new(Arc::new(catalog));
//! let axis = model
//!     .insert_item("ViewportAxis", model.root(), &TagRow::append())
//!     .unwrap();
//! model.set_property(axis, "max", Value::from(10.0)).unwrap();
//! assert_eq!(model.property(axis, "max").unwrap(), Value::from(10.0));
//! ```

pub mod catalog;
pub mod error;
pub mod logging;
pub mod mapper;
pub mod model;
pub mod role;
pub mod serialization;
pub mod signal;
pub mod tags;
pub mod value;

pub use catalog::{Blueprint, ItemCatalog, PROPERTY_TYPE};
pub use error::{ModelError, Result};
pub use mapper::{
    DataChanged, DuplicatePolicy, ItemInserted, ItemRemoved, ModelMapper, PropertyChanged,
    Subscriber,
};
pub use model::{ItemId, Model, ROOT_TAG, ROOT_TYPE};
pub use role::{ItemData, Role};
pub use serialization::ItemDocument;
pub use signal::{ConnectionId, Signal};
pub use tags::{ItemTags, TagInfo, TagRow};
pub use value::Value;

#[cfg(test)]
mod assertions {
    use super::*;
    use static_assertions::assert_impl_all;

    assert_impl_all!(Model: Send, Sync);
    assert_impl_all!(ModelMapper: Send, Sync);
    assert_impl_all!(ItemCatalog: Send, Sync);
    assert_impl_all!(Signal<()>: Send, Sync);
    assert_impl_all!(Value: Send, Sync, Clone);
    assert_impl_all!(ItemId: Send, Sync, Copy);
}
