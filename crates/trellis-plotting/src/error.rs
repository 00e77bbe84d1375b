//! Controller error types.

use thiserror::Error;
use trellis_model::ModelError;

/// Errors surfaced by plot controllers.
///
/// Capability problems are reported at `subscribe()` time, not when the
/// first change flows through.
#[derive(Debug, Error)]
pub enum ControllerError {
    /// The controlled item does not expose a property the controller
    /// needs.
    #[error("item has no property '{name}'")]
    MissingProperty {
        /// The missing property name.
        name: String,
    },

    /// The controlled item is no longer part of the model.
    #[error("controlled item was removed from the model")]
    ItemRemoved,

    /// `subscribe()` was called while already subscribed.
    #[error("controller is already subscribed")]
    AlreadySubscribed,

    /// A model operation failed for a reason the controller cannot
    /// interpret further.
    #[error(transparent)]
    Model(#[from] ModelError),
}

/// A specialized result type for controller operations.
pub type Result<T> = std::result::Result<T, ControllerError>;
