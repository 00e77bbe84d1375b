//! Bidirectional model/view plot controllers for Trellis.
//!
//! Controllers bind items of a [`trellis_model::Model`] to view
//! collaborators behind the [`AxisView`] and [`RegionView`] traits.
//! Changes flow both ways: model property edits are pushed into the
//! view, view interactions are written back into item properties, and a
//! per-controller [`SyncGuard`] makes sure each change propagates
//! exactly once per direction instead of ping-ponging.
//!
//! Coordinate handling is pluggable via [`SceneAdapter`]: controllers
//! store domain coordinates in the model and hand the view scene
//! coordinates.
//!
//! # Example
//!
//! ```ignore
//! let controller = AxesController::new(model, axis_item, view);
//! controller.subscribe()?;
//! // Property edits now reach the view; user edits reach the model.
//! ```

pub mod axes;
pub mod controller;
pub mod error;
pub mod geometry;
pub mod region;
pub mod scene;
pub mod view;

pub use axes::{AxesController, P_MAX, P_MIN};
pub use controller::{ControllerBinding, Direction, GuardToken, SyncGuard};
pub use error::{ControllerError, Result};
pub use geometry::Rect;
pub use region::{RegionOfInterestController, P_XLOW, P_XUP, P_YLOW, P_YUP};
pub use scene::{IdentityAdapter, LinearAdapter, SceneAdapter};
pub use view::{AxisView, RegionView};

#[cfg(test)]
mod assertions {
    use super::*;
    use static_assertions::assert_impl_all;

    assert_impl_all!(AxesController: Send, Sync);
    assert_impl_all!(RegionOfInterestController: Send, Sync);
    assert_impl_all!(SyncGuard: Send, Sync);
    assert_impl_all!(Rect: Send, Sync, Copy);
}
