//! View collaborator traits.
//!
//! Controllers never talk to a concrete widget; they hold one of these
//! trait objects. A view implementation exposes its current state, a
//! setter the controller pushes into, and a [`Signal`] it emits when the
//! user changes the view directly.

use trellis_model::Signal;

use crate::geometry::Rect;

/// View side of an axis binding.
pub trait AxisView: Send + Sync {
    /// The currently displayed `(lower, upper)` range.
    fn range(&self) -> (f64, f64);

    /// Displays a new range. Both edges are applied as one atomic pair.
    fn set_range(&self, lower: f64, upper: f64);

    /// Emitted when the displayed range changes, carrying the new
    /// `(lower, upper)` pair.
    fn range_changed(&self) -> &Signal<(f64, f64)>;
}

/// View side of a region-of-interest binding.
pub trait RegionView: Send + Sync {
    /// The currently displayed scene rectangle.
    fn rect(&self) -> Rect;

    /// Displays a new scene rectangle.
    fn set_rect(&self, rect: Rect);

    /// Emitted when the region is moved or resized, carrying the new
    /// scene rectangle.
    fn moved(&self) -> &Signal<Rect>;
}
