//! Axis range controller.
//!
//! Binds an item exposing `min`/`max` properties to an [`AxisView`].
//! Model-side property edits are pushed into the view as one atomic
//! `set_range` call; view-side range changes are written back as one
//! property batch. The binding's guard stops either direction from
//! echoing.

use std::sync::Arc;

use trellis_model::{ItemId, Model, Value};

use crate::controller::{ControllerBinding, Direction, SyncGuard, TARGET};
use crate::error::Result;
use crate::view::AxisView;

/// Lower-edge property name.
pub const P_MIN: &str = "min";
/// Upper-edge property name.
pub const P_MAX: &str = "max";

/// Keeps an axis item and an [`AxisView`] in sync, both ways.
pub struct AxesController {
    binding: Arc<ControllerBinding>,
    view: Arc<dyn AxisView>,
}

impl AxesController {
    /// Creates an unsubscribed controller for `item`.
    pub fn new(model: Arc<Model>, item: ItemId, view: Arc<dyn AxisView>) -> Self {
        Self {
            binding: Arc::new(ControllerBinding::new(model, item)),
            view,
        }
    }

    /// Starts the binding.
    ///
    /// Checks that the item exposes both range properties, pushes the
    /// current range into the view, then listens in both directions.
    /// Fails with `AlreadySubscribed` when called twice without a
    /// teardown in between.
    pub fn subscribe(&self) -> Result<()> {
        self.binding.require_property(P_MIN)?;
        self.binding.require_property(P_MAX)?;
        self.binding.mark_subscribed()?;

        push_range(&self.binding, self.view.as_ref())?;

        let item = self.binding.item();

        // Model -> view.
        let weak = Arc::downgrade(&self.binding);
        let view = self.view.clone();
        self.binding.model().mapper().on_property_changed(
            move |event| {
                if event.item != item || (event.property != P_MIN && event.property != P_MAX) {
                    return;
                }
                let Some(binding) = weak.upgrade() else {
                    return;
                };
                if binding.guard().is_propagating(Direction::ViewToModel) {
                    return;
                }
                if let Err(error) = push_range(&binding, view.as_ref()) {
                    tracing::warn!(target: TARGET, %error, "axis push failed");
                }
            },
            self.binding.subscriber(),
        );

        // View -> model.
        let weak = Arc::downgrade(&self.binding);
        let connection = self.view.range_changed().connect(move |&(lower, upper)| {
            let Some(binding) = weak.upgrade() else {
                return;
            };
            if binding.guard().is_propagating(Direction::ModelToView) {
                return;
            }
            let Some(_token) = SyncGuard::begin(binding.guard(), Direction::ViewToModel) else {
                return;
            };
            let result = binding.model().set_properties(
                item,
                &[(P_MIN, Value::from(lower)), (P_MAX, Value::from(upper))],
            );
            if let Err(error) = result {
                tracing::warn!(target: TARGET, %error, "axis write-back failed");
            }
        });

        let view = self.view.clone();
        self.binding.register_cleanup(move || {
            view.range_changed().disconnect(connection);
        });

        tracing::debug!(target: TARGET, ?item, "axes controller subscribed");
        Ok(())
    }

    /// Re-pushes the current model range into the view.
    pub fn update_view(&self) -> Result<()> {
        push_range(&self.binding, self.view.as_ref())
    }

    /// The bound item.
    pub fn item(&self) -> ItemId {
        self.binding.item()
    }

    /// Detaches from model and view. Idempotent; also runs on drop.
    pub fn teardown(&self) {
        self.binding.teardown();
    }
}

/// Pushes both range edges into the view as one call, under the
/// model-to-view guard. Skips silently when a propagation is already in
/// flight.
fn push_range(binding: &Arc<ControllerBinding>, view: &dyn AxisView) -> Result<()> {
    let Some(_token) = SyncGuard::begin(binding.guard(), Direction::ModelToView) else {
        return Ok(());
    };
    let lower = binding.read_f64(P_MIN)?;
    let upper = binding.read_f64(P_MAX)?;
    view.set_range(lower, upper);
    Ok(())
}
