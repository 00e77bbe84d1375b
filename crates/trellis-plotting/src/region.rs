//! Region-of-interest controller.
//!
//! Binds an item exposing `xlow`/`xup`/`ylow`/`yup` properties to a
//! [`RegionView`] through a [`SceneAdapter`]. Domain y grows upward,
//! scene y grows downward, so the domain's upper y edge maps to the
//! scene rectangle's top.

use std::sync::Arc;

use trellis_model::{ItemId, Model, Value};

use crate::controller::{ControllerBinding, Direction, SyncGuard, TARGET};
use crate::error::Result;
use crate::geometry::Rect;
use crate::scene::SceneAdapter;
use crate::view::RegionView;

/// Lower x edge property name.
pub const P_XLOW: &str = "xlow";
/// Upper x edge property name.
pub const P_XUP: &str = "xup";
/// Lower y edge property name.
pub const P_YLOW: &str = "ylow";
/// Upper y edge property name.
pub const P_YUP: &str = "yup";

const EDGE_PROPERTIES: [&str; 4] = [P_XLOW, P_XUP, P_YLOW, P_YUP];

/// Keeps a region item and a [`RegionView`] in sync through a
/// coordinate transform.
pub struct RegionOfInterestController {
    binding: Arc<ControllerBinding>,
    view: Arc<dyn RegionView>,
    adapter: Arc<dyn SceneAdapter>,
}

impl RegionOfInterestController {
    /// Creates an unsubscribed controller for `item`.
    pub fn new(
        model: Arc<Model>,
        item: ItemId,
        view: Arc<dyn RegionView>,
        adapter: Arc<dyn SceneAdapter>,
    ) -> Self {
        Self {
            binding: Arc::new(ControllerBinding::new(model, item)),
            view,
            adapter,
        }
    }

    /// Starts the binding.
    ///
    /// Checks all four edge properties at subscription time, pushes the
    /// current geometry into the view, then listens in both directions.
    pub fn subscribe(&self) -> Result<()> {
        for name in EDGE_PROPERTIES {
            self.binding.require_property(name)?;
        }
        self.binding.mark_subscribed()?;

        push_rect(&self.binding, self.view.as_ref(), self.adapter.as_ref())?;

        let item = self.binding.item();

        // Model -> view.
        let weak = Arc::downgrade(&self.binding);
        let view = self.view.clone();
        let adapter = self.adapter.clone();
        self.binding.model().mapper().on_property_changed(
            move |event| {
                if event.item != item || !EDGE_PROPERTIES.contains(&event.property.as_str()) {
                    return;
                }
                let Some(binding) = weak.upgrade() else {
                    return;
                };
                if binding.guard().is_propagating(Direction::ViewToModel) {
                    return;
                }
                if let Err(error) = push_rect(&binding, view.as_ref(), adapter.as_ref()) {
                    tracing::warn!(target: TARGET, %error, "region push failed");
                }
            },
            self.binding.subscriber(),
        );

        // View -> model.
        let weak = Arc::downgrade(&self.binding);
        let adapter = self.adapter.clone();
        let connection = self.view.moved().connect(move |rect| {
            let Some(binding) = weak.upgrade() else {
                return;
            };
            if binding.guard().is_propagating(Direction::ModelToView) {
                return;
            }
            let Some(_token) = SyncGuard::begin(binding.guard(), Direction::ViewToModel) else {
                return;
            };
            // The adapter may flip either axis; sort the inverse-mapped
            // edges back into low/up order.
            let x0 = adapter.from_scene_x(rect.left());
            let x1 = adapter.from_scene_x(rect.right());
            let y0 = adapter.from_scene_y(rect.top());
            let y1 = adapter.from_scene_y(rect.bottom());
            let (xlow, xup) = (x0.min(x1), x0.max(x1));
            let (ylow, yup) = (y0.min(y1), y0.max(y1));
            let result = binding.model().set_properties(
                item,
                &[
                    (P_XLOW, Value::from(xlow)),
                    (P_XUP, Value::from(xup)),
                    (P_YLOW, Value::from(ylow)),
                    (P_YUP, Value::from(yup)),
                ],
            );
            if let Err(error) = result {
                tracing::warn!(target: TARGET, %error, "region write-back failed");
            }
        });

        let view = self.view.clone();
        self.binding.register_cleanup(move || {
            view.moved().disconnect(connection);
        });

        tracing::debug!(target: TARGET, ?item, "region controller subscribed");
        Ok(())
    }

    /// Recomputes the scene rectangle from the four edge properties and
    /// pushes it into the view.
    pub fn update_geometry(&self) -> Result<()> {
        push_rect(&self.binding, self.view.as_ref(), self.adapter.as_ref())
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

/// Maps the four domain edges through the adapter and pushes the
/// resulting scene rectangle as one call.
fn push_rect(
    binding: &Arc<ControllerBinding>,
    view: &dyn RegionView,
    adapter: &dyn SceneAdapter,
) -> Result<()> {
    let Some(_token) = SyncGuard::begin(binding.guard(), Direction::ModelToView) else {
        return Ok(());
    };
    let xlow = binding.read_f64(P_XLOW)?;
    let xup = binding.read_f64(P_XUP)?;
    let ylow = binding.read_f64(P_YLOW)?;
    let yup = binding.read_f64(P_YUP)?;

    let left = adapter.to_scene_x(xlow);
    let right = adapter.to_scene_x(xup);
    let top = adapter.to_scene_y(yup);
    let bottom = adapter.to_scene_y(ylow);
    view.set_rect(Rect::from_corners(left, top, right, bottom));
    Ok(())
}
