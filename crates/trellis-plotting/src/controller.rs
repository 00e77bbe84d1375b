//! Shared controller plumbing.
//!
//! Every controller owns a [`ControllerBinding`]: the model handle, the
//! bound item, the controller's mapper identity, and the re-entrancy
//! guard. The binding's `teardown()` is idempotent and also runs on
//! drop, so a controller going out of scope always detaches cleanly.
//!
//! Re-entrancy is handled by [`SyncGuard`], a two-state machine. A
//! propagation in one direction acquires the guard for that direction;
//! the echo arriving at the opposite listener sees the guard held and
//! backs off. Exactly one propagation happens per direction.

use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use trellis_model::{ItemId, Model, ModelError, Subscriber, Value};

use crate::error::{ControllerError, Result};

pub(crate) const TARGET: &str = "trellis_plotting::controller";

/// Which way a change is currently flowing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Model change being pushed into the view.
    ModelToView,
    /// View change being written back into the model.
    ViewToModel,
}

const IDLE: u8 = 0;
const MODEL_TO_VIEW: u8 = 1;
const VIEW_TO_MODEL: u8 = 2;

impl Direction {
    fn state(self) -> u8 {
        match self {
            Direction::ModelToView => MODEL_TO_VIEW,
            Direction::ViewToModel => VIEW_TO_MODEL,
        }
    }
}

/// Two-state re-entrancy guard: idle, or propagating in one direction.
pub struct SyncGuard {
    state: AtomicU8,
}

impl Default for SyncGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl SyncGuard {
    /// Creates an idle guard.
    pub fn new() -> Self {
        Self {
            state: AtomicU8::new(IDLE),
        }
    }

    /// Tries to enter a propagation. Returns `None` if a propagation in
    /// either direction is already in flight.
    ///
    /// The returned token releases the guard when dropped.
    pub fn begin(guard: &Arc<Self>, direction: Direction) -> Option<GuardToken> {
        guard
            .state
            .compare_exchange(IDLE, direction.state(), Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| GuardToken {
                guard: guard.clone(),
            })
    }

    /// Returns `true` if a propagation in `direction` is in flight.
    pub fn is_propagating(&self, direction: Direction) -> bool {
        self.state.load(Ordering::SeqCst) == direction.state()
    }

    /// Returns `true` if no propagation is in flight.
    pub fn is_idle(&self) -> bool {
        self.state.load(Ordering::SeqCst) == IDLE
    }
}

/// RAII token for an in-flight propagation. Dropping it returns the
/// guard to idle.
pub struct GuardToken {
    guard: Arc<SyncGuard>,
}

impl Drop for GuardToken {
    fn drop(&mut self) {
        self.guard.state.store(IDLE, Ordering::SeqCst);
    }
}

type Cleanup = Box<dyn FnOnce() + Send>;

/// Shared state of one controller: model, item, identity, guard, and
/// the registered view-side disconnects.
pub struct ControllerBinding {
    model: Arc<Model>,
    item: ItemId,
    subscriber: Subscriber,
    guard: Arc<SyncGuard>,
    cleanups: Mutex<Vec<Cleanup>>,
    subscribed: AtomicBool,
}

impl ControllerBinding {
    /// Creates a binding for `item`.
    pub fn new(model: Arc<Model>, item: ItemId) -> Self {
        Self {
            model,
            item,
            subscriber: Subscriber::new(),
            guard: Arc::new(SyncGuard::new()),
            cleanups: Mutex::new(Vec::new()),
            subscribed: AtomicBool::new(false),
        }
    }

    /// The model this binding targets.
    pub fn model(&self) -> &Arc<Model> {
        &self.model
    }

    /// The bound item.
    pub fn item(&self) -> ItemId {
        self.item
    }

    /// The mapper identity all of this controller's registrations use.
    pub fn subscriber(&self) -> Subscriber {
        self.subscriber
    }

    /// The re-entrancy guard.
    pub fn guard(&self) -> &Arc<SyncGuard> {
        &self.guard
    }

    /// Checks that the bound item exposes a property, at subscription
    /// time rather than on first use.
    pub fn require_property(&self, name: &str) -> Result<()> {
        match self.model.has_property(self.item, name) {
            Ok(true) => Ok(()),
            Ok(false) => Err(ControllerError::MissingProperty {
                name: name.to_string(),
            }),
            Err(e) => Err(map_model_error(e)),
        }
    }

    /// Reads a numeric property of the bound item.
    pub fn read_f64(&self, name: &str) -> Result<f64> {
        let value = self
            .model
            .property(self.item, name)
            .map_err(map_model_error)?;
        match value {
            Value::Float(f) => Ok(f),
            Value::Int(i) => Ok(i as f64),
            other => Err(ControllerError::Model(ModelError::type_mismatch(
                "numeric value",
                format!("{other:?}"),
            ))),
        }
    }

    /// Flips the binding into the subscribed state.
    pub fn mark_subscribed(&self) -> Result<()> {
        if self.subscribed.swap(true, Ordering::SeqCst) {
            return Err(ControllerError::AlreadySubscribed);
        }
        Ok(())
    }

    /// Registers a view-side disconnect to run at teardown.
    pub fn register_cleanup<F>(&self, cleanup: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.cleanups.lock().push(Box::new(cleanup));
    }

    /// Detaches from the model and the view.
    ///
    /// Idempotent: the first call unsubscribes the mapper identity and
    /// runs the registered disconnects, later calls do nothing. Also
    /// runs on drop.
    pub fn teardown(&self) {
        if !self.subscribed.swap(false, Ordering::SeqCst) {
            return;
        }
        self.model.mapper().unsubscribe(self.subscriber);
        let cleanups = std::mem::take(&mut *self.cleanups.lock());
        for cleanup in cleanups {
            cleanup();
        }
        tracing::debug!(target: TARGET, item = ?self.item, "controller detached");
    }
}

impl Drop for ControllerBinding {
    fn drop(&mut self) {
        self.teardown();
    }
}

pub(crate) fn map_model_error(error: ModelError) -> ControllerError {
    match error {
        ModelError::InvalidItem => ControllerError::ItemRemoved,
        ModelError::UnknownProperty { name } => ControllerError::MissingProperty { name },
        other => ControllerError::Model(other),
    }
}
