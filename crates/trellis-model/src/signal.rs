//! Minimal signal/slot utility.
//!
//! [`Signal<Args>`] is the change-notification hook exposed by view
//! objects: connected slots are invoked synchronously, in the emitting
//! call stack, within one dispatch turn. There is no queued or
//! cross-thread invocation machinery; the model layer's [`ModelMapper`]
//! covers tree-wide notification, this type covers single hooks.
//!
//! # Example
//!
//! ```
//! use trellis_model::Signal;
//!
//! let range_changed = Signal::<(f64, f64)>::new();
//! let id = range_changed.connect(|&(lo, hi)| {
//!     println!("range: {lo}..{hi}");
//! });
//! range_changed.emit((0.0, 10.0));
//! range_changed.disconnect(id);
//! ```
//!
//! [`ModelMapper`]: crate::mapper::ModelMapper

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use slotmap::{new_key_type, SlotMap};

use crate::logging::targets;

new_key_type! {
    /// A unique identifier for a signal-slot connection.
    ///
    /// Returned by [`Signal::connect`]; pass it to [`Signal::disconnect`]
    /// to remove the slot again.
    pub struct ConnectionId;
}

type Slot<Args> = Arc<dyn Fn(&Args) + Send + Sync>;

/// A signal with synchronously invoked slots.
///
/// Emission snapshots the connection list before invoking anything, so a
/// slot may connect or disconnect (itself included) without affecting
/// the in-flight emission.
pub struct Signal<Args> {
    connections: Mutex<SlotMap<ConnectionId, Slot<Args>>>,
    blocked: AtomicBool,
}

impl<Args> Default for Signal<Args> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Args> Signal<Args> {
    /// Create a new signal with no connections.
    pub fn new() -> Self {
        Self {
            connections: Mutex::new(SlotMap::with_key()),
            blocked: AtomicBool::new(false),
        }
    }

    /// Connect a slot, returning its connection id.
    pub fn connect<F>(&self, slot: F) -> ConnectionId
    where
        F: Fn(&Args) + Send + Sync + 'static,
    {
        self.connections.lock().insert(Arc::new(slot))
    }

    /// Disconnect a slot by id.
    ///
    /// Returns `true` if the connection was found and removed.
    pub fn disconnect(&self, id: ConnectionId) -> bool {
        self.connections.lock().remove(id).is_some()
    }

    /// Disconnect all slots.
    pub fn disconnect_all(&self) {
        self.connections.lock().clear();
    }

    /// Number of connected slots.
    pub fn connection_count(&self) -> usize {
        self.connections.lock().len()
    }

    /// Block emission temporarily. Registration state is unaffected.
    pub fn set_blocked(&self, blocked: bool) {
        self.blocked.store(blocked, Ordering::SeqCst);
    }

    /// Check if emission is currently blocked.
    pub fn is_blocked(&self) -> bool {
        self.blocked.load(Ordering::SeqCst)
    }

    /// Emit the signal, invoking every slot connected at the time of the
    /// call. Does nothing while blocked.
    pub fn emit(&self, args: Args) {
        if self.is_blocked() {
            tracing::trace!(target: targets::SIGNAL, "signal blocked, skipping emit");
            return;
        }

        // Snapshot under the lock, invoke after releasing it, so slots
        // may disconnect during emission.
        let snapshot: Vec<Slot<Args>> = self.connections.lock().values().cloned().collect();
        tracing::trace!(target: targets::SIGNAL, connection_count = snapshot.len(), "emitting signal");
        for slot in snapshot {
            slot(&args);
        }
    }
}
