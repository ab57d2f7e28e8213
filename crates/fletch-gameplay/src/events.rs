//! Notification bus between the archery core and presentation layers.
//!
//! Every notification is fire-and-forget. Subscribers registered with
//! [`NotificationBus::subscribe`] are called synchronously at publish time;
//! the same notification is also queued so a frame-based consumer can
//! [`drain`](NotificationBus::drain) it later. A full queue drops the event.

use std::fmt;
use std::sync::Arc;

use crossbeam_channel::{bounded, Receiver, Sender};
use glam::Vec3;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::trace;

use fletch_common::{ArrowId, EntityId, RigId};

/// Why an arrow left the simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DespawnReason {
    /// Settle delay after an impact elapsed.
    Settled,
    /// Travelled past the maximum range without hitting anything.
    OutOfRange,
    /// Left the play volume (or the camera) without hitting anything.
    OutOfBounds,
}

/// Notifications published by the archery core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Notification {
    /// Pull strength while drawing, and a final 0.0 when a draw ends
    PullStrengthChanged {
        /// Rig being drawn
        rig: RigId,
        /// Normalized strength (0..=1)
        strength: f32,
    },
    /// Pull crossed into the near-full sub-state
    FullDrawReached {
        /// Rig being drawn
        rig: RigId,
    },
    /// An arrow was seated on the string
    ArrowNocked {
        /// Rig holding the arrow
        rig: RigId,
        /// Arrow nocked
        arrow: ArrowId,
    },
    /// An arrow left the string
    ArrowLaunched {
        /// Rig that fired
        rig: RigId,
        /// Arrow fired
        arrow: ArrowId,
        /// Strength at release
        strength: f32,
        /// Linear launch impulse
        impulse: Vec3,
    },
    /// Arrow supply count changed
    ArrowCountChanged {
        /// New count
        count: u32,
    },
    /// An arrow struck something
    ArrowImpacted {
        /// Arrow that struck
        arrow: ArrowId,
        /// Entity struck
        entity: EntityId,
        /// Contact point
        point: Vec3,
        /// Contact normal
        normal: Vec3,
    },
    /// A struck entity took damage and survived
    TargetHit {
        /// Entity hit
        entity: EntityId,
        /// Damage applied
        damage: i32,
    },
    /// A struck entity went from alive to destroyed
    TargetDestroyed {
        /// Entity destroyed
        entity: EntityId,
    },
    /// Score total changed
    ScoreChanged {
        /// New total
        total: u64,
    },
    /// An arrow was removed from the simulation
    ArrowDespawned {
        /// Arrow removed
        arrow: ArrowId,
        /// Why it was removed
        reason: DespawnReason,
    },
}

/// Typed notification handler.
pub trait NotificationHandler: Send + Sync {
    /// Handles a notification.
    fn handle(&self, notification: &Notification);
}

impl<F> NotificationHandler for F
where
    F: Fn(&Notification) + Send + Sync,
{
    fn handle(&self, notification: &Notification) {
        self(notification);
    }
}

/// Cloneable handle to a shared notification bus.
///
/// Clones publish to the same subscribers and the same queue.
#[derive(Clone)]
pub struct NotificationBus {
    /// Sender for queued notifications
    sender: Sender<Notification>,
    /// Receiver for draining queued notifications
    receiver: Receiver<Notification>,
    /// Synchronous subscribers
    handlers: Arc<RwLock<Vec<Arc<dyn NotificationHandler>>>>,
    /// Queue capacity
    capacity: usize,
}

impl Default for NotificationBus {
    fn default() -> Self {
        Self::new(1024)
    }
}

impl fmt::Debug for NotificationBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotificationBus")
            .field("pending", &self.receiver.len())
            .field("subscribers", &self.handlers.read().len())
            .field("capacity", &self.capacity)
            .finish()
    }
}

impl NotificationBus {
    /// Creates a new bus whose queue holds up to `capacity` notifications.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = bounded(capacity);
        Self {
            sender,
            receiver,
            handlers: Arc::new(RwLock::new(Vec::new())),
            capacity,
        }
    }

    /// Registers a synchronous subscriber.
    pub fn subscribe(&self, handler: Arc<dyn NotificationHandler>) {
        self.handlers.write().push(handler);
    }

    /// Publishes a notification to subscribers and the queue.
    pub fn publish(&self, notification: Notification) {
        for handler in self.handlers.read().iter() {
            handler.handle(&notification);
        }
        if self.sender.try_send(notification).is_err() {
            trace!("notification queue full, dropping");
        }
    }

    /// Drains all queued notifications.
    pub fn drain(&self) -> Vec<Notification> {
        self.receiver.try_iter().collect()
    }

    /// Returns the number of queued notifications.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.receiver.len()
    }

    /// Returns the queue capacity.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the number of synchronous subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.handlers.read().len()
    }
}
