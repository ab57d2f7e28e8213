//! Notification logging.
//!
//! The host's stand-in for presentation and audio: every notification the
//! archery core publishes is written to the log, launches and kills at `info`,
//! per-tick pull samples at `trace`.

use std::sync::Arc;

use tracing::{debug, info, trace};

use fletch_gameplay::{Notification, NotificationBus};

/// Writes one notification to the log.
pub fn log_notification(notification: &Notification) {
    match notification {
        Notification::PullStrengthChanged { rig, strength } => {
            trace!(%rig, strength, "pull strength");
        },
        Notification::FullDrawReached { rig } => debug!(%rig, "full draw"),
        Notification::ArrowNocked { rig, arrow } => debug!(%rig, %arrow, "arrow nocked"),
        Notification::ArrowLaunched {
            rig,
            arrow,
            strength,
            impulse,
        } => {
            info!(%rig, %arrow, strength, impulse = impulse.length(), "loose");
        },
        Notification::ArrowCountChanged { count } => debug!(count, "quiver"),
        Notification::ArrowImpacted { arrow, entity, point, .. } => {
            debug!(%arrow, %entity, ?point, "thunk");
        },
        Notification::TargetHit { entity, damage } => info!(%entity, damage, "hit"),
        Notification::TargetDestroyed { entity } => info!(%entity, "destroyed"),
        Notification::ScoreChanged { total } => info!(total, "score"),
        Notification::ArrowDespawned { arrow, reason } => debug!(%arrow, ?reason, "arrow gone"),
    }
}

/// Subscribes the logger to `bus`.
pub fn attach(bus: &NotificationBus) {
    bus.subscribe(Arc::new(log_notification));
}
