//! # Fletch Gameplay
//!
//! Interaction and ballistics core for virtual archery.
//!
//! This crate turns two tracked hands into a drawn bowstring, a launch, a
//! flying arrow and a scored impact:
//! - String tension model (clamped pull, string curve)
//! - Proximity gate for ambient grab/release sensing
//! - Nock slot and the bow rig state machine
//! - Projectile flight, range and play-volume cleanup
//! - Impact resolution against damageable targets, and the score ledger
//! - Arrow supply with timed and draw-triggered replenishment
//! - Tick-clock scheduler for deferred spawns and despawns
//! - Notification bus for presentation and audio layers
//! - `ArcherySystem`, the per-tick wiring of all of the above

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod bow_rig;
pub mod config;
pub mod damage;
pub mod events;
pub mod impact;
pub mod input;
pub mod nock;
pub mod projectile;
pub mod proximity;
pub mod schedule;
pub mod score;
pub mod string_tension;
pub mod supply;
pub mod system;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::bow_rig::*;
    pub use crate::config::*;
    pub use crate::damage::*;
    pub use crate::events::*;
    pub use crate::impact::*;
    pub use crate::input::*;
    pub use crate::nock::*;
    pub use crate::projectile::*;
    pub use crate::proximity::*;
    pub use crate::schedule::*;
    pub use crate::score::*;
    pub use crate::string_tension::*;
    pub use crate::supply::*;
    pub use crate::system::*;
}

pub use prelude::*;
