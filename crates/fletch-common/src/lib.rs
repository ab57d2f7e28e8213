//! # Fletch Common
//!
//! Shared types for the Fletch archery core.
//!
//! This crate provides the foundational types used by every Fletch crate:
//! - ID types (EntityId, ArrowId, RigId, HandId)
//! - Error taxonomy (archery misuse, configuration, IO)
//! - Prelude for convenient imports

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod error;
pub mod ids;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::error::*;
    pub use crate::ids::*;
}

pub use prelude::*;
