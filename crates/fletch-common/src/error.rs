//! Error types for Fletch.
//!
//! Runtime degradations (sensing gaps, double contacts, empty quivers) are not
//! errors; these types only cover misuse a caller can act on.

use crate::ids::{ArrowId, EntityId};
use thiserror::Error;

/// Top-level error type for Fletch operations.
#[derive(Debug, Error)]
pub enum FletchError {
    /// Archery core misuse
    #[error("Archery error: {0}")]
    Archery(#[from] ArcheryError),

    /// Configuration errors
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Misuse of the bow/arrow core.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ArcheryError {
    /// The two string anchors coincide, so the chord has no length
    #[error("string anchors coincide (chord length {length})")]
    DegenerateChord {
        /// Measured chord length
        length: f32,
    },

    /// The nock slot already holds an arrow
    #[error("nock slot already holds {0}")]
    SlotOccupied(ArrowId),

    /// A contact was reported for an arrow that is not in flight
    #[error("{0} is not tracked by the flight system")]
    UnknownProjectile(ArrowId),

    /// An entity was looked up that is not registered
    #[error("{0} is not registered")]
    UnknownEntity(EntityId),
}

/// Configuration loading and validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be parsed
    #[error("failed to parse config: {0}")]
    Parse(String),

    /// The configuration could not be serialized
    #[error("failed to serialize config: {0}")]
    Serialize(String),

    /// A field holds a value the core cannot work with
    #[error("invalid value for {field}: {reason}")]
    Invalid {
        /// Field name
        field: &'static str,
        /// Why the value was rejected
        reason: String,
    },
}

/// Result type alias for archery core operations.
pub type ArcheryResult<T> = Result<T, ArcheryError>;

/// Result type alias for Fletch operations.
pub type FletchResult<T> = Result<T, FletchError>;
