//! # Fletch Engine
//!
//! Headless host for the Fletch archery core.
//!
//! This crate supplies what a game engine would:
//! - Config: TOML host settings wrapping the archery tuning
//! - Scenario: a scripted archer shooting at a practice range
//! - Notification log: the stand-in for presentation and audio

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod config;
pub mod notification_log;
pub mod scenario;

mod e2e_tests;

pub use config::EngineConfig;
pub use scenario::{RangeSession, RangeSummary, ScriptedArcher};
