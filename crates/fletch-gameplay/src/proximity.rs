//! Proximity gate for ambient pull sensing.
//!
//! Decides from raw hand positions whether the grip hand holds the bow,
//! whether a draw hand touches the string, and whether the drawing hand has
//! let go. Letting go uses a larger radius than touching so the rig does not
//! chatter between drawing and nocked at the detection boundary.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use fletch_common::HandId;

use crate::config::SensingConfig;
use crate::input::PoseFrame;

/// Detection radii.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProximityRadii {
    /// Grip hand to bow grip.
    pub grip: f32,
    /// Draw hand to string, to start drawing.
    pub touch: f32,
    /// Draw hand to string, to let go. At least `touch`.
    pub release: f32,
    /// Held arrow to nock point.
    pub nock: f32,
}

impl From<&SensingConfig> for ProximityRadii {
    fn from(config: &SensingConfig) -> Self {
        Self {
            grip: config.grip_radius,
            touch: config.touch_radius,
            release: config.release_hysteresis_radius.max(config.touch_radius),
            nock: config.nock_radius,
        }
    }
}

/// State of the tracked drawing hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReleaseCheck {
    /// No hand is tracked.
    Untracked,
    /// Hand is still on the string.
    Holding,
    /// Hand moved past the release radius.
    Released,
    /// Hand has no sample this tick.
    Lost,
}

/// Per-tick proximity readings.
#[derive(Debug, Clone)]
pub struct ProximityGate {
    radii: ProximityRadii,
    gripping: bool,
    touching: Option<HandId>,
    tracked: Option<HandId>,
    release: ReleaseCheck,
    arrow_at_nock: bool,
}

impl ProximityGate {
    /// Creates a gate with no readings.
    #[must_use]
    pub fn new(radii: ProximityRadii) -> Self {
        Self {
            radii,
            gripping: false,
            touching: None,
            tracked: None,
            release: ReleaseCheck::Untracked,
            arrow_at_nock: false,
        }
    }

    /// Radii in use.
    #[must_use]
    pub const fn radii(&self) -> ProximityRadii {
        self.radii
    }

    /// Refreshes every reading from this tick's frame.
    ///
    /// `string_point` is where the string currently is: the chord midpoint at
    /// rest, the clamped draw point while drawing.
    pub fn update(&mut self, grip_point: Vec3, string_point: Vec3, frame: &PoseFrame) {
        self.gripping = frame
            .grip
            .is_some_and(|grip| grip.distance(grip_point) <= self.radii.grip);

        self.touching = frame
            .draw_candidates
            .iter()
            .map(|sample| (sample.hand, sample.position.distance(string_point)))
            .filter(|(_, distance)| *distance <= self.radii.touch)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(hand, _)| hand);

        self.release = match self.tracked {
            None => ReleaseCheck::Untracked,
            Some(hand) => match frame.hand(hand) {
                None => ReleaseCheck::Lost,
                Some(position) if position.distance(string_point) > self.radii.release => {
                    ReleaseCheck::Released
                },
                Some(_) => ReleaseCheck::Holding,
            },
        };

        self.arrow_at_nock = frame
            .held_arrow
            .is_some_and(|tip| tip.distance(string_point) <= self.radii.nock);
    }

    /// Fixes the drawing hand for the current drawing episode.
    pub fn track(&mut self, hand: HandId) {
        self.tracked = Some(hand);
        self.release = ReleaseCheck::Holding;
    }

    /// Ends the drawing episode.
    pub fn untrack(&mut self) {
        self.tracked = None;
        self.release = ReleaseCheck::Untracked;
    }

    /// Hand fixed for the current drawing episode.
    #[must_use]
    pub const fn tracked_hand(&self) -> Option<HandId> {
        self.tracked
    }

    /// Grip hand is within the grip radius.
    #[must_use]
    pub const fn is_gripping(&self) -> bool {
        self.gripping
    }

    /// Some draw hand is within the touch radius.
    #[must_use]
    pub const fn is_touching_string(&self) -> bool {
        self.touching.is_some()
    }

    /// Nearest draw hand within the touch radius.
    #[must_use]
    pub const fn touching_hand(&self) -> Option<HandId> {
        self.touching
    }

    /// Tracked hand moved past the release radius.
    #[must_use]
    pub fn has_released(&self) -> bool {
        self.release == ReleaseCheck::Released
    }

    /// Full state of the tracked hand.
    #[must_use]
    pub const fn release_check(&self) -> ReleaseCheck {
        self.release
    }

    /// Held arrow is within the nock radius.
    #[must_use]
    pub const fn is_arrow_at_nock(&self) -> bool {
        self.arrow_at_nock
    }
}
