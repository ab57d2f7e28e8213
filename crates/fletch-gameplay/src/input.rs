//! Pose samples and discrete grab events supplied by the tracking layer.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use fletch_common::HandId;

/// Position of one hand that may draw the string.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HandSample {
    /// Which hand.
    pub hand: HandId,
    /// World position this tick.
    pub position: Vec3,
}

impl HandSample {
    /// Creates a sample.
    #[must_use]
    pub const fn new(hand: HandId, position: Vec3) -> Self {
        Self { hand, position }
    }
}

/// Everything the pose source reports for one tick.
///
/// Missing entries mean the tracking source has no sample this tick.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PoseFrame {
    /// Timestamp of the samples in seconds.
    pub timestamp: f64,
    /// Grip hand position.
    pub grip: Option<Vec3>,
    /// Hands that may draw the string.
    pub draw_candidates: Vec<HandSample>,
    /// Tip of an arrow held in hand, for ambient nocking.
    pub held_arrow: Option<Vec3>,
}

impl PoseFrame {
    /// Creates an empty frame at `timestamp`.
    #[must_use]
    pub fn at(timestamp: f64) -> Self {
        Self {
            timestamp,
            ..Self::default()
        }
    }

    /// Sets the grip hand position.
    #[must_use]
    pub fn with_grip(mut self, position: Vec3) -> Self {
        self.grip = Some(position);
        self
    }

    /// Adds a draw-candidate hand.
    #[must_use]
    pub fn with_hand(mut self, hand: HandId, position: Vec3) -> Self {
        self.draw_candidates.push(HandSample::new(hand, position));
        self
    }

    /// Sets the held arrow position.
    #[must_use]
    pub fn with_held_arrow(mut self, position: Vec3) -> Self {
        self.held_arrow = Some(position);
        self
    }

    /// Looks up the sample for a hand.
    #[must_use]
    pub fn hand(&self, hand: HandId) -> Option<Vec3> {
        self.draw_candidates
            .iter()
            .find(|sample| sample.hand == hand)
            .map(|sample| sample.position)
    }
}

/// Discrete interaction events, used in discrete sensing mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GrabEvent {
    /// Seat a held arrow on the string.
    NockArrow,
    /// A hand grabbed the string.
    GrabString(HandId),
    /// The drawing hand let go of the string.
    ReleaseString,
    /// The nocked arrow was pulled off the string.
    RemoveArrow,
}
