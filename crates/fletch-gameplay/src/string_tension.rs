//! String tension model.
//!
//! Pure functions mapping a draw-hand position and the two string anchors to
//! a clamped pull and the control points of the string curve.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use fletch_common::{ArcheryError, ArcheryResult};

/// Chords shorter than this are treated as coincident anchors.
pub const MIN_CHORD_LENGTH: f32 = 1e-4;

/// The two fixed string anchors of a bow.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnchorPair {
    start: Vec3,
    end: Vec3,
}

impl AnchorPair {
    /// Creates an anchor pair, rejecting a zero-length chord.
    pub fn new(start: Vec3, end: Vec3) -> ArcheryResult<Self> {
        let length = start.distance(end);
        if !(length >= MIN_CHORD_LENGTH) {
            return Err(ArcheryError::DegenerateChord { length });
        }
        Ok(Self { start, end })
    }

    /// Upper string anchor.
    #[must_use]
    pub const fn start(&self) -> Vec3 {
        self.start
    }

    /// Lower string anchor.
    #[must_use]
    pub const fn end(&self) -> Vec3 {
        self.end
    }

    /// Centre of the resting chord.
    #[must_use]
    pub fn midpoint(&self) -> Vec3 {
        self.start.lerp(self.end, 0.5)
    }

    /// Length of the resting chord (never zero).
    #[must_use]
    pub fn chord_length(&self) -> f32 {
        self.start.distance(self.end)
    }
}

/// Pull measured in one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PullState {
    /// Unclamped hand distance from the chord midpoint.
    pub raw_distance: f32,
    /// Distance clamped to `[0, max_pull_distance]`.
    pub clamped_distance: f32,
    /// `clamped_distance / max_pull_distance`, 0 when misconfigured.
    pub strength: f32,
}

impl PullState {
    /// Resting string.
    pub const REST: Self = Self {
        raw_distance: 0.0,
        clamped_distance: 0.0,
        strength: 0.0,
    };

    /// Checks whether the pull is at or past `ratio` of the maximum.
    #[must_use]
    pub fn is_near_full(&self, ratio: f32) -> bool {
        self.strength > 0.0 && self.strength >= ratio
    }
}

/// Result of [`compute_clamped_pull`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClampedPull {
    /// Draw point on the string after clamping.
    pub position: Vec3,
    /// Pull metrics.
    pub pull: PullState,
}

/// Clamps a hand position to the reachable draw sphere around the chord midpoint.
///
/// A non-positive `max_pull_distance` pins the draw point to the midpoint with
/// zero strength. A hand exactly on the midpoint has no direction and yields
/// the midpoint as well.
#[must_use]
pub fn compute_clamped_pull(
    hand: Vec3,
    chord_midpoint: Vec3,
    max_pull_distance: f32,
) -> ClampedPull {
    let offset = hand - chord_midpoint;
    let raw_distance = offset.length();

    if !(max_pull_distance > 0.0) || !raw_distance.is_finite() {
        return ClampedPull {
            position: chord_midpoint,
            pull: PullState {
                raw_distance: if raw_distance.is_finite() { raw_distance } else { 0.0 },
                ..PullState::REST
            },
        };
    }

    let direction = offset.normalize_or_zero();
    let clamped_distance = raw_distance.min(max_pull_distance);
    let strength = (clamped_distance / max_pull_distance).clamp(0.0, 1.0);

    ClampedPull {
        position: chord_midpoint + direction * clamped_distance,
        pull: PullState {
            raw_distance,
            clamped_distance,
            strength,
        },
    }
}

/// Control points of the string curve.
///
/// A finite, restartable sequence: two points at rest, three while drawing.
/// Cloning a fresh curve gives an independent pass over the same points.
#[derive(Debug, Clone, PartialEq)]
pub struct StringCurve {
    points: [Vec3; 3],
    len: usize,
    cursor: usize,
}

impl StringCurve {
    /// Number of control points (2 or 3).
    #[must_use]
    pub const fn point_count(&self) -> usize {
        self.len
    }

    /// Checks whether this is the two-point rest configuration.
    #[must_use]
    pub const fn is_rest(&self) -> bool {
        self.len == 2
    }

    /// Control points as a slice, independent of iteration progress.
    #[must_use]
    pub fn points(&self) -> &[Vec3] {
        &self.points[..self.len]
    }
}

impl Iterator for StringCurve {
    type Item = Vec3;

    fn next(&mut self) -> Option<Vec3> {
        if self.cursor >= self.len {
            return None;
        }
        let point = self.points[self.cursor];
        self.cursor += 1;
        Some(point)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.len - self.cursor;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for StringCurve {}

/// Builds the string curve for the current draw.
#[must_use]
pub fn compute_string_curve(
    anchors: &AnchorPair,
    draw_point: Vec3,
    is_drawing: bool,
) -> StringCurve {
    if is_drawing {
        StringCurve {
            points: [anchors.start, draw_point, anchors.end],
            len: 3,
            cursor: 0,
        }
    } else {
        StringCurve {
            points: [anchors.start, anchors.end, anchors.end],
            len: 2,
            cursor: 0,
        }
    }
}
