//! Bow rig state machine.
//!
//! A rig moves through `Idle -> Nocked -> Drawing` and back to `Idle` either
//! by releasing (the arrow is launched) or by dropping (the arrow comes off
//! the string unfired). Grab and release come from discrete events or, in
//! ambient mode, from the [`ProximityGate`].
//!
//! The rig never keeps an arrow after launch: [`Launch`] carries it out by
//! value, so a flying arrow cannot also be seen as nocked.

use glam::Vec3;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace, warn};

use fletch_common::{HandId, RigId};

use crate::config::{ArcheryConfig, DrawConfig, SensingMode};
use crate::events::{Notification, NotificationBus};
use crate::input::PoseFrame;
use crate::nock::{Arrow, KinematicMode, NockRejected, NockSlot};
use crate::proximity::{ProximityGate, ProximityRadii, ReleaseCheck};
use crate::string_tension::{
    compute_clamped_pull, compute_string_curve, AnchorPair, PullState, StringCurve,
};

/// Distance from the chord midpoint to the grip along the forward axis.
pub const DEFAULT_BRACE_HEIGHT: f32 = 0.18;

// ============================================================================
// Pose
// ============================================================================

/// Where the bow is this tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BowPose {
    anchors: AnchorPair,
    forward: Vec3,
    grip: Vec3,
}

impl BowPose {
    /// Creates a pose with the grip one brace height ahead of the string.
    ///
    /// A zero `forward` falls back to +Z.
    #[must_use]
    pub fn new(anchors: AnchorPair, forward: Vec3) -> Self {
        let forward = forward.try_normalize().unwrap_or(Vec3::Z);
        Self {
            anchors,
            forward,
            grip: anchors.midpoint() + forward * DEFAULT_BRACE_HEIGHT,
        }
    }

    /// Overrides the grip position.
    #[must_use]
    pub fn with_grip(mut self, grip: Vec3) -> Self {
        self.grip = grip;
        self
    }

    /// String anchors.
    #[must_use]
    pub const fn anchors(&self) -> &AnchorPair {
        &self.anchors
    }

    /// Unit launch direction.
    #[must_use]
    pub const fn forward(&self) -> Vec3 {
        self.forward
    }

    /// Bow grip position.
    #[must_use]
    pub const fn grip(&self) -> Vec3 {
        self.grip
    }

    /// Where an arrow sits on the resting string.
    #[must_use]
    pub fn nock_point(&self) -> Vec3 {
        self.anchors.midpoint()
    }
}

// ============================================================================
// States and outcomes
// ============================================================================

/// Rig state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RigState {
    /// No arrow on the string.
    #[default]
    Idle,
    /// Arrow on the string, not drawn.
    Nocked,
    /// String held and pulled.
    Drawing,
}

/// An arrow leaving the string.
#[derive(Debug, Clone, PartialEq)]
pub struct Launch {
    /// Rig that fired.
    pub rig: RigId,
    /// The arrow, now flying.
    pub arrow: Arrow,
    /// Draw point at release.
    pub origin: Vec3,
    /// Unit launch direction.
    pub direction: Vec3,
    /// Linear impulse: `direction * strength * force_multiplier`.
    pub impulse: Vec3,
    /// Angular impulse orthogonal to `direction`.
    pub spin: Vec3,
    /// Strength at release.
    pub strength: f32,
}

/// What a rig operation changed.
#[derive(Debug, Clone, PartialEq)]
pub enum RigOutcome {
    /// Nothing the caller has to act on.
    Unchanged,
    /// The rig entered `Drawing`.
    DrawStarted,
    /// The rig released and launched an arrow.
    Released(Launch),
    /// The arrow came off the string without launching.
    Dropped(Arrow),
}

// ============================================================================
// Rig
// ============================================================================

/// A bow with its string, nock slot and pull sensing.
#[derive(Debug, Clone)]
pub struct BowRig {
    id: RigId,
    pose: BowPose,
    draw: DrawConfig,
    mode: SensingMode,
    state: RigState,
    slot: NockSlot,
    pull: PullState,
    draw_point: Vec3,
    gate: ProximityGate,
    full_draw_signalled: bool,
    bus: NotificationBus,
}

impl BowRig {
    /// Creates an idle rig.
    #[must_use]
    pub fn new(id: RigId, pose: BowPose, config: &ArcheryConfig, bus: NotificationBus) -> Self {
        Self {
            id,
            pose,
            draw: config.draw.clone(),
            mode: config.sensing.mode,
            state: RigState::Idle,
            slot: NockSlot::new(),
            pull: PullState::REST,
            draw_point: pose.nock_point(),
            gate: ProximityGate::new(ProximityRadii::from(&config.sensing)),
            full_draw_signalled: false,
            bus,
        }
    }

    /// Rig identifier.
    #[must_use]
    pub const fn id(&self) -> RigId {
        self.id
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> RigState {
        self.state
    }

    /// Current pose.
    #[must_use]
    pub const fn pose(&self) -> &BowPose {
        &self.pose
    }

    /// Sensing mode selected at construction.
    #[must_use]
    pub const fn sensing_mode(&self) -> SensingMode {
        self.mode
    }

    /// Pull of the current draw, [`PullState::REST`] otherwise.
    #[must_use]
    pub const fn pull(&self) -> PullState {
        self.pull
    }

    /// Clamped draw point, the chord midpoint at rest.
    #[must_use]
    pub const fn draw_point(&self) -> Vec3 {
        self.draw_point
    }

    /// Hand fixed for the current drawing episode.
    #[must_use]
    pub const fn pulling_hand(&self) -> Option<HandId> {
        self.gate.tracked_hand()
    }

    /// Proximity readings from the last tick.
    #[must_use]
    pub const fn gate(&self) -> &ProximityGate {
        &self.gate
    }

    /// Arrow on the string.
    #[must_use]
    pub const fn nocked_arrow(&self) -> Option<&Arrow> {
        self.slot.peek()
    }

    /// Checks whether the pull is in the near-full feedback band.
    #[must_use]
    pub fn is_near_full_draw(&self) -> bool {
        self.state == RigState::Drawing && self.pull.is_near_full(self.draw.near_full_ratio)
    }

    /// Control points of the string for rendering.
    #[must_use]
    pub fn string_curve(&self) -> StringCurve {
        compute_string_curve(self.pose.anchors(), self.draw_point, self.state == RigState::Drawing)
    }

    /// Moves the bow. The draw point follows on the next tick while drawing.
    pub fn set_pose(&mut self, pose: BowPose) {
        self.pose = pose;
        if self.state != RigState::Drawing {
            self.draw_point = pose.nock_point();
        }
    }

    /// Returns the string to its two-point rest shape.
    ///
    /// Only valid outside a draw; a drawing rig is left as it is and `false`
    /// is returned.
    pub fn reset_bow_string(&mut self) -> bool {
        if self.state == RigState::Drawing {
            return false;
        }
        self.pull = PullState::REST;
        self.draw_point = self.pose.nock_point();
        true
    }

    // ------------------------------------------------------------------------
    // Discrete operations
    // ------------------------------------------------------------------------

    /// Seats an arrow. A rig that already holds one hands it back.
    pub fn place_arrow(&mut self, mut arrow: Arrow) -> Result<(), NockRejected> {
        arrow.set_owner(Some(self.id));
        arrow.set_mode(KinematicMode::Nocked);
        let id = arrow.id();
        if let Err(mut rejected) = self.slot.place(arrow) {
            rejected.arrow.set_owner(None);
            rejected.arrow.set_mode(KinematicMode::Held);
            return Err(rejected);
        }

        self.state = RigState::Nocked;
        debug!(rig = %self.id, arrow = %id, "arrow nocked");
        self.bus.publish(Notification::ArrowNocked { rig: self.id, arrow: id });
        Ok(())
    }

    /// A hand grabbed the string. Starts a draw from `Nocked`.
    pub fn grab_string(&mut self, hand: HandId, frame: &PoseFrame) -> RigOutcome {
        if self.state != RigState::Nocked {
            trace!(rig = %self.id, state = ?self.state, "grab ignored");
            return RigOutcome::Unchanged;
        }
        self.start_drawing(hand);
        if let Some(position) = frame.hand(hand) {
            self.update_pull(position);
        }
        RigOutcome::DrawStarted
    }

    /// The drawing hand let go. Launches with the last known strength.
    pub fn release_string(&mut self, frame: &PoseFrame) -> RigOutcome {
        if self.state != RigState::Drawing {
            trace!(rig = %self.id, state = ?self.state, "release ignored");
            return RigOutcome::Unchanged;
        }
        if let Some(position) = self.gate.tracked_hand().and_then(|hand| frame.hand(hand)) {
            let clamped =
                compute_clamped_pull(position, self.pose.nock_point(), self.draw.max_pull_distance);
            self.pull = clamped.pull;
            self.draw_point = clamped.position;
        }
        self.launch()
    }

    /// Pulls the arrow off the string from any state.
    pub fn remove_arrow(&mut self) -> RigOutcome {
        match self.slot.take() {
            Some(arrow) => self.drop_arrow(arrow, "arrow removed"),
            None => {
                self.end_draw();
                RigOutcome::Unchanged
            },
        }
    }

    // ------------------------------------------------------------------------
    // Per-tick update
    // ------------------------------------------------------------------------

    /// Advances the rig by one tick of pose samples.
    pub fn tick(&mut self, frame: &PoseFrame) -> RigOutcome {
        match self.state {
            RigState::Idle => {
                self.sense(frame);
                RigOutcome::Unchanged
            },
            RigState::Nocked => {
                self.sense(frame);
                if self.mode != SensingMode::Ambient || !self.gate.is_gripping() {
                    return RigOutcome::Unchanged;
                }
                match self.gate.touching_hand() {
                    Some(hand) => self.grab_string(hand, frame),
                    None => RigOutcome::Unchanged,
                }
            },
            RigState::Drawing => self.tick_drawing(frame),
        }
    }

    fn tick_drawing(&mut self, frame: &PoseFrame) -> RigOutcome {
        let Some(hand) = self.gate.tracked_hand() else {
            warn!(rig = %self.id, "drawing without a pulling hand");
            return self.drop_nocked("pulling hand missing");
        };
        let Some(position) = frame.hand(hand) else {
            warn!(rig = %self.id, hand = %hand, "pulling hand lost mid-draw");
            return self.drop_nocked("pulling hand lost");
        };

        // Release is judged against the string point held last tick and
        // launches with that tick's pull.
        self.sense(frame);
        if self.mode == SensingMode::Ambient
            && self.gate.release_check() == ReleaseCheck::Released
        {
            return self.launch();
        }

        self.update_pull(position);
        RigOutcome::Unchanged
    }

    fn sense(&mut self, frame: &PoseFrame) {
        self.gate.update(self.pose.grip(), self.draw_point, frame);
    }

    fn start_drawing(&mut self, hand: HandId) {
        self.state = RigState::Drawing;
        self.full_draw_signalled = false;
        self.gate.track(hand);
        debug!(rig = %self.id, hand = %hand, "draw started");
    }

    fn update_pull(&mut self, hand_position: Vec3) {
        let clamped = compute_clamped_pull(
            hand_position,
            self.pose.nock_point(),
            self.draw.max_pull_distance,
        );
        self.pull = clamped.pull;
        self.draw_point = clamped.position;

        trace!(rig = %self.id, strength = self.pull.strength, "pull");
        self.bus.publish(Notification::PullStrengthChanged {
            rig: self.id,
            strength: self.pull.strength,
        });

        if !self.full_draw_signalled && self.pull.is_near_full(self.draw.near_full_ratio) {
            self.full_draw_signalled = true;
            self.bus.publish(Notification::FullDrawReached { rig: self.id });
        }
    }

    fn launch(&mut self) -> RigOutcome {
        let Some(mut arrow) = self.slot.take() else {
            warn!(rig = %self.id, "release with an empty slot");
            self.end_draw();
            return RigOutcome::Unchanged;
        };

        let strength = self.pull.strength;
        let direction = self.pose.forward();
        let impulse = direction * (strength * self.draw.force_multiplier);
        let spin = spin_axis(direction) * self.draw.spin_force;
        let origin = self.draw_point;
        arrow.set_mode(KinematicMode::Flying);

        info!(rig = %self.id, arrow = %arrow.id(), strength, "arrow launched");
        self.bus.publish(Notification::ArrowLaunched {
            rig: self.id,
            arrow: arrow.id(),
            strength,
            impulse,
        });
        self.end_draw();

        RigOutcome::Released(Launch {
            rig: self.id,
            arrow,
            origin,
            direction,
            impulse,
            spin,
            strength,
        })
    }

    fn drop_nocked(&mut self, why: &'static str) -> RigOutcome {
        match self.slot.take() {
            Some(arrow) => self.drop_arrow(arrow, why),
            None => {
                self.end_draw();
                RigOutcome::Unchanged
            },
        }
    }

    fn drop_arrow(&mut self, mut arrow: Arrow, why: &'static str) -> RigOutcome {
        arrow.set_mode(KinematicMode::Held);
        debug!(rig = %self.id, arrow = %arrow.id(), reason = why, "arrow dropped");
        self.end_draw();
        RigOutcome::Dropped(arrow)
    }

    /// Returns to `Idle` with the string at rest.
    fn end_draw(&mut self) {
        let was_drawing = self.state == RigState::Drawing;
        self.state = RigState::Idle;
        self.pull = PullState::REST;
        self.draw_point = self.pose.nock_point();
        self.full_draw_signalled = false;
        self.gate.untrack();
        if was_drawing {
            self.bus.publish(Notification::PullStrengthChanged {
                rig: self.id,
                strength: 0.0,
            });
        }
    }
}

/// Axis orthogonal to `forward` used for the launch spin.
fn spin_axis(forward: Vec3) -> Vec3 {
    forward
        .cross(Vec3::Y)
        .try_normalize()
        .unwrap_or_else(|| forward.any_orthonormal_vector())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(mode: SensingMode) -> ArcheryConfig {
        let mut config = ArcheryConfig::default();
        config.sensing.mode = mode;
        config
    }

    fn rig(mode: SensingMode) -> (BowRig, NotificationBus) {
        let bus = NotificationBus::new(256);
        let anchors = AnchorPair::new(Vec3::new(0.0, 0.7, 0.0), Vec3::new(0.0, -0.7, 0.0))
            .expect("valid chord");
        let pose = BowPose::new(anchors, Vec3::Z);
        let rig = BowRig::new(RigId::new(1), pose, &config(mode), bus.clone());
        (rig, bus)
    }

    fn arrow(id: u64) -> Arrow {
        Arrow::new(fletch_common::ArrowId::new(id), 10)
    }

    fn pulled(distance: f32) -> PoseFrame {
        PoseFrame::at(0.0).with_hand(HandId::RIGHT, Vec3::new(0.0, 0.0, -distance))
    }

    fn pull_events(bus: &NotificationBus) -> Vec<f32> {
        bus.drain()
            .into_iter()
            .filter_map(|n| match n {
                Notification::PullStrengthChanged { strength, .. } => Some(strength),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_nock_moves_idle_to_nocked() {
        let (mut rig, bus) = rig(SensingMode::Discrete);
        assert_eq!(rig.state(), RigState::Idle);

        rig.place_arrow(arrow(1)).expect("empty rig");
        assert_eq!(rig.state(), RigState::Nocked);
        assert_eq!(rig.nocked_arrow().map(Arrow::mode), Some(KinematicMode::Nocked));
        assert_eq!(rig.nocked_arrow().and_then(Arrow::owner_rig), Some(RigId::new(1)));
        assert!(bus.drain().contains(&Notification::ArrowNocked {
            rig: RigId::new(1),
            arrow: fletch_common::ArrowId::new(1),
        }));
    }

    #[test]
    fn test_second_arrow_is_handed_back() {
        let (mut rig, _bus) = rig(SensingMode::Discrete);
        rig.place_arrow(arrow(1)).expect("empty rig");

        let rejected = rig.place_arrow(arrow(2)).expect_err("occupied");
        assert_eq!(rejected.arrow.mode(), KinematicMode::Held);
        assert_eq!(rejected.arrow.owner_rig(), None);
        assert_eq!(rig.nocked_arrow().map(Arrow::id), Some(fletch_common::ArrowId::new(1)));
    }

    #[test]
    fn test_grab_without_arrow_is_ignored() {
        let (mut rig, _bus) = rig(SensingMode::Discrete);
        assert_eq!(rig.grab_string(HandId::RIGHT, &pulled(0.2)), RigOutcome::Unchanged);
        assert_eq!(rig.state(), RigState::Idle);
    }

    #[test]
    fn test_full_draw_impulse_equals_force_multiplier() {
        let (mut rig, bus) = rig(SensingMode::Discrete);
        rig.place_arrow(arrow(1)).expect("empty rig");
        assert_eq!(rig.grab_string(HandId::RIGHT, &pulled(0.6)), RigOutcome::DrawStarted);
        assert!((rig.pull().strength - 1.0).abs() < 1e-5);
        assert!(rig.is_near_full_draw());

        let RigOutcome::Released(launch) = rig.release_string(&pulled(0.6)) else {
            panic!("expected a launch");
        };
        assert!((launch.impulse.length() - 30.0).abs() < 1e-4);
        assert_eq!(launch.direction, Vec3::Z);
        assert_eq!(launch.arrow.mode(), KinematicMode::Flying);
        assert!((launch.spin.length() - 0.1).abs() < 1e-6);
        assert!(launch.spin.dot(launch.direction).abs() < 1e-6);

        assert_eq!(rig.state(), RigState::Idle);
        assert!(rig.nocked_arrow().is_none());
        let notifications = bus.drain();
        assert_eq!(
            notifications
                .iter()
                .filter(|n| matches!(n, Notification::FullDrawReached { .. }))
                .count(),
            1
        );
        assert!(notifications.iter().any(|n| matches!(
            n,
            Notification::ArrowLaunched { strength, .. } if (*strength - 1.0).abs() < 1e-5
        )));
    }

    #[test]
    fn test_partial_draw_reports_half_strength() {
        let (mut rig, bus) = rig(SensingMode::Discrete);
        rig.place_arrow(arrow(1)).expect("empty rig");
        rig.grab_string(HandId::RIGHT, &PoseFrame::at(0.0));
        rig.tick(&pulled(0.3));

        let strengths = pull_events(&bus);
        assert!(strengths.iter().any(|s| (s - 0.5).abs() < 1e-5));
        assert!(!rig.is_near_full_draw());

        let RigOutcome::Released(launch) = rig.release_string(&pulled(0.3)) else {
            panic!("expected a launch");
        };
        assert!((launch.impulse.length() - 15.0).abs() < 1e-3);
        assert!((launch.origin - Vec3::new(0.0, 0.0, -0.3)).length() < 1e-5);
    }

    #[test]
    fn test_overdraw_saturates_strength() {
        let (mut rig, _bus) = rig(SensingMode::Discrete);
        rig.place_arrow(arrow(1)).expect("empty rig");
        rig.grab_string(HandId::RIGHT, &pulled(3.0));

        assert_eq!(rig.pull().strength, 1.0);
        assert!((rig.draw_point().z + 0.6).abs() < 1e-5);
    }

    #[test]
    fn test_release_emits_final_zero_pull() {
        let (mut rig, bus) = rig(SensingMode::Discrete);
        rig.place_arrow(arrow(1)).expect("empty rig");
        rig.grab_string(HandId::RIGHT, &pulled(0.4));
        rig.release_string(&PoseFrame::at(0.1));

        assert_eq!(pull_events(&bus).last().copied(), Some(0.0));
    }

    #[test]
    fn test_remove_arrow_from_any_state_returns_idle() {
        for setup in 0..3 {
            let (mut rig, _bus) = rig(SensingMode::Discrete);
            if setup >= 1 {
                rig.place_arrow(arrow(1)).expect("empty rig");
            }
            if setup >= 2 {
                rig.grab_string(HandId::RIGHT, &pulled(0.5));
                assert_eq!(rig.state(), RigState::Drawing);
            }

            let outcome = rig.remove_arrow();
            assert_eq!(rig.state(), RigState::Idle);
            assert_eq!(rig.pull().strength, 0.0);
            assert_eq!(matches!(outcome, RigOutcome::Dropped(_)), setup >= 1);
            if let RigOutcome::Dropped(arrow) = outcome {
                assert_eq!(arrow.mode(), KinematicMode::Held);
            }
        }
    }

    #[test]
    fn test_lost_hand_mid_draw_drops() {
        let (mut rig, bus) = rig(SensingMode::Discrete);
        rig.place_arrow(arrow(1)).expect("empty rig");
        rig.grab_string(HandId::RIGHT, &pulled(0.4));
        bus.drain();

        let outcome = rig.tick(&PoseFrame::at(0.1).with_hand(HandId::LEFT, Vec3::ZERO));
        assert!(matches!(outcome, RigOutcome::Dropped(_)));
        assert_eq!(rig.state(), RigState::Idle);
        assert!(!bus
            .drain()
            .iter()
            .any(|n| matches!(n, Notification::ArrowLaunched { .. })));
    }

    #[test]
    fn test_string_curve_round_trip() {
        let (mut rig, _bus) = rig(SensingMode::Discrete);
        assert!(rig.reset_bow_string());
        assert_eq!(rig.string_curve().point_count(), 2);

        rig.place_arrow(arrow(1)).expect("empty rig");
        rig.grab_string(HandId::RIGHT, &pulled(0.45));
        let drawing = rig.string_curve();
        assert_eq!(drawing.point_count(), 3);
        assert!(!rig.reset_bow_string());

        rig.release_string(&pulled(0.45));
        let rest: Vec<_> = rig.string_curve().collect();
        assert_eq!(rest, vec![Vec3::new(0.0, 0.7, 0.0), Vec3::new(0.0, -0.7, 0.0)]);
    }

    #[test]
    fn test_ambient_draw_and_release() {
        let (mut rig, _bus) = rig(SensingMode::Ambient);
        rig.place_arrow(arrow(1)).expect("empty rig");
        let grip = rig.pose().grip();

        // Touching the string without holding the grip does nothing.
        let touch = PoseFrame::at(0.0).with_hand(HandId::RIGHT, Vec3::new(0.0, 0.0, -0.02));
        assert_eq!(rig.tick(&touch), RigOutcome::Unchanged);

        let touch = touch.with_grip(grip);
        assert_eq!(rig.tick(&touch), RigOutcome::DrawStarted);
        assert_eq!(rig.pulling_hand(), Some(HandId::RIGHT));

        for step in 1..=6 {
            let z = -0.1 * step as f32;
            let pull = PoseFrame::at(0.1)
                .with_grip(grip)
                .with_hand(HandId::RIGHT, Vec3::new(0.0, 0.0, z));
            assert_eq!(rig.tick(&pull), RigOutcome::Unchanged);
        }
        assert_eq!(rig.state(), RigState::Drawing);

        // Past the release radius beyond the clamped string point.
        let away = PoseFrame::at(0.2)
            .with_grip(grip)
            .with_hand(HandId::RIGHT, Vec3::new(0.0, 0.0, -1.0));
        let RigOutcome::Released(launch) = rig.tick(&away) else {
            panic!("expected a launch");
        };
        assert!((launch.strength - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_ambient_hysteresis_keeps_drawing() {
        let (mut rig, _bus) = rig(SensingMode::Ambient);
        rig.place_arrow(arrow(1)).expect("empty rig");
        let grip = rig.pose().grip();
        let at = |z: f32| {
            PoseFrame::at(0.0)
                .with_grip(grip)
                .with_hand(HandId::RIGHT, Vec3::new(0.0, 0.0, z))
        };
        rig.tick(&at(0.0));
        for z in [-0.1, -0.2, -0.3, -0.4, -0.5, -0.6] {
            assert_eq!(rig.tick(&at(z)), RigOutcome::Unchanged);
        }

        // 0.1 past the clamp: outside touch radius, inside release radius.
        assert_eq!(rig.tick(&at(-0.7)), RigOutcome::Unchanged);
        assert_eq!(rig.state(), RigState::Drawing);
        assert!((rig.pull().strength - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_ambient_release_keeps_held_pull() {
        let (mut rig, bus) = rig(SensingMode::Ambient);
        rig.place_arrow(arrow(1)).expect("empty rig");
        let grip = rig.pose().grip();
        let held = Vec3::new(0.0, 0.0, -0.3);

        let at = |hand: Vec3| PoseFrame::at(0.0).with_grip(grip).with_hand(HandId::RIGHT, hand);
        assert_eq!(rig.tick(&at(Vec3::ZERO)), RigOutcome::DrawStarted);
        for hand in [Vec3::new(0.0, 0.0, -0.1), Vec3::new(0.0, 0.0, -0.2), held, held, held] {
            assert_eq!(rig.tick(&at(hand)), RigOutcome::Unchanged);
        }
        assert!((rig.pull().strength - 0.5).abs() < 1e-5);
        bus.drain();

        // Hand slides off the string sideways.
        let RigOutcome::Released(launch) = rig.tick(&at(Vec3::new(0.5, 0.0, -0.3))) else {
            panic!("expected a launch");
        };
        assert!((launch.strength - 0.5).abs() < 1e-5);
        assert!((launch.impulse.length() - 0.5 * 30.0).abs() < 1e-3);
        assert!((launch.origin - held).length() < 1e-5);
        assert!(!bus.drain().iter().any(|n| matches!(
            n,
            Notification::PullStrengthChanged { strength, .. } if *strength == 1.0
        )));
    }

    #[test]
    fn test_non_positive_max_pull_launches_with_zero_strength() {
        let bus = NotificationBus::new(64);
        let mut config = config(SensingMode::Discrete);
        config.draw.max_pull_distance = 0.0;
        let anchors = AnchorPair::new(Vec3::Y, -Vec3::Y).expect("valid chord");
        let mut rig = BowRig::new(RigId::new(2), BowPose::new(anchors, Vec3::Z), &config, bus);

        rig.place_arrow(arrow(1)).expect("empty rig");
        rig.grab_string(HandId::RIGHT, &pulled(0.5));
        let RigOutcome::Released(launch) = rig.release_string(&pulled(0.5)) else {
            panic!("expected a launch");
        };
        assert_eq!(launch.strength, 0.0);
        assert_eq!(launch.impulse, Vec3::ZERO);
    }
}
