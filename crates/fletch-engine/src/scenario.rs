//! Scripted practice range.
//!
//! A [`ScriptedArcher`] stands in for the tracked hands: it turns the bow
//! toward the nearest live target, nocks, draws over a fixed number of ticks,
//! holds, lets go and rests, then starts over. [`RangeSession`] owns the
//! archery core, feeds it the archer's pose frames and tallies a summary.

use std::fmt;
use std::sync::Arc;

use glam::Vec3;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use fletch_common::{EntityId, FletchResult, HandId, RigId};
use fletch_gameplay::{
    AnchorPair, ArcheryConfig, ArcherySystem, BowPose, DespawnReason, EnemyController, GrabEvent,
    NotificationBus, NotificationHandler, PoseFrame, RigState, SensingMode, StaticTarget,
    TickReport,
};

use crate::config::{EngineConfig, RangeLayout, ScriptedArcherConfig};
use crate::notification_log;

/// Hand the scripted archer draws with.
pub const DRAW_HAND: HandId = HandId::RIGHT;

/// How far past the release radius the hand slides off the string to let go
/// in ambient mode.
const RELEASE_MARGIN: f32 = 0.05;

// ============================================================================
// Ballistics
// ============================================================================

/// Unit launch direction that carries an arrow fired at `speed` from `start`
/// onto `target` under `gravity` (acceleration along -Y).
///
/// Returns `None` when the target is out of reach at that speed.
#[must_use]
pub fn ballistic_direction(
    start: Vec3,
    target: Vec3,
    speed: f32,
    gravity: f32,
    prefer_high_arc: bool,
) -> Option<Vec3> {
    let delta = target - start;
    if gravity <= f32::EPSILON {
        return delta.try_normalize();
    }

    let horizontal = Vec3::new(delta.x, 0.0, delta.z);
    let dist = horizontal.length();
    if dist < 0.001 {
        return delta.try_normalize();
    }

    // Solve for launch angle
    let v2 = speed * speed;
    let v4 = v2 * v2;
    let g = gravity;

    let discriminant = v4 - g * (g * dist * dist + 2.0 * delta.y * v2);
    if discriminant < 0.0 {
        return None;
    }

    let sqrt_d = discriminant.sqrt();
    let high = ((v2 + sqrt_d) / (g * dist)).atan();
    let low = ((v2 - sqrt_d) / (g * dist)).atan();
    let angle = if prefer_high_arc { high.max(low) } else { high.min(low) };

    Some(horizontal / dist * angle.cos() + Vec3::Y * angle.sin())
}

// ============================================================================
// Scripted archer
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Resting(u32),
    Aiming,
    Nocking,
    Drawing(u32),
    Holding(u32),
    Releasing,
}

/// Produces the pose frames and grab events of one archer shooting on a loop.
#[derive(Debug, Clone)]
pub struct ScriptedArcher {
    config: ScriptedArcherConfig,
    phase: Phase,
    aimed_at: Option<EntityId>,
}

impl ScriptedArcher {
    /// Creates an archer that starts by aiming.
    #[must_use]
    pub fn new(config: &ScriptedArcherConfig) -> Self {
        Self {
            config: config.clone(),
            phase: Phase::Aiming,
            aimed_at: None,
        }
    }

    /// Target of the current or last shot.
    #[must_use]
    pub const fn aimed_at(&self) -> Option<EntityId> {
        self.aimed_at
    }

    /// Bow pose facing `forward` at the archer's bow position, string upright.
    pub fn bow_pose(&self, forward: Vec3) -> FletchResult<BowPose> {
        let forward = forward.try_normalize().unwrap_or(Vec3::Z);
        let up = (Vec3::Y - forward * forward.dot(Vec3::Y))
            .try_normalize()
            .unwrap_or_else(|| forward.any_orthonormal_vector());
        let half = up * self.config.string_half_length;
        let anchors =
            AnchorPair::new(self.config.bow_position + half, self.config.bow_position - half)?;
        Ok(BowPose::new(anchors, forward))
    }

    /// Strength the arrow leaves the string with.
    #[must_use]
    pub const fn release_strength(&self) -> f32 {
        self.config.target_strength
    }

    /// Advances the script by one tick and returns what the hands do.
    pub fn step(
        &mut self,
        system: &mut ArcherySystem,
        archery: &ArcheryConfig,
        timestamp: f64,
    ) -> FletchResult<(PoseFrame, Vec<GrabEvent>)> {
        let discrete = archery.sensing.mode == SensingMode::Discrete;
        let rig_state = system.rig().state();
        let pose = *system.rig().pose();
        let nock = pose.nock_point();
        let back = -pose.forward();
        let full = archery.draw.max_pull_distance.max(0.0) * self.release_strength();

        let mut frame = PoseFrame::at(timestamp).with_grip(pose.grip());
        let mut events = Vec::new();

        match self.phase {
            Phase::Resting(0) => self.phase = Phase::Aiming,
            Phase::Resting(left) => self.phase = Phase::Resting(left - 1),
            Phase::Aiming => {
                if rig_state == RigState::Nocked {
                    self.phase = Phase::Nocking;
                } else if rig_state == RigState::Idle && system.held_count() > 0 {
                    if let Some(direction) = self.aim(system, archery) {
                        system.set_bow_pose(self.bow_pose(direction)?);
                        self.phase = Phase::Nocking;
                    }
                }
            },
            Phase::Nocking => {
                if rig_state == RigState::Nocked {
                    // Hand on the string
                    frame = frame.with_hand(DRAW_HAND, nock);
                    if discrete {
                        events.push(GrabEvent::GrabString(DRAW_HAND));
                    }
                    self.phase = Phase::Drawing(1);
                } else if rig_state == RigState::Idle && system.held_count() == 0 {
                    self.phase = Phase::Aiming;
                } else {
                    frame = frame.with_held_arrow(nock);
                    if discrete {
                        events.push(GrabEvent::NockArrow);
                    }
                }
            },
            Phase::Drawing(tick) => {
                if rig_state == RigState::Drawing {
                    let pulled = full * tick as f32 / self.config.draw_ticks as f32;
                    frame = frame.with_hand(DRAW_HAND, nock + back * pulled);
                    self.phase = if tick >= self.config.draw_ticks {
                        Phase::Holding(self.config.hold_ticks)
                    } else {
                        Phase::Drawing(tick + 1)
                    };
                } else {
                    debug!(?rig_state, "draw did not take, aiming again");
                    self.phase = Phase::Aiming;
                }
            },
            Phase::Holding(left) => {
                if rig_state == RigState::Drawing {
                    frame = frame.with_hand(DRAW_HAND, nock + back * full);
                    self.phase = if left == 0 {
                        Phase::Releasing
                    } else {
                        Phase::Holding(left - 1)
                    };
                } else {
                    self.phase = Phase::Aiming;
                }
            },
            Phase::Releasing => {
                if discrete {
                    frame = frame.with_hand(DRAW_HAND, nock + back * full);
                    events.push(GrabEvent::ReleaseString);
                } else {
                    // Slide off the string sideways from the held draw point.
                    let off = archery.sensing.release_hysteresis_radius + RELEASE_MARGIN;
                    let side = back.any_orthonormal_vector();
                    frame = frame.with_hand(DRAW_HAND, nock + back * full + side * off);
                }
                self.phase = Phase::Resting(self.config.rest_ticks);
            },
        }

        Ok((frame, events))
    }

    /// Picks the nearest live target and solves for the launch direction.
    fn aim(&mut self, system: &ArcherySystem, archery: &ArcheryConfig) -> Option<Vec3> {
        let origin = self.config.bow_position;
        let (entity, center) = system
            .targets()
            .alive()
            .map(|target| (target.id(), target.center()))
            .min_by(|a, b| origin.distance_squared(a.1).total_cmp(&origin.distance_squared(b.1)))?;

        let strength = self.release_strength();
        let speed = archery.draw.force_multiplier * strength / archery.flight.arrow_mass;
        let gravity = (-archery.flight.gravity.y).max(0.0);
        let pull = archery.draw.max_pull_distance.max(0.0) * strength;

        let solve = |start: Vec3| {
            ballistic_direction(start, center, speed, gravity, self.config.prefer_high_arc)
                .or_else(|| (center - start).try_normalize())
        };
        // The arrow leaves from the drawn string, behind the bow.
        let rough = solve(origin)?;
        let direction = solve(origin - rough * pull)?;

        if self.aimed_at != Some(entity) {
            debug!(%entity, ?center, "new target");
        }
        self.aimed_at = Some(entity);
        Some(direction)
    }
}

// ============================================================================
// Session
// ============================================================================

/// Tally of a range session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeSummary {
    /// Ticks simulated
    pub ticks: u64,
    /// Arrows that left the string
    pub arrows_fired: u32,
    /// Arrows that came off the string unfired
    pub arrows_dropped: u32,
    /// Impacts resolved
    pub hits: u32,
    /// Impacts that destroyed what they struck
    pub kills: u32,
    /// Arrows cleaned up without hitting anything
    pub misses: u32,
    /// Final score
    pub score: u64,
}

impl RangeSummary {
    /// Folds one tick into the tally.
    pub fn record(&mut self, report: &TickReport) {
        self.ticks += 1;
        self.arrows_fired += report.launches.len() as u32;
        self.arrows_dropped += report.dropped.len() as u32;
        self.hits += report.impacts.len() as u32;
        self.kills += report.impacts.iter().filter(|impact| impact.destroyed).count() as u32;
        self.misses += report
            .despawns
            .iter()
            .filter(|despawn| despawn.reason != DespawnReason::Settled)
            .count() as u32;
    }
}

impl fmt::Display for RangeSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ticks: {} fired, {} hits, {} kills, {} misses, score {}",
            self.ticks, self.arrows_fired, self.hits, self.kills, self.misses, self.score
        )
    }
}

/// Registers every range entity, targets first, with ids counting from 1.
pub fn populate_range(layout: &RangeLayout, system: &mut ArcherySystem) {
    let mut next_id = 1;
    let mut next_entity = || {
        let id = EntityId::new(next_id);
        next_id += 1;
        id
    };

    for spec in &layout.targets {
        let target = StaticTarget::new(next_entity(), spec.max_health, spec.position, spec.radius);
        system.register_target(Box::new(target));
    }
    for spec in &layout.enemies {
        let enemy = EnemyController::new(next_entity(), spec.max_health, spec.position)
            .with_velocity(spec.velocity)
            .with_radius(spec.radius);
        system.register_target(Box::new(enemy));
    }
    info!(
        targets = layout.targets.len(),
        enemies = layout.enemies.len(),
        "range populated"
    );
}

/// A scripted archer on a populated range.
#[derive(Debug)]
pub struct RangeSession {
    system: ArcherySystem,
    archer: ScriptedArcher,
    archery: ArcheryConfig,
    dt: f32,
    clock: f64,
    summary: RangeSummary,
}

impl RangeSession {
    /// Builds the archery core and the range from a validated config.
    pub fn new(config: &EngineConfig) -> FletchResult<Self> {
        config.range.check()?;
        let archer = ScriptedArcher::new(&config.archer);
        let pose = archer.bow_pose(config.archery.draw.forward_axis)?;

        let bus = NotificationBus::default();
        notification_log::attach(&bus);

        let mut system = ArcherySystem::new(RigId::new(1), pose, &config.archery, bus);
        populate_range(&config.range, &mut system);

        Ok(Self {
            system,
            archer,
            archery: config.archery.clone(),
            dt: config.tick_dt(),
            clock: 0.0,
            summary: RangeSummary::default(),
        })
    }

    /// Adds a notification subscriber.
    pub fn subscribe(&self, handler: Arc<dyn NotificationHandler>) {
        self.system.bus().subscribe(handler);
    }

    /// The archery core.
    #[must_use]
    pub const fn system(&self) -> &ArcherySystem {
        &self.system
    }

    /// The scripted archer.
    #[must_use]
    pub const fn archer(&self) -> &ScriptedArcher {
        &self.archer
    }

    /// Tally so far.
    #[must_use]
    pub const fn summary(&self) -> RangeSummary {
        self.summary
    }

    /// Simulates one tick.
    pub fn step(&mut self) -> FletchResult<TickReport> {
        let (frame, events) = self.archer.step(&mut self.system, &self.archery, self.clock)?;
        let report = self.system.tick(self.dt, &frame, &events);
        for impact in report.impacts.iter().filter(|impact| impact.destroyed) {
            self.system.remove_target(impact.entity)?;
            debug!(entity = %impact.entity, "cleared from the range");
        }

        // Subscribers already saw everything; keep the queue from filling up.
        self.system.bus().drain();

        self.clock += f64::from(self.dt);
        self.summary.record(&report);
        self.summary.score = self.system.score();
        Ok(report)
    }

    /// Simulates `ticks` ticks and returns the tally.
    pub fn run(&mut self, ticks: u64) -> FletchResult<RangeSummary> {
        for _ in 0..ticks {
            self.step()?;
        }
        Ok(self.summary)
    }
}
