//! Frame-loop wiring for one archer.
//!
//! [`ArcherySystem::tick`] advances, in order: supply timers, discrete grab
//! events, the rig (with ambient auto-nock), the rig's outcome, flight and
//! cleanup, and finally contact detection with impact resolution. Everything
//! completes within the tick.

use std::collections::VecDeque;

use glam::Vec3;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use fletch_common::{ArcheryError, ArcheryResult, ArrowId, EntityId, RigId};

use crate::bow_rig::{BowPose, BowRig, RigOutcome, RigState};
use crate::config::{ArcheryConfig, SensingMode};
use crate::damage::{ArcheryTarget, TargetRegistry};
use crate::events::NotificationBus;
use crate::impact::{ContactedEntity, ImpactOutcome, ImpactResolver};
use crate::input::{GrabEvent, PoseFrame};
use crate::nock::Arrow;
use crate::projectile::{sweep_sphere, Despawn, FlightSystem};
use crate::score::ScoreLedger;
use crate::supply::ArrowSupply;

/// A launch seen by the host.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LaunchReport {
    /// Rig that fired.
    pub rig: RigId,
    /// Arrow fired.
    pub arrow: ArrowId,
    /// Strength at release.
    pub strength: f32,
    /// Linear launch impulse.
    pub impulse: Vec3,
}

/// Everything that happened in one tick.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TickReport {
    /// Arrows the supply produced.
    pub spawned: Vec<ArrowId>,
    /// Arrows that left the string.
    pub launches: Vec<LaunchReport>,
    /// Arrows that came off the string unfired.
    pub dropped: Vec<ArrowId>,
    /// Resolved impacts.
    pub impacts: Vec<ImpactOutcome>,
    /// Projectiles removed.
    pub despawns: Vec<Despawn>,
}

impl TickReport {
    /// Checks whether nothing happened.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.spawned.is_empty()
            && self.launches.is_empty()
            && self.dropped.is_empty()
            && self.impacts.is_empty()
            && self.despawns.is_empty()
    }
}

/// One archer: a bow rig, its arrows in hand and in flight, the targets they
/// can hit, and the score.
#[derive(Debug)]
pub struct ArcherySystem {
    mode: SensingMode,
    rig: BowRig,
    held: VecDeque<Arrow>,
    supply: ArrowSupply,
    flight: FlightSystem,
    targets: TargetRegistry,
    resolver: ImpactResolver,
    score: ScoreLedger,
    bus: NotificationBus,
}

impl ArcherySystem {
    /// Creates a system and hands out the starting arrows.
    #[must_use]
    pub fn new(rig_id: RigId, pose: BowPose, config: &ArcheryConfig, bus: NotificationBus) -> Self {
        let mut supply = ArrowSupply::new(&config.supply, config.flight.arrow_damage, bus.clone());
        let held = supply.fill().into();
        Self {
            mode: config.sensing.mode,
            rig: BowRig::new(rig_id, pose, config, bus.clone()),
            held,
            supply,
            flight: FlightSystem::new(&config.flight, bus.clone()),
            targets: TargetRegistry::new(),
            resolver: ImpactResolver::new(&config.scoring, bus.clone()),
            score: ScoreLedger::new(),
            bus,
        }
    }

    /// The bow rig.
    #[must_use]
    pub const fn rig(&self) -> &BowRig {
        &self.rig
    }

    /// Arrows in hand, not yet nocked.
    #[must_use]
    pub fn held_count(&self) -> usize {
        self.held.len()
    }

    /// Arrow supply.
    #[must_use]
    pub const fn supply(&self) -> &ArrowSupply {
        &self.supply
    }

    /// Arrows after launch.
    #[must_use]
    pub const fn flight(&self) -> &FlightSystem {
        &self.flight
    }

    /// Registered targets.
    #[must_use]
    pub const fn targets(&self) -> &TargetRegistry {
        &self.targets
    }

    /// Registered targets, for adding or removing.
    pub fn targets_mut(&mut self) -> &mut TargetRegistry {
        &mut self.targets
    }

    /// Registers a target for built-in contact detection.
    pub fn register_target(&mut self, target: Box<dyn ArcheryTarget>) {
        if let Some(previous) = self.targets.register(target) {
            warn!(entity = %previous.id(), "target replaced");
        }
    }

    /// Takes a target off the range.
    pub fn remove_target(&mut self, entity: EntityId) -> ArcheryResult<Box<dyn ArcheryTarget>> {
        self.targets.remove(entity).ok_or(ArcheryError::UnknownEntity(entity))
    }

    /// Current score.
    #[must_use]
    pub const fn score(&self) -> u64 {
        self.score.total()
    }

    /// Resets the score for a new match.
    pub fn reset_score(&mut self) {
        self.score.reset();
    }

    /// Notification bus shared by every part of this system.
    #[must_use]
    pub const fn bus(&self) -> &NotificationBus {
        &self.bus
    }

    /// Moves the bow.
    pub fn set_bow_pose(&mut self, pose: BowPose) {
        self.rig.set_pose(pose);
    }

    /// Advances the whole system by one tick.
    pub fn tick(&mut self, dt: f32, frame: &PoseFrame, events: &[GrabEvent]) -> TickReport {
        let mut report = TickReport::default();

        let spawned = self.supply.tick(dt, self.rig.state() == RigState::Drawing);
        report.spawned.extend(spawned.iter().map(Arrow::id));
        self.held.extend(spawned);

        let mut draw_started = false;
        for event in events {
            let outcome = match *event {
                GrabEvent::NockArrow => {
                    self.nock_held();
                    RigOutcome::Unchanged
                },
                GrabEvent::GrabString(hand) => self.rig.grab_string(hand, frame),
                GrabEvent::ReleaseString => self.rig.release_string(frame),
                GrabEvent::RemoveArrow => self.rig.remove_arrow(),
            };
            draw_started |= outcome == RigOutcome::DrawStarted;
            self.apply_outcome(outcome, &mut report);
        }

        // A grab this tick already sampled the pull.
        if !draw_started || self.rig.state() != RigState::Drawing {
            let outcome = self.rig.tick(frame);
            self.apply_outcome(outcome, &mut report);
        }
        // Gate readings were taken against the drawn string when a launch
        // happened this tick.
        if self.mode == SensingMode::Ambient
            && report.launches.is_empty()
            && self.rig.state() == RigState::Idle
            && self.rig.gate().is_arrow_at_nock()
        {
            self.nock_held();
        }

        report.despawns = self.flight.update(dt);
        self.targets.tick(dt);
        self.detect_contacts(&mut report);

        report
    }

    /// Feeds a contact from an external physics engine.
    ///
    /// Returns `Ok(None)` for a repeated contact on an arrow that already
    /// impacted.
    pub fn report_contact(
        &mut self,
        arrow: ArrowId,
        entity: EntityId,
        point: Vec3,
        normal: Vec3,
    ) -> ArcheryResult<Option<ImpactOutcome>> {
        let Some(impact) = self.flight.on_impact(arrow, entity, point, normal)? else {
            return Ok(None);
        };

        let contacted = match self.targets.get_mut(entity) {
            Some(target) => {
                ContactedEntity::damageable(entity, target.class(), target.as_damageable())
            },
            None => ContactedEntity::other(entity),
        };
        Ok(Some(self.resolver.resolve(&impact, contacted, &mut self.score)))
    }

    /// Schedules the short despawn for an arrow the camera lost.
    pub fn mark_out_of_view(&mut self, arrow: ArrowId) -> bool {
        self.flight.mark_out_of_view(arrow)
    }

    fn nock_held(&mut self) {
        if self.rig.state() != RigState::Idle {
            trace!(state = ?self.rig.state(), "nock ignored");
            return;
        }
        let Some(arrow) = self.held.pop_front() else {
            debug!("no arrow in hand to nock");
            return;
        };
        if let Err(rejected) = self.rig.place_arrow(arrow) {
            warn!(error = %rejected.error, "nock rejected");
            self.held.push_front(rejected.arrow);
        }
    }

    fn apply_outcome(&mut self, outcome: RigOutcome, report: &mut TickReport) {
        match outcome {
            RigOutcome::Unchanged => {},
            RigOutcome::DrawStarted => self.supply.on_draw_started(),
            RigOutcome::Released(launch) => {
                self.supply.on_draw_ended();
                self.supply.consume();
                report.launches.push(LaunchReport {
                    rig: launch.rig,
                    arrow: launch.arrow.id(),
                    strength: launch.strength,
                    impulse: launch.impulse,
                });
                self.flight.launch(launch);
            },
            RigOutcome::Dropped(arrow) => {
                self.supply.on_draw_ended();
                report.dropped.push(arrow.id());
                self.held.push_front(arrow);
            },
        }
    }

    /// Sweeps each flying arrow's last step against live targets and resolves
    /// the nearest hit.
    fn detect_contacts(&mut self, report: &mut TickReport) {
        let mut contacts = Vec::new();
        for projectile in self.flight.iter().filter(|p| p.is_flying()) {
            let nearest = self
                .targets
                .alive()
                .filter_map(|target| {
                    sweep_sphere(
                        projectile.previous_position(),
                        projectile.position(),
                        target.center(),
                        target.radius(),
                    )
                    .map(|hit| (target.id(), hit))
                })
                .min_by(|a, b| a.1.t.total_cmp(&b.1.t));
            if let Some((entity, hit)) = nearest {
                contacts.push((projectile.id(), entity, hit.point, hit.normal));
            }
        }

        for (arrow, entity, point, normal) in contacts {
            match self.report_contact(arrow, entity, point, normal) {
                Ok(Some(outcome)) => report.impacts.push(outcome),
                Ok(None) => {},
                Err(error) => warn!(%error, "contact dropped"),
            }
        }
    }
}
