//! Arrow flight.
//!
//! A launched arrow becomes a [`Projectile`]: it integrates impulse plus
//! gravity, turns its nose along its velocity, and impacts at most once.
//! [`FlightSystem`] owns every projectile after launch and runs the two
//! cleanup paths:
//! - range: past `max_range` the arrow is despawned on the spot
//! - delay: after an impact (settle delay) or on leaving the play volume
//!   (shorter delay) a despawn is scheduled on the tick clock

use std::collections::{BTreeMap, HashMap};

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use fletch_common::{ArcheryError, ArcheryResult, ArrowId, EntityId};

use crate::bow_rig::Launch;
use crate::config::FlightConfig;
use crate::events::{DespawnReason, Notification, NotificationBus};
use crate::nock::{Arrow, KinematicMode};
use crate::schedule::{TaskHandle, TickScheduler};

/// Arrow nose direction in its local frame.
pub const ARROW_FORWARD: Vec3 = Vec3::Z;

/// Projectile lifecycle after launch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProjectileState {
    /// Physics driven.
    Flying,
    /// Frozen at its contact point.
    Impacted,
    /// Removed from the simulation.
    Despawned(DespawnReason),
}

/// First contact of a projectile.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Impact {
    /// Arrow that struck.
    pub arrow: ArrowId,
    /// Entity struck.
    pub entity: EntityId,
    /// Contact point.
    pub point: Vec3,
    /// Contact normal.
    pub normal: Vec3,
    /// Damage the arrow carries.
    pub damage: i32,
}

/// A launched arrow.
#[derive(Debug, Clone)]
pub struct Projectile {
    arrow: Arrow,
    state: ProjectileState,
    position: Vec3,
    previous_position: Vec3,
    velocity: Vec3,
    orientation: Quat,
    angular_velocity: Vec3,
    launch_point: Vec3,
    distance_traveled: f32,
}

impl Projectile {
    /// Turns a launch into a flying projectile.
    ///
    /// Impulses are converted to velocities by `mass`; non-positive masses
    /// are treated as 1.
    #[must_use]
    pub fn from_launch(launch: Launch, mass: f32) -> Self {
        let mass = if mass > 0.0 { mass } else { 1.0 };
        let mut arrow = launch.arrow;
        arrow.set_mode(KinematicMode::Flying);
        Self {
            arrow,
            state: ProjectileState::Flying,
            position: launch.origin,
            previous_position: launch.origin,
            velocity: launch.impulse / mass,
            orientation: launch
                .direction
                .try_normalize()
                .map_or(Quat::IDENTITY, |direction| {
                    Quat::from_rotation_arc(ARROW_FORWARD, direction)
                }),
            angular_velocity: launch.spin / mass,
            launch_point: launch.origin,
            distance_traveled: 0.0,
        }
    }

    /// The arrow being flown.
    #[must_use]
    pub const fn arrow(&self) -> &Arrow {
        &self.arrow
    }

    /// Arrow identifier.
    #[must_use]
    pub const fn id(&self) -> ArrowId {
        self.arrow.id()
    }

    /// Lifecycle state.
    #[must_use]
    pub const fn state(&self) -> ProjectileState {
        self.state
    }

    /// Checks whether the projectile is still in free flight.
    #[must_use]
    pub fn is_flying(&self) -> bool {
        self.state == ProjectileState::Flying
    }

    /// Current position.
    #[must_use]
    pub const fn position(&self) -> Vec3 {
        self.position
    }

    /// Position at the start of the last integration step.
    #[must_use]
    pub const fn previous_position(&self) -> Vec3 {
        self.previous_position
    }

    /// Current velocity.
    #[must_use]
    pub const fn velocity(&self) -> Vec3 {
        self.velocity
    }

    /// Current orientation; [`ARROW_FORWARD`] rotated by it is the nose.
    #[must_use]
    pub const fn orientation(&self) -> Quat {
        self.orientation
    }

    /// Spin from launch.
    #[must_use]
    pub const fn angular_velocity(&self) -> Vec3 {
        self.angular_velocity
    }

    /// Where the arrow left the string.
    #[must_use]
    pub const fn launch_point(&self) -> Vec3 {
        self.launch_point
    }

    /// Path length flown since launch.
    #[must_use]
    pub const fn distance_traveled(&self) -> f32 {
        self.distance_traveled
    }

    /// Integrates one step of gravity flight. No-op unless flying.
    pub fn integrate(&mut self, dt: f32, gravity: Vec3, speed_epsilon: f32) {
        if !self.is_flying() {
            return;
        }

        self.velocity += gravity * dt;
        self.previous_position = self.position;
        self.position += self.velocity * dt;
        self.distance_traveled += self.position.distance(self.previous_position);

        // Nose follows velocity; at near-zero speed keep the last heading.
        let speed = self.velocity.length();
        if speed > speed_epsilon {
            self.orientation = Quat::from_rotation_arc(ARROW_FORWARD, self.velocity / speed);
        }
    }

    /// Records the first contact. Later contacts are ignored and return `None`.
    pub fn on_impact(&mut self, entity: EntityId, point: Vec3, normal: Vec3) -> Option<Impact> {
        if !self.is_flying() {
            trace!(arrow = %self.id(), state = ?self.state, "duplicate contact ignored");
            return None;
        }

        self.state = ProjectileState::Impacted;
        self.arrow.set_mode(KinematicMode::Impacted);
        self.position = point;
        self.previous_position = point;
        self.velocity = Vec3::ZERO;
        self.angular_velocity = Vec3::ZERO;

        Some(Impact {
            arrow: self.id(),
            entity,
            point,
            normal,
            damage: self.arrow.damage(),
        })
    }

    /// Removes the projectile from the simulation. Returns `false` if it was already gone.
    pub fn despawn(&mut self, reason: DespawnReason) -> bool {
        if matches!(self.state, ProjectileState::Despawned(_)) {
            return false;
        }
        self.state = ProjectileState::Despawned(reason);
        true
    }
}

/// Where a swept segment first touches a sphere.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SweepHit {
    /// Fraction along the segment, in `[0, 1]`.
    pub t: f32,
    /// Contact point.
    pub point: Vec3,
    /// Outward sphere normal at the contact point.
    pub normal: Vec3,
}

/// First intersection of the segment `start..end` with a sphere.
#[must_use]
pub fn sweep_sphere(start: Vec3, end: Vec3, center: Vec3, radius: f32) -> Option<SweepHit> {
    let offset = start - center;
    let c = offset.length_squared() - radius * radius;
    if c <= 0.0 {
        return Some(SweepHit {
            t: 0.0,
            point: start,
            normal: offset.try_normalize().unwrap_or(Vec3::Y),
        });
    }

    let segment = end - start;
    let a = segment.length_squared();
    if a <= f32::EPSILON {
        return None;
    }
    let b = offset.dot(segment);
    let discriminant = b * b - a * c;
    if discriminant < 0.0 {
        return None;
    }

    let t = (-b - discriminant.sqrt()) / a;
    if !(0.0..=1.0).contains(&t) {
        return None;
    }
    let point = start + segment * t;
    Some(SweepHit {
        t,
        point,
        normal: (point - center).try_normalize().unwrap_or(Vec3::Y),
    })
}

/// A projectile that left the simulation this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Despawn {
    /// Arrow removed.
    pub arrow: ArrowId,
    /// Why.
    pub reason: DespawnReason,
}

/// Owns every launched arrow until it despawns.
#[derive(Debug)]
pub struct FlightSystem {
    config: FlightConfig,
    projectiles: BTreeMap<ArrowId, Projectile>,
    despawns: TickScheduler<Despawn>,
    pending: HashMap<ArrowId, TaskHandle>,
    bus: NotificationBus,
}

impl FlightSystem {
    /// Creates an empty flight system.
    #[must_use]
    pub fn new(config: &FlightConfig, bus: NotificationBus) -> Self {
        Self {
            config: config.clone(),
            projectiles: BTreeMap::new(),
            despawns: TickScheduler::new(),
            pending: HashMap::new(),
            bus,
        }
    }

    /// Flight tuning in use.
    #[must_use]
    pub const fn config(&self) -> &FlightConfig {
        &self.config
    }

    /// Takes ownership of a launched arrow.
    pub fn launch(&mut self, launch: Launch) -> ArrowId {
        let projectile = Projectile::from_launch(launch, self.config.arrow_mass);
        let id = projectile.id();
        debug!(arrow = %id, velocity = ?projectile.velocity(), "projectile spawned");
        self.projectiles.insert(id, projectile);
        id
    }

    /// Looks up a projectile.
    #[must_use]
    pub fn get(&self, arrow: ArrowId) -> Option<&Projectile> {
        self.projectiles.get(&arrow)
    }

    /// All live projectiles in arrow id order.
    pub fn iter(&self) -> impl Iterator<Item = &Projectile> {
        self.projectiles.values()
    }

    /// Number of projectiles still in free flight.
    #[must_use]
    pub fn flying_count(&self) -> usize {
        self.projectiles.values().filter(|p| p.is_flying()).count()
    }

    /// Number of live projectiles, flying or impacted.
    #[must_use]
    pub fn len(&self) -> usize {
        self.projectiles.len()
    }

    /// Checks whether no projectile is live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.projectiles.is_empty()
    }

    /// Checks whether a despawn is scheduled for an arrow.
    #[must_use]
    pub fn is_despawn_pending(&self, arrow: ArrowId) -> bool {
        self.pending.contains_key(&arrow)
    }

    /// Applies a contact report to a projectile.
    ///
    /// The first contact freezes the arrow, schedules the settle despawn and
    /// returns the impact. Later contacts return `Ok(None)`.
    pub fn on_impact(
        &mut self,
        arrow: ArrowId,
        entity: EntityId,
        point: Vec3,
        normal: Vec3,
    ) -> ArcheryResult<Option<Impact>> {
        let projectile = self
            .projectiles
            .get_mut(&arrow)
            .ok_or(ArcheryError::UnknownProjectile(arrow))?;
        let Some(impact) = projectile.on_impact(entity, point, normal) else {
            return Ok(None);
        };

        debug!(arrow = %arrow, entity = %entity, "arrow impacted");
        self.bus.publish(Notification::ArrowImpacted {
            arrow,
            entity,
            point,
            normal,
        });
        self.schedule_despawn(arrow, self.config.impact_despawn_delay, DespawnReason::Settled);
        Ok(Some(impact))
    }

    /// Schedules the short despawn for an arrow that left the view.
    ///
    /// Returns `false` if the arrow is not flying or already has a despawn pending.
    pub fn mark_out_of_view(&mut self, arrow: ArrowId) -> bool {
        let flying = self.projectiles.get(&arrow).is_some_and(Projectile::is_flying);
        if !flying || self.pending.contains_key(&arrow) {
            return false;
        }
        let delay = self.config.out_of_bounds_despawn_delay;
        self.schedule_despawn(arrow, delay, DespawnReason::OutOfBounds);
        true
    }

    /// Integrates every flying projectile and runs both cleanup paths.
    pub fn update(&mut self, dt: f32) -> Vec<Despawn> {
        let mut despawned = self.despawns.advance(dt);
        let mut left_volume = Vec::new();

        for projectile in self.projectiles.values_mut() {
            if !projectile.is_flying() {
                continue;
            }
            projectile.integrate(dt, self.config.gravity, self.config.speed_epsilon);

            if self.config.max_range > 0.0
                && projectile.distance_traveled() > self.config.max_range
            {
                despawned.push(Despawn {
                    arrow: projectile.id(),
                    reason: DespawnReason::OutOfRange,
                });
            } else if let Some(volume) = &self.config.play_volume {
                if !volume.contains(projectile.position()) {
                    left_volume.push(projectile.id());
                }
            }
        }

        for arrow in left_volume {
            if self.mark_out_of_view(arrow) {
                trace!(arrow = %arrow, "left play volume");
            }
        }

        despawned.retain(|despawn| self.remove(*despawn));
        despawned
    }

    /// Drops every projectile and pending despawn without notifications.
    pub fn clear(&mut self) {
        self.projectiles.clear();
        self.despawns.clear();
        self.pending.clear();
    }

    fn schedule_despawn(&mut self, arrow: ArrowId, delay: f32, reason: DespawnReason) {
        if let Some(previous) = self.pending.remove(&arrow) {
            self.despawns.cancel(previous);
        }
        let handle = self.despawns.schedule(delay, Despawn { arrow, reason });
        self.pending.insert(arrow, handle);
    }

    fn remove(&mut self, despawn: Despawn) -> bool {
        let Some(mut projectile) = self.projectiles.remove(&despawn.arrow) else {
            return false;
        };
        if let Some(handle) = self.pending.remove(&despawn.arrow) {
            self.despawns.cancel(handle);
        }
        projectile.despawn(despawn.reason);

        debug!(arrow = %despawn.arrow, reason = ?despawn.reason, "projectile despawned");
        self.bus.publish(Notification::ArrowDespawned {
            arrow: despawn.arrow,
            reason: despawn.reason,
        });
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PlayVolume;
    use fletch_common::RigId;

    fn launch(id: u64, impulse: Vec3) -> Launch {
        let mut arrow = Arrow::new(ArrowId::new(id), 10);
        arrow.set_mode(KinematicMode::Flying);
        Launch {
            rig: RigId::new(1),
            arrow,
            origin: Vec3::ZERO,
            direction: impulse.normalize_or_zero(),
            impulse,
            spin: Vec3::X * 0.1,
            strength: 1.0,
        }
    }

    fn no_gravity() -> FlightConfig {
        FlightConfig {
            gravity: Vec3::ZERO,
            ..FlightConfig::default()
        }
    }

    #[test]
    fn test_gravity_bends_trajectory() {
        let mut projectile = Projectile::from_launch(launch(1, Vec3::Z * 30.0), 1.0);
        projectile.integrate(0.1, Vec3::new(0.0, -9.81, 0.0), 0.01);

        assert!(projectile.position().z > 2.9);
        assert!(projectile.position().y < 0.0);
        let nose = projectile.orientation() * ARROW_FORWARD;
        assert!((nose - projectile.velocity().normalize()).length() < 1e-4);
    }

    #[test]
    fn test_slow_arrow_keeps_orientation() {
        let mut projectile = Projectile::from_launch(launch(1, Vec3::Z * 30.0), 1.0);
        let before = projectile.orientation();
        // Cancel the velocity almost entirely.
        projectile.integrate(1.0, Vec3::new(0.0, 0.0, -29.999), 0.01);
        assert_eq!(projectile.orientation(), before);
    }

    #[test]
    fn test_second_impact_is_noop() {
        let mut projectile = Projectile::from_launch(launch(1, Vec3::Z * 30.0), 1.0);
        let first = projectile.on_impact(EntityId::new(7), Vec3::Z, -Vec3::Z);
        assert_eq!(first.map(|impact| impact.damage), Some(10));
        assert_eq!(projectile.state(), ProjectileState::Impacted);
        assert!(projectile.arrow().has_impacted());

        assert!(projectile.on_impact(EntityId::new(8), Vec3::X, Vec3::Y).is_none());
        assert_eq!(projectile.position(), Vec3::Z);
    }

    #[test]
    fn test_sweep_sphere_hits_front_face() {
        let hit = sweep_sphere(Vec3::ZERO, Vec3::Z * 10.0, Vec3::Z * 5.0, 1.0).expect("hit");
        assert!((hit.point - Vec3::Z * 4.0).length() < 1e-5);
        assert!((hit.normal + Vec3::Z).length() < 1e-5);
        assert!((hit.t - 0.4).abs() < 1e-5);
    }

    #[test]
    fn test_sweep_sphere_misses() {
        assert!(sweep_sphere(Vec3::ZERO, Vec3::Z * 3.0, Vec3::Z * 5.0, 1.0).is_none());
        assert!(sweep_sphere(Vec3::ZERO, Vec3::Z * 10.0, Vec3::new(3.0, 0.0, 5.0), 1.0).is_none());
    }

    #[test]
    fn test_out_of_range_despawns_immediately() {
        let bus = NotificationBus::new(64);
        let config = FlightConfig {
            max_range: 5.0,
            ..no_gravity()
        };
        let mut flight = FlightSystem::new(&config, bus.clone());
        flight.launch(launch(1, Vec3::Z * 10.0));

        assert!(flight.update(0.25).is_empty());
        let despawned = flight.update(0.5);
        assert_eq!(
            despawned,
            vec![Despawn {
                arrow: ArrowId::new(1),
                reason: DespawnReason::OutOfRange,
            }]
        );
        assert!(flight.is_empty());
        assert!(!bus
            .drain()
            .iter()
            .any(|n| matches!(n, Notification::ArrowImpacted { .. })));
    }

    #[test]
    fn test_impact_schedules_settle_despawn() {
        let bus = NotificationBus::new(64);
        let mut flight = FlightSystem::new(&no_gravity(), bus.clone());
        let id = flight.launch(launch(1, Vec3::Z * 10.0));

        let impact = flight
            .on_impact(id, EntityId::new(3), Vec3::Z, -Vec3::Z)
            .expect("known projectile");
        assert!(impact.is_some());
        assert!(flight.is_despawn_pending(id));
        assert_eq!(flight.on_impact(id, EntityId::new(3), Vec3::Z, -Vec3::Z), Ok(None));

        assert!(flight.update(4.0).is_empty());
        assert_eq!(flight.get(id).map(Projectile::position), Some(Vec3::Z));
        let despawned = flight.update(1.0);
        assert_eq!(despawned[0].reason, DespawnReason::Settled);
        assert!(flight.get(id).is_none());
    }

    #[test]
    fn test_unknown_projectile_contact_is_error() {
        let mut flight = FlightSystem::new(&no_gravity(), NotificationBus::new(8));
        let result = flight.on_impact(ArrowId::new(9), EntityId::new(1), Vec3::ZERO, Vec3::Y);
        assert_eq!(result, Err(ArcheryError::UnknownProjectile(ArrowId::new(9))));
    }

    #[test]
    fn test_leaving_play_volume_uses_short_delay() {
        let config = FlightConfig {
            play_volume: Some(PlayVolume::new(Vec3::splat(-2.0), Vec3::splat(2.0))),
            out_of_bounds_despawn_delay: 0.5,
            ..no_gravity()
        };
        let mut flight = FlightSystem::new(&config, NotificationBus::new(64));
        let id = flight.launch(launch(1, Vec3::Z * 10.0));

        assert!(flight.update(0.25).is_empty());
        assert!(flight.is_despawn_pending(id));
        assert!(flight.update(0.25).is_empty());
        let despawned = flight.update(0.25);
        assert_eq!(despawned[0].reason, DespawnReason::OutOfBounds);
    }

    #[test]
    fn test_mark_out_of_view_only_for_flying() {
        let mut flight = FlightSystem::new(&no_gravity(), NotificationBus::new(64));
        let id = flight.launch(launch(1, Vec3::Z));

        assert!(flight.mark_out_of_view(id));
        assert!(!flight.mark_out_of_view(id));
        assert!(!flight.mark_out_of_view(ArrowId::new(42)));

        // An impact replaces the short despawn with the settle delay.
        assert!(flight
            .on_impact(id, EntityId::new(2), Vec3::ZERO, Vec3::Y)
            .expect("known")
            .is_some());
        assert!(flight.update(1.5).is_empty());
        assert!(flight.get(id).is_some());
    }
}
