//! Damage capability and the entities arrows can strike.

use std::collections::BTreeMap;
use std::fmt;

use glam::Vec3;
use serde::{Deserialize, Serialize};
use tracing::debug;

use fletch_common::EntityId;

/// Scoring classification of a struck entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetClass {
    /// Hostile actor.
    Enemy,
    /// Designated practice target.
    Target,
    /// Anything else (walls, props).
    Other,
}

/// Result of one `take_damage` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DamageReport {
    /// Health actually removed.
    pub applied: i32,
    /// Health left after the call.
    pub remaining: i32,
    /// This call moved the entity from alive to destroyed.
    pub destroyed_now: bool,
}

/// Anything that can take damage and be destroyed once.
pub trait Damageable {
    /// Current health, never below zero.
    fn current_health(&self) -> i32;

    /// Maximum health.
    fn max_health(&self) -> i32;

    /// Removes health, clamping at zero.
    fn take_damage(&mut self, amount: i32) -> DamageReport;

    /// Checks whether health has reached zero.
    fn is_destroyed(&self) -> bool {
        self.current_health() <= 0
    }
}

/// Health pool with a one-time destruction transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Health {
    current: i32,
    max: i32,
}

impl Health {
    /// Creates a full health pool. Negative maxima are treated as zero.
    #[must_use]
    pub fn new(max: i32) -> Self {
        let max = max.max(0);
        Self { current: max, max }
    }

    /// Current health.
    #[must_use]
    pub const fn current(&self) -> i32 {
        self.current
    }

    /// Maximum health.
    #[must_use]
    pub const fn max(&self) -> i32 {
        self.max
    }

    /// Health as a fraction of the maximum.
    #[must_use]
    pub fn fraction(&self) -> f32 {
        if self.max == 0 {
            0.0
        } else {
            self.current as f32 / self.max as f32
        }
    }

    /// Restores full health.
    pub fn reset(&mut self) {
        self.current = self.max;
    }

    /// Removes up to `amount` health. Negative amounts do nothing.
    pub fn apply(&mut self, amount: i32) -> DamageReport {
        let was_alive = self.current > 0;
        let applied = amount.clamp(0, self.current);
        self.current -= applied;
        DamageReport {
            applied,
            remaining: self.current,
            destroyed_now: was_alive && self.current == 0,
        }
    }
}

/// An entity registered with the archery system.
pub trait ArcheryTarget: Damageable + fmt::Debug + Send + Sync {
    /// Entity identifier.
    fn id(&self) -> EntityId;

    /// Scoring classification.
    fn class(&self) -> TargetClass;

    /// Centre of the hit sphere.
    fn center(&self) -> Vec3;

    /// Radius of the hit sphere.
    fn radius(&self) -> f32;

    /// Advances any motion by `dt` seconds.
    fn tick(&mut self, _dt: f32) {}

    /// This target as its damage capability.
    fn as_damageable(&mut self) -> &mut dyn Damageable;
}

// ============================================================================
// Enemy
// ============================================================================

/// A hostile actor that walks at a fixed velocity until destroyed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnemyController {
    id: EntityId,
    health: Health,
    position: Vec3,
    velocity: Vec3,
    radius: f32,
}

impl EnemyController {
    /// Creates a stationary enemy.
    #[must_use]
    pub fn new(id: EntityId, max_health: i32, position: Vec3) -> Self {
        Self {
            id,
            health: Health::new(max_health),
            position,
            velocity: Vec3::ZERO,
            radius: 0.5,
        }
    }

    /// Sets the walking velocity.
    #[must_use]
    pub fn with_velocity(mut self, velocity: Vec3) -> Self {
        self.velocity = velocity;
        self
    }

    /// Sets the hit radius.
    #[must_use]
    pub fn with_radius(mut self, radius: f32) -> Self {
        self.radius = radius.max(0.0);
        self
    }

    /// Current position.
    #[must_use]
    pub const fn position(&self) -> Vec3 {
        self.position
    }

    /// Health pool.
    #[must_use]
    pub const fn health(&self) -> &Health {
        &self.health
    }
}

impl Damageable for EnemyController {
    fn current_health(&self) -> i32 {
        self.health.current()
    }

    fn max_health(&self) -> i32 {
        self.health.max()
    }

    fn take_damage(&mut self, amount: i32) -> DamageReport {
        let report = self.health.apply(amount);
        if report.destroyed_now {
            debug!(entity = %self.id, "enemy destroyed");
            self.velocity = Vec3::ZERO;
        }
        report
    }
}

impl ArcheryTarget for EnemyController {
    fn id(&self) -> EntityId {
        self.id
    }

    fn class(&self) -> TargetClass {
        TargetClass::Enemy
    }

    fn center(&self) -> Vec3 {
        self.position
    }

    fn radius(&self) -> f32 {
        self.radius
    }

    fn tick(&mut self, dt: f32) {
        if !self.is_destroyed() {
            self.position += self.velocity * dt;
        }
    }

    fn as_damageable(&mut self) -> &mut dyn Damageable {
        self
    }
}

// ============================================================================
// Static target
// ============================================================================

/// A fixed practice target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StaticTarget {
    id: EntityId,
    health: Health,
    position: Vec3,
    radius: f32,
}

impl StaticTarget {
    /// Creates a target with a hit sphere.
    #[must_use]
    pub fn new(id: EntityId, max_health: i32, position: Vec3, radius: f32) -> Self {
        Self {
            id,
            health: Health::new(max_health),
            position,
            radius: radius.max(0.0),
        }
    }

    /// Health pool.
    #[must_use]
    pub const fn health(&self) -> &Health {
        &self.health
    }
}

impl Damageable for StaticTarget {
    fn current_health(&self) -> i32 {
        self.health.current()
    }

    fn max_health(&self) -> i32 {
        self.health.max()
    }

    fn take_damage(&mut self, amount: i32) -> DamageReport {
        self.health.apply(amount)
    }
}

impl ArcheryTarget for StaticTarget {
    fn id(&self) -> EntityId {
        self.id
    }

    fn class(&self) -> TargetClass {
        TargetClass::Target
    }

    fn center(&self) -> Vec3 {
        self.position
    }

    fn radius(&self) -> f32 {
        self.radius
    }

    fn as_damageable(&mut self) -> &mut dyn Damageable {
        self
    }
}

// ============================================================================
// Registry
// ============================================================================

/// Entities the built-in contact detection can hit, keyed by id.
#[derive(Debug, Default)]
pub struct TargetRegistry {
    targets: BTreeMap<EntityId, Box<dyn ArcheryTarget>>,
}

impl TargetRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a target, returning any target it replaced.
    pub fn register(&mut self, target: Box<dyn ArcheryTarget>) -> Option<Box<dyn ArcheryTarget>> {
        self.targets.insert(target.id(), target)
    }

    /// Removes a target.
    pub fn remove(&mut self, id: EntityId) -> Option<Box<dyn ArcheryTarget>> {
        self.targets.remove(&id)
    }

    /// Looks up a target.
    #[must_use]
    pub fn get(&self, id: EntityId) -> Option<&dyn ArcheryTarget> {
        self.targets.get(&id).map(|target| &**target)
    }

    /// Looks up a target mutably.
    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut (dyn ArcheryTarget + 'static)> {
        self.targets.get_mut(&id).map(|target| &mut **target)
    }

    /// All targets in id order.
    pub fn iter(&self) -> impl Iterator<Item = &dyn ArcheryTarget> {
        self.targets.values().map(|target| &**target)
    }

    /// Targets that can still be hit.
    pub fn alive(&self) -> impl Iterator<Item = &dyn ArcheryTarget> {
        self.iter().filter(|target| !target.is_destroyed())
    }

    /// Number of registered targets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    /// Checks whether nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Advances every target.
    pub fn tick(&mut self, dt: f32) {
        for target in self.targets.values_mut() {
            target.tick(dt);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_damage_clamps_at_zero_and_destroys_once() {
        let mut enemy = EnemyController::new(EntityId::new(1), 10, Vec3::ZERO);

        let first = enemy.take_damage(15);
        assert_eq!(first.applied, 10);
        assert_eq!(first.remaining, 0);
        assert!(first.destroyed_now);
        assert!(enemy.is_destroyed());

        let second = enemy.take_damage(15);
        assert_eq!(second.applied, 0);
        assert!(!second.destroyed_now);
    }

    #[test]
    fn test_negative_damage_does_not_heal() {
        let mut health = Health::new(10);
        health.apply(4);
        let report = health.apply(-5);
        assert_eq!(report.applied, 0);
        assert_eq!(health.current(), 6);
        assert!((health.fraction() - 0.6).abs() < 1e-6);
    }

    #[test]
    fn test_enemy_stops_when_destroyed() {
        let mut enemy =
            EnemyController::new(EntityId::new(1), 5, Vec3::ZERO).with_velocity(Vec3::X);
        enemy.tick(1.0);
        assert_eq!(enemy.position(), Vec3::X);

        enemy.take_damage(5);
        enemy.tick(1.0);
        assert_eq!(enemy.position(), Vec3::X);
    }

    #[test]
    fn test_registry_skips_destroyed_targets() {
        let mut registry = TargetRegistry::new();
        registry.register(Box::new(StaticTarget::new(EntityId::new(1), 20, Vec3::Z, 0.5)));
        registry.register(Box::new(EnemyController::new(EntityId::new(2), 5, Vec3::X)));
        assert_eq!(registry.len(), 2);

        registry
            .get_mut(EntityId::new(2))
            .expect("registered")
            .take_damage(5);

        let alive: Vec<_> = registry.alive().map(|target| target.id()).collect();
        assert_eq!(alive, vec![EntityId::new(1)]);
        assert_eq!(
            registry.get(EntityId::new(1)).map(|target| target.class()),
            Some(TargetClass::Target)
        );
    }
}
