//! Impact resolution: turns "arrow hit entity" into damage, score and
//! notifications.
//!
//! The resolver is a stateless rule table. It never owns the struck entity;
//! it only calls the entity's [`Damageable`] capability when there is one.
//! A projectile impacts at most once, so the resolver is invoked at most once
//! per arrow.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use fletch_common::{ArrowId, EntityId};

use crate::config::ScoreConfig;
use crate::damage::{Damageable, DamageReport, TargetClass};
use crate::events::{Notification, NotificationBus};
use crate::projectile::Impact;
use crate::score::ScoreLedger;

/// The entity an arrow struck, as seen by the resolver.
pub struct ContactedEntity<'a> {
    /// Entity identifier.
    pub id: EntityId,
    /// Scoring classification.
    pub class: TargetClass,
    /// Damage capability, if the entity has one.
    pub damageable: Option<&'a mut dyn Damageable>,
}

impl<'a> ContactedEntity<'a> {
    /// An entity with a damage capability.
    pub fn damageable(
        id: EntityId,
        class: TargetClass,
        damageable: &'a mut dyn Damageable,
    ) -> Self {
        Self {
            id,
            class,
            damageable: Some(damageable),
        }
    }

    /// An unclassified entity without health.
    #[must_use]
    pub fn other(id: EntityId) -> Self {
        Self {
            id,
            class: TargetClass::Other,
            damageable: None,
        }
    }
}

/// What one impact did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImpactOutcome {
    /// Arrow that struck.
    pub arrow: ArrowId,
    /// Entity struck.
    pub entity: EntityId,
    /// Classification used for scoring.
    pub class: TargetClass,
    /// Damage result, `None` for entities without health.
    pub damage: Option<DamageReport>,
    /// Score added by this impact.
    pub score_delta: u32,
    /// This impact destroyed the entity.
    pub destroyed: bool,
}

/// Score and damage rules for impacts.
#[derive(Debug, Clone)]
pub struct ImpactResolver {
    scoring: ScoreConfig,
    bus: NotificationBus,
}

impl ImpactResolver {
    /// Creates a resolver publishing to `bus`.
    #[must_use]
    pub fn new(scoring: &ScoreConfig, bus: NotificationBus) -> Self {
        Self {
            scoring: scoring.clone(),
            bus,
        }
    }

    /// Base score for hitting an entity of `class`.
    #[must_use]
    pub const fn base_score(&self, class: TargetClass) -> u32 {
        match class {
            TargetClass::Enemy => self.scoring.base_hit_score,
            TargetClass::Target => self.scoring.target_hit_score,
            TargetClass::Other => self.scoring.default_hit_score,
        }
    }

    /// Applies one impact: base score, damage, and the destroy bonus when this
    /// hit moved the entity from alive to destroyed.
    pub fn resolve(
        &self,
        impact: &Impact,
        entity: ContactedEntity<'_>,
        ledger: &mut ScoreLedger,
    ) -> ImpactOutcome {
        let mut score_delta = self.base_score(entity.class);

        let damage = entity.damageable.map(|target| target.take_damage(impact.damage));
        let destroyed = damage.is_some_and(|report| report.destroyed_now);
        if destroyed {
            score_delta = score_delta.saturating_add(self.scoring.destroy_bonus_score);
            info!(entity = %entity.id, arrow = %impact.arrow, "target destroyed");
            self.bus.publish(Notification::TargetDestroyed { entity: entity.id });
        } else {
            let applied = damage.map_or(0, |report| report.applied);
            debug!(entity = %entity.id, arrow = %impact.arrow, damage = applied, "target hit");
            self.bus.publish(Notification::TargetHit {
                entity: entity.id,
                damage: applied,
            });
        }

        if score_delta > 0 {
            let total = ledger.add_score(score_delta);
            self.bus.publish(Notification::ScoreChanged { total });
        }

        ImpactOutcome {
            arrow: impact.arrow,
            entity: entity.id,
            class: entity.class,
            damage,
            score_delta,
            destroyed,
        }
    }
}
