//! Archery tuning parameters.
//!
//! One record configures every rig variant: the sensing mode and radii select
//! between discrete grab events and ambient hand proximity, so there is no
//! per-variant controller type.

use glam::Vec3;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// How a rig decides that the string is grabbed and let go.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensingMode {
    /// Explicit grab/release events from the input layer.
    #[default]
    Discrete,
    /// Hand proximity to the grip and the string, with release hysteresis.
    Ambient,
}

/// Draw and launch tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DrawConfig {
    /// Maximum pull distance from the chord midpoint.
    pub max_pull_distance: f32,
    /// Launch impulse at full draw.
    pub force_multiplier: f32,
    /// Magnitude of the spin impulse applied at launch.
    pub spin_force: f32,
    /// Fraction of the maximum pull treated as "near full draw".
    pub near_full_ratio: f32,
    /// Forward axis of a freshly created rig.
    pub forward_axis: Vec3,
}

impl Default for DrawConfig {
    fn default() -> Self {
        Self {
            max_pull_distance: 0.6,
            force_multiplier: 30.0,
            spin_force: 0.1,
            near_full_ratio: 0.95,
            forward_axis: Vec3::Z,
        }
    }
}

/// Hand sensing tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SensingConfig {
    /// Discrete events or ambient proximity.
    pub mode: SensingMode,
    /// Grip hand must be this close to the bow grip.
    pub grip_radius: f32,
    /// Draw hand must be this close to the string to start pulling.
    pub touch_radius: f32,
    /// Draw hand must move this far from the string to let go.
    pub release_hysteresis_radius: f32,
    /// Held arrow must be this close to the nock point to auto-nock.
    pub nock_radius: f32,
}

impl Default for SensingConfig {
    fn default() -> Self {
        Self {
            mode: SensingMode::Discrete,
            grip_radius: 0.12,
            touch_radius: 0.08,
            release_hysteresis_radius: 0.15,
            nock_radius: 0.1,
        }
    }
}

/// Arrow supply tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SupplyConfig {
    /// Upper bound of the arrow count (0 disables spawning entirely).
    pub max_arrows: u32,
    /// Arrows handed out when the supply is created.
    pub starting_arrows: u32,
    /// Seconds between timed spawns (0 disables timed spawning).
    pub spawn_interval: f32,
    /// Seconds of drawing before a draw-triggered spawn.
    pub pull_start_delay: f32,
    /// Whether drawing triggers a spawn at all.
    pub spawn_on_draw: bool,
}

impl Default for SupplyConfig {
    fn default() -> Self {
        Self {
            max_arrows: 10,
            starting_arrows: 10,
            spawn_interval: 2.0,
            pull_start_delay: 0.5,
            spawn_on_draw: true,
        }
    }
}

/// Axis-aligned box bounding the playable space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlayVolume {
    /// Minimum corner.
    pub min: Vec3,
    /// Maximum corner.
    pub max: Vec3,
}

impl PlayVolume {
    /// Creates a volume from two corners in any order.
    #[must_use]
    pub fn new(a: Vec3, b: Vec3) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// Checks whether a point lies inside the volume (inclusive).
    #[must_use]
    pub fn contains(&self, point: Vec3) -> bool {
        point.cmpge(self.min).all() && point.cmple(self.max).all()
    }
}

/// Flight and cleanup tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlightConfig {
    /// Gravity acceleration.
    pub gravity: Vec3,
    /// Arrow mass, converts the launch impulse into velocity.
    pub arrow_mass: f32,
    /// Travel distance after which a flying arrow is despawned.
    pub max_range: f32,
    /// Settle time between impact and despawn.
    pub impact_despawn_delay: f32,
    /// Despawn delay for arrows that left the play volume.
    pub out_of_bounds_despawn_delay: f32,
    /// Damage dealt by one arrow.
    pub arrow_damage: i32,
    /// Below this speed the arrow keeps its orientation.
    pub speed_epsilon: f32,
    /// Optional playable volume.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub play_volume: Option<PlayVolume>,
}

impl Default for FlightConfig {
    fn default() -> Self {
        Self {
            gravity: Vec3::new(0.0, -9.81, 0.0),
            arrow_mass: 1.0,
            max_range: 200.0,
            impact_despawn_delay: 5.0,
            out_of_bounds_despawn_delay: 1.0,
            arrow_damage: 10,
            speed_epsilon: 0.01,
            play_volume: None,
        }
    }
}

/// Score values per hit classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreConfig {
    /// Score for hitting an enemy.
    pub base_hit_score: u32,
    /// Score for hitting a designated target.
    pub target_hit_score: u32,
    /// Score for hitting anything else.
    pub default_hit_score: u32,
    /// Extra score when a hit destroys what it struck.
    pub destroy_bonus_score: u32,
}

impl Default for ScoreConfig {
    fn default() -> Self {
        Self {
            base_hit_score: 10,
            target_hit_score: 5,
            default_hit_score: 1,
            destroy_bonus_score: 50,
        }
    }
}

/// Complete archery configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArcheryConfig {
    /// Draw and launch.
    pub draw: DrawConfig,
    /// Hand sensing.
    pub sensing: SensingConfig,
    /// Arrow supply.
    pub supply: SupplyConfig,
    /// Flight and cleanup.
    pub flight: FlightConfig,
    /// Scoring.
    pub scoring: ScoreConfig,
}

impl ArcheryConfig {
    /// Repairs values that would break rig invariants.
    ///
    /// A non-positive `max_pull_distance` and a zero `max_arrows` are left as
    /// they are: the rig and the supply degrade on those at runtime.
    pub fn validate(&mut self) {
        let sensing = &mut self.sensing;
        if sensing.release_hysteresis_radius < sensing.touch_radius {
            warn!(
                touch = sensing.touch_radius,
                release = sensing.release_hysteresis_radius,
                "release radius below touch radius, raising it"
            );
            sensing.release_hysteresis_radius = sensing.touch_radius;
        }
        for (name, radius) in [
            ("grip_radius", &mut sensing.grip_radius),
            ("touch_radius", &mut sensing.touch_radius),
            ("nock_radius", &mut sensing.nock_radius),
        ] {
            if *radius < 0.0 {
                warn!(field = name, value = *radius, "negative radius, clamping to zero");
                *radius = 0.0;
            }
        }

        let supply = &mut self.supply;
        if supply.spawn_interval < 0.0 {
            warn!(value = supply.spawn_interval, "negative spawn interval, disabling timed spawns");
            supply.spawn_interval = 0.0;
        }
        if supply.pull_start_delay < 0.0 {
            warn!(value = supply.pull_start_delay, "negative pull start delay, clamping to zero");
            supply.pull_start_delay = 0.0;
        }
        if supply.starting_arrows > supply.max_arrows {
            warn!(
                starting = supply.starting_arrows,
                max = supply.max_arrows,
                "more starting arrows than the supply can hold"
            );
            supply.starting_arrows = supply.max_arrows;
        }

        let draw = &mut self.draw;
        if !(draw.near_full_ratio > 0.0 && draw.near_full_ratio <= 1.0) {
            warn!(value = draw.near_full_ratio, "near-full ratio outside (0, 1], resetting");
            draw.near_full_ratio = DrawConfig::default().near_full_ratio;
        }
        if draw.forward_axis.try_normalize().is_none() {
            warn!("forward axis has no direction, using +Z");
            draw.forward_axis = Vec3::Z;
        }

        let flight = &mut self.flight;
        if flight.arrow_mass <= 0.0 {
            warn!(value = flight.arrow_mass, "non-positive arrow mass, using 1.0");
            flight.arrow_mass = 1.0;
        }
        for (name, delay) in [
            ("impact_despawn_delay", &mut flight.impact_despawn_delay),
            ("out_of_bounds_despawn_delay", &mut flight.out_of_bounds_despawn_delay),
        ] {
            if *delay < 0.0 {
                warn!(field = name, value = *delay, "negative delay, clamping to zero");
                *delay = 0.0;
            }
        }
    }
}
