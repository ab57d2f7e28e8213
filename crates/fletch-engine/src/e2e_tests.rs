//! End-to-end tests for the headless host.
//!
//! These run the scripted archer against a range through the whole archery
//! core and check what a player would see: arrows leaving the string, hits,
//! kills and the score.

#![cfg(test)]

use std::collections::HashSet;
use std::sync::Arc;

use glam::Vec3;
use parking_lot::Mutex;

use fletch_common::EntityId;
use fletch_gameplay::{Notification, PlayVolume, SensingMode};

use crate::config::{EngineConfig, RangeLayout, TargetSpec};
use crate::scenario::RangeSession;

/// Session plus every notification it published.
fn recorded_session(config: &EngineConfig) -> (RangeSession, Arc<Mutex<Vec<Notification>>>) {
    let session = RangeSession::new(config).expect("session builds");
    let log = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&log);
    session.subscribe(Arc::new(move |n: &Notification| sink.lock().push(n.clone())));
    (session, log)
}

fn seconds(config: &EngineConfig, secs: f32) -> u64 {
    (secs * config.tick_rate as f32).ceil() as u64
}

fn single_target(position: Vec3) -> RangeLayout {
    RangeLayout {
        targets: vec![TargetSpec {
            position,
            ..TargetSpec::default()
        }],
        enemies: Vec::new(),
    }
}

/// Test suite for the default discrete-event archer
mod discrete_tests {
    use super::*;

    #[test]
    fn e2e_default_range_scores_hits_and_kills() {
        let mut config = EngineConfig::default();
        config.validate();
        let (mut session, log) = recorded_session(&config);

        let summary = session.run(config.total_ticks()).expect("run");

        assert!(summary.arrows_fired >= 3, "archer should loose several arrows: {summary}");
        assert!(summary.hits >= 3, "aimed arrows should land: {summary}");
        assert!(summary.kills >= 1, "the nearest target should fall: {summary}");
        assert!(summary.hits <= summary.arrows_fired);

        let first = EntityId::new(1);
        assert!(session.system().targets().get(first).is_none(), "nearest target is shot first");

        let log = log.lock();
        assert!(log.contains(&Notification::TargetDestroyed { entity: first }));
        let launched = log
            .iter()
            .filter(|n| matches!(n, Notification::ArrowLaunched { .. }))
            .count();
        let destroyed = log
            .iter()
            .filter(|n| matches!(n, Notification::TargetDestroyed { .. }))
            .count();
        assert_eq!(launched, summary.arrows_fired as usize);
        assert_eq!(destroyed, summary.kills as usize, "one destroy notification per kill");

        let last_score = log.iter().rev().find_map(|n| match n {
            Notification::ScoreChanged { total } => Some(*total),
            _ => None,
        });
        assert_eq!(last_score, Some(summary.score));
        assert_eq!(summary.score, session.system().score());
    }

    #[test]
    fn e2e_each_arrow_impacts_at_most_once() {
        let config = EngineConfig::default();
        let (mut session, log) = recorded_session(&config);

        session.run(seconds(&config, 15.0)).expect("run");

        let mut seen = HashSet::new();
        for n in log.lock().iter() {
            if let Notification::ArrowImpacted { arrow, .. } = n {
                assert!(seen.insert(*arrow), "{arrow} impacted twice");
            }
        }
        assert!(!seen.is_empty());
    }

    #[test]
    fn e2e_partial_draw_launches_at_target_strength() {
        let mut config = EngineConfig::default();
        config.archer.target_strength = 0.5;
        config.range = single_target(Vec3::new(0.0, 1.5, 8.0));
        let (mut session, log) = recorded_session(&config);

        let summary = session.run(seconds(&config, 4.0)).expect("run");
        assert!(summary.arrows_fired >= 1);

        for n in log.lock().iter() {
            if let Notification::ArrowLaunched { strength, impulse, .. } = n {
                assert!((strength - 0.5).abs() < 1e-4, "strength {strength}");
                assert!((impulse.length() - 15.0).abs() < 1e-2);
            }
        }
        assert!(summary.hits >= 1, "half-strength shot still reaches a near target: {summary}");
    }

    #[test]
    fn e2e_single_arrow_supply_fires_once() {
        let mut config = EngineConfig::default();
        config.archery.supply.max_arrows = 1;
        config.archery.supply.starting_arrows = 1;
        config.archery.supply.spawn_interval = 0.0;
        config.archery.supply.spawn_on_draw = false;
        let (mut session, _log) = recorded_session(&config);

        let summary = session.run(seconds(&config, 8.0)).expect("run");

        assert_eq!(summary.arrows_fired, 1, "no replenishment, so only one shot");
        assert_eq!(session.system().supply().count(), 0);
        assert_eq!(session.system().held_count(), 0);
    }

    #[test]
    fn e2e_unreachable_target_is_a_miss() {
        let mut config = EngineConfig::default();
        config.archery.draw.force_multiplier = 5.0;
        config.archery.flight.play_volume =
            Some(PlayVolume::new(Vec3::new(-50.0, -1.0, -50.0), Vec3::splat(50.0)));
        config.range = single_target(Vec3::new(0.0, 1.5, 30.0));
        let (mut session, log) = recorded_session(&config);

        let summary = session.run(seconds(&config, 6.0)).expect("run");

        assert!(summary.arrows_fired >= 1);
        assert_eq!(summary.hits, 0);
        assert!(summary.misses >= 1, "short arrows leave the volume: {summary}");
        assert_eq!(summary.score, 0);
        assert!(!log.lock().iter().any(|n| matches!(n, Notification::ArrowImpacted { .. })));
    }

    #[test]
    fn e2e_cleared_range_stops_shooting() {
        let mut config = EngineConfig::default();
        config.range = RangeLayout {
            targets: vec![TargetSpec {
                position: Vec3::new(0.0, 1.5, 10.0),
                max_health: 10,
                radius: 0.6,
            }],
            enemies: Vec::new(),
        };
        let (mut session, _log) = recorded_session(&config);

        let summary = session.run(seconds(&config, 10.0)).expect("run");

        assert_eq!(summary.kills, 1);
        assert_eq!(summary.arrows_fired, summary.hits, "every arrow at a close target lands");
        assert_eq!(summary.score, u64::from(5 + 50_u32));
        assert!(session.system().targets().is_empty(), "destroyed targets leave the range");
    }
}

/// Test suite for proximity-sensed drawing
mod ambient_tests {
    use super::*;

    fn ambient() -> EngineConfig {
        let mut config = EngineConfig::default();
        config.archery.sensing.mode = SensingMode::Ambient;
        config.validate();
        config
    }

    #[test]
    fn e2e_ambient_archer_nocks_draws_and_looses() {
        let config = ambient();
        let (mut session, log) = recorded_session(&config);

        let summary = session.run(seconds(&config, 10.0)).expect("run");

        assert!(summary.arrows_fired >= 3, "{summary}");
        assert_eq!(summary.arrows_dropped, 0);
        assert!(summary.hits >= 1, "{summary}");

        let log = log.lock();
        assert!(log.iter().any(|n| matches!(n, Notification::ArrowNocked { .. })));
        assert!(log.iter().any(|n| matches!(n, Notification::FullDrawReached { .. })));
        for n in log.iter() {
            if let Notification::ArrowLaunched { strength, .. } = n {
                assert!((strength - 1.0).abs() < 1e-4, "held full draw is kept: {strength}");
            }
        }
    }

    #[test]
    fn e2e_ambient_partial_draw_keeps_held_strength() {
        let mut config = ambient();
        config.archer.target_strength = 0.5;
        config.range = single_target(Vec3::new(0.0, 1.5, 8.0));
        let (mut session, log) = recorded_session(&config);

        let summary = session.run(seconds(&config, 4.0)).expect("run");
        assert!(summary.arrows_fired >= 1, "{summary}");
        assert_eq!(summary.arrows_dropped, 0);

        let log = log.lock();
        assert!(!log.iter().any(|n| matches!(n, Notification::FullDrawReached { .. })));
        for n in log.iter() {
            if let Notification::ArrowLaunched { strength, impulse, .. } = n {
                assert!((strength - 0.5).abs() < 1e-4, "strength {strength}");
                assert!((impulse.length() - 15.0).abs() < 1e-2);
            }
        }
        assert!(summary.hits >= 1, "{summary}");
    }

    #[test]
    fn e2e_ambient_draw_ends_with_zero_pull() {
        let config = ambient();
        let (mut session, log) = recorded_session(&config);

        // First shot: aim, nock, grab, draw, hold, release.
        let ticks =
            4 + u64::from(config.archer.draw_ticks) + u64::from(config.archer.hold_ticks) + 2;
        let summary = session.run(ticks).expect("run");
        assert_eq!(summary.arrows_fired, 1);

        let log = log.lock();
        let launch_at = log
            .iter()
            .position(|n| matches!(n, Notification::ArrowLaunched { .. }))
            .expect("launch notified");
        assert!(log[launch_at..].iter().any(|n| matches!(
            n,
            Notification::PullStrengthChanged { strength, .. } if *strength == 0.0
        )));
    }
}
