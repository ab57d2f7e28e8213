//! Arrow supply policy.
//!
//! A bounded arrow count with two replenishment rules that may run together:
//! a repeating timed spawn, and a one-shot spawn some delay after a draw
//! starts. The draw spawn is cancelled on every exit from drawing. Launch is
//! the only thing that lowers the count.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use fletch_common::ArrowId;

use crate::config::SupplyConfig;
use crate::events::{Notification, NotificationBus};
use crate::nock::Arrow;
use crate::schedule::{TaskHandle, TickScheduler};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
enum SupplyTask {
    Timed,
    DrawTriggered,
}

/// Bounded arrow counter with timed and draw-triggered replenishment.
#[derive(Debug)]
pub struct ArrowSupply {
    config: SupplyConfig,
    arrow_damage: i32,
    count: u32,
    next_arrow: u64,
    timers: TickScheduler<SupplyTask>,
    draw_spawn: Option<TaskHandle>,
    bus: NotificationBus,
}

impl ArrowSupply {
    /// Creates an empty supply and arms the timed spawn.
    #[must_use]
    pub fn new(config: &SupplyConfig, arrow_damage: i32, bus: NotificationBus) -> Self {
        let mut supply = Self {
            config: config.clone(),
            arrow_damage,
            count: 0,
            next_arrow: 1,
            timers: TickScheduler::new(),
            draw_spawn: None,
            bus,
        };
        supply.arm_timed_spawn();
        supply
    }

    /// Current arrow count.
    #[must_use]
    pub const fn count(&self) -> u32 {
        self.count
    }

    /// Upper bound of the count.
    #[must_use]
    pub const fn max_arrows(&self) -> u32 {
        self.config.max_arrows
    }

    /// Checks whether the count is at its bound.
    #[must_use]
    pub const fn is_full(&self) -> bool {
        self.count >= self.config.max_arrows
    }

    /// Checks whether a draw-triggered spawn is waiting.
    #[must_use]
    pub fn is_draw_spawn_pending(&self) -> bool {
        self.draw_spawn.is_some_and(|handle| self.timers.is_pending(handle))
    }

    /// Spawns the configured starting arrows.
    pub fn fill(&mut self) -> Vec<Arrow> {
        (0..self.config.starting_arrows)
            .map_while(|_| self.try_spawn("starting"))
            .collect()
    }

    /// Advances the replenishment timers and returns the arrows spawned.
    pub fn tick(&mut self, dt: f32, is_drawing: bool) -> Vec<Arrow> {
        let mut spawned = Vec::new();
        for task in self.timers.advance(dt) {
            match task {
                SupplyTask::Timed => {
                    spawned.extend(self.try_spawn("timed"));
                    self.arm_timed_spawn();
                },
                SupplyTask::DrawTriggered => {
                    self.draw_spawn = None;
                    if is_drawing {
                        spawned.extend(self.try_spawn("draw"));
                    }
                },
            }
        }
        spawned
    }

    /// Schedules the draw-triggered spawn.
    pub fn on_draw_started(&mut self) {
        if !self.config.spawn_on_draw || self.config.max_arrows == 0 {
            return;
        }
        self.on_draw_ended();
        let handle = self.timers.schedule(self.config.pull_start_delay, SupplyTask::DrawTriggered);
        self.draw_spawn = Some(handle);
    }

    /// Cancels a pending draw-triggered spawn.
    pub fn on_draw_ended(&mut self) {
        if let Some(handle) = self.draw_spawn.take() {
            if self.timers.cancel(handle) {
                debug!("draw spawn cancelled");
            }
        }
    }

    /// Counts one launched arrow. Returns `false` if the count was already zero.
    pub fn consume(&mut self) -> bool {
        if self.count == 0 {
            warn!("launch with an empty supply");
            return false;
        }
        self.count -= 1;
        self.bus.publish(Notification::ArrowCountChanged { count: self.count });
        true
    }

    fn arm_timed_spawn(&mut self) {
        if self.config.spawn_interval > 0.0 && self.config.max_arrows > 0 {
            self.timers.schedule(self.config.spawn_interval, SupplyTask::Timed);
        }
    }

    fn try_spawn(&mut self, source: &'static str) -> Option<Arrow> {
        if self.is_full() {
            return None;
        }
        self.count += 1;
        let id = ArrowId::new(self.next_arrow);
        self.next_arrow += 1;

        debug!(arrow = %id, source, count = self.count, "arrow spawned");
        self.bus.publish(Notification::ArrowCountChanged { count: self.count });
        Some(Arrow::new(id, self.arrow_damage))
    }
}
