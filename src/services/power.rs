//! Auxiliary power hysteresis
//!
//! Power turns on as soon as the trigger holds and stays on until the
//! trigger has been absent for the whole linger window. A flickering
//! occupancy contact therefore never chatters the power relay.

use tracing::debug;

/// Seconds power stays on after the trigger was last seen
pub const LINGER_SECONDS: i64 = 20;

/// Result of one hysteresis update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PowerDecision {
    pub power_on: bool,
    /// The decision differs from the previous tick
    pub changed: bool,
}

#[derive(Debug, Default)]
pub struct PowerHysteresis {
    last_trigger_epoch_seconds: Option<i64>,
    power_on: bool,
}

impl PowerHysteresis {
    /// Never triggered, power off
    pub fn new() -> Self {
        Self::default()
    }

    pub fn power_on(&self) -> bool {
        self.power_on
    }

    pub fn last_trigger(&self) -> Option<i64> {
        self.last_trigger_epoch_seconds
    }

    /// True once `LINGER_SECONDS` have fully elapsed since the last trigger
    /// (or if there never was one)
    pub fn linger_expired(&self, now: i64) -> bool {
        self.last_trigger_epoch_seconds
            .map_or(true, |last| now - last >= LINGER_SECONDS)
    }

    /// Feed one tick's trigger state at `now` (epoch seconds)
    pub fn update(&mut self, trigger: bool, now: i64) -> PowerDecision {
        let was_on = self.power_on;

        if trigger {
            self.last_trigger_epoch_seconds = Some(now);
            self.power_on = true;
        } else if self.power_on && self.linger_expired(now) {
            self.power_on = false;
        }

        let changed = self.power_on != was_on;
        if changed {
            debug!(
                power_on = %self.power_on,
                last_trigger = ?self.last_trigger_epoch_seconds,
                now = %now,
                "power_transition"
            );
        }
        PowerDecision { power_on: self.power_on, changed }
    }
}
