//! Control loop
//!
//! Once per second: sample sensors, update power hysteresis, update the
//! traffic light, write whatever relays changed, publish occupancy and print
//! one status line. Ticks never overlap. The shutdown request is only looked
//! at between ticks, so the forced safe-state write can't interleave with a
//! tick's writes and is always the last thing written.

use crate::domain::types::{RelayChannel, SensorSample, TickReport};
use crate::infra::config::PowerTrigger;
use crate::infra::error::ControllerError;
use crate::io::relay_bank::RelayBank;
use crate::io::sensors::SensorSampler;
use crate::services::power::PowerHysteresis;
use crate::services::publisher::StatusPublisher;
use crate::services::traffic_light::TrafficLight;
use chrono::{DateTime, Local};
use std::future::Future;
use tokio::time::{interval_at, Duration, Instant, MissedTickBehavior};
use tracing::{error, info, warn};

/// Fixed tick period
pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Running,
    /// Terminal
    ShuttingDown,
}

/// Trigger fed to the power hysteresis for a given sample
pub fn power_trigger(policy: PowerTrigger, sample: &SensorSample) -> bool {
    match policy {
        PowerTrigger::Occupancy => sample.occupied,
        PowerTrigger::Unlocked => !sample.locked,
    }
}

pub struct Controller {
    sampler: SensorSampler,
    relays: RelayBank,
    power: PowerHysteresis,
    lights: TrafficLight,
    publisher: StatusPublisher,
    trigger: PowerTrigger,
    tick_index: u64,
    last_occupied: Option<bool>,
    state: LoopState,
    period: Duration,
}

impl Controller {
    pub fn new(
        sampler: SensorSampler,
        relays: RelayBank,
        publisher: StatusPublisher,
        trigger: PowerTrigger,
    ) -> Self {
        Self {
            sampler,
            relays,
            power: PowerHysteresis::new(),
            lights: TrafficLight::new(),
            publisher,
            trigger,
            tick_index: 0,
            last_occupied: None,
            state: LoopState::Running,
            period: TICK_INTERVAL,
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    /// Number of completed ticks
    pub fn tick_index(&self) -> u64 {
        self.tick_index
    }

    pub fn relays(&self) -> &RelayBank {
        &self.relays
    }

    pub fn power_on(&self) -> bool {
        self.power.power_on()
    }

    /// Run one tick from an already-taken sample
    ///
    /// `power_trigger` is the hysteresis input for this tick; `now` stamps
    /// both the hysteresis and the status line.
    pub fn step(
        &mut self,
        sample: SensorSample,
        power_trigger: bool,
        now: DateTime<Local>,
    ) -> Result<TickReport, ControllerError> {
        if self.state == LoopState::ShuttingDown {
            return Err(ControllerError::ShutDown);
        }

        let power = self.power.update(power_trigger, now.timestamp());
        if power.changed {
            self.relays.set(RelayChannel::Power, power.power_on)?;
            info!(power_on = %power.power_on, "power_switched");
        }

        if let Some(combination) = self.lights.update(sample.occupied, sample.locked) {
            self.relays.apply_lights(combination.lights())?;
            info!(lights = %combination, "lights_switched");
        }

        let published =
            match self.publisher.publish(sample.occupied, self.tick_index, self.last_occupied) {
                Ok(published) => published,
                Err(e) => {
                    warn!(error = %e, topic = %self.publisher.topic(), "status_publish_failed");
                    false
                }
            };
        self.last_occupied = Some(sample.occupied);

        let report = TickReport {
            timestamp: now,
            tick_index: self.tick_index,
            sample,
            power_on: power.power_on,
            lights: self.lights.displayed(),
            published,
        };
        self.tick_index += 1;
        Ok(report)
    }

    /// Sample the sensors and run one tick
    pub fn tick(&mut self, now: DateTime<Local>) -> Result<TickReport, ControllerError> {
        let sample = self.sampler.sample()?;
        let trigger = power_trigger(self.trigger, &sample);
        self.step(sample, trigger, now)
    }

    /// Enter the terminal state: force the safe relay state, stop the bus
    ///
    /// The forced write does not depend on what was shown before and is
    /// attempted even if individual writes fail. Calling this again is a
    /// no-op.
    pub fn shutdown(&mut self) -> Result<(), ControllerError> {
        if self.state == LoopState::ShuttingDown {
            return Ok(());
        }
        self.state = LoopState::ShuttingDown;

        let result = self.relays.force_safe_state();
        self.publisher.stop();

        info!(
            image = %format!("{:#010b}", self.relays.image()),
            forced_write_ok = %result.is_ok(),
            ticks = %self.tick_index,
            "controller_shutdown"
        );
        result
    }

    /// Run until `shutdown` resolves, printing one status line per tick
    pub async fn run<F>(self, shutdown: F) -> Result<(), ControllerError>
    where
        F: Future<Output = ()>,
    {
        self.run_with(shutdown, |report| println!("{}", report)).await
    }

    /// Like `run`, handing each tick report to `on_tick`
    ///
    /// A fatal tick error also goes through the shutdown sequence before it
    /// is returned.
    pub async fn run_with<F, R>(mut self, shutdown: F, mut on_tick: R) -> Result<(), ControllerError>
    where
        F: Future<Output = ()>,
        R: FnMut(&TickReport),
    {
        info!(period_ms = %self.period.as_millis(), trigger = ?self.trigger, "control_loop_started");

        let mut ticker = interval_at(Instant::now() + self.period, self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        let outcome = loop {
            tokio::select! {
                biased;

                _ = &mut shutdown => {
                    info!(tick = %self.tick_index, "shutdown_requested");
                    break Ok(());
                }
                _ = ticker.tick() => {
                    match self.tick(Local::now()) {
                        Ok(report) => on_tick(&report),
                        Err(e) => {
                            error!(subsystem = %e.subsystem(), error = %e, "tick_failed");
                            break Err(e);
                        }
                    }
                }
            }
        };

        if let Err(e) = self.shutdown() {
            error!(error = %e, "safe_state_not_confirmed");
        }
        outcome
    }

    #[cfg(test)]
    fn with_period(mut self, period: Duration) -> Self {
        self.period = period;
        self
    }
}
