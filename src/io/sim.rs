//! In-memory hardware and message bus
//!
//! Used for `--simulate` dry runs on a workstation and as test doubles. Each
//! simulated part hands out a cloneable handle sharing its state, so a test
//! can flip input levels or inspect writes while the controller owns the
//! part itself.

use crate::infra::error::{HardwareError, PublishError};
use crate::io::hardware::{DigitalInputs, InputLine, RegisterBus};
use crate::io::mqtt::StatusSink;
use parking_lot::Mutex;
use std::sync::Arc;

#[derive(Debug)]
struct InputState {
    occupancy_high: bool,
    lock_high: bool,
    fail: Option<InputLine>,
}

/// Simulated input lines
///
/// Starts idle: occupancy high (club empty), lock low (unlocked).
#[derive(Debug, Clone)]
pub struct SimInputs {
    state: Arc<Mutex<InputState>>,
}

impl Default for SimInputs {
    fn default() -> Self {
        Self::new()
    }
}

impl SimInputs {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(InputState {
                occupancy_high: true,
                lock_high: false,
                fail: None,
            })),
        }
    }

    /// Set raw line levels
    pub fn set_levels(&self, occupancy_high: bool, lock_high: bool) {
        let mut state = self.state.lock();
        state.occupancy_high = occupancy_high;
        state.lock_high = lock_high;
    }

    /// Drive the lines so that they sample as the given logical state
    pub fn set_state(&self, occupied: bool, locked: bool) {
        self.set_levels(!occupied, locked);
    }

    /// Make reads of `line` fail until cleared with `None`
    pub fn fail_line(&self, line: Option<InputLine>) {
        self.state.lock().fail = line;
    }
}

impl DigitalInputs for SimInputs {
    fn read(&mut self, line: InputLine) -> Result<bool, HardwareError> {
        let state = self.state.lock();
        if state.fail == Some(line) {
            return Err(format!("simulated read failure on {} line", line.as_str()).into());
        }
        Ok(match line {
            InputLine::Occupancy => state.occupancy_high,
            InputLine::Lock => state.lock_high,
        })
    }
}

/// One register write seen by the simulated bus
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisterWrite {
    pub device: u8,
    pub register: u8,
    pub value: u8,
}

#[derive(Debug, Default)]
struct BusState {
    writes: Vec<RegisterWrite>,
    fail: bool,
}

/// Simulated I2C bus recording every write
#[derive(Debug, Clone, Default)]
pub struct SimBus {
    state: Arc<Mutex<BusState>>,
}

impl SimBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn writes(&self) -> Vec<RegisterWrite> {
        self.state.lock().writes.clone()
    }

    pub fn write_count(&self) -> usize {
        self.state.lock().writes.len()
    }

    /// Value of the most recent write
    pub fn last_value(&self) -> Option<u8> {
        self.state.lock().writes.last().map(|w| w.value)
    }

    /// Make every following write fail (and not be recorded)
    pub fn set_failing(&self, fail: bool) {
        self.state.lock().fail = fail;
    }
}

impl RegisterBus for SimBus {
    fn write(&mut self, device: u8, register: u8, value: u8) -> Result<(), HardwareError> {
        let mut state = self.state.lock();
        if state.fail {
            return Err(format!("simulated nack from device {:#04x}", device).into());
        }
        state.writes.push(RegisterWrite { device, register, value });
        Ok(())
    }
}

#[derive(Debug, Default)]
struct SinkState {
    messages: Vec<(String, String)>,
    fail: bool,
    stopped: bool,
}

/// Status sink that records publishes instead of sending them
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    state: Arc<Mutex<SinkState>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Published (topic, payload) pairs in order
    pub fn messages(&self) -> Vec<(String, String)> {
        self.state.lock().messages.clone()
    }

    pub fn payloads(&self) -> Vec<String> {
        self.state.lock().messages.iter().map(|(_, payload)| payload.clone()).collect()
    }

    pub fn set_failing(&self, fail: bool) {
        self.state.lock().fail = fail;
    }

    pub fn is_stopped(&self) -> bool {
        self.state.lock().stopped
    }
}

impl StatusSink for RecordingSink {
    fn publish(&mut self, topic: &str, payload: &str) -> Result<(), PublishError> {
        let mut state = self.state.lock();
        if state.stopped {
            return Err(PublishError::Stopped);
        }
        if state.fail {
            return Err(PublishError::Client("simulated broker outage".to_string()));
        }
        state.messages.push((topic.to_string(), payload.to_string()));
        Ok(())
    }

    fn stop(&mut self) {
        self.state.lock().stopped = true;
    }
}
