//! Shared types for the clubstatus controller

use chrono::{DateTime, Local};
use std::fmt;

/// Logical relay channel on the port-expander relay bank
///
/// Each channel is wired to a fixed bit of the output register. The mapping
/// is a property of the hardware and cannot be changed at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelayChannel {
    Power,
    Yellow,
    Red,
    Green,
}

impl RelayChannel {
    pub const ALL: [RelayChannel; 4] =
        [RelayChannel::Power, RelayChannel::Yellow, RelayChannel::Red, RelayChannel::Green];

    /// Bit index of this channel in the register image
    pub const fn bit(self) -> u8 {
        match self {
            RelayChannel::Power => 0,
            RelayChannel::Yellow => 1,
            RelayChannel::Red => 2,
            RelayChannel::Green => 3,
        }
    }

    /// Reverse lookup from a raw bit index
    pub fn from_bit(bit: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|channel| channel.bit() == bit)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RelayChannel::Power => "power",
            RelayChannel::Yellow => "yellow",
            RelayChannel::Red => "red",
            RelayChannel::Green => "green",
        }
    }
}

impl fmt::Display for RelayChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which of the three lamps are lit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LightSet {
    pub red: bool,
    pub yellow: bool,
    pub green: bool,
}

impl LightSet {
    /// Red and green together: never produced by normal operation, used to
    /// signal a forced/manual state on shutdown.
    pub const SHUTDOWN: LightSet = LightSet { red: true, yellow: false, green: true };

    /// Lamp channels paired with their target state, in write order
    pub fn channels(&self) -> [(RelayChannel, bool); 3] {
        [
            (RelayChannel::Red, self.red),
            (RelayChannel::Yellow, self.yellow),
            (RelayChannel::Green, self.green),
        ]
    }
}

/// One of the four mutually exclusive traffic light outputs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LightCombination {
    /// Club open, lock open
    Green,
    /// Club closed, lock open
    Yellow,
    /// Club open, lock closed
    RedYellow,
    /// Club closed, lock closed
    Red,
}

impl LightCombination {
    pub const ALL: [LightCombination; 4] = [
        LightCombination::Green,
        LightCombination::Yellow,
        LightCombination::RedYellow,
        LightCombination::Red,
    ];

    pub fn lights(&self) -> LightSet {
        match self {
            LightCombination::Green => LightSet { red: false, yellow: false, green: true },
            LightCombination::Yellow => LightSet { red: false, yellow: true, green: false },
            LightCombination::RedYellow => LightSet { red: true, yellow: true, green: false },
            LightCombination::Red => LightSet { red: true, yellow: false, green: false },
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LightCombination::Green => "green",
            LightCombination::Yellow => "yellow",
            LightCombination::RedYellow => "red-yellow",
            LightCombination::Red => "red",
        }
    }
}

impl fmt::Display for LightCombination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalized sensor readings for a single tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SensorSample {
    /// Club room is in use (occupancy line pulled low)
    pub occupied: bool,
    /// Door lock is closed (lock line high)
    pub locked: bool,
}

/// Outcome of one control loop tick, rendered as the console status line
#[derive(Debug, Clone, PartialEq)]
pub struct TickReport {
    pub timestamp: DateTime<Local>,
    pub tick_index: u64,
    pub sample: SensorSample,
    pub power_on: bool,
    /// `None` until the first combination has been written
    pub lights: Option<LightCombination>,
    /// Whether a status message was handed to the bus this tick
    pub published: bool,
}

impl TickReport {
    pub fn lights_name(&self) -> &'static str {
        self.lights.as_ref().map_or("Undefined", LightCombination::as_str)
    }
}

impl fmt::Display for TickReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} | Club: {} - Schloss: {} - Strom: {} - Ampel: {}",
            self.timestamp.format("%Y-%m-%d %H:%M:%S"),
            self.sample.occupied,
            self.sample.locked,
            self.power_on,
            self.lights_name()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::collections::HashSet;

    #[test]
    fn test_channel_bits_are_unique() {
        let bits: HashSet<u8> = RelayChannel::ALL.iter().map(|c| c.bit()).collect();
        assert_eq!(bits.len(), RelayChannel::ALL.len());
        assert!(bits.iter().all(|&b| b < 8));
    }

    #[test]
    fn test_channel_hardware_mapping() {
        assert_eq!(RelayChannel::Power.bit(), 0);
        assert_eq!(RelayChannel::Yellow.bit(), 1);
        assert_eq!(RelayChannel::Red.bit(), 2);
        assert_eq!(RelayChannel::Green.bit(), 3);
    }

    #[test]
    fn test_from_bit() {
        for channel in RelayChannel::ALL {
            assert_eq!(RelayChannel::from_bit(channel.bit()), Some(channel));
        }
        assert_eq!(RelayChannel::from_bit(4), None);
        assert_eq!(RelayChannel::from_bit(7), None);
    }

    #[test]
    fn test_combination_lights_are_distinct() {
        let sets: Vec<LightSet> = LightCombination::ALL.iter().map(|c| c.lights()).collect();
        for (i, a) in sets.iter().enumerate() {
            for b in &sets[i + 1..] {
                assert_ne!(a, b);
            }
        }
        assert!(!sets.contains(&LightSet::SHUTDOWN));
    }

    #[test]
    fn test_report_line_format() {
        let report = TickReport {
            timestamp: Local.with_ymd_and_hms(2024, 3, 9, 18, 5, 7).unwrap(),
            tick_index: 3,
            sample: SensorSample { occupied: true, locked: false },
            power_on: true,
            lights: Some(LightCombination::RedYellow),
            published: false,
        };
        assert_eq!(
            report.to_string(),
            "2024-03-09 18:05:07 | Club: true - Schloss: false - Strom: true - Ampel: red-yellow"
        );
    }

    #[test]
    fn test_report_undefined_lights() {
        let report = TickReport {
            timestamp: Local.with_ymd_and_hms(2024, 3, 9, 18, 5, 7).unwrap(),
            tick_index: 0,
            sample: SensorSample::default(),
            power_on: false,
            lights: None,
            published: true,
        };
        assert!(report.to_string().ends_with("Ampel: Undefined"));
    }
}
