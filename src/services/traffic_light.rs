//! Traffic light state machine
//!
//! Maps (occupied, locked) onto one of four lamp combinations and remembers
//! what is currently shown, so the relay bank is only written on a change.

use crate::domain::types::LightCombination;

/// Pure mapping from sensor state to the combination to display
pub fn decide(occupied: bool, locked: bool) -> LightCombination {
    match (occupied, locked) {
        (true, false) => LightCombination::Green,
        (false, false) => LightCombination::Yellow,
        (true, true) => LightCombination::RedYellow,
        (false, true) => LightCombination::Red,
    }
}

#[derive(Debug, Default)]
pub struct TrafficLight {
    displayed: Option<LightCombination>,
}

impl TrafficLight {
    /// Nothing displayed yet
    pub fn new() -> Self {
        Self::default()
    }

    pub fn displayed(&self) -> Option<LightCombination> {
        self.displayed
    }

    /// Compute the target combination and return it only if it has to be
    /// written; the caller must then drive the relays. The first call
    /// always returns `Some`.
    pub fn update(&mut self, occupied: bool, locked: bool) -> Option<LightCombination> {
        let target = decide(occupied, locked);
        if self.displayed == Some(target) {
            return None;
        }
        self.displayed = Some(target);
        Some(target)
    }
}
