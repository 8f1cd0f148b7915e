//! End-to-end scenarios against the simulated hardware
//!
//! Ticks are driven by hand with explicit timestamps one second apart.

use chrono::{DateTime, Local, TimeZone};
use clubstatus::domain::{LightCombination, RelayChannel, SensorSample};
use clubstatus::infra::{ControllerError, PowerTrigger};
use clubstatus::io::sim::{RecordingSink, SimBus, SimInputs};
use clubstatus::io::{RelayBank, SensorSampler};
use clubstatus::services::{Controller, LoopState, StatusPublisher};

const TOPIC: &str = "/public/eden/clubstatus";

struct Site {
    controller: Controller,
    inputs: SimInputs,
    bus: SimBus,
    sink: RecordingSink,
}

fn site(trigger: PowerTrigger) -> Site {
    let inputs = SimInputs::new();
    let bus = SimBus::new();
    let sink = RecordingSink::new();
    let relays = RelayBank::new(Box::new(bus.clone())).unwrap();
    let publisher = StatusPublisher::new(TOPIC, Box::new(sink.clone()));
    let controller =
        Controller::new(SensorSampler::new(Box::new(inputs.clone())), relays, publisher, trigger);
    Site { controller, inputs, bus, sink }
}

fn at(tick: i64) -> DateTime<Local> {
    Local.timestamp_opt(1_700_000_000 + tick, 0).unwrap()
}

fn lamps(controller: &Controller) -> (bool, bool, bool) {
    let relays = controller.relays();
    (
        relays.is_energized(RelayChannel::Red),
        relays.is_energized(RelayChannel::Yellow),
        relays.is_energized(RelayChannel::Green),
    )
}

#[test]
fn test_startup_occupied_and_unlocked() {
    let mut site = site(PowerTrigger::Occupancy);
    let sample = SensorSample { occupied: true, locked: false };

    let report = site.controller.step(sample, false, at(0)).unwrap();

    assert_eq!(report.lights, Some(LightCombination::Green));
    assert!(!report.power_on);
    assert!(report.published);
    assert_eq!(site.sink.messages(), vec![(TOPIC.to_string(), "1".to_string())]);
    assert_eq!(lamps(&site.controller), (false, false, true));
    assert!(!site.controller.relays().is_energized(RelayChannel::Power));
}

#[test]
fn test_locked_empty_club_with_power_linger() {
    let mut site = site(PowerTrigger::Occupancy);
    let sample = SensorSample { occupied: false, locked: true };

    let mut power = Vec::new();
    for tick in 0..40 {
        let trigger = tick < 5;
        let report = site.controller.step(sample, trigger, at(tick)).unwrap();
        assert_eq!(report.lights, Some(LightCombination::Red), "tick {}", tick);
        power.push(report.power_on);
    }

    // Last trigger at tick 4; the window closes once 20 s have fully elapsed
    assert!(power[..24].iter().all(|&on| on));
    assert!(power[24..].iter().all(|&on| !on));
    assert_eq!(lamps(&site.controller), (true, false, false));
}

#[test]
fn test_occupancy_flicker_does_not_chatter_power() {
    let mut site = site(PowerTrigger::Occupancy);
    let pattern = [true, false, true, false, false, true, false, false, false, true];

    for (tick, &occupied) in pattern.iter().enumerate() {
        site.inputs.set_state(occupied, false);
        let report = site.controller.tick(at(tick as i64)).unwrap();
        assert!(report.power_on);
    }

    let power_writes = count_power_changes(&site.bus);
    assert_eq!(power_writes, 1);
}

fn count_power_changes(bus: &SimBus) -> usize {
    let values: Vec<u8> = bus.writes().iter().map(|w| w.value).collect();
    values.windows(2).filter(|pair| (pair[0] ^ pair[1]) & 0b0001 != 0).count()
}

#[test]
fn test_light_changes_only_on_transitions() {
    let mut site = site(PowerTrigger::Occupancy);

    site.inputs.set_state(false, false);
    site.controller.tick(at(0)).unwrap();
    let after_first = site.bus.write_count();

    site.controller.tick(at(1)).unwrap();
    assert_eq!(site.bus.write_count(), after_first);

    site.inputs.set_state(false, true);
    let report = site.controller.tick(at(2)).unwrap();
    assert_eq!(report.lights, Some(LightCombination::Red));
    assert_eq!(site.bus.write_count(), after_first + 3);
    assert_eq!(lamps(&site.controller), (true, false, false));
}

#[test]
fn test_heartbeat_and_transitions() {
    let mut site = site(PowerTrigger::Occupancy);
    let occupancy = [false, false, true, false, false, false, false, false, false, false, false];

    for (tick, &occupied) in occupancy.iter().enumerate() {
        site.inputs.set_state(occupied, false);
        site.controller.tick(at(tick as i64)).unwrap();
    }

    // tick 0 (first + heartbeat), 2 (rise), 3 (fall), 10 (heartbeat)
    assert_eq!(site.sink.payloads(), vec!["0", "1", "0", "0"]);
}

#[test]
fn test_shutdown_from_any_state() {
    for (occupied, locked) in [(true, false), (false, false), (true, true), (false, true)] {
        let mut site = site(PowerTrigger::Unlocked);
        site.inputs.set_state(occupied, locked);
        for tick in 0..3 {
            site.controller.tick(at(tick)).unwrap();
        }

        site.controller.shutdown().unwrap();

        let relays = site.controller.relays();
        assert!(relays.is_energized(RelayChannel::Power));
        assert_eq!(lamps(&site.controller), (true, false, true));
        assert_eq!(site.bus.last_value(), Some(0b1111_0010));
        assert_eq!(site.controller.state(), LoopState::ShuttingDown);
        assert!(site.sink.is_stopped());
    }
}

#[test]
fn test_shutdown_after_failed_bus_still_attempts_safe_state() {
    let mut site = site(PowerTrigger::Occupancy);
    site.controller.tick(at(0)).unwrap();

    site.bus.set_failing(true);
    assert!(matches!(site.controller.shutdown(), Err(ControllerError::HardwareWrite(_))));
    assert_eq!(site.controller.relays().image(), 0b1111_0010);
    assert!(site.sink.is_stopped());
}
