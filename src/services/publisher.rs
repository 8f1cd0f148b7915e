//! Occupancy status publishing
//!
//! Sends "1"/"0" whenever occupancy changes, plus a heartbeat every
//! `HEARTBEAT_TICKS` ticks so subscribers can tell a quiet club from a dead
//! controller.

use crate::infra::error::PublishError;
use crate::io::mqtt::StatusSink;
use tracing::debug;

/// A status message goes out on every tick index divisible by this
pub const HEARTBEAT_TICKS: u64 = 10;

/// Whether a status message is due; `previous` is `None` before the first tick
pub fn should_publish(occupied: bool, tick_index: u64, previous: Option<bool>) -> bool {
    previous != Some(occupied) || tick_index % HEARTBEAT_TICKS == 0
}

pub fn payload(occupied: bool) -> &'static str {
    if occupied {
        "1"
    } else {
        "0"
    }
}

pub struct StatusPublisher {
    topic: String,
    sink: Box<dyn StatusSink>,
}

impl StatusPublisher {
    pub fn new(topic: impl Into<String>, sink: Box<dyn StatusSink>) -> Self {
        Self { topic: topic.into(), sink }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Publish if due. Returns whether a message was handed to the bus.
    pub fn publish(
        &mut self,
        occupied: bool,
        tick_index: u64,
        previous: Option<bool>,
    ) -> Result<bool, PublishError> {
        if !should_publish(occupied, tick_index, previous) {
            return Ok(false);
        }
        let payload = payload(occupied);
        self.sink.publish(&self.topic, payload)?;
        debug!(topic = %self.topic, payload = %payload, tick = %tick_index, "status_published");
        Ok(true)
    }

    /// Stop the underlying bus client
    pub fn stop(&mut self) {
        self.sink.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::sim::RecordingSink;

    const TOPIC: &str = "/public/eden/clubstatus";

    fn publisher() -> (StatusPublisher, RecordingSink) {
        let sink = RecordingSink::new();
        (StatusPublisher::new(TOPIC, Box::new(sink.clone())), sink)
    }

    #[test]
    fn test_first_tick_publishes() {
        assert!(should_publish(false, 7, None));
        assert!(should_publish(true, 7, None));
    }

    #[test]
    fn test_heartbeat_without_change() {
        assert!(should_publish(true, 0, Some(true)));
        assert!(should_publish(false, 10, Some(false)));
        assert!(should_publish(false, 120, Some(false)));
        assert!(!should_publish(false, 11, Some(false)));
        assert!(!should_publish(true, 9, Some(true)));
    }

    #[test]
    fn test_transitions_publish_once_each() {
        let (mut publisher, sink) = publisher();
        // false -> true -> false over ticks 11..=13, no heartbeat in range
        assert!(!publisher.publish(false, 11, Some(false)).unwrap());
        assert!(publisher.publish(true, 12, Some(false)).unwrap());
        assert!(publisher.publish(false, 13, Some(true)).unwrap());
        assert_eq!(sink.payloads(), vec!["1".to_string(), "0".to_string()]);
    }

    #[test]
    fn test_transitions_with_coinciding_heartbeat() {
        let (mut publisher, sink) = publisher();
        // ticks 9..=11: heartbeat at 10 coincides with the first transition
        publisher.publish(false, 9, Some(false)).unwrap();
        publisher.publish(true, 10, Some(false)).unwrap();
        publisher.publish(false, 11, Some(true)).unwrap();
        assert_eq!(sink.payloads().len(), 2);

        // ticks 19..=21 with a stable tick on the heartbeat adds exactly one
        publisher.publish(true, 19, Some(false)).unwrap();
        publisher.publish(true, 20, Some(true)).unwrap();
        publisher.publish(false, 21, Some(true)).unwrap();
        assert_eq!(sink.payloads().len(), 5);
    }

    #[test]
    fn test_topic_and_payload() {
        let (mut publisher, sink) = publisher();
        publisher.publish(true, 0, None).unwrap();
        assert_eq!(sink.messages(), vec![(TOPIC.to_string(), "1".to_string())]);
        assert_eq!(publisher.topic(), TOPIC);
    }

    #[test]
    fn test_failure_is_returned() {
        let (mut publisher, sink) = publisher();
        sink.set_failing(true);
        assert!(matches!(publisher.publish(true, 0, None), Err(PublishError::Client(_))));
        sink.set_failing(false);
        assert!(publisher.publish(true, 1, None).unwrap());
    }

    #[test]
    fn test_stop_reaches_sink() {
        let (mut publisher, sink) = publisher();
        publisher.stop();
        assert!(sink.is_stopped());
    }
}
