//! MQTT publisher for club status
//!
//! Publishes are fire-and-forget (QoS 0, not retained). The tick loop hands
//! messages to the client with `try_publish`, which never waits on the
//! network; the event loop that actually talks to the broker runs in its own
//! task and reconnects on its own.

use crate::infra::config::Config;
use crate::infra::error::PublishError;
use rumqttc::{AsyncClient, Event, MqttOptions, Packet, QoS};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Request queue between the tick loop and the MQTT event loop
const REQUEST_CAPACITY: usize = 10;

/// Destination for status messages
pub trait StatusSink: Send {
    /// Hand a message to the bus without waiting for delivery
    fn publish(&mut self, topic: &str, payload: &str) -> Result<(), PublishError>;

    /// Stop background network activity
    fn stop(&mut self);
}

pub struct MqttStatusSink {
    client: AsyncClient,
    eventloop: Option<JoinHandle<()>>,
}

impl MqttStatusSink {
    /// Create the client and start its event loop
    ///
    /// Must be called from within a tokio runtime. Connection happens in the
    /// background, a broker that is down at startup is not an error.
    pub fn connect(config: &Config) -> Self {
        let mut mqttoptions =
            MqttOptions::new(config.mqtt_client_id(), config.mqtt_host(), config.mqtt_port());
        mqttoptions.set_keep_alive(Duration::from_secs(config.mqtt_keep_alive_secs()));
        mqttoptions.set_clean_session(true);

        // Set credentials if configured
        if let Some((username, password)) = config.mqtt_credentials() {
            mqttoptions.set_credentials(username, password);
        }

        let (client, eventloop) = AsyncClient::new(mqttoptions, REQUEST_CAPACITY);

        let handle = tokio::spawn(async move {
            let mut eventloop = eventloop;
            loop {
                match eventloop.poll().await {
                    Ok(Event::Incoming(Packet::ConnAck(_))) => {
                        info!("mqtt_connected");
                    }
                    Ok(Event::Outgoing(outgoing)) => {
                        debug!(packet = ?outgoing, "mqtt_outgoing");
                    }
                    Ok(_) => {}
                    Err(e) => {
                        warn!(error = %e, "mqtt_connection_error");
                        tokio::time::sleep(Duration::from_secs(1)).await;
                    }
                }
            }
        });

        info!(
            host = %config.mqtt_host(),
            port = %config.mqtt_port(),
            client_id = %config.mqtt_client_id(),
            auth = %config.mqtt_credentials().is_some(),
            "mqtt_client_started"
        );

        Self { client, eventloop: Some(handle) }
    }
}

impl StatusSink for MqttStatusSink {
    fn publish(&mut self, topic: &str, payload: &str) -> Result<(), PublishError> {
        if self.eventloop.is_none() {
            return Err(PublishError::Stopped);
        }
        self.client
            .try_publish(topic, QoS::AtMostOnce, false, payload.as_bytes().to_vec())
            .map_err(|e| PublishError::Client(e.to_string()))
    }

    fn stop(&mut self) {
        if let Some(handle) = self.eventloop.take() {
            if let Err(e) = self.client.try_disconnect() {
                debug!(error = %e, "mqtt_disconnect_not_queued");
            }
            handle.abort();
            info!("mqtt_client_stopped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_publish_does_not_block_without_broker() {
        let config = Config::parse("[mqtt]\nhost = \"127.0.0.1\"\nport = 1\n", "test").unwrap();
        let mut sink = MqttStatusSink::connect(&config);

        // The request queue absorbs a few messages, then rejects instead of waiting
        let results: Vec<_> =
            (0..REQUEST_CAPACITY * 4).map(|_| sink.publish(config.mqtt_topic(), "1")).collect();
        assert!(results.iter().any(|r| r.is_err()));

        sink.stop();
        assert!(matches!(sink.publish(config.mqtt_topic(), "0"), Err(PublishError::Stopped)));
    }
}
