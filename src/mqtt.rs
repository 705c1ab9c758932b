// mqtt.rs

use esp_idf_svc::mqtt::client::{
    EspAsyncMqttClient, EspAsyncMqttConnection, EventPayload, MqttClientConfiguration, QoS,
};
use log::*;
use tokio::{
    sync::watch,
    time::{timeout, Duration},
};

use crate::*;

/// MQTT publisher on top of the ESP-IDF client.
///
/// The client's connection events are drained by a companion task on the
/// same runtime, which also tracks whether the broker session is up.
#[derive(Default)]
pub struct MqttPublisher {
    client: Option<EspAsyncMqttClient>,
    session: Option<watch::Receiver<bool>>,
}

impl MqttPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    fn session_up(&self) -> bool {
        self.session.as_ref().is_some_and(|s| *s.borrow())
    }
}

async fn event_loop(mut conn: EspAsyncMqttConnection, session: watch::Sender<bool>) {
    while let Ok(notification) = Box::pin(conn.next()).await {
        match notification.payload() {
            EventPayload::Connected(_) => {
                session.send_replace(true);
            }
            EventPayload::Disconnected => {
                warn!("MQTT disconnected.");
                session.send_replace(false);
            }
            EventPayload::Error(e) => error!("MQTT error: {e:?}"),
            other => debug!("MQTT received: {other:?}"),
        }
    }
    session.send_replace(false);
    error!("MQTT connection closed.");
}

impl MessagePublisher for MqttPublisher {
    async fn connect(&mut self, mqtt: &MqttConfig) -> Result<(), ConnectError> {
        // dropping the old client also ends its event task
        self.client = None;
        self.session = None;

        let url = mqtt.url();
        info!("MQTT connecting to {url}...");
        let (client, conn) = EspAsyncMqttClient::new(
            &url,
            &MqttClientConfiguration {
                client_id: Some(mqtt.client_id.as_str()),
                username: Some(mqtt.user.as_str()),
                password: Some(mqtt.key.as_str()),
                keep_alive_interval: Some(Duration::from_secs(25)),
                ..Default::default()
            },
        )
        .map_err(|e| ConnectError::Broker(format!("{e:?}")))?;

        let (session_tx, mut session) = watch::channel(false);
        tokio::spawn(event_loop(conn, session_tx));

        match timeout(mqtt.connect_timeout(), session.wait_for(|up| *up)).await {
            Ok(Ok(_)) => {}
            Ok(Err(_)) => {
                return Err(ConnectError::Broker(
                    "connection closed before the broker answered".into(),
                ))
            }
            Err(_) => {
                return Err(ConnectError::Broker(format!(
                    "no answer from {url} within {}s",
                    mqtt.connect_timeout
                )))
            }
        }

        self.client = Some(client);
        self.session = Some(session);
        Ok(())
    }

    async fn publish(&mut self, topic: &str, payload: &str) -> Result<(), PublishError> {
        if !self.session_up() {
            return Err(PublishError::NotConnected);
        }
        let client = self.client.as_mut().ok_or(PublishError::NotConnected)?;

        debug!("MQTT sending {topic}: {payload}");
        Box::pin(client.publish(topic, QoS::AtLeastOnce, false, payload.as_bytes()))
            .await
            .map_err(|e| PublishError::Send(format!("{e}")))?;
        Ok(())
    }
}

// EOF
