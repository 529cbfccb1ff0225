//! MQTT connection pump routing request payloads into the panel inbox.

use core::ffi::CStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use esp_idf_svc::mqtt::client::{
    Details, EspMqttClient, EspMqttConnection, EventPayload, MqttClientConfiguration, QoS,
};
use esp_idf_svc::sys::EspError;
use inkpanel_core::{Actor, Core, PanelHandle};

pub const DEFAULT_BROKER: &str = "mqtt://test.mosquitto.org:1883";

/// Request topic for a panel id.
pub fn request_topic(panel_id: &str) -> String {
    format!("TNG/{}/TPC/Badger/req", panel_id)
}

/// Connect to the broker. The client stays with the caller for
/// subscriptions; the connection goes to a [`MqttRouter`].
pub fn connect(
    broker: &str,
    client_id: &str,
) -> Result<(EspMqttClient<'static>, EspMqttConnection), EspError> {
    let conf = MqttClientConfiguration {
        client_id: Some(client_id),
        ..Default::default()
    };
    let (client, connection) = EspMqttClient::new(broker, &conf)?;
    log::info!("MQTT client {} created for {}", client_id, broker);
    Ok((client, connection))
}

/// Set by the router on every (re)connect; the supervision loop subscribes.
#[derive(Clone, Default)]
pub struct SubscribeFlag(Arc<AtomicBool>);

impl SubscribeFlag {
    fn raise(&self) {
        self.0.store(true, Ordering::Release);
    }

    fn take(&self) -> bool {
        self.0.swap(false, Ordering::AcqRel)
    }
}

/// Subscribe when the router saw a fresh session. On failure the flag is
/// raised again so the next pass retries.
pub fn resubscribe(client: &mut EspMqttClient<'static>, topic: &str, flag: &SubscribeFlag) {
    if !flag.take() {
        return;
    }
    match client.subscribe(topic, QoS::AtMostOnce) {
        Ok(_) => log::info!("Subscribed to {}", topic),
        Err(err) => {
            log::warn!("Subscribe to {} failed: {}", topic, err);
            flag.raise();
        }
    }
}

pub struct MqttRouter {
    connection: EspMqttConnection,
    handle: PanelHandle,
    subscribe: SubscribeFlag,
    closed: bool,
}

impl MqttRouter {
    pub fn new(connection: EspMqttConnection, handle: PanelHandle, subscribe: SubscribeFlag) -> Self {
        Self {
            connection,
            handle,
            subscribe,
            closed: false,
        }
    }
}

impl Actor for MqttRouter {
    const NAME: &'static CStr = c"mqtt-router";
    const PRIORITY: u8 = 5;
    const STACK_WORDS: usize = 6 * 1024;
    const CORE: Option<Core> = Some(Core::Core1);

    fn step(&mut self) {
        if self.closed {
            thread::sleep(Duration::from_secs(60));
            return;
        }

        let event = match self.connection.next() {
            Ok(event) => event,
            Err(err) => {
                log::error!("MQTT connection closed: {}", err);
                self.closed = true;
                return;
            }
        };

        match event.payload() {
            EventPayload::Connected(_) => {
                log::info!("MQTT connected");
                self.subscribe.raise();
            }
            EventPayload::Disconnected => log::warn!("MQTT disconnected"),
            EventPayload::Received {
                topic,
                data,
                details: Details::Complete,
                ..
            } => {
                log::info!(
                    "MQTT message on {}: {} bytes",
                    topic.unwrap_or("?"),
                    data.len()
                );
                // Rejections are logged by the handle.
                let _ = self.handle.submit_payload(data);
            }
            EventPayload::Received { data, .. } => {
                log::warn!("Dropping chunked MQTT message fragment ({} bytes)", data.len());
            }
            EventPayload::Error(err) => log::warn!("MQTT error: {:?}", err),
            _ => {}
        }
    }
}

