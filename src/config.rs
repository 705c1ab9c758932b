// config.rs

use std::fmt;

use anyhow::bail;
use tokio::time::Duration;

const DEFAULT_MQTT_PORT: u16 = 1883;
const DEFAULT_LINK_POLL: u64 = 1;
const DEFAULT_LINK_MAX_POLLS: u32 = 30;
const DEFAULT_CONNECT_TIMEOUT: u64 = 10;
const DEFAULT_PUBLISH_INTERVAL: u64 = 30;
const DEFAULT_ERROR_BACKOFF: u64 = 15;

// limits of the station configuration the radio driver accepts
const MAX_SSID_LEN: usize = 32;
const MAX_PASS_LEN: usize = 64;

#[derive(Clone)]
pub struct WifiConfig {
    pub ssid: String,
    pub pass: String,
    /// seconds between association checks
    pub poll_interval: u64,
    pub max_polls: u32,
}

impl WifiConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval)
    }
}

impl Default for WifiConfig {
    fn default() -> Self {
        Self {
            ssid: option_env!("WIFI_SSID").unwrap_or("internet").into(),
            pass: option_env!("WIFI_PASS").unwrap_or("password").into(),
            poll_interval: DEFAULT_LINK_POLL,
            max_polls: DEFAULT_LINK_MAX_POLLS,
        }
    }
}

impl fmt::Debug for WifiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WifiConfig")
            .field("ssid", &self.ssid)
            .field("pass", &"<redacted>")
            .field("poll_interval", &self.poll_interval)
            .field("max_polls", &self.max_polls)
            .finish()
    }
}

#[derive(Clone)]
pub struct MqttConfig {
    pub host: String,
    pub port: u16,
    pub client_id: String,
    pub user: String,
    pub key: String,
    pub topic: String,
    /// seconds to wait for the broker to accept a connection
    pub connect_timeout: u64,
}

impl MqttConfig {
    pub fn url(&self) -> String {
        format!("mqtt://{}:{}", self.host, self.port)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout)
    }
}

impl Default for MqttConfig {
    fn default() -> Self {
        Self {
            host: option_env!("MQTT_HOST").unwrap_or("io.adafruit.com").into(),
            port: option_env!("MQTT_PORT")
                .unwrap_or("-")
                .parse()
                .unwrap_or(DEFAULT_MQTT_PORT),
            client_id: option_env!("MQTT_CLIENT_ID").unwrap_or("grillmon").into(),
            user: option_env!("MQTT_USER").unwrap_or("grillmon").into(),
            key: option_env!("MQTT_KEY").unwrap_or("key").into(),
            topic: option_env!("MQTT_TOPIC")
                .unwrap_or("grillmon/feeds/temperature")
                .into(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }
}

impl fmt::Debug for MqttConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MqttConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("client_id", &self.client_id)
            .field("user", &self.user)
            .field("key", &"<redacted>")
            .field("topic", &self.topic)
            .field("connect_timeout", &self.connect_timeout)
            .finish()
    }
}

/// Everything the acquisition loop needs, fixed at startup.
#[derive(Clone, Debug, Default)]
pub struct AppConfig {
    pub wifi: WifiConfig,
    pub mqtt: MqttConfig,
    pub timing: Timing,
}

/// Loop pacing, all in seconds.
#[derive(Clone, Debug)]
pub struct Timing {
    pub publish_interval: u64,
    pub error_backoff: u64,
    /// consecutive error pauses double up to this
    pub backoff_ceiling: u64,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            publish_interval: DEFAULT_PUBLISH_INTERVAL,
            error_backoff: DEFAULT_ERROR_BACKOFF,
            backoff_ceiling: DEFAULT_ERROR_BACKOFF,
        }
    }
}

impl Timing {
    pub fn publish_interval(&self) -> Duration {
        Duration::from_secs(self.publish_interval)
    }

    pub fn error_backoff(&self) -> Duration {
        Duration::from_secs(self.error_backoff)
    }

    pub fn backoff_ceiling(&self) -> Duration {
        Duration::from_secs(self.backoff_ceiling)
    }
}

impl AppConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.wifi.ssid.is_empty() {
            bail!("WiFi SSID is empty");
        }
        if self.wifi.ssid.len() > MAX_SSID_LEN {
            bail!("WiFi SSID is longer than {MAX_SSID_LEN} bytes");
        }
        if self.wifi.pass.len() > MAX_PASS_LEN {
            bail!("WiFi passphrase is longer than {MAX_PASS_LEN} bytes");
        }
        if self.wifi.max_polls == 0 {
            bail!("WiFi poll budget must be at least one poll");
        }
        if self.mqtt.host.is_empty() {
            bail!("MQTT broker host is empty");
        }
        if self.mqtt.port == 0 {
            bail!("MQTT broker port must not be 0");
        }
        if self.mqtt.topic.is_empty() {
            bail!("MQTT feed topic is empty");
        }
        if self.mqtt.connect_timeout == 0 {
            bail!("MQTT connect timeout must be nonzero");
        }
        if self.timing.publish_interval == 0 || self.timing.error_backoff == 0 {
            bail!("publish interval and error backoff must be nonzero");
        }
        Ok(())
    }
}


// EOF
