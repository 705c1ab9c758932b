// link.rs

use std::fmt;

use log::*;
use tokio::time::{sleep, Duration};

use crate::{MqttConfig, WifiConfig};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConnectError {
    /// The network never came up within the poll budget.
    LinkUnavailable { polls: u32 },
    Link(String),
    Broker(String),
    /// Settings the driver refused before any connection attempt.
    Config(String),
}

impl fmt::Display for ConnectError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectError::LinkUnavailable { polls } => {
                write!(f, "network link unavailable after {polls} polls")
            }
            ConnectError::Link(msg) => write!(f, "network error: {msg}"),
            ConnectError::Broker(msg) => write!(f, "MQTT broker error: {msg}"),
            ConnectError::Config(msg) => write!(f, "bad connection settings: {msg}"),
        }
    }
}

impl std::error::Error for ConnectError {}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PublishError {
    NotConnected,
    Send(String),
}

impl fmt::Display for PublishError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PublishError::NotConnected => write!(f, "MQTT session is not connected"),
            PublishError::Send(msg) => write!(f, "MQTT send error: {msg}"),
        }
    }
}

impl std::error::Error for PublishError {}

/// Network-layer connectivity.
#[allow(async_fn_in_trait)]
pub trait ConnectivityProvider {
    /// Returns at once when the link is already up, otherwise associates and
    /// waits for it, within the poll budget in `wifi`.
    async fn ensure_connected(&mut self, wifi: &WifiConfig) -> Result<(), ConnectError>;

    fn is_connected(&self) -> bool;
}

/// Publish side of an MQTT client.
#[allow(async_fn_in_trait)]
pub trait MessagePublisher {
    /// A single connection attempt. Any previous session is dropped first.
    async fn connect(&mut self, mqtt: &MqttConfig) -> Result<(), ConnectError>;

    /// Sends over the current session; never reconnects.
    async fn publish(&mut self, topic: &str, payload: &str) -> Result<(), PublishError>;
}

/// A radio that can be told to associate and asked whether it has an address.
#[allow(async_fn_in_trait)]
pub trait Station {
    fn is_up(&self) -> bool;

    /// Kicks off association. Completion is observed through `is_up`.
    async fn associate(&mut self, wifi: &WifiConfig) -> Result<(), ConnectError>;

    /// Address details worth logging once the link is up.
    fn link_info(&self) -> Option<String> {
        None
    }
}

/// Checks `is_up` once, then up to `max_polls` more times, `interval` apart.
pub async fn wait_for_link(
    mut is_up: impl FnMut() -> bool,
    interval: Duration,
    max_polls: u32,
) -> Result<(), ConnectError> {
    if is_up() {
        return Ok(());
    }
    for poll in 1..=max_polls {
        sleep(interval).await;
        if is_up() {
            debug!("link up after {poll} polls");
            return Ok(());
        }
    }
    Err(ConnectError::LinkUnavailable { polls: max_polls })
}

/// Connectivity over a [`Station`], with a bounded wait for the link.
pub struct StationLink<S> {
    station: S,
}

impl<S: Station> StationLink<S> {
    pub fn new(station: S) -> Self {
        StationLink { station }
    }

    pub fn station(&self) -> &S {
        &self.station
    }
}

impl<S: Station> ConnectivityProvider for StationLink<S> {
    async fn ensure_connected(&mut self, wifi: &WifiConfig) -> Result<(), ConnectError> {
        if self.station.is_up() {
            return Ok(());
        }

        info!("Connecting to network {}...", wifi.ssid);
        self.station.associate(wifi).await?;

        let station = &self.station;
        wait_for_link(|| station.is_up(), wifi.poll_interval(), wifi.max_polls).await?;
        match self.station.link_info() {
            Some(details) => info!("Network connected: {details}"),
            None => info!("Network connected."),
        }
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.station.is_up()
    }
}

// EOF
