// acquire.rs

use std::fmt;

use log::*;
use tokio::{
    sync::watch,
    time::{sleep, Duration},
};

use crate::*;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoopState {
    Init,
    Connecting,
    Publishing,
    Sleeping,
    ErrorBackoff,
    Stopped,
}

/// Anything that can go wrong inside one cycle.
#[derive(Clone, Debug, PartialEq)]
pub enum CycleError {
    Sensor(SensorFault),
    Connect(ConnectError),
    Publish(PublishError),
}

impl fmt::Display for CycleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CycleError::Sensor(e) => write!(f, "sensor: {e}"),
            CycleError::Connect(e) => write!(f, "connect: {e}"),
            CycleError::Publish(e) => write!(f, "publish: {e}"),
        }
    }
}

impl std::error::Error for CycleError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CycleError::Sensor(e) => Some(e),
            CycleError::Connect(e) => Some(e),
            CycleError::Publish(e) => Some(e),
        }
    }
}

impl From<SensorFault> for CycleError {
    fn from(value: SensorFault) -> Self {
        CycleError::Sensor(value)
    }
}

impl From<ConnectError> for CycleError {
    fn from(value: ConnectError) -> Self {
        CycleError::Connect(value)
    }
}

impl From<PublishError> for CycleError {
    fn from(value: PublishError) -> Self {
        CycleError::Publish(value)
    }
}

/// Read, publish, sleep, forever.
///
/// The loop is an explicit state machine: every error lands in
/// [`LoopState::ErrorBackoff`], which waits and goes back to
/// [`LoopState::Connecting`]. The only way out other than a stop request is
/// a broker refusing the very first connection.
pub struct AcquisitionLoop<S, C, P> {
    config: AppConfig,
    sensor: S,
    link: C,
    publisher: P,
    state: LoopState,
    backoff: ExpBackoff,
    stop: Option<watch::Receiver<bool>>,
    session_up: bool,
    ever_connected: bool,
    published: u64,
    last_error: Option<CycleError>,
}

impl<S, C, P> AcquisitionLoop<S, C, P>
where
    S: Thermometer,
    C: ConnectivityProvider,
    P: MessagePublisher,
{
    pub fn new(config: AppConfig, sensor: S, link: C, publisher: P) -> Self {
        let backoff = ExpBackoff::new(config.timing.error_backoff())
            .with_max(config.timing.backoff_ceiling());
        AcquisitionLoop {
            config,
            sensor,
            link,
            publisher,
            state: LoopState::Init,
            backoff,
            stop: None,
            session_up: false,
            ever_connected: false,
            published: 0,
            last_error: None,
        }
    }

    /// The loop stops at the next sleep or backoff once `true` is sent.
    pub fn with_stop_signal(self, stop: watch::Receiver<bool>) -> Self {
        Self {
            stop: Some(stop),
            ..self
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    /// Number of successful publishes so far.
    pub fn published(&self) -> u64 {
        self.published
    }

    pub fn last_error(&self) -> Option<&CycleError> {
        self.last_error.as_ref()
    }

    /// Runs until stopped. Returns the error only when the first broker
    /// connection fails.
    pub async fn run(&mut self) -> Result<(), ConnectError> {
        info!("Entering acquisition loop...");
        loop {
            if self.step().await? == LoopState::Stopped {
                info!("Acquisition loop stopped after {} publishes.", self.published);
                return Ok(());
            }
        }
    }

    /// Performs the work of the current state and moves to the next one.
    pub async fn step(&mut self) -> Result<LoopState, ConnectError> {
        self.state = match self.state {
            LoopState::Init => {
                info!("grillmon {FW_VERSION} starting.");
                LoopState::Connecting
            }
            LoopState::Connecting => self.connect().await?,
            LoopState::Publishing => self.publish_cycle().await,
            LoopState::Sleeping => {
                if self.pause(self.config.timing.publish_interval()).await {
                    LoopState::Publishing
                } else {
                    LoopState::Stopped
                }
            }
            LoopState::ErrorBackoff => {
                let delay = self.backoff.next_delay();
                warn!("Reconnecting in {} seconds...", delay.as_secs());
                if self.pause(delay).await {
                    LoopState::Connecting
                } else {
                    LoopState::Stopped
                }
            }
            LoopState::Stopped => LoopState::Stopped,
        };
        Ok(self.state)
    }

    async fn connect(&mut self) -> Result<LoopState, ConnectError> {
        let relink = !self.link.is_connected();
        if let Err(e) = self.link.ensure_connected(&self.config.wifi).await {
            return Ok(self.fail(e.into()));
        }
        if relink {
            // a fresh link means any old broker session is gone
            self.session_up = false;
        }
        if self.session_up {
            return Ok(LoopState::Publishing);
        }

        match self.publisher.connect(&self.config.mqtt).await {
            Ok(()) => {
                info!("Successfully connected to MQTT broker {}.", self.config.mqtt.url());
                self.session_up = true;
                self.ever_connected = true;
                Ok(LoopState::Publishing)
            }
            Err(e) if !self.ever_connected => {
                error!("Failed to connect to MQTT broker: {e}");
                self.state = LoopState::Stopped;
                self.last_error = Some(e.clone().into());
                Err(e)
            }
            Err(e) => Ok(self.fail(e.into())),
        }
    }

    async fn publish_cycle(&mut self) -> LoopState {
        match self.publish_once().await {
            Ok(()) => {
                self.published += 1;
                self.backoff.reset();
                LoopState::Sleeping
            }
            Err(e) => self.fail(e),
        }
    }

    async fn publish_once(&mut self) -> Result<(), CycleError> {
        let reading = self.sensor.read()?;
        info!("Temperature: {reading}");

        let topic = &self.config.mqtt.topic;
        self.publisher.publish(topic, &reading.payload()).await?;
        info!("Published to {topic}.");
        Ok(())
    }

    fn fail(&mut self, err: CycleError) -> LoopState {
        error!("An error occurred: {err}");
        if matches!(err, CycleError::Publish(_) | CycleError::Connect(_)) {
            self.session_up = false;
        }
        self.last_error = Some(err);
        LoopState::ErrorBackoff
    }

    /// Sleeps for `period`. Returns `false` if a stop was requested instead.
    async fn pause(&mut self, period: Duration) -> bool {
        let Some(stop) = self.stop.as_mut() else {
            sleep(period).await;
            return true;
        };
        if *stop.borrow() {
            info!("Stop requested.");
            return false;
        }

        let stop_requested = async {
            // a dropped sender can never ask us to stop
            if stop.wait_for(|stop| *stop).await.is_err() {
                std::future::pending::<()>().await;
            }
        };
        tokio::select! {
            _ = sleep(period) => true,
            _ = stop_requested => {
                info!("Stop requested.");
                false
            }
        }
    }
}

// EOF
