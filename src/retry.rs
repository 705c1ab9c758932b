// retry.rs

use log::*;
use tokio::time::Duration;

#[derive(Copy, Clone, Debug)]
pub struct ExpBackoff {
    max: Duration,
    initial: Duration,
    current: Duration,
}

impl ExpBackoff {
    const DEFAULT_MAX_BACKOFF: Duration = Duration::from_secs(60);

    pub const fn new(initial: Duration) -> Self {
        Self {
            max: Self::DEFAULT_MAX_BACKOFF,
            current: initial,
            initial,
        }
    }

    /// A ceiling below the initial delay pins the backoff at the initial delay.
    pub fn with_max(self, max: Duration) -> Self {
        Self {
            max: max.max(self.initial),
            ..self
        }
    }

    /// Returns the delay to wait now and doubles the next one, up to the ceiling.
    pub fn next_delay(&mut self) -> Duration {
        let current = self.current;
        debug!("backing off for {current:?}...");
        self.current = self.current.saturating_mul(2).min(self.max);
        current
    }

    pub fn reset(&mut self) {
        if self.current != self.initial {
            debug!("reset backoff to {:?}", self.initial);
            self.current = self.initial;
        }
    }

    pub fn current(&self) -> Duration {
        self.current
    }
}


// EOF
