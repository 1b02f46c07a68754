use crate::config::PollConfig;
use std::time::Duration;

/// Geometric backoff between readiness polls.
///
/// The delay only ever grows (or stays put once capped).
#[derive(Debug, Clone)]
pub struct Backoff {
    current: Duration,
    factor: f64,
    max: Option<Duration>,
}

impl Backoff {
    pub fn new(config: &PollConfig) -> Self {
        Self {
            current: config.initial_delay,
            factor: config.growth_factor,
            max: config.max_delay,
        }
    }

    /// The delay the next wait will use
    pub fn current(&self) -> Duration {
        self.current
    }

    /// Grow the delay by the configured factor, saturating on overflow.
    pub fn advance(&mut self) -> Duration {
        let grown = Duration::try_from_secs_f64(self.current.as_secs_f64() * self.factor)
            .unwrap_or(Duration::MAX);
        let grown = match self.max {
            Some(max) => grown.min(max),
            None => grown,
        };
        self.current = grown.max(self.current);
        self.current
    }
}
