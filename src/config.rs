use crate::error::{ClientError, ClientResult};
use std::time::Duration;

/// Backoff settings for readiness polling
#[derive(Debug, Clone, PartialEq)]
pub struct PollConfig {
    /// Wait before the first scheduled poll
    pub initial_delay: Duration,
    /// Multiplier applied to the delay after every not-ready answer
    pub growth_factor: f64,
    /// Upper bound on the delay. `None` lets it grow without limit.
    pub max_delay: Option<Duration>,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(crate::DEFAULT_INITIAL_DELAY_MS),
            growth_factor: crate::DEFAULT_GROWTH_FACTOR,
            max_delay: None,
        }
    }
}

impl PollConfig {
    pub fn validate(&self) -> ClientResult<()> {
        if self.initial_delay.is_zero() {
            return Err(ClientError::InvalidConfig(
                "initial poll delay must be positive".to_string(),
            ));
        }

        // A factor below one would shrink the delay between polls.
        if !self.growth_factor.is_finite() || self.growth_factor < 1.0 {
            return Err(ClientError::InvalidConfig(format!(
                "growth factor must be a finite number >= 1.0, got {}",
                self.growth_factor
            )));
        }

        if let Some(max) = self.max_delay {
            if max < self.initial_delay {
                return Err(ClientError::InvalidConfig(format!(
                    "max delay {:?} is below the initial delay {:?}",
                    max, self.initial_delay
                )));
            }
        }

        Ok(())
    }
}

/// Client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base of the JSON API, e.g. `http://localhost:8000/api`
    pub api_root: String,
    /// Path prefix the application is mounted under; may be empty
    pub app_prefix: String,
    pub poll: PollConfig,
    /// Per-request timeout. Requests wait indefinitely when unset.
    pub request_timeout: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_root: crate::DEFAULT_API_ROOT.to_string(),
            app_prefix: String::new(),
            poll: PollConfig::default(),
            request_timeout: None,
        }
    }
}

impl ClientConfig {
    pub fn new(api_root: impl Into<String>, app_prefix: impl Into<String>) -> Self {
        Self {
            api_root: api_root.into(),
            app_prefix: app_prefix.into(),
            ..Default::default()
        }
    }

    pub fn validate(&self) -> ClientResult<()> {
        self.poll.validate()?;
        url::Url::parse(&self.api_root)?;
        Ok(())
    }
}
