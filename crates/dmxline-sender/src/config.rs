use std::time::Duration;

use crate::error::{Result, SenderError};

/// Shortest break a DMX512 receiver is required to recognise.
pub const MIN_BREAK_DURATION: Duration = Duration::from_micros(100);

/// Default break hold time. Comfortably above the minimum on every OS timer.
pub const DEFAULT_BREAK_DURATION: Duration = Duration::from_millis(1);

/// Default bounded wait for the transmission thread during `stop()`.
pub const DEFAULT_STOP_TIMEOUT: Duration = Duration::from_secs(1);

/// Configuration for a [`Communicator`](crate::Communicator).
#[derive(Debug, Clone)]
pub struct SenderConfig {
    /// How long the line is held in break before each frame.
    pub break_duration: Duration,
    /// How long `stop()` waits for the transmission thread before abandoning it.
    pub stop_timeout: Duration,
}

impl SenderConfig {
    /// Check the values against protocol and lifecycle limits.
    pub fn validate(&self) -> Result<()> {
        if self.break_duration < MIN_BREAK_DURATION {
            return Err(SenderError::InvalidConfig(format!(
                "break duration {:?} is below the DMX512 minimum of {:?}",
                self.break_duration, MIN_BREAK_DURATION
            )));
        }
        if self.stop_timeout.is_zero() {
            return Err(SenderError::InvalidConfig(
                "stop timeout must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for SenderConfig {
    fn default() -> Self {
        Self {
            break_duration: DEFAULT_BREAK_DURATION,
            stop_timeout: DEFAULT_STOP_TIMEOUT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = SenderConfig::default();
        assert_eq!(config.break_duration, Duration::from_millis(1));
        assert_eq!(config.stop_timeout, Duration::from_secs(1));
        config.validate().expect("default config should validate");
    }

    #[test]
    fn rejects_break_below_minimum() {
        let config = SenderConfig {
            break_duration: Duration::from_micros(99),
            ..SenderConfig::default()
        };
        assert!(matches!(config.validate(), Err(SenderError::InvalidConfig(_))));
    }

    #[test]
    fn accepts_break_at_minimum() {
        let config = SenderConfig {
            break_duration: MIN_BREAK_DURATION,
            ..SenderConfig::default()
        };
        config.validate().expect("minimum break should validate");
    }

    #[test]
    fn rejects_zero_stop_timeout() {
        let config = SenderConfig {
            stop_timeout: Duration::ZERO,
            ..SenderConfig::default()
        };
        assert!(matches!(config.validate(), Err(SenderError::InvalidConfig(_))));
    }
}
