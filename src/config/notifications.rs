//! Notification fan-out tuning

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Presence heartbeat and per-connection queue settings
#[derive(Debug, Clone, Deserialize)]
pub struct NotificationsConfig {
    /// Lifetime of a presence entry without a heartbeat, in seconds
    #[serde(default = "default_presence_ttl")]
    pub presence_ttl_secs: u64,

    /// Presence refresh period for each live connection, in seconds
    #[serde(default = "default_heartbeat_interval")]
    pub heartbeat_interval_secs: u64,

    /// Frames buffered per connection before sends are dropped
    #[serde(default = "default_outbound_buffer")]
    pub outbound_buffer: usize,
}

impl NotificationsConfig {
    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_secs(self.heartbeat_interval_secs)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.presence_ttl_secs == 0 {
            return Err(ValidationError::InvalidPresenceTtl);
        }
        if self.heartbeat_interval_secs == 0 || self.heartbeat_interval_secs >= self.presence_ttl_secs {
            return Err(ValidationError::InvalidHeartbeatInterval);
        }
        if self.outbound_buffer == 0 {
            return Err(ValidationError::InvalidOutboundBuffer);
        }
        Ok(())
    }
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            presence_ttl_secs: default_presence_ttl(),
            heartbeat_interval_secs: default_heartbeat_interval(),
            outbound_buffer: default_outbound_buffer(),
        }
    }
}

fn default_presence_ttl() -> u64 {
    60
}

fn default_heartbeat_interval() -> u64 {
    20
}

fn default_outbound_buffer() -> usize {
    64
}
