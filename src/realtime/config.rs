//! Real-time configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Broadcast and subscription settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RealtimeConfig {
    /// Messages buffered per connection before it counts as failed (default: 256)
    #[serde(default = "default_sink_buffer")]
    pub sink_buffer: usize,

    /// Keep-alive interval for idle streams in seconds (default: 30)
    #[serde(default = "default_keep_alive_secs")]
    pub keep_alive_secs: u64,

    /// Lifetime limit for a subscription in seconds (default: none)
    #[serde(default)]
    pub subscription_timeout_secs: Option<u64>,
}

fn default_sink_buffer() -> usize {
    256
}

fn default_keep_alive_secs() -> u64 {
    30
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            sink_buffer: default_sink_buffer(),
            keep_alive_secs: default_keep_alive_secs(),
            subscription_timeout_secs: None,
        }
    }
}

impl RealtimeConfig {
    pub fn keep_alive(&self) -> Duration {
        Duration::from_secs(self.keep_alive_secs)
    }

    /// `None` means subscriptions never time out
    pub fn subscription_timeout(&self) -> Option<Duration> {
        self.subscription_timeout_secs.map(Duration::from_secs)
    }

    /// Check ranges; returns a description of the first problem
    pub fn validate(&self) -> Result<(), String> {
        if self.sink_buffer == 0 {
            return Err("realtime.sink_buffer must be > 0".to_string());
        }
        if self.keep_alive_secs == 0 {
            return Err("realtime.keep_alive_secs must be > 0".to_string());
        }
        if self.subscription_timeout_secs == Some(0) {
            return Err("realtime.subscription_timeout_secs must be > 0 when set".to_string());
        }
        Ok(())
    }
}
