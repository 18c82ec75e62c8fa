use std::time::Duration;

use super::audio_models::DeviceConfig;
use super::error::PlaybackError;

/// How the session reacts to buffer underruns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecoveryPolicy {
    /// Consecutive underruns tolerated on a single period before the device
    /// is declared unrecoverable. `None` retries forever.
    pub max_consecutive_underruns: Option<u32>,
}

impl RecoveryPolicy {
    pub const DEFAULT_MAX_CONSECUTIVE_UNDERRUNS: u32 = 32;

    pub fn unbounded() -> Self {
        Self {
            max_consecutive_underruns: None,
        }
    }

    pub fn bounded(max: u32) -> Self {
        Self {
            max_consecutive_underruns: Some(max),
        }
    }

    /// Whether another recovery attempt is allowed after `attempts` consecutive underruns.
    pub fn allows(&self, attempts: u32) -> bool {
        self.max_consecutive_underruns.map_or(true, |max| attempts <= max)
    }
}

impl Default for RecoveryPolicy {
    fn default() -> Self {
        Self::bounded(Self::DEFAULT_MAX_CONSECUTIVE_UNDERRUNS)
    }
}

/// Configuration for a playback run.
#[derive(Debug, Clone)]
pub struct PlaybackConfiguration {
    /// Device name handed to the provider (e.g. `default`, `plughw:0,0`).
    pub device_name: String,

    /// Requested stream parameters. Rate and period values are negotiated.
    pub requested: DeviceConfig,

    /// Underrun retry budget.
    pub recovery: RecoveryPolicy,

    /// How long the streaming loop sleeps per iteration while paused.
    pub idle_interval: Duration,
}

impl PlaybackConfiguration {
    pub fn validate(&self) -> Result<(), PlaybackError> {
        if self.device_name.trim().is_empty() {
            return Err(PlaybackError::DeviceUnavailable {
                device: self.device_name.clone(),
                reason: "empty device name".into(),
            });
        }
        self.requested.validate()
    }
}

impl Default for PlaybackConfiguration {
    fn default() -> Self {
        Self {
            device_name: "default".into(),
            requested: DeviceConfig::default(),
            recovery: RecoveryPolicy::default(),
            idle_interval: Duration::from_millis(10),
        }
    }
}
