use serde::{Deserialize, Serialize};

use super::audio_models::{DeviceConfig, SessionStats};
use super::error::PlaybackError;
use super::state::EndReason;

/// Summary returned when a streaming loop finishes cleanly.
///
/// Serializable so the demos can print it as JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackReport {
    pub session_id: String,
    pub device_name: String,
    pub config: DeviceConfig,
    pub started_at: String,
    pub duration_secs: f64,
    pub end_reason: EndReason,
    pub stats: SessionStats,
    /// SHA-256 of every byte handed to the device, in write order.
    pub checksum: String,
}

impl PlaybackReport {
    /// Seconds of audio actually submitted, derived from the frame count.
    pub fn audio_secs(&self) -> f64 {
        self.stats.frames_written as f64 / self.config.sample_rate as f64
    }

    pub fn to_json(&self) -> Result<String, PlaybackError> {
        serde_json::to_string_pretty(self)
            .map_err(|e| PlaybackError::Io(format!("failed to serialize report: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::audio_models::SampleFormat;

    fn report() -> PlaybackReport {
        PlaybackReport {
            session_id: "id".into(),
            device_name: "default".into(),
            config: DeviceConfig::new(48000, 2, SampleFormat::S16Le).with_period(480, 4),
            started_at: "2024-01-01T00:00:00+00:00".into(),
            duration_secs: 1.0,
            end_reason: EndReason::Stopped,
            stats: SessionStats {
                frames_written: 24000,
                ..Default::default()
            },
            checksum: String::new(),
        }
    }

    #[test]
    fn audio_secs_from_frames() {
        assert!((report().audio_secs() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn json_uses_snake_case_end_reason() {
        let json = report().to_json().unwrap();
        assert!(json.contains("\"end_reason\": \"stopped\""));
        assert!(json.contains("\"format\": \"S16_LE\""));
        let back: PlaybackReport = serde_json::from_str(&json).unwrap();
        assert_eq!(back, report());
    }
}
