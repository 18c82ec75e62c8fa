use serde::{Deserialize, Serialize};

use super::error::{HwParameter, PlaybackError};

/// PCM sample encoding supported by the playback path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SampleFormat {
    #[serde(rename = "S16_LE")]
    S16Le,
    #[serde(rename = "U8")]
    U8,
}

impl SampleFormat {
    pub fn bytes_per_sample(self) -> usize {
        match self {
            Self::S16Le => 2,
            Self::U8 => 1,
        }
    }

    pub fn bit_depth(self) -> u16 {
        self.bytes_per_sample() as u16 * 8
    }

    /// Maps a WAV bit depth onto a format. Only 8 and 16 bit PCM are playable.
    pub fn from_bit_depth(bits: u16) -> Option<Self> {
        match bits {
            16 => Some(Self::S16Le),
            8 => Some(Self::U8),
            _ => None,
        }
    }

    /// Writes one signed 16-bit sample in this encoding. Returns bytes written.
    #[inline]
    pub fn encode_i16(self, sample: i16, out: &mut [u8]) -> usize {
        match self {
            Self::S16Le => {
                out[..2].copy_from_slice(&sample.to_le_bytes());
                2
            }
            Self::U8 => {
                out[0] = ((sample >> 8) + 128) as u8;
                1
            }
        }
    }
}

/// Hardware configuration of a playback stream.
///
/// As a request, `period_frames` and `periods` are hints for the hardware's
/// nearest-value setters. A session's config always holds what the hardware
/// actually committed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceConfig {
    pub sample_rate: u32,
    pub channels: u32,
    pub format: SampleFormat,
    pub period_frames: u32,
    pub periods: u32,
}

impl DeviceConfig {
    pub const MAX_CHANNELS: u32 = 2;

    pub fn new(sample_rate: u32, channels: u32, format: SampleFormat) -> Self {
        Self {
            sample_rate,
            channels,
            format,
            ..Self::default()
        }
    }

    pub fn with_period(mut self, period_frames: u32, periods: u32) -> Self {
        self.period_frames = period_frames;
        self.periods = periods;
        self
    }

    pub fn frame_bytes(&self) -> usize {
        self.channels as usize * self.format.bytes_per_sample()
    }

    pub fn period_bytes(&self) -> usize {
        self.period_frames as usize * self.frame_bytes()
    }

    /// Wall-clock length of one period.
    pub fn period_duration_secs(&self) -> f64 {
        self.period_frames as f64 / self.sample_rate as f64
    }

    /// Number of whole periods needed to cover `secs` of audio (at least one).
    pub fn periods_for_duration(&self, secs: f64) -> u64 {
        let periods = (secs / self.period_duration_secs()).ceil();
        if periods.is_finite() && periods >= 1.0 {
            periods as u64
        } else {
            1
        }
    }

    pub fn validate(&self) -> Result<(), PlaybackError> {
        if self.sample_rate == 0 {
            return Err(PlaybackError::UnsupportedParameter {
                which: HwParameter::Rate,
                reason: "sample rate must be positive".into(),
            });
        }
        if self.channels == 0 || self.channels > Self::MAX_CHANNELS {
            return Err(PlaybackError::UnsupportedParameter {
                which: HwParameter::Channels,
                reason: format!("unsupported channel count: {}", self.channels),
            });
        }
        if self.period_frames == 0 {
            return Err(PlaybackError::UnsupportedParameter {
                which: HwParameter::PeriodSize,
                reason: "period size must be positive".into(),
            });
        }
        if self.periods == 0 {
            return Err(PlaybackError::UnsupportedParameter {
                which: HwParameter::Periods,
                reason: "period count must be positive".into(),
            });
        }
        Ok(())
    }
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44100,
            channels: 2,
            format: SampleFormat::S16Le,
            period_frames: 1024,
            periods: 4,
        }
    }
}

/// Counters kept by a session over its lifetime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStats {
    pub periods_written: u64,
    pub frames_written: u64,
    pub bytes_written: u64,
    pub underruns_recovered: u64,
    pub hardware_pause_toggles: u64,
}
