//! Synthetic sample sources.
//!
//! Both generators are pure functions of the frame index within the period,
//! so every period they produce is identical and reproducible.

use std::f64::consts::PI;

use crate::models::error::PlaybackError;
use crate::processing::period_buffer::PeriodBuffer;
use crate::traits::sample_source::SampleSource;

/// One full sine cycle per period, duplicated across channels.
///
/// The resulting tone frequency is `sample_rate / period_frames`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SineSource {
    amplitude: f64,
}

impl SineSource {
    /// `amplitude` is clamped to `[0, 1]`; `1.0` spans the full 16-bit range.
    pub fn new(amplitude: f64) -> Self {
        let amplitude = if amplitude.is_nan() { 0.0 } else { amplitude.clamp(0.0, 1.0) };
        Self { amplitude }
    }

    pub fn amplitude(&self) -> f64 {
        self.amplitude
    }

    /// Sample for `frame_index` within a period of `frame_count` frames.
    pub fn sample_at(&self, frame_index: usize, frame_count: usize) -> i16 {
        if frame_count == 0 {
            return 0;
        }
        let phase = 2.0 * PI * (frame_index % frame_count) as f64 / frame_count as f64;
        (self.amplitude * phase.sin() * i16::MAX as f64) as i16
    }
}

impl Default for SineSource {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl SampleSource for SineSource {
    fn produce_next_period(&mut self, buffer: &mut PeriodBuffer) -> Result<usize, PlaybackError> {
        let source = *self;
        Ok(buffer.fill_frames(|i, n| {
            let s = source.sample_at(i, n);
            (s, s)
        }))
    }

    fn is_exhausted(&self) -> bool {
        false
    }
}

/// Two sawtooth ramps an octave apart, left on a 128-frame cycle and right
/// on a 256-frame cycle. Used as a loud, easy to recognise test signal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuzzerSource;

impl BuzzerSource {
    pub fn new() -> Self {
        Self
    }

    pub fn left_at(frame_index: usize) -> i16 {
        ((frame_index % 128) as i32 * 100 - 5000) as i16
    }

    pub fn right_at(frame_index: usize) -> i16 {
        ((frame_index % 256) as i32 * 100 - 5000) as i16
    }
}

impl SampleSource for BuzzerSource {
    fn produce_next_period(&mut self, buffer: &mut PeriodBuffer) -> Result<usize, PlaybackError> {
        Ok(buffer.fill_frames(|i, _| (Self::left_at(i), Self::right_at(i))))
    }

    fn is_exhausted(&self) -> bool {
        false
    }
}
