//! In-memory hardware parameter space.
//!
//! Models what a device can do as a set of constraints and narrows it the
//! same way a real driver's parameter refinement does. Used by devices that
//! have no driver behind them (the WAV file sink, test devices).

use std::ops::RangeInclusive;

use crate::models::audio_models::SampleFormat;
use crate::models::error::DeviceFault;
use crate::traits::playback_provider::{CommittedParams, HwParamSpace};

/// Sample rates a device accepts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RateSupport {
    /// Any rate in the range.
    Continuous(RangeInclusive<u32>),
    /// Only the listed rates (kept sorted).
    Discrete(Vec<u32>),
}

impl RateSupport {
    pub fn discrete(mut rates: Vec<u32>) -> Self {
        rates.sort_unstable();
        rates.dedup();
        Self::Discrete(rates)
    }

    pub fn contains(&self, rate: u32) -> bool {
        match self {
            Self::Continuous(range) => range.contains(&rate),
            Self::Discrete(rates) => rates.binary_search(&rate).is_ok(),
        }
    }

    pub fn bounds(&self) -> Option<(u32, u32)> {
        match self {
            Self::Continuous(range) if !range.is_empty() => Some((*range.start(), *range.end())),
            Self::Discrete(rates) => Some((*rates.first()?, *rates.last()?)),
            _ => None,
        }
    }

    /// Supported rate closest to `rate`; ties go to the lower rate.
    pub fn nearest(&self, rate: u32) -> Option<u32> {
        match self {
            Self::Continuous(range) if !range.is_empty() => Some(rate.clamp(*range.start(), *range.end())),
            Self::Discrete(rates) => rates.iter().copied().min_by_key(|r| r.abs_diff(rate)),
            _ => None,
        }
    }
}

/// What a device supports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HwCapabilities {
    pub interleaved: bool,
    pub formats: Vec<SampleFormat>,
    pub channels: RangeInclusive<u32>,
    pub rates: RateSupport,
    pub period_frames: RangeInclusive<u32>,
    pub periods: RangeInclusive<u32>,
}

impl HwCapabilities {
    pub const DEFAULT_PERIOD_FRAMES: u32 = 1024;
    pub const DEFAULT_PERIODS: u32 = 4;

    pub fn with_rates(mut self, rates: RateSupport) -> Self {
        self.rates = rates;
        self
    }

    pub fn with_formats(mut self, formats: Vec<SampleFormat>) -> Self {
        self.formats = formats;
        self
    }

    pub fn with_channels(mut self, channels: RangeInclusive<u32>) -> Self {
        self.channels = channels;
        self
    }

    /// Start a fresh, unrestricted negotiation.
    pub fn space(&self) -> CapabilitySpace<'_> {
        CapabilitySpace {
            caps: self,
            selection: Selection::default(),
        }
    }
}

impl Default for HwCapabilities {
    fn default() -> Self {
        Self {
            interleaved: true,
            formats: vec![SampleFormat::S16Le, SampleFormat::U8],
            channels: 1..=2,
            rates: RateSupport::discrete(vec![8000, 11025, 16000, 22050, 32000, 44100, 48000, 96000]),
            period_frames: 64..=8192,
            periods: 2..=8,
        }
    }
}

/// Choices made so far in a [`CapabilitySpace`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Selection {
    pub interleaved: bool,
    pub format: Option<SampleFormat>,
    pub channels: Option<u32>,
    pub rate: Option<u32>,
    pub period_frames: Option<u32>,
    pub periods: Option<u32>,
}

/// A parameter space being narrowed against [`HwCapabilities`].
#[derive(Debug, Clone)]
pub struct CapabilitySpace<'a> {
    caps: &'a HwCapabilities,
    selection: Selection,
}

impl CapabilitySpace<'_> {
    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Resolve the space into concrete parameters, filling unset period
    /// values with defaults the way a driver would.
    pub fn finish(&self) -> Result<(Selection, CommittedParams), DeviceFault> {
        let s = self.selection;
        if !s.interleaved {
            return Err(DeviceFault::Rejected("access mode not set".into()));
        }
        if s.format.is_none() || s.channels.is_none() {
            return Err(DeviceFault::Rejected("format and channels must be set".into()));
        }
        let rate = match s.rate {
            Some(rate) => rate,
            None => self
                .caps
                .rates
                .nearest(44100)
                .ok_or_else(|| DeviceFault::Rejected("no supported rate".into()))?,
        };
        let period_frames = s.period_frames.unwrap_or_else(|| {
            HwCapabilities::DEFAULT_PERIOD_FRAMES.clamp(*self.caps.period_frames.start(), *self.caps.period_frames.end())
        });
        let periods = s
            .periods
            .unwrap_or_else(|| HwCapabilities::DEFAULT_PERIODS.clamp(*self.caps.periods.start(), *self.caps.periods.end()));

        let resolved = Selection {
            rate: Some(rate),
            period_frames: Some(period_frames),
            periods: Some(periods),
            ..s
        };
        Ok((
            resolved,
            CommittedParams {
                sample_rate: rate,
                period_frames,
                periods,
            },
        ))
    }
}

fn nearest_in(range: &RangeInclusive<u32>, value: u32, what: &str) -> Result<u32, DeviceFault> {
    if range.is_empty() {
        return Err(DeviceFault::Rejected(format!("no {} supported", what)));
    }
    Ok(value.clamp(*range.start(), *range.end()))
}

impl HwParamSpace for CapabilitySpace<'_> {
    fn set_access_interleaved(&mut self) -> Result<(), DeviceFault> {
        if !self.caps.interleaved {
            return Err(DeviceFault::Rejected("interleaved access".into()));
        }
        self.selection.interleaved = true;
        Ok(())
    }

    fn set_format(&mut self, format: SampleFormat) -> Result<(), DeviceFault> {
        if !self.caps.formats.contains(&format) {
            return Err(DeviceFault::Rejected(format!("{:?}", format)));
        }
        self.selection.format = Some(format);
        Ok(())
    }

    fn set_channels(&mut self, channels: u32) -> Result<(), DeviceFault> {
        if !self.caps.channels.contains(&channels) {
            return Err(DeviceFault::Rejected(format!("{} channels", channels)));
        }
        self.selection.channels = Some(channels);
        Ok(())
    }

    fn set_rate_near(&mut self, rate: u32) -> Result<u32, DeviceFault> {
        let chosen = self
            .caps
            .rates
            .nearest(rate)
            .ok_or_else(|| DeviceFault::Rejected("no supported rate".into()))?;
        self.selection.rate = Some(chosen);
        Ok(chosen)
    }

    fn set_period_frames_near(&mut self, frames: u32) -> Result<u32, DeviceFault> {
        let chosen = nearest_in(&self.caps.period_frames, frames, "period size")?;
        self.selection.period_frames = Some(chosen);
        Ok(chosen)
    }

    fn set_periods_near(&mut self, periods: u32) -> Result<u32, DeviceFault> {
        let chosen = nearest_in(&self.caps.periods, periods, "period count")?;
        self.selection.periods = Some(chosen);
        Ok(chosen)
    }

    fn rate_range(&self) -> Result<(u32, u32), DeviceFault> {
        if let Some(rate) = self.selection.rate {
            return Ok((rate, rate));
        }
        self.caps
            .rates
            .bounds()
            .ok_or_else(|| DeviceFault::Rejected("no supported rate".into()))
    }

    fn test_rate(&self, rate: u32) -> bool {
        match self.selection.rate {
            Some(selected) => selected == rate,
            None => self.caps.rates.contains(rate),
        }
    }
}
