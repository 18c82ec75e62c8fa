use crate::models::error::PlaybackError;
use crate::processing::period_buffer::PeriodBuffer;

/// Where the bytes for each period come from.
///
/// Implemented by:
/// - `SineSource`, `BuzzerSource` (synthetic)
/// - `WavFileSource` (bounded reader over a WAV data chunk)
/// - [`Limited`] (caps any source at a number of periods)
pub trait SampleSource {
    /// Fill `buffer` with the next period.
    ///
    /// Returns the number of frame-aligned bytes written at the start of the
    /// buffer. A short count marks the final period; zero means exhausted.
    fn produce_next_period(&mut self, buffer: &mut PeriodBuffer) -> Result<usize, PlaybackError>;

    /// Whether the source has nothing more to produce.
    fn is_exhausted(&self) -> bool;

    /// Stop after `periods` produced periods.
    fn limit_periods(self, periods: u64) -> Limited<Self>
    where
        Self: Sized,
    {
        Limited::new(self, periods)
    }
}

impl<S: SampleSource + ?Sized> SampleSource for Box<S> {
    fn produce_next_period(&mut self, buffer: &mut PeriodBuffer) -> Result<usize, PlaybackError> {
        (**self).produce_next_period(buffer)
    }

    fn is_exhausted(&self) -> bool {
        (**self).is_exhausted()
    }
}

/// Source adapter that ends after a fixed number of periods.
#[derive(Debug)]
pub struct Limited<S> {
    inner: S,
    remaining: u64,
}

impl<S> Limited<S> {
    pub fn new(inner: S, periods: u64) -> Self {
        Self {
            inner,
            remaining: periods,
        }
    }

    pub fn remaining(&self) -> u64 {
        self.remaining
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S: SampleSource> SampleSource for Limited<S> {
    fn produce_next_period(&mut self, buffer: &mut PeriodBuffer) -> Result<usize, PlaybackError> {
        if self.remaining == 0 {
            return Ok(0);
        }
        let produced = self.inner.produce_next_period(buffer)?;
        if produced > 0 {
            self.remaining -= 1;
        }
        Ok(produced)
    }

    fn is_exhausted(&self) -> bool {
        self.remaining == 0 || self.inner.is_exhausted()
    }
}
