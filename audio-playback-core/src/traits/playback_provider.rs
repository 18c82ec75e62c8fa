use crate::models::audio_models::SampleFormat;
use crate::models::error::{DeviceFault, PlaybackError};

/// One uncommitted hardware parameter space.
///
/// Every setter narrows the space. Nothing reaches the hardware until the
/// owning [`PcmDevice::configure`] commits, so a failed step leaves the
/// device untouched.
pub trait HwParamSpace {
    /// Restrict to read/write interleaved access.
    fn set_access_interleaved(&mut self) -> Result<(), DeviceFault>;

    fn set_format(&mut self, format: SampleFormat) -> Result<(), DeviceFault>;

    fn set_channels(&mut self, channels: u32) -> Result<(), DeviceFault>;

    /// Select the supported rate nearest to `rate`. Returns the chosen rate.
    fn set_rate_near(&mut self, rate: u32) -> Result<u32, DeviceFault>;

    /// Select the period size nearest to `frames`. Returns the chosen size.
    fn set_period_frames_near(&mut self, frames: u32) -> Result<u32, DeviceFault>;

    /// Select the period count nearest to `periods`. Returns the chosen count.
    fn set_periods_near(&mut self, periods: u32) -> Result<u32, DeviceFault>;

    /// Lowest and highest rate still possible in this space.
    fn rate_range(&self) -> Result<(u32, u32), DeviceFault>;

    /// Whether `rate` is possible, without narrowing the space.
    fn test_rate(&self, rate: u32) -> bool;
}

/// Values the hardware settled on after a commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommittedParams {
    pub sample_rate: u32,
    pub period_frames: u32,
    pub periods: u32,
}

/// Closure driving a negotiation over a parameter space.
pub type Negotiation<'a> = &'a mut dyn FnMut(&mut dyn HwParamSpace) -> Result<(), PlaybackError>;

/// An open PCM playback device.
///
/// Implemented by:
/// - `AlsaDevice` (Linux, `audio-playback-alsa`)
/// - `WavSinkDevice` (renders to a WAV file)
///
/// Dropping the device releases it.
pub trait PcmDevice {
    /// Run `negotiate` on a fresh parameter space and commit it only if every
    /// step succeeded. On success returns what the hardware committed to.
    fn configure(&mut self, negotiate: Negotiation<'_>) -> Result<CommittedParams, PlaybackError>;

    /// Run `inspect` on a fresh parameter space that is never committed.
    fn probe(&mut self, inspect: Negotiation<'_>) -> Result<(), PlaybackError>;

    /// Bring the device (back) to the prepared state, e.g. after an underrun.
    fn prepare(&mut self) -> Result<(), DeviceFault>;

    /// Blocking interleaved write of whole frames. Returns frames written.
    fn write_interleaved(&mut self, data: &[u8]) -> Result<usize, DeviceFault>;

    /// Hardware pause (`true`) or resume (`false`).
    fn set_paused(&mut self, paused: bool) -> Result<(), DeviceFault>;

    /// Block until every submitted frame has been played.
    fn drain(&mut self) -> Result<(), DeviceFault>;
}

/// Opens playback devices by name.
pub trait PlaybackProvider {
    type Device: PcmDevice;

    fn open_playback(&self, name: &str) -> Result<Self::Device, DeviceFault>;
}
