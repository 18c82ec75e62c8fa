//! ALSA PCM playback provider.
//!
//! Opens a PCM in blocking playback mode and exposes its hardware parameter
//! refinement through `HwParamSpace`. Nothing reaches the driver until every
//! negotiation step has succeeded and `hw_params` commits the whole space.

use alsa::pcm::{Access, Format, Frames, HwParams, PCM};
use alsa::{Direction, ValueOr};

use audio_playback_core::models::audio_models::SampleFormat;
use audio_playback_core::models::error::{DeviceFault, HwParameter, PlaybackError};
use audio_playback_core::traits::playback_provider::{
    CommittedParams, HwParamSpace, Negotiation, PcmDevice, PlaybackProvider,
};

// errno values reported by alsa-lib.
const ENOENT: i32 = 2;
const EBUSY: i32 = 16;
const ENODEV: i32 = 19;
const EPIPE: i32 = 32;

/// Opens ALSA playback devices by name (`default`, `hw:0,0`, `plughw:0,0`, ...).
#[derive(Debug, Clone, Copy, Default)]
pub struct AlsaProvider;

impl AlsaProvider {
    pub fn new() -> Self {
        Self
    }
}

impl PlaybackProvider for AlsaProvider {
    type Device = AlsaDevice;

    fn open_playback(&self, name: &str) -> Result<AlsaDevice, DeviceFault> {
        if name.is_empty() || name.contains('\0') {
            return Err(DeviceFault::NotFound);
        }
        let pcm = PCM::new(name, Direction::Playback, false).map_err(|e| fault("open", e))?;
        log::debug!("alsa: opened {} for playback", name);
        Ok(AlsaDevice {
            pcm,
            name: name.to_string(),
        })
    }
}

/// An open ALSA playback PCM. Dropping it closes the PCM.
pub struct AlsaDevice {
    pcm: PCM,
    name: String,
}

impl AlsaDevice {
    pub fn name(&self) -> &str {
        &self.name
    }

    fn committed(&self) -> Result<CommittedParams, DeviceFault> {
        let hwp = self.pcm.hw_params_current().map_err(|e| fault("hw_params_current", e))?;
        Ok(CommittedParams {
            sample_rate: hwp.get_rate().map_err(|e| fault("get_rate", e))?,
            period_frames: hwp.get_period_size().map_err(|e| fault("get_period_size", e))? as u32,
            periods: hwp.get_periods().map_err(|e| fault("get_periods", e))?,
        })
    }
}

impl PcmDevice for AlsaDevice {
    fn configure(&mut self, negotiate: Negotiation<'_>) -> Result<CommittedParams, PlaybackError> {
        let commit_err = |f: DeviceFault| PlaybackError::unsupported(HwParameter::Commit, f);

        let hwp = HwParams::any(&self.pcm).map_err(|e| commit_err(fault("hw_params_any", e)))?;
        let mut space = AlsaParamSpace { hwp };
        negotiate(&mut space)?;
        self.pcm
            .hw_params(&space.hwp)
            .map_err(|e| commit_err(fault("hw_params", e)))?;
        drop(space);

        self.committed().map_err(commit_err)
    }

    fn probe(&mut self, inspect: Negotiation<'_>) -> Result<(), PlaybackError> {
        let hwp = HwParams::any(&self.pcm)
            .map_err(|e| PlaybackError::unsupported(HwParameter::Rate, fault("hw_params_any", e)))?;
        let mut space = AlsaParamSpace { hwp };
        inspect(&mut space)
    }

    fn prepare(&mut self) -> Result<(), DeviceFault> {
        self.pcm.prepare().map_err(|e| fault("prepare", e))
    }

    fn write_interleaved(&mut self, data: &[u8]) -> Result<usize, DeviceFault> {
        let io = self.pcm.io_bytes();
        io.writei(data).map_err(|e| fault("writei", e))
    }

    fn set_paused(&mut self, paused: bool) -> Result<(), DeviceFault> {
        let can_pause = self
            .pcm
            .hw_params_current()
            .map(|hwp| hwp.can_pause())
            .unwrap_or(false);
        if !can_pause {
            return Err(DeviceFault::Rejected(format!("{} cannot pause", self.name)));
        }
        self.pcm.pause(paused).map_err(|e| fault("pause", e))
    }

    fn drain(&mut self) -> Result<(), DeviceFault> {
        self.pcm.drain().map_err(|e| fault("drain", e))
    }
}

/// Uncommitted ALSA hardware parameter space.
struct AlsaParamSpace<'a> {
    hwp: HwParams<'a>,
}

impl HwParamSpace for AlsaParamSpace<'_> {
    fn set_access_interleaved(&mut self) -> Result<(), DeviceFault> {
        self.hwp.set_access(Access::RWInterleaved).map_err(rejected)
    }

    fn set_format(&mut self, format: SampleFormat) -> Result<(), DeviceFault> {
        let format = match format {
            SampleFormat::S16Le => Format::S16LE,
            SampleFormat::U8 => Format::U8,
        };
        self.hwp.set_format(format).map_err(rejected)
    }

    fn set_channels(&mut self, channels: u32) -> Result<(), DeviceFault> {
        self.hwp.set_channels(channels).map_err(rejected)
    }

    fn set_rate_near(&mut self, rate: u32) -> Result<u32, DeviceFault> {
        self.hwp.set_rate_near(rate, ValueOr::Nearest).map_err(rejected)
    }

    fn set_period_frames_near(&mut self, frames: u32) -> Result<u32, DeviceFault> {
        self.hwp
            .set_period_size_near(frames as Frames, ValueOr::Nearest)
            .map(|f| f as u32)
            .map_err(rejected)
    }

    fn set_periods_near(&mut self, periods: u32) -> Result<u32, DeviceFault> {
        // Ask for the buffer size that holds `periods` periods and let the
        // driver round it.
        let period = self.hwp.get_period_size().map_err(rejected)?;
        let wanted = period.saturating_mul(periods as Frames);
        self.hwp.set_buffer_size_near(wanted).map_err(rejected)?;
        self.hwp.get_periods().map_err(rejected)
    }

    fn rate_range(&self) -> Result<(u32, u32), DeviceFault> {
        let min = self.hwp.get_rate_min().map_err(rejected)?;
        let max = self.hwp.get_rate_max().map_err(rejected)?;
        Ok((min, max))
    }

    fn test_rate(&self, rate: u32) -> bool {
        self.hwp.test_rate(rate).is_ok()
    }
}

fn rejected(e: alsa::Error) -> DeviceFault {
    DeviceFault::Rejected(e.to_string())
}

/// Translate an alsa-lib error into a backend-neutral fault.
fn fault(op: &'static str, e: alsa::Error) -> DeviceFault {
    match e.errno() {
        EPIPE => DeviceFault::Underrun,
        EBUSY => DeviceFault::Busy,
        ENOENT | ENODEV => DeviceFault::NotFound,
        _ => DeviceFault::failed(op, e.to_string()),
    }
}
