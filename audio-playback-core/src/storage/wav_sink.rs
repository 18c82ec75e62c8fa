use std::fs::{self, File};
use std::io::{BufWriter, ErrorKind, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::models::audio_models::SampleFormat;
use crate::models::error::{DeviceFault, HwParameter, PlaybackError};
use crate::processing::hw_constraints::HwCapabilities;
use crate::processing::wav_format::{self, WAV_HEADER_SIZE};
use crate::traits::playback_provider::{CommittedParams, Negotiation, PcmDevice, PlaybackProvider};

/// Opens [`WavSinkDevice`]s. The device name is the output path.
#[derive(Debug, Clone, Default)]
pub struct WavSinkProvider {
    capabilities: HwCapabilities,
}

impl WavSinkProvider {
    pub fn new(capabilities: HwCapabilities) -> Self {
        Self { capabilities }
    }

    pub fn capabilities(&self) -> &HwCapabilities {
        &self.capabilities
    }
}

impl PlaybackProvider for WavSinkProvider {
    type Device = WavSinkDevice;

    fn open_playback(&self, name: &str) -> Result<WavSinkDevice, DeviceFault> {
        WavSinkDevice::create(PathBuf::from(name), self.capabilities.clone())
    }
}

/// Playback device that renders interleaved PCM into a WAV file.
///
/// ## File Format
///
/// ```text
/// [44-byte WAV header, sizes patched on drain and on drop]
/// [interleaved PCM exactly as written...]
/// ```
///
/// Writes never underrun. Pause is accepted and only blocks writes.
pub struct WavSinkDevice {
    path: PathBuf,
    capabilities: HwCapabilities,
    writer: Option<BufWriter<File>>,
    header: [u8; WAV_HEADER_SIZE],
    frame_bytes: usize,
    committed: Option<CommittedParams>,
    data_bytes: u64,
    paused: bool,
}

impl WavSinkDevice {
    fn create(path: PathBuf, capabilities: HwCapabilities) -> Result<Self, DeviceFault> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| open_fault(&path, e))?;
        }
        let file = File::create(&path).map_err(|e| open_fault(&path, e))?;
        log::debug!("wav sink: opened {}", path.display());

        Ok(Self {
            path,
            capabilities,
            writer: Some(BufWriter::new(file)),
            header: [0; WAV_HEADER_SIZE],
            frame_bytes: 0,
            committed: None,
            data_bytes: 0,
            paused: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// PCM bytes written so far (excluding the header).
    pub fn data_bytes(&self) -> u64 {
        self.data_bytes
    }

    pub fn committed(&self) -> Option<CommittedParams> {
        self.committed
    }

    fn writer(&mut self, op: &'static str) -> Result<&mut BufWriter<File>, DeviceFault> {
        self.writer
            .as_mut()
            .ok_or_else(|| DeviceFault::failed(op, "device closed"))
    }

    /// Patch the header sizes and flush everything to disk.
    fn finalize(&mut self) -> Result<(), DeviceFault> {
        if self.committed.is_none() {
            return Ok(());
        }
        wav_format::patch_data_size(&mut self.header, self.data_bytes);
        wav_format::patch_file_size(&mut self.header, WAV_HEADER_SIZE as u64 + self.data_bytes);
        let header = self.header;

        let writer = self.writer("drain")?;
        writer.flush().map_err(|e| io_fault("drain", e))?;
        let file = writer.get_mut();
        file.seek(SeekFrom::Start(0)).map_err(|e| io_fault("drain", e))?;
        file.write_all(&header).map_err(|e| io_fault("drain", e))?;
        file.seek(SeekFrom::End(0)).map_err(|e| io_fault("drain", e))?;
        file.flush().map_err(|e| io_fault("drain", e))
    }
}

impl PcmDevice for WavSinkDevice {
    fn configure(&mut self, negotiate: Negotiation<'_>) -> Result<CommittedParams, PlaybackError> {
        let (selection, committed) = {
            let mut space = self.capabilities.space();
            negotiate(&mut space)?;
            space
                .finish()
                .map_err(|fault| PlaybackError::unsupported(HwParameter::Commit, fault))?
        };
        let format = selection.format.unwrap_or(SampleFormat::S16Le);
        let channels = selection.channels.unwrap_or(1) as u16;

        self.header = wav_format::generate_wav_header(committed.sample_rate, format.bit_depth(), channels, 0);
        self.frame_bytes = channels as usize * format.bytes_per_sample();
        self.data_bytes = 0;

        let header = self.header;
        let writer = self
            .writer("configure")
            .map_err(|fault| PlaybackError::unsupported(HwParameter::Commit, fault))?;
        writer
            .seek(SeekFrom::Start(0))
            .and_then(|_| writer.write_all(&header))
            .map_err(|e| PlaybackError::unsupported(HwParameter::Commit, io_fault("configure", e)))?;

        self.committed = Some(committed);
        Ok(committed)
    }

    fn probe(&mut self, inspect: Negotiation<'_>) -> Result<(), PlaybackError> {
        let mut space = self.capabilities.space();
        inspect(&mut space)
    }

    fn prepare(&mut self) -> Result<(), DeviceFault> {
        if self.committed.is_none() {
            return Err(DeviceFault::failed("prepare", "hardware parameters not set"));
        }
        Ok(())
    }

    fn write_interleaved(&mut self, data: &[u8]) -> Result<usize, DeviceFault> {
        if self.committed.is_none() || self.frame_bytes == 0 {
            return Err(DeviceFault::failed("write", "hardware parameters not set"));
        }
        if self.paused {
            return Err(DeviceFault::failed("write", "device is paused"));
        }
        let frames = data.len() / self.frame_bytes;
        let bytes = frames * self.frame_bytes;
        self.writer("write")?
            .write_all(&data[..bytes])
            .map_err(|e| io_fault("write", e))?;
        self.data_bytes += bytes as u64;
        Ok(frames)
    }

    fn set_paused(&mut self, paused: bool) -> Result<(), DeviceFault> {
        self.paused = paused;
        Ok(())
    }

    fn drain(&mut self) -> Result<(), DeviceFault> {
        self.finalize()
    }
}

impl Drop for WavSinkDevice {
    fn drop(&mut self) {
        if let Err(e) = self.finalize() {
            log::warn!("wav sink: failed to finalize {}: {}", self.path.display(), e);
        }
    }
}

fn open_fault(path: &Path, e: std::io::Error) -> DeviceFault {
    match e.kind() {
        ErrorKind::NotFound => DeviceFault::NotFound,
        _ => DeviceFault::failed("open", format!("{}: {}", path.display(), e)),
    }
}

fn io_fault(op: &'static str, e: std::io::Error) -> DeviceFault {
    DeviceFault::failed(op, e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::hw_constraints::RateSupport;
    use crate::processing::wav_format::WavHeader;
    use crate::traits::playback_provider::HwParamSpace;

    fn temp_file_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("audio_playback_test_{}", name))
    }

    fn negotiate_stereo16(rate: u32) -> impl FnMut(&mut dyn HwParamSpace) -> Result<(), PlaybackError> {
        move |space: &mut dyn HwParamSpace| {
            space.set_access_interleaved().map_err(|f| PlaybackError::unsupported(HwParameter::Access, f))?;
            space
                .set_format(SampleFormat::S16Le)
                .map_err(|f| PlaybackError::unsupported(HwParameter::Format, f))?;
            space.set_channels(2).map_err(|f| PlaybackError::unsupported(HwParameter::Channels, f))?;
            space.set_rate_near(rate).map_err(|f| PlaybackError::unsupported(HwParameter::Rate, f))?;
            Ok(())
        }
    }

    #[test]
    fn drain_patches_header_sizes() {
        let path = temp_file_path("sink_drain.wav");
        let provider = WavSinkProvider::default();
        let mut device = provider.open_playback(path.to_str().unwrap()).unwrap();

        let committed = device.configure(&mut negotiate_stereo16(44100)).unwrap();
        assert_eq!(committed.sample_rate, 44100);
        device.prepare().unwrap();
        assert_eq!(device.write_interleaved(&[1u8; 16]).unwrap(), 4);
        assert_eq!(device.write_interleaved(&[2u8; 10]).unwrap(), 2);
        device.drain().unwrap();

        let bytes = fs::read(&path).unwrap();
        assert_eq!(bytes.len(), WAV_HEADER_SIZE + 24);
        let header = WavHeader::read_from(&mut &bytes[..]).unwrap();
        assert_eq!(header.data_bytes, 24);
        assert_eq!(header.wav_size, 36 + 24);
        assert_eq!(header.sample_rate, 44100);
        assert_eq!(header.num_channels, 2);

        drop(device);
        fs::remove_file(&path).ok();
    }

    #[test]
    fn drop_finalizes_header() {
        let path = temp_file_path("sink_drop.wav");
        {
            let mut device = WavSinkProvider::default().open_playback(path.to_str().unwrap()).unwrap();
            device.configure(&mut negotiate_stereo16(48000)).unwrap();
            device.write_interleaved(&[0u8; 8]).unwrap();
        }
        let bytes = fs::read(&path).unwrap();
        let header = WavHeader::read_from(&mut &bytes[..]).unwrap();
        assert_eq!(header.data_bytes, 8);
        fs::remove_file(&path).ok();
    }

    #[test]
    fn rate_snaps_to_supported_list() {
        let path = temp_file_path("sink_rate.wav");
        let caps = HwCapabilities::default().with_rates(RateSupport::discrete(vec![48000]));
        let mut device = WavSinkProvider::new(caps).open_playback(path.to_str().unwrap()).unwrap();
        let committed = device.configure(&mut negotiate_stereo16(44100)).unwrap();
        assert_eq!(committed.sample_rate, 48000);
        drop(device);
        fs::remove_file(&path).ok();
    }

    #[test]
    fn rejected_format_commits_nothing() {
        let path = temp_file_path("sink_reject.wav");
        let caps = HwCapabilities::default().with_formats(vec![SampleFormat::U8]);
        let mut device = WavSinkProvider::new(caps).open_playback(path.to_str().unwrap()).unwrap();

        let err = device.configure(&mut negotiate_stereo16(44100)).unwrap_err();
        assert!(matches!(
            err,
            PlaybackError::UnsupportedParameter {
                which: HwParameter::Format,
                ..
            }
        ));
        assert!(device.committed().is_none());
        assert!(device.write_interleaved(&[0u8; 4]).is_err());
        drop(device);
        fs::remove_file(&path).ok();
    }

    #[test]
    fn paused_device_refuses_writes() {
        let path = temp_file_path("sink_pause.wav");
        let mut device = WavSinkProvider::default().open_playback(path.to_str().unwrap()).unwrap();
        device.configure(&mut negotiate_stereo16(44100)).unwrap();
        device.set_paused(true).unwrap();
        assert!(device.write_interleaved(&[0u8; 4]).is_err());
        device.set_paused(false).unwrap();
        assert_eq!(device.write_interleaved(&[0u8; 4]).unwrap(), 1);
        drop(device);
        fs::remove_file(&path).ok();
    }
}
