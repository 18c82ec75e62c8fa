use std::fs::File;
use std::io::{BufReader, ErrorKind, Read, Take};
use std::path::Path;

use crate::models::audio_models::DeviceConfig;
use crate::models::error::PlaybackError;
use crate::processing::period_buffer::PeriodBuffer;
use crate::processing::wav_format::WavHeader;
use crate::traits::sample_source::SampleSource;

/// Sequential reader over the data chunk of a WAV file.
///
/// The reader is bounded by the header's `data_bytes`, so chunks after the
/// audio data are never played.
pub struct WavFileSource<R: Read> {
    header: WavHeader,
    reader: Take<R>,
    bytes_produced: u64,
    exhausted: bool,
}

impl WavFileSource<BufReader<File>> {
    /// Open and validate a WAV file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, PlaybackError> {
        let path = path.as_ref();
        let file = File::open(path)
            .map_err(|e| PlaybackError::Io(format!("failed to open {}: {}", path.display(), e)))?;
        Self::from_reader(BufReader::new(file))
    }
}

impl<R: Read> WavFileSource<R> {
    pub fn from_reader(mut reader: R) -> Result<Self, PlaybackError> {
        let header = WavHeader::read_from(&mut reader)?;
        log::debug!(
            "wav: {} Hz, {} ch, {} bit, {} data bytes ({:.2}s)",
            header.sample_rate,
            header.num_channels,
            header.bit_depth,
            header.data_bytes,
            header.duration_secs()
        );
        Ok(Self {
            header,
            reader: reader.take(header.data_bytes as u64),
            bytes_produced: 0,
            exhausted: header.data_bytes == 0,
        })
    }

    pub fn header(&self) -> &WavHeader {
        &self.header
    }

    /// Stream parameters to request from the device.
    pub fn device_config(&self) -> Result<DeviceConfig, PlaybackError> {
        self.header.device_config()
    }

    pub fn bytes_produced(&self) -> u64 {
        self.bytes_produced
    }

    /// Read until `buf` is full or the data runs out.
    fn fill(&mut self, buf: &mut [u8]) -> Result<usize, PlaybackError> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.reader.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(PlaybackError::Io(format!("wav read failed: {}", e))),
            }
        }
        Ok(filled)
    }
}

impl<R: Read> SampleSource for WavFileSource<R> {
    fn produce_next_period(&mut self, buffer: &mut PeriodBuffer) -> Result<usize, PlaybackError> {
        if self.exhausted {
            return Ok(0);
        }
        let capacity = buffer.len();
        let filled = self.fill(buffer.as_mut_bytes())?;
        if filled < capacity || self.reader.limit() == 0 {
            self.exhausted = true;
        }

        let aligned = buffer.align_down(filled);
        if aligned < filled {
            log::debug!("wav: dropping {} byte partial frame at end of data", filled - aligned);
        }
        self.bytes_produced += aligned as u64;
        Ok(aligned)
    }

    fn is_exhausted(&self) -> bool {
        self.exhausted
    }
}
