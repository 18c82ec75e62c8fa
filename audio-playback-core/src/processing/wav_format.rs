//! WAV file format utilities.
//!
//! Parses and validates RIFF WAV headers for playback, and generates the
//! standard 44-byte header for the file sink device.

use std::io::{self, Read};

use crate::models::audio_models::{DeviceConfig, SampleFormat};
use crate::models::error::PlaybackError;

/// Size of the standard WAV RIFF header in bytes.
pub const WAV_HEADER_SIZE: usize = 44;

/// PCM format code in the `fmt ` chunk.
pub const WAVE_FORMAT_PCM: u16 = 1;

/// Fields of a canonical RIFF WAV header.
///
/// Layout:
/// ```text
/// [0-3]    "RIFF"
/// [4-7]    file size - 8
/// [8-11]   "WAVE"
/// [12-15]  "fmt "
/// [16-19]  fmt chunk size (16 for PCM)
/// [20-21]  audio format (1 = PCM)
/// [22-23]  channels
/// [24-27]  sample_rate
/// [28-31]  byte_rate = sample_rate * channels * bit_depth / 8
/// [32-33]  block_align = channels * bit_depth / 8
/// [34-35]  bit_depth
/// [36-39]  "data"
/// [40-43]  data_size
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavHeader {
    pub riff_header: [u8; 4],
    pub wav_size: u32,
    pub wave_header: [u8; 4],
    pub fmt_header: [u8; 4],
    pub fmt_chunk_size: u32,
    pub audio_format: u16,
    pub num_channels: u16,
    pub sample_rate: u32,
    pub byte_rate: u32,
    pub sample_alignment: u16,
    pub bit_depth: u16,
    pub data_header: [u8; 4],
    pub data_bytes: u32,
}

impl WavHeader {
    /// Parse the canonical 44-byte layout without validating it.
    pub fn from_canonical(bytes: &[u8; WAV_HEADER_SIZE]) -> Self {
        Self {
            riff_header: tag(bytes, 0),
            wav_size: le_u32(bytes, 4),
            wave_header: tag(bytes, 8),
            fmt_header: tag(bytes, 12),
            fmt_chunk_size: le_u32(bytes, 16),
            audio_format: le_u16(bytes, 20),
            num_channels: le_u16(bytes, 22),
            sample_rate: le_u32(bytes, 24),
            byte_rate: le_u32(bytes, 28),
            sample_alignment: le_u16(bytes, 32),
            bit_depth: le_u16(bytes, 34),
            data_header: tag(bytes, 36),
            data_bytes: le_u32(bytes, 40),
        }
    }

    /// Read a header from the start of a WAV stream and validate it.
    ///
    /// Chunks other than `fmt ` that appear before `data` are skipped. On
    /// success the reader is positioned at the first byte of audio data.
    pub fn read_from<R: Read>(reader: &mut R) -> Result<Self, PlaybackError> {
        let mut riff = [0u8; 12];
        read_exact(reader, &mut riff, "RIFF descriptor")?;
        if &riff[0..4] != b"RIFF" || &riff[8..12] != b"WAVE" {
            return Err(PlaybackError::MalformedInputFile("missing RIFF/WAVE signature".into()));
        }

        let mut fmt: Option<[u8; 16]> = None;
        let mut fmt_chunk_size = 0;
        loop {
            let mut chunk = [0u8; 8];
            read_exact(reader, &mut chunk, "chunk header")?;
            let id = tag(&chunk, 0);
            let size = le_u32(&chunk, 4);

            match &id {
                b"fmt " => {
                    if size < 16 {
                        return Err(PlaybackError::MalformedInputFile(format!(
                            "fmt chunk too short: {} bytes",
                            size
                        )));
                    }
                    let mut body = [0u8; 16];
                    read_exact(reader, &mut body, "fmt chunk")?;
                    skip(reader, padded(size) - 16)?;
                    fmt = Some(body);
                    fmt_chunk_size = size;
                }
                b"data" => {
                    let body = fmt.ok_or_else(|| {
                        PlaybackError::MalformedInputFile("data chunk before fmt chunk".into())
                    })?;
                    let header = Self {
                        riff_header: tag(&riff, 0),
                        wav_size: le_u32(&riff, 4),
                        wave_header: tag(&riff, 8),
                        fmt_header: *b"fmt ",
                        fmt_chunk_size,
                        audio_format: le_u16(&body, 0),
                        num_channels: le_u16(&body, 2),
                        sample_rate: le_u32(&body, 4),
                        byte_rate: le_u32(&body, 8),
                        sample_alignment: le_u16(&body, 12),
                        bit_depth: le_u16(&body, 14),
                        data_header: id,
                        data_bytes: size,
                    };
                    header.validate()?;
                    return Ok(header);
                }
                _ => {
                    log::debug!(
                        "skipping {:?} chunk ({} bytes)",
                        String::from_utf8_lossy(&id),
                        size
                    );
                    skip(reader, padded(size))?;
                }
            }
        }
    }

    /// Reject anything the playback path cannot play verbatim.
    pub fn validate(&self) -> Result<(), PlaybackError> {
        if &self.riff_header != b"RIFF" || &self.wave_header != b"WAVE" {
            return Err(PlaybackError::MalformedInputFile("missing RIFF/WAVE signature".into()));
        }
        if &self.fmt_header != b"fmt " || self.fmt_chunk_size < 16 {
            return Err(PlaybackError::MalformedInputFile("missing or short fmt chunk".into()));
        }
        if &self.data_header != b"data" {
            return Err(PlaybackError::MalformedInputFile("missing data chunk".into()));
        }
        if self.audio_format != WAVE_FORMAT_PCM {
            return Err(PlaybackError::UnsupportedFileFormat(format!(
                "audio format {} is not PCM",
                self.audio_format
            )));
        }
        if SampleFormat::from_bit_depth(self.bit_depth).is_none() {
            return Err(PlaybackError::UnsupportedFileFormat(format!(
                "unsupported bit depth: {}",
                self.bit_depth
            )));
        }
        if self.num_channels == 0 || self.num_channels as u32 > DeviceConfig::MAX_CHANNELS {
            return Err(PlaybackError::UnsupportedFileFormat(format!(
                "unsupported channel count: {}",
                self.num_channels
            )));
        }
        if self.sample_rate == 0 {
            return Err(PlaybackError::MalformedInputFile("sample rate is zero".into()));
        }
        let expected_alignment = self.num_channels * self.bit_depth / 8;
        if self.sample_alignment != expected_alignment {
            return Err(PlaybackError::MalformedInputFile(format!(
                "block align {} does not match {} channels of {} bits",
                self.sample_alignment, self.num_channels, self.bit_depth
            )));
        }
        Ok(())
    }

    pub fn sample_format(&self) -> Option<SampleFormat> {
        SampleFormat::from_bit_depth(self.bit_depth)
    }

    /// Bytes per interleaved frame.
    pub fn frame_bytes(&self) -> usize {
        self.sample_alignment as usize
    }

    pub fn duration_secs(&self) -> f64 {
        let bytes_per_sec = self.sample_rate as f64 * self.frame_bytes() as f64;
        if bytes_per_sec == 0.0 {
            return 0.0;
        }
        self.data_bytes as f64 / bytes_per_sec
    }

    /// Playback request matching this file, with default period hints.
    pub fn device_config(&self) -> Result<DeviceConfig, PlaybackError> {
        self.validate()?;
        let format = self.sample_format().ok_or_else(|| {
            PlaybackError::UnsupportedFileFormat(format!("unsupported bit depth: {}", self.bit_depth))
        })?;
        Ok(DeviceConfig::new(self.sample_rate, self.num_channels as u32, format))
    }
}

/// Generate a 44-byte WAV RIFF header.
///
/// Format: PCM (format code 1), little-endian.
pub fn generate_wav_header(sample_rate: u32, bit_depth: u16, channels: u16, data_size: u32) -> [u8; WAV_HEADER_SIZE] {
    let byte_rate = sample_rate * channels as u32 * bit_depth as u32 / 8;
    let block_align = channels * bit_depth / 8;
    let chunk_size = 36 + data_size;

    let mut header = [0u8; WAV_HEADER_SIZE];

    // RIFF chunk descriptor
    header[0..4].copy_from_slice(b"RIFF");
    header[4..8].copy_from_slice(&chunk_size.to_le_bytes());
    header[8..12].copy_from_slice(b"WAVE");

    // fmt sub-chunk
    header[12..16].copy_from_slice(b"fmt ");
    header[16..20].copy_from_slice(&16u32.to_le_bytes());
    header[20..22].copy_from_slice(&WAVE_FORMAT_PCM.to_le_bytes());
    header[22..24].copy_from_slice(&channels.to_le_bytes());
    header[24..28].copy_from_slice(&sample_rate.to_le_bytes());
    header[28..32].copy_from_slice(&byte_rate.to_le_bytes());
    header[32..34].copy_from_slice(&block_align.to_le_bytes());
    header[34..36].copy_from_slice(&bit_depth.to_le_bytes());

    // data sub-chunk
    header[36..40].copy_from_slice(b"data");
    header[40..44].copy_from_slice(&data_size.to_le_bytes());

    header
}

/// Patch the file-size field at offset 4 (RIFF chunk size = file_size - 8).
pub fn patch_file_size(header: &mut [u8], total_file_size: u64) {
    let chunk_size = total_file_size.saturating_sub(8).min(u32::MAX as u64) as u32;
    header[4..8].copy_from_slice(&chunk_size.to_le_bytes());
}

/// Patch the data-size field at offset 40.
pub fn patch_data_size(header: &mut [u8], data_size: u64) {
    let data_size_u32 = data_size.min(u32::MAX as u64) as u32;
    header[40..44].copy_from_slice(&data_size_u32.to_le_bytes());
}

fn tag(bytes: &[u8], at: usize) -> [u8; 4] {
    [bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]]
}

fn le_u16(bytes: &[u8], at: usize) -> u16 {
    u16::from_le_bytes([bytes[at], bytes[at + 1]])
}

fn le_u32(bytes: &[u8], at: usize) -> u32 {
    u32::from_le_bytes(tag(bytes, at))
}

/// RIFF chunks are word aligned.
fn padded(size: u32) -> u64 {
    size as u64 + (size as u64 & 1)
}

fn read_exact<R: Read>(reader: &mut R, buf: &mut [u8], what: &str) -> Result<(), PlaybackError> {
    reader.read_exact(buf).map_err(|e| match e.kind() {
        io::ErrorKind::UnexpectedEof => PlaybackError::MalformedInputFile(format!("truncated {}", what)),
        _ => PlaybackError::Io(e.to_string()),
    })
}

fn skip<R: Read>(reader: &mut R, bytes: u64) -> Result<(), PlaybackError> {
    let skipped = io::copy(&mut reader.by_ref().take(bytes), &mut io::sink())?;
    if skipped < bytes {
        return Err(PlaybackError::MalformedInputFile("truncated chunk".into()));
    }
    Ok(())
}
