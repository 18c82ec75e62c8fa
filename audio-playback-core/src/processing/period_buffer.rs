use crate::models::audio_models::{DeviceConfig, SampleFormat};

/// Byte buffer holding exactly one hardware period of interleaved frames.
///
/// Allocated once per session and overwritten on every iteration. Owned by
/// the streaming loop; sources only ever see it through `&mut`.
#[derive(Debug, Clone)]
pub struct PeriodBuffer {
    data: Vec<u8>,
    format: SampleFormat,
    channels: usize,
    frame_bytes: usize,
}

impl PeriodBuffer {
    pub fn new(config: &DeviceConfig) -> Self {
        Self {
            data: vec![0; config.period_bytes()],
            format: config.format,
            channels: config.channels as usize,
            frame_bytes: config.frame_bytes(),
        }
    }

    pub fn period_frames(&self) -> usize {
        self.data.len() / self.frame_bytes
    }

    pub fn frame_bytes(&self) -> usize {
        self.frame_bytes
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn format(&self) -> SampleFormat {
        self.format
    }

    /// Length of a full period in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_mut_bytes(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// The first `bytes` of the buffer, rounded down to whole frames.
    pub fn filled(&self, bytes: usize) -> &[u8] {
        let bytes = self.align_down(bytes.min(self.data.len()));
        &self.data[..bytes]
    }

    /// Round a byte count down to a whole number of frames.
    pub fn align_down(&self, bytes: usize) -> usize {
        bytes - bytes % self.frame_bytes
    }

    /// Fill the whole period frame by frame.
    ///
    /// `frame(index, period_frames)` returns the left and right sample for
    /// one frame. Mono buffers take the left sample. Returns bytes written.
    pub fn fill_frames(&mut self, mut frame: impl FnMut(usize, usize) -> (i16, i16)) -> usize {
        let period_frames = self.period_frames();
        let format = self.format;
        let channels = self.channels;

        for (index, chunk) in self.data.chunks_exact_mut(self.frame_bytes).enumerate() {
            let (left, right) = frame(index, period_frames);
            let mut offset = format.encode_i16(left, chunk);
            if channels > 1 {
                offset += format.encode_i16(right, &mut chunk[offset..]);
            }
            debug_assert_eq!(offset, chunk.len());
        }
        self.data.len()
    }
}
