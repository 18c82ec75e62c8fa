//! # audio-playback-core
//!
//! Platform-agnostic PCM playback core library.
//!
//! Provides hardware parameter negotiation, period buffering, sample
//! sources, WAV I/O, underrun recovery and a pausable streaming loop.
//! Platform backends (Linux ALSA) implement the `PlaybackProvider` and
//! `PcmDevice` traits and plug into the generic `Session`.
//!
//! ## Architecture
//!
//! ```text
//! audio-playback-core (this crate)
//! ├── traits/       ← PlaybackProvider, PcmDevice, HwParamSpace, SampleSource, ControlChannel, PlaybackDelegate
//! ├── models/       ← PlaybackError, SessionState, DeviceConfig, PlaybackConfiguration, PlaybackReport
//! ├── processing/   ← PeriodBuffer, sine/buzzer generators, WAV header parsing, HwCapabilities
//! ├── session/      ← negotiator, Session (state machine + underrun recovery), StreamingLoop
//! └── storage/      ← WavFileSource, WavSinkDevice
//! ```
//!
//! ## Data flow
//!
//! ```text
//! [ControlChannel] ──poll──┐
//!                          ↓
//! [SampleSource] → [PeriodBuffer] → [StreamingLoop] → [Session] → [PcmDevice]
//! ```

pub mod models;
pub mod processing;
pub mod session;
pub mod storage;
pub mod traits;

// Re-export key types at crate root for convenience.
pub use models::audio_models::{DeviceConfig, SampleFormat, SessionStats};
pub use models::config::{PlaybackConfiguration, RecoveryPolicy};
pub use models::error::{DeviceFault, HwParameter, PlaybackError};
pub use models::playback_report::PlaybackReport;
pub use models::state::{EndReason, SessionState};
pub use processing::hw_constraints::{CapabilitySpace, HwCapabilities, RateSupport};
pub use processing::period_buffer::PeriodBuffer;
pub use processing::synth::{BuzzerSource, SineSource};
pub use processing::wav_format::WavHeader;
pub use session::negotiator::{discover_rate, open_and_configure, open_session, RateDiscovery};
pub use session::playback_session::Session;
pub use session::streaming_loop::StreamingLoop;
pub use storage::wav_sink::{WavSinkDevice, WavSinkProvider};
pub use storage::wav_source::WavFileSource;
pub use traits::control_channel::{ChannelControl, ControlChannel, ControlCommand, NoControl};
pub use traits::playback_delegate::PlaybackDelegate;
pub use traits::playback_provider::{CommittedParams, HwParamSpace, Negotiation, PcmDevice, PlaybackProvider};
pub use traits::sample_source::{Limited, SampleSource};
