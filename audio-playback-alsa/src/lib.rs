//! # audio-playback-alsa
//!
//! Linux ALSA backend for audio-playback-core.
//!
//! Provides:
//! - `AlsaProvider` / `AlsaDevice`: blocking PCM playback via alsa-lib
//! - `KeyboardControl`: raw-mode keyboard thread producing control commands
//!
//! ## Platform Requirements
//! - Linux with alsa-lib development headers (`libasound2-dev`) for linking
//!
//! ## Usage
//! ```ignore
//! use audio_playback_alsa::AlsaProvider;
//! use audio_playback_core::{open_and_configure, DeviceConfig, NoControl, SineSource, StreamingLoop};
//!
//! let mut session = open_and_configure(&AlsaProvider::new(), "default", &DeviceConfig::default())?;
//! let mut tone = SineSource::default().limit_periods(100);
//! StreamingLoop::default().run(&mut session, &mut tone, &mut NoControl)?;
//! ```

#[cfg(target_os = "linux")]
pub mod alsa_device;
pub mod keyboard;

#[cfg(target_os = "linux")]
pub use alsa_device::{AlsaDevice, AlsaProvider};
pub use keyboard::{map_key, KeyboardControl};
