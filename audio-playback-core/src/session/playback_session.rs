use std::sync::Arc;

use crate::models::audio_models::{DeviceConfig, SessionStats};
use crate::models::config::RecoveryPolicy;
use crate::models::error::{DeviceFault, PlaybackError};
use crate::models::state::SessionState;
use crate::traits::playback_delegate::PlaybackDelegate;
use crate::traits::playback_provider::PcmDevice;

/// A configured, exclusively owned playback device.
///
/// Created by [`open_and_configure`](crate::session::negotiator::open_and_configure)
/// in the `Prepared` state. The session owns the device handle; closing or
/// dropping the session releases it.
///
/// State transitions:
/// ```text
/// prepared ─write─→ running ←pause/resume→ paused
///     └──pause──────────────────────────────↗
/// running | paused | prepared ─drain─→ draining → closed
/// any ─fatal error─→ closed
/// ```
pub struct Session<D: PcmDevice> {
    device: Option<D>,
    device_name: String,
    config: DeviceConfig,
    state: SessionState,
    stats: SessionStats,
    recovery: RecoveryPolicy,
    delegate: Option<Arc<dyn PlaybackDelegate>>,

    // Hardware-side pause tracking. The software flag is `state`.
    hw_started: bool,
    hw_paused: bool,
    hw_pause_supported: bool,
}

impl<D: PcmDevice> Session<D> {
    pub(crate) fn new(device: D, device_name: impl Into<String>, config: DeviceConfig) -> Self {
        Self {
            device: Some(device),
            device_name: device_name.into(),
            config,
            state: SessionState::Prepared,
            stats: SessionStats::default(),
            recovery: RecoveryPolicy::default(),
            delegate: None,
            hw_started: false,
            hw_paused: false,
            hw_pause_supported: true,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_closed(&self) -> bool {
        self.state.is_closed()
    }

    /// Configuration the hardware committed to.
    pub fn config(&self) -> &DeviceConfig {
        &self.config
    }

    pub fn device_name(&self) -> &str {
        &self.device_name
    }

    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    pub fn recovery_policy(&self) -> RecoveryPolicy {
        self.recovery
    }

    pub fn set_recovery_policy(&mut self, recovery: RecoveryPolicy) {
        self.recovery = recovery;
    }

    pub fn set_delegate(&mut self, delegate: Arc<dyn PlaybackDelegate>) {
        self.delegate = Some(delegate);
    }

    /// Write one period (or a shorter final period) of interleaved frames.
    ///
    /// Blocks until the device accepted every frame. Underruns are recovered
    /// by re-preparing the device and writing the same bytes again, within
    /// the session's [`RecoveryPolicy`]. Any other device failure closes the
    /// session and returns `UnrecoverableDevice`.
    ///
    /// Returns the number of frames written.
    pub fn write_period(&mut self, data: &[u8]) -> Result<usize, PlaybackError> {
        match self.state {
            SessionState::Closed => return Err(PlaybackError::SessionClosed),
            SessionState::Paused | SessionState::Draining => {
                return Err(PlaybackError::InvalidState(format!("cannot write while {:?}", self.state)));
            }
            SessionState::Prepared | SessionState::Running => {}
        }

        let frame_bytes = self.config.frame_bytes();
        if data.len() > self.config.period_bytes() {
            return Err(PlaybackError::InvalidState(format!(
                "write of {} bytes exceeds one period ({} bytes)",
                data.len(),
                self.config.period_bytes()
            )));
        }
        if data.len() % frame_bytes != 0 {
            return Err(PlaybackError::InvalidState(format!(
                "write of {} bytes is not a whole number of {}-byte frames",
                data.len(),
                frame_bytes
            )));
        }
        if data.is_empty() {
            return Ok(0);
        }

        self.set_state(SessionState::Running);

        let mut offset = 0;
        let mut consecutive_underruns = 0u32;
        while offset < data.len() {
            let device = self.device.as_mut().ok_or(PlaybackError::SessionClosed)?;
            match device.write_interleaved(&data[offset..]) {
                Ok(frames) => {
                    self.hw_started = true;
                    offset += frames * frame_bytes;
                    consecutive_underruns = 0;
                }
                Err(DeviceFault::Underrun) => {
                    consecutive_underruns += 1;
                    self.recover_underrun(consecutive_underruns)?;
                }
                Err(fault) => {
                    return Err(self.abort(PlaybackError::UnrecoverableDevice(format!("write failed: {}", fault))));
                }
            }
        }

        let frames = data.len() / frame_bytes;
        self.stats.periods_written += 1;
        self.stats.frames_written += frames as u64;
        self.stats.bytes_written += data.len() as u64;
        Ok(frames)
    }

    fn recover_underrun(&mut self, consecutive: u32) -> Result<(), PlaybackError> {
        if !self.recovery.allows(consecutive) {
            return Err(self.abort(PlaybackError::UnrecoverableDevice(format!(
                "underrun persisted after {} recovery attempts",
                consecutive - 1
            ))));
        }
        log::warn!("{}: buffer underrun, re-preparing (attempt {})", self.device_name, consecutive);

        let prepared = match self.device.as_mut() {
            Some(device) => device.prepare(),
            None => return Err(PlaybackError::SessionClosed),
        };
        if let Err(fault) = prepared {
            return Err(self.abort(PlaybackError::UnrecoverableDevice(format!(
                "re-prepare after underrun failed: {}",
                fault
            ))));
        }

        // A prepared stream is neither running nor paused.
        self.hw_paused = false;
        self.stats.underruns_recovered += 1;
        if let Some(ref delegate) = self.delegate {
            delegate.on_underrun_recovered(self.stats.underruns_recovered);
        }
        Ok(())
    }

    /// Request pause. Pausing an already paused session is a no-op.
    pub fn pause(&mut self) -> Result<(), PlaybackError> {
        match self.state {
            SessionState::Closed => Err(PlaybackError::SessionClosed),
            SessionState::Draining => Err(PlaybackError::InvalidState("cannot pause while draining".into())),
            SessionState::Paused => Ok(()),
            SessionState::Prepared | SessionState::Running => {
                self.set_state(SessionState::Paused);
                Ok(())
            }
        }
    }

    /// Request resume. Resuming a session that is not paused is a no-op.
    pub fn resume(&mut self) -> Result<(), PlaybackError> {
        match self.state {
            SessionState::Closed => Err(PlaybackError::SessionClosed),
            SessionState::Paused => {
                self.set_state(SessionState::Running);
                Ok(())
            }
            _ => Ok(()),
        }
    }

    pub fn toggle_pause(&mut self) -> Result<(), PlaybackError> {
        if self.state.is_paused() {
            self.resume()
        } else {
            self.pause()
        }
    }

    /// Bring the hardware pause state in line with the session state.
    ///
    /// Only acts once the hardware has started. If the device rejects pause
    /// the session keeps pausing in software only.
    pub fn sync_hardware_pause(&mut self) -> Result<(), PlaybackError> {
        if self.state.is_closed() {
            return Err(PlaybackError::SessionClosed);
        }
        let want_paused = self.state.is_paused();
        if !self.hw_started || !self.hw_pause_supported || want_paused == self.hw_paused {
            return Ok(());
        }
        let result = match self.device.as_mut() {
            Some(device) => device.set_paused(want_paused),
            None => return Err(PlaybackError::SessionClosed),
        };

        match result {
            Ok(()) => {
                self.hw_paused = want_paused;
                self.stats.hardware_pause_toggles += 1;
                log::debug!("{}: hardware {}", self.device_name, if want_paused { "paused" } else { "resumed" });
                Ok(())
            }
            Err(fault) if want_paused => {
                log::warn!(
                    "{}: hardware pause not supported ({}), pausing in software",
                    self.device_name,
                    fault
                );
                self.hw_pause_supported = false;
                Ok(())
            }
            Err(fault) => {
                log::warn!("{}: hardware resume failed ({}), re-preparing", self.device_name, fault);
                self.hw_pause_supported = false;
                self.hw_paused = false;
                let prepared = match self.device.as_mut() {
                    Some(device) => device.prepare(),
                    None => return Err(PlaybackError::SessionClosed),
                };
                prepared.map_err(|fault| {
                    self.abort(PlaybackError::UnrecoverableDevice(format!("resume failed: {}", fault)))
                })
            }
        }
    }

    /// Let every submitted frame play out, then close the session.
    pub fn drain(&mut self) -> Result<(), PlaybackError> {
        if self.state.is_closed() {
            return Err(PlaybackError::SessionClosed);
        }
        self.set_state(SessionState::Draining);

        if self.hw_started {
            let device = self.device.as_mut().ok_or(PlaybackError::SessionClosed)?;
            if self.hw_paused {
                if let Err(fault) = device.set_paused(false) {
                    log::debug!("{}: unpause before drain failed: {}", self.device_name, fault);
                }
                self.hw_paused = false;
            }
            if let Err(fault) = device.drain() {
                return Err(self.abort(PlaybackError::UnrecoverableDevice(format!("drain failed: {}", fault))));
            }
        }

        self.close();
        Ok(())
    }

    /// Release the device. Safe to call more than once.
    pub fn close(&mut self) {
        if let Some(device) = self.device.take() {
            drop(device);
            log::debug!("{}: device released", self.device_name);
        }
        self.set_state(SessionState::Closed);
    }

    /// Close the session because of `error` and hand the error back.
    pub(crate) fn abort(&mut self, error: PlaybackError) -> PlaybackError {
        if self.state.is_closed() {
            return error;
        }
        log::error!("{}: {}", self.device_name, error);
        if let Some(ref delegate) = self.delegate {
            delegate.on_error(&error);
        }
        self.close();
        error
    }

    fn set_state(&mut self, state: SessionState) {
        if self.state == state {
            return;
        }
        log::debug!("{}: {:?} -> {:?}", self.device_name, self.state, state);
        self.state = state;
        if let Some(ref delegate) = self.delegate {
            delegate.on_state_changed(state);
        }
    }
}
