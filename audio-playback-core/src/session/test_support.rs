//! Scripted in-memory device for session and loop tests.

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};

use crate::models::error::{DeviceFault, HwParameter, PlaybackError};
use crate::models::state::SessionState;
use crate::processing::hw_constraints::HwCapabilities;
use crate::traits::control_channel::{ControlChannel, ControlCommand};
use crate::traits::playback_delegate::PlaybackDelegate;
use crate::traits::playback_provider::{CommittedParams, Negotiation, PcmDevice, PlaybackProvider};

/// Everything the fake device saw, shared with the test.
#[derive(Debug, Default)]
pub struct DeviceLog {
    pub opened: u32,
    pub committed: Option<CommittedParams>,
    pub probes: u32,
    pub prepares: u32,
    /// Every write attempt, including failed ones.
    pub attempts: Vec<Vec<u8>>,
    /// Successful writes only.
    pub writes: Vec<Vec<u8>>,
    pub pause_calls: Vec<bool>,
    pub drained: bool,
    pub released: bool,
}

#[derive(Clone)]
pub struct ScriptedProvider {
    pub capabilities: HwCapabilities,
    pub open_fault: Option<DeviceFault>,
    log: Arc<Mutex<DeviceLog>>,
    faults: Arc<Mutex<VecDeque<Option<DeviceFault>>>>,
    hardware_pause: bool,
    prepare_limit: Option<u32>,
}

impl Default for ScriptedProvider {
    fn default() -> Self {
        Self {
            capabilities: HwCapabilities {
                period_frames: 1..=8192,
                ..HwCapabilities::default()
            },
            open_fault: None,
            log: Arc::new(Mutex::new(DeviceLog::default())),
            faults: Arc::new(Mutex::new(VecDeque::new())),
            hardware_pause: true,
            prepare_limit: None,
        }
    }
}

impl ScriptedProvider {
    pub fn with_capabilities(mut self, capabilities: HwCapabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    /// Outcome of successive write attempts; `None` succeeds. Once the
    /// script runs out every write succeeds.
    pub fn with_faults(self, faults: impl IntoIterator<Item = Option<DeviceFault>>) -> Self {
        self.faults.lock().extend(faults);
        self
    }

    pub fn with_open_fault(mut self, fault: DeviceFault) -> Self {
        self.open_fault = Some(fault);
        self
    }

    pub fn without_hardware_pause(mut self) -> Self {
        self.hardware_pause = false;
        self
    }

    /// Fail every `prepare` after the first `count`.
    pub fn with_prepare_failure_after(mut self, count: u32) -> Self {
        self.prepare_limit = Some(count);
        self
    }

    pub fn log(&self) -> MutexGuard<'_, DeviceLog> {
        self.log.lock()
    }
}

impl PlaybackProvider for ScriptedProvider {
    type Device = ScriptedDevice;

    fn open_playback(&self, _name: &str) -> Result<ScriptedDevice, DeviceFault> {
        if let Some(ref fault) = self.open_fault {
            return Err(fault.clone());
        }
        self.log.lock().opened += 1;
        Ok(ScriptedDevice {
            capabilities: self.capabilities.clone(),
            log: Arc::clone(&self.log),
            faults: Arc::clone(&self.faults),
            hardware_pause: self.hardware_pause,
            prepare_limit: self.prepare_limit,
            frame_bytes: 0,
        })
    }
}

pub struct ScriptedDevice {
    capabilities: HwCapabilities,
    log: Arc<Mutex<DeviceLog>>,
    faults: Arc<Mutex<VecDeque<Option<DeviceFault>>>>,
    hardware_pause: bool,
    prepare_limit: Option<u32>,
    frame_bytes: usize,
}

impl PcmDevice for ScriptedDevice {
    fn configure(&mut self, negotiate: Negotiation<'_>) -> Result<CommittedParams, PlaybackError> {
        let mut space = self.capabilities.space();
        negotiate(&mut space)?;
        let (selection, committed) = space
            .finish()
            .map_err(|fault| PlaybackError::unsupported(HwParameter::Commit, fault))?;

        let bytes_per_sample = selection.format.map_or(2, |f| f.bytes_per_sample());
        self.frame_bytes = selection.channels.unwrap_or(1) as usize * bytes_per_sample;
        self.log.lock().committed = Some(committed);
        Ok(committed)
    }

    fn probe(&mut self, inspect: Negotiation<'_>) -> Result<(), PlaybackError> {
        self.log.lock().probes += 1;
        let mut space = self.capabilities.space();
        inspect(&mut space)
    }

    fn prepare(&mut self) -> Result<(), DeviceFault> {
        let mut log = self.log.lock();
        log.prepares += 1;
        match self.prepare_limit {
            Some(limit) if log.prepares > limit => Err(DeviceFault::failed("prepare", "EIO")),
            _ => Ok(()),
        }
    }

    fn write_interleaved(&mut self, data: &[u8]) -> Result<usize, DeviceFault> {
        let mut log = self.log.lock();
        log.attempts.push(data.to_vec());
        if let Some(Some(fault)) = self.faults.lock().pop_front() {
            return Err(fault);
        }
        log.writes.push(data.to_vec());
        Ok(data.len() / self.frame_bytes.max(1))
    }

    fn set_paused(&mut self, paused: bool) -> Result<(), DeviceFault> {
        self.log.lock().pause_calls.push(paused);
        if !self.hardware_pause {
            return Err(DeviceFault::Rejected("pause not supported".into()));
        }
        Ok(())
    }

    fn drain(&mut self) -> Result<(), DeviceFault> {
        self.log.lock().drained = true;
        Ok(())
    }
}

impl Drop for ScriptedDevice {
    fn drop(&mut self) {
        self.log.lock().released = true;
    }
}

/// Delegate that records every notification.
#[derive(Default)]
pub struct Recorder {
    pub states: Mutex<Vec<SessionState>>,
    pub underruns: Mutex<Vec<u64>>,
    pub errors: Mutex<Vec<PlaybackError>>,
}

impl PlaybackDelegate for Recorder {
    fn on_state_changed(&self, state: SessionState) {
        self.states.lock().push(state);
    }

    fn on_underrun_recovered(&self, total: u64) {
        self.underruns.lock().push(total);
    }

    fn on_error(&self, error: &PlaybackError) {
        self.errors.lock().push(error.clone());
    }
}

/// Control channel replaying one entry per poll, then silence.
pub struct ScriptedControl {
    script: VecDeque<Option<ControlCommand>>,
}

impl ScriptedControl {
    pub fn new(script: impl IntoIterator<Item = Option<ControlCommand>>) -> Self {
        Self {
            script: script.into_iter().collect(),
        }
    }
}

impl ControlChannel for ScriptedControl {
    fn poll_command(&mut self) -> Option<ControlCommand> {
        self.script.pop_front().flatten()
    }
}
