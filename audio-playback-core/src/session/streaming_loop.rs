use std::thread;
use std::time::{Duration, Instant};

use sha2::{Digest, Sha256};

use crate::models::config::PlaybackConfiguration;
use crate::models::error::PlaybackError;
use crate::models::playback_report::PlaybackReport;
use crate::models::state::EndReason;
use crate::processing::period_buffer::PeriodBuffer;
use crate::session::playback_session::Session;
use crate::traits::control_channel::{ControlChannel, ControlCommand};
use crate::traits::playback_provider::PcmDevice;
use crate::traits::sample_source::SampleSource;

/// Drives a session from a sample source until the source runs out or a
/// `Stop` command arrives.
///
/// Each iteration:
/// ```text
/// poll control → mirror pause onto hardware → paused? sleep
///                                          → else produce period → write
/// ```
/// On a clean finish the session is drained and closed. On error the
/// session is closed before the error is returned.
#[derive(Debug, Clone, Copy)]
pub struct StreamingLoop {
    idle_interval: Duration,
}

impl StreamingLoop {
    pub const DEFAULT_IDLE_INTERVAL: Duration = Duration::from_millis(10);

    pub fn new(idle_interval: Duration) -> Self {
        Self { idle_interval }
    }

    pub fn from_config(config: &PlaybackConfiguration) -> Self {
        Self::new(config.idle_interval)
    }

    pub fn idle_interval(&self) -> Duration {
        self.idle_interval
    }

    pub fn run<D, S, C>(
        &self,
        session: &mut Session<D>,
        source: &mut S,
        control: &mut C,
    ) -> Result<PlaybackReport, PlaybackError>
    where
        D: PcmDevice,
        S: SampleSource + ?Sized,
        C: ControlChannel + ?Sized,
    {
        if session.is_closed() {
            return Err(PlaybackError::SessionClosed);
        }

        let session_id = uuid::Uuid::new_v4().to_string();
        let started_at = chrono::Utc::now().to_rfc3339();
        let start = Instant::now();
        let mut hasher = Sha256::new();
        let mut buffer = PeriodBuffer::new(session.config());

        log::debug!("session {}: streaming to {}", session_id, session.device_name());

        let end_reason = match self.stream(session, source, control, &mut buffer, &mut hasher) {
            Ok(reason) => reason,
            Err(e) => return Err(session.abort(e)),
        };
        session.drain()?;

        let stats = session.stats();
        log::info!(
            "session {}: {:?} after {} periods ({} underruns recovered)",
            session_id,
            end_reason,
            stats.periods_written,
            stats.underruns_recovered
        );

        Ok(PlaybackReport {
            session_id,
            device_name: session.device_name().to_string(),
            config: *session.config(),
            started_at,
            duration_secs: start.elapsed().as_secs_f64(),
            end_reason,
            stats,
            checksum: hex_encode(&hasher.finalize()),
        })
    }

    fn stream<D, S, C>(
        &self,
        session: &mut Session<D>,
        source: &mut S,
        control: &mut C,
        buffer: &mut PeriodBuffer,
        hasher: &mut Sha256,
    ) -> Result<EndReason, PlaybackError>
    where
        D: PcmDevice,
        S: SampleSource + ?Sized,
        C: ControlChannel + ?Sized,
    {
        loop {
            match control.poll_command() {
                Some(ControlCommand::Stop) => {
                    log::debug!("{}: stop requested", session.device_name());
                    return Ok(EndReason::Stopped);
                }
                Some(ControlCommand::Pause) => session.pause()?,
                Some(ControlCommand::Resume) => session.resume()?,
                Some(ControlCommand::TogglePause) => session.toggle_pause()?,
                None => {}
            }

            session.sync_hardware_pause()?;

            if session.state().is_paused() {
                thread::sleep(self.idle_interval);
                continue;
            }

            let produced = source.produce_next_period(buffer)?;
            if produced == 0 {
                return Ok(EndReason::SourceExhausted);
            }
            let bytes = buffer.filled(produced);
            session.write_period(bytes)?;
            hasher.update(bytes);
        }
    }
}

impl Default for StreamingLoop {
    fn default() -> Self {
        Self::new(Self::DEFAULT_IDLE_INTERVAL)
    }
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::audio_models::{DeviceConfig, SampleFormat};
    use crate::models::error::DeviceFault;
    use crate::models::state::SessionState;
    use crate::processing::synth::SineSource;
    use crate::session::negotiator::open_and_configure;
    use crate::session::test_support::{Recorder, ScriptedControl, ScriptedDevice, ScriptedProvider};
    use crate::traits::control_channel::NoControl;
    use std::sync::Arc;

    /// Fills period `n` with the byte value `n`, `total` periods in all.
    struct CountingSource {
        next: u8,
        total: u8,
        last_len: Option<usize>,
    }

    impl CountingSource {
        fn new(total: u8) -> Self {
            Self {
                next: 0,
                total,
                last_len: None,
            }
        }
    }

    impl SampleSource for CountingSource {
        fn produce_next_period(&mut self, buffer: &mut PeriodBuffer) -> Result<usize, PlaybackError> {
            if self.next == self.total {
                return Ok(0);
            }
            let len = if self.next + 1 == self.total {
                self.last_len.unwrap_or(buffer.len())
            } else {
                buffer.len()
            };
            let value = self.next;
            buffer.as_mut_bytes()[..len].fill(value);
            self.next += 1;
            Ok(len)
        }

        fn is_exhausted(&self) -> bool {
            self.next == self.total
        }
    }

    fn open(provider: &ScriptedProvider) -> Session<ScriptedDevice> {
        let request = DeviceConfig::new(44100, 2, SampleFormat::S16Le).with_period(4, 2);
        open_and_configure(provider, "default", &request).unwrap()
    }

    fn quick_loop() -> StreamingLoop {
        StreamingLoop::new(Duration::from_millis(1))
    }

    #[test]
    fn plays_source_to_exhaustion() {
        let provider = ScriptedProvider::default();
        let mut session = open(&provider);
        let mut source = CountingSource::new(3);

        let report = quick_loop().run(&mut session, &mut source, &mut NoControl).unwrap();
        assert_eq!(report.end_reason, EndReason::SourceExhausted);
        assert_eq!(report.stats.periods_written, 3);
        assert_eq!(report.stats.frames_written, 12);
        assert_eq!(report.device_name, "default");
        assert_eq!(report.checksum.len(), 64);
        assert!(session.is_closed());

        let log = provider.log();
        assert_eq!(log.writes, vec![vec![0u8; 16], vec![1u8; 16], vec![2u8; 16]]);
        assert!(log.drained);
        assert!(log.released);
    }

    #[test]
    fn short_final_period_written_without_stale_tail() {
        let provider = ScriptedProvider::default();
        let mut session = open(&provider);
        let mut source = CountingSource::new(2);
        source.last_len = Some(8);

        quick_loop().run(&mut session, &mut source, &mut NoControl).unwrap();
        assert_eq!(provider.log().writes, vec![vec![0u8; 16], vec![1u8; 8]]);
    }

    #[test]
    fn checksum_covers_written_bytes_in_order() {
        let provider = ScriptedProvider::default();
        let mut session = open(&provider);
        let report = quick_loop()
            .run(&mut session, &mut CountingSource::new(2), &mut NoControl)
            .unwrap();

        let mut expected = Sha256::new();
        expected.update([0u8; 16]);
        expected.update([1u8; 16]);
        assert_eq!(report.checksum, hex_encode(&expected.finalize()));
    }

    #[test]
    fn underrun_mid_stream_is_lossless() {
        let provider = ScriptedProvider::default().with_faults([None, Some(DeviceFault::Underrun), None]);
        let mut session = open(&provider);
        let report = quick_loop()
            .run(&mut session, &mut CountingSource::new(3), &mut NoControl)
            .unwrap();

        assert_eq!(report.stats.underruns_recovered, 1);
        let log = provider.log();
        assert_eq!(log.attempts[1], log.attempts[2]);
        assert_eq!(log.writes, vec![vec![0u8; 16], vec![1u8; 16], vec![2u8; 16]]);
    }

    #[test]
    fn stop_mid_stream_drains_then_closes() {
        let provider = ScriptedProvider::default();
        let recorder = Arc::new(Recorder::default());
        let mut session = open(&provider);
        session.set_delegate(recorder.clone());

        let mut control = ScriptedControl::new([None, None, Some(ControlCommand::Stop)]);
        let report = quick_loop()
            .run(&mut session, &mut SineSource::default(), &mut control)
            .unwrap();

        assert_eq!(report.end_reason, EndReason::Stopped);
        assert_eq!(report.stats.periods_written, 2);
        assert_eq!(
            *recorder.states.lock(),
            vec![SessionState::Running, SessionState::Draining, SessionState::Closed]
        );
        assert_eq!(session.write_period(&[0u8; 16]).unwrap_err(), PlaybackError::SessionClosed);
    }

    #[test]
    fn pause_stops_writes_until_resume() {
        let provider = ScriptedProvider::default();
        let mut session = open(&provider);
        let mut control = ScriptedControl::new([
            None,
            Some(ControlCommand::Pause),
            None,
            Some(ControlCommand::Pause),
            Some(ControlCommand::Resume),
        ]);

        let report = quick_loop()
            .run(&mut session, &mut CountingSource::new(3), &mut control)
            .unwrap();

        let log = provider.log();
        assert_eq!(log.writes, vec![vec![0u8; 16], vec![1u8; 16], vec![2u8; 16]]);
        assert_eq!(log.pause_calls, vec![true, false]);
        assert_eq!(report.stats.hardware_pause_toggles, 2);
    }

    #[test]
    fn pause_before_first_write_writes_nothing() {
        let provider = ScriptedProvider::default();
        let recorder = Arc::new(Recorder::default());
        let mut session = open(&provider);
        session.set_delegate(recorder.clone());
        let mut control = ScriptedControl::new([Some(ControlCommand::TogglePause), None, Some(ControlCommand::Stop)]);

        let report = quick_loop()
            .run(&mut session, &mut SineSource::default(), &mut control)
            .unwrap();

        assert_eq!(report.stats.periods_written, 0);
        assert!(provider.log().writes.is_empty());
        assert!(provider.log().pause_calls.is_empty());
        assert_eq!(recorder.states.lock()[0], SessionState::Paused);
    }

    #[test]
    fn fatal_write_closes_session_before_returning() {
        let provider = ScriptedProvider::default().with_faults([None, Some(DeviceFault::failed("writei", "EIO"))]);
        let recorder = Arc::new(Recorder::default());
        let mut session = open(&provider);
        session.set_delegate(recorder.clone());

        let err = quick_loop()
            .run(&mut session, &mut SineSource::default(), &mut NoControl)
            .unwrap_err();
        assert!(matches!(err, PlaybackError::UnrecoverableDevice(_)));
        assert!(session.is_closed());
        assert!(provider.log().released);
        assert!(!provider.log().drained);
        assert_eq!(recorder.errors.lock().len(), 1);
    }

    #[test]
    fn source_error_closes_session() {
        struct Failing;
        impl SampleSource for Failing {
            fn produce_next_period(&mut self, _: &mut PeriodBuffer) -> Result<usize, PlaybackError> {
                Err(PlaybackError::Io("disk gone".into()))
            }
            fn is_exhausted(&self) -> bool {
                false
            }
        }

        let provider = ScriptedProvider::default();
        let mut session = open(&provider);
        let err = quick_loop().run(&mut session, &mut Failing, &mut NoControl).unwrap_err();
        assert_eq!(err, PlaybackError::Io("disk gone".into()));
        assert!(session.is_closed());
    }

    #[test]
    fn limited_sine_runs_requested_periods() {
        let provider = ScriptedProvider::default();
        let mut session = open(&provider);
        let mut source = SineSource::default().limit_periods(5);
        let report = quick_loop().run(&mut session, &mut source, &mut NoControl).unwrap();
        assert_eq!(report.stats.periods_written, 5);
        assert_eq!(report.end_reason, EndReason::SourceExhausted);
    }

    #[test]
    fn closed_session_cannot_run() {
        let provider = ScriptedProvider::default();
        let mut session = open(&provider);
        session.close();
        let err = quick_loop()
            .run(&mut session, &mut SineSource::default(), &mut NoControl)
            .unwrap_err();
        assert_eq!(err, PlaybackError::SessionClosed);
    }
}
