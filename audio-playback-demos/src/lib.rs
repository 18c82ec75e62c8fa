//! Shared plumbing for the playback demos: device selection, running a
//! session end to end, status output.

use std::path::PathBuf;
use std::sync::Arc;

use audio_playback_core::{
    discover_rate, open_session, ControlChannel, DeviceConfig, PlaybackConfiguration, PlaybackDelegate,
    PlaybackError, PlaybackProvider, PlaybackReport, RateDiscovery, SampleSource, SessionState, StreamingLoop,
    WavSinkProvider,
};

/// Prefix selecting the WAV file sink instead of a sound card.
pub const WAV_TARGET_PREFIX: &str = "wav:";

/// Where audio goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceTarget {
    /// ALSA PCM name.
    Alsa(String),
    /// WAV file written by the file sink.
    WavFile(PathBuf),
}

impl DeviceTarget {
    pub fn parse(value: &str) -> Self {
        match value.strip_prefix(WAV_TARGET_PREFIX) {
            Some(path) => Self::WavFile(PathBuf::from(path)),
            None => Self::Alsa(value.to_string()),
        }
    }

    /// Name handed to the provider.
    pub fn device_name(&self) -> String {
        match self {
            Self::Alsa(name) => name.clone(),
            Self::WavFile(path) => path.display().to_string(),
        }
    }
}

/// Open `target`, build the source for the committed configuration, stream
/// it to the end and return the report.
pub fn play<S, C, F>(
    target: &DeviceTarget,
    mut config: PlaybackConfiguration,
    make_source: F,
    control: &mut C,
    quiet: bool,
) -> Result<PlaybackReport, PlaybackError>
where
    S: SampleSource,
    C: ControlChannel + ?Sized,
    F: FnOnce(&DeviceConfig) -> S,
{
    config.device_name = target.device_name();
    match target {
        DeviceTarget::WavFile(_) => play_on(&WavSinkProvider::default(), &config, make_source, control, quiet),
        #[cfg(target_os = "linux")]
        DeviceTarget::Alsa(_) => play_on(
            &audio_playback_alsa::AlsaProvider::new(),
            &config,
            make_source,
            control,
            quiet,
        ),
        #[cfg(not(target_os = "linux"))]
        DeviceTarget::Alsa(name) => Err(alsa_unavailable(name)),
    }
}

fn play_on<P, S, C, F>(
    provider: &P,
    config: &PlaybackConfiguration,
    make_source: F,
    control: &mut C,
    quiet: bool,
) -> Result<PlaybackReport, PlaybackError>
where
    P: PlaybackProvider,
    S: SampleSource,
    C: ControlChannel + ?Sized,
    F: FnOnce(&DeviceConfig) -> S,
{
    let mut session = open_session(provider, config)?;
    if !quiet {
        session.set_delegate(Arc::new(StatusPrinter));
    }
    let mut source = make_source(session.config());
    StreamingLoop::from_config(config).run(&mut session, &mut source, control)
}

/// Probe the rate range of `target` without configuring it.
pub fn probe_rate(target: &DeviceTarget, floor: u32) -> Result<RateDiscovery, PlaybackError> {
    let name = target.device_name();
    match target {
        DeviceTarget::WavFile(_) => discover_rate(&WavSinkProvider::default(), &name, floor),
        #[cfg(target_os = "linux")]
        DeviceTarget::Alsa(_) => discover_rate(&audio_playback_alsa::AlsaProvider::new(), &name, floor),
        #[cfg(not(target_os = "linux"))]
        DeviceTarget::Alsa(_) => Err(alsa_unavailable(&name)),
    }
}

#[cfg(not(target_os = "linux"))]
fn alsa_unavailable(name: &str) -> PlaybackError {
    PlaybackError::DeviceUnavailable {
        device: name.to_string(),
        reason: format!("ALSA is only available on Linux; use {}<path>", WAV_TARGET_PREFIX),
    }
}

/// Prints session events to stderr. Lines end in `\r\n` so they stay
/// readable while the terminal is in raw mode.
pub struct StatusPrinter;

impl PlaybackDelegate for StatusPrinter {
    fn on_state_changed(&self, state: SessionState) {
        let label = match state {
            SessionState::Prepared => return,
            SessionState::Running => "playing",
            SessionState::Paused => "paused",
            SessionState::Draining => "draining",
            SessionState::Closed => "closed",
        };
        eprint!("[{}]\r\n", label);
    }

    fn on_underrun_recovered(&self, total: u64) {
        eprint!("underrun recovered ({} so far)\r\n", total);
    }

    fn on_error(&self, error: &PlaybackError) {
        eprint!("device error: {}\r\n", error);
    }
}

/// Print a finished run, as JSON or as a short summary.
pub fn print_report(report: &PlaybackReport, json: bool) -> Result<(), PlaybackError> {
    if json {
        println!("{}", report.to_json()?);
        return Ok(());
    }
    let config = &report.config;
    println!("device:     {}", report.device_name);
    println!(
        "config:     {} Hz, {} ch, {:?}, {} frames x {} periods",
        config.sample_rate, config.channels, config.format, config.period_frames, config.periods
    );
    println!("ended:      {:?} after {:.2}s", report.end_reason, report.duration_secs);
    println!(
        "written:    {} periods, {} frames ({:.2}s of audio)",
        report.stats.periods_written,
        report.stats.frames_written,
        report.audio_secs()
    );
    println!("underruns:  {}", report.stats.underruns_recovered);
    println!("sha256:     {}", report.checksum);
    Ok(())
}
