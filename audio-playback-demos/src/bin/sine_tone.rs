//! Play a sine tone for a fixed duration.
//!
//! One sine cycle fills each period, so the pitch is
//! `rate / period-frames` Hz (about 43 Hz with the defaults).

use std::process::ExitCode;

use clap::Parser;

use audio_playback_core::{DeviceConfig, NoControl, PlaybackConfiguration, PlaybackError, SampleFormat, SampleSource, SineSource};
use audio_playback_demos::{play, print_report, DeviceTarget};

#[derive(Parser, Debug)]
#[command(name = "sine-tone")]
#[command(about = "Play a sine tone on a PCM device", long_about = None)]
struct Args {
    /// ALSA PCM name, or wav:<path> to render into a file
    #[arg(short, long, env = "PCM_DEVICE", default_value = "default")]
    device: String,

    /// Sample rate in Hz (the nearest supported rate is used)
    #[arg(short, long, default_value_t = 44100)]
    rate: u32,

    /// Channel count (1 or 2)
    #[arg(short, long, default_value_t = 2)]
    channels: u32,

    /// Playback length in seconds
    #[arg(short, long, default_value_t = 5.0)]
    seconds: f64,

    /// Amplitude between 0.0 and 1.0
    #[arg(short, long, default_value_t = 1.0)]
    amplitude: f64,

    /// Period size hint in frames
    #[arg(long, default_value_t = 1024)]
    period_frames: u32,

    /// Print the playback report as JSON
    #[arg(long)]
    json: bool,
}

fn run(args: Args) -> Result<(), PlaybackError> {
    let target = DeviceTarget::parse(&args.device);
    let config = PlaybackConfiguration {
        requested: DeviceConfig::new(args.rate, args.channels, SampleFormat::S16Le)
            .with_period(args.period_frames, DeviceConfig::default().periods),
        ..Default::default()
    };

    let seconds = args.seconds;
    let amplitude = args.amplitude;
    let report = play(
        &target,
        config,
        |committed| {
            log::info!(
                "tone: {:.1} Hz for {:.1}s",
                committed.sample_rate as f64 / committed.period_frames as f64,
                seconds
            );
            SineSource::new(amplitude).limit_periods(committed.periods_for_duration(seconds))
        },
        &mut NoControl,
        args.json,
    )?;
    print_report(&report, args.json)
}

fn main() -> ExitCode {
    env_logger::init();

    match run(Args::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            eprintln!("sine-tone: {}", e);
            ExitCode::FAILURE
        }
    }
}
