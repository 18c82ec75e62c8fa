//! Report a device's rate range, pick a rate at or above a floor and play a
//! short buzzer test signal at it.

use std::process::ExitCode;

use clap::Parser;
use serde_json::json;

use audio_playback_core::{
    BuzzerSource, DeviceConfig, HwParameter, NoControl, PlaybackConfiguration, PlaybackError, SampleFormat,
    SampleSource,
};
use audio_playback_demos::{play, print_report, probe_rate, DeviceTarget};

#[derive(Parser, Debug)]
#[command(name = "rate-probe")]
#[command(about = "Probe a PCM device's sample rates and play a test signal", long_about = None)]
struct Args {
    /// ALSA PCM name, or wav:<path> to render into a file
    #[arg(short, long, env = "PCM_DEVICE", default_value = "plughw:0,0")]
    device: String,

    /// Lowest acceptable sample rate
    #[arg(short, long, default_value_t = 44100)]
    floor: u32,

    /// Period count hint
    #[arg(short, long, default_value_t = 2)]
    periods: u32,

    /// Period size hint in frames
    #[arg(long, default_value_t = 2048)]
    period_frames: u32,

    /// Number of periods to play
    #[arg(short, long, default_value_t = 100)]
    loops: u64,

    /// Print results as JSON
    #[arg(long)]
    json: bool,
}

fn run(args: Args) -> Result<(), PlaybackError> {
    let target = DeviceTarget::parse(&args.device);

    let discovery = probe_rate(&target, args.floor)?;
    if !args.json {
        println!("rate range: {} - {} Hz", discovery.min, discovery.max);
    }
    let rate = discovery.selected.ok_or_else(|| PlaybackError::UnsupportedParameter {
        which: HwParameter::Rate,
        reason: format!("no supported rate at or above {} Hz", args.floor),
    })?;
    if !args.json {
        println!("selected:   {} Hz", rate);
    }

    let config = PlaybackConfiguration {
        requested: DeviceConfig::new(rate, 2, SampleFormat::S16Le).with_period(args.period_frames, args.periods),
        ..Default::default()
    };
    let loops = args.loops;
    let report = play(
        &target,
        config,
        move |_| BuzzerSource::new().limit_periods(loops),
        &mut NoControl,
        args.json,
    )?;

    if args.json {
        let output = json!({ "discovery": discovery, "report": report });
        let text = serde_json::to_string_pretty(&output)
            .map_err(|e| PlaybackError::Io(format!("failed to serialize report: {}", e)))?;
        println!("{}", text);
        Ok(())
    } else {
        print_report(&report, false)
    }
}

fn main() -> ExitCode {
    env_logger::init();

    match run(Args::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            eprintln!("rate-probe: {}", e);
            ExitCode::FAILURE
        }
    }
}
