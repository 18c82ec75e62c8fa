//! Play a PCM WAV file with keyboard pause/resume.
//!
//! Keys: space pause/resume, p pause, r resume, q or Esc quit.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use audio_playback_alsa::KeyboardControl;
use audio_playback_core::{
    NoControl, PlaybackConfiguration, PlaybackError, RecoveryPolicy, WavFileSource,
};
use audio_playback_demos::{play, print_report, DeviceTarget};

#[derive(Parser, Debug)]
#[command(name = "wav-player")]
#[command(about = "Play a 8/16-bit PCM WAV file", long_about = None)]
struct Args {
    /// WAV file to play
    file: PathBuf,

    /// ALSA PCM name, or wav:<path> to render into a file
    #[arg(short, long, env = "PCM_DEVICE", default_value = "default")]
    device: String,

    /// Consecutive underruns tolerated on one period before giving up
    #[arg(long, conflicts_with = "retry_forever")]
    max_underruns: Option<u32>,

    /// Never give up on underruns
    #[arg(long)]
    retry_forever: bool,

    /// Do not read the keyboard (for non-interactive use)
    #[arg(long)]
    no_keyboard: bool,

    /// Print the playback report as JSON
    #[arg(long)]
    json: bool,
}

fn run(args: Args) -> Result<(), PlaybackError> {
    // Reject bad files before touching the device.
    let source = WavFileSource::open(&args.file)?;
    let header = *source.header();
    log::info!(
        "{}: {} Hz, {} ch, {} bit, {:.2}s",
        args.file.display(),
        header.sample_rate,
        header.num_channels,
        header.bit_depth,
        header.duration_secs()
    );

    let recovery = if args.retry_forever {
        RecoveryPolicy::unbounded()
    } else {
        args.max_underruns.map_or_else(RecoveryPolicy::default, RecoveryPolicy::bounded)
    };
    let config = PlaybackConfiguration {
        requested: source.device_config()?,
        recovery,
        ..Default::default()
    };
    let target = DeviceTarget::parse(&args.device);

    let report = if args.no_keyboard {
        play(&target, config, move |_| source, &mut NoControl, args.json)?
    } else {
        let (keyboard, mut control) = KeyboardControl::spawn()?;
        if !args.json {
            eprint!("space: pause/resume  q: quit\r\n");
        }
        let result = play(&target, config, move |_| source, &mut control, args.json);
        keyboard.stop();
        result?
    };
    print_report(&report, args.json)
}

fn main() -> ExitCode {
    env_logger::init();

    match run(Args::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            eprintln!("wav-player: {}", e);
            ExitCode::FAILURE
        }
    }
}
