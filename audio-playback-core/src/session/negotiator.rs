use serde::{Deserialize, Serialize};

use crate::models::audio_models::DeviceConfig;
use crate::models::config::PlaybackConfiguration;
use crate::models::error::{DeviceFault, HwParameter, PlaybackError};
use crate::session::playback_session::Session;
use crate::traits::playback_provider::{HwParamSpace, PcmDevice, PlaybackProvider};

/// Result of probing a device's sample rate range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateDiscovery {
    pub min: u32,
    pub max: u32,
    /// First supported rate at or above the floor, if any.
    pub selected: Option<u32>,
}

/// Open `device_name` and negotiate `requested` against its capabilities.
///
/// Negotiation order: access → format → channels → rate → period size →
/// period count → commit. The first rejected step aborts the whole
/// negotiation; nothing is committed and the device is released.
///
/// `requested.period_frames` and `requested.periods` are hints. The returned
/// session's config holds the values the hardware committed to.
pub fn open_and_configure<P: PlaybackProvider>(
    provider: &P,
    device_name: &str,
    requested: &DeviceConfig,
) -> Result<Session<P::Device>, PlaybackError> {
    requested.validate()?;

    let mut device = provider
        .open_playback(device_name)
        .map_err(|fault| unavailable(device_name, fault))?;

    let committed = device.configure(&mut |space: &mut dyn HwParamSpace| negotiate(space, requested))?;

    let config = DeviceConfig {
        sample_rate: committed.sample_rate,
        period_frames: committed.period_frames,
        periods: committed.periods,
        ..*requested
    };
    if config.sample_rate != requested.sample_rate {
        log::info!(
            "{}: rate {} Hz not supported, using {} Hz",
            device_name,
            requested.sample_rate,
            config.sample_rate
        );
    }
    log::info!(
        "{}: {} Hz, {} ch, {:?}, {} frames x {} periods",
        device_name,
        config.sample_rate,
        config.channels,
        config.format,
        config.period_frames,
        config.periods
    );

    device
        .prepare()
        .map_err(|fault| PlaybackError::UnrecoverableDevice(format!("prepare failed: {}", fault)))?;

    Ok(Session::new(device, device_name, config))
}

/// Validate `config`, open its device and apply its recovery policy.
pub fn open_session<P: PlaybackProvider>(
    provider: &P,
    config: &PlaybackConfiguration,
) -> Result<Session<P::Device>, PlaybackError> {
    config.validate()?;
    let mut session = open_and_configure(provider, &config.device_name, &config.requested)?;
    session.set_recovery_policy(config.recovery);
    Ok(session)
}

/// Report the device's rate range and the first supported rate at or above
/// `floor`. Nothing is committed; the device is released afterwards.
pub fn discover_rate<P: PlaybackProvider>(
    provider: &P,
    device_name: &str,
    floor: u32,
) -> Result<RateDiscovery, PlaybackError> {
    let mut device = provider
        .open_playback(device_name)
        .map_err(|fault| unavailable(device_name, fault))?;

    let mut discovery = None;
    device.probe(&mut |space: &mut dyn HwParamSpace| {
        step(HwParameter::Access, space.set_access_interleaved())?;
        let (min, max) = step(HwParameter::Rate, space.rate_range())?;
        let selected = (min.max(floor)..=max).find(|&rate| space.test_rate(rate));
        discovery = Some(RateDiscovery { min, max, selected });
        Ok(())
    })?;

    let discovery = discovery.ok_or_else(|| PlaybackError::UnsupportedParameter {
        which: HwParameter::Rate,
        reason: "device reported no rate range".into(),
    })?;
    log::info!(
        "{}: rates {}..={} Hz, selected {:?} (floor {})",
        device_name,
        discovery.min,
        discovery.max,
        discovery.selected,
        floor
    );
    Ok(discovery)
}

fn negotiate(space: &mut dyn HwParamSpace, requested: &DeviceConfig) -> Result<(), PlaybackError> {
    step(HwParameter::Access, space.set_access_interleaved())?;
    step(HwParameter::Format, space.set_format(requested.format))?;
    step(HwParameter::Channels, space.set_channels(requested.channels))?;
    step(HwParameter::Rate, space.set_rate_near(requested.sample_rate))?;
    step(HwParameter::PeriodSize, space.set_period_frames_near(requested.period_frames))?;
    step(HwParameter::Periods, space.set_periods_near(requested.periods))?;
    Ok(())
}

fn step<T>(which: HwParameter, result: Result<T, DeviceFault>) -> Result<T, PlaybackError> {
    result.map_err(|fault| PlaybackError::unsupported(which, fault))
}

fn unavailable(device_name: &str, fault: DeviceFault) -> PlaybackError {
    PlaybackError::DeviceUnavailable {
        device: device_name.to_string(),
        reason: fault.to_string(),
    }
}
