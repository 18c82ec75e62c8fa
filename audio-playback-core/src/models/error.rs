use std::fmt;

use thiserror::Error;

/// Hardware parameter named by a failed negotiation step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HwParameter {
    Access,
    Format,
    Channels,
    Rate,
    PeriodSize,
    Periods,
    Commit,
}

impl fmt::Display for HwParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Access => "access mode",
            Self::Format => "sample format",
            Self::Channels => "channel count",
            Self::Rate => "sample rate",
            Self::PeriodSize => "period size",
            Self::Periods => "period count",
            Self::Commit => "hardware parameters",
        };
        f.write_str(name)
    }
}

/// Errors that can occur while negotiating with or streaming to a playback device.
///
/// `BufferUnderrun` is the only recoverable kind. The session handles it
/// internally and it never reaches a caller unless it is converted into
/// `UnrecoverableDevice` after the retry budget runs out.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PlaybackError {
    #[error("device \"{device}\" not available: {reason}")]
    DeviceUnavailable { device: String, reason: String },

    #[error("unsupported {which}: {reason}")]
    UnsupportedParameter { which: HwParameter, reason: String },

    #[error("buffer underrun")]
    BufferUnderrun,

    #[error("unrecoverable device error: {0}")]
    UnrecoverableDevice(String),

    #[error("malformed input file: {0}")]
    MalformedInputFile(String),

    #[error("unsupported file format: {0}")]
    UnsupportedFileFormat(String),

    #[error("session closed")]
    SessionClosed,

    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("i/o error: {0}")]
    Io(String),
}

impl PlaybackError {
    pub fn unsupported(which: HwParameter, fault: DeviceFault) -> Self {
        Self::UnsupportedParameter {
            which,
            reason: fault.to_string(),
        }
    }

    /// Whether the error was raised before any audio could reach a device.
    pub fn is_input_error(&self) -> bool {
        matches!(self, Self::MalformedInputFile(_) | Self::UnsupportedFileFormat(_))
    }
}

impl From<std::io::Error> for PlaybackError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e.to_string())
    }
}

/// Low-level failure reported by a device backend.
///
/// Backends translate their native error codes into these kinds so the
/// session can tell an underrun apart from everything else.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DeviceFault {
    #[error("buffer underrun (xrun)")]
    Underrun,

    #[error("device busy")]
    Busy,

    #[error("no such device")]
    NotFound,

    #[error("rejected by hardware: {0}")]
    Rejected(String),

    #[error("{op} failed: {message}")]
    Failed { op: &'static str, message: String },
}

impl DeviceFault {
    pub fn failed(op: &'static str, message: impl Into<String>) -> Self {
        Self::Failed {
            op,
            message: message.into(),
        }
    }

    pub fn is_underrun(&self) -> bool {
        matches!(self, Self::Underrun)
    }
}
