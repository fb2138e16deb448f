//! Error types for the tvout library.

use std::fmt;

use crate::hw::Channel;

/// Everything that can go wrong between configuration and shutdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A zero raster dimension or line repeat count.
    InvalidGeometry {
        width: u32,
        height: u32,
        line_repeat: u32,
    },
    /// A tick duration of zero nanoseconds.
    InvalidTickDuration,
    /// A level run shorter than one hardware tick. The configured clock
    /// divider cannot represent the timing table.
    ZeroTickRun { run_ns: u64, tick_ns: u32 },
    /// `encode_and_publish` entered while another encode is in progress.
    ConcurrentPublish,
    /// A channel did not drain its last burst within the shutdown bound.
    IdleTimeout { channel: Channel },
    /// `begin()` while the periodic trigger is already registered.
    AlreadyRunning,
    /// `end()` without a matching `begin()`.
    NotRunning,
    /// The pulse driver refused a transmission request.
    TransmitRejected { reason: &'static str },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidGeometry {
                width,
                height,
                line_repeat,
            } => write!(
                f,
                "invalid geometry {}x{} with line repeat {}",
                width, height, line_repeat
            ),
            Error::InvalidTickDuration => {
                write!(f, "tick duration must be at least one nanosecond")
            }
            Error::ZeroTickRun { run_ns, tick_ns } => write!(
                f,
                "{}ns run is shorter than one {}ns tick",
                run_ns, tick_ns
            ),
            Error::ConcurrentPublish => write!(f, "a frame encode is already in progress"),
            Error::IdleTimeout { channel } => {
                write!(f, "{} channel did not become idle in time", channel)
            }
            Error::AlreadyRunning => write!(f, "frame emission is already running"),
            Error::NotRunning => write!(f, "frame emission is not running"),
            Error::TransmitRejected { reason } => write!(f, "transmission rejected: {}", reason),
        }
    }
}

impl std::error::Error for Error {}
