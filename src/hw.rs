//! Hardware capabilities the core depends on, expressed as traits so the
//! platform bring-up (channel allocation, pins, clock dividers) stays outside
//! the signal logic. The `sim` module provides in-process implementations
//! used by the demo binary and the tests.

pub mod sim;

use std::fmt;
use std::time::Duration;

use crate::error::Error;
use crate::types::PulseTrain;

/// Identifies one of the two output channels by its role in the resistor
/// ladder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Low,
    High,
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Channel::Low => write!(f, "low"),
            Channel::High => write!(f, "high"),
        }
    }
}

/// A peripheral that plays a pulse train as alternating-level durations on an
/// output pin. Implementations must reject trains containing zero-tick
/// entries rather than emit garbage timing.
pub trait PulseDriver: Send + Sync {
    /// Start playback of `train` on one channel.
    fn transmit(&self, channel: Channel, train: &PulseTrain) -> Result<(), Error>;

    /// Start playback on both channels at the same instant, keeping their
    /// waveforms phase-aligned.
    fn transmit_simultaneous(&self, low: &PulseTrain, high: &PulseTrain) -> Result<(), Error>;

    /// Block until the channel has finished its current burst, or until
    /// `timeout` elapses.
    fn wait_until_idle(&self, channel: Channel, timeout: Duration) -> Result<(), Error>;
}

/// A fixed-frequency callback source standing in for a hardware timer
/// interrupt. After `deregister` returns, no callback is running and none
/// will run again until the next `register`.
pub trait PeriodicTrigger: Send + Sync {
    fn register(&mut self, freq_hz: u32, callback: Box<dyn FnMut() + Send + 'static>);
    fn deregister(&mut self);
}
