//! Monochrome composite TV output over two digitally-timed pulse channels.
//!
//! Two GPIO pins driven through a resistor ladder can fake an analog
//! composite video signal: both pins low is the sync tip, one pin high is
//! black, both high is white. This crate turns a 1-bpp raster into the pair
//! of pulse trains a transmit peripheral needs to reproduce that waveform,
//! and re-emits the latest encoded frame at the 60 Hz refresh rate.
//!
//! The flow is surface → [`video::timeline`] → [`video::encoder`] →
//! [`FrameScheduler`] → [`hw::PulseDriver`]. The hardware itself (pulse
//! peripheral, periodic timer) is injected through the traits in [`hw`]; the
//! [`hw::sim`] module has in-process versions of both.

pub mod error;
pub mod hw;
pub mod surface;
pub mod types;
pub mod video;

pub use error::Error;
pub use surface::{FrameSurface, PackedFrame};
pub use types::{Level, LevelPair, Nanos, PulseTrain, PulseTrainPair, Segment};
pub use video::{FrameScheduler, Geometry, Timing, DEFAULT_TICK_NS};
