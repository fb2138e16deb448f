/// The instantaneous output state of a single channel. The two channel pins
/// feed a resistor ladder, so a "level" here is purely digital; the receiving
/// display sees the summed voltage as sync, black or white.
pub type Level = bool;

/// The duration type for everything time-shaped in the signal. Every constant
/// in the timing table is an exact multiple of 100ns, so integer nanoseconds
/// represent the table without rounding and keep the encoder's accumulator
/// arithmetic exact. Floating point microseconds would work too, but the
/// idempotence of encoding would then depend on summation order.
pub type Nanos = u64;

/// The simultaneous state of both output channels at an instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelPair {
    pub low: Level,
    pub high: Level,
}

impl LevelPair {
    /// Both channels low: the composite sync tip.
    pub const SYNC: LevelPair = LevelPair { low: false, high: false };

    /// Low channel driven, high channel off: black / blanking level.
    pub const BLACK: LevelPair = LevelPair { low: true, high: false };

    /// Both channels driven: peak white.
    pub const WHITE: LevelPair = LevelPair { low: true, high: true };
}

/// One span of the frame timeline: both channel levels held for a duration.
/// A full frame is a sequence of these, strictly consecutive with no gaps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    pub levels: LevelPair,
    pub duration_ns: Nanos,
}

impl Segment {
    pub fn new(levels: LevelPair, duration_ns: Nanos) -> Self {
        Self { levels, duration_ns }
    }
}

/// One channel's output as the transmitting peripheral consumes it: an
/// ordered list of tick-count durations, the output toggling after each
/// entry, starting from `start_level`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PulseTrain {
    pub start_level: Level,
    pub ticks: Vec<u32>,
}

impl PulseTrain {
    /// Total playback length in ticks.
    pub fn total_ticks(&self) -> u64 {
        self.ticks.iter().map(|&t| t as u64).sum()
    }
}

/// One frame's worth of output for both channels. Always published and
/// transmitted as a unit so the channels stay phase-aligned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PulseTrainPair {
    pub low: PulseTrain,
    pub high: PulseTrain,
}
