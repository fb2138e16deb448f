//! Expansion of pulse trains back into time-domain level runs. The tests use
//! this to check duration conservation, and the demo binary uses it to
//! reconstruct the picture a display would see.

use crate::types::{Level, Nanos, PulseTrain};

/// Expand a train into (level, duration) runs.
pub fn runs(train: &PulseTrain, tick_ns: u32) -> Vec<(Level, Nanos)> {
    let mut level = train.start_level;
    let mut out = Vec::with_capacity(train.ticks.len());
    for &ticks in &train.ticks {
        out.push((level, ticks as Nanos * tick_ns as Nanos));
        level = !level;
    }
    out
}

/// Total playback duration of a train.
pub fn total_ns(train: &PulseTrain, tick_ns: u32) -> Nanos {
    train.total_ticks() * tick_ns as Nanos
}

/// A step waveform reconstructed from one channel's pulse train, sampleable
/// at arbitrary instants.
pub struct Waveform {
    /// Start time of each run; the first entry is always 0.
    starts: Vec<Nanos>,
    start_level: Level,
}

impl Waveform {
    pub fn new(train: &PulseTrain, tick_ns: u32) -> Self {
        let mut starts = Vec::with_capacity(train.ticks.len());
        let mut t = 0;
        for &ticks in &train.ticks {
            starts.push(t);
            t += ticks as Nanos * tick_ns as Nanos;
        }
        Self {
            starts,
            start_level: train.start_level,
        }
    }

    /// Channel level at `t_ns`. Instants past the end of playback hold the
    /// final level, the way an output pin would.
    pub fn level_at(&self, t_ns: Nanos) -> Level {
        if self.starts.is_empty() {
            return self.start_level;
        }
        let run = self.starts.partition_point(|&start| start <= t_ns) - 1;
        self.start_level ^ (run % 2 == 1)
    }
}
