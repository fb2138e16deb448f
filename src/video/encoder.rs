//! Dual-channel run-length encoder.
//!
//! The timeline describes both channels at once; each channel toggles at its
//! own subset of segment boundaries, so the two output trains are compressed
//! independently in a single walk and generally end up with different
//! lengths.

use crate::error::Error;
use crate::types::{Level, Nanos, PulseTrain, PulseTrainPair, Segment};

/// Compress a timeline into one pulse train per channel, converting run
/// durations to hardware ticks by truncating division.
///
/// A run shorter than one tick means the configured clock cannot express the
/// timing table and the whole encode is rejected; clamping it to one tick
/// would silently stretch the line period instead.
pub fn encode(timeline: &[Segment], tick_ns: u32) -> Result<PulseTrainPair, Error> {
    if tick_ns == 0 {
        return Err(Error::InvalidTickDuration);
    }

    let Some(first) = timeline.first() else {
        return Ok(PulseTrainPair {
            low: PulseTrain {
                start_level: false,
                ticks: Vec::new(),
            },
            high: PulseTrain {
                start_level: false,
                ticks: Vec::new(),
            },
        });
    };

    let mut low = ChannelRuns::new(first.levels.low, first.duration_ns);
    let mut high = ChannelRuns::new(first.levels.high, first.duration_ns);

    for segment in &timeline[1..] {
        low.push(segment.levels.low, segment.duration_ns, tick_ns)?;
        high.push(segment.levels.high, segment.duration_ns, tick_ns)?;
    }

    Ok(PulseTrainPair {
        low: PulseTrain {
            start_level: first.levels.low,
            ticks: low.finish(tick_ns)?,
        },
        high: PulseTrain {
            start_level: first.levels.high,
            ticks: high.finish(tick_ns)?,
        },
    })
}

/// Run-length state for one channel: the level being held and the time
/// accumulated at that level since the last toggle.
struct ChannelRuns {
    level: Level,
    run_ns: Nanos,
    ticks: Vec<u32>,
}

impl ChannelRuns {
    fn new(level: Level, run_ns: Nanos) -> Self {
        Self {
            level,
            run_ns,
            ticks: Vec::new(),
        }
    }

    fn push(&mut self, level: Level, duration_ns: Nanos, tick_ns: u32) -> Result<(), Error> {
        if level == self.level {
            self.run_ns += duration_ns;
        } else {
            self.flush(tick_ns)?;
            self.level = level;
            self.run_ns = duration_ns;
        }
        Ok(())
    }

    fn flush(&mut self, tick_ns: u32) -> Result<(), Error> {
        let ticks = self.run_ns / tick_ns as Nanos;
        if ticks == 0 {
            return Err(Error::ZeroTickRun {
                run_ns: self.run_ns,
                tick_ns,
            });
        }
        self.ticks.push(ticks as u32);
        Ok(())
    }

    fn finish(mut self, tick_ns: u32) -> Result<Vec<u32>, Error> {
        self.flush(tick_ns)?;
        Ok(self.ticks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::{FrameSurface, PackedFrame};
    use crate::video::{timeline::build_timeline, Geometry, Timing, DEFAULT_TICK_NS};

    fn encode_frame(frame: &PackedFrame, tick_ns: u32) -> Result<PulseTrainPair, Error> {
        let geometry = Geometry::new(frame.width(), frame.height(), 3).unwrap();
        let timing = Timing::default();
        encode(&build_timeline(frame, &geometry, &timing), tick_ns)
    }

    #[test]
    fn both_channels_start_at_the_sync_level() {
        let frame = PackedFrame::new(104, 80);
        let pair = encode_frame(&frame, DEFAULT_TICK_NS).unwrap();
        assert!(!pair.low.start_level);
        assert!(!pair.high.start_level);
    }

    #[test_log::test]
    fn tick_sums_conserve_each_channels_duration_exactly() {
        let mut frame = PackedFrame::new(104, 80);
        for y in 0..80 {
            for x in 0..104 {
                frame.set(x, y, (x * 7 + y * 13) % 5 < 2);
            }
        }
        let pair = encode_frame(&frame, DEFAULT_TICK_NS).unwrap();

        // Every constant in the table divides evenly by the 100ns tick, so
        // truncation loses nothing and both channels cover the whole frame.
        let geometry = Geometry::new(104, 80, 3).unwrap();
        let frame_ns = Timing::default().frame_ns(&geometry);
        assert_eq!(pair.low.total_ticks() * DEFAULT_TICK_NS as u64, frame_ns);
        assert_eq!(pair.high.total_ticks() * DEFAULT_TICK_NS as u64, frame_ns);
    }

    #[test]
    fn truncation_loses_less_than_one_tick_per_run() {
        let mut frame = PackedFrame::new(104, 80);
        frame.fill(true);
        let tick_ns = 300;
        let pair = encode_frame(&frame, tick_ns).unwrap();

        let geometry = Geometry::new(104, 80, 3).unwrap();
        let frame_ns = Timing::default().frame_ns(&geometry);
        for train in [&pair.low, &pair.high] {
            let covered = train.total_ticks() * tick_ns as u64;
            assert!(covered <= frame_ns);
            assert!(frame_ns - covered < train.ticks.len() as u64 * tick_ns as u64);
        }
    }

    #[test]
    fn encoding_is_idempotent() {
        let mut frame = PackedFrame::new(104, 80);
        for x in 0..104 {
            frame.set(x, x % 80, true);
        }
        let first = encode_frame(&frame, DEFAULT_TICK_NS).unwrap();
        let second = encode_frame(&frame, DEFAULT_TICK_NS).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn all_black_frame_keeps_the_high_channel_in_one_run() {
        let frame = PackedFrame::new(104, 80);
        let pair = encode_frame(&frame, DEFAULT_TICK_NS).unwrap();
        // No pixel ever drives the high channel, so it holds one level for
        // the entire frame.
        assert_eq!(pair.high.ticks.len(), 1);
        assert_eq!(pair.high.ticks[0] as u64 * DEFAULT_TICK_NS as u64, 16_582_800);
    }

    #[test]
    fn all_white_frame_gives_one_high_run_per_scanline() {
        let mut frame = PackedFrame::new(104, 80);
        frame.fill(true);
        let pair = encode_frame(&frame, DEFAULT_TICK_NS).unwrap();

        // Each of the 240 scanlines contributes one low lead-in and one high
        // pixel burst, plus the final low tail through the bottom blanking.
        assert_eq!(pair.high.ticks.len(), 2 * 240 + 1);
        for (i, &ticks) in pair.high.ticks.iter().enumerate() {
            if i % 2 == 1 {
                // 104 pixels of 500ns each.
                assert_eq!(ticks, 520);
            }
        }
    }

    #[test]
    fn single_white_pixel_perturbs_only_its_three_scanlines() {
        let mut frame = PackedFrame::new(104, 80);
        frame.set(0, 0, true);
        let pair = encode_frame(&frame, DEFAULT_TICK_NS).unwrap();

        // Low lead-in, then three repetitions of (5-tick white, low gap),
        // with the final low run covering the rest of the frame: 7 runs.
        assert_eq!(pair.high.ticks.len(), 7);
        assert_eq!(pair.high.ticks[1], 5);
        assert_eq!(pair.high.ticks[3], 5);
        assert_eq!(pair.high.ticks[5], 5);
        // The gap between repetitions: 103 black pixels, the tail, and the
        // next line's porches and sync.
        let timing = Timing::default();
        let gap_ns = 103 * timing.pixel_ns
            + timing.line_tail_ns
            + timing.line_front_ns
            + timing.hsync_pulse_ns
            + timing.active_back_ns;
        assert_eq!(pair.high.ticks[2] as u64 * DEFAULT_TICK_NS as u64, gap_ns);
        assert_eq!(pair.high.ticks[4], pair.high.ticks[2]);
    }

    #[test]
    fn zero_tick_duration_is_rejected() {
        let frame = PackedFrame::new(104, 80);
        assert_eq!(encode_frame(&frame, 0), Err(Error::InvalidTickDuration));
    }

    #[test_log::test]
    fn tick_coarser_than_a_pixel_is_a_precision_error() {
        let mut frame = PackedFrame::new(104, 80);
        frame.set(0, 0, true);
        // A lone 500ns pixel run cannot be expressed with 1000ns ticks.
        assert_eq!(
            encode_frame(&frame, 1_000),
            Err(Error::ZeroTickRun {
                run_ns: 500,
                tick_ns: 1_000
            })
        );
    }

    #[test]
    fn empty_timeline_encodes_to_empty_trains() {
        let pair = encode(&[], DEFAULT_TICK_NS).unwrap();
        assert!(pair.low.ticks.is_empty());
        assert!(pair.high.ticks.is_empty());
    }
}
