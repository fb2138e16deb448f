//! Frame timeline construction.

use crate::surface::FrameSurface;
use crate::types::{LevelPair, Segment};
use crate::video::{Geometry, Timing};

/// Lay out one full frame as consecutive level/duration segments: vertical
/// sync, top blanking lines, the active picture with each bitmap row
/// repeated over `line_repeat` scanlines, then the trailing blanking lines.
///
/// The walk is a pure function of the surface snapshot; geometry and timing
/// were validated when the caller was built, so nothing here can fail.
pub fn build_timeline<S: FrameSurface + ?Sized>(
    surface: &S,
    geometry: &Geometry,
    timing: &Timing,
) -> Vec<Segment> {
    let blank_lines = (timing.blank_lines_top + timing.blank_lines_bottom) as usize;
    let per_active_line = geometry.width as usize + 4;
    let mut segments =
        Vec::with_capacity(2 + blank_lines * 3 + geometry.active_lines() as usize * per_active_line);

    // Vertical sync pulse, then the blanking level that closes the block.
    segments.push(Segment::new(LevelPair::SYNC, timing.vsync_pulse_ns));
    segments.push(Segment::new(LevelPair::BLACK, timing.vsync_blank_ns));

    for _ in 0..timing.blank_lines_top {
        push_blank_line(&mut segments, timing);
    }

    for line in 0..geometry.active_lines() {
        let row = line / geometry.line_repeat;

        segments.push(Segment::new(LevelPair::BLACK, timing.line_front_ns));
        segments.push(Segment::new(LevelPair::SYNC, timing.hsync_pulse_ns));
        segments.push(Segment::new(LevelPair::BLACK, timing.active_back_ns));

        for x in 0..geometry.width {
            let levels = if surface.level_at(x, row) {
                LevelPair::WHITE
            } else {
                LevelPair::BLACK
            };
            segments.push(Segment::new(levels, timing.pixel_ns));
        }

        segments.push(Segment::new(LevelPair::BLACK, timing.line_tail_ns));
    }

    for _ in 0..timing.blank_lines_bottom {
        push_blank_line(&mut segments, timing);
    }

    segments
}

fn push_blank_line(segments: &mut Vec<Segment>, timing: &Timing) {
    segments.push(Segment::new(LevelPair::BLACK, timing.line_front_ns));
    segments.push(Segment::new(LevelPair::SYNC, timing.hsync_pulse_ns));
    segments.push(Segment::new(LevelPair::BLACK, timing.blank_back_ns));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::PackedFrame;
    use crate::types::Nanos;

    fn default_setup() -> (PackedFrame, Geometry, Timing) {
        (
            PackedFrame::new(104, 80),
            Geometry::new(104, 80, 3).unwrap(),
            Timing::default(),
        )
    }

    #[test]
    fn segment_count_for_the_default_raster() {
        let (frame, geometry, timing) = default_setup();
        let segments = build_timeline(&frame, &geometry, &timing);
        // 2 vsync segments, 19 + 3 blanking lines of 3 segments, and
        // 240 active lines of 3 porch/sync + 104 pixels + 1 tail gap.
        assert_eq!(segments.len(), 2 + 22 * 3 + 240 * 108);
    }

    #[test]
    fn durations_cover_the_whole_frame_with_no_gaps() {
        let (mut frame, geometry, timing) = default_setup();
        let expected = timing.frame_ns(&geometry);

        for fill in [false, true] {
            frame.fill(fill);
            let total: Nanos = build_timeline(&frame, &geometry, &timing)
                .iter()
                .map(|s| s.duration_ns)
                .sum();
            assert_eq!(total, expected);
        }

        // A patterned frame changes levels, never durations.
        for i in 0..80 {
            frame.set(i, i, i % 2 == 0);
        }
        let total: Nanos = build_timeline(&frame, &geometry, &timing)
            .iter()
            .map(|s| s.duration_ns)
            .sum();
        assert_eq!(total, expected);
    }

    #[test]
    fn every_segment_has_a_positive_duration() {
        let (frame, geometry, timing) = default_setup();
        assert!(build_timeline(&frame, &geometry, &timing)
            .iter()
            .all(|s| s.duration_ns > 0));
    }

    #[test]
    fn rows_replicate_across_consecutive_scanlines() {
        let mut frame = PackedFrame::new(2, 2);
        frame.set(0, 0, true);
        frame.set(1, 1, true);
        let geometry = Geometry::new(2, 2, 2).unwrap();
        let timing = Timing::default();
        let segments = build_timeline(&frame, &geometry, &timing);

        let active_start = 2 + timing.blank_lines_top as usize * 3;
        let per_line = 2 + 4;
        let pixel_levels = |line: usize| {
            let base = active_start + line * per_line + 3;
            (segments[base].levels, segments[base + 1].levels)
        };

        // Lines 0 and 1 sample bitmap row 0, lines 2 and 3 sample row 1.
        for line in 0..2 {
            assert_eq!(pixel_levels(line), (LevelPair::WHITE, LevelPair::BLACK));
        }
        for line in 2..4 {
            assert_eq!(pixel_levels(line), (LevelPair::BLACK, LevelPair::WHITE));
        }
    }
}
