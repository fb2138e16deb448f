use std::error::Error;
use std::sync::Arc;

use log::warn;
use pixels::{Pixels, SurfaceTexture};
use winit::event::{Event, WindowEvent};
use winit::{
    dpi::PhysicalSize,
    event_loop::{ControlFlow, EventLoop},
    window::WindowBuilder,
};

use tvout::hw::sim::{SimulatedDriver, ThreadTimer};
use tvout::video::playback::Waveform;
use tvout::{
    FrameScheduler, Geometry, PackedFrame, Timing, DEFAULT_TICK_NS,
};

/// The active raster size of the target display.
const WIDTH: u32 = tvout::video::DEFAULT_WIDTH;
const HEIGHT: u32 = tvout::video::DEFAULT_HEIGHT;

/// Each bitmap row covers this many physical scanlines.
const LINE_REPEAT: u32 = tvout::video::DEFAULT_LINE_REPEAT;

/// The output image height: one window row per physical scanline.
const OUTPUT_HEIGHT: u32 = HEIGHT * LINE_REPEAT;

/// Demo program: encode a frame, let the scheduler emit it against a
/// simulated pulse driver, and show what a display would reconstruct from
/// the transmitted trains.
fn main() -> Result<(), Box<dyn Error>> {
    // Initialize logging.
    env_logger::init();

    let geometry = Geometry::new(WIDTH, HEIGHT, LINE_REPEAT)?;
    let timing = Timing::default();

    // Source frame: an image file given on the command line, or a test card.
    let mut frame = PackedFrame::new(WIDTH, HEIGHT);
    match std::env::args().nth(1) {
        Some(path) => load_image(&mut frame, &path)?,
        None => draw_test_card(&mut frame),
    }

    // Wire the scheduler to in-process hardware and start the 60 Hz loop.
    let driver = Arc::new(SimulatedDriver::new());
    let mut scheduler = FrameScheduler::new(
        geometry,
        timing,
        DEFAULT_TICK_NS,
        driver.clone(),
        Box::new(ThreadTimer::new()),
    )?;
    scheduler.begin()?;
    scheduler.encode_and_publish(&frame)?;

    // Create event loop.
    let event_loop = EventLoop::new();

    // Create window.
    let window = {
        let size = PhysicalSize::new((WIDTH * 6) as f64, (OUTPUT_HEIGHT * 3) as f64);

        WindowBuilder::new()
            .with_title("tvout")
            .with_inner_size(size)
            .with_min_inner_size(size)
            .build(&event_loop)?
    };
    window.set_resizable(false);

    // Create pixel buffer.
    let mut pixels = {
        let window_size = window.inner_size();
        let surface_texture = SurfaceTexture::new(window_size.width, window_size.height, &window);
        Pixels::new(WIDTH, OUTPUT_HEIGHT, surface_texture)?
    };

    event_loop.run(move |event, _, control_flow| {
        match event {
            Event::RedrawRequested(_) => {
                if let Some(pair) = driver.last_pair() {
                    paint_reconstruction(&pair.high, &timing, pixels.get_frame_mut());
                }
                pixels.render().expect("Failed to render pixel buffer to screen");
            }
            Event::MainEventsCleared => {
                window.request_redraw();
            }
            Event::WindowEvent {
                event: WindowEvent::CloseRequested,
                ..
            } => {
                if let Err(err) = scheduler.end() {
                    warn!("shutdown incomplete: {err}");
                }
                *control_flow = ControlFlow::Exit;
            }
            _ => {}
        }
    });
}

/// Rebuild the raster the display would show by sampling the high channel's
/// waveform in the middle of each pixel's dwell window. A little random
/// timing jitter per scanline stands in for a receiver's imperfect sync
/// recovery.
fn paint_reconstruction(high: &tvout::PulseTrain, timing: &Timing, buf: &mut [u8]) {
    let wave = Waveform::new(high, DEFAULT_TICK_NS);
    let line_ns = timing.active_line_ns(WIDTH);
    let lead_in = timing.line_front_ns + timing.hsync_pulse_ns + timing.active_back_ns;
    let jitter_range = (timing.pixel_ns / 4) as f32;

    for y in 0..OUTPUT_HEIGHT {
        let line_start = timing.active_start_ns() + y as u64 * line_ns + lead_in;
        let jitter = (rand::random::<f32>() * jitter_range) as u64;

        for x in 0..WIDTH {
            let t = line_start + x as u64 * timing.pixel_ns + timing.pixel_ns / 2 + jitter;
            let luma = if wave.level_at(t) { 0xFF } else { 0x14 };

            let idx = ((y * WIDTH + x) * 4) as usize;
            buf[idx] = luma;
            buf[idx + 1] = luma;
            buf[idx + 2] = luma;
            buf[idx + 3] = 0xFF;
        }
    }
}

/// Load an image, scale it to the raster and threshold it to monochrome.
fn load_image(frame: &mut PackedFrame, path: &str) -> Result<(), Box<dyn Error>> {
    let img = image::open(path)?
        .resize_exact(WIDTH, HEIGHT, image::imageops::FilterType::Triangle)
        .to_luma8();
    for (x, y, pixel) in img.enumerate_pixels() {
        frame.set(x, y, pixel.0[0] >= 0x80);
    }
    Ok(())
}

/// Border, checkerboard and diagonal, enough to spot sync or sampling
/// problems at a glance.
fn draw_test_card(frame: &mut PackedFrame) {
    for x in 0..WIDTH {
        frame.set(x, 0, true);
        frame.set(x, HEIGHT - 1, true);
    }
    for y in 0..HEIGHT {
        frame.set(0, y, true);
        frame.set(WIDTH - 1, y, true);
    }
    for y in 8..HEIGHT - 8 {
        for x in 8..WIDTH / 2 {
            if (x / 4 + y / 4) % 2 == 0 {
                frame.set(x, y, true);
            }
        }
    }
    for i in 0..HEIGHT - 16 {
        frame.set(WIDTH / 2 + 8 + (i * 36 / HEIGHT), 8 + i, true);
    }
}
