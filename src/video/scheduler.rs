//! Periodic frame emission.
//!
//! A hardware timer fires at the refresh rate and retransmits the most
//! recently published pulse-train pair; callers publish new frames whenever
//! they have one, at whatever rate they like. The pair is swapped behind a
//! shared handle as a unit, so the trigger callback always transmits two
//! channels from the same frame, never one old and one new.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use log::{debug, info, warn};

use crate::error::Error;
use crate::hw::{Channel, PeriodicTrigger, PulseDriver};
use crate::surface::{FrameSurface, PackedFrame};
use crate::types::PulseTrainPair;
use crate::video::{encoder, timeline, Geometry, Timing};

/// How long `end()` waits for each channel to drain its last burst.
pub const IDLE_TIMEOUT: Duration = Duration::from_millis(1000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Idle,
    Running,
    Stopped,
}

/// State reachable from the trigger callback.
struct Shared {
    driver: Arc<dyn PulseDriver>,
    /// Latest complete frame. `None` until the first publish and again after
    /// a transmission failure.
    published: Mutex<Option<Arc<PulseTrainPair>>>,
    /// Precomputed blank frame, transmitted whenever nothing is published.
    placeholder: Arc<PulseTrainPair>,
    emit_failures: AtomicU64,
}

impl Shared {
    /// One trigger cycle. Must never panic or block for long: it runs on the
    /// timer's context, racing against `encode_and_publish`.
    fn emit(&self) {
        let pair = self
            .published
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .unwrap_or_else(|| Arc::clone(&self.placeholder));

        if let Err(err) = self.driver.transmit_simultaneous(&pair.low, &pair.high) {
            self.emit_failures.fetch_add(1, Ordering::Relaxed);
            warn!("frame transmission failed: {err}");
            // Drop the rejected pair so the next cycle emits the placeholder.
            *self
                .published
                .lock()
                .unwrap_or_else(PoisonError::into_inner) = None;
        }
    }
}

/// Owns the published pulse-train pair and the periodic trigger that
/// retransmits it.
pub struct FrameScheduler {
    geometry: Geometry,
    timing: Timing,
    tick_ns: u32,
    trigger: Box<dyn PeriodicTrigger>,
    shared: Arc<Shared>,
    encoding: AtomicBool,
    state: State,
}

impl FrameScheduler {
    /// Validate the configuration and precompute the placeholder pair from an
    /// all-black frame. The trigger stays unregistered until `begin()`.
    pub fn new(
        geometry: Geometry,
        timing: Timing,
        tick_ns: u32,
        driver: Arc<dyn PulseDriver>,
        trigger: Box<dyn PeriodicTrigger>,
    ) -> Result<Self, Error> {
        if tick_ns == 0 {
            return Err(Error::InvalidTickDuration);
        }
        let blank = PackedFrame::new(geometry.width, geometry.height);
        let segments = timeline::build_timeline(&blank, &geometry, &timing);
        let placeholder = Arc::new(encoder::encode(&segments, tick_ns)?);

        Ok(Self {
            geometry,
            timing,
            tick_ns,
            trigger,
            shared: Arc::new(Shared {
                driver,
                published: Mutex::new(None),
                placeholder,
                emit_failures: AtomicU64::new(0),
            }),
            encoding: AtomicBool::new(false),
            state: State::Idle,
        })
    }

    /// Register the periodic trigger and start emitting at the refresh rate.
    /// A scheduler that was `end()`ed can be begun again; it registers a
    /// fresh trigger the same way.
    pub fn begin(&mut self) -> Result<(), Error> {
        if self.state == State::Running {
            return Err(Error::AlreadyRunning);
        }
        let shared = Arc::clone(&self.shared);
        self.trigger
            .register(self.timing.refresh_hz, Box::new(move || shared.emit()));
        self.state = State::Running;
        info!("frame emission started at {} Hz", self.timing.refresh_hz);
        Ok(())
    }

    /// Encode `surface` and publish the result as the pair every subsequent
    /// trigger cycle transmits. Call this once per visual update; it does not
    /// need to keep up with the refresh rate.
    ///
    /// Only one encode may be in flight at a time: a second caller gets
    /// `ConcurrentPublish` instead of silently racing the first.
    pub fn encode_and_publish<S: FrameSurface + ?Sized>(&self, surface: &S) -> Result<(), Error> {
        if self.encoding.swap(true, Ordering::Acquire) {
            return Err(Error::ConcurrentPublish);
        }
        let result = self.encode_inner(surface);
        self.encoding.store(false, Ordering::Release);
        result
    }

    fn encode_inner<S: FrameSurface + ?Sized>(&self, surface: &S) -> Result<(), Error> {
        let segments = timeline::build_timeline(surface, &self.geometry, &self.timing);
        let pair = encoder::encode(&segments, self.tick_ns)?;
        debug!(
            "published frame: {} low runs, {} high runs",
            pair.low.ticks.len(),
            pair.high.ticks.len()
        );
        *self
            .shared
            .published
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(Arc::new(pair));
        Ok(())
    }

    /// Deregister the trigger, then wait for both channels to finish their
    /// last burst. Deregistration comes first so no emit can race the
    /// teardown; the waits are bounded and surface a timeout instead of
    /// hanging.
    pub fn end(&mut self) -> Result<(), Error> {
        if self.state != State::Running {
            return Err(Error::NotRunning);
        }
        self.trigger.deregister();
        self.state = State::Stopped;
        info!("frame emission stopped");
        self.shared
            .driver
            .wait_until_idle(Channel::Low, IDLE_TIMEOUT)?;
        self.shared
            .driver
            .wait_until_idle(Channel::High, IDLE_TIMEOUT)?;
        Ok(())
    }

    /// Transmissions that failed inside the trigger callback since
    /// construction.
    pub fn emit_failures(&self) -> u64 {
        self.shared.emit_failures.load(Ordering::Relaxed)
    }

    /// The precomputed blank-frame pair.
    pub fn placeholder(&self) -> Arc<PulseTrainPair> {
        Arc::clone(&self.shared.placeholder)
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    pub fn timing(&self) -> &Timing {
        &self.timing
    }

    pub fn tick_ns(&self) -> u32 {
        self.tick_ns
    }
}
