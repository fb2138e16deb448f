//! In-process stand-ins for the hardware capabilities. The demo binary uses
//! them to run the full pipeline on a desktop; the tests use them to observe
//! exactly what the scheduler transmits.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::error::Error;
use crate::hw::{Channel, PeriodicTrigger, PulseDriver};
use crate::types::{PulseTrain, PulseTrainPair};

/// A pulse driver that records what it is asked to transmit instead of
/// toggling pins. Playback is modelled as instantaneous: the driver is idle
/// again as soon as `transmit` returns, unless it has been jammed.
#[derive(Default)]
pub struct SimulatedDriver {
    last_pair: Mutex<Option<PulseTrainPair>>,
    transmissions: AtomicU64,
    fail_next: AtomicBool,
    jammed: AtomicBool,
}

impl SimulatedDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// The most recent simultaneous transmission.
    pub fn last_pair(&self) -> Option<PulseTrainPair> {
        self.last_pair
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// How many transmission requests have been accepted.
    pub fn transmissions(&self) -> u64 {
        self.transmissions.load(Ordering::Relaxed)
    }

    /// Make the next transmission request fail.
    pub fn fail_next_transmission(&self) {
        self.fail_next.store(true, Ordering::Relaxed);
    }

    /// Pretend both channels are stuck mid-burst forever, so every
    /// `wait_until_idle` runs out its timeout.
    pub fn jam(&self) {
        self.jammed.store(true, Ordering::Relaxed);
    }

    fn check(&self, train: &PulseTrain) -> Result<(), Error> {
        if train.ticks.iter().any(|&t| t == 0) {
            return Err(Error::TransmitRejected {
                reason: "zero-length pulse entry",
            });
        }
        Ok(())
    }

    fn take_injected_failure(&self) -> Result<(), Error> {
        if self.fail_next.swap(false, Ordering::Relaxed) {
            return Err(Error::TransmitRejected {
                reason: "injected failure",
            });
        }
        Ok(())
    }
}

impl PulseDriver for SimulatedDriver {
    fn transmit(&self, _channel: Channel, train: &PulseTrain) -> Result<(), Error> {
        self.take_injected_failure()?;
        self.check(train)?;
        self.transmissions.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn transmit_simultaneous(&self, low: &PulseTrain, high: &PulseTrain) -> Result<(), Error> {
        self.take_injected_failure()?;
        self.check(low)?;
        self.check(high)?;
        *self
            .last_pair
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(PulseTrainPair {
            low: low.clone(),
            high: high.clone(),
        });
        self.transmissions.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn wait_until_idle(&self, channel: Channel, timeout: Duration) -> Result<(), Error> {
        if self.jammed.load(Ordering::Relaxed) {
            thread::sleep(timeout);
            return Err(Error::IdleTimeout { channel });
        }
        Ok(())
    }
}

/// A periodic trigger backed by a plain thread. The period restarts after
/// each callback returns, so the rate drifts by the callback's runtime;
/// close enough to a hardware timer for desktop use.
#[derive(Default)]
pub struct ThreadTimer {
    stop_tx: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl ThreadTimer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PeriodicTrigger for ThreadTimer {
    fn register(&mut self, freq_hz: u32, mut callback: Box<dyn FnMut() + Send + 'static>) {
        self.deregister();
        let period = Duration::from_nanos(1_000_000_000 / freq_hz.max(1) as u64);
        let (stop_tx, stop_rx) = mpsc::channel();
        self.stop_tx = Some(stop_tx);
        self.handle = Some(thread::spawn(move || loop {
            match stop_rx.recv_timeout(period) {
                Err(RecvTimeoutError::Timeout) => callback(),
                _ => break,
            }
        }));
    }

    fn deregister(&mut self) {
        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for ThreadTimer {
    fn drop(&mut self) {
        self.deregister();
    }
}

/// A trigger fired by hand. Cloning shares the callback slot, so a test can
/// keep one handle and give the other to the scheduler.
#[derive(Clone, Default)]
pub struct ManualTrigger {
    slot: Arc<Mutex<Option<Box<dyn FnMut() + Send + 'static>>>>,
}

impl ManualTrigger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Invoke the registered callback once. Returns false if nothing is
    /// registered.
    pub fn fire(&self) -> bool {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        match slot.as_mut() {
            Some(callback) => {
                callback();
                true
            }
            None => false,
        }
    }
}

impl PeriodicTrigger for ManualTrigger {
    fn register(&mut self, _freq_hz: u32, callback: Box<dyn FnMut() + Send + 'static>) {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(callback);
    }

    fn deregister(&mut self) {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }
}
