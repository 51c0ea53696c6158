//! Progress reporting for long running computations.
//!
//! Computations report their progress through the [`ProgressNotification`] trait.
//! The receiving side decides whether the computation may continue, returning
//! [`ComputationStatus::Abort`] from a callback makes the next `tick` fail with [`Error::Cancelled`].

use std::sync::atomic::{AtomicU64, Ordering};

use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComputationStatus {
    Continue,
    Abort,
}

pub trait ProgressNotification {
    /// Start a new computation consisting of `total` steps
    fn reset(&self, total: u64);
    /// Mark one step as done, returns `Error::Cancelled` when the computation should stop
    fn tick(&self) -> Result;
}

impl<P: ProgressNotification + ?Sized> ProgressNotification for &P {
    fn reset(&self, total: u64) {
        (**self).reset(total);
    }

    fn tick(&self) -> Result {
        (**self).tick()
    }
}

/// Ignores all progress
pub struct DummyProgress;

impl ProgressNotification for DummyProgress {
    fn reset(&self, _total: u64) {}

    fn tick(&self) -> Result {
        Ok(())
    }
}

/// Progress notification that invokes a callback with the progress fraction [0.0 - 1.0] on every tick.
/// The step counters are atomic so the current state can be observed from other threads.
pub struct CallbackProgress<Payload, F>
where
    F: Fn(f64, &Payload) -> ComputationStatus,
{
    total: AtomicU64,
    current: AtomicU64,
    payload: Payload,
    cb: F,
}

impl<Payload: Default, F> CallbackProgress<Payload, F>
where
    F: Fn(f64, &Payload) -> ComputationStatus,
{
    pub fn with_cb(cb: F) -> Self {
        Self::with_cb_and_payload(cb, Payload::default())
    }
}

impl<Payload, F> CallbackProgress<Payload, F>
where
    F: Fn(f64, &Payload) -> ComputationStatus,
{
    pub fn with_cb_and_payload(cb: F, payload: Payload) -> Self {
        CallbackProgress {
            total: AtomicU64::new(0),
            current: AtomicU64::new(0),
            payload,
            cb,
        }
    }

    /// Number of steps completed since the last reset
    pub fn completed(&self) -> u64 {
        self.current.load(Ordering::Acquire)
    }

    pub fn total(&self) -> u64 {
        self.total.load(Ordering::Acquire)
    }

    pub fn fraction(&self) -> f64 {
        progress_fraction(self.completed(), self.total())
    }
}

impl<Payload, F> ProgressNotification for CallbackProgress<Payload, F>
where
    F: Fn(f64, &Payload) -> ComputationStatus,
{
    fn reset(&self, total: u64) {
        self.total.store(total, Ordering::Release);
        self.current.store(0, Ordering::Release);
    }

    fn tick(&self) -> Result {
        let current = self.current.fetch_add(1, Ordering::AcqRel) + 1;
        match (self.cb)(progress_fraction(current, self.total()), &self.payload) {
            ComputationStatus::Continue => Ok(()),
            ComputationStatus::Abort => Err(Error::Cancelled),
        }
    }
}

fn progress_fraction(current: u64, total: u64) -> f64 {
    if total == 0 {
        1.0
    } else {
        (current as f64 / total as f64).min(1.0)
    }
}
