//! Single-slot timers.

use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::trace;

/// A named timer holding at most one pending callback.
///
/// Arming aborts the previously armed callback first. Once the delay elapses
/// the callback runs as its own task, so aborting can no longer reach it;
/// each arm and cancel therefore bumps a generation number, and the callback
/// receives the generation it was armed with. Callbacks check
/// [`TimerSlot::is_current`] under the same lock that guards the slot and
/// bail when they have been superseded.
#[derive(Debug)]
pub struct TimerSlot {
    name: &'static str,
    handle: Option<JoinHandle<()>>,
    generation: u64,
}

impl TimerSlot {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            handle: None,
            generation: 0,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Run the callback built by `make` after `delay`, replacing any pending
    /// callback. `make` receives the generation of this arm.
    pub fn arm<C, F>(&mut self, delay: Duration, make: C) -> u64
    where
        C: FnOnce(u64) -> F,
        F: Future<Output = ()> + Send + 'static,
    {
        self.cancel();
        let generation = self.generation;
        trace!(
            timer = self.name,
            generation,
            delay_ms = delay.as_millis() as u64,
            "TIMER_ARMED"
        );

        let callback = make(generation);
        self.handle = Some(tokio::spawn(async move {
            sleep(delay).await;
            tokio::spawn(callback);
        }));
        generation
    }

    /// Drop the pending callback, if any. Returns whether one was pending.
    ///
    /// A callback that already started is invalidated through the generation.
    pub fn cancel(&mut self) -> bool {
        self.generation = self.generation.wrapping_add(1);
        match self.handle.take() {
            Some(handle) => {
                let pending = !handle.is_finished();
                handle.abort();
                if pending {
                    trace!(timer = self.name, "TIMER_CANCELLED");
                }
                pending
            }
            None => false,
        }
    }

    /// Whether a callback is waiting for its delay to elapse.
    pub fn is_armed(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Whether `generation` belongs to the most recent arm, with no cancel since.
    pub fn is_current(&self, generation: u64) -> bool {
        self.generation == generation
    }
}

impl Drop for TimerSlot {
    fn drop(&mut self) {
        self.cancel();
    }
}
