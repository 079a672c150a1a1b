//! Shared Engine State
//!
//! Explicitly owned state handed to every component by `Arc`: live
//! configuration, the injected random source, the runtime that drives
//! suspending effect tasks and the cross-task live particle counter.

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use crate::config::ConfigStore;
use crate::profiling::TimerRegistry;
use crate::rng::SharedRng;

pub struct EngineState {
    pub config: Arc<ConfigStore>,
    pub rng: SharedRng,
    pub timers: TimerRegistry,

    /// Runtime that particle and shake tasks are spawned on
    runtime: Handle,

    /// Particles admitted and not yet retired
    live_particles: AtomicUsize,
}

impl EngineState {
    pub fn new(config: Arc<ConfigStore>, rng: SharedRng, runtime: Handle) -> Self {
        Self {
            config,
            rng,
            timers: TimerRegistry::new(),
            runtime,
            live_particles: AtomicUsize::new(0),
        }
    }

    /// State bound to the runtime the caller is running on, if any
    pub fn on_current_runtime(config: Arc<ConfigStore>, rng: SharedRng) -> Option<Self> {
        Handle::try_current()
            .ok()
            .map(|runtime| Self::new(config, rng, runtime))
    }

    pub fn spawn<F>(&self, future: F) -> JoinHandle<F::Output>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        self.runtime.spawn(future)
    }

    pub fn live_particles(&self) -> usize {
        self.live_particles.load(Ordering::Acquire)
    }

    /// Count one more live particle unless the count already exceeds `max`
    pub fn try_admit_particle(&self, max: usize) -> bool {
        self.live_particles
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |live| {
                (live <= max).then_some(live + 1)
            })
            .is_ok()
    }

    pub fn release_particle(&self) {
        let released = self
            .live_particles
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |live| live.checked_sub(1));
        if released.is_err() {
            log::warn!("[EngineState] Released a particle with none live");
        }
    }
}

impl std::fmt::Debug for EngineState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineState")
            .field("config_version", &self.config.version())
            .field("live_particles", &self.live_particles())
            .field("running_timers", &self.timers.running())
            .finish_non_exhaustive()
    }
}
