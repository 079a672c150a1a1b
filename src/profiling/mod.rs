//! Timing helpers for debug builds of the effect pipeline.
//!
//! Nothing here can fail; missing timers are reported through the log.

use std::time::{Duration, Instant};

use dashmap::DashMap;

/// Macro for timing code blocks
#[macro_export]
macro_rules! profile_scope {
    ($name:expr) => {
        let _profiler = $crate::profiling::ScopeProfiler::new($name);
    };
}

/// Automatic scope profiler
pub struct ScopeProfiler {
    name: &'static str,
    start: Instant,
}

impl ScopeProfiler {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            start: Instant::now(),
        }
    }
}

impl Drop for ScopeProfiler {
    fn drop(&mut self) {
        log::debug!("[PROFILE] {}: {:?}", self.name, self.start.elapsed());
    }
}

/// Named stopwatches that may start and finish on different tasks
#[derive(Debug, Default)]
pub struct TimerRegistry {
    timers: DashMap<String, Instant>,
}

impl TimerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start timing `id`, replacing any stopwatch already running under it
    pub fn start_timer(&self, id: &str) {
        log::trace!("[PROFILE] {} started timing", id);
        if self.timers.insert(id.to_string(), Instant::now()).is_some() {
            log::debug!("[PROFILE] Stopwatch replaced! ID: {}", id);
        }
    }

    /// Stop timing `id` and log the elapsed time
    pub fn finish_timer(&self, id: &str) -> Option<Duration> {
        match self.timers.remove(id) {
            Some((_, start)) => {
                let elapsed = start.elapsed();
                log::debug!("[PROFILE] {} finished in {:?}", id, elapsed);
                Some(elapsed)
            }
            None => {
                log::debug!("[PROFILE] Unable to get time for id: {}", id);
                None
            }
        }
    }

    pub fn running(&self) -> usize {
        self.timers.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timer_lifecycle() {
        let timers = TimerRegistry::new();
        timers.start_timer("shake");
        assert_eq!(timers.running(), 1);

        assert!(timers.finish_timer("shake").is_some());
        assert_eq!(timers.running(), 0);
        assert!(timers.finish_timer("shake").is_none());
    }

    #[test]
    fn test_restarting_replaces_timer() {
        let timers = TimerRegistry::new();
        timers.start_timer("emit");
        timers.start_timer("emit");
        assert_eq!(timers.running(), 1);
    }

    #[test]
    fn test_profile_scope_compiles_in_place() {
        fn timed() -> u32 {
            crate::profile_scope!("timed");
            7
        }
        assert_eq!(timed(), 7);
    }
}
