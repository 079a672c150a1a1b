//! Shake Controller
//!
//! Jolts the viewport by the shake amplitude on both axes, holds it for the
//! shake delay and puts it back, once per unit of change magnitude up to the
//! configured maximum. Each step restores its own displacement before the
//! next one starts, so the viewport always ends where it began.

use std::sync::Arc;

use glam::DVec2;

use crate::error::{PowerModeResult, SurfaceErrorContext};
use crate::host::Viewport;
use crate::state::EngineState;

const SHAKE_TIMER: &str = "shake";

pub struct ShakeController {
    state: Arc<EngineState>,
    viewport: Arc<dyn Viewport>,
}

impl ShakeController {
    pub fn new(state: Arc<EngineState>, viewport: Arc<dyn Viewport>) -> Self {
        Self { state, viewport }
    }

    /// Run one shake sequence for a change of `magnitude`.
    ///
    /// Returns the number of displacement steps applied. A viewport that
    /// fails mid-sequence ends the sequence early; the failure is logged and
    /// never returned.
    pub async fn shake(&self, magnitude: i64) -> u32 {
        let options = self.state.config.options();
        let iterations = magnitude
            .unsigned_abs()
            .min(u64::from(options.max_shake_amount)) as u32;
        if iterations == 0 {
            return 0;
        }

        self.state.timers.start_timer(SHAKE_TIMER);
        let amplitude = f64::from(options.shake_amplitude);
        let delay = options.shake_delay();

        let mut applied = 0;
        for _ in 0..iterations {
            let offset = DVec2::new(
                amplitude * f64::from(self.state.rng.sign_swap()),
                amplitude * f64::from(self.state.rng.sign_swap()),
            );

            if let Err(e) = self.displace(offset) {
                log::debug!("[ShakeController] Stopping after {} steps: {}", applied, e);
                break;
            }
            applied += 1;

            tokio::time::sleep(delay).await;

            if let Err(e) = self.displace(-offset) {
                log::debug!("[ShakeController] Restore failed: {}", e);
            }
        }

        self.state.timers.finish_timer(SHAKE_TIMER);
        log::trace!(
            "[ShakeController] Shook {}/{} steps for delta {}",
            applied,
            iterations,
            magnitude
        );
        applied
    }

    /// Move the viewport by `offset`, leaving it untouched if either axis fails
    fn displace(&self, offset: DVec2) -> PowerModeResult<()> {
        let left = self.viewport.viewport_left().surface_context("read viewport left")?;
        self.viewport
            .set_viewport_left(left + offset.x)
            .surface_context("move viewport left")?;

        if let Err(e) = self
            .viewport
            .scroll_vertically_by_pixels(offset.y)
            .surface_context("scroll viewport")
        {
            if let Err(restore) = self.viewport.set_viewport_left(left) {
                log::debug!("[ShakeController] Could not put viewport left back: {}", restore);
            }
            return Err(e);
        }
        Ok(())
    }

    pub fn viewport_size(&self) -> DVec2 {
        self.viewport.viewport_size()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigStore;
    use crate::error::surface_unavailable;
    use crate::host::MemoryViewport;
    use parking_lot::Mutex;
    use crate::rng::SharedRng;
    use std::time::Duration;
    use tokio::runtime::Handle;

    fn state() -> Arc<EngineState> {
        Arc::new(EngineState::new(
            Arc::new(ConfigStore::default()),
            SharedRng::from_seed(5),
            Handle::current(),
        ))
    }

    fn controller() -> (ShakeController, Arc<MemoryViewport>) {
        let viewport = Arc::new(MemoryViewport::default());
        (ShakeController::new(state(), viewport.clone()), viewport)
    }

    /// Viewport that never scrolls vertically and accepts `left_writes` horizontal moves
    struct StuckViewport {
        left: Mutex<f64>,
        left_writes: Mutex<u32>,
    }

    impl StuckViewport {
        fn new(left_writes: u32) -> Self {
            Self {
                left: Mutex::new(0.0),
                left_writes: Mutex::new(left_writes),
            }
        }
    }

    impl Viewport for StuckViewport {
        fn viewport_left(&self) -> PowerModeResult<f64> {
            Ok(*self.left.lock())
        }

        fn set_viewport_left(&self, left: f64) -> PowerModeResult<()> {
            let mut remaining = self.left_writes.lock();
            if *remaining == 0 {
                return Err(surface_unavailable("set_viewport_left"));
            }
            *remaining -= 1;
            *self.left.lock() = left;
            Ok(())
        }

        fn scroll_vertically_by_pixels(&self, _: f64) -> PowerModeResult<()> {
            Err(surface_unavailable("scroll_vertically_by_pixels"))
        }

        fn viewport_size(&self) -> DVec2 {
            DVec2::new(640.0, 480.0)
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_iterations_capped_by_max_shake_amount() {
        let (shake, viewport) = controller();

        assert_eq!(shake.shake(3).await, 3);
        assert_eq!(viewport.horizontal_moves().len(), 6);

        assert_eq!(shake.shake(-40).await, 5);
        assert_eq!(viewport.vertical_moves().len(), 6 + 10);
    }

    #[tokio::test(start_paused = true)]
    async fn test_every_step_is_undone() {
        let (shake, viewport) = controller();
        shake.shake(5).await;

        let moves = viewport.horizontal_moves();
        for pair in moves.chunks(2) {
            assert_eq!(pair[0].abs(), 2.0);
            assert_eq!(pair[0], -pair[1]);
        }
        assert_eq!(viewport.offset(), DVec2::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_magnitude_does_nothing() {
        let (shake, viewport) = controller();
        assert_eq!(shake.shake(0).await, 0);
        assert!(viewport.horizontal_moves().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_holds_for_shake_delay() {
        let (shake, _) = controller();
        let started = tokio::time::Instant::now();
        shake.shake(2).await;
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_millis(100));
        assert!(elapsed < Duration::from_millis(110));
    }

    #[tokio::test(start_paused = true)]
    async fn test_torn_down_viewport_stops_sequence() {
        let (shake, viewport) = controller();
        viewport.tear_down();
        assert_eq!(shake.shake(5).await, 0);
        assert!(viewport.horizontal_moves().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_scroll_puts_left_back() {
        let viewport = Arc::new(StuckViewport::new(u32::MAX));
        let shake = ShakeController::new(state(), viewport.clone());

        assert_eq!(shake.shake(3).await, 0);
        assert_eq!(*viewport.left.lock(), 0.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_restore_is_reported_not_raised() {
        // The displacement lands, then both the scroll and the put-back fail
        let viewport = Arc::new(StuckViewport::new(1));
        let shake = ShakeController::new(state(), viewport.clone());

        assert_eq!(shake.shake(3).await, 0);
        assert_eq!(viewport.left.lock().abs(), 2.0);
        assert!(shake.displace(DVec2::new(2.0, 2.0)).is_err());
    }
}
