//! Particle Engine
//!
//! Emits explosion particles at a point and animates each one on its own
//! task: every `frame_delay` the particle steps and its visual is moved,
//! until its alpha drops below the decrement and the visual is detached.
//! Live particles share one pool and one atomic live counter.

use std::sync::Arc;
use std::time::Duration;

use glam::DVec2;
use parking_lot::Mutex;

use super::{ParticlePool, ParticleStep, PoolStats, PooledParticle};
use crate::color::{resolve_color, ColorSource, Rgb};
use crate::config::ConfigSnapshot;
use crate::constants::emission::POOL_PREWARM_FACTOR;
use crate::host::{ThemeSource, VisualSurface};
use crate::state::EngineState;

/// Color picked for one configuration version
#[derive(Debug, Clone, Copy)]
struct ResolvedColor {
    version: u64,
    color: Rgb,
    source: ColorSource,
}

pub struct ParticleEngine {
    state: Arc<EngineState>,
    surface: Arc<dyn VisualSurface>,
    theme: Arc<dyn ThemeSource>,
    pool: ParticlePool,

    /// Last configuration this engine read; refreshed when the version moves
    snapshot: Mutex<ConfigSnapshot>,

    color: Mutex<Option<ResolvedColor>>,
}

impl ParticleEngine {
    pub fn new(
        state: Arc<EngineState>,
        surface: Arc<dyn VisualSurface>,
        theme: Arc<dyn ThemeSource>,
    ) -> Self {
        let snapshot = state.config.snapshot();
        let prewarm = snapshot.particles_per_press as usize * POOL_PREWARM_FACTOR;

        Self {
            state,
            surface,
            theme,
            pool: ParticlePool::with_capacity(prewarm),
            snapshot: Mutex::new(snapshot),
            color: Mutex::new(None),
        }
    }

    /// Emit up to `count` particles at `origin`.
    ///
    /// Each particle is admitted only while the live count does not exceed
    /// the configured maximum; refused particles are silently skipped.
    /// Returns the number of particles admitted.
    pub fn emit(self: &Arc<Self>, origin: DVec2, count: u32) -> usize {
        let options = self.current_options();
        let color = self.particle_color(&options);
        let frame_delay = options.frame_delay();

        let mut admitted = 0;
        for _ in 0..count {
            if !self.state.try_admit_particle(options.max_particle_count) {
                log::debug!(
                    "[ParticleEngine] Admission refused at {} live particles (max {})",
                    self.state.live_particles(),
                    options.max_particle_count
                );
                break;
            }

            let up_velocity = self.state.rng.up_to(options.max_up_velocity);
            let side_sign = f64::from(self.state.rng.sign_swap());
            let side_velocity = self.state.rng.up_to(options.max_side_velocity) * side_sign;

            let mut particle = self.pool.checkout();
            particle.launch(origin, DVec2::new(side_velocity, up_velocity), &options, color);

            // Built before the spawn so a task that never runs still retires its particle
            let flight = InFlight {
                engine: Arc::clone(self),
                particle: Some(particle),
            };
            self.state.spawn(flight.animate(frame_delay));
            admitted += 1;
        }

        log::trace!("[ParticleEngine] Emitted {}/{} particles at {:?}", admitted, count, origin);
        admitted
    }

    fn current_options(&self) -> ConfigSnapshot {
        let mut snapshot = self.snapshot.lock();
        if snapshot.refresh(&self.state.config) {
            log::debug!("[ParticleEngine] Reloaded options version {}", snapshot.version);
        }
        snapshot.clone()
    }

    /// Color for `options`, resolved once per configuration version
    fn particle_color(&self, options: &ConfigSnapshot) -> Rgb {
        let mut cached = self.color.lock();
        if let Some(resolved) = *cached {
            if resolved.version == options.version {
                return resolved.color;
            }
        }

        let (color, source) = self
            .state
            .rng
            .with(|rng| resolve_color(options, self.theme.as_ref(), rng));
        log::debug!(
            "[ParticleEngine] Particle color {:?} from {:?} (options version {})",
            color,
            source,
            options.version
        );
        *cached = Some(ResolvedColor {
            version: options.version,
            color,
            source,
        });
        color
    }

    pub fn live_count(&self) -> usize {
        self.state.live_particles()
    }

    pub fn pool_stats(&self) -> PoolStats {
        self.pool.stats()
    }

    /// Source of the color in use, if one has been resolved
    pub fn color_source(&self) -> Option<ColorSource> {
        self.color.lock().map(|resolved| resolved.source)
    }
}

/// A particle on its way across the surface.
///
/// Dropping it, whether the frame loop finished or the task was cancelled,
/// returns the particle to the pool and releases its live count.
struct InFlight {
    engine: Arc<ParticleEngine>,
    particle: Option<PooledParticle>,
}

impl InFlight {
    async fn animate(mut self, frame_delay: Duration) {
        let surface = Arc::clone(&self.engine.surface);
        let Some(particle) = self.particle.as_mut() else {
            return;
        };
        let token = particle.token();

        if let Err(e) = surface.attach_visual(&particle.visual()) {
            log::debug!("[ParticleEngine] Dropping particle {:?}: {}", token, e);
            return;
        }

        loop {
            tokio::time::sleep(frame_delay).await;

            match particle.step() {
                ParticleStep::Alive => {
                    if let Err(e) = surface.move_visual(&particle.visual()) {
                        log::debug!("[ParticleEngine] Aborting particle {:?}: {}", token, e);
                        if let Err(e) = surface.detach_visual(token) {
                            log::debug!("[ParticleEngine] Detach of {:?} failed: {}", token, e);
                        }
                        return;
                    }
                }
                ParticleStep::Expired => {
                    if let Err(e) = surface.detach_visual(token) {
                        log::debug!("[ParticleEngine] Detach of {:?} failed: {}", token, e);
                    }
                    log::trace!(
                        "[ParticleEngine] Particle {:?} expired after {} frames",
                        token,
                        particle.frames
                    );
                    return;
                }
            }
        }
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        if let Some(particle) = self.particle.take() {
            self.engine.pool.checkin(particle);
            self.engine.state.release_particle();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigStore;
    use crate::error::PowerModeResult;
    use crate::host::{FixedTheme, MemorySurface, ParticleVisual, VisualToken};
    use crate::rng::SharedRng;
    use tokio::runtime::Handle;

    fn state_with(store: ConfigStore) -> Arc<EngineState> {
        Arc::new(EngineState::new(
            Arc::new(store),
            SharedRng::from_seed(11),
            Handle::current(),
        ))
    }

    fn engine_with(
        store: ConfigStore,
        theme: FixedTheme,
    ) -> (Arc<ParticleEngine>, Arc<MemorySurface>) {
        let surface = Arc::new(MemorySurface::new());
        let engine = Arc::new(ParticleEngine::new(
            state_with(store),
            surface.clone(),
            Arc::new(theme),
        ));
        (engine, surface)
    }

    /// Surface whose host code panics on the first frame update
    struct PanickingSurface;

    impl VisualSurface for PanickingSurface {
        fn attach_visual(&self, _: &ParticleVisual) -> PowerModeResult<()> {
            Ok(())
        }

        fn move_visual(&self, _: &ParticleVisual) -> PowerModeResult<()> {
            panic!("host surface panicked");
        }

        fn detach_visual(&self, _: VisualToken) -> PowerModeResult<()> {
            Ok(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_emit_attaches_and_retires() {
        let store = ConfigStore::default();
        store
            .update(|o| {
                o.start_alpha = 0.9;
                o.alpha_remove_amount = 0.3;
            })
            .unwrap();
        let (engine, surface) = engine_with(store, FixedTheme(None));

        assert_eq!(engine.emit(DVec2::new(40.0, 40.0), 4), 4);
        assert_eq!(engine.live_count(), 4);

        tokio::time::sleep(Duration::from_millis(17 * 3 + 1)).await;

        assert_eq!(engine.live_count(), 0);
        assert_eq!(surface.attach_count(), 4);
        assert_eq!(surface.detach_count(), 4);
        assert_eq!(surface.move_count(), 8);
        assert_eq!(engine.pool_stats().checked_out, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pool_is_prewarmed_from_particles_per_press() {
        let (engine, _) = engine_with(ConfigStore::default(), FixedTheme(None));
        assert_eq!(engine.pool_stats().capacity, 20);
    }

    #[tokio::test(start_paused = true)]
    async fn test_color_resolved_once_per_version() {
        let store = ConfigStore::default();
        store.update(|o| o.random_color = true).unwrap();
        let (engine, surface) = engine_with(store, FixedTheme(None));

        engine.emit(DVec2::ZERO, 3);
        engine.emit(DVec2::ZERO, 3);
        tokio::time::sleep(Duration::from_secs(1)).await;

        let colors: std::collections::HashSet<_> =
            surface.completed().iter().map(|v| v.color).collect();
        assert_eq!(colors.len(), 1);
        assert_eq!(engine.color_source(), Some(ColorSource::Random));
    }

    #[tokio::test(start_paused = true)]
    async fn test_environment_color_follows_config_changes() {
        let store = ConfigStore::default();
        store.update(|o| o.color = Rgb::new(5, 5, 5)).unwrap();
        let state_store = Arc::new(store);
        let state = Arc::new(EngineState::new(
            state_store.clone(),
            SharedRng::from_seed(3),
            Handle::current(),
        ));
        let surface = Arc::new(MemorySurface::new());
        let engine = Arc::new(ParticleEngine::new(
            state,
            surface.clone(),
            Arc::new(FixedTheme(Some(Rgb::new(220, 220, 220)))),
        ));

        engine.emit(DVec2::ZERO, 1);
        assert_eq!(engine.color_source(), Some(ColorSource::Fixed));

        state_store.set_option("use_environment_color", true).unwrap();
        engine.emit(DVec2::ZERO, 1);
        assert_eq!(engine.color_source(), Some(ColorSource::Environment));

        tokio::time::sleep(Duration::from_secs(1)).await;
        let colors: Vec<_> = surface.completed().iter().map(|v| v.color).collect();
        assert!(colors.contains(&Rgb::new(5, 5, 5)));
        assert!(colors.contains(&Rgb::new(220, 220, 220)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_velocities_respect_bounds() {
        let store = ConfigStore::default();
        store
            .update(|o| {
                o.max_up_velocity = 3.0;
                o.max_side_velocity = 1.0;
                o.gravity = 0.0;
                o.alpha_remove_amount = 0.45;
            })
            .unwrap();
        let (engine, surface) = engine_with(store, FixedTheme(None));
        let origin = DVec2::new(100.0, 100.0);

        engine.emit(origin, 50);
        tokio::time::sleep(Duration::from_secs(1)).await;

        // One step before expiring at 0.9 / 0.45: displacement equals the launch velocity
        for visual in surface.completed() {
            let moved = origin - visual.final_position;
            assert!((0.0..=3.0).contains(&moved.y), "up velocity out of range: {}", moved.y);
            assert!(moved.x.abs() <= 1.0, "side velocity out of range: {}", moved.x);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_panicking_surface_still_retires_particles() {
        let engine = Arc::new(ParticleEngine::new(
            state_with(ConfigStore::default()),
            Arc::new(PanickingSurface),
            Arc::new(FixedTheme(None)),
        ));

        assert_eq!(engine.emit(DVec2::ZERO, 3), 3);
        assert_eq!(engine.live_count(), 3);

        // The panic unwinds each particle task on its first frame
        tokio::time::sleep(Duration::from_millis(17 * 2)).await;

        assert_eq!(engine.live_count(), 0);
        assert_eq!(engine.pool_stats().checked_out, 0);
        assert_eq!(engine.emit(DVec2::ZERO, 1), 1);
    }
}
