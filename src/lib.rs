pub mod aggregator;
pub mod color;
pub mod combo;
pub mod config;
pub mod constants;
pub mod error;
pub mod host;
pub mod particles;
pub mod profiling;
pub mod rng;
pub mod shake;
pub mod state;

use std::sync::Arc;

use tokio::runtime::Handle;

pub use aggregator::{ChangeAggregator, ChangeOutcome, EffectReport};
pub use color::{ColorSource, Rgb};
pub use combo::{ComboGate, ComboRules, ComboState};
pub use config::{ConfigSnapshot, ConfigStore, ConfigValue, PowerModeOptions};
pub use error::{PowerModeError, PowerModeResult};
pub use host::{CaretSource, ParticleVisual, ThemeSource, Viewport, VisualSurface, VisualToken};
pub use particles::{ParticleEngine, PoolStats};
pub use rng::SharedRng;
pub use shake::ShakeController;
pub use state::EngineState;

/// Host collaborators a view supplies to power mode
#[derive(Clone)]
pub struct Host {
    pub surface: Arc<dyn VisualSurface>,
    pub viewport: Arc<dyn Viewport>,
    pub caret: Arc<dyn CaretSource>,
    pub theme: Arc<dyn ThemeSource>,
}

/// Power mode for one editor view: state, particles, shake and the change
/// pipeline wired together
pub struct PowerMode {
    state: Arc<EngineState>,
    engine: Arc<ParticleEngine>,
    aggregator: ChangeAggregator,
}

impl PowerMode {
    pub fn new(config: Arc<ConfigStore>, host: Host, rng: SharedRng, runtime: Handle) -> Self {
        Self::attach(EngineState::new(config, rng, runtime), host)
    }

    /// Power mode driven by the runtime the caller is running on, if any
    pub fn on_current_runtime(
        config: Arc<ConfigStore>,
        host: Host,
        rng: SharedRng,
    ) -> Option<Self> {
        EngineState::on_current_runtime(config, rng).map(|state| Self::attach(state, host))
    }

    fn attach(state: EngineState, host: Host) -> Self {
        let state = Arc::new(state);
        let engine = Arc::new(ParticleEngine::new(state.clone(), host.surface, host.theme));
        let shake = Arc::new(ShakeController::new(state.clone(), host.viewport));
        let aggregator = ChangeAggregator::new(state.clone(), engine.clone(), shake, host.caret);

        log::info!(
            "[PowerMode] Attached to view (options version {})",
            state.config.version()
        );
        Self {
            state,
            engine,
            aggregator,
        }
    }

    /// Feed one batch of signed change magnitudes
    pub fn on_changes(&self, changes: &[i32]) -> ChangeOutcome {
        self.aggregator.on_changes(changes)
    }

    pub fn aggregator(&self) -> &ChangeAggregator {
        &self.aggregator
    }

    pub fn engine(&self) -> &Arc<ParticleEngine> {
        &self.engine
    }

    pub fn config(&self) -> &Arc<ConfigStore> {
        &self.state.config
    }

    pub fn state(&self) -> &Arc<EngineState> {
        &self.state
    }

    pub fn live_particles(&self) -> usize {
        self.engine.live_count()
    }
}
