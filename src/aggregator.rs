//! Change Aggregator
//!
//! Entry point for text change notifications. A batch is debounced against
//! the last accepted batch, summed into one delta and, if the combo gate
//! fires, turned into a caret burst, optional party bursts and a shake.
//! Only one shake runs at a time; particle emission is never serialized.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use glam::DVec2;
use parking_lot::Mutex;

use crate::combo::{ComboGate, ComboRules};
use crate::config::PowerModeOptions;
use crate::host::CaretSource;
use crate::particles::ParticleEngine;
use crate::profile_scope;
use crate::shake::ShakeController;
use crate::state::EngineState;

/// What the aggregator did with one batch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeOutcome {
    /// Batch carried no changes
    Empty,
    /// Arrived too soon after the last accepted batch and was dropped
    Debounced,
    ComboInactive { delta: i64 },
    Fired(EffectReport),
}

/// Effects started for a batch that passed the combo gate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EffectReport {
    pub delta: i64,
    /// Particles admitted across the caret burst and party bursts
    pub particles_emitted: usize,
    pub party_bursts: u32,
    pub shake_started: bool,
}

/// Clears the shaking flag when the shake task ends, however it ends
struct ShakeGuard {
    shaking: Arc<AtomicBool>,
}

impl ShakeGuard {
    fn acquire(shaking: &Arc<AtomicBool>) -> Option<Self> {
        shaking
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self {
                shaking: Arc::clone(shaking),
            })
    }
}

impl Drop for ShakeGuard {
    fn drop(&mut self) {
        self.shaking.store(false, Ordering::Release);
    }
}

pub struct ChangeAggregator {
    state: Arc<EngineState>,
    engine: Arc<ParticleEngine>,
    shake: Arc<ShakeController>,
    combo: ComboGate,
    caret: Arc<dyn CaretSource>,

    last_accepted: Mutex<Option<Instant>>,
    shaking: Arc<AtomicBool>,
}

impl ChangeAggregator {
    pub fn new(
        state: Arc<EngineState>,
        engine: Arc<ParticleEngine>,
        shake: Arc<ShakeController>,
        caret: Arc<dyn CaretSource>,
    ) -> Self {
        Self {
            state,
            engine,
            shake,
            combo: ComboGate::new(Instant::now()),
            caret,
            last_accepted: Mutex::new(None),
            shaking: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn on_changes(&self, changes: &[i32]) -> ChangeOutcome {
        self.on_changes_at(Instant::now(), changes)
    }

    /// Handle one batch of signed change magnitudes observed at `now`
    pub fn on_changes_at(&self, now: Instant, changes: &[i32]) -> ChangeOutcome {
        profile_scope!("on_changes");
        let options = self.state.config.options();

        {
            let mut last = self.last_accepted.lock();
            if let Some(previous) = *last {
                if now.saturating_duration_since(previous) < options.min_change_spacing() {
                    log::trace!("[ChangeAggregator] Dropping batch of {} changes", changes.len());
                    return ChangeOutcome::Debounced;
                }
            }
            if changes.is_empty() {
                return ChangeOutcome::Empty;
            }
            *last = Some(now);
        }

        let delta: i64 = changes.iter().map(|&c| i64::from(c)).sum();
        let rules = ComboRules {
            threshold: options.combo_threshold,
            timeout: options.combo_timeout(),
        };
        if !self.combo.evaluate(now, rules) {
            return ChangeOutcome::ComboInactive { delta };
        }

        let mut report = EffectReport {
            delta,
            ..Default::default()
        };

        if options.particles_enabled {
            let caret = self.caret.caret_position();
            report.particles_emitted += self.engine.emit(caret, options.particles_per_press);
            self.party(&options, delta, &mut report);
        }

        if options.shake_enabled && delta != 0 {
            report.shake_started = self.start_shake(delta);
        }

        log::trace!("[ChangeAggregator] {:?}", report);
        ChangeOutcome::Fired(report)
    }

    /// Extra bursts at random viewport points for large changes such as pastes
    fn party(&self, options: &PowerModeOptions, delta: i64, report: &mut EffectReport) {
        let threshold = u64::from(options.particle_party_change_threshold);
        let magnitude = delta.unsigned_abs();
        if !options.particle_party_enabled || threshold == 0 || magnitude < threshold {
            return;
        }

        let bursts = (magnitude / threshold).min(u64::from(options.max_party_bursts)) as u32;
        let size = self.shake.viewport_size();
        for _ in 0..bursts {
            let origin = DVec2::new(self.state.rng.up_to(size.x), self.state.rng.up_to(size.y));
            report.particles_emitted += self.engine.emit(origin, options.particles_per_press);
        }
        report.party_bursts = bursts;
        log::debug!("[ChangeAggregator] Particle party: {} bursts for delta {}", bursts, delta);
    }

    fn start_shake(&self, delta: i64) -> bool {
        let Some(guard) = ShakeGuard::acquire(&self.shaking) else {
            log::trace!("[ChangeAggregator] Shake already running, ignoring delta {}", delta);
            return false;
        };

        let shake = Arc::clone(&self.shake);
        self.state.spawn(async move {
            let _guard = guard;
            shake.shake(delta).await;
        });
        true
    }

    pub fn is_shaking(&self) -> bool {
        self.shaking.load(Ordering::Acquire)
    }

    pub fn combo_streak(&self) -> u32 {
        self.combo.streak()
    }

    pub fn engine(&self) -> &Arc<ParticleEngine> {
        &self.engine
    }
}
