use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::ConfigValue;
use crate::color::Rgb;
use crate::constants::{combo, emission, particle, shake};
use crate::error::{invalid_option, PowerModeError, PowerModeResult};

/// Every tunable read by the particle engine, shake controller, combo gate
/// and change aggregator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PowerModeOptions {
    /// Alpha removed from each particle per frame
    pub alpha_remove_amount: f64,
    /// Starting opacity of a particle; affects lifetime
    pub start_alpha: f64,
    /// Strength of gravity on the vertical velocity
    pub gravity: f64,
    /// Delay between particle frames (milliseconds)
    pub frame_delay_ms: u64,
    /// Maximum number of live particles at one time
    pub max_particle_count: usize,
    /// Maximum sideward velocity of a particle
    pub max_side_velocity: f64,
    /// Maximum upward velocity of a particle
    pub max_up_velocity: f64,
    /// Fixed particle color
    pub color: Rgb,
    /// Take the color from the host theme; overrides the other color options
    pub use_environment_color: bool,
    /// Use a random color; overrides `color`
    pub random_color: bool,
    pub particles_enabled: bool,
    /// Number of particles emitted per key press
    pub particles_per_press: u32,
    pub shake_enabled: bool,
    /// Viewport displacement per axis on each shake step (pixels)
    pub shake_amplitude: i32,
    /// Time each shake displacement is held (milliseconds)
    pub shake_delay_ms: u64,
    /// Upper bound on shake steps per change
    pub max_shake_amount: u32,
    /// Key presses required to turn power mode on; 0 keeps it always on
    pub combo_threshold: u32,
    /// Gap that breaks a combo (milliseconds)
    pub combo_timeout_ms: u64,
    /// Minimum spacing between accepted change batches (milliseconds)
    pub min_ms_between_changes: u64,
    /// Scatter particles across the viewport on large changes
    pub particle_party_enabled: bool,
    /// Change magnitude that triggers a particle party
    pub particle_party_change_threshold: u32,
    /// Upper bound on party bursts per change
    pub max_party_bursts: u32,
}

impl Default for PowerModeOptions {
    fn default() -> Self {
        Self {
            alpha_remove_amount: particle::ALPHA_REMOVE_AMOUNT,
            start_alpha: particle::START_ALPHA,
            gravity: particle::GRAVITY,
            frame_delay_ms: particle::FRAME_DELAY_MS,
            max_particle_count: particle::MAX_PARTICLE_COUNT,
            max_side_velocity: particle::MAX_SIDE_VELOCITY,
            max_up_velocity: particle::MAX_UP_VELOCITY,
            color: Rgb::from(particle::COLOR),
            use_environment_color: false,
            random_color: false,
            particles_enabled: true,
            particles_per_press: emission::PARTICLES_PER_PRESS,
            shake_enabled: true,
            shake_amplitude: shake::AMPLITUDE,
            shake_delay_ms: shake::DELAY_MS,
            max_shake_amount: shake::MAX_SHAKE_AMOUNT,
            combo_threshold: combo::THRESHOLD,
            combo_timeout_ms: combo::TIMEOUT_MS,
            min_ms_between_changes: combo::MIN_MS_BETWEEN_CHANGES,
            particle_party_enabled: true,
            particle_party_change_threshold: emission::PARTY_CHANGE_THRESHOLD,
            max_party_bursts: emission::MAX_PARTY_BURSTS,
        }
    }
}

/// Names accepted by `PowerModeOptions::set` and `PowerModeOptions::get`
pub const OPTION_NAMES: &[&str] = &[
    "alpha_remove_amount",
    "start_alpha",
    "gravity",
    "frame_delay_ms",
    "max_particle_count",
    "max_side_velocity",
    "max_up_velocity",
    "color",
    "use_environment_color",
    "random_color",
    "particles_enabled",
    "particles_per_press",
    "shake_enabled",
    "shake_amplitude",
    "shake_delay_ms",
    "max_shake_amount",
    "combo_threshold",
    "combo_timeout_ms",
    "min_ms_between_changes",
    "particle_party_enabled",
    "particle_party_change_threshold",
    "max_party_bursts",
];

impl PowerModeOptions {
    pub fn frame_delay(&self) -> Duration {
        Duration::from_millis(self.frame_delay_ms)
    }

    pub fn shake_delay(&self) -> Duration {
        Duration::from_millis(self.shake_delay_ms)
    }

    pub fn combo_timeout(&self) -> Duration {
        Duration::from_millis(self.combo_timeout_ms)
    }

    pub fn min_change_spacing(&self) -> Duration {
        Duration::from_millis(self.min_ms_between_changes)
    }

    /// Reject combinations the simulation cannot run with
    pub fn validate(&self) -> PowerModeResult<()> {
        // Below the minimum the decrement vanishes against the alpha and particles never expire
        if !(self.alpha_remove_amount.is_finite()
            && self.alpha_remove_amount >= particle::MIN_ALPHA_REMOVE_AMOUNT)
        {
            return Err(invalid_option(
                "alpha_remove_amount",
                format!("must be a number of at least {}", particle::MIN_ALPHA_REMOVE_AMOUNT),
            ));
        }
        if !(self.start_alpha > 0.0 && self.start_alpha <= 1.0) {
            return Err(invalid_option("start_alpha", "must be in (0, 1]"));
        }
        if !self.gravity.is_finite() {
            return Err(invalid_option("gravity", "must be finite"));
        }
        for (name, value) in [
            ("max_side_velocity", self.max_side_velocity),
            ("max_up_velocity", self.max_up_velocity),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(invalid_option(name, "must be a non-negative number"));
            }
        }
        if self.frame_delay_ms == 0 {
            return Err(invalid_option("frame_delay_ms", "must be at least 1"));
        }
        if self.particles_per_press > emission::MAX_PARTICLES_PER_PRESS {
            return Err(invalid_option(
                "particles_per_press",
                format!("must be at most {}", emission::MAX_PARTICLES_PER_PRESS),
            ));
        }
        if self.max_party_bursts > emission::MAX_PARTY_BURSTS_LIMIT {
            return Err(invalid_option(
                "max_party_bursts",
                format!("must be at most {}", emission::MAX_PARTY_BURSTS_LIMIT),
            ));
        }
        Ok(())
    }

    /// Read a single option by name
    pub fn get(&self, name: &str) -> PowerModeResult<ConfigValue> {
        let value = match name {
            "alpha_remove_amount" => ConfigValue::Float(self.alpha_remove_amount),
            "start_alpha" => ConfigValue::Float(self.start_alpha),
            "gravity" => ConfigValue::Float(self.gravity),
            "frame_delay_ms" => ConfigValue::Integer(self.frame_delay_ms as i64),
            "max_particle_count" => {
                ConfigValue::Integer(i64::try_from(self.max_particle_count).unwrap_or(i64::MAX))
            }
            "max_side_velocity" => ConfigValue::Float(self.max_side_velocity),
            "max_up_velocity" => ConfigValue::Float(self.max_up_velocity),
            "color" => ConfigValue::Color(self.color),
            "use_environment_color" => ConfigValue::Bool(self.use_environment_color),
            "random_color" => ConfigValue::Bool(self.random_color),
            "particles_enabled" => ConfigValue::Bool(self.particles_enabled),
            "particles_per_press" => ConfigValue::Integer(self.particles_per_press as i64),
            "shake_enabled" => ConfigValue::Bool(self.shake_enabled),
            "shake_amplitude" => ConfigValue::Integer(self.shake_amplitude as i64),
            "shake_delay_ms" => ConfigValue::Integer(self.shake_delay_ms as i64),
            "max_shake_amount" => ConfigValue::Integer(self.max_shake_amount as i64),
            "combo_threshold" => ConfigValue::Integer(self.combo_threshold as i64),
            "combo_timeout_ms" => ConfigValue::Integer(self.combo_timeout_ms as i64),
            "min_ms_between_changes" => ConfigValue::Integer(self.min_ms_between_changes as i64),
            "particle_party_enabled" => ConfigValue::Bool(self.particle_party_enabled),
            "particle_party_change_threshold" => {
                ConfigValue::Integer(self.particle_party_change_threshold as i64)
            }
            "max_party_bursts" => ConfigValue::Integer(self.max_party_bursts as i64),
            _ => return Err(PowerModeError::UnknownOption(name.to_string())),
        };
        Ok(value)
    }

    /// Write a single option by name. Range checks are left to `validate`.
    pub fn set(&mut self, name: &str, value: ConfigValue) -> PowerModeResult<()> {
        match name {
            "alpha_remove_amount" => self.alpha_remove_amount = float(name, value)?,
            "start_alpha" => self.start_alpha = float(name, value)?,
            "gravity" => self.gravity = float(name, value)?,
            "frame_delay_ms" => self.frame_delay_ms = unsigned(name, value)?,
            "max_particle_count" => self.max_particle_count = narrow(name, unsigned(name, value)?)?,
            "max_side_velocity" => self.max_side_velocity = float(name, value)?,
            "max_up_velocity" => self.max_up_velocity = float(name, value)?,
            "color" => {
                self.color = value.as_color().ok_or_else(|| mismatch(name, "color"))?;
            }
            "use_environment_color" => self.use_environment_color = boolean(name, value)?,
            "random_color" => self.random_color = boolean(name, value)?,
            "particles_enabled" => self.particles_enabled = boolean(name, value)?,
            "particles_per_press" => {
                self.particles_per_press = narrow(name, unsigned(name, value)?)?;
            }
            "shake_enabled" => self.shake_enabled = boolean(name, value)?,
            "shake_amplitude" => {
                let raw = value.as_i64().ok_or_else(|| mismatch(name, "integer"))?;
                self.shake_amplitude = narrow(name, raw)?;
            }
            "shake_delay_ms" => self.shake_delay_ms = unsigned(name, value)?,
            "max_shake_amount" => self.max_shake_amount = narrow(name, unsigned(name, value)?)?,
            "combo_threshold" => self.combo_threshold = narrow(name, unsigned(name, value)?)?,
            "combo_timeout_ms" => self.combo_timeout_ms = unsigned(name, value)?,
            "min_ms_between_changes" => self.min_ms_between_changes = unsigned(name, value)?,
            "particle_party_enabled" => self.particle_party_enabled = boolean(name, value)?,
            "particle_party_change_threshold" => {
                self.particle_party_change_threshold = narrow(name, unsigned(name, value)?)?;
            }
            "max_party_bursts" => self.max_party_bursts = narrow(name, unsigned(name, value)?)?,
            _ => return Err(PowerModeError::UnknownOption(name.to_string())),
        }
        Ok(())
    }
}

fn mismatch(name: &str, expected: &'static str) -> PowerModeError {
    PowerModeError::TypeMismatch {
        name: name.to_string(),
        expected,
    }
}

fn boolean(name: &str, value: ConfigValue) -> PowerModeResult<bool> {
    value.as_bool().ok_or_else(|| mismatch(name, "boolean"))
}

fn float(name: &str, value: ConfigValue) -> PowerModeResult<f64> {
    value.as_f64().ok_or_else(|| mismatch(name, "number"))
}

fn unsigned(name: &str, value: ConfigValue) -> PowerModeResult<u64> {
    value.as_i64().ok_or_else(|| mismatch(name, "integer"))?;
    value.as_u64().ok_or_else(|| invalid_option(name, "must not be negative"))
}

fn narrow<S, T: TryFrom<S>>(name: &str, value: S) -> PowerModeResult<T> {
    T::try_from(value).map_err(|_| invalid_option(name, "out of range"))
}
