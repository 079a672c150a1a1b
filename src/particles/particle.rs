use glam::DVec2;

use crate::color::Rgb;
use crate::config::PowerModeOptions;
use crate::constants::particle::DIAMETER;
use crate::host::{ParticleVisual, VisualToken};

/// Single explosion particle
#[derive(Debug, Clone)]
pub struct Particle {
    /// Handle of the visual this particle drives; stable across reuse
    token: VisualToken,
    /// Position relative to the viewport (pixels)
    pub position: DVec2,
    /// `x` drifts sideways, `y` is the upward speed; both are subtracted from position
    pub velocity: DVec2,
    pub alpha: f64,
    /// Fixed alpha decrement per frame, also the removal threshold
    pub alpha_remove_amount: f64,
    pub gravity: f64,
    pub color: Rgb,
    /// Frames simulated since launch
    pub frames: u32,
}

/// Result of advancing a particle by one frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParticleStep {
    Alive,
    /// Alpha dropped below the decrement; the visual must be detached
    Expired,
}

impl Particle {
    /// Create an idle particle owning `token`
    pub fn new(token: VisualToken) -> Self {
        Self {
            token,
            position: DVec2::ZERO,
            velocity: DVec2::ZERO,
            alpha: 0.0,
            alpha_remove_amount: 0.0,
            gravity: 0.0,
            color: Rgb::BLACK,
            frames: 0,
        }
    }

    pub fn token(&self) -> VisualToken {
        self.token
    }

    /// Reset every simulated field for a new life starting at `origin`
    pub fn launch(
        &mut self,
        origin: DVec2,
        velocity: DVec2,
        options: &PowerModeOptions,
        color: Rgb,
    ) {
        self.position = origin;
        self.velocity = velocity;
        self.alpha = options.start_alpha;
        self.alpha_remove_amount = options.alpha_remove_amount;
        self.gravity = options.gravity;
        self.color = color;
        self.frames = 0;
    }

    /// Advance one frame: drift away from the origin, decelerate the upward
    /// motion by gravity and fade by the fixed decrement.
    pub fn step(&mut self) -> ParticleStep {
        self.position -= self.velocity;
        self.velocity.y -= self.gravity;
        self.alpha -= self.alpha_remove_amount;
        self.frames += 1;

        if self.alpha < self.alpha_remove_amount {
            ParticleStep::Expired
        } else {
            ParticleStep::Alive
        }
    }

    pub fn visual(&self) -> ParticleVisual {
        ParticleVisual {
            token: self.token,
            position: self.position,
            opacity: self.alpha.clamp(0.0, 1.0),
            color: self.color,
            diameter: DIAMETER,
        }
    }
}
