//! Power Mode Constants
//!
//! Default values and accepted limits for every tunable.
//! `PowerModeOptions::default()` and `validate` read from here; nothing else
//! hardcodes them.

/// Particle simulation defaults
pub mod particle {
    /// Alpha removed from a particle on every frame
    pub const ALPHA_REMOVE_AMOUNT: f64 = 0.045;
    /// Smallest accepted decrement; caps a particle at a thousand frames
    pub const MIN_ALPHA_REMOVE_AMOUNT: f64 = 0.001;
    /// Opacity a particle starts with; together with the decrement this fixes its lifetime
    pub const START_ALPHA: f64 = 0.9;
    /// Subtracted from the upward velocity every frame
    pub const GRAVITY: f64 = 0.3;
    /// Delay between frames (milliseconds), roughly 60 FPS
    pub const FRAME_DELAY_MS: u64 = 17;
    /// Soft cap on concurrently live particles
    pub const MAX_PARTICLE_COUNT: usize = i32::MAX as usize;
    pub const MAX_SIDE_VELOCITY: f64 = 2.0;
    pub const MAX_UP_VELOCITY: f64 = 10.0;
    /// Fixed particle color (RGB)
    pub const COLOR: [u8; 3] = [0, 0, 0];
    /// Rendered particle diameter in pixels
    pub const DIAMETER: f64 = 10.0;
}

/// Emission defaults
pub mod emission {
    pub const PARTICLES_PER_PRESS: u32 = 10;
    /// Pool is pre-warmed with this many particles per configured press
    pub const POOL_PREWARM_FACTOR: usize = 2;
    pub const PARTY_CHANGE_THRESHOLD: u32 = 20;
    pub const MAX_PARTY_BURSTS: u32 = 8;
    /// Largest accepted `particles_per_press`; also bounds the pool pre-warm
    pub const MAX_PARTICLES_PER_PRESS: u32 = 1_000;
    /// Largest accepted `max_party_bursts`
    pub const MAX_PARTY_BURSTS_LIMIT: u32 = 64;
}

/// Viewport shake defaults
pub mod shake {
    /// Pixels the viewport is displaced per axis on each step
    pub const AMPLITUDE: i32 = 2;
    /// Time a displacement is held before it is restored (milliseconds)
    pub const DELAY_MS: u64 = 50;
    /// Upper bound on displacement steps per change
    pub const MAX_SHAKE_AMOUNT: u32 = 5;
}

/// Combo and change aggregation defaults
pub mod combo {
    /// 0 keeps power mode always on
    pub const THRESHOLD: u32 = 0;
    /// Gap that breaks a combo streak (milliseconds)
    pub const TIMEOUT_MS: u64 = 10_000;
    /// Change batches closer together than this are dropped (milliseconds)
    pub const MIN_MS_BETWEEN_CHANGES: u64 = 10;
}
