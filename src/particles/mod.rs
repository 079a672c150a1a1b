pub mod engine;
pub mod particle;
pub mod pool;

pub use engine::ParticleEngine;
pub use particle::{Particle, ParticleStep};
pub use pool::{ParticlePool, PoolStats, PooledParticle};
