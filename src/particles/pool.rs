//! Particle Pool
//!
//! Arena of reusable particle slots indexed by a free list. A checked-out
//! particle is moved out of its slot, so the animating task owns it
//! exclusively until it is checked back in; nothing can tick a particle that
//! already sits in the pool.

use std::ops::{Deref, DerefMut};

use parking_lot::Mutex;

use super::Particle;
use crate::host::VisualToken;

/// Particle on loan from the pool
#[derive(Debug)]
pub struct PooledParticle {
    slot: usize,
    particle: Particle,
}

impl PooledParticle {
    pub fn slot(&self) -> usize {
        self.slot
    }
}

impl Deref for PooledParticle {
    type Target = Particle;

    fn deref(&self) -> &Particle {
        &self.particle
    }
}

impl DerefMut for PooledParticle {
    fn deref_mut(&mut self) -> &mut Particle {
        &mut self.particle
    }
}

/// Pool occupancy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PoolStats {
    /// Slots ever allocated
    pub capacity: usize,
    /// Slots currently available for checkout
    pub free: usize,
    /// Particles currently on loan
    pub checked_out: usize,
    /// Total checkouts served
    pub checkouts: u64,
}

struct PoolInner {
    /// `None` while the slot's particle is checked out
    slots: Vec<Option<Particle>>,
    free_list: Vec<usize>,
    checkouts: u64,
}

pub struct ParticlePool {
    inner: Mutex<PoolInner>,
}

impl ParticlePool {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(PoolInner {
                slots: Vec::new(),
                free_list: Vec::new(),
                checkouts: 0,
            }),
        }
    }

    /// Pool with `count` idle particles ready for checkout
    pub fn with_capacity(count: usize) -> Self {
        let pool = Self::new();
        pool.prewarm(count);
        pool
    }

    /// Grow the pool until it holds at least `count` slots
    pub fn prewarm(&self, count: usize) {
        let mut inner = self.inner.lock();
        while inner.slots.len() < count {
            let slot = inner.slots.len();
            inner.slots.push(Some(Particle::new(VisualToken(slot as u64))));
            inner.free_list.push(slot);
        }
    }

    /// Take an idle particle, growing the arena when none is free
    pub fn checkout(&self) -> PooledParticle {
        let mut inner = self.inner.lock();
        inner.checkouts += 1;

        while let Some(slot) = inner.free_list.pop() {
            if let Some(particle) = inner.slots[slot].take() {
                return PooledParticle { slot, particle };
            }
            log::warn!("[ParticlePool] Free list pointed at occupied slot {}", slot);
        }

        let slot = inner.slots.len();
        inner.slots.push(None);
        log::trace!("[ParticlePool] Grew to {} slots", inner.slots.len());
        PooledParticle {
            slot,
            particle: Particle::new(VisualToken(slot as u64)),
        }
    }

    /// Return a particle to its slot
    pub fn checkin(&self, pooled: PooledParticle) {
        let PooledParticle { slot, particle } = pooled;
        let mut guard = self.inner.lock();
        let inner = &mut *guard;
        match inner.slots.get_mut(slot) {
            Some(entry) if entry.is_none() => {
                *entry = Some(particle);
                inner.free_list.push(slot);
            }
            _ => log::warn!(
                "[ParticlePool] Ignoring checkin for slot {} that is not on loan",
                slot
            ),
        }
    }

    pub fn stats(&self) -> PoolStats {
        let inner = self.inner.lock();
        PoolStats {
            capacity: inner.slots.len(),
            free: inner.free_list.len(),
            checked_out: inner.slots.len() - inner.free_list.len(),
            checkouts: inner.checkouts,
        }
    }
}

impl Default for ParticlePool {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ParticlePool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParticlePool").field("stats", &self.stats()).finish()
    }
}
