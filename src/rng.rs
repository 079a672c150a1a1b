use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::color::Rgb;

/// Random helpers used by emission and shake
pub trait RngExt: Rng {
    /// Uniformly `1` or `-1`
    fn sign_swap(&mut self) -> i32 {
        if self.gen_bool(0.5) {
            1
        } else {
            -1
        }
    }

    /// Uniformly random RGB triple
    fn color(&mut self) -> Rgb {
        let mut bytes = [0u8; 3];
        self.fill(&mut bytes);
        Rgb::from(bytes)
    }
}

impl<R: Rng + ?Sized> RngExt for R {}

/// Random source shared by every task spawned from one engine state.
///
/// Seeded construction gives reproducible emission and shake sequences.
pub struct SharedRng {
    inner: Mutex<StdRng>,
}

impl SharedRng {
    pub fn from_seed(seed: u64) -> Self {
        Self {
            inner: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    pub fn from_entropy() -> Self {
        Self {
            inner: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Run `f` with exclusive access to the generator
    pub fn with<T>(&self, f: impl FnOnce(&mut StdRng) -> T) -> T {
        f(&mut self.inner.lock())
    }

    pub fn sign_swap(&self) -> i32 {
        self.with(|rng| rng.sign_swap())
    }

    /// Uniform sample in `[0, max]`; zero or negative bounds yield zero
    pub fn up_to(&self, max: f64) -> f64 {
        if max <= 0.0 {
            return 0.0;
        }
        self.with(|rng| rng.gen_range(0.0..=max))
    }
}

impl std::fmt::Debug for SharedRng {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedRng").finish_non_exhaustive()
    }
}
