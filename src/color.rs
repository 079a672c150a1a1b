//! Particle color and the policy that picks it
//!
//! Resolution runs once per configuration version, never per particle.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::PowerModeOptions;
use crate::host::ThemeSource;
use crate::rng::RngExt;

/// 8-bit RGB color, serialized as `[r, g, b]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "[u8; 3]", into = "[u8; 3]")]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

impl From<[u8; 3]> for Rgb {
    fn from([r, g, b]: [u8; 3]) -> Self {
        Self { r, g, b }
    }
}

impl From<Rgb> for [u8; 3] {
    fn from(c: Rgb) -> Self {
        [c.r, c.g, c.b]
    }
}

/// Where a resolved color came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorSource {
    Environment,
    Random,
    Fixed,
}

/// Pick the particle color: environment theme, then random, then the fixed option.
///
/// A theme that cannot report a foreground color falls through to the next rule.
pub fn resolve_color<R: Rng + ?Sized>(
    options: &PowerModeOptions,
    theme: &dyn ThemeSource,
    rng: &mut R,
) -> (Rgb, ColorSource) {
    if options.use_environment_color {
        match theme.foreground_color() {
            Some(color) => return (color, ColorSource::Environment),
            None => log::debug!("[ColorPolicy] Theme has no foreground color, falling back"),
        }
    }

    if options.random_color {
        return (rng.color(), ColorSource::Random);
    }

    (options.color, ColorSource::Fixed)
}
