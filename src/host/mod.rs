//! Host Collaborators
//!
//! The editor integration supplies a surface for transient visuals, a
//! scrollable viewport, the caret position and the theme. Any of these may
//! be torn down while effects are in flight; implementations report that as
//! an error and the effect code degrades to skipping the visual.

pub mod memory;

use glam::DVec2;

use crate::color::Rgb;
use crate::error::PowerModeResult;

pub use memory::{CompletedVisual, FixedTheme, MemoryCaret, MemorySurface, MemoryViewport};

/// Opaque handle to a rendered particle, stable across pool reuse
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VisualToken(pub u64);

/// Everything a host needs to draw one particle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParticleVisual {
    pub token: VisualToken,
    /// Top-left relative to the viewport (pixels)
    pub position: DVec2,
    /// Current alpha in [0, 1]
    pub opacity: f64,
    pub color: Rgb,
    pub diameter: f64,
}

/// Layer on which transient visuals are placed and removed
pub trait VisualSurface: Send + Sync {
    fn attach_visual(&self, visual: &ParticleVisual) -> PowerModeResult<()>;

    /// Per-frame position and opacity update of an attached visual
    fn move_visual(&self, visual: &ParticleVisual) -> PowerModeResult<()>;

    fn detach_visual(&self, token: VisualToken) -> PowerModeResult<()>;
}

/// Scrollable editor viewport
pub trait Viewport: Send + Sync {
    fn viewport_left(&self) -> PowerModeResult<f64>;

    fn set_viewport_left(&self, left: f64) -> PowerModeResult<()>;

    fn scroll_vertically_by_pixels(&self, pixels: f64) -> PowerModeResult<()>;

    /// Visible width and height (pixels)
    fn viewport_size(&self) -> DVec2;
}

/// Caret coordinates on demand, as (left, top) relative to the viewport
pub trait CaretSource: Send + Sync {
    fn caret_position(&self) -> DVec2;
}

/// Host theme; `None` when the theme cannot report a foreground color
pub trait ThemeSource: Send + Sync {
    fn foreground_color(&self) -> Option<Rgb>;
}
