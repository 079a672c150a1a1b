//! In-memory host collaborators
//!
//! Record every call so the demo binary can report what would have been
//! drawn and tests can assert on the exact visual and viewport traffic.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use dashmap::DashMap;
use glam::DVec2;
use parking_lot::Mutex;

use super::{CaretSource, ParticleVisual, ThemeSource, Viewport, VisualSurface, VisualToken};
use crate::color::Rgb;
use crate::error::{surface_unavailable, PowerModeResult};

/// One finished particle life as seen by the surface
#[derive(Debug, Clone)]
pub struct CompletedVisual {
    pub token: VisualToken,
    /// Opacity at attach followed by the opacity of every move
    pub opacities: Vec<f64>,
    pub final_position: DVec2,
    pub color: Rgb,
}

/// Visual surface backed by concurrent maps
#[derive(Debug, Default)]
pub struct MemorySurface {
    /// Currently attached visuals with their opacity history
    live: DashMap<VisualToken, (ParticleVisual, Vec<f64>)>,

    /// Lives that ended with a detach
    completed: Mutex<Vec<CompletedVisual>>,

    attaches: AtomicUsize,
    moves: AtomicUsize,
    detaches: AtomicUsize,

    /// Detaches or moves for tokens that were not attached
    spurious: AtomicUsize,

    /// Highest number of simultaneously attached visuals
    peak_live: AtomicUsize,

    torn_down: AtomicBool,
}

impl MemorySurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate the host destroying the layer; every later call fails
    pub fn tear_down(&self) {
        self.torn_down.store(true, Ordering::SeqCst);
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down.load(Ordering::SeqCst)
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    pub fn attach_count(&self) -> usize {
        self.attaches.load(Ordering::SeqCst)
    }

    pub fn move_count(&self) -> usize {
        self.moves.load(Ordering::SeqCst)
    }

    pub fn detach_count(&self) -> usize {
        self.detaches.load(Ordering::SeqCst)
    }

    pub fn spurious_count(&self) -> usize {
        self.spurious.load(Ordering::SeqCst)
    }

    pub fn peak_live(&self) -> usize {
        self.peak_live.load(Ordering::SeqCst)
    }

    pub fn completed(&self) -> Vec<CompletedVisual> {
        self.completed.lock().clone()
    }

    fn check_alive(&self, operation: &str) -> PowerModeResult<()> {
        if self.is_torn_down() {
            return Err(surface_unavailable(operation));
        }
        Ok(())
    }
}

impl VisualSurface for MemorySurface {
    fn attach_visual(&self, visual: &ParticleVisual) -> PowerModeResult<()> {
        self.check_alive("attach_visual")?;
        self.live.insert(visual.token, (*visual, vec![visual.opacity]));
        self.attaches.fetch_add(1, Ordering::SeqCst);
        self.peak_live.fetch_max(self.live.len(), Ordering::SeqCst);
        Ok(())
    }

    fn move_visual(&self, visual: &ParticleVisual) -> PowerModeResult<()> {
        self.check_alive("move_visual")?;
        match self.live.get_mut(&visual.token) {
            Some(mut entry) => {
                let (current, history) = entry.value_mut();
                *current = *visual;
                history.push(visual.opacity);
                self.moves.fetch_add(1, Ordering::SeqCst);
            }
            None => {
                self.spurious.fetch_add(1, Ordering::SeqCst);
            }
        }
        Ok(())
    }

    fn detach_visual(&self, token: VisualToken) -> PowerModeResult<()> {
        self.check_alive("detach_visual")?;
        match self.live.remove(&token) {
            Some((_, (visual, opacities))) => {
                self.detaches.fetch_add(1, Ordering::SeqCst);
                self.completed.lock().push(CompletedVisual {
                    token,
                    opacities,
                    final_position: visual.position,
                    color: visual.color,
                });
            }
            None => {
                self.spurious.fetch_add(1, Ordering::SeqCst);
            }
        }
        Ok(())
    }
}

/// Viewport that tracks its offsets and every individual movement
#[derive(Debug)]
pub struct MemoryViewport {
    left: Mutex<f64>,
    vertical: Mutex<f64>,
    size: DVec2,

    /// Horizontal deltas in call order
    horizontal_moves: Mutex<Vec<f64>>,
    /// Vertical scrolls in call order
    vertical_moves: Mutex<Vec<f64>>,

    torn_down: AtomicBool,
}

impl MemoryViewport {
    pub fn new(size: DVec2) -> Self {
        Self {
            left: Mutex::new(0.0),
            vertical: Mutex::new(0.0),
            size,
            horizontal_moves: Mutex::new(Vec::new()),
            vertical_moves: Mutex::new(Vec::new()),
            torn_down: AtomicBool::new(false),
        }
    }

    pub fn tear_down(&self) {
        self.torn_down.store(true, Ordering::SeqCst);
    }

    /// Net displacement from where the viewport started
    pub fn offset(&self) -> DVec2 {
        DVec2::new(*self.left.lock(), *self.vertical.lock())
    }

    pub fn horizontal_moves(&self) -> Vec<f64> {
        self.horizontal_moves.lock().clone()
    }

    pub fn vertical_moves(&self) -> Vec<f64> {
        self.vertical_moves.lock().clone()
    }

    fn check_alive(&self, operation: &str) -> PowerModeResult<()> {
        if self.torn_down.load(Ordering::SeqCst) {
            return Err(surface_unavailable(operation));
        }
        Ok(())
    }
}

impl Default for MemoryViewport {
    fn default() -> Self {
        Self::new(DVec2::new(1280.0, 720.0))
    }
}

impl Viewport for MemoryViewport {
    fn viewport_left(&self) -> PowerModeResult<f64> {
        self.check_alive("viewport_left")?;
        Ok(*self.left.lock())
    }

    fn set_viewport_left(&self, left: f64) -> PowerModeResult<()> {
        self.check_alive("set_viewport_left")?;
        let mut current = self.left.lock();
        self.horizontal_moves.lock().push(left - *current);
        *current = left;
        Ok(())
    }

    fn scroll_vertically_by_pixels(&self, pixels: f64) -> PowerModeResult<()> {
        self.check_alive("scroll_vertically_by_pixels")?;
        *self.vertical.lock() += pixels;
        self.vertical_moves.lock().push(pixels);
        Ok(())
    }

    fn viewport_size(&self) -> DVec2 {
        self.size
    }
}

/// Caret the host (or a test) moves explicitly
#[derive(Debug, Default)]
pub struct MemoryCaret {
    position: Mutex<DVec2>,
}

impl MemoryCaret {
    pub fn new(position: DVec2) -> Self {
        Self {
            position: Mutex::new(position),
        }
    }

    pub fn set(&self, position: DVec2) {
        *self.position.lock() = position;
    }
}

impl CaretSource for MemoryCaret {
    fn caret_position(&self) -> DVec2 {
        *self.position.lock()
    }
}

/// Theme with a constant foreground color
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedTheme(pub Option<Rgb>);

impl ThemeSource for FixedTheme {
    fn foreground_color(&self) -> Option<Rgb> {
        self.0
    }
}
