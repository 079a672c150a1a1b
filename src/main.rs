//! Power mode demo
//! Drives a simulated typing session against in-memory host collaborators
//! and reports what the editor would have drawn.
//!
//! Usage: power-mode [config.toml|config.json]

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use glam::DVec2;

use power_mode::host::{FixedTheme, MemoryCaret, MemorySurface, MemoryViewport};
use power_mode::{ChangeOutcome, ConfigStore, Host, PowerMode, Rgb, SharedRng};

const KEYSTROKE_INTERVAL: Duration = Duration::from_millis(80);
const LINE_HEIGHT: f64 = 18.0;
const CHAR_WIDTH: f64 = 8.0;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("info,power_mode=debug"),
    )
    .init();

    let config = match std::env::args().nth(1) {
        Some(path) => ConfigStore::from_file(&path)
            .with_context(|| format!("Failed to load config from {}", path))?,
        None => ConfigStore::default(),
    };
    let config = Arc::new(config);

    let surface = Arc::new(MemorySurface::new());
    let viewport = Arc::new(MemoryViewport::default());
    let caret = Arc::new(MemoryCaret::new(DVec2::new(0.0, LINE_HEIGHT)));
    let host = Host {
        surface: surface.clone(),
        viewport: viewport.clone(),
        caret: caret.clone(),
        theme: Arc::new(FixedTheme(Some(Rgb::new(220, 220, 220)))),
    };

    let power_mode = PowerMode::on_current_runtime(config.clone(), host, SharedRng::from_entropy())
        .context("Power mode needs a Tokio runtime")?;

    let mut fired = 0;
    let mut column = 0.0;

    log::info!("Typing a line...");
    for _ in 0..24 {
        column += 1.0;
        caret.set(DVec2::new(column * CHAR_WIDTH, LINE_HEIGHT));
        if let ChangeOutcome::Fired(_) = power_mode.on_changes(&[1]) {
            fired += 1;
        }
        tokio::time::sleep(KEYSTROKE_INTERVAL).await;
    }

    log::info!("Pasting a block...");
    match power_mode.on_changes(&[96, 64]) {
        ChangeOutcome::Fired(report) => {
            fired += 1;
            log::info!(
                "Paste of {} chars: {} particles, {} party bursts, shake {}",
                report.delta,
                report.particles_emitted,
                report.party_bursts,
                if report.shake_started { "started" } else { "skipped" }
            );
        }
        other => log::info!("Paste produced no effects: {:?}", other),
    }
    tokio::time::sleep(Duration::from_millis(300)).await;

    log::info!("Switching to random colors and deleting...");
    config.set_option("random_color", true)?;
    for _ in 0..12 {
        column -= 1.0;
        caret.set(DVec2::new(column.max(0.0) * CHAR_WIDTH, LINE_HEIGHT));
        if let ChangeOutcome::Fired(_) = power_mode.on_changes(&[-1]) {
            fired += 1;
        }
        tokio::time::sleep(KEYSTROKE_INTERVAL / 2).await;
    }

    // Let every in-flight particle and shake finish
    while power_mode.live_particles() > 0 || power_mode.aggregator().is_shaking() {
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    let pool = power_mode.engine().pool_stats();
    log::info!("Batches that fired effects: {}", fired);
    log::info!(
        "Particles: {} attached, {} detached, peak {} on screen",
        surface.attach_count(),
        surface.detach_count(),
        surface.peak_live()
    );
    log::info!(
        "Pool: {} slots, {} checkouts, {} on loan",
        pool.capacity,
        pool.checkouts,
        pool.checked_out
    );
    log::info!(
        "Viewport: {} shake steps, final offset {:?}",
        viewport.horizontal_moves().len() / 2,
        viewport.offset()
    );

    Ok(())
}
