//! Headless driver: runs the engine for a fixed number of frames and logs
//! what it produced. Useful for profiling and for checking a config file.

use anyhow::{Context, Result};
use clap::Parser;
use glyphmorph::prelude::*;
use glyphmorph::morph::is_sentinel;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "glyphmorph", version, about = "Run the particle engine headless")]
struct Cli {
    /// Engine config (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Settings snapshot (TOML)
    #[arg(short, long)]
    settings: Option<PathBuf>,

    /// Frames to simulate
    #[arg(short, long, default_value_t = 300)]
    frames: u32,

    /// Simulated frame delta in seconds
    #[arg(long, default_value_t = 1.0 / 60.0)]
    dt: f32,

    /// Count down from this many seconds in the slot arena
    #[arg(long)]
    countdown: Option<f32>,

    /// Increase verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    if cli.verbose > 0 {
        log::set_max_level(match cli.verbose {
            1 => log::LevelFilter::Info,
            2 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        });
    }

    let config = match &cli.config {
        Some(path) => {
            EngineConfig::load(path).with_context(|| format!("loading {}", path.display()))?
        }
        None => EngineConfig::default(),
    };
    let mut settings = match &cli.settings {
        Some(path) => {
            Settings::load(path).with_context(|| format!("loading {}", path.display()))?
        }
        None => Settings::default(),
    };

    #[cfg(feature = "text")]
    let backend = CosmicTextBackend::new();
    #[cfg(not(feature = "text"))]
    let backend = UnavailableBackend;

    let mut engine = Engine::new(config, backend);
    let mut time = Time::new();
    time.set_fixed_delta(Some(cli.dt));

    for i in 0..cli.frames {
        let frame_time = time.advance(cli.dt);
        if let Some(start) = cli.countdown {
            let remaining = start - frame_time.elapsed;
            settings.text = glyphmorph::slots::countdown_seconds(remaining).to_string();
        }

        let frame = engine.tick(frame_time, &settings);
        if i % 60 == 0 {
            let visible = frame
                .text
                .positions()
                .iter()
                .filter(|p| !is_sentinel(**p))
                .count();
            log::info!(
                "t={:.2}s formation={} text_visible={} label={} total={}",
                frame.time.elapsed,
                frame.formation.len(),
                visible,
                frame.label.len(),
                frame.particle_count()
            );
        }
    }

    let stats = engine.cache_stats();
    log::info!(
        "done: {} ticks, spread={:.3}, cache hits={} misses={} evictions={}",
        engine.ticks(),
        engine.spread_progress(),
        stats.hits,
        stats.misses,
        stats.evictions
    );
    println!(
        "{} frames, {} glyphs cached ({} hits / {} misses)",
        engine.ticks(),
        engine.cached_glyphs(),
        stats.hits,
        stats.misses
    );
    Ok(())
}
