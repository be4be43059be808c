//! Radarscope CLI
//!
//! Diagnostic front-end for the animation engine: fetch the current frame
//! catalog and print both timelines, or watch playback live with periodic
//! catalog refresh.

use clap::Parser;
use radarscope::catalog::{format_frame_time, is_nowcast};
use radarscope::engine::Timeline;
use radarscope::tiles::{color_scheme_name, COLOR_SCHEMES};
use radarscope::{EngineConfig, MapEngine, RadarTileStyle, TileSize};
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Radarscope - inspect and animate weather radar frame catalogs
#[derive(Parser, Debug)]
#[command(name = "radarscope")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Frame-metadata endpoint URL
    #[arg(long, default_value = radarscope::DEFAULT_ENDPOINT)]
    endpoint: String,

    /// Keep running: animate the radar timeline and auto-refresh the catalog
    #[arg(short, long)]
    watch: bool,

    /// Playback speed in milliseconds per frame
    #[arg(long, default_value_t = 500)]
    interval_ms: u64,

    /// Catalog refresh period in seconds (watch mode)
    #[arg(long, default_value_t = 300)]
    refresh_secs: u64,

    /// Radar color scheme id (0-8)
    #[arg(long, default_value_t = 6)]
    color_scheme: u8,

    /// Use 512px tiles instead of 256px
    #[arg(long)]
    large_tiles: bool,

    /// OpenWeatherMap API key for premium overlay layers
    #[arg(long)]
    overlay_key: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let Some(scheme_name) = color_scheme_name(cli.color_scheme) else {
        let known: Vec<String> = COLOR_SCHEMES
            .iter()
            .map(|&(id, name)| format!("{id}={name}"))
            .collect();
        anyhow::bail!(
            "unknown color scheme {} (known: {})",
            cli.color_scheme,
            known.join(", ")
        );
    };
    info!(scheme = scheme_name, "radar color scheme");

    let style = RadarTileStyle {
        size: if cli.large_tiles {
            TileSize::Px512
        } else {
            TileSize::Px256
        },
        color_scheme: cli.color_scheme,
        ..RadarTileStyle::default()
    };

    let mut config = EngineConfig::new()
        .with_endpoint(cli.endpoint)
        .with_frame_interval(Duration::from_millis(cli.interval_ms))
        .with_refresh_period(Duration::from_secs(cli.refresh_secs))
        .with_radar_style(style);
    if let Some(key) = cli.overlay_key {
        config = config.with_overlay_credential(key);
    }

    let engine = MapEngine::new(config);

    if cli.watch {
        watch(&engine, Duration::from_millis(cli.interval_ms)).await
    } else {
        print_timelines(&engine).await
    }
}

/// Fetch once and dump both timelines with the derived tile templates.
async fn print_timelines(engine: &MapEngine) -> anyhow::Result<()> {
    engine.refresh().await?;
    let now = chrono::Utc::now().timestamp();

    let radar = engine.frames(Timeline::Radar).await;
    let current = engine.current_index(Timeline::Radar).await;
    println!("radar ({} frames):", radar.len());
    for (i, frame) in radar.iter().enumerate() {
        let marker = if i == current { ">" } else { " " };
        let kind = if is_nowcast(frame, now) { "nowcast" } else { "past" };
        println!(
            " {marker} [{i:2}] {} {:7} {}",
            format_frame_time(frame.time),
            kind,
            frame.path
        );
    }

    let satellite = engine.frames(Timeline::Satellite).await;
    println!("satellite ({} frames):", satellite.len());
    for (i, frame) in satellite.iter().enumerate() {
        println!("   [{i:2}] {} {}", format_frame_time(frame.time), frame.path);
    }

    println!("render plan:");
    for instruction in engine.render_plan().await {
        println!(
            "   {:?} opacity={:.2} {}",
            instruction.kind, instruction.opacity, instruction.url_template
        );
    }
    Ok(())
}

/// Animate the radar timeline until Ctrl-C, refreshing the catalog in the
/// background on the configured period.
async fn watch(engine: &MapEngine, interval: Duration) -> anyhow::Result<()> {
    engine.start_auto_refresh();

    // Wait for the initial catalog before starting playback.
    let mut ready = tokio::time::interval(Duration::from_millis(100));
    while !engine.has_catalog().await {
        if let Some(error) = engine.last_error().await {
            anyhow::bail!("initial catalog fetch failed: {error}");
        }
        ready.tick().await;
    }

    engine.play(Timeline::Radar).await;
    info!("watching radar playback, Ctrl-C to stop");

    let mut ticker = tokio::time::interval(interval);
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            _ = ticker.tick() => {
                if let Some(frame) = engine.current_frame(Timeline::Radar).await {
                    let index = engine.current_index(Timeline::Radar).await;
                    let count = engine.frame_count(Timeline::Radar).await;
                    println!(
                        "[{index:2}/{count}] {} {}",
                        format_frame_time(frame.time),
                        frame.path
                    );
                }
                if let Some(error) = engine.last_error().await {
                    info!("last refresh failed: {}", error);
                }
            }
        }
    }

    engine.shutdown().await;
    Ok(())
}
