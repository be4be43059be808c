//! Radarscope - weather radar/satellite animation engine
//!
//! The animation core of a weather-map UI, decoupled from any renderer:
//! - Fetch RainViewer frame metadata and normalize it into ordered sequences
//! - Drive a timed, cancelable playback loop over those frames
//! - Derive `{z}/{x}/{y}` tile URL templates for a map-tile renderer
//! - Track per-layer visibility/opacity, including credential-gated overlays

pub mod animation;
pub mod catalog;
pub mod clock;
pub mod engine;
pub mod layers;
pub mod tiles;

pub use animation::AnimationController;
pub use catalog::{CatalogClient, Frame, FrameCatalog, FrameSequence};
pub use clock::PlaybackClock;
pub use engine::{MapEngine, RenderInstruction};
pub use layers::{LayerDescriptor, LayerKind, LayerRegistry};
pub use tiles::{RadarTileStyle, TileSize};

use std::time::Duration;

/// Default frame-metadata endpoint (RainViewer public weather-maps manifest).
pub const DEFAULT_ENDPOINT: &str = "https://api.rainviewer.com/public/weather-maps.json";

/// Configuration for the animation engine
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Frame-metadata endpoint URL
    pub endpoint: String,

    /// How often the frame catalog is re-fetched
    pub refresh_period: Duration,

    /// Playback speed, one frame per interval
    pub frame_interval: Duration,

    /// Styling applied to radar tile URLs
    pub radar_style: tiles::RadarTileStyle,

    /// Opaque credential for premium overlay layers, if any
    pub overlay_credential: Option<String>,
}

impl EngineConfig {
    pub fn new() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            refresh_period: Duration::from_secs(5 * 60),
            frame_interval: Duration::from_millis(500),
            radar_style: tiles::RadarTileStyle::default(),
            overlay_credential: None,
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_refresh_period(mut self, period: Duration) -> Self {
        self.refresh_period = period;
        self
    }

    pub fn with_frame_interval(mut self, interval: Duration) -> Self {
        self.frame_interval = interval;
        self
    }

    pub fn with_radar_style(mut self, style: tiles::RadarTileStyle) -> Self {
        self.radar_style = style;
        self
    }

    pub fn with_overlay_credential(mut self, credential: impl Into<String>) -> Self {
        self.overlay_credential = Some(credential.into());
        self
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors that can occur in the engine.
///
/// All variants are fetch-shaped: an empty frame sequence is a valid inert
/// state, not an error, and out-of-range user input is clamped rather than
/// rejected.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("catalog request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("catalog endpoint returned HTTP {status}")]
    Status { status: u16 },

    #[error("malformed catalog response: {0}")]
    Malformed(#[from] serde_json::Error),
}
