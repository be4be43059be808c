//! Frame catalog: fetch and normalize the provider's weather-imagery manifest.
//!
//! The provider publishes a single JSON manifest listing radar frames (split
//! into observed "past" and forecast "nowcast" lists) and optional infrared
//! satellite frames. This module flattens that into two ordered
//! [`FrameSequence`]s plus the tile host, and records the fetch-time default
//! frame index for each (the most recent real observation for radar).

use crate::{EngineError, Result};
use chrono::{Local, TimeZone};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// A single imagery frame: capture time plus the provider-relative tile path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Frame {
    /// Capture timestamp, epoch seconds
    pub time: i64,
    /// Provider-relative path segment, e.g. "/v2/radar/1699999800"
    pub path: String,
}

/// Ordered, immutable list of frames, cheap to share between the catalog
/// and any number of animation controllers.
pub type FrameSequence = Arc<[Frame]>;

/// Raw manifest shape as served by the provider.
#[derive(Debug, Clone, Deserialize)]
pub struct WeatherMapsManifest {
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub generated: Option<i64>,
    pub host: String,
    pub radar: RadarLists,
    #[serde(default)]
    pub satellite: Option<SatelliteLists>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RadarLists {
    #[serde(default)]
    pub past: Vec<Frame>,
    #[serde(default)]
    pub nowcast: Vec<Frame>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SatelliteLists {
    #[serde(default)]
    pub infrared: Vec<Frame>,
}

/// Normalized snapshot of one manifest fetch.
///
/// Sole owner of the frame data; consumers hold `FrameSequence` clones and
/// never mutate frames. Replaced wholesale on every successful refresh.
#[derive(Debug, Clone)]
pub struct FrameCatalog {
    /// Tile host, prepended verbatim to frame paths
    pub host: String,
    /// Observed radar frames followed by nowcast frames, in manifest order
    pub radar: FrameSequence,
    /// Infrared satellite frames, or empty when the provider omits them
    pub satellite: FrameSequence,
    /// Index of the most recent observed radar frame (0 when past is empty)
    pub radar_default_index: usize,
    /// Index of the newest satellite frame (0 when empty)
    pub satellite_default_index: usize,
    /// Manifest generation timestamp, when the provider supplies one
    pub generated: Option<i64>,
}

impl FrameCatalog {
    /// Normalize a raw manifest per the derivation rules: radar is the
    /// concatenation past ++ nowcast, satellite is the infrared list as-is.
    pub fn from_manifest(manifest: WeatherMapsManifest) -> Self {
        let past_len = manifest.radar.past.len();

        let mut radar = manifest.radar.past;
        radar.extend(manifest.radar.nowcast);

        let satellite = manifest
            .satellite
            .map(|s| s.infrared)
            .unwrap_or_default();

        // Default to the newest observed frame, not a forecast one.
        let radar_default_index = past_len.saturating_sub(1);
        let satellite_default_index = satellite.len().saturating_sub(1);

        debug!(
            radar_frames = radar.len(),
            satellite_frames = satellite.len(),
            radar_default_index,
            "normalized frame catalog"
        );

        Self {
            host: manifest.host,
            radar: radar.into(),
            satellite: satellite.into(),
            radar_default_index,
            satellite_default_index,
            generated: manifest.generated,
        }
    }
}

/// Whether a frame is still a forecast ("nowcast") relative to `now`.
///
/// The past/nowcast split is evaluated only at fetch time; frames drifting
/// across "now" during playback are not re-classified.
pub fn is_nowcast(frame: &Frame, now_epoch: i64) -> bool {
    frame.time > now_epoch
}

/// Format a frame timestamp as a local wall-clock time for timeline display.
pub fn format_frame_time(epoch_seconds: i64) -> String {
    match Local.timestamp_opt(epoch_seconds, 0) {
        chrono::LocalResult::Single(dt) => dt.format("%H:%M").to_string(),
        _ => "--:--".to_string(),
    }
}

/// HTTP client for the frame-metadata endpoint.
#[derive(Debug, Clone)]
pub struct CatalogClient {
    client: reqwest::Client,
    endpoint: String,
}

/// Request timeout for the manifest fetch; the payload is a few KB.
const FETCH_TIMEOUT: Duration = Duration::from_secs(15);

impl CatalogClient {
    pub fn new(endpoint: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Fetch and normalize the current manifest.
    ///
    /// Fails on transport errors, non-2xx status, or a body that does not
    /// parse as the manifest shape; the caller keeps its previous catalog
    /// in every failure case.
    pub async fn fetch(&self) -> Result<FrameCatalog> {
        let response = self
            .client
            .get(&self.endpoint)
            .header("Accept", "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            warn!(%status, endpoint = %self.endpoint, "catalog fetch rejected");
            return Err(EngineError::Status {
                status: status.as_u16(),
            });
        }

        let body = response.text().await?;
        let manifest: WeatherMapsManifest = serde_json::from_str(&body)?;
        Ok(FrameCatalog::from_manifest(manifest))
    }
}
