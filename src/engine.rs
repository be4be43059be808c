//! Engine composition: catalog + controllers + layers + refresh scheduling.
//!
//! [`MapEngine`] is the surface the UI talks to. It owns the shared state
//! (current catalog, one animation controller each for radar and satellite,
//! and the layer registry) behind a single `RwLock`, so a catalog refresh is
//! applied atomically: readers never observe radar and satellite sequences
//! from different fetches.

use crate::animation::AnimationController;
use crate::catalog::{CatalogClient, Frame, FrameCatalog, FrameSequence};
use crate::layers::{LayerDescriptor, LayerKind, LayerRegistry};
use crate::tiles;
use crate::{EngineConfig, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Which animation timeline an operation addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timeline {
    Radar,
    Satellite,
}

/// One draw instruction for the external map renderer: a tile URL template
/// with `{z}/{x}/{y}` placeholders plus the opacity to composite it at.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderInstruction {
    pub kind: LayerKind,
    pub url_template: String,
    pub opacity: f32,
}

struct EngineState {
    catalog: Option<FrameCatalog>,
    radar: AnimationController,
    satellite: AnimationController,
    layers: LayerRegistry,
    /// Most recent fetch failure, cleared on the next successful refresh
    last_error: Option<String>,
}

impl EngineState {
    /// Atomic catalog swap: rebind both controllers and replace the catalog
    /// under the caller's write lock.
    fn apply_catalog(&mut self, catalog: FrameCatalog) {
        self.radar
            .rebind(catalog.radar.clone(), catalog.radar_default_index);
        self.satellite
            .rebind(catalog.satellite.clone(), catalog.satellite_default_index);
        self.catalog = Some(catalog);
        self.last_error = None;
    }

    fn controller(&self, timeline: Timeline) -> &AnimationController {
        match timeline {
            Timeline::Radar => &self.radar,
            Timeline::Satellite => &self.satellite,
        }
    }

    fn controller_mut(&mut self, timeline: Timeline) -> &mut AnimationController {
        match timeline {
            Timeline::Radar => &mut self.radar,
            Timeline::Satellite => &mut self.satellite,
        }
    }
}

/// Periodic catalog re-fetch task.
///
/// A single task serializes fetches, so two refreshes can never race each
/// other to completion; a manual [`MapEngine::refresh`] interleaving with it
/// resolves last-write-wins under the engine's write lock.
struct RefreshScheduler {
    task: JoinHandle<()>,
}

impl RefreshScheduler {
    fn spawn(
        client: CatalogClient,
        state: Arc<RwLock<EngineState>>,
        period: Duration,
    ) -> Self {
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                // First tick completes immediately, giving the initial fetch.
                ticker.tick().await;
                match client.fetch().await {
                    Ok(catalog) => {
                        let mut state = state.write().await;
                        state.apply_catalog(catalog);
                        info!("frame catalog refreshed");
                    }
                    Err(e) => {
                        // Keep the previous catalog and retry next period.
                        warn!("catalog refresh failed: {}", e);
                        let mut state = state.write().await;
                        state.last_error = Some(e.to_string());
                    }
                }
            }
        });
        Self { task }
    }

    fn abort(&self) {
        self.task.abort();
    }
}

impl Drop for RefreshScheduler {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Top-level animation engine.
pub struct MapEngine {
    config: EngineConfig,
    client: CatalogClient,
    state: Arc<RwLock<EngineState>>,
    scheduler: std::sync::Mutex<Option<RefreshScheduler>>,
}

impl MapEngine {
    /// Create an engine with no catalog yet; both timelines start inert.
    pub fn new(config: EngineConfig) -> Self {
        let client = CatalogClient::new(config.endpoint.clone());
        let state = EngineState {
            catalog: None,
            radar: AnimationController::empty(config.frame_interval),
            satellite: AnimationController::empty(config.frame_interval),
            layers: LayerRegistry::new(config.overlay_credential.clone()),
            last_error: None,
        };
        Self {
            config,
            client,
            state: Arc::new(RwLock::new(state)),
            scheduler: std::sync::Mutex::new(None),
        }
    }

    /// Fetch the catalog once and apply it.
    ///
    /// On failure the previous catalog and all playback state are left
    /// untouched; the error is recorded for [`MapEngine::last_error`] and
    /// also returned.
    pub async fn refresh(&self) -> Result<()> {
        match self.client.fetch().await {
            Ok(catalog) => {
                let mut state = self.state.write().await;
                state.apply_catalog(catalog);
                Ok(())
            }
            Err(e) => {
                let mut state = self.state.write().await;
                state.last_error = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// Apply an already-built catalog, bypassing the network. The swap is
    /// atomic from any reader's point of view.
    pub async fn install_catalog(&self, catalog: FrameCatalog) {
        let mut state = self.state.write().await;
        state.apply_catalog(catalog);
    }

    /// Start the periodic refresh loop (immediate fetch, then one per
    /// configured period). No-op if already running.
    pub fn start_auto_refresh(&self) {
        let mut guard = self
            .scheduler
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if guard.is_some() {
            return;
        }
        *guard = Some(RefreshScheduler::spawn(
            self.client.clone(),
            self.state.clone(),
            self.config.refresh_period,
        ));
        info!(
            period_secs = self.config.refresh_period.as_secs(),
            "auto-refresh started"
        );
    }

    /// Tear down the subsystem: cancel the refresh loop and stop both
    /// playback clocks. No timer fires after this returns.
    pub async fn shutdown(&self) {
        let scheduler = {
            let mut guard = self
                .scheduler
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            guard.take()
        };
        if let Some(scheduler) = scheduler {
            scheduler.abort();
        }
        let mut state = self.state.write().await;
        state.radar.pause();
        state.satellite.pause();
    }

    // ---- animation surface -------------------------------------------------

    pub async fn play(&self, timeline: Timeline) {
        self.state.write().await.controller_mut(timeline).play();
    }

    pub async fn pause(&self, timeline: Timeline) {
        self.state.write().await.controller_mut(timeline).pause();
    }

    pub async fn toggle_play(&self, timeline: Timeline) {
        self.state.write().await.controller_mut(timeline).toggle_play();
    }

    pub async fn seek(&self, timeline: Timeline, index: usize) {
        self.state.write().await.controller_mut(timeline).seek(index);
    }

    pub async fn step(&self, timeline: Timeline, delta: isize) {
        self.state.write().await.controller_mut(timeline).step(delta);
    }

    pub async fn set_speed(&self, timeline: Timeline, interval: Duration) {
        self.state
            .write()
            .await
            .controller_mut(timeline)
            .set_speed(interval);
    }

    pub async fn is_playing(&self, timeline: Timeline) -> bool {
        self.state.read().await.controller(timeline).is_playing()
    }

    pub async fn current_index(&self, timeline: Timeline) -> usize {
        self.state.read().await.controller(timeline).current_index()
    }

    pub async fn frame_count(&self, timeline: Timeline) -> usize {
        self.state.read().await.controller(timeline).frame_count()
    }

    pub async fn current_frame(&self, timeline: Timeline) -> Option<Frame> {
        self.state.read().await.controller(timeline).current_frame()
    }

    /// Full frame list for a timeline, for slider/scrubber UIs.
    pub async fn frames(&self, timeline: Timeline) -> FrameSequence {
        let state = self.state.read().await;
        match &state.catalog {
            Some(catalog) => match timeline {
                Timeline::Radar => catalog.radar.clone(),
                Timeline::Satellite => catalog.satellite.clone(),
            },
            None => Vec::new().into(),
        }
    }

    // ---- layer surface -----------------------------------------------------

    pub async fn toggle_layer(&self, kind: LayerKind) {
        self.state.write().await.layers.toggle(kind);
    }

    pub async fn set_layer_opacity(&self, kind: LayerKind, opacity: f32) {
        self.state.write().await.layers.set_opacity(kind, opacity);
    }

    pub async fn list_layers(&self) -> Vec<LayerDescriptor> {
        self.state.read().await.layers.list().to_vec()
    }

    pub async fn set_overlay_credential(&self, credential: Option<String>) {
        self.state.write().await.layers.set_credential(credential);
    }

    // ---- status ------------------------------------------------------------

    /// Most recent fetch failure, if the last refresh attempt failed.
    pub async fn last_error(&self) -> Option<String> {
        self.state.read().await.last_error.clone()
    }

    pub async fn has_catalog(&self) -> bool {
        self.state.read().await.catalog.is_some()
    }

    /// Derive the current draw list: every effectively visible layer paired
    /// with its tile URL template and opacity, in display order. Imagery
    /// layers are skipped while their frame sequence is empty.
    pub async fn render_plan(&self) -> Vec<RenderInstruction> {
        let state = self.state.read().await;
        let Some(catalog) = &state.catalog else {
            return Vec::new();
        };

        let mut plan = Vec::new();
        for layer in state.layers.list() {
            if !state.layers.effective_visible(layer.kind) {
                continue;
            }
            let url_template = match layer.kind {
                LayerKind::Radar => match state.radar.current_frame() {
                    Some(frame) => {
                        tiles::build_radar_tile_url(&catalog.host, &frame.path, self.config.radar_style)
                    }
                    None => continue,
                },
                LayerKind::Satellite => match state.satellite.current_frame() {
                    Some(frame) => tiles::build_satellite_tile_url(
                        &catalog.host,
                        &frame.path,
                        tiles::TileSize::Px512,
                    ),
                    None => continue,
                },
                kind => match (kind.overlay_name(), state.layers.credential()) {
                    (Some(name), Some(credential)) => {
                        tiles::build_overlay_tile_url(name, credential)
                    }
                    _ => continue,
                },
            };
            plan.push(RenderInstruction {
                kind: layer.kind,
                url_template,
                opacity: layer.opacity,
            });
        }
        plan
    }
}
