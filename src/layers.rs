//! Map layer registry.
//!
//! A small, fixed set of layer descriptors the UI toggles and the tile
//! renderer reads every frame. Layers are created once at startup and only
//! ever hidden, never removed. Overlay layers sourced from OpenWeatherMap
//! need a credential; without one they report as not effectively visible
//! while keeping the user's stored `visible` intent untouched.

use serde::{Deserialize, Serialize};

/// Identity of a map layer, in fixed display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerKind {
    Radar,
    Satellite,
    Temperature,
    Precipitation,
    Wind,
    Clouds,
}

impl LayerKind {
    /// OpenWeatherMap tile layer name for credentialed overlays.
    pub fn overlay_name(self) -> Option<&'static str> {
        match self {
            LayerKind::Temperature => Some("temp_new"),
            LayerKind::Precipitation => Some("precipitation_new"),
            LayerKind::Wind => Some("wind_new"),
            LayerKind::Clouds => Some("clouds_new"),
            LayerKind::Radar | LayerKind::Satellite => None,
        }
    }
}

/// One toggleable map layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayerDescriptor {
    pub kind: LayerKind,
    pub name: &'static str,
    pub description: &'static str,
    /// User intent; gating by missing credential never rewrites this
    pub visible: bool,
    /// Render opacity in [0, 1]
    pub opacity: f32,
    pub requires_credential: bool,
}

fn default_layers() -> Vec<LayerDescriptor> {
    vec![
        LayerDescriptor {
            kind: LayerKind::Radar,
            name: "Radar",
            description: "Live weather radar",
            visible: true,
            opacity: 0.7,
            requires_credential: false,
        },
        LayerDescriptor {
            kind: LayerKind::Satellite,
            name: "Satellite",
            description: "Infrared satellite imagery",
            visible: false,
            opacity: 0.8,
            requires_credential: false,
        },
        LayerDescriptor {
            kind: LayerKind::Temperature,
            name: "Temperature",
            description: "Temperature overlay",
            visible: false,
            opacity: 0.6,
            requires_credential: true,
        },
        LayerDescriptor {
            kind: LayerKind::Precipitation,
            name: "Precipitation",
            description: "Precipitation amounts",
            visible: false,
            opacity: 0.6,
            requires_credential: true,
        },
        LayerDescriptor {
            kind: LayerKind::Wind,
            name: "Wind",
            description: "Wind speed and direction",
            visible: false,
            opacity: 0.5,
            requires_credential: true,
        },
        LayerDescriptor {
            kind: LayerKind::Clouds,
            name: "Clouds",
            description: "Cloud coverage",
            visible: false,
            opacity: 0.5,
            requires_credential: true,
        },
    ]
}

/// Ordered collection of layer descriptors plus the overlay credential.
#[derive(Debug, Clone)]
pub struct LayerRegistry {
    layers: Vec<LayerDescriptor>,
    credential: Option<String>,
}

impl LayerRegistry {
    pub fn new(credential: Option<String>) -> Self {
        Self {
            layers: default_layers(),
            credential,
        }
    }

    pub fn has_credential(&self) -> bool {
        self.credential.as_deref().is_some_and(|c| !c.is_empty())
    }

    pub fn credential(&self) -> Option<&str> {
        self.credential.as_deref()
    }

    /// Supply or clear the overlay credential after startup.
    pub fn set_credential(&mut self, credential: Option<String>) {
        self.credential = credential;
    }

    /// Full descriptor set in fixed display order.
    pub fn list(&self) -> &[LayerDescriptor] {
        &self.layers
    }

    pub fn get(&self, kind: LayerKind) -> Option<&LayerDescriptor> {
        self.layers.iter().find(|l| l.kind == kind)
    }

    /// Flip a layer's visibility. Unknown ids are ignored.
    pub fn toggle(&mut self, kind: LayerKind) {
        if let Some(layer) = self.layers.iter_mut().find(|l| l.kind == kind) {
            layer.visible = !layer.visible;
        }
    }

    /// Set a layer's opacity, silently clamped into [0, 1].
    pub fn set_opacity(&mut self, kind: LayerKind, opacity: f32) {
        if let Some(layer) = self.layers.iter_mut().find(|l| l.kind == kind) {
            layer.opacity = opacity.clamp(0.0, 1.0);
        }
    }

    /// Whether a layer should actually render: visible, and credentialed if
    /// it needs to be. Purely derived; never mutates the stored flag, so a
    /// credential supplied later restores the user's original intent.
    pub fn effective_visible(&self, kind: LayerKind) -> bool {
        self.get(kind)
            .map(|l| l.visible && (!l.requires_credential || self.has_credential()))
            .unwrap_or(false)
    }
}

impl Default for LayerRegistry {
    fn default() -> Self {
        Self::new(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn display_order_is_stable() {
        let registry = LayerRegistry::default();
        let kinds: Vec<LayerKind> = registry.list().iter().map(|l| l.kind).collect();
        assert_eq!(
            kinds,
            vec![
                LayerKind::Radar,
                LayerKind::Satellite,
                LayerKind::Temperature,
                LayerKind::Precipitation,
                LayerKind::Wind,
                LayerKind::Clouds,
            ]
        );
    }

    #[test]
    fn radar_is_the_only_default_visible_layer() {
        let registry = LayerRegistry::default();
        let visible: Vec<LayerKind> = registry
            .list()
            .iter()
            .filter(|l| l.visible)
            .map(|l| l.kind)
            .collect();
        assert_eq!(visible, vec![LayerKind::Radar]);
    }

    #[test]
    fn toggle_flips_visibility() {
        let mut registry = LayerRegistry::default();
        registry.toggle(LayerKind::Satellite);
        assert!(registry.get(LayerKind::Satellite).unwrap().visible);
        registry.toggle(LayerKind::Satellite);
        assert!(!registry.get(LayerKind::Satellite).unwrap().visible);
    }

    #[test]
    fn opacity_is_clamped() {
        let mut registry = LayerRegistry::default();
        registry.set_opacity(LayerKind::Radar, 1.7);
        assert_eq!(registry.get(LayerKind::Radar).unwrap().opacity, 1.0);
        registry.set_opacity(LayerKind::Radar, -0.3);
        assert_eq!(registry.get(LayerKind::Radar).unwrap().opacity, 0.0);
        registry.set_opacity(LayerKind::Radar, 0.45);
        assert_eq!(registry.get(LayerKind::Radar).unwrap().opacity, 0.45);
    }

    #[test]
    fn credential_gating_is_derived_not_stored() {
        let mut registry = LayerRegistry::new(None);
        registry.toggle(LayerKind::Temperature);

        // Visible intent is stored, but the layer does not render.
        assert!(registry.get(LayerKind::Temperature).unwrap().visible);
        assert!(!registry.effective_visible(LayerKind::Temperature));

        // Supplying the credential later flips the derived read with no
        // re-toggle needed.
        registry.set_credential(Some("abc123".to_string()));
        assert!(registry.effective_visible(LayerKind::Temperature));
    }

    #[test]
    fn empty_credential_counts_as_absent() {
        let mut registry = LayerRegistry::new(Some(String::new()));
        registry.toggle(LayerKind::Wind);
        assert!(!registry.effective_visible(LayerKind::Wind));
    }

    #[test]
    fn uncredentialed_layers_ignore_the_credential() {
        let registry = LayerRegistry::new(None);
        assert!(registry.effective_visible(LayerKind::Radar));
        assert!(!registry.effective_visible(LayerKind::Satellite));
    }
}
