//! Tile URL builders.
//!
//! Pure string derivation: given the catalog host and a frame's path segment,
//! produce a templated tile URL with literal `{z}/{x}/{y}` placeholders. The
//! map renderer substitutes concrete tile coordinates at draw time; nothing
//! here performs I/O or validates reachability.

use std::fmt;

/// Supported tile edge lengths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TileSize {
    #[default]
    Px256,
    Px512,
}

impl TileSize {
    pub fn pixels(self) -> u32 {
        match self {
            TileSize::Px256 => 256,
            TileSize::Px512 => 512,
        }
    }
}

impl fmt::Display for TileSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.pixels())
    }
}

/// Radar styling axes understood by the tile server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RadarTileStyle {
    pub size: TileSize,
    /// Color scheme id, 0-8; see [`COLOR_SCHEMES`]
    pub color_scheme: u8,
    /// Blur/interpolate between radar pixels
    pub smooth: bool,
    /// Render snow in a separate color ramp
    pub snow: bool,
}

impl Default for RadarTileStyle {
    fn default() -> Self {
        Self {
            size: TileSize::Px256,
            color_scheme: 6,
            smooth: true,
            snow: true,
        }
    }
}

/// Named radar color schemes offered by the provider.
pub const COLOR_SCHEMES: &[(u8, &str)] = &[
    (0, "Original"),
    (1, "Universal Blue"),
    (2, "TITAN"),
    (3, "TWC"),
    (4, "Meteored"),
    (5, "NEXRAD Level III"),
    (6, "Rainbow @ SELEX-SI"),
    (7, "Dark Sky"),
    (8, "The Weather Channel"),
];

/// Display name for a color scheme id, or `None` for ids the provider
/// does not offer.
pub fn color_scheme_name(id: u8) -> Option<&'static str> {
    COLOR_SCHEMES
        .iter()
        .find(|&&(scheme, _)| scheme == id)
        .map(|&(_, name)| name)
}

/// Build a radar tile URL template for the map renderer.
///
/// Shape: `{host}{path}/{size}/{z}/{x}/{y}/{scheme}/{smooth}_{snow}.png`
pub fn build_radar_tile_url(host: &str, path: &str, style: RadarTileStyle) -> String {
    let smooth_flag = style.smooth as u8;
    let snow_flag = style.snow as u8;
    format!(
        "{host}{path}/{size}/{{z}}/{{x}}/{{y}}/{scheme}/{smooth_flag}_{snow_flag}.png",
        size = style.size,
        scheme = style.color_scheme,
    )
}

/// Build a satellite tile URL template.
///
/// Satellite imagery has no color-scheme or smoothing axis; the trailing
/// segments are fixed at `0/0_0`.
pub fn build_satellite_tile_url(host: &str, path: &str, size: TileSize) -> String {
    format!("{host}{path}/{size}/{{z}}/{{x}}/{{y}}/0/0_0.png")
}

/// Build an OpenWeatherMap overlay tile URL template for credentialed
/// layers (temperature, precipitation, wind, clouds).
///
/// The credential is embedded verbatim as a query parameter; this crate
/// never validates or transmits it itself.
pub fn build_overlay_tile_url(layer: &str, credential: &str) -> String {
    format!("https://tile.openweathermap.org/map/{layer}/{{z}}/{{x}}/{{y}}.png?appid={credential}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn radar_url_with_default_style() {
        let url = build_radar_tile_url(
            "https://tilecache.rainviewer.com",
            "/v2/radar/1699999800",
            RadarTileStyle::default(),
        );
        assert_eq!(
            url,
            "https://tilecache.rainviewer.com/v2/radar/1699999800/256/{z}/{x}/{y}/6/1_1.png"
        );
    }

    #[test]
    fn radar_url_flags_encode_as_bits() {
        let style = RadarTileStyle {
            size: TileSize::Px512,
            color_scheme: 2,
            smooth: false,
            snow: true,
        };
        let url = build_radar_tile_url("https://h", "/p", style);
        assert_eq!(url, "https://h/p/512/{z}/{x}/{y}/2/0_1.png");
    }

    #[test]
    fn satellite_url_has_fixed_style_segments() {
        let url = build_satellite_tile_url(
            "https://tilecache.rainviewer.com",
            "/v2/satellite/1699999800",
            TileSize::Px512,
        );
        assert_eq!(
            url,
            "https://tilecache.rainviewer.com/v2/satellite/1699999800/512/{z}/{x}/{y}/0/0_0.png"
        );
    }

    #[test]
    fn overlay_url_embeds_credential_verbatim() {
        let url = build_overlay_tile_url("temp_new", "abc123");
        assert_eq!(
            url,
            "https://tile.openweathermap.org/map/temp_new/{z}/{x}/{y}.png?appid=abc123"
        );
    }

    #[test]
    fn color_scheme_lookup() {
        assert_eq!(color_scheme_name(6), Some("Rainbow @ SELEX-SI"));
        assert_eq!(color_scheme_name(0), Some("Original"));
        assert_eq!(color_scheme_name(9), None);
    }

    #[test]
    fn every_color_scheme_produces_a_valid_url() {
        for &(id, _) in COLOR_SCHEMES {
            let style = RadarTileStyle {
                color_scheme: id,
                ..RadarTileStyle::default()
            };
            let url = build_radar_tile_url("https://h", "/p", style);
            assert!(url.contains("/{z}/{x}/{y}/"));
            assert!(url.ends_with(".png"));
        }
    }
}
