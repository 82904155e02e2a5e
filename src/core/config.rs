//! Viewer configuration
//!
//! Every field has a default matching the North Carolina election boundary
//! deployment, so an empty JSON object (or no file at all) is a complete
//! configuration. Individual fields can be overridden from a JSON document.

use crate::{core::geo::LatLng, layers::kind::LayerKind, prelude::HashMap, MapError, Result};
use serde::{Deserialize, Deserializer, Serialize};
use std::path::Path;

/// Base URL the default data sources live under
pub const DEFAULT_DATA_BASE_URL: &str =
    "https://raw.githubusercontent.com/hayatkhan20/Election-NC/main";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// Initial map center
    pub center: LatLng,
    /// Initial zoom level
    pub zoom: f64,
    pub min_zoom: f64,
    pub max_zoom: f64,
    /// Padding in pixels kept on every side when fitting a layer
    pub fit_padding: f64,
    /// Maximum popup width in pixels
    pub popup_max_width: f64,
    /// Pointer tolerance for point and line features, in pixels
    pub hit_tolerance_px: f64,
    /// Layers loaded at startup, in order
    pub default_layers: Vec<LayerKind>,
    /// Layer the view is fitted to once it has loaded at startup
    pub fit_on_start: Option<LayerKind>,
    /// GeoJSON document URL per layer kind; entries given in a file replace
    /// the defaults of their kind only
    #[serde(deserialize_with = "merge_data_sources")]
    pub data_sources: HashMap<LayerKind, String>,
    pub tiles: TileLoadingConfig,
}

fn default_data_sources() -> HashMap<LayerKind, String> {
    LayerKind::ALL
        .into_iter()
        .map(|kind| {
            (
                kind,
                format!("{}/{}", DEFAULT_DATA_BASE_URL, kind.file_name()),
            )
        })
        .collect()
}

fn merge_data_sources<'de, D>(
    deserializer: D,
) -> std::result::Result<HashMap<LayerKind, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let overrides = HashMap::<LayerKind, String>::deserialize(deserializer)?;
    let mut sources = default_data_sources();
    sources.extend(overrides);
    Ok(sources)
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            center: LatLng::new(35.5, -79.0),
            zoom: 7.0,
            min_zoom: 0.0,
            max_zoom: 19.0,
            fit_padding: 20.0,
            popup_max_width: 320.0,
            hit_tolerance_px: 4.0,
            default_layers: vec![LayerKind::Counties, LayerKind::Precincts],
            fit_on_start: Some(LayerKind::Counties),
            data_sources: default_data_sources(),
            tiles: TileLoadingConfig::default(),
        }
    }
}

impl ViewerConfig {
    /// Parses a JSON document; missing fields keep their defaults
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: ViewerConfig = serde_json::from_str(json).map_err(MapError::Serialization)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads a JSON configuration file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(MapError::Io)?;
        log::info!("loaded viewer config from {}", path.display());
        Self::from_json_str(&json)
    }

    /// Checks ranges that would make the viewer misbehave
    pub fn validate(&self) -> Result<()> {
        if !self.center.is_valid() {
            return Err(MapError::InvalidCoordinates(format!(
                "center {:?} out of range",
                self.center
            ))
            .into());
        }
        if self.min_zoom > self.max_zoom {
            return Err(MapError::Config(format!(
                "min_zoom {} exceeds max_zoom {}",
                self.min_zoom, self.max_zoom
            ))
            .into());
        }
        if self.fit_padding < 0.0 || self.popup_max_width <= 0.0 || self.hit_tolerance_px < 0.0 {
            return Err(MapError::Config(
                "fit_padding, popup_max_width and hit_tolerance_px must be positive".to_string(),
            )
            .into());
        }
        if let Some(kind) = self.fit_on_start {
            if !self.default_layers.contains(&kind) {
                return Err(MapError::Config(format!(
                    "fit_on_start layer {} is not a default layer",
                    kind
                ))
                .into());
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TileLoadingConfig {
    /// Number of decoded tile payloads kept in memory
    pub cache_size: usize,
    pub max_retries: u32,
    pub retry_delay_ms: u64,
    /// Sent with every request; public tile servers reject anonymous clients
    pub user_agent: String,
}

impl Default for TileLoadingConfig {
    fn default() -> Self {
        Self {
            cache_size: 1024,
            max_retries: 2,
            retry_delay_ms: 100,
            user_agent: format!("boundary-map/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ViewerConfig::default();
        assert_eq!(config.center, LatLng::new(35.5, -79.0));
        assert_eq!(config.zoom, 7.0);
        assert_eq!(config.fit_padding, 20.0);
        assert_eq!(config.popup_max_width, 320.0);
        assert_eq!(
            config.default_layers,
            vec![LayerKind::Counties, LayerKind::Precincts]
        );
        assert_eq!(config.data_sources.len(), 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = ViewerConfig::from_json_str(
            r#"{
                "zoom": 9,
                "data_sources": {"counties": "http://localhost:8000/counties.geojson"},
                "tiles": {"cache_size": 64}
            }"#,
        )
        .unwrap();

        assert_eq!(config.zoom, 9.0);
        assert_eq!(config.fit_padding, 20.0);
        assert_eq!(
            config.data_sources.get(&LayerKind::Counties).map(String::as_str),
            Some("http://localhost:8000/counties.geojson")
        );
        assert_eq!(config.data_sources.len(), 5);
        assert_eq!(
            config.data_sources.get(&LayerKind::House),
            ViewerConfig::default().data_sources.get(&LayerKind::House)
        );
        assert_eq!(config.tiles.cache_size, 64);
        assert_eq!(config.tiles.max_retries, 2);
    }

    #[test]
    fn test_invalid_configs_are_rejected() {
        assert!(ViewerConfig::from_json_str(r#"{"min_zoom": 10, "max_zoom": 5}"#).is_err());
        assert!(ViewerConfig::from_json_str(r#"{"center": {"lat": 120.0, "lng": 0.0}}"#).is_err());
        assert!(ViewerConfig::from_json_str(
            r#"{"default_layers": ["precincts"], "fit_on_start": "counties"}"#
        )
        .is_err());
        assert!(ViewerConfig::from_json_str(r#"{"default_layers": ["wards"]}"#).is_err());
    }
}
