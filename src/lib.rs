//! # boundary-map
//!
//! An election boundary viewer built around a small Leaflet-style map model.
//!
//! Five fixed boundary layers (counties, precincts, state house, state senate
//! and congressional districts) are fetched as GeoJSON, kept in a layer
//! registry, and attached to or detached from a map surface on demand.
//! Features can be hovered and clicked to produce an HTML description that
//! is shown in a popup and a side panel.

pub mod core;
pub mod data;
pub mod layers;
pub mod prelude;
pub mod tiles;
pub mod ui;
pub mod viewer;

// Re-export public API
pub use core::{
    config::ViewerConfig,
    geo::{LatLng, LatLngBounds, Point, TileCoord},
    map::Map,
    viewport::Viewport,
};

pub use data::{
    geojson::{GeoJson, GeoJsonFeature, GeoJsonGeometry},
    source::{FeatureSource, HttpFeatureSource},
};

pub use layers::{
    kind::LayerKind, overlay::Overlay, registry::LayerRegistry, style::PathStyle,
};

pub use tiles::{Basemap, TileCache, TileLoader, TileSource};

pub use ui::{
    events::UiEvent,
    popup::Popup,
    present::{feature_html, html_escape, html_to_text},
    sidebar::{Dispatch, SidebarController},
};

pub use viewer::{StartupQueue, Viewer};

/// Result type used throughout the library
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Common error types
#[derive(Debug, thiserror::Error)]
pub enum MapError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid coordinates: {0}")]
    InvalidCoordinates(String),

    #[error("Layer error: {0}")]
    Layer(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Parse error: {0}")]
    ParseError(String),
}

/// Error type alias for convenience
pub type Error = MapError;
