//! Prelude module for common boundary-map types and traits
//!
//! This module re-exports the most commonly used types, traits, and functions
//! for easy importing with `use boundary_map::prelude::*;`

pub use crate::core::{
    config::{TileLoadingConfig, ViewerConfig},
    geo::{LatLng, LatLngBounds, Point, TileCoord},
    map::Map,
    viewport::Viewport,
};

pub use crate::data::{
    geojson::{GeoJson, GeoJsonFeature, GeoJsonGeometry, Properties},
    source::{FeatureSource, HttpFeatureSource},
};

pub use crate::layers::{
    base::{LayerProperties, LayerTrait, LayerType},
    kind::LayerKind,
    overlay::Overlay,
    registry::LayerRegistry,
    style::{PathStyle, SerializableColor, StyleOverride},
};

pub use crate::tiles::{Basemap, TileCache, TileLayer, TileLoader, TileSource};

pub use crate::ui::{
    events::{MapEvent, UiEvent},
    popup::Popup,
    present::{feature_html, html_escape, html_to_text},
    sidebar::{Dispatch, SidebarBinding, SidebarController},
};

pub use crate::viewer::{FeatureRef, StartupQueue, Viewer};

pub use crate::{Error as MapError, Result};

pub use fxhash::{FxHashMap as HashMap, FxHashSet as HashSet};
