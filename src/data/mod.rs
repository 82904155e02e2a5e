pub mod geojson;
pub mod source;

pub use geojson::{GeoJson, GeoJsonFeature, GeoJsonGeometry, Position, Properties};
pub use source::{FeatureSource, HttpFeatureSource};
