use crate::{
    core::geo::{LatLng, LatLngBounds},
    prelude::HashMap,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Attribute set of a feature
pub type Properties = HashMap<String, Value>;

/// A GeoJSON position; any altitude or extra ordinates are dropped on read
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<f64>", into = "Vec<f64>")]
pub struct Position(pub [f64; 2]);

impl Position {
    pub fn lng(&self) -> f64 {
        self.0[0]
    }

    pub fn lat(&self) -> f64 {
        self.0[1]
    }

    pub fn to_lat_lng(&self) -> LatLng {
        LatLng::from_position(self.0)
    }
}

impl TryFrom<Vec<f64>> for Position {
    type Error = String;

    fn try_from(values: Vec<f64>) -> Result<Self, Self::Error> {
        match values.as_slice() {
            [lng, lat, ..] => Ok(Position([*lng, *lat])),
            _ => Err(format!("position needs at least 2 ordinates, got {}", values.len())),
        }
    }
}

impl From<Position> for Vec<f64> {
    fn from(position: Position) -> Self {
        position.0.to_vec()
    }
}

/// GeoJSON geometry types
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum GeoJsonGeometry {
    Point {
        coordinates: Position,
    },
    LineString {
        coordinates: Vec<Position>,
    },
    Polygon {
        coordinates: Vec<Vec<Position>>,
    },
    MultiPoint {
        coordinates: Vec<Position>,
    },
    MultiLineString {
        coordinates: Vec<Vec<Position>>,
    },
    MultiPolygon {
        coordinates: Vec<Vec<Vec<Position>>>,
    },
    GeometryCollection {
        geometries: Vec<GeoJsonGeometry>,
    },
}

/// GeoJSON feature with geometry and properties
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoJsonFeature {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub geometry: Option<GeoJsonGeometry>,
    #[serde(default)]
    pub properties: Option<Properties>,
}

impl GeoJsonFeature {
    pub fn new(geometry: GeoJsonGeometry, properties: Properties) -> Self {
        Self {
            id: None,
            geometry: Some(geometry),
            properties: Some(properties),
        }
    }

    /// Looks up a single attribute
    pub fn property(&self, key: &str) -> Option<&Value> {
        self.properties.as_ref().and_then(|props| props.get(key))
    }

    pub fn bounds(&self) -> Option<LatLngBounds> {
        self.geometry.as_ref().and_then(GeoJsonGeometry::bounds)
    }
}

/// Root GeoJSON object
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "Value")]
pub enum GeoJson {
    Feature(GeoJsonFeature),
    FeatureCollection { features: Vec<GeoJsonFeature> },
    Geometry(GeoJsonGeometry),
}

impl TryFrom<Value> for GeoJson {
    type Error = String;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        let kind = value
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| "GeoJSON object has no \"type\" member".to_string())?
            .to_string();

        match kind.as_str() {
            "FeatureCollection" => {
                #[derive(Deserialize)]
                struct Collection {
                    features: Vec<GeoJsonFeature>,
                }
                let collection: Collection =
                    serde_json::from_value(value).map_err(|e| e.to_string())?;
                Ok(GeoJson::FeatureCollection {
                    features: collection.features,
                })
            }
            "Feature" => serde_json::from_value(value)
                .map(GeoJson::Feature)
                .map_err(|e| e.to_string()),
            _ => serde_json::from_value(value)
                .map(GeoJson::Geometry)
                .map_err(|e| format!("unsupported GeoJSON type '{}': {}", kind, e)),
        }
    }
}

impl GeoJson {
    /// Parses a GeoJSON document
    pub fn from_str(geojson_str: &str) -> crate::Result<Self> {
        let data: GeoJson = serde_json::from_str(geojson_str)
            .map_err(|e| crate::Error::ParseError(format!("Invalid GeoJSON: {}", e)))?;
        Ok(data)
    }

    /// Flattens the document into its features; a bare geometry becomes one
    /// feature without properties
    pub fn into_features(self) -> Vec<GeoJsonFeature> {
        match self {
            GeoJson::Feature(feature) => vec![feature],
            GeoJson::FeatureCollection { features } => features,
            GeoJson::Geometry(geometry) => vec![GeoJsonFeature {
                id: None,
                geometry: Some(geometry),
                properties: None,
            }],
        }
    }
}

impl GeoJsonGeometry {
    /// Gets the bounding box of the geometry, `None` if it has no positions
    pub fn bounds(&self) -> Option<LatLngBounds> {
        match self {
            GeoJsonGeometry::GeometryCollection { geometries } => geometries
                .iter()
                .filter_map(GeoJsonGeometry::bounds)
                .reduce(|a, b| a.union(&b)),
            _ => LatLngBounds::from_points(self.to_lat_lng_points()),
        }
    }

    /// Converts coordinates to LatLng points (outer rings only for polygons)
    pub fn to_lat_lng_points(&self) -> Vec<LatLng> {
        fn ring(positions: &[Position]) -> impl Iterator<Item = LatLng> + '_ {
            positions.iter().map(Position::to_lat_lng)
        }

        match self {
            GeoJsonGeometry::Point { coordinates } => vec![coordinates.to_lat_lng()],
            GeoJsonGeometry::LineString { coordinates }
            | GeoJsonGeometry::MultiPoint { coordinates } => ring(coordinates).collect(),
            GeoJsonGeometry::Polygon { coordinates } => coordinates
                .first()
                .map(|exterior| ring(exterior).collect())
                .unwrap_or_default(),
            GeoJsonGeometry::MultiLineString { coordinates } => {
                coordinates.iter().flat_map(|line| ring(line)).collect()
            }
            GeoJsonGeometry::MultiPolygon { coordinates } => coordinates
                .iter()
                .filter_map(|polygon| polygon.first())
                .flat_map(|exterior| ring(exterior))
                .collect(),
            GeoJsonGeometry::GeometryCollection { geometries } => geometries
                .iter()
                .flat_map(GeoJsonGeometry::to_lat_lng_points)
                .collect(),
        }
    }

    /// Checks whether `point` hits the geometry.
    ///
    /// Areas hit by containment (holes excluded). Points and lines hit when
    /// within `tolerance` degrees of longitude. Latitude distances are
    /// stretched by `1 / cos(lat)` first, so the tolerance covers the same
    /// number of Mercator pixels in both directions.
    pub fn hit_test(&self, point: &LatLng, tolerance: f64) -> bool {
        match self {
            GeoJsonGeometry::Point { coordinates } => {
                Self::near_position(point, coordinates, tolerance)
            }
            GeoJsonGeometry::MultiPoint { coordinates } => coordinates
                .iter()
                .any(|c| Self::near_position(point, c, tolerance)),
            GeoJsonGeometry::LineString { coordinates } => {
                Self::point_on_line(point, coordinates, tolerance)
            }
            GeoJsonGeometry::MultiLineString { coordinates } => coordinates
                .iter()
                .any(|line| Self::point_on_line(point, line, tolerance)),
            GeoJsonGeometry::Polygon { coordinates } => Self::point_in_rings(point, coordinates),
            GeoJsonGeometry::MultiPolygon { coordinates } => coordinates
                .iter()
                .any(|polygon| Self::point_in_rings(point, polygon)),
            GeoJsonGeometry::GeometryCollection { geometries } => {
                geometries.iter().any(|geom| geom.hit_test(point, tolerance))
            }
        }
    }

    /// Pixel-equivalent stretch of latitude differences at `point`
    fn lat_stretch(point: &LatLng) -> f64 {
        1.0 / LatLng::clamp_lat(point.lat).to_radians().cos()
    }

    fn near_position(point: &LatLng, position: &Position, tolerance: f64) -> bool {
        (position.lat() - point.lat).abs() * Self::lat_stretch(point) <= tolerance
            && (position.lng() - point.lng).abs() <= tolerance
    }

    /// Inside the exterior ring and outside every hole
    fn point_in_rings(point: &LatLng, rings: &[Vec<Position>]) -> bool {
        match rings.split_first() {
            Some((exterior, holes)) => {
                Self::point_in_ring(point, exterior)
                    && !holes.iter().any(|hole| Self::point_in_ring(point, hole))
            }
            None => false,
        }
    }

    fn point_in_ring(point: &LatLng, ring: &[Position]) -> bool {
        if ring.len() < 3 {
            return false;
        }

        let mut inside = false;
        let mut j = ring.len() - 1;

        for i in 0..ring.len() {
            let (xi, yi) = (ring[i].lng(), ring[i].lat());
            let (xj, yj) = (ring[j].lng(), ring[j].lat());

            if ((yi > point.lat) != (yj > point.lat))
                && (point.lng < (xj - xi) * (point.lat - yi) / (yj - yi) + xi)
            {
                inside = !inside;
            }
            j = i;
        }

        inside
    }

    fn point_on_line(point: &LatLng, line: &[Position], tolerance: f64) -> bool {
        line.windows(2).any(|segment| {
            Self::point_to_segment_distance(point, &segment[0], &segment[1]) <= tolerance
        })
    }

    fn point_to_segment_distance(point: &LatLng, a: &Position, b: &Position) -> f64 {
        let stretch = Self::lat_stretch(point);
        let (px, py) = (point.lng, point.lat * stretch);
        let (x1, y1) = (a.lng(), a.lat() * stretch);
        let dx = b.lng() - x1;
        let dy = b.lat() * stretch - y1;

        if dx == 0.0 && dy == 0.0 {
            return ((px - x1).powi(2) + (py - y1).powi(2)).sqrt();
        }

        let t = (((px - x1) * dx + (py - y1) * dy) / (dx * dx + dy * dy)).clamp(0.0, 1.0);
        let closest_x = x1 + t * dx;
        let closest_y = y1 + t * dy;

        ((px - closest_x).powi(2) + (py - closest_y).powi(2)).sqrt()
    }
}
