use crate::{
    core::geo::{LatLng, LatLngBounds},
    data::geojson::{GeoJson, GeoJsonFeature},
    layers::{
        base::{LayerProperties, LayerTrait, LayerType},
        kind::LayerKind,
        style::{PathStyle, StyleOverride},
    },
};

/// One loaded feature collection, styled for its layer kind.
///
/// The overlay tracks which feature, if any, is under the pointer; that
/// feature is drawn with the hover style until [`Overlay::reset_style`].
#[derive(Debug, Clone)]
pub struct Overlay {
    properties: LayerProperties,
    kind: LayerKind,
    features: Vec<GeoJsonFeature>,
    style: PathStyle,
    hover_style: StyleOverride,
    hovered: Option<usize>,
    feature_bounds: Vec<Option<LatLngBounds>>,
    bounds: Option<LatLngBounds>,
}

impl Overlay {
    pub fn new(kind: LayerKind, data: GeoJson) -> Self {
        let features = data.into_features();
        let feature_bounds: Vec<_> = features.iter().map(GeoJsonFeature::bounds).collect();
        let bounds = feature_bounds
            .iter()
            .flatten()
            .cloned()
            .reduce(|a, b| a.union(&b));

        if bounds.is_none() {
            log::warn!("{} overlay has no positioned features", kind);
        }

        Self {
            properties: LayerProperties::new(
                kind.id().to_string(),
                kind.label().to_string(),
                LayerType::Overlay,
            ),
            kind,
            features,
            style: PathStyle::for_kind(kind),
            hover_style: StyleOverride::hover(),
            hovered: None,
            feature_bounds,
            bounds,
        }
    }

    pub fn kind(&self) -> LayerKind {
        self.kind
    }

    pub fn features(&self) -> &[GeoJsonFeature] {
        &self.features
    }

    pub fn feature(&self, index: usize) -> Option<&GeoJsonFeature> {
        self.features.get(index)
    }

    /// Extent of one feature, `None` when it has no positions
    pub fn feature_bounds(&self, index: usize) -> Option<&LatLngBounds> {
        self.feature_bounds.get(index)?.as_ref()
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Base style shared by every feature
    pub fn style(&self) -> &PathStyle {
        &self.style
    }

    /// Effective style of one feature, including hover highlighting
    pub fn feature_style(&self, index: usize) -> PathStyle {
        if self.hovered == Some(index) {
            self.style.with_override(&self.hover_style)
        } else {
            self.style.clone()
        }
    }

    pub fn hovered(&self) -> Option<usize> {
        self.hovered
    }

    /// Applies the hover style to `index`; out of range indices are ignored
    pub fn hover(&mut self, index: usize) {
        if index < self.features.len() {
            self.hovered = Some(index);
        }
    }

    /// Reverts any hover highlighting
    pub fn reset_style(&mut self) {
        self.hovered = None;
    }

    /// Index of the topmost feature hit at `point`.
    ///
    /// Later features are drawn above earlier ones, so the search runs back
    /// to front.
    pub fn feature_at(&self, point: &LatLng, tolerance: f64) -> Option<usize> {
        self.features.iter().enumerate().rev().find_map(|(index, feature)| {
            let geometry = feature.geometry.as_ref()?;
            if let Some(bounds) = &self.feature_bounds[index] {
                let padded = LatLngBounds::from_coords(
                    bounds.south_west.lat - tolerance,
                    bounds.south_west.lng - tolerance,
                    bounds.north_east.lat + tolerance,
                    bounds.north_east.lng + tolerance,
                );
                if !padded.contains(point) {
                    return None;
                }
            }
            geometry.hit_test(point, tolerance).then_some(index)
        })
    }
}

impl LayerTrait for Overlay {
    fn properties(&self) -> &LayerProperties {
        &self.properties
    }

    fn bounds(&self) -> Option<LatLngBounds> {
        self.bounds.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::geojson::{GeoJsonGeometry, Position, Properties};
    use serde_json::json;

    fn square_feature(name: &str, west: f64, south: f64, size: f64) -> GeoJsonFeature {
        let ring = vec![
            Position([west, south]),
            Position([west + size, south]),
            Position([west + size, south + size]),
            Position([west, south + size]),
            Position([west, south]),
        ];
        let mut props = Properties::default();
        props.insert("name".to_string(), json!(name));
        GeoJsonFeature::new(GeoJsonGeometry::Polygon { coordinates: vec![ring] }, props)
    }

    fn sample() -> Overlay {
        Overlay::new(
            LayerKind::Counties,
            GeoJson::FeatureCollection {
                features: vec![
                    square_feature("Wake", -79.0, 35.5, 1.0),
                    square_feature("Durham", -78.5, 35.8, 1.0),
                ],
            },
        )
    }

    #[test]
    fn test_overlay_bounds_and_identity() {
        let overlay = sample();

        assert_eq!(overlay.id(), "counties");
        assert_eq!(overlay.name(), "Counties");
        assert_eq!(overlay.layer_type(), LayerType::Overlay);
        assert_eq!(overlay.len(), 2);

        let bounds = overlay.bounds().unwrap();
        assert_eq!(bounds.south_west, LatLng::new(35.5, -79.0));
        assert_eq!(bounds.north_east, LatLng::new(36.8, -77.5));
    }

    #[test]
    fn test_feature_at_prefers_topmost() {
        let overlay = sample();

        // Overlap of both squares resolves to the later one
        assert_eq!(overlay.feature_at(&LatLng::new(36.0, -78.2), 0.0), Some(1));
        assert_eq!(overlay.feature_at(&LatLng::new(35.6, -78.9), 0.0), Some(0));
        assert_eq!(overlay.feature_at(&LatLng::new(30.0, -90.0), 0.0), None);
    }

    #[test]
    fn test_hover_applies_and_reverts() {
        let mut overlay = sample();
        let base = overlay.style().clone();

        overlay.hover(1);
        assert_eq!(overlay.hovered(), Some(1));
        assert_eq!(overlay.feature_style(1).weight, 2.0);
        assert_eq!(overlay.feature_style(1).fill_opacity, 0.10);
        assert_eq!(overlay.feature_style(0), base);

        overlay.reset_style();
        assert_eq!(overlay.hovered(), None);
        assert_eq!(overlay.feature_style(1), base);

        overlay.hover(7);
        assert_eq!(overlay.hovered(), None);
    }

    #[test]
    fn test_empty_collection_has_no_bounds() {
        let overlay = Overlay::new(LayerKind::House, GeoJson::FeatureCollection { features: vec![] });
        assert!(overlay.is_empty());
        assert!(overlay.bounds().is_none());
        assert_eq!(overlay.style().dash_array, vec![4.0, 3.0]);
    }
}
