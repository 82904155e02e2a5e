//! Viewer state and the layer loader.
//!
//! A [`Viewer`] owns everything the front end shows: the map surface, the
//! registry of loaded overlays, the loading indicator, the feature panel and
//! the hovered feature. It is driven from one thread; fetches happen
//! elsewhere and are handed back through [`Viewer::finish_load`].

use crate::{
    core::{config::ViewerConfig, geo::LatLng, geo::Point, map::Map, viewport::Viewport},
    data::{geojson::GeoJson, source::FeatureSource},
    layers::{kind::LayerKind, overlay::Overlay, registry::LayerRegistry},
    ui::{events::UiEvent, popup::Popup, present::feature_html},
    Result,
};
use futures::stream::{FuturesOrdered, StreamExt};
use std::collections::VecDeque;

/// Initial container size until the front end reports its own
const DEFAULT_SIZE: Point = Point { x: 1024.0, y: 768.0 };

/// A feature addressed by layer kind and position in its collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FeatureRef {
    pub kind: LayerKind,
    pub index: usize,
}

/// Holds back startup results that arrive early.
///
/// Fetches for the startup layers finish in any order, but overlays stack
/// in attach order. [`StartupQueue::push`] releases a result only once every
/// startup layer before it has been released. Results for other kinds pass
/// straight through.
#[derive(Debug, Default)]
pub struct StartupQueue {
    order: VecDeque<LayerKind>,
    held: Vec<(LayerKind, Result<GeoJson>)>,
}

impl StartupQueue {
    pub fn new(order: Vec<LayerKind>) -> Self {
        Self {
            order: order.into(),
            held: Vec::new(),
        }
    }

    /// Accepts a fetch result and returns the results now ready to apply,
    /// in the order they must be applied
    pub fn push(
        &mut self,
        kind: LayerKind,
        result: Result<GeoJson>,
    ) -> Vec<(LayerKind, Result<GeoJson>)> {
        if !self.order.contains(&kind) {
            return vec![(kind, result)];
        }
        self.held.push((kind, result));

        let mut ready = Vec::new();
        while let Some(next) = self.order.front().copied() {
            let Some(index) = self.held.iter().position(|(k, _)| *k == next) else {
                break;
            };
            self.order.pop_front();
            ready.push(self.held.remove(index));
        }
        ready
    }

    /// Whether startup results are still outstanding
    pub fn is_waiting(&self) -> bool {
        !self.order.is_empty()
    }
}

#[derive(Debug)]
pub struct Viewer {
    config: ViewerConfig,
    map: Map,
    registry: LayerRegistry,
    /// One entry per outstanding load
    in_flight: Vec<LayerKind>,
    /// Layer to fit once its startup load lands
    pending_fit: Option<LayerKind>,
    feature_panel: Option<String>,
    hover: Option<FeatureRef>,
}

impl Viewer {
    pub fn new(config: ViewerConfig) -> Self {
        let mut viewport = Viewport::new(config.center, config.zoom, DEFAULT_SIZE);
        viewport.set_zoom_limits(config.min_zoom, config.max_zoom);
        viewport.set_zoom(config.zoom);

        Self {
            config,
            map: Map::with_viewport(viewport),
            registry: LayerRegistry::new(),
            in_flight: Vec::new(),
            pending_fit: None,
            feature_panel: None,
            hover: None,
        }
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn map(&self) -> &Map {
        &self.map
    }

    pub fn map_mut(&mut self) -> &mut Map {
        &mut self.map
    }

    pub fn registry(&self) -> &LayerRegistry {
        &self.registry
    }

    /// Whether the loading indicator is shown
    pub fn is_loading(&self) -> bool {
        !self.in_flight.is_empty()
    }

    pub fn pending_loads(&self) -> usize {
        self.in_flight.len()
    }

    pub fn is_loading_kind(&self, kind: LayerKind) -> bool {
        self.in_flight.contains(&kind)
    }

    /// HTML of the last clicked feature
    pub fn feature_panel(&self) -> Option<&str> {
        self.feature_panel.as_deref()
    }

    pub fn hovered(&self) -> Option<FeatureRef> {
        self.hover
    }

    /// Attached overlays, bottom to top
    pub fn visible_overlays(&self) -> impl Iterator<Item = &Overlay> + '_ {
        self.map
            .attached()
            .iter()
            .filter_map(|kind| self.registry.overlay(*kind))
    }

    /// Layers to load at startup.
    ///
    /// Arms the startup fit, so the configured layer is fitted when its
    /// load completes.
    pub fn startup_layers(&mut self) -> Vec<LayerKind> {
        self.pending_fit = self.config.fit_on_start;
        self.config.default_layers.clone()
    }

    /// Shows the loading indicator for a load of `kind`
    pub fn begin_load(&mut self, kind: LayerKind) {
        log::info!("loading {} layer", kind);
        self.in_flight.push(kind);
    }

    /// Applies the outcome of a load started with [`Viewer::begin_load`].
    ///
    /// On success the new overlay replaces any previous one of the same kind
    /// and is attached. On failure the registry and map are left untouched
    /// and the error is returned. Either way the loading indicator is
    /// released.
    pub fn finish_load(&mut self, kind: LayerKind, result: Result<GeoJson>) -> Result<()> {
        match self.in_flight.iter().position(|k| *k == kind) {
            Some(index) => {
                self.in_flight.remove(index);
            }
            None => log::warn!("finished a {} load that was never started", kind),
        }

        let data = match result {
            Ok(data) => data,
            Err(e) => {
                log::error!("failed to load {} layer: {}", kind, e);
                if self.pending_fit == Some(kind) {
                    self.pending_fit = None;
                }
                return Err(e);
            }
        };

        let overlay = Overlay::new(kind, data);
        log::info!("loaded {} layer with {} features", kind, overlay.len());

        if self.map.remove_layer(kind) {
            log::debug!("replacing attached {} overlay", kind);
        }
        if self.hover.is_some_and(|hover| hover.kind == kind) {
            self.hover = None;
        }
        self.registry.insert(overlay);
        self.map.add_layer(kind);

        if self.pending_fit == Some(kind) {
            self.pending_fit = None;
            self.fit_layer(kind);
        }
        Ok(())
    }

    /// Fetches `kind` from `source` and installs it
    pub async fn load(&mut self, source: &dyn FeatureSource, kind: LayerKind) -> Result<()> {
        self.begin_load(kind);
        let result = source.fetch(kind).await;
        self.finish_load(kind, result)
    }

    /// Loads the startup layers.
    ///
    /// All fetches run concurrently and are applied in startup order, so the
    /// later layers stack above the earlier ones. A failed layer does not
    /// stop the others; the first failure is returned once all have finished.
    pub async fn start(&mut self, source: &dyn FeatureSource) -> Result<()> {
        let mut fetches: FuturesOrdered<_> = self
            .startup_layers()
            .into_iter()
            .map(|kind| {
                self.begin_load(kind);
                async move { (kind, source.fetch(kind).await) }
            })
            .collect();

        let mut first_error = None;
        while let Some((kind, result)) = fetches.next().await {
            if let Err(e) = self.finish_load(kind, result) {
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    /// Attaches or detaches a loaded overlay.
    ///
    /// Returns `false` when `kind` has never loaded.
    pub fn set_layer_visible(&mut self, kind: LayerKind, visible: bool) -> bool {
        if !self.registry.contains(kind) {
            return false;
        }

        if visible {
            self.map.add_layer(kind);
        } else {
            self.map.remove_layer(kind);
            if self.hover.is_some_and(|hover| hover.kind == kind) {
                self.pointer_left();
            }
        }
        true
    }

    /// Fits the view to a loaded layer; a no-op before it has loaded
    pub fn fit_layer(&mut self, kind: LayerKind) -> bool {
        let Some(bounds) = self.registry.fit_bounds(kind) else {
            log::warn!("cannot fit {}: layer not loaded or empty", kind);
            return false;
        };

        self.map.fit_bounds(&bounds, self.config.fit_padding);
        true
    }

    /// Topmost attached feature at `position`
    pub fn feature_at(&self, position: &LatLng) -> Option<FeatureRef> {
        let tolerance = self
            .map
            .viewport()
            .pixels_to_degrees(self.config.hit_tolerance_px);

        self.map.attached().iter().rev().find_map(|kind| {
            let overlay = self.registry.overlay(*kind)?;
            overlay
                .feature_at(position, tolerance)
                .map(|index| FeatureRef { kind: *kind, index })
        })
    }

    /// Moves hover highlighting to the feature under the pointer
    pub fn pointer_moved(&mut self, position: LatLng) -> Option<FeatureRef> {
        let hit = self.feature_at(&position);
        if hit == self.hover {
            return hit;
        }

        self.pointer_left();
        if let Some(feature) = hit {
            if let Some(overlay) = self.registry.overlay_mut(feature.kind) {
                overlay.hover(feature.index);
            }
            self.hover = Some(feature);
        }
        hit
    }

    /// Reverts hover highlighting
    pub fn pointer_left(&mut self) {
        if let Some(previous) = self.hover.take() {
            if let Some(overlay) = self.registry.overlay_mut(previous.kind) {
                overlay.reset_style();
            }
        }
    }

    /// Opens the popup for the feature under `position`.
    ///
    /// The feature's HTML also goes to the feature panel. Clicking empty map
    /// closes the popup and keeps the panel as it was.
    pub fn click(&mut self, position: LatLng) -> Option<String> {
        let Some(feature) = self.feature_at(&position) else {
            self.map.close_popup();
            return None;
        };

        let html = self
            .registry
            .overlay(feature.kind)
            .and_then(|overlay| overlay.feature(feature.index))
            .map(|f| feature_html(feature.kind, &f.properties.clone().unwrap_or_default()))?;

        self.map
            .open_popup(Popup::new(position, html.clone(), self.config.popup_max_width));
        self.feature_panel = Some(html.clone());
        Some(html)
    }

    /// Applies a map-level UI event; sidebar events return `false`
    pub fn handle_map_event(&mut self, event: &UiEvent) -> bool {
        match event {
            UiEvent::PointerMoved { position } => {
                self.pointer_moved(*position);
            }
            UiEvent::PointerLeft => self.pointer_left(),
            UiEvent::MapClicked { position } => {
                self.click(*position);
            }
            UiEvent::BasemapSelected { basemap } => self.map.set_basemap(*basemap),
            UiEvent::Panned { delta } => self.map.pan(*delta),
            UiEvent::Zoomed { zoom, focus } => self.map.zoom_to(*zoom, *focus),
            UiEvent::Resized { size } => self.map.set_size(*size),
            UiEvent::ToggleChanged { .. } | UiEvent::ButtonClicked { .. } => return false,
        }
        true
    }
}

impl Default for Viewer {
    fn default() -> Self {
        Self::new(ViewerConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn square(name: &str, west: f64, south: f64, size: f64) -> serde_json::Value {
        json!({
            "type": "Feature",
            "properties": {"name": name, "county_id": name.len()},
            "geometry": {
                "type": "Polygon",
                "coordinates": [[
                    [west, south], [west + size, south], [west + size, south + size],
                    [west, south + size], [west, south]
                ]]
            }
        })
    }

    fn collection(features: Vec<serde_json::Value>) -> GeoJson {
        serde_json::from_value(json!({"type": "FeatureCollection", "features": features}))
            .unwrap()
    }

    fn loaded(kind: LayerKind, data: GeoJson) -> Viewer {
        let mut viewer = Viewer::default();
        viewer.begin_load(kind);
        viewer.finish_load(kind, Ok(data)).unwrap();
        viewer
    }

    #[test]
    fn test_indicator_follows_outstanding_loads() {
        let mut viewer = Viewer::default();
        viewer.begin_load(LayerKind::Counties);
        viewer.begin_load(LayerKind::Precincts);
        assert_eq!(viewer.pending_loads(), 2);

        viewer
            .finish_load(LayerKind::Counties, Ok(collection(vec![])))
            .unwrap();
        assert!(viewer.is_loading());
        assert!(viewer.is_loading_kind(LayerKind::Precincts));

        assert!(viewer
            .finish_load(LayerKind::Precincts, Err("offline".into()))
            .is_err());
        assert!(!viewer.is_loading());
        assert!(!viewer.registry().contains(LayerKind::Precincts));
    }

    #[test]
    fn test_startup_fit_runs_after_load() {
        let mut viewer = Viewer::default();
        let layers = viewer.startup_layers();
        assert_eq!(layers, vec![LayerKind::Counties, LayerKind::Precincts]);

        viewer.begin_load(LayerKind::Counties);
        viewer
            .finish_load(
                LayerKind::Counties,
                Ok(collection(vec![square("Wake", -79.0, 35.5, 0.5)])),
            )
            .unwrap();

        let view = viewer.map().viewport().bounds();
        assert!(view.contains(&LatLng::new(35.5, -79.0)));
        assert!(view.contains(&LatLng::new(36.0, -78.5)));
        assert!(viewer.map().viewport().zoom > 7.0);
    }

    #[test]
    fn test_startup_queue_applies_in_startup_order() {
        let mut queue = StartupQueue::new(vec![LayerKind::Counties, LayerKind::Precincts]);
        assert!(queue.is_waiting());

        assert!(queue
            .push(LayerKind::Precincts, Ok(collection(vec![])))
            .is_empty());

        let house = queue.push(LayerKind::House, Err("HTTP 404".into()));
        assert_eq!(house.len(), 1);
        assert_eq!(house[0].0, LayerKind::House);

        let ready: Vec<_> = queue
            .push(LayerKind::Counties, Err("offline".into()))
            .into_iter()
            .map(|(kind, result)| (kind, result.is_ok()))
            .collect();
        assert_eq!(
            ready,
            vec![(LayerKind::Counties, false), (LayerKind::Precincts, true)]
        );
        assert!(!queue.is_waiting());

        // Once drained, later loads of startup kinds pass through
        assert_eq!(queue.push(LayerKind::Counties, Ok(collection(vec![]))).len(), 1);
    }

    #[test]
    fn test_overlapping_loads_keep_last_completion() {
        let mut viewer = Viewer::default();
        viewer.begin_load(LayerKind::Counties);
        viewer.begin_load(LayerKind::Counties);
        assert_eq!(viewer.pending_loads(), 2);

        viewer
            .finish_load(
                LayerKind::Counties,
                Ok(collection(vec![square("Wake", -79.0, 35.5, 0.5)])),
            )
            .unwrap();
        assert!(viewer.is_loading_kind(LayerKind::Counties));

        viewer
            .finish_load(
                LayerKind::Counties,
                Ok(collection(vec![
                    square("Durham", -78.0, 35.5, 0.5),
                    square("Orange", -77.0, 35.5, 0.5),
                ])),
            )
            .unwrap();

        assert_eq!(viewer.pending_loads(), 0);
        assert_eq!(viewer.registry().len(), 1);
        assert_eq!(viewer.registry().get(LayerKind::Counties).unwrap().loads(), 2);
        let overlay = viewer.registry().overlay(LayerKind::Counties).unwrap();
        assert_eq!(overlay.len(), 2);
        assert_eq!(
            overlay.features()[0].property("name"),
            Some(&serde_json::Value::from("Durham"))
        );
        assert_eq!(viewer.map().attached(), &[LayerKind::Counties]);
    }

    #[test]
    fn test_hover_moves_between_features() {
        let mut viewer = loaded(
            LayerKind::Counties,
            collection(vec![
                square("Wake", -79.0, 35.5, 0.5),
                square("Durham", -78.0, 35.5, 0.5),
            ]),
        );

        let first = viewer.pointer_moved(LatLng::new(35.7, -78.8)).unwrap();
        assert_eq!(first, FeatureRef { kind: LayerKind::Counties, index: 0 });

        viewer.pointer_moved(LatLng::new(35.7, -77.8));
        let overlay = viewer.registry().overlay(LayerKind::Counties).unwrap();
        assert_eq!(overlay.hovered(), Some(1));

        viewer.pointer_left();
        let overlay = viewer.registry().overlay(LayerKind::Counties).unwrap();
        assert_eq!(overlay.hovered(), None);
        assert!(viewer.hovered().is_none());
    }

    #[test]
    fn test_click_fills_popup_and_panel() {
        let mut viewer = loaded(
            LayerKind::Counties,
            collection(vec![square("Wake", -79.0, 35.5, 0.5)]),
        );

        let html = viewer.click(LatLng::new(35.7, -78.8)).unwrap();
        assert_eq!(html, "<b>County:</b> Wake<br/><b>ID:</b> 4");
        assert_eq!(viewer.feature_panel(), Some(html.as_str()));

        let popup = viewer.map().popup().unwrap();
        assert_eq!(popup.max_width, 320.0);
        assert_eq!(popup.position, LatLng::new(35.7, -78.8));

        assert!(viewer.click(LatLng::new(30.0, -90.0)).is_none());
        assert!(viewer.map().popup().is_none());
        assert_eq!(viewer.feature_panel(), Some(html.as_str()));
    }

    #[test]
    fn test_hidden_layers_are_not_hit() {
        let mut viewer = loaded(
            LayerKind::Counties,
            collection(vec![square("Wake", -79.0, 35.5, 0.5)]),
        );
        viewer.pointer_moved(LatLng::new(35.7, -78.8));
        assert!(viewer.set_layer_visible(LayerKind::Counties, false));

        assert!(viewer.hovered().is_none());
        assert!(viewer.feature_at(&LatLng::new(35.7, -78.8)).is_none());
        assert!(!viewer.set_layer_visible(LayerKind::House, true));
    }

    #[test]
    fn test_map_events_route_to_surface() {
        let mut viewer = Viewer::default();
        assert!(viewer.handle_map_event(&UiEvent::BasemapSelected {
            basemap: crate::tiles::Basemap::Satellite
        }));
        assert_eq!(viewer.map().basemap(), crate::tiles::Basemap::Satellite);

        assert!(viewer.handle_map_event(&UiEvent::Zoomed { zoom: 9.0, focus: None }));
        assert_eq!(viewer.map().viewport().zoom, 9.0);

        assert!(!viewer.handle_map_event(&UiEvent::click("fit-counties")));
    }
}
