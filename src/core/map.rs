use crate::{
    core::{
        geo::{LatLng, LatLngBounds, Point},
        viewport::Viewport,
    },
    layers::kind::LayerKind,
    tiles::{Basemap, TileLayer},
    ui::{
        events::{EventManager, MapEvent},
        popup::Popup,
    },
};

/// The map surface: view state, the active base layer, the overlays drawn
/// above it and the open popup.
///
/// Overlays are identified by kind; the loaded features live in the
/// [`crate::layers::LayerRegistry`]. Attach order is draw order, so the last
/// attached overlay is on top.
#[derive(Debug)]
pub struct Map {
    pub viewport: Viewport,
    base_layer: TileLayer,
    overlays: Vec<LayerKind>,
    popup: Option<Popup>,
    event_manager: EventManager,
}

impl Map {
    pub fn new(center: LatLng, zoom: f64, size: Point) -> Self {
        Self::with_viewport(Viewport::new(center, zoom, size))
    }

    pub fn with_viewport(viewport: Viewport) -> Self {
        Self {
            viewport,
            base_layer: TileLayer::new(Basemap::default()),
            overlays: Vec::new(),
            popup: None,
            event_manager: EventManager::new(),
        }
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn set_view(&mut self, center: LatLng, zoom: f64) {
        let (old_center, old_zoom) = (self.viewport.center, self.viewport.zoom);
        self.viewport.set_zoom(zoom);
        self.viewport.set_center(center);
        self.view_changed(old_center, old_zoom);
    }

    /// Drags the view by a pixel offset
    pub fn pan(&mut self, delta: Point) {
        let (old_center, old_zoom) = (self.viewport.center, self.viewport.zoom);
        self.viewport.pan(delta);
        self.view_changed(old_center, old_zoom);
    }

    pub fn zoom_to(&mut self, zoom: f64, focus_point: Option<Point>) {
        let (old_center, old_zoom) = (self.viewport.center, self.viewport.zoom);
        self.viewport.zoom_to(zoom, focus_point);
        self.view_changed(old_center, old_zoom);
    }

    pub fn set_size(&mut self, size: Point) {
        let (old_center, old_zoom) = (self.viewport.center, self.viewport.zoom);
        self.viewport.set_size(size);
        self.view_changed(old_center, old_zoom);
    }

    /// Fits the view to `bounds` keeping `padding` pixels on every side
    pub fn fit_bounds(&mut self, bounds: &LatLngBounds, padding: f64) {
        let (old_center, old_zoom) = (self.viewport.center, self.viewport.zoom);
        self.viewport.fit_bounds(bounds, padding);
        self.view_changed(old_center, old_zoom);
    }

    fn view_changed(&mut self, old_center: LatLng, old_zoom: f64) {
        if self.viewport.center != old_center || self.viewport.zoom != old_zoom {
            self.event_manager.emit(MapEvent::ViewChanged {
                center: self.viewport.center,
                zoom: self.viewport.zoom,
            });
        }
    }

    /// Attaches an overlay on top of the others; attaching twice is a no-op
    pub fn add_layer(&mut self, kind: LayerKind) {
        if self.overlays.contains(&kind) {
            return;
        }
        self.overlays.push(kind);
        self.event_manager.emit(MapEvent::LayerAdd {
            layer_id: kind.id().to_string(),
        });
    }

    /// Detaches an overlay, returning whether it was attached
    pub fn remove_layer(&mut self, kind: LayerKind) -> bool {
        let Some(index) = self.overlays.iter().position(|k| *k == kind) else {
            return false;
        };
        self.overlays.remove(index);
        self.event_manager.emit(MapEvent::LayerRemove {
            layer_id: kind.id().to_string(),
        });
        true
    }

    pub fn has_layer(&self, kind: LayerKind) -> bool {
        self.overlays.contains(&kind)
    }

    /// Attached overlays, bottom to top
    pub fn attached(&self) -> &[LayerKind] {
        &self.overlays
    }

    pub fn base_layer(&self) -> &TileLayer {
        &self.base_layer
    }

    pub fn basemap(&self) -> Basemap {
        self.base_layer.basemap()
    }

    /// Switches the base layer; overlays stay attached
    pub fn set_basemap(&mut self, basemap: Basemap) {
        if self.base_layer.basemap() == basemap {
            return;
        }
        self.base_layer = TileLayer::new(basemap);
        self.event_manager.emit(MapEvent::BaseLayerChange {
            layer_id: basemap.id().to_string(),
        });
    }

    pub fn popup(&self) -> Option<&Popup> {
        self.popup.as_ref()
    }

    /// Replaces any open popup
    pub fn open_popup(&mut self, popup: Popup) {
        let position = popup.position;
        self.popup = Some(popup);
        self.event_manager.emit(MapEvent::PopupOpen { position });
    }

    pub fn close_popup(&mut self) {
        if self.popup.take().is_some() {
            self.event_manager.emit(MapEvent::PopupClose);
        }
    }

    pub fn on<F>(&mut self, event_type: &str, callback: F)
    where
        F: Fn(&MapEvent) + Send + Sync + 'static,
    {
        self.event_manager.on(event_type, callback);
    }

    pub fn process_events(&mut self) -> Vec<MapEvent> {
        self.event_manager.process_events()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map() -> Map {
        Map::new(LatLng::new(35.5, -79.0), 7.0, Point::new(800.0, 600.0))
    }

    #[test]
    fn test_set_view_emits_once() {
        let mut map = map();
        map.set_view(LatLng::new(36.0, -78.0), 9.0);
        map.set_view(LatLng::new(36.0, -78.0), 9.0);

        assert_eq!(map.viewport.center, LatLng::new(36.0, -78.0));
        assert_eq!(map.viewport.zoom, 9.0);
        assert_eq!(
            map.process_events(),
            vec![MapEvent::ViewChanged {
                center: LatLng::new(36.0, -78.0),
                zoom: 9.0
            }]
        );
    }

    #[test]
    fn test_overlays_keep_attach_order() {
        let mut map = map();
        map.add_layer(LayerKind::Counties);
        map.add_layer(LayerKind::Precincts);
        map.add_layer(LayerKind::Counties);

        assert_eq!(map.attached(), &[LayerKind::Counties, LayerKind::Precincts]);
        assert!(map.remove_layer(LayerKind::Counties));
        assert!(!map.remove_layer(LayerKind::Counties));
        assert!(!map.has_layer(LayerKind::Counties));
        assert!(map.has_layer(LayerKind::Precincts));

        let events = map.process_events();
        assert_eq!(
            events.iter().map(MapEvent::event_type).collect::<Vec<_>>(),
            vec!["layeradd", "layeradd", "layerremove"]
        );
    }

    #[test]
    fn test_basemap_switch_keeps_overlays() {
        let mut map = map();
        map.add_layer(LayerKind::House);
        map.set_basemap(Basemap::Satellite);

        assert_eq!(map.basemap(), Basemap::Satellite);
        assert_eq!(map.attached(), &[LayerKind::House]);
    }

    #[test]
    fn test_popup_replaces_previous() {
        let mut map = map();
        map.open_popup(Popup::new(LatLng::new(35.0, -79.0), "a".to_string(), 320.0));
        map.open_popup(Popup::new(LatLng::new(36.0, -78.0), "b".to_string(), 320.0));

        let popup = map.popup().unwrap();
        assert_eq!(popup.content, "b");

        map.close_popup();
        map.close_popup();
        assert!(map.popup().is_none());
        assert_eq!(
            map.process_events().last(),
            Some(&MapEvent::PopupClose)
        );
    }

    #[test]
    fn test_fit_bounds_contains_target() {
        let mut map = map();
        let bounds = LatLngBounds::from_coords(33.8, -84.3, 36.6, -75.5);
        map.fit_bounds(&bounds, 20.0);

        let view = map.viewport().bounds();
        assert!(view.contains(&bounds.south_west));
        assert!(view.contains(&bounds.north_east));
    }
}
