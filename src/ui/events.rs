use crate::{
    core::geo::{LatLng, Point},
    prelude::HashMap,
    tiles::Basemap,
};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Events a front end feeds into the viewer.
///
/// Sidebar controls are addressed by element id (`lyr-counties`,
/// `fit-counties`, ...), map pointer events by geographic position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum UiEvent {
    /// A checkbox changed state
    ToggleChanged { element_id: String, checked: bool },
    /// A button was pressed
    ButtonClicked { element_id: String },
    /// Pointer moved over the map
    PointerMoved { position: LatLng },
    /// Pointer left the map
    PointerLeft,
    /// Primary click on the map
    MapClicked { position: LatLng },
    /// Base layer chosen in the layer control
    BasemapSelected { basemap: Basemap },
    /// Drag by a pixel offset
    Panned { delta: Point },
    /// Zoom to a level, optionally keeping a screen point fixed
    Zoomed { zoom: f64, focus: Option<Point> },
    /// Map container resized
    Resized { size: Point },
}

impl UiEvent {
    pub fn toggle(element_id: &str, checked: bool) -> Self {
        UiEvent::ToggleChanged {
            element_id: element_id.to_string(),
            checked,
        }
    }

    pub fn click(element_id: &str) -> Self {
        UiEvent::ButtonClicked {
            element_id: element_id.to_string(),
        }
    }

    /// Element id for sidebar control events
    pub fn element_id(&self) -> Option<&str> {
        match self {
            UiEvent::ToggleChanged { element_id, .. } | UiEvent::ButtonClicked { element_id } => {
                Some(element_id.as_str())
            }
            _ => None,
        }
    }

    /// Checks if this event targets the map rather than a sidebar control
    pub fn is_map_event(&self) -> bool {
        self.element_id().is_none()
    }
}

/// Notifications emitted by the map surface
#[derive(Debug, Clone, PartialEq)]
pub enum MapEvent {
    /// Map view has changed (center, zoom, or size)
    ViewChanged { center: LatLng, zoom: f64 },
    /// Overlay was attached to the map
    LayerAdd { layer_id: String },
    /// Overlay was detached from the map
    LayerRemove { layer_id: String },
    /// Base layer was changed
    BaseLayerChange { layer_id: String },
    /// Popup opened at a position
    PopupOpen { position: LatLng },
    /// Popup closed
    PopupClose,
}

impl MapEvent {
    /// Name listeners register under
    pub fn event_type(&self) -> &'static str {
        match self {
            MapEvent::ViewChanged { .. } => "viewchanged",
            MapEvent::LayerAdd { .. } => "layeradd",
            MapEvent::LayerRemove { .. } => "layerremove",
            MapEvent::BaseLayerChange { .. } => "baselayerchange",
            MapEvent::PopupOpen { .. } => "popupopen",
            MapEvent::PopupClose => "popupclose",
        }
    }
}

/// Event listener callback type
pub type EventCallback = Box<dyn Fn(&MapEvent) + Send + Sync>;

/// Queues map events and dispatches them to registered listeners
#[derive(Default)]
pub struct EventManager {
    listeners: HashMap<String, Vec<EventCallback>>,
    event_queue: VecDeque<MapEvent>,
}

impl EventManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an event listener
    pub fn on<F>(&mut self, event_type: &str, callback: F)
    where
        F: Fn(&MapEvent) + Send + Sync + 'static,
    {
        self.listeners
            .entry(event_type.to_string())
            .or_default()
            .push(Box::new(callback));
    }

    /// Emit an event to the queue
    pub fn emit(&mut self, event: MapEvent) {
        log::debug!("map event: {:?}", event);
        self.event_queue.push_back(event);
    }

    /// Drains the queue, invoking listeners, and returns the drained events
    pub fn process_events(&mut self) -> Vec<MapEvent> {
        let events: Vec<_> = self.event_queue.drain(..).collect();

        for event in &events {
            if let Some(callbacks) = self.listeners.get(event.event_type()) {
                for callback in callbacks {
                    callback(event);
                }
            }
        }

        events
    }

    pub fn pending(&self) -> usize {
        self.event_queue.len()
    }
}

impl std::fmt::Debug for EventManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventManager")
            .field("listeners", &self.listeners.len())
            .field("event_queue", &self.event_queue)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };

    #[test]
    fn test_element_ids() {
        assert_eq!(UiEvent::toggle("lyr-house", true).element_id(), Some("lyr-house"));
        assert_eq!(UiEvent::click("fit-house").element_id(), Some("fit-house"));
        assert!(UiEvent::PointerLeft.is_map_event());
        assert!(!UiEvent::click("fit-house").is_map_event());
    }

    #[test]
    fn test_listeners_receive_matching_events() {
        let mut events = EventManager::new();
        let adds = Arc::new(AtomicUsize::new(0));
        let counter = adds.clone();
        events.on("layeradd", move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        events.emit(MapEvent::LayerAdd {
            layer_id: "counties".to_string(),
        });
        events.emit(MapEvent::LayerRemove {
            layer_id: "counties".to_string(),
        });
        assert_eq!(events.pending(), 2);

        let drained = events.process_events();
        assert_eq!(drained.len(), 2);
        assert_eq!(adds.load(Ordering::SeqCst), 1);
        assert_eq!(events.pending(), 0);
    }
}
