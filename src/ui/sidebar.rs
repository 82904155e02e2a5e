//! Sidebar controller
//!
//! Each of the five layer kinds has a visibility checkbox (`lyr-<kind>`) and
//! a fit button (`fit-<kind>`). Every element id is registered against a
//! plain handler function; [`SidebarController::dispatch`] looks the id up
//! and runs the handler against the viewer.

use crate::{
    data::{geojson::GeoJson, source::FeatureSource},
    layers::kind::LayerKind,
    prelude::HashMap,
    ui::events::UiEvent,
    viewer::Viewer,
    Result,
};

/// Element ids of one layer's controls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SidebarBinding {
    pub kind: LayerKind,
    pub toggle_id: &'static str,
    pub fit_id: &'static str,
}

pub const BINDINGS: [SidebarBinding; 5] = [
    SidebarBinding {
        kind: LayerKind::Counties,
        toggle_id: "lyr-counties",
        fit_id: "fit-counties",
    },
    SidebarBinding {
        kind: LayerKind::Precincts,
        toggle_id: "lyr-precincts",
        fit_id: "fit-precincts",
    },
    SidebarBinding {
        kind: LayerKind::House,
        toggle_id: "lyr-house",
        fit_id: "fit-house",
    },
    SidebarBinding {
        kind: LayerKind::Senate,
        toggle_id: "lyr-senate",
        fit_id: "fit-senate",
    },
    SidebarBinding {
        kind: LayerKind::Congress,
        toggle_id: "lyr-congress",
        fit_id: "fit-congress",
    },
];

impl SidebarBinding {
    pub fn for_kind(kind: LayerKind) -> &'static SidebarBinding {
        &BINDINGS[LayerKind::ALL
            .iter()
            .position(|k| *k == kind)
            .unwrap_or_default()]
    }
}

/// What a sidebar event did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// A load has begun on the viewer; the caller fetches the layer and
    /// hands the result to [`SidebarController::complete`]
    Fetch(LayerKind),
    /// A loaded overlay was attached
    Shown(LayerKind),
    /// An overlay was detached but kept
    Hidden(LayerKind),
    /// The view was fitted to a layer
    Fitted(LayerKind),
    /// Nothing to do
    Ignored,
}

type ToggleHandler = fn(&mut Viewer, LayerKind, bool) -> Dispatch;
type ButtonHandler = fn(&mut Viewer, LayerKind) -> Dispatch;

#[derive(Clone, Copy)]
enum Handler {
    Toggle(ToggleHandler),
    Button(ButtonHandler),
}

fn on_layer_toggle(viewer: &mut Viewer, kind: LayerKind, checked: bool) -> Dispatch {
    if !checked {
        return if viewer.set_layer_visible(kind, false) {
            Dispatch::Hidden(kind)
        } else {
            Dispatch::Ignored
        };
    }

    if viewer.set_layer_visible(kind, true) {
        Dispatch::Shown(kind)
    } else if viewer.is_loading_kind(kind) {
        // Already on its way; it is attached when it lands
        Dispatch::Ignored
    } else {
        viewer.begin_load(kind);
        Dispatch::Fetch(kind)
    }
}

fn on_fit_click(viewer: &mut Viewer, kind: LayerKind) -> Dispatch {
    if viewer.fit_layer(kind) {
        Dispatch::Fitted(kind)
    } else {
        Dispatch::Ignored
    }
}

pub struct SidebarController {
    handlers: HashMap<&'static str, (Handler, LayerKind)>,
    checked: HashMap<LayerKind, bool>,
}

impl SidebarController {
    /// Registers the five bindings; the startup layers begin checked
    pub fn new(default_layers: &[LayerKind]) -> Self {
        let mut handlers = HashMap::default();
        for binding in &BINDINGS {
            handlers.insert(
                binding.toggle_id,
                (Handler::Toggle(on_layer_toggle), binding.kind),
            );
            handlers.insert(binding.fit_id, (Handler::Button(on_fit_click), binding.kind));
        }

        let checked = LayerKind::ALL
            .into_iter()
            .map(|kind| (kind, default_layers.contains(&kind)))
            .collect();

        Self { handlers, checked }
    }

    pub fn bindings(&self) -> &'static [SidebarBinding] {
        &BINDINGS
    }

    pub fn is_checked(&self, kind: LayerKind) -> bool {
        self.checked.get(&kind).copied().unwrap_or(false)
    }

    /// Runs the handler registered for the event's element id
    pub fn dispatch(&mut self, viewer: &mut Viewer, event: &UiEvent) -> Dispatch {
        let Some(element_id) = event.element_id() else {
            return Dispatch::Ignored;
        };
        let Some(&(handler, kind)) = self.handlers.get(element_id) else {
            log::debug!("no sidebar handler for #{}", element_id);
            return Dispatch::Ignored;
        };

        match (handler, event) {
            (Handler::Toggle(handler), UiEvent::ToggleChanged { checked, .. }) => {
                self.checked.insert(kind, *checked);
                handler(viewer, kind, *checked)
            }
            (Handler::Button(handler), UiEvent::ButtonClicked { .. }) => handler(viewer, kind),
            _ => {
                log::debug!("#{} does not handle {:?}", element_id, event);
                Dispatch::Ignored
            }
        }
    }

    /// Hands a fetched layer to the viewer.
    ///
    /// A failed load unchecks the layer's toggle. A layer whose toggle was
    /// unchecked while it was loading is installed but left hidden.
    pub fn complete(
        &mut self,
        viewer: &mut Viewer,
        kind: LayerKind,
        result: Result<GeoJson>,
    ) -> Result<()> {
        if let Err(e) = viewer.finish_load(kind, result) {
            self.checked.insert(kind, false);
            return Err(e);
        }

        if !self.is_checked(kind) {
            viewer.set_layer_visible(kind, false);
        }
        Ok(())
    }

    /// Dispatches `event` and, when it needs one, performs the fetch
    pub async fn handle(
        &mut self,
        viewer: &mut Viewer,
        source: &dyn FeatureSource,
        event: &UiEvent,
    ) -> Result<Dispatch> {
        let dispatch = self.dispatch(viewer, event);
        if let Dispatch::Fetch(kind) = dispatch {
            let result = source.fetch(kind).await;
            self.complete(viewer, kind, result)?;
        }
        Ok(dispatch)
    }
}

impl std::fmt::Debug for SidebarController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SidebarController")
            .field("handlers", &self.handlers.len())
            .field("checked", &self.checked)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::geo::LatLng;

    fn county_data() -> GeoJson {
        GeoJson::from_str(
            r#"{"type": "FeatureCollection", "features": [{
                "type": "Feature",
                "properties": {"name": "Wake", "county_id": "92"},
                "geometry": {"type": "Point", "coordinates": [-78.6, 35.8]}
            }]}"#,
        )
        .unwrap()
    }

    #[test]
    fn test_bindings_cover_every_kind() {
        for kind in LayerKind::ALL {
            let binding = SidebarBinding::for_kind(kind);
            assert_eq!(binding.kind, kind);
            assert_eq!(binding.toggle_id, format!("lyr-{}", kind.id()));
            assert_eq!(binding.fit_id, format!("fit-{}", kind.id()));
        }
    }

    #[test]
    fn test_toggle_on_unloaded_requests_fetch_once() {
        let mut viewer = Viewer::default();
        let mut sidebar = SidebarController::new(&[]);

        let event = UiEvent::toggle("lyr-house", true);
        assert_eq!(
            sidebar.dispatch(&mut viewer, &event),
            Dispatch::Fetch(LayerKind::House)
        );
        assert!(viewer.is_loading());
        assert_eq!(sidebar.dispatch(&mut viewer, &event), Dispatch::Ignored);
        assert_eq!(viewer.pending_loads(), 1);
    }

    #[test]
    fn test_toggle_off_while_loading_leaves_layer_hidden() {
        let mut viewer = Viewer::default();
        let mut sidebar = SidebarController::new(&[]);

        sidebar.dispatch(&mut viewer, &UiEvent::toggle("lyr-counties", true));
        sidebar.dispatch(&mut viewer, &UiEvent::toggle("lyr-counties", false));
        sidebar
            .complete(&mut viewer, LayerKind::Counties, Ok(county_data()))
            .unwrap();

        assert!(viewer.registry().contains(LayerKind::Counties));
        assert!(!viewer.map().has_layer(LayerKind::Counties));
    }

    #[test]
    fn test_fit_before_load_is_ignored() {
        let mut viewer = Viewer::default();
        let mut sidebar = SidebarController::new(&[]);
        let center = viewer.map().viewport().center;

        assert_eq!(
            sidebar.dispatch(&mut viewer, &UiEvent::click("fit-senate")),
            Dispatch::Ignored
        );
        assert_eq!(viewer.map().viewport().center, center);
    }

    #[test]
    fn test_mismatched_and_unknown_events_are_ignored() {
        let mut viewer = Viewer::default();
        let mut sidebar = SidebarController::new(&[]);

        assert_eq!(
            sidebar.dispatch(&mut viewer, &UiEvent::click("lyr-house")),
            Dispatch::Ignored
        );
        assert_eq!(
            sidebar.dispatch(&mut viewer, &UiEvent::toggle("lyr-wards", true)),
            Dispatch::Ignored
        );
        assert_eq!(
            sidebar.dispatch(
                &mut viewer,
                &UiEvent::MapClicked {
                    position: LatLng::new(35.0, -79.0)
                }
            ),
            Dispatch::Ignored
        );
    }

    #[test]
    fn test_failed_load_unchecks_toggle() {
        let mut viewer = Viewer::default();
        let mut sidebar = SidebarController::new(&[]);

        sidebar.dispatch(&mut viewer, &UiEvent::toggle("lyr-senate", true));
        assert!(sidebar.is_checked(LayerKind::Senate));

        let result = sidebar.complete(&mut viewer, LayerKind::Senate, Err("HTTP 404".into()));
        assert!(result.is_err());
        assert!(!sidebar.is_checked(LayerKind::Senate));
        assert!(!viewer.is_loading());
    }

    #[test]
    fn test_default_layers_start_checked() {
        let sidebar = SidebarController::new(&[LayerKind::Counties, LayerKind::Precincts]);
        assert!(sidebar.is_checked(LayerKind::Counties));
        assert!(sidebar.is_checked(LayerKind::Precincts));
        assert!(!sidebar.is_checked(LayerKind::House));
    }
}
