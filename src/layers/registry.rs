use crate::{
    core::geo::LatLngBounds,
    layers::{base::LayerTrait, kind::LayerKind, overlay::Overlay},
    prelude::HashMap,
};

/// Registry slot for one layer kind
#[derive(Debug, Clone)]
pub struct RegistryEntry {
    overlay: Overlay,
    /// How many times this kind has been loaded, starting at 1
    loads: u32,
}

impl RegistryEntry {
    pub fn overlay(&self) -> &Overlay {
        &self.overlay
    }

    pub fn loads(&self) -> u32 {
        self.loads
    }

    /// Extent the fit action zooms to; `None` for a collection without positions
    pub fn fit_bounds(&self) -> Option<LatLngBounds> {
        self.overlay.bounds().filter(LatLngBounds::is_valid)
    }
}

/// Owns the loaded overlay of each layer kind.
///
/// Holds at most one overlay per kind; inserting a new one for a kind that is
/// already registered replaces and returns the old one.
#[derive(Debug, Default)]
pub struct LayerRegistry {
    entries: HashMap<LayerKind, RegistryEntry>,
}

impl LayerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `overlay` under its kind, returning the overlay it replaced
    pub fn insert(&mut self, overlay: Overlay) -> Option<Overlay> {
        let kind = overlay.kind();
        let loads = self.entries.get(&kind).map_or(0, |entry| entry.loads) + 1;

        self.entries
            .insert(kind, RegistryEntry { overlay, loads })
            .map(|previous| previous.overlay)
    }

    pub fn get(&self, kind: LayerKind) -> Option<&RegistryEntry> {
        self.entries.get(&kind)
    }

    pub fn overlay(&self, kind: LayerKind) -> Option<&Overlay> {
        self.entries.get(&kind).map(|entry| &entry.overlay)
    }

    pub fn overlay_mut(&mut self, kind: LayerKind) -> Option<&mut Overlay> {
        self.entries.get_mut(&kind).map(|entry| &mut entry.overlay)
    }

    /// Whether `kind` has been loaded at least once
    pub fn contains(&self, kind: LayerKind) -> bool {
        self.entries.contains_key(&kind)
    }

    /// Fit target for `kind`, available only once the kind has loaded
    pub fn fit_bounds(&self, kind: LayerKind) -> Option<LatLngBounds> {
        self.entries.get(&kind).and_then(RegistryEntry::fit_bounds)
    }

    /// Loaded kinds in sidebar order
    pub fn kinds(&self) -> Vec<LayerKind> {
        LayerKind::ALL
            .into_iter()
            .filter(|kind| self.entries.contains_key(kind))
            .collect()
    }

    /// Gets the number of registered kinds
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
