use crate::core::geo::LatLngBounds;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayerType {
    Tile,
    Overlay,
}

impl std::fmt::Display for LayerType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LayerType::Tile => write!(f, "tile"),
            LayerType::Overlay => write!(f, "overlay"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LayerProperties {
    pub id: String,
    pub name: String,
    pub layer_type: LayerType,
}

impl LayerProperties {
    pub fn new(id: String, name: String, layer_type: LayerType) -> Self {
        Self {
            id,
            name,
            layer_type,
        }
    }
}

/// Common surface of everything the map can draw
pub trait LayerTrait {
    fn properties(&self) -> &LayerProperties;

    fn id(&self) -> &str {
        &self.properties().id
    }

    fn name(&self) -> &str {
        &self.properties().name
    }

    fn layer_type(&self) -> LayerType {
        self.properties().layer_type
    }

    /// Geographic extent, `None` when the layer has nothing to fit to
    fn bounds(&self) -> Option<LatLngBounds>;
}
