use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// The fixed set of boundary layers the viewer knows about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerKind {
    Counties,
    Precincts,
    House,
    Senate,
    Congress,
}

impl LayerKind {
    /// All kinds in sidebar order
    pub const ALL: [LayerKind; 5] = [
        LayerKind::Counties,
        LayerKind::Precincts,
        LayerKind::House,
        LayerKind::Senate,
        LayerKind::Congress,
    ];

    /// Stable identifier, also used as the map layer id
    pub fn id(&self) -> &'static str {
        match self {
            LayerKind::Counties => "counties",
            LayerKind::Precincts => "precincts",
            LayerKind::House => "house",
            LayerKind::Senate => "senate",
            LayerKind::Congress => "congress",
        }
    }

    /// Human readable label for layer lists
    pub fn label(&self) -> &'static str {
        match self {
            LayerKind::Counties => "Counties",
            LayerKind::Precincts => "Precincts",
            LayerKind::House => "State House",
            LayerKind::Senate => "State Senate",
            LayerKind::Congress => "US Congress",
        }
    }

    /// File name of the upstream GeoJSON document
    pub fn file_name(&self) -> &'static str {
        match self {
            LayerKind::Counties => "counties_min.geojson",
            LayerKind::Precincts => "precincts_min.geojson",
            LayerKind::House => "state_house_min.geojson",
            LayerKind::Senate => "state_senate_min.geojson",
            LayerKind::Congress => "us_congress_min.geojson",
        }
    }

    /// District layers share the dashed style and the generic presenter template
    pub fn is_district(&self) -> bool {
        matches!(
            self,
            LayerKind::House | LayerKind::Senate | LayerKind::Congress
        )
    }
}

impl std::fmt::Display for LayerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for LayerKind {
    type Err = crate::MapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LayerKind::ALL
            .into_iter()
            .find(|kind| kind.id() == s)
            .ok_or_else(|| crate::MapError::Layer(format!("unknown layer kind '{}'", s)))
    }
}
