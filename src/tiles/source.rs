use crate::{
    core::{
        geo::{LatLng, LatLngBounds, Point, TileCoord, MAX_LATITUDE},
        viewport::{Viewport, TILE_SIZE},
    },
    layers::base::{LayerProperties, LayerTrait, LayerType},
};
use serde::{Deserialize, Serialize};

/// Trait representing anything that can produce tile URLs for a given coordinate.
pub trait TileSource: Send + Sync {
    /// Build a URL for the requested `coord`.
    fn url(&self, coord: TileCoord) -> String;

    /// Deepest zoom level the server provides
    fn max_zoom(&self) -> u8;

    /// Attribution text that must be shown with the tiles
    fn attribution(&self) -> &str;
}

/// XYZ tile server described by a `{s}`/`{z}`/`{x}`/`{y}` URL template
#[derive(Debug, Clone, PartialEq)]
pub struct UrlTemplateSource {
    template: String,
    subdomains: Vec<&'static str>,
    max_zoom: u8,
    attribution: String,
}

impl UrlTemplateSource {
    pub fn new(template: &str, subdomains: Vec<&'static str>, max_zoom: u8, attribution: &str) -> Self {
        Self {
            template: template.to_string(),
            subdomains,
            max_zoom,
            attribution: attribution.to_string(),
        }
    }
}

impl TileSource for UrlTemplateSource {
    fn url(&self, coord: TileCoord) -> String {
        let mut url = self
            .template
            .replace("{z}", &coord.z.to_string())
            .replace("{x}", &coord.x.to_string())
            .replace("{y}", &coord.y.to_string());

        if !self.subdomains.is_empty() {
            let idx = ((coord.x + coord.y) % self.subdomains.len() as u32) as usize;
            url = url.replace("{s}", self.subdomains[idx]);
        }
        url
    }

    fn max_zoom(&self) -> u8 {
        self.max_zoom
    }

    fn attribution(&self) -> &str {
        &self.attribution
    }
}

/// The selectable base maps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Basemap {
    #[default]
    OpenStreetMap,
    Satellite,
}

impl Basemap {
    pub const ALL: [Basemap; 2] = [Basemap::OpenStreetMap, Basemap::Satellite];

    pub fn id(&self) -> &'static str {
        match self {
            Basemap::OpenStreetMap => "osm",
            Basemap::Satellite => "satellite",
        }
    }

    /// Name shown in the layer control
    pub fn name(&self) -> &'static str {
        match self {
            Basemap::OpenStreetMap => "OpenStreetMap",
            Basemap::Satellite => "Satellite",
        }
    }

    pub fn source(&self) -> UrlTemplateSource {
        match self {
            Basemap::OpenStreetMap => UrlTemplateSource::new(
                "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png",
                vec!["a", "b", "c"],
                19,
                "© OpenStreetMap",
            ),
            Basemap::Satellite => UrlTemplateSource::new(
                "https://server.arcgisonline.com/ArcGIS/rest/services/World_Imagery/MapServer/tile/{z}/{y}/{x}",
                Vec::new(),
                19,
                "Tiles © Esri, Maxar, Earthstar Geographics",
            ),
        }
    }
}

/// Base layer drawing one [`Basemap`]
#[derive(Debug, Clone)]
pub struct TileLayer {
    properties: LayerProperties,
    basemap: Basemap,
    source: UrlTemplateSource,
}

impl TileLayer {
    pub fn new(basemap: Basemap) -> Self {
        Self {
            properties: LayerProperties::new(
                basemap.id().to_string(),
                basemap.name().to_string(),
                LayerType::Tile,
            ),
            basemap,
            source: basemap.source(),
        }
    }

    pub fn basemap(&self) -> Basemap {
        self.basemap
    }

    pub fn source(&self) -> &UrlTemplateSource {
        &self.source
    }

    /// Tile zoom used for a viewport zoom
    pub fn tile_zoom(&self, viewport: &Viewport) -> u8 {
        (viewport.zoom.round().max(0.0) as u8).min(self.source.max_zoom())
    }

    /// Tiles covering the viewport, each paired with its top-left screen position
    pub fn visible_tiles(&self, viewport: &Viewport) -> Vec<(TileCoord, Point)> {
        let z = self.tile_zoom(viewport);
        let bounds = viewport.bounds();
        let nw = TileCoord::from_lat_lng(&bounds.north_west(), z);
        let se = TileCoord::from_lat_lng(&bounds.south_east(), z);

        let mut tiles = Vec::new();
        for y in nw.y..=se.y {
            for x in nw.x..=se.x {
                let coord = TileCoord::new(x, y, z);
                if !coord.is_valid() {
                    continue;
                }
                let projected = Point::new(x as f64 * TILE_SIZE, y as f64 * TILE_SIZE);
                let corner = viewport.unproject(&projected, Some(z as f64));
                tiles.push((coord, viewport.lat_lng_to_pixel(&corner)));
            }
        }
        tiles
    }

    /// On-screen tile edge length at the viewport's fractional zoom
    pub fn tile_screen_size(&self, viewport: &Viewport) -> f64 {
        TILE_SIZE * 2_f64.powf(viewport.zoom - self.tile_zoom(viewport) as f64)
    }
}

impl LayerTrait for TileLayer {
    fn properties(&self) -> &LayerProperties {
        &self.properties
    }

    fn bounds(&self) -> Option<LatLngBounds> {
        Some(LatLngBounds::new(
            LatLng::new(-MAX_LATITUDE, -180.0),
            LatLng::new(MAX_LATITUDE, 180.0),
        ))
    }
}
