//! Painting the viewer into an egui rect

use boundary_map::{
    core::{config::TileLoadingConfig, geo::LatLng, viewport::Viewport},
    data::geojson::GeoJsonGeometry,
    layers::style::{PathStyle, SerializableColor},
    tiles::{Basemap, TileCache, TileKey, TileLayer, TileLoader, TilePayload},
    Viewer,
};
use egui::{Color32, ColorImage, Painter, Pos2, Rect, Shape, Stroke, TextureHandle, Vec2};
use fxhash::{FxHashMap, FxHashSet};
use std::sync::mpsc::{self, Receiver};

/// Radius of point features in pixels
const POINT_RADIUS: f32 = 4.0;

/// Downloaded tiles and the textures made from them
pub struct TileTextures {
    cache: TileCache,
    loader: TileLoader,
    rx: Receiver<TilePayload>,
    textures: FxHashMap<TileKey, TextureHandle>,
    requested: FxHashSet<TileKey>,
    failed: FailedTiles,
    max_textures: usize,
}

/// Tiles that could not be fetched or decoded.
///
/// Forgotten whenever the basemap or tile zoom changes, so they are tried
/// again the next time they come into view.
#[derive(Debug, Default)]
struct FailedTiles {
    keys: FxHashSet<TileKey>,
    shown: Option<(Basemap, u8)>,
}

impl FailedTiles {
    fn show(&mut self, basemap: Basemap, zoom: u8) {
        if self.shown != Some((basemap, zoom)) {
            self.keys.clear();
            self.shown = Some((basemap, zoom));
        }
    }

    fn insert(&mut self, key: TileKey) {
        self.keys.insert(key);
    }

    fn contains(&self, key: &TileKey) -> bool {
        self.keys.contains(key)
    }
}

impl TileTextures {
    pub fn new(config: &TileLoadingConfig) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            cache: TileCache::new(config.cache_size),
            loader: TileLoader::new(tx, config.clone()),
            rx,
            textures: FxHashMap::default(),
            requested: FxHashSet::default(),
            failed: FailedTiles::default(),
            max_textures: config.cache_size.max(64),
        }
    }

    /// Moves finished downloads into the cache
    pub fn poll(&mut self) {
        while let Ok(payload) = self.rx.try_recv() {
            self.requested.remove(&payload.key);
            match payload.data {
                Some(data) => self.cache.insert(payload.key, data),
                None => {
                    self.failed.insert(payload.key);
                }
            }
        }
    }

    pub fn has_pending(&self) -> bool {
        !self.requested.is_empty()
    }

    pub fn paint(&mut self, ctx: &egui::Context, painter: &Painter, rect: Rect, layer: &TileLayer, viewport: &Viewport) {
        if self.textures.len() > self.max_textures {
            self.textures.clear();
        }

        self.failed.show(layer.basemap(), layer.tile_zoom(viewport));

        let size = layer.tile_screen_size(viewport) as f32;
        for (coord, corner) in layer.visible_tiles(viewport) {
            let key = TileKey::new(layer.basemap(), coord);
            let Some(texture) = self.texture(ctx, layer, key) else {
                continue;
            };

            let min = rect.min + Vec2::new(corner.x as f32, corner.y as f32);
            let tile_rect = Rect::from_min_size(min, Vec2::splat(size));
            painter.image(
                texture.id(),
                tile_rect,
                Rect::from_min_max(Pos2::ZERO, Pos2::new(1.0, 1.0)),
                Color32::WHITE,
            );
        }
    }

    fn texture(&mut self, ctx: &egui::Context, layer: &TileLayer, key: TileKey) -> Option<TextureHandle> {
        if let Some(texture) = self.textures.get(&key) {
            return Some(texture.clone());
        }

        let Some(bytes) = self.cache.get(&key) else {
            if !self.requested.contains(&key) && !self.failed.contains(&key) {
                self.requested.insert(key);
                self.loader.start_download(layer.source(), key);
            }
            return None;
        };

        let image = match decode_image(&bytes) {
            Some(image) => image,
            None => {
                log::warn!("could not decode tile {:?}", key);
                self.failed.insert(key);
                return None;
            }
        };
        let texture = ctx.load_texture(
            format!("tile_{}_{}_{}_{}", key.basemap.id(), key.coord.z, key.coord.x, key.coord.y),
            image,
            egui::TextureOptions::LINEAR,
        );
        self.textures.insert(key, texture.clone());
        Some(texture)
    }
}

fn decode_image(bytes: &[u8]) -> Option<ColorImage> {
    let img = image::load_from_memory(bytes).ok()?;
    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();
    Some(ColorImage::from_rgba_unmultiplied(
        [width as usize, height as usize],
        rgba.as_raw(),
    ))
}

fn color(c: SerializableColor, opacity: f32) -> Color32 {
    let c = c.with_opacity(opacity);
    Color32::from_rgba_unmultiplied(c.r, c.g, c.b, c.a)
}

/// Draws the attached overlays bottom to top.
///
/// Outlines only: egui fills convex paths, and district polygons are not.
pub fn paint_overlays(painter: &Painter, rect: Rect, viewer: &Viewer) {
    let viewport = viewer.map().viewport();
    let view = viewport.bounds();
    let to_screen = |p: &LatLng| {
        let px = viewport.lat_lng_to_pixel(p);
        rect.min + Vec2::new(px.x as f32, px.y as f32)
    };

    for overlay in viewer.visible_overlays() {
        for (index, feature) in overlay.features().iter().enumerate() {
            let Some(geometry) = &feature.geometry else {
                continue;
            };
            if !overlay
                .feature_bounds(index)
                .is_some_and(|bounds| bounds.intersects(&view))
            {
                continue;
            }

            let style = overlay.feature_style(index);
            paint_geometry(painter, geometry, &style, &to_screen);
        }
    }
}

fn paint_geometry(
    painter: &Painter,
    geometry: &GeoJsonGeometry,
    style: &PathStyle,
    to_screen: &dyn Fn(&LatLng) -> Pos2,
) {
    let stroke = Stroke::new(style.weight, color(style.color, style.opacity));
    let path = |positions: &[boundary_map::data::geojson::Position]| -> Vec<Pos2> {
        positions.iter().map(|p| to_screen(&p.to_lat_lng())).collect()
    };
    let line = |points: Vec<Pos2>| {
        if style.is_dashed() && style.dash_array.len() >= 2 {
            painter.extend(Shape::dashed_line(
                &points,
                stroke,
                style.dash_array[0],
                style.dash_array[1],
            ));
        } else {
            painter.add(Shape::line(points, stroke));
        }
    };

    match geometry {
        GeoJsonGeometry::Point { coordinates } => {
            painter.circle(
                to_screen(&coordinates.to_lat_lng()),
                POINT_RADIUS,
                color(style.fill_color, style.fill_opacity),
                stroke,
            );
        }
        GeoJsonGeometry::MultiPoint { coordinates } => {
            for position in coordinates {
                paint_geometry(
                    painter,
                    &GeoJsonGeometry::Point { coordinates: *position },
                    style,
                    to_screen,
                );
            }
        }
        GeoJsonGeometry::LineString { coordinates } => line(path(coordinates)),
        GeoJsonGeometry::MultiLineString { coordinates } => {
            coordinates.iter().for_each(|l| line(path(l)));
        }
        GeoJsonGeometry::Polygon { coordinates } => {
            coordinates.iter().for_each(|ring| line(path(ring)));
        }
        GeoJsonGeometry::MultiPolygon { coordinates } => coordinates
            .iter()
            .flatten()
            .for_each(|ring| line(path(ring))),
        GeoJsonGeometry::GeometryCollection { geometries } => {
            for geometry in geometries {
                paint_geometry(painter, geometry, style, to_screen);
            }
        }
    }
}
