use crate::core::geo::{LatLng, LatLngBounds, Point};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Web Mercator sphere radius (EPSG:3857)
const EARTH_RADIUS: f64 = 6378137.0;

/// Size of one tile in pixels at every zoom level
pub const TILE_SIZE: f64 = 256.0;

/// Manages the current view of the map: center, zoom, and screen dimensions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    /// The center of the map view in geographical coordinates
    pub center: LatLng,
    /// The current zoom level
    pub zoom: f64,
    /// The size of the viewport in pixels
    pub size: Point,
    /// The minimum allowed zoom level
    pub min_zoom: f64,
    /// The maximum allowed zoom level
    pub max_zoom: f64,
    /// Pixel origin for coordinate transformations (to avoid precision issues)
    pixel_origin: Option<Point>,
}

impl Viewport {
    /// Creates a new viewport
    pub fn new(center: LatLng, zoom: f64, size: Point) -> Self {
        Self {
            center,
            zoom: zoom.clamp(0.0, 19.0),
            size,
            min_zoom: 0.0,
            max_zoom: 19.0,
            pixel_origin: None,
        }
    }

    /// Sets the center of the viewport, clamped to the projectable world
    pub fn set_center(&mut self, center: LatLng) {
        self.center = Self::clamp_center(center);
        self.update_pixel_origin();
    }

    /// Sets the zoom level, clamping to valid range
    pub fn set_zoom(&mut self, zoom: f64) {
        self.zoom = zoom.clamp(self.min_zoom, self.max_zoom);
        self.update_pixel_origin();
    }

    /// Sets the viewport size
    pub fn set_size(&mut self, size: Point) {
        self.size = size;
        self.update_pixel_origin();
    }

    /// Sets the zoom limits
    pub fn set_zoom_limits(&mut self, min_zoom: f64, max_zoom: f64) {
        self.min_zoom = min_zoom;
        self.max_zoom = max_zoom;
        self.zoom = self.zoom.clamp(min_zoom, max_zoom);
        self.update_pixel_origin();
    }

    /// Gets the scale factor for the current zoom level
    pub fn scale(&self) -> f64 {
        2_f64.powf(self.zoom)
    }

    /// Projects a LatLng to world pixel coordinates at the given zoom level
    pub fn project(&self, lat_lng: &LatLng, zoom: Option<f64>) -> Point {
        let z = zoom.unwrap_or(self.zoom);
        let scale = TILE_SIZE * 2_f64.powf(z);

        let lat = LatLng::clamp_lat(lat_lng.lat);
        let x = lat_lng.lng.to_radians() * EARTH_RADIUS;
        let y = ((PI / 4.0 + lat.to_radians() / 2.0).tan().ln()) * EARTH_RADIUS;

        let world = 2.0 * PI * EARTH_RADIUS;
        let pixel_x = (x + PI * EARTH_RADIUS) / world * scale;
        let pixel_y = (-y + PI * EARTH_RADIUS) / world * scale;

        Point::new(pixel_x, pixel_y)
    }

    /// Unprojects world pixel coordinates back to LatLng at the given zoom level
    pub fn unproject(&self, pixel: &Point, zoom: Option<f64>) -> LatLng {
        let z = zoom.unwrap_or(self.zoom);
        let scale = TILE_SIZE * 2_f64.powf(z);

        let world = 2.0 * PI * EARTH_RADIUS;
        let x = (pixel.x / scale) * world - PI * EARTH_RADIUS;
        let y = PI * EARTH_RADIUS - (pixel.y / scale) * world;

        let lng = (x / EARTH_RADIUS).to_degrees();
        let lat = (2.0 * (y / EARTH_RADIUS).exp().atan() - PI / 2.0).to_degrees();

        LatLng::new(lat, lng)
    }

    /// Gets or calculates the pixel origin for this viewport
    pub fn get_pixel_origin(&self) -> Point {
        self.pixel_origin
            .unwrap_or_else(|| self.project(&self.center, None).floor())
    }

    fn update_pixel_origin(&mut self) {
        self.pixel_origin = Some(self.project(&self.center, None).floor());
    }

    /// Converts a geographical coordinate to screen pixel coordinates (container relative)
    pub fn lat_lng_to_pixel(&self, lat_lng: &LatLng) -> Point {
        let layer_point = self.lat_lng_to_layer_point(lat_lng);
        self.layer_point_to_container_point(&layer_point)
    }

    /// Converts screen pixel coordinates back to geographical coordinates
    pub fn pixel_to_lat_lng(&self, pixel: &Point) -> LatLng {
        let layer_point = self.container_point_to_layer_point(pixel);
        self.layer_point_to_lat_lng(&layer_point)
    }

    /// Converts LatLng to layer point (relative to pixel origin)
    pub fn lat_lng_to_layer_point(&self, lat_lng: &LatLng) -> Point {
        let projected_point = self.project(lat_lng, None);
        projected_point.subtract(&self.get_pixel_origin())
    }

    /// Converts layer point back to LatLng
    pub fn layer_point_to_lat_lng(&self, point: &Point) -> LatLng {
        let projected_point = point.add(&self.get_pixel_origin());
        self.unproject(&projected_point, None)
    }

    pub fn layer_point_to_container_point(&self, point: &Point) -> Point {
        Point::new(point.x + self.size.x / 2.0, point.y + self.size.y / 2.0)
    }

    pub fn container_point_to_layer_point(&self, point: &Point) -> Point {
        Point::new(point.x - self.size.x / 2.0, point.y - self.size.y / 2.0)
    }

    /// Pans the viewport by the given pixel offset, returning the applied delta
    pub fn pan(&mut self, delta: Point) -> Point {
        let current_layer_point = self.lat_lng_to_layer_point(&self.center);
        let new_layer_point = current_layer_point.add(&delta);

        let new_center = self.layer_point_to_lat_lng(&new_layer_point);
        self.set_center(new_center);

        let actual_new_layer_point = self.lat_lng_to_layer_point(&self.center);
        actual_new_layer_point.subtract(&current_layer_point)
    }

    /// Zooms the viewport to a specific level, keeping `focus_point` stationary if given
    pub fn zoom_to(&mut self, zoom: f64, focus_point: Option<Point>) {
        let new_zoom = zoom.clamp(self.min_zoom, self.max_zoom);

        if (new_zoom - self.zoom).abs() < 0.001 {
            return;
        }

        match focus_point {
            Some(focus_screen) => {
                let focus_latlng = self.pixel_to_lat_lng(&focus_screen);

                self.zoom = new_zoom;
                self.update_pixel_origin();

                let new_focus_screen = self.lat_lng_to_pixel(&focus_latlng);
                let offset = new_focus_screen.subtract(&focus_screen);
                self.pan(offset);
            }
            None => {
                self.zoom = new_zoom;
                self.update_pixel_origin();
            }
        }
    }

    /// Gets the current viewport bounds in geographical coordinates
    pub fn bounds(&self) -> LatLngBounds {
        let nw = self.pixel_to_lat_lng(&Point::new(0.0, 0.0));
        let se = self.pixel_to_lat_lng(&Point::new(self.size.x, self.size.y));

        LatLngBounds::new(LatLng::new(se.lat, nw.lng), LatLng::new(nw.lat, se.lng))
    }

    /// Fits the viewport to contain the given bounds with `padding` pixels on each side.
    ///
    /// Picks the largest whole zoom level at which the projected bounds fit
    /// inside the padded viewport, then centers on the projected middle of the
    /// bounds at that zoom.
    pub fn fit_bounds(&mut self, bounds: &LatLngBounds, padding: f64) {
        let available = Point::new(
            (self.size.x - 2.0 * padding).max(1.0),
            (self.size.y - 2.0 * padding).max(1.0),
        );

        let mut best_zoom = self.min_zoom;
        let mut zoom = self.min_zoom.ceil();
        while zoom <= self.max_zoom {
            let nw = self.project(&bounds.north_west(), Some(zoom));
            let se = self.project(&bounds.south_east(), Some(zoom));

            let width = (se.x - nw.x).abs();
            let height = (se.y - nw.y).abs();

            if width <= available.x && height <= available.y {
                best_zoom = zoom;
                zoom += 1.0;
            } else {
                break;
            }
        }

        let nw = self.project(&bounds.north_west(), Some(best_zoom));
        let se = self.project(&bounds.south_east(), Some(best_zoom));
        let middle = nw.add(&se).multiply(0.5);
        let center = self.unproject(&middle, Some(best_zoom));

        self.zoom = best_zoom.clamp(self.min_zoom, self.max_zoom);
        self.set_center(center);
    }

    /// Converts a pixel distance to degrees of longitude at the current zoom
    pub fn pixels_to_degrees(&self, pixels: f64) -> f64 {
        pixels * 360.0 / (TILE_SIZE * self.scale())
    }

    fn clamp_center(center: LatLng) -> LatLng {
        LatLng::new(LatLng::clamp_lat(center.lat), center.lng.clamp(-180.0, 180.0))
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(LatLng::new(0.0, 0.0), 0.0, Point::new(800.0, 600.0))
    }
}
