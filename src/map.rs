use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::sync::RwLock;

use crate::constants::TILE_SIZE;
use crate::geometry::Viewport;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// Pixel coordinates at the map's current zoom.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PanOptions {
    pub animate: bool,
}

impl PanOptions {
    pub fn animated() -> Self {
        Self { animate: true }
    }
}

/// The part of a map widget the popup handler talks to.
pub trait MapView: Send + Sync {
    fn viewport(&self) -> Viewport;
    fn project(&self, at: LatLng) -> Point;
    fn unproject(&self, point: Point) -> LatLng;
    fn pan_to(&self, center: LatLng, options: PanOptions);
}

const EARTH_RADIUS: f64 = 6378137.0;
const MAX_LATITUDE: f64 = 85.0511287798;
const DEG: f64 = PI / 180.0;

/// Headless spherical-Mercator map, projected the way Leaflet does it.
#[derive(Debug)]
pub struct WebMercatorMap {
    zoom: f64,
    viewport: Viewport,
    center: RwLock<LatLng>,
}

impl WebMercatorMap {
    pub fn new(center: LatLng, zoom: f64, viewport: Viewport) -> Self {
        Self {
            zoom,
            viewport,
            center: RwLock::new(center),
        }
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    pub fn center(&self) -> LatLng {
        *self.center.read().unwrap_or_else(|e| e.into_inner())
    }

    fn scale(&self) -> f64 {
        TILE_SIZE * 2_f64.powf(self.zoom)
    }
}

impl MapView for WebMercatorMap {
    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn project(&self, at: LatLng) -> Point {
        let lat = at.lat.clamp(-MAX_LATITUDE, MAX_LATITUDE);
        let sin_lat = (lat * DEG).sin();
        let x = EARTH_RADIUS * at.lng * DEG;
        let y = EARTH_RADIUS * ((1.0 + sin_lat) / (1.0 - sin_lat)).ln() / 2.0;

        // world metres -> pixels, y grows downwards
        let k = 0.5 / (PI * EARTH_RADIUS);
        let scale = self.scale();
        Point::new(scale * (k * x + 0.5), scale * (-k * y + 0.5))
    }

    fn unproject(&self, point: Point) -> LatLng {
        let k = 0.5 / (PI * EARTH_RADIUS);
        let scale = self.scale();
        let x = (point.x / scale - 0.5) / k;
        let y = (point.y / scale - 0.5) / -k;

        LatLng::new(
            (2.0 * (y / EARTH_RADIUS).exp().atan() - PI / 2.0) / DEG,
            x / (EARTH_RADIUS * DEG),
        )
    }

    fn pan_to(&self, center: LatLng, options: PanOptions) {
        tracing::debug!(lat = center.lat, lng = center.lng, animate = options.animate, "pan");
        let mut guard = self.center.write().unwrap_or_else(|e| e.into_inner());
        *guard = center;
    }
}
