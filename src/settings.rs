use anyhow::{Context, Result};
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::constants::*;
use crate::geometry::Viewport;
use crate::map::LatLng;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Settings {
    /// Directory with one GPX file per ride
    pub gps_dir: Option<String>,
    pub image_dir: Option<String>,
    /// Popups load `<remote_image_url>/<filename>` on click when set,
    /// otherwise images are inlined at build time.
    pub remote_image_url: Option<String>,
    pub image_width: u32,
    pub image_height: u32,
    pub zoom_start: f64,
    pub center: Option<LatLng>,
    pub viewport_width: f64,
    pub viewport_height: f64,
    pub fetch_timeout_secs: u64,
    pub output_path: String,
    /// Cycled over the ride polylines; empty means the default colour
    pub line_colours: Vec<String>,
    /// One popup text per ride, replacing the generated stage summary
    pub ride_text: Option<Vec<String>>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            gps_dir: None,
            image_dir: None,
            remote_image_url: None,
            image_width: DEFAULT_IMAGE_WIDTH,
            image_height: DEFAULT_IMAGE_HEIGHT,
            zoom_start: DEFAULT_ZOOM,
            center: None,
            viewport_width: DEFAULT_VIEWPORT_WIDTH,
            viewport_height: DEFAULT_VIEWPORT_HEIGHT,
            fetch_timeout_secs: DEFAULT_FETCH_TIMEOUT_SECS,
            output_path: DEFAULT_OUTPUT_PATH.to_string(),
            line_colours: Vec::new(),
            ride_text: None,
        }
    }
}

impl Settings {
    /// Loads `tourmap.ini` next to the executable; missing file means defaults.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            return Ok(Settings::default());
        }
        let text = std::fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config file {}", config_path.display()))?;
        Ok(Self::parse(&text))
    }

    /// Unknown keys are ignored and unparsable values keep their defaults.
    pub fn parse(text: &str) -> Self {
        let mut config_map = HashMap::new();
        for line in text.lines() {
            let line = line.trim();
            if line.starts_with('#') || line.is_empty() {
                continue;
            }
            if let Some((key, value)) = line.split_once('=') {
                config_map.insert(key.trim(), value.trim().trim_matches('"'));
            }
        }

        let mut settings = Settings::default();

        if let Some(dir) = config_map.get("gps_dir").filter(|v| !v.is_empty()) {
            settings.gps_dir = Some(dir.to_string());
        }
        if let Some(dir) = config_map.get("image_dir").filter(|v| !v.is_empty()) {
            settings.image_dir = Some(dir.to_string());
        }
        if let Some(url) = config_map.get("remote_image_url").filter(|v| !v.is_empty()) {
            settings.remote_image_url = Some(url.to_string());
        }
        if let Some(width) = config_map.get("image_width").and_then(|v| v.parse::<u32>().ok()) {
            settings.image_width = width;
        }
        if let Some(height) = config_map.get("image_height").and_then(|v| v.parse::<u32>().ok()) {
            settings.image_height = height;
        }
        if let Some(zoom) = config_map.get("zoom_start").and_then(|v| v.parse::<f64>().ok()) {
            settings.zoom_start = zoom;
        }
        if let (Some(lat), Some(lng)) = (
            config_map.get("center_lat").and_then(|v| v.parse::<f64>().ok()),
            config_map.get("center_lng").and_then(|v| v.parse::<f64>().ok()),
        ) {
            settings.center = Some(LatLng::new(lat, lng));
        }
        if let Some(width) = config_map.get("viewport_width").and_then(|v| v.parse::<f64>().ok()) {
            settings.viewport_width = width;
        }
        if let Some(height) = config_map.get("viewport_height").and_then(|v| v.parse::<f64>().ok()) {
            settings.viewport_height = height;
        }
        if let Some(secs) = config_map.get("fetch_timeout_secs").and_then(|v| v.parse::<u64>().ok()) {
            settings.fetch_timeout_secs = secs;
        }
        if let Some(path) = config_map.get("output_path").filter(|v| !v.is_empty()) {
            settings.output_path = path.to_string();
        }
        if let Some(colours) = config_map.get("line_colours") {
            settings.line_colours = split_list(colours, ',');
        }
        // Stage texts may contain commas, so they are separated by '|'
        if let Some(texts) = config_map.get("ride_text") {
            let texts = split_list(texts, '|');
            if !texts.is_empty() {
                settings.ride_text = Some(texts);
            }
        }

        settings
    }

    pub fn viewport(&self) -> Viewport {
        Viewport::new(self.viewport_width, self.viewport_height)
    }

    pub fn config_path() -> PathBuf {
        let mut path = std::env::current_exe()
            .unwrap_or_default()
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .to_path_buf();

        if path.ends_with("target/debug") || path.ends_with("target/release") {
            path.pop();
            path.pop();
        }
        path.push("tourmap.ini");
        path
    }
}

fn split_list(value: &str, separator: char) -> Vec<String> {
    value
        .split(separator)
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}
