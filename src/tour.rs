use anyhow::{Context, Result};
use serde::Serialize;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::constants::LOADING_ALT;
use crate::fetcher::{EncodedImage, ImageSource};
use crate::handler::ClickOutcome;
use crate::map::{LatLng, WebMercatorMap};
use crate::marker::MarkerBinding;
use crate::photos::PhotoEntry;
use crate::popup::{Popup, PopupContent, PopupHandle};
use crate::rides::{start_centre, Ride, RideLayer, RideLine, StageMarker};
use crate::settings::Settings;

/// How popup images reach the browser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PopupMode {
    /// Loaded on click from `<base_url>/<filename>`
    Remote { base_url: String },
    /// Inlined into the popup when the map is built
    Embedded,
}

impl PopupMode {
    pub fn from_settings(settings: &Settings) -> Self {
        match &settings.remote_image_url {
            Some(base_url) => PopupMode::Remote {
                base_url: base_url.clone(),
            },
            None => PopupMode::Embedded,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MarkerManifest {
    pub id: String,
    pub filename: String,
    pub position: LatLng,
    pub popup_width: f64,
    pub popup_html: String,
    pub image_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TourManifest {
    pub center: LatLng,
    pub zoom: f64,
    pub stages: Vec<StageMarker>,
    pub lines: Vec<RideLine>,
    pub markers: Vec<MarkerManifest>,
}

/// A tour map: stage markers and polylines for the rides, plus one marker
/// binding per photo.
pub struct TourMap<S> {
    map: Arc<WebMercatorMap>,
    rides: RideLayer,
    markers: Vec<(PhotoEntry, MarkerBinding<S, WebMercatorMap, Popup>)>,
}

impl<S: ImageSource + 'static> TourMap<S> {
    /// Centers on the explicit center from settings, else on the mean ride
    /// start, else on the mean photo position.
    pub fn build(
        settings: &Settings,
        rides: &[Ride],
        photos: Vec<PhotoEntry>,
        source: Arc<S>,
    ) -> Result<Self> {
        let center = settings
            .center
            .or_else(|| start_centre(rides))
            .or_else(|| mean_position(&photos))
            .context("No rides or photos to center the map on")?;
        let map = Arc::new(WebMercatorMap::new(
            center,
            settings.zoom_start,
            settings.viewport(),
        ));

        let ride_layer = RideLayer::build(
            rides,
            settings.ride_text.as_deref(),
            &settings.line_colours,
        )?;
        info!(stages = ride_layer.stages.len(), "added ride stages");

        let mode = PopupMode::from_settings(settings);
        match &mode {
            PopupMode::Remote { base_url } => {
                info!(base_url = %base_url, "remote image URL base supplied, images will load on demand")
            }
            PopupMode::Embedded => {
                info!("images will be embedded within the popups (output may be very large)")
            }
        }

        let mut markers = Vec::with_capacity(photos.len());
        for (idx, photo) in photos.into_iter().enumerate() {
            let marker_id = format!("image_{}", idx);
            let style = photo.placeholder_style();

            let binding = match &mode {
                PopupMode::Remote { base_url } => {
                    let popup = Arc::new(Popup::new(
                        photo.position,
                        PopupContent::placeholder(style, LOADING_ALT),
                        photo.placeholder.width,
                    ));
                    MarkerBinding::bind_remote(
                        marker_id,
                        popup,
                        Arc::clone(&map),
                        Arc::clone(&source),
                        base_url,
                        &photo.filename,
                    )
                }
                PopupMode::Embedded => {
                    let image = EncodedImage::from_file(&photo.path)
                        .with_context(|| format!("Failed to embed {}", photo.filename))?;
                    let popup = Arc::new(Popup::new(
                        photo.position,
                        PopupContent::image(image.into_string(), style, ""),
                        photo.placeholder.width,
                    ));
                    MarkerBinding::bind_static(marker_id, popup)
                }
            };
            markers.push((photo, binding));
        }

        Ok(Self {
            map,
            rides: ride_layer,
            markers,
        })
    }

    pub fn map(&self) -> &Arc<WebMercatorMap> {
        &self.map
    }

    pub fn rides(&self) -> &RideLayer {
        &self.rides
    }

    /// Number of photo markers.
    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    pub fn marker(&self, marker_id: &str) -> Option<&MarkerBinding<S, WebMercatorMap, Popup>> {
        self.markers
            .iter()
            .map(|(_, binding)| binding)
            .find(|binding| binding.marker_id == marker_id)
    }

    /// Clicks a marker. `None` when the marker is unknown or its popup is static.
    pub fn click(&self, marker_id: &str) -> Option<JoinHandle<ClickOutcome>> {
        let Some(marker) = self.marker(marker_id) else {
            warn!(marker = marker_id, "no such marker");
            return None;
        };
        marker.click()
    }

    pub fn manifest(&self) -> TourManifest {
        TourManifest {
            center: self.map.center(),
            zoom: self.map.zoom(),
            stages: self.rides.stages.clone(),
            lines: self.rides.lines.clone(),
            markers: self
                .markers
                .iter()
                .map(|(photo, binding)| MarkerManifest {
                    id: binding.marker_id.clone(),
                    filename: photo.filename.clone(),
                    position: binding.position,
                    popup_width: binding.popup.min_width(),
                    popup_html: binding.popup.content().to_html(),
                    image_url: binding.image_url().map(str::to_string),
                })
                .collect(),
        }
    }
}

fn mean_position(photos: &[PhotoEntry]) -> Option<LatLng> {
    if photos.is_empty() {
        return None;
    }
    let n = photos.len() as f64;
    let (lat, lng) = photos.iter().fold((0.0, 0.0), |(lat, lng), p| {
        (lat + p.position.lat, lng + p.position.lng)
    });
    Some(LatLng::new(lat / n, lng / n))
}
