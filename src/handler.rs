use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::constants::{FAILED_ALT, PAN_LIFT_FACTOR};
use crate::fetcher::ImageSource;
use crate::geometry::{ImageSize, PopupDisplayGeometry};
use crate::map::{LatLng, MapView, PanOptions};
use crate::popup::{PopupContent, PopupExtent, PopupHandle};

/// How one click ended.
#[derive(Debug, Clone, PartialEq)]
pub enum ClickOutcome {
    Rendered {
        geometry: PopupDisplayGeometry,
        pan_target: LatLng,
    },
    Failed,
}

/// `<base>/<filename>` with exactly one slash in between.
pub fn image_url(remote_base_url: &str, filename: &str) -> String {
    format!(
        "{}/{}",
        remote_base_url.trim_end_matches('/'),
        filename.trim_start_matches('/')
    )
}

/// Loads a marker's full image into its popup when the marker is clicked.
pub struct PopupClickHandler<S, M, P> {
    marker_id: String,
    url: String,
    popup: Arc<P>,
    map: Arc<M>,
    source: Arc<S>,
}

impl<S, M, P> PopupClickHandler<S, M, P>
where
    S: ImageSource + 'static,
    M: MapView + 'static,
    P: PopupHandle + 'static,
{
    pub fn new(
        marker_id: impl Into<String>,
        url: impl Into<String>,
        popup: Arc<P>,
        map: Arc<M>,
        source: Arc<S>,
    ) -> Self {
        Self {
            marker_id: marker_id.into(),
            url: url.into(),
            popup,
            map,
            source,
        }
    }

    pub fn marker_id(&self) -> &str {
        &self.marker_id
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Runs the click in the background; concurrent clicks are not serialized,
    /// the last one to finish owns the popup.
    pub fn on_click(self: &Arc<Self>) -> JoinHandle<ClickOutcome> {
        let handler = Arc::clone(self);
        tokio::spawn(async move { handler.handle_click().await })
    }

    pub async fn handle_click(&self) -> ClickOutcome {
        debug!(marker = %self.marker_id, url = %self.url, "fetching popup image");

        let image = match self.source.fetch_data_url(&self.url).await {
            Ok(image) => image,
            Err(e) => {
                warn!(marker = %self.marker_id, error = %e, "Could not load b64 remote image");
                return ClickOutcome::Failed;
            }
        };

        let current = self.popup.content();
        let Some(placeholder) = ImageSize::from_style(&current.image_style) else {
            warn!(
                marker = %self.marker_id,
                style = %current.image_style,
                "popup image has no usable width/height"
            );
            return ClickOutcome::Failed;
        };

        let geometry = PopupDisplayGeometry::fit(placeholder, self.map.viewport());
        debug!(
            marker = %self.marker_id,
            axis = ?geometry.axis,
            width = geometry.width,
            height = geometry.height,
            "constrained popup size"
        );

        let mut style = current.image_style;
        style.set_px("width", geometry.width);
        style.set_px("height", geometry.height);

        self.popup.set_max_size(PopupExtent::Auto, PopupExtent::Auto);
        self.popup
            .set_content(PopupContent::image(image.into_string(), style, FAILED_ALT));

        // Anchor moves up by 0.7 of the new image height
        let mut anchor = self.map.project(self.popup.lat_lng());
        anchor.y -= PAN_LIFT_FACTOR * geometry.height;
        let pan_target = self.map.unproject(anchor);
        self.map.pan_to(pan_target, PanOptions::animated());

        ClickOutcome::Rendered {
            geometry,
            pan_target,
        }
    }
}
