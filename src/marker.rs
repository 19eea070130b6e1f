use std::sync::Arc;
use tokio::task::JoinHandle;

use crate::fetcher::ImageSource;
use crate::handler::{image_url, ClickOutcome, PopupClickHandler};
use crate::map::{LatLng, MapView};
use crate::popup::PopupHandle;

/// One map marker together with its popup and, for remotely loaded images,
/// the click handler that fills the popup.
pub struct MarkerBinding<S, M, P> {
    pub marker_id: String,
    pub position: LatLng,
    pub popup: Arc<P>,
    handler: Option<Arc<PopupClickHandler<S, M, P>>>,
}

impl<S, M, P> MarkerBinding<S, M, P>
where
    S: ImageSource + 'static,
    M: MapView + 'static,
    P: PopupHandle + 'static,
{
    /// Binds a click handler that loads `<remote_base_url>/<filename>` into `popup`.
    pub fn bind_remote(
        marker_id: impl Into<String>,
        popup: Arc<P>,
        map: Arc<M>,
        source: Arc<S>,
        remote_base_url: &str,
        filename: &str,
    ) -> Self {
        let marker_id = marker_id.into();
        let handler = PopupClickHandler::new(
            marker_id.clone(),
            image_url(remote_base_url, filename),
            Arc::clone(&popup),
            map,
            source,
        );
        Self {
            position: popup.lat_lng(),
            marker_id,
            popup,
            handler: Some(Arc::new(handler)),
        }
    }

    /// A marker whose popup already carries its content.
    pub fn bind_static(marker_id: impl Into<String>, popup: Arc<P>) -> Self {
        Self {
            marker_id: marker_id.into(),
            position: popup.lat_lng(),
            popup,
            handler: None,
        }
    }

    pub fn handler(&self) -> Option<&Arc<PopupClickHandler<S, M, P>>> {
        self.handler.as_ref()
    }

    pub fn image_url(&self) -> Option<&str> {
        self.handler.as_ref().map(|h| h.url())
    }

    /// Fires the marker's click event. Static markers have nothing to load.
    pub fn click(&self) -> Option<JoinHandle<ClickOutcome>> {
        self.handler.as_ref().map(|h| h.on_click())
    }
}
