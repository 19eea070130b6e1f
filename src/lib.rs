//! A tour map: ride stages from GPX tracks plus photo markers whose popups
//! load and enlarge their image on click.

pub mod advisory;
pub mod constants;
pub mod error;
pub mod fetcher;
pub mod geometry;
pub mod handler;
pub mod map;
pub mod marker;
pub mod photos;
pub mod popup;
pub mod rides;
pub mod settings;
pub mod style;
pub mod tour;

pub use error::{CatalogueError, FetchError, RideError};
pub use fetcher::{EncodedImage, HttpImageFetcher, ImageSource};
pub use geometry::{ConstrainedAxis, ImageSize, PopupDisplayGeometry, Viewport};
pub use handler::{ClickOutcome, PopupClickHandler};
pub use map::{LatLng, MapView, PanOptions, Point, WebMercatorMap};
pub use marker::MarkerBinding;
pub use popup::{Popup, PopupContent, PopupExtent, PopupHandle};
pub use rides::{Ride, RideLayer, RideLine, StageMarker};
pub use settings::Settings;
pub use style::InlineStyle;
pub use tour::{PopupMode, TourMap};
