// Popup sizing limits: the enlarged image never exceeds these, and keeps
// this much of the viewport free around it.
pub const POPUP_MAX_HEIGHT: f64 = 500.0;
pub const POPUP_MAX_WIDTH: f64 = 700.0;
pub const POPUP_VERTICAL_MARGIN: f64 = 150.0;
pub const POPUP_HORIZONTAL_MARGIN: f64 = 100.0;

// Fraction of the new image height the map is shifted up after rendering
pub const PAN_LIFT_FACTOR: f64 = 0.7;

// Placeholder image sizes at map-build time
pub const DEFAULT_IMAGE_WIDTH: u32 = 500;
pub const DEFAULT_IMAGE_HEIGHT: u32 = 400;

// Viewports narrower than this get the startup advisory
pub const SMALL_SCREEN_WIDTH: f64 = 500.0;
pub const SMALL_SCREEN_MESSAGE: &str = "This map works best on large screens.";

// Map defaults
pub const DEFAULT_ZOOM: f64 = 7.0;
pub const DEFAULT_VIEWPORT_WIDTH: f64 = 1280.0;
pub const DEFAULT_VIEWPORT_HEIGHT: f64 = 800.0;
pub const TILE_SIZE: f64 = 256.0;

// Ride layer
pub const DEFAULT_LINE_COLOUR: &str = "#3388ff";
pub const STAGE_POPUP_MIN_WIDTH: f64 = 200.0;
pub const STAGE_POPUP_MAX_WIDTH: f64 = 300.0;
// Mean Earth radius in metres
pub const EARTH_RADIUS_M: f64 = 6_371_008.8;

// Popup text
pub const LOADING_ALT: &str = "Loading image";
pub const FAILED_ALT: &str = "Could not load";

pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_OUTPUT_PATH: &str = "tourmap.json";
