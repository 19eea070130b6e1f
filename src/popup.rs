use std::fmt;
use std::sync::Mutex;

use crate::map::LatLng;
use crate::style::InlineStyle;

/// A popup body: one image element wrapped in a div of the same size.
#[derive(Debug, Clone, PartialEq)]
pub struct PopupContent {
    pub src: Option<String>,
    pub alt: String,
    pub image_style: InlineStyle,
}

impl PopupContent {
    /// Image element without a source, sized to the photo's placeholder.
    pub fn placeholder(style: InlineStyle, alt: &str) -> Self {
        Self {
            src: None,
            alt: alt.to_string(),
            image_style: style,
        }
    }

    pub fn image(src: impl Into<String>, style: InlineStyle, alt: &str) -> Self {
        Self {
            src: Some(src.into()),
            alt: alt.to_string(),
            image_style: style,
        }
    }

    pub fn to_html(&self) -> String {
        let css = self.image_style.css_text();
        match &self.src {
            Some(src) => format!(
                "<div style='{css}'><img src='{src}' alt='{alt}' style='{css}'/></div>",
                alt = self.alt
            ),
            None => format!("<img style='{css}' alt='{alt}'/>", alt = self.alt),
        }
    }
}

impl fmt::Display for PopupContent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_html())
    }
}

/// Popup max-width / max-height option.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PopupExtent {
    Auto,
    Px(f64),
}

/// The popup operations the click handler relies on.
pub trait PopupHandle: Send + Sync {
    fn lat_lng(&self) -> LatLng;
    fn content(&self) -> PopupContent;
    fn set_content(&self, content: PopupContent);
    fn max_size(&self) -> (PopupExtent, PopupExtent);
    fn set_max_size(&self, width: PopupExtent, height: PopupExtent);
}

#[derive(Debug)]
struct PopupState {
    content: PopupContent,
    max_width: PopupExtent,
    max_height: PopupExtent,
}

/// In-memory popup anchored at a fixed position.
#[derive(Debug)]
pub struct Popup {
    anchor: LatLng,
    min_width: f64,
    state: Mutex<PopupState>,
}

impl Popup {
    pub fn new(anchor: LatLng, content: PopupContent, width: f64) -> Self {
        Self {
            anchor,
            min_width: width,
            state: Mutex::new(PopupState {
                content,
                max_width: PopupExtent::Px(width),
                max_height: PopupExtent::Auto,
            }),
        }
    }

    pub fn min_width(&self) -> f64 {
        self.min_width
    }

    fn with_state<T>(&self, f: impl FnOnce(&mut PopupState) -> T) -> T {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut state)
    }
}

impl PopupHandle for Popup {
    fn lat_lng(&self) -> LatLng {
        self.anchor
    }

    fn content(&self) -> PopupContent {
        self.with_state(|s| s.content.clone())
    }

    fn set_content(&self, content: PopupContent) {
        self.with_state(|s| s.content = content);
    }

    fn max_size(&self) -> (PopupExtent, PopupExtent) {
        self.with_state(|s| (s.max_width, s.max_height))
    }

    fn set_max_size(&self, width: PopupExtent, height: PopupExtent) {
        self.with_state(|s| {
            s.max_width = width;
            s.max_height = height;
        });
    }
}
