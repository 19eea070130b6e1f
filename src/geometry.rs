use serde::Serialize;

use crate::constants::{
    POPUP_HORIZONTAL_MARGIN, POPUP_MAX_HEIGHT, POPUP_MAX_WIDTH, POPUP_VERTICAL_MARGIN,
};
use crate::style::InlineStyle;

/// Pixel size of an image element.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ImageSize {
    pub width: f64,
    pub height: f64,
}

impl ImageSize {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Size declared by an inline style, if both lengths are positive numbers.
    pub fn from_style(style: &InlineStyle) -> Option<Self> {
        let width = style.px("width")?;
        let height = style.px("height")?;
        (width > 0.0 && height > 0.0).then_some(Self { width, height })
    }
}

/// Visible window area.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Which viewport axis limited the enlarged image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstrainedAxis {
    Height,
    Width,
}

/// Display size of a popup image after a click.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PopupDisplayGeometry {
    pub width: f64,
    pub height: f64,
    pub axis: ConstrainedAxis,
}

impl PopupDisplayGeometry {
    /// Enlarges `placeholder` to fit `viewport`, keeping its aspect ratio.
    ///
    /// The axis with less free room relative to the placeholder is clamped
    /// first (height to `min(vh - 150, 500)`, width to `min(vw - 100, 700)`),
    /// and the other one follows. `placeholder` must have positive sides.
    pub fn fit(placeholder: ImageSize, viewport: Viewport) -> Self {
        let margh = viewport.height - placeholder.height;
        let margw = viewport.width - placeholder.width;

        let (width, height, axis) = if margh < margw {
            let h = (viewport.height - POPUP_VERTICAL_MARGIN)
                .min(POPUP_MAX_HEIGHT)
                .max(0.0);
            let w = (h / placeholder.height) * placeholder.width;
            (w, h, ConstrainedAxis::Height)
        } else {
            let w = (viewport.width - POPUP_HORIZONTAL_MARGIN)
                .min(POPUP_MAX_WIDTH)
                .max(0.0);
            let h = (w / placeholder.width) * placeholder.height;
            (w, h, ConstrainedAxis::Width)
        };

        Self {
            width,
            height,
            axis,
        }
    }

    pub fn size(&self) -> ImageSize {
        ImageSize::new(self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn fit(imgw: f64, imgh: f64, vw: f64, vh: f64) -> PopupDisplayGeometry {
        PopupDisplayGeometry::fit(ImageSize::new(imgw, imgh), Viewport::new(vw, vh))
    }

    #[test]
    fn landscape_on_wide_screen_is_height_limited() {
        let g = fit(400.0, 300.0, 1200.0, 800.0);
        assert_eq!(g.axis, ConstrainedAxis::Height);
        assert_eq!(g.height, 500.0);
        assert!((g.width - 666.666_666_666_666_6).abs() < 1e-6);
    }

    #[test]
    fn portrait_on_tall_screen() {
        let g = fit(300.0, 600.0, 900.0, 1000.0);
        assert_eq!(g.axis, ConstrainedAxis::Height);
        assert_eq!(g.height, 500.0);
        assert!((g.width - 250.0).abs() < EPS);
    }

    #[test]
    fn wide_landscape_still_takes_height_branch() {
        let g = fit(800.0, 400.0, 1600.0, 900.0);
        assert_eq!(g.axis, ConstrainedAxis::Height);
        assert_eq!(g.height, 500.0);
        assert!((g.width - 1000.0).abs() < EPS);
    }

    #[test]
    fn narrow_screen_is_width_limited() {
        let g = fit(500.0, 375.0, 600.0, 900.0);
        assert_eq!(g.axis, ConstrainedAxis::Width);
        assert_eq!(g.width, 500.0);
        assert!((g.height - 375.0).abs() < EPS);
    }

    #[test]
    fn equal_margins_clamp_width() {
        let g = fit(400.0, 400.0, 1000.0, 1000.0);
        assert_eq!(g.axis, ConstrainedAxis::Width);
        assert_eq!(g.width, 700.0);
    }

    #[test]
    fn tiny_viewport_never_goes_negative() {
        let g = fit(500.0, 400.0, 1000.0, 120.0);
        assert_eq!(g.axis, ConstrainedAxis::Height);
        assert_eq!(g.height, 0.0);
        assert_eq!(g.width, 0.0);
    }

    #[test]
    fn preserves_aspect_and_respects_clamps_over_a_grid() {
        for &(imgw, imgh) in &[(500.0, 375.0), (300.0, 400.0), (120.0, 90.0), (999.0, 10.0)] {
            for &(vw, vh) in &[(1920.0, 1080.0), (800.0, 1280.0), (640.0, 480.0), (2560.0, 700.0)] {
                let g = fit(imgw, imgh, vw, vh);
                assert!((g.height / g.width - imgh / imgw).abs() < 1e-9);
                match g.axis {
                    ConstrainedAxis::Height => {
                        assert!(vh - imgh < vw - imgw);
                        assert!(g.height <= (vh - 150.0).min(500.0) + EPS);
                    }
                    ConstrainedAxis::Width => {
                        assert!(vh - imgh >= vw - imgw);
                        assert!(g.width <= (vw - 100.0).min(700.0) + EPS);
                    }
                }
            }
        }
    }

    #[test]
    fn reads_placeholder_from_style() {
        let style = InlineStyle::parse("width:500px; height:375px; object-fit:fill;");
        assert_eq!(ImageSize::from_style(&style), Some(ImageSize::new(500.0, 375.0)));
        assert_eq!(ImageSize::from_style(&InlineStyle::parse("width:0px; height:10px")), None);
        assert_eq!(ImageSize::from_style(&InlineStyle::parse("width:auto")), None);
    }
}
