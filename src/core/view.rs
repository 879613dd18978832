//! View-space ↔ document-space translation.
//!
//! A [`ViewState`] is a plain value: the caller owns it and passes it into
//! every translation. The scroll offset is kept in document units, so zooming
//! repeatedly never accumulates rounding error in the offset.

use serde::{Deserialize, Serialize};

use crate::document::PageRaster;
use crate::error::{Error, Result};
use crate::models::{Point, Rect};

pub const DEFAULT_MIN_ZOOM: f64 = 0.05;
pub const DEFAULT_MAX_ZOOM: f64 = 20.0;
/// Step used by the zoom-in / zoom-out buttons and the mouse wheel.
pub const ZOOM_STEP: f64 = 1.25;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoomLimits {
    pub min: f64,
    pub max: f64,
}

impl Default for ZoomLimits {
    fn default() -> Self {
        Self {
            min: DEFAULT_MIN_ZOOM,
            max: DEFAULT_MAX_ZOOM,
        }
    }
}

impl ZoomLimits {
    pub fn new(min: f64, max: f64) -> Result<Self> {
        if !(min.is_finite() && max.is_finite() && min > 0.0 && min <= max) {
            return Err(Error::invalid(format!("zoom limits [{min}, {max}]")));
        }
        Ok(Self { min, max })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewState {
    zoom: f64,
    /// Document-space point shown at the view origin.
    scroll: Point,
    limits: ZoomLimits,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            zoom: 1.0,
            scroll: Point::default(),
            limits: ZoomLimits::default(),
        }
    }
}

impl ViewState {
    /// Zoom outside the limits is clamped into them; zero, negative or
    /// non-finite zoom is rejected.
    pub fn new(zoom: f64, scroll: Point, limits: ZoomLimits) -> Result<Self> {
        let zoom = check_zoom(zoom)?.clamp(limits.min, limits.max);
        if !(scroll.x.is_finite() && scroll.y.is_finite()) {
            return Err(Error::invalid("scroll offset must be finite"));
        }
        Ok(Self { zoom, scroll, limits })
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    pub fn scroll(&self) -> Point {
        self.scroll
    }

    pub fn limits(&self) -> ZoomLimits {
        self.limits
    }

    pub fn with_zoom(self, zoom: f64) -> Result<Self> {
        Self::new(zoom, self.scroll, self.limits)
    }

    pub fn with_scroll(self, scroll: Point) -> Result<Self> {
        Self::new(self.zoom, scroll, self.limits)
    }

    /// Scroll by a delta given in view pixels.
    pub fn scroll_by_view(self, dx: f64, dy: f64) -> Result<Self> {
        let scroll = Point::new(self.scroll.x + dx / self.zoom, self.scroll.y + dy / self.zoom);
        self.with_scroll(scroll)
    }

    pub fn zoom_by(self, factor: f64) -> Result<Self> {
        self.with_zoom(self.zoom * check_zoom(factor)?)
    }

    pub fn zoom_in(self) -> Result<Self> {
        self.zoom_by(ZOOM_STEP)
    }

    pub fn zoom_out(self) -> Result<Self> {
        self.zoom_by(1.0 / ZOOM_STEP)
    }

    /// Zoom while keeping the document point under `anchor` (a view point)
    /// in place, as a mouse-wheel zoom does.
    pub fn zoom_about(self, anchor: Point, factor: f64) -> Result<Self> {
        let pinned = to_document(anchor, &self)?;
        let zoomed = self.zoom_by(factor)?;
        let scroll = Point::new(
            pinned.x - anchor.x / zoomed.zoom,
            pinned.y - anchor.y / zoomed.zoom,
        );
        zoomed.with_scroll(scroll)
    }

    /// Back to 1:1 at the page origin.
    pub fn reset(self) -> Self {
        Self {
            zoom: 1.0_f64.clamp(self.limits.min, self.limits.max),
            scroll: Point::default(),
            limits: self.limits,
        }
    }
}

fn check_zoom(zoom: f64) -> Result<f64> {
    if !zoom.is_finite() || zoom <= 0.0 {
        return Err(Error::invalid(format!("zoom must be positive and finite, got {zoom}")));
    }
    Ok(zoom)
}

/// `document = view / zoom + scroll`
pub fn to_document(view: Point, state: &ViewState) -> Result<Point> {
    let zoom = check_zoom(state.zoom)?;
    Ok(Point::new(view.x / zoom + state.scroll.x, view.y / zoom + state.scroll.y))
}

/// `view = (document - scroll) * zoom`
pub fn to_view(document: Point, state: &ViewState) -> Result<Point> {
    let zoom = check_zoom(state.zoom)?;
    Ok(Point::new(
        (document.x - state.scroll.x) * zoom,
        (document.y - state.scroll.y) * zoom,
    ))
}

pub fn rect_to_document(view: &Rect, state: &ViewState) -> Result<Rect> {
    let a = to_document(Point::new(view.x_min, view.y_min), state)?;
    let b = to_document(Point::new(view.x_max, view.y_max), state)?;
    Ok(Rect::from_corners(a, b))
}

pub fn rect_to_view(document: &Rect, state: &ViewState) -> Result<Rect> {
    let a = to_view(Point::new(document.x_min, document.y_min), state)?;
    let b = to_view(Point::new(document.x_max, document.y_max), state)?;
    Ok(Rect::from_corners(a, b))
}

/// Intersect `rect` with the raster extent.
pub fn clamp_to_raster(rect: &Rect, raster: &PageRaster) -> Result<Rect> {
    if !rect.is_finite() {
        return Err(Error::invalid("rectangle has non-finite coordinates"));
    }
    rect.intersect(&raster.bounds()).ok_or_else(|| {
        Error::degenerate(format!(
            "rectangle {rect:?} does not overlap page {} ({}x{})",
            raster.index(),
            raster.width(),
            raster.height()
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, GrayImage};

    fn raster(w: u32, h: u32) -> PageRaster {
        PageRaster::new(0, 72.0, DynamicImage::ImageLuma8(GrayImage::new(w, h)))
    }

    #[test]
    fn round_trip_holds_across_states() {
        let points = [
            Point::new(0.0, 0.0),
            Point::new(13.25, 870.5),
            Point::new(-40.0, 1e4),
            Point::new(1919.0, 1079.0),
        ];
        for zoom in [0.05, 0.3, 1.0, 1.25, 2.5, 7.77, 20.0] {
            for scroll in [Point::new(0.0, 0.0), Point::new(123.4, -56.7), Point::new(1e3, 3e3)] {
                let state = ViewState::new(zoom, scroll, ZoomLimits::default()).unwrap();
                for p in points {
                    let back = to_view(to_document(p, &state).unwrap(), &state).unwrap();
                    assert!((back.x - p.x).abs() < 1e-6, "{p:?} -> {back:?}");
                    assert!((back.y - p.y).abs() < 1e-6, "{p:?} -> {back:?}");
                }
            }
        }
    }

    #[test]
    fn zero_zoom_is_rejected() {
        assert!(matches!(
            ViewState::new(0.0, Point::default(), ZoomLimits::default()),
            Err(Error::InvalidParameter(_))
        ));
        assert!(ViewState::default().zoom_by(f64::NAN).is_err());
    }

    #[test]
    fn zoom_is_clamped_to_limits() {
        let limits = ZoomLimits::new(0.5, 4.0).unwrap();
        let state = ViewState::new(10.0, Point::default(), limits).unwrap();
        assert_eq!(state.zoom(), 4.0);
        let state = state.zoom_by(0.01).unwrap();
        assert_eq!(state.zoom(), 0.5);
    }

    #[test]
    fn zoom_about_pins_anchor() {
        let state = ViewState::new(1.0, Point::new(20.0, 30.0), ZoomLimits::default()).unwrap();
        let anchor = Point::new(200.0, 150.0);
        let before = to_document(anchor, &state).unwrap();
        let zoomed = state.zoom_about(anchor, 2.5).unwrap();
        let after = to_document(anchor, &zoomed).unwrap();
        assert!((before.x - after.x).abs() < 1e-9);
        assert!((before.y - after.y).abs() < 1e-9);
    }

    #[test]
    fn to_document_applies_zoom_then_scroll() {
        let state = ViewState::new(2.0, Point::new(100.0, 50.0), ZoomLimits::default()).unwrap();
        let p = to_document(Point::new(40.0, 20.0), &state).unwrap();
        assert_eq!(p, Point::new(120.0, 60.0));
    }

    #[test]
    fn clamp_cuts_to_raster() {
        let r = raster(100, 50);
        let rect = Rect::from_origin_size(-10.0, 40.0, 50.0, 30.0);
        let clamped = clamp_to_raster(&rect, &r).unwrap();
        assert_eq!(clamped, Rect { x_min: 0.0, y_min: 40.0, x_max: 40.0, y_max: 50.0 });

        let outside = Rect::from_origin_size(200.0, 200.0, 10.0, 10.0);
        assert!(matches!(clamp_to_raster(&outside, &r), Err(Error::DegenerateRegion(_))));
    }
}
