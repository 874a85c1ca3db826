//! Viewport transform: document points ↔ screen pixels.
//!
//! The mapping is the affine `screen = logical * zoom + pan`. Zoom is always
//! kept inside `[min_zoom, max_zoom]`; pan is unbounded.

use kurbo::{Affine, Point, Rect, Size, Vec2};

/// Multiplicative step used by `zoom_in` / `zoom_out`.
pub const DEFAULT_ZOOM_STEP: f64 = 1.2;

/// Fraction of the viewport a fitted page occupies.
pub const DEFAULT_FIT_PADDING: f64 = 0.9;

/// Lower bound for any configured minimum zoom, so the transform stays
/// invertible.
pub const ZOOM_FLOOR: f64 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    zoom: f64,
    pan: Vec2,
    min_zoom: f64,
    max_zoom: f64,
    step: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(0.1, 5.0)
    }
}

impl Viewport {
    /// Identity viewport with the given zoom bounds. Bounds are sanitized:
    /// the minimum is at least `ZOOM_FLOOR` and the maximum at least the
    /// minimum.
    pub fn new(min_zoom: f64, max_zoom: f64) -> Self {
        let min_zoom = if min_zoom.is_finite() { min_zoom.max(ZOOM_FLOOR) } else { ZOOM_FLOOR };
        let max_zoom = if max_zoom.is_finite() { max_zoom.max(min_zoom) } else { min_zoom };
        Self {
            zoom: 1.0_f64.clamp(min_zoom, max_zoom),
            pan: Vec2::ZERO,
            min_zoom,
            max_zoom,
            step: DEFAULT_ZOOM_STEP,
        }
    }

    /// Override the zoom step (values ≤ 1 fall back to the default).
    pub fn with_step(mut self, step: f64) -> Self {
        self.step = if step.is_finite() && step > 1.0 { step } else { DEFAULT_ZOOM_STEP };
        self
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    pub fn pan_offset(&self) -> Vec2 {
        self.pan
    }

    pub fn zoom_bounds(&self) -> (f64, f64) {
        (self.min_zoom, self.max_zoom)
    }

    /// The logical → screen transform.
    pub fn transform(&self) -> Affine {
        Affine::translate(self.pan) * Affine::scale(self.zoom)
    }

    pub fn logical_to_screen(&self, p: Point) -> Point {
        self.transform() * p
    }

    pub fn screen_to_logical(&self, p: Point) -> Point {
        self.transform().inverse() * p
    }

    /// Scale a screen-space drag delta into document points.
    pub fn delta_to_logical(&self, d: Vec2) -> Vec2 {
        d / self.zoom
    }

    /// Map a document rectangle to screen space.
    pub fn rect_to_screen(&self, r: Rect) -> Rect {
        self.transform().transform_rect_bbox(r)
    }

    /// Map a screen rectangle (e.g. a marquee) back to document space.
    pub fn rect_to_logical(&self, r: Rect) -> Rect {
        self.transform().inverse().transform_rect_bbox(r)
    }

    fn clamp_zoom(&self, z: f64) -> f64 {
        if z.is_finite() {
            z.clamp(self.min_zoom, self.max_zoom)
        } else {
            self.zoom
        }
    }

    /// Set zoom directly, keeping pan. Out-of-range values are clamped.
    pub fn set_zoom(&mut self, zoom: f64) -> bool {
        let z = self.clamp_zoom(zoom);
        let changed = z != self.zoom;
        self.zoom = z;
        changed
    }

    pub fn zoom_in(&mut self) -> bool {
        self.set_zoom(self.zoom * self.step)
    }

    pub fn zoom_out(&mut self) -> bool {
        self.set_zoom(self.zoom / self.step)
    }

    /// Change zoom while keeping the document point under `screen` fixed on
    /// screen.
    pub fn zoom_to_point(&mut self, screen: Point, zoom: f64) -> bool {
        let anchor = self.screen_to_logical(screen);
        let z = self.clamp_zoom(zoom);
        let pan = screen.to_vec2() - anchor.to_vec2() * z;
        let changed = z != self.zoom || pan != self.pan;
        self.zoom = z;
        self.pan = pan;
        log::trace!("zoom_to_point {screen:?} -> zoom {z}, pan {pan:?}");
        changed
    }

    /// Fit a `logical` page into a `viewport` of screen pixels, scaled by
    /// `padding`, then center it. Degenerate sizes are ignored.
    pub fn zoom_to_fit(&mut self, viewport: Size, logical: Size, padding: f64) -> bool {
        if !is_positive(viewport) || !is_positive(logical) {
            return false;
        }
        let fit = (viewport.width / logical.width).min(viewport.height / logical.height);
        let before = *self;
        self.zoom = self.clamp_zoom(fit * padding);
        self.center_canvas(viewport, logical);
        *self != before
    }

    /// Pan offset that centers a `logical` page at `zoom`:
    /// `(viewport − logical × zoom) / 2` per axis.
    pub fn centered_pan(viewport: Size, logical: Size, zoom: f64) -> Vec2 {
        Vec2::new(
            (viewport.width - logical.width * zoom) / 2.0,
            (viewport.height - logical.height * zoom) / 2.0,
        )
    }

    /// Center a `logical` page at the current zoom.
    pub fn center_canvas(&mut self, viewport: Size, logical: Size) -> bool {
        let pan = Self::centered_pan(viewport, logical, self.zoom);
        if !pan.is_finite() {
            return false;
        }
        let changed = pan != self.pan;
        self.pan = pan;
        changed
    }

    /// Accumulate a screen-space pan (click-drag panning).
    pub fn pan(&mut self, delta: Vec2) -> bool {
        if !delta.is_finite() || delta == Vec2::ZERO {
            return false;
        }
        self.pan += delta;
        true
    }

    /// Reset to zoom 1 (clamped) and no pan.
    pub fn reset(&mut self) {
        self.zoom = self.clamp_zoom(1.0);
        self.pan = Vec2::ZERO;
    }

    /// The document rectangle visible through a `viewport` of screen pixels.
    pub fn visible_logical_rect(&self, viewport: Size) -> Rect {
        self.rect_to_logical(Rect::from_origin_size(Point::ORIGIN, viewport))
    }
}

fn is_positive(s: Size) -> bool {
    s.width.is_finite() && s.height.is_finite() && s.width > 0.0 && s.height > 0.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Point, b: Point) -> bool {
        (a - b).hypot() < 1e-9
    }

    #[test]
    fn logical_screen_roundtrip() {
        let mut vp = Viewport::new(0.1, 5.0);
        vp.set_zoom(2.0);
        vp.pan(Vec2::new(30.0, -10.0));

        let p = Point::new(100.0, 50.0);
        let s = vp.logical_to_screen(p);
        assert!(close(s, Point::new(230.0, 90.0)));
        assert!(close(vp.screen_to_logical(s), p));
    }

    #[test]
    fn zoom_is_clamped() {
        let mut vp = Viewport::new(0.5, 2.0);
        vp.set_zoom(10.0);
        assert_eq!(vp.zoom(), 2.0);
        assert!(!vp.zoom_in(), "already at max");
        vp.set_zoom(f64::NAN);
        assert_eq!(vp.zoom(), 2.0);
        vp.set_zoom(0.0);
        assert_eq!(vp.zoom(), 0.5);
    }

    #[test]
    fn zoom_step_multiplies_and_divides() {
        let mut vp = Viewport::new(0.1, 5.0);
        assert!(vp.zoom_in());
        assert!((vp.zoom() - 1.2).abs() < 1e-12);
        assert!(vp.zoom_out());
        assert!((vp.zoom() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn zoom_to_point_keeps_anchor_fixed() {
        let mut vp = Viewport::new(0.1, 5.0);
        vp.pan(Vec2::new(40.0, 25.0));
        let screen = Point::new(320.0, 240.0);

        for z in [0.1, 0.37, 1.0, 2.5, 5.0] {
            let anchor = vp.screen_to_logical(screen);
            vp.zoom_to_point(screen, z);
            assert!(close(vp.logical_to_screen(anchor), screen), "zoom {z}");
        }
    }

    #[test]
    fn zoom_to_fit_centers_page() {
        let mut vp = Viewport::new(0.1, 5.0);
        let viewport = Size::new(1000.0, 800.0);
        let page = Size::new(595.0, 842.0);
        assert!(vp.zoom_to_fit(viewport, page, DEFAULT_FIT_PADDING));

        let expected = (800.0 / 842.0) * 0.9;
        assert!((vp.zoom() - expected).abs() < 1e-12);
        let pan = vp.pan_offset();
        assert!((pan.x - (1000.0 - 595.0 * expected) / 2.0).abs() < 1e-9);
        assert!((pan.y - (800.0 - 842.0 * expected) / 2.0).abs() < 1e-9);

        assert!(!vp.zoom_to_fit(Size::ZERO, page, 0.9));
    }

    #[test]
    fn centered_pan_uses_the_given_zoom() {
        let viewport = Size::new(1000.0, 800.0);
        let page = Size::new(600.0, 400.0);
        assert_eq!(Viewport::centered_pan(viewport, page, 1.0), Vec2::new(200.0, 200.0));
        assert_eq!(Viewport::centered_pan(viewport, page, 2.0), Vec2::new(-100.0, 0.0));

        let mut vp = Viewport::new(0.1, 5.0);
        vp.set_zoom(2.0);
        assert!(vp.center_canvas(viewport, page));
        assert_eq!(vp.pan_offset(), Vec2::new(-100.0, 0.0));
    }

    #[test]
    fn marquee_rect_maps_back_to_document() {
        let mut vp = Viewport::new(0.1, 5.0);
        vp.set_zoom(2.0);
        vp.pan(Vec2::new(10.0, 10.0));
        let r = vp.rect_to_logical(Rect::new(10.0, 10.0, 210.0, 110.0));
        assert_eq!(r, Rect::new(0.0, 0.0, 100.0, 50.0));
    }
}
