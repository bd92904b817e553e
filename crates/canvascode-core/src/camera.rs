//! Viewport transform between screen and canvas space.

use kurbo::{Point, Rect, Size, Vec2};

/// Minimum zoom factor.
pub const MIN_SCALE: f64 = 0.1;
/// Maximum zoom factor.
pub const MAX_SCALE: f64 = 5.0;
/// Increment used by discrete zoom in/out steps.
pub const SCALE_STEP: f64 = 0.1;

/// Pan/zoom state of the canvas view.
///
/// `x`/`y` are the screen-pixel offset of the canvas origin; `scale` is the
/// uniform zoom factor. `screen = canvas * scale + offset`. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub x: f64,
    pub y: f64,
    pub scale: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            scale: 1.0,
        }
    }
}

impl Viewport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map a screen-space point into canvas space.
    pub fn screen_to_canvas(&self, screen: Point) -> Point {
        Point::new((screen.x - self.x) / self.scale, (screen.y - self.y) / self.scale)
    }

    /// Map a canvas-space point into screen space.
    pub fn canvas_to_screen(&self, canvas: Point) -> Point {
        Point::new(canvas.x * self.scale + self.x, canvas.y * self.scale + self.y)
    }

    /// Map a screen-space rectangle into canvas space. Valid because the
    /// transform is axis-aligned.
    pub fn rect_to_canvas(&self, screen: Rect) -> Rect {
        let p0 = self.screen_to_canvas(Point::new(screen.x0, screen.y0));
        let p1 = self.screen_to_canvas(Point::new(screen.x1, screen.y1));
        Rect::from_points(p0, p1)
    }

    /// Translate the view by a screen-pixel delta.
    pub fn pan(&mut self, delta: Vec2) {
        self.x += delta.x;
        self.y += delta.y;
    }

    /// Set the zoom so the canvas point under `screen_point` stays put.
    pub fn zoom_at(&mut self, screen_point: Point, new_scale: f64) {
        let new_scale = new_scale.clamp(MIN_SCALE, MAX_SCALE);
        let anchor = self.screen_to_canvas(screen_point);
        self.scale = new_scale;
        self.x = screen_point.x - anchor.x * self.scale;
        self.y = screen_point.y - anchor.y * self.scale;
    }

    /// Zoom one step in around `screen_point`.
    pub fn zoom_in(&mut self, screen_point: Point) {
        self.zoom_at(screen_point, self.scale + SCALE_STEP);
    }

    /// Zoom one step out around `screen_point`.
    pub fn zoom_out(&mut self, screen_point: Point) {
        self.zoom_at(screen_point, self.scale - SCALE_STEP);
    }

    /// Back to the identity view.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Fit `bounds` (canvas space) inside a view of `view_size` screen pixels,
    /// leaving `padding` screen pixels on each side.
    pub fn fit_to_bounds(&mut self, bounds: Rect, view_size: Size, padding: f64) {
        if bounds.width() <= 0.0 || bounds.height() <= 0.0 {
            return;
        }
        let avail_w = (view_size.width - padding * 2.0).max(1.0);
        let avail_h = (view_size.height - padding * 2.0).max(1.0);
        let scale = (avail_w / bounds.width())
            .min(avail_h / bounds.height())
            .clamp(MIN_SCALE, MAX_SCALE);
        self.scale = scale;
        let center = bounds.center();
        self.x = view_size.width / 2.0 - center.x * scale;
        self.y = view_size.height / 2.0 - center.y * scale;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let mut vp = Viewport::new();
        vp.pan(Vec2::new(37.0, -12.0));
        vp.zoom_at(Point::new(100.0, 80.0), 1.7);
        let canvas = Point::new(42.5, -9.25);
        let back = vp.screen_to_canvas(vp.canvas_to_screen(canvas));
        assert!((back.x - canvas.x).abs() < 1e-9);
        assert!((back.y - canvas.y).abs() < 1e-9);
    }

    #[test]
    fn test_zoom_at_keeps_cursor_point_fixed() {
        let mut vp = Viewport::new();
        vp.pan(Vec2::new(50.0, 20.0));
        let cursor = Point::new(300.0, 200.0);
        let before = vp.screen_to_canvas(cursor);
        vp.zoom_at(cursor, 2.5);
        let after = vp.screen_to_canvas(cursor);
        assert!((before.x - after.x).abs() < 1e-9);
        assert!((before.y - after.y).abs() < 1e-9);
    }

    #[test]
    fn test_scale_clamped() {
        let mut vp = Viewport::new();
        vp.zoom_at(Point::ZERO, 100.0);
        assert!((vp.scale - MAX_SCALE).abs() < f64::EPSILON);
        vp.zoom_at(Point::ZERO, 0.0);
        assert!((vp.scale - MIN_SCALE).abs() < f64::EPSILON);
    }

    #[test]
    fn test_step_zoom_saturates() {
        let mut vp = Viewport::new();
        for _ in 0..100 {
            vp.zoom_in(Point::ZERO);
        }
        assert!((vp.scale - MAX_SCALE).abs() < 1e-9);
        for _ in 0..100 {
            vp.zoom_out(Point::ZERO);
        }
        assert!((vp.scale - MIN_SCALE).abs() < 1e-9);
    }

    #[test]
    fn test_fit_to_bounds_centers_content() {
        let mut vp = Viewport::new();
        let bounds = Rect::new(0.0, 0.0, 200.0, 100.0);
        vp.fit_to_bounds(bounds, Size::new(800.0, 600.0), 40.0);
        let screen_center = vp.canvas_to_screen(bounds.center());
        assert!((screen_center.x - 400.0).abs() < 1e-9);
        assert!((screen_center.y - 300.0).abs() < 1e-9);
    }
}
