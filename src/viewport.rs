//! Coordinate mapping between world space (where nodes live) and screen space
//! (where pixels are drawn).
//!
//! The viewport is a uniform scale (`zoom`) followed by a screen-space translation
//! (`offset`). All math is done in `f64`; the egui shell narrows to `f32` only when
//! it paints.

use crate::constants::{ZOOM_MAX, ZOOM_MIN};
use serde::{Deserialize, Serialize};
use std::ops::{Add, Div, Mul, Sub};

/// A 2D point. Used for both world and screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal coordinate
    pub x: f64,
    /// Vertical coordinate
    pub y: f64,
}

impl Point {
    /// The origin.
    pub const ZERO: Point = Point { x: 0.0, y: 0.0 };

    /// Creates a point from its coordinates.
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Returns true if both coordinates are finite.
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Point {
    type Output = Point;

    fn mul(self, rhs: f64) -> Point {
        Point::new(self.x * rhs, self.y * rhs)
    }
}

impl Div<f64> for Point {
    type Output = Point;

    fn div(self, rhs: f64) -> Point {
        Point::new(self.x / rhs, self.y / rhs)
    }
}

/// An axis-aligned rectangle stored as its top-left corner plus size.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Left edge
    pub min_x: f64,
    /// Top edge
    pub min_y: f64,
    /// Horizontal extent (never negative)
    pub width: f64,
    /// Vertical extent (never negative)
    pub height: f64,
}

impl BoundingBox {
    /// Builds a box from its two extreme corners. Corners may be given in any order.
    pub fn from_min_max(min: Point, max: Point) -> Self {
        let min_x = min.x.min(max.x);
        let min_y = min.y.min(max.y);
        Self {
            min_x,
            min_y,
            width: (max.x - min.x).abs(),
            height: (max.y - min.y).abs(),
        }
    }

    /// Right edge.
    pub fn max_x(&self) -> f64 {
        self.min_x + self.width
    }

    /// Bottom edge.
    pub fn max_y(&self) -> f64 {
        self.min_y + self.height
    }

    /// Top-left corner.
    pub fn min(&self) -> Point {
        Point::new(self.min_x, self.min_y)
    }

    /// Bottom-right corner.
    pub fn max(&self) -> Point {
        Point::new(self.max_x(), self.max_y())
    }

    /// Smallest box enclosing both `self` and `other`.
    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox::from_min_max(
            Point::new(self.min_x.min(other.min_x), self.min_y.min(other.min_y)),
            Point::new(self.max_x().max(other.max_x()), self.max_y().max(other.max_y())),
        )
    }

    /// Grows the box by `padding` on every side.
    pub fn expand(&self, padding: f64) -> BoundingBox {
        BoundingBox {
            min_x: self.min_x - padding,
            min_y: self.min_y - padding,
            width: self.width + padding * 2.0,
            height: self.height + padding * 2.0,
        }
    }

    /// Returns true if `point` lies inside the box (edges inclusive).
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.min_x
            && point.x <= self.max_x()
            && point.y >= self.min_y
            && point.y <= self.max_y()
    }
}

/// The visible screen-space size of the canvas, owned by the host layout.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CanvasDimensions {
    /// Width in pixels
    pub width: f64,
    /// Height in pixels
    pub height: f64,
}

impl CanvasDimensions {
    /// Creates canvas dimensions, treating negative or non-finite sizes as zero.
    pub fn new(width: f64, height: f64) -> Self {
        let sanitize = |v: f64| if v.is_finite() && v > 0.0 { v } else { 0.0 };
        Self {
            width: sanitize(width),
            height: sanitize(height),
        }
    }
}

/// Pan offset and zoom factor of the canvas.
///
/// `zoom` is kept inside `[ZOOM_MIN, ZOOM_MAX]` by every constructor and mutator,
/// including deserialization, so the transform can always be inverted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawViewport")]
pub struct ViewportState {
    offset: Point,
    zoom: f64,
}

#[derive(Deserialize)]
struct RawViewport {
    #[serde(default)]
    offset: Point,
    #[serde(default = "default_zoom")]
    zoom: f64,
}

fn default_zoom() -> f64 {
    1.0
}

impl From<RawViewport> for ViewportState {
    fn from(raw: RawViewport) -> Self {
        ViewportState::new(raw.offset, raw.zoom)
    }
}

impl Default for ViewportState {
    fn default() -> Self {
        Self {
            offset: Point::ZERO,
            zoom: 1.0,
        }
    }
}

/// Clamps a zoom factor into the accepted range. Non-finite values map to 1.
pub fn clamp_zoom(zoom: f64) -> f64 {
    if zoom.is_finite() {
        zoom.clamp(ZOOM_MIN, ZOOM_MAX)
    } else {
        1.0
    }
}

impl ViewportState {
    /// Creates a viewport; `zoom` is clamped and a non-finite offset is reset to the origin.
    pub fn new(offset: Point, zoom: f64) -> Self {
        Self {
            offset: if offset.is_finite() { offset } else { Point::ZERO },
            zoom: clamp_zoom(zoom),
        }
    }

    /// Screen-space translation applied after scaling.
    pub fn offset(&self) -> Point {
        self.offset
    }

    /// Current zoom factor.
    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    /// Maps a world-space point to screen space.
    pub fn world_to_screen(&self, world: Point) -> Point {
        world * self.zoom + self.offset
    }

    /// Maps a screen-space point to world space. Exact inverse of [`Self::world_to_screen`].
    pub fn screen_to_world(&self, screen: Point) -> Point {
        (screen - self.offset) / self.zoom
    }

    /// Translates the view by a screen-space delta. Zoom does not affect the delta.
    pub fn pan_by(&mut self, dx: f64, dy: f64) {
        if !(dx.is_finite() && dy.is_finite()) {
            log::warn!("ignoring non-finite pan delta ({dx}, {dy})");
            return;
        }
        self.offset = self.offset + Point::new(dx, dy);
    }

    /// Multiplies the zoom by `factor` while keeping the world point under
    /// `anchor` (a screen point) fixed on screen.
    ///
    /// Offset and zoom are computed first and assigned together, so no caller can
    /// observe a half-updated transform.
    pub fn zoom_at(&mut self, anchor: Point, factor: f64) {
        if !(factor.is_finite() && factor > 0.0) || !anchor.is_finite() {
            log::warn!("ignoring zoom by {factor} at ({}, {})", anchor.x, anchor.y);
            return;
        }
        let world_anchor = self.screen_to_world(anchor);
        let zoom = clamp_zoom(self.zoom * factor);
        let offset = anchor - world_anchor * zoom;
        *self = Self { offset, zoom };
    }

    /// The part of world space currently visible in a canvas of the given size.
    pub fn visible_world_box(&self, dimensions: CanvasDimensions) -> BoundingBox {
        let min = self.screen_to_world(Point::ZERO);
        BoundingBox {
            min_x: min.x,
            min_y: min.y,
            width: dimensions.width / self.zoom,
            height: dimensions.height / self.zoom,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn assert_close(a: Point, b: Point) {
        assert!(
            (a.x - b.x).abs() < EPS && (a.y - b.y).abs() < EPS,
            "{a:?} != {b:?}"
        );
    }

    #[test]
    fn world_to_screen_applies_zoom_then_offset() {
        let viewport = ViewportState::new(Point::new(50.0, 50.0), 2.0);
        let screen = viewport.world_to_screen(Point::new(100.0, 100.0));
        assert_close(screen, Point::new(250.0, 250.0));
    }

    #[test]
    fn screen_to_world_inverts_world_to_screen() {
        let viewports = [
            ViewportState::default(),
            ViewportState::new(Point::new(-340.5, 12.25), 0.3),
            ViewportState::new(Point::new(1e4, -7.0), 4.75),
        ];
        let points = [
            Point::new(0.0, 0.0),
            Point::new(123.456, -987.654),
            Point::new(-1e5, 3.5e4),
        ];
        for viewport in viewports {
            for p in points {
                let back = viewport.screen_to_world(viewport.world_to_screen(p));
                assert!((back.x - p.x).abs() < 1e-9 * p.x.abs().max(1.0));
                assert!((back.y - p.y).abs() < 1e-9 * p.y.abs().max(1.0));
            }
        }
    }

    #[test]
    fn pan_is_screen_space_and_ignores_zoom() {
        let mut viewport = ViewportState::new(Point::ZERO, 3.0);
        viewport.pan_by(10.0, -5.0);
        assert_close(viewport.offset(), Point::new(10.0, -5.0));
        assert_eq!(viewport.zoom(), 3.0);
    }

    #[test]
    fn pan_ignores_non_finite_delta() {
        let mut viewport = ViewportState::default();
        viewport.pan_by(f64::NAN, 1.0);
        assert_eq!(viewport, ViewportState::default());
    }

    #[test]
    fn zoom_at_keeps_anchor_fixed() {
        let mut viewport = ViewportState::default();
        let anchor = Point::new(100.0, 100.0);
        let world_before = viewport.screen_to_world(anchor);

        viewport.zoom_at(anchor, 2.0);

        assert_eq!(viewport.zoom(), 2.0);
        assert_close(viewport.world_to_screen(world_before), anchor);
        assert_close(viewport.offset(), Point::new(-100.0, -100.0));
    }

    #[test]
    fn zoom_at_clamps_and_still_preserves_anchor() {
        let mut viewport = ViewportState::new(Point::new(30.0, -20.0), 4.0);
        let anchor = Point::new(400.0, 250.0);
        let world_before = viewport.screen_to_world(anchor);

        viewport.zoom_at(anchor, 10.0);
        assert_eq!(viewport.zoom(), ZOOM_MAX);
        assert_close(viewport.world_to_screen(world_before), anchor);

        viewport.zoom_at(anchor, 1e-6);
        assert_eq!(viewport.zoom(), ZOOM_MIN);
        assert_close(viewport.world_to_screen(world_before), anchor);
    }

    #[test]
    fn zoom_at_rejects_degenerate_factor() {
        let mut viewport = ViewportState::new(Point::new(5.0, 5.0), 1.5);
        let before = viewport;
        viewport.zoom_at(Point::new(1.0, 1.0), 0.0);
        viewport.zoom_at(Point::new(1.0, 1.0), -2.0);
        viewport.zoom_at(Point::new(1.0, 1.0), f64::INFINITY);
        assert_eq!(viewport, before);
    }

    #[test]
    fn constructor_clamps_zoom() {
        assert_eq!(ViewportState::new(Point::ZERO, 0.0).zoom(), ZOOM_MIN);
        assert_eq!(ViewportState::new(Point::ZERO, 99.0).zoom(), ZOOM_MAX);
        assert_eq!(ViewportState::new(Point::ZERO, f64::NAN).zoom(), 1.0);
    }

    #[test]
    fn deserialization_clamps_zoom() {
        let viewport: ViewportState =
            serde_json::from_str(r#"{"offset":{"x":1.0,"y":2.0},"zoom":0.0}"#).unwrap();
        assert_eq!(viewport.zoom(), ZOOM_MIN);
        assert_eq!(viewport.offset(), Point::new(1.0, 2.0));
    }

    #[test]
    fn visible_world_box_matches_inverse_transform() {
        let viewport = ViewportState::new(Point::new(-200.0, 100.0), 2.0);
        let visible = viewport.visible_world_box(CanvasDimensions::new(800.0, 600.0));
        assert_eq!(visible.min(), Point::new(100.0, -50.0));
        assert_eq!(visible.width, 400.0);
        assert_eq!(visible.height, 300.0);
    }

    #[test]
    fn bounding_box_union_and_expand() {
        let a = BoundingBox::from_min_max(Point::new(0.0, 0.0), Point::new(10.0, 10.0));
        let b = BoundingBox::from_min_max(Point::new(5.0, -5.0), Point::new(20.0, 3.0));
        let u = a.union(&b).expand(2.0);
        assert_eq!(u.min(), Point::new(-2.0, -7.0));
        assert_eq!(u.max(), Point::new(22.0, 12.0));
    }
}
