//! Pure coordinate mapping from normalized contour space to display space
//!
//! Contours come out of the tracer in a normalized 0-1 space with an
//! inverted vertical axis (0 = bottom of the mask). Display surfaces use a
//! top-left origin with y growing downward. The mapper composes the
//! aspect-fit scale, the letterbox centering offset, and the vertical flip
//! into a single affine transform. Nothing here is cached against a display
//! size; callers recompute on every resize.

use serde::{Deserialize, Serialize};

/// A 2D point (f32 is plenty for display coordinates)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    #[must_use]
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// A closed ring of points; the segment from the last point back to the
/// first is implicit.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Polyline {
    points: Vec<Point>,
}

impl Polyline {
    #[must_use]
    pub fn new(points: Vec<Point>) -> Self {
        Self { points }
    }

    #[must_use]
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_x: f32,
    pub min_y: f32,
    pub max_x: f32,
    pub max_y: f32,
}

impl BoundingBox {
    #[must_use]
    pub fn width(&self) -> f32 {
        self.max_x - self.min_x
    }

    #[must_use]
    pub fn height(&self) -> f32 {
        self.max_y - self.min_y
    }
}

/// A compound vector path: one closed sub-path per connected top-level
/// region. Disjoint subjects in a group photo each contribute a sub-path.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct VectorPath {
    subpaths: Vec<Polyline>,
}

impl VectorPath {
    #[must_use]
    pub fn new(subpaths: Vec<Polyline>) -> Self {
        Self { subpaths }
    }

    #[must_use]
    pub fn subpaths(&self) -> &[Polyline] {
        &self.subpaths
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.subpaths.iter().all(Polyline::is_empty)
    }

    /// Bounding box over every sub-path, or `None` for an empty path
    #[must_use]
    pub fn bounding_box(&self) -> Option<BoundingBox> {
        let mut bbox: Option<BoundingBox> = None;
        for point in self.subpaths.iter().flat_map(Polyline::points) {
            let b = bbox.get_or_insert(BoundingBox {
                min_x: point.x,
                min_y: point.y,
                max_x: point.x,
                max_y: point.y,
            });
            b.min_x = b.min_x.min(point.x);
            b.min_y = b.min_y.min(point.y);
            b.max_x = b.max_x.max(point.x);
            b.max_y = b.max_y.max(point.y);
        }
        bbox
    }

    /// Apply an affine transform to every point
    #[must_use]
    pub fn transformed(&self, transform: &DisplayTransform) -> VectorPath {
        let subpaths = self
            .subpaths
            .iter()
            .map(|ring| {
                Polyline::new(ring.points().iter().map(|p| transform.apply(*p)).collect())
            })
            .collect();
        VectorPath::new(subpaths)
    }
}

/// Affine transform from normalized mask space (0-1, origin bottom-left)
/// into display space (points, origin top-left).
///
/// Column-free representation: `x' = sx * x + tx`, `y' = sy * y + ty`, with
/// `sy` negative to flip the vertical axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayTransform {
    sx: f32,
    sy: f32,
    tx: f32,
    ty: f32,
}

impl DisplayTransform {
    /// Fit `mask_size` (pixels) into `display_size` (points), preserving
    /// aspect ratio and centering the letterboxed rectangle.
    ///
    /// The drawn rectangle is `mask * scale` where
    /// `scale = min(dw/mw, dh/mh)`; the transform maps normalized (0,0)
    /// (bottom-left of the mask) to the bottom-left of that rectangle and
    /// (1,1) to its top-right.
    #[must_use]
    pub fn fit(mask_size: (u32, u32), display_size: (f32, f32)) -> Self {
        let (mask_w, mask_h) = (mask_size.0.max(1) as f32, mask_size.1.max(1) as f32);
        let (display_w, display_h) = display_size;

        let scale = (display_w / mask_w).min(display_h / mask_h);
        let drawn_w = mask_w * scale;
        let drawn_h = mask_h * scale;
        let offset_x = (display_w - drawn_w) / 2.0;
        let offset_y = (display_h - drawn_h) / 2.0;

        // Translate to the letterbox origin shifted by the drawn height,
        // then scale with a negated vertical axis. Same composition as
        // translate(offset_x, offset_y + drawn_h) * scale(drawn_w, -drawn_h).
        Self {
            sx: drawn_w,
            sy: -drawn_h,
            tx: offset_x,
            ty: offset_y + drawn_h,
        }
    }

    /// Map a normalized point into display space
    #[must_use]
    pub fn apply(&self, p: Point) -> Point {
        Point::new(self.sx * p.x + self.tx, self.sy * p.y + self.ty)
    }
}

/// Map a normalized-space path into a display rectangle (aspect fit).
///
/// Pure; call again whenever the display size changes.
#[must_use]
pub fn map_to_display(
    path: &VectorPath,
    mask_size: (u32, u32),
    display_size: (f32, f32),
) -> VectorPath {
    path.transformed(&DisplayTransform::fit(mask_size, display_size))
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-4;

    fn assert_point(p: Point, x: f32, y: f32) {
        assert!(
            (p.x - x).abs() < EPS && (p.y - y).abs() < EPS,
            "expected ({x}, {y}), got ({}, {})",
            p.x,
            p.y
        );
    }

    fn unit_corners() -> VectorPath {
        VectorPath::new(vec![Polyline::new(vec![
            Point::new(0.0, 0.0), // bottom-left of the mask
            Point::new(1.0, 0.0),
            Point::new(1.0, 1.0), // top-right of the mask
            Point::new(0.0, 1.0),
        ])])
    }

    #[test]
    fn test_square_mask_in_wide_rect() {
        // Square mask in a 2:1 display: letterboxed left/right by 50.
        let t = DisplayTransform::fit((100, 100), (200.0, 100.0));

        // Normalized bottom-left lands at the bottom-left of the centered
        // square, in top-left-origin display coordinates.
        assert_point(t.apply(Point::new(0.0, 0.0)), 50.0, 100.0);
        assert_point(t.apply(Point::new(1.0, 1.0)), 150.0, 0.0);
        assert_point(t.apply(Point::new(0.5, 0.5)), 100.0, 50.0);
    }

    #[test]
    fn test_square_mask_in_tall_rect() {
        let t = DisplayTransform::fit((100, 100), (100.0, 200.0));
        assert_point(t.apply(Point::new(0.0, 0.0)), 0.0, 150.0);
        assert_point(t.apply(Point::new(1.0, 1.0)), 100.0, 50.0);
    }

    #[test]
    fn test_exact_fit_flips_vertical_axis_only() {
        let t = DisplayTransform::fit((200, 100), (200.0, 100.0));
        assert_point(t.apply(Point::new(0.0, 0.0)), 0.0, 100.0);
        assert_point(t.apply(Point::new(1.0, 0.0)), 200.0, 100.0);
        assert_point(t.apply(Point::new(1.0, 1.0)), 200.0, 0.0);
    }

    #[test]
    fn test_downscaled_fit() {
        // 400x200 mask into 100x100 display: scale 0.25, drawn 100x50,
        // vertically centered with 25 above and below.
        let t = DisplayTransform::fit((400, 200), (100.0, 100.0));
        assert_point(t.apply(Point::new(0.0, 0.0)), 0.0, 75.0);
        assert_point(t.apply(Point::new(1.0, 1.0)), 100.0, 25.0);
    }

    #[test]
    fn test_map_to_display_path() {
        let mapped = map_to_display(&unit_corners(), (100, 100), (200.0, 100.0));
        let ring = &mapped.subpaths()[0];
        assert_point(ring.points()[0], 50.0, 100.0);
        assert_point(ring.points()[1], 150.0, 100.0);
        assert_point(ring.points()[2], 150.0, 0.0);
        assert_point(ring.points()[3], 50.0, 0.0);
    }

    #[test]
    fn test_recompute_on_resize() {
        let path = unit_corners();
        let small = map_to_display(&path, (100, 100), (100.0, 100.0));
        let large = map_to_display(&path, (100, 100), (300.0, 300.0));
        assert_point(small.subpaths()[0].points()[2], 100.0, 0.0);
        assert_point(large.subpaths()[0].points()[2], 300.0, 0.0);
    }

    #[test]
    fn test_bounding_box() {
        let path = VectorPath::new(vec![
            Polyline::new(vec![Point::new(0.1, 0.2), Point::new(0.4, 0.3)]),
            Polyline::new(vec![Point::new(0.6, 0.7), Point::new(0.9, 0.5)]),
        ]);
        let bbox = path.bounding_box().unwrap();
        assert!((bbox.min_x - 0.1).abs() < EPS);
        assert!((bbox.max_x - 0.9).abs() < EPS);
        assert!((bbox.min_y - 0.2).abs() < EPS);
        assert!((bbox.max_y - 0.7).abs() < EPS);
        assert!((bbox.width() - 0.8).abs() < EPS);
        assert!((bbox.height() - 0.5).abs() < EPS);
    }

    #[test]
    fn test_empty_path() {
        let path = VectorPath::default();
        assert!(path.is_empty());
        assert!(path.bounding_box().is_none());
    }
}
