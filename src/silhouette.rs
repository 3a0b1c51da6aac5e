//! Silhouette outline extraction from binary foreground masks
//!
//! Traces the boundary of the foreground (the "light" region), smooths the
//! blocky tracer output, and merges every top-level closed curve into one
//! compound path. The path is produced in a normalized 0-1 space with an
//! inverted vertical axis (0 = bottom); [`crate::geometry`] maps it into a
//! display rectangle.

use crate::{
    error::{CutoutError, Result},
    geometry::{Point, Polyline, VectorPath},
    types::{SegmentationMask, FOREGROUND_THRESHOLD},
};
use image::GrayImage;
use imageproc::contours::{find_contours, BorderType, Contour};
use tracing::debug;

/// Default number of corner-cutting passes; the wide sticker stroke applied
/// later smooths the visual result further, so a small count suffices.
pub const DEFAULT_SMOOTHING_PASSES: usize = 2;

/// Trait for contour tracing strategies.
///
/// Input: a binary mask (white pixels = foreground, black = background).
/// Output: one closed ring of pixel coordinates per traced border.
pub trait ContourTracer: Send + Sync {
    /// Trace closed borders in the given binary mask
    fn trace(&self, mask: &GrayImage) -> Vec<Vec<(u32, u32)>>;
}

/// Suzuki-Abe border following via `imageproc::contours::find_contours`.
///
/// Keeps only top-level outer borders: one ring per connected foreground
/// region, holes and nested borders discarded.
#[derive(Debug, Clone, Copy, Default)]
pub struct BorderFollowing;

impl ContourTracer for BorderFollowing {
    fn trace(&self, mask: &GrayImage) -> Vec<Vec<(u32, u32)>> {
        let contours: Vec<Contour<u32>> = find_contours(mask);

        contours
            .into_iter()
            .filter(|c| c.border_type == BorderType::Outer && c.parent.is_none())
            .filter(|c| c.points.len() >= 3)
            .map(|c| c.points.into_iter().map(|p| (p.x, p.y)).collect())
            .collect()
    }
}

/// Extracts a smoothed closed vector outline from a segmentation mask.
pub struct SilhouetteExtractor {
    tracer: Box<dyn ContourTracer>,
    smoothing_passes: usize,
    foreground_threshold: u8,
}

impl Default for SilhouetteExtractor {
    fn default() -> Self {
        Self::new(DEFAULT_SMOOTHING_PASSES, FOREGROUND_THRESHOLD)
    }
}

impl SilhouetteExtractor {
    /// Create an extractor using the default border-following tracer.
    ///
    /// Mask values strictly above `foreground_threshold` count as
    /// foreground when the soft mask is binarized for tracing.
    #[must_use]
    pub fn new(smoothing_passes: usize, foreground_threshold: u8) -> Self {
        Self {
            tracer: Box::new(BorderFollowing),
            smoothing_passes,
            foreground_threshold,
        }
    }

    /// Create an extractor with a custom tracing strategy
    #[must_use]
    pub fn with_tracer(
        tracer: Box<dyn ContourTracer>,
        smoothing_passes: usize,
        foreground_threshold: u8,
    ) -> Self {
        Self {
            tracer,
            smoothing_passes,
            foreground_threshold,
        }
    }

    /// Extract the silhouette outline of the mask's foreground.
    ///
    /// Returns a compound path with one closed sub-path per disjoint
    /// subject, in normalized bottom-left-origin coordinates.
    ///
    /// # Errors
    ///
    /// Returns [`CutoutError::DegenerateContour`] when nothing usable was
    /// traced: no contours, or the traced outline hugs the full image
    /// border (a sign the tracer captured the frame, not the subject).
    /// Callers fall back to rendering the flat cutout without a border.
    pub fn extract_outline(&self, mask: &SegmentationMask) -> Result<VectorPath> {
        let (width, height) = mask.dimensions;
        if width == 0 || height == 0 {
            return Err(CutoutError::invalid_input("Empty mask"));
        }

        let binary = binarize(mask, self.foreground_threshold)?;
        let rings = self.tracer.trace(&binary);
        debug!(contours = rings.len(), "Traced mask borders");

        let mut subpaths = Vec::with_capacity(rings.len());
        for ring in rings {
            let mut points = normalize_ring(&ring, width, height);
            for _ in 0..self.smoothing_passes {
                points = cut_corners(&points);
            }
            subpaths.push(Polyline::new(points));
        }

        let path = VectorPath::new(subpaths);
        if path.is_empty() {
            return Err(CutoutError::degenerate_contour("No contours traced"));
        }
        if covers_full_extent(&path, width, height) {
            return Err(CutoutError::degenerate_contour(
                "Outline spans the full image border",
            ));
        }

        Ok(path)
    }
}

/// Threshold the soft mask into a strict binary image (foreground = white)
fn binarize(mask: &SegmentationMask, threshold: u8) -> Result<GrayImage> {
    let (width, height) = mask.dimensions;
    let data = (0..mask.data.len())
        .map(|i| if mask.is_foreground(i, threshold) { 255 } else { 0 })
        .collect();
    GrayImage::from_raw(width, height, data)
        .ok_or_else(|| CutoutError::internal("Mask data does not match its dimensions"))
}

/// Convert pixel-grid ring coordinates to the normalized 0-1 space with the
/// vertical axis inverted (0 = bottom). Pixel centers, not corners.
fn normalize_ring(ring: &[(u32, u32)], width: u32, height: u32) -> Vec<Point> {
    let (w, h) = (width as f32, height as f32);
    ring.iter()
        .map(|&(x, y)| Point::new((x as f32 + 0.5) / w, 1.0 - (y as f32 + 0.5) / h))
        .collect()
}

/// One corner-cutting pass over a closed ring: each edge (including the
/// closing edge) is replaced by two points at its 1/4 and 3/4 interpolation.
fn cut_corners(ring: &[Point]) -> Vec<Point> {
    if ring.len() < 3 {
        return ring.to_vec();
    }
    let mut out = Vec::with_capacity(ring.len() * 2);
    for (i, p0) in ring.iter().enumerate() {
        let p1 = ring[(i + 1) % ring.len()];
        out.push(Point::new(
            0.75 * p0.x + 0.25 * p1.x,
            0.75 * p0.y + 0.25 * p1.y,
        ));
        out.push(Point::new(
            0.25 * p0.x + 0.75 * p1.x,
            0.25 * p0.y + 0.75 * p1.y,
        ));
    }
    out
}

/// Whether the path's bounding box reaches within one pixel of all four
/// image borders. Such an outline traces the frame rather than a subject.
fn covers_full_extent(path: &VectorPath, width: u32, height: u32) -> bool {
    let Some(bbox) = path.bounding_box() else {
        return false;
    };
    let px = 1.5 / width as f32;
    let py = 1.5 / height as f32;
    bbox.min_x <= px && bbox.min_y <= py && bbox.max_x >= 1.0 - px && bbox.max_y >= 1.0 - py
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mask_with_rect(
        width: u32,
        height: u32,
        x0: u32,
        y0: u32,
        x1: u32,
        y1: u32,
    ) -> SegmentationMask {
        let mut data = vec![0u8; (width * height) as usize];
        for y in y0..y1 {
            for x in x0..x1 {
                data[(y * width + x) as usize] = 255;
            }
        }
        SegmentationMask::new(data, (width, height))
    }

    #[test]
    fn test_empty_mask_is_degenerate() {
        let mask = SegmentationMask::new(vec![0u8; 40 * 40], (40, 40));
        let err = SilhouetteExtractor::default()
            .extract_outline(&mask)
            .unwrap_err();
        assert!(err.is_degenerate_contour());
    }

    #[test]
    fn test_full_mask_is_degenerate() {
        let mask = SegmentationMask::new(vec![255u8; 40 * 40], (40, 40));
        let err = SilhouetteExtractor::default()
            .extract_outline(&mask)
            .unwrap_err();
        assert!(err.is_degenerate_contour());
    }

    #[test]
    fn test_single_blob_outline() {
        // Blob in the upper-left quadrant of the mask (small pixel y).
        let mask = mask_with_rect(40, 40, 4, 4, 16, 16);
        let path = SilhouetteExtractor::default()
            .extract_outline(&mask)
            .unwrap();

        assert_eq!(path.subpaths().len(), 1);
        let bbox = path.bounding_box().unwrap();
        // Upper half of the image means the top of the normalized, y-up space
        assert!(bbox.min_y > 0.5, "expected outline in y-up top half");
        assert!(bbox.max_x < 0.5);
    }

    #[test]
    fn test_group_photo_yields_compound_path() {
        // Two disjoint blobs produce two closed sub-paths in one path.
        let mut mask = mask_with_rect(60, 40, 5, 5, 20, 20);
        let second = mask_with_rect(60, 40, 35, 18, 55, 35);
        mask.union(&second).unwrap();

        let path = SilhouetteExtractor::default()
            .extract_outline(&mask)
            .unwrap();
        assert_eq!(path.subpaths().len(), 2);
    }

    #[test]
    fn test_corner_cutting_doubles_points_per_pass() {
        let ring = vec![
            Point::new(0.0, 0.0),
            Point::new(1.0, 0.0),
            Point::new(1.0, 1.0),
            Point::new(0.0, 1.0),
        ];
        let once = cut_corners(&ring);
        assert_eq!(once.len(), 8);
        let twice = cut_corners(&once);
        assert_eq!(twice.len(), 16);

        // First cut point of the bottom edge sits at the 1/4 interpolation
        assert!((once[0].x - 0.25).abs() < 1e-6);
        assert!(once[0].y.abs() < 1e-6);
    }

    #[test]
    fn test_corner_cutting_stays_in_hull() {
        let mask = mask_with_rect(40, 40, 10, 10, 30, 30);
        let path = SilhouetteExtractor::default()
            .extract_outline(&mask)
            .unwrap();
        let bbox = path.bounding_box().unwrap();
        // Smoothing only ever interpolates between existing points
        assert!(bbox.min_x >= 10.0 / 40.0 - 1e-4);
        assert!(bbox.max_x <= 30.0 / 40.0 + 1e-4);
    }

    #[test]
    fn test_threshold_governs_what_gets_traced() {
        // A soft blob at value 100 is background at the default cutoff but
        // foreground at a lower one.
        let mut mask = mask_with_rect(40, 40, 10, 10, 30, 30);
        for value in &mut mask.data {
            if *value == 255 {
                *value = 100;
            }
        }

        let err = SilhouetteExtractor::default()
            .extract_outline(&mask)
            .unwrap_err();
        assert!(err.is_degenerate_contour());

        let path = SilhouetteExtractor::new(DEFAULT_SMOOTHING_PASSES, 60)
            .extract_outline(&mask)
            .unwrap();
        assert_eq!(path.subpaths().len(), 1);
    }

    #[test]
    fn test_smoothing_disabled() {
        let mask = mask_with_rect(40, 40, 10, 10, 30, 30);
        let raw = SilhouetteExtractor::new(0, FOREGROUND_THRESHOLD)
            .extract_outline(&mask)
            .unwrap();
        let smoothed = SilhouetteExtractor::new(2, FOREGROUND_THRESHOLD)
            .extract_outline(&mask)
            .unwrap();
        assert_eq!(
            smoothed.subpaths()[0].len(),
            raw.subpaths()[0].len() * 4,
            "two passes quadruple the point count"
        );
    }
}
