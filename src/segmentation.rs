//! Segmentation service: orientation normalization, resolution capping,
//! instance-mask merging, and transparent compositing
//!
//! The segmentation model itself is an external capability behind the
//! [`Segmenter`] trait; this module owns everything around one invocation
//! of it. Stateless, one call per photo.

use crate::{
    error::{CutoutError, Result},
    orientation::{self, Orientation},
    types::{composite_foreground, CutoutResult, SegmentationMask, FOREGROUND_THRESHOLD},
};
use image::DynamicImage;
use instant::Instant;
use tracing::{debug, instrument};

/// Default longest-side cap applied before segmentation, bounding latency
/// and memory for large captures.
pub const DEFAULT_MAX_DIMENSION: u32 = 2048;

/// External foreground-segmentation capability.
///
/// Implementations wrap whatever vision/ML stack is available; the core
/// only requires one synchronous call per image, returning one mask per
/// detected foreground instance. Must be `Send + Sync` so invocations can
/// run on the worker pool.
pub trait Segmenter: Send + Sync {
    /// Segment foreground instances of an upright image.
    ///
    /// Every returned mask must share the image's dimensions. An empty list
    /// means no foreground was detected.
    ///
    /// # Errors
    ///
    /// Implementations report undecodable input as
    /// [`CutoutError::InvalidInput`].
    fn segment(&self, image: &DynamicImage) -> Result<Vec<SegmentationMask>>;
}

/// Wraps the external segmentation capability into the full per-photo
/// processing step: normalize orientation, cap resolution, segment, merge
/// all instances, composite onto a transparent canvas.
pub struct SegmentationService {
    max_dimension: u32,
}

impl Default for SegmentationService {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_DIMENSION)
    }
}

impl SegmentationService {
    /// Create a service with the given longest-side cap
    #[must_use]
    pub fn new(max_dimension: u32) -> Self {
        Self {
            max_dimension: max_dimension.max(1),
        }
    }

    /// Run the full segmentation step for one photo.
    ///
    /// The returned composite and mask are in the working resolution: the
    /// upright image, downscaled if its longest side exceeded the cap.
    ///
    /// # Errors
    ///
    /// - [`CutoutError::InvalidInput`] for a zero-sized image
    /// - [`CutoutError::NoForeground`] when the capability detects nothing
    #[instrument(skip(self, segmenter, image), fields(width = image.width(), height = image.height()))]
    pub fn process(
        &self,
        segmenter: &dyn Segmenter,
        image: &DynamicImage,
        orientation: Orientation,
    ) -> Result<CutoutResult> {
        if image.width() == 0 || image.height() == 0 {
            return Err(CutoutError::invalid_input("Image has no pixels"));
        }

        let start = Instant::now();

        // All downstream coordinate spaces assume upright pixels
        let upright = orientation::normalize(image, orientation);
        let working = self.cap_resolution(upright);
        let working_dims = (working.width(), working.height());

        let instances = segmenter.segment(&working)?;
        debug!(
            instances = instances.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Segmentation returned"
        );
        if instances.is_empty() {
            return Err(CutoutError::NoForeground);
        }

        let mask = merge_instances(instances, working_dims)?;

        let rgba = working.to_rgba8();
        let image = composite_foreground(&rgba, &mask);

        debug!(
            width = working_dims.0,
            height = working_dims.1,
            foreground_pixels = mask.foreground_pixels(FOREGROUND_THRESHOLD),
            total_ms = start.elapsed().as_millis() as u64,
            "Cutout composited"
        );

        Ok(CutoutResult { image, mask })
    }

    /// Downscale preserving aspect ratio when the longest side exceeds the
    /// configured cap; otherwise pass the image through untouched.
    fn cap_resolution(&self, image: DynamicImage) -> DynamicImage {
        let (width, height) = (image.width(), image.height());
        if width.max(height) <= self.max_dimension {
            return image;
        }

        let resized = image.resize(
            self.max_dimension,
            self.max_dimension,
            image::imageops::FilterType::Triangle,
        );
        debug!(
            from = %format!("{width}x{height}"),
            to = %format!("{}x{}", resized.width(), resized.height()),
            "Capped input resolution"
        );
        resized
    }
}

/// Union every instance mask into one, validating alignment with the
/// working image.
fn merge_instances(
    instances: Vec<SegmentationMask>,
    expected_dims: (u32, u32),
) -> Result<SegmentationMask> {
    let mut iter = instances.into_iter();
    let mut merged = iter
        .next()
        .ok_or_else(|| CutoutError::internal("merge_instances called with no masks"))?;
    if merged.dimensions != expected_dims {
        return Err(CutoutError::internal(
            "Segmenter returned a mask misaligned with the image",
        ));
    }
    for instance in iter {
        merged.union(&instance)?;
    }
    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Segmenter marking a fixed horizontal band as foreground
    struct BandSegmenter {
        calls: AtomicUsize,
        instances: usize,
    }

    impl BandSegmenter {
        fn new(instances: usize) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                instances,
            }
        }
    }

    impl Segmenter for BandSegmenter {
        fn segment(&self, image: &DynamicImage) -> Result<Vec<SegmentationMask>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let (w, h) = (image.width(), image.height());
            let mut out = Vec::new();
            for i in 0..self.instances {
                let mut data = vec![0u8; (w * h) as usize];
                let band_start = h * i as u32 / (2 * self.instances.max(1) as u32);
                let band_end = band_start + h / (2 * self.instances.max(1) as u32);
                for y in band_start..band_end.min(h) {
                    for x in 0..w {
                        data[(y * w + x) as usize] = 255;
                    }
                }
                out.push(SegmentationMask::new(data, (w, h)));
            }
            Ok(out)
        }
    }

    fn solid_image(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(
            width,
            height,
            Rgba([90, 120, 150, 255]),
        ))
    }

    #[test]
    fn test_process_composites_foreground() {
        let service = SegmentationService::default();
        let segmenter = BandSegmenter::new(1);
        let result = service
            .process(&segmenter, &solid_image(8, 8), Orientation::Up)
            .unwrap();

        assert_eq!(result.dimensions(), (8, 8));
        assert_eq!(result.image.dimensions(), (8, 8));
        // Band rows keep their pixels, the rest is fully transparent
        assert_eq!(result.image.get_pixel(0, 0)[3], 255);
        assert_eq!(result.image.get_pixel(0, 7)[3], 0);
        assert_eq!(result.image.get_pixel(0, 7)[0], 0);
    }

    #[test]
    fn test_no_foreground_error() {
        struct EmptySegmenter;
        impl Segmenter for EmptySegmenter {
            fn segment(&self, _image: &DynamicImage) -> Result<Vec<SegmentationMask>> {
                Ok(Vec::new())
            }
        }

        let service = SegmentationService::default();
        let err = service
            .process(&EmptySegmenter, &solid_image(4, 4), Orientation::Up)
            .unwrap_err();
        assert!(matches!(err, CutoutError::NoForeground));
    }

    #[test]
    fn test_zero_sized_input_rejected() {
        let service = SegmentationService::default();
        let segmenter = BandSegmenter::new(1);
        let empty = DynamicImage::ImageRgba8(RgbaImage::new(0, 0));
        let err = service
            .process(&segmenter, &empty, Orientation::Up)
            .unwrap_err();
        assert!(matches!(err, CutoutError::InvalidInput(_)));
    }

    #[test]
    fn test_oversized_input_is_capped() {
        let service = SegmentationService::new(64);
        let segmenter = BandSegmenter::new(1);
        let result = service
            .process(&segmenter, &solid_image(512, 256), Orientation::Up)
            .unwrap();

        let (w, h) = result.dimensions();
        assert!(w.max(h) <= 64);
        // Aspect ratio preserved: 2:1
        assert_eq!((w, h), (64, 32));
        assert_eq!(result.image.dimensions(), result.mask.dimensions);
    }

    #[test]
    fn test_small_input_not_upscaled() {
        let service = SegmentationService::new(2048);
        let segmenter = BandSegmenter::new(1);
        let result = service
            .process(&segmenter, &solid_image(32, 16), Orientation::Up)
            .unwrap();
        assert_eq!(result.dimensions(), (32, 16));
    }

    #[test]
    fn test_instances_are_merged() {
        let service = SegmentationService::default();
        let two = BandSegmenter::new(2);
        let one = BandSegmenter::new(1);
        let img = solid_image(16, 16);

        let merged = service.process(&two, &img, Orientation::Up).unwrap();
        let single = service.process(&one, &img, Orientation::Up).unwrap();
        assert!(
            merged.mask.foreground_pixels(FOREGROUND_THRESHOLD)
                > single.mask.foreground_pixels(FOREGROUND_THRESHOLD) / 2
        );
        assert_eq!(two.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_rotated_orientation_normalized_before_segmentation() {
        let service = SegmentationService::default();
        let segmenter = BandSegmenter::new(1);
        // Stored sideways: 16 wide, 32 tall with a Right tag becomes a
        // 32x16 upright working image.
        let result = service
            .process(&segmenter, &solid_image(16, 32), Orientation::Right)
            .unwrap();
        assert_eq!(result.dimensions(), (32, 16));
    }
}
