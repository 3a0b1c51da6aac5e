//! Core types shared across the cutout pipeline

use crate::error::{CutoutError, Result};
use image::{ImageBuffer, Rgba, RgbaImage};
use serde::{Deserialize, Serialize};

/// Default cutoff for binary foreground decisions; mask values strictly
/// above it count as foreground
pub const FOREGROUND_THRESHOLD: u8 = 127;

/// Single-channel segmentation mask aligned pixel-for-pixel with the image
/// it was produced from.
///
/// Values are soft (0-255); binary decisions take an explicit threshold,
/// [`FOREGROUND_THRESHOLD`] by default.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentationMask {
    /// Mask data as grayscale values (0-255)
    pub data: Vec<u8>,

    /// Mask dimensions (width, height)
    pub dimensions: (u32, u32),
}

impl SegmentationMask {
    /// Create a new segmentation mask
    #[must_use]
    pub fn new(data: Vec<u8>, dimensions: (u32, u32)) -> Self {
        Self { data, dimensions }
    }

    /// Create mask from a grayscale image
    #[must_use]
    pub fn from_image(image: &ImageBuffer<image::Luma<u8>, Vec<u8>>) -> Self {
        let (width, height) = image.dimensions();
        Self::new(image.as_raw().clone(), (width, height))
    }

    /// Convert mask to a grayscale image
    pub fn to_image(&self) -> Result<ImageBuffer<image::Luma<u8>, Vec<u8>>> {
        let (width, height) = self.dimensions;
        ImageBuffer::from_raw(width, height, self.data.clone())
            .ok_or_else(|| CutoutError::internal("Mask data does not match its dimensions"))
    }

    /// Whether the pixel at linear index `i` belongs to the foreground
    #[must_use]
    pub fn is_foreground(&self, i: usize, threshold: u8) -> bool {
        self.data.get(i).copied().unwrap_or(0) > threshold
    }

    /// Merge another instance mask into this one (per-pixel maximum).
    ///
    /// All detected foreground instances are combined this way so group
    /// photos keep every subject, not just the most confident one.
    pub fn union(&mut self, other: &SegmentationMask) -> Result<()> {
        if self.dimensions != other.dimensions {
            return Err(CutoutError::internal(
                "Cannot union masks with different dimensions",
            ));
        }
        for (dst, src) in self.data.iter_mut().zip(other.data.iter()) {
            *dst = (*dst).max(*src);
        }
        Ok(())
    }

    /// Count of foreground pixels at the given threshold
    #[must_use]
    pub fn foreground_pixels(&self, threshold: u8) -> usize {
        (0..self.data.len())
            .filter(|&i| self.is_foreground(i, threshold))
            .count()
    }
}

/// Result of segmenting one photo: the foreground composited onto a
/// transparent canvas, plus the merged mask it was composited with.
///
/// The mask is kept separate rather than baked into alpha only, so later
/// stages can draw an opaque backdrop of any color without fringing.
#[derive(Debug, Clone)]
pub struct CutoutResult {
    /// Foreground pixels over a fully transparent background
    pub image: RgbaImage,

    /// Merged foreground mask, same resolution as `image`
    pub mask: SegmentationMask,
}

impl CutoutResult {
    /// Dimensions shared by the composite and its mask
    #[must_use]
    pub fn dimensions(&self) -> (u32, u32) {
        self.mask.dimensions
    }
}

/// Which derived variant of a photo the user last selected.
///
/// A property of the record itself, not of any transient view; it persists
/// across presentations of the same photo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DisplayVariant {
    /// Cutout stroked with a wide border following its silhouette
    #[default]
    Sticker,
    /// Cutout on a plain backdrop, no stroke
    Cutout,
    /// The unmodified original photo
    Original,
}

impl DisplayVariant {
    /// Resolve the variant actually rendered.
    ///
    /// Sticker needs a usable outline; without one it degrades to a plain
    /// cutout rather than surfacing an error.
    #[must_use]
    pub fn effective(self, has_outline: bool) -> DisplayVariant {
        match self {
            Self::Sticker if !has_outline => Self::Cutout,
            other => other,
        }
    }
}

/// Per-record processing lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ProcessingState {
    /// Segmentation has not been requested yet
    #[default]
    Unprocessed,
    /// Exactly one coordinator task is segmenting this record
    InFlight,
    /// Processed image and mask are populated
    Processed,
    /// Segmentation failed; the record keeps showing its original.
    /// Terminal until an explicit retry request.
    Failed,
}

impl ProcessingState {
    /// Whether a processing request may start from this state
    #[must_use]
    pub fn can_start(self) -> bool {
        matches!(self, Self::Unprocessed | Self::Failed)
    }
}

/// Build a transparent composite from an image and its mask
#[must_use]
pub fn composite_foreground(image: &RgbaImage, mask: &SegmentationMask) -> RgbaImage {
    let (width, height) = image.dimensions();
    let mut result = ImageBuffer::new(width, height);

    for (x, y, pixel) in image.enumerate_pixels() {
        let i = (y * width + x) as usize;
        let alpha = mask.data.get(i).copied().unwrap_or(0);
        if alpha > 0 {
            result.put_pixel(x, y, Rgba([pixel[0], pixel[1], pixel[2], alpha]));
        } else {
            result.put_pixel(x, y, Rgba([0, 0, 0, 0]));
        }
    }

    result
}
