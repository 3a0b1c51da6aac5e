//! Orientation metadata and upright pixel normalization
//!
//! Segmentation, compositing, and contour math all assume one canonical
//! coordinate space. Inputs carrying a non-identity orientation tag are
//! physically rotated/mirrored once on entry so the processed image, its
//! mask, and the traced outline never disagree about which way is up.

use image::DynamicImage;
use serde::{Deserialize, Serialize};

/// The eight standard orientation + mirror combinations (EXIF values 1-8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Orientation {
    /// Pixels already upright (EXIF 1)
    #[default]
    Up,
    /// Upright, mirrored horizontally (EXIF 2)
    UpMirrored,
    /// Rotated 180 degrees (EXIF 3)
    Down,
    /// Rotated 180 degrees and mirrored (EXIF 4)
    DownMirrored,
    /// Transposed across the main diagonal (EXIF 5)
    LeftMirrored,
    /// Needs a 90 degree clockwise rotation to display upright (EXIF 6)
    Right,
    /// Transposed across the anti-diagonal (EXIF 7)
    RightMirrored,
    /// Needs a 90 degree counter-clockwise rotation to display upright (EXIF 8)
    Left,
}

impl Orientation {
    /// All eight variants, in EXIF order
    pub const ALL: [Orientation; 8] = [
        Orientation::Up,
        Orientation::UpMirrored,
        Orientation::Down,
        Orientation::DownMirrored,
        Orientation::LeftMirrored,
        Orientation::Right,
        Orientation::RightMirrored,
        Orientation::Left,
    ];

    /// Parse a raw EXIF orientation value (1-8)
    #[must_use]
    pub fn from_exif(value: u16) -> Option<Self> {
        match value {
            1 => Some(Self::Up),
            2 => Some(Self::UpMirrored),
            3 => Some(Self::Down),
            4 => Some(Self::DownMirrored),
            5 => Some(Self::LeftMirrored),
            6 => Some(Self::Right),
            7 => Some(Self::RightMirrored),
            8 => Some(Self::Left),
            _ => None,
        }
    }

    /// The raw EXIF value for this orientation
    #[must_use]
    pub fn to_exif(self) -> u16 {
        match self {
            Self::Up => 1,
            Self::UpMirrored => 2,
            Self::Down => 3,
            Self::DownMirrored => 4,
            Self::LeftMirrored => 5,
            Self::Right => 6,
            Self::RightMirrored => 7,
            Self::Left => 8,
        }
    }

    /// Whether normalization is a no-op for this orientation
    #[must_use]
    pub fn is_identity(self) -> bool {
        self == Self::Up
    }
}

/// Rotate/mirror pixels so the given orientation tag becomes identity.
///
/// Returns a new derived image; the input is never rewritten. Passing
/// [`Orientation::Up`] hands back an unmodified copy of the pixels.
#[must_use]
pub fn normalize(image: &DynamicImage, orientation: Orientation) -> DynamicImage {
    match orientation {
        Orientation::Up => image.clone(),
        Orientation::UpMirrored => image.fliph(),
        Orientation::Down => image.rotate180(),
        Orientation::DownMirrored => image.flipv(),
        Orientation::LeftMirrored => image.rotate90().fliph(),
        Orientation::Right => image.rotate90(),
        Orientation::RightMirrored => image.rotate270().fliph(),
        Orientation::Left => image.rotate270(),
    }
}

/// Derive the stored-pixel arrangement an upright image would have under the
/// given orientation tag. Inverse of [`normalize`]; used by tests to build
/// fixtures for all eight combinations.
#[must_use]
pub fn denormalize(upright: &DynamicImage, orientation: Orientation) -> DynamicImage {
    match orientation {
        Orientation::Up => upright.clone(),
        Orientation::UpMirrored => upright.fliph(),
        Orientation::Down => upright.rotate180(),
        Orientation::DownMirrored => upright.flipv(),
        Orientation::LeftMirrored => upright.fliph().rotate270(),
        Orientation::Right => upright.rotate270(),
        Orientation::RightMirrored => upright.fliph().rotate90(),
        Orientation::Left => upright.rotate90(),
    }
}
