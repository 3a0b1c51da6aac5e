//! Error types for the cutout pipeline

use thiserror::Error;

/// Result type alias for cutout pipeline operations
pub type Result<T> = std::result::Result<T, CutoutError>;

/// Error types for per-photo processing operations.
///
/// Every variant is scoped to a single record and recoverable by an explicit
/// user-triggered retry; a failure never corrupts other records or the
/// gallery itself. The worst outcome for any one photo is "segmentation
/// unavailable, show the original".
#[derive(Error, Debug)]
pub enum CutoutError {
    /// The input image could not be decoded or has no pixels
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The segmentation capability detected no foreground instances
    #[error("No foreground detected")]
    NoForeground,

    /// The traced outline is unusable (empty, or captured the image border)
    ///
    /// Callers downgrade from sticker-with-border to a plain cutout instead
    /// of surfacing this to the user.
    #[error("Degenerate contour: {0}")]
    DegenerateContour(String),

    /// Image format or processing errors
    #[error("Image processing error: {0}")]
    Image(#[from] image::ImageError),

    /// Generic error for unexpected conditions (worker pool or channel faults)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CutoutError {
    /// Create a new invalid input error
    pub fn invalid_input<S: Into<String>>(msg: S) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a new degenerate contour error
    pub fn degenerate_contour<S: Into<String>>(msg: S) -> Self {
        Self::DegenerateContour(msg.into())
    }

    /// Create a new internal error
    pub fn internal<S: Into<String>>(msg: S) -> Self {
        Self::Internal(msg.into())
    }

    /// Whether this error means "render the cutout without a border" rather
    /// than "processing failed"
    #[must_use]
    pub fn is_degenerate_contour(&self) -> bool {
        matches!(self, Self::DegenerateContour(_))
    }
}
