#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::uninlined_format_args)]

//! # cutoutkit
//!
//! In-memory photo cutout pipeline: turn a captured or imported photograph
//! into a foreground-only cutout or a "sticker" with a synthetic outlined
//! border, kept alongside the untouched original in a gallery of records.
//!
//! The actual segmentation model and contour-tracing algorithm are external
//! capabilities; this crate owns everything around them: the per-photo data
//! model, the asynchronous segmentation/compositing service, silhouette
//! extraction and display-space mapping, and the coordinator that keeps
//! per-photo state consistent under concurrent capture, deletion, and
//! retries.
//!
//! ## Features
//!
//! - **Gallery with serialized mutation**: one actor task owns the store;
//!   inserts, deletes, and result application cannot race
//! - **At-most-one in-flight segmentation per record**, with explicit
//!   `Unprocessed → InFlight → Processed | Failed` states
//! - **Orientation-safe processing**: inputs are normalized to upright
//!   pixels before segmentation so image, mask, and outline share one
//!   coordinate space
//! - **Instance merging**: group photos keep every detected subject
//! - **Sticker outlines**: smoothed compound silhouette paths, mapped into
//!   any display rectangle with aspect-fit letterboxing
//! - **Graceful degradation**: a failed photo keeps showing its original;
//!   an unusable outline silently downgrades sticker to cutout
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use cutoutkit::{Orientation, PipelineConfig, ProcessingCoordinator, Segmenter};
//! use std::sync::Arc;
//!
//! # async fn example(segmenter: Arc<dyn Segmenter>, photo: image::DynamicImage) -> cutoutkit::Result<()> {
//! let config = PipelineConfig::builder().auto_process(true).build()?;
//! let gallery = ProcessingCoordinator::spawn(config, segmenter);
//!
//! // Capture/import collaborator hands decoded pixels to the core
//! let id = gallery.submit_photo(photo, Orientation::Right).await?;
//!
//! // Presentation collaborator renders from snapshots
//! if let Some(record) = gallery.record(id).await? {
//!     let _variant = record.effective_variant();
//! }
//! if let Some(outline) = gallery.compute_outline(id, (390.0, 520.0)).await? {
//!     // stroke the sticker border along `outline`
//!     let _ = outline;
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod coordinator;
pub mod error;
pub mod gallery;
pub mod geometry;
pub mod orientation;
pub mod segmentation;
pub mod silhouette;
pub mod types;

// Public API exports
pub use config::{PipelineConfig, PipelineConfigBuilder};
pub use coordinator::{GalleryHandle, ProcessingCoordinator, RecordSnapshot};
pub use error::{CutoutError, Result};
pub use gallery::{GalleryStore, ImageRecord, RecordId};
pub use geometry::{map_to_display, BoundingBox, DisplayTransform, Point, Polyline, VectorPath};
pub use orientation::{normalize, Orientation};
pub use segmentation::{SegmentationService, Segmenter, DEFAULT_MAX_DIMENSION};
pub use silhouette::{
    BorderFollowing, ContourTracer, SilhouetteExtractor, DEFAULT_SMOOTHING_PASSES,
};
pub use types::{
    composite_foreground, CutoutResult, DisplayVariant, ProcessingState, SegmentationMask,
    FOREGROUND_THRESHOLD,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_surface() {
        // Defaults wire together without a runtime
        let config = PipelineConfig::default();
        assert!(config.auto_process);
        assert_eq!(DisplayVariant::default(), DisplayVariant::Sticker);
        assert_eq!(ProcessingState::default(), ProcessingState::Unprocessed);
    }
}
