//! Per-photo records and the insertion-ordered gallery store
//!
//! `GalleryStore` is the only shared mutable state in the core. It is owned
//! exclusively by the processing coordinator's task; nothing else mutates
//! it, which is what makes the in-flight and pairing invariants checkable.

use crate::{
    geometry::VectorPath,
    orientation::Orientation,
    types::{DisplayVariant, ProcessingState, SegmentationMask},
};
use image::{DynamicImage, RgbaImage};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

/// Stable unique identifier for a gallery record; never reused
pub type RecordId = Uuid;

/// One captured or imported photo and everything derived from it.
///
/// `original` never changes after creation. `processed` and `mask` are set
/// together, at most once, when segmentation succeeds; they are only ever
/// cleared by deleting the whole record.
pub struct ImageRecord {
    /// Stable identifier assigned at creation
    pub id: RecordId,

    /// The photo as captured/imported, plus its orientation metadata
    pub original: Arc<DynamicImage>,

    /// Orientation tag of `original`; normalization derives new pixels and
    /// never rewrites the original
    pub orientation: Orientation,

    /// Foreground composited over transparency, once processed
    pub processed: Option<Arc<RgbaImage>>,

    /// Merged foreground mask aligned with `processed`
    pub mask: Option<SegmentationMask>,

    /// Normalized-space silhouette, cached at apply time. `None` either
    /// before processing or when extraction degenerated (sticker then
    /// degrades to cutout). Display mapping is recomputed per query.
    pub outline: Option<VectorPath>,

    /// The user's last-selected display variant for this photo
    pub selected_variant: DisplayVariant,

    /// Processing lifecycle state
    pub state: ProcessingState,
}

impl ImageRecord {
    /// Create a fresh unprocessed record
    #[must_use]
    pub fn new(original: Arc<DynamicImage>, orientation: Orientation) -> Self {
        Self {
            id: Uuid::new_v4(),
            original,
            orientation,
            processed: None,
            mask: None,
            outline: None,
            selected_variant: DisplayVariant::default(),
            state: ProcessingState::default(),
        }
    }

    /// Whether a processed composite is available
    #[must_use]
    pub fn has_processed(&self) -> bool {
        self.processed.is_some()
    }

    /// The image to show: the processed cutout when available, otherwise
    /// the original
    #[must_use]
    pub fn display_image(&self) -> DynamicImage {
        match &self.processed {
            Some(processed) => DynamicImage::ImageRgba8((**processed).clone()),
            None => (*self.original).clone(),
        }
    }

    /// Check the pairing invariant: mask, processed image, and the
    /// `Processed` state are all present or all absent together.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        let processed = self.state == ProcessingState::Processed;
        self.processed.is_some() == processed && self.mask.is_some() == processed
    }
}

/// Insertion-ordered collection of [`ImageRecord`]s keyed by id.
///
/// Newest-first presentation is the viewer's concern; storage keeps plain
/// insertion order.
#[derive(Default)]
pub struct GalleryStore {
    records: HashMap<RecordId, ImageRecord>,
    order: Vec<RecordId>,
}

impl GalleryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record, returning its id
    pub fn insert(&mut self, record: ImageRecord) -> RecordId {
        let id = record.id;
        self.order.push(id);
        self.records.insert(id, record);
        id
    }

    /// Remove a record by id; returns it if present
    pub fn remove(&mut self, id: RecordId) -> Option<ImageRecord> {
        let removed = self.records.remove(&id);
        if removed.is_some() {
            self.order.retain(|&other| other != id);
        }
        removed
    }

    #[must_use]
    pub fn get(&self, id: RecordId) -> Option<&ImageRecord> {
        self.records.get(&id)
    }

    pub fn get_mut(&mut self, id: RecordId) -> Option<&mut ImageRecord> {
        self.records.get_mut(&id)
    }

    #[must_use]
    pub fn contains(&self, id: RecordId) -> bool {
        self.records.contains_key(&id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Iterate records in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &ImageRecord> {
        self.order.iter().filter_map(|id| self.records.get(id))
    }

    /// Record ids in insertion order
    #[must_use]
    pub fn ids(&self) -> Vec<RecordId> {
        self.order.clone()
    }
}
