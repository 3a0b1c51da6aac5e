//! Processing coordinator: serialized gallery ownership and at-most-one
//! in-flight segmentation per record
//!
//! The coordinator is an actor task that exclusively owns the
//! [`GalleryStore`]. Every mutation, from inserts and deletes to the
//! application of processing results, travels through one command channel,
//! so no two writers ever race. Segmentation and outline
//! extraction run on the blocking worker pool; their completions are posted
//! back through the same channel and re-validated before they touch a
//! record.
//!
//! Deletion is advisory cancellation: an in-flight task runs to completion
//! and its result is dropped at apply time when the existence check fails.

use crate::{
    config::PipelineConfig,
    error::{CutoutError, Result},
    gallery::{GalleryStore, ImageRecord, RecordId},
    geometry::{map_to_display, VectorPath},
    orientation::Orientation,
    segmentation::{SegmentationService, Segmenter},
    silhouette::SilhouetteExtractor,
    types::{CutoutResult, DisplayVariant, ProcessingState},
};
use image::{DynamicImage, RgbaImage};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

/// Read-only view of one record, cheap to clone out of the actor
#[derive(Clone)]
pub struct RecordSnapshot {
    pub id: RecordId,
    pub state: ProcessingState,
    pub selected_variant: DisplayVariant,
    pub orientation: Orientation,
    pub original: Arc<DynamicImage>,
    pub processed: Option<Arc<RgbaImage>>,
    pub has_outline: bool,
}

impl RecordSnapshot {
    /// The variant actually rendered, after the sticker-to-cutout fallback
    #[must_use]
    pub fn effective_variant(&self) -> DisplayVariant {
        self.selected_variant.effective(self.has_outline)
    }

    /// Whether a processed composite is available
    #[must_use]
    pub fn has_processed(&self) -> bool {
        self.processed.is_some()
    }
}

/// Successful processing output carried back to the actor
struct ProcessingOutcome {
    cutout: CutoutResult,
    outline: Option<VectorPath>,
}

enum Command {
    Submit {
        image: DynamicImage,
        orientation: Orientation,
        reply: oneshot::Sender<RecordId>,
    },
    Delete {
        id: RecordId,
        reply: oneshot::Sender<bool>,
    },
    RequestProcessing {
        id: RecordId,
    },
    MarkViewed {
        id: RecordId,
    },
    SetVariant {
        id: RecordId,
        variant: DisplayVariant,
        reply: oneshot::Sender<bool>,
    },
    GetRecord {
        id: RecordId,
        reply: oneshot::Sender<Option<RecordSnapshot>>,
    },
    ListRecords {
        reply: oneshot::Sender<Vec<RecordSnapshot>>,
    },
    ComputeOutline {
        id: RecordId,
        display_size: (f32, f32),
        reply: oneshot::Sender<Option<VectorPath>>,
    },
    ApplyOutcome {
        id: RecordId,
        outcome: Result<ProcessingOutcome>,
    },
}

/// Spawns the coordinator actor and hands out [`GalleryHandle`]s.
pub struct ProcessingCoordinator;

impl ProcessingCoordinator {
    /// Start the coordinator task on the current tokio runtime.
    ///
    /// The task exits once every handle (and every in-flight completion)
    /// has been dropped.
    #[must_use]
    pub fn spawn(config: PipelineConfig, segmenter: Arc<dyn Segmenter>) -> GalleryHandle {
        let (tx, rx) = mpsc::channel(config.command_queue_depth);
        let task = CoordinatorTask {
            store: GalleryStore::new(),
            service: Arc::new(SegmentationService::new(config.max_dimension)),
            extractor: Arc::new(SilhouetteExtractor::new(
                config.smoothing_passes,
                config.foreground_threshold,
            )),
            segmenter,
            auto_process: config.auto_process,
            completion_tx: tx.downgrade(),
        };
        tokio::spawn(task.run(rx));
        GalleryHandle { tx }
    }
}

/// Cloneable handle to the coordinator; the core-facing API for the
/// capture/import and presentation collaborators.
#[derive(Clone)]
pub struct GalleryHandle {
    tx: mpsc::Sender<Command>,
}

impl GalleryHandle {
    /// Insert a captured or imported photo, returning its record id.
    ///
    /// With auto-process enabled, segmentation is requested immediately;
    /// otherwise it waits for [`mark_viewed`](Self::mark_viewed).
    pub async fn submit_photo(
        &self,
        image: DynamicImage,
        orientation: Orientation,
    ) -> Result<RecordId> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Submit {
            image,
            orientation,
            reply,
        })
        .await?;
        recv(rx).await
    }

    /// Delete a record. Any in-flight segmentation result for it is
    /// discarded when it completes. Returns whether the record existed.
    pub async fn delete(&self, id: RecordId) -> Result<bool> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Delete { id, reply }).await?;
        recv(rx).await
    }

    /// Request segmentation for a record. No-op unless the record is
    /// `Unprocessed` or `Failed`; this is also the explicit retry entry
    /// point for failed records.
    pub async fn request_processing(&self, id: RecordId) -> Result<()> {
        self.send(Command::RequestProcessing { id }).await
    }

    /// Note that a record is being presented for detailed viewing. With
    /// auto-process disabled this triggers its first segmentation.
    pub async fn mark_viewed(&self, id: RecordId) -> Result<()> {
        self.send(Command::MarkViewed { id }).await
    }

    /// Set the record's display variant. Returns whether the record exists.
    pub async fn set_variant(&self, id: RecordId, variant: DisplayVariant) -> Result<bool> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::SetVariant { id, variant, reply }).await?;
        recv(rx).await
    }

    /// Snapshot one record
    pub async fn record(&self, id: RecordId) -> Result<Option<RecordSnapshot>> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::GetRecord { id, reply }).await?;
        recv(rx).await
    }

    /// Snapshot every record in insertion order
    pub async fn records(&self) -> Result<Vec<RecordSnapshot>> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::ListRecords { reply }).await?;
        recv(rx).await
    }

    /// Map the record's cached silhouette into a display rectangle.
    ///
    /// Returns `None` when the outline is unavailable: the record is
    /// missing or not yet processed, its extraction degenerated, or the
    /// display size is not positive. Never fails for a reachable
    /// coordinator.
    pub async fn compute_outline(
        &self,
        id: RecordId,
        display_size: (f32, f32),
    ) -> Result<Option<VectorPath>> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::ComputeOutline {
            id,
            display_size,
            reply,
        })
        .await?;
        recv(rx).await
    }

    async fn send(&self, command: Command) -> Result<()> {
        self.tx
            .send(command)
            .await
            .map_err(|_| CutoutError::internal("Gallery coordinator terminated"))
    }
}

async fn recv<T>(rx: oneshot::Receiver<T>) -> Result<T> {
    rx.await
        .map_err(|_| CutoutError::internal("Gallery coordinator dropped the reply"))
}

struct CoordinatorTask {
    store: GalleryStore,
    service: Arc<SegmentationService>,
    extractor: Arc<SilhouetteExtractor>,
    segmenter: Arc<dyn Segmenter>,
    auto_process: bool,
    // Weak so pending completions cannot keep the actor alive after every
    // handle is gone.
    completion_tx: mpsc::WeakSender<Command>,
}

impl CoordinatorTask {
    async fn run(mut self, mut rx: mpsc::Receiver<Command>) {
        debug!(auto_process = self.auto_process, "Gallery coordinator started");
        while let Some(command) = rx.recv().await {
            self.handle(command);
        }
        debug!("Gallery coordinator stopped");
    }

    fn handle(&mut self, command: Command) {
        match command {
            Command::Submit {
                image,
                orientation,
                reply,
            } => {
                let record = ImageRecord::new(Arc::new(image), orientation);
                let id = self.store.insert(record);
                info!(%id, ?orientation, gallery_len = self.store.len(), "Photo submitted");
                if self.auto_process {
                    self.start_processing(id);
                }
                let _ = reply.send(id);
            },
            Command::Delete { id, reply } => {
                let removed = self.store.remove(id).is_some();
                if removed {
                    info!(%id, gallery_len = self.store.len(), "Record deleted");
                } else {
                    debug!(%id, "Delete for unknown record");
                }
                let _ = reply.send(removed);
            },
            Command::RequestProcessing { id } => {
                self.start_processing(id);
            },
            Command::MarkViewed { id } => {
                // Lazy trigger only; a failed record is retried exclusively
                // through an explicit processing request.
                if !self.auto_process
                    && self
                        .store
                        .get(id)
                        .is_some_and(|r| r.state == ProcessingState::Unprocessed)
                {
                    self.start_processing(id);
                }
            },
            Command::SetVariant { id, variant, reply } => {
                let found = match self.store.get_mut(id) {
                    Some(record) => {
                        record.selected_variant = variant;
                        true
                    },
                    None => false,
                };
                let _ = reply.send(found);
            },
            Command::GetRecord { id, reply } => {
                let _ = reply.send(self.store.get(id).map(snapshot));
            },
            Command::ListRecords { reply } => {
                let _ = reply.send(self.store.iter().map(snapshot).collect());
            },
            Command::ComputeOutline {
                id,
                display_size,
                reply,
            } => {
                let _ = reply.send(self.compute_outline(id, display_size));
            },
            Command::ApplyOutcome { id, outcome } => {
                self.apply_outcome(id, outcome);
            },
        }
    }

    /// Transition a record to in-flight and dispatch its processing task.
    /// No-op unless the record exists and is `Unprocessed` or `Failed`.
    fn start_processing(&mut self, id: RecordId) {
        let Some(record) = self.store.get_mut(id) else {
            debug!(%id, "Processing requested for unknown record");
            return;
        };
        if !record.state.can_start() {
            debug!(%id, state = ?record.state, "Processing request ignored");
            return;
        }
        let Some(tx) = self.completion_tx.upgrade() else {
            return;
        };

        record.state = ProcessingState::InFlight;
        let image = Arc::clone(&record.original);
        let orientation = record.orientation;
        let service = Arc::clone(&self.service);
        let extractor = Arc::clone(&self.extractor);
        let segmenter = Arc::clone(&self.segmenter);
        debug!(%id, "Segmentation dispatched");

        tokio::spawn(async move {
            let outcome = tokio::task::spawn_blocking(move || {
                let cutout = service.process(segmenter.as_ref(), &image, orientation)?;
                let outline = match extractor.extract_outline(&cutout.mask) {
                    Ok(path) => Some(path),
                    Err(err) if err.is_degenerate_contour() => {
                        // Graceful degradation: sticker renders as cutout
                        debug!(%id, %err, "Outline unusable, record keeps no border");
                        None
                    },
                    Err(err) => return Err(err),
                };
                Ok(ProcessingOutcome { cutout, outline })
            })
            .await
            .unwrap_or_else(|join_err| {
                Err(CutoutError::internal(format!(
                    "Processing worker panicked: {join_err}"
                )))
            });

            // Receiver gone means the whole gallery shut down; the result
            // is moot either way.
            let _ = tx.send(Command::ApplyOutcome { id, outcome }).await;
        });
    }

    /// Apply a completed processing outcome, re-validating that the record
    /// still exists and is still in flight. Stale completions (deletion
    /// during processing, duplicate deliveries) are discarded.
    fn apply_outcome(&mut self, id: RecordId, outcome: Result<ProcessingOutcome>) {
        let Some(record) = self.store.get_mut(id) else {
            debug!(%id, "Completion discarded: record deleted while in flight");
            return;
        };
        if record.state != ProcessingState::InFlight {
            debug!(%id, state = ?record.state, "Completion discarded: record not in flight");
            return;
        }

        match outcome {
            Ok(result) => {
                let (width, height) = result.cutout.dimensions();
                record.processed = Some(Arc::new(result.cutout.image));
                record.mask = Some(result.cutout.mask);
                record.outline = result.outline;
                record.state = ProcessingState::Processed;
                debug_assert!(record.is_consistent());
                info!(
                    %id,
                    width,
                    height,
                    has_outline = record.outline.is_some(),
                    "Record processed"
                );
            },
            Err(err) => {
                record.state = ProcessingState::Failed;
                warn!(%id, %err, "Processing failed; record keeps its original");
            },
        }
    }

    fn compute_outline(&self, id: RecordId, display_size: (f32, f32)) -> Option<VectorPath> {
        if display_size.0 <= 0.0 || display_size.1 <= 0.0 {
            return None;
        }
        let record = self.store.get(id)?;
        let outline = record.outline.as_ref()?;
        let mask_size = record.mask.as_ref()?.dimensions;
        Some(map_to_display(outline, mask_size, display_size))
    }
}

fn snapshot(record: &ImageRecord) -> RecordSnapshot {
    RecordSnapshot {
        id: record.id,
        state: record.state,
        selected_variant: record.selected_variant,
        orientation: record.orientation,
        original: Arc::clone(&record.original),
        processed: record.processed.clone(),
        has_outline: record.outline.is_some(),
    }
}
