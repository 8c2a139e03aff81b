//! Debounced preview regeneration.
//!
//! Every change in the export dialog (opening it, reassigning a role)
//! schedules a preview. Renders start after a quiet period; a newer
//! schedule aborts the pending one, and results that arrive after a newer
//! schedule or a cancel are dropped by generation number.

use crate::error::ExportError;
use crate::pipeline::{BookletExporter, BookletPreview};
use crate::raster::PageRasterizer;
use crate::roles::RoleAssignment;
use bm_core::ProjectDocument;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// A finished preview render.
#[derive(Debug)]
pub struct PreviewUpdate {
    pub generation: u64,
    pub result: Result<BookletPreview, ExportError>,
}

pub struct PreviewScheduler<R> {
    exporter: Arc<BookletExporter<R>>,
    delay: Duration,
    generation: Arc<AtomicU64>,
    pending: Option<JoinHandle<()>>,
    tx: mpsc::UnboundedSender<PreviewUpdate>,
}

impl<R: PageRasterizer + 'static> PreviewScheduler<R> {
    /// Create a scheduler and the receiver its updates arrive on.
    pub fn new(exporter: Arc<BookletExporter<R>>) -> (Self, mpsc::UnboundedReceiver<PreviewUpdate>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let delay = exporter.config().debounce();
        let scheduler = Self {
            exporter,
            delay,
            generation: Arc::new(AtomicU64::new(0)),
            pending: None,
            tx,
        };
        (scheduler, rx)
    }

    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Queue a preview for the current project and roles. Must be called
    /// from within a tokio runtime.
    pub fn schedule(&mut self, project: ProjectDocument, roles: RoleAssignment) -> u64 {
        let generation = self.bump();
        let exporter = Arc::clone(&self.exporter);
        let current = Arc::clone(&self.generation);
        let tx = self.tx.clone();
        let delay = self.delay;

        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if current.load(Ordering::Acquire) != generation {
                return;
            }
            let result = exporter.preview(&project, &roles).await;
            if current.load(Ordering::Acquire) != generation {
                log::debug!("dropping stale preview #{generation}");
                return;
            }
            // Receiver gone means the dialog is closed.
            let _ = tx.send(PreviewUpdate { generation, result });
        }));
        log::debug!("preview #{generation} scheduled in {:?}", self.delay);
        generation
    }

    /// Abandon pending and in-flight renders, e.g. when the dialog closes.
    pub fn cancel(&mut self) {
        self.bump();
    }

    fn bump(&mut self) -> u64 {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
        self.generation.fetch_add(1, Ordering::AcqRel) + 1
    }
}

impl<R> Drop for PreviewScheduler<R> {
    fn drop(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }
}
