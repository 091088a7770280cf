//! Progress-callback trait for pipeline stage events.
//!
//! Inject an [`Arc<dyn OutlineProgressCallback>`] into
//! [`crate::generate::generate_outline`] to receive events as the pipeline
//! moves through its stages. The `pdf2outline` binary uses it to drive a
//! terminal spinner; library users can forward events anywhere.
//!
//! # Example
//!
//! ```rust
//! use edgequake_pdf2outline::{OutlineProgressCallback, Stage};
//! use std::sync::atomic::{AtomicUsize, Ordering};
//!
//! struct ChunkCounter(AtomicUsize);
//!
//! impl OutlineProgressCallback for ChunkCounter {
//!     fn on_model_chunk(&self, bytes: usize) {
//!         self.0.fetch_add(bytes, Ordering::SeqCst);
//!     }
//! }
//!
//! let counter = ChunkCounter(AtomicUsize::new(0));
//! counter.on_stage_start(Stage::Model);
//! counter.on_model_chunk(12);
//! assert_eq!(counter.0.load(Ordering::SeqCst), 12);
//! ```

use crate::error::Stage;
use std::sync::Arc;

/// Called by the pipeline as it runs.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. Model chunks may arrive from a client's I/O task,
/// hence `Send + Sync`.
pub trait OutlineProgressCallback: Send + Sync {
    /// Called when a stage begins.
    fn on_stage_start(&self, stage: Stage) {
        let _ = stage;
    }

    /// Called when a stage finishes successfully.
    fn on_stage_complete(&self, stage: Stage) {
        let _ = stage;
    }

    /// Called once the example directory has been scanned.
    ///
    /// # Arguments
    /// * `count`: number of example pairs found
    fn on_examples_loaded(&self, count: usize) {
        let _ = count;
    }

    /// Called for each streamed completion chunk.
    ///
    /// # Arguments
    /// * `bytes`: byte length of the chunk just received
    fn on_model_chunk(&self, bytes: usize) {
        let _ = bytes;
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl OutlineProgressCallback for NoopProgressCallback {}

/// Convenience alias for a shared callback.
pub type ProgressCallback = Arc<dyn OutlineProgressCallback>;

/// A shared no-op callback.
pub fn noop() -> ProgressCallback {
    Arc::new(NoopProgressCallback)
}
