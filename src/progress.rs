//! Progress-callback trait for batch extraction events.
//!
//! Inject an [`Arc<dyn ExtractionProgressCallback>`] via
//! [`crate::config::ExtractionConfigBuilder::progress_callback`] to receive
//! events as [`crate::stream::extract_stream`] works through a set of
//! documents. The trait is `Send + Sync` because documents are extracted
//! concurrently on tokio's blocking pool.
//!
//! # Example
//!
//! ```rust
//! use doc2mcq::{ExtractionConfig, ExtractionProgressCallback};
//! use std::path::Path;
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct QuestionCounter {
//!     questions: AtomicUsize,
//! }
//!
//! impl ExtractionProgressCallback for QuestionCounter {
//!     fn on_document_complete(&self, _path: &Path, questions: usize, _blocks_seen: usize) {
//!         self.questions.fetch_add(questions, Ordering::SeqCst);
//!     }
//! }
//!
//! let counter = Arc::new(QuestionCounter { questions: AtomicUsize::new(0) });
//! let config = ExtractionConfig::builder()
//!     .progress_callback(counter as Arc<dyn ExtractionProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::path::Path;
use std::sync::Arc;

/// Called by the batch extractor as it processes each document.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. `on_document_*` may be called concurrently from
/// different threads; protect shared state accordingly.
pub trait ExtractionProgressCallback: Send + Sync {
    /// Called once before any document is read.
    fn on_batch_start(&self, total_documents: usize) {
        let _ = total_documents;
    }

    /// Called just before a document is read from disk.
    fn on_document_start(&self, path: &Path) {
        let _ = path;
    }

    /// Called when a document was decoded, whether or not it yielded questions.
    ///
    /// # Arguments
    /// * `questions`   — accepted questions
    /// * `blocks_seen` — candidate blocks the segmenter produced
    fn on_document_complete(&self, path: &Path, questions: usize, blocks_seen: usize) {
        let _ = (path, questions, blocks_seen);
    }

    /// Called when a document failed fatally (unreadable, unsupported, timed out).
    fn on_document_error(&self, path: &Path, error: &str) {
        let _ = (path, error);
    }

    /// Called once after every document has been attempted.
    fn on_batch_complete(&self, total_documents: usize, success_count: usize) {
        let _ = (total_documents, success_count);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ExtractionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ExtractionConfig`].
pub type ProgressCallback = Arc<dyn ExtractionProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct TrackingCallback {
        starts: AtomicUsize,
        questions: AtomicUsize,
        errors: AtomicUsize,
        succeeded: AtomicUsize,
    }

    impl ExtractionProgressCallback for TrackingCallback {
        fn on_document_start(&self, _path: &Path) {
            self.starts.fetch_add(1, Ordering::SeqCst);
        }

        fn on_document_complete(&self, _path: &Path, questions: usize, _blocks_seen: usize) {
            self.questions.fetch_add(questions, Ordering::SeqCst);
        }

        fn on_document_error(&self, _path: &Path, _error: &str) {
            self.errors.fetch_add(1, Ordering::SeqCst);
        }

        fn on_batch_complete(&self, _total: usize, success_count: usize) {
            self.succeeded.store(success_count, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_batch_start(2);
        cb.on_document_start(Path::new("a.docx"));
        cb.on_document_complete(Path::new("a.docx"), 10, 12);
        cb.on_document_error(Path::new("b.doc"), "unsupported");
        cb.on_batch_complete(2, 1);
    }

    #[test]
    fn tracking_callback_receives_events() {
        let tracker = TrackingCallback::default();
        tracker.on_document_start(Path::new("a.docx"));
        tracker.on_document_complete(Path::new("a.docx"), 5, 6);
        tracker.on_document_start(Path::new("b.docx"));
        tracker.on_document_complete(Path::new("b.docx"), 3, 3);
        tracker.on_document_start(Path::new("c.doc"));
        tracker.on_document_error(Path::new("c.doc"), "legacy format");
        tracker.on_batch_complete(3, 2);

        assert_eq!(tracker.starts.load(Ordering::SeqCst), 3);
        assert_eq!(tracker.questions.load(Ordering::SeqCst), 8);
        assert_eq!(tracker.errors.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.succeeded.load(Ordering::SeqCst), 2);
    }
}
