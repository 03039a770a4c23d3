//! Progress-callback trait for per-document batch events.
//!
//! Inject an [`Arc<dyn BatchProgressCallback>`] via
//! [`crate::config::ConversionConfigBuilder::progress_callback`] to receive
//! events as [`crate::convert::convert_batch`] works through its documents.
//!
//! # Why callbacks instead of channels?
//!
//! Callers can forward events to a channel, a log file, or a terminal
//! progress bar without the library knowing how the host application
//! communicates. The trait is `Send + Sync` because documents are processed
//! concurrently on blocking threads.
//!
//! # Example
//!
//! ```rust
//! use edgequake_lawtree::{BatchProgressCallback, ConversionConfig, ConversionStats};
//! use std::path::Path;
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     articles: AtomicUsize,
//! }
//!
//! impl BatchProgressCallback for CountingCallback {
//!     fn on_document_complete(&self, _path: &Path, stats: &ConversionStats) {
//!         self.articles.fetch_add(stats.counts.articles, Ordering::SeqCst);
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback { articles: AtomicUsize::new(0) });
//!
//! let config = ConversionConfig::builder()
//!     .progress_callback(counter as Arc<dyn BatchProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use crate::error::DocumentError;
use crate::output::ConversionStats;
use std::path::Path;
use std::sync::Arc;

/// Called by the batch APIs as each document is processed.
///
/// All methods have default no-op implementations so callers only override
/// what they care about.
///
/// # Thread safety
///
/// `on_document_start`, `on_document_complete`, and `on_document_error` may
/// be called concurrently from different threads.
pub trait BatchProgressCallback: Send + Sync {
    /// Called once before any document is read.
    fn on_batch_start(&self, total_documents: usize) {
        let _ = total_documents;
    }

    /// Called just before a document is read.
    fn on_document_start(&self, path: &Path) {
        let _ = path;
    }

    /// Called when a document was converted and written.
    fn on_document_complete(&self, path: &Path, stats: &ConversionStats) {
        let _ = (path, stats);
    }

    /// Called when a document was skipped or failed.
    fn on_document_error(&self, path: &Path, error: &DocumentError) {
        let _ = (path, error);
    }

    /// Called once after every document has been attempted.
    fn on_batch_complete(&self, total_documents: usize, success_count: usize) {
        let _ = (total_documents, success_count);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl BatchProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ConversionConfig`].
pub type ProgressCallback = Arc<dyn BatchProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct TrackingCallback {
        starts: AtomicUsize,
        completes: AtomicUsize,
        errors: AtomicUsize,
        batch_total: AtomicUsize,
        batch_succeeded: AtomicUsize,
    }

    impl BatchProgressCallback for TrackingCallback {
        fn on_batch_start(&self, total_documents: usize) {
            self.batch_total.store(total_documents, Ordering::SeqCst);
        }

        fn on_document_start(&self, _path: &Path) {
            self.starts.fetch_add(1, Ordering::SeqCst);
        }

        fn on_document_complete(&self, _path: &Path, _stats: &ConversionStats) {
            self.completes.fetch_add(1, Ordering::SeqCst);
        }

        fn on_document_error(&self, _path: &Path, _error: &DocumentError) {
            self.errors.fetch_add(1, Ordering::SeqCst);
        }

        fn on_batch_complete(&self, _total_documents: usize, success_count: usize) {
            self.batch_succeeded.store(success_count, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_batch_start(2);
        cb.on_document_start(Path::new("a.txt"));
        cb.on_document_complete(Path::new("a.txt"), &ConversionStats::default());
        cb.on_document_error(
            Path::new("b.txt"),
            &DocumentError::Missing {
                path: "b.txt".into(),
            },
        );
        cb.on_batch_complete(2, 1);
    }

    #[test]
    fn tracking_callback_receives_events() {
        let tracker = TrackingCallback::default();

        tracker.on_batch_start(3);
        assert_eq!(tracker.batch_total.load(Ordering::SeqCst), 3);

        for name in ["a.txt", "b.txt", "c.txt"] {
            tracker.on_document_start(Path::new(name));
        }
        tracker.on_document_complete(Path::new("a.txt"), &ConversionStats::default());
        tracker.on_document_complete(Path::new("b.txt"), &ConversionStats::default());
        tracker.on_document_error(
            Path::new("c.txt"),
            &DocumentError::Missing {
                path: "c.txt".into(),
            },
        );

        assert_eq!(tracker.starts.load(Ordering::SeqCst), 3);
        assert_eq!(tracker.completes.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.errors.load(Ordering::SeqCst), 1);

        tracker.on_batch_complete(3, 2);
        assert_eq!(tracker.batch_succeeded.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn arc_dyn_callback_works() {
        let cb: ProgressCallback = Arc::new(NoopProgressCallback);
        cb.on_batch_start(10);
        cb.on_document_start(Path::new("law.txt"));
    }
}
