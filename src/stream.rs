//! Streaming batch API: emit document results as they complete.
//!
//! Unlike [`crate::convert::convert_batch`], which returns only after every
//! document has been attempted, [`convert_stream`] yields each
//! [`DocumentResult`] as soon as its document is done. Results arrive in
//! completion order; sort by `input` if order matters.
//!
//! Batch-level callbacks (`on_batch_start`, `on_batch_complete`) are not
//! fired here since the caller decides when the stream is finished.
//! Per-document callbacks are.

use crate::config::ConversionConfig;
use crate::convert::{run_job, BatchJob};
use crate::error::LawTreeError;
use crate::output::DocumentResult;
use crate::pipeline::Pipeline;
use futures::stream::{self, StreamExt};
use std::pin::Pin;
use std::sync::Arc;
use tokio_stream::Stream;
use tracing::info;

/// A boxed stream of document results.
pub type DocumentStream = Pin<Box<dyn Stream<Item = DocumentResult> + Send>>;

/// Convert `jobs`, streaming results as they are ready.
///
/// # Returns
/// - `Ok(DocumentStream)` — one item per job
/// - `Err(LawTreeError)` — the configuration does not compile
pub fn convert_stream(
    jobs: Vec<BatchJob>,
    config: &ConversionConfig,
) -> Result<DocumentStream, LawTreeError> {
    let pipeline = Arc::new(Pipeline::new(config)?);
    info!("Starting streaming batch of {} documents", jobs.len());

    let concurrency = config.concurrency.max(1);
    let config = config.clone();
    let s = stream::iter(jobs.into_iter().map(move |job| {
        run_job(Arc::clone(&pipeline), job, config.clone())
    }))
    .buffer_unordered(concurrency);

    Ok(Box::pin(s))
}
