//! Conversion entry points: one string, one file, or a batch of files.
//!
//! The per-document pipeline is synchronous and CPU-bound. The batch API
//! runs each document on a blocking thread and bounds the number in flight
//! with [`ConversionConfig::concurrency`]; one document's failure never
//! aborts the others. Use [`crate::stream::convert_stream`] instead when
//! results should be consumed as they complete.

use crate::config::ConversionConfig;
use crate::error::{DocumentError, LawTreeError};
use crate::output::{BatchOutput, ConversionOutput, ConversionStats, DocumentResult};
use crate::pipeline::{input, Pipeline};
use futures::stream::{self, StreamExt};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

/// Convert text already in memory.
///
/// `title` becomes the document title and `source` its provenance string.
///
/// # Example
/// ```rust
/// use edgequake_lawtree::{convert_str, ConversionConfig};
///
/// let out = convert_str(
///     "القسم الأول تمهيدي. الباب الأول التسمية. المادة 1 يسمى هذا القانون.",
///     "قانون",
///     "inline",
///     &ConversionConfig::default(),
/// )
/// .unwrap();
/// assert_eq!(out.stats.counts.articles, 1);
/// ```
pub fn convert_str(
    raw: &str,
    title: &str,
    source: &str,
    config: &ConversionConfig,
) -> Result<ConversionOutput, LawTreeError> {
    Ok(Pipeline::new(config)?.run(raw, title, source))
}

/// Read and convert a text file.
///
/// The title is derived from the file name (see
/// [`input::document_title`]) and the path is recorded as provenance.
///
/// # Errors
/// - [`LawTreeError::FileNotFound`] / [`LawTreeError::PermissionDenied`] /
///   [`LawTreeError::ReadFailed`] when the input cannot be read
/// - configuration errors when the vocabulary does not compile
pub fn convert(
    path: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<ConversionOutput, LawTreeError> {
    let pipeline = Pipeline::new(config)?;
    convert_with(&pipeline, path.as_ref())
}

/// Normalise and annotate a file without building the tree.
///
/// Returns the delimiter-annotated text, the same text
/// [`ConversionOutput::annotated`] carries.
pub fn annotate(path: impl AsRef<Path>, config: &ConversionConfig) -> Result<String, LawTreeError> {
    let pipeline = Pipeline::new(config)?;
    let raw = input::read_document(path.as_ref())?;
    let (_, segmentation) = pipeline.annotate(&raw);
    Ok(segmentation.annotated)
}

/// Convert a file and write the JSON document to `json_out`.
///
/// When `annotated_out` is given, the annotated intermediate text is written
/// there too. Writes are atomic (temp file in the target directory, then
/// rename) and missing parent directories are created.
pub fn convert_to_file(
    input_path: impl AsRef<Path>,
    json_out: impl AsRef<Path>,
    annotated_out: Option<&Path>,
    config: &ConversionConfig,
) -> Result<ConversionStats, LawTreeError> {
    let pipeline = Pipeline::new(config)?;
    let job = BatchJob {
        input: input_path.as_ref().to_path_buf(),
        json_output: json_out.as_ref().to_path_buf(),
        annotated_output: annotated_out.map(Path::to_path_buf),
    };
    process_job(&pipeline, &job, config.pretty_json)
}

/// One document of a batch: where to read it and where to write it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchJob {
    pub input: PathBuf,
    pub json_output: PathBuf,
    /// Persist the annotated text here when set.
    pub annotated_output: Option<PathBuf>,
}

impl BatchJob {
    pub fn new(input: impl Into<PathBuf>, json_output: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            json_output: json_output.into(),
            annotated_output: None,
        }
    }

    pub fn with_annotated(mut self, path: impl Into<PathBuf>) -> Self {
        self.annotated_output = Some(path.into());
        self
    }
}

/// Convert every job, at most `config.concurrency` at a time.
///
/// Returns `Err` only when the configuration itself is unusable. Per-document
/// failures (a file that disappeared, an unwritable output) are recorded in
/// the matching [`DocumentResult`]. Results are sorted by input path.
pub async fn convert_batch(
    jobs: Vec<BatchJob>,
    config: &ConversionConfig,
) -> Result<BatchOutput, LawTreeError> {
    let pipeline = Arc::new(Pipeline::new(config)?);
    let total = jobs.len();
    info!("Starting batch of {} documents", total);

    if let Some(ref cb) = config.progress_callback {
        cb.on_batch_start(total);
    }

    let mut results: Vec<DocumentResult> = stream::iter(jobs.into_iter().map(|job| {
        let pipeline = Arc::clone(&pipeline);
        let config = config.clone();
        run_job(pipeline, job, config)
    }))
    .buffer_unordered(config.concurrency.max(1))
    .collect()
    .await;

    results.sort_by(|a, b| a.input.cmp(&b.input));
    let output = BatchOutput { results };

    info!(
        "Batch complete: {}/{} documents converted",
        output.succeeded(),
        total
    );
    if let Some(ref cb) = config.progress_callback {
        cb.on_batch_complete(total, output.succeeded());
    }
    Ok(output)
}

/// Synchronous wrapper around [`convert_batch`].
///
/// Creates a temporary tokio runtime internally.
pub fn convert_batch_sync(
    jobs: Vec<BatchJob>,
    config: &ConversionConfig,
) -> Result<BatchOutput, LawTreeError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| LawTreeError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(convert_batch(jobs, config))
}

// ── Internal helpers ─────────────────────────────────────────────────────

fn convert_with(pipeline: &Pipeline, path: &Path) -> Result<ConversionOutput, LawTreeError> {
    let raw = input::read_document(path)?;
    let title = input::document_title(path);
    Ok(pipeline.run(&raw, &title, &path.display().to_string()))
}

/// Run one job on a blocking thread, firing progress callbacks.
pub(crate) async fn run_job(
    pipeline: Arc<Pipeline>,
    job: BatchJob,
    config: ConversionConfig,
) -> DocumentResult {
    if let Some(ref cb) = config.progress_callback {
        cb.on_document_start(&job.input);
    }

    let input = job.input.clone();
    let pretty = config.pretty_json;
    let outcome = tokio::task::spawn_blocking(move || {
        let stats = process_job(&pipeline, &job, pretty);
        (job, stats)
    })
    .await;

    let result = match outcome {
        Ok((job, Ok(stats))) => DocumentResult {
            input: job.input,
            output_path: Some(job.json_output),
            stats: Some(stats),
            error: None,
        },
        Ok((job, Err(e))) => {
            let error = DocumentError::from_fatal(job.input.display().to_string(), &e);
            warn!("{}", error);
            DocumentResult {
                input: job.input,
                output_path: None,
                stats: None,
                error: Some(error),
            }
        }
        Err(join_err) => {
            let error = DocumentError::Failed {
                path: input.display().to_string(),
                detail: format!("worker task failed: {join_err}"),
            };
            warn!("{}", error);
            DocumentResult {
                input,
                output_path: None,
                stats: None,
                error: Some(error),
            }
        }
    };

    if let Some(ref cb) = config.progress_callback {
        match (&result.stats, &result.error) {
            (_, Some(e)) => cb.on_document_error(&result.input, e),
            (Some(stats), None) => cb.on_document_complete(&result.input, stats),
            (None, None) => {}
        }
    }
    result
}

fn process_job(
    pipeline: &Pipeline,
    job: &BatchJob,
    pretty: bool,
) -> Result<ConversionStats, LawTreeError> {
    let output = convert_with(pipeline, &job.input)?;

    let json = if pretty {
        serde_json::to_string_pretty(&output.document)?
    } else {
        serde_json::to_string(&output.document)?
    };
    write_atomic(&job.json_output, json.as_bytes())?;

    if let Some(ref path) = job.annotated_output {
        write_atomic(path, output.annotated.as_bytes())?;
    }

    debug!(
        "Wrote {} ({} nodes)",
        job.json_output.display(),
        output.stats.counts.total()
    );
    Ok(output.stats)
}

/// Write `bytes` to a temp file next to `path`, then rename it into place.
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), LawTreeError> {
    let write_err = |source| LawTreeError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir).map_err(write_err)?;

    let mut tmp = NamedTempFile::new_in(dir).map_err(write_err)?;
    tmp.write_all(bytes).map_err(write_err)?;
    tmp.persist(path).map_err(|e| write_err(e.error))?;
    Ok(())
}
