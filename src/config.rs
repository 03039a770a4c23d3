//! Configuration types for legal-code conversion.
//!
//! All conversion behaviour is controlled through [`ConversionConfig`], built
//! via its [`ConversionConfigBuilder`]. The level vocabulary, the OCR repair
//! tuning, and the batch knobs travel together in one value that is handed to
//! the pipeline at construction time; nothing is read from module-level state.

use crate::error::LawTreeError;
use crate::progress::{BatchProgressCallback, ProgressCallback};
use crate::vocabulary::Vocabulary;
use std::fmt;
use std::sync::Arc;

/// Configuration for a conversion run.
///
/// Built via [`ConversionConfig::builder()`] or using
/// [`ConversionConfig::default()`].
///
/// # Example
/// ```rust
/// use edgequake_lawtree::ConversionConfig;
///
/// let config = ConversionConfig::builder()
///     .concurrency(8)
///     .max_letter_run(2)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ConversionConfig {
    /// Level keywords, ordinal words, delimiter glyphs and content tags.
    /// Default: [`Vocabulary::arabic()`].
    pub vocabulary: Vocabulary,

    /// Longest run of one repeated letter kept by the letter-run repair.
    /// Default: 2.
    ///
    /// OCR engines stutter on stretched glyphs and emit `ممم` for `م`; runs of
    /// three or more identical letters are cut down to this length.
    pub max_letter_run: usize,

    /// Number of documents processed at once by the batch APIs. Default: 4.
    ///
    /// Each document is processed synchronously on a blocking thread; this
    /// only bounds how many documents are in flight.
    pub concurrency: usize,

    /// Pretty-print JSON written by [`crate::convert::convert_to_file`].
    /// Default: true.
    pub pretty_json: bool,

    /// Batch progress events. Default: none.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            vocabulary: Vocabulary::default(),
            max_letter_run: 2,
            concurrency: 4,
            pretty_json: true,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ConversionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionConfig")
            .field("vocabulary", &self.vocabulary)
            .field("max_letter_run", &self.max_letter_run)
            .field("concurrency", &self.concurrency)
            .field("pretty_json", &self.pretty_json)
            .field(
                "progress_callback",
                &self
                    .progress_callback
                    .as_ref()
                    .map(|_| "<dyn BatchProgressCallback>"),
            )
            .finish()
    }
}

impl ConversionConfig {
    /// Create a new builder for `ConversionConfig`.
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ConversionConfig`].
#[derive(Debug)]
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
}

impl ConversionConfigBuilder {
    pub fn vocabulary(mut self, vocabulary: Vocabulary) -> Self {
        self.config.vocabulary = vocabulary;
        self
    }

    pub fn max_letter_run(mut self, n: usize) -> Self {
        self.config.max_letter_run = n;
        self
    }

    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.concurrency = n.max(1);
        self
    }

    pub fn pretty_json(mut self, v: bool) -> Self {
        self.config.pretty_json = v;
        self
    }

    pub fn progress_callback(mut self, cb: Arc<dyn BatchProgressCallback>) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConversionConfig, LawTreeError> {
        let c = &self.config;
        if c.max_letter_run == 0 {
            return Err(LawTreeError::InvalidConfig(
                "max_letter_run must be ≥ 1".into(),
            ));
        }
        c.vocabulary.validate()?;
        Ok(self.config)
    }
}
