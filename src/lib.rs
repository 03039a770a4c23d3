//! # edgequake-lawtree
//!
//! Turn OCR-transcribed Arabic legal codes into a nested document tree.
//!
//! ## Why this crate?
//!
//! Statutes scanned to text lose their structure: the hierarchy of
//! sections, chapters, sub-chapters, subsections and articles survives only
//! as keywords in running prose (`الباب الثاني`, `المادة 12`), mixed with
//! OCR noise such as page banners, torn words and stuttered letters. This
//! crate repairs the known artefacts, infers the boundaries from keyword and
//! ordinal patterns, and rebuilds the hierarchy as plain serialisable data.
//!
//! ## Pipeline Overview
//!
//! ```text
//! raw text
//!  │
//!  ├─ 1. Input      read the file, dropping undecodable bytes
//!  ├─ 2. Normalize  page markers, torn words, `ا ل` → `ال`, letter runs
//!  ├─ 3. Segment    keyword + ordinal spans → delimiter-annotated text
//!  ├─ 4. Tree       re-read the annotation with a parent stack
//!  ├─ 5. Prune      drop nodes with neither content nor children
//!  └─ 6. Output     Document { title, type, intro, structure, source_path }
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use edgequake_lawtree::{convert_str, ConversionConfig, Level};
//!
//! let text = "القسم الأول تمهيدي. الباب الأول التسمية. المادة 1 يسمى هذا القانون.";
//! let out = convert_str(text, "قانون", "inline", &ConversionConfig::default()).unwrap();
//!
//! let section = &out.document.structure[0];
//! assert_eq!(section.level, Level::Section);
//! assert_eq!(section.children[0].children[0].content, "يسمى هذا القانون.");
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `law2json` binary (clap + anyhow + tracing-subscriber + indicatif + walkdir) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! edgequake-lawtree = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod stream;
pub mod vocabulary;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ConversionConfig, ConversionConfigBuilder};
pub use convert::{
    annotate, convert, convert_batch, convert_batch_sync, convert_str, convert_to_file, BatchJob,
};
pub use error::{DocumentError, LawTreeError};
pub use output::{
    BatchOutput, ConversionOutput, ConversionStats, Document, DocumentResult, Node,
    StructureCounts, UNRESOLVED_NUMBER,
};
pub use pipeline::normalize::NormalizationReport;
pub use pipeline::ordinal::resolve_ordinal;
pub use pipeline::Pipeline;
pub use progress::{BatchProgressCallback, NoopProgressCallback, ProgressCallback};
pub use stream::{convert_stream, DocumentStream};
pub use vocabulary::{DelimiterPair, Level, LevelSpec, OrdinalWord, Vocabulary};
