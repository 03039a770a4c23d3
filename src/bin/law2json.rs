//! CLI binary for edgequake-lawtree.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `ConversionConfig`, discovers input files, and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use edgequake_lawtree::{
    annotate, convert, convert_batch, convert_to_file, BatchJob, BatchProgressCallback,
    ConversionConfig, ConversionStats, DocumentError, Level, StructureCounts, Vocabulary,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

/// `N قسم | N باب | N فصل | N فرع | N مادة`, labelled from `vocabulary`.
fn format_counts(c: &StructureCounts, vocabulary: &Vocabulary) -> String {
    Level::ALL
        .iter()
        .map(|&level| format!("{} {}", c.get(level), vocabulary.spec(level).label))
        .collect::<Vec<_>>()
        .join(" | ")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: one bar for the batch plus a log line per
/// document. Documents may complete out of order.
struct CliProgressCallback {
    bar: ProgressBar,
    errors: AtomicUsize,
    vocabulary: Vocabulary,
}

impl CliProgressCallback {
    fn new(vocabulary: &Vocabulary) -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>4}/{len} files  \
             ⏱ {elapsed_precise}  {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);
        bar.set_prefix("Converting");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            errors: AtomicUsize::new(0),
            vocabulary: vocabulary.clone(),
        })
    }
}

impl BatchProgressCallback for CliProgressCallback {
    fn on_batch_start(&self, total_documents: usize) {
        self.bar.set_length(total_documents as u64);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Converting {total_documents} files…"))
        ));
    }

    fn on_document_start(&self, path: &Path) {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.bar.set_message(name);
    }

    fn on_document_complete(&self, path: &Path, stats: &ConversionStats) {
        self.bar.println(format!(
            "  {} {}  {}  {}",
            green("✓"),
            path.display(),
            dim(&format_counts(&stats.counts, &self.vocabulary)),
            dim(&format!("{}ms", stats.duration_ms)),
        ));
        self.bar.inc(1);
    }

    fn on_document_error(&self, _path: &Path, error: &DocumentError) {
        self.errors.fetch_add(1, Ordering::SeqCst);
        self.bar
            .println(format!("  {} {}", red("✗"), red(&error.to_string())));
        self.bar.inc(1);
    }

    fn on_batch_complete(&self, total_documents: usize, success_count: usize) {
        self.bar.finish_and_clear();
        let failed = self.errors.load(Ordering::SeqCst);
        if failed == 0 {
            eprintln!(
                "{} {} files converted successfully",
                green("✔"),
                bold(&success_count.to_string())
            );
        } else {
            eprintln!(
                "{} {}/{} files converted  ({} failed)",
                if success_count == 0 { red("✘") } else { cyan("⚠") },
                bold(&success_count.to_string()),
                total_documents,
                red(&failed.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Convert one file (writes json/<name>.json)
  law2json text/law.txt

  # Convert one file to a chosen path
  law2json text/law.txt -o out/law.json

  # Print the JSON document to stdout
  law2json --json text/law.txt > law.json

  # Convert a whole tree, keeping the annotated text for debugging
  law2json text/ -o json/ --annotated-dir clean/

  # Inspect boundary detection without building the tree
  law2json --annotate-only text/law.txt

  # Another document family
  law2json --vocabulary my_vocab.json text/

ENVIRONMENT VARIABLES:
  RUST_LOG                 tracing filter (overrides -v / -q)
  LAWTREE_OUTPUT           Default for -o
  LAWTREE_ANNOTATED_DIR    Default for --annotated-dir
  LAWTREE_VOCABULARY       Default for --vocabulary
  LAWTREE_CONCURRENCY      Default for --concurrency
"#;

/// Convert OCR-transcribed legal codes into a nested JSON document tree.
#[derive(Parser, Debug)]
#[command(
    name = "law2json",
    version,
    about = "Convert OCR-transcribed legal codes into nested JSON document trees",
    long_about = "Repair OCR artefacts in plain-text Arabic statutes, detect the \
section / chapter / sub-chapter / subsection / article hierarchy, and write it as JSON. \
The input may be a single .txt file or a directory searched recursively for .txt files.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// A .txt file or a directory of .txt files.
    input: PathBuf,

    /// Output file (single input) or directory (directory input). Default: json/
    #[arg(short, long, env = "LAWTREE_OUTPUT")]
    output: Option<PathBuf>,

    /// Also write the annotated text as <name>_clean.txt under this directory.
    #[arg(long, env = "LAWTREE_ANNOTATED_DIR")]
    annotated_dir: Option<PathBuf>,

    /// JSON file with a custom level vocabulary.
    #[arg(long, env = "LAWTREE_VOCABULARY")]
    vocabulary: Option<PathBuf>,

    /// Number of files converted at once.
    #[arg(short, long, env = "LAWTREE_CONCURRENCY", default_value_t = 4)]
    concurrency: usize,

    /// Longest run of one repeated letter kept by the OCR repair.
    #[arg(long, env = "LAWTREE_MAX_LETTER_RUN", default_value_t = 2,
          value_parser = clap::value_parser!(u32).range(1..=10))]
    max_letter_run: u32,

    /// Print the annotated text of a single file, no tree.
    #[arg(long)]
    annotate_only: bool,

    /// Print the JSON document of a single file to stdout.
    #[arg(long, env = "LAWTREE_JSON")]
    json: bool,

    /// Write compact JSON instead of pretty-printed JSON.
    #[arg(long, env = "LAWTREE_COMPACT")]
    compact: bool,

    /// Disable progress bar.
    #[arg(long, env = "LAWTREE_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "LAWTREE_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "LAWTREE_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let is_dir = cli.input.is_dir();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar replaces INFO logs during a batch.
    let show_progress = is_dir && !cli.quiet && !cli.no_progress;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let mut config = build_config(&cli)?;
    if show_progress {
        config.progress_callback =
            Some(CliProgressCallback::new(&config.vocabulary) as Arc<dyn BatchProgressCallback>);
    }

    if is_dir {
        run_directory(&cli, &config).await
    } else {
        run_file(&cli, &config)
    }
}

/// Convert a single file.
fn run_file(cli: &Cli, config: &ConversionConfig) -> Result<()> {
    if cli.annotate_only {
        let text = annotate(&cli.input, config).context("Annotation failed")?;
        println!("{text}");
        return Ok(());
    }

    if cli.json {
        let output = convert(&cli.input, config).context("Conversion failed")?;
        let json = if config.pretty_json {
            serde_json::to_string_pretty(&output.document)
        } else {
            serde_json::to_string(&output.document)
        }
        .context("Failed to serialise document")?;
        println!("{json}");
        return Ok(());
    }

    let json_out = cli
        .output
        .clone()
        .unwrap_or_else(|| Path::new("json").join(file_name_with(&cli.input, "", "json")));
    let annotated_out = cli
        .annotated_dir
        .as_ref()
        .map(|dir| dir.join(file_name_with(&cli.input, "_clean", "txt")));

    let stats = convert_to_file(&cli.input, &json_out, annotated_out.as_deref(), config)
        .context("Conversion failed")?;

    if !cli.quiet {
        eprintln!(
            "{}  {}  {}  →  {}",
            green("✔"),
            format_counts(&stats.counts, &config.vocabulary),
            dim(&format!("{}ms", stats.duration_ms)),
            bold(&json_out.display().to_string()),
        );
        if stats.nodes_pruned > 0 {
            eprintln!("   {} empty nodes pruned", dim(&stats.nodes_pruned.to_string()));
        }
    }
    Ok(())
}

/// Convert every `.txt` file under the input directory, mirroring its layout.
async fn run_directory(cli: &Cli, config: &ConversionConfig) -> Result<()> {
    if cli.annotate_only || cli.json {
        anyhow::bail!("--annotate-only and --json take a single file, not a directory");
    }

    let files = discover_text_files(&cli.input)?;
    if files.is_empty() {
        anyhow::bail!("No .txt files found under {}", cli.input.display());
    }

    let out_dir = cli.output.clone().unwrap_or_else(|| PathBuf::from("json"));
    let jobs = files
        .iter()
        .map(|file| plan_job(&cli.input, file, &out_dir, cli.annotated_dir.as_deref()))
        .collect::<Result<Vec<_>>>()?;

    let batch = convert_batch(jobs, config)
        .await
        .context("Batch conversion failed")?;

    if !cli.quiet && config.progress_callback.is_none() {
        for result in &batch.results {
            match (&result.stats, &result.error) {
                (Some(stats), None) => eprintln!(
                    "  {} {}  {}",
                    green("✓"),
                    result.input.display(),
                    dim(&format_counts(&stats.counts, &config.vocabulary))
                ),
                (_, Some(e)) => eprintln!("  {} {}", red("✗"), e),
                (None, None) => {}
            }
        }
    }
    if !cli.quiet {
        eprintln!(
            "{} total: {}  →  {}",
            cyan("◆"),
            format_counts(&batch.totals(), &config.vocabulary),
            bold(&out_dir.display().to_string())
        );
    }

    if batch.succeeded() == 0 {
        anyhow::bail!("All {} files failed", batch.failed());
    }
    Ok(())
}

/// All `.txt` files under `dir`, sorted.
fn discover_text_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).follow_links(true) {
        let entry = entry.context("Failed to read directory entry")?;
        let path = entry.path();
        let is_txt = path
            .extension()
            .is_some_and(|ext| ext.to_string_lossy().eq_ignore_ascii_case("txt"));
        if entry.file_type().is_file() && is_txt {
            files.push(path.to_path_buf());
        }
    }
    files.sort();
    Ok(files)
}

/// Output paths for `file`, mirroring its position under `root`.
fn plan_job(
    root: &Path,
    file: &Path,
    out_dir: &Path,
    annotated_dir: Option<&Path>,
) -> Result<BatchJob> {
    let rel = file
        .strip_prefix(root)
        .with_context(|| format!("{} is not under {}", file.display(), root.display()))?;
    let rel_dir = rel.parent().unwrap_or_else(|| Path::new(""));

    let job = BatchJob::new(file, out_dir.join(rel_dir).join(file_name_with(file, "", "json")));
    Ok(match annotated_dir {
        Some(dir) => job.with_annotated(dir.join(rel_dir).join(file_name_with(file, "_clean", "txt"))),
        None => job,
    })
}

/// `<stem><suffix>.<ext>` for `path`.
fn file_name_with(path: &Path, suffix: &str, ext: &str) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string());
    format!("{stem}{suffix}.{ext}")
}

/// Map CLI args to `ConversionConfig`.
fn build_config(cli: &Cli) -> Result<ConversionConfig> {
    let mut builder = ConversionConfig::builder()
        .concurrency(cli.concurrency)
        .max_letter_run(cli.max_letter_run as usize)
        .pretty_json(!cli.compact);

    if let Some(ref path) = cli.vocabulary {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read vocabulary from {:?}", path))?;
        let vocabulary = Vocabulary::from_json(&json)
            .with_context(|| format!("Invalid vocabulary in {:?}", path))?;
        builder = builder.vocabulary(vocabulary);
    }

    builder.build().context("Invalid configuration")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plan_job_mirrors_relative_paths() {
        let job = plan_job(
            Path::new("text"),
            Path::new("text/2015/law.txt"),
            Path::new("json"),
            Some(Path::new("clean")),
        )
        .unwrap();
        assert_eq!(job.input, PathBuf::from("text/2015/law.txt"));
        assert_eq!(job.json_output, PathBuf::from("json/2015/law.json"));
        assert_eq!(
            job.annotated_output,
            Some(PathBuf::from("clean/2015/law_clean.txt"))
        );
    }

    #[test]
    fn discovers_only_text_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("sub")).unwrap();
        std::fs::write(dir.path().join("a.txt"), "x").unwrap();
        std::fs::write(dir.path().join("sub/b.TXT"), "x").unwrap();
        std::fs::write(dir.path().join("c.pdf"), "x").unwrap();

        let files = discover_text_files(dir.path()).unwrap();
        assert_eq!(files.len(), 2);
        assert!(files.iter().all(|f| f.extension().is_some()));
    }

    #[test]
    fn counts_line_lists_every_level() {
        let c = StructureCounts {
            sections: 1,
            chapters: 2,
            sub_chapters: 3,
            subsections: 4,
            articles: 5,
        };
        assert_eq!(
            format_counts(&c, &Vocabulary::arabic()),
            "1 قسم | 2 باب | 3 فصل | 4 فرع | 5 مادة"
        );
    }

    #[test]
    fn counts_line_follows_vocabulary_labels() {
        let mut vocabulary = Vocabulary::arabic();
        for (spec, label) in vocabulary
            .levels
            .iter_mut()
            .zip(["part", "title", "chapter", "section", "article"])
        {
            spec.label = label.into();
        }
        let c = StructureCounts {
            articles: 3,
            ..StructureCounts::default()
        };
        assert_eq!(
            format_counts(&c, &vocabulary),
            "0 part | 0 title | 0 chapter | 0 section | 3 article"
        );
    }

    #[test]
    fn cli_parses_flags() {
        let cli = Cli::parse_from(["law2json", "text/", "-o", "out/", "--compact", "-c", "8"]);
        assert_eq!(cli.output, Some(PathBuf::from("out/")));
        assert!(cli.compact);
        assert_eq!(cli.concurrency, 8);
        let config = build_config(&cli).unwrap();
        assert!(!config.pretty_json);
    }
}
