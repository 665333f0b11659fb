use crate::error::{ToolError, ToolResult};
use crate::highlight::{select_matching_pages, Palette};
use crate::pdf::annotations::highlight_colors;
use crate::pdf::PdfDocument;
use serde::Serialize;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

pub const DEFAULT_SUFFIX: &str = "_my_highlights.pdf";

/// Where to scan and what to look for.
#[derive(Debug, Clone)]
pub struct HighlightConfig {
    pub folder: PathBuf,
    pub suffix: String,
    pub palette: Palette,
}

impl HighlightConfig {
    pub fn new(folder: impl Into<PathBuf>) -> Self {
        HighlightConfig {
            folder: folder.into(),
            suffix: DEFAULT_SUFFIX.to_string(),
            palette: Palette::default(),
        }
    }
}

#[derive(Debug, Default, Serialize)]
pub struct ScanReport {
    pub scanned: usize,
    pub written: Vec<PathBuf>,
    pub unmatched: Vec<PathBuf>,
    pub failures: Vec<ScanFailure>,
}

#[derive(Debug, Serialize)]
pub struct ScanFailure {
    pub path: PathBuf,
    pub error: String,
}

/// Scan `config.folder` for PDFs and write `<stem><suffix>` next to each one
/// that has highlights in the palette, containing only those pages.
///
/// A file that fails is recorded in the report and the scan moves on. Only an
/// unreadable folder fails the whole run.
pub fn collect_highlights(config: &HighlightConfig) -> ToolResult<ScanReport> {
    let sources = list_sources(&config.folder, &config.suffix)?;
    let mut report = ScanReport::default();

    for path in sources {
        report.scanned += 1;
        match extract_highlighted_pages(&path, config) {
            Ok(Some(output)) => {
                tracing::info!(source = %path.display(), output = %output.display(), "saved highlighted pages");
                report.written.push(output);
            }
            Ok(None) => {
                tracing::info!(source = %path.display(), "no highlights in the palette");
                report.unmatched.push(path);
            }
            Err(e) => {
                tracing::warn!(source = %path.display(), error = %e, "failed to process PDF");
                report.failures.push(ScanFailure {
                    path,
                    error: e.to_string(),
                });
            }
        }
    }

    Ok(report)
}

/// PDFs directly inside `folder`, excluding outputs of earlier runs.
fn list_sources(folder: &Path, suffix: &str) -> ToolResult<Vec<PathBuf>> {
    let fs_error = |source| ToolError::FileSystemAccess {
        path: folder.to_path_buf(),
        source,
    };
    let metadata = std::fs::metadata(folder).map_err(fs_error)?;
    if !metadata.is_dir() {
        return Err(fs_error(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            "not a directory",
        )));
    }

    let suffix = suffix.to_lowercase();
    let mut sources = Vec::new();
    for entry in WalkDir::new(folder)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(error = %e, "skipping unreadable entry");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().to_lowercase();
        if name.ends_with(".pdf") && !name.ends_with(&suffix) {
            sources.push(entry.into_path());
        }
    }
    Ok(sources)
}

fn extract_highlighted_pages(path: &Path, config: &HighlightConfig) -> ToolResult<Option<PathBuf>> {
    let source = PdfDocument::open(path)?;
    let selection = select_matching_pages(highlight_colors(&source.doc), &config.palette);
    tracing::debug!(source = %path.display(), pages = ?selection.page_numbers(), "selected pages");

    let Some(mut doc) = source.assemble(&selection)? else {
        return Ok(None);
    };

    let output = output_path(path, &config.suffix);
    PdfDocument::save(&mut doc, &output)?;
    Ok(Some(output))
}

fn output_path(source: &Path, suffix: &str) -> PathBuf {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    source.with_file_name(format!("{stem}{suffix}"))
}

pub fn run(config: &HighlightConfig) -> anyhow::Result<()> {
    println!("Searching for PDF files in: {}", config.folder.display());
    let report = collect_highlights(config)?;

    if report.scanned == 0 {
        println!("No source PDF files were found to process.");
        return Ok(());
    }

    for path in &report.written {
        println!("Saved: {}", path.display());
    }
    for path in &report.unmatched {
        println!("No matching highlights: {}", path.display());
    }
    for failure in &report.failures {
        println!("Failed: {}: {}", failure.path.display(), failure.error);
    }

    println!(
        "\nScanned {} file(s), created {} new PDF(s), {} failure(s).",
        report.scanned,
        report.written.len(),
        report.failures.len()
    );

    Ok(())
}
