use crate::error::{ToolError, ToolResult};
use crate::page_range::parse_page_groups;
use crate::pdf::PdfDocument;
use anyhow::{Context, Result};
use serde::Serialize;
use std::collections::HashSet;
use std::io::{Cursor, Write};
use std::path::Path;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

pub const ARCHIVE_NAME: &str = "split_documents.zip";

/// A ZIP holding one PDF per non-empty range group.
pub struct SplitArchive {
    pub bytes: Vec<u8>,
    pub entries: Vec<SplitEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SplitEntry {
    pub name: String,
    pub page_count: usize,
}

/// Split `source` into one PDF per comma-separated token of `ranges`, zipped.
///
/// Groups with no page inside the document produce no entry. If no group
/// survives, fails with [`ToolError::NoMatchingPages`].
pub fn split_to_zip(source: &PdfDocument, ranges: &str) -> ToolResult<SplitArchive> {
    let groups = parse_page_groups(ranges, source.page_count())?;

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let mut entries = Vec::new();
    let mut used_names = HashSet::new();

    for group in &groups {
        let Some(mut doc) = source.assemble(&group.selection)? else {
            tracing::debug!(token = %group.token, "range selects no pages, skipping");
            continue;
        };
        let bytes = PdfDocument::to_bytes(&mut doc)?;
        let name = entry_name(&group.token, &mut used_names);

        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        zip.start_file(name.as_str(), options)?;
        zip.write_all(&bytes)?;

        entries.push(SplitEntry {
            name,
            page_count: group.selection.len(),
        });
    }

    if entries.is_empty() {
        return Err(ToolError::NoMatchingPages);
    }

    let bytes = zip.finish()?.into_inner();
    Ok(SplitArchive { bytes, entries })
}

/// `split_pages_<token>.pdf`, numbered from `_2` when a token repeats.
fn entry_name(token: &str, used: &mut HashSet<String>) -> String {
    let mut name = format!("split_pages_{token}.pdf");
    let mut n = 2;
    while !used.insert(name.clone()) {
        name = format!("split_pages_{token}_{n}.pdf");
        n += 1;
    }
    name
}

pub fn run<P: AsRef<Path>, Q: AsRef<Path>>(input: P, ranges: &str, output: Q) -> Result<()> {
    let output = output.as_ref();
    let doc = PdfDocument::open(&input)?;
    let archive = split_to_zip(&doc, ranges)?;

    std::fs::write(output, &archive.bytes)
        .with_context(|| format!("Failed to write archive: {}", output.display()))?;

    for entry in &archive.entries {
        println!("{} ({} page(s))", entry.name, entry.page_count);
    }
    println!(
        "Split into {} file(s) in {}",
        archive.entries.len(),
        output.display()
    );

    Ok(())
}
