use crate::error::ToolResult;
use crate::pdf::stamp::stamp_page_numbers;
use crate::pdf::PdfDocument;
use anyhow::{Context, Result};
use std::path::Path;

pub const OUTPUT_NAME: &str = "numbered_document.pdf";

/// Stamp page numbers onto `source` and serialize the result.
pub fn number_pages(source: &PdfDocument) -> ToolResult<Vec<u8>> {
    let mut stamped = stamp_page_numbers(&source.doc)?;
    PdfDocument::to_bytes(&mut stamped)
}

pub fn run<P: AsRef<Path>, Q: AsRef<Path>>(input: P, output: Q) -> Result<()> {
    let output = output.as_ref();
    let doc = PdfDocument::open(&input)?;
    let bytes = number_pages(&doc)?;

    std::fs::write(output, bytes)
        .with_context(|| format!("Failed to write PDF: {}", output.display()))?;

    println!(
        "Numbered {} page(s) into {}",
        doc.page_count(),
        output.display()
    );

    Ok(())
}
