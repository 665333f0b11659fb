use anyhow::Result;
use rmcp::{
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{ServerCapabilities, ServerInfo},
    schemars, tool, tool_handler, tool_router, ServerHandler, ServiceExt,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::commands::highlights::{collect_highlights, HighlightConfig};
use crate::commands::number::number_pages;
use crate::commands::split::{split_to_zip, SplitEntry};
use crate::highlight::Palette;
use crate::pdf::PdfDocument;

// Request structs for tools

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct PdfNumberPagesRequest {
    #[schemars(description = "Path to the source PDF file")]
    pub path: String,
    #[schemars(description = "Output file path")]
    pub output: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct PdfSplitRangesRequest {
    #[schemars(description = "Path to the source PDF file")]
    pub path: String,
    #[schemars(description = "Page ranges, one output file per range (e.g., '1-3, 5, 8-10')")]
    pub pages: String,
    #[schemars(description = "Output ZIP file path")]
    pub output: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct PdfCollectHighlightsRequest {
    #[schemars(description = "Folder containing the PDF files to scan")]
    pub folder: String,
    #[schemars(description = "Suffix for the created files (default: '_my_highlights.pdf')")]
    #[serde(default)]
    pub suffix: Option<String>,
}

#[derive(Debug, Clone)]
pub struct PdfServer {
    palette: Palette,
    tool_router: ToolRouter<Self>,
}

impl PdfServer {
    pub fn new(palette: Palette) -> Self {
        Self {
            palette,
            tool_router: Self::tool_router(),
        }
    }
}

impl Default for PdfServer {
    fn default() -> Self {
        Self::new(Palette::default())
    }
}

#[tool_router]
impl PdfServer {
    #[tool(description = "Stamp a right-aligned page number at the bottom of every page and save the result")]
    fn pdf_number_pages(&self, Parameters(req): Parameters<PdfNumberPagesRequest>) -> String {
        let doc = match PdfDocument::open(&req.path) {
            Ok(d) => d,
            Err(e) => return format!("Error: {}", e),
        };

        let bytes = match number_pages(&doc) {
            Ok(b) => b,
            Err(e) => return format!("Error: {}", e),
        };

        if let Err(e) = std::fs::write(&req.output, bytes) {
            return format!("Error: Failed to write {}: {}", req.output, e);
        }

        let result = NumberPagesResult {
            output_path: req.output,
            page_count: doc.page_count(),
        };
        serde_json::to_string_pretty(&result).unwrap_or_else(|e| format!("Error: {}", e))
    }

    #[tool(description = "Split a PDF into one file per comma-separated page range and bundle them in a ZIP archive")]
    fn pdf_split_ranges(&self, Parameters(req): Parameters<PdfSplitRangesRequest>) -> String {
        let doc = match PdfDocument::open(&req.path) {
            Ok(d) => d,
            Err(e) => return format!("Error: {}", e),
        };

        let archive = match split_to_zip(&doc, &req.pages) {
            Ok(a) => a,
            Err(e) => return format!("Error: {}", e),
        };

        if let Err(e) = std::fs::write(&req.output, &archive.bytes) {
            return format!("Error: Failed to write {}: {}", req.output, e);
        }

        let result = SplitRangesResult {
            output_path: req.output,
            files: archive.entries,
        };
        serde_json::to_string_pretty(&result).unwrap_or_else(|e| format!("Error: {}", e))
    }

    #[tool(description = "Scan a folder of PDFs and, for each file with yellow, green or blue highlights, save a new PDF with only the highlighted pages")]
    fn pdf_collect_highlights(
        &self,
        Parameters(req): Parameters<PdfCollectHighlightsRequest>,
    ) -> String {
        let mut config = HighlightConfig::new(PathBuf::from(req.folder));
        config.palette = self.palette.clone();
        if let Some(suffix) = req.suffix {
            config.suffix = suffix;
        }

        match collect_highlights(&config) {
            Ok(report) => {
                serde_json::to_string_pretty(&report).unwrap_or_else(|e| format!("Error: {}", e))
            }
            Err(e) => format!("Error: {}", e),
        }
    }
}

// Result types for MCP tools

#[derive(Debug, Serialize)]
pub struct NumberPagesResult {
    pub output_path: String,
    pub page_count: u32,
}

#[derive(Debug, Serialize)]
pub struct SplitRangesResult {
    pub output_path: String,
    pub files: Vec<SplitEntry>,
}

#[tool_handler]
impl ServerHandler for PdfServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "PDF page tools. Use pdf_number_pages to stamp page numbers, pdf_split_ranges \
                 to split a PDF into a ZIP of page ranges, and pdf_collect_highlights to gather \
                 highlighted pages from a folder of PDFs."
                    .to_string(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

pub async fn run_server(palette: Palette) -> Result<()> {
    let server = PdfServer::new(palette);

    // Serve using stdin/stdout as a tuple
    let service = server.serve((tokio::io::stdin(), tokio::io::stdout())).await?;

    service.waiting().await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::fixtures::sample_pdf;

    fn write_source(dir: &std::path::Path, pages: &[Vec<Vec<f32>>]) -> String {
        let path = dir.join("source.pdf");
        PdfDocument::save(&mut sample_pdf(pages), &path).unwrap();
        path.display().to_string()
    }

    #[test]
    fn test_number_pages_tool() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_source(dir.path(), &vec![vec![]; 4]);
        let output = dir.path().join("numbered.pdf").display().to_string();

        let server = PdfServer::default();
        let json = server.pdf_number_pages(Parameters(PdfNumberPagesRequest {
            path,
            output: output.clone(),
        }));
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["page_count"], 4);
        assert_eq!(PdfDocument::open(&output).unwrap().page_count(), 4);
    }

    #[test]
    fn test_split_ranges_tool_reports_errors_as_text() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_source(dir.path(), &vec![vec![]; 2]);

        let server = PdfServer::default();
        let text = server.pdf_split_ranges(Parameters(PdfSplitRangesRequest {
            path,
            pages: "abc".to_string(),
            output: dir.path().join("out.zip").display().to_string(),
        }));
        assert_eq!(text, "Error: Invalid page range format: abc");
    }

    #[test]
    fn test_collect_highlights_tool() {
        let dir = tempfile::tempdir().unwrap();
        write_source(dir.path(), &[vec![vec![1.0, 1.0, 0.0]], vec![]]);

        let server = PdfServer::default();
        let json = server.pdf_collect_highlights(Parameters(PdfCollectHighlightsRequest {
            folder: dir.path().display().to_string(),
            suffix: Some("_hl.pdf".to_string()),
        }));
        let report: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(report["scanned"], 1);
        assert!(dir.path().join("source_hl.pdf").exists());
    }
}
