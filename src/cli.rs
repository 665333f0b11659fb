use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "pdftools")]
#[command(about = "Number, split and collect highlighted pages of PDFs, with a web form and MCP server")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Serve the upload form for numbering and splitting
    Serve {
        /// Address to listen on
        #[arg(long, default_value = "127.0.0.1:5000")]
        bind: SocketAddr,

        /// Largest accepted request body, in bytes
        #[arg(long, default_value_t = 64 * 1024 * 1024)]
        max_upload_bytes: usize,
    },

    /// Stamp a page number at the bottom right of every page
    Number {
        /// PDF file to number
        path: PathBuf,

        /// Output file
        #[arg(short, long, default_value = "numbered_document.pdf")]
        output: PathBuf,
    },

    /// Split a PDF into one file per page range, bundled in a ZIP
    Split {
        /// PDF file to split
        path: PathBuf,

        /// Page ranges, one output file each (e.g., "1-3, 5, 8-10")
        pages: String,

        /// Output ZIP file
        #[arg(short, long, default_value = "split_documents.zip")]
        output: PathBuf,
    },

    /// Save the highlighted pages of every PDF in a folder
    Highlights {
        /// Folder to scan
        #[arg(env = "PDFTOOLS_FOLDER")]
        folder: PathBuf,

        /// Suffix for created files
        #[arg(long, default_value = "_my_highlights.pdf")]
        suffix: String,

        /// JSON palette of highlight colors to look for
        #[arg(long)]
        palette: Option<PathBuf>,

        /// Per-channel color tolerance
        #[arg(long)]
        tolerance: Option<f32>,
    },

    /// Run as MCP server on stdin/stdout
    Mcp {
        /// JSON palette used by pdf_collect_highlights
        #[arg(long)]
        palette: Option<PathBuf>,
    },
}
