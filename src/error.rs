use std::path::PathBuf;
use thiserror::Error;

/// Errors produced by the page selection and assembly operations.
///
/// Every variant is recoverable at the caller: the web form re-renders with
/// the message, and the folder scan records it and moves to the next file.
#[derive(Debug, Error)]
pub enum ToolError {
    /// A range token is neither `N` nor `N-M`, has a zero bound, or runs backwards.
    #[error("Invalid page range format: {0}")]
    InvalidRangeFormat(String),

    /// No group or page survived selection.
    #[error("No matching pages")]
    NoMatchingPages,

    /// The document has no pages to number.
    #[error("Document has no pages")]
    EmptyDocument,

    /// The bytes could not be parsed as a PDF.
    #[error("Unreadable PDF {name}: {source}")]
    UnreadableSource {
        name: String,
        #[source]
        source: lopdf::Error,
    },

    /// Listing a folder or writing an output file failed.
    #[error("File system access failed for {}: {source}", path.display())]
    FileSystemAccess {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),
}

pub type ToolResult<T> = std::result::Result<T, ToolError>;
