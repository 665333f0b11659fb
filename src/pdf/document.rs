use crate::error::{ToolError, ToolResult};
use crate::page_range::PageSelection;
use lopdf::{Document, ObjectId};
use std::path::Path;

/// A source PDF loaded into memory. It is only read from; outputs are new documents.
pub struct PdfDocument {
    pub doc: Document,
    pub name: String,
}

impl PdfDocument {
    pub fn open<P: AsRef<Path>>(path: P) -> ToolResult<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|source| ToolError::FileSystemAccess {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_bytes(path.display().to_string(), &bytes)
    }

    /// Parse an uploaded or in-memory PDF; `name` is only used in error messages.
    pub fn from_bytes(name: impl Into<String>, bytes: &[u8]) -> ToolResult<Self> {
        let name = name.into();
        match Document::load_mem(bytes) {
            Ok(doc) => Ok(PdfDocument { doc, name }),
            Err(source) => Err(ToolError::UnreadableSource { name, source }),
        }
    }

    pub fn page_count(&self) -> u32 {
        self.doc.get_pages().len() as u32
    }

    /// Get 1-indexed page object IDs
    pub fn page_ids(&self) -> Vec<(u32, ObjectId)> {
        let mut pages: Vec<_> = self.doc.get_pages().into_iter().collect();
        pages.sort_by_key(|(num, _)| *num);
        pages
    }

    /// Copy the selected pages into a new document, keeping their original order.
    ///
    /// Pages are carried over with their content, resources and annotations
    /// untouched. Returns `None` when no selected page exists in the source, so
    /// callers never write an empty PDF.
    pub fn assemble(&self, selection: &PageSelection) -> ToolResult<Option<Document>> {
        let (keep, delete): (Vec<u32>, Vec<u32>) = self
            .page_ids()
            .into_iter()
            .map(|(num, _)| num)
            .partition(|num| selection.contains(num - 1));

        if keep.is_empty() {
            return Ok(None);
        }

        let mut new_doc = self.doc.clone();
        if !delete.is_empty() {
            new_doc.delete_pages(&delete);
        }
        new_doc.prune_objects();

        Ok(Some(new_doc))
    }

    /// Serialize a document to PDF bytes.
    pub fn to_bytes(doc: &mut Document) -> ToolResult<Vec<u8>> {
        doc.compress();
        let mut buffer = Vec::new();
        doc.save_to(&mut buffer)?;
        Ok(buffer)
    }

    /// Save to a file
    pub fn save<P: AsRef<Path>>(doc: &mut Document, path: P) -> ToolResult<()> {
        let path = path.as_ref();
        let bytes = Self::to_bytes(doc)?;
        std::fs::write(path, bytes).map_err(|source| ToolError::FileSystemAccess {
            path: path.to_path_buf(),
            source,
        })
    }
}
