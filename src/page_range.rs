use crate::error::{ToolError, ToolResult};
use std::collections::BTreeSet;

/// One comma-separated token: a single page or an inclusive span, 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRange {
    pub start: u32,
    pub end: u32,
}

impl PageRange {
    /// Parse a token like "5" or "1-3". Reverse spans ("5-2") are rejected.
    pub fn parse(s: &str) -> ToolResult<Self> {
        let s = s.trim();
        let invalid = || ToolError::InvalidRangeFormat(s.to_string());

        let (start, end) = match s.split_once('-') {
            Some((start, end)) => (
                parse_bound(start).ok_or_else(invalid)?,
                parse_bound(end).ok_or_else(invalid)?,
            ),
            None => {
                let page = parse_bound(s).ok_or_else(invalid)?;
                (page, page)
            }
        };

        if start > end {
            return Err(invalid());
        }

        Ok(PageRange { start, end })
    }

    /// Zero-based indices of this range that exist in a document of `page_count` pages.
    pub fn selection(&self, page_count: u32) -> PageSelection {
        let last = self.end.min(page_count);
        (self.start - 1..last).collect()
    }
}

fn parse_bound(s: &str) -> Option<u32> {
    let s = s.trim();
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    // All digits, so the only failure left is overflow: such a page exists in no document.
    let n = s.parse::<u32>().unwrap_or(u32::MAX);
    (n > 0).then_some(n)
}

/// Ascending, deduplicated zero-based page indices destined for one output document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageSelection {
    indices: BTreeSet<u32>,
}

impl PageSelection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, index: u32) {
        self.indices.insert(index);
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn contains(&self, index: u32) -> bool {
        self.indices.contains(&index)
    }

    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        self.indices.iter().copied()
    }

    /// The selection as 1-based page numbers, the numbering lopdf uses.
    pub fn page_numbers(&self) -> Vec<u32> {
        self.iter().map(|i| i + 1).collect()
    }
}

impl FromIterator<u32> for PageSelection {
    fn from_iter<I: IntoIterator<Item = u32>>(iter: I) -> Self {
        PageSelection {
            indices: iter.into_iter().collect(),
        }
    }
}

/// A token as the user typed it, with the pages it resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageGroup {
    pub token: String,
    pub selection: PageSelection,
}

/// Parse a comma-separated list of page ranges like "1-3, 5, 8-10".
///
/// Empty tokens are skipped.
pub fn parse_page_ranges(s: &str) -> ToolResult<Vec<(String, PageRange)>> {
    s.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| Ok((part.to_string(), PageRange::parse(part)?)))
        .collect()
}

/// Resolve each token of `s` into its own group of zero-based indices.
///
/// Tokens are not merged with each other. Pages beyond `page_count` are dropped,
/// and a group left with no pages is dropped entirely.
pub fn parse_page_groups(s: &str, page_count: u32) -> ToolResult<Vec<PageGroup>> {
    let groups = parse_page_ranges(s)?
        .into_iter()
        .map(|(token, range)| PageGroup {
            token,
            selection: range.selection(page_count),
        })
        .filter(|group| !group.selection.is_empty())
        .collect();
    Ok(groups)
}
