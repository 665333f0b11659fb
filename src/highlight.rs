use crate::page_range::PageSelection;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// An RGB color with components in `[0.0, 1.0]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColorSample {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl ColorSample {
    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        ColorSample { r, g, b }
    }

    /// Build a sample from PDF color components: 1 (gray), 3 (RGB) or 4 (CMYK).
    ///
    /// Zero components means a transparent annotation, which has no color.
    pub fn from_components(components: &[f32]) -> Option<Self> {
        match *components {
            [gray] => Some(ColorSample::new(gray, gray, gray)),
            [r, g, b] => Some(ColorSample::new(r, g, b)),
            [c, m, y, k] => Some(ColorSample::new(
                (1.0 - c) * (1.0 - k),
                (1.0 - m) * (1.0 - k),
                (1.0 - y) * (1.0 - k),
            )),
            _ => None,
        }
    }

    /// True if every channel differs from `other` by strictly less than `tolerance`.
    pub fn is_close_to(&self, other: &ColorSample, tolerance: f32) -> bool {
        (self.r - other.r).abs() < tolerance
            && (self.g - other.g).abs() < tolerance
            && (self.b - other.b).abs() < tolerance
    }
}

/// The highlight colors to look for and how close a color must be to count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Palette {
    pub colors: Vec<ColorSample>,
    pub tolerance: f32,
}

impl Default for Palette {
    fn default() -> Self {
        Palette {
            colors: vec![
                ColorSample::new(1.0, 1.0, 0.0),   // yellow
                ColorSample::new(0.0, 1.0, 0.0),   // green
                ColorSample::new(0.0, 0.749, 1.0), // sky blue
            ],
            tolerance: 0.05,
        }
    }
}

impl Palette {
    /// Load a palette from a JSON file shaped like `{"colors": [{"r":..,"g":..,"b":..}], "tolerance": ..}`.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read palette: {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse palette: {}", path.display()))
    }

    pub fn matches(&self, color: Option<&ColorSample>) -> bool {
        match color {
            Some(color) => self
                .colors
                .iter()
                .any(|target| color.is_close_to(target, self.tolerance)),
            None => false,
        }
    }
}

/// Pages whose highlights include at least one palette color.
///
/// `pages` yields each page index with the colors of its highlight annotations.
/// A page is kept as soon as one of its highlights matches.
pub fn select_matching_pages<I>(pages: I, palette: &Palette) -> PageSelection
where
    I: IntoIterator<Item = (u32, Vec<Option<ColorSample>>)>,
{
    let mut selection = PageSelection::new();
    for (page_index, colors) in pages {
        if colors.is_empty() {
            continue;
        }
        if colors.iter().any(|color| palette.matches(color.as_ref())) {
            tracing::debug!(page = page_index + 1, "matching highlight found");
            selection.insert(page_index);
        }
    }
    selection
}
