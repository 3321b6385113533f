//! Page primitives from the external content decoder.
//!
//! The decoder hands over glyph runs, images and vector paths with their
//! boxes. [`normalize_page`] turns them into a uniform stream: text is NFC
//! normalized, boxes are repaired and clipped to the page, and every glyph
//! carries a font.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;

use crate::error::{DecodeError, Error, Result};
use crate::model::{BBox, Document, FontDescriptor, GraphicKind, RegionContent};

/// Kind of a primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrimitiveKind {
    #[serde(alias = "glyph_run", alias = "text")]
    Glyph,
    Image,
    Path,
}

/// A positioned piece of page content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Primitive {
    pub kind: PrimitiveKind,
    pub bbox: BBox,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font: Option<FontDescriptor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl Primitive {
    pub fn glyph(text: impl Into<String>, bbox: BBox, font: FontDescriptor) -> Self {
        Self {
            kind: PrimitiveKind::Glyph,
            bbox,
            font: Some(font),
            text: Some(text.into()),
        }
    }

    pub fn image(bbox: BBox) -> Self {
        Self {
            kind: PrimitiveKind::Image,
            bbox,
            font: None,
            text: None,
        }
    }

    pub fn path(bbox: BBox) -> Self {
        Self {
            kind: PrimitiveKind::Path,
            bbox,
            font: None,
            text: None,
        }
    }
}

/// Everything the decoder produced for one page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawPage {
    pub index: u32,
    pub width: f32,
    pub height: f32,
    #[serde(default)]
    pub primitives: Vec<Primitive>,
}

impl RawPage {
    pub fn new(index: u32, width: f32, height: f32) -> Self {
        Self {
            index,
            width,
            height,
            primitives: Vec::new(),
        }
    }

    pub fn push(&mut self, primitive: Primitive) {
        self.primitives.push(primitive);
    }

    pub fn with(mut self, primitive: Primitive) -> Self {
        self.primitives.push(primitive);
        self
    }
}

/// The raw page-content decoder.
///
/// Decode failures are page-scoped: the extractor turns them into empty
/// pages flagged with the error.
pub trait PageSource: Sync {
    /// Number of pages in the source.
    fn page_count(&self) -> u32;

    /// Decode the primitives of one page (0-based).
    fn get_primitives(&self, index: u32) -> std::result::Result<RawPage, DecodeError>;

    /// Page size in points, if known without decoding the page.
    fn page_size(&self, _index: u32) -> Option<(f32, f32)> {
        None
    }

    /// Path of the source document.
    fn source_path(&self) -> Option<&str> {
        None
    }
}

/// A page source held in memory, typically loaded from a JSON dump of a
/// decoder's output.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemorySource {
    #[serde(default)]
    pub source_path: Option<String>,

    #[serde(default)]
    pub pages: Vec<RawPage>,

    /// Pages the decoder could not read, with the reason
    #[serde(default)]
    pub failures: BTreeMap<u32, String>,
}

impl MemorySource {
    pub fn new(pages: Vec<RawPage>) -> Self {
        Self {
            source_path: None,
            pages,
            failures: BTreeMap::new(),
        }
    }

    /// Mark a page as undecodable.
    pub fn with_failure(mut self, index: u32, message: impl Into<String>) -> Self {
        self.failures.insert(index, message.into());
        self
    }

    pub fn with_source_path(mut self, path: impl Into<String>) -> Self {
        self.source_path = Some(path.into());
        self
    }

    /// Parse a JSON dump.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::Other(format!("Invalid primitive dump: {}", e)))
    }

    /// Read a JSON dump from a file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = std::fs::read_to_string(path.as_ref())?;
        let mut source = Self::from_json(&json)?;
        if source.source_path.is_none() {
            source.source_path = Some(path.as_ref().display().to_string());
        }
        Ok(source)
    }
}

impl PageSource for MemorySource {
    fn page_count(&self) -> u32 {
        let from_pages = self.pages.iter().map(|p| p.index + 1).max().unwrap_or(0);
        let from_failures = self.failures.keys().map(|i| i + 1).max().unwrap_or(0);
        from_pages.max(from_failures)
    }

    fn get_primitives(&self, index: u32) -> std::result::Result<RawPage, DecodeError> {
        if let Some(message) = self.failures.get(&index) {
            return Err(DecodeError::new(index, message.clone()));
        }
        self.pages
            .iter()
            .find(|p| p.index == index)
            .cloned()
            .ok_or_else(|| DecodeError::new(index, "page missing from source"))
    }

    fn page_size(&self, index: u32) -> Option<(f32, f32)> {
        self.pages
            .iter()
            .find(|p| p.index == index)
            .map(|p| (p.width, p.height))
    }

    fn source_path(&self) -> Option<&str> {
        self.source_path.as_deref()
    }
}

/// A text primitive after normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct Glyph {
    pub bbox: BBox,
    pub text: String,
    pub font: FontDescriptor,
}

impl Glyph {
    pub fn new(text: impl Into<String>, bbox: BBox, font: FontDescriptor) -> Self {
        Self {
            bbox,
            text: text.into(),
            font,
        }
    }

    pub fn size(&self) -> f32 {
        self.font.size
    }

    /// Approximate baseline: the box bottom minus the descender.
    pub fn baseline(&self) -> f32 {
        self.bbox.y1 - self.font.size * 0.2
    }

    /// Average character width, or half the font size when unknown.
    pub fn avg_char_width(&self) -> f32 {
        let chars = self.text.chars().count();
        if chars > 0 && self.bbox.width() > 0.0 {
            self.bbox.width() / chars as f32
        } else {
            self.font.size * 0.5
        }
    }

    pub fn char_count(&self) -> usize {
        self.text.chars().filter(|c| !c.is_whitespace()).count()
    }
}

/// Uniform primitive stream of one page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedPage {
    pub index: u32,
    pub width: f32,
    pub height: f32,
    pub glyphs: Vec<Glyph>,
    pub images: Vec<BBox>,
    pub paths: Vec<BBox>,
}

impl NormalizedPage {
    pub fn bbox(&self) -> BBox {
        BBox::new(0.0, 0.0, self.width, self.height)
    }

    /// Check if the page yielded no primitives.
    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty() && self.images.is_empty() && self.paths.is_empty()
    }
}

/// Normalize a decoded page.
///
/// Whitespace-only text, non-finite boxes and content entirely outside the
/// page are dropped. Inverted boxes are repaired and the rest is clipped to
/// the page.
pub fn normalize_page(raw: RawPage, default_font: &FontDescriptor) -> NormalizedPage {
    let frame = BBox::new(0.0, 0.0, raw.width.max(0.0), raw.height.max(0.0));
    let clip = frame.width() > 0.0 && frame.height() > 0.0;

    let mut page = NormalizedPage {
        index: raw.index,
        width: frame.width(),
        height: frame.height(),
        ..Default::default()
    };
    let mut dropped = 0usize;

    for primitive in raw.primitives {
        if !primitive.bbox.is_finite() {
            dropped += 1;
            continue;
        }
        let mut bbox = primitive.bbox.normalized();
        if clip {
            bbox = bbox.clip_to(&frame);
        }

        match primitive.kind {
            PrimitiveKind::Glyph => {
                let text: String = primitive.text.unwrap_or_default().nfc().collect();
                if text.trim().is_empty() || (bbox.width() <= 0.0 && bbox.height() <= 0.0) {
                    dropped += 1;
                    continue;
                }
                let mut font = primitive.font.unwrap_or_else(|| default_font.clone());
                if !font.size.is_finite() || font.size <= 0.0 {
                    font.size = bbox.height().max(1.0);
                }
                page.glyphs.push(Glyph { bbox, text, font });
            }
            PrimitiveKind::Image => {
                if bbox.is_empty() {
                    dropped += 1;
                } else {
                    page.images.push(bbox);
                }
            }
            PrimitiveKind::Path => {
                // Hairlines have zero width or height and are still rules.
                if bbox.width() <= 0.0 && bbox.height() <= 0.0 {
                    dropped += 1;
                } else {
                    page.paths.push(bbox);
                }
            }
        }
    }

    if dropped > 0 {
        log::debug!("Page {}: dropped {} degenerate primitives", page.index, dropped);
    }

    page
}

/// Flatten an extracted document back into primitives.
///
/// Every run becomes one glyph primitive with its font and box; images and
/// graphics are re-emitted as they are.
pub fn flatten_document(doc: &Document) -> MemorySource {
    let mut source = MemorySource::new(Vec::new());
    source.source_path = doc.metadata.source_path.clone();

    for page in &doc.pages {
        if let Some(error) = &page.error {
            source.failures.insert(page.index, error.clone());
            continue;
        }

        let mut raw = RawPage::new(page.index, page.width, page.height);
        for region in &page.regions {
            if let RegionContent::Image { image, .. } = &region.content {
                raw.push(Primitive::image(image.bbox));
            }
            for block in region.blocks() {
                for run in block.runs() {
                    if let Some(font) = doc.fonts.get(run.font) {
                        raw.push(Primitive::glyph(run.text.clone(), run.bbox, font.clone()));
                    }
                }
            }
        }
        for graphic in &page.graphics {
            raw.push(match graphic.kind {
                GraphicKind::Image => Primitive::image(graphic.bbox),
                GraphicKind::Path => Primitive::path(graphic.bbox),
            });
        }
        source.pages.push(raw);
    }

    source
}
