//! Page-level types.

use super::{BBox, Block, BlockId, OrderRef, ReadingOrder, Run, RunId, Table};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Identifier of a region, unique within its page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegionId(pub u32);

/// A single page in the document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    /// Page index (0-based, increasing through the document)
    pub index: u32,

    /// Page width in points (1 point = 1/72 inch)
    pub width: f32,

    /// Page height in points
    pub height: f32,

    /// Regions in geometric order (top to bottom, then left to right)
    #[serde(default)]
    pub regions: Vec<Region>,

    #[serde(default)]
    pub reading_order: ReadingOrder,

    /// Non-text content that is not a region: vector paths, rules and
    /// decorative images
    #[serde(default)]
    pub graphics: Vec<Graphic>,

    /// Decode failure message; the page is empty when set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    #[serde(flatten, default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, Value>,
}

impl Page {
    /// Create an empty page with the given dimensions.
    pub fn new(index: u32, width: f32, height: f32) -> Self {
        Self {
            index,
            width,
            height,
            regions: Vec::new(),
            reading_order: ReadingOrder::new(),
            graphics: Vec::new(),
            error: None,
            extra: BTreeMap::new(),
        }
    }

    /// Create an empty page standing in for one that failed to decode.
    pub fn failed(index: u32, width: f32, height: f32, error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::new(index, width, height)
        }
    }

    /// Create a new page with standard Letter size (8.5 x 11 inches).
    pub fn letter(index: u32) -> Self {
        Self::new(index, 612.0, 792.0)
    }

    /// Full page box.
    pub fn bbox(&self) -> BBox {
        BBox::new(0.0, 0.0, self.width, self.height)
    }

    pub fn is_failed(&self) -> bool {
        self.error.is_some()
    }

    /// Check if the page has no regions.
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    pub fn region(&self, id: RegionId) -> Option<&Region> {
        self.regions.iter().find(|r| r.id == id)
    }

    /// All blocks, including table cells and OCR text, in region order.
    pub fn blocks(&self) -> impl Iterator<Item = &Block> {
        self.regions.iter().flat_map(|r| r.blocks())
    }

    pub fn blocks_mut(&mut self) -> impl Iterator<Item = &mut Block> {
        self.regions.iter_mut().flat_map(|r| r.blocks_mut())
    }

    pub fn block(&self, id: BlockId) -> Option<&Block> {
        self.blocks().find(|b| b.id == id)
    }

    /// Region holding the block with `id`.
    pub fn region_of_block(&self, id: BlockId) -> Option<&Region> {
        self.regions.iter().find(|r| r.blocks().any(|b| b.id == id))
    }

    pub fn runs(&self) -> impl Iterator<Item = &Run> {
        self.blocks().flat_map(|b| b.runs())
    }

    pub fn run_mut(&mut self, id: RunId) -> Option<&mut Run> {
        self.blocks_mut()
            .flat_map(|b| b.runs_mut())
            .find(|r| r.id == id)
    }

    /// Blocks in reading order. Region entries expand to their own blocks.
    pub fn ordered_blocks(&self) -> Vec<&Block> {
        let mut out = Vec::new();
        for item in self.reading_order.iter() {
            match item {
                OrderRef::Block(id) => {
                    if let Some(block) = self.block(*id) {
                        out.push(block);
                    }
                }
                OrderRef::Region(id) => {
                    if let Some(region) = self.region(*id) {
                        out.extend(region.blocks());
                    }
                }
            }
        }
        out
    }

    /// Next unused block id.
    pub fn next_block_id(&self) -> BlockId {
        BlockId(self.blocks().map(|b| b.id.0 + 1).max().unwrap_or(0))
    }

    /// Next unused run id.
    pub fn next_run_id(&self) -> RunId {
        RunId(self.runs().map(|r| r.id.0 + 1).max().unwrap_or(0))
    }

    /// Get plain text content of the page in reading order.
    pub fn plain_text(&self) -> String {
        self.ordered_blocks()
            .iter()
            .map(|b| b.text())
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

/// Classification of a region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegionKind {
    SingleColumn,
    MultiColumn,
    Table,
    Image,
    HeaderFooter,
}

/// A classified, contiguous area of a page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub id: RegionId,

    pub kind: RegionKind,

    pub bbox: BBox,

    /// Horizontal band of the page between full-width interruptions
    #[serde(default)]
    pub section: u16,

    /// Column inside the section (0 = first in reading direction)
    #[serde(default)]
    pub column: u16,

    pub content: RegionContent,

    #[serde(flatten, default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, Value>,
}

impl Region {
    pub fn new(id: RegionId, kind: RegionKind, bbox: BBox, content: RegionContent) -> Self {
        Self {
            id,
            kind,
            bbox,
            section: 0,
            column: 0,
            content,
            extra: BTreeMap::new(),
        }
    }

    /// Place the region in the column flow.
    pub fn in_flow(mut self, section: u16, column: u16) -> Self {
        self.section = section;
        self.column = column;
        self
    }

    pub fn blocks(&self) -> Box<dyn Iterator<Item = &Block> + '_> {
        match &self.content {
            RegionContent::Blocks { blocks } => Box::new(blocks.iter()),
            RegionContent::Table { table } => Box::new(table.blocks()),
            RegionContent::Image { blocks, .. } => Box::new(blocks.iter()),
        }
    }

    pub fn blocks_mut(&mut self) -> Box<dyn Iterator<Item = &mut Block> + '_> {
        match &mut self.content {
            RegionContent::Blocks { blocks } => Box::new(blocks.iter_mut()),
            RegionContent::Table { table } => Box::new(table.blocks_mut()),
            RegionContent::Image { blocks, .. } => Box::new(blocks.iter_mut()),
        }
    }

    pub fn table(&self) -> Option<&Table> {
        match &self.content {
            RegionContent::Table { table } => Some(table),
            _ => None,
        }
    }

    pub fn image(&self) -> Option<&ImageRef> {
        match &self.content {
            RegionContent::Image { image, .. } => Some(image),
            _ => None,
        }
    }

    /// Image region without any glyphs, the only kind sent to OCR.
    pub fn needs_ocr(&self) -> bool {
        matches!(&self.content, RegionContent::Image { image, blocks } if image.glyph_free && blocks.is_empty())
    }

    /// Check if the region carries text that flows in a column.
    pub fn is_text(&self) -> bool {
        matches!(self.content, RegionContent::Blocks { .. })
    }
}

/// What a region holds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RegionContent {
    /// Text blocks in reading order
    Blocks { blocks: Vec<Block> },
    /// A single table
    Table { table: Table },
    /// An image, with text recognized inside it
    Image {
        image: ImageRef,
        #[serde(default)]
        blocks: Vec<Block>,
    },
}

/// Placement of an image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageRef {
    pub bbox: BBox,

    /// No glyph overlaps the image
    #[serde(default)]
    pub glyph_free: bool,

    #[serde(flatten, default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, Value>,
}

impl ImageRef {
    pub fn new(bbox: BBox, glyph_free: bool) -> Self {
        Self {
            bbox,
            glyph_free,
            extra: BTreeMap::new(),
        }
    }
}

/// Kind of a non-text primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GraphicKind {
    Image,
    Path,
}

/// Non-text content re-emitted unchanged during reconstruction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Graphic {
    pub kind: GraphicKind,

    pub bbox: BBox,

    #[serde(flatten, default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, Value>,
}

impl Graphic {
    pub fn new(kind: GraphicKind, bbox: BBox) -> Self {
        Self {
            kind,
            bbox,
            extra: BTreeMap::new(),
        }
    }
}
