//! Extraction options and configuration.
//!
//! Every heuristic threshold used by segmentation, column resolution and
//! table detection lives here as a named field. The defaults are
//! calibration parameters tuned on typical manuals and data sheets, not
//! invariants; tune them against a corpus.

use std::ops::RangeInclusive;

use super::table_detector::TableDetectorConfig;
use crate::model::FontDescriptor;

/// Options for extracting a document from page primitives.
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// Error handling mode
    pub error_mode: ErrorMode,

    /// Whether to extract pages in parallel
    pub parallel: bool,

    /// Page selection (which pages to extract)
    pub pages: PageSelection,

    /// Line and block segmentation thresholds
    pub segment: SegmentOptions,

    /// Column and reading-order thresholds
    pub columns: ColumnOptions,

    /// Table detection thresholds
    pub tables: TableDetectorConfig,

    /// Whether to run table detection at all
    pub detect_tables: bool,

    /// Images smaller than this in either dimension are decorative graphics,
    /// not image regions (points)
    pub min_image_size: f32,

    /// Height of the top and bottom page bands searched for running
    /// headers and footers (fraction of page height, 0 disables)
    pub header_footer_band: f32,

    /// Font assigned to text primitives that arrive without one
    pub default_font: FontDescriptor,
}

impl ExtractOptions {
    /// Create new extract options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set error mode.
    pub fn with_error_mode(mut self, mode: ErrorMode) -> Self {
        self.error_mode = mode;
        self
    }

    /// Fail on the first page that cannot be decoded.
    pub fn strict(mut self) -> Self {
        self.error_mode = ErrorMode::Strict;
        self
    }

    /// Record undecodable pages and continue.
    pub fn lenient(mut self) -> Self {
        self.error_mode = ErrorMode::Lenient;
        self
    }

    /// Enable or disable parallel processing.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Disable parallel processing.
    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }

    /// Set page selection.
    pub fn with_pages(mut self, pages: PageSelection) -> Self {
        self.pages = pages;
        self
    }

    /// Set the column reading direction.
    pub fn with_direction(mut self, direction: ReadingDirection) -> Self {
        self.columns.direction = direction;
        self
    }

    /// Choose the column reading direction for a target language tag.
    pub fn for_target_language(self, lang: &str) -> Self {
        self.with_direction(ReadingDirection::for_language(lang))
    }

    pub fn with_segment_options(mut self, segment: SegmentOptions) -> Self {
        self.segment = segment;
        self
    }

    pub fn with_column_options(mut self, columns: ColumnOptions) -> Self {
        self.columns = columns;
        self
    }

    pub fn with_table_config(mut self, tables: TableDetectorConfig) -> Self {
        self.tables = tables;
        self
    }

    /// Treat all text as ordinary blocks.
    pub fn without_tables(mut self) -> Self {
        self.detect_tables = false;
        self
    }

    pub fn with_min_image_size(mut self, size: f32) -> Self {
        self.min_image_size = size;
        self
    }

    pub fn with_header_footer_band(mut self, band: f32) -> Self {
        self.header_footer_band = band.clamp(0.0, 0.5);
        self
    }

    pub fn with_default_font(mut self, font: FontDescriptor) -> Self {
        self.default_font = font;
        self
    }
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            error_mode: ErrorMode::Lenient,
            parallel: true,
            pages: PageSelection::All,
            segment: SegmentOptions::default(),
            columns: ColumnOptions::default(),
            tables: TableDetectorConfig::default(),
            detect_tables: true,
            min_image_size: 24.0,
            header_footer_band: 0.05,
            default_font: FontDescriptor::new("Helvetica", 10.0),
        }
    }
}

/// Error handling mode during extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorMode {
    /// Fail on the first page decode error
    Strict,
    /// Keep an empty page flagged with the error and continue
    #[default]
    Lenient,
}

/// Order in which columns are read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReadingDirection {
    #[default]
    LeftToRight,
    RightToLeft,
}

impl ReadingDirection {
    /// Direction for a BCP 47 language tag ("ar", "he-IL", ...).
    pub fn for_language(lang: &str) -> Self {
        let primary = lang
            .split(['-', '_'])
            .next()
            .unwrap_or("")
            .to_ascii_lowercase();
        match primary.as_str() {
            "ar" | "he" | "iw" | "fa" | "ur" | "yi" | "ps" | "sd" | "ug" | "dv" | "ckb" => {
                ReadingDirection::RightToLeft
            }
            _ => ReadingDirection::LeftToRight,
        }
    }
}

/// Thresholds for building lines and blocks.
#[derive(Debug, Clone)]
pub struct SegmentOptions {
    /// Maximum baseline difference for glyphs on one line (fraction of font size)
    pub baseline_tolerance: f32,

    /// Gap that inserts a word space when merging glyphs (fraction of the
    /// average character width)
    pub space_gap: f32,

    /// Horizontal gap that splits a baseline into separate lines (em)
    pub line_break_gap: f32,

    /// Vertical gap between lines that separates blocks (fraction of line height)
    pub block_gap_ratio: f32,

    /// Half-width of the band around `block_gap_ratio` where the decision is
    /// ambiguous; ambiguous gaps merge
    pub gap_tolerance: f32,

    /// Vertical overlap between consecutive lines that is trimmed instead of
    /// starting a new block (fraction of line height)
    pub overlap_tolerance: f32,

    /// Size ratio between consecutive lines that counts as a font jump
    pub font_jump_ratio: f32,

    /// Minimum gap (fraction of line height) at which a font jump splits
    pub jump_gap_ratio: f32,

    /// Minimum horizontal overlap of a line with its block (fraction of the
    /// narrower width)
    pub min_line_overlap: f32,

    /// Start a new block at every line that begins with a list marker
    pub split_list_items: bool,

    /// Semantic tagging thresholds
    pub tags: TagThresholds,
}

impl Default for SegmentOptions {
    fn default() -> Self {
        Self {
            baseline_tolerance: 0.3,
            space_gap: 0.2,
            line_break_gap: 1.0,
            block_gap_ratio: 0.6,
            gap_tolerance: 0.1,
            overlap_tolerance: 0.3,
            font_jump_ratio: 1.2,
            jump_gap_ratio: 0.0,
            min_line_overlap: 0.5,
            split_list_items: true,
            tags: TagThresholds::default(),
        }
    }
}

/// Thresholds for classifying blocks.
#[derive(Debug, Clone)]
pub struct TagThresholds {
    /// Minimum size relative to the median body size for a heading
    pub heading_size_ratio: f32,

    /// Minimum size percentile (0-1) for a heading
    pub heading_percentile: f32,

    /// Maximum lines of a size-based heading
    pub heading_max_lines: usize,

    /// Maximum lines of a bold, body-size heading
    pub bold_heading_max_lines: usize,

    /// Maximum characters of a bold, body-size heading
    pub bold_heading_max_chars: usize,

    /// Maximum size relative to the body size for an unlabeled caption
    pub caption_size_ratio: f32,

    /// Maximum lines of a caption
    pub caption_max_lines: usize,

    /// Deepest heading level emitted
    pub max_heading_level: u8,
}

impl Default for TagThresholds {
    fn default() -> Self {
        Self {
            heading_size_ratio: 1.15,
            heading_percentile: 0.85,
            heading_max_lines: 4,
            bold_heading_max_lines: 2,
            bold_heading_max_chars: 120,
            caption_size_ratio: 0.9,
            caption_max_lines: 3,
            max_heading_level: 6,
        }
    }
}

/// Thresholds for column detection.
#[derive(Debug, Clone)]
pub struct ColumnOptions {
    /// Minimum width of a gutter between columns (points)
    pub gutter_min_width: f32,

    /// Fraction of the blocks in a band that must not cross a gutter
    pub column_consistency: f32,

    /// Blocks wider than this fraction of the text width are full-width and
    /// interrupt the column flow
    pub full_width_ratio: f32,

    /// Minimum width of a column (points)
    pub min_column_width: f32,

    /// Column order
    pub direction: ReadingDirection,
}

impl Default for ColumnOptions {
    fn default() -> Self {
        Self {
            gutter_min_width: 12.0,
            column_consistency: 0.6,
            full_width_ratio: 0.55,
            min_column_width: 40.0,
            direction: ReadingDirection::LeftToRight,
        }
    }
}

/// Page selection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum PageSelection {
    /// All pages
    #[default]
    All,
    /// A range of pages (inclusive, 1-indexed)
    Range(RangeInclusive<u32>),
    /// Specific pages (1-indexed)
    Pages(Vec<u32>),
}

impl PageSelection {
    /// Check if a page number (1-indexed) should be included.
    pub fn includes(&self, page: u32) -> bool {
        match self {
            PageSelection::All => true,
            PageSelection::Range(range) => range.contains(&page),
            PageSelection::Pages(pages) => pages.contains(&page),
        }
    }

    /// Parse a page selection string (e.g., "1-10", "1,3,5,7-10").
    pub fn parse(s: &str) -> Result<Self, String> {
        let s = s.trim();

        if s.is_empty() || s == "all" {
            return Ok(PageSelection::All);
        }

        if let Some((start, end)) = s.split_once('-') {
            if !start.contains(',') && !end.contains(',') {
                let start: u32 = start.trim().parse().map_err(|_| "Invalid start page")?;
                let end: u32 = end.trim().parse().map_err(|_| "Invalid end page")?;
                return Ok(PageSelection::Range(start..=end));
            }
        }

        let mut pages = Vec::new();
        for part in s.split(',') {
            let part = part.trim();
            if let Some((start, end)) = part.split_once('-') {
                let start: u32 = start.trim().parse().map_err(|_| "Invalid page number")?;
                let end: u32 = end.trim().parse().map_err(|_| "Invalid page number")?;
                pages.extend(start..=end);
            } else {
                pages.push(part.parse().map_err(|_| "Invalid page number")?);
            }
        }

        pages.sort_unstable();
        pages.dedup();
        Ok(PageSelection::Pages(pages))
    }
}
