//! Extraction of the document structure from page primitives.
//!
//! The stages run per page: primitive normalization, table detection,
//! line and block segmentation, column resolution and region assembly.

mod columns;
mod extractor;
mod options;
mod primitive;
mod segment;
mod table_detector;

pub use columns::{ColumnLayout, ColumnResolver, Placement};
pub use extractor::{Extraction, Extractor};
pub use options::{
    ColumnOptions, ErrorMode, ExtractOptions, PageSelection, ReadingDirection, SegmentOptions,
    TagThresholds,
};
pub use primitive::{
    flatten_document, normalize_page, Glyph, MemorySource, NormalizedPage, PageSource, Primitive,
    PrimitiveKind, RawPage,
};
pub use segment::{
    classify, decide_gap, is_bullet_marker, is_number_marker, starts_with_list_marker,
    BlockFeatures, FontStatistics, GapDecision, PageIds, Segmenter, TextLine, TextRun,
};
pub use table_detector::{assign_glyphs, DetectedTable, TableDetector, TableDetectorConfig};
