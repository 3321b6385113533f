//! Document structural model.
//!
//! This module defines the tree (pages → regions → blocks/tables → runs)
//! shared by extraction, translation, OCR and reconstruction. Every entity
//! is serializable and keeps unknown fields in an opaque `extra` map so that
//! newer producers can round-trip through older consumers.

mod block;
mod diagnostics;
mod document;
mod font;
mod geometry;
mod page;
mod reading_order;
mod stats;
mod table;

pub use block::{is_spaceless_script_char, Block, BlockId, Line, Run, RunId, SemanticTag, TranslationState};
pub use diagnostics::{Diagnostic, DiagnosticKind, Diagnostics, Scope};
pub use document::{Document, Metadata};
pub use font::{FontDescriptor, FontId, FontKey, FontStyle, FontTable, FontWeight};
pub use geometry::{cmp_top_left, BBox};
pub use page::{Graphic, GraphicKind, ImageRef, Page, Region, RegionContent, RegionId, RegionKind};
pub use reading_order::{OrderRef, ReadingOrder};
pub use stats::DocumentStats;
pub use table::{Cell, Table};
