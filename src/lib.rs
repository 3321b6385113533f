//! # relayout
//!
//! Layout-preserving document translation core.
//!
//! This library turns raw page primitives (positioned glyphs, images and
//! vector paths) into a structured, serializable document tree with a
//! reading order, lets external services translate it and recognize text
//! in scanned regions, and rebuilds each page around the translated text
//! while keeping columns, tables and block geometry in place.
//!
//! ## Quick Start
//!
//! ```no_run
//! use relayout::extract::{Extractor, ExtractOptions, MemorySource};
//! use relayout::reconstruct::Reconstructor;
//! use relayout::codec::{self, JsonFormat};
//!
//! fn main() -> relayout::Result<()> {
//!     // Primitives dumped by a page decoder
//!     let source = MemorySource::from_file("primitives.json")?;
//!
//!     // Build the document tree
//!     let extraction = Extractor::new(ExtractOptions::default()).extract(&source)?;
//!     codec::save(&extraction.document, "document.json", JsonFormat::Pretty)?;
//!
//!     // Rebuild the pages
//!     let (pages, diagnostics) = Reconstructor::default().reconstruct(&extraction.document);
//!     println!("{} pages, {} diagnostics", pages.len(), diagnostics.len());
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Block segmentation**: lines, paragraphs, headings, captions and list items
//! - **Reading order**: column detection with full-width interruptions
//! - **Table inference**: ruled grids and aligned text, with spans
//! - **Fitting ladder**: shrink, reflow, scale, grow or truncate, never drop text
//! - **Versioned interchange**: lossless JSON round trip with unknown fields kept
//! - **Parallel processing**: Rayon across pages and columns, bounded async collaborators

pub mod codec;
pub mod error;
pub mod extract;
pub mod model;
pub mod pipeline;
pub mod reconstruct;
pub mod translate;

// Re-export commonly used types
pub use codec::{decode, encode, JsonFormat, RunUpdate, SCHEMA_VERSION};
pub use error::{CollaboratorError, DecodeError, Error, Result};
pub use extract::{ExtractOptions, Extraction, Extractor, MemorySource, PageSelection, PageSource};
pub use model::{
    BBox, Block, Diagnostic, DiagnosticKind, Diagnostics, Document, Line, Metadata, Page, Region, RegionKind, Run,
    Scope, Table, TranslationState,
};
pub use pipeline::{Pipeline, PipelineOutput};
pub use reconstruct::{DrawOp, PageRenderer, ReconstructOptions, Reconstructor, RenderedPage, SvgRenderer};
pub use translate::{OcrEngine, PrefixTranslator, RetryPolicy, TranslateOptions, Translator};

use std::path::Path;

/// Extract a document from a primitive dump file.
///
/// # Example
///
/// ```no_run
/// use relayout::extract_file;
///
/// let extraction = extract_file("primitives.json").unwrap();
/// println!("Pages: {}", extraction.document.page_count());
/// ```
pub fn extract_file<P: AsRef<Path>>(path: P) -> Result<Extraction> {
    extract_file_with_options(path, ExtractOptions::default())
}

/// Extract a document from a primitive dump file with custom options.
pub fn extract_file_with_options<P: AsRef<Path>>(path: P, options: ExtractOptions) -> Result<Extraction> {
    let path = path.as_ref();
    let source = MemorySource::from_file(path)?.with_source_path(path.display().to_string());
    Extractor::new(options).extract(&source)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_extract_file_missing() {
        let result = extract_file("/nonexistent/primitives.json");
        assert!(matches!(result, Err(Error::Io(_))));
    }

    #[test]
    fn test_extract_file() {
        let source = MemorySource::new(vec![extract::RawPage::new(0, 612.0, 792.0).with(
            extract::Primitive::glyph(
                "Hello",
                BBox::new(72.0, 100.0, 97.0, 112.0),
                model::FontDescriptor::new("Helvetica", 10.0),
            ),
        )]);
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(serde_json::to_string(&source).unwrap().as_bytes())
            .unwrap();

        let extraction = extract_file(file.path()).unwrap();
        assert_eq!(extraction.document.page_count(), 1);
        assert!(extraction.document.metadata.source_path.is_some());
        assert_eq!(extraction.document.plain_text().trim(), "Hello");
    }
}
