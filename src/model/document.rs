//! Document-level types.

use super::{FontTable, Page};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// The root of the structural model.
///
/// A document exclusively owns its tree. Stages of the pipeline hand it to
/// each other by value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub metadata: Metadata,

    /// Deduplicated font descriptors referenced by id from runs and blocks
    #[serde(default)]
    pub fonts: FontTable,

    /// Pages ordered by index
    pub pages: Vec<Page>,

    #[serde(flatten, default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, Value>,

    /// Unknown fields of the envelope this document was decoded from
    #[serde(skip)]
    pub envelope_extra: BTreeMap<String, Value>,
}

impl Document {
    /// Create a new empty document.
    pub fn new() -> Self {
        Self {
            metadata: Metadata::default(),
            fonts: FontTable::new(),
            pages: Vec::new(),
            extra: BTreeMap::new(),
            envelope_extra: BTreeMap::new(),
        }
    }

    /// Get the number of pages in the document.
    pub fn page_count(&self) -> u32 {
        self.pages.len() as u32
    }

    /// Get a page by index (0-based).
    pub fn page(&self, index: u32) -> Option<&Page> {
        self.pages.iter().find(|p| p.index == index)
    }

    pub fn page_mut(&mut self, index: u32) -> Option<&mut Page> {
        self.pages.iter_mut().find(|p| p.index == index)
    }

    /// Add a page to the document.
    pub fn add_page(&mut self, page: Page) {
        self.pages.push(page);
    }

    /// Check if the document has any pages.
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Number of pages that extracted without a decode error.
    pub fn successful_page_count(&self) -> u32 {
        self.pages.iter().filter(|p| !p.is_failed()).count() as u32
    }

    /// Get plain text content of the entire document.
    pub fn plain_text(&self) -> String {
        self.pages
            .iter()
            .map(|page| page.plain_text())
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

/// Document metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    /// Path of the source document
    #[serde(default)]
    pub source_path: Option<String>,

    /// Language of the original text (BCP 47 tag)
    #[serde(default)]
    pub source_lang: Option<String>,

    /// Language to translate into (BCP 47 tag)
    #[serde(default)]
    pub target_lang: Option<String>,

    /// Document title
    #[serde(default)]
    pub title: Option<String>,

    /// When the structure was extracted
    #[serde(default)]
    pub extracted_at: Option<DateTime<Utc>>,

    #[serde(flatten, default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, Value>,
}

impl Metadata {
    /// Create metadata for a source path.
    pub fn for_source(path: impl Into<String>) -> Self {
        Self {
            source_path: Some(path.into()),
            ..Default::default()
        }
    }

    /// Set source and target languages.
    pub fn with_languages(mut self, source: impl Into<String>, target: impl Into<String>) -> Self {
        self.source_lang = Some(source.into());
        self.target_lang = Some(target.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_new() {
        let doc = Document::new();
        assert!(doc.is_empty());
        assert_eq!(doc.page_count(), 0);
        assert_eq!(doc.successful_page_count(), 0);
    }

    #[test]
    fn test_page_lookup_by_index() {
        let mut doc = Document::new();
        doc.add_page(Page::letter(0));
        doc.add_page(Page::failed(1, 612.0, 792.0, "broken"));

        assert_eq!(doc.page(1).map(|p| p.is_failed()), Some(true));
        assert!(doc.page(2).is_none());
        assert_eq!(doc.successful_page_count(), 1);
    }

    #[test]
    fn test_metadata_languages() {
        let metadata = Metadata::for_source("manual.pdf").with_languages("en", "de");
        assert_eq!(metadata.source_path.as_deref(), Some("manual.pdf"));
        assert_eq!(metadata.source_lang.as_deref(), Some("en"));
        assert_eq!(metadata.target_lang.as_deref(), Some("de"));
    }
}
