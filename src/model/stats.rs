//! Document statistics.

use super::{Document, Page, RegionContent, SemanticTag};
use serde::{Deserialize, Serialize};

/// Counts collected over a document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentStats {
    /// Total number of pages
    pub page_count: u32,

    /// Pages that failed to decode
    pub failed_page_count: u32,

    pub region_count: u32,

    /// Text blocks, including those inside table cells and images
    pub block_count: u32,

    pub heading_count: u32,

    pub list_item_count: u32,

    pub table_count: u32,

    pub image_count: u32,

    pub run_count: u32,

    pub translated_run_count: u32,

    pub failed_run_count: u32,

    /// Character count of original text (excluding whitespace)
    pub char_count: u32,
}

impl DocumentStats {
    /// Create new empty statistics.
    pub fn new() -> Self {
        Self::default()
    }

    /// Collect statistics for a whole document.
    pub fn from_document(doc: &Document) -> Self {
        let mut stats = Self::new();
        for page in &doc.pages {
            stats.add_page(page);
        }
        stats
    }

    /// Add the counts of one page.
    pub fn add_page(&mut self, page: &Page) {
        self.page_count += 1;
        if page.is_failed() {
            self.failed_page_count += 1;
        }

        for region in &page.regions {
            self.region_count += 1;
            match &region.content {
                RegionContent::Table { .. } => self.table_count += 1,
                RegionContent::Image { .. } => self.image_count += 1,
                RegionContent::Blocks { .. } => {}
            }
        }

        for block in page.blocks() {
            self.block_count += 1;
            match block.tag {
                SemanticTag::Heading { .. } => self.heading_count += 1,
                SemanticTag::ListItem => self.list_item_count += 1,
                _ => {}
            }
            for run in block.runs() {
                self.run_count += 1;
                if run.is_translated() {
                    self.translated_run_count += 1;
                } else if run.is_failed() {
                    self.failed_run_count += 1;
                }
                self.char_count += run.text.chars().filter(|c| !c.is_whitespace()).count() as u32;
            }
        }
    }

    /// Merge statistics from another instance.
    pub fn merge(&mut self, other: &DocumentStats) {
        self.page_count += other.page_count;
        self.failed_page_count += other.failed_page_count;
        self.region_count += other.region_count;
        self.block_count += other.block_count;
        self.heading_count += other.heading_count;
        self.list_item_count += other.list_item_count;
        self.table_count += other.table_count;
        self.image_count += other.image_count;
        self.run_count += other.run_count;
        self.translated_run_count += other.translated_run_count;
        self.failed_run_count += other.failed_run_count;
        self.char_count += other.char_count;
    }

    /// Fraction of runs carrying a translation.
    pub fn translated_ratio(&self) -> f32 {
        if self.run_count == 0 {
            0.0
        } else {
            self.translated_run_count as f32 / self.run_count as f32
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_merge() {
        let mut a = DocumentStats {
            page_count: 1,
            run_count: 4,
            translated_run_count: 2,
            ..Default::default()
        };
        let b = DocumentStats {
            page_count: 2,
            failed_page_count: 1,
            run_count: 4,
            translated_run_count: 4,
            ..Default::default()
        };
        a.merge(&b);

        assert_eq!(a.page_count, 3);
        assert_eq!(a.failed_page_count, 1);
        assert_eq!(a.run_count, 8);
        assert!((a.translated_ratio() - 0.75).abs() < f32::EPSILON);
    }

    #[test]
    fn test_stats_empty_document() {
        let stats = DocumentStats::from_document(&Document::new());
        assert_eq!(stats, DocumentStats::default());
        assert_eq!(stats.translated_ratio(), 0.0);
    }
}
