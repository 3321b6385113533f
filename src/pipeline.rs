//! The end-to-end pipeline: extract, fill image text, translate, rebuild.
//!
//! Each stage takes the [`Document`] by value and hands it to the next.
//! Only a run where no page could be extracted fails as a whole; every
//! other problem ends up in the diagnostics next to the output.

use std::sync::Arc;

use log::info;

use crate::error::{Error, Result};
use crate::extract::{ExtractOptions, Extractor, PageSource};
use crate::model::{Diagnostics, Document};
use crate::reconstruct::{ReconstructOptions, Reconstructor, RenderedPage};
use crate::translate::{OcrEngine, OcrFiller, OcrOptions, TranslateOptions, TranslationEngine, Translator};

/// Everything a pipeline run produces.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    /// The document with translations applied
    pub document: Document,
    /// Draw operations per page, in page order
    pub pages: Vec<RenderedPage>,
    pub diagnostics: Diagnostics,
}

/// Configured sequence of stages.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use relayout::extract::MemorySource;
/// use relayout::translate::{PrefixTranslator, TranslateOptions};
/// use relayout::Pipeline;
///
/// # async fn run() -> relayout::Result<()> {
/// let source = MemorySource::from_file("primitives.json")?;
/// let pipeline = Pipeline::new()
///     .with_translator(Arc::new(PrefixTranslator::default()), TranslateOptions::default())?;
/// let output = pipeline.run(&source).await?;
/// println!("{} pages, {} diagnostics", output.pages.len(), output.diagnostics.len());
/// # Ok(())
/// # }
/// ```
pub struct Pipeline {
    extractor: Extractor,
    ocr: Option<OcrFiller>,
    translation: Option<TranslationEngine>,
    reconstructor: Reconstructor,
}

impl Pipeline {
    /// Pipeline without collaborators: extraction and reconstruction only.
    pub fn new() -> Self {
        Self {
            extractor: Extractor::default(),
            ocr: None,
            translation: None,
            reconstructor: Reconstructor::default(),
        }
    }

    pub fn with_extract_options(mut self, options: ExtractOptions) -> Self {
        self.extractor = Extractor::new(options);
        self
    }

    pub fn with_reconstruct_options(mut self, options: ReconstructOptions) -> Self {
        self.reconstructor = Reconstructor::new(options);
        self
    }

    /// Translate runs with `translator`. Fails on invalid protected patterns.
    pub fn with_translator(mut self, translator: Arc<dyn Translator>, options: TranslateOptions) -> Result<Self> {
        self.translation = Some(TranslationEngine::new(translator, options)?);
        Ok(self)
    }

    /// Recognize text in glyph-free image regions with `engine`.
    pub fn with_ocr(mut self, engine: Arc<dyn OcrEngine>, options: OcrOptions) -> Self {
        self.ocr = Some(OcrFiller::new(engine, options));
        self
    }

    /// Run every stage over a page source.
    pub async fn run<S: PageSource + ?Sized>(&self, source: &S) -> Result<PipelineOutput> {
        let extraction = self.extractor.extract(source)?;
        if extraction.document.successful_page_count() == 0 {
            return Err(Error::NoPagesExtracted);
        }
        Ok(self.process(extraction.document, extraction.diagnostics).await)
    }

    /// Run the stages after extraction over an already extracted document.
    pub async fn process(&self, document: Document, mut diagnostics: Diagnostics) -> PipelineOutput {
        let mut document = document;

        if let Some(ocr) = &self.ocr {
            let (filled, found) = ocr.fill_document(document).await;
            info!("OCR stage: {} diagnostics", found.len());
            document = filled;
            diagnostics.merge(found);
        }

        if let Some(translation) = &self.translation {
            let (translated, found) = translation.translate_document(document).await;
            info!("Translation stage: {} diagnostics", found.len());
            document = translated;
            diagnostics.merge(found);
        }

        let (pages, found) = self.reconstructor.reconstruct(&document);
        info!("Reconstructed {} pages, {} overflows", pages.len(), found.len());
        diagnostics.merge(found);
        diagnostics.sort_by_page();

        PipelineOutput {
            document,
            pages,
            diagnostics,
        }
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::{MemorySource, Primitive, RawPage};
    use crate::model::{BBox, DiagnosticKind, FontDescriptor};
    use crate::translate::PrefixTranslator;

    fn glyph(text: &str, x: f32, y: f32) -> Primitive {
        let width = text.chars().count() as f32 * 5.0;
        Primitive::glyph(text, BBox::new(x, y, x + width, y + 12.0), FontDescriptor::new("Helvetica", 10.0))
    }

    #[tokio::test]
    async fn test_run_without_collaborators() {
        let source = MemorySource::new(vec![RawPage::new(0, 612.0, 792.0).with(glyph("Hello world", 72.0, 100.0))]);
        let output = Pipeline::new().run(&source).await.unwrap();

        assert_eq!(output.pages.len(), 1);
        assert_eq!(output.pages[0].plain_text(), "Hello world");
        assert!(output.diagnostics.is_empty());
    }

    #[tokio::test]
    async fn test_run_translates() {
        let source = MemorySource::new(vec![RawPage::new(0, 612.0, 792.0).with(glyph("Hello world", 72.0, 100.0))]);
        let pipeline = Pipeline::new()
            .with_translator(Arc::new(PrefixTranslator::new("> ")), TranslateOptions::default())
            .unwrap();
        let output = pipeline.run(&source).await.unwrap();

        assert!(output.pages[0].plain_text().starts_with("> "));
        assert_eq!(output.document.metadata.target_lang.as_deref(), Some("es"));
    }

    #[tokio::test]
    async fn test_all_pages_failed_is_fatal() {
        let source = MemorySource::new(vec![RawPage::new(0, 612.0, 792.0)]).with_failure(0, "corrupt");
        assert!(matches!(Pipeline::new().run(&source).await, Err(Error::NoPagesExtracted)));
    }

    #[tokio::test]
    async fn test_partial_failure_still_produces_output() {
        let source = MemorySource::new(vec![
            RawPage::new(0, 612.0, 792.0).with(glyph("Intact page", 72.0, 100.0)),
            RawPage::new(1, 612.0, 792.0),
        ])
        .with_failure(1, "corrupt");
        let output = Pipeline::new().run(&source).await.unwrap();

        assert_eq!(output.pages.len(), 2);
        assert!(output.pages[1].ops.is_empty());
        assert_eq!(output.diagnostics.count(DiagnosticKind::DecodeError), 1);
    }
}
