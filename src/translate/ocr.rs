//! Text recognition for image regions without glyphs.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::{Id, JoinSet};
use unicode_normalization::UnicodeNormalization;

use super::options::OcrOptions;
use super::retry::with_retry;
use super::{OcrEngine, OcrRequest, OcrResult};
use crate::error::CollaboratorError;
use crate::extract::{FontStatistics, Glyph, PageIds, Segmenter};
use crate::model::{DiagnosticKind, Diagnostics, Document, RegionContent, Scope};

/// Fills glyph-free image regions with recognized text blocks.
///
/// Each eligible region gets exactly one recognition request. Recognized
/// text is segmented into blocks that stay inside the image region, so it
/// never joins the text of neighbouring regions.
pub struct OcrFiller {
    engine: Arc<dyn OcrEngine>,
    options: OcrOptions,
}

impl OcrFiller {
    pub fn new(engine: Arc<dyn OcrEngine>, options: OcrOptions) -> Self {
        Self { engine, options }
    }

    pub async fn fill_document(&self, mut doc: Document) -> (Document, Diagnostics) {
        let requests: Vec<OcrRequest> = doc
            .pages
            .iter()
            .filter(|p| !p.is_failed())
            .flat_map(|page| {
                page.regions
                    .iter()
                    .filter(|r| r.needs_ocr())
                    .map(move |r| OcrRequest {
                        page: page.index,
                        region: r.id,
                        bbox: r.bbox,
                    })
            })
            .collect();

        let mut diagnostics = Diagnostics::new();
        if requests.is_empty() {
            return (doc, diagnostics);
        }
        log::info!("Recognizing text in {} image regions with {}", requests.len(), self.engine.name());

        let semaphore = Arc::new(Semaphore::new(self.options.max_in_flight.max(1)));
        let mut set = JoinSet::new();
        let mut spawned: HashMap<Id, OcrRequest> = HashMap::new();
        for request in requests {
            let Ok(permit) = semaphore.clone().acquire_owned().await else {
                break;
            };
            let engine = Arc::clone(&self.engine);
            let retry = self.options.retry.clone();
            let identity = request.clone();
            let handle = set.spawn(async move {
                let what = format!("OCR of page {} region {}", request.page, request.region.0);
                let result = with_retry(&retry, &what, || engine.recognize(&request)).await;
                drop(permit);
                (request, result)
            });
            spawned.insert(handle.id(), identity);
        }

        let mut outcomes: BTreeMap<(u32, u32), (OcrRequest, Result<Vec<OcrResult>, CollaboratorError>)> =
            BTreeMap::new();
        while let Some(joined) = set.join_next().await {
            let (request, result) = match joined {
                Ok(done) => done,
                Err(e) => {
                    let Some(request) = spawned.remove(&e.id()) else {
                        log::error!("OCR task failed: {}", e);
                        continue;
                    };
                    log::error!("OCR of page {} region {} failed: {}", request.page, request.region.0, e);
                    let failure = CollaboratorError::Permanent(format!("OCR task failed: {}", e));
                    (request, Err(failure))
                }
            };
            outcomes.insert((request.page, request.region.0), (request, result));
        }

        let stats = document_statistics(&doc);
        let segmenter = Segmenter::new(&self.options.segment, &stats);
        let Document { pages, fonts, .. } = &mut doc;

        for (request, result) in outcomes.into_values() {
            let results = match result {
                Ok(results) => results,
                Err(e) => {
                    diagnostics.report(
                        DiagnosticKind::OcrFailure,
                        Scope::Region {
                            page: request.page,
                            region: request.region,
                        },
                        e.to_string(),
                    );
                    continue;
                }
            };

            let glyphs: Vec<Glyph> = results
                .into_iter()
                .filter(|r| r.confidence >= self.options.min_confidence)
                .filter(|r| !r.text.trim().is_empty())
                .map(|r| {
                    let bbox = r.bbox.normalized().clip_to(&request.bbox);
                    let mut font = self.options.font.clone();
                    font.size = (bbox.height() / 1.2).max(1.0);
                    Glyph::new(r.text.nfc().collect::<String>(), bbox, font)
                })
                .filter(|g| !g.bbox.is_empty())
                .collect();

            let Some(page) = pages.iter_mut().find(|p| p.index == request.page) else {
                continue;
            };
            let mut ids = PageIds::after(page);
            let blocks = segmenter.segment(&glyphs, &mut ids, fonts);
            log::debug!(
                "Page {} region {}: {} glyphs recognized into {} blocks",
                request.page,
                request.region.0,
                glyphs.len(),
                blocks.len()
            );

            if let Some(region) = page.regions.iter_mut().find(|r| r.id == request.region) {
                if let RegionContent::Image { blocks: slot, .. } = &mut region.content {
                    *slot = blocks;
                }
            }
        }

        (doc, diagnostics)
    }
}

/// Font statistics of the text already in a document.
fn document_statistics(doc: &Document) -> FontStatistics {
    let mut stats = FontStatistics::new();
    for page in &doc.pages {
        for run in page.runs() {
            let size = doc.fonts.size_of(run.font, 0.0);
            if size > 0.0 {
                stats.add_size(size, run.text.chars().filter(|c| !c.is_whitespace()).count());
            }
        }
    }
    stats.analyze();
    stats
}
