//! Block-level translation of a document.
//!
//! Every block is one job: its runs are translated in order with the texts
//! of all runs of the block as context. Jobs run concurrently up to the
//! in-flight cap; a failed run keeps its original text and is flagged.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::{Id, JoinSet};

use super::options::TranslateOptions;
use super::protect::Protector;
use super::retry::with_retry;
use super::{TranslationRequest, Translator};
use crate::error::Result;
use crate::model::{
    BlockId, DiagnosticKind, Diagnostics, Document, RegionContent, RunId, Scope, TranslationState,
};

struct BlockJob {
    page: u32,
    block: BlockId,
    context: Vec<String>,
    runs: Vec<(RunId, String)>,
}

struct BlockOutcome {
    page: u32,
    block: BlockId,
    runs: Vec<(RunId, TranslationState)>,
}

/// Translates documents through a [`Translator`].
pub struct TranslationEngine {
    translator: Arc<dyn Translator>,
    options: TranslateOptions,
    protector: Protector,
}

impl TranslationEngine {
    pub fn new(translator: Arc<dyn Translator>, options: TranslateOptions) -> Result<Self> {
        let protector = Protector::new(&options.protected_patterns)?;
        Ok(Self {
            translator,
            options,
            protector,
        })
    }

    pub fn options(&self) -> &TranslateOptions {
        &self.options
    }

    /// Translate every eligible run. Only `Run::translation` is written.
    pub async fn translate_document(&self, mut doc: Document) -> (Document, Diagnostics) {
        let jobs = self.collect_jobs(&doc);
        let total = jobs.len();
        log::info!(
            "Translating {} blocks {} -> {} with {} ({} in flight)",
            total,
            self.options.source_lang,
            self.options.target_lang,
            self.translator.name(),
            self.options.max_in_flight
        );

        let semaphore = Arc::new(Semaphore::new(self.options.max_in_flight.max(1)));
        let mut set = JoinSet::new();
        let mut spawned: HashMap<Id, (u32, BlockId, Vec<RunId>)> = HashMap::new();

        for job in jobs {
            // Acquired before spawning so pending jobs stay unspawned.
            let Ok(permit) = semaphore.clone().acquire_owned().await else {
                break;
            };
            let translator = Arc::clone(&self.translator);
            let protector = self.protector.clone();
            let options = self.options.clone();
            let identity = (job.page, job.block, job.runs.iter().map(|(id, _)| *id).collect());
            let handle = set.spawn(async move {
                let outcome = translate_block(job, translator.as_ref(), &protector, &options).await;
                drop(permit);
                outcome
            });
            spawned.insert(handle.id(), identity);
        }

        let mut outcomes = BTreeMap::new();
        while let Some(joined) = set.join_next().await {
            let outcome = match joined {
                Ok(outcome) => outcome,
                Err(e) => {
                    let Some((page, block, runs)) = spawned.remove(&e.id()) else {
                        log::error!("Translation task failed: {}", e);
                        continue;
                    };
                    log::error!("Translation of page {} block {} failed: {}", page, block.0, e);
                    let reason = format!("translation task failed: {}", e);
                    BlockOutcome {
                        page,
                        block,
                        runs: runs
                            .into_iter()
                            .map(|run| (run, TranslationState::Failed { reason: reason.clone() }))
                            .collect(),
                    }
                }
            };
            outcomes.insert((outcome.page, outcome.block), outcome);
        }

        let mut diagnostics = Diagnostics::new();
        for outcome in outcomes.into_values() {
            let Some(page) = doc.page_mut(outcome.page) else {
                continue;
            };
            for (run_id, state) in outcome.runs {
                if let TranslationState::Failed { reason } = &state {
                    diagnostics.report(
                        DiagnosticKind::TranslationFailure,
                        Scope::Run {
                            page: outcome.page,
                            run: run_id,
                        },
                        reason.clone(),
                    );
                }
                if let Some(run) = page.run_mut(run_id) {
                    run.translation = state;
                }
            }
        }

        doc.metadata.source_lang = Some(self.options.source_lang.clone());
        doc.metadata.target_lang = Some(self.options.target_lang.clone());

        if !diagnostics.is_empty() {
            log::warn!("{} runs failed to translate", diagnostics.len());
        }
        (doc, diagnostics)
    }

    fn collect_jobs(&self, doc: &Document) -> Vec<BlockJob> {
        let mut jobs = Vec::new();
        for page in doc.pages.iter().filter(|p| !p.is_failed()) {
            for region in &page.regions {
                let eligible = match &region.content {
                    RegionContent::Blocks { .. } => true,
                    RegionContent::Table { .. } => self.options.translate_tables,
                    RegionContent::Image { .. } => self.options.translate_image_text,
                };
                if !eligible {
                    continue;
                }

                for block in region.blocks() {
                    let context: Vec<String> = block.runs().map(|r| r.text.clone()).collect();
                    let runs: Vec<(RunId, String)> = block
                        .runs()
                        .filter(|r| self.options.retranslate || !r.is_translated())
                        .filter(|r| !r.text.trim().is_empty())
                        .map(|r| (r.id, r.text.clone()))
                        .collect();
                    if !runs.is_empty() {
                        jobs.push(BlockJob {
                            page: page.index,
                            block: block.id,
                            context,
                            runs,
                        });
                    }
                }
            }
        }
        jobs
    }
}

async fn translate_block(
    job: BlockJob,
    translator: &dyn Translator,
    protector: &Protector,
    options: &TranslateOptions,
) -> BlockOutcome {
    let mut runs = Vec::with_capacity(job.runs.len());

    for (run_id, text) in job.runs {
        let protected = protector.protect(&text);
        if protected.is_trivial() {
            runs.push((run_id, TranslationState::Translated { text }));
            continue;
        }

        let request = TranslationRequest {
            text: protected.text.clone(),
            source_lang: options.source_lang.clone(),
            target_lang: options.target_lang.clone(),
            context: job.context.clone(),
        };
        let what = format!("Translation of page {} run {}", job.page, run_id.0);
        let state = match with_retry(&options.retry, &what, || translator.translate(&request)).await {
            Ok(translated) => TranslationState::Translated {
                text: protected.restore(&translated),
            },
            Err(e) => TranslationState::Failed {
                reason: e.to_string(),
            },
        };
        runs.push((run_id, state));
    }

    BlockOutcome {
        page: job.page,
        block: job.block,
        runs,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CollaboratorError;
    use crate::model::{BBox, Block, FontId, Line, Page, Region, RegionId, RegionKind, Run, SemanticTag};
    use crate::translate::{PrefixTranslator, RetryPolicy};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    fn block(id: u32, first_run: u32, texts: &[&str]) -> Block {
        let runs = texts
            .iter()
            .enumerate()
            .map(|(i, t)| {
                Run::new(
                    RunId(first_run + i as u32),
                    *t,
                    FontId(0),
                    BBox::new(0.0, 0.0, 50.0, 12.0),
                )
            })
            .collect();
        let line = Line::new(10.0, BBox::new(0.0, 0.0, 100.0, 12.0), runs);
        Block::new(BlockId(id), BBox::new(0.0, 0.0, 100.0, 12.0), FontId(0), SemanticTag::Body, vec![line])
    }

    fn document(blocks: Vec<Block>) -> Document {
        let mut page = Page::letter(0);
        page.regions.push(Region::new(
            RegionId(0),
            RegionKind::SingleColumn,
            BBox::new(0.0, 0.0, 100.0, 100.0),
            RegionContent::Blocks { blocks },
        ));
        let mut doc = Document::new();
        doc.add_page(page);
        doc
    }

    fn fast_options() -> TranslateOptions {
        TranslateOptions::new("en", "fr").with_retry(
            RetryPolicy::new().with_backoff(Duration::from_millis(1), Duration::from_millis(2)),
        )
    }

    /// Records requests; fails permanently on texts containing "fail".
    #[derive(Default)]
    struct Recorder {
        requests: Mutex<Vec<TranslationRequest>>,
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    #[async_trait]
    impl Translator for Recorder {
        async fn translate(&self, request: &TranslationRequest) -> std::result::Result<String, CollaboratorError> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(2)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            if let Ok(mut requests) = self.requests.lock() {
                requests.push(request.clone());
            }
            if request.text.contains("fail") {
                return Err(CollaboratorError::Permanent("rejected".into()));
            }
            Ok(request.text.to_uppercase())
        }
    }

    #[tokio::test]
    async fn test_runs_translated_with_block_context() {
        let doc = document(vec![
            block(0, 0, &["first part", "second part"]),
            block(1, 2, &["other block"]),
        ]);
        let recorder = Arc::new(Recorder::default());
        let engine = TranslationEngine::new(recorder.clone(), fast_options()).unwrap();

        let (doc, diagnostics) = engine.translate_document(doc).await;
        assert!(diagnostics.is_empty());

        let page = &doc.pages[0];
        let texts: Vec<&str> = page.runs().map(|r| r.display_text()).collect();
        assert_eq!(texts, vec!["FIRST PART", "SECOND PART", "OTHER BLOCK"]);

        let requests = recorder.requests.lock().unwrap();
        for request in requests.iter() {
            if request.text == "other block" {
                assert_eq!(request.context, vec!["other block".to_string()]);
            } else {
                assert_eq!(request.context, vec!["first part".to_string(), "second part".to_string()]);
            }
        }
        assert_eq!(doc.metadata.target_lang.as_deref(), Some("fr"));
    }

    #[tokio::test]
    async fn test_failure_is_scoped_to_the_run() {
        let doc = document(vec![block(0, 0, &["this will fail", "this works"])]);
        let engine = TranslationEngine::new(Arc::new(Recorder::default()), fast_options()).unwrap();

        let (doc, diagnostics) = engine.translate_document(doc).await;
        let runs: Vec<&Run> = doc.pages[0].runs().collect();
        assert!(runs[0].is_failed());
        assert_eq!(runs[0].display_text(), "this will fail");
        assert_eq!(runs[1].display_text(), "THIS WORKS");
        assert_eq!(diagnostics.count(DiagnosticKind::TranslationFailure), 1);
        assert_eq!(
            diagnostics.iter().next().map(|d| d.scope),
            Some(Scope::Run { page: 0, run: RunId(0) })
        );
    }

    #[tokio::test]
    async fn test_in_flight_cap() {
        let blocks = (0..12).map(|i| block(i, i, &["text"])).collect();
        let recorder = Arc::new(Recorder::default());
        let engine =
            TranslationEngine::new(recorder.clone(), fast_options().with_max_in_flight(3)).unwrap();

        let (doc, _) = engine.translate_document(document(blocks)).await;
        assert!(doc.pages[0].runs().all(|r| r.is_translated()));
        assert!(recorder.peak.load(Ordering::SeqCst) <= 3);
    }

    #[tokio::test]
    async fn test_protected_tokens_and_blank_runs() {
        let doc = document(vec![block(0, 0, &["Weight 12kg", "2024", "  "])]);
        let recorder = Arc::new(Recorder::default());
        let engine = TranslationEngine::new(recorder.clone(), fast_options()).unwrap();

        let (doc, _) = engine.translate_document(doc).await;
        let runs: Vec<&Run> = doc.pages[0].runs().collect();
        assert_eq!(runs[0].display_text(), "WEIGHT 12kg");
        assert_eq!(runs[1].translated_text(), Some("2024"));
        assert_eq!(runs[2].translation, TranslationState::Pending);

        let requests = recorder.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].text, "Weight __PROT_0__");
    }

    #[tokio::test]
    async fn test_translated_runs_are_skipped() {
        let mut doc = document(vec![block(0, 0, &["done", "todo"])]);
        if let Some(run) = doc.pages[0].run_mut(RunId(0)) {
            run.translation = TranslationState::Translated { text: "fait".into() };
        }
        let engine = TranslationEngine::new(Arc::new(PrefixTranslator::new("> ")), fast_options()).unwrap();

        let (doc, _) = engine.translate_document(doc).await;
        let texts: Vec<&str> = doc.pages[0].runs().map(|r| r.display_text()).collect();
        assert_eq!(texts, vec!["fait", "> todo"]);
    }

    /// Panics on texts containing "boom".
    struct Panicking;

    #[async_trait]
    impl Translator for Panicking {
        async fn translate(&self, request: &TranslationRequest) -> std::result::Result<String, CollaboratorError> {
            if request.text.contains("boom") {
                panic!("translator crashed");
            }
            Ok(request.text.to_uppercase())
        }
    }

    #[tokio::test]
    async fn test_crashed_task_marks_its_runs_failed() {
        let doc = document(vec![block(0, 0, &["boom here", "after"]), block(1, 2, &["fine"])]);
        let engine = TranslationEngine::new(Arc::new(Panicking), fast_options()).unwrap();

        let (doc, diagnostics) = engine.translate_document(doc).await;
        let runs: Vec<&Run> = doc.pages[0].runs().collect();
        assert!(runs[0].is_failed());
        assert!(runs[1].is_failed());
        assert_eq!(runs[0].display_text(), "boom here");
        assert_eq!(runs[2].display_text(), "FINE");

        assert_eq!(diagnostics.count(DiagnosticKind::TranslationFailure), 2);
        let scopes: Vec<Scope> = diagnostics.iter().map(|d| d.scope).collect();
        assert!(scopes.contains(&Scope::Run { page: 0, run: RunId(0) }));
        assert!(scopes.contains(&Scope::Run { page: 0, run: RunId(1) }));
    }
}
