//! External translation and OCR collaborators.
//!
//! Both are long-latency request/response services. Calls go through a
//! per-request timeout and retry with exponential backoff, and the number
//! of requests in flight is capped.

mod engine;
mod ocr;
mod options;
mod protect;
mod retry;

pub use engine::TranslationEngine;
pub use ocr::OcrFiller;
pub use options::{OcrOptions, TranslateOptions};
pub use protect::{Protected, Protector, DEFAULT_PATTERNS};
pub use retry::{with_retry, RetryPolicy};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::CollaboratorError;
use crate::model::{BBox, RegionId};

/// One translation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslationRequest {
    /// Text to translate, with protected tokens replaced by placeholders
    pub text: String,
    pub source_lang: String,
    pub target_lang: String,
    /// Texts of every run of the enclosing block, in order
    #[serde(default)]
    pub context: Vec<String>,
}

/// Machine translation service.
#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate(&self, request: &TranslationRequest) -> Result<String, CollaboratorError>;

    /// Name used in logs.
    fn name(&self) -> &str {
        "translator"
    }
}

/// An image region handed to OCR.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OcrRequest {
    pub page: u32,
    pub region: RegionId,
    /// Region box in page coordinates
    pub bbox: BBox,
}

/// A piece of recognized text, in page coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OcrResult {
    pub text: String,
    pub bbox: BBox,
    pub confidence: f32,
}

impl OcrResult {
    pub fn new(text: impl Into<String>, bbox: BBox, confidence: f32) -> Self {
        Self {
            text: text.into(),
            bbox,
            confidence,
        }
    }
}

/// Optical character recognition service.
#[async_trait]
pub trait OcrEngine: Send + Sync {
    async fn recognize(&self, request: &OcrRequest) -> Result<Vec<OcrResult>, CollaboratorError>;

    fn name(&self) -> &str {
        "ocr"
    }
}

/// Offline translator that prefixes the text. Useful for dry runs that
/// exercise layout without a translation service.
#[derive(Debug, Clone)]
pub struct PrefixTranslator {
    prefix: String,
}

impl PrefixTranslator {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl Default for PrefixTranslator {
    fn default() -> Self {
        Self::new("[TR] ")
    }
}

#[async_trait]
impl Translator for PrefixTranslator {
    async fn translate(&self, request: &TranslationRequest) -> Result<String, CollaboratorError> {
        if request.text.trim().is_empty() {
            return Ok(request.text.clone());
        }
        Ok(format!("{}{}", self.prefix, request.text))
    }

    fn name(&self) -> &str {
        "prefix"
    }
}
