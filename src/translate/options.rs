//! Translation and OCR options.

use super::protect::DEFAULT_PATTERNS;
use super::retry::RetryPolicy;
use crate::extract::SegmentOptions;
use crate::model::FontDescriptor;

/// Options for translating a document.
#[derive(Debug, Clone)]
pub struct TranslateOptions {
    /// Language of the original text (BCP 47 tag)
    pub source_lang: String,

    /// Language to translate into (BCP 47 tag)
    pub target_lang: String,

    /// Maximum number of blocks translated concurrently
    pub max_in_flight: usize,

    /// Retry, backoff and timeout of each request
    pub retry: RetryPolicy,

    /// Regular expressions of tokens kept verbatim
    pub protected_patterns: Vec<String>,

    /// Translate text inside table cells
    pub translate_tables: bool,

    /// Translate text recognized inside images
    pub translate_image_text: bool,

    /// Translate runs that already carry a translation
    pub retranslate: bool,
}

impl TranslateOptions {
    pub fn new(source_lang: impl Into<String>, target_lang: impl Into<String>) -> Self {
        Self {
            source_lang: source_lang.into(),
            target_lang: target_lang.into(),
            ..Self::default()
        }
    }

    pub fn with_max_in_flight(mut self, max: usize) -> Self {
        self.max_in_flight = max.max(1);
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_protected_patterns(mut self, patterns: Vec<String>) -> Self {
        self.protected_patterns = patterns;
        self
    }

    pub fn without_tables(mut self) -> Self {
        self.translate_tables = false;
        self
    }

    pub fn without_image_text(mut self) -> Self {
        self.translate_image_text = false;
        self
    }

    pub fn retranslate(mut self) -> Self {
        self.retranslate = true;
        self
    }
}

impl Default for TranslateOptions {
    fn default() -> Self {
        Self {
            source_lang: "en".to_string(),
            target_lang: "es".to_string(),
            max_in_flight: 8,
            retry: RetryPolicy::default(),
            protected_patterns: DEFAULT_PATTERNS.iter().map(|p| p.to_string()).collect(),
            translate_tables: true,
            translate_image_text: true,
            retranslate: false,
        }
    }
}

/// Options for recognizing text in image regions.
#[derive(Debug, Clone)]
pub struct OcrOptions {
    /// Maximum number of regions recognized concurrently
    pub max_in_flight: usize,

    /// Results below this confidence (0-1) are dropped
    pub min_confidence: f32,

    /// Retry, backoff and timeout of each request
    pub retry: RetryPolicy,

    /// Font given to recognized text; the size follows the result box
    pub font: FontDescriptor,

    /// Segmentation of recognized lines into blocks
    pub segment: SegmentOptions,
}

impl OcrOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_min_confidence(mut self, confidence: f32) -> Self {
        self.min_confidence = confidence.clamp(0.0, 1.0);
        self
    }

    pub fn with_max_in_flight(mut self, max: usize) -> Self {
        self.max_in_flight = max.max(1);
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

impl Default for OcrOptions {
    fn default() -> Self {
        Self {
            max_in_flight: 4,
            min_confidence: 0.5,
            retry: RetryPolicy::default(),
            font: FontDescriptor::new("Helvetica", 10.0),
            segment: SegmentOptions::default(),
        }
    }
}
