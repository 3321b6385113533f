//! Per-document report of recoverable problems.

use super::{BlockId, RegionId, RunId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Cause of a degraded result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// A source page could not be decoded
    DecodeError,
    /// A run kept its original text
    TranslationFailure,
    /// Text recognition failed for an image region
    OcrFailure,
    /// Translated text did not fit and was truncated or grown
    LayoutOverflow,
}

/// Where a diagnostic applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "scope", rename_all = "snake_case")]
pub enum Scope {
    Document,
    Page { page: u32 },
    Region { page: u32, region: RegionId },
    Block { page: u32, block: BlockId },
    Run { page: u32, run: RunId },
}

impl Scope {
    pub fn page(&self) -> Option<u32> {
        match self {
            Scope::Document => None,
            Scope::Page { page }
            | Scope::Region { page, .. }
            | Scope::Block { page, .. }
            | Scope::Run { page, .. } => Some(*page),
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Document => write!(f, "document"),
            Scope::Page { page } => write!(f, "page {}", page),
            Scope::Region { page, region } => write!(f, "page {} region {}", page, region.0),
            Scope::Block { page, block } => write!(f, "page {} block {}", page, block.0),
            Scope::Run { page, run } => write!(f, "page {} run {}", page, run.0),
        }
    }
}

/// A single recoverable problem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    #[serde(flatten)]
    pub scope: Scope,
    pub message: String,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, scope: Scope, message: impl Into<String>) -> Self {
        Self {
            kind,
            scope,
            message: message.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} at {}: {}", self.kind, self.scope, self.message)
    }
}

/// Collected diagnostics, in the order they were reported.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Diagnostics(Vec<Diagnostic>);

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.0.push(diagnostic);
    }

    /// Record a diagnostic and log it.
    pub fn report(&mut self, kind: DiagnosticKind, scope: Scope, message: impl Into<String>) {
        let diagnostic = Diagnostic::new(kind, scope, message);
        log::warn!("{}", diagnostic);
        self.0.push(diagnostic);
    }

    /// Append every entry from another report.
    pub fn merge(&mut self, other: Diagnostics) {
        self.0.extend(other.0);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.0.iter()
    }

    pub fn of_kind(&self, kind: DiagnosticKind) -> impl Iterator<Item = &Diagnostic> {
        self.0.iter().filter(move |d| d.kind == kind)
    }

    pub fn count(&self, kind: DiagnosticKind) -> usize {
        self.of_kind(kind).count()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Sort by page, keeping report order inside a page.
    pub fn sort_by_page(&mut self) {
        self.0
            .sort_by_key(|d| d.scope.page().map_or(0, |p| p as u64 + 1));
    }
}

impl Extend<Diagnostic> for Diagnostics {
    fn extend<T: IntoIterator<Item = Diagnostic>>(&mut self, iter: T) {
        self.0.extend(iter);
    }
}

impl IntoIterator for Diagnostics {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}
