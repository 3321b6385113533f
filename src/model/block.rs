//! Text blocks, lines and runs.

use super::{BBox, FontId};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Identifier of a block, unique within its page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockId(pub u32);

/// Identifier of a run, unique within its page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(pub u32);

/// Semantic role of a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SemanticTag {
    /// Regular paragraph text
    #[default]
    Body,
    /// Heading (level 1 is the largest)
    Heading { level: u8 },
    /// Figure or table caption
    Caption,
    /// Bulleted or numbered list entry
    ListItem,
}

/// Translation status of a run.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TranslationState {
    /// Not translated yet
    #[default]
    Pending,
    /// Translated text is available
    Translated { text: String },
    /// Translation failed; the original text is kept
    Failed { reason: String },
}

/// The atomic translatable unit: text with one font and one box.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Run {
    pub id: RunId,

    /// Original text
    pub text: String,

    /// Translated text, kept separate so the original survives
    #[serde(default)]
    pub translation: TranslationState,

    pub font: FontId,

    /// Original geometry
    pub bbox: BBox,

    #[serde(flatten, default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, Value>,
}

impl Run {
    pub fn new(id: RunId, text: impl Into<String>, font: FontId, bbox: BBox) -> Self {
        Self {
            id,
            text: text.into(),
            translation: TranslationState::Pending,
            font,
            bbox,
            extra: BTreeMap::new(),
        }
    }

    /// Translated text if available, otherwise the original.
    pub fn display_text(&self) -> &str {
        match &self.translation {
            TranslationState::Translated { text } => text,
            _ => &self.text,
        }
    }

    pub fn translated_text(&self) -> Option<&str> {
        match &self.translation {
            TranslationState::Translated { text } => Some(text),
            _ => None,
        }
    }

    pub fn is_translated(&self) -> bool {
        matches!(self.translation, TranslationState::Translated { .. })
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.translation, TranslationState::Failed { .. })
    }
}

/// Runs sharing a baseline, ordered in reading direction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Line {
    /// Baseline y coordinate
    pub baseline: f32,

    pub bbox: BBox,

    pub runs: Vec<Run>,

    #[serde(flatten, default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, Value>,
}

impl Line {
    pub fn new(baseline: f32, bbox: BBox, runs: Vec<Run>) -> Self {
        Self {
            baseline,
            bbox,
            runs,
            extra: BTreeMap::new(),
        }
    }

    /// Original text of the line.
    pub fn text(&self) -> String {
        join_runs(&self.runs, |r| r.text.as_str())
    }

    /// Text of the line after translation, falling back per run.
    pub fn display_text(&self) -> String {
        join_runs(&self.runs, Run::display_text)
    }
}

/// Join run texts, restoring the word space implied by a visible gap.
fn join_runs<'a>(runs: &'a [Run], text: impl Fn(&'a Run) -> &'a str) -> String {
    let mut out = String::new();
    for (i, run) in runs.iter().enumerate() {
        let piece = text(run);
        if i > 0 {
            let prev = &runs[i - 1];
            let gap = run.bbox.x0 - prev.bbox.x1;
            let needs_space = gap > run.bbox.height().max(1.0) * 0.15
                && !out.ends_with(char::is_whitespace)
                && !piece.starts_with(char::is_whitespace)
                && !(out.chars().last().is_some_and(is_spaceless_script_char)
                    && piece.chars().next().is_some_and(is_spaceless_script_char));
            if needs_space {
                out.push(' ');
            }
        }
        out.push_str(piece);
    }
    out
}

/// A paragraph-like unit of lines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub id: BlockId,

    /// Union of the line boxes
    pub bbox: BBox,

    /// Dominant font (by character count)
    pub font: FontId,

    #[serde(default)]
    pub tag: SemanticTag,

    pub lines: Vec<Line>,

    #[serde(flatten, default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, Value>,
}

impl Block {
    pub fn new(id: BlockId, bbox: BBox, font: FontId, tag: SemanticTag, lines: Vec<Line>) -> Self {
        Self {
            id,
            bbox,
            font,
            tag,
            lines,
            extra: BTreeMap::new(),
        }
    }

    /// Original text, lines joined by spaces.
    pub fn text(&self) -> String {
        self.lines
            .iter()
            .map(|l| l.text())
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn runs(&self) -> impl Iterator<Item = &Run> {
        self.lines.iter().flat_map(|l| l.runs.iter())
    }

    pub fn runs_mut(&mut self) -> impl Iterator<Item = &mut Run> {
        self.lines.iter_mut().flat_map(|l| l.runs.iter_mut())
    }

    pub fn run_count(&self) -> usize {
        self.lines.iter().map(|l| l.runs.len()).sum()
    }

    pub fn is_heading(&self) -> bool {
        matches!(self.tag, SemanticTag::Heading { .. })
    }
}

/// Check if a character is from a script written without word spaces.
///
/// Chinese and Japanese don't use spaces between words, but Korean does.
pub fn is_spaceless_script_char(c: char) -> bool {
    let code = c as u32;

    // CJK Unified Ideographs and extensions
    (0x4E00..=0x9FFF).contains(&code)
        || (0x3400..=0x4DBF).contains(&code)
        || (0x20000..=0x2EBEF).contains(&code)
        // Hiragana, Katakana
        || (0x3040..=0x30FF).contains(&code)
        // CJK Symbols and Punctuation
        || (0x3000..=0x303F).contains(&code)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(id: u32, text: &str, x0: f32, x1: f32) -> Run {
        Run::new(RunId(id), text, FontId(0), BBox::new(x0, 0.0, x1, 12.0))
    }

    #[test]
    fn test_display_text_falls_back() {
        let mut r = run(0, "Hello", 0.0, 30.0);
        assert_eq!(r.display_text(), "Hello");

        r.translation = TranslationState::Failed {
            reason: "timeout".to_string(),
        };
        assert_eq!(r.display_text(), "Hello");
        assert!(r.is_failed());

        r.translation = TranslationState::Translated {
            text: "Hola".to_string(),
        };
        assert_eq!(r.display_text(), "Hola");
        assert_eq!(r.translated_text(), Some("Hola"));
    }

    #[test]
    fn test_line_text_spacing() {
        let line = Line::new(
            10.0,
            BBox::new(0.0, 0.0, 80.0, 12.0),
            vec![run(0, "Hello", 0.0, 30.0), run(1, "world", 34.0, 64.0)],
        );
        assert_eq!(line.text(), "Hello world");

        let tight = Line::new(
            10.0,
            BBox::new(0.0, 0.0, 80.0, 12.0),
            vec![run(0, "Hel", 0.0, 18.0), run(1, "lo", 18.0, 30.0)],
        );
        assert_eq!(tight.text(), "Hello");
    }

    #[test]
    fn test_line_text_cjk_no_space() {
        let line = Line::new(
            10.0,
            BBox::new(0.0, 0.0, 80.0, 12.0),
            vec![run(0, "日本", 0.0, 24.0), run(1, "語", 28.0, 40.0)],
        );
        assert_eq!(line.text(), "日本語");
    }

    #[test]
    fn test_semantic_tag_serde() {
        let tag = SemanticTag::Heading { level: 2 };
        let json = serde_json::to_string(&tag).unwrap();
        assert_eq!(json, r#"{"kind":"heading","level":2}"#);
        let back: SemanticTag = serde_json::from_str(&json).unwrap();
        assert_eq!(back, tag);
    }
}
