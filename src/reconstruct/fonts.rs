//! Mapping of source fonts to the standard faces every renderer provides.

use crate::model::FontDescriptor;

/// Generic family of a font.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontClass {
    Sans,
    Serif,
    Mono,
}

/// Resolves font descriptors to standard face names.
#[derive(Debug, Clone, Default)]
pub struct FontResolver;

const SERIF_HINTS: &[&str] = &[
    "times", "serif", "roman", "garamond", "georgia", "cambria", "minion", "palatino", "book",
    "bodoni", "caslon", "baskerville", "mincho", "song",
];
const MONO_HINTS: &[&str] = &["courier", "mono", "consol", "code", "typewriter", "menlo"];

impl FontResolver {
    pub fn new() -> Self {
        Self
    }

    /// Classify a family name.
    pub fn classify(&self, family: &str) -> FontClass {
        // Subset prefixes look like "ABCDEF+Name".
        let name = family
            .split_once('+')
            .map(|(_, n)| n)
            .unwrap_or(family)
            .to_lowercase();

        if MONO_HINTS.iter().any(|h| name.contains(h)) {
            FontClass::Mono
        } else if name.contains("sans") {
            FontClass::Sans
        } else if SERIF_HINTS.iter().any(|h| name.contains(h)) {
            FontClass::Serif
        } else {
            FontClass::Sans
        }
    }

    /// Standard face name for a descriptor.
    pub fn resolve(&self, font: &FontDescriptor) -> &'static str {
        let bold = font.is_bold();
        let italic = font.is_italic();
        match (self.classify(&font.family), bold, italic) {
            (FontClass::Sans, false, false) => "Helvetica",
            (FontClass::Sans, true, false) => "Helvetica-Bold",
            (FontClass::Sans, false, true) => "Helvetica-Oblique",
            (FontClass::Sans, true, true) => "Helvetica-BoldOblique",
            (FontClass::Serif, false, false) => "Times-Roman",
            (FontClass::Serif, true, false) => "Times-Bold",
            (FontClass::Serif, false, true) => "Times-Italic",
            (FontClass::Serif, true, true) => "Times-BoldItalic",
            (FontClass::Mono, false, false) => "Courier",
            (FontClass::Mono, true, false) => "Courier-Bold",
            (FontClass::Mono, false, true) => "Courier-Oblique",
            (FontClass::Mono, true, true) => "Courier-BoldOblique",
        }
    }
}
