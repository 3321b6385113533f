//! Font descriptors and the document-level font table.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};

/// Index of a descriptor in the document [`FontTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FontId(pub u32);

/// Font weight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FontWeight {
    #[default]
    Normal,
    Bold,
}

/// Font style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FontStyle {
    #[default]
    Normal,
    Italic,
}

/// Family, size, weight, style and fill color of a text run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FontDescriptor {
    /// Font family or PostScript name (e.g., "Helvetica-Bold")
    pub family: String,

    /// Font size in points
    pub size: f32,

    #[serde(default)]
    pub weight: FontWeight,

    #[serde(default)]
    pub style: FontStyle,

    /// Fill color as 0xRRGGBB
    #[serde(default)]
    pub color: u32,

    #[serde(flatten, default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, Value>,
}

impl FontDescriptor {
    /// Create a regular-weight, upright descriptor.
    pub fn new(family: impl Into<String>, size: f32) -> Self {
        Self {
            family: family.into(),
            size,
            weight: FontWeight::Normal,
            style: FontStyle::Normal,
            color: 0,
            extra: BTreeMap::new(),
        }
    }

    /// Create a descriptor, inferring weight and style from the font name.
    pub fn from_name(name: impl Into<String>, size: f32) -> Self {
        let family = name.into();
        let lower = family.to_lowercase();
        let weight = if lower.contains("bold") || lower.contains("black") || lower.contains("heavy")
        {
            FontWeight::Bold
        } else {
            FontWeight::Normal
        };
        let style = if lower.contains("italic") || lower.contains("oblique") {
            FontStyle::Italic
        } else {
            FontStyle::Normal
        };

        Self {
            weight,
            style,
            ..Self::new(family, size)
        }
    }

    /// Set the fill color.
    pub fn with_color(mut self, color: u32) -> Self {
        self.color = color;
        self
    }

    /// Set the weight.
    pub fn with_weight(mut self, weight: FontWeight) -> Self {
        self.weight = weight;
        self
    }

    /// Set the style.
    pub fn with_style(mut self, style: FontStyle) -> Self {
        self.style = style;
        self
    }

    pub fn is_bold(&self) -> bool {
        self.weight == FontWeight::Bold
    }

    pub fn is_italic(&self) -> bool {
        self.style == FontStyle::Italic
    }

    /// Identity used for deduplication and run continuity.
    ///
    /// Sizes are compared at 0.1pt precision.
    pub fn key(&self) -> FontKey {
        FontKey {
            family: self.family.clone(),
            size_tenths: (self.size * 10.0).round() as i32,
            weight: self.weight,
            style: self.style,
            color: self.color,
        }
    }
}

/// Hashable identity of a [`FontDescriptor`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FontKey {
    family: String,
    size_tenths: i32,
    weight: FontWeight,
    style: FontStyle,
    color: u32,
}

/// Deduplicated font descriptors referenced by [`FontId`].
///
/// The lookup index is a cache rebuilt on demand; it is neither serialized
/// nor compared.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FontTable {
    fonts: Vec<FontDescriptor>,

    #[serde(skip)]
    index: HashMap<FontKey, FontId>,
}

impl FontTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the id of an equal descriptor, adding it if it is new.
    pub fn intern(&mut self, font: &FontDescriptor) -> FontId {
        if self.index.len() != self.fonts.len() {
            self.rebuild_index();
        }

        let key = font.key();
        if let Some(id) = self.index.get(&key) {
            return *id;
        }

        let id = FontId(self.fonts.len() as u32);
        self.fonts.push(font.clone());
        self.index.insert(key, id);
        id
    }

    /// Look up a descriptor.
    pub fn get(&self, id: FontId) -> Option<&FontDescriptor> {
        self.fonts.get(id.0 as usize)
    }

    /// Size of a font, or `fallback` for an unknown id.
    pub fn size_of(&self, id: FontId, fallback: f32) -> f32 {
        self.get(id).map(|f| f.size).unwrap_or(fallback)
    }

    pub fn len(&self) -> usize {
        self.fonts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fonts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (FontId, &FontDescriptor)> {
        self.fonts
            .iter()
            .enumerate()
            .map(|(i, f)| (FontId(i as u32), f))
    }

    fn rebuild_index(&mut self) {
        self.index.clear();
        for (i, font) in self.fonts.iter().enumerate() {
            self.index.entry(font.key()).or_insert(FontId(i as u32));
        }
    }
}

impl PartialEq for FontTable {
    fn eq(&self, other: &Self) -> bool {
        self.fonts == other.fonts
    }
}
