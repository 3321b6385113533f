//! Draw operations handed to the rendering collaborator.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::model::{BBox, BlockId, RunId};

/// Horizontal alignment of placed text inside its width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextAlign {
    #[default]
    Left,
    Right,
}

/// A primitive drawing operation in absolute page coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum DrawOp {
    /// One line of text starting at `x` on `baseline`
    PlaceText {
        text: String,
        x: f32,
        baseline: f32,
        /// Width available to the line
        width: f32,
        /// Standard face name
        font: String,
        size: f32,
        color: u32,
        #[serde(default)]
        align: TextAlign,
        block: BlockId,
        /// Run the text comes from
        #[serde(default, skip_serializing_if = "Option::is_none")]
        run: Option<RunId>,
    },
    /// An image at its original placement
    PlaceImage { bbox: BBox },
    /// A vector path, approximated by its bounding box
    DrawPath { bbox: BBox },
    /// A filled rectangle
    FillRect { bbox: BBox, color: u32 },
}

impl DrawOp {
    /// Text of a text operation.
    pub fn text(&self) -> Option<&str> {
        match self {
            DrawOp::PlaceText { text, .. } => Some(text),
            _ => None,
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self, DrawOp::PlaceText { .. })
    }
}

/// Draw operations of one page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderedPage {
    pub index: u32,
    pub width: f32,
    pub height: f32,
    pub ops: Vec<DrawOp>,
}

impl RenderedPage {
    pub fn new(index: u32, width: f32, height: f32) -> Self {
        Self {
            index,
            width,
            height,
            ops: Vec::new(),
        }
    }

    /// Text operations in emission order.
    pub fn texts(&self) -> impl Iterator<Item = &DrawOp> {
        self.ops.iter().filter(|op| op.is_text())
    }

    /// All placed text joined by newlines.
    pub fn plain_text(&self) -> String {
        self.ops
            .iter()
            .filter_map(DrawOp::text)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// The rendering collaborator: turns draw operations into a page artifact.
pub trait PageRenderer {
    type Output;

    fn render(&self, page: &RenderedPage) -> Result<Self::Output>;
}
