//! Table types.

use super::{BBox, Block};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// A cell matrix with fixed grid geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub bbox: BBox,

    /// Number of grid rows
    pub rows: u32,

    /// Number of grid columns
    pub cols: u32,

    /// Width of each grid column in points
    pub column_widths: Vec<f32>,

    /// Height of each grid row in points
    pub row_heights: Vec<f32>,

    /// Whether the grid came from ruling lines
    #[serde(default)]
    pub ruled: bool,

    /// Cells in row-major order of their anchor
    pub cells: Vec<Cell>,

    #[serde(flatten, default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, Value>,
}

impl Table {
    /// Create an empty table over a grid given by its column and row edges.
    pub fn from_edges(col_edges: &[f32], row_edges: &[f32], ruled: bool) -> Self {
        let column_widths: Vec<f32> = col_edges.windows(2).map(|w| w[1] - w[0]).collect();
        let row_heights: Vec<f32> = row_edges.windows(2).map(|w| w[1] - w[0]).collect();
        let bbox = BBox::new(
            col_edges.first().copied().unwrap_or(0.0),
            row_edges.first().copied().unwrap_or(0.0),
            col_edges.last().copied().unwrap_or(0.0),
            row_edges.last().copied().unwrap_or(0.0),
        );

        Self {
            bbox,
            rows: row_heights.len() as u32,
            cols: column_widths.len() as u32,
            column_widths,
            row_heights,
            ruled,
            cells: Vec::new(),
            extra: BTreeMap::new(),
        }
    }

    /// Left edge of every grid column plus the right edge of the last one.
    pub fn column_edges(&self) -> Vec<f32> {
        edges(self.bbox.x0, &self.column_widths)
    }

    /// Top edge of every grid row plus the bottom edge of the last one.
    pub fn row_edges(&self) -> Vec<f32> {
        edges(self.bbox.y0, &self.row_heights)
    }

    pub fn cell_at(&self, row: u32, col: u32) -> Option<&Cell> {
        self.cells.iter().find(|c| c.covers(row, col))
    }

    /// Number of cells whose anchor is in `row`.
    pub fn logical_cells_in_row(&self, row: u32) -> usize {
        self.cells.iter().filter(|c| c.row == row).count()
    }

    /// Number of grid columns covered in `row` once spans are applied.
    pub fn logical_columns_in_row(&self, row: u32) -> u32 {
        self.cells
            .iter()
            .filter(|c| c.row <= row && row < c.row + c.rowspan)
            .map(|c| c.colspan)
            .sum()
    }

    /// Check that every grid slot is covered by exactly one cell.
    pub fn is_rectangular(&self) -> bool {
        if self.column_widths.len() != self.cols as usize
            || self.row_heights.len() != self.rows as usize
        {
            return false;
        }

        let mut grid = vec![0u8; (self.rows * self.cols) as usize];
        for cell in &self.cells {
            if cell.rowspan == 0
                || cell.colspan == 0
                || cell.row + cell.rowspan > self.rows
                || cell.col + cell.colspan > self.cols
            {
                return false;
            }
            for r in cell.row..cell.row + cell.rowspan {
                for c in cell.col..cell.col + cell.colspan {
                    let slot = &mut grid[(r * self.cols + c) as usize];
                    *slot = slot.saturating_add(1);
                }
            }
        }

        grid.iter().all(|&n| n == 1)
    }

    pub fn blocks(&self) -> impl Iterator<Item = &Block> {
        self.cells.iter().flat_map(|c| c.blocks.iter())
    }

    pub fn blocks_mut(&mut self) -> impl Iterator<Item = &mut Block> {
        self.cells.iter_mut().flat_map(|c| c.blocks.iter_mut())
    }

    /// Plain text with cells separated by tabs and rows by newlines.
    pub fn plain_text(&self) -> String {
        (0..self.rows)
            .map(|r| {
                self.cells
                    .iter()
                    .filter(|c| c.row == r)
                    .map(|c| c.text())
                    .collect::<Vec<_>>()
                    .join("\t")
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn edges(start: f32, sizes: &[f32]) -> Vec<f32> {
    let mut out = Vec::with_capacity(sizes.len() + 1);
    let mut pos = start;
    out.push(pos);
    for size in sizes {
        pos += size;
        out.push(pos);
    }
    out
}

/// A table cell anchored at (`row`, `col`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    pub row: u32,
    pub col: u32,
    pub rowspan: u32,
    pub colspan: u32,
    pub bbox: BBox,

    /// Cell content; may be empty
    #[serde(default)]
    pub blocks: Vec<Block>,

    #[serde(flatten, default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, Value>,
}

impl Cell {
    pub fn new(row: u32, col: u32, rowspan: u32, colspan: u32, bbox: BBox) -> Self {
        Self {
            row,
            col,
            rowspan: rowspan.max(1),
            colspan: colspan.max(1),
            bbox,
            blocks: Vec::new(),
            extra: BTreeMap::new(),
        }
    }

    /// Check if the cell covers the grid slot (`row`, `col`).
    pub fn covers(&self, row: u32, col: u32) -> bool {
        row >= self.row && row < self.row + self.rowspan && col >= self.col && col < self.col + self.colspan
    }

    pub fn text(&self) -> String {
        self.blocks
            .iter()
            .map(|b| b.text())
            .collect::<Vec<_>>()
            .join(" ")
    }
}
