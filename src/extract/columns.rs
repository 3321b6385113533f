//! Column and reading-order resolution.
//!
//! Item boxes (blocks, tables, images) are projected onto the horizontal
//! axis. Items wider than `full_width_ratio` of the text width split the
//! page into horizontal bands; inside each band, low-occupancy stretches of
//! the projection are gutters. Items crossing a gutter are promoted to
//! full-width and the bands are recomputed until stable.
//!
//! The result only assigns `(section, column)` places and an order over the
//! input indices; it never fails. A band without valid gutters is read top
//! to bottom, then left to right.

use super::options::{ColumnOptions, ReadingDirection};
use crate::model::{cmp_top_left, BBox};

/// Upper bound on projection slices per band.
const MAX_SLICES: usize = 8192;

/// Where an item sits in the column flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Placement {
    /// Band index in reading order
    pub section: u16,
    /// Column inside the band (0 = first in reading direction)
    pub column: u16,
}

/// Column structure of a page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnLayout {
    /// Placement of each input box, parallel to the input
    pub placements: Vec<Placement>,
    /// Input indices in reading order
    pub order: Vec<usize>,
    /// Sections read as more than one column
    pub multi_column_sections: Vec<u16>,
}

impl ColumnLayout {
    pub fn is_multi_column(&self, section: u16) -> bool {
        self.multi_column_sections.contains(&section)
    }
}

#[derive(Debug)]
enum Band {
    Full(usize),
    Flow(Vec<usize>),
}

/// A horizontal stretch `(x0, x1)` of whitespace between columns.
type Gutter = (f32, f32);

/// Resolves columns and reading order for one page.
pub struct ColumnResolver<'a> {
    options: &'a ColumnOptions,
}

impl<'a> ColumnResolver<'a> {
    pub fn new(options: &'a ColumnOptions) -> Self {
        Self { options }
    }

    /// Resolve the column flow of a set of item boxes.
    pub fn resolve(&self, boxes: &[BBox]) -> ColumnLayout {
        let n = boxes.len();
        if n == 0 {
            return ColumnLayout::default();
        }

        let left = boxes.iter().map(|b| b.x0).fold(f32::MAX, f32::min);
        let right = boxes.iter().map(|b| b.x1).fold(f32::MIN, f32::max);
        let text_width = (right - left).max(1.0);

        let mut full: Vec<bool> = boxes
            .iter()
            .map(|b| b.width() > self.options.full_width_ratio * text_width)
            .collect();

        let resolved = loop {
            let mut promoted = false;
            let mut resolved: Vec<(Band, Vec<Gutter>)> = Vec::new();

            for band in split_bands(boxes, &full) {
                let gutters = match &band {
                    Band::Full(_) => Vec::new(),
                    Band::Flow(members) => {
                        let gutters = self.find_gutters(boxes, members);
                        for &i in members {
                            if gutters.iter().any(|g| crosses(&boxes[i], g)) {
                                log::debug!("Columns: item {} crosses a gutter, now full-width", i);
                                full[i] = true;
                                promoted = true;
                            }
                        }
                        gutters
                    }
                };
                resolved.push((band, gutters));
            }

            if !promoted {
                break resolved;
            }
        };

        let mut layout = ColumnLayout {
            placements: vec![Placement::default(); n],
            order: Vec::with_capacity(n),
            multi_column_sections: Vec::new(),
        };

        for (section, (band, gutters)) in resolved.into_iter().enumerate() {
            let section = section as u16;
            match band {
                Band::Full(i) => {
                    layout.placements[i] = Placement { section, column: 0 };
                    layout.order.push(i);
                }
                Band::Flow(mut members) => {
                    for &i in &members {
                        let column = self.column_of(&boxes[i], &gutters);
                        layout.placements[i] = Placement { section, column };
                    }
                    if gutters.is_empty() {
                        members.sort_by(|&a, &b| cmp_top_left(&boxes[a], &boxes[b]).then(a.cmp(&b)));
                    } else {
                        layout.multi_column_sections.push(section);
                        members.sort_by(|&a, &b| {
                            layout.placements[a]
                                .column
                                .cmp(&layout.placements[b].column)
                                .then(cmp_top_left(&boxes[a], &boxes[b]))
                                .then(a.cmp(&b))
                        });
                    }
                    layout.order.extend(members);
                }
            }
        }

        log::debug!(
            "Columns: {} items, multi-column sections {:?}",
            n,
            layout.multi_column_sections
        );
        layout
    }

    fn column_of(&self, bbox: &BBox, gutters: &[Gutter]) -> u16 {
        let before = gutters
            .iter()
            .filter(|g| (g.0 + g.1) / 2.0 < bbox.center_x())
            .count();
        let column = match self.options.direction {
            ReadingDirection::LeftToRight => before,
            ReadingDirection::RightToLeft => gutters.len() - before,
        };
        column as u16
    }

    /// Find gutters in the horizontal projection of a band.
    ///
    /// A gutter is a stretch at least `gutter_min_width` wide that few items
    /// cross, narrowed to its least occupied part. Every column it leaves
    /// must be at least `min_column_width` wide and hold an item.
    fn find_gutters(&self, boxes: &[BBox], members: &[usize]) -> Vec<Gutter> {
        let options = self.options;
        if members.len() < 2 {
            return vec![];
        }

        let left = members.iter().map(|&i| boxes[i].x0).fold(f32::MAX, f32::min);
        let right = members.iter().map(|&i| boxes[i].x1).fold(f32::MIN, f32::max);
        let width = right - left;
        if !width.is_finite() || width < 2.0 * options.min_column_width + options.gutter_min_width {
            return vec![];
        }

        // 1pt slices, coarser on very wide bands
        let step = (width / MAX_SLICES as f32).max(1.0);
        let slices = ((width / step).ceil() as usize).clamp(1, MAX_SLICES);
        let mut occupancy = vec![0usize; slices];
        for &i in members {
            let start = (((boxes[i].x0 - left) / step).floor() as usize).min(slices - 1);
            let end = (((boxes[i].x1 - left) / step).ceil() as usize).min(slices);
            for slot in occupancy.iter_mut().take(end).skip(start) {
                *slot += 1;
            }
        }

        // Slices crossed by at most `1 - column_consistency` of the
        // deepest stack of items count as whitespace.
        let peak = occupancy.iter().copied().max().unwrap_or(0);
        let allowed = ((1.0 - options.column_consistency) * peak as f32).floor() as usize;
        let mut candidates: Vec<Gutter> = Vec::new();
        let mut k = 0;
        while k < slices {
            if occupancy[k] > allowed {
                k += 1;
                continue;
            }
            let start = k;
            while k < slices && occupancy[k] <= allowed {
                k += 1;
            }
            // Margins at the band edges are not gutters.
            if start == 0 || k == slices {
                continue;
            }
            let (core_start, core_end) = widest_minimum(&occupancy[start..k]);
            if (core_end - core_start) as f32 * step >= options.gutter_min_width {
                candidates.push((
                    left + (start + core_start) as f32 * step,
                    left + (start + core_end) as f32 * step,
                ));
            }
        }

        let holds_item = |x0: f32, x1: f32| {
            members.iter().any(|&i| {
                let cx = boxes[i].center_x();
                cx >= x0 && cx <= x1
            })
        };

        let mut kept: Vec<Gutter> = Vec::new();
        let mut column_start = left;
        for gutter in candidates {
            if gutter.0 - column_start >= options.min_column_width && holds_item(column_start, gutter.0) {
                kept.push(gutter);
                column_start = gutter.1;
            }
        }
        while let Some(&last) = kept.last() {
            if right - last.1 >= options.min_column_width && holds_item(last.1, right) {
                break;
            }
            kept.pop();
        }

        if !kept.is_empty() {
            log::debug!("Columns: gutters {:?} in band of {} items", kept, members.len());
        }
        kept
    }
}

/// Split items into full-width items and the bands of narrow items between them.
fn split_bands(boxes: &[BBox], full: &[bool]) -> Vec<Band> {
    let mut fulls: Vec<usize> = (0..boxes.len()).filter(|&i| full[i]).collect();
    fulls.sort_by(|&a, &b| cmp_top_left(&boxes[a], &boxes[b]).then(a.cmp(&b)));

    let mut narrow: Vec<usize> = (0..boxes.len()).filter(|&i| !full[i]).collect();
    narrow.sort_by(|&a, &b| {
        boxes[a]
            .center_y()
            .total_cmp(&boxes[b].center_y())
            .then(a.cmp(&b))
    });

    let mut bands = Vec::new();
    let mut rest = narrow.into_iter().peekable();
    for f in fulls {
        let limit = boxes[f].center_y();
        let mut members = Vec::new();
        while let Some(&i) = rest.peek() {
            if boxes[i].center_y() < limit {
                members.push(i);
                rest.next();
            } else {
                break;
            }
        }
        if !members.is_empty() {
            bands.push(Band::Flow(members));
        }
        bands.push(Band::Full(f));
    }
    let members: Vec<usize> = rest.collect();
    if !members.is_empty() {
        bands.push(Band::Flow(members));
    }
    bands
}

/// Check if a box reaches into a gutter.
fn crosses(bbox: &BBox, gutter: &Gutter) -> bool {
    bbox.x0 < gutter.1 - 0.5 && bbox.x1 > gutter.0 + 0.5
}

/// Widest stretch at the minimum value, as a half-open index range.
fn widest_minimum(values: &[usize]) -> (usize, usize) {
    let min = values.iter().copied().min().unwrap_or(0);
    let mut best = (0, 0);
    let mut k = 0;
    while k < values.len() {
        if values[k] != min {
            k += 1;
            continue;
        }
        let start = k;
        while k < values.len() && values[k] == min {
            k += 1;
        }
        if k - start > best.1 - best.0 {
            best = (start, k);
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Full-width header over two columns of two blocks each.
    fn two_column_page() -> Vec<BBox> {
        vec![
            BBox::new(310.0, 210.0, 550.0, 300.0), // col2 bottom
            BBox::new(50.0, 100.0, 290.0, 200.0),  // col1 top
            BBox::new(50.0, 50.0, 550.0, 70.0),    // header
            BBox::new(310.0, 100.0, 550.0, 200.0), // col2 top
            BBox::new(50.0, 210.0, 290.0, 300.0),  // col1 bottom
        ]
    }

    #[test]
    fn test_header_then_columns() {
        let options = ColumnOptions::default();
        let layout = ColumnResolver::new(&options).resolve(&two_column_page());

        assert_eq!(layout.order, vec![2, 1, 4, 3, 0]);
        assert_eq!(layout.placements[2], Placement { section: 0, column: 0 });
        assert_eq!(layout.placements[1], Placement { section: 1, column: 0 });
        assert_eq!(layout.placements[0], Placement { section: 1, column: 1 });
        assert!(layout.is_multi_column(1));
        assert!(!layout.is_multi_column(0));
    }

    #[test]
    fn test_right_to_left_column_order() {
        let options = ColumnOptions {
            direction: ReadingDirection::RightToLeft,
            ..Default::default()
        };
        let layout = ColumnResolver::new(&options).resolve(&two_column_page());
        assert_eq!(layout.order, vec![2, 3, 0, 1, 4]);
        assert_eq!(layout.placements[3].column, 0);
    }

    #[test]
    fn test_three_columns() {
        let mut boxes = Vec::new();
        for x in [50.0, 220.0, 390.0] {
            boxes.push(BBox::new(x, 100.0, x + 150.0, 180.0));
            boxes.push(BBox::new(x, 190.0, x + 150.0, 260.0));
        }
        let options = ColumnOptions::default();
        let layout = ColumnResolver::new(&options).resolve(&boxes);
        assert_eq!(layout.order, vec![0, 1, 2, 3, 4, 5]);
        assert_eq!(layout.placements[5].column, 2);
    }

    #[test]
    fn test_item_bridging_gutter_interrupts_flow() {
        let boxes = vec![
            BBox::new(50.0, 100.0, 290.0, 150.0),
            BBox::new(310.0, 100.0, 550.0, 150.0),
            BBox::new(170.0, 170.0, 430.0, 190.0),
            BBox::new(50.0, 210.0, 290.0, 260.0),
            BBox::new(310.0, 210.0, 550.0, 260.0),
        ];
        let options = ColumnOptions::default();
        let layout = ColumnResolver::new(&options).resolve(&boxes);

        assert_eq!(layout.order, vec![0, 1, 2, 3, 4]);
        assert_eq!(layout.placements[2].section, 1);
        assert_eq!(layout.placements[4], Placement { section: 2, column: 1 });
    }

    #[test]
    fn test_inconsistent_columns_fall_back_to_top_to_bottom() {
        let boxes = vec![
            BBox::new(100.0, 150.0, 300.0, 170.0),
            BBox::new(50.0, 130.0, 80.0, 140.0),
            BBox::new(100.0, 100.0, 300.0, 120.0),
        ];
        let options = ColumnOptions {
            full_width_ratio: 0.9,
            ..Default::default()
        };
        let layout = ColumnResolver::new(&options).resolve(&boxes);
        assert_eq!(layout.order, vec![2, 1, 0]);
        assert!(layout.multi_column_sections.is_empty());
    }

    #[test]
    fn test_resolution_is_deterministic() {
        let options = ColumnOptions::default();
        let resolver = ColumnResolver::new(&options);
        let boxes = two_column_page();
        let first = resolver.resolve(&boxes);
        for _ in 0..5 {
            assert_eq!(resolver.resolve(&boxes), first);
        }

        let mut reversed = boxes.clone();
        reversed.reverse();
        let ordered = |bs: &[BBox], layout: &ColumnLayout| -> Vec<BBox> {
            layout.order.iter().map(|&i| bs[i]).collect()
        };
        assert_eq!(
            ordered(&reversed, &resolver.resolve(&reversed)),
            ordered(&boxes, &first)
        );
    }

    #[test]
    fn test_wide_band_uses_coarse_slices() {
        let boxes = vec![
            BBox::new(0.0, 100.0, 4000.0, 150.0),
            BBox::new(6000.0, 100.0, 10000.0, 150.0),
            BBox::new(0.0, 200.0, 4000.0, 250.0),
            BBox::new(6000.0, 200.0, 10000.0, 250.0),
        ];
        let options = ColumnOptions::default();
        let layout = ColumnResolver::new(&options).resolve(&boxes);
        assert_eq!(layout.order, vec![0, 2, 1, 3]);
        assert_eq!(layout.placements[1].column, 1);
    }

    #[test]
    fn test_far_off_page_box_is_ordered() {
        let mut boxes = two_column_page();
        boxes.push(BBox::new(1.0e9, 120.0, 1.0e9 + 40.0, 130.0));
        let options = ColumnOptions::default();
        let layout = ColumnResolver::new(&options).resolve(&boxes);

        let mut order = layout.order.clone();
        order.sort_unstable();
        assert_eq!(order, (0..boxes.len()).collect::<Vec<_>>());
    }

    #[test]
    fn test_empty_page() {
        let options = ColumnOptions::default();
        let layout = ColumnResolver::new(&options).resolve(&[]);
        assert!(layout.order.is_empty());
    }

    #[test]
    fn test_widest_minimum() {
        assert_eq!(widest_minimum(&[2, 1, 0, 0, 1, 0, 2]), (2, 4));
        assert_eq!(widest_minimum(&[1, 1]), (0, 2));
    }
}
