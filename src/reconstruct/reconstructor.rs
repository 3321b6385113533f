//! Page reconstruction.
//!
//! A page is split into lanes: one per column of each section, plus one per
//! header, footer and text-bearing image. Blocks in a lane are fitted top to
//! bottom; a growing block fills the whitespace below it before pushing the
//! following blocks of its lane down, and never reaches past the next
//! obstacle below the lane or the bottom margin. Images split a lane into independent segments.
//!
//! Tables keep their column widths. A row may grow to fit its tallest cell,
//! pushing the rows below it and the ruling lines with them.

use std::collections::BTreeMap;

use log::debug;
use rayon::prelude::*;

use super::fit::{BlockFit, FitLevel, Fitter};
use super::fonts::FontResolver;
use super::measure::{AverageWidthMeasurer, TextMeasurer};
use super::ops::{DrawOp, RenderedPage};
use super::options::ReconstructOptions;
use crate::model::{
    cmp_top_left, BBox, Block, Cell, DiagnosticKind, Diagnostics, Document, FontTable, GraphicKind, Page,
    RegionContent, RegionId, RegionKind, Scope, Table,
};

/// Obstacles must start at least this far below a segment.
const SEGMENT_GAP: f32 = 0.5;

/// Graphics this close to a table belong to it.
const RULE_SNAP: f32 = 3.0;

/// Gap left between a grown item and an item it pushes down.
const MIN_BLOCK_GAP: f32 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum LaneKey {
    Flow { section: u16, column: u16 },
    Isolated(RegionId),
}

#[derive(Debug, Clone, Copy)]
enum Item<'a> {
    Block(&'a Block),
    Table(&'a Table),
    Barrier(BBox),
}

impl Item<'_> {
    fn bbox(&self) -> BBox {
        match self {
            Item::Block(block) => block.bbox,
            Item::Table(table) => table.bbox,
            Item::Barrier(bbox) => *bbox,
        }
    }
}

struct Lane<'a> {
    items: Vec<Item<'a>>,
    cover: bool,
    /// Growth never passes this line
    limit: Option<f32>,
}

/// Vertical displacement applied to a table.
#[derive(Debug, Clone)]
struct TableShift {
    bbox: BBox,
    dy: f32,
    row_bottoms: Vec<f32>,
    growth: Vec<f32>,
}

impl TableShift {
    fn offset_at(&self, y: f32) -> f32 {
        let rows: f32 = self
            .row_bottoms
            .iter()
            .zip(&self.growth)
            .filter(|(bottom, _)| **bottom <= y + RULE_SNAP)
            .map(|(_, g)| g)
            .sum();
        self.dy + rows
    }
}

struct LaneOutput {
    page: u32,
    covers: Vec<DrawOp>,
    texts: Vec<DrawOp>,
    tables: Vec<TableShift>,
    diagnostics: Diagnostics,
    levels: BTreeMap<FitLevel, usize>,
}

impl LaneOutput {
    fn new(page: u32) -> Self {
        Self {
            page,
            covers: Vec::new(),
            texts: Vec::new(),
            tables: Vec::new(),
            diagnostics: Diagnostics::new(),
            levels: BTreeMap::new(),
        }
    }

    fn record(&mut self, fit: BlockFit) -> f32 {
        *self.levels.entry(fit.level).or_insert(0) += 1;
        for overflow in fit.overflows {
            self.diagnostics.report(
                DiagnosticKind::LayoutOverflow,
                Scope::Run {
                    page: self.page,
                    run: overflow.run,
                },
                overflow.message,
            );
        }
        self.covers.extend(fit.covers);
        self.texts.extend(fit.ops);
        fit.grown
    }
}

/// Rebuilds pages around translated text.
pub struct Reconstructor<M: TextMeasurer = AverageWidthMeasurer> {
    options: ReconstructOptions,
    measurer: M,
    resolver: FontResolver,
}

impl Reconstructor {
    pub fn new(options: ReconstructOptions) -> Self {
        Self::with_measurer(options, AverageWidthMeasurer::default())
    }
}

impl Default for Reconstructor {
    fn default() -> Self {
        Self::new(ReconstructOptions::default())
    }
}

impl<M: TextMeasurer> Reconstructor<M> {
    /// Create a reconstructor measuring text with `measurer`.
    pub fn with_measurer(options: ReconstructOptions, measurer: M) -> Self {
        Self {
            options,
            measurer,
            resolver: FontResolver::new(),
        }
    }

    pub fn options(&self) -> &ReconstructOptions {
        &self.options
    }

    /// Reconstruct every page of a document.
    ///
    /// Failed pages produce empty output pages. Diagnostics come in page
    /// order.
    pub fn reconstruct(&self, doc: &Document) -> (Vec<RenderedPage>, Diagnostics) {
        let results: Vec<(RenderedPage, Diagnostics)> = if self.options.parallel {
            doc.pages
                .par_iter()
                .map(|page| self.reconstruct_page(page, &doc.fonts))
                .collect()
        } else {
            doc.pages
                .iter()
                .map(|page| self.reconstruct_page(page, &doc.fonts))
                .collect()
        };

        let mut diagnostics = Diagnostics::new();
        let pages = results
            .into_iter()
            .map(|(page, page_diagnostics)| {
                diagnostics.merge(page_diagnostics);
                page
            })
            .collect();
        (pages, diagnostics)
    }

    /// Reconstruct one page.
    pub fn reconstruct_page(&self, page: &Page, fonts: &FontTable) -> (RenderedPage, Diagnostics) {
        let mut rendered = RenderedPage::new(page.index, page.width, page.height);
        let mut diagnostics = Diagnostics::new();
        if page.is_failed() {
            return (rendered, diagnostics);
        }

        let fitter = Fitter::new(&self.options, &self.measurer, fonts, &self.resolver);
        let lanes = build_lanes(page);
        let obstacles = obstacles(page);

        let outputs: Vec<LaneOutput> = if self.options.parallel {
            lanes
                .par_iter()
                .map(|lane| self.layout_lane(&fitter, lane, &obstacles, page))
                .collect()
        } else {
            lanes
                .iter()
                .map(|lane| self.layout_lane(&fitter, lane, &obstacles, page))
                .collect()
        };

        // Background first, then covers, then text.
        let shifts: Vec<&TableShift> = outputs.iter().flat_map(|o| &o.tables).collect();
        for graphic in &page.graphics {
            let bbox = shift_graphic(&graphic.bbox, &shifts);
            rendered.ops.push(match graphic.kind {
                GraphicKind::Image => DrawOp::PlaceImage { bbox },
                GraphicKind::Path => DrawOp::DrawPath { bbox },
            });
        }
        for image in page.regions.iter().filter_map(|r| r.image()) {
            rendered.ops.push(DrawOp::PlaceImage { bbox: image.bbox });
        }

        let mut levels: BTreeMap<FitLevel, usize> = BTreeMap::new();
        let mut texts = Vec::new();
        for output in outputs {
            rendered.ops.extend(output.covers);
            texts.extend(output.texts);
            diagnostics.merge(output.diagnostics);
            for (level, count) in output.levels {
                *levels.entry(level).or_insert(0) += count;
            }
        }
        rendered.ops.extend(texts);

        debug!(
            "Page {}: {} draw ops, fit levels {:?}",
            page.index,
            rendered.ops.len(),
            levels
        );
        (rendered, diagnostics)
    }

    fn layout_lane(&self, fitter: &Fitter<'_, M>, lane: &Lane<'_>, obstacles: &[BBox], page: &Page) -> LaneOutput {
        let mut out = LaneOutput::new(page.index);
        let margin_line = page.height - self.options.bottom_margin;
        let page_limit = lane.limit.map_or(margin_line, |limit| limit.min(margin_line));
        let cover = lane.cover || self.options.cover_original;

        for segment in lane.items.split(|item| matches!(item, Item::Barrier(_))) {
            if segment.is_empty() {
                continue;
            }
            let limit = segment_limit(segment, obstacles, page_limit);
            self.layout_segment(fitter, segment, limit, 0.0, None, cover, &mut out);
        }
        out
    }

    /// Fit items top to bottom. Growth first fills the gap below an item,
    /// then pushes the following items down. Returns how far the bottom of
    /// the segment moved.
    #[allow(clippy::too_many_arguments)]
    fn layout_segment(
        &self,
        fitter: &Fitter<'_, M>,
        items: &[Item<'_>],
        limit: f32,
        dy: f32,
        span: Option<(f32, f32)>,
        cover: bool,
        out: &mut LaneOutput,
    ) -> f32 {
        let bottom = items.iter().map(|i| i.bbox().y1).fold(f32::MIN, f32::max) + dy;

        // Separation kept above each item once it is pushed.
        let separations: Vec<f32> = items
            .iter()
            .enumerate()
            .map(|(k, item)| match k.checked_sub(1).and_then(|p| items.get(p)) {
                Some(prev) => (item.bbox().y0 - prev.bbox().y1).min(MIN_BLOCK_GAP),
                None => 0.0,
            })
            .collect();
        // Height the items after each one need when packed tight.
        let mut below = vec![0.0_f32; items.len()];
        for k in (0..items.len().saturating_sub(1)).rev() {
            let next = &items[k + 1];
            below[k] = below[k + 1] + separations[k + 1] + next.bbox().height();
        }

        let mut cursor = f32::MIN;
        let mut lowest = bottom;
        for (k, item) in items.iter().enumerate() {
            let bbox = item.bbox();
            let shift = dy.max(cursor + separations[k] - bbox.y0);
            let budget = if self.options.allow_growth {
                (limit - below[k] - (bbox.y1 + shift)).max(0.0)
            } else {
                0.0
            };

            let grown = match item {
                Item::Block(block) => out.record(fitter.fit_block(block, shift, budget, span, cover)),
                Item::Table(table) => self.layout_table(fitter, table, shift, budget, cover, out),
                Item::Barrier(_) => 0.0,
            };
            cursor = bbox.y1 + shift + grown;
            lowest = lowest.max(cursor);
        }
        lowest - bottom
    }

    fn layout_table(
        &self,
        fitter: &Fitter<'_, M>,
        table: &Table,
        dy: f32,
        budget: f32,
        cover: bool,
        out: &mut LaneOutput,
    ) -> f32 {
        let rows = table.rows as usize;
        if rows == 0 {
            return 0.0;
        }
        let padding = self.options.cell_padding;
        let last_row = |cell: &Cell| ((cell.row + cell.rowspan).saturating_sub(1) as usize).min(rows - 1);

        // Dry run with unlimited room to find how much each row needs.
        let mut need = vec![0.0_f32; rows];
        if self.options.allow_growth && budget > 0.0 {
            for cell in table.cells.iter().filter(|c| !c.blocks.is_empty()) {
                let frame = cell.bbox.shift_y(dy).inset(padding);
                let items = cell_items(cell);
                let mut scratch = LaneOutput::new(out.page);
                let grown = self.layout_segment(
                    fitter,
                    &items,
                    f32::INFINITY,
                    dy,
                    Some((frame.x0, frame.x1)),
                    cover,
                    &mut scratch,
                );
                let content_bottom = items.iter().map(|i| i.bbox().y1).fold(f32::MIN, f32::max) + dy + grown;
                let row = last_row(cell);
                need[row] = need[row].max(content_bottom - frame.y1);
            }
        }

        let mut remaining = budget.max(0.0);
        let growth: Vec<f32> = need
            .iter()
            .map(|n| {
                let g = n.max(0.0).min(remaining);
                remaining -= g;
                g
            })
            .collect();
        let mut offsets = Vec::with_capacity(rows);
        let mut total = 0.0;
        for g in &growth {
            offsets.push(total);
            total += g;
        }

        for cell in table.cells.iter().filter(|c| !c.blocks.is_empty()) {
            let first = (cell.row as usize).min(rows - 1);
            let last = last_row(cell);
            let top = offsets[first];
            let frame = BBox::new(
                cell.bbox.x0,
                cell.bbox.y0 + dy + top,
                cell.bbox.x1,
                cell.bbox.y1 + dy + offsets[last] + growth[last],
            )
            .inset(padding);
            let items = cell_items(cell);
            self.layout_segment(fitter, &items, frame.y1, dy + top, Some((frame.x0, frame.x1)), cover, out);
        }

        out.tables.push(TableShift {
            bbox: table.bbox,
            dy,
            row_bottoms: table.row_edges().into_iter().skip(1).collect(),
            growth,
        });
        total
    }
}

fn cell_items(cell: &Cell) -> Vec<Item<'_>> {
    let mut items: Vec<Item> = cell.blocks.iter().map(Item::Block).collect();
    items.sort_by(|a, b| cmp_top_left(&a.bbox(), &b.bbox()));
    items
}

fn build_lanes(page: &Page) -> Vec<Lane<'_>> {
    let mut lanes: BTreeMap<LaneKey, Lane> = BTreeMap::new();

    for region in &page.regions {
        let flow = LaneKey::Flow {
            section: region.section,
            column: region.column,
        };
        match (&region.content, region.kind) {
            (_, RegionKind::HeaderFooter) => {
                lane(&mut lanes, LaneKey::Isolated(region.id))
                    .items
                    .extend(region.blocks().map(Item::Block));
            }
            (RegionContent::Blocks { blocks }, _) => {
                lane(&mut lanes, flow).items.extend(blocks.iter().map(Item::Block));
            }
            (RegionContent::Table { table }, _) => {
                lane(&mut lanes, flow).items.push(Item::Table(table));
            }
            (RegionContent::Image { image, blocks }, _) => {
                lane(&mut lanes, flow).items.push(Item::Barrier(image.bbox));
                if !blocks.is_empty() {
                    let isolated = lane(&mut lanes, LaneKey::Isolated(region.id));
                    isolated.items.extend(blocks.iter().map(Item::Block));
                    isolated.cover = true;
                    isolated.limit = Some(image.bbox.y1);
                }
            }
        }
    }

    lanes
        .into_values()
        .map(|mut lane| {
            lane.items.sort_by(|a, b| cmp_top_left(&a.bbox(), &b.bbox()));
            lane
        })
        .collect()
}

fn lane<'m, 'a>(lanes: &'m mut BTreeMap<LaneKey, Lane<'a>>, key: LaneKey) -> &'m mut Lane<'a> {
    lanes.entry(key).or_insert_with(|| Lane {
        items: Vec::new(),
        cover: false,
        limit: None,
    })
}

/// Everything growing text must not run into.
fn obstacles(page: &Page) -> Vec<BBox> {
    let tables: Vec<BBox> = page
        .regions
        .iter()
        .filter_map(|r| r.table())
        .map(|t| t.bbox.expand(RULE_SNAP))
        .collect();

    let mut boxes = Vec::new();
    for region in &page.regions {
        match &region.content {
            RegionContent::Blocks { blocks } => boxes.extend(blocks.iter().map(|b| b.bbox)),
            RegionContent::Table { table } => boxes.push(table.bbox),
            RegionContent::Image { image, .. } => boxes.push(image.bbox),
        }
    }
    boxes.extend(
        page.graphics
            .iter()
            .map(|g| g.bbox)
            .filter(|g| !tables.iter().any(|t| t.contains(g, 0.0))),
    );
    boxes
}

/// Lowest line a segment may grow to.
fn segment_limit(items: &[Item<'_>], obstacles: &[BBox], page_limit: f32) -> f32 {
    let boxes: Vec<BBox> = items.iter().map(Item::bbox).collect();
    let Some(extent) = BBox::union_all(&boxes) else {
        return page_limit;
    };
    obstacles
        .iter()
        .filter(|o| o.y0 >= extent.y1 + SEGMENT_GAP && o.horizontal_overlap(&extent) > 0.0)
        .map(|o| o.y0)
        .fold(page_limit, f32::min)
}

fn shift_graphic(bbox: &BBox, shifts: &[&TableShift]) -> BBox {
    match shifts.iter().find(|s| s.bbox.expand(RULE_SNAP).contains(bbox, 0.0)) {
        Some(shift) => BBox::new(
            bbox.x0,
            bbox.y0 + shift.offset_at(bbox.y0),
            bbox.x1,
            bbox.y1 + shift.offset_at(bbox.y1),
        ),
        None => *bbox,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        BlockId, FontDescriptor, FontId, Graphic, ImageRef, Line, Region, Run, RunId, SemanticTag, TranslationState,
    };

    /// A block of one-run lines at `(x, y)`, 10pt text in 12pt line boxes.
    fn para(id: u32, first_run: u32, x: f32, y: f32, lines: &[&str]) -> Block {
        let lines: Vec<Line> = lines
            .iter()
            .enumerate()
            .map(|(i, text)| {
                let top = y + i as f32 * 14.0;
                let bbox = BBox::new(x, top, x + text.chars().count() as f32 * 5.0, top + 12.0);
                Line::new(
                    top + 10.0,
                    bbox,
                    vec![Run::new(RunId(first_run + i as u32), *text, FontId(0), bbox)],
                )
            })
            .collect();
        let bbox = BBox::union_all(lines.iter().map(|l| &l.bbox)).unwrap_or_default();
        Block::new(BlockId(id), bbox, FontId(0), SemanticTag::Body, lines)
    }

    fn text_region(id: u32, column: u16, blocks: Vec<Block>) -> Region {
        let bbox = BBox::union_all(blocks.iter().map(|b| &b.bbox)).unwrap_or_default();
        Region::new(RegionId(id), RegionKind::SingleColumn, bbox, RegionContent::Blocks { blocks }).in_flow(0, column)
    }

    fn fonts() -> FontTable {
        let mut fonts = FontTable::new();
        fonts.intern(&FontDescriptor::new("Helvetica", 10.0));
        fonts
    }

    fn translate(page: &mut Page, run: u32, text: &str) {
        if let Some(run) = page.run_mut(RunId(run)) {
            run.translation = TranslationState::Translated { text: text.to_string() };
        }
    }

    fn baseline_of(rendered: &RenderedPage, block: u32) -> Vec<f32> {
        rendered
            .ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::PlaceText { baseline, block: b, .. } if b.0 == block => Some(*baseline),
                _ => None,
            })
            .collect()
    }

    const LONG: &str = "word word word word word word word word word word";

    #[test]
    fn test_untranslated_page_places_every_run() {
        let mut page = Page::letter(0);
        page.regions.push(text_region(
            0,
            0,
            vec![para(0, 0, 50.0, 100.0, &["first", "second"]), para(1, 2, 50.0, 150.0, &["third"])],
        ));

        let (rendered, diagnostics) = Reconstructor::default().reconstruct_page(&page, &fonts());
        assert!(diagnostics.is_empty());
        assert_eq!(rendered.texts().count(), 3);
        assert_eq!(baseline_of(&rendered, 0), vec![110.0, 124.0]);
        assert_eq!(baseline_of(&rendered, 1), vec![160.0]);
    }

    #[test]
    fn test_growth_pushes_following_blocks() {
        let mut page = Page::letter(0);
        page.regions.push(text_region(
            0,
            0,
            vec![para(0, 0, 50.0, 100.0, &["word word"]), para(1, 1, 50.0, 120.0, &["other text"])],
        ));
        translate(&mut page, 0, LONG);

        let (rendered, diagnostics) = Reconstructor::default().reconstruct_page(&page, &fonts());
        assert!(diagnostics.is_empty());

        // Grown by 30pt: the 8pt gap shrinks to 2pt and the rest pushes.
        let first = baseline_of(&rendered, 0);
        let second = baseline_of(&rendered, 1);
        assert!(first.len() > 1);
        assert!((second[0] - 154.0).abs() < 0.01);
        assert!(first.iter().all(|b| *b < second[0]));
    }

    #[test]
    fn test_growth_fills_gap_before_pushing() {
        let mut page = Page::letter(0);
        page.regions.push(text_region(
            0,
            0,
            vec![para(0, 0, 50.0, 100.0, &["word word"]), para(1, 1, 50.0, 200.0, &["other text"])],
        ));
        translate(&mut page, 0, LONG);

        let (rendered, diagnostics) = Reconstructor::default().reconstruct_page(&page, &fonts());
        assert!(diagnostics.is_empty());
        assert!(baseline_of(&rendered, 0).len() > 1);
        assert_eq!(baseline_of(&rendered, 1), vec![210.0]);
    }

    #[test]
    fn test_growth_budget_leaves_room_for_following_blocks() {
        let mut page = Page::letter(0);
        page.regions.push(text_region(
            0,
            0,
            vec![para(0, 0, 50.0, 100.0, &["word word"]), para(1, 1, 50.0, 120.0, &["other text"])],
        ));
        let image = BBox::new(40.0, 150.0, 300.0, 300.0);
        page.regions.push(Region::new(
            RegionId(1),
            RegionKind::Image,
            image,
            RegionContent::Image {
                image: ImageRef::new(image, false),
                blocks: Vec::new(),
            },
        ));
        translate(&mut page, 0, LONG);

        let (rendered, diagnostics) = Reconstructor::default().reconstruct_page(&page, &fonts());
        // Only 24pt can be freed above the image, less than the 30pt needed.
        assert_eq!(diagnostics.count(DiagnosticKind::LayoutOverflow), 1);
        let second = baseline_of(&rendered, 1);
        assert!(second[0] + 2.0 <= 150.0);
    }

    #[test]
    fn test_columns_grow_independently() {
        let mut page = Page::letter(0);
        page.regions
            .push(text_region(0, 0, vec![para(0, 0, 50.0, 100.0, &["word word"])]));
        page.regions.push(text_region(
            1,
            1,
            vec![para(1, 1, 320.0, 100.0, &["right"]), para(2, 2, 320.0, 120.0, &["below"])],
        ));
        translate(&mut page, 0, LONG);

        let (rendered, _) = Reconstructor::default().reconstruct_page(&page, &fonts());
        assert_eq!(baseline_of(&rendered, 1), vec![110.0]);
        assert_eq!(baseline_of(&rendered, 2), vec![130.0]);
    }

    #[test]
    fn test_growth_stops_at_image() {
        let mut page = Page::letter(0);
        page.regions
            .push(text_region(0, 0, vec![para(0, 0, 50.0, 100.0, &["word word"])]));
        let image = BBox::new(40.0, 120.0, 300.0, 300.0);
        page.regions.push(Region::new(
            RegionId(1),
            RegionKind::Image,
            image,
            RegionContent::Image {
                image: ImageRef::new(image, true),
                blocks: Vec::new(),
            },
        ));
        translate(&mut page, 0, LONG);

        let (rendered, diagnostics) = Reconstructor::default().reconstruct_page(&page, &fonts());
        assert_eq!(diagnostics.count(DiagnosticKind::LayoutOverflow), 1);
        assert!(baseline_of(&rendered, 0).iter().all(|b| *b < 120.0));
        assert!(rendered.plain_text().contains('…'));
        assert!(matches!(rendered.ops[0], DrawOp::PlaceImage { .. }));
    }

    #[test]
    fn test_failed_page_renders_empty() {
        let page = Page::failed(3, 612.0, 792.0, "bad stream");
        let (rendered, diagnostics) = Reconstructor::default().reconstruct_page(&page, &fonts());
        assert_eq!(rendered.index, 3);
        assert!(rendered.ops.is_empty());
        assert!(diagnostics.is_empty());
    }

    fn table_page() -> Page {
        let mut table = Table::from_edges(&[50.0, 150.0, 250.0], &[100.0, 120.0, 140.0], true);
        let mut first = Cell::new(0, 0, 1, 1, BBox::new(50.0, 100.0, 150.0, 120.0));
        first.blocks.push(para(0, 0, 52.0, 104.0, &["Total"]));
        let mut second = Cell::new(1, 0, 1, 1, BBox::new(50.0, 120.0, 150.0, 140.0));
        second.blocks.push(para(1, 1, 52.0, 122.0, &["Next"]));
        table.cells.push(first);
        table.cells.push(Cell::new(0, 1, 1, 1, BBox::new(150.0, 100.0, 250.0, 120.0)));
        table.cells.push(second);
        table.cells.push(Cell::new(1, 1, 1, 1, BBox::new(150.0, 120.0, 250.0, 140.0)));

        let mut page = Page::letter(0);
        page.regions.push(Region::new(
            RegionId(0),
            RegionKind::Table,
            table.bbox,
            RegionContent::Table { table },
        ));
        for y in [100.0, 120.0, 140.0] {
            page.graphics
                .push(Graphic::new(GraphicKind::Path, BBox::new(50.0, y - 0.25, 250.0, y + 0.25)));
        }
        page
    }

    fn rule_tops(rendered: &RenderedPage) -> Vec<f32> {
        rendered
            .ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::DrawPath { bbox } => Some(bbox.y0),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_table_row_grows_with_rules() {
        let mut page = table_page();
        translate(&mut page, 0, "This is a much longer cell value");

        let (rendered, diagnostics) = Reconstructor::default().reconstruct_page(&page, &fonts());
        assert!(diagnostics.is_empty());

        let rules = rule_tops(&rendered);
        assert_eq!(rules[0], 99.75);
        let grown = rules[1] - 119.75;
        assert!(grown > 0.0);
        assert!((rules[2] - 139.75 - grown).abs() < 0.01);

        let next = baseline_of(&rendered, 1);
        assert!((next[0] - 132.0 - grown).abs() < 0.01);

        // Column geometry is fixed.
        for op in rendered.texts() {
            if let DrawOp::PlaceText { x, .. } = op {
                assert_eq!(*x, 52.0);
            }
        }
    }

    #[test]
    fn test_untouched_table_is_unchanged() {
        let page = table_page();
        let (rendered, _) = Reconstructor::default().reconstruct_page(&page, &fonts());
        assert_eq!(rule_tops(&rendered), vec![99.75, 119.75, 139.75]);
        assert_eq!(baseline_of(&rendered, 1), vec![132.0]);
    }

    #[test]
    fn test_image_text_is_covered() {
        let mut page = Page::letter(0);
        let image = BBox::new(100.0, 100.0, 300.0, 200.0);
        page.regions.push(Region::new(
            RegionId(0),
            RegionKind::Image,
            image,
            RegionContent::Image {
                image: ImageRef::new(image, true),
                blocks: vec![para(0, 0, 120.0, 120.0, &["Label"])],
            },
        ));
        translate(&mut page, 0, "Marca");

        let (rendered, _) = Reconstructor::default().reconstruct_page(&page, &fonts());
        let kinds: Vec<&str> = rendered
            .ops
            .iter()
            .map(|op| match op {
                DrawOp::PlaceImage { .. } => "image",
                DrawOp::FillRect { .. } => "cover",
                DrawOp::PlaceText { .. } => "text",
                DrawOp::DrawPath { .. } => "path",
            })
            .collect();
        assert_eq!(kinds, vec!["image", "cover", "text"]);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let mut doc = Document::new();
        doc.fonts = fonts();
        for index in 0..4 {
            let mut page = Page::letter(index);
            page.regions.push(text_region(
                0,
                0,
                vec![para(0, 0, 50.0, 100.0, &["word word"]), para(1, 1, 50.0, 130.0, &["tail"])],
            ));
            page.regions
                .push(text_region(1, 1, vec![para(2, 2, 320.0, 100.0, &["OK"])]));
            translate(&mut page, 0, LONG);
            translate(&mut page, 2, "Everything is fine here");
            doc.add_page(page);
        }

        let parallel = Reconstructor::default().reconstruct(&doc);
        let sequential = Reconstructor::new(ReconstructOptions::default().sequential()).reconstruct(&doc);
        assert_eq!(parallel, sequential);
        assert_eq!(parallel.0.len(), 4);
    }
}
