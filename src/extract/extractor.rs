//! Document extraction from a page source.
//!
//! Extraction runs in two passes. The first decodes and normalizes every
//! selected page and collects document-wide font statistics; the second
//! builds each page independently (tables, blocks, header/footer, columns,
//! regions, reading order). Pages are processed in parallel and merged by
//! page index, so the result does not depend on completion order.

use std::collections::BTreeMap;

use rayon::prelude::*;

use super::columns::{ColumnResolver, Placement};
use super::options::{ErrorMode, ExtractOptions};
use super::primitive::{normalize_page, Glyph, NormalizedPage, PageSource};
use super::segment::{FontStatistics, PageIds, Segmenter};
use super::table_detector::{assign_glyphs, TableDetector};
use crate::error::{DecodeError, Result};
use crate::model::{
    cmp_top_left, BBox, Block, DiagnosticKind, Diagnostics, Document, FontId, FontTable, Graphic,
    GraphicKind, ImageRef, Metadata, OrderRef, Page, ReadingOrder, Region, RegionContent,
    RegionKind, Scope, SemanticTag, Table,
};

/// Images covering at least this fraction of the page, with text on top,
/// are backdrops rather than image regions.
const BACKDROP_AREA_RATIO: f32 = 0.5;

/// An extracted document with the problems met on the way.
#[derive(Debug, Clone)]
pub struct Extraction {
    pub document: Document,
    pub diagnostics: Diagnostics,
}

/// A page item placed by the column resolver.
enum Item {
    Text(Block),
    Table(Table),
    Image(ImageRef, Vec<Block>),
}

impl Item {
    fn bbox(&self) -> BBox {
        match self {
            Item::Text(block) => block.bbox,
            Item::Table(table) => table.bbox,
            Item::Image(image, _) => image.bbox,
        }
    }
}

/// Builds a [`Document`] from page primitives.
pub struct Extractor {
    options: ExtractOptions,
    detector: TableDetector,
}

impl Extractor {
    pub fn new(options: ExtractOptions) -> Self {
        let detector = TableDetector::with_config(options.tables.clone());
        Self { options, detector }
    }

    pub fn options(&self) -> &ExtractOptions {
        &self.options
    }

    /// Extract every selected page of a source.
    ///
    /// Undecodable pages become empty pages flagged with the error, unless
    /// the error mode is strict.
    pub fn extract<S: PageSource + ?Sized>(&self, source: &S) -> Result<Extraction> {
        let indices: Vec<u32> = (0..source.page_count())
            .filter(|i| self.options.pages.includes(i + 1))
            .collect();
        log::debug!("Extracting {} of {} pages", indices.len(), source.page_count());

        let decode = |index: u32| {
            let page = source
                .get_primitives(index)
                .map(|raw| normalize_page(raw, &self.options.default_font));
            (index, page)
        };
        let decoded: Vec<(u32, std::result::Result<NormalizedPage, DecodeError>)> =
            if self.options.parallel {
                indices.par_iter().map(|&i| decode(i)).collect()
            } else {
                indices.iter().map(|&i| decode(i)).collect()
            };

        let mut stats = FontStatistics::new();
        for page in decoded.iter().filter_map(|(_, p)| p.as_ref().ok()) {
            stats.add_page(page);
        }
        stats.analyze();
        log::debug!(
            "Body size {:.1}pt, heading sizes {:?}",
            stats.body_size(),
            stats.heading_sizes()
        );

        let mut diagnostics = Diagnostics::new();
        let mut pages: BTreeMap<u32, Page> = BTreeMap::new();
        let mut normalized = Vec::with_capacity(decoded.len());

        for (index, page) in decoded {
            match page {
                Ok(page) => normalized.push(page),
                Err(e) => {
                    if self.options.error_mode == ErrorMode::Strict {
                        return Err(e.into());
                    }
                    let (width, height) = source.page_size(index).unwrap_or((612.0, 792.0));
                    diagnostics.report(
                        DiagnosticKind::DecodeError,
                        Scope::Page { page: index },
                        e.message.clone(),
                    );
                    pages.insert(index, Page::failed(index, width, height, e.message));
                }
            }
        }

        let built: BTreeMap<u32, (Page, FontTable)> = if self.options.parallel {
            let (tx, rx) = crossbeam_channel::unbounded();
            normalized.into_par_iter().for_each_with(tx, |tx, page| {
                let index = page.index;
                // The receiver outlives every sender.
                let _ = tx.send((index, self.extract_page(page, &stats)));
            });
            rx.into_iter().collect()
        } else {
            normalized
                .into_iter()
                .map(|page| (page.index, self.extract_page(page, &stats)))
                .collect()
        };

        // Fonts are interned in page order so ids do not depend on scheduling.
        let mut document = Document::new();
        for (index, (mut page, local)) in built {
            remap_fonts(&mut page, &local, &mut document.fonts);
            pages.insert(index, page);
        }
        document.pages = pages.into_values().collect();

        document.metadata = match source.source_path() {
            Some(path) => Metadata::for_source(path),
            None => Metadata::default(),
        };
        document.metadata.extracted_at = Some(chrono::Utc::now());
        document.metadata.title = document
            .pages
            .iter()
            .flat_map(|p| p.ordered_blocks())
            .find(|b| matches!(b.tag, SemanticTag::Heading { level: 1 }))
            .map(|b| b.text());

        log::info!(
            "Extracted {} pages ({} failed)",
            document.page_count(),
            document.page_count() - document.successful_page_count()
        );

        Ok(Extraction {
            document,
            diagnostics,
        })
    }

    /// Build one page. Font ids refer to the returned page-local table.
    pub fn extract_page(&self, page: NormalizedPage, stats: &FontStatistics) -> (Page, FontTable) {
        let mut fonts = FontTable::new();
        let mut ids = PageIds::new();
        let segmenter = Segmenter::new(&self.options.segment, stats);
        let mut out = Page::new(page.index, page.width, page.height);

        let NormalizedPage {
            index,
            width,
            height,
            glyphs,
            images,
            paths,
        } = page;

        let (image_refs, graphics) = self.classify_images(&images, &glyphs, width * height);
        out.graphics = graphics;
        out.graphics
            .extend(paths.iter().map(|p| Graphic::new(GraphicKind::Path, *p)));

        let mut glyphs: Vec<Glyph> = glyphs;
        let mut tables = Vec::new();

        if self.options.detect_tables {
            for mut table in self.detector.detect_ruled(&paths) {
                let (cell_glyphs, rest) = assign_glyphs(&table, glyphs);
                glyphs = rest;
                for (cell, cell_glyphs) in table.cells.iter_mut().zip(cell_glyphs) {
                    cell.blocks = segmenter.segment(&cell_glyphs, &mut ids, &mut fonts);
                }
                tables.push(table);
            }
        }

        let mut lines = segmenter.build_lines(&glyphs);
        if self.options.detect_tables {
            let (aligned, rest) = self.detector.detect_aligned(lines);
            lines = rest;
            for detected in aligned {
                let mut table = detected.table;
                for (cell, cell_lines) in table.cells.iter_mut().zip(detected.cell_lines) {
                    cell.blocks = segmenter.build_blocks(cell_lines, &mut ids, &mut fonts);
                }
                tables.push(table);
            }
        }
        let blocks = segmenter.build_blocks(lines, &mut ids, &mut fonts);

        // Running headers and footers.
        let band = self.options.header_footer_band * height;
        let mut headers = Vec::new();
        let mut footers = Vec::new();
        let mut flow = Vec::new();
        for block in blocks {
            if band > 0.0 && block.lines.len() == 1 {
                if block.bbox.y1 <= band {
                    headers.push(block);
                    continue;
                }
                if block.bbox.y0 >= height - band {
                    footers.push(block);
                    continue;
                }
            }
            flow.push(block);
        }

        // Text inside an image region belongs to the image.
        let mut image_items: Vec<(ImageRef, Vec<Block>)> =
            image_refs.into_iter().map(|image| (image, Vec::new())).collect();
        let mut items = Vec::new();
        for block in flow {
            match image_items
                .iter_mut()
                .find(|(image, _)| image.bbox.contains(&block.bbox, 1.0))
            {
                Some((_, inside)) => inside.push(block),
                None => items.push(Item::Text(block)),
            }
        }
        items.extend(tables.into_iter().map(Item::Table));
        items.extend(
            image_items
                .into_iter()
                .map(|(image, blocks)| Item::Image(image, blocks)),
        );

        let (regions, order) = self.assemble(items, headers, footers, &mut ids);
        out.regions = regions;
        out.reading_order = order;

        log::debug!(
            "Page {}: {} regions, {} ordered items, {} fonts",
            index,
            out.regions.len(),
            out.reading_order.len(),
            fonts.len()
        );
        (out, fonts)
    }

    /// Split images into regions and decorative graphics.
    fn classify_images(
        &self,
        images: &[BBox],
        glyphs: &[Glyph],
        page_area: f32,
    ) -> (Vec<ImageRef>, Vec<Graphic>) {
        let min = self.options.min_image_size;
        let mut regions = Vec::new();
        let mut graphics = Vec::new();

        for bbox in images {
            let glyph_free = !glyphs.iter().any(|g| g.bbox.intersects(bbox));
            let small = bbox.width() < min || bbox.height() < min;
            let backdrop = !glyph_free && bbox.area() >= BACKDROP_AREA_RATIO * page_area;
            if small || backdrop {
                graphics.push(Graphic::new(GraphicKind::Image, *bbox));
            } else {
                regions.push(ImageRef::new(*bbox, glyph_free));
            }
        }

        (regions, graphics)
    }

    /// Group items into regions and build the reading order.
    fn assemble(
        &self,
        items: Vec<Item>,
        mut headers: Vec<Block>,
        mut footers: Vec<Block>,
        ids: &mut PageIds,
    ) -> (Vec<Region>, ReadingOrder) {
        let boxes: Vec<BBox> = items.iter().map(Item::bbox).collect();
        let layout = ColumnResolver::new(&self.options.columns).resolve(&boxes);

        let mut regions = Vec::new();
        let mut order = ReadingOrder::new();

        if !headers.is_empty() {
            headers.sort_by(|a, b| cmp_top_left(&a.bbox, &b.bbox));
            order.extend(headers.iter().map(|b| OrderRef::Block(b.id)));
            regions.push(band_region(ids, headers));
        }

        let mut slots: Vec<Option<Item>> = items.into_iter().map(Some).collect();
        let mut current: Option<(Placement, Vec<Block>)> = None;

        for &i in &layout.order {
            let Some(item) = slots[i].take() else {
                continue;
            };
            let place = layout.placements[i];

            if let Item::Text(block) = item {
                order.push(OrderRef::Block(block.id));
                match &mut current {
                    Some((p, blocks)) if *p == place => blocks.push(block),
                    _ => {
                        if let Some((p, blocks)) = current.take() {
                            regions.push(text_region(ids, p, blocks, layout.is_multi_column(p.section)));
                        }
                        current = Some((place, vec![block]));
                    }
                }
                continue;
            }

            if let Some((p, blocks)) = current.take() {
                regions.push(text_region(ids, p, blocks, layout.is_multi_column(p.section)));
            }
            let id = ids.region();
            order.push(OrderRef::Region(id));
            let region = match item {
                Item::Table(table) => {
                    Region::new(id, RegionKind::Table, table.bbox, RegionContent::Table { table })
                }
                Item::Image(image, blocks) => Region::new(
                    id,
                    RegionKind::Image,
                    image.bbox,
                    RegionContent::Image { image, blocks },
                ),
                Item::Text(_) => continue,
            };
            regions.push(region.in_flow(place.section, place.column));
        }
        if let Some((p, blocks)) = current.take() {
            regions.push(text_region(ids, p, blocks, layout.is_multi_column(p.section)));
        }

        if !footers.is_empty() {
            footers.sort_by(|a, b| cmp_top_left(&a.bbox, &b.bbox));
            order.extend(footers.iter().map(|b| OrderRef::Block(b.id)));
            regions.push(band_region(ids, footers));
        }

        regions.sort_by(|a, b| cmp_top_left(&a.bbox, &b.bbox).then(a.id.cmp(&b.id)));
        (regions, order)
    }
}

impl Default for Extractor {
    fn default() -> Self {
        Self::new(ExtractOptions::default())
    }
}

fn text_region(ids: &mut PageIds, place: Placement, blocks: Vec<Block>, multi_column: bool) -> Region {
    let kind = if multi_column {
        RegionKind::MultiColumn
    } else {
        RegionKind::SingleColumn
    };
    let bbox = BBox::union_all(blocks.iter().map(|b| &b.bbox)).unwrap_or_default();
    Region::new(ids.region(), kind, bbox, RegionContent::Blocks { blocks })
        .in_flow(place.section, place.column)
}

fn band_region(ids: &mut PageIds, blocks: Vec<Block>) -> Region {
    let bbox = BBox::union_all(blocks.iter().map(|b| &b.bbox)).unwrap_or_default();
    Region::new(
        ids.region(),
        RegionKind::HeaderFooter,
        bbox,
        RegionContent::Blocks { blocks },
    )
}

/// Rewrite page-local font ids into the document font table.
fn remap_fonts(page: &mut Page, local: &FontTable, fonts: &mut FontTable) {
    let map: Vec<FontId> = local.iter().map(|(_, font)| fonts.intern(font)).collect();
    let lookup = |id: FontId| map.get(id.0 as usize).copied().unwrap_or(id);

    for region in &mut page.regions {
        for block in region.blocks_mut() {
            block.font = lookup(block.font);
            for run in block.runs_mut() {
                run.font = lookup(run.font);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::primitive::{MemorySource, Primitive, RawPage};
    use crate::model::FontDescriptor;

    fn text(raw: RawPage, words: &[&str], x: f32, y: f32, size: f32) -> RawPage {
        let mut raw = raw;
        let mut pos = x;
        for w in words {
            let width = w.chars().count() as f32 * size * 0.5;
            raw.push(Primitive::glyph(
                *w,
                BBox::new(pos, y, pos + width, y + size * 1.2),
                FontDescriptor::new("Helvetica", size),
            ));
            pos += width + 3.0;
        }
        raw
    }

    fn paragraph(mut raw: RawPage, x: f32, y: f32, lines: usize) -> RawPage {
        for i in 0..lines {
            raw = text(
                raw,
                &["column", "text", "that", "wraps", "over", "lines", "here"],
                x,
                y + i as f32 * 13.0,
                10.0,
            );
        }
        raw
    }

    #[test]
    fn test_empty_page_is_not_an_error() {
        let source = MemorySource::new(vec![RawPage::new(0, 612.0, 792.0)]);
        let extraction = Extractor::default().extract(&source).unwrap();
        assert_eq!(extraction.document.page_count(), 1);
        assert!(extraction.document.pages[0].regions.is_empty());
        assert!(extraction.diagnostics.is_empty());
    }

    #[test]
    fn test_decode_failure_becomes_flagged_page() {
        let page = text(RawPage::new(0, 612.0, 792.0), &["Hello"], 72.0, 100.0, 10.0);
        let source = MemorySource::new(vec![page]).with_failure(1, "broken content stream");

        let extraction = Extractor::default().extract(&source).unwrap();
        let doc = &extraction.document;
        assert_eq!(doc.page_count(), 2);
        assert!(!doc.pages[0].is_failed());
        assert_eq!(doc.pages[1].error.as_deref(), Some("broken content stream"));
        assert_eq!(extraction.diagnostics.count(DiagnosticKind::DecodeError), 1);
    }

    #[test]
    fn test_strict_mode_fails_on_decode_error() {
        let source = MemorySource::new(vec![RawPage::new(0, 612.0, 792.0)]).with_failure(1, "bad");
        let result = Extractor::new(ExtractOptions::new().strict()).extract(&source);
        assert!(matches!(result, Err(crate::Error::Decode(_))));
    }

    #[test]
    fn test_header_and_footer_bands() {
        let mut raw = text(RawPage::new(0, 612.0, 792.0), &["Manual", "v2"], 72.0, 20.0, 8.0);
        raw = paragraph(raw, 72.0, 200.0, 3);
        raw = text(raw, &["Page", "1"], 290.0, 770.0, 8.0);

        let doc = Extractor::default()
            .extract(&MemorySource::new(vec![raw]))
            .unwrap()
            .document;
        let page = &doc.pages[0];
        let kinds: Vec<RegionKind> = page.regions.iter().map(|r| r.kind).collect();
        assert_eq!(
            kinds,
            vec![RegionKind::HeaderFooter, RegionKind::SingleColumn, RegionKind::HeaderFooter]
        );

        let ordered: Vec<String> = page.ordered_blocks().iter().map(|b| b.text()).collect();
        assert_eq!(ordered.first().map(String::as_str), Some("Manual v2"));
        assert_eq!(ordered.last().map(String::as_str), Some("Page 1"));
    }

    #[test]
    fn test_glyph_free_image_becomes_region() {
        let mut raw = paragraph(RawPage::new(0, 612.0, 792.0), 72.0, 100.0, 2);
        raw.push(Primitive::image(BBox::new(72.0, 200.0, 300.0, 400.0)));
        raw.push(Primitive::image(BBox::new(500.0, 500.0, 510.0, 510.0)));

        let doc = Extractor::default()
            .extract(&MemorySource::new(vec![raw]))
            .unwrap()
            .document;
        let page = &doc.pages[0];
        let image = page
            .regions
            .iter()
            .find(|r| r.kind == RegionKind::Image)
            .unwrap();
        assert!(image.needs_ocr());
        assert_eq!(page.graphics.len(), 1);
        assert!(page
            .reading_order
            .iter()
            .any(|r| *r == OrderRef::Region(image.id)));
    }

    #[test]
    fn test_fonts_are_shared_across_pages() {
        let pages = (0..3)
            .map(|i| paragraph(RawPage::new(i, 612.0, 792.0), 72.0, 100.0, 2))
            .collect();
        let doc = Extractor::default()
            .extract(&MemorySource::new(pages))
            .unwrap()
            .document;
        assert_eq!(doc.fonts.len(), 1);
        for page in &doc.pages {
            assert!(page.runs().all(|r| r.font == FontId(0)));
        }
    }

    #[test]
    fn test_parallel_and_sequential_agree() {
        let pages: Vec<RawPage> = (0..6)
            .map(|i| {
                let raw = paragraph(RawPage::new(i, 612.0, 792.0), 50.0, 100.0, 4);
                paragraph(raw, 320.0, 100.0, 4)
            })
            .collect();
        let source = MemorySource::new(pages);

        let parallel = Extractor::default().extract(&source).unwrap().document;
        let sequential = Extractor::new(ExtractOptions::new().sequential())
            .extract(&source)
            .unwrap()
            .document;
        assert_eq!(parallel.pages, sequential.pages);
        assert_eq!(parallel.fonts, sequential.fonts);
    }

    #[test]
    fn test_page_selection() {
        let pages = (0..4)
            .map(|i| paragraph(RawPage::new(i, 612.0, 792.0), 72.0, 100.0, 1))
            .collect();
        let options = ExtractOptions::new().with_pages(crate::extract::PageSelection::Pages(vec![2, 4]));
        let doc = Extractor::new(options)
            .extract(&MemorySource::new(pages))
            .unwrap()
            .document;
        let indices: Vec<u32> = doc.pages.iter().map(|p| p.index).collect();
        assert_eq!(indices, vec![1, 3]);
    }
}
