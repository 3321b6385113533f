//! The fitting ladder for one block.
//!
//! Levels, tried in order until one fits:
//!
//! 0. every run in its original box at its original size
//! 1. runs shrink in steps down to the font floor
//! 2. the block reflows at full size inside its frame
//! 3. the whole block scales uniformly down to the floor
//! 4. the block grows into the whitespace below it, or is truncated with a
//!    visible marker
//!
//! Widths are measured relative to the original text: the measured width of
//! a run's original text is calibrated to its original box, so untranslated
//! text always fits in place.

use serde::{Deserialize, Serialize};

use super::fonts::FontResolver;
use super::measure::{split_words, wrap, TextMeasurer, Word, WrappedLine};
use super::ops::{DrawOp, TextAlign};
use super::options::ReconstructOptions;
use crate::model::{is_spaceless_script_char, BBox, Block, FontDescriptor, FontId, FontTable, Run, RunId};

/// Slack allowed when comparing measured text with a frame (points).
pub const FIT_TOLERANCE: f32 = 0.5;

const COVER_COLOR: u32 = 0xFFFFFF;

/// How a block was fitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FitLevel {
    InPlace,
    Shrunk,
    Reflowed,
    Scaled,
    Grown,
    Truncated,
}

/// A run whose text could not be shown completely.
#[derive(Debug, Clone, PartialEq)]
pub struct Overflow {
    pub run: RunId,
    pub message: String,
}

/// Result of fitting one block.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockFit {
    pub level: FitLevel,
    pub ops: Vec<DrawOp>,
    pub covers: Vec<DrawOp>,
    /// Height added below the original frame
    pub grown: f32,
    pub overflows: Vec<Overflow>,
}

/// Largest scale from `steps` at which `measure(scale)` fits `available`.
///
/// Returns the last step and `false` when none fits. Widths must grow
/// with the scale.
pub fn shrink_to_fit(steps: &[f32], available: f32, measure: impl Fn(f32) -> f32) -> (f32, bool) {
    for &scale in steps {
        if measure(scale) <= available {
            return (scale, true);
        }
    }
    (steps.last().copied().unwrap_or(1.0), false)
}

/// Check if text reads right to left.
pub fn is_rtl(text: &str) -> bool {
    let info = unicode_bidi::BidiInfo::new(text, None);
    info.paragraphs.first().is_some_and(|p| p.level.is_rtl())
}

/// Vertical metrics of a block, in points at full size.
struct BlockMetrics {
    ascent: f32,
    pitch: f32,
    descent: f32,
}

impl BlockMetrics {
    fn height(&self, lines: usize, scale: f32) -> f32 {
        let extra_lines = lines.saturating_sub(1) as f32;
        scale * (self.ascent + extra_lines * self.pitch + self.descent)
    }

    /// Most lines that fit in `height`, at least one.
    fn lines_within(&self, height: f32, scale: f32) -> usize {
        let mut n = 1;
        while self.height(n + 1, scale) <= height + FIT_TOLERANCE {
            n += 1;
        }
        n
    }
}

/// Shared state for fitting the blocks of one page.
pub struct Fitter<'a, M: TextMeasurer + ?Sized> {
    options: &'a ReconstructOptions,
    measurer: &'a M,
    fonts: &'a FontTable,
    resolver: &'a FontResolver,
    fallback: FontDescriptor,
    steps: Vec<f32>,
}

impl<'a, M: TextMeasurer + ?Sized> Fitter<'a, M> {
    pub fn new(
        options: &'a ReconstructOptions,
        measurer: &'a M,
        fonts: &'a FontTable,
        resolver: &'a FontResolver,
    ) -> Self {
        Self {
            options,
            measurer,
            fonts,
            resolver,
            fallback: FontDescriptor::new("Helvetica", 10.0),
            steps: options.scale_steps(),
        }
    }

    pub fn options(&self) -> &ReconstructOptions {
        self.options
    }

    fn font(&self, id: FontId) -> &FontDescriptor {
        self.fonts.get(id).unwrap_or(&self.fallback)
    }

    fn calibration(&self, run: &Run, font: &FontDescriptor) -> f32 {
        let measured = self.measurer.width(&run.text, font, font.size);
        if measured > 0.0 && run.bbox.width() > 0.0 {
            (run.bbox.width() / measured).clamp(0.5, 2.0)
        } else {
            1.0
        }
    }

    fn block_calibration(&self, block: &Block) -> f32 {
        let (boxes, measured) = block.runs().fold((0.0, 0.0), |(b, m), run| {
            let font = self.font(run.font);
            (b + run.bbox.width(), m + self.measurer.width(&run.text, font, font.size))
        });
        if measured > 0.0 && boxes > 0.0 {
            (boxes / measured).clamp(0.5, 2.0)
        } else {
            1.0
        }
    }

    fn metrics(&self, block: &Block, size: f32) -> BlockMetrics {
        let first = block.lines.first().map(|l| l.baseline);
        let last = block.lines.last().map(|l| l.baseline);
        let (ascent, descent) = match (first, last) {
            (Some(first), Some(last)) => (
                (first - block.bbox.y0).max(size * 0.5),
                (block.bbox.y1 - last).max(0.0),
            ),
            _ => (size * 0.8, size * 0.2),
        };
        let pitch = if block.lines.len() > 1 {
            let span = block.lines[block.lines.len() - 1].baseline - block.lines[0].baseline;
            (span / (block.lines.len() - 1) as f32).max(size)
        } else {
            size * self.options.line_spacing
        };
        BlockMetrics {
            ascent,
            pitch,
            descent,
        }
    }

    /// Fit a block shifted down by `dy`.
    ///
    /// `budget` is the height the block may grow by; `span` overrides the
    /// horizontal extent used for reflowing.
    pub fn fit_block(&self, block: &Block, dy: f32, budget: f32, span: Option<(f32, f32)>, cover: bool) -> BlockFit {
        let covers = if cover {
            block
                .runs()
                .map(|r| DrawOp::FillRect {
                    bbox: r.bbox.expand(self.options.cover_margin),
                    color: COVER_COLOR,
                })
                .collect()
        } else {
            Vec::new()
        };

        if let Some((level, ops)) = self.fit_in_place(block, dy) {
            return BlockFit {
                level,
                ops,
                covers,
                grown: 0.0,
                overflows: Vec::new(),
            };
        }

        let mut fit = self.reflow(block, dy, budget.max(0.0), span);
        fit.covers = covers;
        fit
    }

    /// Levels 0 and 1.
    fn fit_in_place(&self, block: &Block, dy: f32) -> Option<(FitLevel, Vec<DrawOp>)> {
        let mut placed = Vec::new();
        let mut level = FitLevel::InPlace;

        for line in &block.lines {
            for run in &line.runs {
                let font = self.font(run.font);
                let text = run.display_text();
                let scale = if run.is_translated() {
                    let calibration = self.calibration(run, font);
                    let available = run.bbox.width() + FIT_TOLERANCE;
                    let (scale, fits) = shrink_to_fit(&self.steps, available, |s| {
                        self.measurer.width(text, font, font.size * s) * calibration
                    });
                    if !fits {
                        return None;
                    }
                    scale
                } else {
                    1.0
                };
                if scale < 1.0 {
                    level = FitLevel::Shrunk;
                }
                placed.push((line.baseline, run, font, scale));
            }
        }

        let ops = placed
            .into_iter()
            .filter(|(_, run, _, _)| !run.display_text().trim().is_empty())
            .map(|(baseline, run, font, scale)| {
                let text = run.display_text();
                DrawOp::PlaceText {
                    text: text.to_string(),
                    x: run.bbox.x0,
                    baseline: baseline + dy,
                    width: run.bbox.width(),
                    font: self.resolver.resolve(font).to_string(),
                    size: font.size * scale,
                    color: font.color,
                    align: alignment(text),
                    block: block.id,
                    run: Some(run.id),
                }
            })
            .collect();
        Some((level, ops))
    }

    /// Levels 2 to 4.
    fn reflow(&self, block: &Block, dy: f32, budget: f32, span: Option<(f32, f32)>) -> BlockFit {
        let font = self.font(block.font);
        let calibration = self.block_calibration(block);
        let metrics = self.metrics(block, font.size);
        let (x0, x1) = span.unwrap_or((block.bbox.x0, block.bbox.x1));
        let frame = BBox::new(x0, block.bbox.y0 + dy, x1.max(x0), block.bbox.y1 + dy);
        let max_width = frame.width() + FIT_TOLERANCE;

        let runs: Vec<&Run> = block.runs().collect();
        let words = block_words(block);

        for (k, &scale) in self.steps.iter().enumerate() {
            let lines = wrap(&words, max_width, self.measure(font, calibration, scale));
            if metrics.height(lines.len(), scale) <= frame.height() + FIT_TOLERANCE {
                let level = if k == 0 { FitLevel::Reflowed } else { FitLevel::Scaled };
                return BlockFit {
                    level,
                    ops: self.place_lines(block, &runs, &words, &lines, &frame, &metrics, calibration, scale),
                    covers: Vec::new(),
                    grown: 0.0,
                    overflows: Vec::new(),
                };
            }
        }

        let scale = self.steps.last().copied().unwrap_or(1.0);
        let lines = wrap(&words, max_width, self.measure(font, calibration, scale));
        let need = metrics.height(lines.len(), scale);
        let extra = need - frame.height();

        if extra <= budget + FIT_TOLERANCE {
            return BlockFit {
                level: FitLevel::Grown,
                ops: self.place_lines(block, &runs, &words, &lines, &frame, &metrics, calibration, scale),
                covers: Vec::new(),
                grown: extra.clamp(0.0, budget),
                overflows: Vec::new(),
            };
        }

        // Truncate at the last line that fits and mark it.
        let available = frame.height() + budget;
        let keep = metrics.lines_within(available, scale).min(lines.len());
        let grown = (metrics.height(keep, scale) - frame.height()).clamp(0.0, budget);

        let measure = self.measure(font, calibration, scale);
        let mut visible: Vec<WrappedLine> = lines[..keep].to_vec();
        let mut omitted: usize = lines[keep..].iter().map(|l| l.text.chars().count()).sum();
        if keep < lines.len() {
            if let Some(last) = visible.last_mut() {
                let marker = &self.options.overflow_marker;
                let mut text = last.text.clone();
                loop {
                    let candidate = format!("{}{}", text.trim_end(), marker);
                    if measure(&candidate) <= max_width || text.is_empty() {
                        break;
                    }
                    text.pop();
                    omitted += 1;
                }
                last.text = format!("{}{}", text.trim_end(), marker);
            }
        }

        let first_affected = visible.last().map(|l| l.words.start).unwrap_or(0);
        let mut affected: Vec<usize> = words[first_affected.min(words.len())..]
            .iter()
            .map(|w| w.source)
            .collect();
        affected.dedup();
        if affected.is_empty() {
            affected = (0..runs.len()).collect();
        }

        let message = format!(
            "Text does not fit a {:.1}x{:.1}pt frame at {:.0}% size; {} characters omitted",
            frame.width(),
            available,
            scale * 100.0,
            omitted
        );
        let overflows = affected
            .into_iter()
            .filter_map(|i| runs.get(i))
            .map(|run| Overflow {
                run: run.id,
                message: message.clone(),
            })
            .collect();

        BlockFit {
            level: FitLevel::Truncated,
            ops: self.place_lines(block, &runs, &words, &visible, &frame, &metrics, calibration, scale),
            covers: Vec::new(),
            grown,
            overflows,
        }
    }

    fn measure<'b>(
        &'b self,
        font: &'b FontDescriptor,
        calibration: f32,
        scale: f32,
    ) -> impl Fn(&str) -> f32 + 'b {
        move |text| self.measurer.width(text, font, font.size * scale) * calibration
    }

    /// Draw wrapped lines, one op per run segment of each line.
    #[allow(clippy::too_many_arguments)]
    fn place_lines(
        &self,
        block: &Block,
        runs: &[&Run],
        words: &[Word],
        lines: &[WrappedLine],
        frame: &BBox,
        metrics: &BlockMetrics,
        calibration: f32,
        scale: f32,
    ) -> Vec<DrawOp> {
        let block_font = self.font(block.font);
        let measure = self.measure(block_font, calibration, scale);
        let mut ops = Vec::new();

        for (i, line) in lines.iter().enumerate() {
            let baseline = frame.y0 + scale * (metrics.ascent + i as f32 * metrics.pitch);
            let align = alignment(&line.text);
            let segments = line_segments(line, words, &self.options.overflow_marker);
            let single = segments.len() == 1;

            for segment in segments {
                let run = runs.get(segment.source);
                let font = run.map_or(block_font, |r| self.font(r.font));
                let (x, width) = if single {
                    (frame.x0, frame.width())
                } else {
                    let before = measure(&line.text[..segment.start]);
                    let width = measure(&segment.text);
                    match align {
                        TextAlign::Left => (frame.x0 + before, width),
                        TextAlign::Right => (frame.x1 - before - width, width),
                    }
                };
                ops.push(DrawOp::PlaceText {
                    text: segment.text,
                    x,
                    baseline,
                    width,
                    font: self.resolver.resolve(font).to_string(),
                    size: font.size * scale,
                    color: font.color,
                    align,
                    block: block.id,
                    run: run.map(|r| r.id),
                });
            }
        }
        ops
    }
}

/// Part of a wrapped line coming from one run.
struct Segment {
    source: usize,
    /// Byte offset in the line text
    start: usize,
    text: String,
}

/// Split a wrapped line at run boundaries.
///
/// A truncated line keeps its marker on the last segment. Lines that do
/// not map back onto their words stay whole.
fn line_segments(line: &WrappedLine, words: &[Word], marker: &str) -> Vec<Segment> {
    let line_words = words.get(line.words.clone()).unwrap_or_default();

    let mut natural = String::new();
    let mut spans: Vec<(usize, usize, usize)> = Vec::new();
    for (k, word) in line_words.iter().enumerate() {
        if k > 0 && word.space_before {
            natural.push(' ');
        }
        let start = natural.len();
        natural.push_str(&word.text);
        match spans.last_mut() {
            Some(span) if span.0 == word.source => span.2 = natural.len(),
            _ => spans.push((word.source, start, natural.len())),
        }
    }

    let whole = || {
        vec![Segment {
            source: line_words.first().map_or(0, |w| w.source),
            start: 0,
            text: line.text.clone(),
        }]
    };
    if spans.len() <= 1 {
        return whole();
    }

    let (kept, suffix) = match line.text.strip_suffix(marker) {
        Some(kept) if line.text != natural => (kept, marker),
        _ => (line.text.as_str(), ""),
    };
    if !natural.starts_with(kept) {
        return whole();
    }

    let cut = kept.len();
    let mut segments: Vec<Segment> = spans
        .into_iter()
        .filter(|(_, start, _)| *start < cut)
        .map(|(source, start, end)| Segment {
            source,
            start,
            text: natural[start..end.min(cut)].to_string(),
        })
        .collect();
    match segments.last_mut() {
        Some(last) => last.text.push_str(suffix),
        None => return whole(),
    }
    segments
}

fn alignment(text: &str) -> TextAlign {
    if is_rtl(text) {
        TextAlign::Right
    } else {
        TextAlign::Left
    }
}

/// Words of a block's display text, tagged with their run index.
fn block_words(block: &Block) -> Vec<Word> {
    let mut words = Vec::new();
    let mut index = 0;
    let mut previous: Option<&Run> = None;

    for line in &block.lines {
        for (i, run) in line.runs.iter().enumerate() {
            let text = run.display_text();
            let space = match previous {
                None => false,
                Some(prev) => {
                    let joined_script = prev
                        .display_text()
                        .trim_end()
                        .chars()
                        .last()
                        .is_some_and(is_spaceless_script_char)
                        && text.trim_start().chars().next().is_some_and(is_spaceless_script_char);
                    let same_line_touching =
                        i > 0 && run.bbox.x0 - prev.bbox.x1 <= run.bbox.height().max(1.0) * 0.15;
                    !joined_script && !same_line_touching
                }
            };
            split_words(text, index, space, &mut words);
            previous = Some(run);
            index += 1;
        }
    }
    words
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BlockId, Line, SemanticTag, TranslationState};
    use crate::reconstruct::measure::AverageWidthMeasurer;

    struct Setup {
        options: ReconstructOptions,
        measurer: AverageWidthMeasurer,
        fonts: FontTable,
        resolver: FontResolver,
    }

    impl Setup {
        fn new(options: ReconstructOptions) -> Self {
            let mut fonts = FontTable::new();
            fonts.intern(&FontDescriptor::new("Helvetica", 10.0));
            Self {
                options,
                measurer: AverageWidthMeasurer::default(),
                fonts,
                resolver: FontResolver::new(),
            }
        }

        fn fitter(&self) -> Fitter<'_, AverageWidthMeasurer> {
            Fitter::new(&self.options, &self.measurer, &self.fonts, &self.resolver)
        }
    }

    /// A block of one-run lines, 10pt, 12pt line boxes, 14pt pitch.
    /// Box widths match the default measurer exactly.
    fn block(lines: &[&str]) -> Block {
        let lines: Vec<Line> = lines
            .iter()
            .enumerate()
            .map(|(i, text)| {
                let top = 100.0 + i as f32 * 14.0;
                let width = text.chars().count() as f32 * 5.0;
                let bbox = BBox::new(50.0, top, 50.0 + width, top + 12.0);
                Line::new(top + 10.0, bbox, vec![Run::new(RunId(i as u32), *text, FontId(0), bbox)])
            })
            .collect();
        let bbox = BBox::union_all(lines.iter().map(|l| &l.bbox)).unwrap_or_default();
        Block::new(BlockId(0), bbox, FontId(0), SemanticTag::Body, lines)
    }

    fn translate(block: &mut Block, texts: &[&str]) {
        for (run, text) in block.runs_mut().zip(texts) {
            run.translation = TranslationState::Translated {
                text: text.to_string(),
            };
        }
    }

    fn sizes(fit: &BlockFit) -> Vec<f32> {
        fit.ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::PlaceText { size, .. } => Some(*size),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_untranslated_block_stays_in_place() {
        let setup = Setup::new(ReconstructOptions::default());
        let block = block(&["first line of text", "second line"]);
        let fit = setup.fitter().fit_block(&block, 0.0, 0.0, None, false);

        assert_eq!(fit.level, FitLevel::InPlace);
        assert_eq!(fit.ops.len(), 2);
        assert_eq!(sizes(&fit), vec![10.0, 10.0]);
        match &fit.ops[1] {
            DrawOp::PlaceText { baseline, x, run, .. } => {
                assert_eq!(*baseline, 124.0);
                assert_eq!(*x, 50.0);
                assert_eq!(*run, Some(RunId(1)));
            }
            other => panic!("unexpected op {:?}", other),
        }
    }

    #[test]
    fn test_slightly_longer_text_shrinks() {
        let setup = Setup::new(ReconstructOptions::default());
        let mut block = block(&["abcdefghij"]);
        translate(&mut block, &["abcdefghijkl"]);

        let fit = setup.fitter().fit_block(&block, 0.0, 0.0, None, false);
        assert_eq!(fit.level, FitLevel::Shrunk);
        let size = sizes(&fit)[0];
        assert!(size < 10.0 && size >= 7.0);
    }

    #[test]
    fn test_long_text_reflows_into_spare_lines() {
        let setup = Setup::new(ReconstructOptions::default());
        // Two lines of the same width; the translation needs both lines.
        let mut block = block(&["aaaa bbbb cccc", "dddd eeee ffff"]);
        translate(&mut block, &["aaaa bbbb cccc dddd eeee", "ffff"]);

        let fit = setup.fitter().fit_block(&block, 0.0, 0.0, None, false);
        assert_eq!(fit.level, FitLevel::Reflowed);
        assert!(sizes(&fit).iter().all(|s| *s == 10.0));

        // The second line holds the end of the first run and the second run.
        let placed: Vec<(&str, f32, Option<RunId>)> = fit
            .ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::PlaceText {
                    text, baseline, run, ..
                } => Some((text.as_str(), *baseline, *run)),
                _ => None,
            })
            .collect();
        assert_eq!(
            placed,
            vec![
                ("aaaa bbbb cccc", 110.0, Some(RunId(0))),
                ("dddd eeee", 124.0, Some(RunId(0))),
                ("ffff", 124.0, Some(RunId(1))),
            ]
        );
    }

    #[test]
    fn test_reflow_keeps_run_fonts() {
        let mut setup = Setup::new(ReconstructOptions::default());
        let bold = setup.fonts.intern(&FontDescriptor::from_name("Helvetica-Bold", 10.0));
        let mut block = block(&["aaaa bbbb cccc", "dddd"]);
        if let Some(run) = block.runs_mut().nth(1) {
            run.font = bold;
        }
        translate(&mut block, &["aaaa bbbb", "cccc dddd eeee ffff"]);

        let fit = setup.fitter().fit_block(&block, 0.0, 0.0, None, false);
        assert!(fit.level >= FitLevel::Reflowed);

        let faces: Vec<(&str, &str, Option<RunId>)> = fit
            .ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::PlaceText { text, font, run, .. } => Some((text.as_str(), font.as_str(), *run)),
                _ => None,
            })
            .collect();
        assert!(faces.iter().all(|(_, _, run)| run.is_some()));
        for (text, face, run) in &faces {
            let expected = if *run == Some(RunId(1)) { "Helvetica-Bold" } else { "Helvetica" };
            assert_eq!(face, &expected, "segment {:?}", text);
        }
        assert!(faces.iter().any(|(_, face, _)| *face == "Helvetica-Bold"));

        // Segments on one line sit side by side.
        let xs: Vec<f32> = fit
            .ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::PlaceText { x, run, .. } if *run == Some(RunId(1)) => Some(*x),
                _ => None,
            })
            .collect();
        assert!(xs.iter().any(|x| *x > 50.0));
    }

    #[test]
    fn test_growth_uses_budget() {
        let setup = Setup::new(ReconstructOptions::default());
        let mut block = block(&["word word"]);
        translate(&mut block, &["word word word word word word word word word word"]);

        let fit = setup.fitter().fit_block(&block, 0.0, 200.0, None, false);
        assert_eq!(fit.level, FitLevel::Grown);
        assert!(fit.grown > 0.0 && fit.grown <= 200.0);
        assert!(fit.overflows.is_empty());
        let text: Vec<&str> = fit.ops.iter().filter_map(DrawOp::text).collect();
        assert_eq!(text.join(" ").split(' ').count(), 10);
    }

    #[test]
    fn test_truncation_reports_overflow() {
        let setup = Setup::new(ReconstructOptions::default().with_growth(false));
        let mut block = block(&["OK"]);
        translate(&mut block, &["Everything is fine"]);

        let fit = setup.fitter().fit_block(&block, 0.0, 0.0, None, false);
        assert_eq!(fit.level, FitLevel::Truncated);
        assert_eq!(fit.grown, 0.0);
        assert_eq!(fit.ops.len(), 1);
        assert!(fit.ops[0].text().unwrap().ends_with('…'));
        assert_eq!(fit.overflows.len(), 1);
        assert_eq!(fit.overflows[0].run, RunId(0));
    }

    #[test]
    fn test_shrink_to_fit_is_monotone_in_floor() {
        let width = |scale: f32| 300.0 * scale;
        let mut last = 0.0;
        for floor in [0.5, 0.6, 0.7, 0.8, 0.9, 1.0] {
            let steps = ReconstructOptions::new().with_min_font_scale(floor).scale_steps();
            let (scale, fits) = shrink_to_fit(&steps, 100.0, width);
            assert!(!fits);
            let rendered = width(scale);
            assert!(rendered >= last);
            last = rendered;
        }
    }

    #[test]
    fn test_cover_rects() {
        let setup = Setup::new(ReconstructOptions::default().with_cover(true));
        let block = block(&["one", "two"]);
        let fit = setup.fitter().fit_block(&block, 0.0, 0.0, None, true);
        assert_eq!(fit.covers.len(), 2);
    }

    #[test]
    fn test_rtl_text_is_right_aligned() {
        let setup = Setup::new(ReconstructOptions::default());
        let mut block = block(&["Hello world"]);
        translate(&mut block, &["مرحبا"]);

        let fit = setup.fitter().fit_block(&block, 0.0, 0.0, None, false);
        match &fit.ops[0] {
            DrawOp::PlaceText { align, .. } => assert_eq!(*align, TextAlign::Right),
            other => panic!("unexpected op {:?}", other),
        }
        assert!(is_rtl("שלום"));
        assert!(!is_rtl("hello"));
    }
}
