//! Block segmentation.
//!
//! Glyphs are grouped into lines by baseline proximity and horizontal gap,
//! same-font neighbours within a line are merged into runs, and lines are
//! clustered into blocks by vertical gap, horizontal overlap and font
//! continuity. Each block is then tagged by a pure classifier over measured
//! features.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

use super::options::{SegmentOptions, TagThresholds};
use super::primitive::{Glyph, NormalizedPage};
use crate::model::{
    cmp_top_left, is_spaceless_script_char, BBox, Block, BlockId, FontDescriptor, FontTable, Line,
    Page, RegionId, Run, RunId, SemanticTag,
};

static CAPTION_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?i)(fig(ure)?|table|tab|chart|diagram|plate|photo)\.?\s*([0-9]+|[IVX]+)\b")
        .expect("valid caption regex")
});

/// Font statistics for heading detection, collected over the whole document.
#[derive(Debug, Clone)]
pub struct FontStatistics {
    /// Median body text size (by character count)
    body_size: f32,
    /// Sizes larger than body, largest first
    heading_sizes: Vec<f32>,
    /// Character count per size, keyed by size × 10
    size_histogram: BTreeMap<i32, usize>,
}

impl Default for FontStatistics {
    fn default() -> Self {
        Self::new()
    }
}

impl FontStatistics {
    pub fn new() -> Self {
        Self {
            body_size: 12.0,
            heading_sizes: Vec::new(),
            size_histogram: BTreeMap::new(),
        }
    }

    /// Add `chars` characters set at `size`.
    pub fn add_size(&mut self, size: f32, chars: usize) {
        let key = (size * 10.0).round() as i32;
        *self.size_histogram.entry(key).or_insert(0) += chars;
    }

    /// Add every glyph of a page.
    pub fn add_page(&mut self, page: &NormalizedPage) {
        for glyph in &page.glyphs {
            self.add_size(glyph.size(), glyph.char_count());
        }
    }

    pub fn merge(&mut self, other: &FontStatistics) {
        for (key, count) in &other.size_histogram {
            *self.size_histogram.entry(*key).or_insert(0) += count;
        }
    }

    /// Calculate body size and heading sizes.
    pub fn analyze(&mut self) {
        let total: usize = self.size_histogram.values().sum();
        if total == 0 {
            self.body_size = 12.0;
            self.heading_sizes.clear();
            return;
        }

        let mut seen = 0;
        for (key, count) in &self.size_histogram {
            seen += count;
            if seen * 2 >= total {
                self.body_size = *key as f32 / 10.0;
                break;
            }
        }

        self.heading_sizes = self
            .size_histogram
            .keys()
            .rev()
            .map(|k| *k as f32 / 10.0)
            .filter(|s| *s > self.body_size + 0.5)
            .collect();
    }

    pub fn body_size(&self) -> f32 {
        self.body_size
    }

    pub fn heading_sizes(&self) -> &[f32] {
        &self.heading_sizes
    }

    /// Fraction of characters set in a smaller size (0-1).
    pub fn percentile(&self, size: f32) -> f32 {
        let total: usize = self.size_histogram.values().sum();
        if total == 0 {
            return 0.0;
        }
        let key = (size * 10.0).round() as i32;
        let below: usize = self.size_histogram.range(..key).map(|(_, c)| c).sum();
        below as f32 / total as f32
    }

    /// Rank of a size among heading sizes (1 = largest).
    ///
    /// Sizes that are not heading sizes rank after all of them.
    pub fn heading_rank(&self, size: f32) -> u8 {
        for (i, &heading_size) in self.heading_sizes.iter().enumerate() {
            if size >= heading_size - 0.5 {
                return (i + 1).min(6) as u8;
            }
        }
        (self.heading_sizes.len() + 1).min(6) as u8
    }
}

/// Sequential id allocation for one page.
#[derive(Debug, Clone, Default)]
pub struct PageIds {
    block: u32,
    run: u32,
    region: u32,
}

impl PageIds {
    pub fn new() -> Self {
        Self::default()
    }

    /// Continue after the ids already used on a page.
    pub fn after(page: &Page) -> Self {
        Self {
            block: page.next_block_id().0,
            run: page.next_run_id().0,
            region: page.regions.iter().map(|r| r.id.0 + 1).max().unwrap_or(0),
        }
    }

    pub fn block(&mut self) -> BlockId {
        self.block += 1;
        BlockId(self.block - 1)
    }

    pub fn run(&mut self) -> RunId {
        self.run += 1;
        RunId(self.run - 1)
    }

    pub fn region(&mut self) -> RegionId {
        self.region += 1;
        RegionId(self.region - 1)
    }
}

/// A run under construction.
#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    pub text: String,
    pub font: FontDescriptor,
    pub bbox: BBox,
}

/// A line under construction.
#[derive(Debug, Clone, PartialEq)]
pub struct TextLine {
    pub baseline: f32,
    pub bbox: BBox,
    pub runs: Vec<TextRun>,
}

impl TextLine {
    fn new(runs: Vec<TextRun>, baseline: f32) -> Self {
        let bbox = BBox::union_all(runs.iter().map(|r| &r.bbox)).unwrap_or_default();
        Self {
            baseline,
            bbox,
            runs,
        }
    }

    /// Text of the line, with a space wherever runs are visibly apart.
    pub fn text(&self) -> String {
        let mut out = String::new();
        for (i, run) in self.runs.iter().enumerate() {
            if i > 0 {
                let gap = run.bbox.x0 - self.runs[i - 1].bbox.x1;
                if gap > run.bbox.height().max(1.0) * 0.15 && needs_space(&out, &run.text) {
                    out.push(' ');
                }
            }
            out.push_str(&run.text);
        }
        out
    }

    pub fn char_count(&self) -> usize {
        self.runs.iter().map(|r| run_chars(r)).sum()
    }

    /// Font size weighted by character count.
    pub fn dominant_size(&self) -> f32 {
        weighted_size(self.runs.iter())
    }
}

fn run_chars(run: &TextRun) -> usize {
    run.text.chars().filter(|c| !c.is_whitespace()).count().max(1)
}

fn weighted_size<'a>(runs: impl Iterator<Item = &'a TextRun>) -> f32 {
    let (mut sum, mut chars) = (0.0, 0usize);
    for run in runs {
        let n = run_chars(run);
        sum += run.font.size * n as f32;
        chars += n;
    }
    if chars == 0 {
        0.0
    } else {
        sum / chars as f32
    }
}

/// Whether a word space belongs between two pieces of text.
fn needs_space(before: &str, after: &str) -> bool {
    let prev = before.chars().last();
    let next = after.chars().next();
    match (prev, next) {
        (Some(p), Some(n)) => {
            !p.is_whitespace()
                && !n.is_whitespace()
                && p != '\u{00A0}'
                && !(is_spaceless_script_char(p) && is_spaceless_script_char(n))
        }
        _ => false,
    }
}

/// Keep two neighbouring run boxes from overlapping horizontally.
fn separate(prev: &mut BBox, next: &mut BBox) {
    if next.x0 < prev.x1 {
        if next.x0 > prev.x0 {
            prev.x1 = next.x0;
        } else {
            next.x0 = prev.x1;
            next.x1 = next.x1.max(next.x0);
        }
    }
}

/// Outcome of comparing a vertical gap with the block threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GapDecision {
    Merge,
    Split,
    /// Within the tolerance band; treated as a merge
    Ambiguous,
}

/// Classify the vertical gap between two lines.
pub fn decide_gap(gap: f32, line_height: f32, options: &SegmentOptions) -> GapDecision {
    let ratio = gap / line_height.max(f32::EPSILON);
    if ratio < options.block_gap_ratio - options.gap_tolerance {
        GapDecision::Merge
    } else if ratio > options.block_gap_ratio + options.gap_tolerance {
        GapDecision::Split
    } else {
        GapDecision::Ambiguous
    }
}

/// Measurements a block is classified from.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockFeatures {
    /// Dominant size relative to the median body size
    pub size_ratio: f32,
    /// Fraction of document characters set smaller (0-1)
    pub percentile: f32,
    /// Rank of the size among document heading sizes (1 = largest)
    pub heading_rank: u8,
    /// More than half the characters are bold
    pub bold: bool,
    pub line_count: usize,
    pub char_count: usize,
    /// First line starts with a bullet or number marker
    pub list_marker: bool,
    /// First line starts with a label such as "Figure 3"
    pub caption_label: bool,
}

/// Map block features to a semantic tag.
pub fn classify(features: &BlockFeatures, thresholds: &TagThresholds) -> SemanticTag {
    if features.list_marker {
        return SemanticTag::ListItem;
    }

    let level = features
        .heading_rank
        .clamp(1, thresholds.max_heading_level.max(1));

    if features.size_ratio >= thresholds.heading_size_ratio
        && features.percentile >= thresholds.heading_percentile
        && features.line_count <= thresholds.heading_max_lines
    {
        return SemanticTag::Heading { level };
    }

    if features.bold
        && features.size_ratio >= 0.99
        && features.line_count <= thresholds.bold_heading_max_lines
        && features.char_count <= thresholds.bold_heading_max_chars
    {
        return SemanticTag::Heading { level };
    }

    if features.line_count <= thresholds.caption_max_lines
        && (features.caption_label || features.size_ratio <= thresholds.caption_size_ratio)
    {
        return SemanticTag::Caption;
    }

    SemanticTag::Body
}

/// Builds lines and blocks from glyphs.
pub struct Segmenter<'a> {
    options: &'a SegmentOptions,
    stats: &'a FontStatistics,
}

impl<'a> Segmenter<'a> {
    pub fn new(options: &'a SegmentOptions, stats: &'a FontStatistics) -> Self {
        Self { options, stats }
    }

    /// Segment glyphs into tagged blocks.
    pub fn segment(&self, glyphs: &[Glyph], ids: &mut PageIds, fonts: &mut FontTable) -> Vec<Block> {
        let lines = self.build_lines(glyphs);
        self.build_blocks(lines, ids, fonts)
    }

    /// Group glyphs into lines, sorted top to bottom then left to right.
    pub fn build_lines(&self, glyphs: &[Glyph]) -> Vec<TextLine> {
        if glyphs.is_empty() {
            return vec![];
        }

        let mut sorted: Vec<&Glyph> = glyphs.iter().collect();
        sorted.sort_by(|a, b| {
            a.baseline()
                .total_cmp(&b.baseline())
                .then(a.bbox.x0.total_cmp(&b.bbox.x0))
        });

        let mut lines = Vec::new();
        let mut cluster: Vec<&Glyph> = Vec::new();
        let mut cluster_baseline = 0.0;
        let mut cluster_size = 0.0f32;

        for glyph in sorted {
            let tolerance = self.options.baseline_tolerance * glyph.size().max(cluster_size);
            if !cluster.is_empty() && (glyph.baseline() - cluster_baseline).abs() > tolerance {
                lines.extend(self.split_baseline(std::mem::take(&mut cluster)));
            }
            if cluster.is_empty() {
                cluster_baseline = glyph.baseline();
                cluster_size = glyph.size();
            }
            cluster.push(glyph);
        }
        if !cluster.is_empty() {
            lines.extend(self.split_baseline(cluster));
        }

        lines.sort_by(|a, b| cmp_top_left(&a.bbox, &b.bbox));
        lines
    }

    /// Split one baseline wherever the horizontal gap is a line break.
    fn split_baseline(&self, mut cluster: Vec<&Glyph>) -> Vec<TextLine> {
        cluster.sort_by(|a, b| a.bbox.x0.total_cmp(&b.bbox.x0));

        let mut lines = Vec::new();
        let mut segment: Vec<&Glyph> = Vec::new();
        let mut right = f32::MIN;
        let mut size = 0.0f32;

        for glyph in cluster {
            if !segment.is_empty() {
                let gap = glyph.bbox.x0 - right;
                if gap > self.options.line_break_gap * size.max(glyph.size()) {
                    lines.push(self.merge_runs(&segment));
                    segment.clear();
                    right = f32::MIN;
                }
            }
            right = right.max(glyph.bbox.x1);
            size = glyph.size();
            segment.push(glyph);
        }
        if !segment.is_empty() {
            lines.push(self.merge_runs(&segment));
        }

        lines
    }

    /// Merge adjacent same-font glyphs into runs.
    fn merge_runs(&self, glyphs: &[&Glyph]) -> TextLine {
        let mut runs: Vec<TextRun> = Vec::new();
        let mut baseline_sum = 0.0;
        let mut weight = 0.0;

        for glyph in glyphs {
            let w = glyph.char_count().max(1) as f32;
            baseline_sum += glyph.baseline() * w;
            weight += w;

            match runs.last_mut() {
                Some(last) if last.font.key() == glyph.font.key() => {
                    let gap = glyph.bbox.x0 - last.bbox.x1;
                    if gap > self.options.space_gap * glyph.avg_char_width()
                        && needs_space(&last.text, &glyph.text)
                    {
                        last.text.push(' ');
                    }
                    last.text.push_str(&glyph.text);
                    last.bbox = last.bbox.union(&glyph.bbox);
                }
                _ => {
                    let mut bbox = glyph.bbox;
                    if let Some(last) = runs.last_mut() {
                        separate(&mut last.bbox, &mut bbox);
                    }
                    runs.push(TextRun {
                        text: glyph.text.clone(),
                        font: glyph.font.clone(),
                        bbox,
                    });
                }
            }
        }

        TextLine::new(runs, baseline_sum / weight.max(1.0))
    }

    /// Cluster lines into blocks.
    ///
    /// Each line joins the open block it continues with the smallest gap, or
    /// starts a new one. Lines inside a block are trimmed so they never
    /// overlap vertically.
    pub fn group_lines(&self, mut lines: Vec<TextLine>) -> Vec<Vec<TextLine>> {
        lines.sort_by(|a, b| cmp_top_left(&a.bbox, &b.bbox));

        // Lines sharing a band with a horizontally separate line.
        let siblings: Vec<Vec<usize>> = (0..lines.len())
            .map(|i| {
                (0..lines.len())
                    .filter(|&j| {
                        j != i && is_sibling(&lines[i].bbox, &lines[j].bbox)
                    })
                    .collect()
            })
            .collect();

        let mut groups: Vec<(BBox, Vec<usize>)> = Vec::new();
        for i in 0..lines.len() {
            let line = &lines[i];
            let mut best: Option<(usize, f32)> = None;

            for (g, (bbox, members)) in groups.iter().enumerate() {
                // Joining would bridge a gutter.
                if siblings[i]
                    .iter()
                    .any(|&j| bbox.horizontal_overlap(&lines[j].bbox) > 0.0)
                {
                    continue;
                }
                let Some(&last) = members.last() else {
                    continue;
                };
                if let Some(gap) = self.attach_gap(bbox, &lines[last], line) {
                    if best.map_or(true, |(_, best_gap)| gap < best_gap) {
                        best = Some((g, gap));
                    }
                }
            }

            match best {
                Some((g, _)) => {
                    groups[g].0 = groups[g].0.union(&line.bbox);
                    groups[g].1.push(i);
                }
                None => groups.push((line.bbox, vec![i])),
            }
        }

        let mut slots: Vec<Option<TextLine>> = lines.into_iter().map(Some).collect();
        groups
            .into_iter()
            .map(|(_, members)| {
                let mut block: Vec<TextLine> =
                    members.iter().filter_map(|&i| slots[i].take()).collect();
                trim_overlaps(&mut block);
                block
            })
            .collect()
    }

    /// Vertical gap if `line` continues the block, `None` if it starts a new one.
    fn attach_gap(&self, block: &BBox, last: &TextLine, line: &TextLine) -> Option<f32> {
        let options = self.options;

        let narrower = line.bbox.width().min(block.width()).max(1.0);
        if line.bbox.horizontal_overlap(block) / narrower < options.min_line_overlap {
            return None;
        }

        let height = last.bbox.height().max(1.0);
        let gap = line.bbox.y0 - last.bbox.y1;
        if gap < -options.overlap_tolerance * height {
            return None;
        }

        if options.split_list_items && starts_with_list_marker(&line.text()) {
            return None;
        }

        let (a, b) = (last.dominant_size(), line.dominant_size());
        let jump = a.max(b) / a.min(b).max(0.1) >= options.font_jump_ratio;
        if jump && gap / height >= options.jump_gap_ratio {
            return None;
        }

        match decide_gap(gap.max(0.0), height, options) {
            GapDecision::Split => None,
            GapDecision::Merge | GapDecision::Ambiguous => Some(gap),
        }
    }

    /// Turn lines into tagged blocks, interning fonts and allocating ids.
    pub fn build_blocks(
        &self,
        lines: Vec<TextLine>,
        ids: &mut PageIds,
        fonts: &mut FontTable,
    ) -> Vec<Block> {
        self.group_lines(lines)
            .into_iter()
            .filter(|group| !group.is_empty())
            .map(|group| self.finish_block(group, ids, fonts))
            .collect()
    }

    fn finish_block(&self, lines: Vec<TextLine>, ids: &mut PageIds, fonts: &mut FontTable) -> Block {
        let features = self.features(&lines);
        let tag = classify(&features, &self.options.tags);
        let dominant = dominant_font(&lines);
        let font = fonts.intern(&dominant);
        let id = ids.block();

        let bbox = BBox::union_all(lines.iter().map(|l| &l.bbox)).unwrap_or_default();
        let lines = lines
            .into_iter()
            .map(|line| {
                let runs = line
                    .runs
                    .into_iter()
                    .map(|r| Run::new(ids.run(), r.text, fonts.intern(&r.font), r.bbox))
                    .collect();
                Line::new(line.baseline, line.bbox, runs)
            })
            .collect();

        Block::new(id, bbox, font, tag, lines)
    }

    /// Measure the features of a group of lines.
    pub fn features(&self, lines: &[TextLine]) -> BlockFeatures {
        let size = weighted_size(lines.iter().flat_map(|l| l.runs.iter()));
        let (bold_chars, chars) = lines
            .iter()
            .flat_map(|l| l.runs.iter())
            .fold((0, 0), |(b, t), r| {
                let n = run_chars(r);
                (if r.font.is_bold() { b + n } else { b }, t + n)
            });
        let first = lines.first().map(|l| l.text()).unwrap_or_default();
        let first = first.trim_start();

        BlockFeatures {
            size_ratio: size / self.stats.body_size().max(1.0),
            percentile: self.stats.percentile(size),
            heading_rank: self.stats.heading_rank(size),
            bold: chars > 0 && bold_chars * 2 > chars,
            line_count: lines.len(),
            char_count: chars,
            list_marker: starts_with_list_marker(first),
            caption_label: CAPTION_LABEL.is_match(first),
        }
    }
}

/// Two boxes share a text band but sit side by side.
fn is_sibling(a: &BBox, b: &BBox) -> bool {
    let min_height = a.height().min(b.height()).max(1.0);
    a.vertical_overlap(b) > min_height * 0.5 && a.horizontal_overlap(b) <= 0.0
}

fn trim_overlaps(lines: &mut [TextLine]) {
    for i in 1..lines.len() {
        let (head, tail) = lines.split_at_mut(i);
        let prev = &mut head[i - 1].bbox;
        let next = &mut tail[0].bbox;
        if next.y0 < prev.y1 {
            let mid = (prev.y1 + next.y0) / 2.0;
            prev.y1 = mid.max(prev.y0);
            next.y0 = mid.min(next.y1);
        }
    }
}

/// Descriptor covering the most characters; the first one wins ties.
fn dominant_font(lines: &[TextLine]) -> FontDescriptor {
    let mut counts: Vec<(&FontDescriptor, usize)> = Vec::new();
    for run in lines.iter().flat_map(|l| l.runs.iter()) {
        let n = run_chars(run);
        match counts.iter_mut().find(|(f, _)| f.key() == run.font.key()) {
            Some(entry) => entry.1 += n,
            None => counts.push((&run.font, n)),
        }
    }
    let mut best: Option<(&FontDescriptor, usize)> = None;
    for (font, n) in counts {
        if best.map_or(true, |(_, m)| n > m) {
            best = Some((font, n));
        }
    }
    best.map(|(f, _)| f.clone())
        .unwrap_or_else(|| FontDescriptor::new("Helvetica", 10.0))
}

/// Check if text is a bullet marker (•, -, etc.).
pub fn is_bullet_marker(text: &str) -> bool {
    matches!(
        text.trim(),
        "-" | "–" | "—" | "•" | "·" | "*" | "○" | "▪" | "◦" | "▸" | "▹" | "►" | "■" | "●" | "□" | "◆" | "◇" | "▶" | "▷" | "➤" | "➜"
    )
}

/// Check if text is a number-style list marker (1., 2), a., etc.).
pub fn is_number_marker(text: &str) -> bool {
    let cleaned: String = text.trim().chars().filter(|c| !c.is_whitespace()).collect();
    if cleaned.is_empty() {
        return false;
    }
    let cleaned = cleaned.strip_prefix('(').unwrap_or(cleaned.as_str());

    if let Some(pos) = cleaned.find(|c: char| !c.is_ascii_digit()) {
        let (prefix, suffix) = cleaned.split_at(pos);
        if !prefix.is_empty() && (suffix == "." || suffix == ")") {
            return true;
        }
    }

    if cleaned.parse::<u32>().is_ok() {
        return true;
    }

    let chars: Vec<char> = cleaned.chars().collect();
    chars.len() == 2 && chars[0].is_alphabetic() && (chars[1] == '.' || chars[1] == ')')
}

/// Check if a line of text opens with a list marker followed by content.
pub fn starts_with_list_marker(text: &str) -> bool {
    let mut parts = text.trim_start().splitn(2, char::is_whitespace);
    let (Some(first), Some(rest)) = (parts.next(), parts.next()) else {
        return false;
    };
    if rest.trim().is_empty() {
        return false;
    }
    if is_bullet_marker(first) {
        return true;
    }
    // A bare number is a list marker only with punctuation.
    is_number_marker(first) && first.chars().any(|c| c == '.' || c == ')')
}
