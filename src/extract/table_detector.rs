//! Table structure inference.
//!
//! Two detectors run per page. Ruled detection builds a grid from vector
//! paths: rectangles are decomposed into edges, edges that touch form a
//! connected grid, and boundaries without a rule at their midpoint become
//! spans. Aligned-text detection (Camelot's stream mode) works on lines
//! whose left edges recur at the same x-positions across several rows.
//!
//! Both prefer precision: anything ambiguous is left as ordinary text.

use super::primitive::Glyph;
use super::segment::{is_bullet_marker, is_number_marker, TextLine};
use crate::model::{BBox, Cell, Table};

/// Table detector configuration.
#[derive(Debug, Clone)]
pub struct TableDetectorConfig {
    /// Minimum grid rows of a ruled table
    pub min_ruled_rows: usize,
    /// Minimum grid columns of a ruled table
    pub min_ruled_columns: usize,
    /// Minimum number of rows of an aligned-text table
    pub min_rows: usize,
    /// Minimum number of columns of an aligned-text table
    pub min_columns: usize,
    /// Maximum number of columns (above this, likely word-level splitting)
    pub max_columns: usize,
    /// Y tolerance for grouping lines into rows (fraction of font size)
    pub y_tolerance_factor: f32,
    /// Minimum fraction of a row's lines that start on a column edge
    pub min_alignment_ratio: f32,
    /// Minimum gap between column edges (points)
    pub min_column_gap: f32,
    /// Distance within which left edges count as aligned (points)
    pub align_tolerance: f32,
    /// Maximum vertical gap between table rows (fraction of row height)
    pub max_row_gap: f32,
    /// Distance within which rule ends and positions are snapped (points)
    pub snap_tolerance: f32,
    /// Maximum thickness of a path drawn as a rule (points)
    pub rule_thickness: f32,
    /// Minimum length of a rule (points)
    pub min_rule_length: f32,
}

impl Default for TableDetectorConfig {
    fn default() -> Self {
        Self {
            min_ruled_rows: 2,
            min_ruled_columns: 2,
            min_rows: 3,
            min_columns: 3,
            max_columns: 8,
            y_tolerance_factor: 0.4,
            min_alignment_ratio: 0.5,
            min_column_gap: 15.0,
            align_tolerance: 5.0,
            max_row_gap: 1.5,
            snap_tolerance: 3.0,
            rule_thickness: 3.0,
            min_rule_length: 6.0,
        }
    }
}

/// An aligned-text table with the lines of every cell.
#[derive(Debug, Clone)]
pub struct DetectedTable {
    /// Grid and cells, without content
    pub table: Table,
    /// Lines of each cell, parallel to `table.cells`
    pub cell_lines: Vec<Vec<TextLine>>,
}

/// A row of lines sharing a baseline.
#[derive(Debug, Clone)]
struct TableRowData {
    bbox: BBox,
    /// Lines in this row, sorted by x
    lines: Vec<TextLine>,
}

/// A horizontal or vertical ruling segment.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Rule {
    horizontal: bool,
    /// y of a horizontal rule, x of a vertical one
    pos: f32,
    start: f32,
    end: f32,
}

/// Detects tables from ruling lines and aligned text.
#[derive(Debug, Clone, Default)]
pub struct TableDetector {
    config: TableDetectorConfig,
}

impl TableDetector {
    /// Create a new table detector with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new table detector with custom configuration.
    pub fn with_config(config: TableDetectorConfig) -> Self {
        Self { config }
    }

    /// Detect ruled tables from the vector paths of a page.
    ///
    /// The returned tables have cells but no content.
    pub fn detect_ruled(&self, paths: &[BBox]) -> Vec<Table> {
        let rules = self.rules_from_paths(paths);
        if rules.len() < 4 {
            return vec![];
        }

        let tol = self.config.snap_tolerance;
        let mut parent: Vec<usize> = (0..rules.len()).collect();
        for i in 0..rules.len() {
            for j in (i + 1)..rules.len() {
                if rules_touch(&rules[i], &rules[j], tol) {
                    union(&mut parent, i, j);
                }
            }
        }

        let mut components: Vec<(usize, Vec<Rule>)> = Vec::new();
        for (i, rule) in rules.iter().enumerate() {
            let root = find(&mut parent, i);
            match components.iter_mut().find(|(r, _)| *r == root) {
                Some((_, members)) => members.push(*rule),
                None => components.push((root, vec![*rule])),
            }
        }

        let mut tables: Vec<Table> = components
            .into_iter()
            .filter_map(|(_, grid)| self.table_from_grid(&grid))
            .collect();
        tables.sort_by(|a, b| crate::model::cmp_top_left(&a.bbox, &b.bbox));

        log::debug!("TableDetector: {} ruled tables", tables.len());
        tables
    }

    fn rules_from_paths(&self, paths: &[BBox]) -> Vec<Rule> {
        let c = &self.config;
        let mut rules = Vec::new();

        for path in paths {
            let (w, h) = (path.width(), path.height());
            if h <= c.rule_thickness && w >= c.min_rule_length {
                rules.push(Rule::horizontal(path.center_y(), path.x0, path.x1));
            } else if w <= c.rule_thickness && h >= c.min_rule_length {
                rules.push(Rule::vertical(path.center_x(), path.y0, path.y1));
            } else if w >= c.min_rule_length && h >= c.min_rule_length {
                rules.push(Rule::horizontal(path.y0, path.x0, path.x1));
                rules.push(Rule::horizontal(path.y1, path.x0, path.x1));
                rules.push(Rule::vertical(path.x0, path.y0, path.y1));
                rules.push(Rule::vertical(path.x1, path.y0, path.y1));
            }
        }

        rules
    }

    /// Build a table from one connected set of rules.
    fn table_from_grid(&self, grid: &[Rule]) -> Option<Table> {
        let tol = self.config.snap_tolerance;
        let row_edges = snap(grid.iter().filter(|r| r.horizontal).map(|r| r.pos), tol);
        let col_edges = snap(grid.iter().filter(|r| !r.horizontal).map(|r| r.pos), tol);

        if row_edges.len() < self.config.min_ruled_rows + 1
            || col_edges.len() < self.config.min_ruled_columns + 1
        {
            return None;
        }

        let rows = row_edges.len() - 1;
        let cols = col_edges.len() - 1;
        let slot = |r: usize, c: usize| r * cols + c;
        let mut parent: Vec<usize> = (0..rows * cols).collect();

        // A boundary without a rule at its midpoint joins the two slots.
        for r in 0..rows {
            let mid_y = (row_edges[r] + row_edges[r + 1]) / 2.0;
            for c in 0..cols - 1 {
                if !covered(grid, false, col_edges[c + 1], mid_y, tol) {
                    union(&mut parent, slot(r, c), slot(r, c + 1));
                }
            }
        }
        for r in 0..rows - 1 {
            for c in 0..cols {
                let mid_x = (col_edges[c] + col_edges[c + 1]) / 2.0;
                if !covered(grid, true, row_edges[r + 1], mid_x, tol) {
                    union(&mut parent, slot(r, c), slot(r + 1, c));
                }
            }
        }

        // (root, min_row, max_row, min_col, max_col, count)
        let mut spans: Vec<(usize, usize, usize, usize, usize, usize)> = Vec::new();
        for r in 0..rows {
            for c in 0..cols {
                let root = find(&mut parent, slot(r, c));
                match spans.iter_mut().find(|s| s.0 == root) {
                    Some(s) => {
                        s.1 = s.1.min(r);
                        s.2 = s.2.max(r);
                        s.3 = s.3.min(c);
                        s.4 = s.4.max(c);
                        s.5 += 1;
                    }
                    None => spans.push((root, r, r, c, c, 1)),
                }
            }
        }

        let mut table = Table::from_edges(&col_edges, &row_edges, true);
        for (_, r0, r1, c0, c1, count) in spans {
            if count != (r1 - r0 + 1) * (c1 - c0 + 1) {
                log::debug!(
                    "TableDetector: rejecting grid at {:?}, merged cells are not rectangular",
                    table.bbox
                );
                return None;
            }
            let bbox = BBox::new(col_edges[c0], row_edges[r0], col_edges[c1 + 1], row_edges[r1 + 1]);
            table.cells.push(Cell::new(
                r0 as u32,
                c0 as u32,
                (r1 - r0 + 1) as u32,
                (c1 - c0 + 1) as u32,
                bbox,
            ));
        }

        if table.cells.len() < 2 || !table.is_rectangular() {
            return None;
        }
        table.cells.sort_by_key(|cell| (cell.row, cell.col));
        Some(table)
    }

    /// Detect aligned-text tables among the lines of a page.
    ///
    /// Returns detected tables and the lines that were NOT part of tables.
    pub fn detect_aligned(&self, lines: Vec<TextLine>) -> (Vec<DetectedTable>, Vec<TextLine>) {
        let c = &self.config;
        if lines.len() < c.min_rows * c.min_columns {
            return (vec![], lines);
        }

        let rows = self.group_into_rows(lines);
        log::debug!("TableDetector: grouped into {} rows", rows.len());

        let mut tables = Vec::new();
        let mut remaining = Vec::new();
        let mut pending: Vec<TableRowData> = Vec::new();

        // Runs of consecutive multi-line rows are table candidates.
        for row in rows {
            let continues = pending.last().map_or(true, |last| {
                let height = last.bbox.height().max(1.0);
                row.bbox.y0 - last.bbox.y1 <= c.max_row_gap * height
            });
            if row.lines.len() >= 2 && continues {
                pending.push(row);
                continue;
            }
            self.flush_candidate(std::mem::take(&mut pending), &mut tables, &mut remaining);
            if row.lines.len() >= 2 {
                pending.push(row);
            } else {
                remaining.extend(row.lines);
            }
        }
        self.flush_candidate(pending, &mut tables, &mut remaining);

        remaining.sort_by(|a, b| crate::model::cmp_top_left(&a.bbox, &b.bbox));
        (tables, remaining)
    }

    fn flush_candidate(
        &self,
        rows: Vec<TableRowData>,
        tables: &mut Vec<DetectedTable>,
        remaining: &mut Vec<TextLine>,
    ) {
        if rows.len() < self.config.min_rows {
            remaining.extend(rows.into_iter().flat_map(|r| r.lines));
            return;
        }

        let edges = self.column_edges(&rows);
        if edges.len() < self.config.min_columns {
            remaining.extend(rows.into_iter().flat_map(|r| r.lines));
            return;
        }

        // Split the run at rows that do not follow the column edges.
        let mut region: Vec<TableRowData> = Vec::new();
        for row in rows {
            if self.alignment_score(&row, &edges) >= self.config.min_alignment_ratio {
                region.push(row);
            } else {
                self.finish_region(std::mem::take(&mut region), tables, remaining);
                remaining.extend(row.lines);
            }
        }
        self.finish_region(region, tables, remaining);
    }

    fn finish_region(
        &self,
        rows: Vec<TableRowData>,
        tables: &mut Vec<DetectedTable>,
        remaining: &mut Vec<TextLine>,
    ) {
        let c = &self.config;
        if rows.len() < c.min_rows {
            remaining.extend(rows.into_iter().flat_map(|r| r.lines));
            return;
        }

        // Re-detect columns for this specific table region
        let edges = self.column_edges(&rows);
        if edges.len() < c.min_columns || edges.len() > c.max_columns {
            log::debug!(
                "TableDetector: skipping region, {} columns outside {}..={}",
                edges.len(),
                c.min_columns,
                c.max_columns
            );
            remaining.extend(rows.into_iter().flat_map(|r| r.lines));
            return;
        }

        if self.is_list_pattern(&rows, &edges) {
            log::debug!("TableDetector: skipping region, detected as list pattern");
            remaining.extend(rows.into_iter().flat_map(|r| r.lines));
            return;
        }

        tables.push(self.build_aligned_table(rows, &edges));
    }

    /// Group lines into rows by baseline.
    fn group_into_rows(&self, mut lines: Vec<TextLine>) -> Vec<TableRowData> {
        lines.sort_by(|a, b| {
            a.baseline
                .total_cmp(&b.baseline)
                .then(a.bbox.x0.total_cmp(&b.bbox.x0))
        });

        let mut rows: Vec<TableRowData> = Vec::new();
        let mut row_baseline = f32::MIN;
        for line in lines {
            let tolerance = line.dominant_size() * self.config.y_tolerance_factor;
            match rows.last_mut() {
                Some(row) if (line.baseline - row_baseline).abs() <= tolerance => {
                    row.bbox = row.bbox.union(&line.bbox);
                    row.lines.push(line);
                }
                _ => {
                    row_baseline = line.baseline;
                    rows.push(TableRowData {
                        bbox: line.bbox,
                        lines: vec![line],
                    });
                }
            }
        }

        for row in &mut rows {
            row.lines.sort_by(|a, b| a.bbox.x0.total_cmp(&b.bbox.x0));
        }
        rows
    }

    /// Left edges that recur across rows, counted once per row.
    fn column_edges(&self, rows: &[TableRowData]) -> Vec<f32> {
        let c = &self.config;
        let mut starts: Vec<(f32, usize)> = rows
            .iter()
            .enumerate()
            .flat_map(|(i, row)| row.lines.iter().map(move |l| (l.bbox.x0, i)))
            .collect();
        starts.sort_by(|a, b| a.0.total_cmp(&b.0));

        let min_occurrences = c
            .min_rows
            .max((rows.len() as f32 * c.min_alignment_ratio).ceil() as usize);

        let mut edges: Vec<f32> = Vec::new();
        let mut i = 0;
        while i < starts.len() {
            let anchor = starts[i].0;
            let mut members: Vec<usize> = Vec::new();
            let mut j = i;
            while j < starts.len() && starts[j].0 - anchor <= c.align_tolerance {
                members.push(starts[j].1);
                j += 1;
            }
            members.sort_unstable();
            members.dedup();
            if members.len() >= min_occurrences
                && edges.last().map_or(true, |last| anchor - last >= c.min_column_gap)
            {
                edges.push(anchor);
            }
            i = j;
        }

        log::debug!("TableDetector: column edges {:?}", edges);
        edges
    }

    /// Fraction of a row's lines that start on a column edge.
    fn alignment_score(&self, row: &TableRowData, edges: &[f32]) -> f32 {
        if row.lines.is_empty() || edges.is_empty() {
            return 0.0;
        }
        let tolerance = self.config.align_tolerance;
        let aligned = row
            .lines
            .iter()
            .filter(|l| edges.iter().any(|e| (l.bbox.x0 - e).abs() <= tolerance))
            .count();
        aligned as f32 / row.lines.len() as f32
    }

    /// Check if detected table rows actually represent a numbered or bulleted list.
    ///
    /// A marker and its item text are often far enough apart to look like
    /// two columns.
    fn is_list_pattern(&self, rows: &[TableRowData], edges: &[f32]) -> bool {
        if edges.len() < 2 || rows.is_empty() {
            return false;
        }

        let mut bullet_count = 0;
        let mut number_count = 0;
        for row in rows {
            let Some(first) = row.lines.first() else {
                continue;
            };
            let text = first.text();
            if is_bullet_marker(&text) {
                bullet_count += 1;
            } else if is_number_marker(&text) {
                number_count += 1;
            }
        }

        let bullet_ratio = bullet_count as f32 / rows.len() as f32;
        let total_ratio = (bullet_count + number_count) as f32 / rows.len() as f32;
        log::debug!(
            "TableDetector: list markers: bullets={}, numbers={}, rows={}",
            bullet_count,
            number_count,
            rows.len()
        );

        // Bullet markers are almost never real table data.
        if bullet_ratio >= 0.5 {
            return true;
        }

        // Numbered first columns are common in real tables; only reject
        // when the numbers are followed by a single text column.
        edges.len() == 2 && total_ratio >= 0.5
    }

    fn build_aligned_table(&self, rows: Vec<TableRowData>, edges: &[f32]) -> DetectedTable {
        let tol = self.config.align_tolerance;
        let left = rows.iter().map(|r| r.bbox.x0).fold(f32::MAX, f32::min);
        let right = rows.iter().map(|r| r.bbox.x1).fold(f32::MIN, f32::max);

        let mut col_edges = edges.to_vec();
        col_edges[0] = col_edges[0].min(left);
        let last_edge = col_edges[col_edges.len() - 1];
        col_edges.push(right.max(last_edge + 1.0));

        let mut row_edges = vec![rows[0].bbox.y0];
        for pair in rows.windows(2) {
            row_edges.push((pair[0].bbox.y1 + pair[1].bbox.y0) / 2.0);
        }
        row_edges.push(rows[rows.len() - 1].bbox.y1);
        // Overlapping rows must still give increasing edges.
        for i in 1..row_edges.len() {
            row_edges[i] = row_edges[i].max(row_edges[i - 1]);
        }

        let cols = col_edges.len() - 1;
        let mut table = Table::from_edges(&col_edges, &row_edges, false);
        let mut cell_lines = Vec::new();

        for (r, row) in rows.into_iter().enumerate() {
            let mut buckets: Vec<Vec<TextLine>> = vec![Vec::new(); cols];
            for line in row.lines {
                let c = column_for(line.bbox.x0, &col_edges[..cols], tol);
                buckets[c].push(line);
            }

            let mut c = 0;
            while c < cols {
                let right_edge = buckets[c]
                    .iter()
                    .map(|l| l.bbox.x1)
                    .fold(f32::MIN, f32::max);
                // A cell spans every boundary its content crosses, up to the
                // next occupied column.
                let mut span = 1;
                while c + span < cols
                    && col_edges[c + span] < right_edge - tol
                    && buckets[c + span].is_empty()
                {
                    span += 1;
                }

                let bbox = BBox::new(
                    col_edges[c],
                    row_edges[r],
                    col_edges[c + span],
                    row_edges[r + 1],
                );
                table
                    .cells
                    .push(Cell::new(r as u32, c as u32, 1, span as u32, bbox));
                cell_lines.push(std::mem::take(&mut buckets[c]));
                c += span;
            }
        }

        log::debug!(
            "TableDetector: aligned table {}x{} at {:?}",
            table.rows,
            table.cols,
            table.bbox
        );
        DetectedTable { table, cell_lines }
    }
}

impl Rule {
    fn horizontal(y: f32, x0: f32, x1: f32) -> Self {
        Self {
            horizontal: true,
            pos: y,
            start: x0.min(x1),
            end: x0.max(x1),
        }
    }

    fn vertical(x: f32, y0: f32, y1: f32) -> Self {
        Self {
            horizontal: false,
            pos: x,
            start: y0.min(y1),
            end: y0.max(y1),
        }
    }
}

/// Two rules cross or meet, or are collinear and overlapping.
fn rules_touch(a: &Rule, b: &Rule, tol: f32) -> bool {
    if a.horizontal != b.horizontal {
        b.pos >= a.start - tol && b.pos <= a.end + tol && a.pos >= b.start - tol && a.pos <= b.end + tol
    } else {
        (a.pos - b.pos).abs() <= tol && a.start <= b.end + tol && b.start <= a.end + tol
    }
}

/// Check if a rule runs along `pos` through the point `at`.
fn covered(rules: &[Rule], horizontal: bool, pos: f32, at: f32, tol: f32) -> bool {
    rules.iter().any(|r| {
        r.horizontal == horizontal
            && (r.pos - pos).abs() <= tol
            && at >= r.start - tol
            && at <= r.end + tol
    })
}

/// Cluster positions within `tol` and return the cluster means, ascending.
fn snap(values: impl Iterator<Item = f32>, tol: f32) -> Vec<f32> {
    let mut values: Vec<f32> = values.collect();
    values.sort_by(|a, b| a.total_cmp(b));

    let mut out: Vec<f32> = Vec::new();
    let mut cluster: Vec<f32> = Vec::new();
    for v in values {
        if let Some(&first) = cluster.first() {
            if v - first > tol {
                out.push(cluster.iter().sum::<f32>() / cluster.len() as f32);
                cluster.clear();
            }
        }
        cluster.push(v);
    }
    if !cluster.is_empty() {
        out.push(cluster.iter().sum::<f32>() / cluster.len() as f32);
    }
    out
}

/// Index of the last column starting at or before `x`.
fn column_for(x: f32, starts: &[f32], tol: f32) -> usize {
    starts
        .iter()
        .rposition(|&s| s <= x + tol)
        .unwrap_or(0)
}

fn find(parent: &mut [usize], mut i: usize) -> usize {
    while parent[i] != i {
        parent[i] = parent[parent[i]];
        i = parent[i];
    }
    i
}

fn union(parent: &mut [usize], a: usize, b: usize) {
    let (ra, rb) = (find(parent, a), find(parent, b));
    if ra != rb {
        parent[ra.max(rb)] = ra.min(rb);
    }
}

/// Distribute glyphs over the cells of a table by their center point.
///
/// Returns the glyphs of each cell (parallel to `table.cells`) and the
/// glyphs outside the table.
pub fn assign_glyphs(table: &Table, glyphs: Vec<Glyph>) -> (Vec<Vec<Glyph>>, Vec<Glyph>) {
    let mut cells: Vec<Vec<Glyph>> = vec![Vec::new(); table.cells.len()];
    let mut outside = Vec::new();

    for glyph in glyphs {
        let (x, y) = (glyph.bbox.center_x(), glyph.bbox.center_y());
        let hit = if table.bbox.contains_point(x, y) {
            table.cells.iter().position(|c| c.bbox.contains_point(x, y))
        } else {
            None
        };
        match hit {
            Some(i) => cells[i].push(glyph),
            None => outside.push(glyph),
        }
    }

    (cells, outside)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::options::SegmentOptions;
    use crate::extract::segment::{FontStatistics, Segmenter};
    use crate::model::FontDescriptor;

    fn hline(y: f32, x0: f32, x1: f32) -> BBox {
        BBox::new(x0, y, x1, y)
    }

    fn vline(x: f32, y0: f32, y1: f32) -> BBox {
        BBox::new(x, y0, x, y1)
    }

    /// 3 columns x 2 rows with the first two cells of row 0 merged.
    fn spanning_grid() -> Vec<BBox> {
        vec![
            BBox::new(50.0, 100.0, 350.0, 140.0),
            hline(120.0, 50.0, 350.0),
            vline(150.0, 120.0, 140.0),
            vline(250.0, 100.0, 140.0),
        ]
    }

    fn word(text: &str, x: f32, y: f32) -> Glyph {
        let width = text.chars().count() as f32 * 5.0;
        Glyph::new(
            text,
            BBox::new(x, y, x + width, y + 12.0),
            FontDescriptor::new("Helvetica", 10.0),
        )
    }

    fn lines_of(glyphs: &[Glyph]) -> Vec<TextLine> {
        let options = SegmentOptions::default();
        let stats = FontStatistics::new();
        Segmenter::new(&options, &stats).build_lines(glyphs)
    }

    #[test]
    fn test_ruled_table_with_column_span() {
        let tables = TableDetector::new().detect_ruled(&spanning_grid());
        assert_eq!(tables.len(), 1);

        let table = &tables[0];
        assert!(table.ruled);
        assert_eq!((table.rows, table.cols), (2, 3));
        assert_eq!(table.column_edges(), vec![50.0, 150.0, 250.0, 350.0]);
        assert_eq!(table.logical_cells_in_row(0), 2);
        assert_eq!(table.logical_cells_in_row(1), 3);
        assert_eq!(table.cell_at(0, 1).map(|c| c.colspan), Some(2));
        assert!(table.is_rectangular());
    }

    #[test]
    fn test_ruled_table_row_span() {
        let paths = vec![
            BBox::new(0.0, 0.0, 200.0, 60.0),
            vline(100.0, 0.0, 60.0),
            hline(30.0, 100.0, 200.0),
        ];
        let tables = TableDetector::new().detect_ruled(&paths);
        assert_eq!(tables.len(), 1);
        let cell = tables[0].cell_at(1, 0).unwrap();
        assert_eq!((cell.row, cell.rowspan), (0, 2));
        assert!(tables[0].is_rectangular());
    }

    #[test]
    fn test_non_rectangular_merge_is_rejected() {
        let paths = vec![
            BBox::new(0.0, 0.0, 200.0, 100.0),
            vline(100.0, 50.0, 100.0),
            hline(50.0, 0.0, 100.0),
        ];
        assert!(TableDetector::new().detect_ruled(&paths).is_empty());
    }

    #[test]
    fn test_single_box_is_not_a_table() {
        let paths = vec![BBox::new(10.0, 10.0, 300.0, 80.0), hline(120.0, 10.0, 300.0)];
        assert!(TableDetector::new().detect_ruled(&paths).is_empty());
    }

    #[test]
    fn test_assign_glyphs_to_cells() {
        let table = TableDetector::new().detect_ruled(&spanning_grid()).remove(0);
        let glyphs = vec![
            word("Header", 120.0, 104.0),
            word("A", 60.0, 124.0),
            word("C", 260.0, 124.0),
            word("Outside", 60.0, 300.0),
        ];
        let (cells, outside) = assign_glyphs(&table, glyphs);
        assert_eq!(cells[0].len(), 1);
        assert_eq!(cells[0][0].text, "Header");
        assert_eq!(cells[2][0].text, "A");
        assert_eq!(cells[4][0].text, "C");
        assert_eq!(outside.len(), 1);
    }

    #[test]
    fn test_detect_aligned_table() {
        let mut glyphs = Vec::new();
        for (i, row) in [["Model", "Voltage", "Weight"], ["X100", "230V", "4kg"], ["X200", "110V", "6kg"]]
            .iter()
            .enumerate()
        {
            let y = 100.0 + i as f32 * 15.0;
            glyphs.push(word(row[0], 50.0, y));
            glyphs.push(word(row[1], 150.0, y));
            glyphs.push(word(row[2], 250.0, y));
        }

        let (tables, remaining) = TableDetector::new().detect_aligned(lines_of(&glyphs));
        assert_eq!(tables.len(), 1);
        assert!(remaining.is_empty());

        let detected = &tables[0];
        assert_eq!((detected.table.rows, detected.table.cols), (3, 3));
        assert!(detected.table.is_rectangular());
        assert_eq!(detected.cell_lines.len(), 9);
        assert_eq!(detected.cell_lines[4][0].text(), "230V");
    }

    #[test]
    fn test_aligned_table_infers_column_span() {
        let mut glyphs = vec![
            word("Combined heading text here", 50.0, 100.0),
            word("Unit", 250.0, 100.0),
        ];
        for i in 1..4 {
            let y = 100.0 + i as f32 * 15.0;
            glyphs.push(word("A", 50.0, y));
            glyphs.push(word("B", 150.0, y));
            glyphs.push(word("C", 250.0, y));
        }

        let (tables, _) = TableDetector::new().detect_aligned(lines_of(&glyphs));
        assert_eq!(tables.len(), 1);
        let table = &tables[0].table;
        assert_eq!(table.logical_cells_in_row(0), 2);
        assert_eq!(table.cell_at(0, 0).map(|c| c.colspan), Some(2));
        for row in 0..table.rows {
            assert_eq!(table.logical_columns_in_row(row), 3);
        }
    }

    #[test]
    fn test_two_columns_are_not_a_table() {
        let mut glyphs = Vec::new();
        for i in 0..4 {
            let y = 100.0 + i as f32 * 15.0;
            glyphs.push(word("Name", 50.0, y));
            glyphs.push(word("Value", 150.0, y));
        }
        let (tables, remaining) = TableDetector::new().detect_aligned(lines_of(&glyphs));
        assert!(tables.is_empty());
        assert_eq!(remaining.len(), 8);
    }

    #[test]
    fn test_bullet_list_not_detected_as_table() {
        let mut glyphs = Vec::new();
        for (i, item) in ["Management", "Interface", "Firmware"].iter().enumerate() {
            let y = 100.0 + i as f32 * 15.0;
            glyphs.push(word("•", 50.0, y));
            glyphs.push(word(item, 80.0, y));
            glyphs.push(word("page", 250.0, y));
        }
        let (tables, remaining) = TableDetector::new().detect_aligned(lines_of(&glyphs));
        assert!(tables.is_empty(), "Bullet list should not be detected as a table");
        assert_eq!(remaining.len(), 9);
    }

    #[test]
    fn test_snap_clusters_close_positions() {
        let snapped = snap([10.0, 11.0, 50.0, 52.0, 100.0].into_iter(), 3.0);
        assert_eq!(snapped, vec![10.5, 51.0, 100.0]);
    }
}
