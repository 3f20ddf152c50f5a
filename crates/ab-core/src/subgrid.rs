//! Sub-grid layout for components nested inside a widget.
//!
//! A widget is configured with a coarse grid (`columns`, `row_height`). The
//! engine works on a fine grid with `factor` times as many columns and rows
//! `factor` times shorter, so that dragging in coarse steps still allows
//! sub-cell precision once positions are stored. [`GridPosition`] values are
//! always fine cells; span limits are declared in coarse units and upscaled.

use crate::geometry::Rect;
use crate::id::EntityId;
use serde::{Deserialize, Serialize};

// ─── Sub-grid & geometry ─────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SubGrid {
    /// Coarse column count.
    pub columns: u32,
    /// Coarse row height in world units.
    pub row_height: f64,
    /// Fine cells per coarse cell.
    pub factor: u32,
}

impl Default for SubGrid {
    fn default() -> Self {
        Self {
            columns: 12,
            row_height: 40.0,
            factor: 4,
        }
    }
}

impl SubGrid {
    pub fn new(columns: u32, row_height: f64, factor: u32) -> Self {
        Self {
            columns: columns.max(1),
            row_height: if row_height.is_finite() && row_height > 0.0 {
                row_height
            } else {
                1.0
            },
            factor: factor.max(1),
        }
    }

    pub fn fine_columns(&self) -> u32 {
        self.columns.saturating_mul(self.factor.max(1))
    }

    pub fn fine_row_height(&self) -> f64 {
        self.row_height / f64::from(self.factor.max(1))
    }

    /// Coarse units → fine units. Never overflows: `u32 × u32` fits a `u64`.
    pub fn upscale(&self, coarse: u32) -> u64 {
        u64::from(coarse) * u64::from(self.factor.max(1))
    }

    /// Fine units → coarse units. Exact for multiples of `factor`.
    pub fn downscale(&self, fine: u64) -> f64 {
        let factor = u64::from(self.factor.max(1));
        // The quotient stays below 2^32, so both halves convert exactly.
        let whole = fine / factor;
        let rest = fine % factor;
        whole as f64 + rest as f64 / factor as f64
    }

    /// A coarse span in fine cells, saturating at the largest span a
    /// `GridPosition` can carry.
    fn fine_span(&self, coarse: u32) -> u32 {
        u32::try_from(self.upscale(coarse)).unwrap_or(u32::MAX)
    }

    /// Cell geometry for a widget `width` units wide.
    pub fn geometry(&self, width: f64) -> GridGeometry {
        let columns = self.fine_columns();
        let width = if width.is_finite() { width.max(0.0) } else { 0.0 };
        GridGeometry {
            cell_width: width / f64::from(columns),
            row_height: self.fine_row_height(),
            columns,
        }
    }

    /// Upscale coarse span limits to this grid's fine cells.
    pub fn fine_limits(&self, limits: &SpanLimits) -> SpanLimits {
        SpanLimits {
            min_col_span: self.fine_span(limits.min_col_span.max(1)),
            max_col_span: self.fine_span(limits.max_col_span.max(1)),
            min_row_span: self.fine_span(limits.min_row_span.max(1)),
            max_row_span: self.fine_span(limits.max_row_span.max(1)),
            default_col_span: self.fine_span(limits.default_col_span.max(1)),
            default_row_span: self.fine_span(limits.default_row_span.max(1)),
        }
    }
}

/// Position of a component in fine cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridPosition {
    pub col: u32,
    pub row: u32,
    pub col_span: u32,
    pub row_span: u32,
}

impl GridPosition {
    pub fn new(col: u32, row: u32, col_span: u32, row_span: u32) -> Self {
        Self {
            col,
            row,
            col_span,
            row_span,
        }
    }

    pub fn col_end(&self) -> u32 {
        self.col.saturating_add(self.col_span)
    }

    pub fn row_end(&self) -> u32 {
        self.row.saturating_add(self.row_span)
    }
}

/// Pixel size of one fine cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridGeometry {
    pub cell_width: f64,
    pub row_height: f64,
    pub columns: u32,
}

impl GridGeometry {
    /// Cell width over row height; 1 when either is degenerate.
    pub fn cell_ratio(&self) -> f64 {
        if self.cell_width > 0.0 && self.row_height > 0.0 {
            self.cell_width / self.row_height
        } else {
            1.0
        }
    }

    pub fn to_rect(&self, pos: &GridPosition) -> Rect {
        Rect::new(
            f64::from(pos.col) * self.cell_width,
            f64::from(pos.row) * self.row_height,
            f64::from(pos.col_span) * self.cell_width,
            f64::from(pos.row_span) * self.row_height,
        )
    }

    fn cells(value: f64, unit: f64) -> u32 {
        if unit <= 0.0 || !value.is_finite() {
            return 0;
        }
        // Saturating float → int cast; negatives become 0.
        (value / unit).round().max(0.0) as u32
    }

    /// Nearest grid position to `rect`, spans at least 1, kept inside the
    /// column range.
    pub fn from_rect(&self, rect: &Rect) -> GridPosition {
        let pos = GridPosition {
            col: Self::cells(rect.x, self.cell_width),
            row: Self::cells(rect.y, self.row_height),
            col_span: Self::cells(rect.width, self.cell_width).max(1),
            row_span: Self::cells(rect.height, self.row_height).max(1),
        };
        self.clamp(pos)
    }

    /// Enforce `col + col_span <= columns`, shrinking the span only when it
    /// alone is wider than the grid. Rows are pulled up so that `row_end`
    /// never saturates.
    pub fn clamp(&self, pos: GridPosition) -> GridPosition {
        let columns = self.columns.max(1);
        let col_span = pos.col_span.clamp(1, columns);
        let col = pos.col.min(columns - col_span);
        let row_span = pos.row_span.max(1);
        let row = pos.row.min(u32::MAX - row_span);
        GridPosition {
            col,
            row,
            col_span,
            row_span,
        }
    }
}

// ─── Item specs ──────────────────────────────────────────────────────────

/// Intrinsic span limits of a component type, in coarse units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpanLimits {
    pub min_col_span: u32,
    pub max_col_span: u32,
    pub min_row_span: u32,
    pub max_row_span: u32,
    pub default_col_span: u32,
    pub default_row_span: u32,
}

impl Default for SpanLimits {
    fn default() -> Self {
        Self {
            min_col_span: 1,
            max_col_span: 12,
            min_row_span: 1,
            max_row_span: 12,
            default_col_span: 3,
            default_row_span: 2,
        }
    }
}

impl SpanLimits {
    pub fn clamp_cols(&self, span: u32) -> u32 {
        span.clamp(self.min_col_span, self.max_col_span.max(self.min_col_span))
    }

    pub fn clamp_rows(&self, span: u32) -> u32 {
        span.clamp(self.min_row_span, self.max_row_span.max(self.min_row_span))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "mode", content = "ratio")]
pub enum SizeMode {
    #[default]
    Free,
    /// Locked width / height in world units.
    FixedRatio(f64),
}

/// A component to lay out. `position: Some(_)` marks it as locked.
#[derive(Debug, Clone, PartialEq)]
pub struct GridItem {
    pub id: EntityId,
    pub limits: SpanLimits,
    pub size_mode: SizeMode,
    pub position: Option<GridPosition>,
}

/// Which span drives an aspect-locked resize.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpanAxis {
    Columns,
    Rows,
}

fn span_for(value: f64) -> u32 {
    if value.is_finite() {
        // Saturating cast; at least one cell.
        (value.round().max(1.0)) as u32
    } else {
        1
    }
}

/// Recompute the paired span from the driving one so that the pixel aspect
/// ratio stays at `ratio` (width / height).
///
/// `limits` are fine-cell limits. If clamping the derived span changes it,
/// the driving span is derived back from the clamped value.
pub fn resize_span_with_ratio(
    col_span: u32,
    row_span: u32,
    driving: SpanAxis,
    ratio: f64,
    limits: &SpanLimits,
    geometry: &GridGeometry,
) -> (u32, u32) {
    if !(ratio.is_finite() && ratio > 0.0) {
        return (limits.clamp_cols(col_span), limits.clamp_rows(row_span));
    }
    // Rows per column that keep the pixel ratio.
    let rows_per_col = geometry.cell_ratio() / ratio;
    match driving {
        SpanAxis::Columns => {
            let cols = limits.clamp_cols(col_span);
            let raw_rows = span_for(f64::from(cols) * rows_per_col);
            let rows = limits.clamp_rows(raw_rows);
            if rows != raw_rows {
                let cols = limits.clamp_cols(span_for(f64::from(rows) / rows_per_col));
                (cols, rows)
            } else {
                (cols, rows)
            }
        }
        SpanAxis::Rows => {
            let rows = limits.clamp_rows(row_span);
            let raw_cols = span_for(f64::from(rows) / rows_per_col);
            let cols = limits.clamp_cols(raw_cols);
            if cols != raw_cols {
                let rows = limits.clamp_rows(span_for(f64::from(cols) * rows_per_col));
                (cols, rows)
            } else {
                (cols, rows)
            }
        }
    }
}

// ─── Auto-placement ──────────────────────────────────────────────────────

/// Cells taken so far, kept as the placed rectangles themselves so that
/// cost follows the number of items rather than how far down they sit.
struct Occupancy {
    columns: u32,
    taken: Vec<GridPosition>,
}

impl Occupancy {
    fn new(columns: u32) -> Self {
        Self {
            columns,
            taken: Vec::new(),
        }
    }

    fn overlaps(a: &GridPosition, b: &GridPosition) -> bool {
        a.col < b.col_end() && b.col < a.col_end() && a.row < b.row_end() && b.row < a.row_end()
    }

    fn is_free(&self, pos: &GridPosition) -> bool {
        pos.col_end() <= self.columns && !self.taken.iter().any(|t| Self::overlaps(t, pos))
    }

    fn mark(&mut self, pos: &GridPosition) {
        self.taken.push(*pos);
    }

    /// Rows where a first fit can start: the top row and the row just
    /// below each taken rectangle. A fit at any other row would also fit
    /// one row higher.
    fn start_rows(&self) -> Vec<u32> {
        let mut rows: Vec<u32> = std::iter::once(0)
            .chain(self.taken.iter().map(GridPosition::row_end))
            .collect();
        rows.sort_unstable();
        rows.dedup();
        rows
    }
}

/// Span candidates for an item, widest first, each within its fine limits
/// and honouring a fixed ratio.
fn span_candidates(item: &GridItem, grid: &SubGrid, geometry: &GridGeometry) -> Vec<(u32, u32)> {
    let limits = grid.fine_limits(&item.limits);
    let columns = geometry.columns.max(1);
    let widest = limits.clamp_cols(limits.default_col_span).min(columns);
    let narrowest = limits.min_col_span.min(widest);
    (narrowest..=widest)
        .rev()
        .map(|cols| match item.size_mode {
            SizeMode::Free => (cols, limits.clamp_rows(limits.default_row_span)),
            SizeMode::FixedRatio(ratio) => {
                let (c, r) = resize_span_with_ratio(cols, 0, SpanAxis::Columns, ratio, &limits, geometry);
                (c.min(columns), r)
            }
        })
        .collect()
}

/// Assign a grid position to every item.
///
/// Items with a position are locked and keep it (clamped into the column
/// range). Others are placed in input order at the first free span found
/// scanning rows from the top and columns left to right; at each cell the
/// widest allowed span that fits is taken.
pub fn auto_place(items: &[GridItem], grid: &SubGrid, width: f64) -> Vec<(EntityId, GridPosition)> {
    let geometry = grid.geometry(width);
    let mut occupancy = Occupancy::new(geometry.columns.max(1));
    let mut placed: Vec<(EntityId, GridPosition)> = Vec::with_capacity(items.len());

    for item in items {
        if let Some(pos) = item.position {
            let pos = geometry.clamp(pos);
            occupancy.mark(&pos);
            placed.push((item.id, pos));
        }
    }

    for item in items.iter().filter(|i| i.position.is_none()) {
        let candidates = span_candidates(item, grid, &geometry);
        let mut found = None;
        // The row just below the lowest taken rectangle is always free.
        'scan: for row in occupancy.start_rows() {
            for col in 0..geometry.columns.max(1) {
                for &(col_span, row_span) in &candidates {
                    let pos = GridPosition::new(col, row, col_span, row_span);
                    if occupancy.is_free(&pos) {
                        found = Some(pos);
                        break 'scan;
                    }
                }
            }
        }
        if let Some(pos) = found {
            log::trace!("auto-place {} at {:?}", item.id, pos);
            occupancy.mark(&pos);
            placed.push((item.id, pos));
        }
    }

    // Keep input order in the result.
    placed.sort_by_key(|(id, _)| items.iter().position(|i| i.id == *id));
    placed
}
