//! Grid controller: move and resize of sub-grid placed components, in
//! fine cells.
//!
//! Pointer travel is converted to whole cells by rounding, so the preview
//! jumps from cell to cell. The commit is a [`GridPosition`]; the document
//! derives the pixel rect from it.

use crate::error::GestureError;
use crate::session::InteractionSession;
use ab_core::subgrid::resize_span_with_ratio;
use ab_core::{
    Commit, EntityId, GridContext, GridPosition, Point, Rect, ResizeHandle, SizeMode, SpanAxis,
    SpanLimits,
};

/// Whole cells covered by `delta` world units.
fn cells(delta: f64, unit: f64) -> i64 {
    if unit <= 0.0 || !delta.is_finite() {
        return 0;
    }
    // Saturating float → int cast.
    (delta / unit).round() as i64
}

fn offset(base: u32, by: i64) -> u32 {
    u32::try_from((i64::from(base) + by).max(0)).unwrap_or(u32::MAX)
}

#[derive(Debug, Clone, Copy)]
struct GridSession {
    base: InteractionSession,
    start: GridPosition,
    grid: GridContext,
}

#[derive(Debug, Default)]
pub struct GridController {
    session: Option<GridSession>,
    preview: Option<GridPosition>,
}

impl GridController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    pub fn entity(&self) -> Option<EntityId> {
        self.session.map(|s| s.base.entity)
    }

    pub fn preview(&self) -> Option<GridPosition> {
        self.preview
    }

    /// Preview converted to widget-relative pixels.
    pub fn preview_rect(&self) -> Option<Rect> {
        let s = self.session?;
        self.preview.map(|p| s.grid.geometry.to_rect(&p))
    }

    /// Start a grid gesture; `handle: None` moves, `Some` resizes.
    ///
    /// # Errors
    /// `SessionActive` if a grid gesture is already running.
    pub fn begin(
        &mut self,
        entity: EntityId,
        handle: Option<ResizeHandle>,
        mouse: Point,
        grid: GridContext,
    ) -> Result<(), GestureError> {
        if let Some(active) = &self.session {
            return Err(GestureError::SessionActive {
                active: active.base.entity,
            });
        }
        log::debug!("grid begin {entity} at {:?} ({handle:?})", grid.position);
        self.session = Some(GridSession {
            base: InteractionSession {
                entity,
                anchor_mouse: mouse,
                start_rect: grid.geometry.to_rect(&grid.position),
                handle,
            },
            start: grid.position,
            grid,
        });
        self.preview = None;
        Ok(())
    }

    pub fn update(&mut self, mouse: Point, scale: f64) -> Option<GridPosition> {
        let s = self.session?;
        let delta = s.base.world_delta(mouse, scale);
        let dcol = cells(delta.x, s.grid.geometry.cell_width);
        let drow = cells(delta.y, s.grid.geometry.row_height);

        let next = match s.base.handle {
            None => GridPosition {
                col: offset(s.start.col, dcol),
                row: offset(s.start.row, drow),
                ..s.start
            },
            Some(handle) => resize_cells(&s, handle, dcol, drow),
        };
        let next = s.grid.geometry.clamp(next);
        if self.preview != Some(next) {
            log::trace!("grid {} preview {next:?}", s.base.entity);
        }
        self.preview = Some(next);
        self.preview
    }

    pub fn end(&mut self) -> Option<Commit> {
        let s = self.session.take()?;
        let position = self.preview.take()?;
        log::debug!("grid commit {} → {position:?}", s.base.entity);
        Some(Commit::GridPosition {
            id: s.base.entity,
            position,
        })
    }

    pub fn cancel(&mut self) {
        if let Some(s) = self.session.take() {
            log::debug!("grid cancel {}", s.base.entity);
        }
        self.preview = None;
    }
}

fn resize_cells(s: &GridSession, handle: ResizeHandle, dcol: i64, drow: i64) -> GridPosition {
    let start = s.start;
    // Room in the direction of travel keeps the pinned edge in place.
    let mut limits: SpanLimits = s.grid.limits;
    if handle.moves_east() {
        limits.max_col_span = limits.max_col_span.min(s.grid.geometry.columns.saturating_sub(start.col));
    } else if handle.moves_west() {
        limits.max_col_span = limits.max_col_span.min(start.col_end());
    }
    if handle.moves_north() {
        limits.max_row_span = limits.max_row_span.min(start.row_end());
    }

    let mut col_span = start.col_span;
    let mut row_span = start.row_span;
    if handle.moves_east() {
        col_span = offset(start.col_span, dcol);
    } else if handle.moves_west() {
        col_span = offset(start.col_span, -dcol);
    }
    if handle.moves_south() {
        row_span = offset(start.row_span, drow);
    } else if handle.moves_north() {
        row_span = offset(start.row_span, -drow);
    }
    col_span = limits.clamp_cols(col_span);
    row_span = limits.clamp_rows(row_span);

    if let SizeMode::FixedRatio(ratio) = s.grid.size_mode {
        let driving = match handle {
            ResizeHandle::E | ResizeHandle::W => SpanAxis::Columns,
            ResizeHandle::N | ResizeHandle::S => SpanAxis::Rows,
            _ => {
                let rel = |now: u32, was: u32| (f64::from(now) / f64::from(was.max(1)) - 1.0).abs();
                if rel(col_span, start.col_span) >= rel(row_span, start.row_span) {
                    SpanAxis::Columns
                } else {
                    SpanAxis::Rows
                }
            }
        };
        (col_span, row_span) =
            resize_span_with_ratio(col_span, row_span, driving, ratio, &limits, &s.grid.geometry);
    }

    GridPosition {
        col: if handle.moves_west() {
            start.col_end().saturating_sub(col_span)
        } else {
            start.col
        },
        row: if handle.moves_north() {
            start.row_end().saturating_sub(row_span)
        } else {
            start.row
        },
        col_span,
        row_span,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ab_core::SubGrid;

    /// 12 coarse columns × factor 4 over 480 px: 48 fine columns of 10 px,
    /// fine rows of 10 px.
    fn context(position: GridPosition, size_mode: SizeMode) -> GridContext {
        let grid = SubGrid::new(12, 40.0, 4);
        GridContext {
            widget: EntityId::intern("grid_widget"),
            grid,
            geometry: grid.geometry(480.0),
            limits: grid.fine_limits(&SpanLimits::default()),
            size_mode,
            position,
        }
    }

    fn begin(g: &mut GridController, handle: Option<ResizeHandle>, pos: GridPosition, mode: SizeMode) {
        g.begin(EntityId::intern("grid_item"), handle, Point::ORIGIN, context(pos, mode))
            .unwrap();
    }

    #[test]
    fn move_rounds_to_cells_and_clamps() {
        let mut g = GridController::new();
        begin(&mut g, None, GridPosition::new(4, 4, 8, 8), SizeMode::Free);
        assert_eq!(g.update(Point::new(26.0, -14.0), 1.0), Some(GridPosition::new(7, 3, 8, 8)));
        assert_eq!(g.update(Point::new(-500.0, -500.0), 1.0), Some(GridPosition::new(0, 0, 8, 8)));
        assert_eq!(g.update(Point::new(5000.0, 0.0), 1.0), Some(GridPosition::new(40, 4, 8, 8)));
        assert_eq!(g.preview_rect(), Some(Rect::new(400.0, 40.0, 80.0, 80.0)));
    }

    #[test]
    fn move_respects_zoom() {
        let mut g = GridController::new();
        begin(&mut g, None, GridPosition::new(0, 0, 4, 4), SizeMode::Free);
        assert_eq!(g.update(Point::new(40.0, 0.0), 2.0), Some(GridPosition::new(2, 0, 4, 4)));
    }

    #[test]
    fn east_resize_clamps_to_span_limits() {
        let mut g = GridController::new();
        begin(&mut g, Some(ResizeHandle::E), GridPosition::new(0, 0, 8, 8), SizeMode::Free);
        // Default max is 12 coarse = 48 fine.
        assert_eq!(g.update(Point::new(1000.0, 0.0), 1.0), Some(GridPosition::new(0, 0, 48, 8)));
        // Min is 1 coarse = 4 fine.
        assert_eq!(g.update(Point::new(-1000.0, 0.0), 1.0), Some(GridPosition::new(0, 0, 4, 8)));
    }

    #[test]
    fn west_resize_keeps_right_edge() {
        let mut g = GridController::new();
        begin(&mut g, Some(ResizeHandle::W), GridPosition::new(10, 0, 8, 8), SizeMode::Free);
        let p = g.update(Point::new(-30.0, 0.0), 1.0).unwrap();
        assert_eq!(p, GridPosition::new(7, 0, 11, 8));
        let p = g.update(Point::new(-500.0, 0.0), 1.0).unwrap();
        assert_eq!(p, GridPosition::new(0, 0, 18, 8));
        assert_eq!(p.col_end(), 18);
    }

    #[test]
    fn fixed_ratio_resize_derives_rows() {
        let mut g = GridController::new();
        begin(&mut g, Some(ResizeHandle::E), GridPosition::new(0, 0, 8, 4), SizeMode::FixedRatio(2.0));
        // Cells are square, so 12 columns at 2:1 need 6 rows.
        assert_eq!(g.update(Point::new(40.0, 0.0), 1.0), Some(GridPosition::new(0, 0, 12, 6)));
    }

    #[test]
    fn commit_and_cancel() {
        let mut g = GridController::new();
        begin(&mut g, None, GridPosition::new(0, 0, 4, 4), SizeMode::Free);
        g.update(Point::new(10.0, 10.0), 1.0);
        assert_eq!(
            g.end(),
            Some(Commit::GridPosition {
                id: EntityId::intern("grid_item"),
                position: GridPosition::new(1, 1, 4, 4)
            })
        );

        begin(&mut g, None, GridPosition::new(0, 0, 4, 4), SizeMode::Free);
        g.update(Point::new(10.0, 10.0), 1.0);
        g.cancel();
        assert_eq!(g.end(), None);
        assert!(!g.is_active());
    }
}
