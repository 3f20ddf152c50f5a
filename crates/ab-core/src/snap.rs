//! Snap resolver: one decision out of alignment and grid candidates.
//!
//! Both move and resize go through here. The decision rule is the same for
//! both: a candidate only counts if it changed the raw geometry; when both
//! did, the smaller displacement wins and an exact tie goes to alignment.
//! Grid snapping never produces visual guides.

use crate::align::{Axis, find_alignment_guides, guides_touching, nearest_guide, snap_to_guides, AlignmentGuide};
use crate::config::SnapConfig;
use crate::geometry::{EntityBounds, Point, Rect, ResizeHandle, Size};
use crate::id::EntityId;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SnapSource {
    None,
    Alignment,
    Grid,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SnapResult {
    pub position: Point,
    pub source: SnapSource,
    pub guides: Vec<AlignmentGuide>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResizeSnapResult {
    pub rect: Rect,
    pub source: SnapSource,
    pub guides: Vec<AlignmentGuide>,
}

/// Nearest multiple of `grid` to `value`, if within `threshold`.
pub fn snap_value_to_grid(value: f64, grid: f64, threshold: f64) -> Option<f64> {
    if grid <= 0.0 || !value.is_finite() {
        return None;
    }
    let nearest = (value / grid).round() * grid;
    ((nearest - value).abs() <= threshold).then_some(nearest)
}

/// Snap both axes of `p` independently to the grid.
pub fn snap_point_to_grid(p: Point, config: &SnapConfig) -> Point {
    let axis = |v: f64| snap_value_to_grid(v, config.grid_size_px, config.threshold_px).unwrap_or(v);
    Point::new(axis(p.x), axis(p.y))
}

/// Pick between candidates. `None` means the candidate left the input as-is.
fn choose<T>(alignment: Option<(T, f64)>, grid: Option<(T, f64)>) -> Option<(T, SnapSource)> {
    match (alignment, grid) {
        (Some((a, _)), None) => Some((a, SnapSource::Alignment)),
        (None, Some((g, _))) => Some((g, SnapSource::Grid)),
        (Some((a, da)), Some((g, dg))) => {
            if da <= dg {
                Some((a, SnapSource::Alignment))
            } else {
                Some((g, SnapSource::Grid))
            }
        }
        (None, None) => None,
    }
}

/// Resolve the snapped position of a moving rect.
///
/// `raw` is the unsnapped origin, `size` the rect size, `id` excludes the
/// moving entity from `siblings`. With `bypass` set (Alt held) or snapping
/// disabled, `raw` comes back unchanged with no guides.
pub fn resolve_snap(
    raw: Point,
    size: Size,
    id: EntityId,
    siblings: &[EntityBounds],
    config: &SnapConfig,
    bypass: bool,
) -> SnapResult {
    let unchanged = SnapResult {
        position: raw,
        source: SnapSource::None,
        guides: Vec::new(),
    };
    if bypass || !config.enabled {
        return unchanged;
    }

    let moving = EntityBounds::new(id, Rect::from_origin_size(raw, size));
    let guides = find_alignment_guides(&moving, siblings, config.threshold_px);
    let aligned = snap_to_guides(raw, size, &guides, config.threshold_px);
    let alignment = (aligned != raw).then(|| (aligned, aligned.manhattan(raw)));

    let gridded = snap_point_to_grid(raw, config);
    let grid = (gridded != raw).then(|| (gridded, gridded.manhattan(raw)));

    match choose(alignment, grid) {
        Some((position, SnapSource::Alignment)) => {
            let active = guides_touching(&Rect::from_origin_size(position, size), &guides);
            SnapResult {
                position,
                source: SnapSource::Alignment,
                guides: active,
            }
        }
        Some((position, source)) => SnapResult {
            position,
            source,
            guides: Vec::new(),
        },
        None => unchanged,
    }
}

/// Apply a per-edge snap function to the edges `handle` controls.
///
/// The opposite edge on each axis stays pinned to `start`.
fn snap_edges(
    raw: Rect,
    start: Rect,
    handle: ResizeHandle,
    mut snap: impl FnMut(Axis, f64) -> Option<f64>,
) -> Rect {
    let mut out = raw;
    if handle.moves_east() {
        if let Some(right) = snap(Axis::Vertical, raw.right()) {
            out.width = right - raw.x;
        }
    } else if handle.moves_west() {
        if let Some(left) = snap(Axis::Vertical, raw.left()) {
            out.x = left;
            out.width = start.right() - left;
        }
    }
    if handle.moves_south() {
        if let Some(bottom) = snap(Axis::Horizontal, raw.bottom()) {
            out.height = bottom - raw.y;
        }
    } else if handle.moves_north() {
        if let Some(top) = snap(Axis::Horizontal, raw.top()) {
            out.y = top;
            out.height = start.bottom() - top;
        }
    }
    out
}

/// Resolve the snapped rect of a resize in progress.
///
/// Only edges moved by `handle` are snapped. Output width/height are never
/// negative, snapping or not.
pub fn resolve_resize_snap(
    raw: Rect,
    start: Rect,
    handle: ResizeHandle,
    id: EntityId,
    siblings: &[EntityBounds],
    config: &SnapConfig,
    bypass: bool,
) -> ResizeSnapResult {
    let unchanged = ResizeSnapResult {
        rect: raw.clamped(),
        source: SnapSource::None,
        guides: Vec::new(),
    };
    if bypass || !config.enabled {
        return unchanged;
    }

    let threshold = config.threshold_px;
    let moving = EntityBounds::new(id, raw.clamped());
    let guides = find_alignment_guides(&moving, siblings, threshold);
    let aligned = snap_edges(raw, start, handle, |axis, edge| {
        nearest_guide(&guides, axis, edge, threshold)
    });
    let alignment = (aligned != raw).then(|| (aligned, aligned.displacement(&raw)));

    let gridded = snap_edges(raw, start, handle, |_, edge| {
        snap_value_to_grid(edge, config.grid_size_px, threshold)
    });
    let grid = (gridded != raw).then(|| (gridded, gridded.displacement(&raw)));

    match choose(alignment, grid) {
        Some((rect, SnapSource::Alignment)) => {
            let rect = rect.clamped();
            ResizeSnapResult {
                rect,
                source: SnapSource::Alignment,
                guides: guides_touching(&rect, &guides),
            }
        }
        Some((rect, source)) => ResizeSnapResult {
            rect: rect.clamped(),
            source,
            guides: Vec::new(),
        },
        None => unchanged,
    }
}
