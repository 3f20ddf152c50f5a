//! Collision-aware placement for newly inserted and duplicated rects.
//!
//! Candidate anchors are the container origin plus every spot just past an
//! existing rect (right edge + gap, bottom edge + gap). They are scanned row
//! by row, top to bottom and left to right, and the first one that fits the
//! container without overlapping anything wins.

use crate::config::PlacementConfig;
use crate::geometry::{Point, Rect, Size};

/// Overlap predicate shared by placement and duplication. Touching counts.
pub fn rects_overlap(a: &Rect, b: &Rect) -> bool {
    a.overlaps(b)
}

fn sorted_unique(mut values: Vec<f64>) -> Vec<f64> {
    values.retain(|v| v.is_finite());
    values.sort_by(f64::total_cmp);
    values.dedup();
    values
}

fn fits(candidate: &Rect, container: Size) -> bool {
    candidate.x >= 0.0
        && candidate.y >= 0.0
        && candidate.right() <= container.width
        && candidate.bottom() <= container.height
}

fn is_free(candidate: &Rect, existing: &[Rect]) -> bool {
    !existing.iter().any(|r| rects_overlap(candidate, r))
}

fn clamp_into(p: Point, size: Size, container: Size) -> Point {
    let max_x = (container.width - size.width).max(0.0);
    let max_y = (container.height - size.height).max(0.0);
    Point::new(p.x.clamp(0.0, max_x), p.y.clamp(0.0, max_y))
}

/// Position for a new rect of `size` among `existing`, inside `container`.
///
/// A zero or negative container places at the origin. When no candidate is
/// free, the rect cascades diagonally from the last existing rect, wrapping
/// to a new row if it would run past the right edge.
pub fn find_initial_position(
    size: Size,
    existing: &[Rect],
    container: Size,
    config: &PlacementConfig,
) -> Point {
    if container.is_degenerate() {
        return Point::ORIGIN;
    }
    let size = Size::new(size.width.max(0.0), size.height.max(0.0));

    let xs = sorted_unique(
        std::iter::once(0.0)
            .chain(existing.iter().map(|r| r.right() + config.gap))
            .collect(),
    );
    let ys = sorted_unique(
        std::iter::once(0.0)
            .chain(existing.iter().map(|r| r.bottom() + config.gap))
            .collect(),
    );

    for &y in &ys {
        for &x in &xs {
            let candidate = Rect::from_origin_size(Point::new(x, y), size);
            if fits(&candidate, container) && is_free(&candidate, existing) {
                return candidate.origin();
            }
        }
    }

    let Some(last) = existing.last() else {
        return Point::ORIGIN;
    };
    let mut p = last.origin() + Point::new(config.cascade_offset, config.cascade_offset);
    if p.x + size.width > container.width {
        p = Point::new(0.0, last.bottom() + config.gap);
    }
    let placed = clamp_into(p, size, container);
    log::debug!(
        "placement: no free slot for {}×{}, cascading to ({}, {})",
        size.width,
        size.height,
        placed.x,
        placed.y
    );
    placed
}

/// Position for a copy of `source`.
///
/// Tries slots stepping right of the source by its width plus gap, then rows
/// below it. Falls back to [`find_initial_position`].
pub fn find_duplicate_position(
    source: &Rect,
    siblings: &[Rect],
    container: Size,
    config: &PlacementConfig,
) -> Point {
    let size = source.size();
    let step_x = size.width + config.gap;
    let step_y = size.height + config.gap;

    let mut occupied: Vec<Rect> = siblings.to_vec();
    occupied.push(*source);

    if !container.is_degenerate() && step_x > 0.0 && step_y > 0.0 {
        let mut row = 0u32;
        loop {
            let y = source.y + f64::from(row) * step_y;
            if y + size.height > container.height {
                break;
            }
            // First row starts beside the source, later rows under it.
            let mut col = u32::from(row == 0);
            loop {
                let x = source.x + f64::from(col) * step_x;
                if x + size.width > container.width {
                    break;
                }
                let candidate = Rect::from_origin_size(Point::new(x, y), size);
                if fits(&candidate, container) && is_free(&candidate, &occupied) {
                    return candidate.origin();
                }
                col += 1;
            }
            row += 1;
        }
    }

    find_initial_position(size, &occupied, container, config)
}
