//! Smart alignment guides.
//!
//! Each rect contributes three reference lines per axis: left/center/right
//! (vertical lines, compared on x) and top/center/bottom (horizontal lines,
//! compared on y). A moving rect line within the threshold of a sibling line
//! produces a guide at the sibling's coordinate.

use crate::geometry::{EntityBounds, Point, Rect, Size};
use crate::id::EntityId;
use serde::Serialize;
use smallvec::SmallVec;

/// Guides closer than this on the same axis are drawn as one line.
pub const GUIDE_MERGE_TOLERANCE: f64 = 1.0;

/// Tolerance for "the snapped rect lies on this guide".
const ON_GUIDE_EPSILON: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    /// A vertical line; `position` is an x coordinate.
    Vertical,
    /// A horizontal line; `position` is a y coordinate.
    Horizontal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlignmentGuide {
    pub axis: Axis,
    pub position: f64,
    pub member_ids: SmallVec<[EntityId; 4]>,
}

/// The three reference lines of `rect` on `axis`, in edge/center/edge order.
fn reference_lines(rect: &Rect, axis: Axis) -> [f64; 3] {
    match axis {
        Axis::Vertical => [rect.left(), rect.center().x, rect.right()],
        Axis::Horizontal => [rect.top(), rect.center().y, rect.bottom()],
    }
}

/// Offsets of the reference lines from the rect origin along `axis`.
fn line_offsets(size: Size, axis: Axis) -> [f64; 3] {
    match axis {
        Axis::Vertical => [0.0, size.width / 2.0, size.width],
        Axis::Horizontal => [0.0, size.height / 2.0, size.height],
    }
}

fn push_guide(guides: &mut Vec<AlignmentGuide>, axis: Axis, position: f64, member: EntityId) {
    if let Some(existing) = guides
        .iter_mut()
        .find(|g| g.axis == axis && (g.position - position).abs() <= GUIDE_MERGE_TOLERANCE)
    {
        if !existing.member_ids.contains(&member) {
            existing.member_ids.push(member);
        }
        return;
    }
    let mut member_ids = SmallVec::new();
    member_ids.push(member);
    guides.push(AlignmentGuide {
        axis,
        position,
        member_ids,
    });
}

/// Find every guide the moving rect is currently near.
///
/// The moving entity itself is skipped by id. Output is sorted by axis then
/// position so downstream tie-breaking is repeatable.
pub fn find_alignment_guides(
    moving: &EntityBounds,
    siblings: &[EntityBounds],
    threshold: f64,
) -> Vec<AlignmentGuide> {
    let moving_rect = moving.rect();
    let mut guides = Vec::new();

    for sibling in siblings.iter().filter(|s| s.id != moving.id) {
        let sibling_rect = sibling.rect();
        for axis in [Axis::Vertical, Axis::Horizontal] {
            let ours = reference_lines(&moving_rect, axis);
            let theirs = reference_lines(&sibling_rect, axis);
            for m in ours {
                for s in theirs {
                    if (m - s).abs() <= threshold {
                        push_guide(&mut guides, axis, s, sibling.id);
                    }
                }
            }
        }
    }

    guides.sort_by(|a, b| {
        (a.axis as u8)
            .cmp(&(b.axis as u8))
            .then(a.position.total_cmp(&b.position))
    });
    guides
}

/// Closest guide line to `value` on `axis` within `threshold`.
///
/// Returns the guide position. Ties keep the earlier guide.
pub fn nearest_guide(guides: &[AlignmentGuide], axis: Axis, value: f64, threshold: f64) -> Option<f64> {
    let mut best: Option<(f64, f64)> = None;
    for g in guides.iter().filter(|g| g.axis == axis) {
        let d = (g.position - value).abs();
        if d <= threshold && best.is_none_or(|(bd, _)| d < bd) {
            best = Some((d, g.position));
        }
    }
    best.map(|(_, pos)| pos)
}

/// Move `position` so the closest edge/center lands exactly on a guide.
///
/// Each axis is snapped independently; an axis with no guide within
/// `threshold` is left untouched.
pub fn snap_to_guides(
    position: Point,
    size: Size,
    guides: &[AlignmentGuide],
    threshold: f64,
) -> Point {
    let snap_axis = |origin: f64, axis: Axis| -> f64 {
        let mut best: Option<(f64, f64)> = None;
        for offset in line_offsets(size, axis) {
            if let Some(target) = nearest_guide(guides, axis, origin + offset, threshold) {
                let d = (target - (origin + offset)).abs();
                if best.is_none_or(|(bd, _)| d < bd) {
                    best = Some((d, target - offset));
                }
            }
        }
        best.map_or(origin, |(_, snapped)| snapped)
    };

    Point::new(
        snap_axis(position.x, Axis::Vertical),
        snap_axis(position.y, Axis::Horizontal),
    )
}

/// Guides that `rect` actually lies on (edge or center coincident).
pub fn guides_touching(rect: &Rect, guides: &[AlignmentGuide]) -> Vec<AlignmentGuide> {
    guides
        .iter()
        .filter(|g| {
            reference_lines(rect, g.axis)
                .iter()
                .any(|line| (line - g.position).abs() <= ON_GUIDE_EPSILON)
        })
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bounds(id: &str, x: f64, y: f64, w: f64, h: f64) -> EntityBounds {
        EntityBounds::new(EntityId::intern(id), Rect::new(x, y, w, h))
    }

    #[test]
    fn right_edge_of_sibling_attracts_left_edge() {
        let moving = bounds("mover", 101.0, 50.0, 40.0, 20.0);
        let sibling = bounds("anchor", 0.0, 50.0, 100.0, 20.0);
        let guides = find_alignment_guides(&moving, &[sibling], 5.0);
        assert!(
            guides
                .iter()
                .any(|g| g.axis == Axis::Vertical && g.position == 100.0)
        );
        let snapped = snap_to_guides(moving.rect().origin(), moving.rect().size(), &guides, 5.0);
        assert_eq!(snapped, Point::new(100.0, 50.0));
    }

    #[test]
    fn self_is_skipped() {
        let moving = bounds("solo", 0.0, 0.0, 10.0, 10.0);
        assert!(find_alignment_guides(&moving, &[moving], 5.0).is_empty());
    }

    #[test]
    fn coincident_guides_merge_members() {
        let moving = bounds("m", 50.0, 200.0, 20.0, 20.0);
        let a = bounds("a", 50.0, 0.0, 30.0, 30.0);
        let b = bounds("b", 50.5, 100.0, 30.0, 30.0);
        let guides = find_alignment_guides(&moving, &[a, b], 2.0);
        let left: Vec<_> = guides
            .iter()
            .filter(|g| g.axis == Axis::Vertical && (g.position - 50.0).abs() <= 1.0)
            .collect();
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].member_ids.len(), 2);
    }

    #[test]
    fn far_siblings_produce_nothing() {
        let moving = bounds("m", 0.0, 0.0, 10.0, 10.0);
        let far = bounds("far", 500.0, 500.0, 10.0, 10.0);
        assert!(find_alignment_guides(&moving, &[far], 5.0).is_empty());
    }

    #[test]
    fn center_alignment_snaps_exactly() {
        // Sibling center x = 50; moving center x = 52.5 → snap x to 40.
        let moving = bounds("m", 42.5, 300.0, 20.0, 10.0);
        let sibling = bounds("s", 0.0, 0.0, 100.0, 10.0);
        let guides = find_alignment_guides(&moving, &[sibling], 3.0);
        let snapped = snap_to_guides(moving.rect().origin(), moving.rect().size(), &guides, 3.0);
        assert_eq!(snapped.x + 10.0, 50.0);
        assert_eq!(snapped.y, 300.0);
    }

    #[test]
    fn touching_filters_to_lines_on_rect() {
        let moving = bounds("m", 101.0, 50.0, 40.0, 20.0);
        let sibling = bounds("s", 0.0, 50.0, 100.0, 20.0);
        let guides = find_alignment_guides(&moving, &[sibling], 5.0);
        let snapped = Rect::new(100.0, 50.0, 40.0, 20.0);
        let active = guides_touching(&snapped, &guides);
        assert!(active.iter().all(|g| {
            reference_lines(&snapped, g.axis)
                .iter()
                .any(|l| (l - g.position).abs() < 1e-6)
        }));
        assert!(active.iter().any(|g| g.axis == Axis::Vertical));
    }
}
