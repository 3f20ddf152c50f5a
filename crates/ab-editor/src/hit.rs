//! Hit testing: world point → entity, and point → resize handle.

use ab_core::{Document, EntityId, Point, Rect, ResizeHandle};

/// Topmost entity under `world`. Children are tested before their parent,
/// siblings front to back. The canvas itself is never hit.
pub fn hit_test(doc: &Document, world: Point) -> Option<EntityId> {
    let canvas = doc.canvas();
    hit_children(doc, canvas, Point::ORIGIN, world)
}

fn hit_children(doc: &Document, parent: EntityId, origin: Point, world: Point) -> Option<EntityId> {
    let children = doc.children_in_z_order(parent).ok()?;
    children
        .iter()
        .rev()
        .find_map(|child| hit_entity(doc, *child, origin, world))
}

fn hit_entity(doc: &Document, id: EntityId, origin: Point, world: Point) -> Option<EntityId> {
    let local = doc.rect(id).ok()?;
    let rect = local.with_origin(origin + local.origin());
    if let Some(hit) = hit_children(doc, id, rect.origin(), world) {
        return Some(hit);
    }
    rect.contains(world).then_some(id)
}

/// Resize handle of `rect` under `point`, within `slop` on either side.
///
/// Corners win over edges where they overlap.
pub fn hit_test_handle(rect: &Rect, point: Point, slop: f64) -> Option<ResizeHandle> {
    let slop = if slop.is_finite() { slop.abs() } else { 0.0 };
    let near = |a: f64, b: f64| (a - b).abs() <= slop;
    let within = |v: f64, lo: f64, hi: f64| v >= lo - slop && v <= hi + slop;

    ResizeHandle::ALL.into_iter().find(|handle| {
        let anchor = handle.anchor_on(rect);
        if handle.is_corner() {
            near(point.x, anchor.x) && near(point.y, anchor.y)
        } else if handle.moves_north() || handle.moves_south() {
            near(point.y, anchor.y) && within(point.x, rect.left(), rect.right())
        } else {
            near(point.x, anchor.x) && within(point.y, rect.top(), rect.bottom())
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ab_core::{ArtboardFormat, Size, ZOrderOp};

    #[test]
    fn deepest_topmost_wins() {
        let mut doc = Document::default();
        let board = doc
            .add_artboard(ArtboardFormat::Square, Some(Point::new(100.0, 100.0)))
            .unwrap();
        let low = doc
            .add_component(board, "chart", Size::new(200.0, 200.0), Some(Point::new(0.0, 0.0)))
            .unwrap();
        let high = doc
            .add_component(board, "text", Size::new(100.0, 100.0), Some(Point::new(50.0, 50.0)))
            .unwrap();

        // World (170, 170) is local (70, 70): inside both components.
        assert_eq!(hit_test(&doc, Point::new(170.0, 170.0)), Some(high));
        doc.restack(low, ZOrderOp::BringToFront).unwrap();
        assert_eq!(hit_test(&doc, Point::new(170.0, 170.0)), Some(low));

        // Inside the artboard but no component.
        assert_eq!(hit_test(&doc, Point::new(900.0, 900.0)), Some(board));
        // Open canvas.
        assert_eq!(hit_test(&doc, Point::new(50.0, 50.0)), None);
    }

    #[test]
    fn corners_before_edges() {
        let r = Rect::new(0.0, 0.0, 100.0, 50.0);
        assert_eq!(hit_test_handle(&r, Point::new(2.0, 1.0), 4.0), Some(ResizeHandle::Nw));
        assert_eq!(hit_test_handle(&r, Point::new(101.0, 49.0), 4.0), Some(ResizeHandle::Se));
        assert_eq!(hit_test_handle(&r, Point::new(50.0, -3.0), 4.0), Some(ResizeHandle::N));
        assert_eq!(hit_test_handle(&r, Point::new(103.0, 25.0), 4.0), Some(ResizeHandle::E));
        assert_eq!(hit_test_handle(&r, Point::new(50.0, 25.0), 4.0), None);
        assert_eq!(hit_test_handle(&r, Point::new(200.0, 25.0), 4.0), None);
    }
}
