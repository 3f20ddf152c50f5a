//! Gesture sessions and the host seam.
//!
//! A session exists only between the begin and the end of one drag or
//! resize. While it is alive the host keeps global pointer listeners
//! attached; [`ListenerGuard`] owns that subscription and releases it when
//! dropped, whichever way the gesture ends.

use ab_core::config::SnapConfig;
use ab_core::{EntityBounds, EntityId, GridPosition, Point, Rect, ResizeHandle, Size};
use std::rc::Rc;

/// Callbacks into the embedding UI.
///
/// All calls are synchronous and happen on the event that caused them.
pub trait EditorHost {
    /// Start delivering pointer-move/up to the editor even outside the canvas.
    fn attach_pointer_listeners(&self);
    fn detach_pointer_listeners(&self);
    /// A gesture began on `id`; the host marks it selected.
    fn on_select(&self, id: EntityId);
    fn on_position_change(&self, id: EntityId, position: Point);
    fn on_bounds_change(&self, id: EntityId, rect: Rect);
    fn on_update_grid_position(&self, id: EntityId, position: GridPosition);
}

/// Scoped pointer-listener subscription.
#[must_use = "dropping the guard detaches the listeners immediately"]
pub struct ListenerGuard<H: EditorHost + ?Sized> {
    host: Rc<H>,
}

impl<H: EditorHost + ?Sized> ListenerGuard<H> {
    pub fn acquire(host: &Rc<H>) -> Self {
        host.attach_pointer_listeners();
        Self {
            host: Rc::clone(host),
        }
    }
}

impl<H: EditorHost + ?Sized> Drop for ListenerGuard<H> {
    fn drop(&mut self) {
        self.host.detach_pointer_listeners();
    }
}

impl<H: EditorHost + ?Sized> std::fmt::Debug for ListenerGuard<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ListenerGuard")
    }
}

/// State captured when a gesture begins.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InteractionSession {
    pub entity: EntityId,
    /// Pointer position at begin, screen space.
    pub anchor_mouse: Point,
    /// Committed rect at begin, parent space.
    pub start_rect: Rect,
    pub handle: Option<ResizeHandle>,
}

impl InteractionSession {
    /// Pointer travel since begin, in world units.
    pub fn world_delta(&self, mouse: Point, scale: f64) -> Point {
        let scale = if scale == 0.0 || !scale.is_finite() {
            1.0
        } else {
            scale
        };
        (mouse - self.anchor_mouse) * (1.0 / scale)
    }
}

/// Per-update inputs for the pixel controllers.
///
/// Siblings and container come fresh from the document on every update.
#[derive(Debug, Clone, Copy)]
pub struct GestureContext<'a> {
    pub scale: f64,
    pub siblings: &'a [EntityBounds],
    /// `None` on the open canvas.
    pub container: Option<Size>,
    pub snap: &'a SnapConfig,
    /// Alt held: skip snapping.
    pub bypass: bool,
    /// Shift held: lock a drag to its dominant axis.
    pub constrain_axis: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[derive(Default)]
    struct Counter {
        attached: Cell<u32>,
        detached: Cell<u32>,
    }

    impl EditorHost for Counter {
        fn attach_pointer_listeners(&self) {
            self.attached.set(self.attached.get() + 1);
        }
        fn detach_pointer_listeners(&self) {
            self.detached.set(self.detached.get() + 1);
        }
        fn on_select(&self, _: EntityId) {}
        fn on_position_change(&self, _: EntityId, _: Point) {}
        fn on_bounds_change(&self, _: EntityId, _: Rect) {}
        fn on_update_grid_position(&self, _: EntityId, _: GridPosition) {}
    }

    #[test]
    fn guard_detaches_on_drop() {
        let host = Rc::new(Counter::default());
        {
            let _guard = ListenerGuard::acquire(&host);
            assert_eq!(host.attached.get(), 1);
            assert_eq!(host.detached.get(), 0);
        }
        assert_eq!(host.detached.get(), 1);
    }

    #[test]
    fn guard_detaches_during_unwind() {
        let host = Rc::new(Counter::default());
        let h = Rc::clone(&host);
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(move || {
            let _guard = ListenerGuard::acquire(&h);
            panic!("gesture handler blew up");
        }));
        assert!(result.is_err());
        assert_eq!(host.detached.get(), 1);
    }

    #[test]
    fn world_delta_divides_by_scale() {
        let s = InteractionSession {
            entity: EntityId::intern("delta"),
            anchor_mouse: Point::new(10.0, 10.0),
            start_rect: Rect::default(),
            handle: None,
        };
        assert_eq!(s.world_delta(Point::new(30.0, 50.0), 2.0), Point::new(10.0, 20.0));
        assert_eq!(s.world_delta(Point::new(30.0, 50.0), 0.0), Point::new(20.0, 40.0));
    }
}
