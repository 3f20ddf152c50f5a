//! The editor: one document, one viewport, at most one gesture.
//!
//! Host input arrives here and is routed to the drag, resize or grid
//! controller that owns the active session. Previews stay in the
//! controllers; the document changes only when a gesture commits, after
//! which the host is told through [`EditorHost`].

use crate::drag::DragController;
use crate::error::GestureError;
use crate::grid::GridController;
use crate::hit::{hit_test, hit_test_handle};
use crate::input::{InputEvent, Modifiers};
use crate::resize::ResizeController;
use crate::session::{EditorHost, GestureContext, ListenerGuard};
use crate::shortcuts::{ShortcutAction, ShortcutMap};
use ab_core::{
    AlignmentGuide, CanvasResult, Commit, Document, EntityId, EntityKind, Point, Rect,
    ResizeHandle, Viewport, WheelAction, WheelInput, WheelTracker, ZOrderOp,
};
use std::rc::Rc;

/// Whether the editor used an event. Hosts stop propagation on `Consumed`
/// so outer drag-and-drop layers never see a gesture the editor owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventDisposition {
    Consumed,
    Ignored,
}

impl EventDisposition {
    pub fn is_consumed(self) -> bool {
        self == Self::Consumed
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureKind {
    Drag,
    Resize,
    Grid,
}

/// The occupied session slot. Dropping it releases the pointer listeners.
struct ActiveSession<H: EditorHost> {
    kind: GestureKind,
    entity: EntityId,
    _guard: ListenerGuard<H>,
}

pub struct Editor<H: EditorHost> {
    document: Document,
    viewport: Viewport,
    wheel: WheelTracker,
    host: Rc<H>,
    drag: DragController,
    resize: ResizeController,
    grid: GridController,
    active: Option<ActiveSession<H>>,
    selected: Option<EntityId>,
}

impl<H: EditorHost> Editor<H> {
    pub fn new(document: Document, host: Rc<H>) -> Self {
        let config = *document.config();
        Self {
            viewport: Viewport::new(Viewport::default().size, config.scale),
            wheel: WheelTracker::new(config.wheel, config.zoom_step_in, config.zoom_step_out),
            document,
            host,
            drag: DragController::new(),
            resize: ResizeController::new(),
            grid: GridController::new(),
            active: None,
            selected: None,
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Direct document access for structural edits from the host.
    ///
    /// Callers should not mutate while a gesture is active; the running
    /// controller still holds the geometry captured at begin.
    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.document
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    pub fn set_viewport_size(&mut self, width: f64, height: f64) {
        self.viewport.set_size(width, height);
    }

    pub fn host(&self) -> &Rc<H> {
        &self.host
    }

    pub fn selected(&self) -> Option<EntityId> {
        self.selected
    }

    pub fn active_gesture(&self) -> Option<(GestureKind, EntityId)> {
        self.active.as_ref().map(|a| (a.kind, a.entity))
    }

    pub fn is_gesture_active(&self) -> bool {
        self.active.is_some()
    }

    // ─── Gesture begin ───────────────────────────────────────────────────

    fn check_idle(&self) -> Result<(), GestureError> {
        match &self.active {
            Some(a) => Err(GestureError::SessionActive { active: a.entity }),
            None => Ok(()),
        }
    }

    fn kind_of(&self, id: EntityId) -> Result<&EntityKind, GestureError> {
        self.document
            .get(id)
            .map(|e| &e.kind)
            .ok_or(GestureError::UnknownEntity(id))
    }

    /// Fill the session slot: select, attach listeners.
    fn occupy(&mut self, kind: GestureKind, entity: EntityId) {
        self.selected = Some(entity);
        self.host.on_select(entity);
        self.active = Some(ActiveSession {
            kind,
            entity,
            _guard: ListenerGuard::acquire(&self.host),
        });
    }

    /// Start moving `id`. Sub-grid components move in cells.
    ///
    /// # Errors
    /// `SessionActive`, `UnknownEntity`, or `NotDraggable` for the canvas.
    pub fn begin_drag(&mut self, id: EntityId, mouse: Point) -> Result<(), GestureError> {
        self.check_idle()?;
        if matches!(self.kind_of(id)?, EntityKind::Canvas) {
            return Err(GestureError::NotDraggable(id));
        }
        if let Some(ctx) = self.document.grid_context(id) {
            self.grid.begin(id, None, mouse, ctx)?;
            self.occupy(GestureKind::Grid, id);
        } else {
            let start = self.document.rect(id)?;
            self.drag.begin(id, mouse, start)?;
            self.occupy(GestureKind::Drag, id);
        }
        Ok(())
    }

    /// Start resizing `id` from `handle`. Sub-grid components resize in cells.
    ///
    /// # Errors
    /// `SessionActive`, `UnknownEntity`, or `NotResizable` for the canvas and
    /// artboards.
    pub fn begin_resize(&mut self, id: EntityId, handle: ResizeHandle, mouse: Point) -> Result<(), GestureError> {
        self.check_idle()?;
        if matches!(self.kind_of(id)?, EntityKind::Canvas | EntityKind::Artboard { .. }) {
            return Err(GestureError::NotResizable(id));
        }
        if let Some(ctx) = self.document.grid_context(id) {
            self.grid.begin(id, Some(handle), mouse, ctx)?;
            self.occupy(GestureKind::Grid, id);
        } else {
            let Some(entity) = self.document.get(id) else {
                return Err(GestureError::UnknownEntity(id));
            };
            let (start, constraints) = (entity.rect, entity.constraints);
            self.resize.begin(id, handle, mouse, start, constraints)?;
            self.occupy(GestureKind::Resize, id);
        }
        Ok(())
    }

    /// Start a cell-based move (`handle: None`) or resize of a sub-grid component.
    ///
    /// # Errors
    /// `SessionActive`, `UnknownEntity`, or `NotGridPlaced` if `id` is not
    /// inside a widget.
    pub fn begin_grid(&mut self, id: EntityId, handle: Option<ResizeHandle>, mouse: Point) -> Result<(), GestureError> {
        self.check_idle()?;
        self.kind_of(id)?;
        let ctx = self
            .document
            .grid_context(id)
            .ok_or(GestureError::NotGridPlaced(id))?;
        self.grid.begin(id, handle, mouse, ctx)?;
        self.occupy(GestureKind::Grid, id);
        Ok(())
    }

    // ─── Pointer routing ─────────────────────────────────────────────────

    /// Resize handle of the selection first, then the topmost entity.
    pub fn pointer_down(&mut self, screen: Point, _modifiers: Modifiers) -> EventDisposition {
        if self.active.is_some() {
            return EventDisposition::Consumed;
        }
        let world = self.viewport.screen_to_world(screen);

        if let Some(sel) = self.selected
            && let Some(handle) = self.handle_under(sel, world)
        {
            return match self.begin_resize(sel, handle, screen) {
                Ok(()) => EventDisposition::Consumed,
                Err(err) => {
                    log::warn!("resize refused: {err}");
                    EventDisposition::Ignored
                }
            };
        }

        let Some(target) = hit_test(&self.document, world) else {
            self.selected = None;
            return EventDisposition::Ignored;
        };
        match self.begin_drag(target, screen) {
            Ok(()) => EventDisposition::Consumed,
            Err(err) => {
                log::warn!("drag refused: {err}");
                EventDisposition::Ignored
            }
        }
    }

    fn handle_under(&self, id: EntityId, world: Point) -> Option<ResizeHandle> {
        match self.document.get(id)?.kind {
            EntityKind::Widget { .. } | EntityKind::Component { .. } => {}
            EntityKind::Canvas | EntityKind::Artboard { .. } => return None,
        }
        let rect = self.document.world_rect(id).ok()?;
        let slop = self
            .viewport
            .screen_dist_to_world(self.document.config().handle_slop_px);
        hit_test_handle(&rect, world, slop)
    }

    /// Feed a pointer position to the active controller.
    pub fn pointer_move(&mut self, screen: Point, modifiers: Modifiers) -> EventDisposition {
        let Some((kind, entity)) = self.active_gesture() else {
            return EventDisposition::Ignored;
        };
        let scale = self.viewport.safe_scale();
        if kind == GestureKind::Grid {
            self.grid.update(screen, scale);
            return EventDisposition::Consumed;
        }

        let siblings = self.document.siblings(entity).unwrap_or_default();
        let container = self.document.container_size(entity).ok().flatten();
        let snap = self.document.config().snap;
        let ctx = GestureContext {
            scale,
            siblings: &siblings,
            container,
            snap: &snap,
            bypass: modifiers.bypass_snap(),
            constrain_axis: modifiers.shift,
        };
        match kind {
            GestureKind::Drag => {
                self.drag.update(screen, &ctx);
            }
            GestureKind::Resize => {
                self.resize.update(screen, &ctx);
            }
            GestureKind::Grid => {}
        }
        EventDisposition::Consumed
    }

    /// Pointer released: update to the final position, then commit.
    pub fn pointer_up(&mut self, screen: Point, modifiers: Modifiers) -> EventDisposition {
        if self.active.is_none() {
            return EventDisposition::Ignored;
        }
        self.pointer_move(screen, modifiers);
        if let Err(err) = self.end_gesture() {
            log::warn!("commit rejected: {err}");
        }
        EventDisposition::Consumed
    }

    /// Capture lost mid-gesture: commit whatever preview exists.
    pub fn lost_pointer_capture(&mut self) -> EventDisposition {
        if self.active.is_none() {
            return EventDisposition::Ignored;
        }
        if let Err(err) = self.end_gesture() {
            log::warn!("commit rejected: {err}");
        }
        EventDisposition::Consumed
    }

    /// End the active gesture, committing its preview if there is one.
    ///
    /// The document is written first, then the host callback fires, then
    /// the listeners are released.
    ///
    /// # Errors
    /// `Document` if the document refused the commit; nothing is written and
    /// the host is not notified.
    pub fn end_gesture(&mut self) -> Result<Option<Commit>, GestureError> {
        let Some(active) = self.active.take() else {
            return Ok(None);
        };
        let commit = match active.kind {
            GestureKind::Drag => self.drag.end(),
            GestureKind::Resize => self.resize.end(),
            GestureKind::Grid => self.grid.end(),
        };
        let Some(commit) = commit else {
            log::debug!("gesture on {} ended without movement", active.entity);
            return Ok(None);
        };
        self.document.apply_commit(&commit)?;
        match commit {
            Commit::Position { id, point } => self.host.on_position_change(id, point),
            Commit::Bounds { id, rect } => self.host.on_bounds_change(id, rect),
            Commit::GridPosition { id, position } => self.host.on_update_grid_position(id, position),
        }
        drop(active);
        Ok(Some(commit))
    }

    /// Abort the active gesture. Returns whether one was running.
    pub fn cancel(&mut self) -> bool {
        let Some(active) = self.active.take() else {
            return false;
        };
        match active.kind {
            GestureKind::Drag => self.drag.cancel(),
            GestureKind::Resize => self.resize.cancel(),
            GestureKind::Grid => self.grid.cancel(),
        }
        true
    }

    // ─── Viewport & keyboard ─────────────────────────────────────────────

    pub fn wheel(&mut self, input: &WheelInput) -> WheelAction {
        let (next, action) = self.wheel.apply(&self.viewport, input);
        self.viewport = next;
        action
    }

    /// Resolve and run a shortcut. Returns the action if the key is bound.
    pub fn key_down(&mut self, key: &str, modifiers: Modifiers) -> Option<ShortcutAction> {
        let action = ShortcutMap::resolve(key, modifiers)?;
        let config = *self.document.config();
        match action {
            ShortcutAction::ZoomIn => {
                self.viewport = self.viewport.zoom_by(config.zoom_step_in, None);
            }
            ShortcutAction::ZoomOut => {
                self.viewport = self.viewport.zoom_by(config.zoom_step_out, None);
            }
            ShortcutAction::ResetZoom => self.viewport = self.viewport.reset_zoom(),
            ShortcutAction::CancelGesture => {
                self.cancel();
            }
            ShortcutAction::BringForward
            | ShortcutAction::SendBackward
            | ShortcutAction::BringToFront
            | ShortcutAction::SendToBack => {
                if let Some(id) = self.selected {
                    let op = match action {
                        ShortcutAction::BringForward => ZOrderOp::BringForward,
                        ShortcutAction::SendBackward => ZOrderOp::SendBackward,
                        ShortcutAction::BringToFront => ZOrderOp::BringToFront,
                        _ => ZOrderOp::SendToBack,
                    };
                    if let Err(err) = self.document.restack(id, op) {
                        log::warn!("restack failed: {err}");
                    }
                }
            }
            ShortcutAction::Duplicate | ShortcutAction::Delete => self.edit_selection(action),
        }
        Some(action)
    }

    fn edit_selection(&mut self, action: ShortcutAction) {
        let Some(id) = self.selected else {
            return;
        };
        if self.active.is_some() {
            log::debug!("ignoring {action:?} during a gesture");
            return;
        }
        match action {
            ShortcutAction::Duplicate => match self.document.duplicate(id) {
                Ok(copy) => {
                    self.selected = Some(copy);
                    self.host.on_select(copy);
                }
                Err(err) => log::warn!("duplicate failed: {err}"),
            },
            ShortcutAction::Delete => match self.document.remove(id) {
                Ok(()) => self.selected = None,
                Err(err) => log::warn!("delete failed: {err}"),
            },
            _ => {}
        }
    }

    pub fn restack(&mut self, id: EntityId, op: ZOrderOp) -> CanvasResult<bool> {
        self.document.restack(id, op)
    }

    // ─── Reads ───────────────────────────────────────────────────────────

    /// Rect to draw for `id`, parent-relative: the preview while it is being
    /// manipulated, the committed rect otherwise.
    pub fn display_rect(&self, id: EntityId) -> Option<Rect> {
        let committed = self.document.rect(id).ok()?;
        let Some(active) = self.active.as_ref().filter(|a| a.entity == id) else {
            return Some(committed);
        };
        let preview = match active.kind {
            GestureKind::Drag => self.drag.preview().map(|p| committed.with_origin(p)),
            GestureKind::Resize => self.resize.preview(),
            GestureKind::Grid => self.grid.preview_rect(),
        };
        Some(preview.unwrap_or(committed))
    }

    /// Alignment guides of the gesture in progress, in the moving entity's
    /// parent space.
    pub fn guides(&self) -> &[AlignmentGuide] {
        match self.active.as_ref().map(|a| a.kind) {
            Some(GestureKind::Drag) => self.drag.guides(),
            Some(GestureKind::Resize) => self.resize.guides(),
            Some(GestureKind::Grid) | None => &[],
        }
    }

    /// Route a normalized host event.
    pub fn handle(&mut self, event: &InputEvent) -> EventDisposition {
        match event {
            InputEvent::PointerDown { x, y, modifiers } => self.pointer_down(Point::new(*x, *y), *modifiers),
            InputEvent::PointerMove { x, y, modifiers } => self.pointer_move(Point::new(*x, *y), *modifiers),
            InputEvent::PointerUp { x, y, modifiers } => self.pointer_up(Point::new(*x, *y), *modifiers),
            InputEvent::LostPointerCapture => self.lost_pointer_capture(),
            InputEvent::Wheel {
                dx,
                dy,
                x,
                y,
                modifiers,
                timestamp_ms,
            } => {
                let input = WheelInput {
                    delta: Point::new(*dx, *dy),
                    pointer: Point::new(*x, *y),
                    zoom: modifiers.cmd(),
                    shift: modifiers.shift,
                    timestamp_ms: *timestamp_ms,
                };
                match self.wheel(&input) {
                    WheelAction::Ignored => EventDisposition::Ignored,
                    _ => EventDisposition::Consumed,
                }
            }
            InputEvent::Key { key, modifiers } => match self.key_down(key, *modifiers) {
                Some(_) => EventDisposition::Consumed,
                None => EventDisposition::Ignored,
            },
            InputEvent::Resize { width, height } => {
                self.set_viewport_size(*width, *height);
                EventDisposition::Consumed
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ab_core::{ArtboardFormat, GridPosition, Size};
    use std::cell::Cell;

    #[derive(Default)]
    struct Quiet {
        attached: Cell<i32>,
    }

    impl EditorHost for Quiet {
        fn attach_pointer_listeners(&self) {
            self.attached.set(self.attached.get() + 1);
        }
        fn detach_pointer_listeners(&self) {
            self.attached.set(self.attached.get() - 1);
        }
        fn on_select(&self, _: EntityId) {}
        fn on_position_change(&self, _: EntityId, _: Point) {}
        fn on_bounds_change(&self, _: EntityId, _: Rect) {}
        fn on_update_grid_position(&self, _: EntityId, _: GridPosition) {}
    }

    fn editor() -> (Editor<Quiet>, EntityId, EntityId) {
        let mut doc = Document::default();
        let board = doc
            .add_artboard(ArtboardFormat::Slide16x9, Some(Point::ORIGIN))
            .unwrap();
        let c = doc
            .add_component(board, "chart", Size::new(100.0, 100.0), Some(Point::new(100.0, 100.0)))
            .unwrap();
        (Editor::new(doc, Rc::new(Quiet::default())), board, c)
    }

    #[test]
    fn single_session_slot() {
        let (mut ed, board, c) = editor();
        ed.begin_drag(c, Point::ORIGIN).unwrap();
        assert!(matches!(
            ed.begin_drag(board, Point::ORIGIN),
            Err(GestureError::SessionActive { .. })
        ));
        assert!(matches!(
            ed.begin_resize(c, ResizeHandle::E, Point::ORIGIN),
            Err(GestureError::SessionActive { .. })
        ));
        assert_eq!(ed.host().attached.get(), 1);
        assert!(ed.cancel());
        assert_eq!(ed.host().attached.get(), 0);
    }

    #[test]
    fn refusals() {
        let (mut ed, board, c) = editor();
        let canvas = ed.document().canvas();
        assert!(matches!(ed.begin_drag(canvas, Point::ORIGIN), Err(GestureError::NotDraggable(_))));
        assert!(matches!(
            ed.begin_resize(board, ResizeHandle::Se, Point::ORIGIN),
            Err(GestureError::NotResizable(_))
        ));
        assert!(matches!(ed.begin_grid(c, None, Point::ORIGIN), Err(GestureError::NotGridPlaced(_))));
        let ghost = EntityId::intern("editor_ghost");
        assert!(matches!(ed.begin_drag(ghost, Point::ORIGIN), Err(GestureError::UnknownEntity(_))));
        assert_eq!(ed.host().attached.get(), 0);
    }

    #[test]
    fn display_rect_reads_preview_then_document() {
        let (mut ed, _, c) = editor();
        ed.begin_drag(c, Point::ORIGIN).unwrap();
        ed.pointer_move(Point::new(50.0, 0.0), Modifiers::ALT);
        assert_eq!(ed.display_rect(c), Some(Rect::new(150.0, 100.0, 100.0, 100.0)));
        assert_eq!(ed.document().rect(c).unwrap().x, 100.0);
        ed.lost_pointer_capture();
        assert_eq!(ed.document().rect(c).unwrap().x, 150.0);
        assert_eq!(ed.display_rect(c), Some(Rect::new(150.0, 100.0, 100.0, 100.0)));
    }

    #[test]
    fn keyboard_zoom_and_reset() {
        let (mut ed, _, _) = editor();
        assert_eq!(ed.key_down("=", Modifiers::CTRL), Some(ShortcutAction::ZoomIn));
        assert!((ed.viewport().scale - 1.1).abs() < 1e-12);
        ed.key_down("0", Modifiers::CTRL);
        assert_eq!(ed.viewport().scale, 1.0);
        assert_eq!(ed.key_down("q", Modifiers::NONE), None);
    }
}
