//! Drag controller: `Idle → Active → Idle`.
//!
//! The preview position lives here until the gesture ends; the document is
//! only touched by the commit the caller applies from [`DragController::end`].

use crate::error::GestureError;
use crate::session::{GestureContext, InteractionSession};
use ab_core::align::guides_touching;
use ab_core::{AlignmentGuide, Commit, EntityId, Point, Rect, Size, resolve_snap};

/// Keep `origin` so a rect of `size` stays inside `container`.
pub(crate) fn clamp_origin(origin: Point, size: Size, container: Option<Size>) -> Point {
    match container {
        Some(c) if !c.is_degenerate() => Point::new(
            origin.x.clamp(0.0, (c.width - size.width).max(0.0)),
            origin.y.clamp(0.0, (c.height - size.height).max(0.0)),
        ),
        _ => origin,
    }
}

#[derive(Debug, Default)]
pub struct DragController {
    session: Option<InteractionSession>,
    preview: Option<Point>,
    guides: Vec<AlignmentGuide>,
}

impl DragController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    pub fn session(&self) -> Option<&InteractionSession> {
        self.session.as_ref()
    }

    /// Uncommitted position, if the pointer has moved since begin.
    pub fn preview(&self) -> Option<Point> {
        self.preview
    }

    pub fn guides(&self) -> &[AlignmentGuide] {
        &self.guides
    }

    /// Start dragging `entity` from screen point `mouse`.
    ///
    /// # Errors
    /// `SessionActive` if a drag is already running.
    pub fn begin(&mut self, entity: EntityId, mouse: Point, start_rect: Rect) -> Result<(), GestureError> {
        if let Some(active) = &self.session {
            return Err(GestureError::SessionActive {
                active: active.entity,
            });
        }
        log::debug!("drag begin {entity} at {mouse:?}");
        self.session = Some(InteractionSession {
            entity,
            anchor_mouse: mouse,
            start_rect,
            handle: None,
        });
        self.preview = None;
        self.guides.clear();
        Ok(())
    }

    /// Recompute the preview for pointer `mouse`. No-op while idle.
    pub fn update(&mut self, mouse: Point, ctx: &GestureContext<'_>) -> Option<Point> {
        let session = self.session?;
        let mut delta = session.world_delta(mouse, ctx.scale);
        if ctx.constrain_axis {
            if delta.x.abs() > delta.y.abs() {
                delta.y = 0.0;
            } else {
                delta.x = 0.0;
            }
        }
        let size = session.start_rect.size();
        let raw = session.start_rect.origin() + delta;
        let snapped = resolve_snap(raw, size, session.entity, ctx.siblings, ctx.snap, ctx.bypass);
        let position = clamp_origin(snapped.position, size, ctx.container);

        self.guides = if position == snapped.position {
            snapped.guides
        } else {
            guides_touching(&Rect::from_origin_size(position, size), &snapped.guides)
        };
        self.preview = Some(position);
        log::trace!("drag {} preview {position:?} ({:?})", session.entity, snapped.source);
        self.preview
    }

    /// Finish the gesture. Returns the commit if the pointer ever moved.
    pub fn end(&mut self) -> Option<Commit> {
        let session = self.session.take()?;
        self.guides.clear();
        let point = self.preview.take()?;
        log::debug!("drag commit {} → {point:?}", session.entity);
        Some(Commit::Position {
            id: session.entity,
            point,
        })
    }

    /// Abort without committing.
    pub fn cancel(&mut self) {
        if let Some(session) = self.session.take() {
            log::debug!("drag cancel {}", session.entity);
        }
        self.preview = None;
        self.guides.clear();
    }
}
