//! Resize controller.
//!
//! Per update: raw rect from the handle, min/max clamp (including the room
//! left in the container), snap, aspect lock, re-clamp. Edges opposite the
//! handle never move.

use crate::error::GestureError;
use crate::session::{GestureContext, InteractionSession};
use ab_core::align::guides_touching;
use ab_core::{
    AlignmentGuide, Commit, EntityId, Point, Rect, ResizeHandle, SizeConstraints, Size,
    resolve_resize_snap,
};

/// Rect a handle would produce for a world-space pointer delta.
pub fn raw_resize(start: Rect, handle: ResizeHandle, delta: Point) -> Rect {
    let mut r = start;
    if handle.moves_east() {
        r.width = start.width + delta.x;
    } else if handle.moves_west() {
        r.x = start.x + delta.x;
        r.width = start.width - delta.x;
    }
    if handle.moves_south() {
        r.height = start.height + delta.y;
    } else if handle.moves_north() {
        r.y = start.y + delta.y;
        r.height = start.height - delta.y;
    }
    r
}

/// Put the pinned edges back where they were at begin.
fn pin(mut r: Rect, start: Rect, handle: ResizeHandle) -> Rect {
    if handle.moves_west() {
        r.x = start.right() - r.width;
    }
    if handle.moves_north() {
        r.y = start.bottom() - r.height;
    }
    r
}

/// Tighten `max` by the space the container leaves in the direction of the handle.
fn limit_to_container(
    mut c: SizeConstraints,
    start: Rect,
    handle: ResizeHandle,
    container: Option<Size>,
) -> SizeConstraints {
    let Some(box_) = container.filter(|s| !s.is_degenerate()) else {
        return c;
    };
    if handle.moves_east() {
        c.max.width = c.max.width.min((box_.width - start.x).max(0.0));
    } else if handle.moves_west() {
        c.max.width = c.max.width.min(start.right().max(0.0));
    }
    if handle.moves_south() {
        c.max.height = c.max.height.min((box_.height - start.y).max(0.0));
    } else if handle.moves_north() {
        c.max.height = c.max.height.min(start.bottom().max(0.0));
    }
    c
}

fn clamp_size(r: Rect, c: &SizeConstraints) -> Rect {
    Rect {
        width: c.clamp_width(r.width),
        height: c.clamp_height(r.height),
        ..r
    }
}

/// Whether width drives an aspect-locked resize from `handle`.
fn width_drives(handle: ResizeHandle, start: Rect, r: Rect) -> bool {
    match handle {
        ResizeHandle::E | ResizeHandle::W => true,
        ResizeHandle::N | ResizeHandle::S => false,
        _ => {
            let rel = |now: f64, was: f64| {
                if was > 0.0 {
                    (now / was - 1.0).abs()
                } else {
                    (now - was).abs()
                }
            };
            rel(r.width, start.width) >= rel(r.height, start.height)
        }
    }
}

/// Recompute the non-driving dimension, then fix it up once more if the
/// constraints clipped either side.
fn apply_ratio(r: Rect, ratio: f64, by_width: bool, c: &SizeConstraints) -> Rect {
    let (mut w, mut h) = if by_width {
        (r.width, r.width / ratio)
    } else {
        (r.height * ratio, r.height)
    };
    let (cw, ch) = (c.clamp_width(w), c.clamp_height(h));
    if ch != h {
        h = ch;
        w = c.clamp_width(h * ratio);
    } else if cw != w {
        w = cw;
        h = c.clamp_height(w / ratio);
    }
    Rect {
        width: w,
        height: h,
        ..r
    }
}

#[derive(Debug, Default)]
pub struct ResizeController {
    session: Option<InteractionSession>,
    constraints: SizeConstraints,
    preview: Option<Rect>,
    guides: Vec<AlignmentGuide>,
}

impl ResizeController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    pub fn session(&self) -> Option<&InteractionSession> {
        self.session.as_ref()
    }

    pub fn preview(&self) -> Option<Rect> {
        self.preview
    }

    pub fn guides(&self) -> &[AlignmentGuide] {
        &self.guides
    }

    /// # Errors
    /// `SessionActive` if a resize is already running.
    pub fn begin(
        &mut self,
        entity: EntityId,
        handle: ResizeHandle,
        mouse: Point,
        start_rect: Rect,
        constraints: SizeConstraints,
    ) -> Result<(), GestureError> {
        if let Some(active) = &self.session {
            return Err(GestureError::SessionActive {
                active: active.entity,
            });
        }
        log::debug!("resize begin {entity} via {handle:?}");
        self.session = Some(InteractionSession {
            entity,
            anchor_mouse: mouse,
            start_rect,
            handle: Some(handle),
        });
        self.constraints = constraints;
        self.preview = None;
        self.guides.clear();
        Ok(())
    }

    pub fn update(&mut self, mouse: Point, ctx: &GestureContext<'_>) -> Option<Rect> {
        let session = self.session?;
        let handle = session.handle?;
        let start = session.start_rect;
        let limits = limit_to_container(self.constraints, start, handle, ctx.container);

        let raw = raw_resize(start, handle, session.world_delta(mouse, ctx.scale));
        let clamped = pin(clamp_size(raw, &limits), start, handle);
        let snapped = resolve_resize_snap(
            clamped,
            start,
            handle,
            session.entity,
            ctx.siblings,
            ctx.snap,
            ctx.bypass,
        );

        let mut rect = clamp_size(snapped.rect, &limits);
        if let Some(ratio) = self.constraints.ratio() {
            rect = apply_ratio(rect, ratio, width_drives(handle, start, rect), &limits);
        }
        let rect = pin(rect, start, handle).clamped();

        self.guides = guides_touching(&rect, &snapped.guides);
        self.preview = Some(rect);
        log::trace!("resize {} preview {rect:?} ({:?})", session.entity, snapped.source);
        self.preview
    }

    pub fn end(&mut self) -> Option<Commit> {
        let session = self.session.take()?;
        self.guides.clear();
        let rect = self.preview.take()?;
        log::debug!("resize commit {} → {rect:?}", session.entity);
        Some(Commit::Bounds {
            id: session.entity,
            rect,
        })
    }

    pub fn cancel(&mut self) {
        if let Some(session) = self.session.take() {
            log::debug!("resize cancel {}", session.entity);
        }
        self.preview = None;
        self.guides.clear();
    }
}
