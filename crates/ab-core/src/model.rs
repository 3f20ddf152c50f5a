//! The authoritative entity document.
//!
//! A containment tree rooted at the canvas:
//!
//! ```text
//! canvas ─┬─ artboard ─┬─ component
//!         │            └─ widget ── component (sub-grid placed)
//!         └─ artboard ...
//! ```
//!
//! Rects are stored relative to the parent's origin. Artboards sit on the
//! unbounded canvas; everything else lives inside its parent's box.
//! Interaction previews never write here; only [`Document::apply_commit`]
//! and the structural operations mutate the tree.

use crate::config::EngineConfig;
use crate::error::{CanvasError, CanvasResult};
use crate::geometry::{EntityBounds, Point, Rect, Size};
use crate::id::EntityId;
use crate::placement::{find_duplicate_position, find_initial_position};
use crate::subgrid::{GridGeometry, GridItem, GridPosition, SizeMode, SpanLimits, SubGrid, auto_place};
use crate::zorder::{Stacked, ZOrderOp, update_z_order};
use petgraph::Direction;
use petgraph::stable_graph::{NodeIndex, StableDiGraph};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ─── Entity kinds ────────────────────────────────────────────────────────

/// Fixed artboard formats. The size of an artboard never changes after
/// creation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtboardFormat {
    A4Portrait,
    A4Landscape,
    Slide16x9,
    Square,
    Custom(Size),
}

impl ArtboardFormat {
    pub fn size(&self) -> Size {
        match self {
            Self::A4Portrait => Size::new(794.0, 1123.0),
            Self::A4Landscape => Size::new(1123.0, 794.0),
            Self::Slide16x9 => Size::new(1920.0, 1080.0),
            Self::Square => Size::new(1080.0, 1080.0),
            Self::Custom(size) => Size::new(size.width.max(0.0), size.height.max(0.0)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EntityKind {
    Canvas,
    Artboard {
        format: ArtboardFormat,
    },
    Widget {
        grid: SubGrid,
    },
    Component {
        component_type: String,
        #[serde(default)]
        limits: SpanLimits,
        #[serde(default)]
        size_mode: SizeMode,
    },
}

impl EntityKind {
    /// Lowercase kind name, also used as the prefix of generated ids.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Canvas => "canvas",
            Self::Artboard { .. } => "artboard",
            Self::Widget { .. } => "widget",
            Self::Component { .. } => "component",
        }
    }

    /// Containment rules of the tree.
    pub fn can_contain(&self, child: &EntityKind) -> bool {
        matches!(
            (self, child),
            (Self::Canvas, Self::Artboard { .. })
                | (Self::Artboard { .. }, Self::Widget { .. } | Self::Component { .. })
                | (Self::Widget { .. }, Self::Component { .. })
        )
    }
}

/// Min/max size and optional aspect lock for resize.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SizeConstraints {
    pub min: Size,
    pub max: Size,
    /// Locked width / height.
    pub aspect_ratio: Option<f64>,
}

impl Default for SizeConstraints {
    fn default() -> Self {
        Self {
            min: Size::ZERO,
            max: Size::new(f64::MAX, f64::MAX),
            aspect_ratio: None,
        }
    }
}

impl SizeConstraints {
    pub fn clamp_width(&self, w: f64) -> f64 {
        let min = self.min.width.max(0.0);
        if !w.is_finite() {
            return min;
        }
        w.clamp(min, self.max.width.max(min))
    }

    pub fn clamp_height(&self, h: f64) -> f64 {
        let min = self.min.height.max(0.0);
        if !h.is_finite() {
            return min;
        }
        h.clamp(min, self.max.height.max(min))
    }

    pub fn clamp(&self, size: Size) -> Size {
        Size::new(self.clamp_width(size.width), self.clamp_height(size.height))
    }

    /// The aspect ratio, if set to something usable.
    pub fn ratio(&self) -> Option<f64> {
        self.aspect_ratio.filter(|r| r.is_finite() && *r > 0.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    pub kind: EntityKind,
    /// Relative to the parent's origin.
    pub rect: Rect,
    pub z_index: i32,
    /// Fine-cell position; only set for components inside a widget.
    pub grid_position: Option<GridPosition>,
    pub constraints: SizeConstraints,
}

impl Stacked for Entity {
    fn stack_id(&self) -> EntityId {
        self.id
    }

    fn z_index(&self) -> i32 {
        self.z_index
    }

    fn set_z_index(&mut self, z: i32) {
        self.z_index = z;
    }
}

// ─── Commits & payloads ──────────────────────────────────────────────────

/// The single geometry update a finished gesture delivers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Commit {
    Position { id: EntityId, point: Point },
    Bounds { id: EntityId, rect: Rect },
    GridPosition { id: EntityId, position: GridPosition },
}

impl Commit {
    pub fn id(&self) -> EntityId {
        match self {
            Self::Position { id, .. } | Self::Bounds { id, .. } | Self::GridPosition { id, .. } => *id,
        }
    }
}

/// A component dropped onto an artboard or widget by the host (palette
/// drag-and-drop, paste).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DropPayload {
    pub component_type: String,
    pub id: Option<EntityId>,
    pub width: f64,
    pub height: f64,
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub constraints: Option<SizeConstraints>,
    #[serde(default)]
    pub limits: SpanLimits,
    #[serde(default)]
    pub size_mode: SizeMode,
}

impl DropPayload {
    pub fn new(component_type: impl Into<String>, size: Size) -> Self {
        Self {
            component_type: component_type.into(),
            id: None,
            width: size.width,
            height: size.height,
            x: None,
            y: None,
            constraints: None,
            limits: SpanLimits::default(),
            size_mode: SizeMode::Free,
        }
    }

    /// Parse and validate a host payload.
    ///
    /// # Errors
    /// `MalformedPayload` for bad JSON, an empty type, or non-finite numbers.
    pub fn from_json(json: &str) -> CanvasResult<Self> {
        let payload: DropPayload = serde_json::from_str(json)?;
        payload.validate()?;
        Ok(payload)
    }

    fn validate(&self) -> CanvasResult<()> {
        if self.component_type.trim().is_empty() {
            return Err(CanvasError::malformed("component_type is empty"));
        }
        let numbers = [self.width, self.height, self.x.unwrap_or(0.0), self.y.unwrap_or(0.0)];
        if numbers.iter().any(|v| !v.is_finite()) {
            return Err(CanvasError::malformed("non-finite geometry in drop payload"));
        }
        Ok(())
    }

    fn explicit_origin(&self) -> Option<Point> {
        match (self.x, self.y) {
            (Some(x), Some(y)) => Some(Point::new(x, y)),
            _ => None,
        }
    }
}

/// Everything a grid gesture needs to know about a sub-grid placed component.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridContext {
    pub widget: EntityId,
    pub grid: SubGrid,
    pub geometry: GridGeometry,
    /// Span limits in fine cells.
    pub limits: SpanLimits,
    pub size_mode: SizeMode,
    pub position: GridPosition,
}

// ─── Document ────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct Document {
    graph: StableDiGraph<Entity, ()>,
    root: NodeIndex,
    id_index: HashMap<EntityId, NodeIndex>,
    config: EngineConfig,
}

impl Default for Document {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl Document {
    /// An empty canvas.
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        let mut graph = StableDiGraph::new();
        let canvas_id = EntityId::intern("canvas");
        let root = graph.add_node(Entity {
            id: canvas_id,
            kind: EntityKind::Canvas,
            rect: Rect::from_origin_size(Point::ORIGIN, config.canvas_extent),
            z_index: 0,
            grid_position: None,
            constraints: SizeConstraints::default(),
        });
        let mut id_index = HashMap::new();
        id_index.insert(canvas_id, root);
        Self {
            graph,
            root,
            id_index,
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// A sub-grid using the configured fine-grain factor.
    pub fn subgrid(&self, columns: u32, row_height: f64) -> SubGrid {
        SubGrid::new(columns, row_height, self.config.subgrid.factor)
    }

    pub fn canvas(&self) -> EntityId {
        self.graph[self.root].id
    }

    /// Number of entities, canvas included.
    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() <= 1
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.id_index.contains_key(&id)
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.id_index.get(&id).map(|idx| &self.graph[*idx])
    }

    fn index_of(&self, id: EntityId) -> CanvasResult<NodeIndex> {
        self.id_index
            .get(&id)
            .copied()
            .ok_or(CanvasError::UnknownEntity(id))
    }

    fn get_mut(&mut self, id: EntityId) -> CanvasResult<&mut Entity> {
        let idx = self.index_of(id)?;
        Ok(&mut self.graph[idx])
    }

    fn parent_index(&self, idx: NodeIndex) -> Option<NodeIndex> {
        self.graph.neighbors_directed(idx, Direction::Incoming).next()
    }

    pub fn parent(&self, id: EntityId) -> Option<EntityId> {
        let idx = self.id_index.get(&id)?;
        self.parent_index(*idx).map(|p| self.graph[p].id)
    }

    /// Children sorted back to front. Equal z falls back to insertion order
    /// so iteration is the same on every target.
    fn child_indices(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        let mut children: Vec<NodeIndex> = self
            .graph
            .neighbors_directed(idx, Direction::Outgoing)
            .collect();
        children.sort_by_key(|c| (self.graph[*c].z_index, *c));
        children
    }

    /// Child ids, back to front.
    ///
    /// # Errors
    /// `UnknownEntity` if `id` is not in the document.
    pub fn children_in_z_order(&self, id: EntityId) -> CanvasResult<Vec<EntityId>> {
        let idx = self.index_of(id)?;
        Ok(self
            .child_indices(idx)
            .into_iter()
            .map(|c| self.graph[c].id)
            .collect())
    }

    /// # Errors
    /// `UnknownEntity` if `id` is not in the document.
    pub fn rect(&self, id: EntityId) -> CanvasResult<Rect> {
        Ok(self.graph[self.index_of(id)?].rect)
    }

    /// World-space origin of the coordinate space `id` lives in.
    pub fn parent_origin(&self, id: EntityId) -> CanvasResult<Point> {
        let mut idx = self.index_of(id)?;
        let mut origin = Point::ORIGIN;
        while let Some(parent) = self.parent_index(idx) {
            if parent != self.root {
                origin = origin + self.graph[parent].rect.origin();
            }
            idx = parent;
        }
        Ok(origin)
    }

    /// Rect of `id` in world space.
    pub fn world_rect(&self, id: EntityId) -> CanvasResult<Rect> {
        let rect = self.rect(id)?;
        let origin = self.parent_origin(id)?;
        Ok(rect.with_origin(origin + rect.origin()))
    }

    /// Every other child of `id`'s parent, for alignment and collision.
    pub fn siblings(&self, id: EntityId) -> CanvasResult<Vec<EntityBounds>> {
        let idx = self.index_of(id)?;
        let Some(parent) = self.parent_index(idx) else {
            return Ok(Vec::new());
        };
        Ok(self
            .child_indices(parent)
            .into_iter()
            .filter(|c| *c != idx)
            .map(|c| {
                let e = &self.graph[c];
                EntityBounds::new(e.id, e.rect)
            })
            .collect())
    }

    /// Box `id` must stay inside; `None` for artboards on the open canvas.
    pub fn container_size(&self, id: EntityId) -> CanvasResult<Option<Size>> {
        let idx = self.index_of(id)?;
        Ok(self
            .parent_index(idx)
            .filter(|p| *p != self.root)
            .map(|p| self.graph[p].rect.size()))
    }

    /// Layout context of a component placed on a widget's sub-grid.
    pub fn grid_context(&self, id: EntityId) -> Option<GridContext> {
        let idx = *self.id_index.get(&id)?;
        let parent = self.parent_index(idx)?;
        let widget = &self.graph[parent];
        let EntityKind::Widget { grid } = widget.kind else {
            return None;
        };
        let entity = &self.graph[idx];
        let EntityKind::Component {
            limits, size_mode, ..
        } = &entity.kind
        else {
            return None;
        };
        let geometry = grid.geometry(widget.rect.width);
        Some(GridContext {
            widget: widget.id,
            grid,
            geometry,
            limits: grid.fine_limits(limits),
            size_mode: *size_mode,
            position: entity
                .grid_position
                .unwrap_or_else(|| geometry.from_rect(&entity.rect)),
        })
    }

    // ─── Structural edits ────────────────────────────────────────────────

    fn insert_entity(
        &mut self,
        parent: EntityId,
        kind: EntityKind,
        rect: Rect,
        id: Option<EntityId>,
        constraints: SizeConstraints,
    ) -> CanvasResult<EntityId> {
        let parent_idx = self.index_of(parent)?;
        if !self.graph[parent_idx].kind.can_contain(&kind) {
            return Err(CanvasError::InvalidParent {
                child: kind.label().to_string(),
                parent,
            });
        }
        let id = match id {
            Some(id) if self.contains(id) => {
                return Err(CanvasError::malformed(format!("id {id} already exists")));
            }
            Some(id) => id,
            None => EntityId::with_prefix(kind.label()),
        };
        let z_index = self
            .child_indices(parent_idx)
            .last()
            .map_or(0, |top| self.graph[*top].z_index.saturating_add(1));

        log::debug!("insert {} {id} into {parent} at {rect:?}", kind.label());
        let idx = self.graph.add_node(Entity {
            id,
            kind,
            rect: rect.clamped(),
            z_index,
            grid_position: None,
            constraints,
        });
        self.graph.add_edge(parent_idx, idx, ());
        self.id_index.insert(id, idx);
        Ok(id)
    }

    /// Placement box for new children of `parent`.
    fn placement_container(&self, parent: NodeIndex) -> Size {
        if parent == self.root {
            self.config.canvas_extent
        } else {
            self.graph[parent].rect.size()
        }
    }

    fn child_rects(&self, parent: NodeIndex, except: Option<NodeIndex>) -> Vec<Rect> {
        self.child_indices(parent)
            .into_iter()
            .filter(|c| Some(*c) != except)
            .map(|c| self.graph[c].rect)
            .collect()
    }

    fn auto_position(&self, parent: EntityId, size: Size) -> CanvasResult<Point> {
        let parent_idx = self.index_of(parent)?;
        Ok(find_initial_position(
            size,
            &self.child_rects(parent_idx, None),
            self.placement_container(parent_idx),
            &self.config.placement,
        ))
    }

    /// Add an artboard to the canvas; `position: None` finds a free spot.
    pub fn add_artboard(&mut self, format: ArtboardFormat, position: Option<Point>) -> CanvasResult<EntityId> {
        let size = format.size();
        let canvas = self.canvas();
        let origin = match position {
            Some(p) => p,
            None => self.auto_position(canvas, size)?,
        };
        self.insert_entity(
            canvas,
            EntityKind::Artboard { format },
            Rect::from_origin_size(origin, size),
            None,
            SizeConstraints {
                min: size,
                max: size,
                aspect_ratio: None,
            },
        )
    }

    pub fn add_widget(
        &mut self,
        artboard: EntityId,
        size: Size,
        position: Option<Point>,
        grid: SubGrid,
    ) -> CanvasResult<EntityId> {
        let size = SizeConstraints::default().clamp(size);
        let origin = match position {
            Some(p) => p,
            None => self.auto_position(artboard, size)?,
        };
        let grid = SubGrid::new(grid.columns, grid.row_height, grid.factor);
        self.insert_entity(
            artboard,
            EntityKind::Widget { grid },
            Rect::from_origin_size(origin, size),
            None,
            SizeConstraints::default(),
        )
    }

    pub fn add_component(
        &mut self,
        parent: EntityId,
        component_type: &str,
        size: Size,
        position: Option<Point>,
    ) -> CanvasResult<EntityId> {
        let mut payload = DropPayload::new(component_type, size);
        if let Some(p) = position {
            payload.x = Some(p.x);
            payload.y = Some(p.y);
        }
        self.insert_component(parent, payload)
    }

    /// Parse a host drop payload and insert the component it describes.
    ///
    /// # Errors
    /// `MalformedPayload` leaves the document untouched.
    pub fn insert_dropped(&mut self, parent: EntityId, json: &str) -> CanvasResult<EntityId> {
        let payload = DropPayload::from_json(json).inspect_err(|e| {
            log::warn!("rejected drop onto {parent}: {e}");
        })?;
        self.insert_component(parent, payload)
    }

    pub fn insert_component(&mut self, parent: EntityId, payload: DropPayload) -> CanvasResult<EntityId> {
        payload.validate()?;
        let parent_idx = self.index_of(parent)?;
        let constraints = payload.constraints.unwrap_or_default();
        let size = constraints.clamp(Size::new(payload.width, payload.height));
        let explicit = payload.explicit_origin();
        let widget_grid = match self.graph[parent_idx].kind {
            EntityKind::Widget { grid } => Some(grid),
            _ => None,
        };

        let origin = match (explicit, widget_grid) {
            (Some(p), _) => p,
            (None, Some(_)) => Point::ORIGIN,
            (None, None) => self.auto_position(parent, size)?,
        };
        let kind = EntityKind::Component {
            component_type: payload.component_type,
            limits: payload.limits,
            size_mode: payload.size_mode,
        };
        let id = self.insert_entity(
            parent,
            kind,
            Rect::from_origin_size(origin, size),
            payload.id,
            constraints,
        )?;

        if let Some(grid) = widget_grid {
            if explicit.is_some() {
                let geometry = grid.geometry(self.graph[parent_idx].rect.width);
                let entity = self.get_mut(id)?;
                entity.grid_position = Some(geometry.from_rect(&entity.rect));
            }
            self.layout_widget(parent)?;
        }
        Ok(id)
    }

    /// Remove `id` and everything inside it.
    ///
    /// # Errors
    /// `UnknownEntity`, or `ImmutableGeometry` for the canvas itself.
    pub fn remove(&mut self, id: EntityId) -> CanvasResult<()> {
        let idx = self.index_of(id)?;
        if idx == self.root {
            return Err(CanvasError::ImmutableGeometry(id));
        }
        let mut stack = vec![idx];
        let mut doomed = Vec::new();
        while let Some(i) = stack.pop() {
            doomed.push(i);
            stack.extend(self.graph.neighbors_directed(i, Direction::Outgoing));
        }
        for i in doomed {
            if let Some(removed) = self.graph.remove_node(i) {
                self.id_index.remove(&removed.id);
            }
        }
        log::debug!("removed {id} and its contents");
        Ok(())
    }

    fn copy_subtree(&mut self, src: NodeIndex, new_parent: NodeIndex) -> NodeIndex {
        let mut entity = self.graph[src].clone();
        entity.id = EntityId::with_prefix(entity.kind.label());
        let children = self.child_indices(src);
        let id = entity.id;
        let idx = self.graph.add_node(entity);
        self.graph.add_edge(new_parent, idx, ());
        self.id_index.insert(id, idx);
        for child in children {
            self.copy_subtree(child, idx);
        }
        idx
    }

    /// Copy `id` with its contents next to the original, on top of its
    /// siblings. Components in a widget go through auto-placement instead.
    pub fn duplicate(&mut self, id: EntityId) -> CanvasResult<EntityId> {
        let idx = self.index_of(id)?;
        let Some(parent_idx) = self.parent_index(idx) else {
            return Err(CanvasError::ImmutableGeometry(id));
        };
        let source = self.graph[idx].rect;
        let in_widget = matches!(self.graph[parent_idx].kind, EntityKind::Widget { .. });
        let origin = find_duplicate_position(
            &source,
            &self.child_rects(parent_idx, Some(idx)),
            self.placement_container(parent_idx),
            &self.config.placement,
        );
        let top_z = self
            .child_indices(parent_idx)
            .last()
            .map_or(0, |top| self.graph[*top].z_index.saturating_add(1));

        let copy = self.copy_subtree(idx, parent_idx);
        let entity = &mut self.graph[copy];
        entity.rect = entity.rect.with_origin(origin);
        entity.z_index = top_z;
        let copy_id = entity.id;
        if in_widget {
            entity.grid_position = None;
            let parent = self.graph[parent_idx].id;
            self.layout_widget(parent)?;
        }
        log::debug!("duplicated {id} as {copy_id}");
        Ok(copy_id)
    }

    // ─── Geometry updates ────────────────────────────────────────────────

    /// Write a finished gesture's geometry.
    ///
    /// # Errors
    /// `UnknownEntity`; `ImmutableGeometry` for a size change on an artboard;
    /// `MalformedPayload` for non-finite values; `InvalidParent` for a grid
    /// commit on something not inside a widget. Nothing is written on error.
    pub fn apply_commit(&mut self, commit: &Commit) -> CanvasResult<()> {
        match *commit {
            Commit::Position { id, point } => {
                if !(point.x.is_finite() && point.y.is_finite()) {
                    return Err(CanvasError::malformed("non-finite position"));
                }
                let entity = self.get_mut(id)?;
                entity.rect = entity.rect.with_origin(point);
            }
            Commit::Bounds { id, rect } => {
                let finite = [rect.x, rect.y, rect.width, rect.height]
                    .iter()
                    .all(|v| v.is_finite());
                if !finite {
                    return Err(CanvasError::malformed("non-finite bounds"));
                }
                let entity = self.get_mut(id)?;
                if matches!(entity.kind, EntityKind::Artboard { .. })
                    && rect.size() != entity.rect.size()
                {
                    return Err(CanvasError::ImmutableGeometry(id));
                }
                entity.rect = rect.clamped();
            }
            Commit::GridPosition { id, position } => {
                let Some(ctx) = self.grid_context(id) else {
                    let parent = self.parent(id).ok_or(CanvasError::UnknownEntity(id))?;
                    return Err(CanvasError::InvalidParent {
                        child: "grid-placed component".to_string(),
                        parent,
                    });
                };
                let position = ctx.geometry.clamp(position);
                let entity = self.get_mut(id)?;
                entity.grid_position = Some(position);
                entity.rect = ctx.geometry.to_rect(&position);
            }
        }
        log::debug!("committed {commit:?}");
        Ok(())
    }

    /// Re-stack `id` among its siblings. Returns whether the order changed.
    pub fn restack(&mut self, id: EntityId, op: ZOrderOp) -> CanvasResult<bool> {
        let idx = self.index_of(id)?;
        let Some(parent) = self.parent_index(idx) else {
            return Ok(false);
        };
        let mut items: Vec<Entity> = self
            .child_indices(parent)
            .into_iter()
            .map(|c| self.graph[c].clone())
            .collect();
        let moved = update_z_order(&mut items, id, op);
        for item in items {
            if let Some(i) = self.id_index.get(&item.id) {
                self.graph[*i].z_index = item.z_index;
            }
        }
        log::debug!("restack {id} {op:?} → moved={moved}");
        Ok(moved)
    }

    /// Auto-place the components of widget `id` on its sub-grid.
    ///
    /// Components that already have a grid position are locked; the rest
    /// are placed around them. Every child's rect is rewritten from its
    /// grid position.
    pub fn layout_widget(&mut self, id: EntityId) -> CanvasResult<Vec<(EntityId, GridPosition)>> {
        let idx = self.index_of(id)?;
        let widget = &self.graph[idx];
        let EntityKind::Widget { grid } = widget.kind else {
            return Err(CanvasError::InvalidParent {
                child: "grid-placed component".to_string(),
                parent: id,
            });
        };
        let width = widget.rect.width;
        let items: Vec<GridItem> = self
            .child_indices(idx)
            .into_iter()
            .filter_map(|c| {
                let e = &self.graph[c];
                match &e.kind {
                    EntityKind::Component {
                        limits, size_mode, ..
                    } => Some(GridItem {
                        id: e.id,
                        limits: *limits,
                        size_mode: *size_mode,
                        position: e.grid_position,
                    }),
                    _ => None,
                }
            })
            .collect();

        let placed = auto_place(&items, &grid, width);
        let geometry = grid.geometry(width);
        for (child, position) in &placed {
            let entity = self.get_mut(*child)?;
            entity.grid_position = Some(*position);
            entity.rect = geometry.to_rect(position);
        }
        Ok(placed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn doc() -> Document {
        Document::default()
    }

    #[test]
    fn new_document_has_only_canvas() {
        let d = doc();
        assert!(d.is_empty());
        assert_eq!(d.get(d.canvas()).map(|e| e.kind.label()), Some("canvas"));
    }

    #[test]
    fn artboards_are_placed_side_by_side() {
        let mut d = doc();
        let a = d.add_artboard(ArtboardFormat::Square, None).unwrap();
        let b = d.add_artboard(ArtboardFormat::Square, None).unwrap();
        assert_eq!(d.rect(a).unwrap().origin(), Point::ORIGIN);
        assert_eq!(d.rect(b).unwrap().origin(), Point::new(1096.0, 0.0));
        assert_eq!(d.container_size(a).unwrap(), None);
    }

    #[test]
    fn containment_rules_enforced() {
        let mut d = doc();
        let canvas = d.canvas();
        let err = d
            .add_component(canvas, "chart", Size::new(10.0, 10.0), None)
            .unwrap_err();
        assert!(matches!(err, CanvasError::InvalidParent { .. }));
    }

    #[test]
    fn world_rect_adds_parent_origins() {
        let mut d = doc();
        let a = d
            .add_artboard(ArtboardFormat::A4Portrait, Some(Point::new(100.0, 50.0)))
            .unwrap();
        let c = d
            .add_component(a, "text", Size::new(20.0, 10.0), Some(Point::new(5.0, 6.0)))
            .unwrap();
        assert_eq!(d.world_rect(c).unwrap(), Rect::new(105.0, 56.0, 20.0, 10.0));
        assert_eq!(d.container_size(c).unwrap(), Some(Size::new(794.0, 1123.0)));
    }

    #[test]
    fn artboard_size_is_immutable() {
        let mut d = doc();
        let a = d.add_artboard(ArtboardFormat::Square, None).unwrap();
        let err = d
            .apply_commit(&Commit::Bounds {
                id: a,
                rect: Rect::new(0.0, 0.0, 10.0, 10.0),
            })
            .unwrap_err();
        assert!(matches!(err, CanvasError::ImmutableGeometry(_)));
        d.apply_commit(&Commit::Position {
            id: a,
            point: Point::new(-300.0, 40.0),
        })
        .unwrap();
        assert_eq!(d.rect(a).unwrap(), Rect::new(-300.0, 40.0, 1080.0, 1080.0));
    }

    #[test]
    fn malformed_drop_changes_nothing() {
        let mut d = doc();
        let a = d.add_artboard(ArtboardFormat::Square, None).unwrap();
        let before = d.len();
        let err = d.insert_dropped(a, r#"{"component_type": "chart""#).unwrap_err();
        assert!(matches!(err, CanvasError::MalformedPayload(_)));
        let err = d
            .insert_dropped(a, r#"{"component_type": " ", "width": 1, "height": 1}"#)
            .unwrap_err();
        assert!(matches!(err, CanvasError::MalformedPayload(_)));
        assert_eq!(d.len(), before);
    }

    #[test]
    fn far_drop_into_widget_stays_bounded() {
        let mut d = doc();
        let a = d.add_artboard(ArtboardFormat::Square, None).unwrap();
        let w = d
            .add_widget(a, Size::new(480.0, 400.0), None, SubGrid::new(12, 40.0, 4))
            .unwrap();
        let before = d.len();
        let far = d
            .insert_dropped(
                w,
                r#"{"component_type":"kpi","width":10,"height":10,"x":0,"y":1e12}"#,
            )
            .unwrap();
        assert_eq!(d.len(), before + 1);
        let pos = d.get(far).unwrap().grid_position.unwrap();
        assert_eq!(pos.row, u32::MAX - pos.row_span);
        assert_eq!(pos.row_end(), u32::MAX);
        assert!(d.rect(far).unwrap().y.is_finite());

        // Later placements still start at the top.
        let near = d.add_component(w, "kpi", Size::new(1.0, 1.0), None).unwrap();
        assert_eq!(d.get(near).unwrap().grid_position, Some(GridPosition::new(0, 0, 12, 8)));
    }

    #[test]
    fn far_grid_commit_then_layout_stays_bounded() {
        let mut d = doc();
        let a = d.add_artboard(ArtboardFormat::Square, None).unwrap();
        let w = d
            .add_widget(a, Size::new(480.0, 400.0), None, SubGrid::new(12, 40.0, 4))
            .unwrap();
        let c = d.add_component(w, "kpi", Size::new(1.0, 1.0), None).unwrap();
        d.apply_commit(&Commit::GridPosition {
            id: c,
            position: GridPosition::new(0, u32::MAX, 12, u32::MAX),
        })
        .unwrap();
        let pos = d.get(c).unwrap().grid_position.unwrap();
        assert_eq!(pos.row_end(), u32::MAX);

        let placed = d.layout_widget(w).unwrap();
        assert_eq!(placed, vec![(c, pos)]);
        let other = d.add_component(w, "kpi", Size::new(1.0, 1.0), None).unwrap();
        // Column 12 onward is free in every row the tall item covers.
        assert_eq!(d.get(other).unwrap().grid_position, Some(GridPosition::new(12, 0, 12, 8)));
    }

    #[test]
    fn restack_reassigns_z() {
        let mut d = doc();
        let a = d.add_artboard(ArtboardFormat::Square, None).unwrap();
        let c1 = d.add_component(a, "a", Size::new(10.0, 10.0), None).unwrap();
        let c2 = d.add_component(a, "b", Size::new(10.0, 10.0), None).unwrap();
        assert_eq!(d.children_in_z_order(a).unwrap(), vec![c1, c2]);
        assert!(d.restack(c1, ZOrderOp::BringToFront).unwrap());
        assert_eq!(d.children_in_z_order(a).unwrap(), vec![c2, c1]);
        assert!(!d.restack(c1, ZOrderOp::BringToFront).unwrap());
    }

    #[test]
    fn remove_takes_subtree() {
        let mut d = doc();
        let a = d.add_artboard(ArtboardFormat::Square, None).unwrap();
        let w = d
            .add_widget(a, Size::new(480.0, 200.0), None, SubGrid::new(12, 40.0, 4))
            .unwrap();
        let c = d.add_component(w, "kpi", Size::new(10.0, 10.0), None).unwrap();
        d.remove(a).unwrap();
        assert!(!d.contains(w) && !d.contains(c));
        assert!(d.remove(d.canvas()).is_err());
    }

    #[test]
    fn widget_children_are_grid_placed() {
        let mut d = doc();
        let a = d.add_artboard(ArtboardFormat::Square, None).unwrap();
        let w = d
            .add_widget(a, Size::new(480.0, 400.0), None, SubGrid::new(12, 40.0, 4))
            .unwrap();
        let c = d.add_component(w, "kpi", Size::new(1.0, 1.0), None).unwrap();
        let entity = d.get(c).unwrap();
        // Default limits: 3×2 coarse → 12×8 fine, 10×10 px cells.
        assert_eq!(entity.grid_position, Some(GridPosition::new(0, 0, 12, 8)));
        assert_eq!(entity.rect, Rect::new(0.0, 0.0, 120.0, 80.0));
    }

    #[test]
    fn duplicate_copies_subtree_with_fresh_ids() {
        let mut d = doc();
        let a = d.add_artboard(ArtboardFormat::Square, None).unwrap();
        d.add_component(a, "chart", Size::new(10.0, 10.0), None).unwrap();
        let copy = d.duplicate(a).unwrap();
        assert_ne!(copy, a);
        assert_eq!(d.rect(copy).unwrap().origin(), Point::new(1096.0, 0.0));
        assert_eq!(d.children_in_z_order(copy).unwrap().len(), 1);
        assert_ne!(
            d.children_in_z_order(copy).unwrap(),
            d.children_in_z_order(a).unwrap()
        );
    }
}
