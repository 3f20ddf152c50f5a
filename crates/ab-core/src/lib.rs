pub mod align;
pub mod config;
pub mod error;
pub mod geometry;
pub mod id;
pub mod model;
pub mod placement;
pub mod snap;
pub mod subgrid;
pub mod viewport;
pub mod wheel;
pub mod zorder;

pub use align::{AlignmentGuide, Axis, find_alignment_guides, snap_to_guides};
pub use config::{EngineConfig, PlacementConfig, ScaleLimits, SnapConfig, SubGridConfig, WheelConfig};
pub use error::{CanvasError, CanvasResult};
pub use geometry::{EntityBounds, Point, Rect, ResizeHandle, Size};
pub use id::EntityId;
pub use model::*;
pub use placement::{find_duplicate_position, find_initial_position, rects_overlap};
pub use snap::{ResizeSnapResult, SnapResult, SnapSource, resolve_resize_snap, resolve_snap};
pub use subgrid::{GridGeometry, GridItem, GridPosition, SizeMode, SpanAxis, SpanLimits, SubGrid};
pub use viewport::Viewport;
pub use wheel::{WheelAction, WheelInput, WheelTracker};
pub use zorder::{Stacked, ZOrderOp, update_z_order};
