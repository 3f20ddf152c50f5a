pub mod drag;
pub mod editor;
pub mod error;
pub mod grid;
pub mod hit;
pub mod input;
pub mod resize;
pub mod session;
pub mod shortcuts;

pub use drag::DragController;
pub use editor::{Editor, EventDisposition, GestureKind};
pub use error::GestureError;
pub use grid::GridController;
pub use hit::{hit_test, hit_test_handle};
pub use input::{InputEvent, Modifiers};
pub use resize::ResizeController;
pub use session::{EditorHost, GestureContext, InteractionSession, ListenerGuard};
pub use shortcuts::{ShortcutAction, ShortcutMap};
