//! WASM bridge for Artboard: exposes the canvas interaction engine to
//! JavaScript.
//!
//! Compiled via `wasm-pack build --target web`. Everything crossing the
//! boundary is a primitive or a JSON string. Host callbacks are queued and
//! drained with [`ArtboardCanvas::take_events`] after each forwarded event.

use ab_core::{
    ArtboardFormat, CanvasError, CanvasResult, Document, EngineConfig, EntityId, GridPosition, Point, Rect,
    ResizeHandle, Size, WheelInput, ZOrderOp,
};
use ab_editor::{Editor, EditorHost, GestureError, Modifiers};
use serde::Serialize;
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::prelude::*;

// ─── Host event queue ────────────────────────────────────────────────────

/// A callback the editor made, as seen by JavaScript.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HostEvent {
    AttachPointerListeners,
    DetachPointerListeners,
    Select { id: EntityId },
    PositionChange { id: EntityId, x: f64, y: f64 },
    BoundsChange { id: EntityId, rect: Rect },
    GridPositionChange { id: EntityId, position: GridPosition },
}

#[derive(Debug, Default)]
struct BridgeHost {
    queue: RefCell<Vec<HostEvent>>,
}

impl BridgeHost {
    fn push(&self, event: HostEvent) {
        self.queue.borrow_mut().push(event);
    }
}

impl EditorHost for BridgeHost {
    fn attach_pointer_listeners(&self) {
        self.push(HostEvent::AttachPointerListeners);
    }

    fn detach_pointer_listeners(&self) {
        self.push(HostEvent::DetachPointerListeners);
    }

    fn on_select(&self, id: EntityId) {
        self.push(HostEvent::Select { id });
    }

    fn on_position_change(&self, id: EntityId, position: Point) {
        self.push(HostEvent::PositionChange {
            id,
            x: position.x,
            y: position.y,
        });
    }

    fn on_bounds_change(&self, id: EntityId, rect: Rect) {
        self.push(HostEvent::BoundsChange { id, rect });
    }

    fn on_update_grid_position(&self, id: EntityId, position: GridPosition) {
        self.push(HostEvent::GridPositionChange { id, position });
    }
}

// ─── JSON helpers ────────────────────────────────────────────────────────

fn ok_id(id: EntityId) -> String {
    serde_json::json!({ "ok": true, "id": id }).to_string()
}

fn err_json(err: &dyn std::fmt::Display) -> String {
    log::warn!("{err}");
    serde_json::json!({ "ok": false, "error": err.to_string() }).to_string()
}

fn to_json<T: Serialize>(value: &T, fallback: &str) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| fallback.to_string())
}

/// Parse a snake_case unit variant name (`"bring_to_front"`, `"square"`).
fn parse_name<T: serde::de::DeserializeOwned>(name: &str) -> Option<T> {
    serde_json::from_value(serde_json::Value::String(name.to_string())).ok()
}

fn modifiers(shift: bool, ctrl: bool, alt: bool, meta: bool) -> Modifiers {
    Modifiers {
        shift,
        ctrl,
        alt,
        meta,
    }
}

// ─── Canvas ──────────────────────────────────────────────────────────────

/// The main WASM-facing canvas controller.
///
/// Owns the editor (document, viewport, gesture slot). All interaction from
/// the page goes through this struct.
#[wasm_bindgen]
pub struct ArtboardCanvas {
    editor: Editor<BridgeHost>,
    host: Rc<BridgeHost>,
}

#[wasm_bindgen]
impl ArtboardCanvas {
    /// Create a controller for a canvas element of the given size.
    ///
    /// `config_json` may be empty or a partial [`EngineConfig`]; invalid
    /// config is reported to the console and replaced by the defaults.
    #[wasm_bindgen(constructor)]
    pub fn new(width: f64, height: f64, config_json: &str) -> Self {
        install_console_hooks();

        let config = if config_json.trim().is_empty() {
            EngineConfig::default()
        } else {
            EngineConfig::from_json(config_json).unwrap_or_else(|err| {
                log::warn!("falling back to default config: {err}");
                EngineConfig::default()
            })
        };
        let host = Rc::new(BridgeHost::default());
        let mut editor = Editor::new(Document::new(config), Rc::clone(&host));
        editor.set_viewport_size(width, height);
        Self { editor, host }
    }

    /// Resize-observer content box of the canvas element.
    pub fn resize(&mut self, width: f64, height: f64) {
        self.editor.set_viewport_size(width, height);
    }

    // ── Document ──

    /// Add a preset artboard (`"a4_portrait"`, `"a4_landscape"`,
    /// `"slide16x9"`, `"square"`). Returns `{"ok":true,"id":...}` or an error.
    pub fn add_artboard(&mut self, format: &str, x: Option<f64>, y: Option<f64>) -> String {
        let Some(format) = parse_name::<ArtboardFormat>(format) else {
            return err_json(&CanvasError::malformed(format!("unknown artboard format {format:?}")));
        };
        self.insert_artboard(format, x, y)
    }

    pub fn add_custom_artboard(&mut self, width: f64, height: f64, x: Option<f64>, y: Option<f64>) -> String {
        self.insert_artboard(ArtboardFormat::Custom(Size::new(width, height)), x, y)
    }

    /// Add a widget with a `columns`-wide sub-grid to an artboard.
    pub fn add_widget(
        &mut self,
        artboard: &str,
        width: f64,
        height: f64,
        columns: u32,
        row_height: f64,
    ) -> String {
        self.structural_edit(|doc| {
            let grid = doc.subgrid(columns, row_height);
            doc.add_widget(EntityId::intern(artboard), Size::new(width, height), None, grid)
        })
    }

    /// Insert a dropped component described by a JSON payload.
    pub fn insert_dropped(&mut self, parent: &str, payload_json: &str) -> String {
        self.structural_edit(|doc| doc.insert_dropped(EntityId::intern(parent), payload_json))
    }

    pub fn remove(&mut self, id: &str) -> bool {
        if self.editor.is_gesture_active() {
            return false;
        }
        self.editor.document_mut().remove(EntityId::intern(id)).is_ok()
    }

    pub fn duplicate(&mut self, id: &str) -> String {
        self.structural_edit(|doc| doc.duplicate(EntityId::intern(id)))
    }

    /// Re-stack an entity (`"bring_to_front"`, `"send_to_back"`,
    /// `"bring_forward"`, `"send_backward"`). Returns whether the order changed.
    pub fn restack(&mut self, id: &str, op: &str) -> bool {
        let Some(op) = parse_name::<ZOrderOp>(op) else {
            log::warn!("unknown z-order op {op:?}");
            return false;
        };
        self.editor
            .restack(EntityId::intern(id), op)
            .unwrap_or(false)
    }

    /// Children of `id`, back to front, as a JSON array of ids.
    pub fn children(&self, id: &str) -> String {
        match self.editor.document().children_in_z_order(EntityId::intern(id)) {
            Ok(ids) => to_json(&ids, "[]"),
            Err(_) => "[]".to_string(),
        }
    }

    pub fn canvas_id(&self) -> String {
        self.editor.document().canvas().as_str().to_string()
    }

    pub fn selected_id(&self) -> String {
        self.editor
            .selected()
            .map(|id| id.as_str().to_string())
            .unwrap_or_default()
    }

    // ── Gestures ──

    /// Start a drag the host hit-tested itself.
    pub fn begin_drag(&mut self, id: &str, x: f64, y: f64) -> String {
        let id = EntityId::intern(id);
        match self.editor.begin_drag(id, Point::new(x, y)) {
            Ok(()) => ok_id(id),
            Err(err) => err_json(&err),
        }
    }

    /// Start a resize from a named handle (`"se"`, `"n"`, ...).
    pub fn begin_resize(&mut self, id: &str, handle: &str, x: f64, y: f64) -> String {
        let id = EntityId::intern(id);
        let Some(handle) = ResizeHandle::from_name(handle) else {
            return err_json(&GestureError::NotResizable(id));
        };
        match self.editor.begin_resize(id, handle, Point::new(x, y)) {
            Ok(()) => ok_id(id),
            Err(err) => err_json(&err),
        }
    }

    /// Returns `true` if the editor took the event; the page should then
    /// stop propagation.
    pub fn pointer_down(&mut self, x: f64, y: f64, shift: bool, ctrl: bool, alt: bool, meta: bool) -> bool {
        self.editor
            .pointer_down(Point::new(x, y), modifiers(shift, ctrl, alt, meta))
            .is_consumed()
    }

    pub fn pointer_move(&mut self, x: f64, y: f64, shift: bool, ctrl: bool, alt: bool, meta: bool) -> bool {
        self.editor
            .pointer_move(Point::new(x, y), modifiers(shift, ctrl, alt, meta))
            .is_consumed()
    }

    pub fn pointer_up(&mut self, x: f64, y: f64, shift: bool, ctrl: bool, alt: bool, meta: bool) -> bool {
        self.editor
            .pointer_up(Point::new(x, y), modifiers(shift, ctrl, alt, meta))
            .is_consumed()
    }

    pub fn lost_pointer_capture(&mut self) -> bool {
        self.editor.lost_pointer_capture().is_consumed()
    }

    pub fn cancel(&mut self) -> bool {
        self.editor.cancel()
    }

    /// Wheel or trackpad event. `timestamp_ms` defaults to `Date.now()`.
    #[allow(clippy::too_many_arguments)]
    pub fn wheel(
        &mut self,
        dx: f64,
        dy: f64,
        x: f64,
        y: f64,
        shift: bool,
        ctrl: bool,
        meta: bool,
        timestamp_ms: Option<f64>,
    ) -> bool {
        let input = WheelInput {
            delta: Point::new(dx, dy),
            pointer: Point::new(x, y),
            zoom: ctrl || meta,
            shift,
            timestamp_ms: timestamp_ms.unwrap_or_else(js_sys::Date::now),
        };
        !matches!(self.editor.wheel(&input), ab_core::WheelAction::Ignored)
    }

    /// Run a keyboard shortcut. Returns the action name, or `""` if unbound.
    pub fn key_down(&mut self, key: &str, shift: bool, ctrl: bool, alt: bool, meta: bool) -> String {
        self.editor
            .key_down(key, modifiers(shift, ctrl, alt, meta))
            .map(|action| format!("{action:?}"))
            .unwrap_or_default()
    }

    // ── Reads ──

    /// Rect to draw for `id` (preview while manipulated), or `null`.
    pub fn display_rect(&self, id: &str) -> String {
        match self.editor.display_rect(EntityId::intern(id)) {
            Some(rect) => to_json(&rect, "null"),
            None => "null".to_string(),
        }
    }

    /// World-space rect of `id`, or `null`.
    pub fn world_rect(&self, id: &str) -> String {
        match self.editor.document().world_rect(EntityId::intern(id)) {
            Ok(rect) => to_json(&rect, "null"),
            Err(_) => "null".to_string(),
        }
    }

    pub fn guides(&self) -> String {
        to_json(&self.editor.guides(), "[]")
    }

    pub fn viewport(&self) -> String {
        to_json(self.editor.viewport(), "null")
    }

    pub fn screen_to_world(&self, x: f64, y: f64) -> Vec<f64> {
        let p = self.editor.viewport().screen_to_world(Point::new(x, y));
        vec![p.x, p.y]
    }

    /// Drain queued host callbacks as a JSON array.
    pub fn take_events(&self) -> String {
        let events = std::mem::take(&mut *self.host.queue.borrow_mut());
        to_json(&events, "[]")
    }
}

impl ArtboardCanvas {
    fn insert_artboard(&mut self, format: ArtboardFormat, x: Option<f64>, y: Option<f64>) -> String {
        let position = x.zip(y).map(|(x, y)| Point::new(x, y));
        self.structural_edit(|doc| doc.add_artboard(format, position))
    }

    /// Run a document edit that adds entities, refusing it mid-gesture.
    fn structural_edit<F>(&mut self, edit: F) -> String
    where
        F: FnOnce(&mut Document) -> CanvasResult<EntityId>,
    {
        if self.editor.is_gesture_active() {
            return err_json(&"document is locked during a gesture");
        }
        match edit(self.editor.document_mut()) {
            Ok(id) => ok_id(id),
            Err(err) => err_json(&err),
        }
    }
}

// ─── Console logging & panic hook ────────────────────────────────────────

#[cfg(target_arch = "wasm32")]
struct ConsoleLogger;

#[cfg(target_arch = "wasm32")]
impl log::Log for ConsoleLogger {
    fn enabled(&self, metadata: &log::Metadata<'_>) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &log::Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let msg = format!("[{}] {}", record.target(), record.args());
        match record.level() {
            log::Level::Error => web_sys::console::error_1(&msg.into()),
            log::Level::Warn => web_sys::console::warn_1(&msg.into()),
            _ => web_sys::console::log_1(&msg.into()),
        }
    }

    fn flush(&self) {}
}

fn install_console_hooks() {
    #[cfg(target_arch = "wasm32")]
    {
        use std::sync::Once;
        static INSTALL: Once = Once::new();
        static LOGGER: ConsoleLogger = ConsoleLogger;
        INSTALL.call_once(|| {
            std::panic::set_hook(Box::new(|info| {
                let msg = format!("Artboard WASM panic: {info}");
                web_sys::console::error_1(&msg.into());
            }));
            if log::set_logger(&LOGGER).is_ok() {
                log::set_max_level(log::LevelFilter::Info);
            }
        });
    }
}
