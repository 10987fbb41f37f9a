//! JavaScript surface of the canvas engine.
//!
//! The host page creates one [`CanvasHandle`] per `<canvas>` element and
//! forwards DOM events to it. The handle owns the engine behind
//! `Rc<RefCell<..>>`, shared with the frame loop and with in-flight image
//! decodes. Every borrow is released before JS callbacks run, so listeners
//! may call back into the handle.

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::str::FromStr;

use serde::Serialize;
use uuid::Uuid;
use wasm_bindgen::prelude::*;
use web_sys::{HtmlCanvasElement, KeyboardEvent, PointerEvent, WheelEvent};
use wire::{CanvasEvent, CanvasId, CanvasState, Frame};

use crate::config::CanvasConfig;
use crate::doc::ImageNode;
use crate::engine::{Action, Engine};
use crate::frame_loop::FrameLoop;
use crate::input::{Button, Key, Modifiers, WheelDelta};
use crate::loader;
use crate::notify::SelectionSummary;
use crate::viewport::Point;

/// Install the browser console logger and panic hook.
///
/// `level` is a `log` level name (`"debug"`, `"info"`, ...); defaults to `info`.
#[wasm_bindgen(js_name = initLogging)]
pub fn init_logging(level: Option<String>) {
    console_error_panic_hook::set_once();
    let level = match level.as_deref().map(log::Level::from_str) {
        Some(Ok(level)) => level,
        _ => log::Level::Info,
    };
    if let Err(e) = console_log::init_with_level(level) {
        log::debug!("bindings: logger already installed: {e}");
    }
}

fn to_js<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    let json = serde_json::to_string(value).map_err(|e| JsValue::from_str(&e.to_string()))?;
    js_sys::JSON::parse(&json)
}

#[allow(clippy::cast_possible_truncation)]
fn now_ms() -> i64 {
    js_sys::Date::now() as i64
}

fn modifiers_of(event: &web_sys::MouseEvent) -> Modifiers {
    Modifiers { shift: event.shift_key(), ctrl: event.ctrl_key(), alt: event.alt_key(), meta: event.meta_key() }
}

fn key_modifiers(event: &KeyboardEvent) -> Modifiers {
    Modifiers { shift: event.shift_key(), ctrl: event.ctrl_key(), alt: event.alt_key(), meta: event.meta_key() }
}

struct Shared {
    engine: RefCell<Engine>,
    canvas: HtmlCanvasElement,
    canvas_id: Cell<Option<CanvasId>>,
    mutation_listener: RefCell<Option<js_sys::Function>>,
    flush_scheduled: Cell<bool>,
}

impl Shared {
    /// Forward the side effects of one handler: cursor, peer events,
    /// sprite pruning, and the deferred selection notification.
    fn dispatch(self: &Rc<Self>, actions: &[Action]) {
        for action in actions {
            if let Action::SetCursor(cursor) = action {
                if let Err(e) = self.canvas.style().set_property("cursor", cursor) {
                    log::warn!("bindings: cursor update failed: {e:?}");
                }
            }
        }

        if actions.iter().any(|a| matches!(a, Action::ImagesDeleted { .. })) {
            self.engine.borrow_mut().prune_sprites();
        }

        self.emit_mutations(actions);
        self.schedule_selection_flush();
    }

    fn emit_mutations(&self, actions: &[Action]) {
        if !actions.iter().any(Action::is_mutation) {
            return;
        }
        let Some(listener) = self.mutation_listener.borrow().clone() else {
            return;
        };
        let Some(canvas_id) = self.canvas_id.get() else {
            log::debug!("bindings: no canvas id set, mutations stay local");
            return;
        };

        let events = self.engine.borrow().core.outgoing_events(canvas_id, actions, now_ms());
        for event in events {
            match wire::encode_frame(&Frame::new(canvas_id, event)) {
                Ok(text) => {
                    if let Err(e) = listener.call1(&JsValue::NULL, &JsValue::from_str(&text)) {
                        log::warn!("bindings: mutation listener threw: {e:?}");
                    }
                }
                Err(e) => log::error!("bindings: failed to encode mutation: {e}"),
            }
        }
    }

    fn schedule_selection_flush(self: &Rc<Self>) {
        if self.flush_scheduled.get() || !self.engine.borrow().core.selection_pending() {
            return;
        }
        self.flush_scheduled.set(true);
        let shared = Rc::clone(self);
        wasm_bindgen_futures::spawn_local(async move {
            shared.flush_scheduled.set(false);
            let notice = shared.engine.borrow_mut().core.take_selection_notice();
            if let Some((listener, summary)) = notice {
                listener(&summary);
            }
        });
    }

    /// Decode rasters for nodes that arrived without one.
    fn decode_missing(self: &Rc<Self>, nodes: Vec<ImageNode>) {
        for node in nodes {
            let shared = Rc::clone(self);
            wasm_bindgen_futures::spawn_local(async move {
                match loader::decode_image(&node.src).await {
                    Ok(raster) => shared.engine.borrow_mut().attach_raster(node.id, raster),
                    Err(e) => log::warn!("bindings: image {} failed to load: {e}", node.id),
                }
            });
        }
    }

    /// `merge` keeps local selection, viewport and drag (a peer's update);
    /// otherwise the state replaces everything (initial load).
    fn load_state(self: &Rc<Self>, state: &CanvasState, merge: bool) {
        let actions = if merge {
            self.engine.borrow_mut().core.apply_update(state)
        } else {
            self.engine.borrow_mut().core.load_snapshot(state)
        };
        self.engine.borrow_mut().prune_sprites();
        let nodes = self.engine.borrow().missing_rasters();
        self.decode_missing(nodes);
        self.dispatch(&actions);
    }
}

/// One interactive image canvas bound to a `<canvas>` element.
#[wasm_bindgen]
pub struct CanvasHandle {
    shared: Rc<Shared>,
    frames: Option<FrameLoop>,
}

#[wasm_bindgen]
impl CanvasHandle {
    /// Bind to `canvas`. `config` is an optional JSON object overriding
    /// [`CanvasConfig`] fields.
    #[wasm_bindgen(constructor)]
    pub fn new(canvas: HtmlCanvasElement, config: Option<String>) -> Result<CanvasHandle, JsValue> {
        let config = match config.as_deref() {
            Some(json) => CanvasConfig::from_json(json)?,
            None => CanvasConfig::default(),
        };
        let mut engine = Engine::new(canvas.clone(), config)?;
        engine.set_viewport(f64::from(canvas.client_width()), f64::from(canvas.client_height()), window_dpr());

        let shared = Rc::new(Shared {
            engine: RefCell::new(engine),
            canvas,
            canvas_id: Cell::new(None),
            mutation_listener: RefCell::new(None),
            flush_scheduled: Cell::new(false),
        });

        let render_target = Rc::clone(&shared);
        let frames = FrameLoop::start(move |_ts| {
            let Ok(mut engine) = render_target.engine.try_borrow_mut() else {
                return;
            };
            if let Err(e) = engine.render() {
                log::error!("render: {e}");
            }
        })?;

        log::info!("canvas: engine ready");
        Ok(Self { shared, frames: Some(frames) })
    }

    /// Canvas id stamped on outgoing frames. Empty string clears it.
    #[wasm_bindgen(js_name = setCanvasId)]
    pub fn set_canvas_id(&self, id: &str) -> Result<(), JsValue> {
        if id.is_empty() {
            self.shared.canvas_id.set(None);
            return Ok(());
        }
        let id = Uuid::parse_str(id).map_err(|e| JsValue::from_str(&e.to_string()))?;
        self.shared.canvas_id.set(Some(id));
        Ok(())
    }

    pub fn resize(&self, width_css: f64, height_css: f64, dpr: f64) {
        self.shared.engine.borrow_mut().set_viewport(width_css, height_css, dpr);
    }

    // --- DOM events ---

    #[wasm_bindgen(js_name = pointerDown)]
    pub fn pointer_down(&self, event: &PointerEvent) {
        let button = Button::from_dom(event.button());
        if button == Button::Primary {
            if let Err(e) = self.shared.canvas.set_pointer_capture(event.pointer_id()) {
                log::debug!("bindings: pointer capture failed: {e:?}");
            }
        }
        let p = Point::new(f64::from(event.offset_x()), f64::from(event.offset_y()));
        let actions = self.shared.engine.borrow_mut().core.on_pointer_down(p, button, modifiers_of(event));
        self.shared.dispatch(&actions);
    }

    #[wasm_bindgen(js_name = pointerMove)]
    pub fn pointer_move(&self, event: &PointerEvent) {
        let p = Point::new(f64::from(event.offset_x()), f64::from(event.offset_y()));
        let actions = self.shared.engine.borrow_mut().core.on_pointer_move(p, modifiers_of(event));
        self.shared.dispatch(&actions);
    }

    #[wasm_bindgen(js_name = pointerUp)]
    pub fn pointer_up(&self, event: &PointerEvent) {
        let button = Button::from_dom(event.button());
        if button == Button::Primary && self.shared.canvas.has_pointer_capture(event.pointer_id()) {
            if let Err(e) = self.shared.canvas.release_pointer_capture(event.pointer_id()) {
                log::debug!("bindings: pointer release failed: {e:?}");
            }
        }
        let p = Point::new(f64::from(event.offset_x()), f64::from(event.offset_y()));
        let actions = self.shared.engine.borrow_mut().core.on_pointer_up(p, button, modifiers_of(event));
        self.shared.dispatch(&actions);
    }

    /// Returns `true` if the wheel event zoomed the canvas; the default
    /// action has then been prevented.
    pub fn wheel(&self, event: &WheelEvent) -> bool {
        let p = Point::new(f64::from(event.offset_x()), f64::from(event.offset_y()));
        let delta = WheelDelta { dx: event.delta_x(), dy: event.delta_y() };
        let actions = self.shared.engine.borrow_mut().core.on_wheel(p, delta, modifiers_of(event));
        if actions.is_empty() {
            return false;
        }
        event.prevent_default();
        self.shared.dispatch(&actions);
        true
    }

    #[wasm_bindgen(js_name = keyDown)]
    pub fn key_down(&self, event: &KeyboardEvent) {
        let key = Key::new(event.key());
        let focused = self.has_focus();
        let (actions, pan_key) = {
            let mut engine = self.shared.engine.borrow_mut();
            let actions = engine.core.on_key_down(&key, key_modifiers(event), focused);
            (actions, engine.core.is_pan_key(&key))
        };
        if !actions.is_empty() || (focused && pan_key) {
            event.prevent_default();
        }
        self.shared.dispatch(&actions);
    }

    #[wasm_bindgen(js_name = keyUp)]
    pub fn key_up(&self, event: &KeyboardEvent) {
        let key = Key::new(event.key());
        let actions = self.shared.engine.borrow_mut().core.on_key_up(&key, key_modifiers(event));
        self.shared.dispatch(&actions);
    }

    pub fn blur(&self) {
        self.shared.engine.borrow_mut().core.on_blur();
    }

    fn has_focus(&self) -> bool {
        let active = web_sys::window().and_then(|w| w.document()).and_then(|d| d.active_element());
        let canvas: &web_sys::Element = self.shared.canvas.as_ref();
        active.as_ref() == Some(canvas)
    }

    // --- Images ---

    /// Decode `src` and place it on the canvas. Resolves with the new image
    /// record; rejects if the image cannot be decoded.
    #[wasm_bindgen(js_name = addImage)]
    pub fn add_image(&self, src: String) -> js_sys::Promise {
        let shared = Rc::clone(&self.shared);
        wasm_bindgen_futures::future_to_promise(async move {
            let raster = loader::decode_image(&src).await?;
            let (node, actions) = shared.engine.borrow_mut().add_decoded(&src, raster)?;
            shared.dispatch(&actions);
            to_js(&node.to_record())
        })
    }

    #[wasm_bindgen(js_name = deleteSelected)]
    pub fn delete_selected(&self) {
        let actions = self.shared.engine.borrow_mut().core.delete_selected();
        self.shared.dispatch(&actions);
    }

    // --- Groups ---

    #[wasm_bindgen(js_name = canGroup)]
    pub fn can_group(&self) -> bool {
        self.shared.engine.borrow().core.can_group()
    }

    /// Group the selection. Returns the new group id, or `undefined`.
    #[wasm_bindgen(js_name = groupSelectedImages)]
    pub fn group_selected_images(&self) -> Option<String> {
        let outcome = self.shared.engine.borrow_mut().core.group_selected_images();
        let (group_id, actions) = outcome?;
        self.shared.dispatch(&actions);
        Some(group_id.to_string())
    }

    #[wasm_bindgen(js_name = canUngroup)]
    pub fn can_ungroup(&self) -> bool {
        self.shared.engine.borrow().core.can_ungroup()
    }

    /// Ungroup the selection. Returns the ids that left a group.
    #[wasm_bindgen(js_name = ungroupSelectedImages)]
    pub fn ungroup_selected_images(&self) -> js_sys::Array {
        let (ids, actions) = self.shared.engine.borrow_mut().core.ungroup_selected_images();
        self.shared.dispatch(&actions);
        ids.iter().map(|id| JsValue::from_str(&id.to_string())).collect()
    }

    // --- Listeners ---

    /// Register the selection listener, called with
    /// `{selected, canGroup, canUngroup}` after each change. Pass
    /// `undefined` to unregister.
    #[wasm_bindgen(js_name = onSelectionChange)]
    pub fn on_selection_change(&self, callback: Option<js_sys::Function>) {
        let listener = callback.map(|f| {
            Rc::new(move |summary: &SelectionSummary| match to_js(summary) {
                Ok(value) => {
                    if let Err(e) = f.call1(&JsValue::NULL, &value) {
                        log::warn!("bindings: selection listener threw: {e:?}");
                    }
                }
                Err(e) => log::error!("bindings: failed to convert selection: {e:?}"),
            }) as Rc<dyn Fn(&SelectionSummary)>
        });
        self.shared.engine.borrow_mut().core.on_selection_change(listener);
    }

    /// Register the mutation listener, called with one encoded realtime frame
    /// per document change made on this canvas.
    #[wasm_bindgen(js_name = onMutation)]
    pub fn on_mutation(&self, callback: Option<js_sys::Function>) {
        *self.shared.mutation_listener.borrow_mut() = callback;
    }

    // --- Snapshots and peers ---

    /// Current canvas state as a JSON string.
    pub fn snapshot(&self) -> Result<String, JsValue> {
        let canvas_id = self.shared.canvas_id.get().unwrap_or_else(Uuid::nil);
        let state = self.shared.engine.borrow().core.snapshot(canvas_id, now_ms());
        serde_json::to_string(&state).map_err(|e| JsValue::from_str(&e.to_string()))
    }

    /// Replace the canvas with a JSON canvas state; rasters load in the background.
    #[wasm_bindgen(js_name = loadSnapshot)]
    pub fn load_snapshot(&self, json: &str) -> Result<(), JsValue> {
        let state: CanvasState = serde_json::from_str(json).map_err(|e| JsValue::from_str(&e.to_string()))?;
        self.shared.load_state(&state, false);
        Ok(())
    }

    /// Apply an encoded realtime frame received from a peer.
    #[wasm_bindgen(js_name = applyRemote)]
    pub fn apply_remote(&self, text: &str) -> Result<(), JsValue> {
        let frame = wire::decode_frame(text).map_err(|e| JsValue::from_str(&e.to_string()))?;
        match &frame.event {
            CanvasEvent::CanvasState(state) => self.shared.load_state(state, false),
            CanvasEvent::CanvasUpdate(state) => self.shared.load_state(state, true),
            CanvasEvent::ImageAdded(record) => {
                let node = ImageNode::from_record(record);
                let actions = self.shared.engine.borrow_mut().core.insert_node(node.clone());
                if !actions.is_empty() {
                    self.shared.decode_missing(vec![node]);
                }
                self.shared.dispatch(&actions);
            }
            event => {
                let actions = self.shared.engine.borrow_mut().core.apply_remote(event);
                self.shared.engine.borrow_mut().prune_sprites();
                self.shared.dispatch(&actions);
            }
        }
        Ok(())
    }

    /// Stop the render loop. The handle is unusable for drawing afterwards.
    pub fn destroy(&mut self) {
        if let Some(frames) = self.frames.take() {
            frames.stop();
        }
        log::info!("canvas: engine stopped");
    }
}

fn window_dpr() -> f64 {
    web_sys::window().map_or(1.0, |w| w.device_pixel_ratio())
}
