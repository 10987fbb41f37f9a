use std::collections::HashMap;

use wasm_bindgen::JsCast;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, HtmlImageElement};
use wire::{CanvasEvent, CanvasId, CanvasState, GroupRecord, ImageDeleted, ImagesUngrouped};

use crate::config::CanvasConfig;
use crate::doc::{DocStore, GroupChange, GroupId, ImageId, ImageNode};
use crate::error::CanvasError;
use crate::hit::{self, Rect};
use crate::input::{Button, InputState, Key, KeySet, Modifiers, WheelDelta};
use crate::notify::{SelectionListener, SelectionNotifier, SelectionSummary};
use crate::render;
use crate::viewport::{Point, Viewport};

#[cfg(test)]
#[path = "engine_test.rs"]
mod engine_test;

/// Actions returned from input handlers for the host to process.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Visible state changed; the next frame must repaint.
    RenderNeeded,
    /// The set of selected images changed.
    SelectionChanged,
    /// The host should switch the canvas CSS cursor.
    SetCursor(String),
    ImageAdded(ImageNode),
    /// A drag finished; carries the moved nodes at their final positions.
    ImagesMoved(Vec<ImageNode>),
    ImagesDeleted { ids: Vec<ImageId>, changes: Vec<GroupChange> },
    /// A new group was created; `changes` lists what happened to the groups
    /// its members were taken from.
    ImagesGrouped { group: GroupRecord, changes: Vec<GroupChange> },
    ImagesUngrouped { ids: Vec<ImageId>, changes: Vec<GroupChange> },
}

impl Action {
    /// Whether this action changed the document and should be shared.
    #[must_use]
    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            Self::ImageAdded(_)
                | Self::ImagesMoved(_)
                | Self::ImagesDeleted { .. }
                | Self::ImagesGrouped { .. }
                | Self::ImagesUngrouped { .. }
        )
    }
}

fn change_events(changes: &[GroupChange], out: &mut Vec<CanvasEvent>) {
    for change in changes {
        match change {
            GroupChange::Shrunk(record) => out.push(CanvasEvent::ImagesGrouped(record.clone())),
            GroupChange::Dissolved { group_id, image_ids } => out.push(CanvasEvent::ImagesUngrouped(ImagesUngrouped {
                group_id: *group_id,
                image_ids: image_ids.clone(),
            })),
        }
    }
}

/// Image display size for a decoded raster: its natural size, scaled down
/// to `max_width` with the aspect ratio preserved when wider.
#[must_use]
pub fn fit_display_size(natural_w: f64, natural_h: f64, max_width: f64) -> (f64, f64) {
    if natural_w > max_width {
        (max_width, natural_h * max_width / natural_w)
    } else {
        (natural_w, natural_h)
    }
}

/// Core engine state: all logic that doesn't depend on the canvas element.
///
/// Separated from `Engine` so it can be tested without WASM/browser dependencies.
#[derive(Debug)]
pub struct EngineCore {
    pub doc: DocStore,
    pub viewport: Viewport,
    pub input: InputState,
    pub keys: KeySet,
    pub config: CanvasConfig,
    /// Canvas size in CSS pixels.
    pub viewport_width: f64,
    pub viewport_height: f64,
    pub dpr: f64,
    dirty: bool,
    notifier: SelectionNotifier,
}

impl Default for EngineCore {
    fn default() -> Self {
        Self::new(CanvasConfig::default())
    }
}

impl EngineCore {
    #[must_use]
    pub fn new(config: CanvasConfig) -> Self {
        Self {
            doc: DocStore::new(),
            viewport: Viewport::default(),
            input: InputState::Idle,
            keys: KeySet::default(),
            config,
            viewport_width: 0.0,
            viewport_height: 0.0,
            dpr: 1.0,
            dirty: true,
            notifier: SelectionNotifier::default(),
        }
    }

    // --- Dirty flag ---

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Clear the dirty flag, returning whether a repaint was due.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    /// Record the canvas size in CSS pixels and the device pixel ratio.
    pub fn set_viewport_size(&mut self, width_css: f64, height_css: f64, dpr: f64) {
        self.viewport_width = width_css;
        self.viewport_height = height_css;
        self.dpr = if dpr > 0.0 { dpr } else { 1.0 };
        self.mark_dirty();
    }

    // --- Selection notification ---

    /// Register the single selection listener. `None` unregisters.
    pub fn on_selection_change(&mut self, listener: Option<SelectionListener>) {
        self.notifier.set_listener(listener);
    }

    #[must_use]
    pub fn selection_summary(&self) -> SelectionSummary {
        SelectionSummary { selected: self.doc.selected_ids(), can_group: self.can_group(), can_ungroup: self.can_ungroup() }
    }

    #[must_use]
    pub fn selection_pending(&self) -> bool {
        self.notifier.is_pending()
    }

    /// Drain a pending notification without calling the listener, so the
    /// caller can release its borrow of the engine first.
    pub fn take_selection_notice(&mut self) -> Option<(SelectionListener, SelectionSummary)> {
        let listener = self.notifier.take_pending()?;
        Some((listener, self.selection_summary()))
    }

    fn selection_changed(&mut self, actions: &mut Vec<Action>) {
        self.notifier.mark_changed();
        actions.push(Action::SelectionChanged);
    }

    // --- Pointer input ---

    pub fn on_pointer_down(&mut self, screen_pt: Point, button: Button, modifiers: Modifiers) -> Vec<Action> {
        if button != Button::Primary {
            return Vec::new();
        }
        let mut actions = Vec::new();

        if self.keys.is_held(&self.config.pan_key) {
            self.input = InputState::Panning { start_screen: screen_pt, start_viewport: self.viewport };
            actions.push(Action::SetCursor("grabbing".into()));
            return actions;
        }

        let world = self.viewport.screen_to_world(screen_pt);
        if let Some(hit_id) = hit::image_at(self.doc.images(), world) {
            let already_selected = self.doc.get(&hit_id).is_some_and(|n| n.selected);
            if modifiers.shift {
                self.doc.toggle_selection(&hit_id);
            } else if !already_selected {
                self.doc.select_only(&hit_id);
            }
            self.selection_changed(&mut actions);

            let origins: Vec<(ImageId, Point)> =
                self.doc.images().iter().filter(|n| n.selected).map(|n| (n.id, Point::new(n.x, n.y))).collect();
            if !origins.is_empty() {
                self.input = InputState::DraggingImages { start_world: world, origins };
                actions.push(Action::SetCursor("move".into()));
            }
        } else {
            if !modifiers.shift && self.doc.clear_selection() {
                self.selection_changed(&mut actions);
            }
            self.input = InputState::Marquee { start: world, current: world };
            actions.push(Action::SetCursor("crosshair".into()));
        }

        self.mark_dirty();
        actions.push(Action::RenderNeeded);
        actions
    }

    pub fn on_pointer_move(&mut self, screen_pt: Point, _modifiers: Modifiers) -> Vec<Action> {
        let world = self.viewport.screen_to_world(screen_pt);
        let mut selection_grew = false;

        match &mut self.input {
            InputState::Idle => return Vec::new(),
            InputState::Panning { start_screen, start_viewport } => {
                self.viewport.tx = start_viewport.tx + (screen_pt.x - start_screen.x);
                self.viewport.ty = start_viewport.ty + (screen_pt.y - start_screen.y);
            }
            InputState::DraggingImages { start_world, origins } => {
                let dx = world.x - start_world.x;
                let dy = world.y - start_world.y;
                for (id, origin) in origins.iter() {
                    self.doc.set_position(id, origin.x + dx, origin.y + dy);
                }
            }
            InputState::Marquee { start, current } => {
                *current = world;
                let rect = Rect::from_corners(*start, world);
                for id in hit::images_in_rect(self.doc.images(), &rect) {
                    for member in self.doc.selection_unit(&id) {
                        selection_grew |= self.doc.set_selected(&member, true);
                    }
                }
            }
        }

        let mut actions = Vec::new();
        if selection_grew {
            self.selection_changed(&mut actions);
        }
        self.mark_dirty();
        actions.push(Action::RenderNeeded);
        actions
    }

    /// Gestures only start on the primary button, so only its release ends one.
    pub fn on_pointer_up(&mut self, _screen_pt: Point, button: Button, _modifiers: Modifiers) -> Vec<Action> {
        if button != Button::Primary {
            return Vec::new();
        }
        let finished = std::mem::take(&mut self.input);
        let mut actions = Vec::new();

        if let InputState::DraggingImages { origins, .. } = &finished {
            let moved: Vec<ImageNode> = origins
                .iter()
                .filter_map(|(id, origin)| self.doc.get(id).filter(|n| Point::new(n.x, n.y) != *origin))
                .cloned()
                .collect();
            if !moved.is_empty() {
                actions.push(Action::ImagesMoved(moved));
            }
        }
        if !finished.is_idle() {
            actions.push(Action::SetCursor("default".into()));
        }

        self.mark_dirty();
        actions.push(Action::RenderNeeded);
        actions
    }

    /// Zoom around the cursor while Ctrl or Meta is held.
    ///
    /// Returns no actions when the modifier is absent, so the host can leave
    /// the event to the page.
    pub fn on_wheel(&mut self, screen_pt: Point, delta: WheelDelta, modifiers: Modifiers) -> Vec<Action> {
        if !modifiers.zoom() {
            return Vec::new();
        }
        let factor = if delta.dy < 0.0 { self.config.zoom_in_factor } else { self.config.zoom_out_factor };
        self.viewport.zoom_at(screen_pt, factor, self.config.min_scale, self.config.max_scale);
        self.mark_dirty();
        vec![Action::RenderNeeded]
    }

    // --- Keyboard input ---

    /// Whether `key` is the configured pan key. The host keeps the page
    /// from scrolling while it is held over the canvas.
    #[must_use]
    pub fn is_pan_key(&self, key: &Key) -> bool {
        key.0 == self.config.pan_key
    }

    /// `focused` is whether the canvas element has keyboard focus; deletion
    /// only applies then so typing elsewhere on the page is unaffected.
    pub fn on_key_down(&mut self, key: &Key, _modifiers: Modifiers, focused: bool) -> Vec<Action> {
        self.keys.press(key);
        if focused && key.is_delete() {
            return self.delete_selected();
        }
        Vec::new()
    }

    pub fn on_key_up(&mut self, key: &Key, _modifiers: Modifiers) -> Vec<Action> {
        self.keys.release(key);
        Vec::new()
    }

    /// The window lost focus: held keys will never see their key-up.
    pub fn on_blur(&mut self) {
        self.keys.clear();
    }

    // --- Document operations ---

    /// Remove every selected image, shrinking or dissolving their groups.
    pub fn delete_selected(&mut self) -> Vec<Action> {
        let ids = self.doc.selected_ids();
        if ids.is_empty() {
            return Vec::new();
        }
        let (removed, changes) = self.doc.delete_images(&ids);
        log::debug!("engine: deleted {} images", removed.len());

        if matches!(self.input, InputState::DraggingImages { .. }) {
            self.input = InputState::Idle;
        }
        let mut actions = vec![Action::ImagesDeleted { ids, changes }];
        self.selection_changed(&mut actions);
        self.mark_dirty();
        actions.push(Action::RenderNeeded);
        actions
    }

    #[must_use]
    pub fn can_group(&self) -> bool {
        self.doc.selected_count() >= crate::doc::MIN_GROUP_SIZE
    }

    /// Group the current selection. Returns `None` when fewer than two
    /// images are selected.
    pub fn group_selected_images(&mut self) -> Option<(GroupId, Vec<Action>)> {
        if !self.can_group() {
            return None;
        }
        let selected = self.doc.selected_ids();
        let (group_id, changes) = self.doc.group_images(&selected)?;
        let group = self.doc.group(&group_id)?.to_record();
        log::debug!("engine: created {} with {} images", group_id, group.image_ids.len());

        let mut actions = vec![Action::ImagesGrouped { group, changes }];
        self.selection_changed(&mut actions);
        self.mark_dirty();
        actions.push(Action::RenderNeeded);
        Some((group_id, actions))
    }

    #[must_use]
    pub fn can_ungroup(&self) -> bool {
        self.doc.images().iter().any(|n| n.selected && n.group_id.is_some())
    }

    /// Take every selected image out of its group. Returns the ids that
    /// were grouped.
    pub fn ungroup_selected_images(&mut self) -> (Vec<ImageId>, Vec<Action>) {
        let selected = self.doc.selected_ids();
        let (ids, changes) = self.doc.ungroup_images(&selected);
        if ids.is_empty() {
            return (ids, Vec::new());
        }
        let mut actions = vec![Action::ImagesUngrouped { ids: ids.clone(), changes }];
        self.selection_changed(&mut actions);
        self.mark_dirty();
        actions.push(Action::RenderNeeded);
        (ids, actions)
    }

    /// Create a node for a freshly decoded raster, sized to the display cap
    /// and centered on the visible area.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::ImageDecode`] if the raster has no usable size.
    pub fn place_image(&mut self, src: &str, natural_w: f64, natural_h: f64) -> Result<(ImageNode, Vec<Action>), CanvasError> {
        if !(natural_w > 0.0 && natural_h > 0.0 && natural_w.is_finite() && natural_h.is_finite()) {
            return Err(CanvasError::ImageDecode { src: src.to_owned(), reason: "image has no intrinsic size".into() });
        }
        let (w, h) = fit_display_size(natural_w, natural_h, self.config.max_display_width);
        let center = self.viewport.screen_to_world(Point::new(self.viewport_width / 2.0, self.viewport_height / 2.0));
        let node = ImageNode::new(src, center.x - w / 2.0, center.y - h / 2.0, w, h);
        self.doc.insert(node.clone());
        self.mark_dirty();
        Ok((node.clone(), vec![Action::ImageAdded(node), Action::RenderNeeded]))
    }

    /// Insert a node that a peer created. Returns nothing if the id exists.
    pub fn insert_node(&mut self, node: ImageNode) -> Vec<Action> {
        if !self.doc.insert(node) {
            return Vec::new();
        }
        self.mark_dirty();
        vec![Action::RenderNeeded]
    }

    // --- Snapshots and peers ---

    /// Export the document and viewport. Selection is included as-is.
    #[must_use]
    pub fn snapshot(&self, canvas_id: CanvasId, now_ms: i64) -> CanvasState {
        CanvasState {
            id: canvas_id,
            images: self.doc.image_records(),
            groups: self.doc.group_records(),
            viewport: self.viewport.into(),
            last_modified: now_ms,
        }
    }

    /// Replace the document and viewport with `state`, as on first connect.
    /// Any gesture in progress is abandoned.
    pub fn load_snapshot(&mut self, state: &CanvasState) -> Vec<Action> {
        self.doc.load_snapshot(state);
        let mut viewport = Viewport::from(state.viewport);
        if !(viewport.scale.is_finite() && viewport.scale > 0.0) {
            viewport = Viewport::default();
        }
        viewport.scale = viewport.scale.clamp(self.config.min_scale, self.config.max_scale);
        self.viewport = viewport;
        self.input = InputState::Idle;

        let mut actions = Vec::new();
        self.selection_changed(&mut actions);
        self.mark_dirty();
        actions.push(Action::RenderNeeded);
        actions
    }

    /// Merge a peer's `canvas_update` into the document while keeping local
    /// interaction state.
    ///
    /// Unlike [`Self::load_snapshot`], the local viewport is kept, images that
    /// survive stay selected (with their whole group), and a drag in progress
    /// continues for the images that still exist.
    pub fn apply_update(&mut self, state: &CanvasState) -> Vec<Action> {
        let before = self.doc.selected_ids();
        self.doc.load_snapshot(state);
        for id in &before {
            for member in self.doc.selection_unit(id) {
                self.doc.set_selected(&member, true);
            }
        }

        let doc = &self.doc;
        let drag_lost = match &mut self.input {
            InputState::DraggingImages { origins, .. } => {
                origins.retain(|(id, _)| doc.get(id).is_some());
                origins.is_empty()
            }
            _ => false,
        };
        if drag_lost {
            self.input = InputState::Idle;
        }

        let mut actions = Vec::new();
        if self.doc.selected_ids() != before {
            self.selection_changed(&mut actions);
        }
        self.mark_dirty();
        actions.push(Action::RenderNeeded);
        actions
    }

    /// Apply a document change made by a peer.
    ///
    /// Handles `image_deleted`, `images_grouped` and `images_ungrouped`.
    /// Other kinds need the host (raster decoding, chat) and are ignored.
    /// The returned actions never include mutations, so nothing is echoed.
    pub fn apply_remote(&mut self, event: &CanvasEvent) -> Vec<Action> {
        let was_selected = self.doc.selected_count();
        let changed = match event {
            CanvasEvent::ImageDeleted(ImageDeleted { image_id }) => !self.doc.delete_images(&[*image_id]).0.is_empty(),
            CanvasEvent::ImagesGrouped(record) => self.doc.apply_group_record(record),
            CanvasEvent::ImagesUngrouped(payload) => self.doc.dissolve_group(&payload.group_id).is_some(),
            _ => false,
        };
        if !changed {
            return Vec::new();
        }

        let mut actions = Vec::new();
        if was_selected > 0 {
            self.selection_changed(&mut actions);
        }
        self.mark_dirty();
        actions.push(Action::RenderNeeded);
        actions
    }

    /// Translate mutation actions into the events peers need.
    ///
    /// A finished drag is shared as one `canvas_update` carrying the full
    /// state, since no narrower event describes a move.
    #[must_use]
    pub fn outgoing_events(&self, canvas_id: CanvasId, actions: &[Action], now_ms: i64) -> Vec<CanvasEvent> {
        let mut out = Vec::new();
        let mut moved = false;
        for action in actions {
            match action {
                Action::ImageAdded(node) => out.push(CanvasEvent::ImageAdded(node.to_record())),
                Action::ImagesMoved(_) => moved = true,
                Action::ImagesDeleted { ids, changes } => {
                    change_events(changes, &mut out);
                    out.extend(ids.iter().map(|id| CanvasEvent::ImageDeleted(ImageDeleted { image_id: *id })));
                }
                Action::ImagesGrouped { group, changes } => {
                    change_events(changes, &mut out);
                    out.push(CanvasEvent::ImagesGrouped(group.clone()));
                }
                Action::ImagesUngrouped { changes, .. } => change_events(changes, &mut out),
                Action::RenderNeeded | Action::SelectionChanged | Action::SetCursor(_) => {}
            }
        }
        if moved {
            out.push(CanvasEvent::CanvasUpdate(self.snapshot(canvas_id, now_ms)));
        }
        out
    }
}

/// The full canvas engine. Wraps `EngineCore` and owns the browser canvas
/// element, its 2D context, and one decoded raster per image node.
pub struct Engine {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
    sprites: HashMap<ImageId, HtmlImageElement>,
    pub core: EngineCore,
}

impl Engine {
    /// Create an engine bound to `canvas`.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::NoContext`] if the element has no 2D context.
    pub fn new(canvas: HtmlCanvasElement, config: CanvasConfig) -> Result<Self, CanvasError> {
        let ctx = canvas
            .get_context("2d")
            .map_err(|e| CanvasError::js(&e))?
            .ok_or(CanvasError::NoContext)?;
        let ctx = ctx.dyn_into::<CanvasRenderingContext2d>().map_err(|_| CanvasError::NoContext)?;
        Ok(Self { canvas, ctx, sprites: HashMap::new(), core: EngineCore::new(config) })
    }

    /// Resize the backing store to the CSS size times the pixel ratio.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn set_viewport(&mut self, width_css: f64, height_css: f64, dpr: f64) {
        self.core.set_viewport_size(width_css, height_css, dpr);
        self.canvas.set_width((width_css * self.core.dpr).round().max(0.0) as u32);
        self.canvas.set_height((height_css * self.core.dpr).round().max(0.0) as u32);
    }

    /// Adopt a decoded raster as a new image node.
    ///
    /// # Errors
    ///
    /// Propagates [`EngineCore::place_image`] failures.
    pub fn add_decoded(&mut self, src: &str, raster: HtmlImageElement) -> Result<(ImageNode, Vec<Action>), CanvasError> {
        let (node, actions) =
            self.core.place_image(src, f64::from(raster.natural_width()), f64::from(raster.natural_height()))?;
        self.sprites.insert(node.id, raster);
        Ok((node, actions))
    }

    /// Attach a decoded raster to a node that arrived from a snapshot or peer.
    pub fn attach_raster(&mut self, id: ImageId, raster: HtmlImageElement) {
        if self.core.doc.get(&id).is_some() {
            self.sprites.insert(id, raster);
            self.core.mark_dirty();
        }
    }

    /// Drop rasters whose node no longer exists.
    pub fn prune_sprites(&mut self) {
        let doc = &self.core.doc;
        self.sprites.retain(|id, _| doc.get(id).is_some());
    }

    /// Nodes that have no decoded raster yet.
    #[must_use]
    pub fn missing_rasters(&self) -> Vec<ImageNode> {
        self.core
            .doc
            .images()
            .iter()
            .filter(|node| !self.sprites.contains_key(&node.id))
            .cloned()
            .collect()
    }

    /// Paint if dirty. Returns whether a frame was drawn.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::Js`] if a context call throws.
    pub fn render(&mut self) -> Result<bool, CanvasError> {
        if !self.core.take_dirty() {
            return Ok(false);
        }
        render::draw(&self.ctx, &self.core, &self.sprites)?;
        Ok(true)
    }
}
