//! The direct-manipulation engine.
//!
//! [`Editor`] owns the scene store, viewport, selection, history and the
//! in-process clipboard buffer; shells feed it pointer and key events and
//! read back what to draw. Interaction states are mutually exclusive: a
//! gesture runs from pointer-down to pointer-up and commits at most one
//! history entry.

use crate::ai::{self, AnalysisError};
use crate::camera::Viewport;
use crate::clipboard::{
    self, ClipboardError, PASTE_OFFSET, PastePayload, PastedImage, PROTOCOL_PREFIX,
};
use crate::handles::{self, Handle};
use crate::hit::{self, Selection};
use crate::history::History;
use crate::input::{ArrowKey, Modifiers, MouseButton};
use crate::object::{CanvasObject, ImageState, ObjectDraft, ObjectId, ObjectKind};
use crate::scene::SceneStore;
use crate::snap::{self, SnapGuides};
use kurbo::{Point, Rect, Size, Vec2};
use std::collections::HashMap;

/// Arrow-key nudge distances in canvas units.
pub const NUDGE_STEP: f64 = 1.0;
pub const NUDGE_STEP_LARGE: f64 = 10.0;

/// Minimum object size reachable through resizing.
pub const MIN_OBJECT_SIZE: f64 = 1.0;

/// Estimated glyph advance used to size pasted text objects.
const TEXT_CHAR_WIDTH_FACTOR: f64 = 0.6;

/// Geometry captured at resize pointer-down. All resize math is computed
/// against this, never against the previous frame.
#[derive(Debug, Clone)]
struct ResizeStart {
    pointer: Point,
    center: Point,
    width: f64,
    height: f64,
    image_state: Option<ImageState>,
}

#[derive(Debug, Clone, Default)]
enum Interaction {
    #[default]
    Idle,
    Panning {
        last_screen: Point,
    },
    SelectingBox {
        origin: Point,
        current: Point,
    },
    Dragging {
        start: Point,
        /// Original centers of every object the gesture moves.
        origins: Vec<(ObjectId, Point)>,
        moved: bool,
    },
    Resizing {
        id: ObjectId,
        handle: Handle,
        start: ResizeStart,
        moved: bool,
    },
}

/// Whether the engine is applying user edits or restoring a snapshot.
/// Restoration mutates the store through the same paths as editing, so the
/// mode is checked synchronously at the commit point to keep undo/redo from
/// recording themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Editing,
    Restoring,
}

pub struct Editor {
    store: SceneStore,
    viewport: Viewport,
    selection: Selection,
    history: History,
    interaction: Interaction,
    mode: Mode,
    /// In-process copy buffer; survives when no system clipboard exists.
    buffer: Vec<CanvasObject>,
    guides: SnapGuides,
}

impl Default for Editor {
    fn default() -> Self {
        Self::new()
    }
}

impl Editor {
    pub fn new() -> Self {
        let mut editor = Self {
            store: SceneStore::new(),
            viewport: Viewport::new(),
            selection: Selection::new(),
            history: History::new(),
            interaction: Interaction::Idle,
            mode: Mode::Editing,
            buffer: Vec::new(),
            guides: SnapGuides::default(),
        };
        // Baseline snapshot so the first gesture can be undone.
        editor.commit();
        editor
    }

    pub fn store(&self) -> &SceneStore {
        &self.store
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Live alignment guides, populated only mid-drag.
    pub fn guides(&self) -> &SnapGuides {
        &self.guides
    }

    /// Rubber-band rectangle in screen space, while one is being drawn.
    pub fn selection_box(&self) -> Option<Rect> {
        match &self.interaction {
            Interaction::SelectingBox { origin, current } => {
                Some(Rect::from_points(*origin, *current))
            }
            _ => None,
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.interaction, Interaction::Idle)
    }

    fn commit(&mut self) {
        if self.mode == Mode::Restoring {
            return;
        }
        self.history.commit(self.store.to_vec());
    }

    fn restore(&mut self, objects: Vec<CanvasObject>) {
        self.mode = Mode::Restoring;
        self.store.replace_all(objects);
        self.selection.retain_live(&self.store);
        self.mode = Mode::Editing;
    }

    /// The selection plus every member of any selected group: the set a drag
    /// or delete actually touches. Membership is resolved at call time.
    fn expand_selection(&self) -> Vec<ObjectId> {
        let mut ids: Vec<ObjectId> = Vec::new();
        for id in self.selection.ids() {
            if !ids.contains(id) {
                ids.push(id.clone());
            }
            if self.store.get(id).is_some_and(CanvasObject::is_group) {
                for member in self.store.members_of(id) {
                    if !ids.contains(&member) {
                        ids.push(member);
                    }
                }
            }
        }
        ids
    }

    // ---- pointer gestures ----

    pub fn pointer_down(&mut self, screen: Point, button: MouseButton, modifiers: Modifiers) {
        if button == MouseButton::Middle || (button == MouseButton::Left && modifiers.space) {
            self.interaction = Interaction::Panning {
                last_screen: screen,
            };
            return;
        }
        if button != MouseButton::Left {
            return;
        }

        let canvas = self.viewport.screen_to_canvas(screen);

        // A lone selected object exposes resize handles; they win over
        // object hits so grabbing a corner never starts a drag.
        if self.selection.len() == 1 {
            let id = self.selection.ids()[0].clone();
            if let Some(obj) = self.store.get(&id) {
                if !obj.is_group() {
                    if let Some(handle) = handles::handle_at(obj.bounds(), canvas, self.viewport.scale)
                    {
                        self.interaction = Interaction::Resizing {
                            id,
                            handle,
                            start: ResizeStart {
                                pointer: canvas,
                                center: Point::new(obj.x, obj.y),
                                width: obj.width,
                                height: obj.height,
                                image_state: obj.image_state().copied(),
                            },
                            moved: false,
                        };
                        return;
                    }
                }
            }
        }

        match hit::hit_test(&self.store, canvas) {
            Some(id) => {
                if modifiers.shift {
                    self.selection.toggle(id);
                    return;
                }
                if !self.selection.contains(&id) {
                    self.selection.set(id);
                }
                let origins = self
                    .expand_selection()
                    .into_iter()
                    .filter_map(|id| {
                        self.store.get(&id).map(|o| (id.clone(), Point::new(o.x, o.y)))
                    })
                    .collect();
                self.interaction = Interaction::Dragging {
                    start: canvas,
                    origins,
                    moved: false,
                };
            }
            None => {
                if !modifiers.shift {
                    self.selection.clear();
                }
                self.interaction = Interaction::SelectingBox {
                    origin: screen,
                    current: screen,
                };
            }
        }
    }

    pub fn pointer_move(&mut self, screen: Point) {
        let mut interaction = std::mem::take(&mut self.interaction);
        match &mut interaction {
            Interaction::Idle => {}
            Interaction::Panning { last_screen } => {
                self.viewport
                    .pan(Vec2::new(screen.x - last_screen.x, screen.y - last_screen.y));
                *last_screen = screen;
            }
            Interaction::SelectingBox { current, .. } => {
                *current = screen;
            }
            Interaction::Dragging {
                start,
                origins,
                moved,
            } => {
                let canvas = self.viewport.screen_to_canvas(screen);
                let mut delta = Vec2::new(canvas.x - start.x, canvas.y - start.y);
                self.guides = SnapGuides::default();

                if self.selection.len() == 1 {
                    let moving: Vec<ObjectId> = origins.iter().map(|(id, _)| id.clone()).collect();
                    if let Some((_, origin)) = origins
                        .iter()
                        .find(|(id, _)| id == &self.selection.ids()[0])
                    {
                        let proposed = Point::new(origin.x + delta.x, origin.y + delta.y);
                        let result = snap::snap_center(&self.store, &moving, proposed);
                        delta = Vec2::new(result.center.x - origin.x, result.center.y - origin.y);
                        self.guides = result.guides;
                    }
                }

                for (id, origin) in origins.iter() {
                    if let Some(obj) = self.store.get_mut(id) {
                        obj.x = origin.x + delta.x;
                        obj.y = origin.y + delta.y;
                    }
                }
                if delta.hypot() > 0.0 {
                    *moved = true;
                }
            }
            Interaction::Resizing {
                id,
                handle,
                start,
                moved,
            } => {
                let canvas = self.viewport.screen_to_canvas(screen);
                let applied = self.apply_resize(&id.clone(), *handle, start, canvas);
                if applied {
                    *moved = true;
                }
            }
        }
        self.interaction = interaction;
    }

    pub fn pointer_up(&mut self, screen: Point) {
        let interaction = std::mem::take(&mut self.interaction);
        self.guides = SnapGuides::default();
        match interaction {
            Interaction::Idle | Interaction::Panning { .. } => {}
            Interaction::SelectingBox { origin, .. } => {
                let screen_rect = Rect::from_points(origin, screen);
                let canvas_rect = self.viewport.rect_to_canvas(screen_rect);
                let hits = hit::objects_in_rect(&self.store, canvas_rect);
                self.selection.extend(hits);
            }
            Interaction::Dragging { moved, .. } | Interaction::Resizing { moved, .. } => {
                if moved {
                    self.commit();
                }
            }
        }
    }

    /// Double-click on an image's edge handle resets its crop to the full
    /// bitmap at the current scale.
    pub fn double_click(&mut self, screen: Point) {
        if self.selection.len() != 1 {
            return;
        }
        let id = self.selection.ids()[0].clone();
        let canvas = self.viewport.screen_to_canvas(screen);
        let Some(obj) = self.store.get(&id) else {
            return;
        };
        if !obj.is_image() {
            return;
        }
        let Some(handle) = handles::handle_at(obj.bounds(), canvas, self.viewport.scale) else {
            return;
        };
        if !handle.is_edge() {
            return;
        }
        if let Some(obj) = self.store.get_mut(&id) {
            if let Some(state) = obj.image_state_mut() {
                let (w, h) = (state.display_width(), state.display_height());
                state.offset_x = 0.0;
                state.offset_y = 0.0;
                obj.width = w.max(MIN_OBJECT_SIZE);
                obj.height = h.max(MIN_OBJECT_SIZE);
                self.commit();
            }
        }
    }

    /// Compute and apply resize state for the current pointer position.
    /// Returns false when the pointer has not produced any change.
    fn apply_resize(
        &mut self,
        id: &ObjectId,
        handle: Handle,
        start: &ResizeStart,
        pointer: Point,
    ) -> bool {
        let dx = pointer.x - start.pointer.x;
        let dy = pointer.y - start.pointer.y;
        let changed = dx != 0.0 || dy != 0.0;
        let Some(obj) = self.store.get_mut(id) else {
            return false;
        };

        // Axis signs: +1 when dragging the east/south side, -1 for west/north.
        let (sx, sy) = match handle {
            Handle::Nw => (-1.0, -1.0),
            Handle::Ne => (1.0, -1.0),
            Handle::Sw => (-1.0, 1.0),
            Handle::Se => (1.0, 1.0),
            Handle::N => (0.0, -1.0),
            Handle::S => (0.0, 1.0),
            Handle::E => (1.0, 0.0),
            Handle::W => (-1.0, 0.0),
        };

        if handle.is_corner() && start.image_state.is_some() {
            // Corner drag on an image scales uniformly; the width change
            // drives, height follows the aspect ratio.
            let new_w = (start.width + sx * dx).max(MIN_OBJECT_SIZE);
            let ratio = new_w / start.width;
            let new_h = (start.height * ratio).max(MIN_OBJECT_SIZE);
            let fixed = Point::new(
                start.center.x - sx * start.width / 2.0,
                start.center.y - sy * start.height / 2.0,
            );
            obj.x = fixed.x + sx * new_w / 2.0;
            obj.y = fixed.y + sy * new_h / 2.0;
            obj.width = new_w;
            obj.height = new_h;
            if let (Some(state), Some(start_state)) = (obj.image_state_mut(), &start.image_state) {
                state.scale = start_state.scale * ratio;
                state.offset_x = start_state.offset_x * ratio;
                state.offset_y = start_state.offset_y * ratio;
            }
            return changed;
        }

        let new_w = if sx == 0.0 {
            start.width
        } else {
            (start.width + sx * dx).max(MIN_OBJECT_SIZE)
        };
        let new_h = if sy == 0.0 {
            start.height
        } else {
            (start.height + sy * dy).max(MIN_OBJECT_SIZE)
        };
        // Opposite side stays fixed.
        let old_left = start.center.x - start.width / 2.0;
        let old_top = start.center.y - start.height / 2.0;
        if sx != 0.0 {
            let fixed_x = start.center.x - sx * start.width / 2.0;
            obj.x = fixed_x + sx * new_w / 2.0;
            obj.width = new_w;
        }
        if sy != 0.0 {
            let fixed_y = start.center.y - sy * start.height / 2.0;
            obj.y = fixed_y + sy * new_h / 2.0;
            obj.height = new_h;
        }

        // Edge drag on an image crops: the bitmap keeps its canvas position,
        // so offsets absorb however far the w/n container edges moved.
        if handle.is_edge() {
            let new_left = obj.x - obj.width / 2.0;
            let new_top = obj.y - obj.height / 2.0;
            if let (Some(state), Some(start_state)) = (obj.image_state_mut(), &start.image_state) {
                state.offset_x = start_state.offset_x - (new_left - old_left);
                state.offset_y = start_state.offset_y - (new_top - old_top);
            }
        }
        changed
    }

    // ---- discrete operations ----

    /// Create an object on top of everything and select it.
    pub fn add_object(&mut self, draft: ObjectDraft) -> ObjectId {
        let id = self.store.create(draft).id.clone();
        self.selection.set(id.clone());
        self.commit();
        id
    }

    /// Place an already-ingested image centered at `center`.
    pub fn add_image(&mut self, image: PastedImage, center: Point) -> ObjectId {
        let draft = ObjectDraft::new(
            ObjectKind::Image {
                src: image.src,
                image_state: Some(ImageState::fitted(image.width, image.height)),
            },
            center.x,
            center.y,
            image.width,
            image.height,
        );
        self.add_object(draft)
    }

    pub fn delete_selection(&mut self) {
        if self.selection.is_empty() {
            return;
        }
        let ids = self.expand_selection();
        self.store.remove(&ids);
        self.selection.clear();
        self.commit();
    }

    /// Clone the selection with fresh ids, offset by the paste offset.
    pub fn duplicate_selection(&mut self) {
        if self.selection.is_empty() {
            return;
        }
        let ids = self.expand_selection();
        let clones: Vec<CanvasObject> = ids
            .iter()
            .filter_map(|id| self.store.get(id).cloned())
            .collect();
        let top_level_old: Vec<ObjectId> = self.selection.ids().to_vec();
        let inserted = self.splice_clones(clones, PASTE_OFFSET, PASTE_OFFSET, &top_level_old);
        self.selection.set_many(inserted);
        self.commit();
    }

    pub fn select_all(&mut self) {
        let ids: Vec<ObjectId> = self
            .store
            .iter()
            .filter(|o| o.group_id.is_none())
            .map(|o| o.id.clone())
            .collect();
        self.selection.set_many(ids);
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    /// Arrow-key nudge; group members follow their group.
    pub fn nudge(&mut self, key: ArrowKey, large: bool) {
        if self.selection.is_empty() {
            return;
        }
        let step = if large { NUDGE_STEP_LARGE } else { NUDGE_STEP };
        let (dx, dy) = key.delta();
        let ids = self.expand_selection();
        self.store.update(&ids, |o| o.translate(dx * step, dy * step));
        self.commit();
    }

    pub fn bring_to_front(&mut self) {
        self.reorder(SceneStore::bring_to_front);
    }

    pub fn send_to_back(&mut self) {
        self.reorder(SceneStore::send_to_back);
    }

    pub fn bring_forward(&mut self) {
        self.reorder(SceneStore::bring_forward);
    }

    pub fn send_backward(&mut self) {
        self.reorder(SceneStore::send_backward);
    }

    fn reorder(&mut self, op: fn(&mut SceneStore, &ObjectId)) {
        if self.selection.is_empty() {
            return;
        }
        for id in self.selection.ids().to_vec() {
            op(&mut self.store, &id);
        }
        self.commit();
    }

    pub fn group_selection(&mut self) {
        let ids = self.selection.ids().to_vec();
        if let Some(gid) = self.store.group(&ids) {
            self.selection.set(gid);
            self.commit();
        }
    }

    pub fn ungroup_selection(&mut self) {
        let ids = self.selection.ids().to_vec();
        let freed = self.store.ungroup(&ids);
        if freed.is_empty() {
            return;
        }
        self.selection.set_many(freed);
        self.commit();
    }

    pub fn undo(&mut self) {
        if let Some(objects) = self.history.undo() {
            self.restore(objects);
        }
    }

    pub fn redo(&mut self) {
        if let Some(objects) = self.history.redo() {
            self.restore(objects);
        }
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    // ---- viewport ----

    pub fn zoom_in(&mut self, screen_point: Point) {
        self.viewport.zoom_in(screen_point);
    }

    pub fn zoom_out(&mut self, screen_point: Point) {
        self.viewport.zoom_out(screen_point);
    }

    pub fn reset_zoom(&mut self) {
        self.viewport.reset();
    }

    pub fn zoom_to_fit(&mut self, view_size: Size, padding: f64) {
        if let Some(bounds) = self.store.bounds() {
            self.viewport.fit_to_bounds(bounds, view_size, padding);
        }
    }

    // ---- clipboard ----

    /// Copy the selection (with group members) into the in-process buffer.
    /// Returns protocol text for the system clipboard, or `None` when
    /// nothing is selected.
    pub fn copy_selection(&mut self) -> Option<String> {
        if self.selection.is_empty() {
            return None;
        }
        let ids = self.expand_selection();
        self.buffer = ids
            .iter()
            .filter_map(|id| self.store.get(id).cloned())
            .collect();
        match clipboard::protocol_text(&self.buffer) {
            Ok(text) => Some(text),
            Err(e) => {
                log::warn!("copy: protocol serialization failed: {e}");
                None
            }
        }
    }

    pub fn cut_selection(&mut self) -> Option<String> {
        let text = self.copy_selection()?;
        self.delete_selection();
        Some(text)
    }

    /// Paste dispatch over a scraped clipboard payload; first match wins.
    /// Returns the ids of whatever got placed.
    pub fn paste(
        &mut self,
        payload: &PastePayload,
        view_center_screen: Point,
    ) -> Result<Vec<ObjectId>, ClipboardError> {
        let center = self.viewport.screen_to_canvas(view_center_screen);

        // 1. SVG markup in text.
        if let Some(svg) = payload.text.as_deref().and_then(clipboard::extract_svg) {
            log::debug!("paste: svg markup, {}x{}", svg.width, svg.height);
            let id = self.add_image(
                PastedImage {
                    src: svg.data_uri,
                    width: svg.width,
                    height: svg.height,
                },
                center,
            );
            return Ok(vec![id]);
        }

        // 2. Bitmap payloads, one commit for the batch.
        if !payload.images.is_empty() {
            log::debug!("paste: {} image payload(s)", payload.images.len());
            let mut ids = Vec::new();
            for (i, image) in payload.images.iter().enumerate() {
                let offset = i as f64 * PASTE_OFFSET;
                let draft = ObjectDraft::new(
                    ObjectKind::Image {
                        src: image.src.clone(),
                        image_state: Some(ImageState::fitted(image.width, image.height)),
                    },
                    center.x + offset,
                    center.y + offset,
                    image.width,
                    image.height,
                );
                ids.push(self.store.create(draft).id.clone());
            }
            self.selection.set_many(ids.clone());
            self.commit();
            return Ok(ids);
        }

        if let Some(text) = payload.text.as_deref() {
            // 3. Protocol text.
            if text.starts_with(PROTOCOL_PREFIX) {
                log::debug!("paste: protocol text");
                let objects = clipboard::parse_protocol(text)?;
                return Ok(self.paste_objects(objects));
            }
            // 4. Arbitrary text becomes a text object.
            if !text.trim().is_empty() {
                log::debug!("paste: plain text, {} chars", text.len());
                let font_size = 16.0;
                let longest = text.lines().map(str::len).max().unwrap_or(1) as f64;
                let lines = text.lines().count().max(1) as f64;
                let width = (longest * font_size * TEXT_CHAR_WIDTH_FACTOR).clamp(40.0, 800.0);
                let height = lines * font_size * 1.5;
                let id = self.add_object(ObjectDraft::new(
                    ObjectKind::Text {
                        content: text.to_string(),
                        font_size,
                    },
                    center.x,
                    center.y,
                    width,
                    height,
                ));
                return Ok(vec![id]);
            }
        }

        // 5. In-process buffer.
        if self.buffer.is_empty() {
            return Ok(Vec::new());
        }
        log::debug!("paste: in-process buffer, {} object(s)", self.buffer.len());
        let objects = self.buffer.clone();
        Ok(self.paste_objects(objects))
    }

    /// Place copied objects with fresh ids and the paste offset; the new
    /// top-level objects become the selection. Commits once.
    fn paste_objects(&mut self, objects: Vec<CanvasObject>) -> Vec<ObjectId> {
        let top_level: Vec<ObjectId> = objects
            .iter()
            .filter(|o| {
                o.group_id
                    .as_ref()
                    .is_none_or(|gid| !objects.iter().any(|p| &p.id == gid))
            })
            .map(|o| o.id.clone())
            .collect();
        let inserted = self.splice_clones(objects, PASTE_OFFSET, PASTE_OFFSET, &top_level);
        self.selection.set_many(inserted.clone());
        self.commit();
        inserted
    }

    /// Insert clones of `objects` above everything, offset by `(dx, dy)`,
    /// remapping ids (including group relations) to fresh ones. Returns the
    /// new ids of the objects listed in `select_old` (pre-clone ids).
    fn splice_clones(
        &mut self,
        objects: Vec<CanvasObject>,
        dx: f64,
        dy: f64,
        select_old: &[ObjectId],
    ) -> Vec<ObjectId> {
        let base_z = self.store.max_z_index();
        let mut id_map: HashMap<ObjectId, ObjectId> = HashMap::new();
        let mut clones = Vec::with_capacity(objects.len());
        for mut obj in objects {
            let old_id = obj.id.clone();
            obj.regenerate_id();
            id_map.insert(old_id, obj.id.clone());
            obj.translate(dx, dy);
            obj.z_index += base_z + 1;
            clones.push(obj);
        }
        for obj in &mut clones {
            obj.group_id = obj
                .group_id
                .take()
                .and_then(|gid| id_map.get(&gid).cloned());
        }
        for obj in clones {
            self.store.insert(obj);
        }
        select_old
            .iter()
            .filter_map(|old| id_map.get(old).cloned())
            .collect()
    }

    // ---- AI collaborator ----

    /// Bitmap source of the nth object in paint order, for `@Name` mentions.
    pub fn image_source_at(&self, index: usize) -> Option<(ObjectId, String)> {
        let ordered = self.store.objects_by_z();
        ai::image_source_at(&ordered, index)
    }

    /// Splice an editable-layer result anchored at `anchor`'s top-left. A
    /// deleted anchor is a no-op: the result is stale, not an error.
    pub fn apply_editable_layer(
        &mut self,
        anchor: &ObjectId,
        code: &str,
    ) -> Result<Vec<ObjectId>, AnalysisError> {
        let Some(obj) = self.store.get(anchor) else {
            log::warn!("editable layer: anchor {anchor} no longer exists, dropping result");
            return Ok(Vec::new());
        };
        let origin = obj.bounds().origin();
        let elements = ai::parse_editable_layer(code)?;
        if elements.is_empty() {
            return Ok(Vec::new());
        }
        let base_z = self.store.max_z_index();
        let objects = ai::synthesize_objects(elements, origin.x, origin.y, base_z);
        let ids: Vec<ObjectId> = objects.iter().map(|o| o.id.clone()).collect();
        for obj in objects {
            self.store.insert(obj);
        }
        self.selection.set_many(ids.clone());
        self.commit();
        Ok(ids)
    }
}
