//! Hit-testing and selection state.

use crate::object::ObjectId;
use crate::scene::SceneStore;
use kurbo::{Point, Rect};

/// Topmost object under `point` (canvas space), or `None`.
///
/// A hit on a member of a live group resolves to the group id, so clicking
/// anything inside a group selects the group. Members remain addressable
/// through the store directly.
pub fn hit_test(store: &SceneStore, point: Point) -> Option<ObjectId> {
    let hit = store
        .objects_by_z()
        .into_iter()
        .rev()
        .find(|o| o.contains(point))?;
    match &hit.group_id {
        Some(gid) if store.contains(gid) => Some(gid.clone()),
        _ => Some(hit.id.clone()),
    }
}

/// Every object whose bounding box intersects `rect` (canvas space).
/// Used by the rubber band; group redirection is applied as in [`hit_test`].
pub fn objects_in_rect(store: &SceneStore, rect: Rect) -> Vec<ObjectId> {
    let mut out = Vec::new();
    for obj in store.iter() {
        if !obj.bounds().overlaps(rect) {
            continue;
        }
        let id = match &obj.group_id {
            Some(gid) if store.contains(gid) => gid.clone(),
            _ => obj.id.clone(),
        };
        if !out.contains(&id) {
            out.push(id);
        }
    }
    out
}

/// Ordered set of selected object ids. Transient, never serialized.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    ids: Vec<ObjectId>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ids(&self) -> &[ObjectId] {
        &self.ids
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn contains(&self, id: &ObjectId) -> bool {
        self.ids.contains(id)
    }

    /// Replace the selection with a single object.
    pub fn set(&mut self, id: ObjectId) {
        self.ids = vec![id];
    }

    pub fn set_many(&mut self, ids: Vec<ObjectId>) {
        self.ids.clear();
        for id in ids {
            if !self.ids.contains(&id) {
                self.ids.push(id);
            }
        }
    }

    /// Shift-click semantics: add if absent, remove if present.
    pub fn toggle(&mut self, id: ObjectId) {
        if let Some(pos) = self.ids.iter().position(|i| i == &id) {
            self.ids.remove(pos);
        } else {
            self.ids.push(id);
        }
    }

    /// Rubber-band release: union new hits in, preserving order.
    pub fn extend(&mut self, ids: impl IntoIterator<Item = ObjectId>) {
        for id in ids {
            if !self.ids.contains(&id) {
                self.ids.push(id);
            }
        }
    }

    pub fn remove(&mut self, id: &ObjectId) {
        self.ids.retain(|i| i != id);
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    /// Drop ids that no longer resolve in the store.
    pub fn retain_live(&mut self, store: &SceneStore) {
        self.ids.retain(|id| store.contains(id));
    }
}
