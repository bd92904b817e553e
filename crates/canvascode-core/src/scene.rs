//! Flat scene store with z-ordering and grouping.

use crate::object::{CanvasObject, ObjectDraft, ObjectId, ObjectKind};
use kurbo::Rect;

/// All objects on the canvas, in insertion order.
///
/// Stacking is governed by `z_index` with insertion order breaking ties;
/// [`SceneStore::objects_by_z`] is the single ordering used by rendering,
/// hit-testing and compositing alike.
#[derive(Debug, Clone, Default)]
pub struct SceneStore {
    objects: Vec<CanvasObject>,
}

impl SceneStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CanvasObject> {
        self.objects.iter()
    }

    pub fn get(&self, id: &ObjectId) -> Option<&CanvasObject> {
        self.objects.iter().find(|o| &o.id == id)
    }

    pub fn get_mut(&mut self, id: &ObjectId) -> Option<&mut CanvasObject> {
        self.objects.iter_mut().find(|o| &o.id == id)
    }

    pub fn contains(&self, id: &ObjectId) -> bool {
        self.get(id).is_some()
    }

    /// Materialize a draft: fresh id, z above everything else.
    pub fn create(&mut self, draft: ObjectDraft) -> &CanvasObject {
        let mut obj = CanvasObject::new(draft.kind, draft.x, draft.y, draft.width, draft.height);
        if let Some(name) = draft.name {
            obj.name = name;
        }
        obj.z_index = self.max_z_index() + 1;
        let idx = self.objects.len();
        self.objects.push(obj);
        &self.objects[idx]
    }

    /// Insert a fully-formed object (paste, splice, undo restore).
    pub fn insert(&mut self, object: CanvasObject) {
        self.objects.push(object);
    }

    /// Apply `patch` to every listed object that exists.
    pub fn update<F>(&mut self, ids: &[ObjectId], mut patch: F)
    where
        F: FnMut(&mut CanvasObject),
    {
        for obj in &mut self.objects {
            if ids.contains(&obj.id) {
                patch(obj);
            }
        }
    }

    /// Remove the listed objects. Removing a group clears its members'
    /// back-references; removing the last member of a group leaves the empty
    /// group in place.
    pub fn remove(&mut self, ids: &[ObjectId]) {
        let removed_groups: Vec<ObjectId> = self
            .objects
            .iter()
            .filter(|o| o.is_group() && ids.contains(&o.id))
            .map(|o| o.id.clone())
            .collect();

        self.objects.retain(|o| !ids.contains(&o.id));

        for obj in &mut self.objects {
            if let Some(gid) = &obj.group_id {
                if removed_groups.contains(gid) {
                    obj.group_id = None;
                }
            }
        }
    }

    /// Replace the entire object set (history restore).
    pub fn replace_all(&mut self, objects: Vec<CanvasObject>) {
        self.objects = objects;
    }

    pub fn to_vec(&self) -> Vec<CanvasObject> {
        self.objects.clone()
    }

    pub fn max_z_index(&self) -> i64 {
        self.objects.iter().map(|o| o.z_index).max().unwrap_or(0)
    }

    pub fn min_z_index(&self) -> i64 {
        self.objects.iter().map(|o| o.z_index).min().unwrap_or(0)
    }

    pub fn bring_to_front(&mut self, id: &ObjectId) {
        let top = self.max_z_index() + 1;
        if let Some(obj) = self.get_mut(id) {
            obj.z_index = top;
        }
    }

    pub fn send_to_back(&mut self, id: &ObjectId) {
        let bottom = self.min_z_index() - 1;
        if let Some(obj) = self.get_mut(id) {
            obj.z_index = bottom;
        }
    }

    pub fn bring_forward(&mut self, id: &ObjectId) {
        if let Some(obj) = self.get_mut(id) {
            obj.z_index += 1;
        }
    }

    /// Lower one step, never below zero.
    pub fn send_backward(&mut self, id: &ObjectId) {
        if let Some(obj) = self.get_mut(id) {
            obj.z_index = (obj.z_index - 1).max(0);
        }
    }

    /// Objects in paint order: ascending z, insertion order breaking ties.
    pub fn objects_by_z(&self) -> Vec<&CanvasObject> {
        let mut sorted: Vec<&CanvasObject> = self.objects.iter().collect();
        sorted.sort_by_key(|o| o.z_index);
        sorted
    }

    /// Ids of the live members of a group.
    pub fn members_of(&self, group_id: &ObjectId) -> Vec<ObjectId> {
        self.objects
            .iter()
            .filter(|o| o.group_id.as_ref() == Some(group_id))
            .map(|o| o.id.clone())
            .collect()
    }

    /// Group the listed objects under a new group object sized to the union
    /// of their boxes. Returns `None` (and leaves the store untouched) when
    /// fewer than two of the ids resolve.
    pub fn group(&mut self, ids: &[ObjectId]) -> Option<ObjectId> {
        let members: Vec<ObjectId> = ids
            .iter()
            .filter(|id| self.contains(id))
            .cloned()
            .collect();
        if members.len() < 2 {
            return None;
        }

        let mut union: Option<Rect> = None;
        for id in &members {
            let b = self.get(id).map(CanvasObject::bounds)?;
            union = Some(match union {
                Some(u) => u.union(b),
                None => b,
            });
        }
        let bbox = union?;

        let mut group = CanvasObject::new(
            ObjectKind::Group,
            bbox.center().x,
            bbox.center().y,
            bbox.width(),
            bbox.height(),
        );
        group.z_index = self.max_z_index() + 1;
        let gid = group.id.clone();
        self.objects.push(group);

        for id in &members {
            if let Some(obj) = self.get_mut(id) {
                obj.group_id = Some(gid.clone());
            }
        }
        log::debug!("grouped {} objects into {gid}", members.len());
        Some(gid)
    }

    /// Dissolve every group among the listed ids, freeing its members.
    /// Returns the ids of the freed members.
    pub fn ungroup(&mut self, ids: &[ObjectId]) -> Vec<ObjectId> {
        let groups: Vec<ObjectId> = ids
            .iter()
            .filter(|id| self.get(id).is_some_and(CanvasObject::is_group))
            .cloned()
            .collect();
        let mut freed = Vec::new();
        for gid in &groups {
            freed.extend(self.members_of(gid));
        }
        for obj in &mut self.objects {
            if let Some(gid) = &obj.group_id {
                if groups.contains(gid) {
                    obj.group_id = None;
                }
            }
        }
        self.objects.retain(|o| !groups.contains(&o.id));
        freed
    }

    /// Union bounding box of all objects.
    pub fn bounds(&self) -> Option<Rect> {
        self.objects
            .iter()
            .map(CanvasObject::bounds)
            .reduce(|a, b| a.union(b))
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.objects)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let objects: Vec<CanvasObject> = serde_json::from_str(json)?;
        Ok(Self { objects })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect_at(x: f64, y: f64, w: f64, h: f64) -> ObjectDraft {
        ObjectDraft::new(
            ObjectKind::Rectangle {
                background_color: None,
            },
            x,
            y,
            w,
            h,
        )
    }

    #[test]
    fn test_create_assigns_top_z() {
        let mut store = SceneStore::new();
        let a = store.create(rect_at(0.0, 0.0, 10.0, 10.0)).id.clone();
        let b = store.create(rect_at(5.0, 5.0, 10.0, 10.0)).id.clone();
        assert!(store.get(&b).unwrap().z_index > store.get(&a).unwrap().z_index);
    }

    #[test]
    fn test_z_order_ties_break_by_insertion() {
        let mut store = SceneStore::new();
        let a = store.create(rect_at(0.0, 0.0, 10.0, 10.0)).id.clone();
        let b = store.create(rect_at(0.0, 0.0, 10.0, 10.0)).id.clone();
        store.update(&[a.clone(), b.clone()], |o| o.z_index = 7);
        let order: Vec<&ObjectId> = store.objects_by_z().iter().map(|o| &o.id).collect();
        assert_eq!(order, vec![&a, &b]);
    }

    #[test]
    fn test_send_backward_clamps_at_zero() {
        let mut store = SceneStore::new();
        let a = store.create(rect_at(0.0, 0.0, 10.0, 10.0)).id.clone();
        store.update(&[a.clone()], |o| o.z_index = 0);
        store.send_backward(&a);
        assert_eq!(store.get(&a).unwrap().z_index, 0);
        // send_to_back has no floor
        store.send_to_back(&a);
        assert_eq!(store.get(&a).unwrap().z_index, -1);
    }

    #[test]
    fn test_group_box_is_union_of_member_edges() {
        let mut store = SceneStore::new();
        let a = store.create(rect_at(150.0, 50.0, 100.0, 100.0)).id.clone();
        let b = store.create(rect_at(350.0, 50.0, 100.0, 100.0)).id.clone();
        let gid = store.group(&[a.clone(), b.clone()]).unwrap();
        let g = store.get(&gid).unwrap();
        let bounds = g.bounds();
        assert!((bounds.x0 - 100.0).abs() < f64::EPSILON);
        assert!((bounds.y0 - 0.0).abs() < f64::EPSILON);
        assert!((bounds.width() - 300.0).abs() < f64::EPSILON);
        assert!((bounds.height() - 100.0).abs() < f64::EPSILON);
        assert_eq!(store.get(&a).unwrap().group_id, Some(gid.clone()));
        assert_eq!(store.get(&b).unwrap().group_id, Some(gid));
    }

    #[test]
    fn test_group_requires_two_objects() {
        let mut store = SceneStore::new();
        let a = store.create(rect_at(0.0, 0.0, 10.0, 10.0)).id.clone();
        assert!(store.group(&[a.clone()]).is_none());
        assert!(store.get(&a).unwrap().group_id.is_none());
    }

    #[test]
    fn test_ungroup_restores_independence() {
        let mut store = SceneStore::new();
        let a = store.create(rect_at(0.0, 0.0, 10.0, 10.0)).id.clone();
        let b = store.create(rect_at(20.0, 0.0, 10.0, 10.0)).id.clone();
        let gid = store.group(&[a.clone(), b.clone()]).unwrap();
        let freed = store.ungroup(&[gid.clone()]);
        assert_eq!(freed.len(), 2);
        assert!(store.get(&gid).is_none());
        assert!(store.get(&a).unwrap().group_id.is_none());
        assert!(store.get(&b).unwrap().group_id.is_none());
    }

    #[test]
    fn test_remove_group_clears_back_references() {
        let mut store = SceneStore::new();
        let a = store.create(rect_at(0.0, 0.0, 10.0, 10.0)).id.clone();
        let b = store.create(rect_at(20.0, 0.0, 10.0, 10.0)).id.clone();
        let gid = store.group(&[a.clone(), b.clone()]).unwrap();
        store.remove(&[gid.clone()]);
        assert!(store.get(&gid).is_none());
        assert!(store.get(&a).unwrap().group_id.is_none());
        assert!(store.get(&b).unwrap().group_id.is_none());
    }

    #[test]
    fn test_empty_group_survives_member_removal() {
        let mut store = SceneStore::new();
        let a = store.create(rect_at(0.0, 0.0, 10.0, 10.0)).id.clone();
        let b = store.create(rect_at(20.0, 0.0, 10.0, 10.0)).id.clone();
        let gid = store.group(&[a.clone(), b.clone()]).unwrap();
        store.remove(&[a, b]);
        assert!(store.get(&gid).is_some());
        assert!(store.members_of(&gid).is_empty());
    }

    #[test]
    fn test_json_round_trip() {
        let mut store = SceneStore::new();
        store.create(rect_at(10.0, 20.0, 30.0, 40.0));
        let json = store.to_json().unwrap();
        let back = SceneStore::from_json(&json).unwrap();
        assert_eq!(back.to_vec(), store.to_vec());
    }
}
