//! Document model: image sprites, groups, and the in-memory store.
//!
//! `DocStore` owns every `ImageNode` in paint order together with the list of
//! `ImageGroup`s. All membership changes go through the store so that the
//! image-to-group and group-to-image references stay in agreement and no group
//! is ever left with fewer than two members.
//!
//! Data flows into this layer from the input engine (selection, drag, group
//! mutations), from decoded uploads (`insert`), and from server snapshots or
//! peer events (`load_snapshot`, `apply_group_record`, `dissolve_group`).

#[cfg(test)]
#[path = "doc_test.rs"]
mod doc_test;

use std::collections::HashSet;

use uuid::Uuid;
use wire::{CanvasState, GroupRecord, ImageRecord};

use crate::hit::Rect;

pub use wire::{GroupId, ImageId};

/// Fewest members a group may have before it is dissolved.
pub const MIN_GROUP_SIZE: usize = 2;

/// A positioned image sprite.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageNode {
    /// Unique identifier, generated at creation.
    pub id: ImageId,
    /// Locator of the source image; the decoded raster lives with the browser engine.
    pub src: String,
    /// Left edge in world coordinates.
    pub x: f64,
    /// Top edge in world coordinates.
    pub y: f64,
    /// Display width in world units.
    pub w: f64,
    /// Display height in world units.
    pub h: f64,
    /// Ephemeral UI selection state.
    pub selected: bool,
    /// Group this image belongs to, if any.
    pub group_id: Option<GroupId>,
}

impl ImageNode {
    /// A fresh, unselected, ungrouped node with a new id.
    #[must_use]
    pub fn new(src: impl Into<String>, x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { id: Uuid::new_v4(), src: src.into(), x, y, w, h, selected: false, group_id: None }
    }

    /// World-space bounding box.
    #[must_use]
    pub fn bounds(&self) -> Rect {
        Rect::new(self.x, self.y, self.w, self.h)
    }

    #[must_use]
    pub fn to_record(&self) -> ImageRecord {
        ImageRecord {
            id: self.id,
            src: self.src.clone(),
            x: self.x,
            y: self.y,
            w: self.w,
            h: self.h,
            selected: self.selected,
            group_id: self.group_id,
        }
    }

    /// Build a node from a record. Group membership is not trusted and is
    /// restored only from group records.
    #[must_use]
    pub fn from_record(record: &ImageRecord) -> Self {
        Self {
            id: record.id,
            src: record.src.clone(),
            x: record.x,
            y: record.y,
            w: record.w,
            h: record.h,
            selected: false,
            group_id: None,
        }
    }
}

/// A named set of images that select and move together.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageGroup {
    pub id: GroupId,
    /// Member ids in insertion order, without duplicates.
    pub image_ids: Vec<ImageId>,
    pub name: String,
}

impl ImageGroup {
    #[must_use]
    pub fn to_record(&self) -> GroupRecord {
        GroupRecord { id: self.id, image_ids: self.image_ids.clone(), name: Some(self.name.clone()) }
    }
}

/// How a group was affected by removing one of its members.
#[derive(Debug, Clone, PartialEq)]
pub enum GroupChange {
    /// The group survived with the membership shown.
    Shrunk(GroupRecord),
    /// The group fell below two members and was deleted.
    Dissolved {
        group_id: GroupId,
        /// Every member the group had before the removal.
        image_ids: Vec<ImageId>,
    },
}

/// Broken store invariants reported by [`DocStore::check_consistency`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DocError {
    #[error("image {0} appears more than once")]
    DuplicateImage(ImageId),
    #[error("image {image} references missing group {group}")]
    DanglingGroupRef { image: ImageId, group: GroupId },
    #[error("group {group} lists missing image {image}")]
    MissingMember { group: GroupId, image: ImageId },
    #[error("group {group} lists image {image} whose group is {actual:?}")]
    MembershipMismatch { group: GroupId, image: ImageId, actual: Option<GroupId> },
    #[error("group {group} has {size} members")]
    UndersizedGroup { group: GroupId, size: usize },
}

/// In-memory store of image nodes and groups.
#[derive(Debug, Default)]
pub struct DocStore {
    images: Vec<ImageNode>,
    groups: Vec<ImageGroup>,
    group_counter: u32,
}

impl DocStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // --- Nodes ---

    /// Append a node on top of the paint order.
    ///
    /// The node arrives ungrouped. Returns `false` and leaves the store
    /// untouched if the id is already present.
    pub fn insert(&mut self, mut node: ImageNode) -> bool {
        if self.get(&node.id).is_some() {
            return false;
        }
        node.group_id = None;
        self.images.push(node);
        true
    }

    #[must_use]
    pub fn get(&self, id: &ImageId) -> Option<&ImageNode> {
        self.images.iter().find(|img| img.id == *id)
    }

    fn get_mut(&mut self, id: &ImageId) -> Option<&mut ImageNode> {
        self.images.iter_mut().find(|img| img.id == *id)
    }

    /// All nodes in paint order (bottom first).
    #[must_use]
    pub fn images(&self) -> &[ImageNode] {
        &self.images
    }

    #[must_use]
    pub fn groups(&self) -> &[ImageGroup] {
        &self.groups
    }

    #[must_use]
    pub fn group(&self, id: &GroupId) -> Option<&ImageGroup> {
        self.groups.iter().find(|g| g.id == *id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.images.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    /// Move a node's top-left corner. Returns `false` for an unknown id.
    pub fn set_position(&mut self, id: &ImageId, x: f64, y: f64) -> bool {
        let Some(node) = self.get_mut(id) else {
            return false;
        };
        node.x = x;
        node.y = y;
        true
    }

    // --- Selection ---

    /// Ids of selected nodes in paint order.
    #[must_use]
    pub fn selected_ids(&self) -> Vec<ImageId> {
        self.images.iter().filter(|img| img.selected).map(|img| img.id).collect()
    }

    #[must_use]
    pub fn selected_count(&self) -> usize {
        self.images.iter().filter(|img| img.selected).count()
    }

    /// Set one node's selection flag. Returns `true` if it changed.
    pub fn set_selected(&mut self, id: &ImageId, selected: bool) -> bool {
        match self.get_mut(id) {
            Some(node) if node.selected != selected => {
                node.selected = selected;
                true
            }
            _ => false,
        }
    }

    /// Deselect everything. Returns `true` if any flag changed.
    pub fn clear_selection(&mut self) -> bool {
        let mut changed = false;
        for node in &mut self.images {
            changed |= node.selected;
            node.selected = false;
        }
        changed
    }

    /// The node itself, or every member of its group when grouped.
    #[must_use]
    pub fn selection_unit(&self, id: &ImageId) -> Vec<ImageId> {
        let group = self.get(id).and_then(|node| node.group_id).and_then(|gid| self.group(&gid));
        match group {
            Some(group) => group.image_ids.clone(),
            None if self.get(id).is_some() => vec![*id],
            None => Vec::new(),
        }
    }

    /// Replace the selection with `id` and the rest of its group.
    pub fn select_only(&mut self, id: &ImageId) {
        self.clear_selection();
        for member in self.selection_unit(id) {
            self.set_selected(&member, true);
        }
    }

    /// Toggle `id` and the rest of its group to a single state: everything
    /// off if all members were selected, otherwise everything on.
    pub fn toggle_selection(&mut self, id: &ImageId) {
        let unit = self.selection_unit(id);
        let all_selected = unit.iter().all(|m| self.get(m).is_some_and(|n| n.selected));
        for member in &unit {
            self.set_selected(member, !all_selected);
        }
    }

    // --- Groups ---

    /// Detach `id` from its group, dissolving the group if fewer than two
    /// members would remain. Returns `None` if the node was not grouped.
    pub fn remove_from_group(&mut self, id: &ImageId) -> Option<GroupChange> {
        let group_id = self.get_mut(id)?.group_id.take()?;
        let idx = self.groups.iter().position(|g| g.id == group_id)?;

        let before = self.groups[idx].image_ids.clone();
        self.groups[idx].image_ids.retain(|m| m != id);

        if self.groups[idx].image_ids.len() >= MIN_GROUP_SIZE {
            return Some(GroupChange::Shrunk(self.groups[idx].to_record()));
        }

        let dissolved = self.groups.remove(idx);
        for member in &dissolved.image_ids {
            if let Some(node) = self.get_mut(member) {
                node.group_id = None;
            }
        }
        Some(GroupChange::Dissolved { group_id, image_ids: before })
    }

    /// Create a new group from `ids`.
    ///
    /// Unknown and repeated ids are skipped. Members that already belong to a
    /// group are extracted first. Returns the new group id and the changes to
    /// previous groups, or `None` when fewer than two usable ids remain.
    pub fn group_images(&mut self, ids: &[ImageId]) -> Option<(GroupId, Vec<GroupChange>)> {
        let members = self.existing_unique(ids);
        if members.len() < MIN_GROUP_SIZE {
            return None;
        }

        let changes: Vec<GroupChange> = members.iter().filter_map(|id| self.remove_from_group(id)).collect();

        self.group_counter += 1;
        let group = ImageGroup { id: Uuid::new_v4(), image_ids: members, name: format!("Group {}", self.group_counter) };
        let group_id = group.id;
        self.attach(group);
        Some((group_id, changes))
    }

    /// Remove each grouped node in `ids` from its group.
    ///
    /// Returns the ids in `ids` that were grouped beforehand, and what
    /// happened to their groups.
    pub fn ungroup_images(&mut self, ids: &[ImageId]) -> (Vec<ImageId>, Vec<GroupChange>) {
        let affected: Vec<ImageId> = self
            .existing_unique(ids)
            .into_iter()
            .filter(|id| self.get(id).is_some_and(|n| n.group_id.is_some()))
            .collect();
        let changes = affected.iter().filter_map(|id| self.remove_from_group(id)).collect();
        (affected, changes)
    }

    /// Delete every node in `ids`, detaching grouped ones from their groups
    /// first. Returns the removed nodes in paint order and the group changes.
    pub fn delete_images(&mut self, ids: &[ImageId]) -> (Vec<ImageNode>, Vec<GroupChange>) {
        let targets: HashSet<ImageId> = ids.iter().copied().collect();
        let changes: Vec<GroupChange> = ids.iter().filter_map(|id| self.remove_from_group(id)).collect();

        let (removed, kept): (Vec<ImageNode>, Vec<ImageNode>) =
            std::mem::take(&mut self.images).into_iter().partition(|img| targets.contains(&img.id));
        self.images = kept;
        (removed, changes)
    }

    /// Install or replace a group from a peer's record.
    ///
    /// Members are moved out of any other group first. Records naming fewer
    /// than two known images are ignored and `false` is returned.
    pub fn apply_group_record(&mut self, record: &GroupRecord) -> bool {
        let members = self.existing_unique(&record.image_ids);
        if members.len() < MIN_GROUP_SIZE {
            return false;
        }

        if let Some(old) = self.groups.iter().position(|g| g.id == record.id) {
            let old = self.groups.remove(old);
            for member in &old.image_ids {
                if let Some(node) = self.get_mut(member) {
                    node.group_id = None;
                }
            }
        }
        for id in &members {
            self.remove_from_group(id);
        }

        let name = match &record.name {
            Some(name) => name.clone(),
            None => {
                self.group_counter += 1;
                format!("Group {}", self.group_counter)
            }
        };
        self.attach(ImageGroup { id: record.id, image_ids: members, name });
        true
    }

    /// Delete a group outright, clearing every member's back-reference.
    /// Returns the former members, or `None` for an unknown group.
    pub fn dissolve_group(&mut self, group_id: &GroupId) -> Option<Vec<ImageId>> {
        let idx = self.groups.iter().position(|g| g.id == *group_id)?;
        let group = self.groups.remove(idx);
        for member in &group.image_ids {
            if let Some(node) = self.get_mut(member) {
                node.group_id = None;
            }
        }
        Some(group.image_ids)
    }

    fn attach(&mut self, group: ImageGroup) {
        for member in &group.image_ids {
            if let Some(node) = self.get_mut(member) {
                node.group_id = Some(group.id);
            }
        }
        self.groups.push(group);
    }

    fn existing_unique(&self, ids: &[ImageId]) -> Vec<ImageId> {
        let mut seen = HashSet::new();
        ids.iter().copied().filter(|id| self.get(id).is_some() && seen.insert(*id)).collect()
    }

    // --- Snapshots ---

    /// Replace all nodes and groups with the contents of `state`.
    ///
    /// Duplicate image ids keep their first occurrence. Group records are
    /// repaired the same way live mutations are: unknown members are dropped,
    /// an image claimed by two groups stays with the first, and groups left
    /// with fewer than two members are discarded.
    pub fn load_snapshot(&mut self, state: &CanvasState) {
        self.images.clear();
        self.groups.clear();
        self.group_counter = 0;

        for record in &state.images {
            self.insert(ImageNode::from_record(record));
        }

        for record in &state.groups {
            let members: Vec<ImageId> = self
                .existing_unique(&record.image_ids)
                .into_iter()
                .filter(|id| self.get(id).is_some_and(|n| n.group_id.is_none()))
                .collect();
            if members.len() < MIN_GROUP_SIZE {
                log::warn!("doc: dropping group {} with {} usable members", record.id, members.len());
                continue;
            }
            self.group_counter += 1;
            let name = record.name.clone().unwrap_or_else(|| format!("Group {}", self.group_counter));
            self.attach(ImageGroup { id: record.id, image_ids: members, name });
        }
    }

    #[must_use]
    pub fn image_records(&self) -> Vec<ImageRecord> {
        self.images.iter().map(ImageNode::to_record).collect()
    }

    #[must_use]
    pub fn group_records(&self) -> Vec<GroupRecord> {
        self.groups.iter().map(ImageGroup::to_record).collect()
    }

    // --- Invariants ---

    /// Verify unique ids, two-way group references, and minimum group size.
    ///
    /// # Errors
    ///
    /// Returns the first [`DocError`] found.
    pub fn check_consistency(&self) -> Result<(), DocError> {
        let mut seen = HashSet::new();
        for node in &self.images {
            if !seen.insert(node.id) {
                return Err(DocError::DuplicateImage(node.id));
            }
            if let Some(group_id) = node.group_id {
                let listed = self.group(&group_id).is_some_and(|g| g.image_ids.contains(&node.id));
                if !listed {
                    return Err(DocError::DanglingGroupRef { image: node.id, group: group_id });
                }
            }
        }

        for group in &self.groups {
            if group.image_ids.len() < MIN_GROUP_SIZE {
                return Err(DocError::UndersizedGroup { group: group.id, size: group.image_ids.len() });
            }
            for member in &group.image_ids {
                let Some(node) = self.get(member) else {
                    return Err(DocError::MissingMember { group: group.id, image: *member });
                };
                if node.group_id != Some(group.id) {
                    return Err(DocError::MembershipMismatch { group: group.id, image: *member, actual: node.group_id });
                }
            }
        }
        Ok(())
    }
}
