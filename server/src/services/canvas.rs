//! Canvas service: document CRUD, images and groups.
//!
//! DESIGN
//! ======
//! Every mutation updates the in-memory `CanvasState`, stamps
//! `last_modified`, releases the write lock, then broadcasts the matching
//! `CanvasEvent` to the canvas room. Route handlers only translate HTTP.
//!
//! GROUP RULES
//! ===========
//! Same as the browser engine: an image belongs to at most one group, and a
//! group never has fewer than two members. Taking images out of a group that
//! would leave it with one member dissolves it and clears that member's
//! `group_id`.

use std::collections::HashSet;

use tracing::{info, warn};
use uuid::Uuid;
use wire::{
    CanvasEvent, CanvasId, CanvasState, Frame, GroupId, GroupRecord, ImageDeleted, ImageId, ImageRecord, ImagesUngrouped,
    now_ms,
};

use crate::services::room;
use crate::state::AppState;

/// Fewest members a group may have.
pub const MIN_GROUP_SIZE: usize = 2;

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CanvasServiceError {
    #[error("canvas not found: {0}")]
    CanvasNotFound(CanvasId),
    #[error("image not found: {0}")]
    ImageNotFound(ImageId),
    #[error("group not found: {0}")]
    GroupNotFound(GroupId),
    #[error("need at least {MIN_GROUP_SIZE} images to create a group, got {0}")]
    TooFewImages(usize),
    #[error("images not on canvas: {0:?}")]
    UnknownImages(Vec<ImageId>),
}

// =============================================================================
// CANVAS CRUD
// =============================================================================

/// Create an empty canvas with a fresh id.
pub async fn create_canvas(state: &AppState) -> CanvasState {
    let id = Uuid::new_v4();
    let canvas = CanvasState::empty(id, now_ms());
    state.canvases.write().await.insert(id, canvas.clone());
    state.chats.write().await.entry(id).or_default();
    info!(canvas_id = %id, "canvas created");
    canvas
}

/// Current state of a canvas.
///
/// # Errors
///
/// Returns `CanvasNotFound` for an unknown id.
pub async fn get_canvas(state: &AppState, canvas_id: CanvasId) -> Result<CanvasState, CanvasServiceError> {
    state
        .canvases
        .read()
        .await
        .get(&canvas_id)
        .cloned()
        .ok_or(CanvasServiceError::CanvasNotFound(canvas_id))
}

/// Replace a canvas wholesale and broadcast `canvas_update`.
///
/// The path id wins over the body id. Group membership is repaired so the
/// stored document obeys the group rules.
///
/// # Errors
///
/// Returns `CanvasNotFound` for an unknown id.
pub async fn replace_canvas(
    state: &AppState,
    canvas_id: CanvasId,
    mut incoming: CanvasState,
) -> Result<CanvasState, CanvasServiceError> {
    incoming.id = canvas_id;
    incoming.last_modified = now_ms();
    repair_groups(&mut incoming);

    {
        let mut canvases = state.canvases.write().await;
        let slot = canvases
            .get_mut(&canvas_id)
            .ok_or(CanvasServiceError::CanvasNotFound(canvas_id))?;
        *slot = incoming.clone();
    }

    info!(%canvas_id, images = incoming.images.len(), groups = incoming.groups.len(), "canvas replaced");
    room::broadcast(state, &Frame::new(canvas_id, CanvasEvent::CanvasUpdate(incoming.clone())), None).await;
    Ok(incoming)
}

/// Number of canvases held in memory.
pub async fn canvas_count(state: &AppState) -> usize {
    state.canvases.read().await.len()
}

// =============================================================================
// IMAGES
// =============================================================================

/// Append an image under a fresh id and broadcast `image_added`.
///
/// New images start unselected and ungrouped.
///
/// # Errors
///
/// Returns `CanvasNotFound` for an unknown id.
pub async fn add_image(
    state: &AppState,
    canvas_id: CanvasId,
    mut image: ImageRecord,
) -> Result<ImageRecord, CanvasServiceError> {
    image.id = Uuid::new_v4();
    image.selected = false;
    image.group_id = None;

    with_canvas(state, canvas_id, |canvas| {
        canvas.images.push(image.clone());
        Ok(())
    })
    .await?;

    info!(%canvas_id, image_id = %image.id, "image added");
    room::broadcast(state, &Frame::new(canvas_id, CanvasEvent::ImageAdded(image.clone())), None).await;
    Ok(image)
}

/// Remove an image, shrinking or dissolving its group, and broadcast
/// `image_deleted`.
///
/// # Errors
///
/// Returns `CanvasNotFound` or `ImageNotFound`.
pub async fn delete_image(state: &AppState, canvas_id: CanvasId, image_id: ImageId) -> Result<(), CanvasServiceError> {
    with_canvas(state, canvas_id, |canvas| {
        let before = canvas.images.len();
        canvas.images.retain(|img| img.id != image_id);
        if canvas.images.len() == before {
            return Err(CanvasServiceError::ImageNotFound(image_id));
        }
        release_members(canvas, &HashSet::from([image_id]));
        Ok(())
    })
    .await?;

    info!(%canvas_id, %image_id, "image deleted");
    let event = CanvasEvent::ImageDeleted(ImageDeleted { image_id });
    room::broadcast(state, &Frame::new(canvas_id, event), None).await;
    Ok(())
}

// =============================================================================
// GROUPS
// =============================================================================

/// Group the given images and broadcast `images_grouped`.
///
/// Duplicate ids are ignored. Members are first taken out of any group they
/// belong to; groups left too small are dropped.
///
/// # Errors
///
/// Returns `CanvasNotFound`, `TooFewImages` when fewer than two distinct ids
/// are given, or `UnknownImages` listing ids not on the canvas.
pub async fn create_group(
    state: &AppState,
    canvas_id: CanvasId,
    image_ids: Vec<ImageId>,
) -> Result<GroupRecord, CanvasServiceError> {
    let mut seen = HashSet::new();
    let members: Vec<ImageId> = image_ids.into_iter().filter(|id| seen.insert(*id)).collect();
    if members.len() < MIN_GROUP_SIZE {
        return Err(CanvasServiceError::TooFewImages(members.len()));
    }

    let group = with_canvas(state, canvas_id, |canvas| {
        let missing: Vec<ImageId> = members
            .iter()
            .filter(|id| !canvas.images.iter().any(|img| img.id == **id))
            .copied()
            .collect();
        if !missing.is_empty() {
            return Err(CanvasServiceError::UnknownImages(missing));
        }

        release_members(canvas, &seen);
        let group = GroupRecord {
            id: Uuid::new_v4(),
            image_ids: members.clone(),
            name: Some(format!("Group {}", canvas.groups.len() + 1)),
        };
        for img in canvas.images.iter_mut().filter(|img| seen.contains(&img.id)) {
            img.group_id = Some(group.id);
        }
        canvas.groups.push(group.clone());
        Ok(group)
    })
    .await?;

    info!(%canvas_id, group_id = %group.id, members = group.image_ids.len(), "images grouped");
    room::broadcast(state, &Frame::new(canvas_id, CanvasEvent::ImagesGrouped(group.clone())), None).await;
    Ok(group)
}

/// Dissolve a group and broadcast `images_ungrouped`. Returns the former members.
///
/// # Errors
///
/// Returns `CanvasNotFound` or `GroupNotFound`.
pub async fn delete_group(
    state: &AppState,
    canvas_id: CanvasId,
    group_id: GroupId,
) -> Result<Vec<ImageId>, CanvasServiceError> {
    let image_ids = with_canvas(state, canvas_id, |canvas| {
        let idx = canvas
            .groups
            .iter()
            .position(|g| g.id == group_id)
            .ok_or(CanvasServiceError::GroupNotFound(group_id))?;
        let group = canvas.groups.remove(idx);
        for img in &mut canvas.images {
            if img.group_id == Some(group_id) {
                img.group_id = None;
            }
        }
        Ok(group.image_ids)
    })
    .await?;

    info!(%canvas_id, %group_id, "group dissolved");
    let event = CanvasEvent::ImagesUngrouped(ImagesUngrouped { group_id, image_ids: image_ids.clone() });
    room::broadcast(state, &Frame::new(canvas_id, event), None).await;
    Ok(image_ids)
}

// =============================================================================
// HELPERS
// =============================================================================

/// Run `f` on a canvas under the write lock and stamp `last_modified` on success.
async fn with_canvas<T>(
    state: &AppState,
    canvas_id: CanvasId,
    f: impl FnOnce(&mut CanvasState) -> Result<T, CanvasServiceError>,
) -> Result<T, CanvasServiceError> {
    let mut canvases = state.canvases.write().await;
    let canvas = canvases
        .get_mut(&canvas_id)
        .ok_or(CanvasServiceError::CanvasNotFound(canvas_id))?;
    let out = f(canvas)?;
    canvas.last_modified = now_ms();
    Ok(out)
}

/// Take `ids` out of every group. Groups left below the minimum are dropped
/// and their remaining members become ungrouped.
fn release_members(canvas: &mut CanvasState, ids: &HashSet<ImageId>) {
    for group in &mut canvas.groups {
        group.image_ids.retain(|id| !ids.contains(id));
    }

    let mut orphaned = HashSet::new();
    canvas.groups.retain(|group| {
        let keep = group.image_ids.len() >= MIN_GROUP_SIZE;
        if !keep {
            orphaned.insert(group.id);
        }
        keep
    });

    for img in &mut canvas.images {
        let orphan = img.group_id.is_some_and(|gid| orphaned.contains(&gid));
        if orphan || ids.contains(&img.id) {
            img.group_id = None;
        }
    }
}

/// Make group membership consistent in both directions.
///
/// Images repeating an earlier id are dropped first, keeping the first
/// occurrence, as the canvas does on load. Member lists keep only existing images, each image at most once across
/// all groups (first group wins). Groups left too small are dropped. Every
/// image's `group_id` is then derived from the surviving groups.
fn repair_groups(canvas: &mut CanvasState) {
    let mut existing: HashSet<ImageId> = HashSet::new();
    let before = canvas.images.len();
    canvas.images.retain(|img| existing.insert(img.id));
    if canvas.images.len() < before {
        warn!(canvas_id = %canvas.id, dropped = before - canvas.images.len(), "duplicate image ids dropped");
    }
    let mut claimed = HashSet::new();
    let mut seen_groups = HashSet::new();

    canvas.groups.retain_mut(|group| {
        if !seen_groups.insert(group.id) {
            return false;
        }
        group
            .image_ids
            .retain(|id| existing.contains(id) && claimed.insert(*id));
        if group.image_ids.len() < MIN_GROUP_SIZE {
            for id in &group.image_ids {
                claimed.remove(id);
            }
            return false;
        }
        true
    });

    for img in &mut canvas.images {
        img.group_id = canvas
            .groups
            .iter()
            .find(|g| g.image_ids.contains(&img.id))
            .map(|g| g.id);
    }
}

#[cfg(test)]
#[path = "canvas_test.rs"]
mod tests;
