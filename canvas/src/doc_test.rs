#![allow(clippy::float_cmp)]

use uuid::Uuid;
use wire::ViewportRecord;

use super::*;

fn node_at(x: f64, y: f64) -> ImageNode {
    ImageNode::new("img.png", x, y, 50.0, 50.0)
}

/// Store with `n` ungrouped nodes laid out left to right; returns their ids.
fn store_with(n: usize) -> (DocStore, Vec<ImageId>) {
    let mut doc = DocStore::new();
    let mut ids = Vec::new();
    for i in 0..n {
        #[allow(clippy::cast_precision_loss)]
        let node = node_at(i as f64 * 100.0, 0.0);
        ids.push(node.id);
        assert!(doc.insert(node));
    }
    (doc, ids)
}

fn group_of(doc: &DocStore, id: &ImageId) -> Option<GroupId> {
    doc.get(id).and_then(|n| n.group_id)
}

// =============================================================
// ImageNode
// =============================================================

#[test]
fn new_node_is_unselected_and_ungrouped() {
    let node = ImageNode::new("a.png", 1.0, 2.0, 3.0, 4.0);
    assert!(!node.selected);
    assert!(node.group_id.is_none());
    assert_eq!(node.bounds(), Rect::new(1.0, 2.0, 3.0, 4.0));
}

#[test]
fn new_nodes_get_distinct_ids() {
    assert_ne!(node_at(0.0, 0.0).id, node_at(0.0, 0.0).id);
}

#[test]
fn from_record_drops_selection_and_group() {
    let record = ImageRecord {
        id: Uuid::new_v4(),
        src: "data:image/png;base64,AAAA".into(),
        x: 5.0,
        y: 6.0,
        w: 7.0,
        h: 8.0,
        selected: true,
        group_id: Some(Uuid::new_v4()),
    };
    let node = ImageNode::from_record(&record);
    assert_eq!(node.id, record.id);
    assert_eq!(node.src, record.src);
    assert_eq!((node.x, node.y, node.w, node.h), (5.0, 6.0, 7.0, 8.0));
    assert!(!node.selected);
    assert!(node.group_id.is_none());
}

// =============================================================
// insert / lookup
// =============================================================

#[test]
fn insert_appends_in_paint_order() {
    let (doc, ids) = store_with(3);
    let order: Vec<ImageId> = doc.images().iter().map(|n| n.id).collect();
    assert_eq!(order, ids);
    assert_eq!(doc.len(), 3);
    assert!(!doc.is_empty());
}

#[test]
fn insert_rejects_duplicate_id() {
    let (mut doc, ids) = store_with(1);
    let mut dup = node_at(500.0, 500.0);
    dup.id = ids[0];
    assert!(!doc.insert(dup));
    assert_eq!(doc.len(), 1);
    assert_eq!(doc.get(&ids[0]).map(|n| n.x), Some(0.0));
}

#[test]
fn insert_strips_foreign_group_reference() {
    let mut doc = DocStore::new();
    let mut node = node_at(0.0, 0.0);
    node.group_id = Some(Uuid::new_v4());
    let id = node.id;
    doc.insert(node);
    assert!(group_of(&doc, &id).is_none());
    assert!(doc.check_consistency().is_ok());
}

#[test]
fn set_position_moves_known_node() {
    let (mut doc, ids) = store_with(1);
    assert!(doc.set_position(&ids[0], 12.0, 34.0));
    let node = doc.get(&ids[0]).unwrap();
    assert_eq!((node.x, node.y), (12.0, 34.0));
    assert!(!doc.set_position(&Uuid::new_v4(), 0.0, 0.0));
}

// =============================================================
// Selection
// =============================================================

#[test]
fn set_selected_reports_change() {
    let (mut doc, ids) = store_with(1);
    assert!(doc.set_selected(&ids[0], true));
    assert!(!doc.set_selected(&ids[0], true));
    assert!(doc.set_selected(&ids[0], false));
}

#[test]
fn clear_selection_reports_change() {
    let (mut doc, ids) = store_with(2);
    assert!(!doc.clear_selection());
    doc.set_selected(&ids[1], true);
    assert!(doc.clear_selection());
    assert_eq!(doc.selected_count(), 0);
}

#[test]
fn selected_ids_follow_paint_order() {
    let (mut doc, ids) = store_with(3);
    doc.set_selected(&ids[2], true);
    doc.set_selected(&ids[0], true);
    assert_eq!(doc.selected_ids(), vec![ids[0], ids[2]]);
}

#[test]
fn select_only_selects_whole_group() {
    let (mut doc, ids) = store_with(3);
    doc.group_images(&ids[..2]).unwrap();
    doc.set_selected(&ids[2], true);

    doc.select_only(&ids[1]);
    assert_eq!(doc.selected_ids(), vec![ids[0], ids[1]]);
}

#[test]
fn selection_unit_of_unknown_id_is_empty() {
    let doc = DocStore::new();
    assert!(doc.selection_unit(&Uuid::new_v4()).is_empty());
}

#[test]
fn toggle_ungrouped_flips_single_node() {
    let (mut doc, ids) = store_with(2);
    doc.toggle_selection(&ids[0]);
    assert_eq!(doc.selected_ids(), vec![ids[0]]);
    doc.toggle_selection(&ids[0]);
    assert!(doc.selected_ids().is_empty());
}

#[test]
fn toggle_partially_selected_group_selects_all() {
    let (mut doc, ids) = store_with(3);
    doc.group_images(&ids).unwrap();
    doc.set_selected(&ids[0], true);

    doc.toggle_selection(&ids[2]);
    assert_eq!(doc.selected_count(), 3);
}

#[test]
fn toggle_fully_selected_group_deselects_all() {
    let (mut doc, ids) = store_with(2);
    doc.group_images(&ids).unwrap();
    doc.select_only(&ids[0]);

    doc.toggle_selection(&ids[1]);
    assert_eq!(doc.selected_count(), 0);
}

// =============================================================
// group_images
// =============================================================

#[test]
fn group_images_links_both_directions() {
    let (mut doc, ids) = store_with(2);
    let (gid, changes) = doc.group_images(&ids).unwrap();
    assert!(changes.is_empty());
    assert_eq!(doc.groups().len(), 1);
    assert_eq!(doc.group(&gid).unwrap().image_ids, ids);
    assert_eq!(group_of(&doc, &ids[0]), Some(gid));
    assert_eq!(group_of(&doc, &ids[1]), Some(gid));
    assert!(doc.check_consistency().is_ok());
}

#[test]
fn group_images_names_groups_sequentially() {
    let (mut doc, ids) = store_with(4);
    let (g1, _) = doc.group_images(&ids[..2]).unwrap();
    let (g2, _) = doc.group_images(&ids[2..]).unwrap();
    assert_eq!(doc.group(&g1).unwrap().name, "Group 1");
    assert_eq!(doc.group(&g2).unwrap().name, "Group 2");
}

#[test]
fn group_images_needs_two_known_ids() {
    let (mut doc, ids) = store_with(1);
    assert!(doc.group_images(&ids).is_none());
    assert!(doc.group_images(&[ids[0], ids[0]]).is_none());
    assert!(doc.group_images(&[ids[0], Uuid::new_v4()]).is_none());
    assert!(doc.groups().is_empty());
}

#[test]
fn regrouping_extracts_from_previous_group() {
    let (mut doc, ids) = store_with(4);
    let (old, _) = doc.group_images(&ids[..3]).unwrap();

    let (new, changes) = doc.group_images(&[ids[2], ids[3]]).unwrap();
    assert_eq!(changes.len(), 1);
    assert!(matches!(&changes[0], GroupChange::Shrunk(r) if r.id == old && r.image_ids == vec![ids[0], ids[1]]));
    assert_eq!(group_of(&doc, &ids[2]), Some(new));
    assert_eq!(doc.group(&old).unwrap().image_ids, vec![ids[0], ids[1]]);
    assert!(doc.check_consistency().is_ok());
}

#[test]
fn regrouping_dissolves_emptied_group() {
    let (mut doc, ids) = store_with(3);
    let (old, _) = doc.group_images(&ids[..2]).unwrap();

    let (new, changes) = doc.group_images(&[ids[1], ids[2]]).unwrap();
    assert!(changes.iter().any(|c| matches!(c, GroupChange::Dissolved { group_id, .. } if *group_id == old)));
    assert!(doc.group(&old).is_none());
    assert!(group_of(&doc, &ids[0]).is_none());
    assert_eq!(group_of(&doc, &ids[1]), Some(new));
    assert!(doc.check_consistency().is_ok());
}

#[test]
fn grouping_an_existing_group_again_replaces_it() {
    let (mut doc, ids) = store_with(2);
    let (old, _) = doc.group_images(&ids).unwrap();
    let (new, _) = doc.group_images(&ids).unwrap();
    assert_ne!(old, new);
    assert_eq!(doc.groups().len(), 1);
    assert!(doc.check_consistency().is_ok());
}

// =============================================================
// remove_from_group
// =============================================================

#[test]
fn remove_from_group_shrinks_large_group() {
    let (mut doc, ids) = store_with(3);
    let (gid, _) = doc.group_images(&ids).unwrap();

    let change = doc.remove_from_group(&ids[0]).unwrap();
    assert!(matches!(change, GroupChange::Shrunk(ref r) if r.image_ids == vec![ids[1], ids[2]]));
    assert!(group_of(&doc, &ids[0]).is_none());
    assert_eq!(doc.group(&gid).unwrap().image_ids.len(), 2);
}

#[test]
fn remove_from_group_dissolves_pair() {
    let (mut doc, ids) = store_with(2);
    let (gid, _) = doc.group_images(&ids).unwrap();

    let change = doc.remove_from_group(&ids[1]).unwrap();
    assert_eq!(change, GroupChange::Dissolved { group_id: gid, image_ids: ids.clone() });
    assert!(doc.groups().is_empty());
    assert!(group_of(&doc, &ids[0]).is_none());
    assert!(group_of(&doc, &ids[1]).is_none());
}

#[test]
fn remove_from_group_ignores_ungrouped() {
    let (mut doc, ids) = store_with(1);
    assert!(doc.remove_from_group(&ids[0]).is_none());
    assert!(doc.remove_from_group(&Uuid::new_v4()).is_none());
}

// =============================================================
// ungroup_images
// =============================================================

#[test]
fn ungroup_pair_clears_both_and_removes_group() {
    let (mut doc, ids) = store_with(2);
    doc.group_images(&ids).unwrap();

    let (affected, changes) = doc.ungroup_images(&ids);
    assert_eq!(affected, ids);
    assert_eq!(changes.len(), 1);
    assert!(doc.groups().is_empty());
    assert!(doc.images().iter().all(|n| n.group_id.is_none()));
}

#[test]
fn ungroup_one_of_three_keeps_group() {
    let (mut doc, ids) = store_with(3);
    let (gid, _) = doc.group_images(&ids).unwrap();

    let (affected, _) = doc.ungroup_images(&ids[..1]);
    assert_eq!(affected, vec![ids[0]]);
    assert_eq!(doc.group(&gid).unwrap().image_ids, vec![ids[1], ids[2]]);
    assert!(doc.check_consistency().is_ok());
}

#[test]
fn ungroup_skips_ungrouped_ids() {
    let (mut doc, ids) = store_with(2);
    let (affected, changes) = doc.ungroup_images(&ids);
    assert!(affected.is_empty());
    assert!(changes.is_empty());
}

// =============================================================
// delete_images
// =============================================================

#[test]
fn delete_removes_nodes_and_keeps_order() {
    let (mut doc, ids) = store_with(3);
    let (removed, changes) = doc.delete_images(&[ids[1]]);
    assert_eq!(removed.len(), 1);
    assert_eq!(removed[0].id, ids[1]);
    assert!(changes.is_empty());
    let order: Vec<ImageId> = doc.images().iter().map(|n| n.id).collect();
    assert_eq!(order, vec![ids[0], ids[2]]);
}

#[test]
fn deleting_both_members_removes_group() {
    let (mut doc, ids) = store_with(3);
    let (gid, _) = doc.group_images(&ids[..2]).unwrap();

    let (removed, changes) = doc.delete_images(&ids[..2]);
    assert_eq!(removed.len(), 2);
    assert_eq!(changes, vec![GroupChange::Dissolved { group_id: gid, image_ids: ids[..2].to_vec() }]);
    assert!(doc.groups().is_empty());
    assert_eq!(doc.len(), 1);
    assert!(doc.check_consistency().is_ok());
}

#[test]
fn deleting_one_member_of_pair_releases_the_other() {
    let (mut doc, ids) = store_with(2);
    doc.group_images(&ids).unwrap();

    doc.delete_images(&ids[..1]);
    assert!(doc.groups().is_empty());
    assert!(group_of(&doc, &ids[1]).is_none());
    assert!(doc.check_consistency().is_ok());
}

#[test]
fn delete_unknown_id_is_no_op() {
    let (mut doc, _) = store_with(2);
    let (removed, _) = doc.delete_images(&[Uuid::new_v4()]);
    assert!(removed.is_empty());
    assert_eq!(doc.len(), 2);
}

// =============================================================
// apply_group_record / dissolve_group
// =============================================================

#[test]
fn apply_group_record_installs_peer_group() {
    let (mut doc, ids) = store_with(2);
    let gid = Uuid::new_v4();
    let record = GroupRecord { id: gid, image_ids: ids.clone(), name: Some("Peer".into()) };
    assert!(doc.apply_group_record(&record));
    assert_eq!(doc.group(&gid).unwrap().name, "Peer");
    assert_eq!(group_of(&doc, &ids[0]), Some(gid));
    assert!(doc.check_consistency().is_ok());
}

#[test]
fn apply_group_record_replaces_same_id() {
    let (mut doc, ids) = store_with(3);
    let gid = Uuid::new_v4();
    doc.apply_group_record(&GroupRecord { id: gid, image_ids: ids.clone(), name: None });
    doc.apply_group_record(&GroupRecord { id: gid, image_ids: ids[1..].to_vec(), name: None });

    assert_eq!(doc.groups().len(), 1);
    assert_eq!(doc.group(&gid).unwrap().image_ids, ids[1..].to_vec());
    assert!(group_of(&doc, &ids[0]).is_none());
    assert!(doc.check_consistency().is_ok());
}

#[test]
fn apply_group_record_ignores_undersized() {
    let (mut doc, ids) = store_with(1);
    let record = GroupRecord { id: Uuid::new_v4(), image_ids: vec![ids[0], Uuid::new_v4()], name: None };
    assert!(!doc.apply_group_record(&record));
    assert!(doc.groups().is_empty());
}

#[test]
fn dissolve_group_clears_members() {
    let (mut doc, ids) = store_with(3);
    let (gid, _) = doc.group_images(&ids).unwrap();
    assert_eq!(doc.dissolve_group(&gid), Some(ids.clone()));
    assert!(doc.images().iter().all(|n| n.group_id.is_none()));
    assert!(doc.dissolve_group(&gid).is_none());
}

// =============================================================
// Snapshots
// =============================================================

fn record(id: ImageId) -> ImageRecord {
    ImageRecord { id, src: "x.png".into(), x: 0.0, y: 0.0, w: 10.0, h: 10.0, selected: false, group_id: None }
}

fn state(images: Vec<ImageRecord>, groups: Vec<GroupRecord>) -> CanvasState {
    CanvasState { id: Uuid::new_v4(), images, groups, viewport: ViewportRecord::default(), last_modified: 0 }
}

#[test]
fn load_snapshot_replaces_contents() {
    let (mut doc, _) = store_with(3);
    let a = Uuid::new_v4();
    let b = Uuid::new_v4();
    let gid = Uuid::new_v4();
    doc.load_snapshot(&state(
        vec![record(a), record(b)],
        vec![GroupRecord { id: gid, image_ids: vec![a, b], name: Some("Moodboard".into()) }],
    ));

    assert_eq!(doc.len(), 2);
    assert_eq!(doc.group(&gid).unwrap().name, "Moodboard");
    assert_eq!(group_of(&doc, &a), Some(gid));
    assert!(doc.check_consistency().is_ok());
}

#[test]
fn load_snapshot_repairs_bad_groups() {
    let a = Uuid::new_v4();
    let b = Uuid::new_v4();
    let c = Uuid::new_v4();
    let first = Uuid::new_v4();
    let second = Uuid::new_v4();
    let orphan = Uuid::new_v4();
    let mut doc = DocStore::new();
    doc.load_snapshot(&state(
        vec![record(a), record(b), record(c), record(a)],
        vec![
            GroupRecord { id: first, image_ids: vec![a, b], name: None },
            GroupRecord { id: second, image_ids: vec![b, c], name: None },
            GroupRecord { id: orphan, image_ids: vec![c, Uuid::new_v4()], name: None },
        ],
    ));

    assert_eq!(doc.len(), 3);
    assert_eq!(doc.groups().len(), 1);
    assert!(doc.group(&first).is_some());
    assert!(group_of(&doc, &c).is_none());
    assert!(doc.check_consistency().is_ok());
}

#[test]
fn records_reflect_current_state() {
    let (mut doc, ids) = store_with(2);
    let (gid, _) = doc.group_images(&ids).unwrap();
    doc.set_selected(&ids[0], true);

    let images = doc.image_records();
    assert_eq!(images.len(), 2);
    assert!(images[0].selected);
    assert_eq!(images[1].group_id, Some(gid));

    let groups = doc.group_records();
    assert_eq!(groups[0].name.as_deref(), Some("Group 1"));
}

// =============================================================
// check_consistency
// =============================================================

#[test]
fn consistency_holds_through_mixed_operations() {
    let (mut doc, ids) = store_with(6);
    doc.group_images(&ids[..3]).unwrap();
    doc.group_images(&ids[2..5]).unwrap();
    assert!(doc.check_consistency().is_ok());
    doc.ungroup_images(&ids[3..4]);
    assert!(doc.check_consistency().is_ok());
    doc.delete_images(&[ids[0], ids[4]]);
    assert!(doc.check_consistency().is_ok());
    assert!(doc.groups().iter().all(|g| g.image_ids.len() >= MIN_GROUP_SIZE));
}

#[test]
fn consistency_error_messages_name_ids() {
    let id = Uuid::new_v4();
    let err = DocError::DuplicateImage(id);
    assert!(err.to_string().contains(&id.to_string()));
}
