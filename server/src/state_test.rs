use super::*;

#[test]
fn default_room_is_empty() {
    assert!(Room::default().clients.is_empty());
}

#[tokio::test]
async fn new_state_is_empty_and_carries_config() {
    let cfg = Config { port: 1234, ..Config::default() };
    let state = AppState::new(cfg);
    assert!(state.canvases.read().await.is_empty());
    assert!(state.chats.read().await.is_empty());
    assert!(state.rooms.read().await.is_empty());
    assert_eq!(state.config.port, 1234);
}

#[tokio::test]
async fn clones_share_the_same_maps() {
    let state = test_helpers::test_app_state();
    let other = state.clone();
    let id = test_helpers::seed_canvas(&state).await;
    assert!(other.canvases.read().await.contains_key(&id));
}

#[tokio::test]
async fn seeded_images_are_ungrouped_and_ordered() {
    let state = test_helpers::test_app_state();
    let (canvas_id, ids) = test_helpers::seed_canvas_with_images(&state, &[(0.0, 0.0), (100.0, 0.0)]).await;
    let canvases = state.canvases.read().await;
    let canvas = canvases.get(&canvas_id).expect("canvas should exist");
    assert_eq!(canvas.images.iter().map(|i| i.id).collect::<Vec<_>>(), ids);
    assert!(canvas.images.iter().all(|i| i.group_id.is_none()));
}

#[tokio::test]
async fn attach_client_creates_room_on_demand() {
    let state = test_helpers::test_app_state();
    let canvas_id = Uuid::new_v4();
    let (client_id, _rx) = test_helpers::attach_client(&state, canvas_id).await;
    let rooms = state.rooms.read().await;
    assert!(rooms.get(&canvas_id).is_some_and(|r| r.clients.contains_key(&client_id)));
}
