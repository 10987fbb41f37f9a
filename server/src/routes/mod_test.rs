use super::*;
use crate::state::test_helpers;

#[tokio::test]
async fn health_reports_canvas_count() {
    let state = test_helpers::test_app_state();
    let Json(body) = health(State(state.clone())).await;
    assert_eq!(body, Health { status: "healthy".into(), canvases: 0 });

    test_helpers::seed_canvas(&state).await;
    test_helpers::seed_canvas(&state).await;
    let Json(body) = health(State(state)).await;
    assert_eq!(body.canvases, 2);
}

#[test]
fn api_error_wraps_detail() {
    let (status, Json(body)) = api_error(StatusCode::NOT_FOUND, "canvas not found");
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body.detail, "canvas not found");
}

#[test]
fn error_body_serializes_as_detail() {
    let json = serde_json::to_value(ErrorBody { detail: "x".into() }).unwrap();
    assert_eq!(json, serde_json::json!({"detail": "x"}));
}

#[test]
fn router_builds_with_invalid_origin() {
    let mut cfg = crate::config::Config::default();
    cfg.allowed_origins.push("bad\norigin".into());
    let _router = app(AppState::new(cfg));
}
