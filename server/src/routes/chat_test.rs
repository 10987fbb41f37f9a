use super::*;
use crate::config::Config;
use crate::state::AppState;
use uuid::Uuid;

fn message(text: &str) -> Json<NewMessage> {
    Json(NewMessage { text: text.into(), sender: None })
}

#[test]
fn empty_text_maps_to_400() {
    assert_eq!(chat_error_to_status(&ChatError::EmptyText), StatusCode::BAD_REQUEST);
}

#[test]
fn sender_is_optional_in_body() {
    let body: NewMessage = serde_json::from_str(r#"{"text":"hi"}"#).unwrap();
    assert_eq!(body.sender, None);
}

#[tokio::test]
async fn missing_limit_uses_configured_page_size() {
    let state = AppState::new(Config { chat_history_limit: 2, ..Config::default() });
    let id = Uuid::new_v4();
    for text in ["a", "b", "c"] {
        post_message(State(state.clone()), Path(id), message(text)).await.unwrap();
    }

    let Json(page) = list_messages(State(state.clone()), Path(id), Query(HistoryQuery::default())).await;
    assert_eq!(page.iter().map(|m| m.text.as_str()).collect::<Vec<_>>(), vec!["b", "c"]);

    let Json(all) = list_messages(State(state), Path(id), Query(HistoryQuery { limit: Some(10) })).await;
    assert_eq!(all.len(), 3);
}

#[tokio::test]
async fn blank_message_is_rejected() {
    let state = AppState::new(Config::default());
    let (status, Json(body)) = post_message(State(state), Path(Uuid::new_v4()), message(" ")).await.unwrap_err();
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body.detail, "message text is empty");
}
