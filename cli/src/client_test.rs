use super::*;
use uuid::Uuid;

/// Nothing listens here; scoped calls must fail before connecting.
const DEAD_BASE: &str = "http://127.0.0.1:9";

fn no_canvas(err: CliError) -> bool {
    matches!(err, CliError::NoActiveCanvas)
}

#[tokio::test]
async fn scoped_calls_require_active_canvas() {
    let client = ApiClient::new(DEAD_BASE, None);
    let image = NewImage { src: "a.png".into(), x: 0.0, y: 0.0, w: 10.0, h: 10.0 };

    assert!(no_canvas(client.get_canvas().await.unwrap_err()));
    assert!(no_canvas(client.add_image(&image).await.unwrap_err()));
    assert!(no_canvas(client.delete_image(Uuid::new_v4()).await.unwrap_err()));
    assert!(no_canvas(client.group(&[Uuid::new_v4(), Uuid::new_v4()]).await.unwrap_err()));
    assert!(no_canvas(client.ungroup(Uuid::new_v4()).await.unwrap_err()));
    assert!(no_canvas(client.messages(None).await.unwrap_err()));
    assert!(no_canvas(client.send("hi", None).await.unwrap_err()));
    assert!(no_canvas(client.ws_url().unwrap_err()));
}

#[test]
fn set_canvas_switches_session() {
    let mut client = ApiClient::new(DEAD_BASE, None);
    assert_eq!(client.canvas(), None);
    let id = Uuid::new_v4();
    client.set_canvas(Some(id));
    assert_eq!(client.canvas(), Some(id));
    client.set_canvas(None);
    assert_eq!(client.canvas(), None);
}

#[test]
fn base_url_trailing_slash_is_trimmed() {
    let client = ApiClient::new("http://localhost:8000/", None);
    assert_eq!(client.url("/health"), "http://localhost:8000/health");
}

#[test]
fn ws_url_follows_scheme() {
    let id = Uuid::nil();
    assert_eq!(ws_url("http://localhost:8000", id).unwrap(), format!("ws://localhost:8000/ws/{id}"));
    assert_eq!(ws_url("https://board.example", id).unwrap(), format!("wss://board.example/ws/{id}"));
    assert!(matches!(ws_url("ftp://x", id), Err(CliError::InvalidBaseUrl(_))));
}

#[test]
fn client_ws_url_uses_active_canvas() {
    let id = Uuid::new_v4();
    let client = ApiClient::new("http://localhost:8000", Some(id));
    assert_eq!(client.ws_url().unwrap(), format!("ws://localhost:8000/ws/{id}"));
}

#[test]
fn error_detail_prefers_json_detail() {
    assert_eq!(error_detail(r#"{"detail":"canvas not found: x"}"#), "canvas not found: x");
    assert_eq!(error_detail("  Bad Gateway \n"), "Bad Gateway");
}

#[test]
fn mime_is_guessed_from_extension() {
    assert_eq!(mime_for(Path::new("a/b/photo.JPG")), "image/jpeg");
    assert_eq!(mime_for(Path::new("x.png")), "image/png");
    assert_eq!(mime_for(Path::new("notes.txt")), "application/octet-stream");
    assert_eq!(mime_for(Path::new("noext")), "application/octet-stream");
}

#[test]
fn new_message_omits_missing_sender() {
    let json = serde_json::to_value(NewMessage { text: "hi", sender: None }).unwrap();
    assert_eq!(json, serde_json::json!({"text": "hi"}));
}

#[tokio::test]
async fn upload_of_missing_file_is_io_error() {
    let client = ApiClient::new(DEAD_BASE, None);
    let err = client.upload(Path::new("/definitely/not/here.png")).await.unwrap_err();
    assert!(matches!(err, CliError::Io { .. }));
}
