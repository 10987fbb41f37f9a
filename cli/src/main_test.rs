use super::*;
use clap::CommandFactory;
use wire::{ChatMessage, ImageDeleted, ImagesUngrouped, Notice};

#[test]
fn cli_definition_is_valid() {
    Cli::command().debug_assert();
}

#[test]
fn canvas_flag_parses_uuid() {
    let id = Uuid::new_v4();
    let cli = Cli::try_parse_from(["imageboard", "--canvas", &id.to_string(), "chat", "list"]).unwrap();
    assert_eq!(cli.canvas, Some(id));
    assert!(matches!(cli.command, Command::Chat(_)));
}

#[test]
fn group_create_needs_two_ids() {
    let one = Uuid::new_v4().to_string();
    assert!(Cli::try_parse_from(["imageboard", "group", "create", &one]).is_err());
    let two = Uuid::new_v4().to_string();
    assert!(Cli::try_parse_from(["imageboard", "group", "create", &one, &two]).is_ok());
}

#[test]
fn image_add_defaults_size() {
    let cli = Cli::try_parse_from(["imageboard", "image", "add", "--src", "a.png"]).unwrap();
    let Command::Image(ImageCommand { command: ImageSubcommand::Add { w, h, .. } }) = cli.command else {
        panic!("expected image add");
    };
    assert!((w - 300.0).abs() < f64::EPSILON);
    assert!((h - 300.0).abs() < f64::EPSILON);
}

#[test]
fn describe_summarizes_events() {
    let canvas = Uuid::nil();
    let image_id = Uuid::new_v4();
    let deleted = Frame::new(canvas, CanvasEvent::ImageDeleted(ImageDeleted { image_id }));
    assert_eq!(describe(&deleted), format!("[image_deleted] {image_id}"));

    let joined = Frame::new(canvas, CanvasEvent::UserJoined(Notice { message: "hi".into() }));
    assert_eq!(describe(&joined), "[user_joined] hi");

    let chat = ChatMessage { id: Uuid::new_v4(), text: "yo".into(), sender: "ann".into(), timestamp: 0, canvas_id: canvas };
    assert_eq!(describe(&Frame::new(canvas, CanvasEvent::ChatMessage(chat))), "[chat_message] ann: yo");

    let a = Uuid::new_v4();
    let b = Uuid::new_v4();
    let group_id = Uuid::new_v4();
    let ungrouped = Frame::new(canvas, CanvasEvent::ImagesUngrouped(ImagesUngrouped { group_id, image_ids: vec![a, b] }));
    assert_eq!(describe(&ungrouped), format!("[images_ungrouped] {group_id} -> {a}, {b}"));
}
