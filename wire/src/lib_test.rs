use super::*;
use serde_json::json;
use uuid::Uuid;

fn sample_image(group_id: Option<GroupId>) -> ImageRecord {
    ImageRecord {
        id: Uuid::new_v4(),
        src: "data:image/png;base64,AAAA".to_owned(),
        x: 10.0,
        y: 20.0,
        w: 300.0,
        h: 150.0,
        selected: false,
        group_id,
    }
}

#[test]
fn event_kinds_match_wire_tags() {
    let canvas_id = Uuid::new_v4();
    let cases = [
        (CanvasEvent::CanvasState(CanvasState::empty(canvas_id, 1)), "canvas_state"),
        (CanvasEvent::CanvasUpdate(CanvasState::empty(canvas_id, 1)), "canvas_update"),
        (CanvasEvent::UserJoined(Notice { message: "hi".into() }), "user_joined"),
        (CanvasEvent::UserLeft(Notice { message: "bye".into() }), "user_left"),
        (CanvasEvent::ImageAdded(sample_image(None)), "image_added"),
        (CanvasEvent::ImageDeleted(ImageDeleted { image_id: Uuid::nil() }), "image_deleted"),
    ];
    for (event, tag) in cases {
        assert_eq!(event.kind(), tag);
    }
}

#[test]
fn encode_uses_type_data_canvas_id_envelope() {
    let canvas_id = Uuid::new_v4();
    let image_id = Uuid::new_v4();
    let frame = Frame::new(canvas_id, CanvasEvent::ImageDeleted(ImageDeleted { image_id }));
    let text = encode_frame(&frame).expect("encode");
    let value: serde_json::Value = serde_json::from_str(&text).expect("json");
    assert_eq!(value["type"], "image_deleted");
    assert_eq!(value["canvasId"], canvas_id.to_string());
    assert_eq!(value["data"]["imageId"], image_id.to_string());
}

#[test]
fn image_record_uses_camel_case_and_omits_missing_group() {
    let image = sample_image(None);
    let value = serde_json::to_value(&image).expect("json");
    assert!(value.get("groupId").is_none());
    assert_eq!(value["selected"], false);

    let grouped = sample_image(Some(Uuid::new_v4()));
    let value = serde_json::to_value(&grouped).expect("json");
    assert!(value.get("groupId").is_some());
}

#[test]
fn decode_reads_frame_from_browser_client() {
    let canvas_id = Uuid::new_v4();
    let group_id = Uuid::new_v4();
    let a = Uuid::new_v4();
    let b = Uuid::new_v4();
    let text = json!({
        "type": "images_grouped",
        "data": { "id": group_id, "imageIds": [a, b], "name": "Group 1" },
        "canvasId": canvas_id,
    })
    .to_string();

    let frame = decode_frame(&text).expect("decode");
    assert_eq!(frame.canvas_id, canvas_id);
    let CanvasEvent::ImagesGrouped(group) = frame.event else {
        panic!("expected images_grouped, got {:?}", frame.event);
    };
    assert_eq!(group.id, group_id);
    assert_eq!(group.image_ids, vec![a, b]);
    assert_eq!(group.name.as_deref(), Some("Group 1"));
}

#[test]
fn decode_fills_canvas_state_defaults() {
    let canvas_id = Uuid::new_v4();
    let text = json!({ "type": "canvas_state", "data": { "id": canvas_id }, "canvasId": canvas_id }).to_string();
    let frame = decode_frame(&text).expect("decode");
    let CanvasEvent::CanvasState(state) = frame.event else {
        panic!("expected canvas_state");
    };
    assert!(state.images.is_empty());
    assert!(state.groups.is_empty());
    assert!((state.viewport.scale - 1.0).abs() < f64::EPSILON);
}

#[test]
fn encode_decode_preserves_chat_message() {
    let canvas_id = Uuid::new_v4();
    let msg = ChatMessage {
        id: Uuid::new_v4(),
        text: "move the sunset left".into(),
        sender: "User".into(),
        timestamp: 1_700_000_000_000,
        canvas_id,
    };
    let frame = Frame::new(canvas_id, CanvasEvent::ChatMessage(msg));
    let decoded = decode_frame(&encode_frame(&frame).expect("encode")).expect("decode");
    assert_eq!(decoded, frame);
}

#[test]
fn decode_rejects_unknown_type() {
    let text = json!({ "type": "cursor_move", "data": {}, "canvasId": Uuid::new_v4() }).to_string();
    let err = decode_frame(&text).expect_err("unknown tag");
    assert!(matches!(err, CodecError::UnknownType(ref t) if t == "cursor_move"));
}

#[test]
fn decode_rejects_bad_canvas_id() {
    let text = json!({ "type": "user_left", "data": { "message": "x" }, "canvasId": "nope" }).to_string();
    let err = decode_frame(&text).expect_err("bad id");
    assert!(matches!(err, CodecError::InvalidCanvasId(_)));
}

#[test]
fn decode_rejects_payload_shape_mismatch() {
    let text = json!({ "type": "image_deleted", "data": { "id": 4 }, "canvasId": Uuid::new_v4() }).to_string();
    let err = decode_frame(&text).expect_err("bad payload");
    assert!(matches!(err, CodecError::Payload { kind: "image_deleted", .. }));
}

#[test]
fn decode_rejects_malformed_json() {
    let err = decode_frame("{not json").expect_err("malformed");
    assert!(matches!(err, CodecError::Json(_)));
}

#[test]
fn encode_writes_non_finite_coordinates_as_null() {
    let mut image = sample_image(None);
    image.x = f64::NAN;
    let frame = Frame::new(Uuid::new_v4(), CanvasEvent::ImageAdded(image));
    let text = encode_frame(&frame).expect("encode");
    let value: serde_json::Value = serde_json::from_str(&text).expect("json");
    assert!(value["data"]["x"].is_null());
}

#[test]
fn now_ms_is_after_2020() {
    assert!(now_ms() > 1_577_836_800_000);
}
