use super::*;

#[test]
fn png_is_encoded_as_data_url() {
    let out = encode_upload(Some("image/png"), Some("dot.png".into()), b"abc", 1024).unwrap();
    assert_eq!(out.data_url, "data:image/png;base64,YWJj");
    assert_eq!(out.filename.as_deref(), Some("dot.png"));
}

#[test]
fn empty_file_is_allowed() {
    let out = encode_upload(Some("image/gif"), None, b"", 1024).unwrap();
    assert_eq!(out.data_url, "data:image/gif;base64,");
    assert_eq!(out.filename, None);
}

#[test]
fn non_image_types_are_rejected() {
    for mime in [Some("text/plain"), Some("application/octet-stream"), Some("image"), Some("image/"), None] {
        let err = encode_upload(mime, None, b"x", 1024).unwrap_err();
        assert!(matches!(err, UploadError::NotAnImage(_)), "{mime:?} should be rejected");
    }
}

#[test]
fn mime_check_ignores_case() {
    assert!(encode_upload(Some("IMAGE/JPEG"), None, b"x", 1024).is_ok());
}

#[test]
fn oversized_file_is_rejected() {
    let err = encode_upload(Some("image/png"), None, &[0_u8; 11], 10).unwrap_err();
    assert_eq!(err, UploadError::TooLarge { size: 11, max: 10 });
}

#[test]
fn file_at_exact_limit_is_accepted() {
    assert!(encode_upload(Some("image/png"), None, &[0_u8; 10], 10).is_ok());
}
