use waystone::http::response::{Response, ResponseBuilder, StatusCode};

#[test]
fn test_status_code_as_u16() {
    assert_eq!(StatusCode::Ok.as_u16(), 200);
    assert_eq!(StatusCode::Found.as_u16(), 302);
    assert_eq!(StatusCode::BadRequest.as_u16(), 400);
}

#[test]
fn test_status_code_reason_phrase() {
    assert_eq!(StatusCode::Ok.reason_phrase(), "OK");
    assert_eq!(StatusCode::Found.reason_phrase(), "Found");
    assert_eq!(StatusCode::BadRequest.reason_phrase(), "Bad Request");
}

#[test]
fn test_response_builder_auto_content_length() {
    let body = b"This is the body".to_vec();
    let response = ResponseBuilder::new(StatusCode::Ok).body(body.clone()).build();

    assert_eq!(response.header("Content-Length"), Some("16"));
    assert_eq!(response.body, body);
}

#[test]
fn test_response_builder_preserves_custom_content_length() {
    let response = ResponseBuilder::new(StatusCode::Ok)
        .header("Content-Length", "999")
        .body(b"test".to_vec())
        .build();

    assert_eq!(response.header("Content-Length"), Some("999"));
}

#[test]
fn test_content_response() {
    let response = Response::content("image/png", vec![0x89, b'P', b'N', b'G']);

    assert_eq!(response.status, StatusCode::Ok);
    assert_eq!(response.header("content-type"), Some("image/png"));
    assert_eq!(response.body.len(), 4);
}

#[test]
fn test_redirect_response_has_location_and_no_body() {
    let response = Response::redirect("/ErrorPages/pageNotFound.html");

    assert_eq!(response.status, StatusCode::Found);
    assert_eq!(response.location(), Some("/ErrorPages/pageNotFound.html"));
    assert!(response.body.is_empty());
    assert_eq!(response.header("Content-Length"), Some("0"));
}

#[test]
fn test_bad_request_response() {
    let response = Response::bad_request();

    assert_eq!(response.status, StatusCode::BadRequest);
    assert_eq!(&response.body[..], b"400 Bad Request");
}
