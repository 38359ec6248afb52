//! Router-level tests for `POST /generate-image` with mock providers.

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::{post_json, router_with, send};
use prompt_relay_service::services::providers::mock::{
    MockImageProvider, MockOutcome, MockTextProvider,
};
use prompt_relay_service::services::relay::{enhancement_prompt, to_data_url};
use serde_json::json;
use std::sync::Arc;

fn mocks(
    text: MockTextProvider,
    image: MockImageProvider,
) -> (Arc<MockTextProvider>, Arc<MockImageProvider>) {
    (Arc::new(text), Arc::new(image))
}

#[tokio::test]
async fn keywords_are_enhanced_and_rendered() {
    let (text, image) = mocks(
        MockTextProvider::replying("A photorealistic tabby cat, golden hour, 85mm lens"),
        MockImageProvider::returning(vec![0xff, 0xd8, 0xff, 0xe0]),
    );
    let router = router_with(text.clone(), image.clone());

    let (status, _, body) = send(router, post_json(r#"{"keywords": "a cat"}"#)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "status": "success",
            "enhanced_prompt_text": "A photorealistic tabby cat, golden hour, 85mm lens",
            "image_data_url": to_data_url(&[0xff, 0xd8, 0xff, 0xe0]),
        })
    );
    assert!(body["image_data_url"]
        .as_str()
        .unwrap()
        .starts_with("data:image/jpeg;base64,/9j/"));
    assert_eq!(text.prompts(), vec![enhancement_prompt("a cat")]);
    assert_eq!(
        image.prompts(),
        vec!["A photorealistic tabby cat, golden hour, 85mm lens".to_string()]
    );
}

#[tokio::test]
async fn missing_keywords_is_bad_request() {
    let (text, image) = mocks(
        MockTextProvider::replying("unused"),
        MockImageProvider::returning(b"img".to_vec()),
    );
    let router = router_with(text.clone(), image.clone());

    let (status, _, body) = send(router, post_json("{}")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "No keywords provided"}));
    assert_eq!(text.calls(), 0);
    assert_eq!(image.calls(), 0);
}

#[tokio::test]
async fn falsy_keywords_are_bad_request() {
    for payload in [
        r#"{"keywords": ""}"#,
        r#"{"keywords": null}"#,
        r#"{"keywords": false}"#,
        r#"{"keywords": 0}"#,
        r#"{"keywords": []}"#,
    ] {
        let (text, image) = mocks(
            MockTextProvider::replying("unused"),
            MockImageProvider::returning(b"img".to_vec()),
        );
        let router = router_with(text.clone(), image);

        let (status, _, body) = send(router, post_json(payload)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST, "payload {}", payload);
        assert_eq!(body, json!({"error": "No keywords provided"}));
        assert_eq!(text.calls(), 0);
    }
}

#[tokio::test]
async fn non_string_keywords_are_forwarded_as_text() {
    let (text, image) = mocks(
        MockTextProvider::replying("The number 42 in neon"),
        MockImageProvider::returning(b"img".to_vec()),
    );
    let router = router_with(text.clone(), image);

    let (status, _, body) = send(router, post_json(r#"{"keywords": 42}"#)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");
    assert_eq!(text.prompts(), vec![enhancement_prompt("42")]);
}

#[tokio::test]
async fn unreadable_bodies_are_server_errors() {
    for payload in ["not json", "[]", "null", r#""a cat""#] {
        let (text, image) = mocks(
            MockTextProvider::replying("unused"),
            MockImageProvider::returning(b"img".to_vec()),
        );
        let router = router_with(text.clone(), image);

        let (status, _, body) = send(router, post_json(payload)).await;

        assert_eq!(
            status,
            StatusCode::INTERNAL_SERVER_ERROR,
            "payload {}",
            payload
        );
        assert_eq!(body["status"], "failed");
        assert!(body["error"].is_string());
        assert_eq!(text.calls(), 0);
    }
}

#[tokio::test]
async fn missing_content_type_is_server_error() {
    let (text, image) = mocks(
        MockTextProvider::replying("unused"),
        MockImageProvider::returning(b"img".to_vec()),
    );
    let request = Request::builder()
        .method("POST")
        .uri("/generate-image")
        .body(Body::from(r#"{"keywords": "a cat"}"#))
        .unwrap();

    let (status, _, body) = send(router_with(text.clone(), image), request).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["status"], "failed");
    assert!(body["error"]
        .as_str()
        .unwrap()
        .contains("Content-Type"));
    assert_eq!(text.calls(), 0);
}

#[tokio::test]
async fn enhancement_failure_is_server_error_without_image_call() {
    let (text, image) = mocks(
        MockTextProvider::with_outcome(MockOutcome::ApiError("quota exceeded".to_string())),
        MockImageProvider::returning(b"img".to_vec()),
    );
    let router = router_with(text, image.clone());

    let (status, _, body) = send(router, post_json(r#"{"keywords": "a cat"}"#)).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["status"], "failed");
    assert!(body["error"].as_str().unwrap().contains("quota exceeded"));
    assert_eq!(image.calls(), 0);
}

#[tokio::test]
async fn zero_images_is_server_error() {
    let (text, image) = mocks(
        MockTextProvider::replying("A cat"),
        MockImageProvider::empty(),
    );

    let (status, _, body) = send(
        router_with(text, image),
        post_json(r#"{"keywords": "a cat"}"#),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["status"], "failed");
    assert!(body.get("image_data_url").is_none());
    assert!(body.get("enhanced_prompt_text").is_none());
}

#[tokio::test]
async fn filtered_prompt_is_server_error_with_reason() {
    let (text, image) = mocks(
        MockTextProvider::replying("A cat"),
        MockImageProvider::with_outcome(MockOutcome::Filtered("Unsafe content".to_string())),
    );

    let (status, _, body) = send(
        router_with(text, image),
        post_json(r#"{"keywords": "a cat"}"#),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].as_str().unwrap().contains("Unsafe content"));
}

#[tokio::test]
async fn preflight_allows_any_origin() {
    let (text, image) = mocks(
        MockTextProvider::replying("unused"),
        MockImageProvider::returning(b"img".to_vec()),
    );
    let request = Request::builder()
        .method("OPTIONS")
        .uri("/generate-image")
        .header("origin", "http://localhost:3000")
        .header("access-control-request-method", "POST")
        .header("access-control-request-headers", "content-type")
        .body(Body::empty())
        .unwrap();

    let (status, headers, _) = send(router_with(text.clone(), image), request).await;

    assert!(status.is_success());
    assert_eq!(headers["access-control-allow-origin"], "*");
    assert_eq!(text.calls(), 0);
}

#[tokio::test]
async fn cross_origin_post_carries_cors_header() {
    let (text, image) = mocks(
        MockTextProvider::replying("A cat"),
        MockImageProvider::returning(b"img".to_vec()),
    );
    let request = Request::builder()
        .method("POST")
        .uri("/generate-image")
        .header("origin", "https://example.org")
        .header("content-type", "application/json")
        .body(Body::from(r#"{"keywords": "a cat"}"#))
        .unwrap();

    let (status, headers, _) = send(router_with(text, image), request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers["access-control-allow-origin"], "*");
}

#[tokio::test]
async fn caller_request_id_is_echoed() {
    let (text, image) = mocks(
        MockTextProvider::replying("A cat"),
        MockImageProvider::returning(b"img".to_vec()),
    );
    let request = Request::builder()
        .method("POST")
        .uri("/generate-image")
        .header("content-type", "application/json")
        .header("x-request-id", "relay-req-1")
        .body(Body::from(r#"{"keywords": "a cat"}"#))
        .unwrap();

    let (_, headers, _) = send(router_with(text, image), request).await;

    assert_eq!(headers["x-request-id"], "relay-req-1");
}

#[tokio::test]
async fn get_is_not_allowed() {
    let (text, image) = mocks(
        MockTextProvider::replying("A cat"),
        MockImageProvider::returning(b"img".to_vec()),
    );
    let request = Request::builder()
        .uri("/generate-image")
        .body(Body::empty())
        .unwrap();

    let (status, _, _) = send(router_with(text, image), request).await;

    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
}
