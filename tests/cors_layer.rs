mod common;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
    routing::get,
};
use tower::ServiceExt;

use style_relay::config::CorsConfig;
use style_relay::cors::build_cors_layer;

fn header_str<'a>(resp: &'a axum::response::Response, name: header::HeaderName) -> &'a str {
    resp.headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
}

#[tokio::test]
async fn explicit_origin_list_is_honored() {
    let cors = CorsConfig {
        enabled: true,
        allowed_origins: vec!["https://example.com".to_string()],
        allowed_methods: vec!["GET".to_string()],
        allowed_headers: vec!["Content-Type".to_string()],
        ..CorsConfig::disabled()
    };

    let layer = build_cors_layer(&cors).expect("cors layer");
    let app = Router::new()
        .route("/", get(|| async { "ok" }))
        .layer(layer);

    let req = Request::builder()
        .method("GET")
        .uri("/")
        .header(header::ORIGIN, "https://example.com")
        .body(Body::empty())
        .expect("build request");
    let resp = app.oneshot(req).await.expect("call app");

    assert_eq!(
        header_str(&resp, header::ACCESS_CONTROL_ALLOW_ORIGIN),
        "https://example.com"
    );
}

#[tokio::test]
async fn default_policy_allows_any_origin_with_credentials() {
    let mock = common::MockUpstream::start().await;
    let app = common::make_app(&common::test_config(&[(
        "ghibli",
        mock.url("/models/ghibli"),
    )]));

    let req = Request::builder()
        .method("OPTIONS")
        .uri("/stylize/")
        .header(header::ORIGIN, "https://frontend.example")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "x-custom-header")
        .body(Body::empty())
        .expect("build request");
    let resp = app.oneshot(req).await.expect("call app");

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        header_str(&resp, header::ACCESS_CONTROL_ALLOW_ORIGIN),
        "https://frontend.example"
    );
    assert_eq!(
        header_str(&resp, header::ACCESS_CONTROL_ALLOW_CREDENTIALS),
        "true"
    );
    assert!(header_str(&resp, header::ACCESS_CONTROL_ALLOW_METHODS).contains("POST"));
    assert!(
        header_str(&resp, header::ACCESS_CONTROL_ALLOW_HEADERS).contains("x-custom-header")
    );
    assert_eq!(mock.hit_count(), 0);
}

#[tokio::test]
async fn error_responses_carry_cors_headers() {
    let mock = common::MockUpstream::start().await;
    let app = common::make_app(&common::test_config(&[(
        "ghibli",
        mock.url("/models/ghibli"),
    )]));

    let body = common::multipart_body(Some(("file", "cat.png", &b"0123456789"[..])), Some("nope"));
    let mut req = common::stylize_request("/stylize", body);
    req.headers_mut().insert(
        header::ORIGIN,
        "http://localhost:5173".parse().expect("origin"),
    );
    let resp = app.oneshot(req).await.expect("call app");

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        header_str(&resp, header::ACCESS_CONTROL_ALLOW_ORIGIN),
        "http://localhost:5173"
    );
}
