#![allow(dead_code)]

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    Router,
    body::{Body, Bytes},
    extract::State,
    http::{HeaderMap, Request, StatusCode, Uri, header},
    response::{IntoResponse, Response},
};
use tokio::net::TcpListener;

use style_relay::config::{AppConfig, StyleEntry};
use style_relay::{AppState, build_router};

pub const BOUNDARY: &str = "style-relay-test-boundary";
pub const TEST_TOKEN: &str = "hf_test_token";

/// 上游收到的一次请求
#[derive(Debug, Clone)]
pub struct UpstreamHit {
    pub path: String,
    pub authorization: Option<String>,
    pub content_type: Option<String>,
    pub body: Bytes,
}

/// 本地模拟推理服务：记录所有请求，按路径决定响应
///
/// - `/status/{code}`：返回该状态码
/// - `/slow`：3 秒后返回 200
/// - 其他路径：200 + `image/png` + `PNGDATA`
#[derive(Clone)]
pub struct MockUpstream {
    pub addr: SocketAddr,
    hits: Arc<Mutex<Vec<UpstreamHit>>>,
}

impl MockUpstream {
    pub async fn start() -> Self {
        let hits: Arc<Mutex<Vec<UpstreamHit>>> = Arc::default();
        let app = Router::new()
            .fallback(mock_handler)
            .with_state(hits.clone());

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock upstream");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self { addr, hits }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn hits(&self) -> Vec<UpstreamHit> {
        self.hits.lock().expect("hits lock").clone()
    }

    pub fn hit_count(&self) -> usize {
        self.hits.lock().expect("hits lock").len()
    }
}

async fn mock_handler(
    State(hits): State<Arc<Mutex<Vec<UpstreamHit>>>>,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let path = uri.path().to_string();
    let header_str = |name: header::HeaderName| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    hits.lock().expect("hits lock").push(UpstreamHit {
        path: path.clone(),
        authorization: header_str(header::AUTHORIZATION),
        content_type: header_str(header::CONTENT_TYPE),
        body,
    });

    if let Some(code) = path.strip_prefix("/status/") {
        let status = code
            .parse::<u16>()
            .ok()
            .and_then(|c| StatusCode::from_u16(c).ok())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        return (status, "{\"error\":\"upstream detail that must not leak\"}").into_response();
    }

    if path == "/slow" {
        tokio::time::sleep(Duration::from_secs(3)).await;
    }

    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "image/png")],
        Bytes::from_static(b"PNGDATA"),
    )
        .into_response()
}

/// 指向模拟上游的测试配置
pub fn test_config(styles: &[(&str, String)]) -> AppConfig {
    let mut config = AppConfig::default();
    config.upstream.api_token = TEST_TOKEN.to_string();
    config.upstream.timeout_secs = 1;
    config.upstream.connect_timeout_secs = 1;
    config.styles = styles
        .iter()
        .map(|(key, endpoint)| {
            (
                key.to_string(),
                StyleEntry {
                    label: key.to_uppercase(),
                    endpoint: endpoint.clone(),
                },
            )
        })
        .collect::<BTreeMap<_, _>>();
    config
}

pub fn make_app(config: &AppConfig) -> Router {
    let state = AppState::from_config(config).expect("build app state");
    build_router(config, state)
}

/// 构造 multipart/form-data 请求体
///
/// `file` 为 `(字段名, 文件名, 内容)`；`style` 为 None 时不写该字段。
pub fn multipart_body(file: Option<(&str, &str, &[u8])>, style: Option<&str>) -> Vec<u8> {
    let mut body = Vec::new();
    if let Some(style) = style {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"style\"\r\n\r\n{style}\r\n"
            )
            .as_bytes(),
        );
    }
    if let Some((field, file_name, bytes)) = file {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\nContent-Type: image/png\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

pub fn stylize_request(path: &str, body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(path)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .expect("build request")
}

pub async fn read_json(resp: Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("parse json")
}
