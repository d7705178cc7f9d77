//! `X-Request-Id` 关联
//!
//! 每个请求都会拿到一个 ID：客户端提供的合法值原样使用，否则由服务端生成。
//! 该 ID 出现在响应头、请求期间的所有日志、以及错误体的 `requestId` 字段中。

use std::fmt;

use axum::{
    extract::Request,
    http::{HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};
use tracing::Instrument;
use uuid::Uuid;

pub static X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

const MAX_LEN: usize = 128;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestId(String);

impl RequestId {
    /// 服务端生成的 ID，带 `rly_` 前缀以区别于客户端传入值
    pub fn generate() -> Self {
        Self(format!("rly_{}", Uuid::new_v4().simple()))
    }

    /// 校验客户端传入的值；只接受 `[A-Za-z0-9._-]`，长度不超过 128
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        let safe = !raw.is_empty()
            && raw.len() <= MAX_LEN
            && raw
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.'));
        safe.then(|| Self(raw.to_string()))
    }

    fn from_request(req: &Request) -> Self {
        req.headers()
            .get(&X_REQUEST_ID)
            .and_then(|v| v.to_str().ok())
            .and_then(Self::parse)
            .unwrap_or_else(Self::generate)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

tokio::task_local! {
    static CURRENT: RequestId;
}

/// 当前请求的 ID；不在中间件作用域内时为 None
pub fn current_request_id() -> Option<String> {
    CURRENT.try_with(|id| id.0.clone()).ok()
}

pub async fn request_id_middleware(mut req: Request, next: Next) -> Response {
    let id = RequestId::from_request(&req);
    req.extensions_mut().insert(id.clone());

    let span = tracing::info_span!("request", request_id = %id);
    let mut res = CURRENT
        .scope(id.clone(), next.run(req).instrument(span))
        .await;

    // 上面已校验过字符集，这里不会失败
    if let Ok(value) = HeaderValue::from_str(id.as_str()) {
        res.headers_mut().insert(X_REQUEST_ID.clone(), value);
    }
    res
}
