use axum::body::Bytes;
use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::{StatusCode, Url};

use crate::config::UpstreamConfig;
use crate::error::AppError;

/// 日志中保留的上游错误体最大长度
const ERROR_BODY_LOG_LIMIT: usize = 512;

/// 上游一次调用的结果：状态码 + 原始响应体
#[derive(Debug)]
pub struct UpstreamReply {
    pub status: StatusCode,
    pub content_type: Option<String>,
    pub body: Bytes,
}

/// 推理服务客户端：持有连接池与 Bearer 凭证
#[derive(Clone)]
pub struct InferenceClient {
    client: reqwest::Client,
    headers: HeaderMap,
}

impl InferenceClient {
    pub fn new(config: &UpstreamConfig) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("style-relay/", env!("CARGO_PKG_VERSION")))
            .timeout(config.timeout_duration())
            .connect_timeout(config.connect_timeout_duration())
            .build()
            .map_err(|e| AppError::Internal(format!("初始化 HTTP Client 失败: {}", e)))?;

        let mut bearer = HeaderValue::from_str(&format!("Bearer {}", config.api_token.trim()))
            .map_err(|_| AppError::Internal("上游凭证包含非法字符".to_string()))?;
        bearer.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, bearer);
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/octet-stream"),
        );

        Ok(Self { client, headers })
    }

    /// 将图片字节原样 POST 到模型端点，不重试。
    ///
    /// 只要拿到了 HTTP 响应就返回 `Ok`（包括非 2xx），状态码由调用方判断；
    /// 连接失败、超时、响应体读取失败返回 `Err`。
    pub async fn infer(&self, endpoint: &Url, image: Bytes) -> Result<UpstreamReply, AppError> {
        let resp = self
            .client
            .post(endpoint.clone())
            .headers(self.headers.clone())
            .body(image)
            .send()
            .await?;

        let status = resp.status();
        let content_type = resp
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = resp.bytes().await?;

        if !status.is_success() {
            tracing::debug!(
                "上游错误响应体 ({}): {}",
                status,
                truncate_for_log(&body, ERROR_BODY_LOG_LIMIT)
            );
        }

        Ok(UpstreamReply {
            status,
            content_type,
            body,
        })
    }
}

pub(crate) fn truncate_for_log(body: &[u8], limit: usize) -> String {
    let end = body.len().min(limit);
    let mut text = String::from_utf8_lossy(&body[..end]).into_owned();
    if body.len() > limit {
        text.push_str("...");
    }
    text
}
