use axum::{
    Json,
    extract::multipart::MultipartError,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

/// 应用统一错误类型
#[derive(Error, Debug, utoipa::ToSchema)]
pub enum AppError {
    /// 请求的风格不在配置映射中（不会发起任何上游请求）
    #[error("Invalid style: {0}")]
    InvalidStyle(String),

    /// 参数校验错误
    #[error("参数校验错误: {0}")]
    Validation(String),

    /// multipart 表单解析失败
    #[error("表单解析错误: {0}")]
    Multipart(String),

    /// 上传内容超过大小上限
    #[error("上传内容过大: {0}")]
    PayloadTooLarge(String),

    /// 上游返回非成功状态码
    #[error("上游推理失败: HTTP {status}")]
    Upstream {
        /// 上游原始状态码
        status: u16,
    },

    /// 网络请求错误（连接失败、响应读取失败等）
    #[error("网络错误: {0}")]
    Network(String),

    /// 上游请求超时（包含 connect/read 等阶段）
    #[error("请求超时: {0}")]
    Timeout(String),

    /// 内部服务器错误
    #[error("内部错误: {0}")]
    Internal(String),
}

/// 对外的 JSON 错误体。
///
/// `error` 为稳定、可直接展示的短消息；内部细节只进日志。
#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    /// 错误信息
    #[schema(example = "Invalid style")]
    pub error: String,

    /// 稳定的错误码，用于程序化处理。
    #[schema(example = "INVALID_STYLE")]
    pub code: String,

    /// HTTP 状态码（与响应 status 一致）。
    #[schema(example = 400)]
    pub status: u16,

    /// 可选：请求追踪 ID。
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidStyle(_) => StatusCode::BAD_REQUEST,
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Multipart(_) => StatusCode::BAD_REQUEST,
            AppError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            // 只透传错误类状态码；1xx/2xx/3xx 无法作为错误响应，统一按 502 处理
            AppError::Upstream { status } => StatusCode::from_u16(*status)
                .ok()
                .filter(|s| s.is_client_error() || s.is_server_error())
                .unwrap_or(StatusCode::BAD_GATEWAY),
            AppError::Network(_) => StatusCode::BAD_GATEWAY,
            AppError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn stable_code(&self) -> &'static str {
        match self {
            AppError::InvalidStyle(_) => "INVALID_STYLE",
            AppError::Validation(_) => "VALIDATION_FAILED",
            AppError::Multipart(_) => "BAD_REQUEST",
            AppError::PayloadTooLarge(_) => "PAYLOAD_TOO_LARGE",
            AppError::Upstream { .. } => "UPSTREAM_FAILED",
            AppError::Network(_) => "UPSTREAM_ERROR",
            AppError::Timeout(_) => "UPSTREAM_TIMEOUT",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// 返回给调用方的消息
    pub fn public_message(&self) -> String {
        match self {
            AppError::InvalidStyle(_) => "Invalid style".to_string(),
            AppError::Validation(msg) | AppError::Multipart(msg) => msg.clone(),
            AppError::PayloadTooLarge(_) => "Uploaded image is too large".to_string(),
            AppError::Upstream { .. } => "Model inference failed".to_string(),
            AppError::Network(_) => "Model service unreachable".to_string(),
            AppError::Timeout(_) => "Model service timed out".to_string(),
            AppError::Internal(_) => "Internal server error".to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            tracing::warn!(code = self.stable_code(), "请求失败: {}", self);
        } else {
            tracing::debug!(code = self.stable_code(), "请求被拒绝: {}", self);
        }

        let body = ErrorBody {
            error: self.public_message(),
            code: self.stable_code().to_string(),
            status: status.as_u16(),
            request_id: crate::request_id::current_request_id(),
        };

        let mut res = Json(body).into_response();
        *res.status_mut() = status;
        res.headers_mut().insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        res
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AppError::Timeout(err.to_string())
        } else {
            AppError::Network(err.to_string())
        }
    }
}

impl From<MultipartError> for AppError {
    fn from(err: MultipartError) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            AppError::PayloadTooLarge(err.body_text())
        } else {
            AppError::Multipart(err.body_text())
        }
    }
}
