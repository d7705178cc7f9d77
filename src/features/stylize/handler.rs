//! 风格化 API 处理模块（features/stylize）
use axum::{
    Router,
    body::Bytes,
    extract::{Multipart, State, multipart::MultipartRejection},
    response::Json,
    routing::{get, post},
};
use base64::{Engine as _, engine::general_purpose};

use crate::error::AppError;
use crate::state::AppState;

use super::client::truncate_for_log;
use super::models::{StyleListResponse, StylizeRequest, StylizeResponse};
use super::service::STYLE_LOG_LIMIT;

/// 图片文件字段名（`image` 为兼容别名）
const FILE_FIELDS: [&str; 2] = ["file", "image"];
const STYLE_FIELD: &str = "style";

#[utoipa::path(
    post,
    path = "/stylize",
    summary = "图片风格化",
    description = "上传图片与风格标识，转发至对应的推理模型，返回 base64 编码的结果图片。未知风格直接返回 400，不会请求上游。",
    request_body(content = crate::features::stylize::models::StylizeForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "风格化成功", body = StylizeResponse),
        (status = 400, description = "风格无效或表单无法解析", body = crate::error::ErrorBody),
        (status = 413, description = "上传内容过大", body = crate::error::ErrorBody),
        (status = 422, description = "缺少字段或图片为空", body = crate::error::ErrorBody),
        (status = 502, description = "上游不可达", body = crate::error::ErrorBody),
        (status = 504, description = "上游超时", body = crate::error::ErrorBody),
        (status = "default", description = "上游返回的错误状态码（原样透传）", body = crate::error::ErrorBody)
    ),
    tag = "Stylize"
)]
pub async fn stylize_image(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<StylizeResponse>, AppError> {
    let multipart = multipart.map_err(|e| AppError::Multipart(e.body_text()))?;
    let request = read_stylize_form(multipart).await?;

    tracing::debug!(
        style = %truncate_for_log(request.style.as_bytes(), STYLE_LOG_LIMIT),
        bytes = request.image.len(),
        file_name = ?request.file_name,
        content_type = ?request.content_type,
        "收到风格化请求"
    );

    let output = state
        .stylize
        .handle_stylize(request.image, &request.style)
        .await?;

    Ok(Json(StylizeResponse {
        image: general_purpose::STANDARD.encode(&output.body),
        style: output.style.to_string(),
        content_type: output.content_type,
    }))
}

#[utoipa::path(
    get,
    path = "/styles",
    summary = "可用风格列表",
    description = "返回当前配置的全部风格标识与展示名称。",
    responses((status = 200, description = "风格列表", body = StyleListResponse)),
    tag = "Stylize"
)]
pub async fn list_styles(State(state): State<AppState>) -> Json<StyleListResponse> {
    Json(StyleListResponse {
        styles: state.stylize.list_styles(),
    })
}

async fn read_stylize_form(mut multipart: Multipart) -> Result<StylizeRequest, AppError> {
    let mut image: Option<Bytes> = None;
    let mut file_name = None;
    let mut content_type = None;
    let mut style: Option<String> = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        if FILE_FIELDS.contains(&name.as_str()) {
            if image.is_some() {
                // 只取第一个文件字段
                continue;
            }
            file_name = field.file_name().map(str::to_string);
            content_type = field.content_type().map(str::to_string);
            image = Some(field.bytes().await?);
        } else if name == STYLE_FIELD {
            style = Some(field.text().await?);
        }
    }

    let style = style.ok_or_else(|| AppError::Validation("Missing form field: style".to_string()))?;
    let image = image.ok_or_else(|| AppError::Validation("Missing form field: file".to_string()))?;

    Ok(StylizeRequest {
        image,
        style,
        file_name,
        content_type,
    })
}

pub fn create_stylize_router() -> Router<AppState> {
    Router::<AppState>::new()
        .route("/stylize", post(stylize_image))
        .route("/stylize/", post(stylize_image))
        .route("/styles", get(list_styles))
}
