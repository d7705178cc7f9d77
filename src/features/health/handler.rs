use axum::{Json, extract::State};
use serde::Serialize;

use crate::state::AppState;

/// 探活结果，只反映本进程状态
#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    #[schema(example = "ok")]
    pub status: String,
    #[schema(example = "style-relay")]
    pub service: String,
    #[schema(example = "0.1.0")]
    pub version: String,
    /// 已加载的风格数量
    #[schema(example = 5)]
    pub style_count: usize,
}

#[utoipa::path(
    get,
    path = "/health",
    summary = "存活检查",
    description = "不访问上游模型；styleCount 为启动时加载的风格映射条目数。",
    responses((status = 200, description = "进程存活", body = HealthResponse)),
    tag = "Health"
)]
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        service: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        style_count: state.stylize.catalog().len(),
    })
}
