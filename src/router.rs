use axum::{Router, extract::DefaultBodyLimit, routing::get};
use tower_http::trace::TraceLayer;
use utoipa_swagger_ui::SwaggerUi;

use crate::config::AppConfig;
use crate::cors::build_cors_layer;
use crate::features::{health, stylize};
use crate::openapi::api_doc;
use crate::request_id::request_id_middleware;
use crate::state::AppState;

/// 组装完整的应用路由（业务接口 + 健康检查 + 文档 + 中间件）
pub fn build_router(config: &AppConfig, state: AppState) -> Router {
    let prefix = config.api_prefix();

    let api_router = Router::<AppState>::new()
        .merge(stylize::create_stylize_router())
        .layer(DefaultBodyLimit::max(config.server.max_upload_bytes));

    let mut app = Router::<AppState>::new().route("/health", get(health::health_check));
    // axum 不允许在根路径 nest，前缀为空时直接合并
    app = if prefix.is_empty() {
        app.merge(api_router)
    } else {
        app.nest(&prefix, api_router)
    };

    let mut app = app
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", api_doc(&prefix)))
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    if let Some(cors) = build_cors_layer(&config.cors) {
        app = app.layer(cors);
    }

    // 最外层，保证 CORS 预检等所有响应都带 X-Request-Id
    app.layer(axum::middleware::from_fn(request_id_middleware))
}
