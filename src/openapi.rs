use utoipa::OpenApi;
use utoipa::openapi::server::ServerBuilder;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::features::health::handler::health_check,
        crate::features::stylize::handler::stylize_image,
        crate::features::stylize::handler::list_styles,
    ),
    components(schemas(
        crate::error::ErrorBody,
        crate::features::health::HealthResponse,
        crate::features::stylize::models::StylizeForm,
        crate::features::stylize::models::StylizeResponse,
        crate::features::stylize::models::StyleInfo,
        crate::features::stylize::models::StyleListResponse,
    )),
    tags(
        (
            name = "Stylize",
            description = "图片风格化：上传图片并选择风格，由外部推理模型生成结果。"
        ),
        (name = "Health", description = "健康检查：服务探活。"),
    ),
    info(
        title = "Style Relay API",
        version = env!("CARGO_PKG_VERSION"),
        description = "图片风格化中继服务（Axum + utoipa）。业务接口挂载在 `config.api.prefix` 下（默认为根路径）。"
    )
)]
pub struct ApiDoc;

/// 生成带运行时前缀的 OpenAPI 文档。
///
/// 业务接口挂在 `prefix` 下而 `/health` 不带前缀，因此前缀非空时同时给出两个 server。
pub fn api_doc(prefix: &str) -> utoipa::openapi::OpenApi {
    let mut doc = ApiDoc::openapi();

    if !prefix.is_empty() {
        let api = ServerBuilder::new()
            .url(prefix)
            .description(Some("业务接口"))
            .build();
        let root = ServerBuilder::new()
            .url("/")
            .description(Some("根路径（/health）"))
            .build();
        doc.servers = Some(vec![api, root]);
    }

    doc
}
