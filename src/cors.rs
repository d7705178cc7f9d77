use axum::http::{HeaderName, HeaderValue, Method};
use std::time::Duration;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, Any, CorsLayer, ExposeHeaders};

use crate::config::CorsConfig;

/// 配置项解析结果：`"*"`、显式列表，或未配置
#[derive(Debug, PartialEq, Eq)]
enum Rule<T> {
    Unset,
    Wildcard,
    List(Vec<T>),
}

impl<T> Rule<T> {
    /// 浏览器不接受 `*` 与凭证同时出现，此时用回显代替通配
    fn resolve<L>(self, credentials: bool, any: impl FnOnce() -> L, mirror: impl FnOnce() -> L) -> Option<L>
    where
        L: From<Vec<T>>,
    {
        match self {
            Rule::Unset => None,
            Rule::Wildcard if credentials => Some(mirror()),
            Rule::Wildcard => Some(any()),
            Rule::List(items) => Some(L::from(items)),
        }
    }
}

fn parse_rule<T>(field: &str, values: &[String], parse: impl Fn(&str) -> Option<T>) -> Rule<T> {
    let mut items = Vec::new();
    for value in values.iter().map(|v| v.trim()).filter(|v| !v.is_empty()) {
        if value == "*" {
            return Rule::Wildcard;
        }
        match parse(value) {
            Some(item) => items.push(item),
            None => tracing::warn!("CORS {} 含无效值，已忽略: {}", field, value),
        }
    }
    if items.is_empty() {
        Rule::Unset
    } else {
        Rule::List(items)
    }
}

fn parse_origin(value: &str) -> Option<HeaderValue> {
    HeaderValue::from_str(value).ok()
}

fn parse_method(value: &str) -> Option<Method> {
    Method::from_bytes(value.to_ascii_uppercase().as_bytes()).ok()
}

fn parse_header(value: &str) -> Option<HeaderName> {
    HeaderName::from_bytes(value.to_ascii_lowercase().as_bytes()).ok()
}

/// 根据配置构建 CORS 中间件，未启用或没有可用 Origin 时返回 None
pub fn build_cors_layer(cors: &CorsConfig) -> Option<CorsLayer> {
    if !cors.enabled {
        return None;
    }

    let credentials = cors.allow_credentials;
    let origin = parse_rule("allowed_origins", &cors.allowed_origins, parse_origin)
        .resolve::<AllowOrigin>(credentials, || Any.into(), AllowOrigin::mirror_request);
    let Some(origin) = origin else {
        tracing::warn!("CORS 已启用但 allowed_origins 为空，已跳过启用");
        return None;
    };

    let mut layer = CorsLayer::new().allow_origin(origin);

    if let Some(methods) = parse_rule("allowed_methods", &cors.allowed_methods, parse_method)
        .resolve::<AllowMethods>(credentials, || Any.into(), AllowMethods::mirror_request)
    {
        layer = layer.allow_methods(methods);
    }

    if let Some(headers) = parse_rule("allowed_headers", &cors.allowed_headers, parse_header)
        .resolve::<AllowHeaders>(credentials, || Any.into(), AllowHeaders::mirror_request)
    {
        layer = layer.allow_headers(headers);
    }

    // 暴露头没有回显形式，凭证模式下只能使用显式列表
    match parse_rule("expose_headers", &cors.expose_headers, parse_header) {
        Rule::Wildcard if credentials => {
            tracing::warn!("CORS expose_headers=\"*\" 不能与 allow_credentials 同时使用，已忽略");
        }
        Rule::Wildcard => layer = layer.expose_headers(Any),
        Rule::List(names) => layer = layer.expose_headers(ExposeHeaders::from(names)),
        Rule::Unset => {}
    }

    if credentials {
        layer = layer.allow_credentials(true);
    }

    if let Some(secs) = cors.max_age_secs.filter(|s| *s > 0) {
        layer = layer.max_age(Duration::from_secs(secs));
    }

    Some(layer)
}
