use axum::body::Bytes;
use std::time::{Duration, Instant};

use crate::error::AppError;

use super::client::{InferenceClient, truncate_for_log};
use super::models::{StyleCatalog, StyleInfo, StylizeOutput};

/// 客户端提交的风格串写入错误与日志时的长度上限
pub(crate) const STYLE_LOG_LIMIT: usize = 64;

fn as_millis_u64(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
}

/// 风格化中继服务：风格校验 + 单次上游调用
pub struct StylizeService {
    catalog: StyleCatalog,
    client: InferenceClient,
}

impl StylizeService {
    pub fn new(catalog: StyleCatalog, client: InferenceClient) -> Self {
        Self { catalog, client }
    }

    pub fn catalog(&self) -> &StyleCatalog {
        &self.catalog
    }

    /// 校验风格与图片后转发到对应模型端点。
    ///
    /// 未知风格或空图片直接返回错误，不产生任何出站请求。
    pub async fn handle_stylize(&self, image: Bytes, style: &str) -> Result<StylizeOutput, AppError> {
        let (key, endpoint) = self
            .catalog
            .resolve(style)
            .ok_or_else(|| {
                AppError::InvalidStyle(truncate_for_log(style.as_bytes(), STYLE_LOG_LIMIT))
            })?;

        if image.is_empty() {
            return Err(AppError::Validation("Image file is empty".to_string()));
        }

        let image_len = image.len();
        let started = Instant::now();
        let reply = self.client.infer(&endpoint.url, image).await.inspect_err(|e| {
            tracing::warn!(style = %key, "上游调用失败: {}", e);
        })?;
        let elapsed_ms = as_millis_u64(started.elapsed());

        if !reply.status.is_success() {
            tracing::warn!(
                style = %key,
                upstream_status = reply.status.as_u16(),
                elapsed_ms,
                "模型推理失败"
            );
            return Err(AppError::Upstream {
                status: reply.status.as_u16(),
            });
        }

        tracing::info!(
            style = %key,
            input_bytes = image_len,
            output_bytes = reply.body.len(),
            elapsed_ms,
            "风格化完成"
        );

        Ok(StylizeOutput {
            style: key.clone(),
            body: reply.body,
            content_type: reply.content_type,
        })
    }

    /// 可用风格列表（按 key 排序，不暴露端点）
    pub fn list_styles(&self) -> Vec<StyleInfo> {
        self.catalog
            .iter()
            .map(|(key, endpoint)| StyleInfo {
                key: key.to_string(),
                label: endpoint.label.clone(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{UpstreamConfig, default_styles};

    fn service() -> StylizeService {
        let catalog = StyleCatalog::from_config(&default_styles()).expect("catalog");
        let upstream = UpstreamConfig {
            api_token: "test-token".to_string(),
            ..UpstreamConfig::default()
        };
        let client = InferenceClient::new(&upstream).expect("client");
        StylizeService::new(catalog, client)
    }

    #[tokio::test]
    async fn unknown_style_fails_before_network() {
        // 端点指向真实外网，若发起请求测试会变慢或失败
        let err = service()
            .handle_stylize(Bytes::from_static(b"0123456789"), "unknown")
            .await
            .expect_err("invalid style");
        assert!(matches!(err, AppError::InvalidStyle(ref s) if s == "unknown"));
    }

    #[tokio::test]
    async fn oversized_unknown_style_is_capped_in_error() {
        let raw = "x".repeat(10_000);
        let err = service()
            .handle_stylize(Bytes::from_static(b"0123456789"), &raw)
            .await
            .expect_err("invalid style");
        let AppError::InvalidStyle(stored) = err else {
            panic!("expected InvalidStyle, got {err:?}");
        };
        assert_eq!(stored.len(), STYLE_LOG_LIMIT + "...".len());
        assert!(stored.ends_with("..."));
    }

    #[test]
    fn elapsed_millis_saturates() {
        assert_eq!(as_millis_u64(Duration::from_millis(1500)), 1500);
        assert_eq!(as_millis_u64(Duration::MAX), u64::MAX);
    }

    #[tokio::test]
    async fn empty_image_fails_before_network() {
        let err = service()
            .handle_stylize(Bytes::new(), "ghibli")
            .await
            .expect_err("empty image");
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn list_styles_is_sorted_with_labels() {
        let styles = service().list_styles();
        let keys: Vec<_> = styles.iter().map(|s| s.key.as_str()).collect();
        assert_eq!(keys, vec!["3d", "comic", "disney", "ghibli", "pixar"]);
        assert_eq!(styles[1].label, "Comic Book");
    }
}
