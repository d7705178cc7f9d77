use std::sync::Arc;

use crate::config::AppConfig;
use crate::error::AppError;
use crate::features::stylize::{StyleCatalog, StylizeService, client::InferenceClient};

/// 聚合的应用共享状态（启动后只读）
#[derive(Clone)]
pub struct AppState {
    pub stylize: Arc<StylizeService>,
}

impl AppState {
    pub fn new(stylize: StylizeService) -> Self {
        Self {
            stylize: Arc::new(stylize),
        }
    }

    /// 由配置构建：风格映射校验 + 上游客户端初始化
    pub fn from_config(config: &AppConfig) -> Result<Self, AppError> {
        let catalog = StyleCatalog::from_config(&config.styles)
            .map_err(|e| AppError::Internal(format!("风格映射无效: {e}")))?;
        let client = InferenceClient::new(&config.upstream)?;
        Ok(Self::new(StylizeService::new(catalog, client)))
    }
}
