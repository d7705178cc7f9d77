use axum::body::Bytes;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

use crate::config::StyleEntry;

/// 风格标识（如 "ghibli"），只能由 [`StyleCatalog`] 产生。
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StyleKey(String);

impl StyleKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for StyleKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StyleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 某个风格对应的推理模型端点
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelEndpoint {
    pub label: String,
    pub url: Url,
}

/// 风格映射构建错误
#[derive(Error, Debug, PartialEq, Eq)]
pub enum CatalogError {
    #[error("风格映射为空")]
    Empty,
    #[error("风格标识不能为空白")]
    BlankKey,
    #[error("风格标识 {0} 忽略大小写后重复")]
    DuplicateKey(String),
    #[error("风格 {key} 的端点无效: {reason}")]
    InvalidEndpoint { key: String, reason: String },
}

/// 不可变的 StyleKey -> ModelEndpoint 映射，启动时构建一次
#[derive(Debug, Clone)]
pub struct StyleCatalog {
    entries: BTreeMap<StyleKey, ModelEndpoint>,
}

impl StyleCatalog {
    pub fn from_config(styles: &BTreeMap<String, StyleEntry>) -> Result<Self, CatalogError> {
        if styles.is_empty() {
            return Err(CatalogError::Empty);
        }

        let mut entries = BTreeMap::new();
        for (raw_key, entry) in styles {
            // config 读取 toml/环境变量时会把键转成小写，这里统一规范化
            let key = raw_key.trim().to_lowercase();
            if key.is_empty() {
                return Err(CatalogError::BlankKey);
            }
            if entries.contains_key(key.as_str()) {
                return Err(CatalogError::DuplicateKey(key));
            }

            let url = Url::parse(entry.endpoint.trim()).map_err(|e| {
                CatalogError::InvalidEndpoint {
                    key: key.to_string(),
                    reason: e.to_string(),
                }
            })?;
            if !matches!(url.scheme(), "http" | "https") {
                return Err(CatalogError::InvalidEndpoint {
                    key: key.to_string(),
                    reason: format!("不支持的协议 {}", url.scheme()),
                });
            }

            let label = if entry.label.trim().is_empty() {
                key.to_string()
            } else {
                entry.label.trim().to_string()
            };
            entries.insert(StyleKey(key), ModelEndpoint { label, url });
        }

        Ok(Self { entries })
    }

    /// 按提交的字符串查找风格（去除首尾空白，忽略大小写）
    pub fn resolve(&self, raw: &str) -> Option<(&StyleKey, &ModelEndpoint)> {
        self.entries.get_key_value(raw.trim().to_lowercase().as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&StyleKey, &ModelEndpoint)> {
        self.entries.iter()
    }
}

/// 单次风格化请求（处理完即丢弃）
#[derive(Debug, Clone)]
pub struct StylizeRequest {
    pub image: Bytes,
    pub style: String,
    /// 客户端文件名，仅用于日志
    pub file_name: Option<String>,
    /// 客户端声明的内容类型，仅用于日志
    pub content_type: Option<String>,
}

/// 上游成功时的原始结果
#[derive(Debug, Clone)]
pub struct StylizeOutput {
    pub style: StyleKey,
    pub body: Bytes,
    pub content_type: Option<String>,
}

/// `POST /stylize` 成功响应
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StylizeResponse {
    /// 上游返回的图片字节（标准 base64）
    #[schema(example = "UE5HREFUQQ==")]
    pub image: String,
    /// 实际使用的风格
    #[schema(example = "ghibli")]
    pub style: String,
    /// 上游声明的内容类型
    #[schema(example = "image/png")]
    pub content_type: Option<String>,
}

/// multipart 表单结构（仅用于 OpenAPI 描述）
#[derive(Debug, utoipa::ToSchema)]
pub struct StylizeForm {
    /// 待处理的图片文件
    #[schema(value_type = String, format = Binary)]
    pub file: Vec<u8>,
    /// 风格标识
    #[schema(example = "ghibli")]
    pub style: String,
}

/// 可用风格
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct StyleInfo {
    #[schema(example = "comic")]
    pub key: String,
    #[schema(example = "Comic Book")]
    pub label: String,
}

/// `GET /styles` 响应
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct StyleListResponse {
    pub styles: Vec<StyleInfo>,
}
