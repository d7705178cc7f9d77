use config::{Config as ConfigBuilder, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// 配置文件路径覆盖变量
const CONFIG_PATH_ENV: &str = "APP_CONFIG";

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// 监听地址
    #[serde(default = "ServerConfig::default_host")]
    pub host: String,
    /// 监听端口
    #[serde(default = "ServerConfig::default_port")]
    pub port: u16,
    /// 上传请求体大小上限（字节）
    #[serde(default = "ServerConfig::default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

impl ServerConfig {
    fn default_host() -> String {
        "0.0.0.0".to_string()
    }
    fn default_port() -> u16 {
        8000
    }
    fn default_max_upload_bytes() -> usize {
        10 * 1024 * 1024
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: Self::default_host(),
            port: Self::default_port(),
            max_upload_bytes: Self::default_max_upload_bytes(),
        }
    }
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// 日志级别
    #[serde(default = "LoggingConfig::default_level")]
    pub level: String,
    /// 日志格式：full|compact|pretty
    #[serde(default = "LoggingConfig::default_format")]
    pub format: String,
}

impl LoggingConfig {
    fn default_level() -> String {
        "info".to_string()
    }
    fn default_format() -> String {
        "full".to_string()
    }

    /// 未设置 RUST_LOG 时使用的过滤指令
    pub fn filter_directive(&self) -> String {
        let level = self.level.trim();
        let level = if level.is_empty() { "info" } else { level };
        format!("style_relay={level},tower_http={level}")
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Self::default_level(),
            format: Self::default_format(),
        }
    }
}

/// API 配置
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ApiConfig {
    /// API 路由前缀（留空则直接挂载在根路径，例如 `/stylize/`）
    #[serde(default)]
    pub prefix: String,
}

/// CORS 配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    /// 是否启用 CORS
    #[serde(default = "CorsConfig::default_enabled")]
    pub enabled: bool,
    /// 允许的 Origin 列表（支持 "*" 表示任意）
    #[serde(default = "CorsConfig::wildcard")]
    pub allowed_origins: Vec<String>,
    /// 允许的方法列表（支持 "*" 表示任意）
    #[serde(default = "CorsConfig::wildcard")]
    pub allowed_methods: Vec<String>,
    /// 允许的请求头列表（支持 "*" 表示任意）
    #[serde(default = "CorsConfig::wildcard")]
    pub allowed_headers: Vec<String>,
    /// 暴露的响应头列表（支持 "*" 表示任意）
    #[serde(default)]
    pub expose_headers: Vec<String>,
    /// 是否允许携带凭证（Cookie/Authorization）
    #[serde(default = "CorsConfig::default_allow_credentials")]
    pub allow_credentials: bool,
    /// 预检缓存时间（秒）
    #[serde(default)]
    pub max_age_secs: Option<u64>,
}

impl CorsConfig {
    fn default_enabled() -> bool {
        true
    }

    fn default_allow_credentials() -> bool {
        true
    }

    fn wildcard() -> Vec<String> {
        vec!["*".to_string()]
    }

    /// 关闭状态、列表全空的配置，测试中作为基底使用
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            allowed_origins: Vec::new(),
            allowed_methods: Vec::new(),
            allowed_headers: Vec::new(),
            expose_headers: Vec::new(),
            allow_credentials: false,
            max_age_secs: None,
        }
    }
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            enabled: Self::default_enabled(),
            allowed_origins: Self::wildcard(),
            allowed_methods: Self::wildcard(),
            allowed_headers: Self::wildcard(),
            expose_headers: Vec::new(),
            allow_credentials: Self::default_allow_credentials(),
            max_age_secs: None,
        }
    }
}

/// 上游推理服务配置
#[derive(Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    /// Bearer 凭证，只能通过配置文件或环境变量注入
    #[serde(default = "UpstreamConfig::default_api_token", skip_serializing)]
    pub api_token: String,
    /// 单次推理请求超时（秒）
    #[serde(default = "UpstreamConfig::default_timeout")]
    pub timeout_secs: u64,
    /// 建立连接超时（秒）
    #[serde(default = "UpstreamConfig::default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

impl UpstreamConfig {
    fn default_api_token() -> String {
        std::env::var("HF_API_TOKEN")
            .map(|s| s.trim().to_string())
            .unwrap_or_default()
    }
    fn default_timeout() -> u64 {
        120
    }
    fn default_connect_timeout() -> u64 {
        10
    }

    pub fn timeout_duration(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn connect_timeout_duration(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

// 手写 Debug，避免凭证进入日志
impl std::fmt::Debug for UpstreamConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpstreamConfig")
            .field("api_token", &if self.api_token.is_empty() { "<empty>" } else { "<redacted>" })
            .field("timeout_secs", &self.timeout_secs)
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .finish()
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            api_token: Self::default_api_token(),
            timeout_secs: Self::default_timeout(),
            connect_timeout_secs: Self::default_connect_timeout(),
        }
    }
}

/// 单个风格条目
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StyleEntry {
    /// 展示名称
    #[serde(default)]
    pub label: String,
    /// 推理模型端点
    pub endpoint: String,
}

impl StyleEntry {
    fn new(label: &str, endpoint: &str) -> Self {
        Self {
            label: label.to_string(),
            endpoint: endpoint.to_string(),
        }
    }
}

/// 内置的风格映射。配置中出现 `[styles]` 时整体替换。
pub fn default_styles() -> BTreeMap<String, StyleEntry> {
    const HF: &str = "https://api-inference.huggingface.co/models";
    BTreeMap::from([
        (
            "ghibli".to_string(),
            StyleEntry::new("Ghibli", &format!("{HF}/Lykon/dreamshaper-7")),
        ),
        (
            "comic".to_string(),
            StyleEntry::new("Comic Book", &format!("{HF}/nitrosocke/Comic-Diffusion")),
        ),
        (
            "3d".to_string(),
            StyleEntry::new("3D", &format!("{HF}/cyberes/3D-Render-Diffusion")),
        ),
        (
            "pixar".to_string(),
            StyleEntry::new("Pixar", &format!("{HF}/nitrosocke/PixarStyle")),
        ),
        (
            "disney".to_string(),
            StyleEntry::new(
                "Disney",
                &format!("{HF}/stablediffusionapi/disney-pixar-cartoon"),
            ),
        ),
    ])
}

/// 优雅退出配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShutdownConfig {
    /// 优雅退出超时时间（秒）
    #[serde(default = "ShutdownConfig::default_timeout")]
    pub timeout_secs: u64,
}

impl ShutdownConfig {
    fn default_timeout() -> u64 {
        30
    }

    /// 获取优雅退出超时时间
    pub fn timeout_duration(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self {
            timeout_secs: Self::default_timeout(),
        }
    }
}

/// 应用配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub api: ApiConfig,
    /// CORS 配置（默认完全开放）
    #[serde(default)]
    pub cors: CorsConfig,
    /// 上游推理服务配置
    #[serde(default)]
    pub upstream: UpstreamConfig,
    /// 风格 -> 模型端点映射
    #[serde(default = "default_styles")]
    pub styles: BTreeMap<String, StyleEntry>,
    /// 优雅退出配置
    #[serde(default)]
    pub shutdown: ShutdownConfig,
}

impl AppConfig {
    /// 加载配置：内置默认值 -> config.toml（可选）-> `APP_` 前缀环境变量
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with(&Self::get_config_path(), Self::environment())
    }

    /// 使用指定的配置文件与环境变量源加载
    pub fn load_with(path: &Path, env: Environment) -> Result<Self, ConfigError> {
        let builder = ConfigBuilder::builder()
            .add_source(File::from(path).required(false))
            // 嵌套字段以双下划线分隔，例如：APP_UPSTREAM__API_TOKEN
            .add_source(env)
            .build()?;

        let config: Self = builder.try_deserialize()?;
        config.validate()?;

        Ok(config)
    }

    /// 进程环境变量源
    pub fn environment() -> Environment {
        Environment::with_prefix("APP")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true)
    }

    /// 启动前的基础校验
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.upstream.api_token.trim().is_empty() {
            return Err(ConfigError::Message(
                "缺少上游凭证：请设置 APP_UPSTREAM__API_TOKEN 或 HF_API_TOKEN".to_string(),
            ));
        }
        if self.upstream.timeout_secs == 0 {
            return Err(ConfigError::Message(
                "upstream.timeout_secs 必须大于 0".to_string(),
            ));
        }
        if self.server.max_upload_bytes == 0 {
            return Err(ConfigError::Message(
                "server.max_upload_bytes 必须大于 0".to_string(),
            ));
        }
        if self.styles.is_empty() {
            return Err(ConfigError::Message("styles 不能为空".to_string()));
        }
        Ok(())
    }

    /// 获取配置文件路径（`APP_CONFIG` 覆盖，默认 `config.toml`）
    pub fn get_config_path() -> PathBuf {
        Self::config_path_from(std::env::var(CONFIG_PATH_ENV).ok())
    }

    fn config_path_from(value: Option<String>) -> PathBuf {
        value
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("config.toml"))
    }

    /// 获取服务器监听地址
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// 规范化后的 API 前缀：空串表示根路径，否则以 `/` 开头且不以 `/` 结尾
    pub fn api_prefix(&self) -> String {
        let trimmed = self.api.prefix.trim().trim_end_matches('/');
        if trimmed.is_empty() {
            String::new()
        } else if trimmed.starts_with('/') {
            trimmed.to_string()
        } else {
            format!("/{trimmed}")
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            logging: LoggingConfig::default(),
            api: ApiConfig::default(),
            cors: CorsConfig::default(),
            upstream: UpstreamConfig::default(),
            styles: default_styles(),
            shutdown: ShutdownConfig::default(),
        }
    }
}
