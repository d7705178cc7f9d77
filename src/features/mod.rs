/// 健康检查
pub mod health;

/// 图片风格化中继
pub mod stylize;
