pub mod client;
pub mod handler;
pub mod models;
pub mod service;

// 对外导出路由构建函数，便于 main.rs / router 引用
pub use handler::create_stylize_router;
pub use models::{StyleCatalog, StyleKey, StylizeResponse};
pub use service::StylizeService;
