use style_relay::{AppConfig, AppState, ShutdownManager, build_router, shutdown};
use tracing_subscriber::EnvFilter;

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.logging.filter_directive()));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    match config.logging.format.as_str() {
        "compact" => builder.compact().init(),
        "pretty" => builder.pretty().init(),
        _ => builder.init(),
    }
}

#[tokio::main]
async fn main() {
    // 配置加载先于日志初始化，失败时只能直接输出到 stderr
    let config = match AppConfig::load() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config init failed: {e}");
            std::process::exit(1);
        }
    };
    init_tracing(&config);
    tracing::info!("配置文件: {:?}", AppConfig::get_config_path());
    tracing::debug!("上游配置: {:?}", config.upstream);

    let state = match AppState::from_config(&config) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!("应用状态初始化失败: {}", e);
            std::process::exit(1);
        }
    };
    tracing::info!(
        "已加载 {} 个风格: {:?}",
        state.stylize.catalog().len(),
        state
            .stylize
            .list_styles()
            .iter()
            .map(|s| s.key.as_str())
            .collect::<Vec<_>>()
    );

    let shutdown_manager = ShutdownManager::new();
    if let Err(e) = shutdown_manager.start_signal_handler() {
        tracing::error!("信号处理器启动失败: {}", e);
        std::process::exit(1);
    }
    shutdown::spawn_drain_watchdog(shutdown_manager.clone(), config.shutdown.timeout_duration());

    let app = build_router(&config, state);

    let addr = config.server_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("Bind address failed {}: {}", addr, e);
            std::process::exit(1);
        });

    let prefix = config.api_prefix();
    tracing::info!("Server: http://{}", addr);
    tracing::info!("Docs: http://{}/docs", addr);
    tracing::info!("Health: http://{}/health", addr);
    tracing::info!("Stylize API: http://{}{}/stylize", addr, prefix);

    let graceful = axum::serve(listener, app).with_graceful_shutdown(async move {
        let reason = shutdown_manager.wait_for_shutdown().await;
        tracing::info!("接收到退出信号: {:?}，开始优雅关闭HTTP服务器...", reason);
    });

    if let Err(e) = graceful.await {
        tracing::error!("服务器运行错误: {}", e);
        std::process::exit(1);
    }

    tracing::info!("服务器已优雅关闭");
}
