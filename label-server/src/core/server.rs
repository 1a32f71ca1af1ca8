//! Server Implementation
//!
//! HTTP 服务器启动和管理

use crate::core::{Config, Result, ServerState};

/// HTTP Server
///
/// 持有配置和已初始化的状态 (打印设备在 [`ServerState::initialize`] 中创建)
pub struct Server {
    config: Config,
    state: ServerState,
}

impl Server {
    pub fn new(config: Config, state: ServerState) -> Self {
        Self { config, state }
    }

    /// 运行直到 Ctrl-C, 然后关闭打印机连接
    pub async fn run(self) -> Result<()> {
        let Self { config, state } = self;

        if config.printer.connect_on_startup {
            match state.dispatcher.connect().await {
                Ok(()) => tracing::info!("Printer connected"),
                // Not fatal: the first job opens the connection again
                Err(e) => tracing::warn!(error = %e, "Printer not reachable at startup"),
            }
        }

        let dispatcher = state.dispatcher.clone();
        let app = crate::api::build_app(state);

        let addr = config.bind_addr();
        let listener = tokio::net::TcpListener::bind(&addr).await?;
        tracing::info!("🏷️ Label Server starting on {}", addr);

        let shutdown = async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutting down...");
        };

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await?;

        // Let the job in progress finish, then release the printer
        dispatcher.shutdown().await;

        Ok(())
    }
}
