use label_server::{Config, Server, ServerState, print_banner, setup_environment};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. 加载 .env 和配置
    let _ = dotenv::dotenv();
    let config = Config::from_env();

    // 2. 初始化日志
    setup_environment(&config)?;
    print_banner(&config);

    // 3. 初始化服务器状态 (打印设备来自配置)
    let state = ServerState::initialize(&config)?;

    // 4. 启动 HTTP 服务器
    let server = Server::new(config, state);

    if let Err(e) = server.run().await {
        tracing::error!("Server error: {}", e);
        return Err(e.into());
    }

    Ok(())
}
