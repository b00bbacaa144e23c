use fulfillment_server::{Config, Server, print_banner, setup_environment};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. 设置环境 (dotenv, 日志)
    setup_environment()?;

    print_banner();
    tracing::info!("Fulfillment server starting...");

    // 2. 加载配置
    let config = Config::from_env();
    if !config.is_production() {
        tracing::info!(environment = %config.environment, "Running in non-production mode");
    }

    // 3. 初始化状态和后台任务，启动 HTTP 服务
    let server = Server::new(config).await?;
    if let Err(e) = server.run().await {
        tracing::error!("Server error: {}", e);
        return Err(e);
    }

    Ok(())
}
