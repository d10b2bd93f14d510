use anyhow::Result;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use protocol::NetworkConfig;
use tictactoe_server::start_server;

#[tokio::main]
async fn main() -> Result<()> {
    // 初始化日志
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env()
            .add_directive("tictactoe_server=debug".parse()?))
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let config = match NetworkConfig::from_args(&args) {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "参数错误");
            eprintln!("Usage: tictactoe-server [host] [port]");
            std::process::exit(1);
        }
    };

    info!("井字棋服务端启动中...");

    let mut server = match start_server(&config).await {
        Ok(server) => server,
        Err(e) => {
            error!(addr = %config.addr(), error = %e, "无法绑定地址");
            std::process::exit(1);
        }
    };

    info!(addr = %server.local_addr(), "等待连接");

    let interrupted = tokio::select! {
        _ = tokio::signal::ctrl_c() => true,
        _ = server.wait() => false,
    };
    if interrupted {
        info!("收到退出信号");
        server.shutdown();
    }

    Ok(())
}
