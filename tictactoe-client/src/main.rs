use std::io::Write;

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use protocol::{NetworkConfig, ProtocolError};
use tictactoe_client::{name_command, parse_line, render_event, ServerConnection};

#[tokio::main]
async fn main() -> Result<()> {
    // 初始化日志（输出到 stderr，不干扰对局画面）
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::EnvFilter::from_default_env()
            .add_directive("tictactoe_client=info".parse()?))
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let config = match NetworkConfig::from_args(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e}");
            eprintln!("Usage: tictactoe-client [host] [port]");
            std::process::exit(1);
        }
    };

    let mut conn = match ServerConnection::connect(&config.addr()).await {
        Ok(conn) => conn,
        Err(e) => {
            println!("Could not create client: {e}");
            std::process::exit(1);
        }
    };
    println!("Successfully connected to server!");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    // 握手：先发送名称，空白则保留默认名
    print!("Enter your name: ");
    std::io::stdout().flush()?;
    match lines.next_line().await {
        Ok(Some(line)) => {
            if let Some(cmd) = name_command(&line) {
                conn.send(&cmd).await?;
            }
        }
        Ok(None) => {
            stdin_open = false;
            let _ = conn.close().await;
        }
        Err(e) => {
            warn!(error = %e, "读取标准输入失败");
            stdin_open = false;
        }
    }
    println!("Enter `x y` to mark a cell, `/name <name>` to rename, anything else to chat.");

    loop {
        tokio::select! {
            line = lines.next_line(), if stdin_open => match line {
                Ok(Some(line)) => match parse_line(&line) {
                    Ok(Some(cmd)) => {
                        if let Err(e) = conn.send(&cmd).await {
                            warn!(error = %e, "发送失败");
                            break;
                        }
                    }
                    Ok(None) => {}
                    Err(e) => println!("{e}"),
                },
                Ok(None) => {
                    debug!("标准输入已关闭");
                    stdin_open = false;
                    let _ = conn.close().await;
                }
                Err(e) => {
                    warn!(error = %e, "读取标准输入失败");
                    stdin_open = false;
                }
            },
            events = conn.recv() => match events {
                Ok(events) => {
                    for event in &events {
                        println!("{}", render_event(event));
                    }
                }
                Err(ProtocolError::ConnectionClosed) => break,
                Err(e) => {
                    warn!(error = %e, "接收失败");
                    break;
                }
            },
        }
    }

    println!("Lost connection to server.");
    Ok(())
}
