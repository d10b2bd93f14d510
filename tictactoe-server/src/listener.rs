//! 监听与接入
//!
//! 接入循环按 accept 顺序向协调任务登记连接，再为每个连接启动会话。

use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use protocol::{Connection, Listener, NetworkConfig, Result, TcpListener};

use crate::coordinator::{spawn_coordinator, CoordinatorHandle};
use crate::server::ServerState;
use crate::session::run_session;

/// accept 出错后的退避时间
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// 运行中的服务器
pub struct ServerHandle {
    local_addr: String,
    shutdown: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl ServerHandle {
    /// 实际监听地址
    pub fn local_addr(&self) -> &str {
        &self.local_addr
    }

    /// 停止接受新连接
    pub fn shutdown(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }

    /// 等待接入循环结束
    pub async fn wait(&mut self) {
        if let Err(e) = (&mut self.task).await {
            error!(error = %e, "接入循环异常结束");
        }
    }
}

/// 绑定地址并启动服务器
pub async fn start_server(config: &NetworkConfig) -> Result<ServerHandle> {
    let listener = TcpListener::bind(&config.addr()).await?;
    let local_addr = listener.local_addr().unwrap_or_else(|| config.addr());
    info!(addr = %local_addr, "服务器开始监听");

    let (handle, _coordinator) = spawn_coordinator(ServerState::new());
    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    let task = tokio::spawn(accept_loop(listener, handle, shutdown_rx));

    Ok(ServerHandle {
        local_addr,
        shutdown: Some(shutdown_tx),
        task,
    })
}

async fn accept_loop(
    mut listener: TcpListener,
    handle: CoordinatorHandle,
    mut shutdown: oneshot::Receiver<()>,
) {
    loop {
        let conn = tokio::select! {
            _ = &mut shutdown => {
                info!("停止接受新连接");
                return;
            }
            accepted = listener.accept() => accepted,
        };

        let conn = match conn {
            Ok(conn) => conn,
            Err(e) => {
                warn!(error = %e, "接受连接失败");
                tokio::time::sleep(ACCEPT_BACKOFF).await;
                continue;
            }
        };

        let peer_addr = conn.peer_addr();
        let (outbox, inbox) = mpsc::unbounded_channel();
        // 在接入循环里等待 id，保证 id 与 accept 顺序一致
        let Some(id) = handle.connect(outbox, peer_addr).await else {
            error!("协调任务已退出");
            return;
        };

        let (reader, writer) = conn.split();
        tokio::spawn(run_session(id, reader, writer, inbox, handle.clone()));
    }
}
