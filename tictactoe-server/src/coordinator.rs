//! 协调任务
//!
//! 唯一持有 `ServerState` 的任务。各连接会话通过 `CoordinatorHandle`
//! 把事件排进同一条队列，事件按到达顺序逐个处理。

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use protocol::{ClientCommand, ConnectionId};

use crate::registry::Outbox;
use crate::server::{MessageHandler, ServerState};

/// 协调队列容量
const EVENT_QUEUE_CAPACITY: usize = 1024;

/// 会话发往协调任务的事件
#[derive(Debug)]
pub enum SessionEvent {
    /// 新连接，分配到的 id 经 `reply` 返回
    Connected {
        outbox: Outbox,
        peer_addr: Option<String>,
        reply: oneshot::Sender<ConnectionId>,
    },
    /// 客户端命令
    Command {
        id: ConnectionId,
        command: ClientCommand,
    },
    /// 连接断开
    Disconnected { id: ConnectionId },
}

/// 协调任务句柄
#[derive(Debug, Clone)]
pub struct CoordinatorHandle {
    tx: mpsc::Sender<SessionEvent>,
}

impl CoordinatorHandle {
    /// 登记新连接，返回分配的 id；协调任务已退出时返回 None
    pub async fn connect(&self, outbox: Outbox, peer_addr: Option<String>) -> Option<ConnectionId> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(SessionEvent::Connected {
                outbox,
                peer_addr,
                reply,
            })
            .await
            .ok()?;
        rx.await.ok()
    }

    /// 转交客户端命令
    pub async fn dispatch(&self, id: ConnectionId, command: ClientCommand) -> bool {
        self.tx
            .send(SessionEvent::Command { id, command })
            .await
            .is_ok()
    }

    /// 通知连接断开
    pub async fn disconnect(&self, id: ConnectionId) -> bool {
        self.tx.send(SessionEvent::Disconnected { id }).await.is_ok()
    }
}

/// 启动协调任务
///
/// 所有句柄被丢弃后任务退出，并交回最终状态。
pub fn spawn_coordinator(state: ServerState) -> (CoordinatorHandle, JoinHandle<ServerState>) {
    let (tx, rx) = mpsc::channel(EVENT_QUEUE_CAPACITY);
    let task = tokio::spawn(run(state, rx));
    (CoordinatorHandle { tx }, task)
}

async fn run(mut state: ServerState, mut rx: mpsc::Receiver<SessionEvent>) -> ServerState {
    while let Some(event) = rx.recv().await {
        match event {
            SessionEvent::Connected {
                outbox,
                peer_addr,
                reply,
            } => {
                let id = MessageHandler::handle_connect(&mut state, outbox, peer_addr);
                if reply.send(id).is_err() {
                    // 会话在拿到 id 前已放弃
                    MessageHandler::handle_disconnect(&mut state, id);
                }
            }
            SessionEvent::Command { id, command } => {
                debug!(id, ?command, "处理命令");
                MessageHandler::handle(&mut state, id, command);
            }
            SessionEvent::Disconnected { id } => {
                MessageHandler::handle_disconnect(&mut state, id);
            }
        }
    }

    info!("协调任务退出");
    state
}
