//! 服务器连接
//!
//! 使用 protocol 库的传输层抽象

use tracing::info;

use protocol::{ClientCommand, Connection, Connector, ServerEvent, TcpConnection, TcpConnector};

/// 与服务器的连接
pub struct ServerConnection {
    conn: TcpConnection,
}

impl ServerConnection {
    /// 连接到服务器
    pub async fn connect(addr: &str) -> protocol::Result<Self> {
        let conn = TcpConnector.connect(addr).await?;
        info!(addr, peer = conn.peer_addr().as_deref().unwrap_or("?"), "已连接服务器");
        Ok(Self { conn })
    }

    /// 发送命令
    pub async fn send(&mut self, cmd: &ClientCommand) -> protocol::Result<()> {
        self.conn.send(cmd).await
    }

    /// 接收一帧中的全部事件（连接关闭时返回 `ConnectionClosed`）
    pub async fn recv(&mut self) -> protocol::Result<Vec<ServerEvent>> {
        self.conn.recv().await
    }

    /// 关闭写端
    pub async fn close(&mut self) -> protocol::Result<()> {
        self.conn.close().await
    }
}
