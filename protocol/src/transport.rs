//! 传输层抽象
//!
//! 提供 Connector/Connection/Listener traits 使上层协议与具体传输实现解耦。
//! 线路上每次读取得到的文本视为一帧，帧内以反引号分隔多条逻辑消息。

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::debug;

use crate::error::{ProtocolError, Result};
use crate::message::{encode_frame, split_frame, WireMessage};
use crate::{CONNECT_TIMEOUT, MAX_FRAME_SIZE};

/// 连接抽象 trait（核心抽象，用于业务层）
#[async_trait]
pub trait Connection: Send + Sync {
    /// 发送消息
    async fn send<M: WireMessage + Send + Sync>(&mut self, msg: &M) -> Result<()>;

    /// 接收一帧中的全部消息
    async fn recv<M: WireMessage + Send>(&mut self) -> Result<Vec<M>>;

    /// 关闭连接
    async fn close(&mut self) -> Result<()>;

    /// 获取远端地址
    fn peer_addr(&self) -> Option<String>;
}

/// 连接器 trait（客户端使用）
#[async_trait]
pub trait Connector: Send + Sync {
    type Conn: Connection;

    /// 建立连接
    async fn connect(&self, addr: &str) -> Result<Self::Conn>;
}

/// 监听器 trait（服务端使用）
#[async_trait]
pub trait Listener: Send + Sync + Sized {
    type Conn: Connection;

    /// 绑定地址
    async fn bind(addr: &str) -> Result<Self>;

    /// 接受连接
    async fn accept(&mut self) -> Result<Self::Conn>;

    /// 获取本地地址
    fn local_addr(&self) -> Option<String>;
}

// ============================================================================
// TCP 实现
// ============================================================================

/// TCP 连接器
pub struct TcpConnector;

#[async_trait]
impl Connector for TcpConnector {
    type Conn = TcpConnection;

    async fn connect(&self, addr: &str) -> Result<Self::Conn> {
        let stream = timeout(CONNECT_TIMEOUT, TcpStream::connect(addr))
            .await
            .map_err(|_| ProtocolError::ConnectionTimeout)?
            .map_err(ProtocolError::Io)?;

        TcpConnection::from_stream(stream)
    }
}

/// TCP 连接
pub struct TcpConnection {
    reader: FrameReader<OwnedReadHalf>,
    writer: FrameWriter<OwnedWriteHalf>,
    peer_addr: Option<String>,
}

impl TcpConnection {
    /// 从 TcpStream 创建
    pub fn from_stream(stream: TcpStream) -> Result<Self> {
        stream.set_nodelay(true)?;
        let peer_addr = stream.peer_addr().ok().map(|a| a.to_string());
        let (read_half, write_half) = stream.into_split();

        Ok(Self {
            reader: FrameReader::new(read_half),
            writer: FrameWriter::new(write_half),
            peer_addr,
        })
    }

    /// 分离读写端
    pub fn split(self) -> (FrameReader<OwnedReadHalf>, FrameWriter<OwnedWriteHalf>) {
        (self.reader, self.writer)
    }
}

#[async_trait]
impl Connection for TcpConnection {
    async fn send<M: WireMessage + Send + Sync>(&mut self, msg: &M) -> Result<()> {
        self.writer.send(msg).await
    }

    async fn recv<M: WireMessage + Send>(&mut self) -> Result<Vec<M>> {
        self.reader.read_frame().await
    }

    async fn close(&mut self) -> Result<()> {
        self.writer.shutdown().await
    }

    fn peer_addr(&self) -> Option<String> {
        self.peer_addr.clone()
    }
}

/// TCP 监听器
pub struct TcpListener {
    listener: tokio::net::TcpListener,
}

#[async_trait]
impl Listener for TcpListener {
    type Conn = TcpConnection;

    async fn bind(addr: &str) -> Result<Self> {
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(ProtocolError::Io)?;
        Ok(Self { listener })
    }

    async fn accept(&mut self) -> Result<Self::Conn> {
        let (stream, _addr) = self.listener.accept().await.map_err(ProtocolError::Io)?;
        TcpConnection::from_stream(stream)
    }

    fn local_addr(&self) -> Option<String> {
        self.listener.local_addr().ok().map(|a| a.to_string())
    }
}

// ============================================================================
// 帧编解码
// ============================================================================

/// 帧读取器
pub struct FrameReader<R> {
    reader: R,
    buffer: Vec<u8>,
    /// 上一帧末尾未完整的 UTF-8 字节
    pending: Vec<u8>,
}

impl<R: AsyncRead + Unpin + Send> FrameReader<R> {
    /// 创建新的帧读取器
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buffer: vec![0; MAX_FRAME_SIZE],
            pending: Vec::new(),
        }
    }

    /// 读取一帧原始文本（读到 0 字节视为连接关闭）
    pub async fn read_text(&mut self) -> Result<String> {
        let n = self.reader.read(&mut self.buffer).await?;
        if n == 0 {
            return Err(ProtocolError::ConnectionClosed);
        }

        let mut bytes = std::mem::take(&mut self.pending);
        bytes.extend_from_slice(&self.buffer[..n]);

        match String::from_utf8(bytes) {
            Ok(text) => Ok(text),
            Err(e) => {
                let utf8 = e.utf8_error();
                let mut bytes = e.into_bytes();
                if utf8.error_len().is_none() {
                    // 多字节字符被截断在帧尾，留到下一帧
                    self.pending = bytes.split_off(utf8.valid_up_to());
                }
                Ok(String::from_utf8_lossy(&bytes).into_owned())
            }
        }
    }

    /// 读取并解码一帧中的全部消息，无法解码的消息被丢弃
    pub async fn read_frame<M: WireMessage>(&mut self) -> Result<Vec<M>> {
        let text = self.read_text().await?;
        let messages = split_frame(&text)
            .filter_map(|raw| match M::decode(raw) {
                Ok(msg) => Some(msg),
                Err(e) => {
                    debug!(error = %e, "忽略无法解析的消息");
                    None
                }
            })
            .collect();
        Ok(messages)
    }
}

/// 帧写入器
pub struct FrameWriter<W> {
    writer: W,
}

impl<W: AsyncWrite + Unpin + Send> FrameWriter<W> {
    /// 创建新的帧写入器
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// 编码并写入一组消息（合并为一帧）
    pub async fn write_frame<M: WireMessage>(&mut self, messages: &[M]) -> Result<()> {
        if messages.is_empty() {
            return Ok(());
        }
        let frame = encode_frame(messages);
        self.writer.write_all(frame.as_bytes()).await?;
        self.writer.flush().await?;
        Ok(())
    }

    /// 发送单条消息
    pub async fn send<M: WireMessage>(&mut self, msg: &M) -> Result<()> {
        self.write_frame(std::slice::from_ref(msg)).await
    }

    /// 关闭写端
    pub async fn shutdown(&mut self) -> Result<()> {
        self.writer.shutdown().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{ClientCommand, ServerEvent};
    use crate::{Board, Position};

    #[tokio::test]
    async fn test_tcp_connection() {
        // 启动监听
        let mut listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        // 客户端连接
        let client_handle = tokio::spawn(async move {
            let connector = TcpConnector;
            let mut conn = connector.connect(&addr).await.unwrap();

            conn.send(&ClientCommand::Mark(Position::new_unchecked(1, 1)))
                .await
                .unwrap();

            let events: Vec<ServerEvent> = conn.recv().await.unwrap();
            assert_eq!(events, vec![ServerEvent::Board(Board::empty())]);
        });

        // 服务端接受连接
        let mut conn = listener.accept().await.unwrap();
        assert!(conn.peer_addr().is_some());

        let commands: Vec<ClientCommand> = conn.recv().await.unwrap();
        assert_eq!(commands, vec![ClientCommand::Mark(Position::new_unchecked(1, 1))]);

        conn.send(&ServerEvent::Board(Board::empty())).await.unwrap();

        client_handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_reader_splits_and_skips_garbage() {
        let input: &[u8] = b"CHAT|hi`BOGUS|1`MARK|0|2";
        let mut reader = FrameReader::new(input);

        let commands: Vec<ClientCommand> = reader.read_frame().await.unwrap();
        assert_eq!(
            commands,
            vec![
                ClientCommand::chat("hi"),
                ClientCommand::Mark(Position::new_unchecked(0, 2)),
            ]
        );

        // 输入耗尽后视为连接关闭
        let closed = reader.read_frame::<ClientCommand>().await;
        assert!(matches!(closed, Err(ProtocolError::ConnectionClosed)));
    }

    #[tokio::test]
    async fn test_reader_keeps_split_utf8() {
        let (mut client, server) = tokio::io::duplex(64);
        let mut reader = FrameReader::new(server);

        // "é" = 0xC3 0xA9，拆在两次写入之间
        client.write_all(b"CHAT|caf\xC3").await.unwrap();
        let first = reader.read_text().await.unwrap();
        assert_eq!(first, "CHAT|caf");

        client.write_all(b"\xA9").await.unwrap();
        let second = reader.read_text().await.unwrap();
        assert_eq!(second, "é");
    }

    #[tokio::test]
    async fn test_writer_packs_frame() {
        let mut out = Vec::new();
        {
            let mut writer = FrameWriter::new(&mut out);
            writer
                .write_frame(&[
                    ServerEvent::Chat("a".to_string()),
                    ServerEvent::Outcome { won: true },
                ])
                .await
                .unwrap();
        }
        assert_eq!(out, b"`CHAT|a`WINNER|1");
    }
}
