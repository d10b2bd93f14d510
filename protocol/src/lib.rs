//! 井字棋共享协议库
//!
//! 包含:
//! - 棋盘、符号、坐标等核心数据结构
//! - 胜负判定
//! - 消息类型定义 (ClientCommand, ServerEvent) 与文本编解码
//! - 传输层抽象 (Connector, Connection, Listener traits)
//! - 帧读写 (FrameReader, FrameWriter)
//! - 网络配置

mod board;
mod config;
mod constants;
mod error;
mod marker;
mod message;
pub mod rules;
mod transport;

pub use board::Board;
pub use config::NetworkConfig;
pub use constants::*;
pub use error::{ConfigError, ProtocolError, Result};
pub use marker::{Marker, Position};
pub use message::{
    encode_frame, split_frame, ChatAction, ClientCommand, ConnectionId, ServerEvent, WireMessage,
};
pub use rules::Verdict;
pub use transport::{
    Connection, Connector, FrameReader, FrameWriter, Listener, TcpConnection, TcpConnector,
    TcpListener,
};
