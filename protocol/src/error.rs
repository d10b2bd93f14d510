//! 错误类型定义

use thiserror::Error;

/// 协议错误类型
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// IO 错误
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// 未知命令前缀
    #[error("Unknown command: {0:?}")]
    UnknownCommand(String),

    /// 落子坐标无法解析
    #[error("Malformed mark payload: {0:?}")]
    MalformedMark(String),

    /// 落子坐标越界
    #[error("Cell out of range: ({x}, {y})")]
    CellOutOfRange { x: i64, y: i64 },

    /// 棋盘快照格式错误
    #[error("Invalid board snapshot: expected {expected} cells, got {actual}")]
    InvalidSnapshot { expected: usize, actual: usize },

    /// 胜负标记不是 0/1
    #[error("Invalid outcome flag: {0:?}")]
    InvalidOutcome(String),

    /// 连接超时
    #[error("Connection timeout")]
    ConnectionTimeout,

    /// 连接已关闭
    #[error("Connection closed")]
    ConnectionClosed,
}

/// 启动参数错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// 端口不是合法数字
    #[error("Invalid port: {0:?}")]
    InvalidPort(String),

    /// 参数过多
    #[error("Too many arguments: expected at most 2, got {0}")]
    TooManyArguments(usize),
}

/// 协议操作结果类型
pub type Result<T> = std::result::Result<T, ProtocolError>;
