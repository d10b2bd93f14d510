//! 服务端规则错误
//!
//! 这些错误从不回送给客户端：调用方记录日志后直接丢弃命令。

use protocol::{ConnectionId, Marker};
use thiserror::Error;

/// 落子被拒绝的原因
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MoveRejected {
    /// 当前没有进行中的对局
    #[error("No game in progress")]
    NotPlaying,

    /// 发送方不是对局玩家
    #[error("Connection {0} is not a player")]
    NotAPlayer(ConnectionId),

    /// 座位未坐满，对局暂停
    #[error("Waiting for a second player")]
    SeatEmpty,

    /// 不是你的回合
    #[error("Not your turn")]
    NotYourTurn,

    /// 目标格子已被占用
    #[error("Cell is already occupied")]
    CellOccupied,
}

/// 更换符号失败的原因
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MarkerError {
    /// 符号已被其他玩家持有（忽略大小写）
    #[error("Marker '{0}' is already in use")]
    InUse(Marker),

    /// 符号为空或包含分隔符
    #[error("Invalid marker: {0:?}")]
    Invalid(String),

    /// 观众不能持有符号
    #[error("Connection {0} is not a player")]
    NotAPlayer(ConnectionId),
}

/// 改名失败的原因
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RenameError {
    /// 名称为空白
    #[error("Name is blank")]
    Blank,

    /// 名称已被其他连接使用
    #[error("Name '{0}' is already in use")]
    InUse(String),
}
