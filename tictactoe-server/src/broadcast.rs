//! 广播与通知
//!
//! 投递到已断开的连接会失败，失败被吞掉且不影响其他连接；
//! 断开的连接由它自己的会话在读取失败时注销。

use protocol::{Board, ConnectionId, Marker, ServerEvent};

use crate::registry::ConnectionRegistry;

/// 聊天/公告发给所有连接，返回成功投递数
pub fn broadcast_chat(registry: &ConnectionRegistry, text: impl Into<String>) -> usize {
    broadcast(registry, ServerEvent::Chat(text.into()))
}

/// 棋盘快照发给所有连接
pub fn broadcast_board(registry: &ConnectionRegistry, board: &Board) -> usize {
    broadcast(registry, ServerEvent::Board(board.clone()))
}

/// 向每位玩家发送自己是否获胜
pub fn notify_outcome(registry: &ConnectionRegistry, winning_marker: &Marker) -> usize {
    registry
        .players()
        .filter(|conn| {
            let won = conn.marker.as_ref() == Some(winning_marker);
            conn.deliver(ServerEvent::Outcome { won })
        })
        .count()
}

/// 只发给单个连接的聊天
pub fn send_chat(registry: &ConnectionRegistry, id: ConnectionId, text: impl Into<String>) -> bool {
    send_to(registry, id, ServerEvent::Chat(text.into()))
}

/// 发给单个连接
pub fn send_to(registry: &ConnectionRegistry, id: ConnectionId, event: ServerEvent) -> bool {
    registry
        .find_by_id(id)
        .is_some_and(|conn| conn.deliver(event))
}

fn broadcast(registry: &ConnectionRegistry, event: ServerEvent) -> usize {
    registry
        .all()
        .filter(|conn| conn.deliver(event.clone()))
        .count()
}
