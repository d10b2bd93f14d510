//! 服务器主逻辑
//!
//! `MessageHandler` 的所有方法都在协调任务中同步执行：一次调用内的
//! 读、改、广播对其他连接来说是原子的。

use tracing::{debug, info};

use protocol::{ChatAction, ClientCommand, ConnectionId, Position, ServerEvent, Verdict, MAX_PLAYERS};

use crate::broadcast::{broadcast_board, broadcast_chat, notify_outcome, send_chat, send_to};
use crate::error::{MarkerError, RenameError};
use crate::game::GameState;
use crate::registry::{ConnectionRegistry, Outbox};

/// 服务器状态：唯一的一张桌子
#[derive(Debug, Default)]
pub struct ServerState {
    pub registry: ConnectionRegistry,
    pub game: GameState,
}

impl ServerState {
    pub fn new() -> Self {
        Self::default()
    }

    fn name_of(&self, id: ConnectionId) -> String {
        self.registry.name_of(id).unwrap_or("Unknown").to_string()
    }
}

/// 消息处理器
pub struct MessageHandler;

impl MessageHandler {
    /// 处理新连接：登记、分配角色，必要时开局
    pub fn handle_connect(state: &mut ServerState, outbox: Outbox, peer_addr: Option<String>) -> ConnectionId {
        let id = state.registry.register(outbox, peer_addr.clone());
        info!(id, peer = peer_addr.as_deref().unwrap_or("?"), "客户端已连接");

        let promoted = state.registry.promote_to_player(id).is_some();

        if state.registry.player_count() < MAX_PLAYERS {
            broadcast_chat(&state.registry, "Waiting for another player...");
        } else if !promoted {
            // 观众加入时补发当前棋盘
            send_to(&state.registry, id, ServerEvent::Board(state.game.board().clone()));
        } else if state.game.is_playing() {
            Self::resume_game(state);
        } else {
            Self::reset_board(state);
        }

        id
    }

    /// 处理客户端命令；不合法的命令直接忽略
    pub fn handle(state: &mut ServerState, id: ConnectionId, cmd: ClientCommand) {
        if state.registry.find_by_id(id).is_none() {
            debug!(id, "忽略未登记连接的命令");
            return;
        }

        match cmd {
            ClientCommand::SetName(name) => Self::handle_set_name(state, id, &name),
            ClientCommand::Chat { text, action } => Self::handle_chat(state, id, &text, action),
            ClientCommand::Mark(pos) => Self::handle_mark(state, id, pos),
        }
    }

    /// 处理断线：注销连接、释放符号、通知其他人
    pub fn handle_disconnect(state: &mut ServerState, id: ConnectionId) {
        let hold_marker = state.game.is_playing();
        let Some(departure) = state.registry.unregister(id, hold_marker) else {
            return;
        };

        // 棋盘和回合保持不变，空座位连同符号等待新连接
        info!(
            id,
            name = %departure.connection.name,
            peer = departure.connection.peer_addr.as_deref().unwrap_or("?"),
            seat = ?departure.seat,
            "客户端已断开"
        );
        broadcast_chat(
            &state.registry,
            format!("{} has disconnected.", departure.connection.name),
        );
    }

    /// 处理握手改名
    fn handle_set_name(state: &mut ServerState, id: ConnectionId, name: &str) {
        if state.registry.rename(id, name).is_none() {
            debug!(id, "忽略空白名称");
            return;
        }
        broadcast_chat(&state.registry, format!("{} has connected.", state.name_of(id)));
    }

    /// 处理聊天及其子命令
    fn handle_chat(state: &mut ServerState, id: ConnectionId, text: &str, action: Option<ChatAction>) {
        broadcast_chat(&state.registry, format!("{}: {}", state.name_of(id), text));

        match action {
            Some(ChatAction::Restart) => Self::handle_restart(state, id),
            Some(ChatAction::SetName(name)) => Self::handle_rename(state, id, &name),
            Some(ChatAction::SetMarker(symbol)) => Self::handle_set_marker(state, id, &symbol),
            None => {}
        }
    }

    /// 处理 `!restart`
    fn handle_restart(state: &mut ServerState, id: ConnectionId) {
        let is_player = state.registry.find_by_id(id).is_some_and(|c| c.is_player());
        if !is_player {
            debug!(id, "观众不能重新开局");
            return;
        }
        if state.registry.player_count() < MAX_PLAYERS {
            debug!(id, "玩家不足，无法开局");
            return;
        }
        if state.game.is_playing() {
            debug!(id, "对局进行中，忽略重新开局");
            return;
        }
        Self::reset_board(state);
    }

    /// 处理 `!setname`
    fn handle_rename(state: &mut ServerState, id: ConnectionId, name: &str) {
        match state.registry.rename_unique(id, name) {
            Ok(old) => {
                broadcast_chat(
                    &state.registry,
                    format!("{} has changed their name to {}.", old, name),
                );
            }
            Err(RenameError::InUse(name)) => {
                send_chat(&state.registry, id, format!("The name '{}' is already in use.", name));
            }
            Err(RenameError::Blank) => debug!(id, "忽略空白名称"),
        }
    }

    /// 处理 `!setmarker`
    fn handle_set_marker(state: &mut ServerState, id: ConnectionId, symbol: &str) {
        match state.registry.set_marker(id, symbol) {
            Ok((old, new)) => {
                broadcast_chat(
                    &state.registry,
                    format!("{} has changed their marker to {}.", state.name_of(id), new),
                );
                if state.game.is_playing() {
                    state.game.restamp(&old, &new);
                    broadcast_board(&state.registry, state.game.board());
                }
            }
            Err(MarkerError::InUse(marker)) => {
                send_chat(&state.registry, id, format!("The marker '{}' is already in use.", marker));
            }
            Err(MarkerError::Invalid(symbol)) => {
                send_chat(
                    &state.registry,
                    id,
                    format!("The marker '{}' is not allowed.", symbol.trim()),
                );
            }
            Err(e @ MarkerError::NotAPlayer(_)) => debug!(id, error = %e, "忽略更换符号"),
        }
    }

    /// 处理落子
    fn handle_mark(state: &mut ServerState, id: ConnectionId, pos: Position) {
        let Some(marker) = state
            .registry
            .find_by_id(id)
            .filter(|c| c.is_player())
            .and_then(|c| c.marker.clone())
        else {
            debug!(id, "观众不能落子");
            return;
        };

        let verdict = match state.game.apply_move(state.registry.seats(), id, &marker, pos) {
            Ok(verdict) => verdict,
            Err(e) => {
                debug!(id, %pos, error = %e, "忽略落子");
                return;
            }
        };

        broadcast_board(&state.registry, state.game.board());

        match verdict {
            Verdict::Win => {
                let name = state.name_of(id);
                info!(id, name = %name, "玩家获胜");
                broadcast_chat(
                    &state.registry,
                    format!("{} wins!\nType !restart to play again.", name),
                );
                notify_outcome(&state.registry, &marker);
            }
            Verdict::Draw => {
                info!("和棋");
                broadcast_chat(&state.registry, "It's a draw! Type !restart to play again.");
            }
            Verdict::Continue => Self::announce_turn(state),
        }
    }

    /// 重新开局并通知所有人
    fn reset_board(state: &mut ServerState) {
        state.game.reset();
        broadcast_board(&state.registry, state.game.board());

        if let Some(first) = state.game.current_player(state.registry.seats()) {
            broadcast_chat(
                &state.registry,
                format!("Game has started. {} is first.", state.name_of(first)),
            );
        }
        info!("棋盘已重置");
    }

    /// 空座被补上后继续暂停的对局
    fn resume_game(state: &mut ServerState) {
        broadcast_board(&state.registry, state.game.board());
        Self::announce_turn(state);
        info!("对局继续");
    }

    fn announce_turn(state: &ServerState) {
        if let Some(next) = state.game.current_player(state.registry.seats()) {
            broadcast_chat(&state.registry, format!("{}'s turn.", state.name_of(next)));
        }
    }
}
