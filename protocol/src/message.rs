//! 消息类型定义与文本编解码
//!
//! 每条逻辑消息形如 `TAG|payload`，多条消息以反引号分隔后可合并在同一次读写中。

use crate::board::Board;
use crate::constants::{FIELD_SEPARATOR, FRAME_SEPARATOR};
use crate::error::{ProtocolError, Result};
use crate::marker::Position;

/// 连接 ID（接受连接时单调递增分配）
pub type ConnectionId = u64;

const TAG_SET_NAME: &str = "SET_NAME|";
const TAG_CHAT: &str = "CHAT|";
const TAG_MARK: &str = "MARK|";
const TAG_WINNER: &str = "WINNER|";

const CMD_RESTART: &str = "!restart";
const CMD_SET_NAME: &str = "!setname ";
const CMD_SET_MARKER: &str = "!setmarker ";

/// 可在线路上传输的消息
pub trait WireMessage: Sized {
    /// 编码为单条逻辑消息（不含分隔符）
    fn encode(&self) -> String;

    /// 从单条逻辑消息解码
    fn decode(message: &str) -> Result<Self>;
}

/// 聊天中夹带的子命令
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatAction {
    /// 重新开局
    Restart,
    /// 改名
    SetName(String),
    /// 更换棋子符号
    SetMarker(String),
}

impl ChatAction {
    /// 解析聊天文本中的子命令（大小写不敏感）
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim_end();
        if text.eq_ignore_ascii_case(CMD_RESTART) {
            return Some(ChatAction::Restart);
        }
        if let Some(rest) = strip_prefix_ignore_case(text, CMD_SET_NAME) {
            return Some(ChatAction::SetName(rest.to_string()));
        }
        if let Some(rest) = strip_prefix_ignore_case(text, CMD_SET_MARKER) {
            return Some(ChatAction::SetMarker(rest.to_string()));
        }
        None
    }
}

fn strip_prefix_ignore_case<'a>(text: &'a str, prefix: &str) -> Option<&'a str> {
    let head = text.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix).then(|| &text[prefix.len()..])
}

/// 客户端发送给服务端的命令
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientCommand {
    /// 设置显示名称
    SetName(String),
    /// 聊天（可能夹带子命令）
    Chat {
        text: String,
        action: Option<ChatAction>,
    },
    /// 落子
    Mark(Position),
}

impl ClientCommand {
    /// 构造聊天命令，同时解析子命令
    pub fn chat(text: impl Into<String>) -> Self {
        let text = text.into();
        let action = ChatAction::parse(&text);
        ClientCommand::Chat { text, action }
    }
}

impl WireMessage for ClientCommand {
    fn encode(&self) -> String {
        match self {
            ClientCommand::SetName(name) => format!("{TAG_SET_NAME}{name}"),
            ClientCommand::Chat { text, .. } => format!("{TAG_CHAT}{text}"),
            ClientCommand::Mark(pos) => format!("{TAG_MARK}{}{FIELD_SEPARATOR}{}", pos.x, pos.y),
        }
    }

    fn decode(message: &str) -> Result<Self> {
        let message = message.trim_end_matches(['\r', '\n']);

        if let Some(name) = message.strip_prefix(TAG_SET_NAME) {
            Ok(ClientCommand::SetName(name.to_string()))
        } else if let Some(text) = message.strip_prefix(TAG_CHAT) {
            Ok(ClientCommand::chat(text))
        } else if let Some(payload) = message.strip_prefix(TAG_MARK) {
            decode_mark(payload).map(ClientCommand::Mark)
        } else {
            Err(ProtocolError::UnknownCommand(message.to_string()))
        }
    }
}

fn decode_mark(payload: &str) -> Result<Position> {
    let malformed = || ProtocolError::MalformedMark(payload.to_string());

    let mut parts = payload.split(FIELD_SEPARATOR);
    let (Some(x), Some(y), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(malformed());
    };
    let x: i64 = x.trim().parse().map_err(|_| malformed())?;
    let y: i64 = y.trim().parse().map_err(|_| malformed())?;

    u8::try_from(x)
        .ok()
        .zip(u8::try_from(y).ok())
        .and_then(|(x, y)| Position::new(x, y))
        .ok_or(ProtocolError::CellOutOfRange { x, y })
}

/// 服务端发送给客户端的事件
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerEvent {
    /// 聊天/系统公告
    Chat(String),
    /// 完整棋盘快照
    Board(Board),
    /// 胜负通知（仅发给对局玩家）
    Outcome { won: bool },
}

impl WireMessage for ServerEvent {
    fn encode(&self) -> String {
        match self {
            ServerEvent::Chat(text) => format!("{TAG_CHAT}{text}"),
            ServerEvent::Board(board) => format!("{TAG_MARK}{}", board.to_snapshot()),
            ServerEvent::Outcome { won } => format!("{TAG_WINNER}{}", if *won { "1" } else { "0" }),
        }
    }

    fn decode(message: &str) -> Result<Self> {
        if let Some(text) = message.strip_prefix(TAG_CHAT) {
            Ok(ServerEvent::Chat(text.to_string()))
        } else if let Some(snapshot) = message.strip_prefix(TAG_MARK) {
            Board::from_snapshot(snapshot).map(ServerEvent::Board)
        } else if let Some(flag) = message.strip_prefix(TAG_WINNER) {
            match flag {
                "1" => Ok(ServerEvent::Outcome { won: true }),
                "0" => Ok(ServerEvent::Outcome { won: false }),
                other => Err(ProtocolError::InvalidOutcome(other.to_string())),
            }
        } else {
            Err(ProtocolError::UnknownCommand(message.to_string()))
        }
    }
}

/// 把一次读取到的文本拆分为逻辑消息，丢弃空片段
pub fn split_frame(frame: &str) -> impl Iterator<Item = &str> {
    frame.split(FRAME_SEPARATOR).filter(|m| !m.is_empty())
}

/// 编码一组消息，每条前加分隔符
pub fn encode_frame<'a, M, I>(messages: I) -> String
where
    M: WireMessage + 'a,
    I: IntoIterator<Item = &'a M>,
{
    let mut frame = String::new();
    for msg in messages {
        frame.push(FRAME_SEPARATOR);
        frame.push_str(&msg.encode());
    }
    frame
}
