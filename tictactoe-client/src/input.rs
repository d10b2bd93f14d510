//! 输入解析
//!
//! - `x y`：落子
//! - `/name 名称`：设置名称
//! - 其他非空行：聊天（`!restart` 等子命令由服务器识别）

use thiserror::Error;

use protocol::{ClientCommand, Position, FRAME_SEPARATOR};

const NAME_COMMAND: &str = "/name";

/// 输入错误
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InputError {
    #[error("Cell ({x}, {y}) is outside the board.")]
    OutOfRange { x: i64, y: i64 },

    #[error("Name cannot be blank.")]
    BlankName,
}

/// 把一行输入转换为命令；空行返回 None
pub fn parse_line(line: &str) -> Result<Option<ClientCommand>, InputError> {
    // 反引号是帧分隔符，不能出现在消息里
    let line: String = line.trim().chars().filter(|&c| c != FRAME_SEPARATOR).collect();
    if line.is_empty() {
        return Ok(None);
    }

    if let Some(rest) = line.strip_prefix(NAME_COMMAND) {
        if rest.is_empty() || rest.starts_with(char::is_whitespace) {
            let name = rest.trim();
            if name.is_empty() {
                return Err(InputError::BlankName);
            }
            return Ok(Some(ClientCommand::SetName(name.to_string())));
        }
    }

    if let Some((x, y)) = parse_coordinates(&line) {
        let pos = u8::try_from(x)
            .ok()
            .zip(u8::try_from(y).ok())
            .and_then(|(x, y)| Position::new(x, y))
            .ok_or(InputError::OutOfRange { x, y })?;
        return Ok(Some(ClientCommand::Mark(pos)));
    }

    Ok(Some(ClientCommand::chat(line)))
}

/// 连接后输入的名称转换为握手命令；空白名称沿用服务器分配的默认名
pub fn name_command(line: &str) -> Option<ClientCommand> {
    let name: String = line.trim().chars().filter(|&c| c != FRAME_SEPARATOR).collect();
    (!name.is_empty()).then(|| ClientCommand::SetName(name))
}

fn parse_coordinates(line: &str) -> Option<(i64, i64)> {
    let mut parts = line.split_whitespace();
    match (parts.next(), parts.next(), parts.next()) {
        (Some(x), Some(y), None) => Some((x.parse().ok()?, y.parse().ok()?)),
        _ => None,
    }
}
