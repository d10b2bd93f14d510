//! 棋子符号与坐标定义

use crate::constants::{BOARD_SIZE, CELL_COUNT, FIELD_SEPARATOR, FRAME_SEPARATOR};

/// 棋子符号（"x"、"o" 或玩家自定义的字符串）
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Marker(String);

impl Marker {
    /// 创建符号，去除首尾空白；为空或包含分隔符时返回 None
    pub fn new(symbol: &str) -> Option<Self> {
        let symbol = symbol.trim();
        if symbol.is_empty() || symbol.contains(FIELD_SEPARATOR) || symbol.contains(FRAME_SEPARATOR) {
            return None;
        }
        Some(Self(symbol.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// 忽略大小写比较（用于符号占用检查）
    pub fn eq_ignore_case(&self, other: &Marker) -> bool {
        self.key() == other.key()
    }

    /// 大小写无关的比较键
    pub fn key(&self) -> String {
        self.0.to_lowercase()
    }
}

impl std::fmt::Display for Marker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// 棋盘坐标（x 为列，y 为行，均从 0 开始）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Position {
    pub x: u8,
    pub y: u8,
}

impl Position {
    /// 创建坐标（带边界检查）
    pub fn new(x: u8, y: u8) -> Option<Self> {
        let pos = Self { x, y };
        pos.is_valid().then_some(pos)
    }

    /// 创建坐标（不检查边界）
    pub const fn new_unchecked(x: u8, y: u8) -> Self {
        Self { x, y }
    }

    /// 检查坐标是否在棋盘内
    pub fn is_valid(&self) -> bool {
        (self.x as usize) < BOARD_SIZE && (self.y as usize) < BOARD_SIZE
    }

    /// 转换为格子索引（行优先：y * 3 + x）
    pub fn to_index(&self) -> usize {
        self.y as usize * BOARD_SIZE + self.x as usize
    }

    /// 从格子索引创建坐标
    pub fn from_index(index: usize) -> Option<Self> {
        if index < CELL_COUNT {
            Some(Self {
                x: (index % BOARD_SIZE) as u8,
                y: (index / BOARD_SIZE) as u8,
            })
        } else {
            None
        }
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}
