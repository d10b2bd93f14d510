//! 棋盘状态

use crate::constants::{BLANK_CELL, CELL_COUNT, FIELD_SEPARATOR};
use crate::error::{ProtocolError, Result};
use crate::marker::{Marker, Position};

/// 3x3 棋盘，索引为 y * 3 + x
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    cells: [Option<Marker>; CELL_COUNT],
}

impl Board {
    /// 创建空棋盘
    pub fn empty() -> Self {
        Self {
            cells: std::array::from_fn(|_| None),
        }
    }

    /// 获取指定位置的符号
    pub fn get(&self, pos: Position) -> Option<&Marker> {
        if pos.is_valid() {
            self.cells[pos.to_index()].as_ref()
        } else {
            None
        }
    }

    /// 设置指定位置的符号
    pub fn set(&mut self, pos: Position, marker: Option<Marker>) {
        if pos.is_valid() {
            self.cells[pos.to_index()] = marker;
        }
    }

    /// 指定位置是否为空
    pub fn is_blank(&self, pos: Position) -> bool {
        pos.is_valid() && self.cells[pos.to_index()].is_none()
    }

    /// 按索引访问全部格子
    pub fn cells(&self) -> &[Option<Marker>] {
        &self.cells
    }

    /// 已落子的格子数
    pub fn occupied_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_some()).count()
    }

    /// 棋盘是否已满
    pub fn is_full(&self) -> bool {
        self.cells.iter().all(Option::is_some)
    }

    /// 把所有 `old` 符号改写为 `new`，返回改写的格子数
    pub fn restamp(&mut self, old: &Marker, new: &Marker) -> usize {
        let mut count = 0;
        for cell in self.cells.iter_mut().flatten() {
            if *cell == *old {
                *cell = new.clone();
                count += 1;
            }
        }
        count
    }

    /// 序列化为快照：9 个格子以 `|` 连接，空格子为一个空格
    pub fn to_snapshot(&self) -> String {
        let separator = FIELD_SEPARATOR.to_string();
        self.cells
            .iter()
            .map(|c| c.as_ref().map_or(BLANK_CELL, Marker::as_str))
            .collect::<Vec<_>>()
            .join(separator.as_str())
    }

    /// 从快照解析
    pub fn from_snapshot(snapshot: &str) -> Result<Self> {
        let parts: Vec<&str> = snapshot.split(FIELD_SEPARATOR).collect();
        if parts.len() != CELL_COUNT {
            return Err(ProtocolError::InvalidSnapshot {
                expected: CELL_COUNT,
                actual: parts.len(),
            });
        }
        Ok(Self {
            cells: std::array::from_fn(|i| Marker::new(parts[i])),
        })
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::empty()
    }
}

impl std::fmt::Display for Board {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_snapshot())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn marker(s: &str) -> Marker {
        Marker::new(s).unwrap()
    }

    #[test]
    fn test_empty_board() {
        let board = Board::empty();
        assert_eq!(board.occupied_count(), 0);
        assert!(!board.is_full());
        assert!(board.is_blank(Position::new_unchecked(1, 1)));
        assert_eq!(board.to_snapshot(), " | | | | | | | | ");
    }

    #[test]
    fn test_set_and_get() {
        let mut board = Board::empty();
        let pos = Position::new_unchecked(2, 1);
        board.set(pos, Some(marker("x")));

        assert_eq!(board.get(pos), Some(&marker("x")));
        assert_eq!(board.cells()[5], Some(marker("x")));
        assert!(!board.is_blank(pos));
        assert_eq!(board.occupied_count(), 1);
    }

    #[test]
    fn test_out_of_range_is_ignored() {
        let mut board = Board::empty();
        board.set(Position::new_unchecked(3, 0), Some(marker("x")));
        assert_eq!(board, Board::empty());
        assert!(!board.is_blank(Position::new_unchecked(3, 0)));
    }

    #[test]
    fn test_restamp() {
        let mut board = Board::empty();
        board.set(Position::new_unchecked(0, 0), Some(marker("x")));
        board.set(Position::new_unchecked(1, 0), Some(marker("o")));
        board.set(Position::new_unchecked(2, 2), Some(marker("x")));

        let changed = board.restamp(&marker("x"), &marker("y"));
        assert_eq!(changed, 2);
        assert_eq!(board.to_snapshot(), "y|o| | | | | | |y");
    }

    #[test]
    fn test_snapshot_round_trip() {
        let mut board = Board::empty();
        board.set(Position::new_unchecked(0, 0), Some(marker("x")));
        board.set(Position::new_unchecked(1, 1), Some(marker("star")));
        board.set(Position::new_unchecked(2, 2), Some(marker("o")));

        let snapshot = board.to_snapshot();
        assert_eq!(snapshot, "x| | | |star| | | |o");
        assert_eq!(Board::from_snapshot(&snapshot).unwrap(), board);
    }

    #[test]
    fn test_snapshot_wrong_length() {
        let result = Board::from_snapshot("x|o");
        assert!(matches!(
            result,
            Err(ProtocolError::InvalidSnapshot { expected: 9, actual: 2 })
        ));
        let result = Board::from_snapshot("x| | | | | | | | |o");
        assert!(matches!(
            result,
            Err(ProtocolError::InvalidSnapshot { expected: 9, actual: 10 })
        ));
    }

    #[test]
    fn test_parsed_board_always_has_nine_cells() {
        let board = Board::from_snapshot(" | |x| | | | | | ").unwrap();
        assert_eq!(board.cells().len(), CELL_COUNT);
        assert_eq!(board.occupied_count(), 1);
        assert!(!crate::rules::is_winner(&board, &marker("x")));
    }
}
