//! 胜负判定
//!
//! 只检查刚落子一方的符号：玩家只能在自己的回合获胜。

use crate::board::Board;
use crate::marker::Marker;

/// 八条获胜连线（3 行、3 列、2 条对角线），元素为格子索引
pub const WINNING_LINES: [[usize; 3]; 8] = [
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    [0, 4, 8],
    [2, 4, 6],
];

/// 落子后的局面判定
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// 落子方连成一线
    Win,
    /// 棋盘已满且无人获胜
    Draw,
    /// 对局继续
    Continue,
}

/// 指定符号是否占满任意一条连线
pub fn is_winner(board: &Board, marker: &Marker) -> bool {
    let cells = board.cells();
    WINNING_LINES
        .iter()
        .any(|line| line.iter().all(|&i| cells[i].as_ref() == Some(marker)))
}

/// 判定刚落子的 `marker` 一方之后的局面
pub fn evaluate(board: &Board, marker: &Marker) -> Verdict {
    if is_winner(board, marker) {
        Verdict::Win
    } else if board.is_full() {
        Verdict::Draw
    } else {
        Verdict::Continue
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::marker::Position;

    fn board_from(cells: [&str; 9]) -> Board {
        Board::from_snapshot(&cells.join("|")).unwrap()
    }

    fn marker(s: &str) -> Marker {
        Marker::new(s).unwrap()
    }

    #[test]
    fn test_top_row() {
        let board = board_from(["x", "x", "x", " ", " ", " ", " ", " ", " "]);
        assert!(is_winner(&board, &marker("x")));
        assert!(!is_winner(&board, &marker("o")));
    }

    #[test]
    fn test_every_line() {
        for line in WINNING_LINES {
            let mut board = Board::empty();
            for i in line {
                board.set(Position::from_index(i).unwrap(), Some(marker("o")));
            }
            assert!(is_winner(&board, &marker("o")), "line {:?}", line);
            assert!(!is_winner(&board, &marker("x")));
        }
    }

    #[test]
    fn test_exact_marker_match() {
        // 大小写不同的符号不算同一方
        let board = board_from(["X", "x", "x", " ", " ", " ", " ", " ", " "]);
        assert!(!is_winner(&board, &marker("x")));
    }

    #[test]
    fn test_mixed_line_is_not_win() {
        let board = board_from(["x", "o", "x", " ", "x", " ", "o", " ", "o"]);
        assert!(!is_winner(&board, &marker("x")));
        assert!(!is_winner(&board, &marker("o")));
    }

    #[test]
    fn test_evaluate_draw() {
        let board = board_from(["x", "o", "x", "x", "o", "o", "o", "x", "x"]);
        assert_eq!(evaluate(&board, &marker("x")), Verdict::Draw);
    }

    #[test]
    fn test_win_on_full_board_beats_draw() {
        let board = board_from(["x", "o", "x", "o", "x", "o", "o", "x", "x"]);
        assert_eq!(evaluate(&board, &marker("x")), Verdict::Win);
    }

    #[test]
    fn test_evaluate_continue() {
        let board = board_from(["x", " ", " ", " ", "o", " ", " ", " ", " "]);
        assert_eq!(evaluate(&board, &marker("x")), Verdict::Continue);
    }
}
