//! 终端渲染

use protocol::{Board, Position, ServerEvent, BOARD_SIZE};

/// 把棋盘渲染为带坐标的 3×3 网格，列为 x，行为 y
pub fn render_board(board: &Board) -> String {
    let mut out = String::from("   0   1   2\n");
    for y in 0..BOARD_SIZE as u8 {
        if y > 0 {
            out.push_str("  ---+---+---\n");
        }
        let cells: Vec<String> = (0..BOARD_SIZE as u8)
            .map(|x| {
                let marker = board
                    .get(Position::new_unchecked(x, y))
                    .map_or(" ", |m| m.as_str());
                format!(" {marker} ")
            })
            .collect();
        out.push_str(&format!("{y} {}\n", cells.join("|")));
    }
    out
}

/// 把服务器事件渲染为要打印的文本
pub fn render_event(event: &ServerEvent) -> String {
    match event {
        ServerEvent::Chat(text) => text.clone(),
        ServerEvent::Board(board) => render_board(board),
        ServerEvent::Outcome { won: true } => "You win!".to_string(),
        ServerEvent::Outcome { won: false } => "You lose.".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_board() {
        let board = Board::from_snapshot("x| | | |o| | | |x").unwrap();
        let expected = "   0   1   2\n\
                        0  x |   |   \n  \
                        ---+---+---\n\
                        1    | o |   \n  \
                        ---+---+---\n\
                        2    |   | x \n";
        assert_eq!(render_board(&board), expected);
    }

    #[test]
    fn test_render_events() {
        assert_eq!(render_event(&ServerEvent::Chat("hi".to_string())), "hi");
        assert_eq!(render_event(&ServerEvent::Outcome { won: true }), "You win!");
        assert_eq!(render_event(&ServerEvent::Outcome { won: false }), "You lose.");
    }
}
