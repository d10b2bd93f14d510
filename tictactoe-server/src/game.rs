//! 对局状态与回合裁决
//!
//! 状态机：Idle -> Playing -> Finished -> Playing（重新开局）

use protocol::rules::{self, Verdict};
use protocol::{Board, ConnectionId, Marker, Position};

use crate::error::MoveRejected;

/// 对局阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// 尚未开局
    Idle,
    /// 对局进行中
    Playing,
    /// 已分出胜负或和棋
    Finished,
}

/// 唯一的权威对局状态
#[derive(Debug, Clone)]
pub struct GameState {
    board: Board,
    /// 当前行动者的座位下标
    turn_index: usize,
    phase: Phase,
}

impl GameState {
    pub fn new() -> Self {
        Self {
            board: Board::empty(),
            turn_index: 0,
            phase: Phase::Idle,
        }
    }

    /// 清空棋盘，从第一位玩家开始新对局
    pub fn reset(&mut self) {
        self.board = Board::empty();
        self.turn_index = 0;
        self.phase = Phase::Playing;
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn turn_index(&self) -> usize {
        self.turn_index
    }

    pub fn is_playing(&self) -> bool {
        self.phase == Phase::Playing
    }

    /// 当前应该行动的玩家；其座位空着时返回 None
    pub fn current_player(&self, seats: &[Option<ConnectionId>]) -> Option<ConnectionId> {
        seats.get(self.turn_index).copied().flatten()
    }

    /// 校验并执行落子
    ///
    /// 成功时返回落子后的判定：胜负或和棋会结束对局且不推进回合，
    /// 否则回合轮到下一个座位。
    pub fn apply_move(
        &mut self,
        seats: &[Option<ConnectionId>],
        mover: ConnectionId,
        marker: &Marker,
        pos: Position,
    ) -> Result<Verdict, MoveRejected> {
        if self.phase != Phase::Playing {
            return Err(MoveRejected::NotPlaying);
        }
        if !seats.contains(&Some(mover)) {
            return Err(MoveRejected::NotAPlayer(mover));
        }
        if seats.iter().any(Option::is_none) {
            return Err(MoveRejected::SeatEmpty);
        }
        if self.current_player(seats) != Some(mover) {
            return Err(MoveRejected::NotYourTurn);
        }
        if !self.board.is_blank(pos) {
            return Err(MoveRejected::CellOccupied);
        }

        self.board.set(pos, Some(marker.clone()));

        let verdict = rules::evaluate(&self.board, marker);
        match verdict {
            Verdict::Win | Verdict::Draw => self.phase = Phase::Finished,
            Verdict::Continue => self.turn_index = (self.turn_index + 1) % seats.len(),
        }
        Ok(verdict)
    }

    /// 把棋盘上的旧符号改写为新符号
    pub fn restamp(&mut self, old: &Marker, new: &Marker) -> usize {
        self.board.restamp(old, new)
    }
}

impl Default for GameState {
    fn default() -> Self {
        Self::new()
    }
}
