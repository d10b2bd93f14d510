//! 协议常量定义

use std::time::Duration;

/// 棋盘边长
pub const BOARD_SIZE: usize = 3;

/// 棋盘格子总数
pub const CELL_COUNT: usize = BOARD_SIZE * BOARD_SIZE;

/// 同一时刻最多的对局玩家数
pub const MAX_PLAYERS: usize = 2;

/// 默认棋子符号（按入座顺序分配）
pub const DEFAULT_MARKERS: [&str; MAX_PLAYERS] = ["x", "o"];

/// 空格子在快照中的表示
pub const BLANK_CELL: &str = " ";

/// 消息分隔符：一次读取可能包含多条逻辑消息
pub const FRAME_SEPARATOR: char = '`';

/// 消息内字段分隔符
pub const FIELD_SEPARATOR: char = '|';

/// 单次读取的最大字节数
pub const MAX_FRAME_SIZE: usize = 1024;

/// 默认监听/连接地址
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// 默认端口
pub const DEFAULT_PORT: u16 = 3333;

/// 连接超时（秒）
pub const CONNECT_TIMEOUT_SECS: u64 = 10;

/// 连接超时 Duration
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(CONNECT_TIMEOUT_SECS);
