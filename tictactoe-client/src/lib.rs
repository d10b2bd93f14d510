//! 井字棋终端客户端
//!
//! 从标准输入读取命令发往服务器，把服务器消息渲染到终端。

pub mod input;
pub mod network;
pub mod render;

pub use input::{name_command, parse_line, InputError};
pub use network::ServerConnection;
pub use render::{render_board, render_event};
