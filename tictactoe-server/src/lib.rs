//! 井字棋服务端
//!
//! 包含:
//! - 连接登记与角色分配
//! - 对局控制
//! - 符号分配
//! - 协调任务与连接会话
//! - 监听接入

pub mod broadcast;
pub mod coordinator;
pub mod error;
pub mod game;
pub mod listener;
pub mod markers;
pub mod registry;
pub mod server;
pub mod session;

pub use coordinator::{spawn_coordinator, CoordinatorHandle, SessionEvent};
pub use error::{MarkerError, MoveRejected, RenameError};
pub use game::{GameState, Phase};
pub use listener::{start_server, ServerHandle};
pub use markers::MarkerPool;
pub use registry::{Connection, ConnectionRegistry, Departure, Outbox, Role, Seats};
pub use server::{MessageHandler, ServerState};
pub use session::run_session;
