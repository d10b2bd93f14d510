//! 连接注册表
//!
//! 记录所有存活连接（玩家与观众）、对局玩家顺序和符号池。

use std::collections::BTreeMap;

use tokio::sync::mpsc;
use tracing::{debug, info};

use protocol::{ConnectionId, Marker, ServerEvent, MAX_PLAYERS};

use crate::error::{MarkerError, RenameError};
use crate::markers::MarkerPool;

/// 连接的发件箱，由该连接的写任务消费
pub type Outbox = mpsc::UnboundedSender<ServerEvent>;

/// 连接角色
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// 可以落子的玩家
    Player,
    /// 只能聊天和观战
    Spectator,
}

/// 一个网络会话
#[derive(Debug)]
pub struct Connection {
    pub id: ConnectionId,
    pub name: String,
    pub marker: Option<Marker>,
    pub role: Role,
    pub peer_addr: Option<String>,
    outbox: Outbox,
}

impl Connection {
    fn new(id: ConnectionId, outbox: Outbox, peer_addr: Option<String>) -> Self {
        Self {
            id,
            name: format!("Player {}", id),
            marker: None,
            role: Role::Spectator,
            peer_addr,
            outbox,
        }
    }

    pub fn is_player(&self) -> bool {
        self.role == Role::Player
    }

    /// 投递事件；对端已断开时吞掉错误
    pub fn deliver(&self, event: ServerEvent) -> bool {
        match self.outbox.send(event) {
            Ok(()) => true,
            Err(_) => {
                debug!(id = self.id, "连接已关闭，丢弃消息");
                false
            }
        }
    }
}

/// 玩家离开时的信息
#[derive(Debug)]
pub struct Departure {
    pub connection: Connection,
    /// 离开前占用的座位
    pub seat: Option<usize>,
}

/// 对局座位；下标即回合顺序，空座位由之后新接入的连接补上
pub type Seats = [Option<ConnectionId>; MAX_PLAYERS];

/// 连接注册表
#[derive(Debug)]
pub struct ConnectionRegistry {
    /// 连接 ID -> 连接（按 ID 有序，广播顺序稳定）
    connections: BTreeMap<ConnectionId, Connection>,
    seats: Seats,
    /// 对局中离座者的 ID；其符号仍留在符号池里，等新连接坐进该座位时转交
    vacated: Seats,
    markers: MarkerPool,
    next_id: ConnectionId,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self {
            connections: BTreeMap::new(),
            seats: [None; MAX_PLAYERS],
            vacated: [None; MAX_PLAYERS],
            markers: MarkerPool::new(),
            next_id: 1,
        }
    }

    /// 登记新连接，初始角色为观众
    pub fn register(&mut self, outbox: Outbox, peer_addr: Option<String>) -> ConnectionId {
        let id = self.next_id;
        self.next_id += 1;
        self.connections.insert(id, Connection::new(id, outbox, peer_addr));
        id
    }

    /// 若有空座位，把连接提升为玩家
    ///
    /// 座位上保留着前任的符号时接过该符号，否则分配默认符号。
    pub fn promote_to_player(&mut self, id: ConnectionId) -> Option<Marker> {
        let seat = self.seats.iter().position(Option::is_none)?;
        let conn = self.connections.get_mut(&id)?;
        if conn.is_player() {
            return None;
        }
        let inherited = self.vacated[seat]
            .take()
            .and_then(|previous| self.markers.transfer(previous, id));
        let marker = match inherited {
            Some(marker) => marker,
            None => self.markers.allocate_default(id)?,
        };

        conn.role = Role::Player;
        conn.marker = Some(marker.clone());
        self.seats[seat] = Some(id);

        info!(id, seat, marker = %marker, name = %conn.name, "连接成为玩家");
        Some(marker)
    }

    /// 移除连接并空出座位
    ///
    /// `hold_marker` 为真时（对局进行中）玩家的符号不释放，留给该座位的下一位玩家。
    pub fn unregister(&mut self, id: ConnectionId, hold_marker: bool) -> Option<Departure> {
        let connection = self.connections.remove(&id)?;

        let seat = self.seats.iter().position(|&s| s == Some(id));
        match seat {
            Some(seat) if hold_marker => {
                self.seats[seat] = None;
                self.vacated[seat] = Some(id);
            }
            Some(seat) => {
                self.seats[seat] = None;
                self.markers.release(id);
            }
            None => {
                self.markers.release(id);
            }
        }

        Some(Departure { connection, seat })
    }

    /// 改名；名称为空白时不做任何事。返回旧名称
    pub fn rename(&mut self, id: ConnectionId, new_name: &str) -> Option<String> {
        if new_name.trim().is_empty() {
            return None;
        }
        let conn = self.connections.get_mut(&id)?;
        let old = std::mem::replace(&mut conn.name, new_name.to_string());
        info!(id, from = %old, to = %new_name, "连接改名");
        Some(old)
    }

    /// 改名，拒绝其他连接正在使用的名称
    pub fn rename_unique(&mut self, id: ConnectionId, new_name: &str) -> Result<String, RenameError> {
        if new_name.trim().is_empty() {
            return Err(RenameError::Blank);
        }
        if self.name_in_use(new_name, id) {
            return Err(RenameError::InUse(new_name.to_string()));
        }
        self.rename(id, new_name).ok_or(RenameError::Blank)
    }

    /// 名称是否被其他连接使用
    pub fn name_in_use(&self, name: &str, except: ConnectionId) -> bool {
        self.connections
            .values()
            .any(|c| c.id != except && c.name == name)
    }

    /// 更换玩家符号，返回 (旧符号, 新符号)
    pub fn set_marker(&mut self, id: ConnectionId, symbol: &str) -> Result<(Marker, Marker), MarkerError> {
        let conn = self
            .connections
            .get_mut(&id)
            .filter(|c| c.is_player())
            .ok_or(MarkerError::NotAPlayer(id))?;
        let marker = Marker::new(symbol).ok_or_else(|| MarkerError::Invalid(symbol.to_string()))?;

        let previous = self.markers.reserve(id, marker.clone())?;
        let old = conn.marker.replace(marker.clone()).or(previous).unwrap_or_else(|| marker.clone());

        info!(id, from = %old, to = %marker, "玩家更换符号");
        Ok((old, marker))
    }

    /// 获取连接
    pub fn find_by_id(&self, id: ConnectionId) -> Option<&Connection> {
        self.connections.get(&id)
    }

    /// 获取连接名称
    pub fn name_of(&self, id: ConnectionId) -> Option<&str> {
        self.connections.get(&id).map(|c| c.name.as_str())
    }

    /// 全部连接（含观众）
    pub fn all(&self) -> impl Iterator<Item = &Connection> {
        self.connections.values()
    }

    /// 按座位顺序的玩家
    pub fn players(&self) -> impl Iterator<Item = &Connection> {
        self.seats
            .iter()
            .flatten()
            .filter_map(|id| self.connections.get(id))
    }

    pub fn seats(&self) -> &Seats {
        &self.seats
    }

    pub fn player_count(&self) -> usize {
        self.seats.iter().flatten().count()
    }

    /// 连接总数
    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn register(registry: &mut ConnectionRegistry) -> (ConnectionId, mpsc::UnboundedReceiver<ServerEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (registry.register(tx, None), rx)
    }

    fn marker(s: &str) -> Marker {
        Marker::new(s).unwrap()
    }

    #[test]
    fn test_register_assigns_increasing_ids() {
        let mut registry = ConnectionRegistry::new();
        let (id1, _rx1) = register(&mut registry);
        let (id2, _rx2) = register(&mut registry);

        assert!(id2 > id1);
        let conn = registry.find_by_id(id1).unwrap();
        assert_eq!(conn.name, format!("Player {}", id1));
        assert_eq!(conn.role, Role::Spectator);
        assert_eq!(conn.marker, None);
    }

    #[test]
    fn test_first_two_become_players() {
        let mut registry = ConnectionRegistry::new();
        let (a, _ra) = register(&mut registry);
        let (b, _rb) = register(&mut registry);
        let (c, _rc) = register(&mut registry);

        assert_eq!(registry.promote_to_player(a), Some(marker("x")));
        assert_eq!(registry.promote_to_player(b), Some(marker("o")));
        assert_eq!(registry.promote_to_player(c), None);

        assert_eq!(registry.seats(), &[Some(a), Some(b)]);
        assert_eq!(registry.find_by_id(c).unwrap().role, Role::Spectator);
    }

    #[test]
    fn test_unregister_releases_marker() {
        let mut registry = ConnectionRegistry::new();
        let (a, _ra) = register(&mut registry);
        let (b, _rb) = register(&mut registry);
        registry.promote_to_player(a);
        registry.promote_to_player(b);

        let departure = registry.unregister(a, false).unwrap();
        assert_eq!(departure.seat, Some(0));
        assert_eq!(registry.seats(), &[None, Some(b)]);
        assert_eq!(registry.player_count(), 1);
        assert!(registry.find_by_id(a).is_none());

        // 新连接坐进空出的座位并拿到 "x"
        let (c, _rc) = register(&mut registry);
        assert_eq!(registry.promote_to_player(c), Some(marker("x")));
        assert_eq!(registry.seats(), &[Some(c), Some(b)]);
        assert_eq!(registry.players().map(|p| p.id).collect::<Vec<_>>(), vec![c, b]);
    }

    #[test]
    fn test_held_marker_goes_to_next_seat_holder() {
        let mut registry = ConnectionRegistry::new();
        let (a, _ra) = register(&mut registry);
        let (b, _rb) = register(&mut registry);
        registry.promote_to_player(a);
        registry.promote_to_player(b);
        registry.set_marker(b, "star").unwrap();

        let departure = registry.unregister(b, true).unwrap();
        assert_eq!(departure.seat, Some(1));
        assert_eq!(registry.seats(), &[Some(a), None]);

        // 留下的玩家不能拿走离座者的符号
        assert_eq!(registry.set_marker(a, "STAR"), Err(MarkerError::InUse(marker("STAR"))));

        let (c, _rc) = register(&mut registry);
        assert_eq!(registry.promote_to_player(c), Some(marker("star")));
        assert_eq!(registry.seats(), &[Some(a), Some(c)]);

        // 转交后恢复正常：c 离开且不保留时符号被释放
        registry.unregister(c, false);
        assert!(registry.set_marker(a, "star").is_ok());
    }

    #[test]
    fn test_unregister_spectator() {
        let mut registry = ConnectionRegistry::new();
        let (a, _ra) = register(&mut registry);
        let departure = registry.unregister(a, false).unwrap();
        assert_eq!(departure.seat, None);
        assert!(registry.unregister(a, false).is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_rename() {
        let mut registry = ConnectionRegistry::new();
        let (a, _ra) = register(&mut registry);

        assert_eq!(registry.rename(a, "   "), None);
        assert_eq!(registry.name_of(a), Some(format!("Player {}", a).as_str()));

        let old = registry.rename(a, "Alice").unwrap();
        assert_eq!(old, format!("Player {}", a));
        assert_eq!(registry.name_of(a), Some("Alice"));
    }

    #[test]
    fn test_rename_unique() {
        let mut registry = ConnectionRegistry::new();
        let (a, _ra) = register(&mut registry);
        let (b, _rb) = register(&mut registry);
        registry.rename(a, "Alice");

        assert_eq!(
            registry.rename_unique(b, "Alice"),
            Err(RenameError::InUse("Alice".to_string()))
        );
        assert_eq!(registry.rename_unique(b, ""), Err(RenameError::Blank));
        assert!(registry.rename_unique(b, "Bob").is_ok());
        // 重复设置自己的名字是允许的
        assert!(registry.rename_unique(a, "Alice").is_ok());
    }

    #[test]
    fn test_set_marker() {
        let mut registry = ConnectionRegistry::new();
        let (a, _ra) = register(&mut registry);
        let (b, _rb) = register(&mut registry);
        let (c, _rc) = register(&mut registry);
        registry.promote_to_player(a);
        registry.promote_to_player(b);

        assert_eq!(registry.set_marker(a, "y"), Ok((marker("x"), marker("y"))));
        assert_eq!(registry.find_by_id(a).unwrap().marker, Some(marker("y")));

        assert_eq!(registry.set_marker(b, "Y"), Err(MarkerError::InUse(marker("Y"))));
        assert_eq!(registry.set_marker(b, "a|b"), Err(MarkerError::Invalid("a|b".to_string())));
        assert_eq!(registry.set_marker(c, "z"), Err(MarkerError::NotAPlayer(c)));
    }

    #[test]
    fn test_deliver_to_dead_connection() {
        let mut registry = ConnectionRegistry::new();
        let (a, ra) = register(&mut registry);
        drop(ra);

        let conn = registry.find_by_id(a).unwrap();
        assert!(!conn.deliver(ServerEvent::Chat("hi".to_string())));
    }
}
