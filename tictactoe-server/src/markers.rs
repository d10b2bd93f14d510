//! 符号池
//!
//! 记录当前被玩家持有的符号。比较忽略大小写，同一时刻不会有两名玩家持有相同符号。

use std::collections::HashMap;

use protocol::{ConnectionId, Marker, DEFAULT_MARKERS};

use crate::error::MarkerError;

/// 符号池
#[derive(Debug, Default)]
pub struct MarkerPool {
    /// 小写符号 -> (持有者, 原始符号)
    reserved: HashMap<String, (ConnectionId, Marker)>,
}

impl MarkerPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// 按 "x"、"o" 的顺序分配第一个空闲的默认符号
    pub fn allocate_default(&mut self, owner: ConnectionId) -> Option<Marker> {
        let marker = DEFAULT_MARKERS
            .iter()
            .filter_map(|s| Marker::new(s))
            .find(|m| !self.is_reserved(m))?;
        self.reserved.insert(marker.key(), (owner, marker.clone()));
        Some(marker)
    }

    /// 为持有者预留新符号，释放其旧符号；返回旧符号
    pub fn reserve(&mut self, owner: ConnectionId, marker: Marker) -> Result<Option<Marker>, MarkerError> {
        if let Some(holder) = self.owner_of(&marker) {
            if holder != owner {
                return Err(MarkerError::InUse(marker));
            }
        }
        let previous = self.release(owner);
        self.reserved.insert(marker.key(), (owner, marker));
        Ok(previous)
    }

    /// 把 `from` 持有的符号转给 `to`，返回被转交的符号
    pub fn transfer(&mut self, from: ConnectionId, to: ConnectionId) -> Option<Marker> {
        let (holder, marker) = self.reserved.values_mut().find(|(holder, _)| *holder == from)?;
        *holder = to;
        Some(marker.clone())
    }

    /// 释放持有者的符号
    pub fn release(&mut self, owner: ConnectionId) -> Option<Marker> {
        let key = self
            .reserved
            .iter()
            .find(|(_, (holder, _))| *holder == owner)
            .map(|(key, _)| key.clone())?;
        self.reserved.remove(&key).map(|(_, marker)| marker)
    }

    /// 符号是否已被持有（忽略大小写）
    pub fn is_reserved(&self, marker: &Marker) -> bool {
        self.reserved.contains_key(&marker.key())
    }

    /// 符号的持有者
    pub fn owner_of(&self, marker: &Marker) -> Option<ConnectionId> {
        self.reserved.get(&marker.key()).map(|(owner, _)| *owner)
    }
}
