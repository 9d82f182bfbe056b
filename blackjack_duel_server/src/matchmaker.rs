use std::sync::Arc;

use blackjack_duel_core::{Dealer, Seat, SessionId};
use dashmap::DashMap;
use parking_lot::Mutex;
use serde::Serialize;
use tracing::info;

use crate::room::{Outbox, Room, SessionSummary};

/// 配对器：把先后到达的两个连接组成一个会话
///
/// 重要‼️：严格规定使用锁的顺序，避免死锁：
/// pending -> room
pub struct Matchmaker {
    // 至多一个等待对手的会话
    pending: Mutex<Option<Arc<Room>>>,
    rooms: DashMap<SessionId, Arc<Room>>,
    dealer: Dealer,
}

#[derive(Debug, Clone, Serialize)]
pub struct Stats {
    pub pending: Option<SessionId>,
    pub sessions: Vec<SessionSummary>,
}

impl Matchmaker {
    pub fn new(dealer: Dealer) -> Matchmaker {
        Matchmaker {
            pending: Mutex::new(None),
            rooms: DashMap::new(),
            dealer,
        }
    }

    /// 新连接到达。有等待中的会话就加入它，否则新建一个。
    pub fn connect(&self, outbox: Outbox) -> (Arc<Room>, Seat) {
        let mut pending = self.pending.lock();
        if let Some(room) = pending.take() {
            if room.join(outbox.clone()) {
                return (room, Seat::B);
            }
        }

        let room = Room::open(self.dealer, outbox);
        self.rooms.insert(room.id(), room.clone());
        *pending = Some(room.clone());
        (room, Seat::A)
    }

    /// 连接关闭
    pub fn disconnect(&self, room: &Room, seat: Seat) {
        let mut pending = self.pending.lock();
        if pending.as_ref().is_some_and(|p| p.id() == room.id()) {
            *pending = None;
        }
        if room.disconnect(seat) {
            self.rooms.remove(&room.id());
            info!("会话 {} 已空，已被移除", room.id());
        }
    }

    pub fn stats(&self) -> Stats {
        let pending = self.pending.lock().as_ref().map(|room| room.id());
        let rooms: Vec<Arc<Room>> = self.rooms.iter().map(|entry| entry.value().clone()).collect();
        Stats {
            pending,
            sessions: rooms.iter().map(|room| room.summary()).collect(),
        }
    }
}

// --- 单元测试 ---
// 用内存通道代替 WebSocket 连接，完整走一遍对局流程
