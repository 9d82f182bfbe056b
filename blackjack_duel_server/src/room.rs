use std::sync::Arc;

use blackjack_duel_core::{ClientCommand, Dealer, Effects, Envelope, Mark, Phase, Seat, ServerMessage, Session, SessionId};
use parking_lot::Mutex;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// 向某个连接的写任务投递消息的通道。无界，投递永远不会阻塞状态机。
pub type Outbox = mpsc::UnboundedSender<ServerMessage>;

#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("无法向玩家 {0} 投递消息（连接可能已断开）")]
    SendFailed(Mark),
}

/// 一个会话及其两个连接
///
/// 会话状态和发件箱放在同一把锁下：同一会话同一时刻只处理一条命令，
/// 消息在持锁时入队，因此每个接收方看到的顺序与状态变化的顺序一致。
pub struct Room {
    id: SessionId,
    inner: Mutex<RoomInner>,
}

struct RoomInner {
    session: Session,
    outboxes: [Option<Outbox>; 2],
}

/// `/stats` 中单个会话的概要
#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub id: SessionId,
    pub phase: Phase,
    pub totals: [u32; 2],
}

impl Room {
    /// 为第一个到达的连接创建会话，连接坐 A 座
    pub fn open(dealer: Dealer, outbox: Outbox) -> Arc<Room> {
        let (session, effects) = Session::new(dealer);
        let inner = RoomInner {
            session,
            outboxes: [Some(outbox), None],
        };
        inner.deliver(effects);
        info!("会话 {} 已创建，等待对手", inner.session.id());
        Arc::new(Room {
            id: inner.session.id(),
            inner: Mutex::new(inner),
        })
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    /// 第二个连接入座 B。会话已不在等待状态时返回 false。
    pub fn join(&self, outbox: Outbox) -> bool {
        let mut inner = self.inner.lock();
        let Some(effects) = inner.session.pair() else {
            return false;
        };
        inner.outboxes[Seat::B.index()] = Some(outbox);
        inner.deliver(effects);
        info!("会话 {} 配对完成", self.id);
        true
    }

    /// 处理一条来自 seat 的文本。返回 true 表示需要关闭该连接。
    pub fn dispatch(&self, seat: Seat, text: &str) -> bool {
        let command = ClientCommand::decode(text);
        debug!("会话 {} 玩家 {} 发来 {:?}", self.id, seat.mark(), command);

        let mut inner = self.inner.lock();
        match inner.session.apply(seat, &command) {
            Ok(effects) => {
                if let ClientCommand::Unknown(raw) = &command {
                    warn!("会话 {} 忽略无法识别的命令: {:?}", self.id, raw);
                }
                let hang_up = effects.hang_up;
                inner.deliver(effects);
                hang_up
            }
            Err(e) => {
                warn!("会话 {} 拒绝玩家 {} 的 {:?}: {}", self.id, seat.mark(), command, e);
                inner.deliver_to(seat, ServerMessage::message(e.to_string()));
                false
            }
        }
    }

    /// 某个连接已关闭。返回 true 表示两个连接都已离开，可以释放会话。
    pub fn disconnect(&self, seat: Seat) -> bool {
        let mut inner = self.inner.lock();
        let effects = inner.session.leave(seat);
        inner.outboxes[seat.index()] = None;
        inner.deliver(effects);
        info!("会话 {} 玩家 {} 已断开", self.id, seat.mark());
        inner.outboxes.iter().all(Option::is_none)
    }

    pub fn summary(&self) -> SessionSummary {
        let inner = self.inner.lock();
        SessionSummary {
            id: self.id,
            phase: inner.session.phase(),
            totals: inner.session.totals(),
        }
    }
}

impl RoomInner {
    fn deliver(&self, effects: Effects) {
        for Envelope { to, message } in effects.outbound {
            self.deliver_to(to, message);
        }
    }

    /// 投递失败只记录日志，不回滚已经完成的状态变化
    fn deliver_to(&self, seat: Seat, message: ServerMessage) {
        if let Err(e) = self.try_deliver(seat, message) {
            warn!("会话 {}: {}", self.session.id(), e);
        }
    }

    fn try_deliver(&self, seat: Seat, message: ServerMessage) -> Result<(), DeliveryError> {
        let outbox = self.outboxes[seat.index()].as_ref().ok_or(DeliveryError::SendFailed(seat.mark()))?;
        outbox.send(message).map_err(|_| DeliveryError::SendFailed(seat.mark()))
    }
}

// --- 单元测试 ---

#[cfg(test)]
mod tests {
    use super::*;
    use blackjack_duel_core::Deck;
    use tokio::sync::mpsc::UnboundedReceiver;

    fn drain(rx: &mut UnboundedReceiver<ServerMessage>) -> Vec<String> {
        let mut out = Vec::new();
        while let Ok(msg) = rx.try_recv() {
            out.push(msg.to_string());
        }
        out
    }

    #[test]
    fn test_rejection_goes_to_sender_only() {
        let (tx_a, mut rx_a) = mpsc::unbounded_channel();
        let (tx_b, mut rx_b) = mpsc::unbounded_channel();
        let room = Room::open(Deck::new_shuffled, tx_a);
        assert!(room.join(tx_b));
        drain(&mut rx_a);
        drain(&mut rx_b);

        assert!(!room.dispatch(Seat::B, "HIT"));
        assert_eq!(drain(&mut rx_b), ["MESSAGE Not your turn"]);
        assert!(drain(&mut rx_a).is_empty());
        assert_eq!(room.summary().totals, [0, 0]);
    }

    #[test]
    fn test_command_before_pairing_is_rejected() {
        let (tx_a, mut rx_a) = mpsc::unbounded_channel();
        let room = Room::open(Deck::new_shuffled, tx_a);
        drain(&mut rx_a);
        assert!(!room.dispatch(Seat::A, "HIT"));
        assert_eq!(drain(&mut rx_a), ["MESSAGE You don’t have an opponent yet"]);
        assert_eq!(room.summary().phase, Phase::AwaitingOpponent);
    }

    #[test]
    fn test_unknown_command_is_silent() {
        let (tx_a, mut rx_a) = mpsc::unbounded_channel();
        let room = Room::open(Deck::new_shuffled, tx_a);
        drain(&mut rx_a);
        assert!(!room.dispatch(Seat::A, "DANCE"));
        assert!(drain(&mut rx_a).is_empty());
    }

    #[test]
    fn test_quit_requests_hang_up() {
        let (tx_a, _rx_a) = mpsc::unbounded_channel();
        let room = Room::open(Deck::new_shuffled, tx_a);
        assert!(room.dispatch(Seat::A, "QUIT"));
    }

    #[test]
    fn test_send_failure_does_not_roll_back() {
        let (tx_a, mut rx_a) = mpsc::unbounded_channel();
        let (tx_b, rx_b) = mpsc::unbounded_channel();
        let room = Room::open(Deck::new_shuffled, tx_a);
        assert!(room.join(tx_b));
        drain(&mut rx_a);
        // B 的写任务已经退出
        drop(rx_b);

        assert!(!room.dispatch(Seat::A, "STAY"));
        assert_eq!(drain(&mut rx_a), ["MESSAGE Your number is now 0. Wait for your opponent to play."]);
        assert_eq!(room.summary().phase, Phase::InRound);
    }

    #[test]
    fn test_disconnect_reports_empty_room() {
        let (tx_a, _rx_a) = mpsc::unbounded_channel();
        let (tx_b, mut rx_b) = mpsc::unbounded_channel();
        let room = Room::open(Deck::new_shuffled, tx_a);
        assert!(room.join(tx_b));
        drain(&mut rx_b);

        assert!(!room.disconnect(Seat::A));
        assert_eq!(drain(&mut rx_b), ["OTHER_PLAYER_LEFT"]);
        assert!(room.disconnect(Seat::B));
        assert_eq!(room.summary().phase, Phase::Terminated);
    }
}
