use crate::card::{BUST_LIMIT, Card};
use crate::deck::{Dealer, Deck};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

pub type SessionId = Uuid;

/// 玩家在一局中的标记，先到者为 X，后到者为 O
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mark {
    X,
    O,
}

impl fmt::Display for Mark {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", match self {
            Mark::X => "X",
            Mark::O => "O",
        })
    }
}

/// 会话中的两个座位。对手总是“另一个座位”，不保存相互引用。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Seat {
    A,
    B,
}

impl Seat {
    pub fn index(self) -> usize {
        match self {
            Seat::A => 0,
            Seat::B => 1,
        }
    }

    pub fn other(self) -> Seat {
        match self {
            Seat::A => Seat::B,
            Seat::B => Seat::A,
        }
    }

    pub fn mark(self) -> Mark {
        match self {
            Seat::A => Mark::X,
            Seat::B => Mark::O,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    /// 只有一个玩家，等待对手
    AwaitingOpponent,
    /// 进行中，行动权在某个玩家手里
    InRound,
    /// 一局已结算
    RoundOver,
    /// 有玩家离开，会话结束
    Terminated,
}

/// 单个玩家在会话中的状态
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    mark: Mark,
    total: u32,
    cards: Vec<Card>,
    // 仍按 11 计的 A 的数量
    high_aces: u8,
    // 行动权已经从该玩家手中移走（停牌或爆牌）
    finished: bool,
}

impl Participant {
    pub fn new(mark: Mark) -> Participant {
        Participant {
            mark,
            total: 0,
            cards: Vec::new(),
            high_aces: 0,
            finished: false,
        }
    }

    pub fn mark(&self) -> Mark {
        self.mark
    }

    pub fn total(&self) -> u32 {
        self.total
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn has_high_ace(&self) -> bool {
        self.high_aces > 0
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn is_bust(&self) -> bool {
        self.total > BUST_LIMIT
    }

    pub(crate) fn take(&mut self, card: Card) {
        self.cards.push(card);
        self.total += card.value();
        if card.is_ace() {
            self.high_aces += 1;
        }
    }

    /// 把一张按 11 计的 A 改为按 1 计。没有可降级的 A 时返回 false。
    pub(crate) fn downgrade_ace(&mut self) -> bool {
        if self.high_aces == 0 {
            return false;
        }
        self.high_aces -= 1;
        self.total -= 10;
        true
    }

    pub(crate) fn finish(&mut self) {
        self.finished = true;
    }

    pub(crate) fn reset(&mut self) {
        *self = Participant::new(self.mark);
    }
}

/// 一个两人对局会话
///
/// 拥有两个座位、牌堆和行动指针。所有规则都在 `logic` 中实现，
/// 这里只有数据和只读访问。
#[derive(Debug)]
pub struct Session {
    pub(crate) id: SessionId,
    pub(crate) seats: [Option<Participant>; 2],
    pub(crate) deck: Deck,
    pub(crate) turn: Option<Seat>,
    pub(crate) phase: Phase,
    pub(crate) dealer: Dealer,
}

impl Session {
    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// 当前应该行动的座位
    pub fn turn(&self) -> Option<Seat> {
        self.turn
    }

    pub fn participant(&self, seat: Seat) -> Option<&Participant> {
        self.seats[seat.index()].as_ref()
    }

    pub fn deck_len(&self) -> usize {
        self.deck.len()
    }

    /// 两个座位的点数，空座位为 0
    pub fn totals(&self) -> [u32; 2] {
        [Seat::A, Seat::B].map(|seat| self.participant(seat).map_or(0, Participant::total))
    }
}

// --- 单元测试 ---

#[cfg(test)]
mod tests {
    use super::*;

    fn card(id: u8) -> Card {
        Card::new(id).unwrap()
    }

    #[test]
    fn test_seat_complement() {
        assert_eq!(Seat::A.other(), Seat::B);
        assert_eq!(Seat::B.other(), Seat::A);
        assert_eq!(Seat::A.mark(), Mark::X);
        assert_eq!(Seat::B.mark(), Mark::O);
        assert_ne!(Seat::A.index(), Seat::B.index());
    }

    #[test]
    fn test_ace_downgrade_once_per_ace() {
        let mut p = Participant::new(Mark::X);
        p.take(card(0)); // A
        p.take(card(12)); // K
        assert_eq!(p.total(), 21);
        assert!(p.has_high_ace());

        p.take(card(4)); // 5
        assert_eq!(p.total(), 26);
        assert!(p.downgrade_ace());
        assert_eq!(p.total(), 16);
        assert!(!p.has_high_ace());

        p.take(card(11)); // Q
        assert_eq!(p.total(), 26);
        assert!(!p.downgrade_ace(), "唯一的 A 已经降级过");
        assert_eq!(p.total(), 26);
        assert!(p.is_bust());
    }

    #[test]
    fn test_total_matches_card_values() {
        let mut p = Participant::new(Mark::O);
        for id in [0, 13, 7] {
            p.take(card(id));
        }
        // A + A + 8，降级一张 A
        assert!(p.downgrade_ace());
        let sum: u32 = p.cards().iter().map(Card::value).sum();
        assert_eq!(p.total(), sum - 10);
        assert!(p.has_high_ace());
    }

    #[test]
    fn test_reset_keeps_mark() {
        let mut p = Participant::new(Mark::O);
        p.take(card(0));
        p.finish();
        p.reset();
        assert_eq!(p, Participant::new(Mark::O));
    }
}
