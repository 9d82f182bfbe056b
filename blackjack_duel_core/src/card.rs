use serde::{Deserialize, Serialize};
use std::fmt;

/// 一副牌的张数
pub const DECK_SIZE: u8 = 52;

/// 爆牌线
pub const BUST_LIMIT: u32 = 21;

/// 单张扑克牌，用 [0, 52) 内的编号表示
///
/// 花色对本游戏无意义，点数由编号对 13 取模得到。
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy, Serialize, Deserialize)]
pub struct Card(u8);

impl Card {
    /// 编号越界时返回 None
    pub fn new(id: u8) -> Option<Card> {
        (id < DECK_SIZE).then_some(Card(id))
    }

    pub fn id(&self) -> u8 {
        self.0
    }

    /// 点数 1..=13，1 为 A，11/12/13 为 J/Q/K
    pub fn rank(&self) -> u8 {
        self.0 % 13 + 1
    }

    pub fn is_ace(&self) -> bool {
        self.rank() == 1
    }

    /// 21 点计分：A 先按 11 计，J/Q/K 按 10 计
    pub fn value(&self) -> u32 {
        match self.rank() {
            1 => 11,
            r @ 2..=10 => r as u32,
            _ => 10,
        }
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.rank() {
            1 => write!(f, "Ace"),
            11 => write!(f, "Jack"),
            12 => write!(f, "Queen"),
            13 => write!(f, "King"),
            r => write!(f, "{}", r),
        }
    }
}

// --- 单元测试 ---
