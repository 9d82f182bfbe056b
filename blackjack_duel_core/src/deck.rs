use crate::card::{Card, DECK_SIZE};
use crate::error::GameError;
use rand::prelude::SliceRandom;
use rand::Rng;

/// 发牌器：每次开局/重开时调用，返回一副新牌
pub type Dealer = fn() -> Deck;

/// 牌堆。从末尾抽牌，不放回。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deck {
    cards: Vec<Card>,
}

/// 按编号顺序创建一副完整的 52 张牌
fn create_deck() -> Vec<Card> {
    (0..DECK_SIZE).filter_map(Card::new).collect()
}

impl Deck {
    /// 洗好的一副新牌
    pub fn new_shuffled() -> Deck {
        Deck::shuffled_with(&mut rand::rng())
    }

    /// 使用指定的随机源洗牌 (Fisher–Yates)，便于测试复现
    pub fn shuffled_with<R: Rng + ?Sized>(rng: &mut R) -> Deck {
        let mut cards = create_deck();
        cards.shuffle(rng);
        Deck { cards }
    }

    /// 按给定顺序叠好的牌堆，第一张最先被抽到
    pub fn stacked(cards: impl IntoIterator<Item = Card>) -> Deck {
        let mut cards: Vec<Card> = cards.into_iter().collect();
        cards.reverse();
        Deck { cards }
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// 抽一张牌，牌堆为空时返回 DeckExhausted
    pub fn draw(&mut self) -> Result<Card, GameError> {
        self.cards.pop().ok_or(GameError::DeckExhausted)
    }
}

// --- 单元测试 ---
