use crate::card::BUST_LIMIT;
use crate::deck::Dealer;
use crate::error::GameError;
use crate::message::{ClientCommand, Effects, ServerMessage, Verdict};
use crate::state::*;
use uuid::Uuid;

impl Verdict {
    /// 结算规则。返回 (请求方结果, 对手结果)
    pub fn between(requester: u32, opponent: u32) -> (Verdict, Verdict) {
        let requester_bust = requester > BUST_LIMIT;
        let opponent_bust = opponent > BUST_LIMIT;
        match (requester_bust, opponent_bust) {
            (true, true) => (Verdict::Tied, Verdict::Tied),
            (true, false) => (Verdict::Lost, Verdict::Won),
            (false, true) => (Verdict::Won, Verdict::Lost),
            _ if requester > opponent => (Verdict::Won, Verdict::Lost),
            _ if requester < opponent => (Verdict::Lost, Verdict::Won),
            _ => (Verdict::Tied, Verdict::Tied),
        }
    }
}

// --- 会话生命周期 ---

impl Session {
    /// 第一个玩家到达时创建会话，该玩家坐 A 座 (标记 X)
    pub fn new(dealer: Dealer) -> (Session, Effects) {
        let session = Session {
            id: Uuid::new_v4(),
            seats: [Some(Participant::new(Seat::A.mark())), None],
            deck: dealer(),
            turn: None,
            phase: Phase::AwaitingOpponent,
            dealer,
        };

        let mut effects = Effects::default();
        effects.send(Seat::A, ServerMessage::Welcome(Seat::A.mark()));
        effects.send(Seat::A, ServerMessage::message("Waiting for opponent to connect"));
        (session, effects)
    }

    /// 第二个玩家入座 B (标记 O)，对局开始，A 先行动。
    ///
    /// 会话不在等待对手状态时返回 None（例如 A 已经离开）。
    pub fn pair(&mut self) -> Option<Effects> {
        if self.phase != Phase::AwaitingOpponent {
            return None;
        }
        self.seats[Seat::B.index()] = Some(Participant::new(Seat::B.mark()));
        self.turn = Some(Seat::A);
        self.phase = Phase::InRound;

        let mut effects = Effects::default();
        effects.send(Seat::B, ServerMessage::Welcome(Seat::B.mark()));
        effects.send(Seat::B, ServerMessage::message("Your opponent will move first"));
        effects.send(Seat::A, ServerMessage::message("Your move"));
        Some(effects)
    }

    /// 某个座位的连接已关闭。
    ///
    /// 一局尚未结算时通知对手，然后结束会话并释放两个座位。
    pub fn leave(&mut self, seat: Seat) -> Effects {
        let mut effects = Effects::default();
        let opponent_present = self.participant(seat.other()).is_some();
        if self.phase == Phase::InRound && opponent_present {
            effects.send(seat.other(), ServerMessage::OtherPlayerLeft);
        }
        self.phase = Phase::Terminated;
        self.turn = None;
        self.seats = [None, None];
        effects
    }

    // --- 命令处理 ---

    /// 执行一条命令。规则错误不会改变任何状态。
    pub fn apply(&mut self, seat: Seat, command: &ClientCommand) -> Result<Effects, GameError> {
        match command {
            ClientCommand::Hit => self.hit(seat),
            ClientCommand::Stay => self.stay(seat),
            ClientCommand::PlayAgain => self.play_again(seat),
            ClientCommand::Quit => Ok(Effects { outbound: Vec::new(), hang_up: true }),
            ClientCommand::Unknown(_) => Ok(Effects::default()),
        }
    }

    /// 检查 seat 是否可以在当前阶段要牌/停牌
    fn check_turn(&self, seat: Seat) -> Result<(), GameError> {
        match self.phase {
            Phase::Terminated => Err(GameError::SessionClosed),
            Phase::AwaitingOpponent => Err(GameError::NoOpponentYet),
            Phase::RoundOver => Err(GameError::RoundNotInProgress),
            Phase::InRound if self.turn != Some(seat) => Err(GameError::NotYourTurn),
            Phase::InRound => Ok(()),
        }
    }

    /// 同时拿到自己和对手的可变引用
    fn pair_mut(&mut self, seat: Seat) -> Result<(&mut Participant, &mut Participant), GameError> {
        let [a, b] = &mut self.seats;
        let (me, other) = match seat {
            Seat::A => (a, b),
            Seat::B => (b, a),
        };
        match (me.as_mut(), other.as_mut()) {
            (Some(me), Some(other)) => Ok((me, other)),
            _ => Err(GameError::NoOpponentYet),
        }
    }

    fn hit(&mut self, seat: Seat) -> Result<Effects, GameError> {
        self.check_turn(seat)?;
        // 先确认双方都在，再抽牌，保证出错时牌堆不变
        self.pair_mut(seat)?;
        let card = self.deck.draw()?;
        let (me, other) = self.pair_mut(seat)?;
        me.take(card);

        let mut effects = Effects::default();
        effects.send(seat, ServerMessage::Cards(me.cards().to_vec()));

        if !me.is_bust() {
            effects.send(seat, ServerMessage::message(format!(
                "You got a {}. Your number is now {}", card, me.total()
            )));
            return Ok(effects);
        }

        if me.has_high_ace() {
            while me.is_bust() && me.downgrade_ace() {}
            effects.send(seat, ServerMessage::message(format!(
                "You got a {}. Your Ace is now worth 1, and your number is now {}.", card, me.total()
            )));
            return Ok(effects);
        }

        effects.send(seat, ServerMessage::message(format!(
            "BUST You got a {}. Your number is now {}. Wait for your opponent to play.", card, me.total()
        )));
        me.finish();
        if other.is_finished() {
            self.resolve(seat, &mut effects);
        } else {
            self.turn = Some(seat.other());
            effects.send(seat.other(), ServerMessage::message("Your move"));
        }
        Ok(effects)
    }

    fn stay(&mut self, seat: Seat) -> Result<Effects, GameError> {
        self.check_turn(seat)?;
        let (me, other) = self.pair_mut(seat)?;

        let mut effects = Effects::default();
        if other.is_finished() {
            me.finish();
            self.resolve(seat, &mut effects);
        } else {
            me.finish();
            let total = me.total();
            self.turn = Some(seat.other());
            effects.send(seat, ServerMessage::message(format!(
                "Your number is now {}. Wait for your opponent to play.", total
            )));
            effects.send(seat.other(), ServerMessage::message("Your move"));
        }
        Ok(effects)
    }

    fn play_again(&mut self, seat: Seat) -> Result<Effects, GameError> {
        match self.phase {
            Phase::Terminated => return Err(GameError::SessionClosed),
            Phase::AwaitingOpponent => return Err(GameError::NoOpponentYet),
            Phase::InRound => return Err(GameError::RoundInProgress),
            Phase::RoundOver => {}
        }
        let (me, other) = self.pair_mut(seat)?;
        me.reset();
        other.reset();
        self.deck = (self.dealer)();
        self.turn = Some(seat);
        self.phase = Phase::InRound;

        let mut effects = Effects::default();
        effects.send(seat, ServerMessage::PlayAgain);
        effects.send(seat.other(), ServerMessage::PlayAgain);
        effects.send(seat, ServerMessage::message("Your move"));
        effects.send(seat.other(), ServerMessage::message("Your opponent will move first"));
        Ok(effects)
    }

    /// 双方点数都已确定，结算并通知双方
    fn resolve(&mut self, requester: Seat, effects: &mut Effects) {
        let [a, b] = self.totals();
        let (own, opponent) = match requester {
            Seat::A => (a, b),
            Seat::B => (b, a),
        };
        let (requester_verdict, opponent_verdict) = Verdict::between(own, opponent);

        effects.send(requester, ServerMessage::Outcome { verdict: requester_verdict, own, opponent });
        effects.send(requester.other(), ServerMessage::Outcome {
            verdict: opponent_verdict,
            own: opponent,
            opponent: own,
        });
        self.turn = None;
        self.phase = Phase::RoundOver;
    }

    #[cfg(test)]
    pub(crate) fn rig(&mut self, deck: crate::deck::Deck) {
        self.deck = deck;
    }
}

// --- 单元测试 ---
