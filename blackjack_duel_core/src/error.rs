use thiserror::Error;

/// 规则错误。
///
/// 只在命令分发处被转换成 `MESSAGE` 发回给发出命令的玩家，
/// 出现错误时会话状态保持不变。`Display` 的文本即发给客户端的文本。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    #[error("Not your turn")]
    NotYourTurn,

    #[error("You don’t have an opponent yet")]
    NoOpponentYet,

    #[error("The deck is out of cards")]
    DeckExhausted,

    #[error("The round is over")]
    RoundNotInProgress,

    #[error("The round is still in progress")]
    RoundInProgress,

    #[error("Your opponent has left the game")]
    SessionClosed,
}
