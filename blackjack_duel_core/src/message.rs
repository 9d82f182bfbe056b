use crate::card::{BUST_LIMIT, Card};
use crate::state::{Mark, Seat};
use std::fmt;

// --- 客户端 -> 服务器 的命令 ---
// 线上格式是纯文本，区分大小写。

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientCommand {
    /// 要一张牌
    Hit,
    /// 停牌，把行动权交给对手
    Stay,
    /// 主动离开，服务器会关闭连接
    Quit,
    /// 一局结束后重开
    PlayAgain,
    /// 无法识别的文本，按策略忽略
    Unknown(String),
}

impl ClientCommand {
    /// 在传输边界把一条文本解码为命令
    pub fn decode(text: &str) -> ClientCommand {
        match text.trim() {
            "HIT" => ClientCommand::Hit,
            "STAY" => ClientCommand::Stay,
            "QUIT" => ClientCommand::Quit,
            "PLAY AGAIN" => ClientCommand::PlayAgain,
            other => ClientCommand::Unknown(other.to_string()),
        }
    }
}

impl fmt::Display for ClientCommand {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ClientCommand::Hit => write!(f, "HIT"),
            ClientCommand::Stay => write!(f, "STAY"),
            ClientCommand::Quit => write!(f, "QUIT"),
            ClientCommand::PlayAgain => write!(f, "PLAY AGAIN"),
            ClientCommand::Unknown(text) => write!(f, "{}", text),
        }
    }
}

// --- 服务器 -> 客户端 的消息 ---

/// 一局的结果（从接收方的角度）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Won,
    Lost,
    Tied,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerMessage {
    /// 配对/建局时发送一次，告知分配到的标记
    Welcome(Mark),
    /// 状态提示文本
    Message(String),
    /// 一局结束，own/opponent 是双方的最终点数
    Outcome {
        verdict: Verdict,
        own: u32,
        opponent: u32,
    },
    /// 对手在一局结束前断开
    OtherPlayerLeft,
    /// 重开已被接受
    PlayAgain,
    /// 自己已抽到的牌的编号
    Cards(Vec<Card>),
}

impl ServerMessage {
    pub fn message(text: impl Into<String>) -> ServerMessage {
        ServerMessage::Message(text.into())
    }
}

impl fmt::Display for ServerMessage {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ServerMessage::Welcome(mark) => write!(f, "WELCOME {}", mark),
            ServerMessage::Message(text) => write!(f, "MESSAGE {}", text),
            ServerMessage::Outcome { verdict, own, opponent } => {
                let (own, opponent) = (*own, *opponent);
                match verdict {
                    Verdict::Tied if own > BUST_LIMIT && opponent > BUST_LIMIT => {
                        write!(f, "YOU TIED, both players went over 21.")
                    }
                    Verdict::Tied => write!(f, "YOU TIED, both players have the same number."),
                    Verdict::Won if opponent > BUST_LIMIT => write!(
                        f,
                        "YOU WON! Your opponent went over 21 with {} and you got {}",
                        opponent, own
                    ),
                    Verdict::Won => write!(f, "YOU WON! You got {} and your opponent got {}", own, opponent),
                    Verdict::Lost if own > BUST_LIMIT => write!(
                        f,
                        "YOU LOST! You went over 21 with {} and your opponent got {}",
                        own, opponent
                    ),
                    Verdict::Lost => write!(f, "YOU LOST! You got {} and your opponent got {}", own, opponent),
                }
            }
            ServerMessage::OtherPlayerLeft => write!(f, "OTHER_PLAYER_LEFT"),
            ServerMessage::PlayAgain => write!(f, "PLAY AGAIN"),
            ServerMessage::Cards(cards) => {
                let csv: Vec<String> = cards.iter().map(|c| c.id().to_string()).collect();
                write!(f, "CARDS {}", csv.join(","))
            }
        }
    }
}

/// 一条发往指定座位的消息
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub to: Seat,
    pub message: ServerMessage,
}

impl Envelope {
    pub fn new(to: Seat, message: ServerMessage) -> Envelope {
        Envelope { to, message }
    }
}

/// 成功执行一条命令后产生的效果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Effects {
    pub outbound: Vec<Envelope>,
    /// 需要关闭发送者的连接 (QUIT)
    pub hang_up: bool,
}

impl Effects {
    pub(crate) fn send(&mut self, to: Seat, message: ServerMessage) {
        self.outbound.push(Envelope::new(to, message));
    }

    /// 发给某个座位的全部消息，按发送顺序
    pub fn to(&self, seat: Seat) -> Vec<&ServerMessage> {
        self.outbound.iter().filter(|e| e.to == seat).map(|e| &e.message).collect()
    }
}

// --- 单元测试 ---
