//! # 双人 21 点核心逻辑库
//!
//! 这个 `core` crate 包含了双人 21 点对局的全部规则：
//! 牌与牌堆、玩家计分、会话状态机，以及客户端与服务器之间
//! 的纯文本命令/消息编解码。
//! 它不做任何网络 I/O，服务器把收到的文本解码成命令交给
//! `Session::apply`，再把返回的消息投递给对应的连接。

mod card;
mod deck;
mod error;
mod logic;
mod message;
mod state;

pub use card::*;

pub use deck::*;

pub use error::*;

pub use message::*;

pub use state::*;
