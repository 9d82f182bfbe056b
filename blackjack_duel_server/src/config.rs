use std::net::SocketAddr;

use anyhow::Context;
use clap::Parser;

/// 服务器配置，命令行参数优先，其次是环境变量
#[derive(Parser, Debug, Clone)]
#[command(name = "blackjack_duel_server", about = "Two-player blackjack duel server")]
pub struct Config {
    /// 监听地址
    #[arg(long, env = "BLACKJACK_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// 监听端口
    #[arg(long, env = "BLACKJACK_PORT", default_value_t = 58901)]
    pub port: u16,
}

impl Config {
    pub fn listen_addr(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("无效的监听地址 {}:{}", self.host, self.port))
    }
}
