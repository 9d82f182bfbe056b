use clap::Parser;
use futures_util::{SinkExt, StreamExt};
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_tungstenite::{connect_async, tungstenite::protocol::Message};
use url::Url;

use blackjack_duel_core::ClientCommand;

#[derive(Parser, Debug)]
#[command(name = "blackjack_duel_client", about = "Terminal client for the blackjack duel server")]
struct Args {
    /// 服务器 WebSocket 地址
    #[arg(long, default_value = "ws://127.0.0.1:58901/ws")]
    url: Url,
}

/// 把用户输入映射为协议命令
fn parse_input(line: &str) -> Option<ClientCommand> {
    match line.trim().to_ascii_lowercase().as_str() {
        "hit" | "h" => Some(ClientCommand::Hit),
        "stay" | "s" => Some(ClientCommand::Stay),
        "again" | "a" => Some(ClientCommand::PlayAgain),
        "quit" | "q" => Some(ClientCommand::Quit),
        _ => None,
    }
}

fn print_usage() {
    println!("可用命令:");
    println!("  hit    - 要一张牌");
    println!("  stay   - 停牌");
    println!("  again  - 一局结束后再来一局");
    println!("  quit   - 退出");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    println!("正在连接到: {}", args.url);
    let (ws_stream, _) = connect_async(args.url.as_str()).await?;
    println!("连接成功!");

    let (mut write, mut read) = ws_stream.split();

    // 启动一个任务来处理从服务器接收的消息
    let reader = tokio::spawn(async move {
        while let Some(msg) = read.next().await {
            match msg {
                Ok(Message::Text(text)) => {
                    let text = text.as_str();
                    println!("\n<-- {}", text);
                    if text == "OTHER_PLAYER_LEFT" {
                        println!("对手已离开，输入 quit 退出");
                    } else if text.starts_with("YOU ") {
                        println!("本局结束，输入 again 再来一局，或 quit 退出");
                    }
                    print!("> ");
                    let _ = std::io::stdout().flush();
                }
                Ok(Message::Close(_)) => break,
                Ok(_) => {}
                Err(e) => {
                    eprintln!("接收消息时出错: {}", e);
                    break;
                }
            }
        }
        println!("\n服务器已关闭连接");
    });

    // 主任务处理用户输入
    let mut stdin = BufReader::new(tokio::io::stdin()).lines();

    println!("--- 双人 21 点客户端 ---");
    print_usage();

    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let Some(line) = stdin.next_line().await? else {
            // 输入结束，按退出处理
            let _ = write.send(Message::Text(ClientCommand::Quit.to_string().into())).await;
            break;
        };
        let Some(command) = parse_input(&line) else {
            if !line.trim().is_empty() {
                println!("未知命令: {}", line);
                print_usage();
            }
            continue;
        };

        if reader.is_finished() {
            break;
        }
        write.send(Message::Text(command.to_string().into())).await?;
        if command == ClientCommand::Quit {
            println!("正在断开连接...");
            break;
        }
    }

    let _ = reader.await;
    Ok(())
}
