mod config;
mod matchmaker;
mod room;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket},
        ConnectInfo, State, WebSocketUpgrade,
    },
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use clap::Parser;
use futures_util::{stream::StreamExt, SinkExt};
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use blackjack_duel_core::{Deck, ServerMessage};

use crate::config::Config;
use crate::matchmaker::Matchmaker;

type SharedState = Arc<Matchmaker>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::parse();
    let addr = config.listen_addr()?;

    let state = SharedState::new(Matchmaker::new(Deck::new_shuffled));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("21 点服务器正在监听 {}", addr);
    axum::serve(listener, app(state).into_make_service_with_connect_info::<SocketAddr>()).await?;
    Ok(())
}

fn app(state: SharedState) -> Router {
    Router::new()
        .route("/ws", get(websocket_handler))
        .route("/healthz", get(healthz))
        .route("/stats", get(stats))
        .with_state(state)
}

async fn healthz() -> &'static str {
    "ok"
}

async fn stats(State(state): State<SharedState>) -> impl IntoResponse {
    Json(state.stats())
}

/// 处理 WebSocket 连接请求
async fn websocket_handler(
    ws: WebSocketUpgrade,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    State(state): State<SharedState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, peer, state))
}

/// 处理单个 WebSocket 连接的生命周期
async fn handle_socket(socket: WebSocket, peer: SocketAddr, state: SharedState) {
    info!("来自 {} 的连接", peer);
    let (mut sender, mut receiver) = socket.split();

    // 会话通过这个通道把消息交给写任务
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerMessage>();

    // 启动一个新任务，专门负责将通道中的消息发送到 WebSocket。
    // 通道关闭（会话释放了该座位）后关闭连接。
    let writer = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(Message::Text(msg.to_string().into())).await.is_err() {
                // 发送失败，说明客户端已断开，退出任务
                break;
            }
        }
        let _ = sender.close().await;
    });

    let (room, seat) = state.connect(tx);

    // 主循环，按到达顺序处理客户端命令
    while let Some(Ok(msg)) = receiver.next().await {
        match msg {
            Message::Text(text) => {
                if room.dispatch(seat, text.as_str()) {
                    break;
                }
            }
            Message::Close(_) => break,
            _ => {}
        }
    }

    state.disconnect(&room, seat);
    let _ = writer.await;
    info!("{} 的连接关闭", peer);
}

// --- 端到端测试 ---
// 在本地随机端口上启动完整的服务，用真实的 WebSocket 客户端连接

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpStream;
    use tokio_tungstenite::{connect_async, tungstenite, MaybeTlsStream, WebSocketStream};

    type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

    async fn spawn_server() -> SocketAddr {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let state = SharedState::new(Matchmaker::new(Deck::new_shuffled));
        tokio::spawn(async move {
            axum::serve(listener, app(state).into_make_service_with_connect_info::<SocketAddr>())
                .await
                .unwrap();
        });
        addr
    }

    async fn join(addr: SocketAddr) -> Socket {
        let (socket, _) = connect_async(format!("ws://{}/ws", addr)).await.unwrap();
        socket
    }

    /// 读取下一条文本消息；连接关闭时返回 None
    async fn next_text(socket: &mut Socket) -> Option<String> {
        while let Some(msg) = socket.next().await {
            match msg.ok()? {
                tungstenite::Message::Text(text) => return Some(text.as_str().to_string()),
                tungstenite::Message::Close(_) => return None,
                _ => {}
            }
        }
        None
    }

    async fn send(socket: &mut Socket, text: &str) {
        socket.send(tungstenite::Message::text(text)).await.unwrap();
    }

    #[tokio::test]
    async fn test_pair_over_websocket() {
        let addr = spawn_server().await;

        let mut a = join(addr).await;
        assert_eq!(next_text(&mut a).await.unwrap(), "WELCOME X");
        assert_eq!(next_text(&mut a).await.unwrap(), "MESSAGE Waiting for opponent to connect");

        let mut b = join(addr).await;
        assert_eq!(next_text(&mut b).await.unwrap(), "WELCOME O");
        assert_eq!(next_text(&mut b).await.unwrap(), "MESSAGE Your opponent will move first");
        assert_eq!(next_text(&mut a).await.unwrap(), "MESSAGE Your move");

        send(&mut b, "STAY").await;
        assert_eq!(next_text(&mut b).await.unwrap(), "MESSAGE Not your turn");

        send(&mut a, "HIT").await;
        assert!(next_text(&mut a).await.unwrap().starts_with("CARDS "));
        assert!(next_text(&mut a).await.unwrap().starts_with("MESSAGE You got a "));
    }

    #[tokio::test]
    async fn test_quit_closes_and_notifies_opponent() {
        let addr = spawn_server().await;
        let mut a = join(addr).await;
        next_text(&mut a).await;
        next_text(&mut a).await;
        let mut b = join(addr).await;
        next_text(&mut b).await;
        next_text(&mut b).await;
        next_text(&mut a).await;

        send(&mut b, "QUIT").await;
        assert_eq!(next_text(&mut b).await, None);
        assert_eq!(next_text(&mut a).await.unwrap(), "OTHER_PLAYER_LEFT");
    }

    #[tokio::test]
    async fn test_health_and_stats() {
        let addr = spawn_server().await;
        let mut a = join(addr).await;
        assert_eq!(next_text(&mut a).await.unwrap(), "WELCOME X");

        let response = reqwest::get(format!("http://{}/healthz", addr)).await.unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::OK);
        assert_eq!(response.text().await.unwrap(), "ok");

        let response = reqwest::get(format!("http://{}/stats", addr)).await.unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::OK);
        let value: serde_json::Value = response.json().await.unwrap();
        assert_eq!(value["sessions"].as_array().unwrap().len(), 1);
        assert_eq!(value["sessions"][0]["phase"], "AwaitingOpponent");
        assert!(value["pending"].is_string());
    }

    #[tokio::test]
    async fn test_unknown_route_is_not_found() {
        let addr = spawn_server().await;
        let response = reqwest::get(format!("http://{}/nope", addr)).await.unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::NOT_FOUND);
    }
}
