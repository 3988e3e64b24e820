use anyhow::{anyhow, Result};
use futures_util::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use ttt_shared::{Board, Cell, ClientMsg, Score, ServerMsg, Symbol};

use native_ttt::server::{build_router, AppState};

type Ws = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Start the real router on an OS-assigned port.
async fn spawn_server() -> Result<(AppState, SocketAddr, tokio::task::JoinHandle<()>)> {
    let state = AppState::default();
    let app = build_router(state.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            eprintln!("server error: {}", e);
        }
    });
    Ok((state, addr, handle))
}

async fn connect(addr: SocketAddr, game_id: &str) -> Result<Ws> {
    let url = format!("ws://{}/ws/{}", addr, game_id);
    let (ws, _) = tokio_tungstenite::connect_async(&url).await?;
    Ok(ws)
}

async fn send(ws: &mut Ws, cm: &ClientMsg) -> Result<()> {
    ws.send(Message::Text(serde_json::to_string(cm)?)).await?;
    Ok(())
}

/// Next server message, skipping non-text frames. Fails after two seconds.
async fn recv(ws: &mut Ws) -> Result<ServerMsg> {
    loop {
        let frame = tokio::time::timeout(Duration::from_secs(2), ws.next())
            .await
            .map_err(|_| anyhow!("timed out waiting for a server message"))?
            .ok_or_else(|| anyhow!("connection closed"))??;
        if let Message::Text(txt) = frame {
            return Ok(serde_json::from_str(&txt)?);
        }
    }
}

/// Assert nothing arrives within a short window.
async fn assert_silent(ws: &mut Ws) {
    let next = tokio::time::timeout(Duration::from_millis(200), ws.next()).await;
    assert!(next.is_err(), "expected no message, got {:?}", next);
}

async fn join_pair(addr: SocketAddr, game_id: &str) -> Result<(Ws, Ws)> {
    let mut x = connect(addr, game_id).await?;
    assert_eq!(recv(&mut x).await?, ServerMsg::PlayerAssignment { player: Symbol::X });
    let mut o = connect(addr, game_id).await?;
    assert_eq!(recv(&mut o).await?, ServerMsg::PlayerAssignment { player: Symbol::O });

    let start = ServerMsg::StartGame {
        current_player: Symbol::X,
        score: Score::default(),
    };
    assert_eq!(recv(&mut x).await?, start);
    assert_eq!(recv(&mut o).await?, start);
    Ok((x, o))
}

async fn wait_until_removed(state: &AppState, game_id: &str) -> bool {
    for _ in 0..50 {
        if !state.registry.contains(game_id).await {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    false
}

#[tokio::test]
async fn two_players_exchange_moves() -> Result<()> {
    let (_state, addr, server) = spawn_server().await?;
    let (mut x, mut o) = join_pair(addr, "abc").await?;

    send(&mut x, &ClientMsg::MakeMove { row: 0, col: 0 }).await?;
    for ws in [&mut x, &mut o] {
        match recv(ws).await? {
            ServerMsg::Move {
                board,
                current_player,
            } => {
                assert_eq!(board.0[0][0], Cell::X);
                assert_eq!(current_player, Symbol::O);
            }
            other => panic!("expected move, got {:?}", other),
        }
    }

    // occupied cell: dropped
    send(&mut o, &ClientMsg::MakeMove { row: 0, col: 0 }).await?;
    assert_silent(&mut x).await;
    assert_silent(&mut o).await;

    send(&mut o, &ClientMsg::MakeMove { row: 1, col: 1 }).await?;
    for ws in [&mut x, &mut o] {
        assert!(matches!(
            recv(ws).await?,
            ServerMsg::Move {
                current_player: Symbol::X,
                ..
            }
        ));
    }

    server.abort();
    Ok(())
}

#[tokio::test]
async fn win_then_rematch_alternates_starter() -> Result<()> {
    let (_state, addr, server) = spawn_server().await?;
    let (mut x, mut o) = join_pair(addr, "rematch").await?;

    for (row, col, x_turn) in [(0, 0, true), (1, 0, false), (0, 1, true), (1, 1, false)] {
        let mover = if x_turn { &mut x } else { &mut o };
        send(mover, &ClientMsg::MakeMove { row, col }).await?;
        // wait for the broadcast so the next move is in turn
        recv(&mut x).await?;
        recv(&mut o).await?;
    }
    send(&mut x, &ClientMsg::MakeMove { row: 0, col: 2 }).await?;

    let win = recv(&mut o).await?;
    assert!(matches!(
        win,
        ServerMsg::Win {
            player: Symbol::X,
            score: Score { x: 1, o: 0 },
            ..
        }
    ));
    assert_eq!(recv(&mut x).await?, win);

    send(&mut x, &ClientMsg::RematchRequest).await?;
    assert_silent(&mut o).await;
    send(&mut o, &ClientMsg::RematchRequest).await?;

    let expected = ServerMsg::NewGame {
        board: Board::new(),
        current_player: Symbol::O,
        score: Score { x: 1, o: 0 },
    };
    assert_eq!(recv(&mut x).await?, expected);
    assert_eq!(recv(&mut o).await?, expected);

    server.abort();
    Ok(())
}

#[tokio::test]
async fn third_client_is_rejected_and_closed() -> Result<()> {
    let (state, addr, server) = spawn_server().await?;
    let (mut x, mut o) = join_pair(addr, "full").await?;

    let mut third = connect(addr, "full").await?;
    assert_eq!(recv(&mut third).await?, ServerMsg::game_full());
    let closed = tokio::time::timeout(Duration::from_secs(2), third.next()).await?;
    assert!(matches!(closed, None | Some(Ok(Message::Close(_))) | Some(Err(_))));

    assert_silent(&mut x).await;
    assert_silent(&mut o).await;
    let snap = state
        .registry
        .get_or_create("full")
        .await
        .snapshot()
        .await
        .ok_or_else(|| anyhow!("session gone"))?;
    assert_eq!(snap.seats, vec![Symbol::X, Symbol::O]);

    server.abort();
    Ok(())
}

#[tokio::test]
async fn malformed_messages_are_ignored() -> Result<()> {
    let (_state, addr, server) = spawn_server().await?;
    let (mut x, mut o) = join_pair(addr, "junk").await?;

    x.send(Message::Text("not json".into())).await?;
    x.send(Message::Text(r#"{"event":"resign"}"#.into())).await?;
    x.send(Message::Text(r#"{"event":"make_move","row":9,"col":0}"#.into())).await?;
    assert_silent(&mut o).await;

    // connection still serves valid input
    send(&mut x, &ClientMsg::MakeMove { row: 2, col: 2 }).await?;
    assert!(matches!(recv(&mut o).await?, ServerMsg::Move { .. }));

    server.abort();
    Ok(())
}

#[tokio::test]
async fn departures_notify_and_clean_up() -> Result<()> {
    let (state, addr, server) = spawn_server().await?;
    let (mut x, mut o) = join_pair(addr, "leave").await?;

    send(&mut x, &ClientMsg::MakeMove { row: 0, col: 0 }).await?;
    recv(&mut x).await?;
    recv(&mut o).await?;

    x.close(None).await?;
    assert_eq!(recv(&mut o).await?, ServerMsg::OpponentLeft);
    assert!(state.registry.contains("leave").await);

    drop(o);
    assert!(wait_until_removed(&state, "leave").await);

    // a fresh session starts over
    let (mut x2, _o2) = join_pair(addr, "leave").await?;
    send(&mut x2, &ClientMsg::MakeMove { row: 1, col: 1 }).await?;
    assert!(matches!(recv(&mut x2).await?, ServerMsg::Move { .. }));

    server.abort();
    Ok(())
}

#[tokio::test]
async fn http_endpoints_respond() -> Result<()> {
    let (_state, addr, server) = spawn_server().await?;

    let mut stream = TcpStream::connect(addr).await?;
    stream
        .write_all(b"GET /keep_job_alive HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
        .await?;
    let mut body = String::new();
    stream.read_to_string(&mut body).await?;
    assert!(body.starts_with("HTTP/1.1 200"));
    assert!(body.contains(r#"{"status":"Job is alive"}"#));

    server.abort();
    Ok(())
}
