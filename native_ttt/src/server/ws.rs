// WebSocket handler: one task per connected player.

use std::io::IsTerminal;
use std::time::Duration;

use anyhow::{anyhow, Result};
use axum::{
    extract::{
        ws::{Message, WebSocketUpgrade},
        Path, State,
    },
    response::IntoResponse,
};
use futures::{Sink, SinkExt, Stream, StreamExt};
use owo_colors::OwoColorize;
use ttt_shared::{ClientMsg, ServerMsg};

use crate::error::JoinError;
use crate::server::{AppState, SessionHandle};
use crate::transport::{ConnectionId, Outbox};

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Path(game_id): Path<String>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state, game_id))
}

/// Serve one connection until it closes, fails a write or loses its seat.
///
/// Generic over the socket so anything speaking axum `Message`s can be driven.
async fn handle_socket<S>(mut socket: S, state: AppState, game_id: String)
where
    S: Stream<Item = Result<Message, axum::Error>> + Sink<Message, Error = axum::Error> + Unpin,
{
    let write_timeout = state.config.write_timeout();
    let (outbox, mut outbound) = Outbox::channel(state.config.outbound_buffer);

    let (session, conn, symbol) = match state.registry.join(&game_id, outbox).await {
        Ok(joined) => joined,
        Err(e) => {
            tracing::info!(session_id = %game_id, error = %e, "rejecting connection");
            if e == JoinError::SessionFull {
                if let Err(e) = send_ws(&mut socket, &ServerMsg::game_full(), write_timeout).await {
                    tracing::debug!(error = %e, "could not notify rejected client");
                }
            }
            let _ = socket.send(Message::Close(None)).await;
            return;
        }
    };

    tracing::info!(
        "{} session={} player={} conn={}",
        tag("[CONNECT]", true),
        game_id,
        symbol,
        conn
    );

    loop {
        tokio::select! {
            outgoing = outbound.recv() => {
                match outgoing {
                    Some(msg) => {
                        if let Err(e) = send_ws(&mut socket, &msg, write_timeout).await {
                            tracing::warn!(session_id = %game_id, %conn, error = %e, "socket write failed");
                            break;
                        }
                    }
                    // The session dropped our seat.
                    None => break,
                }
            }

            incoming = socket.next() => {
                match incoming {
                    Some(Ok(Message::Text(txt))) => {
                        match serde_json::from_str::<ClientMsg>(&txt) {
                            Ok(cm) => dispatch(&session, conn, cm).await,
                            Err(e) => {
                                tracing::warn!(session_id = %game_id, %conn, error = %e, "ignoring malformed ClientMsg JSON");
                                tracing::debug!(raw_in = %txt);
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    _ => {}
                }
            }
        }
    }

    state.registry.leave(&session, conn).await;
    tracing::info!(
        "{} session={} player={} conn={}",
        tag("[DISCONNECT]", false),
        game_id,
        symbol,
        conn
    );
}

async fn dispatch(session: &SessionHandle, conn: ConnectionId, cm: ClientMsg) {
    tracing::debug!(ws_received_client_msg = ?cm);
    match cm {
        ClientMsg::MakeMove { row, col } => session.make_move(conn, row, col).await,
        ClientMsg::RematchRequest => session.request_rematch(conn).await,
    }
}

async fn send_ws<S>(socket: &mut S, msg: &ServerMsg, limit: Duration) -> Result<()>
where
    S: Sink<Message, Error = axum::Error> + Unpin,
{
    let txt = serde_json::to_string(msg)?;
    tokio::time::timeout(limit, socket.send(Message::Text(txt)))
        .await
        .map_err(|_| anyhow!("write timed out after {:?}", limit))??;
    Ok(())
}

fn tag(label: &str, connect: bool) -> String {
    if !std::io::stdout().is_terminal() {
        return label.to_owned();
    }
    if connect {
        label.bold().green().to_string()
    } else {
        label.bold().red().to_string()
    }
}
