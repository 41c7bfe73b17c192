//! WebSocket upgrade + message loop. Each client message is parsed as JSON and
//! forwarded to core logic. Every request gets one reply, except `start_game`,
//! which first pushes the Loading snapshot and then the outcome.

use std::sync::Arc;
use axum::{
  extract::{
    ws::{Message, WebSocket},
    State, WebSocketUpgrade,
  },
  response::IntoResponse,
};
use tracing::{debug, error, info, instrument};

use crate::logic::{apply, Command};
use crate::protocol::{ClientWsMessage, ServerWsMessage};
use crate::state::AppState;

#[instrument(level = "info", skip(ws, state))]
pub async fn ws_upgrade(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
  info!(target: "quiz_backend", "WebSocket upgrade requested");
  ws.on_upgrade(move |socket| handle_ws(socket, state))
}

#[instrument(level = "info", skip(socket, state))]
async fn handle_ws(mut socket: WebSocket, state: Arc<AppState>) {
  info!(target: "quiz_backend", "WebSocket connected");
  while let Some(Ok(msg)) = socket.recv().await {
    match msg {
      Message::Text(txt) => {
        let replies = match serde_json::from_str::<ClientWsMessage>(&txt) {
          Ok(incoming) => {
            debug!(target: "quiz_backend", "WS received: {:?}", &incoming);
            handle_client_ws(incoming, &state, &mut socket).await
          }
          Err(e) => vec![ServerWsMessage::Error {
            kind: "invalid_message".into(),
            message: format!("Invalid JSON: {}", e),
            state: None,
          }],
        };

        if send_all(&mut socket, replies).await.is_err() {
          break;
        }
      }
      Message::Ping(payload) => { let _ = socket.send(Message::Pong(payload)).await; }
      Message::Close(_) => break,
      _ => {}
    }
  }
  info!(target: "quiz_backend", "WebSocket disconnected");
}

async fn send_all(socket: &mut WebSocket, replies: Vec<ServerWsMessage>) -> Result<(), axum::Error> {
  for reply in replies {
    let out = serde_json::to_string(&reply).unwrap_or_else(|e| {
      serde_json::json!({ "type": "error", "kind": "serialization", "message": format!("Serialization error: {}", e) }).to_string()
    });
    if let Err(e) = socket.send(Message::Text(out)).await {
      error!(target: "quiz_backend", error = %e, "WS send error");
      return Err(e);
    }
  }
  Ok(())
}

fn to_command(msg: ClientWsMessage) -> Option<Command> {
  Some(match msg {
    ClientWsMessage::Ping | ClientWsMessage::GetState => return None,
    ClientWsMessage::ToggleCategory { category } => Command::ToggleCategory(category),
    ClientWsMessage::SetDifficulty { difficulty } => Command::SetDifficulty(difficulty),
    ClientWsMessage::SetQuestionCount { count } => Command::SetQuestionCount(count),
    ClientWsMessage::StartGame => Command::StartGame,
    ClientWsMessage::SelectOption { index } => Command::SelectOption(index),
    ClientWsMessage::ConfirmOrAdvance => Command::ConfirmOrAdvance,
    ClientWsMessage::Restart => Command::Restart,
  })
}

#[instrument(level = "info", skip(state, socket))]
async fn handle_client_ws(msg: ClientWsMessage, state: &AppState, socket: &mut WebSocket) -> Vec<ServerWsMessage> {
  match msg {
    ClientWsMessage::Ping => return vec![ServerWsMessage::Pong],
    ClientWsMessage::GetState => return vec![ServerWsMessage::State { state: state.snapshot().await }],
    ClientWsMessage::StartGame => return start_game_ws(state, socket).await,
    _ => {}
  }

  let Some(cmd) = to_command(msg) else { return Vec::new() };
  match apply(state, cmd).await {
    Ok(view) => vec![ServerWsMessage::State { state: view }],
    Err(e) => vec![ServerWsMessage::error(&e, Some(state.snapshot().await))],
  }
}

/// Push the Loading snapshot before the provider call so the client can show a spinner.
async fn start_game_ws(state: &AppState, socket: &mut WebSocket) -> Vec<ServerWsMessage> {
  let (request, loading) = match state.begin_game().await {
    Ok(started) => started,
    Err(e) => return vec![ServerWsMessage::error(&e, Some(state.snapshot().await))],
  };
  if send_all(socket, vec![ServerWsMessage::State { state: loading }]).await.is_err() {
    // Client is gone; still finish so the session does not stay in Loading.
    let _ = state.finish_game(request).await;
    return Vec::new();
  }

  match state.finish_game(request).await {
    Ok(view) => {
      info!(target: "game", "WS start_game finished");
      vec![ServerWsMessage::State { state: view }]
    }
    Err(e) => vec![ServerWsMessage::error(&e, Some(state.snapshot().await))],
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn setup_messages_map_to_commands() {
    let cmd = to_command(ClientWsMessage::SetQuestionCount { count: 10 });
    assert!(matches!(cmd, Some(Command::SetQuestionCount(10))));
    assert!(to_command(ClientWsMessage::Ping).is_none());
    assert!(to_command(ClientWsMessage::GetState).is_none());
    assert!(matches!(to_command(ClientWsMessage::Restart), Some(Command::Restart)));
  }
}
