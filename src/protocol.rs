//! Public protocol structs for WebSocket and HTTP endpoints (serde ready).
//! Each client message maps 1:1 onto a session operation; every reply carries
//! the full render model so the UI never has to patch state itself.

use serde::{Deserialize, Serialize};

use crate::error::QuizError;
use crate::view::SessionView;

/// Messages the client can send over WebSocket.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientWsMessage {
    Ping,
    GetState,
    ToggleCategory { category: String },
    SetDifficulty { difficulty: String },
    SetQuestionCount { count: usize },
    StartGame,
    SelectOption { index: usize },
    ConfirmOrAdvance,
    Restart,
}

/// Messages the server sends back over WebSocket.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerWsMessage {
    Pong,
    State {
        state: SessionView,
    },
    Error {
        kind: String,
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        state: Option<SessionView>,
    },
}

impl ServerWsMessage {
    pub fn error(err: &QuizError, state: Option<SessionView>) -> Self {
        ServerWsMessage::Error {
            kind: err.kind().to_string(),
            message: err.to_string(),
            state,
        }
    }
}

//
// HTTP request/response DTOs
//

#[derive(Debug, Deserialize)]
pub struct CategoryIn {
    pub category: String,
}

#[derive(Debug, Deserialize)]
pub struct DifficultyIn {
    pub difficulty: String,
}

#[derive(Debug, Deserialize)]
pub struct CountIn {
    pub count: usize,
}

#[derive(Debug, Deserialize)]
pub struct SelectIn {
    pub index: usize,
}

#[derive(Debug, Serialize)]
pub struct ErrorOut {
    pub error: &'static str,
    pub message: String,
    pub state: SessionView,
}

#[derive(Serialize)]
pub struct HealthOut {
    pub ok: bool,
    pub provider: &'static str,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_messages_use_snake_case_tags() {
        let msg: ClientWsMessage =
            serde_json::from_str(r#"{"type":"toggle_category","category":"Space"}"#).unwrap();
        assert!(matches!(msg, ClientWsMessage::ToggleCategory { ref category } if category == "Space"));

        let msg: ClientWsMessage = serde_json::from_str(r#"{"type":"confirm_or_advance"}"#).unwrap();
        assert!(matches!(msg, ClientWsMessage::ConfirmOrAdvance));

        assert!(serde_json::from_str::<ClientWsMessage>(r#"{"type":"select_option","index":-1}"#).is_err());
    }

    #[test]
    fn error_message_carries_kind_and_text() {
        let out = serde_json::to_value(ServerWsMessage::error(&QuizError::NoSelection, None)).unwrap();
        assert_eq!(out["type"], "error");
        assert_eq!(out["kind"], "no_selection");
        assert_eq!(out["message"], "please select an answer first");
        assert!(out.get("state").is_none());
    }
}
