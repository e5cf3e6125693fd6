//! Wire protocol between clients and the match server
//!
//! Every WebSocket text frame carries one JSON envelope of the form
//! `{"event": "<name>", "data": <payload>}`. Payload-less events may omit
//! `data`. Inbound events are decoded by name so that an unknown event or a
//! bad payload can be reported separately from a malformed frame.

use crate::{Ball, GameSnapshot, Orientation, PlayerSlot, Score, Side, SideRequest};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("malformed envelope: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("unknown event `{0}`")]
    UnknownEvent(String),
    #[error("invalid payload for `{event}`: {source}")]
    InvalidPayload {
        event: String,
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JoinRequest {
    pub name: String,
    pub side: SideRequest,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub orientation: Option<Orientation>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaddleMove {
    pub side: Side,
    pub paddle_y: f64,
}

/// Events a client sends to the server.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
    JoinGame(JoinRequest),
    MovePaddle(PaddleMove),
    RestartGame,
}

#[derive(Deserialize)]
struct Envelope {
    event: String,
    #[serde(default)]
    data: Value,
}

impl ClientEvent {
    pub fn name(&self) -> &'static str {
        match self {
            ClientEvent::JoinGame(_) => "joinGame",
            ClientEvent::MovePaddle(_) => "movePaddle",
            ClientEvent::RestartGame => "restartGame",
        }
    }

    pub fn from_json(text: &str) -> Result<Self, ProtocolError> {
        let envelope: Envelope = serde_json::from_str(text)?;
        let payload = |source| ProtocolError::InvalidPayload {
            event: envelope.event.clone(),
            source,
        };

        match envelope.event.as_str() {
            "joinGame" => serde_json::from_value(envelope.data.clone())
                .map(ClientEvent::JoinGame)
                .map_err(payload),
            "movePaddle" => serde_json::from_value(envelope.data.clone())
                .map(ClientEvent::MovePaddle)
                .map_err(payload),
            "restartGame" => Ok(ClientEvent::RestartGame),
            _ => Err(ProtocolError::UnknownEvent(envelope.event.clone())),
        }
    }

    pub fn to_json(&self) -> Result<String, ProtocolError> {
        let data = match self {
            ClientEvent::JoinGame(request) => serde_json::to_value(request)?,
            ClientEvent::MovePaddle(paddle) => serde_json::to_value(paddle)?,
            ClientEvent::RestartGame => Value::Object(Default::default()),
        };
        let envelope = serde_json::json!({ "event": self.name(), "data": data });
        Ok(envelope.to_string())
    }
}

/// Ball delta broadcast once per simulated tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BallUpdate {
    #[serde(flatten)]
    pub ball: Ball,
    /// Tick that produced this position; strictly increasing per server process.
    pub seq: u64,
}

/// Events the server sends to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ServerEvent {
    GameState(GameSnapshot),
    GameStarted,
    PaddleUpdate(PaddleMove),
    BallUpdate(BallUpdate),
    ScoreUpdate(Score),
    GameEnded { winner: Option<PlayerSlot> },
    GameRestarted,
    PlayerLeft,
    SideAssigned { side: Side },
    Error { message: String },
}

impl ServerEvent {
    pub fn name(&self) -> &'static str {
        match self {
            ServerEvent::GameState(_) => "gameState",
            ServerEvent::GameStarted => "gameStarted",
            ServerEvent::PaddleUpdate(_) => "paddleUpdate",
            ServerEvent::BallUpdate(_) => "ballUpdate",
            ServerEvent::ScoreUpdate(_) => "scoreUpdate",
            ServerEvent::GameEnded { .. } => "gameEnded",
            ServerEvent::GameRestarted => "gameRestarted",
            ServerEvent::PlayerLeft => "playerLeft",
            ServerEvent::SideAssigned { .. } => "sideAssigned",
            ServerEvent::Error { .. } => "error",
        }
    }

    pub fn to_json(&self) -> Result<String, ProtocolError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(text: &str) -> Result<Self, ProtocolError> {
        Ok(serde_json::from_str(text)?)
    }
}
