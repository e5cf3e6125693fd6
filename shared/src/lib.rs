use serde::{Deserialize, Serialize};
use std::fmt;

pub mod protocol;

pub use protocol::{ClientEvent, JoinRequest, PaddleMove, ProtocolError, ServerEvent};

/// Ball speed along each axis at serve, in normalized units per tick.
pub const BALL_INITIAL_SPEED: f64 = 0.01;
/// Vertical velocity added per unit of normalized hit offset from paddle center.
pub const BALL_SPIN_FACTOR: f64 = 0.005;
/// Distance of the paddle collision plane from each goal line.
pub const PADDLE_WIDTH: f64 = 0.02;
/// Paddle length along its travel axis.
pub const PADDLE_HEIGHT: f64 = 0.15;
pub const PADDLE_HALF_HEIGHT: f64 = PADDLE_HEIGHT / 2.0;
/// Lowest paddle center allowed on the travel axis.
pub const PADDLE_MIN: f64 = PADDLE_HALF_HEIGHT;
/// Highest paddle center allowed on the travel axis.
pub const PADDLE_MAX: f64 = 1.0 - PADDLE_HALF_HEIGHT;
pub const PADDLE_START: f64 = 0.5;
pub const TICK_RATE: u32 = 60;
pub const WIN_SCORE: u32 = 10;
pub const DEFAULT_PORT: u16 = 3000;

/// Identity the transport assigns to each connection.
pub type ConnectionId = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Left,
    Right,
}

impl Side {
    /// Both sides in auto-assignment order.
    pub const ALL: [Side; 2] = [Side::Left, Side::Right];

    pub fn opponent(self) -> Side {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Left => write!(f, "left"),
            Side::Right => write!(f, "right"),
        }
    }
}

/// Side asked for in a join request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SideRequest {
    Left,
    Right,
    Auto,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    #[default]
    Horizontal,
    Vertical,
}

/// Clamps a requested paddle center to the playable travel range.
pub fn clamp_paddle(position: f64) -> f64 {
    position.clamp(PADDLE_MIN, PADDLE_MAX)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerSlot {
    pub id: ConnectionId,
    pub name: String,
    pub side: Side,
    /// Paddle center along its travel axis, normalized.
    pub paddle_y: f64,
}

impl PlayerSlot {
    pub fn new(id: ConnectionId, name: impl Into<String>, side: Side) -> Self {
        Self {
            id,
            name: name.into(),
            side,
            paddle_y: PADDLE_START,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ball {
    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
    pub speed: f64,
}

impl Ball {
    /// Ball at kick-off: centered, heading down-right.
    pub fn initial() -> Self {
        Self::centered(BALL_INITIAL_SPEED, BALL_INITIAL_SPEED)
    }

    pub fn centered(vx: f64, vy: f64) -> Self {
        Self {
            x: 0.5,
            y: 0.5,
            vx,
            vy,
            speed: 1.0,
        }
    }
}

impl Default for Ball {
    fn default() -> Self {
        Self::initial()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Score {
    pub left: u32,
    pub right: u32,
}

impl Score {
    pub fn get(&self, side: Side) -> u32 {
        match side {
            Side::Left => self.left,
            Side::Right => self.right,
        }
    }

    /// Awards a point and returns the side's new total.
    pub fn increment(&mut self, side: Side) -> u32 {
        let counter = match side {
            Side::Left => &mut self.left,
            Side::Right => &mut self.right,
        };
        *counter += 1;
        *counter
    }
}

/// The two player slots, keyed by side.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Players {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub left: Option<PlayerSlot>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub right: Option<PlayerSlot>,
}

impl Players {
    pub fn get(&self, side: Side) -> Option<&PlayerSlot> {
        match side {
            Side::Left => self.left.as_ref(),
            Side::Right => self.right.as_ref(),
        }
    }

    pub fn get_mut(&mut self, side: Side) -> Option<&mut PlayerSlot> {
        self.entry(side).as_mut()
    }

    pub fn entry(&mut self, side: Side) -> &mut Option<PlayerSlot> {
        match side {
            Side::Left => &mut self.left,
            Side::Right => &mut self.right,
        }
    }

    pub fn count(&self) -> usize {
        self.iter().count()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PlayerSlot> {
        self.left.iter().chain(self.right.iter())
    }
}

/// Full match state as sent in a `gameState` broadcast.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GameSnapshot {
    pub players: Players,
    pub ball: Ball,
    pub score: Score,
    #[serde(rename = "gameStarted")]
    pub started: bool,
    #[serde(rename = "gameEnded")]
    pub ended: bool,
    pub winner: Option<Side>,
    pub orientation: Orientation,
    /// Last simulated tick, matching the `seq` of the latest `ballUpdate`.
    pub tick: u64,
}
