//! Player slot registry for the single two-sided match
//!
//! This module tracks which connection owns the left and right slots:
//! - Explicit side requests succeed only when the side is free
//! - Automatic requests take the first free side, left before right
//! - A connection can own at most one slot
//! - Leaving frees whatever slot the connection owned
//!
//! Slot ownership is the only authority check the server performs on
//! paddle input, so every lookup goes through the owning connection id.

use log::info;
use shared::{ConnectionId, PlayerSlot, Players, Side, SideRequest};
use thiserror::Error;

/// Reasons a join request is rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum JoinError {
    #[error("Side already taken")]
    SideTaken(Side),
    #[error("Game is full")]
    GameFull,
    #[error("Already joined as {0}")]
    AlreadyJoined(Side),
}

/// Holds the two player slots of the match
#[derive(Debug, Clone, Default)]
pub struct SessionRegistry {
    players: Players,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assigns a slot to the connection
    ///
    /// Returns the side taken. A rejected join leaves the registry untouched.
    pub fn join(
        &mut self,
        id: ConnectionId,
        name: &str,
        requested: SideRequest,
    ) -> Result<Side, JoinError> {
        if let Some(owned) = self.side_of(id) {
            return Err(JoinError::AlreadyJoined(owned));
        }

        let side = match requested {
            SideRequest::Left => Side::Left,
            SideRequest::Right => Side::Right,
            SideRequest::Auto => self.first_free_side().ok_or(JoinError::GameFull)?,
        };

        let slot = self.players.entry(side);
        if slot.is_some() {
            return Err(JoinError::SideTaken(side));
        }
        *slot = Some(PlayerSlot::new(id, name, side));

        info!(
            "Player {} joined as {} ({} of 2)",
            name,
            side,
            self.occupant_count()
        );
        Ok(side)
    }

    /// Frees the slot owned by the connection, if any
    pub fn leave(&mut self, id: ConnectionId) -> Option<PlayerSlot> {
        let side = self.side_of(id)?;
        let slot = self.players.entry(side).take();
        info!(
            "Player {} left. Total players: {}",
            side,
            self.occupant_count()
        );
        slot
    }

    pub fn occupant_count(&self) -> usize {
        self.players.count()
    }

    pub fn is_full(&self) -> bool {
        self.occupant_count() == Side::ALL.len()
    }

    /// Side owned by the connection
    pub fn side_of(&self, id: ConnectionId) -> Option<Side> {
        self.players.iter().find(|slot| slot.id == id).map(|slot| slot.side)
    }

    pub fn slot(&self, side: Side) -> Option<&PlayerSlot> {
        self.players.get(side)
    }

    /// Paddle center of an occupied side
    pub fn paddle_y(&self, side: Side) -> Option<f64> {
        self.players.get(side).map(|slot| slot.paddle_y)
    }

    /// Moves the paddle of `side` if `id` owns it
    ///
    /// Returns false when the side is free or owned by someone else.
    pub fn set_paddle(&mut self, id: ConnectionId, side: Side, paddle_y: f64) -> bool {
        match self.players.get_mut(side) {
            Some(slot) if slot.id == id => {
                slot.paddle_y = paddle_y;
                true
            }
            _ => false,
        }
    }

    pub fn players(&self) -> &Players {
        &self.players
    }

    fn first_free_side(&self) -> Option<Side> {
        Side::ALL
            .into_iter()
            .find(|side| self.players.get(*side).is_none())
    }
}
