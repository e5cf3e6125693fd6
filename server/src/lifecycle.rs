//! Match lifecycle transitions
//!
//! ```text
//! Waiting --2 players--> Playing --10 points--> Ended --restart--> Playing
//!                           |                     |
//!                           +---player leaves-----+--> Ended (aborted)
//!                                                        |
//!                               last player leaves ------+--> Waiting
//! ```
//!
//! The phase is derived from the `started`/`ended` flags and the occupant
//! count rather than stored separately, so it can never disagree with the
//! snapshot clients receive.

use crate::game::GameState;
use crate::session::JoinError;
use log::info;
use shared::{Ball, ConnectionId, JoinRequest, Orientation, PlayerSlot, Score, Side, SideRequest};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchPhase {
    /// Fewer than two players
    Waiting,
    /// Both slots filled but the ball is not in play yet
    Ready,
    Playing,
    Ended,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JoinOutcome {
    pub side: Side,
    pub auto_assigned: bool,
    /// The join filled the second slot and kicked off the match
    pub started: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LeaveOutcome {
    pub removed: Option<PlayerSlot>,
    /// The departure aborted a match in session
    pub aborted: bool,
}

impl GameState {
    pub fn phase(&self) -> MatchPhase {
        if self.ended {
            MatchPhase::Ended
        } else if self.started {
            MatchPhase::Playing
        } else if self.session.is_full() {
            MatchPhase::Ready
        } else {
            MatchPhase::Waiting
        }
    }

    /// Seats a player and starts the match once both slots are filled
    ///
    /// The orientation hint only counts for the first player of a fresh match.
    pub fn join(&mut self, id: ConnectionId, request: &JoinRequest) -> Result<JoinOutcome, JoinError> {
        let first_player = self.session.occupant_count() == 0;
        let side = self.session.join(id, &request.name, request.side)?;

        if first_player {
            if let Some(orientation) = request.orientation {
                self.orientation = orientation;
                info!("Orientation set to {:?} by {}", orientation, request.name);
            }
        }

        let started = self.try_start();
        Ok(JoinOutcome {
            side,
            auto_assigned: request.side == SideRequest::Auto,
            started,
        })
    }

    /// Frees the connection's slot and applies the lifecycle consequences
    pub fn leave(&mut self, id: ConnectionId) -> LeaveOutcome {
        let Some(removed) = self.session.leave(id) else {
            return LeaveOutcome::default();
        };

        let aborted = self.in_session();
        if aborted {
            self.abort();
        }

        if self.session.occupant_count() == 0 {
            self.reset();
        }

        LeaveOutcome {
            removed: Some(removed),
            aborted,
        }
    }

    /// Starts a new match with the same two players
    ///
    /// Returns false, changing nothing, unless both slots are filled.
    pub fn restart(&mut self) -> bool {
        if !self.session.is_full() {
            return false;
        }

        self.score = Score::default();
        self.ball = Ball::initial();
        self.ended = false;
        self.winner = None;
        self.started = true;
        info!("Game restarted!");
        true
    }

    fn try_start(&mut self) -> bool {
        if !self.session.is_full() || self.started {
            return false;
        }

        // Clear whatever an aborted or finished match left behind
        self.score = Score::default();
        self.ended = false;
        self.winner = None;
        self.ball = Ball::initial();
        self.started = true;
        info!("Game started!");
        true
    }

    /// A match is in session while the ball is live and after a win until
    /// either player leaves.
    fn in_session(&self) -> bool {
        self.started || (self.ended && self.winner.is_some())
    }

    fn abort(&mut self) {
        self.started = false;
        self.ended = true;
        self.winner = None;
        self.ball = Ball::initial();
        self.orientation = Orientation::default();
        info!("Match aborted: a player left");
    }

    fn reset(&mut self) {
        self.score = Score::default();
        self.ball = Ball::initial();
        self.started = false;
        self.ended = false;
        self.winner = None;
        self.orientation = Orientation::default();
        info!("All players gone, waiting for a new match");
    }
}
