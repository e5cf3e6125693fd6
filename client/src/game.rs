use log::{debug, info, warn};
use shared::{Ball, GameSnapshot, PlayerSlot, Score, ServerEvent, Side};

/// Where this client thinks the match is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientPhase {
    /// Connected but not seated
    Lobby,
    /// Seated, waiting for an opponent
    Waiting,
    Playing,
    /// Someone reached the winning score
    Ended,
    /// A player left mid-match
    Aborted,
}

/// Local mirror of the server's match state
///
/// The server is authoritative: a `gameState` replaces everything, and the
/// delta events patch the mirror in between.
#[derive(Debug, Clone)]
pub struct ClientGameState {
    pub snapshot: GameSnapshot,
    pub phase: ClientPhase,
    pub my_side: Option<Side>,
    pub winner: Option<PlayerSlot>,
    pub last_error: Option<String>,
    last_ball_seq: u64,
    name: String,
}

impl ClientGameState {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            snapshot: GameSnapshot::default(),
            phase: ClientPhase::Lobby,
            my_side: None,
            winner: None,
            last_error: None,
            last_ball_seq: 0,
            name: name.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ball(&self) -> &Ball {
        &self.snapshot.ball
    }

    pub fn score(&self) -> Score {
        self.snapshot.score
    }

    pub fn last_ball_seq(&self) -> u64 {
        self.last_ball_seq
    }

    /// Our paddle position as last reported by the server
    pub fn my_paddle(&self) -> Option<f64> {
        self.my_side
            .and_then(|side| self.snapshot.players.get(side))
            .map(|slot| slot.paddle_y)
    }

    /// Clears the error from an earlier join attempt
    ///
    /// Our side is only ever taken from `sideAssigned`.
    pub fn joining(&mut self) {
        self.last_error = None;
    }

    /// True only for the seated loser of a match that just ended
    pub fn wants_rematch(&self) -> bool {
        match (self.my_side, self.snapshot.winner) {
            (Some(mine), Some(winner)) => self.phase == ClientPhase::Ended && mine != winner,
            _ => false,
        }
    }

    /// Applies a server event; returns false if it was stale and dropped
    pub fn apply(&mut self, event: &ServerEvent) -> bool {
        match event {
            ServerEvent::GameState(snapshot) => self.apply_snapshot(snapshot),
            ServerEvent::GameStarted => {
                self.snapshot.started = true;
                self.snapshot.ended = false;
                self.winner = None;
                self.phase = ClientPhase::Playing;
                info!("Match started");
            }
            ServerEvent::PaddleUpdate(paddle) => {
                if let Some(slot) = self.snapshot.players.get_mut(paddle.side) {
                    slot.paddle_y = paddle.paddle_y;
                }
            }
            ServerEvent::BallUpdate(update) => {
                if update.seq <= self.last_ball_seq {
                    debug!(
                        "Dropping stale ball update {} (have {})",
                        update.seq, self.last_ball_seq
                    );
                    return false;
                }
                self.last_ball_seq = update.seq;
                self.snapshot.tick = update.seq;
                self.snapshot.ball = update.ball;
            }
            ServerEvent::ScoreUpdate(score) => {
                self.snapshot.score = *score;
                debug!("Score {} - {}", score.left, score.right);
            }
            ServerEvent::GameEnded { winner } => {
                self.snapshot.started = false;
                self.snapshot.ended = true;
                self.snapshot.winner = winner.as_ref().map(|slot| slot.side);
                self.winner = winner.clone();
                self.phase = ClientPhase::Ended;
                match winner {
                    Some(slot) => info!("Game over, {} wins", slot.name),
                    None => info!("Game over"),
                }
            }
            ServerEvent::GameRestarted => {
                self.snapshot.score = Score::default();
                self.snapshot.ended = false;
                self.snapshot.winner = None;
                self.winner = None;
                self.phase = ClientPhase::Playing;
                info!("Match restarted");
            }
            ServerEvent::PlayerLeft => {
                self.phase = ClientPhase::Aborted;
                info!("A player left, match aborted");
            }
            ServerEvent::SideAssigned { side } => {
                self.my_side = Some(*side);
                info!("Assigned to the {} side", side);
            }
            ServerEvent::Error { message } => {
                warn!("Server error: {}", message);
                self.last_error = Some(message.clone());
            }
        }
        true
    }

    fn apply_snapshot(&mut self, snapshot: &GameSnapshot) {
        self.snapshot = snapshot.clone();
        self.last_ball_seq = self.last_ball_seq.max(snapshot.tick);

        // An emptied slot means we were unseated
        if let Some(side) = self.my_side {
            if self.snapshot.players.get(side).is_none() {
                self.my_side = None;
            }
        }

        self.phase = self.derive_phase();
    }

    fn derive_phase(&self) -> ClientPhase {
        if self.snapshot.ended {
            if self.snapshot.winner.is_some() {
                ClientPhase::Ended
            } else {
                ClientPhase::Aborted
            }
        } else if self.snapshot.started {
            ClientPhase::Playing
        } else if self.my_side.is_some() {
            ClientPhase::Waiting
        } else {
            ClientPhase::Lobby
        }
    }
}
