use crate::physics;
use crate::session::SessionRegistry;
use log::{debug, info};
use rand::rngs::StdRng;
use rand::SeedableRng;
use shared::{
    clamp_paddle, Ball, ConnectionId, GameSnapshot, Orientation, Score, Side, WIN_SCORE,
};

/// The authoritative match record
///
/// Owned by the server loop; every mutation goes through the join, leave,
/// move, tick and restart entry points.
#[derive(Debug, Clone)]
pub struct GameState {
    /// Number of simulated ticks since the process started.
    pub tick: u64,
    pub session: SessionRegistry,
    pub ball: Ball,
    pub score: Score,
    pub started: bool,
    pub ended: bool,
    pub winner: Option<Side>,
    pub orientation: Orientation,
    pub(crate) rng: StdRng,
}

/// What a single physics tick did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickOutcome {
    pub simulated: bool,
    pub scored: Option<Side>,
    pub winner: Option<Side>,
}

impl GameState {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// Creates a state whose serves are reproducible
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        Self {
            tick: 0,
            session: SessionRegistry::new(),
            ball: Ball::initial(),
            score: Score::default(),
            started: false,
            ended: false,
            winner: None,
            orientation: Orientation::default(),
            rng,
        }
    }

    /// True while the ball is in play
    pub fn is_running(&self) -> bool {
        self.started && !self.ended
    }

    pub fn snapshot(&self) -> GameSnapshot {
        GameSnapshot {
            players: self.session.players().clone(),
            ball: self.ball,
            score: self.score,
            started: self.started,
            ended: self.ended,
            winner: self.winner,
            orientation: self.orientation,
            tick: self.tick,
        }
    }

    /// Applies a paddle move from a connection
    ///
    /// Returns the stored (clamped) position, or None when the connection does
    /// not own `side` or the value is not a finite number.
    pub fn move_paddle(&mut self, id: ConnectionId, side: Side, paddle_y: f64) -> Option<f64> {
        if !paddle_y.is_finite() {
            return None;
        }

        let paddle_y = clamp_paddle(paddle_y);
        if self.session.set_paddle(id, side, paddle_y) {
            Some(paddle_y)
        } else {
            None
        }
    }

    /// Runs one physics tick if the match is in play
    pub fn advance(&mut self) -> TickOutcome {
        if !self.is_running() {
            return TickOutcome::default();
        }

        self.tick += 1;
        let left = self.session.paddle_y(Side::Left);
        let right = self.session.paddle_y(Side::Right);
        let scored = physics::step(&mut self.ball, left, right);

        let mut outcome = TickOutcome {
            simulated: true,
            scored,
            winner: None,
        };

        if let Some(side) = scored {
            let points = self.score.increment(side);
            debug!(
                "Point for {} ({} - {})",
                side, self.score.left, self.score.right
            );
            if points >= WIN_SCORE {
                outcome.winner = self.declare_winner(side);
            }
            self.ball = physics::serve(&mut self.rng);
        }

        outcome
    }

    /// Ends the match in favour of `side`, at most once per match
    fn declare_winner(&mut self, side: Side) -> Option<Side> {
        if self.ended {
            return None;
        }

        self.ended = true;
        self.started = false;
        self.winner = Some(side);
        info!(
            "Game over: {} wins {} - {}",
            side, self.score.left, self.score.right
        );
        Some(side)
    }
}

impl Default for GameState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;
    use shared::{SideRequest, PADDLE_MAX, PADDLE_MIN};

    fn playing_state() -> GameState {
        let mut state = GameState::with_seed(1);
        state.session.join(1, "alice", SideRequest::Left).unwrap();
        state.session.join(2, "bob", SideRequest::Right).unwrap();
        state.started = true;
        state
    }

    #[test]
    fn test_new_state() {
        let state = GameState::with_seed(0);
        assert_eq!(state.tick, 0);
        assert!(!state.started);
        assert!(!state.ended);
        assert!(state.winner.is_none());
        assert_eq!(state.orientation, Orientation::Horizontal);
        assert_eq!(state.ball, Ball::initial());
        assert_eq!(state.score, Score::default());
    }

    #[test]
    fn test_idle_state_does_not_tick() {
        let mut state = GameState::with_seed(0);
        let outcome = state.advance();

        assert!(!outcome.simulated);
        assert_eq!(state.tick, 0);
        assert_eq!(state.ball, Ball::initial());
    }

    #[test]
    fn test_tick_moves_ball() {
        let mut state = playing_state();
        let outcome = state.advance();

        assert!(outcome.simulated);
        assert!(outcome.scored.is_none());
        assert_eq!(state.tick, 1);
        assert_approx_eq!(state.ball.x, 0.51, 1e-12);
        assert_approx_eq!(state.ball.y, 0.51, 1e-12);
    }

    #[test]
    fn test_point_resets_ball() {
        let mut state = playing_state();
        state.ball = Ball {
            x: 0.995,
            y: 0.1,
            vx: 0.01,
            vy: 0.0,
            speed: 1.0,
        };

        let outcome = state.advance();

        assert_eq!(outcome.scored, Some(Side::Left));
        assert!(outcome.winner.is_none());
        assert_eq!(state.score.left, 1);
        assert_eq!(state.score.right, 0);
        assert!(!state.ended);
        assert_eq!((state.ball.x, state.ball.y, state.ball.speed), (0.5, 0.5, 1.0));
        assert_approx_eq!(state.ball.vx.abs(), 0.01, 1e-12);
        assert!(state.ball.vy >= -0.005 && state.ball.vy <= 0.005);
    }

    #[test]
    fn test_tenth_point_ends_match_once() {
        let mut state = playing_state();
        state.score.right = WIN_SCORE - 1;
        state.ball = Ball {
            x: 0.005,
            y: 0.9,
            vx: -0.01,
            vy: 0.0,
            speed: 1.0,
        };

        let outcome = state.advance();
        assert_eq!(outcome.winner, Some(Side::Right));
        assert!(state.ended);
        assert!(!state.started);
        assert_eq!(state.winner, Some(Side::Right));

        let ball = state.ball;
        let tick = state.tick;
        for _ in 0..10 {
            assert_eq!(state.advance(), TickOutcome::default());
        }
        assert_eq!(state.ball, ball);
        assert_eq!(state.tick, tick);
    }

    #[test]
    fn test_move_paddle_clamps_and_checks_owner() {
        let mut state = playing_state();

        assert_eq!(state.move_paddle(1, Side::Left, 0.3), Some(0.3));
        assert_eq!(state.move_paddle(1, Side::Left, -4.0), Some(PADDLE_MIN));
        assert_eq!(state.move_paddle(2, Side::Right, 1.0), Some(PADDLE_MAX));
        assert_eq!(state.move_paddle(2, Side::Left, 0.6), None);
        assert_eq!(state.move_paddle(3, Side::Right, 0.6), None);
        assert_eq!(state.move_paddle(1, Side::Left, f64::NAN), None);

        assert_eq!(state.session.paddle_y(Side::Left), Some(PADDLE_MIN));
        assert_eq!(state.session.paddle_y(Side::Right), Some(PADDLE_MAX));
    }

    #[test]
    fn test_snapshot_mirrors_state() {
        let mut state = playing_state();
        state.advance();
        let snapshot = state.snapshot();

        assert!(snapshot.started);
        assert_eq!(snapshot.tick, 1);
        assert_eq!(snapshot.ball, state.ball);
        assert_eq!(snapshot.players.count(), 2);
        assert_eq!(snapshot.players.left.map(|p| p.name), Some("alice".to_string()));
    }

    #[test]
    fn test_seeded_serves_are_reproducible() {
        let mut a = GameState::with_seed(99);
        let mut b = GameState::with_seed(99);
        for _ in 0..5 {
            assert_eq!(physics::serve(&mut a.rng), physics::serve(&mut b.rng));
        }
    }
}
