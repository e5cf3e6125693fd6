//! Paddle control with rate limiting and change detection

use crate::game::{ClientGameState, ClientPhase};
use shared::{clamp_paddle, PaddleMove, PADDLE_START};
use std::time::{Duration, Instant};

/// Steers our paddle toward the ball and decides when a move is worth sending
pub struct PaddleController {
    position: f64,
    /// Largest distance the paddle travels per update
    max_step: f64,
    min_interval: Duration,
    last_sent: Option<f64>,
    last_sent_at: Option<Instant>,
}

impl PaddleController {
    pub fn new(max_step: f64, min_interval: Duration) -> Self {
        Self {
            position: PADDLE_START,
            max_step,
            min_interval,
            last_sent: Some(PADDLE_START),
            last_sent_at: None,
        }
    }

    pub fn position(&self) -> f64 {
        self.position
    }

    /// Adopts the server's view of our paddle, e.g. after a full snapshot
    pub fn sync(&mut self, paddle_y: f64) {
        self.position = clamp_paddle(paddle_y);
        self.last_sent = Some(self.position);
    }

    /// Returns a move to send, if the paddle moved and the rate limit allows
    pub fn update(&mut self, state: &ClientGameState, now: Instant) -> Option<PaddleMove> {
        let side = state.my_side?;
        if state.phase != ClientPhase::Playing {
            return None;
        }

        if let Some(at) = self.last_sent_at {
            if now.duration_since(at) < self.min_interval {
                return None;
            }
        }

        let offset = (state.ball().y - self.position).clamp(-self.max_step, self.max_step);
        self.position = clamp_paddle(self.position + offset);

        if self.last_sent == Some(self.position) {
            return None;
        }

        self.last_sent = Some(self.position);
        self.last_sent_at = Some(now);
        Some(PaddleMove {
            side,
            paddle_y: self.position,
        })
    }
}

impl Default for PaddleController {
    fn default() -> Self {
        Self::new(0.02, Duration::from_millis(16))
    }
}
