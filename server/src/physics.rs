//! Fixed-timestep ball integrator
//!
//! All positions are normalized to the unit square so the simulation does not
//! depend on any client's viewport. One call to [`step`] advances the ball by
//! exactly one tick.

use rand::Rng;
use shared::{
    Ball, Side, BALL_INITIAL_SPEED, BALL_SPIN_FACTOR, PADDLE_HALF_HEIGHT, PADDLE_WIDTH,
};

/// Advances the ball one tick against the given paddle centers
///
/// A paddle of `None` means the side is unoccupied and never collides.
/// Returns the side that scored when the ball left the field this tick; the
/// ball is left outside the field so the caller can serve a new one.
pub fn step(ball: &mut Ball, left_paddle: Option<f64>, right_paddle: Option<f64>) -> Option<Side> {
    ball.x += ball.vx * ball.speed;
    ball.y += ball.vy * ball.speed;

    // Top and bottom walls
    if ball.y <= 0.0 || ball.y >= 1.0 {
        ball.vy = -ball.vy;
        ball.y = ball.y.clamp(0.0, 1.0);
    }

    if let Some(paddle_y) = left_paddle {
        if ball.x <= PADDLE_WIDTH && ball.vx < 0.0 && within_paddle(ball.y, paddle_y) {
            deflect(ball, paddle_y, PADDLE_WIDTH);
        }
    }

    if let Some(paddle_y) = right_paddle {
        if ball.x >= 1.0 - PADDLE_WIDTH && ball.vx > 0.0 && within_paddle(ball.y, paddle_y) {
            deflect(ball, paddle_y, 1.0 - PADDLE_WIDTH);
        }
    }

    if ball.x < 0.0 {
        Some(Side::Right)
    } else if ball.x > 1.0 {
        Some(Side::Left)
    } else {
        None
    }
}

/// Centered ball for the next rally
///
/// Horizontal direction is a coin flip at full speed, vertical velocity is
/// uniform in `[-BALL_INITIAL_SPEED / 2, BALL_INITIAL_SPEED / 2)`.
pub fn serve<R: Rng + ?Sized>(rng: &mut R) -> Ball {
    let vx = if rng.gen_bool(0.5) {
        BALL_INITIAL_SPEED
    } else {
        -BALL_INITIAL_SPEED
    };
    let vy = (rng.gen::<f64>() - 0.5) * BALL_INITIAL_SPEED;
    Ball::centered(vx, vy)
}

fn within_paddle(ball_y: f64, paddle_y: f64) -> bool {
    ball_y >= paddle_y - PADDLE_HALF_HEIGHT && ball_y <= paddle_y + PADDLE_HALF_HEIGHT
}

fn deflect(ball: &mut Ball, paddle_y: f64, plane_x: f64) {
    ball.vx = -ball.vx;
    ball.x = plane_x;
    // Off-center hits add spin proportional to the offset
    let hit_offset = (ball.y - paddle_y) / PADDLE_HALF_HEIGHT;
    ball.vy += hit_offset * BALL_SPIN_FACTOR;
}
