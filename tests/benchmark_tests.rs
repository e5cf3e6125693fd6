//! Performance benchmarks for critical game systems

use server::game::GameState;
use server::physics;
use server::sync;
use shared::protocol::BallUpdate;
use shared::{Ball, ClientEvent, JoinRequest, ServerEvent, SideRequest};
use std::time::Instant;

fn playing_state() -> GameState {
    let mut state = GameState::with_seed(11);
    for (id, name, side) in [(1, "alice", SideRequest::Left), (2, "bob", SideRequest::Right)] {
        let request = JoinRequest {
            name: name.to_string(),
            side,
            orientation: None,
        };
        sync::on_event(&mut state, id, ClientEvent::JoinGame(request));
    }
    state
}

/// Benchmarks the bare physics step
#[test]
fn benchmark_physics_step() {
    let mut ball = Ball::initial();
    let mut rng = rand::thread_rng();

    let iterations = 100_000;
    let start = Instant::now();

    for _ in 0..iterations {
        if physics::step(&mut ball, Some(0.5), Some(0.5)).is_some() {
            ball = physics::serve(&mut rng);
        }
    }

    let duration = start.elapsed();
    println!(
        "Physics step: {} iterations in {:?} ({:.2} ns/iter)",
        iterations,
        duration,
        duration.as_nanos() as f64 / iterations as f64
    );

    // Should complete in under 100ms for 100k iterations
    assert!(duration.as_millis() < 100);
}

/// Benchmarks a full server tick including message construction
#[test]
fn benchmark_server_tick() {
    let mut state = playing_state();

    let iterations = 10_000;
    let mut messages = 0;
    let start = Instant::now();

    for _ in 0..iterations {
        messages += sync::on_tick(&mut state).len();
        if !state.is_running() {
            state.restart();
        }
    }

    let duration = start.elapsed();
    println!(
        "Server tick: {} iterations, {} messages in {:?} ({:.2} μs/iter)",
        iterations,
        messages,
        duration,
        duration.as_micros() as f64 / iterations as f64
    );

    assert!(messages >= iterations);
    // 60 Hz leaves ~16ms per tick; stay far below that
    assert!(duration.as_millis() < 500);
}

/// Benchmarks encoding the per-tick broadcast
#[test]
fn benchmark_ball_update_encoding() {
    let event = ServerEvent::BallUpdate(BallUpdate {
        ball: Ball::initial(),
        seq: 12345,
    });

    let iterations = 50_000;
    let mut total_bytes = 0;
    let start = Instant::now();

    for _ in 0..iterations {
        total_bytes += event.to_json().unwrap().len();
    }

    let duration = start.elapsed();
    println!(
        "Ball update encoding: {} iterations, {} bytes in {:?} ({:.2} ns/iter)",
        iterations,
        total_bytes,
        duration,
        duration.as_nanos() as f64 / iterations as f64
    );

    assert!(duration.as_millis() < 2000);
}

/// Benchmarks decoding inbound paddle moves, the most frequent client event
#[test]
fn benchmark_paddle_move_decoding() {
    let text = r#"{"event":"movePaddle","data":{"side":"left","paddleY":0.42}}"#;

    let iterations = 50_000;
    let start = Instant::now();

    for _ in 0..iterations {
        let event = ClientEvent::from_json(text).unwrap();
        assert_eq!(event.name(), "movePaddle");
    }

    let duration = start.elapsed();
    println!(
        "Paddle move decoding: {} iterations in {:?} ({:.2} ns/iter)",
        iterations,
        duration,
        duration.as_nanos() as f64 / iterations as f64
    );

    assert!(duration.as_millis() < 2000);
}

/// Benchmarks the client mirror applying a stream of ball updates
#[test]
fn benchmark_client_mirror() {
    use client::game::ClientGameState;

    let mut mirror = ClientGameState::new("bench");
    let events: Vec<ServerEvent> = (1..=10_000)
        .map(|seq| {
            ServerEvent::BallUpdate(BallUpdate {
                ball: Ball::initial(),
                seq,
            })
        })
        .collect();

    let start = Instant::now();
    let applied = events.iter().filter(|event| mirror.apply(event)).count();
    let duration = start.elapsed();

    println!(
        "Client mirror: {} updates in {:?} ({:.2} ns/update)",
        applied,
        duration,
        duration.as_nanos() as f64 / applied as f64
    );

    assert_eq!(applied, events.len());
    assert_eq!(mirror.last_ball_seq(), 10_000);
    assert!(duration.as_millis() < 100);
}
