//! Event routing between the transport and the match
//!
//! Each handler mutates the [`GameState`] and returns the messages to send,
//! tagged with who should receive them. Nothing here touches a socket, so the
//! whole protocol can be driven from tests.

use crate::game::GameState;
use log::{debug, info, warn};
use shared::protocol::BallUpdate;
use shared::{ClientEvent, ConnectionId, JoinRequest, PaddleMove, ServerEvent};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recipients {
    All,
    Only(ConnectionId),
    AllExcept(ConnectionId),
}

impl Recipients {
    pub fn includes(&self, id: ConnectionId) -> bool {
        match self {
            Recipients::All => true,
            Recipients::Only(target) => *target == id,
            Recipients::AllExcept(excluded) => *excluded != id,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Outbound {
    pub recipients: Recipients,
    pub event: ServerEvent,
}

impl Outbound {
    pub fn all(event: ServerEvent) -> Self {
        Self {
            recipients: Recipients::All,
            event,
        }
    }

    pub fn only(id: ConnectionId, event: ServerEvent) -> Self {
        Self {
            recipients: Recipients::Only(id),
            event,
        }
    }

    pub fn all_except(id: ConnectionId, event: ServerEvent) -> Self {
        Self {
            recipients: Recipients::AllExcept(id),
            event,
        }
    }
}

/// Full state for a connection that just opened
pub fn on_connect(state: &GameState, id: ConnectionId) -> Vec<Outbound> {
    vec![Outbound::only(id, ServerEvent::GameState(state.snapshot()))]
}

pub fn on_disconnect(state: &mut GameState, id: ConnectionId) -> Vec<Outbound> {
    let outcome = state.leave(id);
    if outcome.removed.is_none() {
        return Vec::new();
    }

    let mut messages = Vec::new();
    if outcome.aborted {
        messages.push(Outbound::all(ServerEvent::PlayerLeft));
    }
    messages.push(Outbound::all(ServerEvent::GameState(state.snapshot())));
    messages
}

pub fn on_event(state: &mut GameState, id: ConnectionId, event: ClientEvent) -> Vec<Outbound> {
    match event {
        ClientEvent::JoinGame(request) => join_game(state, id, &request),
        ClientEvent::MovePaddle(paddle) => move_paddle(state, id, paddle),
        ClientEvent::RestartGame => restart_game(state, id),
    }
}

/// Advances the simulation one tick and reports the results
pub fn on_tick(state: &mut GameState) -> Vec<Outbound> {
    let outcome = state.advance();
    if !outcome.simulated {
        return Vec::new();
    }

    let mut messages = Vec::new();
    if outcome.scored.is_some() {
        messages.push(Outbound::all(ServerEvent::ScoreUpdate(state.score)));
    }
    if let Some(side) = outcome.winner {
        let winner = state.session.slot(side).cloned();
        messages.push(Outbound::all(ServerEvent::GameEnded { winner }));
    }
    messages.push(Outbound::all(ServerEvent::BallUpdate(BallUpdate {
        ball: state.ball,
        seq: state.tick,
    })));
    messages
}

fn join_game(state: &mut GameState, id: ConnectionId, request: &JoinRequest) -> Vec<Outbound> {
    match state.join(id, request) {
        Ok(outcome) => {
            debug!(
                "Connection {} seated on {} (auto: {})",
                id, outcome.side, outcome.auto_assigned
            );
            // Every successful join is confirmed to the joiner
            let mut messages = vec![
                Outbound::only(id, ServerEvent::SideAssigned { side: outcome.side }),
                Outbound::all(ServerEvent::GameState(state.snapshot())),
            ];
            if outcome.started {
                messages.push(Outbound::all(ServerEvent::GameStarted));
            }
            messages
        }
        Err(e) => {
            info!("Rejected join from connection {}: {}", id, e);
            vec![Outbound::only(
                id,
                ServerEvent::Error {
                    message: e.to_string(),
                },
            )]
        }
    }
}

fn move_paddle(state: &mut GameState, id: ConnectionId, paddle: PaddleMove) -> Vec<Outbound> {
    match state.move_paddle(id, paddle.side, paddle.paddle_y) {
        Some(paddle_y) => vec![Outbound::all_except(
            id,
            ServerEvent::PaddleUpdate(PaddleMove {
                side: paddle.side,
                paddle_y,
            }),
        )],
        None => {
            debug!(
                "Ignoring paddle move for {} from connection {}",
                paddle.side, id
            );
            Vec::new()
        }
    }
}

fn restart_game(state: &mut GameState, id: ConnectionId) -> Vec<Outbound> {
    if !state.restart() {
        debug!("Ignoring restart from connection {}: not enough players", id);
        return Vec::new();
    }

    vec![
        Outbound::all(ServerEvent::GameRestarted),
        Outbound::all(ServerEvent::GameState(state.snapshot())),
    ]
}

/// Decodes a text frame into a client event, logging anything unusable
pub fn decode(id: ConnectionId, text: &str) -> Option<ClientEvent> {
    match ClientEvent::from_json(text) {
        Ok(event) => Some(event),
        Err(e) => {
            warn!("Dropping message from connection {}: {}", id, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::{Ball, Orientation, Side, SideRequest, WIN_SCORE};

    fn join(name: &str, side: SideRequest) -> ClientEvent {
        ClientEvent::JoinGame(JoinRequest {
            name: name.to_string(),
            side,
            orientation: None,
        })
    }

    fn names(messages: &[Outbound]) -> Vec<&'static str> {
        messages.iter().map(|m| m.event.name()).collect()
    }

    fn started_match() -> GameState {
        let mut state = GameState::with_seed(5);
        on_event(&mut state, 1, join("alice", SideRequest::Left));
        on_event(&mut state, 2, join("bob", SideRequest::Right));
        state
    }

    #[test]
    fn test_connect_sends_state_to_newcomer_only() {
        let state = GameState::with_seed(5);
        let messages = on_connect(&state, 9);

        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].recipients, Recipients::Only(9));
        assert!(matches!(messages[0].event, ServerEvent::GameState(_)));
    }

    #[test]
    fn test_two_joins_emit_single_game_started() {
        let mut state = GameState::with_seed(5);

        let first = on_event(&mut state, 1, join("alice", SideRequest::Left));
        assert_eq!(names(&first), vec!["sideAssigned", "gameState"]);
        assert_eq!(first[1].recipients, Recipients::All);

        let second = on_event(&mut state, 2, join("bob", SideRequest::Right));
        assert_eq!(names(&second), vec!["sideAssigned", "gameState", "gameStarted"]);

        match &second[1].event {
            ServerEvent::GameState(snapshot) => {
                assert!(snapshot.started);
                assert_eq!(snapshot.players.count(), 2);
            }
            other => panic!("Unexpected event: {:?}", other),
        }
    }

    #[test]
    fn test_auto_join_reports_side_to_joiner() {
        let mut state = GameState::with_seed(5);
        let messages = on_event(&mut state, 4, join("alice", SideRequest::Auto));

        assert_eq!(names(&messages), vec!["sideAssigned", "gameState"]);
        assert_eq!(
            messages[0],
            Outbound::only(4, ServerEvent::SideAssigned { side: Side::Left })
        );
    }

    #[test]
    fn test_explicit_join_confirms_side_to_joiner_only() {
        let mut state = GameState::with_seed(5);
        on_event(&mut state, 1, join("bot", SideRequest::Left));

        let messages = on_event(&mut state, 2, join("bot", SideRequest::Right));
        assert_eq!(
            messages[0],
            Outbound::only(2, ServerEvent::SideAssigned { side: Side::Right })
        );
        assert!(messages[1..]
            .iter()
            .all(|m| !matches!(m.event, ServerEvent::SideAssigned { .. })));
    }

    #[test]
    fn test_side_taken_goes_to_requester() {
        let mut state = GameState::with_seed(5);
        on_event(&mut state, 1, join("alice", SideRequest::Left));
        let before = state.snapshot();

        let messages = on_event(&mut state, 2, join("bob", SideRequest::Left));
        assert_eq!(
            messages,
            vec![Outbound::only(
                2,
                ServerEvent::Error {
                    message: "Side already taken".to_string()
                }
            )]
        );
        assert_eq!(state.snapshot(), before);
    }

    #[test]
    fn test_paddle_move_relayed_to_others() {
        let mut state = started_match();
        let messages = on_event(
            &mut state,
            1,
            ClientEvent::MovePaddle(PaddleMove {
                side: Side::Left,
                paddle_y: 0.99,
            }),
        );

        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].recipients, Recipients::AllExcept(1));
        assert_eq!(
            messages[0].event,
            ServerEvent::PaddleUpdate(PaddleMove {
                side: Side::Left,
                paddle_y: shared::PADDLE_MAX,
            })
        );
    }

    #[test]
    fn test_foreign_paddle_move_is_silent() {
        let mut state = started_match();
        let messages = on_event(
            &mut state,
            2,
            ClientEvent::MovePaddle(PaddleMove {
                side: Side::Left,
                paddle_y: 0.2,
            }),
        );

        assert!(messages.is_empty());
        assert_eq!(state.session.paddle_y(Side::Left), Some(0.5));
    }

    #[test]
    fn test_tick_broadcasts_ball_with_sequence() {
        let mut state = started_match();

        let first = on_tick(&mut state);
        let second = on_tick(&mut state);
        let seqs: Vec<u64> = first
            .iter()
            .chain(second.iter())
            .filter_map(|m| match &m.event {
                ServerEvent::BallUpdate(update) => Some(update.seq),
                _ => None,
            })
            .collect();

        assert_eq!(seqs, vec![1, 2]);
    }

    #[test]
    fn test_idle_tick_is_silent() {
        let mut state = GameState::with_seed(5);
        assert!(on_tick(&mut state).is_empty());
    }

    #[test]
    fn test_scoring_tick_order() {
        let mut state = started_match();
        state.ball = Ball {
            x: 0.995,
            y: 0.1,
            vx: 0.01,
            vy: 0.0,
            speed: 1.0,
        };

        let messages = on_tick(&mut state);
        assert_eq!(names(&messages), vec!["scoreUpdate", "ballUpdate"]);
        assert_eq!(
            messages[0].event,
            ServerEvent::ScoreUpdate(shared::Score { left: 1, right: 0 })
        );
    }

    #[test]
    fn test_winning_tick_announces_winner_once() {
        let mut state = started_match();
        state.score.left = WIN_SCORE - 1;
        state.ball = Ball {
            x: 0.995,
            y: 0.1,
            vx: 0.01,
            vy: 0.0,
            speed: 1.0,
        };

        let messages = on_tick(&mut state);
        assert_eq!(names(&messages), vec!["scoreUpdate", "gameEnded", "ballUpdate"]);
        match &messages[1].event {
            ServerEvent::GameEnded { winner } => {
                assert_eq!(winner.as_ref().map(|w| w.name.as_str()), Some("alice"));
            }
            other => panic!("Unexpected event: {:?}", other),
        }

        for _ in 0..5 {
            assert!(on_tick(&mut state).is_empty());
        }
    }

    #[test]
    fn test_disconnect_mid_match() {
        let mut state = started_match();
        let messages = on_disconnect(&mut state, 1);

        assert_eq!(names(&messages), vec!["playerLeft", "gameState"]);
        match &messages[1].event {
            ServerEvent::GameState(snapshot) => {
                assert!(!snapshot.started);
                assert!(snapshot.ended);
                assert_eq!(snapshot.orientation, Orientation::Horizontal);
            }
            other => panic!("Unexpected event: {:?}", other),
        }
    }

    #[test]
    fn test_spectator_disconnect_is_silent() {
        let mut state = started_match();
        assert!(on_disconnect(&mut state, 77).is_empty());
        assert!(state.is_running());
    }

    #[test]
    fn test_restart_requires_full_match() {
        let mut state = GameState::with_seed(5);
        on_event(&mut state, 1, join("alice", SideRequest::Left));
        assert!(on_event(&mut state, 1, ClientEvent::RestartGame).is_empty());

        let mut state = started_match();
        state.score.right = 6;
        let messages = on_event(&mut state, 2, ClientEvent::RestartGame);
        assert_eq!(names(&messages), vec!["gameRestarted", "gameState"]);
        assert_eq!(state.score, shared::Score::default());
    }

    #[test]
    fn test_decode_drops_garbage() {
        assert!(decode(1, "{").is_none());
        assert_eq!(
            decode(1, r#"{"event":"restartGame"}"#),
            Some(ClientEvent::RestartGame)
        );
    }

    #[test]
    fn test_recipients() {
        assert!(Recipients::All.includes(3));
        assert!(Recipients::Only(3).includes(3));
        assert!(!Recipients::Only(3).includes(4));
        assert!(Recipients::AllExcept(3).includes(4));
        assert!(!Recipients::AllExcept(3).includes(3));
    }
}
