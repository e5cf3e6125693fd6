use crate::game::{ClientGameState, ClientPhase};
use crate::input::PaddleController;
use futures::{SinkExt, StreamExt};
use log::{debug, error, info, warn};
use shared::{ClientEvent, JoinRequest, Orientation, ProtocolError, ServerEvent, SideRequest};
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::net::TcpStream;
use tokio::time::{interval, MissedTickBehavior};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),
    #[error("Join rejected: {0}")]
    JoinRejected(String),
}

#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub url: String,
    pub name: String,
    pub side: SideRequest,
    pub orientation: Option<Orientation>,
    /// Ask for a rematch whenever a match ends
    pub restart: bool,
    pub update_interval: Duration,
    pub max_step: f64,
}

impl ClientOptions {
    pub fn new(url: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            name: name.into(),
            side: SideRequest::Auto,
            orientation: None,
            restart: false,
            update_interval: Duration::from_millis(16),
            max_step: 0.02,
        }
    }
}

/// Headless player: joins, mirrors the match and plays its paddle
pub struct Client {
    ws: WebSocketStream<MaybeTlsStream<TcpStream>>,
    options: ClientOptions,
    game_state: ClientGameState,
    controller: PaddleController,
    restart_requested: bool,
}

impl Client {
    pub async fn connect(options: ClientOptions) -> Result<Self, ClientError> {
        info!("Connecting to {}...", options.url);
        let (ws, _) = connect_async(options.url.as_str()).await?;
        info!("Connected");

        Ok(Client {
            ws,
            game_state: ClientGameState::new(options.name.clone()),
            controller: PaddleController::new(options.max_step, options.update_interval),
            options,
            restart_requested: false,
        })
    }

    pub fn state(&self) -> &ClientGameState {
        &self.game_state
    }

    pub async fn send(&mut self, event: &ClientEvent) -> Result<(), ClientError> {
        let text = event.to_json()?;
        self.ws.send(Message::Text(text)).await?;
        Ok(())
    }

    pub async fn join(&mut self) -> Result<(), ClientError> {
        self.game_state.joining();
        let request = ClientEvent::JoinGame(JoinRequest {
            name: self.options.name.clone(),
            side: self.options.side,
            orientation: self.options.orientation,
        });
        self.send(&request).await
    }

    /// Waits for the next server event and applies it to the mirror
    ///
    /// Returns `Ok(None)` once the server closes the connection.
    pub async fn next_event(&mut self) -> Result<Option<ServerEvent>, ClientError> {
        while let Some(message) = self.ws.next().await {
            match message? {
                Message::Text(text) => {
                    let event = ServerEvent::from_json(&text)?;
                    self.apply(&event);
                    return Ok(Some(event));
                }
                Message::Close(frame) => {
                    debug!("Server closed the connection: {:?}", frame);
                    return Ok(None);
                }
                _ => {}
            }
        }
        Ok(None)
    }

    fn apply(&mut self, event: &ServerEvent) {
        self.game_state.apply(event);

        if let ServerEvent::GameState(_) = event {
            if let Some(paddle_y) = self.game_state.my_paddle() {
                self.controller.sync(paddle_y);
            }
        }
        if self.game_state.phase == ClientPhase::Playing {
            self.restart_requested = false;
        }
    }

    async fn on_update(&mut self) -> Result<(), ClientError> {
        if let Some(paddle) = self.controller.update(&self.game_state, Instant::now()) {
            self.send(&ClientEvent::MovePaddle(paddle)).await?;
        }

        if self.options.restart && self.game_state.wants_rematch() && !self.restart_requested {
            info!("Requesting a rematch");
            self.restart_requested = true;
            self.send(&ClientEvent::RestartGame).await?;
        }
        Ok(())
    }

    /// Joins and plays until the server closes the connection
    pub async fn run(&mut self) -> Result<(), ClientError> {
        self.join().await?;

        let mut update_interval = interval(self.options.update_interval);
        update_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                event = self.next_event() => {
                    match event? {
                        Some(ServerEvent::Error { message }) if self.game_state.my_side.is_none() => {
                            error!("Join rejected: {}", message);
                            return Err(ClientError::JoinRejected(message));
                        }
                        Some(ServerEvent::ScoreUpdate(score)) => match self.game_state.my_side {
                            Some(side) => info!(
                                "Score {} - {} (us - them)",
                                score.get(side),
                                score.get(side.opponent())
                            ),
                            None => info!("Score {} - {}", score.left, score.right),
                        },
                        Some(_) => {}
                        None => {
                            warn!("Disconnected from server");
                            break;
                        }
                    }
                },

                _ = update_interval.tick() => {
                    self.on_update().await?;
                },
            }
        }

        let _ = self.ws.close(None).await;
        Ok(())
    }
}
