//! Server network layer handling WebSocket connections and game loop coordination

use crate::client_manager::{Connection, ConnectionManager};
use crate::config::{OriginPolicy, ServerConfig};
use crate::game::GameState;
use crate::sync::{self, Outbound};
use futures::{SinkExt, StreamExt};
use log::{debug, error, info, warn};
use shared::{ConnectionId, ServerEvent};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::time::{interval, MissedTickBehavior};
use tokio_tungstenite::accept_hdr_async;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::http::{header::ORIGIN, StatusCode};
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Failed to bind: {0}")]
    Bind(#[from] std::io::Error),
}

/// Messages sent from connection tasks to the main server loop
#[derive(Debug)]
pub enum ServerMessage {
    Connected {
        id: ConnectionId,
        addr: SocketAddr,
        sender: mpsc::UnboundedSender<Message>,
    },
    TextReceived {
        id: ConnectionId,
        text: String,
    },
    Disconnected {
        id: ConnectionId,
    },
    Shutdown,
}

/// Main server coordinating connections and game simulation
///
/// All match state lives in the run loop; connection tasks only forward
/// frames through the inbox, so events and ticks never interleave.
pub struct Server {
    listener: Arc<TcpListener>,
    local_addr: SocketAddr,
    config: ServerConfig,
    connections: ConnectionManager,
    game_state: GameState,

    server_tx: mpsc::UnboundedSender<ServerMessage>,
    server_rx: mpsc::UnboundedReceiver<ServerMessage>,
}

impl Server {
    pub async fn new(config: ServerConfig) -> Result<Self, ServerError> {
        Self::with_game_state(config, GameState::new()).await
    }

    pub async fn with_game_state(
        config: ServerConfig,
        game_state: GameState,
    ) -> Result<Self, ServerError> {
        let listener = TcpListener::bind(&config.bind_addr).await?;
        let local_addr = listener.local_addr()?;
        info!("Server listening on {}", local_addr);

        let (server_tx, server_rx) = mpsc::unbounded_channel();

        Ok(Server {
            listener: Arc::new(listener),
            local_addr,
            connections: ConnectionManager::new(config.max_connections),
            config,
            game_state,
            server_tx,
            server_rx,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// A sender into the server loop, e.g. for requesting shutdown
    pub fn handle(&self) -> mpsc::UnboundedSender<ServerMessage> {
        self.server_tx.clone()
    }

    /// Spawns the task accepting TCP connections and upgrading them
    fn spawn_acceptor(&self) -> tokio::task::JoinHandle<()> {
        let listener = Arc::clone(&self.listener);
        let origins = Arc::new(self.config.origins.clone());
        let server_tx = self.server_tx.clone();

        tokio::spawn(async move {
            let mut next_id: ConnectionId = 1;

            loop {
                match listener.accept().await {
                    Ok((stream, addr)) => {
                        let id = next_id;
                        next_id = next_id.wrapping_add(1);
                        tokio::spawn(handle_connection(
                            stream,
                            addr,
                            id,
                            Arc::clone(&origins),
                            server_tx.clone(),
                        ));
                    }
                    Err(e) => {
                        error!("Error accepting connection: {}", e);
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    }
                }
            }
        })
    }

    fn dispatch(&self, messages: Vec<Outbound>) {
        for outbound in &messages {
            self.connections.deliver(outbound);
        }
    }

    fn handle_connected(
        &mut self,
        id: ConnectionId,
        addr: SocketAddr,
        sender: mpsc::UnboundedSender<Message>,
    ) {
        let connection = Connection::new(id, addr, sender.clone());
        if !self.connections.add_connection(connection) {
            warn!("Rejecting connection from {}: server full", addr);
            reject(&sender, "Server full");
            return;
        }

        let messages = sync::on_connect(&self.game_state, id);
        self.dispatch(messages);
    }

    fn handle_text(&mut self, id: ConnectionId, text: &str) {
        if !self.connections.contains(&id) {
            return;
        }
        if let Some(event) = sync::decode(id, text) {
            debug!("Connection {} sent {}", id, event.name());
            let messages = sync::on_event(&mut self.game_state, id, event);
            self.dispatch(messages);
        }
    }

    fn handle_disconnected(&mut self, id: ConnectionId) {
        if !self.connections.remove_connection(&id) {
            return;
        }
        let messages = sync::on_disconnect(&mut self.game_state, id);
        self.dispatch(messages);
    }

    fn handle_tick(&mut self) {
        let messages = sync::on_tick(&mut self.game_state);
        if messages.is_empty() {
            return;
        }
        self.dispatch(messages);

        let tick = self.game_state.tick;
        let once_a_second = tick > 0 && tick % u64::from(self.config.tick_rate.max(1)) == 0;
        if once_a_second && !self.connections.is_empty() {
            debug!(
                "Tick {}: {} connections, score {} - {}",
                tick,
                self.connections.len(),
                self.game_state.score.left,
                self.game_state.score.right
            );
        }
    }

    /// Main server loop: connection events and physics ticks, one at a time
    pub async fn run(&mut self) -> Result<(), ServerError> {
        let acceptor = self.spawn_acceptor();

        let mut tick_interval = interval(self.config.tick_duration());
        tick_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(
            "Server started successfully ({} Hz, up to {} connections)",
            self.config.tick_rate, self.config.max_connections
        );

        loop {
            tokio::select! {
                message = self.server_rx.recv() => {
                    match message {
                        Some(ServerMessage::Connected { id, addr, sender }) => {
                            self.handle_connected(id, addr, sender);
                        },
                        Some(ServerMessage::TextReceived { id, text }) => {
                            self.handle_text(id, &text);
                        },
                        Some(ServerMessage::Disconnected { id }) => {
                            self.handle_disconnected(id);
                        },
                        Some(ServerMessage::Shutdown) | None => {
                            info!("Server shutting down");
                            break;
                        }
                    }
                },

                _ = tick_interval.tick() => {
                    self.handle_tick();
                },
            }
        }

        acceptor.abort();
        Ok(())
    }
}

/// Tells a connection why it is being turned away, then closes it
fn reject(sender: &mpsc::UnboundedSender<Message>, reason: &'static str) {
    let error = ServerEvent::Error {
        message: reason.to_string(),
    };
    if let Ok(text) = error.to_json() {
        let _ = sender.send(Message::Text(text));
    }
    let _ = sender.send(Message::Close(Some(CloseFrame {
        code: CloseCode::Again,
        reason: reason.into(),
    })));
}

fn forbidden() -> ErrorResponse {
    let mut response = ErrorResponse::new(Some("Origin not allowed".to_string()));
    *response.status_mut() = StatusCode::FORBIDDEN;
    response
}

/// Upgrades a TCP stream and pumps its frames to and from the server loop
async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    id: ConnectionId,
    origins: Arc<OriginPolicy>,
    server_tx: mpsc::UnboundedSender<ServerMessage>,
) {
    let check_origin = move |request: &Request, response: Response| {
        let origin = request
            .headers()
            .get(ORIGIN)
            .and_then(|value| value.to_str().ok());

        if origins.allows(origin) {
            Ok(response)
        } else {
            warn!("Refusing {} from origin {:?}", addr, origin);
            Err(forbidden())
        }
    };

    let ws_stream = match accept_hdr_async(stream, check_origin).await {
        Ok(ws) => ws,
        Err(e) => {
            debug!("WebSocket handshake with {} failed: {}", addr, e);
            return;
        }
    };

    let (mut ws_sender, mut ws_receiver) = ws_stream.split();
    let (tx, mut rx) = mpsc::unbounded_channel();

    if server_tx
        .send(ServerMessage::Connected { id, addr, sender: tx })
        .is_err()
    {
        return;
    }

    let send_task = tokio::spawn(async move {
        while let Some(message) = rx.recv().await {
            let closing = matches!(message, Message::Close(_));
            if ws_sender.send(message).await.is_err() || closing {
                break;
            }
        }
        // Queue dropped: the server loop has stopped
        let _ = ws_sender.close().await;
    });

    while let Some(message) = ws_receiver.next().await {
        match message {
            Ok(Message::Text(text)) => {
                if server_tx
                    .send(ServerMessage::TextReceived { id, text })
                    .is_err()
                {
                    break;
                }
            }
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                debug!("Connection {} read error: {}", id, e);
                break;
            }
        }
    }

    let _ = server_tx.send(ServerMessage::Disconnected { id });
    send_task.abort();
}
