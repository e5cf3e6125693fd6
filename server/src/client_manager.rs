//! Connection tracking and outbound routing for the match server
//!
//! This module handles the server-side view of open WebSocket connections:
//! - Registering a connection's outbound queue once its handshake completes
//! - Enforcing the connection capacity (players plus spectators)
//! - Serializing each outbound event once and fanning it out to recipients
//! - Forgetting connections when the transport reports them closed
//!
//! Sends are fire-and-forget: a connection whose writer task has gone away is
//! skipped, and a slow connection only grows its own queue.

use crate::sync::Outbound;
use log::{debug, error, info};
use shared::ConnectionId;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::Instant;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;

/// An open connection and its outbound queue
#[derive(Debug)]
pub struct Connection {
    pub id: ConnectionId,
    pub addr: SocketAddr,
    pub connected_at: Instant,
    sender: mpsc::UnboundedSender<Message>,
}

impl Connection {
    pub fn new(id: ConnectionId, addr: SocketAddr, sender: mpsc::UnboundedSender<Message>) -> Self {
        Self {
            id,
            addr,
            connected_at: Instant::now(),
            sender,
        }
    }

    /// Queues a frame; returns false if the writer task is gone
    pub fn send(&self, message: Message) -> bool {
        self.sender.send(message).is_ok()
    }
}

/// All open connections, indexed by id
pub struct ConnectionManager {
    connections: HashMap<ConnectionId, Connection>,
    max_connections: usize,
}

impl ConnectionManager {
    pub fn new(max_connections: usize) -> Self {
        Self {
            connections: HashMap::new(),
            max_connections,
        }
    }

    /// Registers a connection
    ///
    /// Returns false if the server is at capacity; the caller is expected to
    /// close the connection.
    pub fn add_connection(&mut self, connection: Connection) -> bool {
        if self.connections.len() >= self.max_connections {
            return false;
        }

        info!("Client {} connected from {}", connection.id, connection.addr);
        self.connections.insert(connection.id, connection);
        true
    }

    pub fn remove_connection(&mut self, id: &ConnectionId) -> bool {
        if let Some(connection) = self.connections.remove(id) {
            info!(
                "Client {} disconnected after {:.1}s",
                connection.id,
                connection.connected_at.elapsed().as_secs_f32()
            );
            true
        } else {
            false
        }
    }

    /// Serializes the event and queues it for every recipient
    pub fn deliver(&self, outbound: &Outbound) {
        let text = match outbound.event.to_json() {
            Ok(text) => text,
            Err(e) => {
                error!("Failed to encode {}: {}", outbound.event.name(), e);
                return;
            }
        };

        for connection in self.connections.values() {
            if !outbound.recipients.includes(connection.id) {
                continue;
            }
            if !connection.send(Message::Text(text.clone())) {
                debug!(
                    "Dropping {} for closed connection {}",
                    outbound.event.name(),
                    connection.id
                );
            }
        }
    }

    pub fn contains(&self, id: &ConnectionId) -> bool {
        self.connections.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }
}
