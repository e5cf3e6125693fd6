//! # Pong Match Server Library
//!
//! This library provides the authoritative server for a two-player networked
//! Pong match. It owns the only copy of the game state that matters, runs the
//! ball physics at a fixed tick rate, and pushes the results to every open
//! WebSocket connection.
//!
//! ## Core Responsibilities
//!
//! ### Authoritative Simulation
//! Ball motion, paddle collisions, scoring and the win condition are decided
//! here. Clients only report where their own paddle is and render whatever
//! the server broadcasts.
//!
//! ### Session Management
//! A single global match with a left and a right slot:
//! - Explicit or automatic side selection
//! - Spectators for every connection that has not joined
//! - Abort and reset when a player drops out
//!
//! ### State Broadcasting
//! Each tick produces a `ballUpdate` carrying the tick number, so clients can
//! discard anything older than what they already applied. Structural changes
//! (joins, departures, restarts) are followed by a full `gameState` snapshot.
//!
//! ## Architecture Design
//!
//! ### Single Dispatch Loop
//! Connection tasks only read and write frames. Every decoded event and every
//! physics tick is handled by one loop that owns the [`game::GameState`], so
//! no handler ever observes a half-applied update and no locks are needed.
//!
//! ### JSON over WebSocket
//! Messages are `{"event": ..., "data": ...}` envelopes; see the `shared`
//! crate for the vocabulary.
//!
//! ## Module Organization
//!
//! ### Client Manager Module (`client_manager`)
//! Open connections, their outbound queues, and fan-out routing.
//!
//! ### Config Module (`config`)
//! Command line and environment configuration, including the origin
//! allow-list.
//!
//! ### Game Module (`game`)
//! The match record and the per-tick advance.
//!
//! ### Lifecycle Module (`lifecycle`)
//! Join, leave and restart transitions.
//!
//! ### Network Module (`network`)
//! Listener, handshake, per-connection tasks and the dispatch loop.
//!
//! ### Physics Module (`physics`)
//! Ball integration, bounces, paddle deflection and serves.
//!
//! ### Session Module (`session`)
//! Side slots and who owns them.
//!
//! ### Sync Module (`sync`)
//! Maps inbound events and ticks to outbound messages and their recipients.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::config::ServerConfig;
//! use server::network::Server;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ServerConfig {
//!         bind_addr: "127.0.0.1:3000".to_string(),
//!         ..ServerConfig::default()
//!     };
//!
//!     let mut server = Server::new(config).await?;
//!     server.run().await?;
//!
//!     Ok(())
//! }
//! ```

pub mod client_manager;
pub mod config;
pub mod game;
pub mod lifecycle;
pub mod network;
pub mod physics;
pub mod session;
pub mod sync;
