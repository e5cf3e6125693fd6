//! # Pong Client Library
//!
//! A headless reference client for the networked Pong server. It speaks the
//! same JSON-over-WebSocket protocol as a browser client, keeps a local
//! mirror of the authoritative match, and plays its own paddle by tracking
//! the ball. Useful as a sparring partner and for end-to-end tests.
//!
//! ## Architecture Overview
//!
//! The server owns the game. This client never simulates the ball; it only
//! applies what the server sends and reports where its paddle is.
//!
//! ### Snapshot and Deltas
//! A `gameState` event replaces the whole mirror. In between, `ballUpdate`,
//! `paddleUpdate` and `scoreUpdate` patch it. Ball updates carry the server
//! tick, so an update older than what is already shown is dropped.
//!
//! ### Rate-Limited Paddle Moves
//! The paddle follows the ball at a bounded speed, and a `movePaddle` is sent
//! only when the clamped position actually changes.
//!
//! ## Module Organization
//!
//! ### Game Module (`game`)
//! The local mirror and the client's view of the match phase.
//!
//! ### Input Module (`input`)
//! The ball-tracking paddle controller.
//!
//! ### Network Module (`network`)
//! Connection setup, the join handshake and the event loop.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use client::network::{Client, ClientOptions};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let options = ClientOptions::new("ws://127.0.0.1:3000", "bot");
//!     let mut client = Client::connect(options).await?;
//!     client.run().await?;
//!     Ok(())
//! }
//! ```

pub mod game;
pub mod input;
pub mod network;
