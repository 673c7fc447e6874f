//! # Air Hockey Client Library
//!
//! The real-time core of the two-player air hockey client: it keeps one
//! socket to the game server, streams the local paddle position at a fixed
//! rate and turns the server's discrete world snapshots into smooth motion
//! for the remote paddle and the puck.
//!
//! ## Architecture Overview
//!
//! Everything runs on a single tokio task. [`app::App`] multiplexes the
//! connection, the match loops and player input with `tokio::select!`, so
//! snapshot installation and render reads never interleave mid-update.
//!
//! ### Local Authority, Remote Interpolation
//! The local paddle is drawn exactly where the pointer puts it (clamped to
//! the defending half) and sent to the server on every capture tick. The
//! opponent and the puck are only known through `WORLD` snapshots; they are
//! drawn between the previous and the current snapshot, walking the gap in
//! `lerp_steps` render ticks and then holding until the next one arrives.
//!
//! ### Connection Lifecycle
//! A session greets the server with `HELLO`, answers liveness probes with
//! `PONG`, probes latency itself once established and reports the end of the
//! connection exactly once.
//!
//! ## Module Organization
//!
//! ### Network Module (`network`)
//! Transport abstraction, WebSocket transport, message dispatch, liveness and
//! latency probing.
//!
//! ### Interpolation Module (`interpolation`)
//! Snapshot pairs and the interpolation cursor.
//!
//! ### Game Module (`game`)
//! Per-match state and the capture/render loops.
//!
//! ### Input and Rendering Modules (`input`, `rendering`)
//! Pointer reprojection, text commands, and scene drawing against an abstract
//! surface.
//!
//! ### App Module (`app`)
//! The session controller tying the pieces together, with navigation and
//! identity persistence injected by the host.
//!
//! ## Usage Example
//!
//! ```no_run
//! use client::app::{App, LogNavigator};
//! use client::config::ClientConfig;
//! use client::identity::MemoryIdentityStore;
//! use client::network::WebSocketConnector;
//! use client::rendering::LogSurface;
//! use client::timer::SystemClock;
//! use std::sync::Arc;
//!
//! # async fn demo() -> Result<(), client::ClientError> {
//! let mut app = App::new(
//!     ClientConfig::default(),
//!     Box::new(WebSocketConnector),
//!     Arc::new(SystemClock),
//!     LogSurface,
//!     Box::new(MemoryIdentityStore::default()),
//!     Box::new(LogNavigator),
//! )?;
//!
//! let (_inputs_tx, mut inputs) = tokio::sync::mpsc::unbounded_channel();
//! app.run(&mut inputs).await?;
//! # Ok(())
//! # }
//! ```

pub mod app;
pub mod config;
pub mod error;
pub mod game;
pub mod identity;
pub mod input;
pub mod interpolation;
pub mod network;
pub mod rendering;
pub mod timer;

pub use error::ClientError;
