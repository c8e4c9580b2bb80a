//! `tablepulse-cockpit` – live-operations endpoint.
//!
//! Boots a small TCP server (default port `4000`) that:
//!
//! 1. **Speaks** the real-time wire protocol over WebSocket.  Every client is
//!    greeted with `connected`, and each command frame gets its reply:
//!    `join-restaurant` → `joined-restaurant`, `ping` → `pong`,
//!    `subscribe-live-feed` → `live-feed-subscribed` plus a `live-feed-data`
//!    frame per tick, and so on.
//!
//! 2. **Owns** a [`FeedController`] whose simulated feed is the data source
//!    for every `live-feed-data` frame.  `acknowledge_alert` commands are
//!    applied to it directly.
//!
//! 3. **Fans out** `table-status-update` and `reservation-update` commands as
//!    `table-status-changed` / `reservation-updated` to every client.
//!
//! 4. **Answers** plain HTTP requests with the current feed snapshot as JSON.
//!
//! # Usage
//!
//! ```rust,no_run
//! use tablepulse_cockpit::CockpitServer;
//! use tablepulse_runtime::{
//!     DEFAULT_TICK_INTERVAL, FeedController, LiveOpsSimulator, SimulatorConfig,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let simulator = LiveOpsSimulator::new(SimulatorConfig::default());
//!     let feed = FeedController::new(simulator, DEFAULT_TICK_INTERVAL);
//!     CockpitServer::new(feed).run().await?;
//!     Ok(())
//! }
//! ```
//!
//! [`FeedController`]: tablepulse_runtime::FeedController

pub mod server;

pub use server::{CockpitServer, DEFAULT_PORT};
