//! `tablepulse-middleware` – the real-time plumbing.
//!
//! Moves events between the remote live-operations endpoint and in-process
//! listeners without caring what the events mean.
//!
//! # Modules
//!
//! - [`bus`] – [`EventBus`]: topic-keyed callback registry with per-listener
//!   failure isolation, plus a broadcast tap for async consumers.
//! - [`frame`] – JSON frame codec between wire text and typed events.
//! - [`transport`] – [`Transport`]: connection state machine with bounded,
//!   fixed-interval reconnection and best-effort outbound commands.
//! - [`ws_link`] – [`WsLink`]: the tokio-tungstenite [`Link`] used in
//!   production.

pub mod bus;
pub mod frame;
pub mod transport;
pub mod ws_link;

pub use bus::{EventBus, Listener, listener};
pub use transport::{
    ConnectParams, ConnectionState, Link, LinkEvent, MAX_RECONNECT_ATTEMPTS, RECONNECT_INTERVAL,
    Transport, TransportConfig,
};
pub use ws_link::WsLink;
