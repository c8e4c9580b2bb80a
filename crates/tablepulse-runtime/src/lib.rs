//! `tablepulse-runtime` – the live-operations engine.
//!
//! # Modules
//!
//! - [`simulator`] – [`LiveOpsSimulator`][simulator::LiveOpsSimulator]:
//!   owns kitchen orders, the service / financial / alert streams and the
//!   aggregate metrics, and advances them one deterministic tick at a time
//!   from an injected, seedable random source.
//! - [`catalog`] – fixed rosters and message templates the simulator draws
//!   from.
//! - [`seed`] – the demo state a fresh feed session starts from.
//! - [`controller`] – [`FeedController`][controller::FeedController]: runs
//!   the simulator on a Tokio interval, fans snapshots out to consumers, and
//!   cancels its timer when dropped.
//! - [`telemetry`] – [`init_tracing`][telemetry::init_tracing]: initialises
//!   the global `tracing` subscriber with an optional OTLP span exporter.

pub mod catalog;
pub mod controller;
pub mod seed;
pub mod simulator;
pub mod telemetry;

pub use controller::{DEFAULT_TICK_INTERVAL, FeedController, SnapshotListener};
pub use seed::DemoState;
pub use simulator::{LiveOpsSimulator, SimulatorConfig};
pub use telemetry::{TracerProviderGuard, init_tracing};
