//! `tablepulse-types` – shared vocabulary of the TablePulse live-operations
//! stack.
//!
//! # Modules
//!
//! - [`feed`] – live-operations records: [`KitchenOrder`], [`ServiceUpdate`],
//!   [`FinancialEvent`], [`Alert`], [`Metrics`] and the [`FeedSnapshot`]
//!   handed to consumers.
//! - [`rolling`] – [`RollingLog`], the capped newest-first log backing the
//!   service, financial and alert streams.
//! - [`wire`] – the real-time protocol: inbound [`ServerEvent`]s, outbound
//!   [`Command`]s, the application-level [`BusEvent`] and its [`Topic`].

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod feed;
pub mod rolling;
pub mod wire;

pub use feed::{
    Alert, AlertCategory, FeedSnapshot, FinancialEvent, FinancialKind, KitchenOrder, Metrics,
    OrderStatus, PaymentMethod, Priority, ServiceAction, ServiceUpdate, Severity,
};
pub use rolling::RollingLog;
pub use wire::{
    BusEvent, Command, DisconnectReason, InventoryAlert, KitchenDisplayUpdate, LiveFeedAck,
    LiveFeedData, Notification, OrderStatusChange, Pong, ReservationUpdate, RestaurantAck,
    ServerError, ServerEvent, ServerHello, TableStatusChange, Topic,
};

/// Error type shared by every TablePulse crate.
///
/// None of these cross the public surface of the transport or the simulator;
/// they are logged at the point of failure and surfaced as bus events.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PulseError {
    #[error("Connection Error: {0}")]
    Connection(String),

    #[error("Serialization Error: {0}")]
    Serialization(String),

    #[error("Protocol Error: {0}")]
    Protocol(String),

    #[error("Listener Error: {0}")]
    Listener(String),

    #[error("Config Error: {0}")]
    Config(String),

    #[error("Channel Error: {0}")]
    Channel(String),
}
