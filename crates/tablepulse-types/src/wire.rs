//! Real-time protocol vocabulary.
//!
//! Frames on the wire are JSON objects of the form
//! `{"event": "<wire-name>", "data": <payload>}`.  Inbound frames decode into
//! [`ServerEvent`], outbound frames encode from [`Command`]; both rely on the
//! adjacently-tagged serde representation so the wire name *is* the variant
//! tag.
//!
//! Application code never sees wire names.  It subscribes to a [`Topic`] and
//! receives a [`BusEvent`]: either a connection-lifecycle notice raised by the
//! transport itself, or a [`ServerEvent`] re-published verbatim.
//!
//! | Wire event | Topic |
//! |---|---|
//! | `connected` | [`Topic::Connected`] |
//! | `joined-restaurant` / `left-restaurant` | [`Topic::JoinedRestaurant`] / [`Topic::LeftRestaurant`] |
//! | `reservation-updated` | [`Topic::ReservationUpdated`] |
//! | `table-status-changed` | [`Topic::TableStatusChanged`] |
//! | `order-status-changed` | [`Topic::OrderStatusChanged`] |
//! | `kitchen-display-updated` | [`Topic::KitchenDisplayUpdated`] |
//! | `inventory-alert` | [`Topic::InventoryAlert`] |
//! | `live-feed-subscribed` / `-unsubscribed` / `-data` | [`Topic::LiveFeedSubscribed`] / … |
//! | `notification` | [`Topic::Notification`] |
//! | `error` | [`Topic::Error`] |
//! | `pong` | [`Topic::Pong`] |

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::feed::{FeedSnapshot, KitchenOrder, Severity};

// ---------------------------------------------------------------------------
// Topics
// ---------------------------------------------------------------------------

/// Application-level event names published on the event bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Topic {
    ConnectionEstablished,
    ConnectionLost,
    ConnectionError,
    MaxReconnectAttemptsReached,
    Connected,
    JoinedRestaurant,
    LeftRestaurant,
    ReservationUpdated,
    TableStatusChanged,
    OrderStatusChanged,
    KitchenDisplayUpdated,
    InventoryAlert,
    LiveFeedSubscribed,
    LiveFeedUnsubscribed,
    LiveFeedData,
    Notification,
    Error,
    Pong,
}

impl Topic {
    pub const ALL: [Topic; 18] = [
        Topic::ConnectionEstablished,
        Topic::ConnectionLost,
        Topic::ConnectionError,
        Topic::MaxReconnectAttemptsReached,
        Topic::Connected,
        Topic::JoinedRestaurant,
        Topic::LeftRestaurant,
        Topic::ReservationUpdated,
        Topic::TableStatusChanged,
        Topic::OrderStatusChanged,
        Topic::KitchenDisplayUpdated,
        Topic::InventoryAlert,
        Topic::LiveFeedSubscribed,
        Topic::LiveFeedUnsubscribed,
        Topic::LiveFeedData,
        Topic::Notification,
        Topic::Error,
        Topic::Pong,
    ];

    /// Underscored topic name, e.g. `"table_status_changed"`.
    pub fn name(self) -> &'static str {
        match self {
            Topic::ConnectionEstablished => "connection_established",
            Topic::ConnectionLost => "connection_lost",
            Topic::ConnectionError => "connection_error",
            Topic::MaxReconnectAttemptsReached => "max_reconnect_attempts_reached",
            Topic::Connected => "connected",
            Topic::JoinedRestaurant => "joined_restaurant",
            Topic::LeftRestaurant => "left_restaurant",
            Topic::ReservationUpdated => "reservation_updated",
            Topic::TableStatusChanged => "table_status_changed",
            Topic::OrderStatusChanged => "order_status_changed",
            Topic::KitchenDisplayUpdated => "kitchen_display_updated",
            Topic::InventoryAlert => "inventory_alert",
            Topic::LiveFeedSubscribed => "live_feed_subscribed",
            Topic::LiveFeedUnsubscribed => "live_feed_unsubscribed",
            Topic::LiveFeedData => "live_feed_data",
            Topic::Notification => "notification",
            Topic::Error => "error",
            Topic::Pong => "pong",
        }
    }

    /// Look a topic up by its underscored name.
    pub fn from_name(name: &str) -> Option<Topic> {
        Topic::ALL.into_iter().find(|t| t.name() == name)
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// Inbound payloads
// ---------------------------------------------------------------------------

/// Handshake acknowledgement sent by the server right after connecting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerHello {
    pub message: String,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestaurantAck {
    pub restaurant_id: String,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservationUpdate {
    pub reservation_id: String,
    pub status: String,
    #[serde(default)]
    pub restaurant_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableStatusChange {
    pub table_id: String,
    pub status: String,
    #[serde(default)]
    pub restaurant_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderStatusChange {
    pub order_id: String,
    pub status: String,
    #[serde(default)]
    pub table: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KitchenDisplayUpdate {
    pub orders: Vec<KitchenOrder>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryAlert {
    pub item: String,
    pub severity: Severity,
    #[serde(default)]
    pub quantity: Option<f64>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveFeedAck {
    pub restaurant_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveFeedData {
    pub restaurant_id: String,
    pub snapshot: FeedSnapshot,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub title: String,
    pub message: String,
    #[serde(default)]
    pub severity: Option<Severity>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerError {
    pub message: String,
    #[serde(default)]
    pub code: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pong {
    /// Echo of the ping's millisecond timestamp.
    pub timestamp: i64,
}

/// Every event the remote endpoint may push to a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ServerEvent {
    #[serde(rename = "connected")]
    Connected(ServerHello),
    #[serde(rename = "joined-restaurant")]
    JoinedRestaurant(RestaurantAck),
    #[serde(rename = "left-restaurant")]
    LeftRestaurant(RestaurantAck),
    #[serde(rename = "reservation-updated")]
    ReservationUpdated(ReservationUpdate),
    #[serde(rename = "table-status-changed")]
    TableStatusChanged(TableStatusChange),
    #[serde(rename = "order-status-changed")]
    OrderStatusChanged(OrderStatusChange),
    #[serde(rename = "kitchen-display-updated")]
    KitchenDisplayUpdated(KitchenDisplayUpdate),
    #[serde(rename = "inventory-alert")]
    InventoryAlert(InventoryAlert),
    #[serde(rename = "live-feed-subscribed")]
    LiveFeedSubscribed(LiveFeedAck),
    #[serde(rename = "live-feed-unsubscribed")]
    LiveFeedUnsubscribed(LiveFeedAck),
    #[serde(rename = "live-feed-data")]
    LiveFeedData(Box<LiveFeedData>),
    #[serde(rename = "notification")]
    Notification(Notification),
    #[serde(rename = "error")]
    Error(ServerError),
    #[serde(rename = "pong")]
    Pong(Pong),
}

impl ServerEvent {
    /// Hyphenated name used on the wire.
    pub fn wire_name(&self) -> &'static str {
        match self {
            ServerEvent::Connected(_) => "connected",
            ServerEvent::JoinedRestaurant(_) => "joined-restaurant",
            ServerEvent::LeftRestaurant(_) => "left-restaurant",
            ServerEvent::ReservationUpdated(_) => "reservation-updated",
            ServerEvent::TableStatusChanged(_) => "table-status-changed",
            ServerEvent::OrderStatusChanged(_) => "order-status-changed",
            ServerEvent::KitchenDisplayUpdated(_) => "kitchen-display-updated",
            ServerEvent::InventoryAlert(_) => "inventory-alert",
            ServerEvent::LiveFeedSubscribed(_) => "live-feed-subscribed",
            ServerEvent::LiveFeedUnsubscribed(_) => "live-feed-unsubscribed",
            ServerEvent::LiveFeedData(_) => "live-feed-data",
            ServerEvent::Notification(_) => "notification",
            ServerEvent::Error(_) => "error",
            ServerEvent::Pong(_) => "pong",
        }
    }

    /// Bus topic this event is re-published under.
    pub fn topic(&self) -> Topic {
        match self {
            ServerEvent::Connected(_) => Topic::Connected,
            ServerEvent::JoinedRestaurant(_) => Topic::JoinedRestaurant,
            ServerEvent::LeftRestaurant(_) => Topic::LeftRestaurant,
            ServerEvent::ReservationUpdated(_) => Topic::ReservationUpdated,
            ServerEvent::TableStatusChanged(_) => Topic::TableStatusChanged,
            ServerEvent::OrderStatusChanged(_) => Topic::OrderStatusChanged,
            ServerEvent::KitchenDisplayUpdated(_) => Topic::KitchenDisplayUpdated,
            ServerEvent::InventoryAlert(_) => Topic::InventoryAlert,
            ServerEvent::LiveFeedSubscribed(_) => Topic::LiveFeedSubscribed,
            ServerEvent::LiveFeedUnsubscribed(_) => Topic::LiveFeedUnsubscribed,
            ServerEvent::LiveFeedData(_) => Topic::LiveFeedData,
            ServerEvent::Notification(_) => Topic::Notification,
            ServerEvent::Error(_) => Topic::Error,
            ServerEvent::Pong(_) => Topic::Pong,
        }
    }
}

// ---------------------------------------------------------------------------
// Outbound commands
// ---------------------------------------------------------------------------

/// Fire-and-forget commands a client emits to the endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum Command {
    #[serde(rename = "join-restaurant", rename_all = "camelCase")]
    JoinRestaurant { restaurant_id: String },
    #[serde(rename = "leave-restaurant", rename_all = "camelCase")]
    LeaveRestaurant { restaurant_id: String },
    #[serde(rename = "subscribe-live-feed", rename_all = "camelCase")]
    SubscribeLiveFeed { restaurant_id: String },
    #[serde(rename = "unsubscribe-live-feed", rename_all = "camelCase")]
    UnsubscribeLiveFeed { restaurant_id: String },
    #[serde(rename = "ping", rename_all = "camelCase")]
    Ping { timestamp: i64 },
    #[serde(rename = "table-status-update", rename_all = "camelCase")]
    TableStatusUpdate {
        restaurant_id: String,
        table_id: String,
        status: String,
    },
    #[serde(rename = "reservation-update", rename_all = "camelCase")]
    ReservationUpdate {
        restaurant_id: String,
        reservation_id: String,
        status: String,
    },
    #[serde(rename = "acknowledge_alert", rename_all = "camelCase")]
    AcknowledgeAlert { alert_id: String },
}

impl Command {
    pub fn wire_name(&self) -> &'static str {
        match self {
            Command::JoinRestaurant { .. } => "join-restaurant",
            Command::LeaveRestaurant { .. } => "leave-restaurant",
            Command::SubscribeLiveFeed { .. } => "subscribe-live-feed",
            Command::UnsubscribeLiveFeed { .. } => "unsubscribe-live-feed",
            Command::Ping { .. } => "ping",
            Command::TableStatusUpdate { .. } => "table-status-update",
            Command::ReservationUpdate { .. } => "reservation-update",
            Command::AcknowledgeAlert { .. } => "acknowledge_alert",
        }
    }
}

// ---------------------------------------------------------------------------
// Bus events
// ---------------------------------------------------------------------------

/// Why the low-level link went away.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisconnectReason {
    /// The endpoint sent a close frame.
    ServerClosed,
    /// This side called `disconnect()`.
    ClientClosed,
    /// The stream ended or failed without a close handshake.
    TransportError(String),
}

impl DisconnectReason {
    /// `true` unless this side asked for the close.
    pub fn remote_initiated(&self) -> bool {
        !matches!(self, DisconnectReason::ClientClosed)
    }
}

impl fmt::Display for DisconnectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisconnectReason::ServerClosed => f.write_str("server closed the connection"),
            DisconnectReason::ClientClosed => f.write_str("client disconnect"),
            DisconnectReason::TransportError(e) => write!(f, "transport error: {e}"),
        }
    }
}

/// Payload delivered to event-bus listeners.
#[derive(Debug, Clone, PartialEq)]
pub enum BusEvent {
    ConnectionEstablished,
    ConnectionLost { reason: DisconnectReason },
    ConnectionError { error: String },
    MaxReconnectAttemptsReached { attempts: u32 },
    Server(ServerEvent),
}

impl BusEvent {
    pub fn topic(&self) -> Topic {
        match self {
            BusEvent::ConnectionEstablished => Topic::ConnectionEstablished,
            BusEvent::ConnectionLost { .. } => Topic::ConnectionLost,
            BusEvent::ConnectionError { .. } => Topic::ConnectionError,
            BusEvent::MaxReconnectAttemptsReached { .. } => Topic::MaxReconnectAttemptsReached,
            BusEvent::Server(event) => event.topic(),
        }
    }
}

impl From<ServerEvent> for BusEvent {
    fn from(event: ServerEvent) -> Self {
        BusEvent::Server(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_server_events() -> Vec<ServerEvent> {
        vec![
            ServerEvent::Connected(ServerHello {
                message: "welcome".to_string(),
                user_id: None,
                session_id: None,
            }),
            ServerEvent::JoinedRestaurant(RestaurantAck {
                restaurant_id: "r1".to_string(),
                message: None,
            }),
            ServerEvent::TableStatusChanged(TableStatusChange {
                table_id: "12".to_string(),
                status: "occupied".to_string(),
                restaurant_id: None,
            }),
            ServerEvent::InventoryAlert(InventoryAlert {
                item: "Salmon".to_string(),
                severity: Severity::Warning,
                quantity: Some(2.0),
                message: None,
            }),
            ServerEvent::Pong(Pong { timestamp: 42 }),
        ]
    }

    #[test]
    fn topic_name_is_wire_name_with_underscores() {
        for event in sample_server_events() {
            assert_eq!(event.topic().name(), event.wire_name().replace('-', "_"));
        }
    }

    #[test]
    fn topic_names_are_unique_and_reversible() {
        for topic in Topic::ALL {
            assert_eq!(Topic::from_name(topic.name()), Some(topic));
        }
        assert_eq!(Topic::from_name("table-status-changed"), None);
    }

    #[test]
    fn server_event_decodes_from_wire_frame() {
        let frame = r#"{"event":"order-status-changed","data":{"orderId":"K-7","status":"ready","table":4}}"#;
        let event: ServerEvent = serde_json::from_str(frame).unwrap();
        assert_eq!(
            event,
            ServerEvent::OrderStatusChanged(OrderStatusChange {
                order_id: "K-7".to_string(),
                status: "ready".to_string(),
                table: Some(4),
            })
        );
        assert_eq!(BusEvent::from(event).topic(), Topic::OrderStatusChanged);
    }

    #[test]
    fn unknown_wire_event_is_rejected() {
        let frame = r#"{"event":"teleport","data":{}}"#;
        assert!(serde_json::from_str::<ServerEvent>(frame).is_err());
    }

    #[test]
    fn command_encodes_wire_name_and_camel_case_fields() {
        let cmd = Command::TableStatusUpdate {
            restaurant_id: "r1".to_string(),
            table_id: "5".to_string(),
            status: "cleaning".to_string(),
        };
        let json = serde_json::to_value(&cmd).unwrap();
        assert_eq!(json["event"], cmd.wire_name());
        assert_eq!(json["data"]["tableId"], "5");
        assert_eq!(json["data"]["restaurantId"], "r1");
    }

    #[test]
    fn acknowledge_alert_keeps_underscored_wire_name() {
        let cmd = Command::AcknowledgeAlert {
            alert_id: "alert-1".to_string(),
        };
        let json = serde_json::to_value(&cmd).unwrap();
        assert_eq!(json["event"], "acknowledge_alert");
        assert_eq!(json["data"]["alertId"], "alert-1");
    }

    #[test]
    fn only_client_close_is_local() {
        assert!(!DisconnectReason::ClientClosed.remote_initiated());
        assert!(DisconnectReason::ServerClosed.remote_initiated());
        assert!(DisconnectReason::TransportError("reset".into()).remote_initiated());
    }
}
