//! [`Transport`] – one logical connection to the live-operations endpoint.
//!
//! The transport owns the connection state machine and nothing else.  Bytes
//! move through a [`Link`] (a WebSocket in production, an in-memory fake in
//! tests) which reports what happened as [`LinkEvent`]s.  The transport
//! turns those into bus events and decides when to reconnect.
//!
//! ```text
//!   connect()          Connected
//! ───────────► connecting ─────────► connected
//!                  │  ▲                 │
//!   ConnectError   │  │ reconnect timer │ Disconnected(remote)
//!                  ▼  │                 ▼
//!               disconnected ◄──────────┘
//! ```
//!
//! # Reconnection
//!
//! A remote-initiated disconnect or a connect error runs the reconnection
//! procedure: while fewer than [`TransportConfig::max_reconnect_attempts`]
//! attempts have been made, bump the counter and ask the link to reconnect
//! after [`TransportConfig::reconnect_interval`] (fixed, not exponential).
//! Once the budget is spent, `max_reconnect_attempts_reached` is published
//! once and no further timer is armed.  A successful connect resets the
//! counter to zero.
//!
//! # Outbound commands
//!
//! Commands are best-effort: while not connected they are dropped, never
//! queued, and never reported as errors.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;

use chrono::Utc;
use tablepulse_types::{BusEvent, Command, DisconnectReason, PulseError, Topic};
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use zeroize::Zeroizing;

use crate::bus::{EventBus, Listener};
use crate::frame;

/// Reconnect budget before the transport gives up.
pub const MAX_RECONNECT_ATTEMPTS: u32 = 5;

/// Fixed delay between reconnect attempts.
pub const RECONNECT_INTERVAL: Duration = Duration::from_millis(5000);

// ---------------------------------------------------------------------------
// Link abstraction
// ---------------------------------------------------------------------------

/// What a [`Link`] reports back to its transport.
#[derive(Debug, Clone, PartialEq)]
pub enum LinkEvent {
    Connected,
    Disconnected(DisconnectReason),
    ConnectError(String),
    /// One raw text frame received from the endpoint.
    Message(String),
}

/// Low-level connection driver.
///
/// Every method returns immediately; progress is reported asynchronously
/// through the sender handed to [`Link::open`].
pub trait Link: Send + Sync {
    /// Start connecting with `params`, reporting progress on `events`.
    fn open(
        &self,
        params: &ConnectParams,
        events: mpsc::UnboundedSender<LinkEvent>,
    ) -> Result<(), PulseError>;

    /// Re-open the connection last requested through [`Link::open`].
    fn reconnect(&self) -> Result<(), PulseError>;

    /// Send one command frame.
    fn emit(&self, command: &Command) -> Result<(), PulseError>;

    /// Tear the connection down.  Idempotent.
    fn close(&self);
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Identity carried by a connection.
///
/// The ids travel as query context; the token, when present, as a bearer
/// credential.  The token is wiped from memory on drop.
#[derive(Clone)]
pub struct ConnectParams {
    pub restaurant_id: String,
    pub user_id: Option<String>,
    pub token: Option<Zeroizing<String>>,
}

impl ConnectParams {
    pub fn new(restaurant_id: impl Into<String>) -> Self {
        Self {
            restaurant_id: restaurant_id.into(),
            user_id: None,
            token: None,
        }
    }

    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(Zeroizing::new(token.into()));
        self
    }
}

impl fmt::Debug for ConnectParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectParams")
            .field("restaurant_id", &self.restaurant_id)
            .field("user_id", &self.user_id)
            .field(
                "token",
                if self.token.is_some() { &"<redacted>" } else { &"<not set>" },
            )
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub max_reconnect_attempts: u32,
    pub reconnect_interval: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            max_reconnect_attempts: MAX_RECONNECT_ATTEMPTS,
            reconnect_interval: RECONNECT_INTERVAL,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

// ---------------------------------------------------------------------------
// Transport
// ---------------------------------------------------------------------------

struct Connection {
    params: ConnectParams,
    state: ConnectionState,
    reconnect_attempts: u32,
    exhausted: bool,
    reconnect_timer: Option<JoinHandle<()>>,
    pump: Option<JoinHandle<()>>,
}

impl Connection {
    fn cancel_tasks(&mut self) {
        if let Some(timer) = self.reconnect_timer.take() {
            timer.abort();
        }
        if let Some(pump) = self.pump.take() {
            pump.abort();
        }
    }
}

struct Shared {
    bus: EventBus,
    link: Arc<dyn Link>,
    config: TransportConfig,
    // `None` until the first connect() and again after disconnect().
    connection: Mutex<Option<Connection>>,
}

/// Reconnecting client for the live-operations endpoint.
///
/// Clone it freely; all clones drive the same connection.  Outside a Tokio
/// runtime [`connect`][Self::connect] publishes `ConnectionError` and leaves
/// the transport disconnected.
#[derive(Clone)]
pub struct Transport {
    shared: Arc<Shared>,
}

impl Transport {
    pub fn new(bus: EventBus, link: Arc<dyn Link>) -> Self {
        Self::with_config(bus, link, TransportConfig::default())
    }

    pub fn with_config(bus: EventBus, link: Arc<dyn Link>, config: TransportConfig) -> Self {
        Self {
            shared: Arc::new(Shared {
                bus,
                link,
                config,
                connection: Mutex::new(None),
            }),
        }
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    /// Open a fresh logical connection.
    ///
    /// Callers should check [`is_connected`][Self::is_connected] first; an
    /// existing connection is torn down and replaced.
    pub fn connect(&self, params: ConnectParams) {
        let runtime = match Handle::try_current() {
            Ok(runtime) => runtime,
            Err(e) => {
                let error = format!("no async runtime: {e}");
                warn!(%error, "cannot connect to live-operations endpoint");
                self.shared.bus.publish(BusEvent::ConnectionError { error });
                return;
            }
        };
        let (tx, mut rx) = mpsc::unbounded_channel();

        let weak: Weak<Shared> = Arc::downgrade(&self.shared);
        let pump = runtime.spawn(async move {
            while let Some(event) = rx.recv().await {
                let Some(shared) = weak.upgrade() else { break };
                Transport { shared }.handle_link_event(event);
            }
        });

        let replaced = {
            let mut slot = self.connection();
            let replaced = slot.take().map(|mut old| {
                old.cancel_tasks();
                old.state
            });
            *slot = Some(Connection {
                params: params.clone(),
                state: ConnectionState::Connecting,
                reconnect_attempts: 0,
                exhausted: false,
                reconnect_timer: None,
                pump: Some(pump),
            });
            replaced
        };
        if let Some(previous) = replaced {
            warn!(?previous, "connect() called on a live transport; replacing connection");
            self.shared.link.close();
        }

        info!(restaurant_id = %params.restaurant_id, "connecting to live-operations endpoint");
        if let Err(e) = self.shared.link.open(&params, tx) {
            self.handle_link_event(LinkEvent::ConnectError(e.to_string()));
        }
    }

    /// Close the connection and drop every bus subscription.
    ///
    /// Listeners must re-subscribe after a manual disconnect.
    pub fn disconnect(&self) {
        let previous = self.connection().take().map(|mut conn| {
            conn.cancel_tasks();
            conn.state
        });
        self.shared.link.close();

        if previous == Some(ConnectionState::Connected) {
            self.shared.bus.publish(BusEvent::ConnectionLost {
                reason: DisconnectReason::ClientClosed,
            });
        }
        self.shared.bus.clear();
        info!("disconnected from live-operations endpoint");
    }

    /// Feed one low-level event into the state machine.
    ///
    /// [`Link`] implementations reach this through the channel given to
    /// [`Link::open`]; it is public so drivers without a channel can call
    /// it directly.  Events arriving while no connection exists are ignored.
    pub fn handle_link_event(&self, event: LinkEvent) {
        match event {
            LinkEvent::Connected => {
                {
                    let mut slot = self.connection();
                    let Some(conn) = slot.as_mut() else { return };
                    conn.state = ConnectionState::Connected;
                    conn.reconnect_attempts = 0;
                    conn.exhausted = false;
                    if let Some(timer) = conn.reconnect_timer.take() {
                        timer.abort();
                    }
                }
                info!("live-operations connection established");
                self.shared.bus.publish(BusEvent::ConnectionEstablished);
            }
            LinkEvent::Disconnected(reason) => {
                if !self.set_state(ConnectionState::Disconnected) {
                    return;
                }
                warn!(%reason, "live-operations connection lost");
                let reconnect = reason.remote_initiated();
                self.shared.bus.publish(BusEvent::ConnectionLost { reason });
                if reconnect {
                    self.schedule_reconnect();
                }
            }
            LinkEvent::ConnectError(error) => {
                if !self.set_state(ConnectionState::Disconnected) {
                    return;
                }
                warn!(%error, "live-operations connect error");
                self.shared.bus.publish(BusEvent::ConnectionError { error });
                self.schedule_reconnect();
            }
            LinkEvent::Message(text) => {
                if self.connection().is_none() {
                    return;
                }
                match frame::decode_server_event(&text) {
                    Ok(event) => {
                        debug!(topic = %event.topic(), "inbound event");
                        self.shared.bus.publish(BusEvent::Server(event));
                    }
                    Err(e) => warn!(error = %e, "dropping undecodable frame"),
                }
            }
        }
    }

    fn schedule_reconnect(&self) {
        let max = self.shared.config.max_reconnect_attempts;
        let mut slot = self.connection();
        let Some(conn) = slot.as_mut() else { return };

        if conn.reconnect_attempts >= max {
            if conn.exhausted {
                return;
            }
            conn.exhausted = true;
            let attempts = conn.reconnect_attempts;
            drop(slot);
            warn!(attempts, "reconnect budget exhausted; giving up");
            self.shared
                .bus
                .publish(BusEvent::MaxReconnectAttemptsReached { attempts });
            return;
        }

        conn.reconnect_attempts += 1;
        let attempt = conn.reconnect_attempts;
        let interval = self.shared.config.reconnect_interval;
        if let Some(timer) = conn.reconnect_timer.take() {
            timer.abort();
        }

        let weak = Arc::downgrade(&self.shared);
        conn.reconnect_timer = Some(tokio::spawn(async move {
            tokio::time::sleep(interval).await;
            if let Some(shared) = weak.upgrade() {
                Transport { shared }.fire_reconnect();
            }
        }));
        info!(attempt, max, delay_ms = interval.as_millis() as u64, "reconnect scheduled");
    }

    fn fire_reconnect(&self) {
        {
            let mut slot = self.connection();
            let Some(conn) = slot.as_mut() else { return };
            conn.reconnect_timer = None;
            if conn.state == ConnectionState::Connected {
                return;
            }
            conn.state = ConnectionState::Connecting;
        }
        debug!("requesting link reconnect");
        if let Err(e) = self.shared.link.reconnect() {
            self.handle_link_event(LinkEvent::ConnectError(e.to_string()));
        }
    }

    /// Returns `false` when there is no connection to update.
    fn set_state(&self, state: ConnectionState) -> bool {
        match self.connection().as_mut() {
            Some(conn) => {
                conn.state = state;
                true
            }
            None => false,
        }
    }

    // -----------------------------------------------------------------------
    // Introspection
    // -----------------------------------------------------------------------

    pub fn state(&self) -> ConnectionState {
        self.connection()
            .as_ref()
            .map_or(ConnectionState::Disconnected, |c| c.state)
    }

    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }

    pub fn reconnect_attempts(&self) -> u32 {
        self.connection().as_ref().map_or(0, |c| c.reconnect_attempts)
    }

    /// `true` while a reconnect timer is armed.
    pub fn reconnect_pending(&self) -> bool {
        self.connection()
            .as_ref()
            .is_some_and(|c| c.reconnect_timer.is_some())
    }

    pub fn bus(&self) -> &EventBus {
        &self.shared.bus
    }

    // -----------------------------------------------------------------------
    // Subscriptions
    // -----------------------------------------------------------------------

    pub fn on(&self, topic: Topic, listener: Listener) {
        self.shared.bus.subscribe(topic, listener);
    }

    pub fn off(&self, topic: Topic, listener: &Listener) {
        self.shared.bus.unsubscribe(topic, listener);
    }

    // -----------------------------------------------------------------------
    // Outbound commands
    // -----------------------------------------------------------------------

    pub fn join_restaurant(&self, restaurant_id: impl Into<String>) {
        self.emit(Command::JoinRestaurant {
            restaurant_id: restaurant_id.into(),
        });
    }

    pub fn leave_restaurant(&self, restaurant_id: impl Into<String>) {
        self.emit(Command::LeaveRestaurant {
            restaurant_id: restaurant_id.into(),
        });
    }

    pub fn subscribe_to_live_feed(&self, restaurant_id: impl Into<String>) {
        self.emit(Command::SubscribeLiveFeed {
            restaurant_id: restaurant_id.into(),
        });
    }

    pub fn unsubscribe_from_live_feed(&self, restaurant_id: impl Into<String>) {
        self.emit(Command::UnsubscribeLiveFeed {
            restaurant_id: restaurant_id.into(),
        });
    }

    pub fn send_ping(&self) {
        self.emit(Command::Ping {
            timestamp: Utc::now().timestamp_millis(),
        });
    }

    pub fn mark_table_status(&self, table_id: impl Into<String>, status: impl Into<String>) {
        let Some(restaurant_id) = self.restaurant_id() else {
            debug!("no connection; dropping table-status-update");
            return;
        };
        self.emit(Command::TableStatusUpdate {
            restaurant_id,
            table_id: table_id.into(),
            status: status.into(),
        });
    }

    pub fn notify_reservation_update(
        &self,
        reservation_id: impl Into<String>,
        status: impl Into<String>,
    ) {
        let Some(restaurant_id) = self.restaurant_id() else {
            debug!("no connection; dropping reservation-update");
            return;
        };
        self.emit(Command::ReservationUpdate {
            restaurant_id,
            reservation_id: reservation_id.into(),
            status: status.into(),
        });
    }

    pub fn acknowledge_alert(&self, alert_id: impl Into<String>) {
        self.emit(Command::AcknowledgeAlert {
            alert_id: alert_id.into(),
        });
    }

    fn emit(&self, command: Command) {
        if !self.is_connected() {
            debug!(event = command.wire_name(), "not connected; dropping command");
            return;
        }
        if let Err(e) = self.shared.link.emit(&command) {
            warn!(event = command.wire_name(), error = %e, "failed to emit command");
        }
    }

    fn restaurant_id(&self) -> Option<String> {
        self.connection().as_ref().map(|c| c.params.restaurant_id.clone())
    }

    fn connection(&self) -> MutexGuard<'_, Option<Connection>> {
        self.shared
            .connection
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
