//! [`CockpitServer`] – WebSocket endpoint for the live-operations protocol.
//!
//! Listens on `0.0.0.0:4000` (configurable via [`CockpitServer::with_port`]).
//!
//! * WebSocket upgrades → one protocol session per client.
//! * Any other HTTP request → 200 OK with the current [`FeedSnapshot`] as JSON.

use std::net::SocketAddr;
use std::sync::Arc;

use chrono::Utc;
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use tablepulse_middleware::frame;
use tablepulse_runtime::FeedController;
use tablepulse_types::{
    Command, FeedSnapshot, LiveFeedAck, LiveFeedData, Pong, PulseError, ReservationUpdate,
    RestaurantAck, ServerError, ServerEvent, ServerHello, TableStatusChange,
};
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::{WebSocketStream, accept_hdr_async};
use tracing::{debug, info, warn};
use url::form_urlencoded;
use uuid::Uuid;

/// Default TCP port for the endpoint.
pub const DEFAULT_PORT: u16 = 4000;

const CHANNEL_CAPACITY: usize = 64;

type WsSink = SplitSink<WebSocketStream<TcpStream>, Message>;

// ---------------------------------------------------------------------------
// Hub
// ---------------------------------------------------------------------------

/// State shared by every client session.
pub(crate) struct Hub {
    feed: FeedController,
    /// Fan-out for table and reservation changes.
    room: broadcast::Sender<ServerEvent>,
    /// One snapshot per feed tick.
    ticks: broadcast::Sender<Arc<FeedSnapshot>>,
}

impl Hub {
    fn new(feed: FeedController) -> Self {
        let (room, _) = broadcast::channel(CHANNEL_CAPACITY);
        let (ticks, _) = broadcast::channel(CHANNEL_CAPACITY);
        let tx = ticks.clone();
        feed.on_update(Arc::new(move |snapshot: &FeedSnapshot| {
            // Err only means no client is connected right now.
            let _ = tx.send(Arc::new(snapshot.clone()));
        }));
        Self { feed, room, ticks }
    }
}

// ---------------------------------------------------------------------------
// CockpitServer
// ---------------------------------------------------------------------------

/// WebSocket endpoint serving a simulated live feed.
pub struct CockpitServer {
    hub: Arc<Hub>,
    port: u16,
}

impl CockpitServer {
    /// Create a server around `feed` on the [`DEFAULT_PORT`].
    pub fn new(feed: FeedController) -> Self {
        Self {
            hub: Arc::new(Hub::new(feed)),
            port: DEFAULT_PORT,
        }
    }

    /// Override the listening port (builder-style).
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn feed(&self) -> &FeedController {
        &self.hub.feed
    }

    /// Bind `0.0.0.0:<port>` and serve until the task is dropped.
    ///
    /// # Errors
    ///
    /// Returns [`PulseError::Connection`] if the listener cannot bind.
    pub async fn run(self) -> Result<(), PulseError> {
        let addr = SocketAddr::from(([0, 0, 0, 0], self.port));
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| PulseError::Connection(format!("bind error on {addr}: {e}")))?;
        self.serve(listener).await
    }

    /// Serve on an already-bound listener.  Starts the live feed.
    pub async fn serve(self, listener: TcpListener) -> Result<(), PulseError> {
        let addr = listener
            .local_addr()
            .map_err(|e| PulseError::Connection(format!("listener has no address: {e}")))?;
        self.hub.feed.start_live_feed();
        info!(%addr, "cockpit endpoint listening");

        loop {
            match listener.accept().await {
                Ok((stream, peer)) => {
                    let hub = Arc::clone(&self.hub);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(stream, peer, hub).await {
                            warn!(%peer, error = %e, "client session failed");
                        }
                    });
                }
                Err(e) => warn!(error = %e, "accept failed"),
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Per-connection handler
// ---------------------------------------------------------------------------

async fn handle_connection(
    stream: TcpStream,
    peer: SocketAddr,
    hub: Arc<Hub>,
) -> Result<(), PulseError> {
    // `peek` leaves the request in place for the WebSocket handshake.
    let mut buf = [0u8; 1024];
    let n = stream
        .peek(&mut buf)
        .await
        .map_err(|e| PulseError::Connection(format!("peek error from {peer}: {e}")))?;

    let preview = String::from_utf8_lossy(&buf[..n]);
    let is_ws_upgrade = preview.lines().any(|line| {
        let line = line.to_ascii_lowercase();
        line.starts_with("upgrade:") && line.contains("websocket")
    });

    if is_ws_upgrade {
        handle_ws(stream, peer, hub).await
    } else {
        serve_snapshot(stream, &hub).await
    }
}

async fn serve_snapshot(mut stream: TcpStream, hub: &Hub) -> Result<(), PulseError> {
    let body = serde_json::to_string(&hub.feed.snapshot())
        .map_err(|e| PulseError::Serialization(e.to_string()))?;
    let response = format!(
        "HTTP/1.1 200 OK\r\n\
         Content-Type: application/json\r\n\
         Content-Length: {}\r\n\
         Connection: close\r\n\
         \r\n\
         {}",
        body.len(),
        body
    );
    stream
        .write_all(response.as_bytes())
        .await
        .map_err(|e| PulseError::Connection(format!("HTTP write error: {e}")))
}

async fn handle_ws(stream: TcpStream, peer: SocketAddr, hub: Arc<Hub>) -> Result<(), PulseError> {
    let mut query = None;
    let ws = accept_hdr_async(
        stream,
        |request: &Request, response: Response| -> Result<Response, ErrorResponse> {
            query = request.uri().query().map(str::to_owned);
            Ok(response)
        },
    )
    .await
    .map_err(|e| PulseError::Connection(format!("handshake from {peer}: {e}")))?;

    let mut session = ClientSession::from_query(query.as_deref());
    info!(
        %peer,
        session = %session.session_id,
        user = session.user_id.as_deref().unwrap_or("-"),
        "client connected"
    );

    let (mut ws_tx, mut ws_rx) = ws.split();
    let mut room_rx = hub.room.subscribe();
    let mut tick_rx = hub.ticks.subscribe();

    send(&mut ws_tx, &session.hello()).await?;

    'session: loop {
        let outgoing: Vec<ServerEvent> = tokio::select! {
            msg = ws_rx.next() => match msg {
                Some(Ok(Message::Text(text))) => {
                    handle_client_frame(text.as_str(), &mut session, &hub)
                }
                Some(Ok(Message::Close(_))) | None => break,
                Some(Err(e)) => {
                    debug!(%peer, error = %e, "websocket read failed");
                    break;
                }
                Some(Ok(_)) => continue,
            },
            event = room_rx.recv() => match event {
                Ok(event) => vec![event],
                Err(RecvError::Lagged(n)) => {
                    warn!(%peer, skipped = n, "client lagged behind room updates");
                    continue;
                }
                Err(RecvError::Closed) => break,
            },
            snapshot = tick_rx.recv() => match snapshot {
                Ok(snapshot) => session.feed_frame(&snapshot).into_iter().collect(),
                Err(RecvError::Lagged(n)) => {
                    debug!(%peer, skipped = n, "client skipped feed ticks");
                    continue;
                }
                Err(RecvError::Closed) => break,
            },
        };

        for event in &outgoing {
            if send(&mut ws_tx, event).await.is_err() {
                break 'session;
            }
        }
    }

    info!(%peer, session = %session.session_id, "client disconnected");
    Ok(())
}

async fn send(ws_tx: &mut WsSink, event: &ServerEvent) -> Result<(), PulseError> {
    let text = frame::encode_server_event(event)?;
    ws_tx
        .send(Message::Text(text.into()))
        .await
        .map_err(|e| PulseError::Connection(e.to_string()))
}

// ---------------------------------------------------------------------------
// Protocol session
// ---------------------------------------------------------------------------

/// What the endpoint remembers about one client.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ClientSession {
    session_id: String,
    user_id: Option<String>,
    restaurant_id: Option<String>,
    /// Restaurant whose live feed this client receives.
    live_feed: Option<String>,
}

impl ClientSession {
    fn from_query(query: Option<&str>) -> Self {
        Self {
            session_id: Uuid::new_v4().to_string(),
            user_id: query.and_then(|q| query_param(q, "userId")),
            restaurant_id: None,
            live_feed: None,
        }
    }

    fn hello(&self) -> ServerEvent {
        ServerEvent::Connected(ServerHello {
            message: "Connected to TablePulse live operations".to_string(),
            user_id: self.user_id.clone(),
            session_id: Some(self.session_id.clone()),
        })
    }

    fn feed_frame(&self, snapshot: &FeedSnapshot) -> Option<ServerEvent> {
        self.live_feed.as_ref().map(|restaurant_id| {
            ServerEvent::LiveFeedData(Box::new(LiveFeedData {
                restaurant_id: restaurant_id.clone(),
                snapshot: snapshot.clone(),
            }))
        })
    }
}

/// Apply one client frame and return the frames to send back to that client.
///
/// Table and reservation updates are not answered directly; they reach every
/// client, the sender included, through the room channel.
pub(crate) fn handle_client_frame(
    text: &str,
    session: &mut ClientSession,
    hub: &Hub,
) -> Vec<ServerEvent> {
    let command = match frame::decode_command(text) {
        Ok(command) => command,
        Err(e) => {
            debug!(session = %session.session_id, error = %e, "rejected client frame");
            return vec![ServerEvent::Error(ServerError {
                message: e.to_string(),
                code: Some("bad_frame".to_string()),
            })];
        }
    };
    debug!(session = %session.session_id, command = command.wire_name(), "client command");

    match command {
        Command::JoinRestaurant { restaurant_id } => {
            session.restaurant_id = Some(restaurant_id.clone());
            vec![ServerEvent::JoinedRestaurant(RestaurantAck {
                message: Some(format!("Joined restaurant {restaurant_id}")),
                restaurant_id,
            })]
        }
        Command::LeaveRestaurant { restaurant_id } => {
            if session.restaurant_id.as_deref() == Some(restaurant_id.as_str()) {
                session.restaurant_id = None;
            }
            if session.live_feed.as_deref() == Some(restaurant_id.as_str()) {
                session.live_feed = None;
            }
            vec![ServerEvent::LeftRestaurant(RestaurantAck {
                message: Some(format!("Left restaurant {restaurant_id}")),
                restaurant_id,
            })]
        }
        Command::SubscribeLiveFeed { restaurant_id } => {
            session.live_feed = Some(restaurant_id.clone());
            let mut replies = vec![ServerEvent::LiveFeedSubscribed(LiveFeedAck {
                restaurant_id,
            })];
            replies.extend(session.feed_frame(&hub.feed.snapshot()));
            replies
        }
        Command::UnsubscribeLiveFeed { restaurant_id } => {
            session.live_feed = None;
            vec![ServerEvent::LiveFeedUnsubscribed(LiveFeedAck { restaurant_id })]
        }
        Command::Ping { .. } => vec![ServerEvent::Pong(Pong {
            timestamp: Utc::now().timestamp_millis(),
        })],
        Command::TableStatusUpdate {
            restaurant_id,
            table_id,
            status,
        } => {
            let _ = hub.room.send(ServerEvent::TableStatusChanged(TableStatusChange {
                table_id,
                status,
                restaurant_id: Some(restaurant_id),
            }));
            Vec::new()
        }
        Command::ReservationUpdate {
            restaurant_id,
            reservation_id,
            status,
        } => {
            let _ = hub.room.send(ServerEvent::ReservationUpdated(ReservationUpdate {
                reservation_id,
                status,
                restaurant_id: Some(restaurant_id),
            }));
            Vec::new()
        }
        Command::AcknowledgeAlert { alert_id } => {
            if !hub.feed.acknowledge_alert(&alert_id) {
                debug!(alert = %alert_id, "acknowledged unknown alert");
            }
            Vec::new()
        }
    }
}

/// Value of `key` in a URL query string, percent-decoded.
fn query_param(query: &str, key: &str) -> Option<String> {
    form_urlencoded::parse(query.as_bytes())
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.into_owned())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
