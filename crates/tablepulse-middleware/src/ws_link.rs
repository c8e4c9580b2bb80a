//! [`WsLink`] – WebSocket [`Link`] built on tokio-tungstenite.
//!
//! Each open or reconnect spawns one session task that
//!
//! 1. dials `<endpoint>?restaurantId=…&userId=…`, adding
//!    `Authorization: Bearer <token>` when a token is present;
//! 2. forwards every inbound text frame as [`LinkEvent::Message`];
//! 3. writes outbound command frames queued by [`Link::emit`];
//! 4. reports how the session ended as [`LinkEvent::Disconnected`].

use std::sync::{Mutex, MutexGuard};

use futures_util::{SinkExt, StreamExt};
use tablepulse_types::{Command, DisconnectReason, PulseError};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::handshake::client::Request;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::http::header::AUTHORIZATION;
use tracing::{debug, warn};
use url::Url;

use crate::frame;
use crate::transport::{ConnectParams, Link, LinkEvent};

#[derive(Default)]
struct Session {
    params: Option<ConnectParams>,
    events: Option<mpsc::UnboundedSender<LinkEvent>>,
    outbound: Option<mpsc::UnboundedSender<Message>>,
    task: Option<JoinHandle<()>>,
}

/// Production link to a `ws://` / `wss://` live-operations endpoint.
pub struct WsLink {
    endpoint: String,
    session: Mutex<Session>,
}

impl WsLink {
    /// `endpoint` is the base WebSocket URL, e.g. `"ws://localhost:4000/live"`.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            session: Mutex::new(Session::default()),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Full URL dialled for `params`.
    pub fn request_url(&self, params: &ConnectParams) -> Result<Url, PulseError> {
        let mut url = Url::parse(&self.endpoint)
            .map_err(|e| PulseError::Connection(format!("invalid endpoint: {e}")))?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("restaurantId", &params.restaurant_id);
            if let Some(user) = &params.user_id {
                query.append_pair("userId", user);
            }
        }
        Ok(url)
    }

    fn build_request(&self, params: &ConnectParams) -> Result<Request, PulseError> {
        let mut request = self
            .request_url(params)?
            .as_str()
            .into_client_request()
            .map_err(|e| PulseError::Connection(format!("invalid endpoint: {e}")))?;
        if let Some(token) = &params.token {
            let value = HeaderValue::from_str(&format!("Bearer {}", token.as_str()))
                .map_err(|e| PulseError::Connection(format!("invalid auth token: {e}")))?;
            request.headers_mut().insert(AUTHORIZATION, value);
        }
        Ok(request)
    }

    fn start_session(&self, session: &mut Session) -> Result<(), PulseError> {
        let (Some(params), Some(events)) = (&session.params, &session.events) else {
            return Err(PulseError::Connection("link was never opened".to_string()));
        };
        let request = self.build_request(params)?;

        if let Some(task) = session.task.take() {
            task.abort();
        }
        let (out_tx, out_rx) = mpsc::unbounded_channel();
        session.outbound = Some(out_tx);
        session.task = Some(tokio::spawn(run_session(request, events.clone(), out_rx)));
        Ok(())
    }

    fn session(&self) -> MutexGuard<'_, Session> {
        self.session.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Link for WsLink {
    fn open(
        &self,
        params: &ConnectParams,
        events: mpsc::UnboundedSender<LinkEvent>,
    ) -> Result<(), PulseError> {
        let mut session = self.session();
        session.params = Some(params.clone());
        session.events = Some(events);
        self.start_session(&mut session)
    }

    fn reconnect(&self) -> Result<(), PulseError> {
        let mut session = self.session();
        self.start_session(&mut session)
    }

    fn emit(&self, command: &Command) -> Result<(), PulseError> {
        let text = frame::encode_command(command)?;
        let session = self.session();
        let outbound = session
            .outbound
            .as_ref()
            .ok_or_else(|| PulseError::Connection("link is not open".to_string()))?;
        outbound
            .send(Message::Text(text.into()))
            .map_err(|_| PulseError::Channel("session writer has stopped".to_string()))
    }

    fn close(&self) {
        let mut session = self.session();
        // Dropping the writer makes the session send a close frame and exit.
        session.outbound = None;
        session.events = None;
        session.params = None;
        session.task = None;
    }
}

async fn run_session(
    request: Request,
    events: mpsc::UnboundedSender<LinkEvent>,
    mut outbound: mpsc::UnboundedReceiver<Message>,
) {
    let ws = match connect_async(request).await {
        Ok((ws, _response)) => ws,
        Err(e) => {
            let _ = events.send(LinkEvent::ConnectError(e.to_string()));
            return;
        }
    };
    let _ = events.send(LinkEvent::Connected);

    let (mut ws_tx, mut ws_rx) = ws.split();
    let reason = loop {
        tokio::select! {
            frame = ws_rx.next() => match frame {
                Some(Ok(Message::Text(text))) => {
                    let _ = events.send(LinkEvent::Message(text.as_str().to_owned()));
                }
                Some(Ok(Message::Close(_))) => break DisconnectReason::ServerClosed,
                Some(Ok(_)) => {}
                Some(Err(e)) => break DisconnectReason::TransportError(e.to_string()),
                None => break DisconnectReason::TransportError("stream ended".to_string()),
            },
            queued = outbound.recv() => match queued {
                Some(message) => {
                    if let Err(e) = ws_tx.send(message).await {
                        break DisconnectReason::TransportError(e.to_string());
                    }
                }
                None => {
                    if let Err(e) = ws_tx.send(Message::Close(None)).await {
                        debug!(error = %e, "close frame not delivered");
                    }
                    break DisconnectReason::ClientClosed;
                }
            },
        }
    };

    if let DisconnectReason::TransportError(e) = &reason {
        warn!(error = %e, "websocket session ended abnormally");
    }
    let _ = events.send(LinkEvent::Disconnected(reason));
}
