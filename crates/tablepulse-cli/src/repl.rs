//! REPL – Read-Eval-Print Loop for the TablePulse shell.
//!
//! Supported slash-commands:
//!   /help              – show this list
//!   /settings          – interactively edit `~/.tablepulse/config.toml`
//!   /serve             – start the embedded live-operations endpoint
//!   /connect           – open the reconnecting transport
//!   /disconnect        – close it and drop every subscription
//!   /join [restaurant] – join a restaurant room
//!   /ping              – round-trip a ping
//!   /feed start|stop   – subscribe to / unsubscribe from the live feed
//!   /status            – connection state and the latest feed snapshot
//!   /ack <alert-id>    – acknowledge an alert
//!   /clear             – clear the screen
//!   /quit | /exit      – gracefully exit the CLI

use colored::Colorize;
use std::io::{self, BufRead, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tablepulse_cockpit::CockpitServer;
use tablepulse_middleware::{ConnectParams, EventBus, Transport, WsLink, listener};
use tablepulse_runtime::{FeedController, LiveOpsSimulator};
use tablepulse_types::{BusEvent, FeedSnapshot, ServerEvent, Severity, Topic};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::error;

use crate::config::{self, Config, Secret};

/// Transport slot shared with the Ctrl-C handler.
pub type SharedTransport = Arc<Mutex<Option<Transport>>>;

/// Topics echoed to the terminal as they arrive.
const ANNOUNCED: [Topic; 15] = [
    Topic::ConnectionEstablished,
    Topic::ConnectionLost,
    Topic::ConnectionError,
    Topic::MaxReconnectAttemptsReached,
    Topic::Connected,
    Topic::JoinedRestaurant,
    Topic::LeftRestaurant,
    Topic::TableStatusChanged,
    Topic::ReservationUpdated,
    Topic::OrderStatusChanged,
    Topic::InventoryAlert,
    Topic::LiveFeedSubscribed,
    Topic::LiveFeedUnsubscribed,
    Topic::Notification,
    Topic::Pong,
];

// ─────────────────────────────────────────────────────────────────────────────
// Command parsing
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum ReplCommand {
    Help,
    Settings,
    Serve,
    Connect,
    Disconnect,
    Join(Option<String>),
    Ping,
    Feed(bool),
    Status,
    Ack(String),
    Clear,
    Quit,
}

/// Parse one input line.  `Err` carries the message to show the user.
pub fn parse(line: &str) -> Result<ReplCommand, String> {
    let mut words = line.split_whitespace();
    let Some(head) = words.next() else {
        return Err("empty command".to_string());
    };
    let arg = words.next().map(str::to_owned);
    if words.next().is_some() {
        return Err(format!("too many arguments for {head}"));
    }

    match (head, arg) {
        ("/help", None) => Ok(ReplCommand::Help),
        ("/settings", None) => Ok(ReplCommand::Settings),
        ("/serve", None) => Ok(ReplCommand::Serve),
        ("/connect", None) => Ok(ReplCommand::Connect),
        ("/disconnect", None) => Ok(ReplCommand::Disconnect),
        ("/join", restaurant) => Ok(ReplCommand::Join(restaurant)),
        ("/ping", None) => Ok(ReplCommand::Ping),
        ("/feed", Some(mode)) => match mode.as_str() {
            "start" => Ok(ReplCommand::Feed(true)),
            "stop" => Ok(ReplCommand::Feed(false)),
            other => Err(format!("expected /feed start|stop, got '{other}'")),
        },
        ("/feed", None) => Err("usage: /feed start|stop".to_string()),
        ("/status", None) => Ok(ReplCommand::Status),
        ("/ack", Some(id)) => Ok(ReplCommand::Ack(id)),
        ("/ack", None) => Err("usage: /ack <alert-id>".to_string()),
        ("/clear", None) => Ok(ReplCommand::Clear),
        ("/quit" | "/exit", None) => Ok(ReplCommand::Quit),
        (cmd, Some(_)) if is_known(cmd) => Err(format!("{cmd} takes no arguments")),
        (other, _) => Err(format!("Unknown command: '{other}'")),
    }
}

fn is_known(cmd: &str) -> bool {
    matches!(
        cmd,
        "/help" | "/settings" | "/serve" | "/connect" | "/disconnect" | "/ping" | "/status"
            | "/clear" | "/quit" | "/exit"
    )
}

// ─────────────────────────────────────────────────────────────────────────────
// Shell
// ─────────────────────────────────────────────────────────────────────────────

pub struct Shell {
    runtime: Handle,
    config: Config,
    transport: SharedTransport,
    cockpit: Option<JoinHandle<()>>,
    latest: Arc<Mutex<Option<FeedSnapshot>>>,
}

impl Shell {
    pub fn new(runtime: Handle, config: Config, transport: SharedTransport) -> Self {
        Self {
            runtime,
            config,
            transport,
            cockpit: None,
            latest: Arc::new(Mutex::new(None)),
        }
    }

    fn transport(&self) -> Option<Transport> {
        lock(&self.transport).clone()
    }

    /// Run `f` against the live transport, or explain why it cannot.
    fn with_connected(&self, f: impl FnOnce(&Transport)) {
        match self.transport() {
            Some(t) if t.is_connected() => f(&t),
            Some(_) => println!("{}", "Not connected yet; the command was not sent.".yellow()),
            None => println!("No transport. Run {} first.", "/connect".bold()),
        }
    }

    fn shutdown(&mut self) {
        if let Some(t) = lock(&self.transport).take() {
            t.disconnect();
        }
        if let Some(handle) = self.cockpit.take() {
            handle.abort();
        }
    }
}

/// Entry point for the interactive REPL.
///
/// `shutdown` is polled each iteration; when set the REPL exits cleanly.
pub fn run(mut shell: Shell, shutdown: Arc<AtomicBool>) {
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        if shutdown.load(Ordering::SeqCst) {
            break;
        }

        print!("{} ", "tablepulse>".bold().cyan());
        stdout.flush().ok();

        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) => break, // EOF
            Ok(_) => {}
            Err(e) => {
                eprintln!("{}: {}", "Read error".red(), e);
                break;
            }
        }

        if line.trim().is_empty() {
            continue;
        }

        let command = match parse(&line) {
            Ok(command) => command,
            Err(msg) => {
                println!("{} Type {} for available commands.", msg.red(), "/help".bold());
                continue;
            }
        };

        match command {
            ReplCommand::Help => cmd_help(),
            ReplCommand::Settings => cmd_settings(&mut shell),
            ReplCommand::Serve => cmd_serve(&mut shell),
            ReplCommand::Connect => cmd_connect(&shell),
            ReplCommand::Disconnect => cmd_disconnect(&shell),
            ReplCommand::Join(restaurant) => {
                let restaurant = restaurant.unwrap_or_else(|| shell.config.restaurant_id.clone());
                shell.with_connected(|t| t.join_restaurant(restaurant));
            }
            ReplCommand::Ping => shell.with_connected(Transport::send_ping),
            ReplCommand::Feed(start) => {
                let restaurant = shell.config.restaurant_id.clone();
                shell.with_connected(|t| {
                    if start {
                        t.subscribe_to_live_feed(restaurant);
                    } else {
                        t.unsubscribe_from_live_feed(restaurant);
                    }
                });
            }
            ReplCommand::Status => cmd_status(&shell),
            ReplCommand::Ack(id) => shell.with_connected(|t| {
                t.acknowledge_alert(id.clone());
                println!("{} {}", "✓ Acknowledge sent for".green(), id.bold());
            }),
            ReplCommand::Clear => {
                print!("\x1B[2J\x1B[1;1H");
                stdout.flush().ok();
            }
            ReplCommand::Quit => {
                println!("{}", "Goodbye.".green());
                shutdown.store(true, Ordering::SeqCst);
                break;
            }
        }
    }

    shell.shutdown();
}

// ─────────────────────────────────────────────────────────────────────────────
// Command handlers
// ─────────────────────────────────────────────────────────────────────────────

fn cmd_help() {
    println!();
    println!("{}", "TablePulse Commands".bold().underline());
    println!("  {}           – edit ~/.tablepulse/config.toml", "/settings".bold().cyan());
    println!("  {}              – start the embedded endpoint", "/serve".bold().cyan());
    println!("  {}   – open / close the live connection", "/connect  /disconnect".bold().cyan());
    println!("  {}    – join a restaurant room", "/join [restaurant]".bold().cyan());
    println!("  {}               – round-trip a ping", "/ping".bold().cyan());
    println!("  {}    – follow the live feed", "/feed start|stop".bold().cyan());
    println!("  {}             – connection and feed summary", "/status".bold().cyan());
    println!("  {}      – acknowledge an alert", "/ack <alert-id>".bold().cyan());
    println!("  {}              – clear the screen", "/clear".bold().cyan());
    println!("  {}        – exit the CLI", "/quit  /exit".bold().cyan());
    println!();
}

fn cmd_settings(shell: &mut Shell) {
    let mut cfg = shell.config.clone();

    println!("{}", "Settings Editor".bold().underline());
    println!("  (press Enter to keep the current value)");
    cfg.endpoint_url = prompt_str(
        &format!("  Endpoint URL   [{}]: ", cfg.endpoint_url),
        &cfg.endpoint_url,
    );
    cfg.restaurant_id = prompt_str(
        &format!("  Restaurant id  [{}]: ", cfg.restaurant_id),
        &cfg.restaurant_id,
    );
    cfg.user_id = prompt_str(
        &format!("  User id        [{}]: ", shown(&cfg.user_id)),
        &cfg.user_id,
    );

    let token_hint = if cfg.auth_token.is_empty() { "not set" } else { "set" };
    let token = prompt_str(&format!("  Auth token     [{}]: ", token_hint), "");
    if !token.is_empty() {
        cfg.auth_token = Secret::new(token);
    }

    cfg.cockpit_port = prompt_u16(
        &format!("  Endpoint port  [{}]: ", cfg.cockpit_port),
        cfg.cockpit_port,
    );
    let tick = prompt_str(
        &format!("  Tick (ms)      [{}]: ", cfg.tick_interval_ms),
        &cfg.tick_interval_ms.to_string(),
    );
    match tick.parse::<u64>() {
        Ok(ms) if ms > 0 => cfg.tick_interval_ms = ms,
        _ => println!(
            "  {} '{}' is not a valid interval, keeping {}",
            "Warning:".yellow(),
            tick,
            cfg.tick_interval_ms
        ),
    }

    match config::save(&cfg) {
        Ok(()) => println!(
            "{} {}",
            "✓ Settings saved to".green(),
            config::config_path().display().to_string().bold()
        ),
        Err(e) => println!("{}: {}", "Error saving config".red(), e),
    }
    shell.config = cfg;
}

fn cmd_serve(shell: &mut Shell) {
    if shell.cockpit.as_ref().is_some_and(|h| !h.is_finished()) {
        println!(
            "  Endpoint already running on port {}.",
            shell.config.cockpit_port.to_string().yellow()
        );
        return;
    }
    let cfg = &shell.config;
    let feed = FeedController::new(
        LiveOpsSimulator::new(cfg.simulator.clone()),
        Duration::from_millis(cfg.tick_interval_ms),
    );
    let server = CockpitServer::new(feed).with_port(cfg.cockpit_port);
    shell.cockpit = Some(shell.runtime.spawn(async move {
        if let Err(e) = server.run().await {
            error!(error = %e, "embedded endpoint stopped");
        }
    }));
    println!(
        "  {} Endpoint listening on {} (feed tick {} ms)",
        "✓".green().bold(),
        format!("ws://localhost:{}/live", cfg.cockpit_port).bold(),
        cfg.tick_interval_ms
    );
}

fn cmd_connect(shell: &Shell) {
    if let Some(existing) = shell.transport() {
        if existing.is_connected() {
            println!("  Already connected. Use {} first.", "/disconnect".bold());
            return;
        }
        existing.disconnect();
    }

    let cfg = &shell.config;
    let transport = Transport::new(
        EventBus::default(),
        Arc::new(WsLink::new(cfg.endpoint_url.clone())),
    );
    install_listeners(&transport, &shell.latest);

    let mut params = ConnectParams::new(cfg.restaurant_id.clone());
    if !cfg.user_id.is_empty() {
        params = params.with_user(cfg.user_id.clone());
    }
    if !cfg.auth_token.is_empty() {
        params = params.with_token(cfg.auth_token.expose());
    }

    println!("  Connecting to {} …", cfg.endpoint_url.bold());
    {
        let _runtime = shell.runtime.enter();
        transport.connect(params);
    }
    *lock(&shell.transport) = Some(transport);
}

fn cmd_disconnect(shell: &Shell) {
    match lock(&shell.transport).take() {
        Some(t) => {
            t.disconnect();
            println!("  {} Disconnected.", "✓".green());
        }
        None => println!("  Not connected."),
    }
}

fn cmd_status(shell: &Shell) {
    println!("{}", "Status".bold().underline());
    match shell.transport() {
        Some(t) => println!(
            "  Connection : {:?} (reconnect attempts {}{})",
            t.state(),
            t.reconnect_attempts(),
            if t.reconnect_pending() { ", retry pending" } else { "" }
        ),
        None => println!("  Connection : {}", "none".dimmed()),
    }
    let serving = shell.cockpit.as_ref().is_some_and(|h| !h.is_finished());
    println!(
        "  Endpoint   : {}",
        if serving {
            format!("serving on port {}", shell.config.cockpit_port).green()
        } else {
            "not running".dimmed()
        }
    );

    match lock(&shell.latest).as_ref() {
        Some(snapshot) => {
            for line in summarize(snapshot) {
                println!("  {line}");
            }
        }
        None => println!("  Feed       : {}", "no live-feed data received".dimmed()),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Bus wiring
// ─────────────────────────────────────────────────────────────────────────────

fn install_listeners(transport: &Transport, latest: &Arc<Mutex<Option<FeedSnapshot>>>) {
    let echo = listener(|event| {
        if let Some(line) = announce(event) {
            println!("\n  {line}");
        }
        Ok(())
    });
    for topic in ANNOUNCED {
        transport.on(topic, echo.clone());
    }

    let sink = Arc::clone(latest);
    transport.on(
        Topic::LiveFeedData,
        listener(move |event| {
            if let BusEvent::Server(ServerEvent::LiveFeedData(data)) = event {
                *lock(&sink) = Some(data.snapshot.clone());
            }
            Ok(())
        }),
    );
    transport.on(
        Topic::Error,
        listener(|event| {
            if let BusEvent::Server(ServerEvent::Error(e)) = event {
                println!("\n  {} {}", "endpoint error:".red(), e.message);
            }
            Ok(())
        }),
    );
}

/// One terminal line for an announced bus event.
pub fn announce(event: &BusEvent) -> Option<String> {
    let line = match event {
        BusEvent::ConnectionEstablished => format!("{} connected", "●".green()),
        BusEvent::ConnectionLost { reason } => {
            format!("{} connection lost: {reason}", "●".yellow())
        }
        BusEvent::ConnectionError { error } => format!("{} connection error: {error}", "●".red()),
        BusEvent::MaxReconnectAttemptsReached { attempts } => format!(
            "{} gave up after {attempts} reconnect attempts; run /connect to retry",
            "●".red()
        ),
        BusEvent::Server(server) => match server {
            ServerEvent::Connected(hello) => hello.message.clone(),
            ServerEvent::JoinedRestaurant(ack) => format!("joined {}", ack.restaurant_id),
            ServerEvent::LeftRestaurant(ack) => format!("left {}", ack.restaurant_id),
            ServerEvent::TableStatusChanged(change) => {
                format!("table {} is now {}", change.table_id, change.status)
            }
            ServerEvent::ReservationUpdated(update) => {
                format!("reservation {} is now {}", update.reservation_id, update.status)
            }
            ServerEvent::OrderStatusChanged(change) => match change.table {
                Some(table) => format!(
                    "order {} for table {table} is {}",
                    change.order_id, change.status
                ),
                None => format!("order {} is {}", change.order_id, change.status),
            },
            ServerEvent::InventoryAlert(alert) => format!(
                "{} inventory: {}{}",
                "▲".yellow(),
                alert.item,
                alert.message.as_deref().map(|m| format!(" ({m})")).unwrap_or_default()
            ),
            ServerEvent::LiveFeedSubscribed(ack) => {
                format!("following the live feed of {}", ack.restaurant_id)
            }
            ServerEvent::LiveFeedUnsubscribed(ack) => {
                format!("stopped following {}", ack.restaurant_id)
            }
            ServerEvent::Notification(n) => format!("{}: {}", n.title, n.message),
            ServerEvent::Pong(pong) => format!("pong ({})", pong.timestamp),
            _ => return None,
        },
    };
    Some(line)
}

/// Human summary of a feed snapshot for `/status`.
pub fn summarize(snapshot: &FeedSnapshot) -> Vec<String> {
    let m = &snapshot.metrics;
    let mut lines = vec![
        format!(
            "Feed       : {}{}",
            if snapshot.is_active { "active" } else { "paused" },
            snapshot
                .last_update
                .map(|t| format!(", last update {}", t.format("%H:%M:%S")))
                .unwrap_or_default()
        ),
        format!("Revenue    : ${:.2} across {} orders", m.current_revenue(), m.orders_today),
        format!(
            "Kitchen    : {} on the line, {} pending",
            snapshot.active_orders, snapshot.pending_orders
        ),
        format!(
            "Floor      : {:.0}% occupied, {:.0} min avg wait, {:.1}/5 satisfaction",
            m.table_occupancy_pct, m.avg_wait_time_minutes, m.customer_satisfaction
        ),
        format!(
            "Alerts     : {} open ({} critical)",
            snapshot.unacknowledged_alerts, snapshot.critical_alerts
        ),
    ];
    for alert in snapshot.alerts.iter().filter(|a| !a.acknowledged) {
        let tag = match alert.severity {
            Severity::Critical => "critical",
            Severity::Warning => "warning",
            Severity::Info => "info",
        };
        lines.push(format!("  [{tag}] {} – {} ({})", alert.id, alert.title, alert.message));
    }
    lines
}

// ─────────────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────────────

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn shown(value: &str) -> &str {
    if value.is_empty() { "not set" } else { value }
}

/// Prompt for a u16 value.  Returns `default` when the user presses Enter.
pub(crate) fn prompt_u16(msg: &str, default: u16) -> u16 {
    let raw = prompt_str(msg, &default.to_string());
    match raw.parse::<u16>() {
        Ok(v) => v,
        Err(_) => {
            println!(
                "  {} '{}' is not a valid port number, keeping {}",
                "Warning:".yellow(),
                raw,
                default
            );
            default
        }
    }
}

/// Prompt for a string value.  Returns `default` when the user presses Enter.
pub(crate) fn prompt_str(msg: &str, default: &str) -> String {
    print!("{}", msg);
    io::stdout().flush().ok();

    let mut line = String::new();
    match io::stdin().lock().read_line(&mut line) {
        Ok(_) => {
            let trimmed = line.trim().to_string();
            if trimmed.is_empty() {
                default.to_string()
            } else {
                trimmed
            }
        }
        Err(_) => default.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tablepulse_types::{DisconnectReason, Pong, ServerError};

    #[test]
    fn parses_every_command() {
        assert_eq!(parse("/help"), Ok(ReplCommand::Help));
        assert_eq!(parse("  /status \n"), Ok(ReplCommand::Status));
        assert_eq!(parse("/join"), Ok(ReplCommand::Join(None)));
        assert_eq!(parse("/join harbor"), Ok(ReplCommand::Join(Some("harbor".to_string()))));
        assert_eq!(parse("/feed start"), Ok(ReplCommand::Feed(true)));
        assert_eq!(parse("/feed stop"), Ok(ReplCommand::Feed(false)));
        assert_eq!(parse("/ack alert-1-2"), Ok(ReplCommand::Ack("alert-1-2".to_string())));
        assert_eq!(parse("/exit"), Ok(ReplCommand::Quit));
    }

    #[test]
    fn rejects_bad_input() {
        assert!(parse("/feed").is_err());
        assert!(parse("/feed pause").is_err());
        assert!(parse("/ack").is_err());
        assert!(parse("/ping now").unwrap_err().contains("no arguments"));
        assert!(parse("/join a b").unwrap_err().contains("too many"));
        assert!(parse("/teleport").unwrap_err().contains("Unknown command"));
    }

    #[test]
    fn lifecycle_events_are_announced() {
        let lost = BusEvent::ConnectionLost {
            reason: DisconnectReason::ServerClosed,
        };
        assert!(announce(&lost).unwrap().contains("server closed"));

        let exhausted = BusEvent::MaxReconnectAttemptsReached { attempts: 5 };
        assert!(announce(&exhausted).unwrap().contains("5 reconnect attempts"));

        let pong = BusEvent::Server(ServerEvent::Pong(Pong { timestamp: 42 }));
        assert!(announce(&pong).unwrap().contains("42"));
    }

    #[test]
    fn errors_are_not_announced_twice() {
        let err = BusEvent::Server(ServerEvent::Error(ServerError {
            message: "boom".to_string(),
            code: None,
        }));
        assert_eq!(announce(&err), None);
    }

    #[test]
    fn summary_lists_open_alerts() {
        let snapshot = LiveOpsSimulator::seeded(0).snapshot();
        let lines = summarize(&snapshot);
        assert!(lines.iter().any(|l| l.contains("$4567.89 across 87 orders")));
        assert!(lines.iter().any(|l| l.contains("(1 critical)")));
        let open = snapshot.alerts.iter().filter(|a| !a.acknowledged).count();
        assert_eq!(lines.len(), 5 + open);
        assert!(lines[0].contains("paused"));
    }

    #[test]
    fn summary_rounds_metrics() {
        let mut snapshot = LiveOpsSimulator::seeded(1).snapshot();
        snapshot.metrics.table_occupancy_pct = 77.6;
        assert!(summarize(&snapshot).iter().any(|l| l.contains("78% occupied")));
    }
}
