//! `tablepulse-cli` – TablePulse command line shell.
//!
//! The `tablepulse` binary:
//!
//! 1. Loads `~/.tablepulse/config.toml`, running a **First-Run Wizard** when
//!    the file is absent.
//! 2. Drops the user into an **interactive REPL** that can host the
//!    embedded live-operations endpoint (`/serve`) and follow a remote one
//!    through the reconnecting transport (`/connect`, `/feed start`).
//! 3. Intercepts **Ctrl-C** to close the live connection before exiting.

mod config;
mod repl;

use colored::Colorize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::warn;

use crate::config::{Config, Secret};
use crate::repl::{SharedTransport, Shell, prompt_str, prompt_u16};

fn main() {
    // RUST_LOG filters, TABLEPULSE_LOG_FORMAT=json switches to JSON lines.
    // User-facing output stays on println!.
    let _telemetry = tablepulse_runtime::init_tracing("tablepulse");

    print_banner();

    let shutdown = Arc::new(AtomicBool::new(false));
    let transport: SharedTransport = Arc::new(Mutex::new(None));

    // ── Ctrl-C handler ────────────────────────────────────────────────────
    let shutdown_flag = Arc::clone(&shutdown);
    let transport_slot = Arc::clone(&transport);
    if let Err(e) = ctrlc::set_handler(move || {
        println!();
        println!("{}", "⚠  Ctrl-C received – shutting down …".yellow().bold());

        let live = transport_slot
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        if let Some(t) = live {
            t.disconnect();
            println!("{}", "  ✓ Live connection closed.".green());
        }
        println!("{}", "  ✓ Exiting TablePulse.".green());

        shutdown_flag.store(true, Ordering::SeqCst);
        std::process::exit(0);
    }) {
        warn!(error = %e, "Failed to install Ctrl-C handler");
    }

    // ── Configuration ─────────────────────────────────────────────────────
    let cfg = match config::load() {
        Ok(None) => run_first_run_wizard(),
        Ok(Some(cfg)) => {
            println!(
                "  Config loaded from {}",
                config::config_path().display().to_string().bold()
            );
            cfg
        }
        Err(e) => {
            println!("{}: {}", "Config error".red(), e);
            println!("  Using default configuration.");
            let mut cfg = Config::default();
            config::apply_env_overrides(&mut cfg);
            cfg
        }
    };

    println!(
        "  Restaurant {} via {}",
        cfg.restaurant_id.bold(),
        cfg.endpoint_url.dimmed()
    );

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            println!("{}: {}", "Failed to start the async runtime".red(), e);
            return;
        }
    };

    println!();
    println!("  Type {} for a list of commands.\n", "/help".bold().cyan());

    // ── Interactive REPL ──────────────────────────────────────────────────
    repl::run(Shell::new(runtime.handle().clone(), cfg, transport), shutdown);

    runtime.shutdown_timeout(Duration::from_secs(1));
}

// ─────────────────────────────────────────────────────────────────────────────
// First-Run Wizard
// ─────────────────────────────────────────────────────────────────────────────

fn run_first_run_wizard() -> Config {
    println!();
    println!("{}", "  ╔══════════════════════════════════════╗".bold().cyan());
    println!("{}", "  ║     TablePulse First-Run Wizard      ║".bold().cyan());
    println!("{}", "  ╚══════════════════════════════════════╝".bold().cyan());
    println!();
    println!("  No configuration found.  Let's set up TablePulse.\n");

    let mut cfg = Config::default();

    cfg.restaurant_id = prompt_str(
        &format!("  Restaurant id [{}]: ", cfg.restaurant_id),
        &cfg.restaurant_id,
    );
    cfg.user_id = prompt_str("  Your user id (optional): ", "");
    cfg.endpoint_url = prompt_str(
        &format!("  Live-operations endpoint [{}]: ", cfg.endpoint_url),
        &cfg.endpoint_url,
    );
    let token = prompt_str("  Auth token (optional): ", "");
    if !token.is_empty() {
        cfg.auth_token = Secret::new(token);
    }
    cfg.cockpit_port = prompt_u16(
        &format!("  Port for the embedded endpoint [{}]: ", cfg.cockpit_port),
        cfg.cockpit_port,
    );

    match config::save(&cfg) {
        Ok(()) => println!(
            "\n  {} Config saved to {}\n",
            "✓".green().bold(),
            config::config_path().display().to_string().bold()
        ),
        Err(e) => println!("{}: {}", "Error saving config".red(), e),
    }

    config::apply_env_overrides(&mut cfg);
    cfg
}

// ─────────────────────────────────────────────────────────────────────────────
// Banner
// ─────────────────────────────────────────────────────────────────────────────

fn print_banner() {
    println!();
    println!("{}", r#"  _____     _    _      ___      _         "#.bold().cyan());
    println!("{}", r#" |_   _|_ _| |__| |___ | _ \_  _| |___ ___ "#.bold().cyan());
    println!("{}", r#"   | |/ _` | '_ \ / -_)|  _/ || | (_-</ -_)"#.bold().cyan());
    println!("{}", r#"   |_|\__,_|_.__/_\___||_|  \_,_|_/__/\___|"#.bold().cyan());
    println!();
    println!(
        "  {} {}",
        "TablePulse".bold(),
        format!("v{}", env!("CARGO_PKG_VERSION")).dimmed()
    );
    println!("  Live restaurant operations, from the pass to the floor");
    println!();
}
