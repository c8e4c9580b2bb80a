//! Configuration vault – reads/writes `~/.tablepulse/config.toml`.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tablepulse_runtime::SimulatorConfig;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Bearer token that zeroes its buffer when dropped and never prints.
#[derive(Clone, Default, PartialEq, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
#[serde(transparent)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Debug for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(if self.0.is_empty() { "<not set>" } else { "<redacted>" })
    }
}

/// Persisted user configuration stored in `~/.tablepulse/config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Base WebSocket URL of the live-operations endpoint.
    #[serde(default = "default_endpoint_url")]
    pub endpoint_url: String,

    #[serde(default = "default_restaurant_id")]
    pub restaurant_id: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub user_id: String,

    /// Sent as `Authorization: Bearer …` when set.
    #[serde(default, skip_serializing_if = "Secret::is_empty")]
    pub auth_token: Secret,

    /// Port the embedded endpoint binds with `/serve`.
    #[serde(default = "default_cockpit_port")]
    pub cockpit_port: u16,

    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Feed knobs for the embedded endpoint.
    #[serde(default)]
    pub simulator: SimulatorConfig,
}

fn default_endpoint_url() -> String {
    "ws://localhost:4000/live".to_string()
}
fn default_restaurant_id() -> String {
    "demo-bistro".to_string()
}
fn default_cockpit_port() -> u16 {
    4000
}
fn default_tick_interval_ms() -> u64 {
    3000
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint_url: default_endpoint_url(),
            restaurant_id: default_restaurant_id(),
            user_id: String::new(),
            auth_token: Secret::default(),
            cockpit_port: default_cockpit_port(),
            tick_interval_ms: default_tick_interval_ms(),
            simulator: SimulatorConfig::default(),
        }
    }
}

/// Return the path to `~/.tablepulse/config.toml`.
pub fn config_path() -> PathBuf {
    config_path_for_home(
        &std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .unwrap_or_else(|_| ".".to_string()),
    )
}

pub(crate) fn config_path_for_home(home: &str) -> PathBuf {
    PathBuf::from(home).join(".tablepulse").join("config.toml")
}

/// Load the config from disk with `TABLEPULSE_*` overrides applied.
/// Returns `None` if the file does not exist.
pub fn load() -> Result<Option<Config>, String> {
    let mut cfg = load_from(&config_path())?;
    if let Some(cfg) = cfg.as_mut() {
        apply_env_overrides(cfg);
    }
    Ok(cfg)
}

/// Load the file at `path` as-is.
pub(crate) fn load_from(path: &Path) -> Result<Option<Config>, String> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config at {}: {}", path.display(), e))?;
    let cfg: Config = toml::from_str(&raw).map_err(|e| format!("Failed to parse config: {}", e))?;
    Ok(Some(cfg))
}

/// Apply `TABLEPULSE_*` environment variable overrides to `cfg`.
///
/// | Variable | Config field |
/// |---|---|
/// | `TABLEPULSE_ENDPOINT_URL` | `endpoint_url` |
/// | `TABLEPULSE_RESTAURANT_ID` | `restaurant_id` |
/// | `TABLEPULSE_AUTH_TOKEN` | `auth_token` |
/// | `TABLEPULSE_COCKPIT_PORT` | `cockpit_port` |
/// | `TABLEPULSE_TICK_INTERVAL_MS` | `tick_interval_ms` |
///
/// Values that do not parse are ignored.
pub fn apply_env_overrides(cfg: &mut Config) {
    apply_overrides(cfg, |key| std::env::var(key).ok());
}

pub(crate) fn apply_overrides(cfg: &mut Config, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(v) = lookup("TABLEPULSE_ENDPOINT_URL") {
        cfg.endpoint_url = v;
    }
    if let Some(v) = lookup("TABLEPULSE_RESTAURANT_ID") {
        cfg.restaurant_id = v;
    }
    if let Some(v) = lookup("TABLEPULSE_AUTH_TOKEN") {
        cfg.auth_token = Secret::new(v);
    }
    if let Some(v) = lookup("TABLEPULSE_COCKPIT_PORT")
        && let Ok(port) = v.parse::<u16>()
    {
        cfg.cockpit_port = port;
    }
    if let Some(v) = lookup("TABLEPULSE_TICK_INTERVAL_MS")
        && let Ok(ms) = v.parse::<u64>()
        && ms > 0
    {
        cfg.tick_interval_ms = ms;
    }
}

/// Save the config to disk, creating `~/.tablepulse/` if necessary.
pub fn save(cfg: &Config) -> Result<(), String> {
    save_to(cfg, &config_path())
}

pub(crate) fn save_to(cfg: &Config, path: &Path) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| format!("Failed to create config directory: {}", e))?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(parent, fs::Permissions::from_mode(0o700))
                .map_err(|e| format!("Failed to set config directory permissions: {}", e))?;
        }
    }
    let raw =
        toml::to_string_pretty(cfg).map_err(|e| format!("Failed to serialize config: {}", e))?;
    // The token lives in this file: owner read/write only.
    #[cfg(unix)]
    {
        use std::io::Write;
        use std::os::unix::fs::OpenOptionsExt;
        fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(0o600)
            .open(path)
            .and_then(|mut f| f.write_all(raw.as_bytes()))
            .map_err(|e| format!("Failed to write config at {}: {}", path.display(), e))?;
    }
    #[cfg(not(unix))]
    fs::write(path, raw)
        .map_err(|e| format!("Failed to write config at {}: {}", path.display(), e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| env.get(key).cloned()
    }

    #[test]
    fn debug_redacts_the_token() {
        let cfg = Config {
            auth_token: Secret::new("tp-super-secret"),
            ..Config::default()
        };
        let debug_str = format!("{:?}", cfg);
        assert!(!debug_str.contains("tp-super-secret"));
        assert!(debug_str.contains("<redacted>"));
        assert!(format!("{:?}", Config::default()).contains("<not set>"));
    }

    #[cfg(unix)]
    #[test]
    fn config_file_has_restrictive_permissions() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = config_path_for_home(&dir.path().to_string_lossy());

        save_to(&Config::default(), &path).expect("save");

        let file_mode = std::fs::metadata(&path)
            .expect("file metadata")
            .permissions()
            .mode()
            & 0o777;
        assert_eq!(file_mode, 0o600);
        let dir_mode = std::fs::metadata(path.parent().unwrap())
            .expect("dir metadata")
            .permissions()
            .mode()
            & 0o777;
        assert_eq!(dir_mode, 0o700);
    }

    #[test]
    fn roundtrip_default_config() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = config_path_for_home(&dir.path().to_string_lossy());

        save_to(&Config::default(), &path).expect("save");
        let loaded = load_from(&path).expect("load ok").expect("some");

        assert_eq!(loaded, Config::default());
        assert_eq!(loaded.endpoint_url, "ws://localhost:4000/live");
        assert_eq!(loaded.cockpit_port, 4000);
        assert_eq!(loaded.tick_interval_ms, 3000);
    }

    #[test]
    fn roundtrip_keeps_token_and_user() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = config_path_for_home(&dir.path().to_string_lossy());
        let cfg = Config {
            user_id: "host-7".to_string(),
            auth_token: Secret::new("abc"),
            ..Config::default()
        };
        save_to(&cfg, &path).expect("save");
        let loaded = load_from(&path).expect("load ok").expect("some");
        assert_eq!(loaded.user_id, "host-7");
        assert_eq!(loaded.auth_token.expose(), "abc");
    }

    #[test]
    fn sparse_file_fills_in_defaults() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "restaurant_id = \"harbor\"\n[simulator]\nalert_chance = 0.5\n",
        )
        .unwrap();

        let loaded = load_from(&path).expect("load ok").expect("some");
        assert_eq!(loaded.restaurant_id, "harbor");
        assert_eq!(loaded.cockpit_port, 4000);
        assert_eq!(loaded.simulator.alert_chance, 0.5);
        assert_eq!(loaded.simulator.financial_chance, 0.30);
    }

    #[test]
    fn config_path_points_to_tablepulse_dir() {
        let p = config_path_for_home("/home/testuser");
        assert!(p.to_string_lossy().contains(".tablepulse"));
        assert!(p.to_string_lossy().ends_with("config.toml"));
    }

    #[test]
    fn load_from_returns_none_when_missing() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = config_path_for_home(&dir.path().to_string_lossy());
        assert!(load_from(&path).expect("no error").is_none());
    }

    #[test]
    fn overrides_replace_file_values() {
        let mut cfg = Config::default();
        apply_overrides(
            &mut cfg,
            lookup(&[
                ("TABLEPULSE_ENDPOINT_URL", "wss://ops.example.com/live"),
                ("TABLEPULSE_RESTAURANT_ID", "harbor"),
                ("TABLEPULSE_AUTH_TOKEN", "t0k"),
                ("TABLEPULSE_COCKPIT_PORT", "4100"),
                ("TABLEPULSE_TICK_INTERVAL_MS", "500"),
            ]),
        );
        assert_eq!(cfg.endpoint_url, "wss://ops.example.com/live");
        assert_eq!(cfg.restaurant_id, "harbor");
        assert_eq!(cfg.auth_token.expose(), "t0k");
        assert_eq!(cfg.cockpit_port, 4100);
        assert_eq!(cfg.tick_interval_ms, 500);
    }

    #[test]
    fn overrides_ignore_invalid_numbers() {
        let mut cfg = Config::default();
        apply_overrides(
            &mut cfg,
            lookup(&[
                ("TABLEPULSE_COCKPIT_PORT", "not-a-port"),
                ("TABLEPULSE_TICK_INTERVAL_MS", "0"),
            ]),
        );
        assert_eq!(cfg.cockpit_port, 4000);
        assert_eq!(cfg.tick_interval_ms, 3000);
    }
}
