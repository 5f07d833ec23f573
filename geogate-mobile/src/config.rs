//! Load config from file and environment.

use std::path::PathBuf;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::Deserialize;

use crate::location::PositionOptions;
use crate::permission::Platform;

/// Host configuration. File: ~/.config/geogate/config.toml or /etc/geogate/config.toml.
/// Env overrides: GEOGATE_ENDPOINT, GEOGATE_APPCODE, GEOGATE_PANEL, GEOGATE_AUTH_TOKEN,
/// GEOGATE_REQUEST_TIMEOUT_MS, GEOGATE_BOUNDARIES.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Lookup endpoint; the query string is appended verbatim.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_appcode")]
    pub appcode: String,
    #[serde(default = "default_panel")]
    pub panel: String,
    /// Pre-encoded Basic credential. Takes precedence over auth_user/auth_secret.
    #[serde(default)]
    pub auth_token: Option<String>,
    #[serde(default)]
    pub auth_user: Option<String>,
    #[serde(default)]
    pub auth_secret: Option<String>,
    /// Client-side timeout for the lookup request (default 10000).
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    /// Location fix timeout (default 5000).
    #[serde(default = "default_location_timeout_ms")]
    pub location_timeout_ms: u64,
    /// Oldest cached fix accepted (default 10000).
    #[serde(default = "default_location_maximum_age_ms")]
    pub location_maximum_age_ms: u64,
    /// Permission flow (default runtime).
    #[serde(default)]
    pub platform: Platform,
    /// GeoJSON country boundaries.
    #[serde(default)]
    pub boundaries_path: Option<PathBuf>,
}

fn default_endpoint() -> String {
    "https://api-app.22w.in/index/get-product".to_string()
}
fn default_appcode() -> String {
    geogate_core::DEFAULT_APPCODE.to_string()
}
fn default_panel() -> String {
    geogate_core::DEFAULT_PANEL.to_string()
}
fn default_request_timeout_ms() -> u64 {
    10_000
}
fn default_location_timeout_ms() -> u64 {
    5_000
}
fn default_location_maximum_age_ms() -> u64 {
    10_000
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            appcode: default_appcode(),
            panel: default_panel(),
            auth_token: None,
            auth_user: None,
            auth_secret: None,
            request_timeout_ms: default_request_timeout_ms(),
            location_timeout_ms: default_location_timeout_ms(),
            location_maximum_age_ms: default_location_maximum_age_ms(),
            platform: Platform::default(),
            boundaries_path: None,
        }
    }
}

impl Config {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Coarse fix with the configured timeout and cache age.
    pub fn position_options(&self) -> PositionOptions {
        PositionOptions {
            enable_high_accuracy: false,
            timeout: Duration::from_millis(self.location_timeout_ms),
            maximum_age: Duration::from_millis(self.location_maximum_age_ms),
        }
    }

    /// `Basic <token>` header value, if any credential is configured.
    pub fn authorization(&self) -> Option<String> {
        if let Some(token) = self.auth_token.as_deref().filter(|t| !t.is_empty()) {
            return Some(format!("Basic {}", token));
        }
        let user = self.auth_user.as_deref()?;
        let secret = self.auth_secret.as_deref().unwrap_or_default();
        Some(format!("Basic {}", STANDARD.encode(format!("{}:{}", user, secret))))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("reading {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("parsing {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Load config: merge default, then config file (if present), then env vars.
/// A broken config file is reported, not silently replaced by defaults.
pub fn load() -> Result<Config, ConfigError> {
    let mut c = load_file()?.unwrap_or_default();
    apply_env(&mut c, |key| std::env::var(key).ok());
    Ok(c)
}

/// Apply env overrides through `get` so tests need not touch the process environment.
pub fn apply_env(c: &mut Config, get: impl Fn(&str) -> Option<String>) {
    if let Some(s) = get("GEOGATE_ENDPOINT") {
        c.endpoint = s;
    }
    if let Some(s) = get("GEOGATE_APPCODE") {
        c.appcode = s;
    }
    if let Some(s) = get("GEOGATE_PANEL") {
        c.panel = s;
    }
    if let Some(s) = get("GEOGATE_AUTH_TOKEN") {
        c.auth_token = Some(s);
    }
    if let Some(s) = get("GEOGATE_REQUEST_TIMEOUT_MS") {
        if let Ok(ms) = s.parse::<u64>() {
            c.request_timeout_ms = ms;
        }
    }
    if let Some(s) = get("GEOGATE_BOUNDARIES") {
        c.boundaries_path = Some(PathBuf::from(s));
    }
}

fn config_paths() -> Vec<PathBuf> {
    let home = std::env::var_os("HOME").map(PathBuf::from);
    let mut out = Vec::new();
    if let Some(h) = home {
        out.push(h.join(".config/geogate/config.toml"));
    }
    out.push(PathBuf::from("/etc/geogate/config.toml"));
    out
}

fn load_file() -> Result<Option<Config>, ConfigError> {
    for p in config_paths() {
        if p.exists() {
            return parse_file(p).map(Some);
        }
    }
    Ok(None)
}

fn parse_file(path: PathBuf) -> Result<Config, ConfigError> {
    let s = match std::fs::read_to_string(&path) {
        Ok(s) => s,
        Err(source) => return Err(ConfigError::Read { path, source }),
    };
    toml::from_str::<Config>(&s).map_err(|source| ConfigError::Parse { path, source })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults() {
        let c = Config::default();
        assert_eq!(c.appcode, "22win_android");
        assert_eq!(c.panel, "main");
        assert_eq!(c.location_timeout_ms, 5000);
        assert_eq!(c.location_maximum_age_ms, 10000);
        assert_eq!(c.request_timeout(), Duration::from_secs(10));
        assert_eq!(c.platform, Platform::Runtime);
        assert_eq!(c.position_options(), PositionOptions::default());
        assert!(c.authorization().is_none());
    }

    #[test]
    fn parses_partial_file() {
        let c: Config = toml::from_str(
            r#"
            endpoint = "http://127.0.0.1:9000/lookup"
            platform = "when_in_use"
            auth_token = "dG9rZW4="
            "#,
        )
        .unwrap();
        assert_eq!(c.endpoint, "http://127.0.0.1:9000/lookup");
        assert_eq!(c.platform, Platform::WhenInUse);
        assert_eq!(c.panel, "main");
        assert_eq!(c.authorization().as_deref(), Some("Basic dG9rZW4="));
    }

    #[test]
    fn rejects_unknown_fields() {
        assert!(toml::from_str::<Config>("proxy_port = 3128").is_err());
    }

    #[test]
    fn builds_basic_credential_from_parts() {
        let c = Config {
            auth_user: Some("user".into()),
            auth_secret: Some("pass".into()),
            ..Config::default()
        };
        assert_eq!(c.authorization().as_deref(), Some("Basic dXNlcjpwYXNz"));
    }

    #[test]
    fn env_overrides() {
        let env: HashMap<&str, &str> = [
            ("GEOGATE_ENDPOINT", "http://localhost/x"),
            ("GEOGATE_AUTH_TOKEN", "abc"),
            ("GEOGATE_REQUEST_TIMEOUT_MS", "250"),
            ("GEOGATE_BOUNDARIES", "/data/borders.json"),
        ]
        .into_iter()
        .collect();
        let mut c = Config::default();
        apply_env(&mut c, |k| env.get(k).map(|v| v.to_string()));
        assert_eq!(c.endpoint, "http://localhost/x");
        assert_eq!(c.authorization().as_deref(), Some("Basic abc"));
        assert_eq!(c.request_timeout(), Duration::from_millis(250));
        assert_eq!(c.boundaries_path, Some(PathBuf::from("/data/borders.json")));
        assert_eq!(c.appcode, "22win_android");
    }

    #[test]
    fn bad_env_number_is_ignored() {
        let mut c = Config::default();
        apply_env(&mut c, |k| (k == "GEOGATE_REQUEST_TIMEOUT_MS").then(|| "soon".to_string()));
        assert_eq!(c.request_timeout_ms, 10_000);
    }
}
