//! Configuration for iplists.
//!
//! Every setting has a default, so the tool runs without a config file.
//! Values here replace what would otherwise be process-wide flags (day windows,
//! endpoints, timeouts) and are passed explicitly into each operation.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Secure string type that zeroizes memory on drop.
/// Used for API keys.
#[derive(Clone, Default, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
#[serde(transparent)]
pub struct SecureString(String);

impl SecureString {
    pub fn new(s: String) -> Self {
        Self(s)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Debug for SecureString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl From<&str> for SecureString {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP client settings
    pub http: HttpConfig,

    /// AbuseIPDB blacklist cache
    pub adb: AdbConfig,

    /// Microsoft 365 endpoint ranges
    pub o365: O365Config,
}

impl Config {
    /// Load configuration from a YAML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;
        let config: Config = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path.as_ref()))?;

        config.validate()?;

        Ok(config)
    }

    /// Load from `path` if given, otherwise use defaults
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.http.timeout_secs == 0 {
            anyhow::bail!("http.timeout_secs must be greater than zero");
        }

        if self.http.max_body_bytes == 0 {
            anyhow::bail!("http.max_body_bytes must be greater than zero");
        }

        if !self.adb.url.starts_with("https://") {
            anyhow::bail!("AbuseIPDB URL must use HTTPS: {}", self.adb.url);
        }

        if !self.o365.url.starts_with("https://") {
            anyhow::bail!("Office 365 endpoint URL must use HTTPS: {}", self.o365.url);
        }

        if self.adb.key_env.is_empty() {
            anyhow::bail!("adb.key_env must name an environment variable");
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Largest accepted response body
    pub max_body_bytes: usize,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 15,
            max_body_bytes: 10 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AdbConfig {
    /// Blacklist endpoint
    pub url: String,
    /// Environment variable holding one or more comma-separated API keys
    pub key_env: String,
    /// Drop cached IPs not seen for this many days when fetching
    pub fetch_days: u32,
    /// Include IPs seen within this many days when building a list (0 = all)
    pub build_days: u32,
}

impl Default for AdbConfig {
    fn default() -> Self {
        Self {
            url: "https://api.abuseipdb.com/api/v2/blacklist".to_string(),
            key_env: "ADB_KEY".to_string(),
            fetch_days: 100,
            build_days: 30,
        }
    }
}

impl AdbConfig {
    /// Read the API keys from the configured environment variable.
    ///
    /// The variable may hold several keys separated by commas.
    pub fn keys(&self) -> Result<Vec<SecureString>> {
        let raw = SecureString::new(env::var(&self.key_env).unwrap_or_default());
        let keys = parse_keys(raw.as_str());
        if keys.is_empty() {
            anyhow::bail!(
                "{} environment variable must be set to your AbuseIPDB API key",
                self.key_env
            );
        }
        Ok(keys)
    }
}

fn parse_keys(raw: &str) -> Vec<SecureString> {
    raw.split(',')
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(SecureString::from)
        .collect()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct O365Config {
    /// Worldwide endpoints JSON
    pub url: String,
    /// Service area whose ranges are written
    pub service: String,
}

impl Default for O365Config {
    fn default() -> Self {
        Self {
            url: "https://endpoints.office.com/endpoints/worldwide?clientrequestid=b10c5ed1-bad1-445f-b386-b919946339a7"
                .to_string(),
            service: "Microsoft Teams".to_string(),
        }
    }
}
