use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::PathBuf;

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub folders: FolderConfig,
    pub portal: PortalConfig,
    pub storage: StorageConfig,
    #[serde(default)]
    pub ingest: IngestConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

/// Local folder tree configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FolderConfig {
    /// Root of the mirrored folder tree.
    pub base_folder: PathBuf,
    /// Offset from UTC used when bucketing creation timestamps into dates.
    #[serde(default)]
    pub utc_offset_minutes: i32,
}

/// Case portal endpoints (listing, status reporting, key/value constants)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PortalConfig {
    /// Incoming case listing query.
    pub cases_url: String,
    /// Case status report endpoint.
    pub status_url: String,
    /// Constant lookup prefix; the key name is appended.
    pub constants_get_url: String,
    /// Constant update endpoint (form-encoded).
    pub constants_post_url: String,
    /// Redesign listing query. Redesign mirroring is disabled when absent.
    #[serde(default)]
    pub redesigns_url: Option<String>,
    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
}

/// Remote file storage (Box) configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    /// API root, e.g. "https://api.box.com/2.0"
    #[serde(default = "default_storage_api_url")]
    pub api_url: String,
    /// Pre-issued bearer token.
    pub access_token: String,
    /// Request timeout in seconds (default: 300, downloads can be large)
    #[serde(default = "default_storage_timeout")]
    pub timeout_secs: u32,
    /// Folder listing page size.
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

/// Ingestion cycle configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct IngestConfig {
    /// Run the cycle loop. When disabled, cycles only run via the trigger endpoint.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Concurrent file downloads within one case.
    #[serde(default = "default_download_concurrency")]
    pub download_concurrency: usize,
    /// Copy buffer size for downloads in bytes.
    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,
    /// Key holding the advisory lock timestamp (unix seconds).
    #[serde(default = "default_lock_key")]
    pub lock_key: String,
    /// Key holding the case watermark (epoch milliseconds).
    #[serde(default = "default_watermark_key")]
    pub watermark_key: String,
    /// A lock younger than this is treated as held.
    #[serde(default = "default_lock_window")]
    pub lock_window_secs: u64,
    /// How often the cycle is triggered when idle.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            download_concurrency: default_download_concurrency(),
            buffer_size: default_buffer_size(),
            lock_key: default_lock_key(),
            watermark_key: default_watermark_key(),
            lock_window_secs: default_lock_window(),
            poll_interval_secs: default_poll_interval(),
        }
    }
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::from([0, 0, 0, 0])
}

fn default_port() -> u16 {
    8080
}

fn default_timeout() -> u32 {
    30
}

fn default_storage_api_url() -> String {
    "https://api.box.com/2.0".to_string()
}

fn default_storage_timeout() -> u32 {
    300
}

fn default_page_size() -> u32 {
    100
}

fn default_true() -> bool {
    true
}

fn default_download_concurrency() -> usize {
    4
}

fn default_buffer_size() -> usize {
    256 * 1024
}

fn default_lock_key() -> String {
    "case_downloader_mutex".to_string()
}

fn default_watermark_key() -> String {
    "portal_case_ts_ms".to_string()
}

fn default_lock_window() -> u64 {
    10 * 60
}

fn default_poll_interval() -> u64 {
    60
}

/// Sanitized config for API responses (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub folders: FolderConfig,
    pub portal: PortalConfig,
    pub storage: SanitizedStorageConfig,
    pub ingest: IngestConfig,
    pub server: ServerConfig,
}

/// Sanitized storage config (token hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedStorageConfig {
    pub api_url: String,
    pub access_token_configured: bool,
    pub timeout_secs: u32,
    pub page_size: u32,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            folders: config.folders.clone(),
            portal: config.portal.clone(),
            storage: SanitizedStorageConfig {
                api_url: config.storage.api_url.clone(),
                access_token_configured: !config.storage.access_token.is_empty(),
                timeout_secs: config.storage.timeout_secs,
                page_size: config.storage.page_size,
            },
            ingest: config.ingest.clone(),
            server: config.server.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
[folders]
base_folder = "/srv/cases"

[portal]
cases_url = "https://portal.example.com/cases/incoming"
status_url = "https://portal.example.com/cases/update"
constants_get_url = "https://portal.example.com/constants/"
constants_post_url = "https://portal.example.com/constants"

[storage]
access_token = "secret-token"
"#;

    #[test]
    fn test_deserialize_minimal_config() {
        let config: Config = toml::from_str(MINIMAL).unwrap();
        assert_eq!(config.folders.base_folder, PathBuf::from("/srv/cases"));
        assert_eq!(config.folders.utc_offset_minutes, 0);
        assert_eq!(config.portal.timeout_secs, 30);
        assert!(config.portal.redesigns_url.is_none());
        assert_eq!(config.storage.api_url, "https://api.box.com/2.0");
        assert_eq!(config.storage.page_size, 100);
    }

    #[test]
    fn test_ingest_defaults() {
        let config: Config = toml::from_str(MINIMAL).unwrap();
        assert!(config.ingest.enabled);
        assert_eq!(config.ingest.download_concurrency, 4);
        assert_eq!(config.ingest.lock_key, "case_downloader_mutex");
        assert_eq!(config.ingest.watermark_key, "portal_case_ts_ms");
        assert_eq!(config.ingest.lock_window_secs, 600);
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host.to_string(), "0.0.0.0");
    }

    #[test]
    fn test_deserialize_missing_storage_fails() {
        let toml = r#"
[folders]
base_folder = "/srv/cases"
"#;
        let result: Result<Config, _> = toml::from_str(toml);
        assert!(result.is_err());
    }

    #[test]
    fn test_deserialize_ingest_overrides() {
        let toml = format!(
            "{}\n[ingest]\ndownload_concurrency = 8\nlock_window_secs = 120\nenabled = false\n",
            MINIMAL
        );
        let config: Config = toml::from_str(&toml).unwrap();
        assert_eq!(config.ingest.download_concurrency, 8);
        assert_eq!(config.ingest.lock_window_secs, 120);
        assert!(!config.ingest.enabled);
        // Untouched fields keep their defaults
        assert_eq!(config.ingest.poll_interval_secs, 60);
    }

    #[test]
    fn test_sanitized_config_hides_token() {
        let config: Config = toml::from_str(MINIMAL).unwrap();
        let sanitized = SanitizedConfig::from(&config);
        assert!(sanitized.storage.access_token_configured);

        let json = serde_json::to_string(&sanitized).unwrap();
        assert!(!json.contains("secret-token"));
    }
}
