use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Required sections exist (enforced by serde)
/// - Base folder is set
/// - Endpoint URLs are http(s)
/// - Download concurrency and lock window are non-zero
/// - Server port is not 0
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.folders.base_folder.as_os_str().is_empty() {
        return Err(ConfigError::ValidationError(
            "folders.base_folder cannot be empty".to_string(),
        ));
    }

    let mut urls = vec![
        ("portal.cases_url", config.portal.cases_url.as_str()),
        ("portal.status_url", config.portal.status_url.as_str()),
        (
            "portal.constants_get_url",
            config.portal.constants_get_url.as_str(),
        ),
        (
            "portal.constants_post_url",
            config.portal.constants_post_url.as_str(),
        ),
        ("storage.api_url", config.storage.api_url.as_str()),
    ];
    if let Some(url) = &config.portal.redesigns_url {
        urls.push(("portal.redesigns_url", url.as_str()));
    }
    for (name, url) in urls {
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ConfigError::ValidationError(format!(
                "{} must be an http(s) URL, got {:?}",
                name, url
            )));
        }
    }

    if config.storage.access_token.is_empty() {
        return Err(ConfigError::ValidationError(
            "storage.access_token cannot be empty".to_string(),
        ));
    }

    if config.ingest.download_concurrency == 0 {
        return Err(ConfigError::ValidationError(
            "ingest.download_concurrency must be at least 1".to_string(),
        ));
    }

    if config.ingest.lock_window_secs == 0 {
        return Err(ConfigError::ValidationError(
            "ingest.lock_window_secs cannot be 0".to_string(),
        ));
    }

    // Server validation
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{
        FolderConfig, IngestConfig, PortalConfig, ServerConfig, StorageConfig,
    };
    use std::path::PathBuf;

    fn valid_config() -> Config {
        Config {
            folders: FolderConfig {
                base_folder: PathBuf::from("/srv/cases"),
                utc_offset_minutes: 0,
            },
            portal: PortalConfig {
                cases_url: "https://portal.test/cases".to_string(),
                status_url: "https://portal.test/status".to_string(),
                constants_get_url: "https://portal.test/constants/".to_string(),
                constants_post_url: "https://portal.test/constants".to_string(),
                redesigns_url: None,
                timeout_secs: 30,
            },
            storage: StorageConfig {
                api_url: "https://api.box.com/2.0".to_string(),
                access_token: "token".to_string(),
                timeout_secs: 300,
                page_size: 100,
            },
            ingest: IngestConfig::default(),
            server: ServerConfig::default(),
        }
    }

    #[test]
    fn test_validate_valid_config() {
        assert!(validate_config(&valid_config()).is_ok());
    }

    #[test]
    fn test_validate_port_zero_fails() {
        let mut config = valid_config();
        config.server.port = 0;
        let err = validate_config(&config).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn test_validate_zero_concurrency_fails() {
        let mut config = valid_config();
        config.ingest.download_concurrency = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_bad_redesign_url_fails() {
        let mut config = valid_config();
        config.portal.redesigns_url = Some("ftp://portal.test/redesigns".to_string());
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("portal.redesigns_url"));
    }

    #[test]
    fn test_validate_empty_token_fails() {
        let mut config = valid_config();
        config.storage.access_token.clear();
        assert!(validate_config(&config).is_err());
    }
}
