use super::{types::Config, ConfigError, TRACKING_NUMBER_PLACEHOLDER};

/// Lower bound for the delay between carrier requests.
pub const MIN_PACING_MS: u64 = 1000;

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Sync interval is not 0
/// - Carrier request pacing is at least one second
/// - Carrier URL templates contain the tracking number placeholder
/// - Portal URL, team filter and subject marker are not empty
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    if config.sync.interval_secs == 0 {
        return Err(ConfigError::ValidationError(
            "sync.interval_secs cannot be 0".to_string(),
        ));
    }

    if config.sync.pacing_ms < MIN_PACING_MS {
        return Err(ConfigError::ValidationError(format!(
            "sync.pacing_ms must be at least {}",
            MIN_PACING_MS
        )));
    }

    if !config
        .carriers
        .ups
        .url_template
        .contains(TRACKING_NUMBER_PLACEHOLDER)
    {
        return Err(ConfigError::ValidationError(format!(
            "carriers.ups.url_template must contain {}",
            TRACKING_NUMBER_PLACEHOLDER
        )));
    }

    if let Some(portal) = &config.portal {
        if portal.url.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "portal.url cannot be empty".to_string(),
            ));
        }
        if portal.team_filter.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "portal.team_filter cannot be empty".to_string(),
            ));
        }
        if portal.subject_marker.is_empty() {
            return Err(ConfigError::ValidationError(
                "portal.subject_marker cannot be empty".to_string(),
            ));
        }
    }

    Ok(())
}
