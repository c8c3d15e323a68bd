use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Remote base URL is http(s) and the auth token is set
/// - Site identity fields are non-empty
/// - Timeouts are positive and uploads get at least as long as ticket creation
/// - Watch interval, when set, is positive
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    let remote = &config.remote;
    if !(remote.base_url.starts_with("http://") || remote.base_url.starts_with("https://")) {
        return Err(ConfigError::ValidationError(format!(
            "remote.base_url must be an http(s) URL, got {:?}",
            remote.base_url
        )));
    }
    if remote.auth_token.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "remote.auth_token cannot be empty".to_string(),
        ));
    }
    if remote.ticket_timeout_secs == 0 || remote.upload_timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "remote timeouts must be greater than 0".to_string(),
        ));
    }
    if remote.upload_timeout_secs < remote.ticket_timeout_secs {
        return Err(ConfigError::ValidationError(
            "remote.upload_timeout_secs cannot be shorter than remote.ticket_timeout_secs"
                .to_string(),
        ));
    }

    let site = &config.site;
    for (name, value) in [
        ("site.site_code", &site.site_code),
        ("site.ticket_type", &site.ticket_type),
        ("site.badge_id", &site.badge_id),
    ] {
        if value.trim().is_empty() {
            return Err(ConfigError::ValidationError(format!(
                "{} cannot be empty",
                name
            )));
        }
    }

    if config.runner.watch_interval_secs == Some(0) {
        return Err(ConfigError::ValidationError(
            "runner.watch_interval_secs cannot be 0".to_string(),
        ));
    }

    Ok(())
}
