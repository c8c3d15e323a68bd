use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use std::path::Path;

use super::{types::Config, ConfigError};

/// Load configuration from file with environment variable overrides.
///
/// Environment keys use `__` between sections, e.g.
/// `PARKWARDEN_REMOTE__AUTH_TOKEN` overrides `remote.auth_token`.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.display().to_string()));
    }

    let config: Config = Figment::new()
        .merge(Toml::file(path))
        .merge(Env::prefixed("PARKWARDEN_").split("__"))
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))?;

    Ok(config)
}

/// Load configuration from TOML string (useful for testing)
pub fn load_config_from_str(toml_str: &str) -> Result<Config, ConfigError> {
    toml::from_str(toml_str).map_err(|e| ConfigError::ParseError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const MINIMAL: &str = r#"
[paths]
inbox_dir = "/srv/anpr/inbox"
done_dir = "/srv/anpr/done"
work_dir = "/srv/anpr/work"
log_dir = "/srv/anpr/logs"

[remote]
base_url = "https://api.example.test/v1"
auth_token = "secret"

[site]
site_code = "SITE01"
enforcement_type = 2
ticket_type = "pcn"
badge_id = "B42"
primary_contravention = "87"
"#;

    #[test]
    fn test_load_config_from_str_valid() {
        let config = load_config_from_str(MINIMAL).unwrap();
        assert_eq!(config.site.site_code, "SITE01");
        assert_eq!(config.site.enforcement_type, "2");
        assert_eq!(config.remote.ticket_timeout_secs, 60);
    }

    #[test]
    fn test_load_config_from_str_missing_site() {
        let toml = r#"
[paths]
inbox_dir = "/in"
done_dir = "/done"
work_dir = "/work"
log_dir = "/logs"

[remote]
base_url = "https://api.example.test"
auth_token = "secret"
"#;
        let result = load_config_from_str(toml);
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_load_config_file_not_found() {
        let result = load_config(Path::new("/nonexistent/parkwarden.toml"));
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_load_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "{}", MINIMAL).unwrap();

        let config = load_config(temp_file.path()).unwrap();
        assert_eq!(config.remote.base_url, "https://api.example.test/v1");
        assert_eq!(config.site.badge_id, "B42");
        assert!(config.remote.verify_tls);
    }
}
