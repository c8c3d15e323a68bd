use serde::{Deserialize, Deserializer, Serialize};
use std::path::PathBuf;

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub paths: PathsConfig,
    pub remote: RemoteConfig,
    pub site: SiteConfig,
    #[serde(default)]
    pub runner: RunnerConfig,
}

/// Filesystem roots. Everything except the inbox is partitioned by date at run time.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PathsConfig {
    /// Flat directory polled for evidence archives.
    pub inbox_dir: PathBuf,
    /// Root for successfully processed archives.
    pub done_dir: PathBuf,
    /// Root for per-archive extraction areas.
    pub work_dir: PathBuf,
    /// Root for run logs.
    pub log_dir: PathBuf,
    /// Root for quarantined archives (default: `<inbox_dir>/failed`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failed_dir: Option<PathBuf>,
}

impl PathsConfig {
    /// Failure root, falling back to a `failed` folder inside the inbox.
    pub fn failed_root(&self) -> PathBuf {
        self.failed_dir
            .clone()
            .unwrap_or_else(|| self.inbox_dir.join("failed"))
    }
}

/// Remote ticketing system connection.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RemoteConfig {
    /// Base URL, e.g. "https://enforcement.example.com/api".
    pub base_url: String,
    /// Token sent in the `HTTPS_AUTH` header.
    pub auth_token: String,
    /// Verify the server certificate. Deployment-wide.
    #[serde(default = "default_true")]
    pub verify_tls: bool,
    /// Timeout for ticket creation in seconds (default: 60)
    #[serde(default = "default_ticket_timeout")]
    pub ticket_timeout_secs: u64,
    /// Timeout for attachment uploads in seconds (default: 120)
    #[serde(default = "default_upload_timeout")]
    pub upload_timeout_secs: u64,
}

impl RemoteConfig {
    /// Base URL without trailing slash.
    pub fn base_url(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }
}

fn default_true() -> bool {
    true
}

fn default_ticket_timeout() -> u64 {
    60
}

fn default_upload_timeout() -> u64 {
    120
}

/// Static site and enforcement policy applied to every ticket.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SiteConfig {
    pub site_code: String,
    #[serde(deserialize_with = "string_or_number")]
    pub enforcement_type: String,
    pub ticket_type: String,
    pub badge_id: String,
    #[serde(deserialize_with = "string_or_number")]
    pub primary_contravention: String,
}

/// Process behaviour around the batch.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RunnerConfig {
    /// Repeat the batch on this interval. Absent means run once and exit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub watch_interval_secs: Option<u64>,
    /// Write Prometheus text exposition here after each batch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics_textfile: Option<PathBuf>,
}

/// Codes are often written as bare numbers in config files.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Code {
        Text(String),
        Int(i64),
    }

    Ok(match Code::deserialize(deserializer)? {
        Code::Text(s) => s,
        Code::Int(n) => n.to_string(),
    })
}

/// Sanitized config for logging (auth token redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub paths: PathsConfig,
    pub remote: SanitizedRemoteConfig,
    pub site: SiteConfig,
    pub runner: RunnerConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedRemoteConfig {
    pub base_url: String,
    pub auth_token_configured: bool,
    pub verify_tls: bool,
    pub ticket_timeout_secs: u64,
    pub upload_timeout_secs: u64,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            paths: config.paths.clone(),
            remote: SanitizedRemoteConfig {
                base_url: config.remote.base_url.clone(),
                auth_token_configured: !config.remote.auth_token.is_empty(),
                verify_tls: config.remote.verify_tls,
                ticket_timeout_secs: config.remote.ticket_timeout_secs,
                upload_timeout_secs: config.remote.upload_timeout_secs,
            },
            site: config.site.clone(),
            runner: config.runner.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: &str = r#"
[paths]
inbox_dir = "/srv/anpr/inbox"
done_dir = "/srv/anpr/done"
work_dir = "/srv/anpr/work"
log_dir = "/srv/anpr/logs"
failed_dir = "/srv/anpr/failed"

[remote]
base_url = "https://api.example.test/v1/"
auth_token = "secret"
verify_tls = false
ticket_timeout_secs = 30
upload_timeout_secs = 90

[site]
site_code = "SITE01"
enforcement_type = "2"
ticket_type = "pcn"
badge_id = "B42"
primary_contravention = 87

[runner]
watch_interval_secs = 300
metrics_textfile = "/var/lib/node_exporter/parkwarden.prom"
"#;

    #[test]
    fn test_deserialize_full_config() {
        let config: Config = toml::from_str(FULL).unwrap();
        assert_eq!(config.paths.failed_root(), PathBuf::from("/srv/anpr/failed"));
        assert!(!config.remote.verify_tls);
        assert_eq!(config.remote.ticket_timeout_secs, 30);
        assert_eq!(config.remote.upload_timeout_secs, 90);
        assert_eq!(config.site.primary_contravention, "87");
        assert_eq!(config.runner.watch_interval_secs, Some(300));
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let config: Config = toml::from_str(FULL).unwrap();
        assert_eq!(config.remote.base_url(), "https://api.example.test/v1");
    }

    #[test]
    fn test_failed_root_defaults_inside_inbox() {
        let paths = PathsConfig {
            inbox_dir: PathBuf::from("/in"),
            done_dir: PathBuf::from("/done"),
            work_dir: PathBuf::from("/work"),
            log_dir: PathBuf::from("/logs"),
            failed_dir: None,
        };
        assert_eq!(paths.failed_root(), PathBuf::from("/in/failed"));
    }

    #[test]
    fn test_runner_defaults() {
        let toml = FULL.split("[runner]").next().unwrap();
        let config: Config = toml::from_str(toml).unwrap();
        assert!(config.runner.watch_interval_secs.is_none());
        assert!(config.runner.metrics_textfile.is_none());
    }

    #[test]
    fn test_sanitized_config_hides_token() {
        let config: Config = toml::from_str(FULL).unwrap();
        let sanitized = SanitizedConfig::from(&config);
        assert!(sanitized.remote.auth_token_configured);

        let json = serde_json::to_string(&sanitized).unwrap();
        assert!(!json.contains("secret"));
        assert!(json.contains("SITE01"));
    }
}
