use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

/// Environment variable naming an explicit config file
pub const CONFIG_ENV: &str = "ORCHCTL_CONFIG";

const CONFIG_NAMES: [&str; 4] = ["orchctl.yaml", "orchctl.yml", ".orchctl.yaml", ".orchctl.yml"];

fn default_base_url() -> String {
    "http://localhost:8090".into()
}
fn default_refresh_interval() -> u64 {
    2000
}

/// Client configuration file structure
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct ClientConfig {
    /// Orchestrator base URL
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Delay between two status polls when nothing wakes the loop early
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval_ms: u64,

    /// Per-request HTTP timeout
    #[serde(default)]
    pub request_timeout_ms: Option<u64>,

    /// Where the dashboard writes its diagnostics
    #[serde(default)]
    pub log_file: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            refresh_interval_ms: default_refresh_interval(),
            request_timeout_ms: None,
            log_file: None,
        }
    }
}

/// Configuration loading errors
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Yaml(serde_yaml::Error),
    InvalidBaseUrl { url: String },
    InvalidInterval,
    NotFound { searched: Vec<PathBuf> },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "IO error: {}", e),
            Self::Yaml(e) => write!(f, "YAML parse error: {}", e),
            Self::InvalidBaseUrl { url } => {
                write!(f, "base_url '{}' is not an http(s) URL", url)
            }
            Self::InvalidInterval => write!(f, "refresh_interval_ms must be greater than 0"),
            Self::NotFound { searched } => {
                write!(f, "no config file found, searched: {:?}", searched)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        ConfigError::Io(e)
    }
}

impl From<serde_yaml::Error> for ConfigError {
    fn from(e: serde_yaml::Error) -> Self {
        ConfigError::Yaml(e)
    }
}

impl ClientConfig {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Load configuration from a string (useful for testing)
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        let config: ClientConfig = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Find a config file: `ORCHCTL_CONFIG` first, then the standard names in `dir`
    pub fn discover(dir: &Path) -> Result<(PathBuf, Self), ConfigError> {
        Self::discover_with(std::env::var_os(CONFIG_ENV).map(PathBuf::from), dir)
    }

    fn discover_with(
        explicit: Option<PathBuf>,
        dir: &Path,
    ) -> Result<(PathBuf, Self), ConfigError> {
        let mut searched = Vec::new();

        if let Some(path) = explicit {
            if path.exists() {
                let config = Self::load(&path)?;
                return Ok((path, config));
            }
            searched.push(path);
        }

        for name in CONFIG_NAMES {
            let path = dir.join(name);
            if path.exists() {
                let config = Self::load(&path)?;
                return Ok((path, config));
            }
            searched.push(path);
        }

        Err(ConfigError::NotFound { searched })
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_interval_ms)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_ms.map(Duration::from_millis)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        let valid = Url::parse(&self.base_url).is_ok_and(|url| {
            matches!(url.scheme(), "http" | "https") && url.host_str().is_some_and(|h| !h.is_empty())
        });
        if !valid {
            return Err(ConfigError::InvalidBaseUrl {
                url: self.base_url.clone(),
            });
        }

        if self.refresh_interval_ms == 0 {
            return Err(ConfigError::InvalidInterval);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_full_config() {
        let yaml = r#"
base_url: "http://10.0.0.5:8090"
refresh_interval_ms: 500
request_timeout_ms: 3000
log_file: /tmp/orchctl.log
"#;
        let config = ClientConfig::from_str(yaml).unwrap();
        assert_eq!(config.base_url, "http://10.0.0.5:8090");
        assert_eq!(config.refresh_interval(), Duration::from_millis(500));
        assert_eq!(config.request_timeout(), Some(Duration::from_secs(3)));
        assert_eq!(config.log_file, Some(PathBuf::from("/tmp/orchctl.log")));
    }

    #[test]
    fn test_defaults() {
        let config = ClientConfig::from_str("{}").unwrap();
        assert_eq!(config, ClientConfig::default());
        assert_eq!(config.refresh_interval(), Duration::from_millis(2000));
    }

    #[test]
    fn test_invalid_values() {
        let rejected = [
            "localhost:8090",
            "ftp://host",
            "\"http://bad host\"",
            "\"http://:::\"",
            "\"https://?x\"",
        ];
        for url in rejected {
            let result = ClientConfig::from_str(&format!("base_url: {}", url));
            assert!(
                matches!(result, Err(ConfigError::InvalidBaseUrl { .. })),
                "accepted {}",
                url
            );
        }

        let config =
            ClientConfig::from_str("base_url: https://orchestrator.internal:8443/api").unwrap();
        assert_eq!(config.base_url, "https://orchestrator.internal:8443/api");

        let result = ClientConfig::from_str("refresh_interval_ms: 0");
        assert!(matches!(result, Err(ConfigError::InvalidInterval)));

        let result = ClientConfig::from_str("refresh_interval_ms: soon");
        assert!(matches!(result, Err(ConfigError::Yaml(_))));
    }

    #[test]
    fn test_discover_prefers_explicit_path() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path();
        std::fs::write(dir.join("orchctl.yaml"), "refresh_interval_ms: 750\n").unwrap();
        let explicit = dir.join("custom.yaml");
        std::fs::write(&explicit, "refresh_interval_ms: 100\n").unwrap();

        let (path, config) = ClientConfig::discover_with(Some(explicit.clone()), dir).unwrap();
        assert_eq!(path, explicit);
        assert_eq!(config.refresh_interval_ms, 100);

        let missing = dir.join("missing.yaml");
        let (path, config) = ClientConfig::discover_with(Some(missing), dir).unwrap();
        assert_eq!(path, dir.join("orchctl.yaml"));
        assert_eq!(config.refresh_interval_ms, 750);
    }

    #[test]
    fn test_discover_not_found() {
        let tmp = TempDir::new().unwrap();
        let result = ClientConfig::discover_with(None, tmp.path());
        match result {
            Err(ConfigError::NotFound { searched }) => assert_eq!(searched.len(), 4),
            other => panic!("unexpected: {:?}", other.map(|(p, _)| p)),
        }
    }
}
