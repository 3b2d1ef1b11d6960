use std::path::{Path, PathBuf};

use orchctl_core::config::{ClientConfig, ConfigError};

/// Command-line values that take precedence over the config file
#[derive(Clone, Debug, Default)]
pub struct Overrides {
    pub config: Option<PathBuf>,
    pub base_url: Option<String>,
    pub interval_ms: Option<u64>,
}

/// The effective configuration and the file it came from, if any
#[derive(Clone, Debug)]
pub struct Resolved {
    pub config: ClientConfig,
    pub source: Option<PathBuf>,
}

/// Build the effective configuration.
///
/// An explicit `--config` must exist. Without one, a discovered file is used
/// if there is any, and built-in defaults otherwise.
pub fn resolve(overrides: &Overrides, cwd: &Path) -> Result<Resolved, ConfigError> {
    let (mut config, source) = match &overrides.config {
        Some(path) => (ClientConfig::load(path)?, Some(path.clone())),
        None => match ClientConfig::discover(cwd) {
            Ok((path, config)) => (config, Some(path)),
            Err(ConfigError::NotFound { .. }) => (ClientConfig::default(), None),
            Err(e) => return Err(e),
        },
    };

    if let Some(url) = &overrides.base_url {
        config.base_url = url.clone();
    }
    if let Some(ms) = overrides.interval_ms {
        config.refresh_interval_ms = ms;
    }

    config.validate()?;
    Ok(Resolved { config, source })
}
