//! Layered configuration.
//!
//! Values are resolved lowest to highest: built-in defaults, an optional
//! TOML file, `PAGESPEED_*` environment variables, then command-line flags
//! (applied by the caller through [`AppConfig::apply_overrides`]).

use config::{Config, Environment, File, FileFormat};
use pagespeed_report_adapters::runner::{DEFAULT_BATCH_DELAY, DEFAULT_BATCH_SIZE};
use pagespeed_report_adapters::upstream::{crux, pagespeed};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Config file looked up in the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "pagespeed-report.toml";

/// Prefix of environment overrides (`PAGESPEED_API_KEY`, ...).
pub const ENV_PREFIX: &str = "PAGESPEED";

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A source could not be read or deserialized
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    /// A value is out of range
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Result type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Resolved settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Google API key. Optional for PageSpeed, required for CrUX History.
    #[serde(default)]
    pub api_key: Option<String>,
    /// URLs fetched concurrently per batch.
    pub batch_size: usize,
    /// Pause between batches, milliseconds.
    pub batch_delay_ms: u64,
    /// Per-request timeout, seconds.
    pub request_timeout_secs: u64,
    /// PageSpeed Insights endpoint.
    pub pagespeed_endpoint: String,
    /// CrUX History endpoint.
    pub crux_endpoint: String,
    /// Directory reports are written to.
    pub output_dir: PathBuf,
}

/// Flag values that take precedence over every other source.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    /// `--batch-size`
    pub batch_size: Option<usize>,
    /// `--delay-ms`
    pub batch_delay_ms: Option<u64>,
    /// `--output`
    pub output_dir: Option<PathBuf>,
}

impl AppConfig {
    /// Load from defaults, the config file and the process environment.
    ///
    /// An explicit `path` must exist; the default file is optional.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_from(path, Environment::with_prefix(ENV_PREFIX))
    }

    fn load_from(path: Option<&Path>, env: Environment) -> Result<Self> {
        let (file, required) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
        };

        let config = Config::builder()
            .set_default("batch_size", DEFAULT_BATCH_SIZE as i64)?
            .set_default("batch_delay_ms", DEFAULT_BATCH_DELAY.as_millis() as i64)?
            .set_default(
                "request_timeout_secs",
                pagespeed::DEFAULT_TIMEOUT.as_secs() as i64,
            )?
            .set_default("pagespeed_endpoint", pagespeed::DEFAULT_ENDPOINT)?
            .set_default("crux_endpoint", crux::DEFAULT_ENDPOINT)?
            .set_default("output_dir", pagespeed_report_output::io::OUTPUT_DIR)?
            .add_source(
                File::from(file.as_path())
                    .format(FileFormat::Toml)
                    .required(required),
            )
            .add_source(env.try_parsing(true))
            .build()?;

        let resolved: AppConfig = config.try_deserialize()?;
        resolved.validate()?;
        Ok(resolved)
    }

    /// Apply command-line flags and re-validate.
    pub fn apply_overrides(mut self, overrides: Overrides) -> Result<Self> {
        if let Some(n) = overrides.batch_size {
            self.batch_size = n;
        }
        if let Some(ms) = overrides.batch_delay_ms {
            self.batch_delay_ms = ms;
        }
        if let Some(dir) = overrides.output_dir {
            self.output_dir = dir;
        }
        self.validate()?;
        Ok(self)
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(ConfigError::Invalid("batch_size must be at least 1".into()));
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "request_timeout_secs must be at least 1".into(),
            ));
        }
        for (name, endpoint) in [
            ("pagespeed_endpoint", &self.pagespeed_endpoint),
            ("crux_endpoint", &self.crux_endpoint),
        ] {
            if !endpoint.starts_with("http") {
                return Err(ConfigError::Invalid(format!(
                    "{} must be an http(s) URL, got '{}'",
                    name, endpoint
                )));
            }
        }
        Ok(())
    }

    /// API key with blank values treated as absent.
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref().map(str::trim).filter(|k| !k.is_empty())
    }

    /// Per-request timeout.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Pause between batches.
    pub fn batch_delay(&self) -> Duration {
        Duration::from_millis(self.batch_delay_ms)
    }

    /// Settings for the PageSpeed adapter.
    pub fn pagespeed(&self) -> pagespeed::PageSpeedConfig {
        pagespeed::PageSpeedConfig {
            endpoint: self.pagespeed_endpoint.clone(),
            api_key: self.api_key().map(str::to_string),
            timeout: self.request_timeout(),
        }
    }

    /// Settings for the CrUX adapter.
    pub fn crux(&self) -> crux::CruxConfig {
        crux::CruxConfig {
            endpoint: self.crux_endpoint.clone(),
            api_key: self.api_key().unwrap_or_default().to_string(),
            timeout: self.request_timeout(),
        }
    }
}

/// Hide all but the first four characters of a key.
pub fn mask_key(key: &str) -> String {
    let visible: String = key.chars().take(4).collect();
    if key.chars().count() <= 4 {
        "****".to_string()
    } else {
        format!("{}****", visible)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(vars: &[(&str, &str)]) -> Environment {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Environment::with_prefix(ENV_PREFIX).source(Some(map))
    }

    fn missing_file() -> PathBuf {
        PathBuf::from("/nonexistent/pagespeed-report.toml")
    }

    #[test]
    fn test_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.toml");
        std::fs::write(&path, "").unwrap();

        let config = AppConfig::load_from(Some(&path), env(&[])).unwrap();
        assert_eq!(config.batch_size, 5);
        assert_eq!(config.batch_delay_ms, 1500);
        assert_eq!(config.request_timeout_secs, 60);
        assert_eq!(config.output_dir, PathBuf::from("pagespeed-output"));
        assert!(config.api_key().is_none());
    }

    #[test]
    fn test_file_then_env_precedence() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pagespeed-report.toml");
        std::fs::write(
            &path,
            "batch_size = 3\nbatch_delay_ms = 200\napi_key = \"from-file\"\n",
        )
        .unwrap();

        let config = AppConfig::load_from(
            Some(&path),
            env(&[("PAGESPEED_BATCH_SIZE", "8"), ("PAGESPEED_API_KEY", "from-env")]),
        )
        .unwrap();

        assert_eq!(config.batch_size, 8);
        assert_eq!(config.batch_delay_ms, 200);
        assert_eq!(config.api_key(), Some("from-env"));
    }

    #[test]
    fn test_explicit_file_must_exist() {
        let result = AppConfig::load_from(Some(&missing_file()), env(&[]));
        assert!(matches!(result, Err(ConfigError::Load(_))));
    }

    #[test]
    fn test_validation() {
        let result = AppConfig::load_from(None, env(&[("PAGESPEED_BATCH_SIZE", "0")]));
        assert!(matches!(result, Err(ConfigError::Invalid(_))));

        let result = AppConfig::load_from(
            None,
            env(&[("PAGESPEED_PAGESPEED_ENDPOINT", "ftp://example.com")]),
        );
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_overrides_win() {
        let config = AppConfig::load_from(None, env(&[])).unwrap();
        let config = config
            .apply_overrides(Overrides {
                batch_size: Some(2),
                batch_delay_ms: Some(0),
                output_dir: Some(PathBuf::from("out")),
            })
            .unwrap();

        assert_eq!(config.batch_size, 2);
        assert_eq!(config.batch_delay(), Duration::ZERO);
        assert_eq!(config.output_dir, PathBuf::from("out"));

        let invalid = config.apply_overrides(Overrides {
            batch_size: Some(0),
            ..Overrides::default()
        });
        assert!(invalid.is_err());
    }

    #[test]
    fn test_blank_key_is_absent() {
        let config = AppConfig::load_from(None, env(&[("PAGESPEED_API_KEY", "  ")])).unwrap();
        assert!(config.api_key().is_none());
        assert!(config.pagespeed().api_key.is_none());
    }

    #[test]
    fn test_mask_key() {
        assert_eq!(mask_key("AIzaSyExample"), "AIza****");
        assert_eq!(mask_key("abc"), "****");
    }
}
