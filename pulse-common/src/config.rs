//! Configuration loading for the SessionPulse service
//!
//! Resolution follows a three-tier priority order for every key:
//! 1. Environment variable (highest priority)
//! 2. TOML config file
//! 3. Compiled default (fallback)
//!
//! The AI completion API key is held server-side only; it never appears in
//! any HTTP response.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Default bind address for the HTTP server
pub const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1:5760";

/// Default shared admin password (override in production deployments)
pub const DEFAULT_ADMIN_PASSWORD: &str = "Admin123";

/// Default model name sent to the completion endpoint
pub const DEFAULT_AI_MODEL: &str = "gpt-4o-mini";

/// AI proxy settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AiConfig {
    /// Completion endpoint URL (e.g. https://api.openai.com/v1/chat/completions)
    pub endpoint: Option<String>,
    /// API key for the completion endpoint (server-side only)
    pub api_key: Option<String>,
    /// Model identifier passed through in the request body
    pub model: Option<String>,
}

impl AiConfig {
    pub fn model_name(&self) -> &str {
        self.model.as_deref().unwrap_or(DEFAULT_AI_MODEL)
    }
}

/// Service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,
    #[serde(default = "default_admin_password")]
    pub admin_password: String,
    #[serde(default)]
    pub ai: AiConfig,
}

fn default_bind_address() -> String {
    DEFAULT_BIND_ADDRESS.to_string()
}

fn default_database_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("sessionpulse").join("pulse.db"))
        .unwrap_or_else(|| PathBuf::from("./pulse.db"))
}

fn default_admin_password() -> String {
    DEFAULT_ADMIN_PASSWORD.to_string()
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            database_path: default_database_path(),
            admin_password: default_admin_password(),
            ai: AiConfig::default(),
        }
    }
}

impl ServiceConfig {
    /// Load configuration with tiered resolution
    ///
    /// `cli_path` (from the command line) wins over the `PULSE_CONFIG`
    /// environment variable, which wins over the platform config directory.
    /// A missing file is not an error; defaults apply.
    pub fn load(cli_path: Option<&Path>) -> Result<Self> {
        let mut config = match resolve_config_path(cli_path) {
            Some(path) if path.exists() => {
                let content = std::fs::read_to_string(&path)
                    .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
                let parsed: ServiceConfig = toml::from_str(&content)
                    .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))?;
                info!("Loaded configuration from {}", path.display());
                parsed
            }
            Some(path) => {
                // Explicitly named files must exist; the default location may not
                if cli_path.is_some() || std::env::var("PULSE_CONFIG").is_ok() {
                    return Err(Error::Config(format!(
                        "Config file not found: {}",
                        path.display()
                    )));
                }
                ServiceConfig::default()
            }
            None => ServiceConfig::default(),
        };

        config.apply_env_overrides();

        if config.admin_password == DEFAULT_ADMIN_PASSWORD {
            warn!("Admin password is the compiled default; set PULSE_ADMIN_PASSWORD to override");
        }

        Ok(config)
    }

    /// Apply environment-variable overrides (highest priority tier)
    pub fn apply_env_overrides(&mut self) {
        if let Ok(addr) = std::env::var("PULSE_BIND_ADDRESS") {
            self.bind_address = addr;
        }
        if let Ok(path) = std::env::var("PULSE_DATABASE_PATH") {
            self.database_path = PathBuf::from(path);
        }
        if let Ok(password) = std::env::var("PULSE_ADMIN_PASSWORD") {
            self.admin_password = password;
        }
        if let Ok(endpoint) = std::env::var("PULSE_AI_ENDPOINT") {
            self.ai.endpoint = Some(endpoint);
        }
        if let Ok(key) = std::env::var("PULSE_AI_API_KEY") {
            if self.ai.api_key.is_some() {
                warn!("AI API key found in both environment and TOML; using environment");
            }
            self.ai.api_key = Some(key);
        }
        if let Ok(model) = std::env::var("PULSE_AI_MODEL") {
            self.ai.model = Some(model);
        }
    }
}

fn resolve_config_path(cli_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = cli_path {
        return Some(path.to_path_buf());
    }
    if let Ok(path) = std::env::var("PULSE_CONFIG") {
        return Some(PathBuf::from(path));
    }
    dirs::config_dir().map(|d| d.join("sessionpulse").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;

    fn clear_env() {
        for key in [
            "PULSE_CONFIG",
            "PULSE_BIND_ADDRESS",
            "PULSE_DATABASE_PATH",
            "PULSE_ADMIN_PASSWORD",
            "PULSE_AI_ENDPOINT",
            "PULSE_AI_API_KEY",
            "PULSE_AI_MODEL",
        ] {
            std::env::remove_var(key);
        }
    }

    #[test]
    #[serial]
    fn defaults_apply_without_file_or_env() {
        clear_env();
        let config = ServiceConfig::load(None).unwrap();
        assert_eq!(config.bind_address, DEFAULT_BIND_ADDRESS);
        assert_eq!(config.admin_password, DEFAULT_ADMIN_PASSWORD);
        assert!(config.ai.endpoint.is_none());
        assert_eq!(config.ai.model_name(), DEFAULT_AI_MODEL);
    }

    #[test]
    #[serial]
    fn toml_file_is_loaded() {
        clear_env();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
bind_address = "0.0.0.0:9000"
admin_password = "s3cret"

[ai]
endpoint = "https://example.test/v1/chat/completions"
api_key = "abc"
"#
        )
        .unwrap();

        let config = ServiceConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.bind_address, "0.0.0.0:9000");
        assert_eq!(config.admin_password, "s3cret");
        assert_eq!(
            config.ai.endpoint.as_deref(),
            Some("https://example.test/v1/chat/completions")
        );
    }

    #[test]
    #[serial]
    fn env_overrides_toml() {
        clear_env();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "bind_address = \"0.0.0.0:9000\"").unwrap();

        std::env::set_var("PULSE_BIND_ADDRESS", "127.0.0.1:7000");
        std::env::set_var("PULSE_AI_API_KEY", "env-key");

        let config = ServiceConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.bind_address, "127.0.0.1:7000");
        assert_eq!(config.ai.api_key.as_deref(), Some("env-key"));

        clear_env();
    }

    #[test]
    #[serial]
    fn missing_explicit_file_is_an_error() {
        clear_env();
        let err = ServiceConfig::load(Some(Path::new("/nonexistent/pulse.toml"))).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
