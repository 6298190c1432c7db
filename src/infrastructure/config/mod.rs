use std::path::{Path, PathBuf};
use std::time::Duration;

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::domain::error::{AppError, Result};

pub const DEFAULT_CONFIG_FILE: &str = "participant_import.toml";
pub const CONFIG_PATH_ENV: &str = "PARTICIPANT_IMPORT_CONFIG";
pub const ENV_PREFIX: &str = "PARTICIPANT_IMPORT_";

pub const PROCESS_PATH: &str = "/procesar-excel-participantes/";
pub const SAVE_PATH: &str = "/guardar-excel-participantes/";

/// Everything the import wizard needs from the hosting page.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ImportConfig {
    #[validate(url)]
    pub process_url: String,
    #[validate(url)]
    pub save_url: String,
    /// Sent as `X-CSRFToken` on every collaborator request.
    #[validate(length(min = 1))]
    pub csrf_token: String,
    #[validate(range(min = 1, max = 300))]
    pub request_timeout_secs: u64,
    /// How many error messages are listed before the "ver todos" affordance.
    #[validate(range(min = 1))]
    pub error_preview_limit: usize,
}

impl Default for ImportConfig {
    fn default() -> Self {
        let base = format!("http://127.0.0.1:{}", MockServerConfig::default().port);
        Self {
            process_url: format!("{}{}", base, PROCESS_PATH),
            save_url: format!("{}{}", base, SAVE_PATH),
            csrf_token: String::new(),
            request_timeout_secs: 30,
            error_preview_limit: 5,
        }
    }
}

impl ImportConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Checks the section before it is handed to a collaborator.
    pub fn validated(&self) -> Result<&Self> {
        self.validate()
            .map_err(|e| AppError::ConfigError(format!("Invalid import configuration: {}", e)))?;
        Ok(self)
    }
}

/// Local stand-in for the process/save endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct MockServerConfig {
    #[validate(length(min = 1))]
    pub host: String,
    pub port: u16,
    /// Expected `X-CSRFToken`; a random one is generated when empty.
    pub csrf_token: String,
}

impl Default for MockServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 4010,
            csrf_token: String::new(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub import: ImportConfig,
    #[serde(default)]
    pub server: MockServerConfig,
}

pub struct ConfigService;

impl ConfigService {
    /// Loads `.env`, then layers defaults, the TOML file and `PARTICIPANT_IMPORT_*`
    /// variables (`__` separates sections, e.g. `PARTICIPANT_IMPORT_IMPORT__CSRF_TOKEN`).
    pub fn load() -> Result<AppConfig> {
        let _ = dotenvy::dotenv();
        let path = std::env::var(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_FILE));
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<AppConfig> {
        let config: AppConfig = Figment::from(Serialized::defaults(AppConfig::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .map_err(|e| AppError::ConfigError(format!("Failed to load configuration: {}", e)))?;

        config
            .server
            .validate()
            .map_err(|e| AppError::ConfigError(format!("Invalid server configuration: {}", e)))?;

        Ok(config)
    }
}
