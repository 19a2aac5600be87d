//! # configs
//!
//! Runtime settings of the kanban server.
//!
//! Sources, later ones winning: built-in defaults, an optional
//! `config/kanban.{toml,yaml,json}` file, then `KANBAN__`-prefixed environment
//! variables with `__` between sections (`KANBAN__DATABASE__URL`). A `.env`
//! file is read into the environment first.

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, File};
use secrecy::SecretString;
use serde::{Deserialize, Deserializer};
use thiserror::Error;

const ENV_PREFIX: &str = "KANBAN";
const ENV_SEPARATOR: &str = "__";
const CONFIG_FILE: &str = "config/kanban";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required setting `{0}`")]
    Missing(&'static str),

    #[error("invalid configuration: {0}")]
    Load(#[from] config::ConfigError),
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub auth: AuthSettings,
    pub log: LogSettings,
    pub i18n: I18nSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub environment: String,
}

impl ServerSettings {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Deserialize)]
pub struct DatabaseSettings {
    #[serde(deserialize_with = "secret")]
    pub url: SecretString,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_secs: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthMode {
    Gateway,
    Local,
}

#[derive(Debug, Deserialize)]
pub struct AuthSettings {
    pub mode: AuthMode,
    #[serde(default, deserialize_with = "optional_secret")]
    pub token_secret: Option<SecretString>,
    pub token_ttl_hours: i64,
    /// Accept `X-User-Id` as the caller's identity. Turn off when clients can
    /// reach the service without going through the gateway.
    pub trust_user_header: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogSettings {
    pub level: String,
    pub json: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct I18nSettings {
    pub default_lang: String,
}

impl Settings {
    /// Reads `.env`, the optional config file and the environment.
    pub fn load() -> Result<Self, ConfigError> {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!(path = %path.display(), "loaded .env");
        }
        let builder = defaults()?
            .add_source(File::with_name(CONFIG_FILE).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator(ENV_SEPARATOR)
                    .try_parsing(true),
            );
        Self::build(builder)
    }

    fn build(builder: ConfigBuilder<DefaultState>) -> Result<Self, ConfigError> {
        let config = builder.build()?;
        if config.get_string("database.url").is_err() {
            return Err(ConfigError::Missing("database.url"));
        }
        let settings: Settings = config.try_deserialize()?;
        if settings.auth.mode == AuthMode::Gateway && settings.auth.token_secret.is_none() {
            return Err(ConfigError::Missing("auth.token_secret"));
        }
        Ok(settings)
    }
}

fn defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Ok(Config::builder()
        .set_default("server.host", "0.0.0.0")?
        .set_default("server.port", 8080)?
        .set_default("server.environment", "local")?
        .set_default("database.max_connections", 10)?
        .set_default("database.min_connections", 1)?
        .set_default("database.acquire_timeout_secs", 5)?
        .set_default("auth.mode", "gateway")?
        .set_default("auth.token_ttl_hours", 48)?
        .set_default("auth.trust_user_header", true)?
        .set_default("log.level", "info")?
        .set_default("log.json", true)?
        .set_default("i18n.default_lang", "fr")?)
}

fn secret<'de, D: Deserializer<'de>>(deserializer: D) -> Result<SecretString, D::Error> {
    String::deserialize(deserializer).map(SecretString::from)
}

fn optional_secret<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<SecretString>, D::Error> {
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.filter(|s| !s.is_empty()).map(SecretString::from))
}
