use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context};
use serde::Deserialize;

const DEFAULT_ENV: &str = "local";
const ENV_VAR_NAME: &str = "BOOKSHELF_ENV";
const CONFIG_DIR_ENV: &str = "BOOKSHELF_CONFIG_DIR";
const ENV_PREFIX: &str = "BOOKSHELF";

/// Plain variables honoured for compatibility with common hosting platforms.
const PORT_ENV: &str = "PORT";
const DATABASE_URL_ENV: &str = "DATABASE_URL";

/// Deployment environment the application is running in.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Local,
    Staging,
    Production,
}

impl std::str::FromStr for Environment {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "local" => Ok(Environment::Local),
            "staging" => Ok(Environment::Staging),
            "production" => Ok(Environment::Production),
            other => Err(anyhow!(
                "unsupported environment '{}'; expected local/staging/production",
                other
            )),
        }
    }
}

/// Top-level configuration structure loaded from layered sources.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub environment: Environment,
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub database: DatabaseSettings,
    #[serde(default)]
    pub telemetry: TelemetrySettings,
}

/// Values read from the plain (unprefixed) process environment.
#[derive(Debug, Clone, Default)]
pub struct EnvOverrides {
    pub port: Option<String>,
    pub database_url: Option<String>,
}

impl EnvOverrides {
    fn from_process_env() -> Self {
        Self {
            port: std::env::var(PORT_ENV).ok(),
            database_url: std::env::var(DATABASE_URL_ENV).ok(),
        }
    }

    /// Blank values count as unset, so `PORT=` keeps the default port.
    fn non_blank(self) -> Self {
        let keep = |value: Option<String>| value.filter(|v| !v.trim().is_empty());
        Self {
            port: keep(self.port),
            database_url: keep(self.database_url),
        }
    }
}

impl Settings {
    /// Load configuration by layering `.env`, base file, environment overlay,
    /// `BOOKSHELF_*` variables and finally `PORT` / `DATABASE_URL`.
    pub fn load() -> anyhow::Result<Self> {
        // Allow missing `.env` files without failing.
        let _ = dotenvy::dotenv();

        let environment = std::env::var(ENV_VAR_NAME).unwrap_or_else(|_| DEFAULT_ENV.to_string());
        let config_dir = std::env::var(CONFIG_DIR_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("config"));

        Self::load_from(&config_dir, &environment, EnvOverrides::from_process_env())
    }

    /// Load configuration from an explicit config directory and environment name.
    pub fn load_from(
        config_dir: &Path,
        environment: &str,
        overrides: EnvOverrides,
    ) -> anyhow::Result<Self> {
        let parsed_environment: Environment = environment.parse()?;
        let overrides = overrides.non_blank();

        let base_path = config_dir.join("base.toml");
        let environment_path = config_dir.join(format!("{}.toml", environment));

        let builder = config::Config::builder()
            .add_source(config::File::from(base_path).required(false))
            .add_source(config::File::from(environment_path).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__"),
            )
            .set_override_option("server.port", overrides.port)
            .with_context(|| format!("invalid {} override", PORT_ENV))?
            .set_override_option("database.url", overrides.database_url)
            .with_context(|| format!("invalid {} override", DATABASE_URL_ENV))?;

        let cfg = builder
            .build()
            .with_context(|| "failed to build configuration")?;

        let mut settings: Settings = cfg
            .try_deserialize()
            .with_context(|| "failed to deserialize configuration")?;

        settings.environment = parsed_environment;

        Ok(settings)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "ServerSettings::default_host")]
    pub host: String,
    #[serde(default = "ServerSettings::default_port")]
    pub port: u16,
    /// Attach CORS headers to every response and answer `OPTIONS` with 204.
    #[serde(default = "ServerSettings::default_cors_enabled")]
    pub cors_enabled: bool,
}

impl ServerSettings {
    fn default_host() -> String {
        "0.0.0.0".to_string()
    }

    fn default_port() -> u16 {
        3000
    }

    fn default_cors_enabled() -> bool {
        true
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: Self::default_host(),
            port: Self::default_port(),
            cors_enabled: Self::default_cors_enabled(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    /// PostgreSQL connection string; required before any store access.
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "DatabaseSettings::default_max_connections")]
    pub max_connections: u32,
}

impl DatabaseSettings {
    fn default_max_connections() -> u32 {
        5
    }

    /// The connection string, or an error naming the variable to set.
    pub fn require_url(&self) -> anyhow::Result<&str> {
        self.url
            .as_deref()
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| anyhow!("{} is not set; the book store is unreachable", DATABASE_URL_ENV))
    }
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: Self::default_max_connections(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TelemetrySettings {
    #[serde(default)]
    pub log_format: LogFormat,
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    #[serde(default = "TelemetrySettings::default_filter")]
    pub filter: String,
}

impl TelemetrySettings {
    fn default_filter() -> String {
        "info".to_string()
    }
}

impl Default for TelemetrySettings {
    fn default() -> Self {
        Self {
            log_format: LogFormat::Pretty,
            filter: Self::default_filter(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_config_dir() -> PathBuf {
        PathBuf::from("does-not-exist")
    }

    #[test]
    fn default_environment_is_local() {
        let settings = Settings::default();
        assert_eq!(settings.environment, Environment::Local);
    }

    #[test]
    fn default_port_is_3000() {
        let settings = Settings::default();
        assert_eq!(settings.server.port, 3000);
        assert!(settings.server.cors_enabled);
    }

    #[test]
    fn database_url_is_required() {
        let settings = Settings::default();
        assert!(settings.database.require_url().is_err());
    }

    #[test]
    fn plain_overrides_win() {
        let settings = Settings::load_from(
            &empty_config_dir(),
            "staging",
            EnvOverrides {
                port: Some("4123".to_string()),
                database_url: Some("postgres://localhost/books".to_string()),
            },
        )
        .unwrap();

        assert_eq!(settings.environment, Environment::Staging);
        assert_eq!(settings.server.port, 4123);
        assert_eq!(
            settings.database.require_url().unwrap(),
            "postgres://localhost/books"
        );
    }

    #[test]
    fn blank_overrides_fall_back_to_defaults() {
        let settings = Settings::load_from(
            &empty_config_dir(),
            "local",
            EnvOverrides {
                port: Some(String::new()),
                database_url: Some("  ".to_string()),
            },
        )
        .unwrap();

        assert_eq!(settings.server.port, 3000);
        assert!(settings.database.url.is_none());
    }

    #[test]
    fn unknown_environment_is_rejected() {
        let err = Settings::load_from(&empty_config_dir(), "qa", EnvOverrides::default())
            .unwrap_err();
        assert!(err.to_string().contains("unsupported environment 'qa'"));
    }

    #[test]
    fn non_numeric_port_is_rejected() {
        let result = Settings::load_from(
            &empty_config_dir(),
            "local",
            EnvOverrides {
                port: Some("http".to_string()),
                database_url: None,
            },
        );
        assert!(result.is_err());
    }
}
