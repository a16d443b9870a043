//! Application configuration module
//!
//! `AppConfig` is assembled either through `AppConfigBuilder` (tests, embedding)
//! or from environment variables with `AppConfig::from_env`.
//!
//! | Variable | Default |
//! |---|---|
//! | `SERVER_PORT` | `3000` |
//! | `PUBLIC_ORIGIN` | `http://localhost:3000` |
//! | `JWT_SECRET` | required |
//! | `DATABASE_URL` | unset: in-memory store |
//! | `SMTP_HOST`, `SMTP_USERNAME`, `SMTP_PASSWORD`, `EMAIL_FROM` | unset: log-only mailer |
//! | `TASK_COUNTER_SCOPE` | `project` |
//! | `CHAT_PAGE_MAX` | `100` |

use std::str::FromStr;

use thiserror::Error;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_ORIGIN: &str = "http://localhost:3000";
pub const DEFAULT_CHAT_PAGE_MAX: usize = 100;

/// Which sequence task keys are minted from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TaskCounterScope {
    /// One counter per project (`tasks:{project_id}`)
    #[default]
    Project,
    /// One counter shared by every project (`tasks`)
    Global,
}

impl FromStr for TaskCounterScope {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "project" => Ok(Self::Project),
            "global" => Ok(Self::Global),
            other => Err(ConfigError::InvalidValue {
                key: "TASK_COUNTER_SCOPE",
                value: other.to_string(),
            }),
        }
    }
}

/// Outbound SMTP settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmtpConfig {
    pub host: String,
    pub username: String,
    pub password: String,
    pub from: String,
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    /// Origin used to build links in outbound email
    pub public_origin: String,
    pub jwt_secret: String,
    pub database_url: Option<String>,
    pub smtp: Option<SmtpConfig>,
    pub task_counter_scope: TaskCounterScope,
    pub chat_page_max: usize,
}

impl AppConfig {
    /// Create a new AppConfigBuilder
    pub fn builder() -> AppConfigBuilder {
        AppConfigBuilder::default()
    }

    /// Read configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let mut builder = AppConfig::builder();

        if let Some(port) = get("SERVER_PORT") {
            let port = port.parse::<u16>().map_err(|_| ConfigError::InvalidValue {
                key: "SERVER_PORT",
                value: port.clone(),
            })?;
            builder = builder.port(port);
        }
        if let Some(origin) = get("PUBLIC_ORIGIN") {
            builder = builder.public_origin(origin);
        }
        let secret = get("JWT_SECRET").ok_or(ConfigError::MissingValue("JWT_SECRET"))?;
        builder = builder.jwt_secret(secret);

        if let Some(url) = get("DATABASE_URL") {
            builder = builder.database_url(url);
        }

        if let Some(host) = get("SMTP_HOST") {
            builder = builder.smtp(SmtpConfig {
                host,
                username: get("SMTP_USERNAME").unwrap_or_default(),
                password: get("SMTP_PASSWORD").unwrap_or_default(),
                from: get("EMAIL_FROM").ok_or(ConfigError::MissingValue("EMAIL_FROM"))?,
            });
        }

        if let Some(scope) = get("TASK_COUNTER_SCOPE") {
            builder = builder.task_counter_scope(scope.parse()?);
        }
        if let Some(max) = get("CHAT_PAGE_MAX") {
            let max = max.parse::<usize>().map_err(|_| ConfigError::InvalidValue {
                key: "CHAT_PAGE_MAX",
                value: max.clone(),
            })?;
            builder = builder.chat_page_max(max);
        }

        builder.build()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt_secret.trim().is_empty() {
            return Err(ConfigError::MissingValue("JWT_SECRET"));
        }
        if !(self.public_origin.starts_with("http://") || self.public_origin.starts_with("https://")) {
            return Err(ConfigError::InvalidUrl(self.public_origin.clone()));
        }
        if self.chat_page_max == 0 {
            return Err(ConfigError::InvalidValue {
                key: "CHAT_PAGE_MAX",
                value: "0".to_string(),
            });
        }
        Ok(())
    }

    /// Counter name used for a project's task keys
    pub fn task_counter_name(&self, project_id: uuid::Uuid) -> String {
        match self.task_counter_scope {
            TaskCounterScope::Project => format!("tasks:{}", project_id),
            TaskCounterScope::Global => "tasks".to_string(),
        }
    }
}

/// Builder for AppConfig
#[derive(Debug, Default)]
pub struct AppConfigBuilder {
    port: Option<u16>,
    public_origin: Option<String>,
    jwt_secret: Option<String>,
    database_url: Option<String>,
    smtp: Option<SmtpConfig>,
    task_counter_scope: TaskCounterScope,
    chat_page_max: Option<usize>,
}

impl AppConfigBuilder {
    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn public_origin(mut self, origin: impl Into<String>) -> Self {
        self.public_origin = Some(origin.into());
        self
    }

    pub fn jwt_secret(mut self, secret: impl Into<String>) -> Self {
        self.jwt_secret = Some(secret.into());
        self
    }

    pub fn database_url(mut self, url: impl Into<String>) -> Self {
        self.database_url = Some(url.into());
        self
    }

    pub fn smtp(mut self, smtp: SmtpConfig) -> Self {
        self.smtp = Some(smtp);
        self
    }

    pub fn task_counter_scope(mut self, scope: TaskCounterScope) -> Self {
        self.task_counter_scope = scope;
        self
    }

    pub fn chat_page_max(mut self, max: usize) -> Self {
        self.chat_page_max = Some(max);
        self
    }

    /// Build and validate the configuration
    pub fn build(self) -> Result<AppConfig, ConfigError> {
        let config = AppConfig {
            port: self.port.unwrap_or(DEFAULT_PORT),
            public_origin: self
                .public_origin
                .unwrap_or_else(|| DEFAULT_ORIGIN.to_string())
                .trim_end_matches('/')
                .to_string(),
            jwt_secret: self.jwt_secret.ok_or(ConfigError::MissingValue("JWT_SECRET"))?,
            database_url: self.database_url,
            smtp: self.smtp,
            task_counter_scope: self.task_counter_scope,
            chat_page_max: self.chat_page_max.unwrap_or(DEFAULT_CHAT_PAGE_MAX),
        };
        config.validate()?;
        Ok(config)
    }
}

/// Configuration errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
    #[error("missing value: {0}")]
    MissingValue(&'static str),
    #[error("invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
}
