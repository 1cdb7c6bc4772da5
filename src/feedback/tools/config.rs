use std::fmt;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::feedback::tools::error::{Result, ToolError};
use crate::feedback::tools::transport::Connection;
use crate::feedback::tools::transport::soap::DEFAULT_SERVICE_NAMESPACE;

pub const ENV_ENDPOINT: &str = "FEEDBACK_ENDPOINT";
pub const ENV_USERNAME: &str = "FEEDBACK_USERNAME";
pub const ENV_PASSWORD: &str = "FEEDBACK_PASSWORD";
pub const ENV_NAMESPACE: &str = "FEEDBACK_NAMESPACE";
pub const ENV_TIMEOUT_SECS: &str = "FEEDBACK_TIMEOUT_SECS";
pub const ENV_SESSION: &str = "FEEDBACK_SESSION";
pub const ENV_READ_RETRIES: &str = "FEEDBACK_READ_RETRIES";

const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// When the client logs in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPolicy {
    /// Log in before every remote call.
    #[default]
    PerCall,
    /// Log in before the first remote call only.
    Once,
}

impl SessionPolicy {
    fn parse(value: &str) -> Result<Self> {
        match value.trim().to_lowercase().as_str() {
            "per_call" | "per-call" => Ok(SessionPolicy::PerCall),
            "once" => Ok(SessionPolicy::Once),
            other => Err(ToolError::InvalidConfig(format!(
                "unknown session policy '{other}', expected per_call or once"
            ))),
        }
    }
}

/// Connection settings for the survey service.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct ClientConfig {
    /// Service endpoint URL.
    pub endpoint: String,
    pub username: String,
    pub password: String,
    /// Namespace of the service operations.
    #[serde(default = "default_namespace")]
    pub namespace: String,
    /// Timeout applied to every HTTP exchange.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub session: SessionPolicy,
    /// Extra attempts for read-only operations after a fault.
    #[serde(default)]
    pub read_retries: u32,
}

fn default_namespace() -> String {
    DEFAULT_SERVICE_NAMESPACE.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("endpoint", &self.endpoint)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("namespace", &self.namespace)
            .field("timeout_secs", &self.timeout_secs)
            .field("session", &self.session)
            .field("read_retries", &self.read_retries)
            .finish()
    }
}

impl ClientConfig {
    pub fn new(
        endpoint: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            username: username.into(),
            password: password.into(),
            namespace: default_namespace(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            session: SessionPolicy::default(),
            read_retries: 0,
        }
    }

    /// Loads and validates a JSON configuration file.
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(ToolError::MissingInput(path.to_path_buf()));
        }
        let source = std::fs::read_to_string(path)?;
        let config: ClientConfig = serde_json::from_str(&source)?;
        config.validate()?;
        Ok(config)
    }

    /// Create configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key).ok_or_else(|| ToolError::InvalidConfig(format!("{key} is not set")))
        };

        let mut config = ClientConfig::new(
            required(ENV_ENDPOINT)?,
            required(ENV_USERNAME)?,
            required(ENV_PASSWORD)?,
        );
        if let Some(namespace) = lookup(ENV_NAMESPACE) {
            config.namespace = namespace;
        }
        if let Some(timeout) = lookup(ENV_TIMEOUT_SECS) {
            config.timeout_secs = timeout.trim().parse().map_err(|_| {
                ToolError::InvalidConfig(format!("{ENV_TIMEOUT_SECS} must be a number of seconds"))
            })?;
        }
        if let Some(session) = lookup(ENV_SESSION) {
            config.session = SessionPolicy::parse(&session)?;
        }
        if let Some(retries) = lookup(ENV_READ_RETRIES) {
            config.read_retries = retries.trim().parse().map_err(|_| {
                ToolError::InvalidConfig(format!("{ENV_READ_RETRIES} must be a whole number"))
            })?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.endpoint.trim().is_empty() {
            return Err(ToolError::InvalidConfig("endpoint cannot be empty".into()));
        }
        if !(self.endpoint.starts_with("http://") || self.endpoint.starts_with("https://")) {
            return Err(ToolError::InvalidConfig(format!(
                "endpoint '{}' must be an http or https URL",
                self.endpoint
            )));
        }
        if self.username.trim().is_empty() {
            return Err(ToolError::InvalidConfig("username cannot be empty".into()));
        }
        if self.password.is_empty() {
            return Err(ToolError::InvalidConfig("password cannot be empty".into()));
        }
        if self.timeout_secs == 0 {
            return Err(ToolError::InvalidConfig(
                "timeout must be greater than 0 seconds".into(),
            ));
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn connection(&self) -> Connection {
        Connection {
            endpoint: self.endpoint.clone(),
            username: self.username.clone(),
            password: self.password.clone(),
            timeout: self.timeout(),
        }
    }
}
