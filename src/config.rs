//! Application configuration loaded from TOML with environment overrides.

use crate::shared::Language;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Environment variable overriding [`AppConfig::env`].
pub const ENV_OVERRIDE: &str = "ATRIUM_ENV";

/// Environment variable overriding [`ObjectStoreConfig::secret`].
pub const STORAGE_SECRET_OVERRIDE: &str = "ATRIUM_STORAGE_SECRET";

/// Deployment environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Local development.
    Dev,
    /// Production.
    #[default]
    Prod,
}

impl Environment {
    /// Returns `true` when users may log in before validating their email.
    #[must_use]
    pub const fn bypasses_email_validation(self) -> bool {
        matches!(self, Self::Dev)
    }
}

impl TryFrom<&str> for Environment {
    type Error = ConfigError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "dev" => Ok(Self::Dev),
            "prod" => Ok(Self::Prod),
            other => Err(ConfigError::Validation(format!(
                "unknown environment '{other}'"
            ))),
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Deployment environment.
    #[serde(default)]
    pub env: Environment,

    /// Language of validation messages.
    #[serde(default)]
    pub language: Language,

    /// Lifetime of memoised presigned URLs in seconds; `0` disables the cache.
    #[serde(default = "default_presigned_url_ttl_secs")]
    pub presigned_url_ttl_secs: u64,

    /// Object store connection.
    #[serde(default)]
    pub object_store: ObjectStoreConfig,

    /// Attachment pipeline sizing.
    #[serde(default)]
    pub attachments: AttachmentConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            env: Environment::default(),
            language: Language::default(),
            presigned_url_ttl_secs: default_presigned_url_ttl_secs(),
            object_store: ObjectStoreConfig::default(),
            attachments: AttachmentConfig::default(),
        }
    }
}

/// S3-compatible object store settings.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ObjectStoreConfig {
    /// Host name of the store.
    pub endpoint: String,
    /// Access key identifier.
    pub access_key_id: String,
    /// Secret key; also used to sign local download URLs.
    pub secret: String,
    /// Bucket receiving every object.
    pub bucket: String,
    /// Bucket region.
    pub location: String,
    /// Whether the endpoint is reached over TLS.
    pub ssl: bool,
    /// Public base URL for presigned links.
    pub public_url: String,
    /// Backend base URL for non-previewable downloads.
    pub backend_url: String,
}

/// Attachment pipeline settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentConfig {
    /// Seconds a caller waits for every rendition; `0` times out at once.
    #[serde(default = "default_upload_timeout_secs")]
    pub upload_timeout_secs: u64,
    /// Number of upload workers.
    #[serde(default = "default_parallel_upload")]
    pub parallel_upload: usize,
    /// Number of resize workers.
    #[serde(default = "default_parallel_resize")]
    pub parallel_resize: usize,
    /// Capacity of each work queue.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

impl AttachmentConfig {
    /// Returns the upload deadline.
    #[must_use]
    pub const fn upload_timeout(&self) -> Duration {
        Duration::from_secs(self.upload_timeout_secs)
    }
}

impl Default for AttachmentConfig {
    fn default() -> Self {
        Self {
            upload_timeout_secs: default_upload_timeout_secs(),
            parallel_upload: default_parallel_upload(),
            parallel_resize: default_parallel_resize(),
            queue_capacity: default_queue_capacity(),
        }
    }
}

const fn default_presigned_url_ttl_secs() -> u64 {
    900
}

const fn default_upload_timeout_secs() -> u64 {
    90
}

const fn default_parallel_upload() -> usize {
    12
}

const fn default_parallel_resize() -> usize {
    4
}

const fn default_queue_capacity() -> usize {
    1000
}

impl AppConfig {
    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parses configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid or a worker pool is empty.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Applies `ATRIUM_ENV` and `ATRIUM_STORAGE_SECRET` when set.
    ///
    /// # Errors
    ///
    /// Returns an error if `ATRIUM_ENV` names an unknown environment.
    pub fn with_env_overrides(self) -> Result<Self, ConfigError> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Applies overrides from an arbitrary lookup.
    ///
    /// # Errors
    ///
    /// Returns an error if the environment override is unknown.
    pub fn with_overrides(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        if let Some(env) = lookup(ENV_OVERRIDE) {
            self.env = Environment::try_from(env.as_str())?;
        }
        if let Some(secret) = lookup(STORAGE_SECRET_OVERRIDE) {
            self.object_store.secret = secret;
        }
        Ok(self)
    }

    /// Serializes configuration to TOML.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.attachments.parallel_upload == 0 || self.attachments.parallel_resize == 0 {
            return Err(ConfigError::Validation(
                "attachment worker pools need at least one worker".to_owned(),
            ));
        }
        if self.attachments.queue_capacity == 0 {
            return Err(ConfigError::Validation(
                "attachment queue capacity must be positive".to_owned(),
            ));
        }
        Ok(())
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O error reading the configuration file.
    #[error("failed to read configuration file: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing error.
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// TOML serialization error.
    #[error("failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// Semantic validation error.
    #[error("configuration validation failed: {0}")]
    Validation(String),
}
