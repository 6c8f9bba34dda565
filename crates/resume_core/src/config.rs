//! Runtime configuration.
//!
//! # Invariants
//! - Every field has a default; an empty JSON object is a valid config.
//! - A loaded config has a usable sender, spool directory and template.

use crate::context::RequestContext;
use crate::logging::default_log_level;
use crate::summary::{RenderError, ResumeTemplate};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

const DEFAULT_DATABASE_PATH: &str = "ledger.sqlite3";
const DEFAULT_SENDER: &str = "no-reply@ledger.local";
const DEFAULT_SUBJECT: &str = "Your transactions resume";
const DEFAULT_SPOOL_DIR: &str = "mail-spool";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config `{path}`: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(&'static str),
    #[error("invalid resume template: {0}")]
    Template(#[from] RenderError),
}

/// Outbound mail settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MailConfig {
    pub sender: String,
    pub subject: String,
    /// Directory the spool transport writes `.eml` files into.
    pub spool_dir: PathBuf,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            sender: DEFAULT_SENDER.to_string(),
            subject: DEFAULT_SUBJECT.to_string(),
            spool_dir: PathBuf::from(DEFAULT_SPOOL_DIR),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub database_path: PathBuf,
    pub log_level: String,
    /// Absolute directory for rolling logs; logging stays off when unset.
    pub log_dir: Option<PathBuf>,
    /// Deadline applied to each request.
    pub request_timeout_ms: Option<u64>,
    pub mail: MailConfig,
    pub template: ResumeTemplate,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from(DEFAULT_DATABASE_PATH),
            log_level: default_log_level().to_string(),
            log_dir: None,
            request_timeout_ms: None,
            mail: MailConfig::default(),
            template: ResumeTemplate::default(),
        }
    }
}

impl AppConfig {
    /// Reads and validates a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.mail.sender.trim().is_empty() {
            return Err(ConfigError::Invalid("mail.sender cannot be empty"));
        }
        if self.mail.spool_dir.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("mail.spool_dir cannot be empty"));
        }
        if self.request_timeout_ms == Some(0) {
            return Err(ConfigError::Invalid("request_timeout_ms must be positive"));
        }
        self.template.validate()?;
        Ok(())
    }

    /// Fresh context for one request, carrying the configured deadline.
    pub fn request_context(&self) -> RequestContext {
        match self.request_timeout_ms {
            Some(ms) => RequestContext::with_timeout(Duration::from_millis(ms)),
            None => RequestContext::background(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{AppConfig, ConfigError};

    #[test]
    fn empty_object_yields_defaults() {
        let config = AppConfig::from_json("{}").unwrap();
        assert_eq!(config, AppConfig::default());
        assert!(config.request_context().deadline().is_none());
    }

    #[test]
    fn nested_sections_override_defaults() {
        let config = AppConfig::from_json(
            r#"{
                "request_timeout_ms": 1500,
                "mail": { "sender": "ledger@bank.test" },
                "template": { "body": "Balance {{balance}}" }
            }"#,
        )
        .unwrap();
        assert_eq!(config.mail.sender, "ledger@bank.test");
        assert_eq!(config.mail.subject, "Your transactions resume");
        assert_eq!(config.template.body, "Balance {{balance}}");
        assert!(config.request_context().deadline().is_some());
    }

    #[test]
    fn broken_template_is_rejected_at_load() {
        let err = AppConfig::from_json(r#"{ "template": { "body": "{{nope}}" } }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Template(_)));
    }

    #[test]
    fn unknown_keys_and_empty_sender_are_rejected() {
        assert!(matches!(
            AppConfig::from_json(r#"{ "databse_path": "x" }"#),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            AppConfig::from_json(r#"{ "mail": { "sender": " " } }"#),
            Err(ConfigError::Invalid(_))
        ));
    }
}
