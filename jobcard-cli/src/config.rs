//! `jobcard.toml` handling.
//!
//! ```toml
//! [backend]
//! name = "memory"
//! connection = "seeds/options.csv"
//!
//! [logging]
//! level = "info"
//! file = "jobcard.log"
//! ```
//!
//! Every section is optional. Command-line flags are applied on top with
//! [`JobcardConfig::apply_overrides`].

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use jobcard_core::BackendConfig;
use serde::Deserialize;

/// File read when `--config` is not given. Missing is fine.
pub const DEFAULT_CONFIG_FILE: &str = "jobcard.toml";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Bare level or full `EnvFilter` directive.
    pub level: String,
    /// Append-only log file. Logs go to stderr only when unset.
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct JobcardConfig {
    pub backend: BackendConfig,
    pub logging: LoggingConfig,
}

/// Values given on the command line; `None` keeps the file's value.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub backend: Option<String>,
    pub connection: Option<String>,
    pub log_level: Option<String>,
    pub log_file: Option<PathBuf>,
}

impl JobcardConfig {
    pub fn parse(text: &str) -> Result<Self> {
        toml::from_str(text).context("invalid configuration")
    }

    /// Reads `path`. When `path` is `None` the default file is read if it
    /// exists, otherwise built-in defaults are used.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (path, required) = match path {
            Some(path) => (path, true),
            None => (Path::new(DEFAULT_CONFIG_FILE), false),
        };

        if !required && !path.exists() {
            return Ok(Self::default());
        }

        let text = fs::read_to_string(path)
            .with_context(|| format!("cannot read config file '{}'", path.display()))?;
        Self::parse(&text).with_context(|| format!("in '{}'", path.display()))
    }

    pub fn apply_overrides(
        &mut self,
        overrides: Overrides,
    ) {
        if let Some(backend) = overrides.backend {
            self.backend.backend = backend;
        }
        if let Some(connection) = overrides.connection {
            self.backend.connection_string = connection;
        }
        if let Some(level) = overrides.log_level {
            self.logging.level = level;
        }
        if let Some(file) = overrides.log_file {
            self.logging.file = Some(file);
        }
    }
}
