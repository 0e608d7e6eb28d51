//! Server configuration from a key/value properties file.
//!
//! The configuration format is the `key=value` properties contract shared
//! with compatible deployments: one pair per line, `#` and `!` start
//! comments, whitespace around keys and values is ignored. Accessors fail
//! fast with a clear initialization error when a required key is missing or
//! blank, so a misconfigured store aborts startup instead of limping along.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// TCP port the server binds.
pub const SERVER_PORT: &str = "server.port";
/// PKCS#12 keystore holding the server TLS identity.
pub const KEYSTORE_PATH: &str = "ssl.keystore.path";
/// Password protecting the PKCS#12 keystore.
pub const KEYSTORE_PASSWORD: &str = "ssl.keystore.password";
/// Patient CSV file path.
pub const PATIENTS_CSV_PATH: &str = "storage.csv.patients.path";
/// Disease FASTA directory.
pub const DISEASES_DIRECTORY: &str = "storage.diseases.directory";
/// Diagnostics root directory (per-patient trees).
pub const DIAGNOSTICS_DIRECTORY: &str = "storage.diagnostics.directory";
/// High-infectivity report directory.
pub const REPORTS_DIRECTORY: &str = "storage.reports.high_infectiousness.directory";

/// Errors raised while loading or reading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The properties file could not be read.
    #[error("failed to read configuration file {}: {source}", path.display())]
    Io {
        /// Path that failed to load.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A required key is absent or blank.
    #[error("configuration key '{key}' is missing or blank")]
    MissingKey {
        /// The offending key.
        key: String,
    },

    /// A value could not be parsed into its expected type.
    #[error("configuration key '{key}' has invalid value '{value}': {reason}")]
    InvalidValue {
        /// The offending key.
        key: String,
        /// The raw value found in the file.
        value: String,
        /// Why the value was rejected.
        reason: String,
    },
}

/// Parsed server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    values: HashMap<String, String>,
}

impl ServerConfig {
    /// Loads the properties file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] when the file cannot be read.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::from_str_content(&content))
    }

    /// Parses properties-format content.
    #[must_use]
    pub fn from_str_content(content: &str) -> Self {
        let mut values = HashMap::new();
        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
                continue;
            }
            if let Some((key, value)) = line.split_once('=') {
                values.insert(key.trim().to_owned(), value.trim().to_owned());
            }
        }
        Self { values }
    }

    /// Returns the value for `key`, failing when it is missing or blank.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingKey`] for absent or blank values.
    pub fn require(&self, key: &str) -> Result<&str, ConfigError> {
        match self.values.get(key).map(String::as_str).map(str::trim) {
            Some(value) if !value.is_empty() => Ok(value),
            _ => Err(ConfigError::MissingKey {
                key: key.to_owned(),
            }),
        }
    }

    /// Returns the TCP port the server should bind.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingKey`] or [`ConfigError::InvalidValue`]
    /// when `server.port` is absent or not a valid port number.
    pub fn port(&self) -> Result<u16, ConfigError> {
        let raw = self.require(SERVER_PORT)?;
        raw.parse::<u16>().map_err(|err| ConfigError::InvalidValue {
            key: SERVER_PORT.to_owned(),
            value: raw.to_owned(),
            reason: err.to_string(),
        })
    }
}
