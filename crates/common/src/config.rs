//! Runtime environment classification
//!
//! A single three-way classification (`development` | `test` | `production`)
//! drives logger verbosity and whether raw error messages may be shown to end
//! users. It is the only configuration surface this crate reads.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Environment variable consulted by [`Environment::detect`].
pub const ENV_VAR: &str = "APP_ENV";

/// Error returned when an environment string cannot be parsed.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Unknown environment: {value}")]
    UnknownEnvironment { value: String },
}

/// Runtime environment of the running process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    /// Local development: verbose, colorized output, raw error messages.
    Development,
    /// Test runs: only errors are logged to keep test output quiet.
    Test,
    /// Production: JSON records, generic user-facing messages for defects.
    Production,
}

impl Environment {
    /// Detect the environment from `APP_ENV`.
    ///
    /// Missing or unparseable values fall back to [`Environment::Development`].
    pub fn detect() -> Self {
        std::env::var(ENV_VAR)
            .ok()
            .and_then(|value| value.parse().ok())
            .unwrap_or(Environment::Development)
    }

    /// Canonical lowercase name, as emitted in log records.
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Test => "test",
            Environment::Production => "production",
        }
    }

    pub fn is_development(&self) -> bool {
        matches!(self, Environment::Development)
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Environment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "test" => Ok(Environment::Test),
            "production" | "prod" => Ok(Environment::Production),
            other => Err(ConfigError::UnknownEnvironment { value: other.to_string() }),
        }
    }
}
