//! Configuration
//!
//! Commit mode, sandbox parameters and commit limits, loadable from TOML:
//!
//! ```toml
//! [sandbox]
//! mode = "copy"
//!
//! [cement]
//! max_depth = 64
//! ```

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// How a commit resolves its target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommitMode {
    /// Replay onto the original, keeping its identity
    #[default]
    Modify,
    /// Replay onto a structural clone, leaving the original untouched
    Copy,
}

impl Display for CommitMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Modify => f.write_str("modify"),
            Self::Copy => f.write_str("copy"),
        }
    }
}

impl FromStr for CommitMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "modify" => Ok(Self::Modify),
            "copy" => Ok(Self::Copy),
            other => Err(ConfigError::UnknownMode(other.to_string())),
        }
    }
}

/// Parameters for a staging session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SandboxParams {
    /// Commit mode applied by `cement`
    pub mode: CommitMode,
}

impl SandboxParams {
    /// Create default parameters (`modify`)
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With commit mode
    #[inline]
    #[must_use]
    pub fn with_mode(mut self, mode: CommitMode) -> Self {
        self.mode = mode;
        self
    }
}

/// Limits applied while committing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CementOptions {
    /// Maximum nesting of sandbox commits below the root
    pub max_depth: usize,
}

impl CementOptions {
    /// With max depth
    #[inline]
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}

impl Default for CementOptions {
    fn default() -> Self {
        Self { max_depth: 256 }
    }
}

/// Top-level configuration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TundraConfig {
    /// Defaults for new staging sessions
    pub sandbox: SandboxParams,
    /// Commit limits
    pub cement: CementOptions,
}

impl TundraConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from TOML; missing sections keep their defaults
    ///
    /// # Errors
    /// Returns error if the document is not valid TOML or has wrong types
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(source)?)
    }

    /// With default commit mode
    #[inline]
    #[must_use]
    pub fn with_mode(mut self, mode: CommitMode) -> Self {
        self.sandbox.mode = mode;
        self
    }

    /// With commit depth limit
    #[inline]
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.cement.max_depth = max_depth;
        self
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Document could not be parsed
    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// Unknown commit mode name
    #[error("unknown commit mode '{0}' (expected 'modify' or 'copy')")]
    UnknownMode(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = TundraConfig::new();
        assert_eq!(config.sandbox.mode, CommitMode::Modify);
        assert_eq!(config.cement.max_depth, 256);
    }

    #[test]
    fn parses_toml() {
        let config = TundraConfig::from_toml_str(
            r#"
            [sandbox]
            mode = "copy"

            [cement]
            max_depth = 8
            "#,
        )
        .unwrap();
        assert_eq!(config.sandbox.mode, CommitMode::Copy);
        assert_eq!(config.cement.max_depth, 8);
    }

    #[test]
    fn missing_sections_keep_defaults() {
        let config = TundraConfig::from_toml_str("[cement]\nmax_depth = 3\n").unwrap();
        assert_eq!(config.sandbox.mode, CommitMode::Modify);
        assert_eq!(config.cement.max_depth, 3);
    }

    #[test]
    fn rejects_unknown_mode() {
        assert!(TundraConfig::from_toml_str("[sandbox]\nmode = \"merge\"\n").is_err());
        assert!(matches!(
            "merge".parse::<CommitMode>(),
            Err(ConfigError::UnknownMode(_))
        ));
    }

    #[test]
    fn mode_display_round_trips() {
        for mode in [CommitMode::Modify, CommitMode::Copy] {
            assert_eq!(mode.to_string().parse::<CommitMode>().unwrap(), mode);
        }
    }

    #[test]
    fn builders() {
        let config = TundraConfig::new()
            .with_mode(CommitMode::Copy)
            .with_max_depth(4);
        assert_eq!(config.sandbox, SandboxParams::new().with_mode(CommitMode::Copy));
        assert_eq!(config.cement, CementOptions::default().with_max_depth(4));
    }
}
