//! Core configuration.
//!
//! # Responsibility
//! - Describe log, store and diary policy settings in one serde model.
//! - Load the model from JSON with per-field defaults.
//!
//! # Invariants
//! - An empty JSON object is a valid config equal to `CoreConfig::default()`.
//! - Diary date uniqueness defaults to the permissive policy.

use crate::logging::default_log_level;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

/// Whether several diaries may share one date.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiaryDatePolicy {
    /// Inserts never check the date.
    #[default]
    AllowDuplicates,
    /// Inserts fail when a diary already exists on the date.
    EnforceUnique,
}

/// Diary service settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiaryConfig {
    pub date_policy: DiaryDatePolicy,
}

/// Top-level settings for hosts embedding the core.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    /// `trace|debug|info|warn|error`; build-mode default when absent.
    pub log_level: Option<String>,
    /// Absolute directory for rolling log files; logging stays off when absent.
    pub log_dir: Option<PathBuf>,
    /// Store file path; an in-memory store is used when absent.
    pub db_path: Option<PathBuf>,
    pub diary: DiaryConfig,
}

#[derive(Debug)]
pub enum ConfigError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse(serde_json::Error),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "cannot read config `{}`: {source}", path.display())
            }
            Self::Parse(err) => write!(f, "invalid config: {err}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse(err) => Some(err),
        }
    }
}

impl CoreConfig {
    /// Parses a JSON document.
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(raw).map_err(ConfigError::Parse)
    }

    /// Reads and parses a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    /// Returns the configured level or the build-mode default.
    pub fn effective_log_level(&self) -> &str {
        self.log_level.as_deref().unwrap_or(default_log_level())
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, CoreConfig, DiaryDatePolicy};
    use std::io::Write;

    #[test]
    fn empty_object_yields_defaults() {
        let config = CoreConfig::from_json_str("{}").unwrap();
        assert_eq!(config, CoreConfig::default());
        assert_eq!(config.diary.date_policy, DiaryDatePolicy::AllowDuplicates);
    }

    #[test]
    fn parses_nested_diary_policy() {
        let config = CoreConfig::from_json_str(
            r#"{"log_level":"warn","diary":{"date_policy":"enforce_unique"}}"#,
        )
        .unwrap();
        assert_eq!(config.effective_log_level(), "warn");
        assert_eq!(config.diary.date_policy, DiaryDatePolicy::EnforceUnique);
    }

    #[test]
    fn missing_log_level_falls_back_to_build_default() {
        let config = CoreConfig::default();
        assert_eq!(
            config.effective_log_level(),
            crate::logging::default_log_level()
        );
    }

    #[test]
    fn unknown_policy_is_a_parse_error() {
        let err = CoreConfig::from_json_str(r#"{"diary":{"date_policy":"sometimes"}}"#)
            .unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn load_reads_file_and_reports_missing_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("haru.json");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(br#"{"db_path":"/tmp/haru.db"}"#).unwrap();
        drop(file);

        let config = CoreConfig::load(&path).unwrap();
        assert_eq!(
            config.db_path.as_deref(),
            Some(std::path::Path::new("/tmp/haru.db"))
        );

        let missing = CoreConfig::load(dir.path().join("missing.json")).unwrap_err();
        assert!(matches!(missing, ConfigError::Io { .. }));
    }
}
