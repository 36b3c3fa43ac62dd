//! Runtime configuration for the content core.
//!
//! # Responsibility
//! - Describe backend selection, upload policy and logging settings.
//! - Load them from a JSON document where every field is optional.
//!
//! # Invariants
//! - A missing section or field falls back to its documented default.
//! - Unknown top-level keys are rejected so typos surface at startup.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

/// 10 MiB.
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;
pub const DEFAULT_PUBLIC_BASE_URL: &str = "/media";

#[derive(Debug)]
pub enum ConfigError {
    Io { path: PathBuf, source: std::io::Error },
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

impl From<serde_json::Error> for ConfigError {
    fn from(value: serde_json::Error) -> Self {
        Self::Parse(value)
    }
}

/// Complete configuration of one process.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct CoreConfig {
    pub backend: BackendConfig,
    pub media: MediaConfig,
    pub logging: LoggingConfig,
}

impl CoreConfig {
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(raw)?)
    }
}

/// Which content backend to bind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BackendConfig {
    /// Backend name: `sqlite`, `memory`, or another registered name.
    pub kind: String,
    /// Database file for the `sqlite` backend.
    pub path: Option<PathBuf>,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            kind: "memory".to_string(),
            path: None,
        }
    }
}

impl BackendConfig {
    pub fn sqlite(path: impl Into<PathBuf>) -> Self {
        Self {
            kind: "sqlite".to_string(),
            path: Some(path.into()),
        }
    }

    pub fn memory() -> Self {
        Self::default()
    }
}

/// Upload policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MediaConfig {
    pub max_upload_bytes: u64,
    pub allowed_mime_types: Vec<String>,
    /// Prefix of returned file URLs; `{base}/{fileId}/{filename}`.
    pub public_base_url: String,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            allowed_mime_types: [
                "image/jpeg",
                "image/png",
                "image/gif",
                "image/webp",
                "image/avif",
                "application/pdf",
            ]
            .into_iter()
            .map(str::to_string)
            .collect(),
            public_base_url: DEFAULT_PUBLIC_BASE_URL.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingConfig {
    /// `trace|debug|info|warn|error`; build-mode default when absent.
    pub level: Option<String>,
    /// Absolute directory for rolling log files; logging stays off when absent.
    pub dir: Option<PathBuf>,
}

/// Reads a JSON config file.
pub fn load_config(path: impl AsRef<Path>) -> Result<CoreConfig, ConfigError> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    CoreConfig::from_json_str(&raw)
}

#[cfg(test)]
mod tests {
    use super::{load_config, ConfigError, CoreConfig, DEFAULT_MAX_UPLOAD_BYTES};
    use std::io::Write;
    use std::path::PathBuf;

    #[test]
    fn empty_document_uses_defaults() {
        let config = CoreConfig::from_json_str("{}").unwrap();
        assert_eq!(config, CoreConfig::default());
        assert_eq!(config.backend.kind, "memory");
        assert_eq!(config.media.max_upload_bytes, DEFAULT_MAX_UPLOAD_BYTES);
        assert!(config.logging.dir.is_none());
    }

    #[test]
    fn partial_sections_keep_remaining_defaults() {
        let config = CoreConfig::from_json_str(
            r#"{ "backend": { "kind": "sqlite", "path": "/var/lib/realty/content.db" },
                 "media": { "maxUploadBytes": 1024 } }"#,
        )
        .unwrap();
        assert_eq!(config.backend.kind, "sqlite");
        assert_eq!(
            config.backend.path,
            Some(PathBuf::from("/var/lib/realty/content.db"))
        );
        assert_eq!(config.media.max_upload_bytes, 1024);
        assert!(config
            .media
            .allowed_mime_types
            .contains(&"image/png".to_string()));
    }

    #[test]
    fn unknown_sections_are_rejected() {
        let err = CoreConfig::from_json_str(r#"{ "bakend": {} }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn load_config_reads_file_and_reports_missing_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "logging": {{ "level": "warn" }} }}"#).unwrap();
        let config = load_config(file.path()).unwrap();
        assert_eq!(config.logging.level.as_deref(), Some("warn"));

        let missing = load_config("/definitely/not/here.json").unwrap_err();
        assert!(matches!(missing, ConfigError::Io { .. }));
    }
}
