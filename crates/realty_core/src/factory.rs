//! Backend selection from configuration.
//!
//! # Responsibility
//! - Map a configured backend name to a connected repository binding.
//!
//! # Invariants
//! - Unknown or unavailable backends fail here, at startup, never on the
//!   first content call.
//! - A returned repository is already connected.

use crate::config::CoreConfig;
use crate::media::MediaPolicy;
use crate::repo::{ContentRepository, RepoError, SqliteContentRepository, SqliteTarget};
use log::{error, info};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Backend names recognised by configuration.
pub const KNOWN_BACKENDS: &[&str] = &["sqlite", "memory", "directus"];

#[derive(Debug)]
pub enum FactoryError {
    UnknownBackend(String),
    /// The name is recognised but this build has no binding for it.
    BackendUnavailable(String),
    MissingSetting {
        backend: String,
        setting: &'static str,
    },
    Connect(RepoError),
}

impl Display for FactoryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownBackend(name) => write!(
                f,
                "unknown content backend `{name}`; expected one of {}",
                KNOWN_BACKENDS.join("|")
            ),
            Self::BackendUnavailable(name) => {
                write!(f, "content backend `{name}` has no binding in this build")
            }
            Self::MissingSetting { backend, setting } => {
                write!(f, "content backend `{backend}` requires `{setting}`")
            }
            Self::Connect(err) => write!(f, "cannot connect content backend: {err}"),
        }
    }
}

impl Error for FactoryError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Connect(err) => Some(err),
            _ => None,
        }
    }
}

/// Builds and connects the repository named by `config.backend.kind`.
pub fn open_repository(config: &CoreConfig) -> Result<Box<dyn ContentRepository>, FactoryError> {
    let kind = config.backend.kind.trim().to_ascii_lowercase();
    let media = MediaPolicy::new(&config.media);

    let target = match kind.as_str() {
        "sqlite" => {
            let path = config
                .backend
                .path
                .clone()
                .filter(|path| !path.as_os_str().is_empty())
                .ok_or_else(|| FactoryError::MissingSetting {
                    backend: kind.clone(),
                    setting: "path",
                })?;
            SqliteTarget::File(path)
        }
        "memory" => SqliteTarget::Memory,
        "directus" => return Err(FactoryError::BackendUnavailable(kind)),
        _ => return Err(FactoryError::UnknownBackend(config.backend.kind.clone())),
    };

    let repo = SqliteContentRepository::new(target, media);
    if let Err(err) = repo.connect() {
        error!("event=backend_open module=factory status=error backend={kind} error={err}");
        return Err(FactoryError::Connect(err));
    }
    info!("event=backend_open module=factory status=ok backend={kind}");
    Ok(Box::new(repo))
}
