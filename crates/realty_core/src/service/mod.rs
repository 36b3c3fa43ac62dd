//! Use-case services over the content repository.
//!
//! # Responsibility
//! - Orchestrate facade calls into site and back-office use cases.
//! - Keep presentation code free of query-envelope details.

pub mod dashboard_service;
pub mod inquiry_service;
pub mod listing_service;

use crate::repo::RepoError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type ServiceResult<T> = Result<T, ServiceError>;

#[derive(Debug)]
pub enum ServiceError {
    Repo(RepoError),
    /// Every candidate slug derived from this base is already taken.
    SlugExhausted(String),
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Repo(err) => write!(f, "{err}"),
            Self::SlugExhausted(base) => write!(f, "no free slug left for `{base}`"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            Self::SlugExhausted(_) => None,
        }
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}
