//! Content repository facade contract.
//!
//! # Responsibility
//! - Define the one interface presentation code uses for every content
//!   operation, whatever backend sits behind it.
//! - Define the repository error taxonomy.
//!
//! # Invariants
//! - Lookup misses are `Ok(None)`; only mutations report `NotFound`.
//! - While disconnected every operation except `connect`/`is_connected`
//!   fails with `RepoError::Connection`.
//! - Relationship ids are weak: a dangling id resolves to `None`.

use crate::db::DbError;
use crate::media::{StoredFile, UploadError};
use crate::model::agent::{Agent, AgentPatch};
use crate::model::article::{Article, ArticlePatch, Testimonial, TestimonialPatch};
use crate::model::client::{Client, ClientPatch};
use crate::model::content::{ContentType, EntityId};
use crate::model::inquiry::{Inquiry, InquiryPatch};
use crate::model::property::{Property, PropertyCounter, PropertyPatch};
use crate::model::settings::{SettingsPatch, SiteSettings};
use crate::model::validation::ValidationError;
use crate::query::{Collection, QueryOptions};
use crate::search::fts::{SearchError, SearchHit};
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RepoResult<T> = Result<T, RepoError>;

/// Error returned by every facade operation.
#[derive(Debug)]
pub enum RepoError {
    Validation(ValidationError),
    /// Mutation target does not exist.
    NotFound { collection: &'static str, id: String },
    /// Backend is not connected or the connection is unusable.
    Connection(String),
    Upload(UploadError),
    Db(DbError),
    /// Persisted row could not be decoded into a valid record.
    InvalidData(String),
}

impl RepoError {
    pub(crate) fn not_found(collection: ContentType, id: impl ToString) -> Self {
        Self::NotFound {
            collection: collection.as_str(),
            id: id.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::NotFound { collection, id } => write!(f, "{collection} not found: {id}"),
            Self::Connection(message) => write!(f, "repository connection error: {message}"),
            Self::Upload(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted content: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Upload(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::NotFound { .. } | Self::Connection(_) | Self::InvalidData(_) => None,
        }
    }
}

impl From<ValidationError> for RepoError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<UploadError> for RepoError {
    fn from(value: UploadError) -> Self {
        Self::Upload(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<SearchError> for RepoError {
    fn from(value: SearchError) -> Self {
        match value {
            SearchError::InvalidQuery { query, message } => Self::Validation(
                ValidationError::InvalidQuery(format!("search `{query}`: {message}")),
            ),
            SearchError::Db(err) => Self::Db(err),
            SearchError::InvalidData(message) => Self::InvalidData(message),
        }
    }
}

/// Backend-agnostic content repository.
///
/// Implementations are shared across threads; each call is one
/// self-contained round trip to the backend.
pub trait ContentRepository: Send + Sync {
    /// Opens the backend connection. No-op when already connected.
    fn connect(&self) -> RepoResult<()>;
    fn disconnect(&self) -> RepoResult<()>;
    fn is_connected(&self) -> bool;

    fn list_properties(&self, options: &QueryOptions) -> RepoResult<Collection<Property>>;
    fn get_property(&self, id: EntityId) -> RepoResult<Option<Property>>;
    fn get_property_by_slug(&self, slug: &str) -> RepoResult<Option<Property>>;
    fn create_property(&self, patch: &PropertyPatch) -> RepoResult<Property>;
    fn update_property(&self, id: EntityId, patch: &PropertyPatch) -> RepoResult<Property>;
    fn delete_property(&self, id: EntityId) -> RepoResult<()>;
    /// Adds one to a property counter as a single atomic write.
    ///
    /// Returns `None` when the property does not exist. Counters are
    /// engagement data, not edits: `updatedAt` is left unchanged.
    fn increment_property_counter(
        &self,
        id: EntityId,
        counter: PropertyCounter,
    ) -> RepoResult<Option<Property>>;

    fn list_agents(&self, options: &QueryOptions) -> RepoResult<Collection<Agent>>;
    fn get_agent(&self, id: EntityId) -> RepoResult<Option<Agent>>;
    fn get_agent_by_slug(&self, slug: &str) -> RepoResult<Option<Agent>>;
    fn create_agent(&self, patch: &AgentPatch) -> RepoResult<Agent>;
    fn update_agent(&self, id: EntityId, patch: &AgentPatch) -> RepoResult<Agent>;
    fn delete_agent(&self, id: EntityId) -> RepoResult<()>;

    fn list_clients(&self, options: &QueryOptions) -> RepoResult<Collection<Client>>;
    fn get_client(&self, id: EntityId) -> RepoResult<Option<Client>>;
    fn create_client(&self, patch: &ClientPatch) -> RepoResult<Client>;
    fn update_client(&self, id: EntityId, patch: &ClientPatch) -> RepoResult<Client>;
    fn delete_client(&self, id: EntityId) -> RepoResult<()>;

    fn list_inquiries(&self, options: &QueryOptions) -> RepoResult<Collection<Inquiry>>;
    fn get_inquiry(&self, id: EntityId) -> RepoResult<Option<Inquiry>>;
    fn create_inquiry(&self, patch: &InquiryPatch) -> RepoResult<Inquiry>;
    fn update_inquiry(&self, id: EntityId, patch: &InquiryPatch) -> RepoResult<Inquiry>;
    fn delete_inquiry(&self, id: EntityId) -> RepoResult<()>;

    fn list_articles(&self, options: &QueryOptions) -> RepoResult<Collection<Article>>;
    fn get_article(&self, id: EntityId) -> RepoResult<Option<Article>>;
    fn get_article_by_slug(&self, slug: &str) -> RepoResult<Option<Article>>;
    fn create_article(&self, patch: &ArticlePatch) -> RepoResult<Article>;
    fn update_article(&self, id: EntityId, patch: &ArticlePatch) -> RepoResult<Article>;
    fn delete_article(&self, id: EntityId) -> RepoResult<()>;

    fn list_testimonials(&self, options: &QueryOptions) -> RepoResult<Collection<Testimonial>>;
    fn get_testimonial(&self, id: EntityId) -> RepoResult<Option<Testimonial>>;
    fn create_testimonial(&self, patch: &TestimonialPatch) -> RepoResult<Testimonial>;
    fn update_testimonial(
        &self,
        id: EntityId,
        patch: &TestimonialPatch,
    ) -> RepoResult<Testimonial>;
    fn delete_testimonial(&self, id: EntityId) -> RepoResult<()>;

    /// Lists raw JSON records of any collection, projected to
    /// `options.fields` when non-empty.
    fn list_documents(
        &self,
        collection: ContentType,
        options: &QueryOptions,
    ) -> RepoResult<Collection<Value>>;

    /// Returns the stored settings, or defaults when never written.
    fn get_settings(&self) -> RepoResult<SiteSettings>;
    fn update_settings(&self, patch: &SettingsPatch) -> RepoResult<SiteSettings>;

    /// Stores an uploaded file and returns its public URL.
    fn upload_file(&self, data: &[u8], filename: Option<&str>) -> RepoResult<String>;
    /// Accepts a file id or the URL returned by `upload_file`.
    fn get_file(&self, file_id: &str) -> RepoResult<Option<StoredFile>>;
    fn delete_file(&self, file_id: &str) -> RepoResult<()>;

    /// Full-text search; `None` or an empty slice searches all collections.
    fn search(
        &self,
        query: &str,
        collections: Option<&[ContentType]>,
    ) -> RepoResult<Vec<SearchHit>>;

    /// Resolves the listing agent of a property.
    fn property_agent(&self, property: &Property) -> RepoResult<Option<Agent>> {
        match property.agent_id {
            Some(agent_id) => self.get_agent(agent_id),
            None => Ok(None),
        }
    }

    /// Resolves the property an inquiry is about.
    fn inquiry_property(&self, inquiry: &Inquiry) -> RepoResult<Option<Property>> {
        match inquiry.property_id {
            Some(property_id) => self.get_property(property_id),
            None => Ok(None),
        }
    }

    /// Resolves a client's interested properties, skipping deleted ones.
    fn client_interested_properties(&self, client: &Client) -> RepoResult<Vec<Property>> {
        let mut properties = Vec::with_capacity(client.interested_properties.len());
        for property_id in &client.interested_properties {
            if let Some(property) = self.get_property(*property_id)? {
                properties.push(property);
            }
        }
        Ok(properties)
    }
}
