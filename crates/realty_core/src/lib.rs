//! Content core for the real-estate site and its back office.
//! Every content read and write goes through [`ContentRepository`].

pub mod config;
pub mod db;
pub mod factory;
pub mod logging;
pub mod media;
pub mod model;
pub mod query;
pub mod repo;
pub mod search;
pub mod service;

pub use config::{load_config, BackendConfig, ConfigError, CoreConfig, LoggingConfig, MediaConfig};
pub use factory::{open_repository, FactoryError};
pub use logging::{default_log_level, init_logging, init_logging_from_config, logging_status};
pub use media::{StoredFile, UploadError};
pub use model::agent::{Agent, AgentPatch};
pub use model::article::{Article, ArticlePatch, Testimonial, TestimonialPatch};
pub use model::client::{Client, ClientPatch};
pub use model::content::{ContentMeta, ContentStatus, ContentType, EntityId, MediaAsset};
pub use model::inquiry::{Inquiry, InquiryPatch};
pub use model::property::{Property, PropertyPatch};
pub use model::settings::{SettingsPatch, SiteSettings};
pub use model::validation::ValidationError;
pub use query::{Collection, FilterCondition, FilterOp, QueryOptions, SortKey};
pub use repo::{ContentRepository, RepoError, RepoResult, SqliteContentRepository};
pub use search::fts::SearchHit;
pub use service::dashboard_service::{DashboardService, DashboardStats};
pub use service::inquiry_service::{ContactForm, InquiryService};
pub use service::listing_service::{format_price, ListingService};
pub use service::{ServiceError, ServiceResult};

/// Minimal health check.
pub fn ping() -> &'static str {
    "pong"
}

pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
