//! Admin dashboard and analytics figures.

use crate::model::content::{ContentStatus, ContentType};
use crate::model::property::Property;
use crate::query::{QueryOptions, SortKey};
use crate::repo::ContentRepository;
use crate::service::ServiceResult;
use serde::Serialize;
use serde_json::Value;

/// Totals shown on the admin dashboard.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_listings: u64,
    pub published_listings: u64,
    pub draft_listings: u64,
    pub archived_listings: u64,
    /// Sum of asking prices over published listings.
    pub published_inventory_value: f64,
    pub total_views: u64,
    pub total_inquiries: u64,
    pub open_inquiries: u64,
    pub clients: u64,
    pub agents: u64,
    pub articles: u64,
}

pub struct DashboardService<'a, R: ContentRepository + ?Sized> {
    repo: &'a R,
}

impl<'a, R: ContentRepository + ?Sized> DashboardService<'a, R> {
    pub fn new(repo: &'a R) -> Self {
        Self { repo }
    }

    pub fn stats(&self) -> ServiceResult<DashboardStats> {
        let mut stats = DashboardStats::default();

        let listings = self.repo.list_documents(
            ContentType::Property,
            &QueryOptions::new().fields(["status", "price", "views"]),
        )?;
        stats.total_listings = listings.total;
        for record in &listings.items {
            stats.total_views += record.get("views").and_then(Value::as_u64).unwrap_or(0);
            match record
                .get("status")
                .and_then(Value::as_str)
                .and_then(ContentStatus::parse)
            {
                Some(ContentStatus::Published) => {
                    stats.published_listings += 1;
                    stats.published_inventory_value +=
                        record.get("price").and_then(Value::as_f64).unwrap_or(0.0);
                }
                Some(ContentStatus::Draft) => stats.draft_listings += 1,
                Some(ContentStatus::Archived) => stats.archived_listings += 1,
                None => {}
            }
        }

        stats.total_inquiries = self.count(ContentType::Inquiry, QueryOptions::new())?;
        stats.open_inquiries = self.count(
            ContentType::Inquiry,
            QueryOptions::new().filter_eq("resolved", false),
        )?;
        stats.clients = self.count(ContentType::Client, QueryOptions::new())?;
        stats.agents = self.count(ContentType::Agent, QueryOptions::new())?;
        stats.articles = self.count(ContentType::Article, QueryOptions::new())?;
        Ok(stats)
    }

    /// Most viewed properties of any status.
    pub fn top_properties_by_views(&self, limit: u32) -> ServiceResult<Vec<Property>> {
        let options = QueryOptions::new()
            .sort_key(SortKey::desc("views"))
            .limit(limit);
        Ok(self.repo.list_properties(&options)?.items)
    }

    fn count(&self, collection: ContentType, options: QueryOptions) -> ServiceResult<u64> {
        Ok(self
            .repo
            .list_documents(collection, &options.limit(0))?
            .total)
    }
}
