//! Public property listing use cases.
//!
//! # Responsibility
//! - Serve the published property grid, the featured listing and the
//!   property detail page.
//! - Allocate unique slugs for new listings.
//!
//! # Invariants
//! - Only `published` properties are visible through this service.
//! - Opening a detail page counts one view.

use crate::model::content::ContentStatus;
use crate::model::property::{Property, PropertyCounter, PropertyPatch};
use crate::model::validation::slugify;
use crate::query::{Collection, QueryOptions, SortKey};
use crate::repo::ContentRepository;
use crate::service::{ServiceError, ServiceResult};
use log::debug;

/// Properties shown on the home page grid.
pub const DEFAULT_GRID_SIZE: u32 = 6;
const MAX_SLUG_ATTEMPTS: u32 = 100;
const MAX_SLUG_CHARS: usize = 96;
const FALLBACK_SLUG: &str = "listing";

pub struct ListingService<'a, R: ContentRepository + ?Sized> {
    repo: &'a R,
}

impl<'a, R: ContentRepository + ?Sized> ListingService<'a, R> {
    pub fn new(repo: &'a R) -> Self {
        Self { repo }
    }

    /// Published properties, newest first.
    pub fn published_listings(&self, limit: u32, offset: u32) -> ServiceResult<Collection<Property>> {
        let options = published()
            .sort_key(SortKey::desc("createdAt"))
            .limit(limit)
            .offset(offset);
        Ok(self.repo.list_properties(&options)?)
    }

    /// The most expensive published property.
    pub fn featured_listing(&self) -> ServiceResult<Option<Property>> {
        let options = published().sort_key(SortKey::desc("price")).limit(1);
        Ok(self.repo.list_properties(&options)?.items.into_iter().next())
    }

    /// Loads a published property by slug and counts the view.
    ///
    /// Drafts and archived listings are reported as missing. Counting a view
    /// does not touch `updatedAt`.
    pub fn listing_detail(&self, slug: &str) -> ServiceResult<Option<Property>> {
        let Some(property) = self.repo.get_property_by_slug(slug)? else {
            return Ok(None);
        };
        if property.meta.status != ContentStatus::Published {
            return Ok(None);
        }

        // `None` here means the listing was deleted after the lookup.
        Ok(self
            .repo
            .increment_property_counter(property.meta.id, PropertyCounter::Views)?)
    }

    /// Returns `base`, `base-2`, `base-3`, ... whichever is free first.
    pub fn allocate_slug(&self, title: &str) -> ServiceResult<String> {
        let mut base = slugify(title);
        if base.is_empty() {
            base = FALLBACK_SLUG.to_string();
        }

        for attempt in 1..=MAX_SLUG_ATTEMPTS {
            let candidate = if attempt == 1 {
                base.clone()
            } else {
                with_suffix(&base, attempt)
            };
            if self.repo.get_property_by_slug(&candidate)?.is_none() {
                return Ok(candidate);
            }
        }

        Err(ServiceError::SlugExhausted(base))
    }

    /// Creates a listing, allocating a free slug when none is given.
    pub fn create_listing(&self, mut patch: PropertyPatch) -> ServiceResult<Property> {
        if patch.slug.as_deref().map_or(true, |slug| slug.trim().is_empty()) {
            let title = patch.title.clone().unwrap_or_default();
            patch.slug = Some(self.allocate_slug(&title)?);
        }
        let property = self.repo.create_property(&patch)?;
        debug!(
            "event=listing_create module=service status=ok id={} slug={}",
            property.meta.id, property.slug
        );
        Ok(property)
    }
}

/// Formats a price as whole US dollars, e.g. `$1,850,000`.
pub fn format_price(price: f64) -> String {
    let rounded = price.abs().round();
    let digits = format!("{rounded:.0}");
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, digit) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    if price < 0.0 && rounded > 0.0 {
        format!("-${grouped}")
    } else {
        format!("${grouped}")
    }
}

fn published() -> QueryOptions {
    QueryOptions::new().filter_eq("status", ContentStatus::Published.as_str())
}

fn with_suffix(base: &str, attempt: u32) -> String {
    let suffix = format!("-{attempt}");
    let keep = MAX_SLUG_CHARS.saturating_sub(suffix.len());
    let trimmed = base
        .get(..keep.min(base.len()))
        .unwrap_or(base)
        .trim_end_matches('-');
    format!("{trimmed}{suffix}")
}

#[cfg(test)]
mod tests {
    use super::{format_price, with_suffix};

    #[test]
    fn price_is_grouped_by_thousands() {
        assert_eq!(format_price(1_850_000.0), "$1,850,000");
        assert_eq!(format_price(999.4), "$999");
        assert_eq!(format_price(0.0), "$0");
        assert_eq!(format_price(1234.5), "$1,235");
    }

    #[test]
    fn suffixed_slug_stays_within_limit() {
        assert_eq!(with_suffix("ocean-view", 2), "ocean-view-2");
        let long = "a".repeat(96);
        let suffixed = with_suffix(&long, 12);
        assert_eq!(suffixed.len(), 96);
        assert!(suffixed.ends_with("-12"));
    }
}
