//! Contact-form inquiries and their back-office handling.
//!
//! # Responsibility
//! - Turn contact-form input into stored inquiries.
//! - Keep the per-property inquiry counter in step with submissions.
//! - Resolve inquiries and list the open queue.
//!
//! # Invariants
//! - New inquiries are always unresolved.
//! - A dangling `propertyId` never fails a submission.

use crate::model::content::{now_epoch_ms, EntityId};
use crate::model::inquiry::{Inquiry, InquiryPatch, InquiryType};
use crate::model::property::PropertyCounter;
use crate::query::{Collection, QueryOptions, SortKey};
use crate::repo::ContentRepository;
use crate::service::ServiceResult;
use log::{debug, warn};

/// Raw contact-form input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactForm {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub subject: Option<String>,
    pub message: String,
    pub inquiry_type: Option<InquiryType>,
    pub property_id: Option<EntityId>,
    pub agent_id: Option<EntityId>,
}

pub struct InquiryService<'a, R: ContentRepository + ?Sized> {
    repo: &'a R,
}

impl<'a, R: ContentRepository + ?Sized> InquiryService<'a, R> {
    pub fn new(repo: &'a R) -> Self {
        Self { repo }
    }

    /// Stores a contact-form submission.
    pub fn submit(&self, form: &ContactForm) -> ServiceResult<Inquiry> {
        let patch = InquiryPatch {
            name: Some(form.name.trim().to_string()),
            email: Some(form.email.trim().to_string()),
            phone: non_blank(form.phone.as_deref()).map(Some),
            subject: non_blank(form.subject.as_deref()).map(Some),
            message: Some(form.message.trim().to_string()),
            inquiry_type: form.inquiry_type,
            property_id: form.property_id.map(Some),
            agent_id: form.agent_id.map(Some),
            resolved: Some(false),
            ..InquiryPatch::default()
        };
        let inquiry = self.repo.create_inquiry(&patch)?;

        if let Some(property_id) = inquiry.property_id {
            self.count_inquiry(property_id)?;
        }
        debug!(
            "event=inquiry_submit module=service status=ok id={}",
            inquiry.meta.id
        );
        Ok(inquiry)
    }

    /// Marks an inquiry resolved by `resolved_by`, optionally recording a reply.
    pub fn resolve(
        &self,
        id: EntityId,
        resolved_by: &str,
        response: Option<&str>,
    ) -> ServiceResult<Inquiry> {
        let patch = InquiryPatch {
            resolved: Some(true),
            resolved_at: Some(Some(now_epoch_ms())),
            resolved_by: Some(Some(resolved_by.trim().to_string())),
            response: non_blank(response).map(Some),
            ..InquiryPatch::default()
        };
        Ok(self.repo.update_inquiry(id, &patch)?)
    }

    /// Unresolved inquiries, oldest first.
    pub fn open_inquiries(&self, limit: Option<u32>) -> ServiceResult<Collection<Inquiry>> {
        let mut options = QueryOptions::new()
            .filter_eq("resolved", false)
            .sort_key(SortKey::asc("createdAt"));
        options.limit = limit;
        Ok(self.repo.list_inquiries(&options)?)
    }

    fn count_inquiry(&self, property_id: EntityId) -> ServiceResult<()> {
        let counted = self
            .repo
            .increment_property_counter(property_id, PropertyCounter::Inquiries)?;
        if counted.is_none() {
            warn!("event=inquiry_submit module=service status=dangling_property id={property_id}");
        }
        Ok(())
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}
