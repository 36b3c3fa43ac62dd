use realty_core::model::content::ContentStatus;
use realty_core::model::inquiry::InquiryType;
use realty_core::model::property::PropertyPatch;
use realty_core::{
    ContactForm, ContentRepository, DashboardService, InquiryService, ListingService,
    SqliteContentRepository,
};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use uuid::Uuid;

#[test]
fn grid_shows_only_published_listings_newest_first() {
    let repo = repo();
    let older = repo.create_property(&published("Older Home", 300_000.0)).unwrap();
    std::thread::sleep(Duration::from_millis(5));
    let newer = repo.create_property(&published("Newer Home", 200_000.0)).unwrap();
    repo.create_property(&draft("Hidden Draft", 900_000.0)).unwrap();

    let service = ListingService::new(&repo);
    let grid = service.published_listings(6, 0).unwrap();
    assert_eq!(grid.total, 2);
    assert_eq!(grid.items[0].meta.id, newer.meta.id);
    assert_eq!(grid.items[1].meta.id, older.meta.id);

    let second_page = service.published_listings(1, 1).unwrap();
    assert_eq!(second_page.items[0].meta.id, older.meta.id);
}

#[test]
fn featured_listing_is_most_expensive_published() {
    let repo = repo();
    let service = ListingService::new(&repo);
    assert!(service.featured_listing().unwrap().is_none());

    repo.create_property(&published("Cottage", 250_000.0)).unwrap();
    let mansion = repo.create_property(&published("Mansion", 4_200_000.0)).unwrap();
    repo.create_property(&draft("Palace", 9_000_000.0)).unwrap();

    let featured = service.featured_listing().unwrap().unwrap();
    assert_eq!(featured.meta.id, mansion.meta.id);
}

#[test]
fn detail_page_counts_views_and_hides_drafts() {
    let repo = repo();
    let listed = repo.create_property(&published("Sunset Villa", 1_100_000.0)).unwrap();
    repo.create_property(&draft("Secret Listing", 10.0)).unwrap();
    let service = ListingService::new(&repo);

    let first = service.listing_detail("sunset-villa").unwrap().unwrap();
    assert_eq!(first.views, 1);
    assert_eq!(first.meta.updated_at, listed.meta.updated_at);
    let second = service.listing_detail("sunset-villa").unwrap().unwrap();
    assert_eq!(second.views, 2);
    assert_eq!(repo.get_property(listed.meta.id).unwrap().unwrap().views, 2);

    assert!(service.listing_detail("secret-listing").unwrap().is_none());
    assert!(service.listing_detail("missing").unwrap().is_none());
}

#[test]
fn concurrent_page_views_are_all_counted() {
    let repo = Arc::new(repo());
    let loft = repo.create_property(&published("Loft", 450_000.0)).unwrap();

    let handles = (0..8)
        .map(|_| {
            let repo = Arc::clone(&repo);
            thread::spawn(move || {
                let service = ListingService::new(repo.as_ref());
                for _ in 0..25 {
                    service.listing_detail("loft").unwrap().unwrap();
                }
            })
        })
        .collect::<Vec<_>>();
    for handle in handles {
        handle.join().unwrap();
    }

    let stored = repo.get_property(loft.meta.id).unwrap().unwrap();
    assert_eq!(stored.views, 200);
    assert_eq!(stored.meta.updated_at, loft.meta.updated_at);
}

#[test]
fn concurrent_inquiries_are_all_counted() {
    let repo = Arc::new(repo());
    let loft = repo.create_property(&published("Loft", 450_000.0)).unwrap();
    let property_id = loft.meta.id;

    let handles = (0..8)
        .map(|worker| {
            let repo = Arc::clone(&repo);
            thread::spawn(move || {
                let service = InquiryService::new(repo.as_ref());
                for round in 0..25 {
                    service
                        .submit(&ContactForm {
                            property_id: Some(property_id),
                            ..form(&format!("Visitor{worker}x{round}"), "Is it available?")
                        })
                        .unwrap();
                }
            })
        })
        .collect::<Vec<_>>();
    for handle in handles {
        handle.join().unwrap();
    }

    let stored = repo.get_property(property_id).unwrap().unwrap();
    assert_eq!(stored.inquiries, 200);
    assert_eq!(stored.meta.updated_at, loft.meta.updated_at);
}

#[test]
fn new_listings_get_free_slugs() {
    let repo = repo();
    let service = ListingService::new(&repo);

    let first = service.create_listing(draft("Ocean View", 1.0)).unwrap();
    let second = service.create_listing(draft("Ocean View", 2.0)).unwrap();
    let third = service.create_listing(draft("Ocean View", 3.0)).unwrap();
    assert_eq!(first.slug, "ocean-view");
    assert_eq!(second.slug, "ocean-view-2");
    assert_eq!(third.slug, "ocean-view-3");

    assert_eq!(service.allocate_slug("!!!").unwrap(), "listing");

    let mut explicit = draft("Anything", 4.0);
    explicit.slug = Some("custom-slug".to_string());
    assert_eq!(service.create_listing(explicit).unwrap().slug, "custom-slug");
}

#[test]
fn contact_form_creates_open_inquiry_and_counts_it() {
    let repo = repo();
    let property = repo.create_property(&published("Bay House", 800_000.0)).unwrap();
    let service = InquiryService::new(&repo);

    let inquiry = service
        .submit(&ContactForm {
            name: "  Jordan Lee ".to_string(),
            email: "jordan@example.com".to_string(),
            phone: Some("   ".to_string()),
            message: "Can I tour on Saturday?".to_string(),
            inquiry_type: Some(InquiryType::PropertyViewing),
            property_id: Some(property.meta.id),
            ..ContactForm::default()
        })
        .unwrap();

    assert_eq!(inquiry.name, "Jordan Lee");
    assert!(inquiry.phone.is_none());
    assert!(!inquiry.resolved);
    assert_eq!(
        repo.inquiry_property(&inquiry).unwrap().unwrap().meta.id,
        property.meta.id
    );
    assert_eq!(repo.get_property(property.meta.id).unwrap().unwrap().inquiries, 1);
}

#[test]
fn dangling_property_reference_does_not_fail_submission() {
    let repo = repo();
    let service = InquiryService::new(&repo);
    let inquiry = service
        .submit(&ContactForm {
            name: "Robin".to_string(),
            email: "robin@example.com".to_string(),
            message: "Still available?".to_string(),
            property_id: Some(Uuid::new_v4()),
            ..ContactForm::default()
        })
        .unwrap();
    assert!(repo.inquiry_property(&inquiry).unwrap().is_none());
}

#[test]
fn invalid_contact_form_is_rejected() {
    let repo = repo();
    let service = InquiryService::new(&repo);
    assert!(service
        .submit(&ContactForm {
            name: "No Email".to_string(),
            email: "nope".to_string(),
            message: "hello".to_string(),
            ..ContactForm::default()
        })
        .is_err());
}

#[test]
fn resolving_removes_inquiry_from_open_queue() {
    let repo = repo();
    let service = InquiryService::new(&repo);
    let first = service.submit(&form("Ana", "First question")).unwrap();
    std::thread::sleep(Duration::from_millis(5));
    let second = service.submit(&form("Ben", "Second question")).unwrap();

    let open = service.open_inquiries(None).unwrap();
    assert_eq!(open.total, 2);
    assert_eq!(open.items[0].meta.id, first.meta.id);

    let resolved = service
        .resolve(first.meta.id, "agent-7", Some("Replied by phone"))
        .unwrap();
    assert!(resolved.resolved);
    assert_eq!(resolved.resolved_by.as_deref(), Some("agent-7"));
    assert_eq!(resolved.response.as_deref(), Some("Replied by phone"));
    assert!(resolved.resolved_at.is_some());

    let open = service.open_inquiries(Some(10)).unwrap();
    assert_eq!(open.total, 1);
    assert_eq!(open.items[0].meta.id, second.meta.id);

    assert!(service.resolve(first.meta.id, "   ", None).is_err());
}

#[test]
fn dashboard_totals_reflect_content() {
    let repo = repo();
    let mut popular = published("Popular", 500_000.0);
    popular.views = Some(40);
    let popular = repo.create_property(&popular).unwrap();
    let mut quiet = published("Quiet", 250_000.0);
    quiet.views = Some(2);
    repo.create_property(&quiet).unwrap();
    repo.create_property(&draft("Draft", 100_000.0)).unwrap();
    let mut archived = draft("Gone", 1.0);
    archived.status = Some(ContentStatus::Archived);
    repo.create_property(&archived).unwrap();

    let inquiries = InquiryService::new(&repo);
    let open = inquiries.submit(&form("Cam", "Hello")).unwrap();
    let done = inquiries.submit(&form("Dee", "Hi")).unwrap();
    inquiries.resolve(done.meta.id, "agent-1", None).unwrap();

    let dashboard = DashboardService::new(&repo);
    let stats = dashboard.stats().unwrap();
    assert_eq!(stats.total_listings, 4);
    assert_eq!(stats.published_listings, 2);
    assert_eq!(stats.draft_listings, 1);
    assert_eq!(stats.archived_listings, 1);
    assert_eq!(stats.published_inventory_value, 750_000.0);
    assert_eq!(stats.total_views, 42);
    assert_eq!(stats.total_inquiries, 2);
    assert_eq!(stats.open_inquiries, 1);
    assert_eq!(stats.agents, 0);

    let top = dashboard.top_properties_by_views(1).unwrap();
    assert_eq!(top.len(), 1);
    assert_eq!(top[0].meta.id, popular.meta.id);
    assert!(!open.resolved);
}

#[test]
fn services_work_through_trait_objects() {
    let repo: Box<dyn ContentRepository> = Box::new(repo());
    repo.create_property(&published("Boxed", 1.0)).unwrap();
    let grid = ListingService::new(repo.as_ref()).published_listings(6, 0).unwrap();
    assert_eq!(grid.total, 1);
}

fn repo() -> SqliteContentRepository {
    SqliteContentRepository::open_in_memory().unwrap()
}

fn published(title: &str, price: f64) -> PropertyPatch {
    PropertyPatch {
        status: Some(ContentStatus::Published),
        ..draft(title, price)
    }
}

fn draft(title: &str, price: f64) -> PropertyPatch {
    PropertyPatch {
        title: Some(title.to_string()),
        price: Some(price),
        ..PropertyPatch::default()
    }
}

fn form(name: &str, message: &str) -> ContactForm {
    ContactForm {
        name: name.to_string(),
        email: format!("{}@example.com", name.to_ascii_lowercase()),
        message: message.to_string(),
        ..ContactForm::default()
    }
}
