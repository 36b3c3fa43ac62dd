use realty_core::config::MediaConfig;
use realty_core::media::MediaPolicy;
use realty_core::model::property::PropertyPatch;
use realty_core::repo::SqliteTarget;
use realty_core::{
    open_repository, BackendConfig, ContentRepository, CoreConfig, QueryOptions, RepoError,
    SqliteContentRepository,
};
use std::sync::Arc;
use std::thread;
use uuid::Uuid;

#[test]
fn new_repository_starts_disconnected() {
    let repo = SqliteContentRepository::new(
        SqliteTarget::Memory,
        MediaPolicy::new(&MediaConfig::default()),
    );
    assert!(!repo.is_connected());

    let err = repo.get_property(Uuid::new_v4()).unwrap_err();
    assert!(matches!(err, RepoError::Connection(_)), "unexpected error: {err}");
    assert!(matches!(
        repo.list_properties(&QueryOptions::new()),
        Err(RepoError::Connection(_))
    ));
    assert!(matches!(repo.get_settings(), Err(RepoError::Connection(_))));
    assert!(matches!(
        repo.upload_file(b"%PDF-1.7", None),
        Err(RepoError::Connection(_))
    ));
}

#[test]
fn connect_and_disconnect_are_idempotent() {
    let repo = SqliteContentRepository::open_in_memory().unwrap();
    assert!(repo.is_connected());
    repo.connect().unwrap();
    assert!(repo.is_connected());

    repo.disconnect().unwrap();
    assert!(!repo.is_connected());
    repo.disconnect().unwrap();
    assert!(matches!(
        repo.create_property(&listing("Closed")),
        Err(RepoError::Connection(_))
    ));
}

#[test]
fn file_store_survives_reconnect() {
    let dir = tempfile::tempdir().unwrap();
    let repo = SqliteContentRepository::open_file(dir.path().join("content.db")).unwrap();
    let created = repo.create_property(&listing("Persistent Loft")).unwrap();

    repo.disconnect().unwrap();
    repo.connect().unwrap();

    let fetched = repo.get_property(created.meta.id).unwrap().unwrap();
    assert_eq!(fetched, created);
}

#[test]
fn memory_store_loses_data_on_disconnect() {
    let repo = SqliteContentRepository::open_in_memory().unwrap();
    let created = repo.create_property(&listing("Ephemeral")).unwrap();

    repo.disconnect().unwrap();
    repo.connect().unwrap();

    assert!(repo.get_property(created.meta.id).unwrap().is_none());
    assert_eq!(repo.list_properties(&QueryOptions::new()).unwrap().total, 0);
}

#[test]
fn factory_opens_sqlite_file_backend() {
    let dir = tempfile::tempdir().unwrap();
    let config = CoreConfig {
        backend: BackendConfig::sqlite(dir.path().join("data").join("site.db")),
        ..CoreConfig::default()
    };

    let repo = open_repository(&config).unwrap();
    assert!(repo.is_connected());
    let created = repo.create_property(&listing("Factory Made")).unwrap();
    drop(repo);

    let reopened = open_repository(&config).unwrap();
    assert_eq!(
        reopened
            .get_property_by_slug("factory-made")
            .unwrap()
            .unwrap()
            .meta
            .id,
        created.meta.id
    );
}

#[test]
fn concurrent_writers_are_serialised() {
    let repo = Arc::new(SqliteContentRepository::open_in_memory().unwrap());
    let target = repo.create_property(&listing("Busy Listing")).unwrap();

    let handles = (0..8)
        .map(|worker| {
            let repo = Arc::clone(&repo);
            thread::spawn(move || {
                repo.create_property(&listing(&format!("Worker {worker}")))
                    .unwrap();
                repo.update_property(
                    target.meta.id,
                    &PropertyPatch {
                        views: Some(worker),
                        ..PropertyPatch::default()
                    },
                )
                .unwrap()
            })
        })
        .collect::<Vec<_>>();

    let results = handles
        .into_iter()
        .map(|handle| handle.join().unwrap())
        .collect::<Vec<_>>();

    assert_eq!(repo.list_properties(&QueryOptions::new()).unwrap().total, 9);

    // The stored record is the one from the last committed update.
    let last = results
        .iter()
        .max_by_key(|property| property.meta.updated_at)
        .unwrap();
    let stored = repo.get_property(target.meta.id).unwrap().unwrap();
    assert_eq!(stored.views, last.views);

    let mut stamps = results
        .iter()
        .map(|property| property.meta.updated_at)
        .collect::<Vec<_>>();
    stamps.sort_unstable();
    stamps.dedup();
    assert_eq!(stamps.len(), results.len());
}

fn listing(title: &str) -> PropertyPatch {
    PropertyPatch {
        title: Some(title.to_string()),
        price: Some(310_000.0),
        ..PropertyPatch::default()
    }
}
