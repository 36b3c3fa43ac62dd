//! SQLite binding of the content repository facade.
//!
//! # Responsibility
//! - Persist every collection as JSON documents in the `documents` table.
//! - Translate `QueryOptions` into parameterised SQL over `json_extract`.
//! - Store settings and uploaded files in their own tables.
//!
//! # Invariants
//! - Write paths validate the full merged record before any SQL mutation.
//! - Read paths reject invalid persisted rows instead of masking them.
//! - Field paths reach SQL only as bound parameters, never as SQL text.
//! - A mutation is one immediate transaction; the later commit wins.

use crate::config::MediaConfig;
use crate::db::{open_db, open_db_in_memory};
use crate::media::{MediaPolicy, StoredFile};
use crate::model::agent::{Agent, AgentPatch};
use crate::model::article::{Article, ArticlePatch, Testimonial, TestimonialPatch};
use crate::model::client::{Client, ClientPatch};
use crate::model::content::{now_epoch_ms, ContentType, EntityId};
use crate::model::entity::{apply_patch, build_entity, Entity};
use crate::model::inquiry::{Inquiry, InquiryPatch};
use crate::model::property::{Property, PropertyCounter, PropertyPatch};
use crate::model::settings::{SettingsPatch, SiteSettings};
use crate::model::validation::ValidationError;
use crate::query::{project, Collection, FilterOp, QueryOptions, SortDirection};
use crate::repo::content_repo::{ContentRepository, RepoError, RepoResult};
use crate::search::fts::{build_match_expression, map_query_error, search_documents, SearchHit, SearchQuery};
use log::{debug, info, warn};
use rusqlite::types::Value as SqlValue;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, TransactionBehavior};
use serde_json::Value;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

const FILE_COLLECTION: &str = "file";

/// Where the SQLite store lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqliteTarget {
    File(PathBuf),
    /// Private in-memory store; its data is lost on disconnect.
    Memory,
}

impl SqliteTarget {
    fn label(&self) -> &'static str {
        match self {
            Self::File(_) => "sqlite",
            Self::Memory => "memory",
        }
    }
}

/// SQLite-backed content repository.
///
/// The connection sits behind a mutex, so calls from many threads are
/// serialised.
pub struct SqliteContentRepository {
    target: SqliteTarget,
    media: MediaPolicy,
    conn: Mutex<Option<Connection>>,
}

impl SqliteContentRepository {
    /// Creates a disconnected repository; call `connect` before use.
    pub fn new(target: SqliteTarget, media: MediaPolicy) -> Self {
        Self {
            target,
            media,
            conn: Mutex::new(None),
        }
    }

    /// Opens a connected in-memory repository with the default media policy.
    pub fn open_in_memory() -> RepoResult<Self> {
        let repo = Self::new(
            SqliteTarget::Memory,
            MediaPolicy::new(&MediaConfig::default()),
        );
        repo.connect()?;
        Ok(repo)
    }

    /// Opens a connected file-backed repository with the default media policy.
    pub fn open_file(path: impl Into<PathBuf>) -> RepoResult<Self> {
        let repo = Self::new(
            SqliteTarget::File(path.into()),
            MediaPolicy::new(&MediaConfig::default()),
        );
        repo.connect()?;
        Ok(repo)
    }

    pub fn target(&self) -> &SqliteTarget {
        &self.target
    }

    fn lock(&self) -> RepoResult<MutexGuard<'_, Option<Connection>>> {
        self.conn
            .lock()
            .map_err(|_| RepoError::Connection("connection lock poisoned".to_string()))
    }

    fn with_conn<T>(&self, op: impl FnOnce(&mut Connection) -> RepoResult<T>) -> RepoResult<T> {
        let mut guard = self.lock()?;
        let conn = guard
            .as_mut()
            .ok_or_else(|| RepoError::Connection("repository is not connected".to_string()))?;
        op(conn)
    }

    /// Accepts a bare file id or a URL built by the media policy.
    fn resolve_file_id(&self, reference: &str) -> Option<Uuid> {
        let reference = reference.trim();
        let raw = self.media.file_id_from_url(reference).unwrap_or(reference);
        Uuid::parse_str(raw).ok()
    }
}

impl ContentRepository for SqliteContentRepository {
    fn connect(&self) -> RepoResult<()> {
        let mut guard = self.lock()?;
        if guard.is_some() {
            return Ok(());
        }

        let conn = match &self.target {
            SqliteTarget::File(path) => open_db(path)?,
            SqliteTarget::Memory => open_db_in_memory()?,
        };
        *guard = Some(conn);
        info!(
            "event=repo_connect module=repo status=ok backend={}",
            self.target.label()
        );
        Ok(())
    }

    fn disconnect(&self) -> RepoResult<()> {
        let mut guard = self.lock()?;
        let Some(conn) = guard.take() else {
            return Ok(());
        };
        if let Err((_, err)) = conn.close() {
            warn!(
                "event=repo_disconnect module=repo status=error backend={} error={}",
                self.target.label(),
                err
            );
            return Err(err.into());
        }
        info!(
            "event=repo_disconnect module=repo status=ok backend={}",
            self.target.label()
        );
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.lock().map(|guard| guard.is_some()).unwrap_or(false)
    }

    fn list_properties(&self, options: &QueryOptions) -> RepoResult<Collection<Property>> {
        self.with_conn(|conn| list_entities(conn, options))
    }

    fn get_property(&self, id: EntityId) -> RepoResult<Option<Property>> {
        self.with_conn(|conn| get_entity(conn, id))
    }

    fn get_property_by_slug(&self, slug: &str) -> RepoResult<Option<Property>> {
        self.with_conn(|conn| get_entity_by_slug(conn, slug))
    }

    fn create_property(&self, patch: &PropertyPatch) -> RepoResult<Property> {
        self.with_conn(|conn| create_entity::<Property>(conn, patch))
    }

    fn update_property(&self, id: EntityId, patch: &PropertyPatch) -> RepoResult<Property> {
        self.with_conn(|conn| update_entity::<Property>(conn, id, patch))
    }

    fn delete_property(&self, id: EntityId) -> RepoResult<()> {
        self.with_conn(|conn| delete_document(conn, ContentType::Property, id))
    }

    fn increment_property_counter(
        &self,
        id: EntityId,
        counter: PropertyCounter,
    ) -> RepoResult<Option<Property>> {
        self.with_conn(|conn| increment_counter(conn, id, counter))
    }

    fn list_agents(&self, options: &QueryOptions) -> RepoResult<Collection<Agent>> {
        self.with_conn(|conn| list_entities(conn, options))
    }

    fn get_agent(&self, id: EntityId) -> RepoResult<Option<Agent>> {
        self.with_conn(|conn| get_entity(conn, id))
    }

    fn get_agent_by_slug(&self, slug: &str) -> RepoResult<Option<Agent>> {
        self.with_conn(|conn| get_entity_by_slug(conn, slug))
    }

    fn create_agent(&self, patch: &AgentPatch) -> RepoResult<Agent> {
        self.with_conn(|conn| create_entity::<Agent>(conn, patch))
    }

    fn update_agent(&self, id: EntityId, patch: &AgentPatch) -> RepoResult<Agent> {
        self.with_conn(|conn| update_entity::<Agent>(conn, id, patch))
    }

    fn delete_agent(&self, id: EntityId) -> RepoResult<()> {
        self.with_conn(|conn| delete_document(conn, ContentType::Agent, id))
    }

    fn list_clients(&self, options: &QueryOptions) -> RepoResult<Collection<Client>> {
        self.with_conn(|conn| list_entities(conn, options))
    }

    fn get_client(&self, id: EntityId) -> RepoResult<Option<Client>> {
        self.with_conn(|conn| get_entity(conn, id))
    }

    fn create_client(&self, patch: &ClientPatch) -> RepoResult<Client> {
        self.with_conn(|conn| create_entity::<Client>(conn, patch))
    }

    fn update_client(&self, id: EntityId, patch: &ClientPatch) -> RepoResult<Client> {
        self.with_conn(|conn| update_entity::<Client>(conn, id, patch))
    }

    fn delete_client(&self, id: EntityId) -> RepoResult<()> {
        self.with_conn(|conn| delete_document(conn, ContentType::Client, id))
    }

    fn list_inquiries(&self, options: &QueryOptions) -> RepoResult<Collection<Inquiry>> {
        self.with_conn(|conn| list_entities(conn, options))
    }

    fn get_inquiry(&self, id: EntityId) -> RepoResult<Option<Inquiry>> {
        self.with_conn(|conn| get_entity(conn, id))
    }

    fn create_inquiry(&self, patch: &InquiryPatch) -> RepoResult<Inquiry> {
        self.with_conn(|conn| create_entity::<Inquiry>(conn, patch))
    }

    fn update_inquiry(&self, id: EntityId, patch: &InquiryPatch) -> RepoResult<Inquiry> {
        self.with_conn(|conn| update_entity::<Inquiry>(conn, id, patch))
    }

    fn delete_inquiry(&self, id: EntityId) -> RepoResult<()> {
        self.with_conn(|conn| delete_document(conn, ContentType::Inquiry, id))
    }

    fn list_articles(&self, options: &QueryOptions) -> RepoResult<Collection<Article>> {
        self.with_conn(|conn| list_entities(conn, options))
    }

    fn get_article(&self, id: EntityId) -> RepoResult<Option<Article>> {
        self.with_conn(|conn| get_entity(conn, id))
    }

    fn get_article_by_slug(&self, slug: &str) -> RepoResult<Option<Article>> {
        self.with_conn(|conn| get_entity_by_slug(conn, slug))
    }

    fn create_article(&self, patch: &ArticlePatch) -> RepoResult<Article> {
        self.with_conn(|conn| create_entity::<Article>(conn, patch))
    }

    fn update_article(&self, id: EntityId, patch: &ArticlePatch) -> RepoResult<Article> {
        self.with_conn(|conn| update_entity::<Article>(conn, id, patch))
    }

    fn delete_article(&self, id: EntityId) -> RepoResult<()> {
        self.with_conn(|conn| delete_document(conn, ContentType::Article, id))
    }

    fn list_testimonials(&self, options: &QueryOptions) -> RepoResult<Collection<Testimonial>> {
        self.with_conn(|conn| list_entities(conn, options))
    }

    fn get_testimonial(&self, id: EntityId) -> RepoResult<Option<Testimonial>> {
        self.with_conn(|conn| get_entity(conn, id))
    }

    fn create_testimonial(&self, patch: &TestimonialPatch) -> RepoResult<Testimonial> {
        self.with_conn(|conn| create_entity::<Testimonial>(conn, patch))
    }

    fn update_testimonial(
        &self,
        id: EntityId,
        patch: &TestimonialPatch,
    ) -> RepoResult<Testimonial> {
        self.with_conn(|conn| update_entity::<Testimonial>(conn, id, patch))
    }

    fn delete_testimonial(&self, id: EntityId) -> RepoResult<()> {
        self.with_conn(|conn| delete_document(conn, ContentType::Testimonial, id))
    }

    fn list_documents(
        &self,
        collection: ContentType,
        options: &QueryOptions,
    ) -> RepoResult<Collection<Value>> {
        self.with_conn(|conn| {
            let (bodies, total) = query_bodies(conn, collection, options)?;
            let mut items = Vec::with_capacity(bodies.len());
            for body in bodies {
                let record: Value = serde_json::from_str(&body).map_err(|err| {
                    RepoError::InvalidData(format!("{collection} body is not JSON: {err}"))
                })?;
                items.push(project(&record, &options.fields));
            }
            Ok(Collection::page_of(items, total, options))
        })
    }

    fn get_settings(&self) -> RepoResult<SiteSettings> {
        self.with_conn(|conn| load_settings(conn))
    }

    fn update_settings(&self, patch: &SettingsPatch) -> RepoResult<SiteSettings> {
        self.with_conn(|conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            let current = load_settings(&tx)?;
            let now = now_epoch_ms();
            let next = current.apply_patch(patch, now)?;
            let body = to_body(&next)?;
            tx.execute(
                "INSERT INTO site_settings (singleton, body, updated_at)
                 VALUES (1, ?1, ?2)
                 ON CONFLICT (singleton) DO UPDATE
                 SET body = excluded.body, updated_at = excluded.updated_at;",
                params![body, next.updated_at.unwrap_or(now)],
            )?;
            tx.commit()?;
            debug!("event=settings_update module=repo status=ok");
            Ok(next)
        })
    }

    fn upload_file(&self, data: &[u8], filename: Option<&str>) -> RepoResult<String> {
        self.with_conn(|conn| {
            let accepted = self.media.check(data, filename).map_err(|err| {
                debug!(
                    "event=file_upload module=repo status=rejected size={} error={}",
                    data.len(),
                    err
                );
                err
            })?;
            let file_id = Uuid::new_v4().to_string();
            conn.execute(
                "INSERT INTO media_files (id, filename, mime_type, size_bytes, data, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
                params![
                    file_id,
                    accepted.filename,
                    accepted.mime_type,
                    accepted.size_bytes as i64,
                    data,
                    now_epoch_ms(),
                ],
            )?;
            debug!(
                "event=file_upload module=repo status=ok id={} mime={} size={}",
                file_id, accepted.mime_type, accepted.size_bytes
            );
            Ok(self.media.file_url(&file_id, &accepted.filename))
        })
    }

    fn get_file(&self, file_id: &str) -> RepoResult<Option<StoredFile>> {
        self.with_conn(|conn| {
            let Some(id) = self.resolve_file_id(file_id) else {
                return Ok(None);
            };
            let file = conn
                .query_row(
                    "SELECT id, filename, mime_type, size_bytes, data, created_at
                     FROM media_files
                     WHERE id = ?1;",
                    [id.to_string()],
                    |row| {
                        let id: String = row.get("id")?;
                        let filename: String = row.get("filename")?;
                        let size_bytes: i64 = row.get("size_bytes")?;
                        Ok(StoredFile {
                            url: self.media.file_url(&id, &filename),
                            id,
                            filename,
                            mime_type: row.get("mime_type")?,
                            size_bytes: size_bytes.max(0) as u64,
                            created_at: row.get("created_at")?,
                            data: row.get("data")?,
                        })
                    },
                )
                .optional()?;
            Ok(file)
        })
    }

    fn delete_file(&self, file_id: &str) -> RepoResult<()> {
        self.with_conn(|conn| {
            let not_found = || RepoError::NotFound {
                collection: FILE_COLLECTION,
                id: file_id.to_string(),
            };
            let id = self.resolve_file_id(file_id).ok_or_else(not_found)?;
            let changed = conn.execute("DELETE FROM media_files WHERE id = ?1;", [id.to_string()])?;
            if changed == 0 {
                return Err(not_found());
            }
            debug!("event=file_delete module=repo status=ok id={id}");
            Ok(())
        })
    }

    fn search(
        &self,
        query: &str,
        collections: Option<&[ContentType]>,
    ) -> RepoResult<Vec<SearchHit>> {
        self.with_conn(|conn| {
            let mut search = SearchQuery::new(query);
            search.collections = collections.map(<[ContentType]>::to_vec).unwrap_or_default();
            Ok(search_documents(conn, &search)?)
        })
    }
}

fn list_entities<E: Entity>(conn: &Connection, options: &QueryOptions) -> RepoResult<Collection<E>> {
    let (bodies, total) = query_bodies(conn, E::CONTENT_TYPE, options)?;
    let items = bodies
        .iter()
        .map(|body| decode_entity::<E>(body))
        .collect::<RepoResult<Vec<_>>>()?;
    Ok(Collection::page_of(items, total, options))
}

fn get_entity<E: Entity>(conn: &Connection, id: EntityId) -> RepoResult<Option<E>> {
    let body: Option<String> = conn
        .query_row(
            "SELECT body FROM documents WHERE collection = ?1 AND id = ?2;",
            params![E::CONTENT_TYPE.as_str(), id.to_string()],
            |row| row.get(0),
        )
        .optional()?;
    body.map(|body| decode_entity::<E>(&body)).transpose()
}

fn get_entity_by_slug<E: Entity>(conn: &Connection, slug: &str) -> RepoResult<Option<E>> {
    let body: Option<String> = conn
        .query_row(
            "SELECT body FROM documents WHERE collection = ?1 AND slug = ?2;",
            params![E::CONTENT_TYPE.as_str(), slug],
            |row| row.get(0),
        )
        .optional()?;
    body.map(|body| decode_entity::<E>(&body)).transpose()
}

fn create_entity<E: Entity>(conn: &mut Connection, patch: &E::Patch) -> RepoResult<E> {
    let entity = build_entity::<E>(patch, Uuid::new_v4(), now_epoch_ms())?;
    let body = to_body(&entity)?;

    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    ensure_slug_available(&tx, E::CONTENT_TYPE, entity.slug(), None)?;
    let meta = entity.meta();
    tx.execute(
        "INSERT INTO documents (
            collection,
            id,
            slug,
            status,
            title,
            search_text,
            body,
            created_at,
            updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9);",
        params![
            E::CONTENT_TYPE.as_str(),
            meta.id.to_string(),
            entity.slug(),
            meta.status.as_str(),
            entity.display_title(),
            entity.search_text(),
            body,
            meta.created_at,
            meta.updated_at,
        ],
    )?;
    tx.commit()?;

    debug!(
        "event=content_create module=repo status=ok collection={} id={}",
        E::CONTENT_TYPE,
        meta.id
    );
    Ok(entity)
}

fn update_entity<E: Entity>(
    conn: &mut Connection,
    id: EntityId,
    patch: &E::Patch,
) -> RepoResult<E> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let current = get_entity::<E>(&tx, id)?
        .ok_or_else(|| RepoError::not_found(E::CONTENT_TYPE, id))?;
    let next = apply_patch(&current, patch, now_epoch_ms())?;
    ensure_slug_available(&tx, E::CONTENT_TYPE, next.slug(), Some(id))?;

    let meta = next.meta();
    tx.execute(
        "UPDATE documents
         SET
            slug = ?1,
            status = ?2,
            title = ?3,
            search_text = ?4,
            body = ?5,
            updated_at = ?6
         WHERE collection = ?7 AND id = ?8;",
        params![
            next.slug(),
            meta.status.as_str(),
            next.display_title(),
            next.search_text(),
            to_body(&next)?,
            meta.updated_at,
            E::CONTENT_TYPE.as_str(),
            id.to_string(),
        ],
    )?;
    tx.commit()?;

    debug!(
        "event=content_update module=repo status=ok collection={} id={}",
        E::CONTENT_TYPE,
        id
    );
    Ok(next)
}

fn increment_counter(
    conn: &mut Connection,
    id: EntityId,
    counter: PropertyCounter,
) -> RepoResult<Option<Property>> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let Some(mut property) = get_entity::<Property>(&tx, id)? else {
        return Ok(None);
    };
    let slot = match counter {
        PropertyCounter::Views => &mut property.views,
        PropertyCounter::Inquiries => &mut property.inquiries,
    };
    *slot = slot.saturating_add(1);

    tx.execute(
        "UPDATE documents SET body = ?1 WHERE collection = ?2 AND id = ?3;",
        params![
            to_body(&property)?,
            ContentType::Property.as_str(),
            id.to_string(),
        ],
    )?;
    tx.commit()?;

    debug!(
        "event=counter_increment module=repo status=ok id={} counter={}",
        id,
        counter.as_str()
    );
    Ok(Some(property))
}

fn delete_document(conn: &Connection, collection: ContentType, id: EntityId) -> RepoResult<()> {
    let changed = conn.execute(
        "DELETE FROM documents WHERE collection = ?1 AND id = ?2;",
        params![collection.as_str(), id.to_string()],
    )?;
    if changed == 0 {
        return Err(RepoError::not_found(collection, id));
    }

    debug!("event=content_delete module=repo status=ok collection={collection} id={id}");
    Ok(())
}

fn ensure_slug_available(
    conn: &Connection,
    collection: ContentType,
    slug: Option<&str>,
    own_id: Option<EntityId>,
) -> RepoResult<()> {
    let Some(slug) = slug else {
        return Ok(());
    };
    let holder: Option<String> = conn
        .query_row(
            "SELECT id FROM documents WHERE collection = ?1 AND slug = ?2;",
            params![collection.as_str(), slug],
            |row| row.get(0),
        )
        .optional()?;

    match holder {
        Some(ref holder) if own_id.map(|id| id.to_string()).as_ref() != Some(holder) => {
            Err(ValidationError::DuplicateSlug {
                collection,
                slug: slug.to_string(),
            }
            .into())
        }
        _ => Ok(()),
    }
}

fn load_settings(conn: &Connection) -> RepoResult<SiteSettings> {
    let body: Option<String> = conn
        .query_row(
            "SELECT body FROM site_settings WHERE singleton = 1;",
            [],
            |row| row.get(0),
        )
        .optional()?;
    match body {
        Some(body) => serde_json::from_str(&body)
            .map_err(|err| RepoError::InvalidData(format!("invalid site settings body: {err}"))),
        None => Ok(SiteSettings::default()),
    }
}

fn decode_entity<E: Entity>(body: &str) -> RepoResult<E> {
    let entity: E = serde_json::from_str(body).map_err(|err| {
        RepoError::InvalidData(format!("invalid {} body: {err}", E::CONTENT_TYPE))
    })?;
    entity.validate().map_err(|err| {
        RepoError::InvalidData(format!(
            "stored {} {} fails validation: {err}",
            E::CONTENT_TYPE,
            entity.id()
        ))
    })?;
    Ok(entity)
}

fn to_body<T: serde::Serialize>(record: &T) -> RepoResult<String> {
    serde_json::to_string(record)
        .map_err(|err| RepoError::InvalidData(format!("cannot encode record: {err}")))
}

/// Runs the count and page queries for one collection.
///
/// Returns the page's JSON bodies and the total number of matches.
fn query_bodies(
    conn: &Connection,
    collection: ContentType,
    options: &QueryOptions,
) -> RepoResult<(Vec<String>, u64)> {
    options.validate()?;

    let mut where_sql = String::from(" WHERE d.collection = ?");
    let mut bind_values = vec![SqlValue::Text(collection.as_str().to_string())];

    for (field, condition) in &options.filter {
        push_filter(&mut where_sql, &mut bind_values, field, &condition.as_op());
    }

    let match_expr = options.search.as_deref().and_then(build_match_expression);
    if let Some(expr) = &match_expr {
        where_sql.push_str(
            " AND d.seq IN (SELECT rowid FROM documents_fts WHERE documents_fts MATCH ?)",
        );
        bind_values.push(SqlValue::Text(expr.clone()));
    }
    let map_err = |err: rusqlite::Error| -> RepoError {
        match &match_expr {
            Some(expr) => map_query_error(err, expr).into(),
            None => err.into(),
        }
    };

    let total: i64 = conn
        .query_row(
            &format!("SELECT COUNT(*) FROM documents d{where_sql}"),
            params_from_iter(bind_values.iter()),
            |row| row.get(0),
        )
        .map_err(map_err)?;

    let mut sql = format!("SELECT d.body FROM documents d{where_sql} ORDER BY ");
    if options.sort.is_empty() {
        sql.push_str("d.created_at DESC, d.id ASC");
    } else {
        for key in &options.sort {
            let direction = match key.direction {
                SortDirection::Asc => "ASC",
                SortDirection::Desc => "DESC",
            };
            sql.push_str(&format!("json_extract(d.body, ?) {direction}, "));
            bind_values.push(json_path(&key.field));
        }
        sql.push_str("d.id ASC");
    }

    match options.limit {
        Some(limit) => {
            sql.push_str(" LIMIT ? OFFSET ?");
            bind_values.push(SqlValue::Integer(i64::from(limit)));
            bind_values.push(SqlValue::Integer(i64::from(options.offset)));
        }
        None if options.offset > 0 => {
            sql.push_str(" LIMIT -1 OFFSET ?");
            bind_values.push(SqlValue::Integer(i64::from(options.offset)));
        }
        None => {}
    }

    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query(params_from_iter(bind_values)).map_err(map_err)?;
    let mut bodies = Vec::new();
    while let Some(row) = rows.next().map_err(map_err)? {
        bodies.push(row.get::<_, String>(0)?);
    }

    Ok((bodies, total.max(0) as u64))
}

/// Appends one `AND` clause for a validated filter.
fn push_filter(sql: &mut String, binds: &mut Vec<SqlValue>, field: &str, op: &FilterOp) {
    let path = json_path(field);
    match op {
        FilterOp::Eq(Value::Null) | FilterOp::Null(true) => {
            sql.push_str(" AND json_extract(d.body, ?) IS NULL");
            binds.push(path);
        }
        FilterOp::Null(false) => {
            sql.push_str(" AND json_extract(d.body, ?) IS NOT NULL");
            binds.push(path);
        }
        FilterOp::Eq(value) => push_compare(sql, binds, path, "=", value),
        // Absent fields count as "not equal".
        FilterOp::Ne(value) => push_compare(sql, binds, path, "IS NOT", value),
        FilterOp::Gt(value) => push_compare(sql, binds, path, ">", value),
        FilterOp::Gte(value) => push_compare(sql, binds, path, ">=", value),
        FilterOp::Lt(value) => push_compare(sql, binds, path, "<", value),
        FilterOp::Lte(value) => push_compare(sql, binds, path, "<=", value),
        FilterOp::In(values) => {
            let concrete = values.iter().filter(|value| !value.is_null()).collect::<Vec<_>>();
            let with_null = concrete.len() != values.len();
            let mut clauses = Vec::new();
            if !concrete.is_empty() {
                clauses.push(format!(
                    "json_extract(d.body, ?) IN ({})",
                    vec!["?"; concrete.len()].join(", ")
                ));
                binds.push(path.clone());
                binds.extend(concrete.into_iter().map(sql_value));
            }
            if with_null {
                clauses.push("json_extract(d.body, ?) IS NULL".to_string());
                binds.push(path);
            }
            if clauses.is_empty() {
                sql.push_str(" AND 0");
            } else {
                sql.push_str(&format!(" AND ({})", clauses.join(" OR ")));
            }
        }
        FilterOp::Contains(value) => {
            sql.push_str(
                " AND (CASE json_type(d.body, ?)
                    WHEN 'array' THEN EXISTS (
                        SELECT 1 FROM json_each(d.body, ?) AS item WHERE item.value = ?
                    )
                    WHEN 'text' THEN instr(json_extract(d.body, ?), ?) > 0
                    ELSE 0
                 END)",
            );
            let needle = match value {
                Value::String(text) => text.clone(),
                other => other.to_string(),
            };
            binds.push(path.clone());
            binds.push(path.clone());
            binds.push(sql_value(value));
            binds.push(path);
            binds.push(SqlValue::Text(needle));
        }
    }
}

fn push_compare(
    sql: &mut String,
    binds: &mut Vec<SqlValue>,
    path: SqlValue,
    operator: &str,
    value: &Value,
) {
    sql.push_str(&format!(" AND json_extract(d.body, ?) {operator} ?"));
    binds.push(path);
    binds.push(sql_value(value));
}

fn json_path(field: &str) -> SqlValue {
    SqlValue::Text(format!("$.{field}"))
}

/// Maps a JSON scalar to the value `json_extract` yields for it.
fn sql_value(value: &Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Bool(flag) => SqlValue::Integer(i64::from(*flag)),
        Value::Number(number) => match number.as_i64() {
            Some(integer) => SqlValue::Integer(integer),
            None => number.as_f64().map_or(SqlValue::Null, SqlValue::Real),
        },
        Value::String(text) => SqlValue::Text(text.clone()),
        other => SqlValue::Text(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::{push_filter, sql_value, SqlValue};
    use crate::query::FilterOp;
    use serde_json::json;

    #[test]
    fn booleans_bind_as_integers() {
        assert_eq!(sql_value(&json!(true)), SqlValue::Integer(1));
        assert_eq!(sql_value(&json!(2.5)), SqlValue::Real(2.5));
        assert_eq!(sql_value(&json!("sale")), SqlValue::Text("sale".to_string()));
    }

    #[test]
    fn filter_paths_are_bound_not_inlined() {
        let mut sql = String::new();
        let mut binds = Vec::new();
        push_filter(&mut sql, &mut binds, "address.city", &FilterOp::Eq(json!("Austin")));
        assert_eq!(sql, " AND json_extract(d.body, ?) = ?");
        assert_eq!(
            binds,
            vec![
                SqlValue::Text("$.address.city".to_string()),
                SqlValue::Text("Austin".to_string())
            ]
        );
    }

    #[test]
    fn empty_in_list_matches_nothing() {
        let mut sql = String::new();
        let mut binds = Vec::new();
        push_filter(&mut sql, &mut binds, "status", &FilterOp::In(Vec::new()));
        assert_eq!(sql, " AND 0");
        assert!(binds.is_empty());
    }
}
