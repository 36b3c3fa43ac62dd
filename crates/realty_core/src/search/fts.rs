//! SQLite FTS5-based search implementation.
//!
//! # Responsibility
//! - Provide keyword search over document titles and searchable text.
//! - Return typed hits with collection and stable id.
//!
//! # Invariants
//! - Result ordering is deterministic: `bm25` rank, then `updated_at DESC`,
//!   then `id ASC`.
//! - User text is quoted term by term, so FTS syntax in input is inert.

use crate::db::DbError;
use crate::model::content::{ContentType, EntityId};
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, Row};
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Result type for search APIs.
pub type SearchResult<T> = Result<T, SearchError>;

/// Search-layer error for query parsing, DB interaction and result decoding.
#[derive(Debug)]
pub enum SearchError {
    /// Query could not be parsed by FTS5.
    InvalidQuery { query: String, message: String },
    Db(DbError),
    InvalidData(String),
}

impl Display for SearchError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidQuery { query, message } => {
                write!(f, "invalid full-text query `{query}`: {message}")
            }
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid search row: {message}"),
        }
    }
}

impl Error for SearchError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidQuery { .. } => None,
            Self::Db(err) => Some(err),
            Self::InvalidData(_) => None,
        }
    }
}

impl From<rusqlite::Error> for SearchError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Search options for full-text queries.
#[derive(Debug, Clone)]
pub struct SearchQuery {
    pub text: String,
    /// Collections to search. Empty means all.
    pub collections: Vec<ContentType>,
    pub limit: u32,
}

impl SearchQuery {
    /// Creates a query over all collections with the default limit.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            collections: Vec::new(),
            limit: 20,
        }
    }
}

/// Single search hit returned by [`search_documents`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchHit {
    pub collection: ContentType,
    pub id: EntityId,
    pub title: String,
    /// Matching excerpt with terms wrapped in `[` `]`.
    pub snippet: String,
}

/// Searches documents via FTS5 and returns ranked results.
///
/// Returns an empty list for blank queries or a zero limit.
pub fn search_documents(conn: &Connection, query: &SearchQuery) -> SearchResult<Vec<SearchHit>> {
    let Some(match_expr) = build_match_expression(&query.text) else {
        return Ok(Vec::new());
    };

    if query.limit == 0 {
        return Ok(Vec::new());
    }

    let mut sql = String::from(
        "SELECT
            documents.collection AS collection,
            documents.id AS id,
            documents.title AS title,
            snippet(documents_fts, -1, '[', ']', ' ... ', 10) AS snippet
         FROM documents_fts
         JOIN documents ON documents.seq = documents_fts.rowid
         WHERE documents_fts MATCH ?",
    );
    let mut bind_values: Vec<Value> = vec![Value::Text(match_expr.clone())];

    if !query.collections.is_empty() {
        let placeholders = vec!["?"; query.collections.len()].join(", ");
        sql.push_str(&format!(" AND documents.collection IN ({placeholders})"));
        bind_values.extend(
            query
                .collections
                .iter()
                .map(|kind| Value::Text(kind.as_str().to_string())),
        );
    }

    sql.push_str(
        " ORDER BY bm25(documents_fts), documents.updated_at DESC, documents.id ASC LIMIT ?",
    );
    bind_values.push(Value::Integer(i64::from(query.limit)));

    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt
        .query(params_from_iter(bind_values))
        .map_err(|err| map_query_error(err, &match_expr))?;
    let mut hits = Vec::new();

    while let Some(row) = rows
        .next()
        .map_err(|err| map_query_error(err, &match_expr))?
    {
        hits.push(parse_search_hit(row)?);
    }

    Ok(hits)
}

/// Builds an FTS5 MATCH expression that ANDs every whitespace-separated term.
///
/// Terms without an alphanumeric character never match a token, so they are
/// dropped. Returns `None` when no term is left.
pub fn build_match_expression(text: &str) -> Option<String> {
    let terms = text
        .split_whitespace()
        .filter(|term| term.chars().any(char::is_alphanumeric))
        .map(escape_fts_term)
        .collect::<Vec<_>>();

    if terms.is_empty() {
        return None;
    }

    Some(terms.join(" AND "))
}

fn parse_search_hit(row: &Row<'_>) -> SearchResult<SearchHit> {
    let collection_text: String = row.get("collection")?;
    let collection = ContentType::parse(&collection_text).ok_or_else(|| {
        SearchError::InvalidData(format!("invalid collection `{collection_text}`"))
    })?;

    let id_text: String = row.get("id")?;
    let id = Uuid::parse_str(&id_text)
        .map_err(|_| SearchError::InvalidData(format!("invalid id `{id_text}`")))?;

    Ok(SearchHit {
        collection,
        id,
        title: row.get("title")?,
        snippet: row.get("snippet")?,
    })
}

/// Quotes a term and adds a prefix marker so partial words still match.
fn escape_fts_term(raw: &str) -> String {
    let escaped = raw.replace('"', "\"\"");
    format!("\"{escaped}\"*")
}

pub(crate) fn map_query_error(err: rusqlite::Error, query: &str) -> SearchError {
    if is_match_syntax_error(&err) {
        return SearchError::InvalidQuery {
            query: query.to_string(),
            message: err.to_string(),
        };
    }

    SearchError::Db(DbError::Sqlite(err))
}

fn is_match_syntax_error(err: &rusqlite::Error) -> bool {
    match err {
        rusqlite::Error::SqliteFailure(_, Some(message)) => {
            let msg = message.to_lowercase();
            (msg.contains("fts5") && msg.contains("syntax"))
                || msg.contains("malformed match expression")
                || msg.contains("unterminated")
        }
        _ => false,
    }
}
