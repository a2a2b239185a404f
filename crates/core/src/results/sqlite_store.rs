//! SQLite-backed result sink.

use std::path::Path;
use std::sync::Mutex;

use chrono::SecondsFormat;
use rusqlite::{params, Connection, OptionalExtension};

use super::{JobResult, ResultError, ResultFilter, ResultSink};

/// SQLite-backed result sink. One row per job id holding the JSON payload.
pub struct SqliteResultSink {
    conn: Mutex<Connection>,
}

impl SqliteResultSink {
    /// Open the database at `path`, creating the file and tables if needed.
    pub fn new(path: &Path) -> Result<Self, ResultError> {
        let conn = Connection::open(path).map_err(|e| ResultError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory sink (useful for testing).
    pub fn in_memory() -> Result<Self, ResultError> {
        let conn =
            Connection::open_in_memory().map_err(|e| ResultError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), ResultError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS job_results (
                id TEXT PRIMARY KEY,
                source_url TEXT NOT NULL,
                status TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                payload TEXT NOT NULL,
                search_text TEXT NOT NULL DEFAULT ''
            );

            CREATE INDEX IF NOT EXISTS idx_job_results_status ON job_results(status);
            CREATE INDEX IF NOT EXISTS idx_job_results_created_at ON job_results(created_at DESC);
            "#,
        )
        .map_err(|e| ResultError::Database(e.to_string()))
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn build_where_clause(filter: &ResultFilter) -> (String, Vec<Box<dyn rusqlite::ToSql>>) {
        let mut conditions = Vec::new();
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(status) = filter.status {
            conditions.push("status = ?");
            params.push(Box::new(status.as_str().to_string()));
        }

        if let Some(search) = filter.search.as_deref().map(str::trim) {
            if !search.is_empty() {
                conditions.push("search_text LIKE ? ESCAPE '\\'");
                params.push(Box::new(format!("%{}%", escape_like(&search.to_lowercase()))));
            }
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        (where_clause, params)
    }

    fn decode(payload: &str) -> Result<JobResult, ResultError> {
        serde_json::from_str(payload).map_err(|e| ResultError::Serialization(e.to_string()))
    }
}

fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

impl ResultSink for SqliteResultSink {
    fn write(&self, result: &JobResult) -> Result<(), ResultError> {
        let payload =
            serde_json::to_string(result).map_err(|e| ResultError::Serialization(e.to_string()))?;
        let conn = self.lock();

        conn.execute(
            r#"INSERT INTO job_results (id, source_url, status, created_at, updated_at, payload, search_text)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
               ON CONFLICT(id) DO UPDATE SET
                   source_url = excluded.source_url,
                   status = excluded.status,
                   created_at = excluded.created_at,
                   updated_at = excluded.updated_at,
                   payload = excluded.payload,
                   search_text = excluded.search_text"#,
            params![
                result.id,
                result.source_url,
                result.status.as_str(),
                result
                    .created_at
                    .to_rfc3339_opts(SecondsFormat::Micros, true),
                result
                    .updated_at
                    .to_rfc3339_opts(SecondsFormat::Micros, true),
                payload,
                result.search_text(),
            ],
        )
        .map_err(|e| ResultError::Database(e.to_string()))?;

        Ok(())
    }

    fn read(&self, id: &str) -> Result<Option<JobResult>, ResultError> {
        let conn = self.lock();
        let payload: Option<String> = conn
            .query_row(
                "SELECT payload FROM job_results WHERE id = ?",
                params![id],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| ResultError::Database(e.to_string()))?;

        payload.as_deref().map(Self::decode).transpose()
    }

    fn delete(&self, id: &str) -> Result<bool, ResultError> {
        let conn = self.lock();
        let deleted = conn
            .execute("DELETE FROM job_results WHERE id = ?", params![id])
            .map_err(|e| ResultError::Database(e.to_string()))?;
        Ok(deleted > 0)
    }

    fn list(&self, filter: &ResultFilter) -> Result<Vec<JobResult>, ResultError> {
        let conn = self.lock();
        let (where_clause, mut params) = Self::build_where_clause(filter);

        let sql = format!(
            "SELECT payload FROM job_results {} ORDER BY created_at DESC, rowid DESC LIMIT ? OFFSET ?",
            where_clause
        );
        params.push(Box::new(filter.limit));
        params.push(Box::new(filter.offset));

        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| ResultError::Database(e.to_string()))?;
        let param_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();

        let payloads = stmt
            .query_map(param_refs.as_slice(), |row| row.get::<_, String>(0))
            .map_err(|e| ResultError::Database(e.to_string()))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| ResultError::Database(e.to_string()))?;

        payloads.iter().map(|p| Self::decode(p)).collect()
    }

    fn count(&self, filter: &ResultFilter) -> Result<i64, ResultError> {
        let conn = self.lock();
        let (where_clause, params) = Self::build_where_clause(filter);

        let sql = format!("SELECT COUNT(*) FROM job_results {}", where_clause);
        let param_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();

        conn.query_row(&sql, param_refs.as_slice(), |row| row.get(0))
            .map_err(|e| ResultError::Database(e.to_string()))
    }
}
