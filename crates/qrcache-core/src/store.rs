//! SQLite persistence for previous query results.

use crate::query::BuiltQuery;
use crate::{QueryCacheError, Result};
use qrcache_types::{EntityId, KeyKind, QueryKey};
use rusqlite::types::{Type, Value as SqlValue};
use rusqlite::{params, params_from_iter, Connection, Row, Transaction};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

/// Table holding one row per (session, query key, entity id).
pub const RESULT_TABLE: &str = "SYS_QUERY_RESULT";

/// SQLite-based store for persisted result key sets.
pub struct QueryResultStore {
    conn: Mutex<Connection>,
}

impl QueryResultStore {
    /// Open or create the database at the given path.
    pub fn open(path: &Path) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    /// Create a store from an existing connection, e.g. one that already holds entity tables.
    pub fn from_connection(conn: Connection) -> Result<Self> {
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> Result<()> {
        let conn = self.lock();
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS SYS_QUERY_RESULT (
                ID INTEGER PRIMARY KEY AUTOINCREMENT,
                SESSION_ID TEXT NOT NULL,
                QUERY_KEY INTEGER NOT NULL,
                ENTITY_ID TEXT,
                STRING_ENTITY_ID TEXT,
                INT_ENTITY_ID INTEGER,
                LONG_ENTITY_ID INTEGER
            );

            CREATE INDEX IF NOT EXISTS IDX_SYS_QUERY_RESULT_SESSION_KEY
                ON SYS_QUERY_RESULT(SESSION_ID, QUERY_KEY);
            CREATE INDEX IF NOT EXISTS IDX_SYS_QUERY_RESULT_ENTITY_SESSION_KEY
                ON SYS_QUERY_RESULT(ENTITY_ID, SESSION_ID, QUERY_KEY);
            CREATE INDEX IF NOT EXISTS IDX_SYS_QUERY_RESULT_SENTITY_SESSION_KEY
                ON SYS_QUERY_RESULT(STRING_ENTITY_ID, SESSION_ID, QUERY_KEY);
            CREATE INDEX IF NOT EXISTS IDX_SYS_QUERY_RESULT_IENTITY_SESSION_KEY
                ON SYS_QUERY_RESULT(INT_ENTITY_ID, SESSION_ID, QUERY_KEY);
            CREATE INDEX IF NOT EXISTS IDX_SYS_QUERY_RESULT_LENTITY_SESSION_KEY
                ON SYS_QUERY_RESULT(LONG_ENTITY_ID, SESSION_ID, QUERY_KEY);
            "#,
        )?;
        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Run raw SQL against the underlying database (entity schema setup, seeding).
    pub fn execute_batch(&self, sql: &str) -> Result<()> {
        self.lock().execute_batch(sql)?;
        Ok(())
    }

    /// Run a rewritten id query in its own transaction.
    pub fn fetch_ids(&self, query: &BuiltQuery, kind: KeyKind) -> Result<Vec<EntityId>> {
        let mut conn = self.lock();
        let tx = conn.transaction()?;
        let ids = {
            let mut stmt = tx.prepare(&query.sql)?;
            for (name, value) in &query.params {
                if let Some(index) = stmt.parameter_index(name)? {
                    stmt.raw_bind_parameter(index, value)?;
                }
            }
            let mut rows = stmt.raw_query();
            let mut ids = Vec::new();
            while let Some(row) = rows.next()? {
                ids.push(read_id(row, 0, kind)?);
            }
            ids
        };
        tx.commit()?;
        Ok(ids)
    }

    /// Insert ids for (session, query key) in batches, all in one transaction.
    pub fn insert(
        &self,
        session_id: Uuid,
        query_key: QueryKey,
        ids: &[EntityId],
        batch_size: usize,
    ) -> Result<usize> {
        let Some(kind) = KeyKind::resolve(ids)? else {
            return Ok(0);
        };
        let mut conn = self.lock();
        let tx = conn.transaction()?;
        let inserted = insert_batches(&tx, session_id, query_key, kind, ids, batch_size)?;
        tx.commit()?;
        Ok(inserted)
    }

    /// Replace the ids of (session, query key) atomically.
    pub fn replace(
        &self,
        session_id: Uuid,
        query_key: QueryKey,
        ids: &[EntityId],
        batch_size: usize,
    ) -> Result<usize> {
        let kind = KeyKind::resolve(ids)?;
        let mut conn = self.lock();
        let tx = conn.transaction()?;
        tx.execute(
            "DELETE FROM SYS_QUERY_RESULT WHERE SESSION_ID = ?1 AND QUERY_KEY = ?2",
            params![session_id.to_string(), query_key],
        )?;
        let inserted = match kind {
            Some(kind) => insert_batches(&tx, session_id, query_key, kind, ids, batch_size)?,
            None => 0,
        };
        tx.commit()?;
        Ok(inserted)
    }

    /// Delete rows of (session, query key).
    pub fn delete(&self, session_id: Uuid, query_key: QueryKey) -> Result<usize> {
        let conn = self.lock();
        let deleted = conn.execute(
            "DELETE FROM SYS_QUERY_RESULT WHERE SESSION_ID = ?1 AND QUERY_KEY = ?2",
            params![session_id.to_string(), query_key],
        )?;
        Ok(deleted)
    }

    /// Delete every row of a session.
    pub fn delete_for_session(&self, session_id: Uuid) -> Result<usize> {
        let conn = self.lock();
        let deleted = conn.execute(
            "DELETE FROM SYS_QUERY_RESULT WHERE SESSION_ID = ?1",
            params![session_id.to_string()],
        )?;
        Ok(deleted)
    }

    /// Read up to `limit` (row id, session id) pairs, oldest rows first.
    ///
    /// Session ids that do not parse come back as the nil UUID.
    pub fn scan_owners(&self, limit: usize) -> Result<Vec<(i64, Uuid)>> {
        let conn = self.lock();
        let mut stmt =
            conn.prepare("SELECT ID, SESSION_ID FROM SYS_QUERY_RESULT ORDER BY ID LIMIT ?1")?;
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = stmt
            .query_map(params![limit], |row| {
                let id: i64 = row.get(0)?;
                let session_id: String = row.get(1)?;
                Ok((id, Uuid::parse_str(&session_id).unwrap_or_default()))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Delete rows by row id.
    ///
    /// Failures are reported as [`QueryCacheError::PurgeFailed`] carrying the cause.
    pub fn delete_rows(&self, row_ids: &[i64]) -> Result<usize> {
        if row_ids.is_empty() {
            return Ok(0);
        }
        let placeholders = vec!["?"; row_ids.len()].join(", ");
        let sql = format!("DELETE FROM SYS_QUERY_RESULT WHERE ID IN ({placeholders})");
        let conn = self.lock();
        conn.execute(&sql, params_from_iter(row_ids.iter()))
            .map_err(|source| QueryCacheError::PurgeFailed { source })
    }

    /// Number of rows stored for (session, query key).
    pub fn count(&self, session_id: Uuid, query_key: QueryKey) -> Result<usize> {
        let conn = self.lock();
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM SYS_QUERY_RESULT WHERE SESSION_ID = ?1 AND QUERY_KEY = ?2",
            params![session_id.to_string(), query_key],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    /// Total number of rows in the result table.
    pub fn total_rows(&self) -> Result<usize> {
        let conn = self.lock();
        let count: i64 =
            conn.query_row("SELECT COUNT(*) FROM SYS_QUERY_RESULT", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Ids stored for (session, query key), in insertion order.
    pub fn load(&self, session_id: Uuid, query_key: QueryKey) -> Result<Vec<EntityId>> {
        let conn = self.lock();
        let mut stmt = conn.prepare(
            r#"
            SELECT ENTITY_ID, STRING_ENTITY_ID, INT_ENTITY_ID, LONG_ENTITY_ID
            FROM SYS_QUERY_RESULT
            WHERE SESSION_ID = ?1 AND QUERY_KEY = ?2
            ORDER BY ID
            "#,
        )?;
        let ids = stmt
            .query_map(params![session_id.to_string(), query_key], row_to_id)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(ids.into_iter().flatten().collect())
    }
}

fn insert_batches(
    tx: &Transaction<'_>,
    session_id: Uuid,
    query_key: QueryKey,
    kind: KeyKind,
    ids: &[EntityId],
    batch_size: usize,
) -> Result<usize> {
    let session = session_id.to_string();
    let mut inserted = 0;
    for batch in ids.chunks(batch_size.max(1)) {
        let values = vec!["(?, ?, ?)"; batch.len()].join(", ");
        let sql = format!(
            "INSERT INTO SYS_QUERY_RESULT (SESSION_ID, QUERY_KEY, {}) VALUES {values}",
            kind.column()
        );
        let mut bound = Vec::with_capacity(batch.len() * 3);
        for id in batch {
            bound.push(SqlValue::Text(session.clone()));
            bound.push(SqlValue::Integer(i64::from(query_key)));
            bound.push(id_to_sql(id));
        }
        let mut stmt = tx.prepare_cached(&sql)?;
        inserted += stmt.execute(params_from_iter(bound))?;
    }
    Ok(inserted)
}

fn id_to_sql(id: &EntityId) -> SqlValue {
    match id {
        EntityId::String(s) => SqlValue::Text(s.clone()),
        EntityId::Long(v) => SqlValue::Integer(*v),
        EntityId::Int(v) => SqlValue::Integer(i64::from(*v)),
        EntityId::Uuid(v) => SqlValue::Text(v.to_string()),
    }
}

fn read_id(row: &Row<'_>, index: usize, kind: KeyKind) -> rusqlite::Result<EntityId> {
    Ok(match kind {
        KeyKind::String => EntityId::String(row.get(index)?),
        KeyKind::Long => EntityId::Long(row.get(index)?),
        KeyKind::Int => EntityId::Int(row.get(index)?),
        KeyKind::Uuid => {
            let text: String = row.get(index)?;
            let uuid = Uuid::parse_str(&text).map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(index, Type::Text, Box::new(e))
            })?;
            EntityId::Uuid(uuid)
        }
    })
}

fn row_to_id(row: &Row<'_>) -> rusqlite::Result<Option<EntityId>> {
    if row.get::<_, Option<String>>(0)?.is_some() {
        return read_id(row, 0, KeyKind::Uuid).map(Some);
    }
    if let Some(value) = row.get::<_, Option<String>>(1)? {
        return Ok(Some(EntityId::String(value)));
    }
    if let Some(value) = row.get::<_, Option<i32>>(2)? {
        return Ok(Some(EntityId::Int(value)));
    }
    Ok(row.get::<_, Option<i64>>(3)?.map(EntityId::Long))
}
