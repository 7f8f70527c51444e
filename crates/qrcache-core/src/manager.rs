//! Saving, narrowing and sweeping previous query results.
//!
//! A consumer that wants to "search within these results" hands the manager a
//! [`LoadContext`] whose chain of previous queries ends with the query to
//! persist. The manager rewrites that query to select primary keys only,
//! restricts it to the keys saved for the previous link when the chain is
//! longer than one, and replaces the persisted key set for
//! (session, query key). Sessions that have gone away are cleaned up by the
//! guarded inactive-session sweep.

use crate::catalog::{EntityCatalog, EntityMeta};
use crate::cluster::ClusterRole;
use crate::query::{QueryBuilder, SelectQuery};
use crate::session::{ActiveSessions, UserSession};
use crate::store::QueryResultStore;
use crate::Result;
use qrcache_types::{
    EntityId, LoadContext, QueryKey, QuerySignature, SaveOutcome, SaveSkip, SweepOutcome, SweepReport, SweepSkip,
};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Rows inserted per statement.
pub const INSERT_BATCH_SIZE: usize = 100;
/// Row ids deleted per statement during the sweep.
pub const DELETE_BATCH_SIZE: usize = 100;
/// Maximum rows read by one sweep pass.
pub const SWEEP_SCAN_LIMIT: usize = 100_000;

/// Tunables for the query-results manager.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryResultsConfig {
    /// Global switch for querying within previously selected results.
    #[serde(default = "default_allow_query_from_selected")]
    pub allow_query_from_selected: bool,
    #[serde(default = "default_insert_batch_size")]
    pub insert_batch_size: usize,
    #[serde(default = "default_delete_batch_size")]
    pub delete_batch_size: usize,
    #[serde(default = "default_sweep_scan_limit")]
    pub sweep_scan_limit: usize,
}

fn default_allow_query_from_selected() -> bool {
    true
}

fn default_insert_batch_size() -> usize {
    INSERT_BATCH_SIZE
}

fn default_delete_batch_size() -> usize {
    DELETE_BATCH_SIZE
}

fn default_sweep_scan_limit() -> usize {
    SWEEP_SCAN_LIMIT
}

impl Default for QueryResultsConfig {
    fn default() -> Self {
        Self {
            allow_query_from_selected: default_allow_query_from_selected(),
            insert_batch_size: default_insert_batch_size(),
            delete_batch_size: default_delete_batch_size(),
            sweep_scan_limit: default_sweep_scan_limit(),
        }
    }
}

/// Persists and narrows previous query results per session.
pub struct QueryResultsManager {
    store: Arc<QueryResultStore>,
    catalog: Arc<EntityCatalog>,
    sessions: Arc<dyn ActiveSessions>,
    cluster: Arc<dyn ClusterRole>,
    config: QueryResultsConfig,
    started: AtomicBool,
}

impl QueryResultsManager {
    pub fn new(
        store: Arc<QueryResultStore>,
        catalog: Arc<EntityCatalog>,
        sessions: Arc<dyn ActiveSessions>,
        cluster: Arc<dyn ClusterRole>,
        config: QueryResultsConfig,
    ) -> Self {
        Self {
            store,
            catalog,
            sessions,
            cluster,
            config,
            started: AtomicBool::new(false),
        }
    }

    pub fn store(&self) -> &Arc<QueryResultStore> {
        &self.store
    }

    pub fn config(&self) -> &QueryResultsConfig {
        &self.config
    }

    /// Mark the hosting process as fully started; sweeps are refused before this.
    pub fn mark_started(&self) {
        self.started.store(true, Ordering::SeqCst);
    }

    pub fn is_started(&self) -> bool {
        self.started.load(Ordering::SeqCst)
    }

    /// Persist the ids selected by the last query of the context's chain.
    pub fn save(&self, session: &UserSession, context: &LoadContext) -> Result<SaveOutcome> {
        let Some(last) = context.previous_queries.last() else {
            return Ok(SaveOutcome::Skipped {
                reason: SaveSkip::NoPreviousQueries,
            });
        };

        let entity = self.catalog.get(&context.entity)?;
        let select = match SelectQuery::parse(&last.query) {
            Ok(select) if select.is_entity_select(entity.table()) => select,
            Ok(_) => {
                debug!(
                    target: "qrcache::results",
                    "Not saving results of {}: not a plain select of {}",
                    last.query,
                    entity.name
                );
                return Ok(SaveOutcome::Skipped {
                    reason: SaveSkip::NotEntitySelect,
                });
            }
            Err(e) => {
                debug!(
                    target: "qrcache::results",
                    "Not saving results of {}: {}",
                    last.query,
                    e
                );
                return Ok(SaveOutcome::Skipped {
                    reason: SaveSkip::NotEntitySelect,
                });
            }
        };

        let query_key = context.query_key;
        if session.recent_queries().record_is_repeat(query_key, last) {
            debug!(
                target: "qrcache::results",
                "Results for {} / {} already saved",
                session.id(),
                query_key
            );
            return Ok(SaveOutcome::Skipped {
                reason: SaveSkip::AlreadySaved,
            });
        }

        match self.fetch_and_replace(session, context, entity, last, select) {
            Ok(rows) => Ok(SaveOutcome::Saved { rows }),
            Err(e) => {
                // A failed save must not make the next identical save look redundant
                session.recent_queries().remove(query_key);
                Err(e)
            }
        }
    }

    fn fetch_and_replace(
        &self,
        session: &UserSession,
        context: &LoadContext,
        entity: &EntityMeta,
        last: &QuerySignature,
        mut select: SelectQuery,
    ) -> Result<usize> {
        select.replace_with_select_id(&entity.primary_key);
        select.remove_order_by();

        let soft_delete = entity
            .soft_delete_column
            .as_deref()
            .filter(|_| context.soft_deletion);
        let mut builder = QueryBuilder::new(select)
            .condition(last.condition.as_deref())?
            .sort(&last.sort)?
            .parameters(&last.parameters)?
            .soft_deletion(soft_delete);
        if context.previous_queries.len() > 1 {
            builder = builder.previous_results(session.id(), context.query_key, entity)?;
        }
        let query = builder.build()?;

        debug!(target: "qrcache::results", "Load previous query results: {}", query.sql);
        let start = Instant::now();
        let ids = self.store.fetch_ids(&query, entity.key_kind)?;
        debug!(
            target: "qrcache::results",
            "Done in {}ms: loaded {} ids",
            start.elapsed().as_millis(),
            ids.len()
        );

        self.replace(session.id(), context.query_key, &ids)
    }

    fn replace(&self, session_id: Uuid, query_key: QueryKey, ids: &[EntityId]) -> Result<usize> {
        let start = Instant::now();
        let rows = self
            .store
            .replace(session_id, query_key, ids, self.config.insert_batch_size)?;
        debug!(
            target: "qrcache::results",
            "Done in {}ms: replaced query results for {} / {} with {} rows",
            start.elapsed().as_millis(),
            session_id,
            query_key,
            rows
        );
        Ok(rows)
    }

    /// Insert ids for (session, query key). Empty input is a no-op.
    pub fn insert(&self, session: &UserSession, query_key: QueryKey, ids: &[EntityId]) -> Result<usize> {
        if ids.is_empty() {
            return Ok(0);
        }
        let start = Instant::now();
        debug!(
            target: "qrcache::results",
            "Insert {} query results for {} / {}",
            ids.len(),
            session.id(),
            query_key
        );
        let rows = self
            .store
            .insert(session.id(), query_key, ids, self.config.insert_batch_size)?;
        debug!(
            target: "qrcache::results",
            "Done in {}ms: inserted {} rows for {} / {}",
            start.elapsed().as_millis(),
            rows,
            session.id(),
            query_key
        );
        Ok(rows)
    }

    /// Delete the rows of (session, query key).
    pub fn delete(&self, session: &UserSession, query_key: QueryKey) -> Result<usize> {
        let start = Instant::now();
        let rows = self.store.delete(session.id(), query_key)?;
        debug!(
            target: "qrcache::results",
            "Done in {}ms: deleted {} query results for {} / {}",
            start.elapsed().as_millis(),
            rows,
            session.id(),
            query_key
        );
        Ok(rows)
    }

    /// Delete every row of the given session.
    pub fn delete_for_session(&self, session_id: Uuid) -> Result<usize> {
        let rows = self.store.delete_for_session(session_id)?;
        debug!(
            target: "qrcache::results",
            "Deleted {} query results for session {}",
            rows,
            session_id
        );
        Ok(rows)
    }

    pub fn count(&self, session: &UserSession, query_key: QueryKey) -> Result<usize> {
        self.store.count(session.id(), query_key)
    }

    pub fn load(&self, session: &UserSession, query_key: QueryKey) -> Result<Vec<EntityId>> {
        self.store.load(session.id(), query_key)
    }

    /// Sweep rows of inactive sessions if this node is allowed to.
    ///
    /// Runs only once the process is started, on the cluster coordinator, and
    /// while querying from selected results is enabled.
    pub fn delete_for_inactive_sessions(&self) -> Result<SweepOutcome> {
        let skip = if !self.is_started() {
            Some(SweepSkip::NotStarted)
        } else if !self.cluster.is_coordinator() {
            Some(SweepSkip::NotCoordinator)
        } else if !self.config.allow_query_from_selected {
            Some(SweepSkip::Disabled)
        } else {
            None
        };

        if let Some(reason) = skip {
            debug!(target: "qrcache::sweep", "Skipping inactive session sweep: {:?}", reason);
            return Ok(SweepOutcome::Skipped { reason });
        }

        self.purge_inactive_sessions().map(SweepOutcome::Completed)
    }

    /// One unguarded sweep pass over at most `sweep_scan_limit` rows.
    pub fn purge_inactive_sessions(&self) -> Result<SweepReport> {
        debug!(target: "qrcache::sweep", "Delete query results for inactive user sessions");

        let limit = self.config.sweep_scan_limit;
        let rows = self.store.scan_owners(limit)?;
        let truncated = rows.len() == limit;
        if truncated {
            warn!(
                target: "qrcache::sweep",
                "Processing {} records, run again for the rest",
                limit
            );
        }

        let active = self.sessions.active_session_ids();
        let stale: Vec<i64> = rows
            .iter()
            .filter(|(_, session_id)| !active.contains(session_id))
            .map(|(row_id, _)| *row_id)
            .collect();

        let mut deleted = 0;
        for batch in stale.chunks(self.config.delete_batch_size.max(1)) {
            debug!(target: "qrcache::sweep", "Deleting {} records", batch.len());
            deleted += self.store.delete_rows(batch)?;
        }

        if deleted > 0 {
            info!(
                target: "qrcache::sweep",
                "Removed {} query results of inactive sessions ({} scanned)",
                deleted,
                rows.len()
            );
        }

        Ok(SweepReport {
            scanned: rows.len(),
            deleted,
            truncated,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::{SingleNode, StaticRole};
    use crate::session::SessionRegistry;
    use crate::QueryCacheError;
    use qrcache_types::{KeyKind, SortOrder};
    use tempfile::TempDir;

    struct Fixture {
        manager: QueryResultsManager,
        registry: Arc<SessionRegistry>,
        store: Arc<QueryResultStore>,
        _dir: TempDir,
    }

    fn fixture_with(cluster: Arc<dyn ClusterRole>, config: QueryResultsConfig) -> Fixture {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(QueryResultStore::open(&dir.path().join("cache.db")).unwrap());
        store
            .execute_batch(
                r#"
                CREATE TABLE orders (
                    id INTEGER PRIMARY KEY,
                    status TEXT NOT NULL,
                    amount INTEGER NOT NULL,
                    deleted_at TEXT
                );
                INSERT INTO orders (id, status, amount, deleted_at) VALUES
                    (1, 'open', 10, NULL),
                    (2, 'open', 200, NULL),
                    (3, 'closed', 300, NULL),
                    (4, 'open', 400, NULL),
                    (5, 'open', 500, '2024-01-01');

                CREATE TABLE tags (code TEXT PRIMARY KEY, label TEXT NOT NULL);
                INSERT INTO tags (code, label) VALUES ('a', 'alpha'), ('b', 'beta');
                "#,
            )
            .unwrap();

        let catalog = EntityCatalog::from_entities([
            EntityMeta::new("Order", KeyKind::Long)
                .with_table("orders")
                .with_soft_delete("deleted_at"),
            EntityMeta::new("Tag", KeyKind::String)
                .with_table("tags")
                .with_primary_key("code"),
        ])
        .unwrap();

        let registry = Arc::new(SessionRegistry::new(10));
        let manager = QueryResultsManager::new(
            store.clone(),
            Arc::new(catalog),
            registry.clone(),
            cluster,
            config,
        );
        Fixture {
            manager,
            registry,
            store,
            _dir: dir,
        }
    }

    fn fixture() -> Fixture {
        fixture_with(Arc::new(SingleNode), QueryResultsConfig::default())
    }

    fn longs(values: &[i64]) -> Vec<EntityId> {
        values.iter().copied().map(EntityId::Long).collect()
    }

    #[test]
    fn test_save_persists_primary_keys() {
        let f = fixture();
        let session = f.registry.open();
        let ctx = LoadContext::new("Order", 1).with_query(
            QuerySignature::new("select o from orders o where o.status = :status order by o.amount desc")
                .with_parameter("status", "open"),
        );

        let outcome = f.manager.save(&session, &ctx).unwrap();
        // soft-deleted order 5 is excluded
        assert_eq!(outcome, SaveOutcome::Saved { rows: 3 });
        let mut ids = f.manager.load(&session, 1).unwrap();
        ids.sort_by_key(|id| match id {
            EntityId::Long(v) => *v,
            _ => 0,
        });
        assert_eq!(ids, longs(&[1, 2, 4]));
    }

    #[test]
    fn test_save_without_soft_deletion_keeps_deleted_rows() {
        let f = fixture();
        let session = f.registry.open();
        let mut ctx = LoadContext::new("Order", 1)
            .with_query(QuerySignature::new("select * from orders").with_sort(SortOrder::asc("id")));
        ctx.soft_deletion = false;

        let outcome = f.manager.save(&session, &ctx).unwrap();
        assert_eq!(outcome, SaveOutcome::Saved { rows: 5 });
    }

    #[test]
    fn test_save_empty_chain_is_noop() {
        let f = fixture();
        let session = f.registry.open();
        let outcome = f.manager.save(&session, &LoadContext::new("Order", 1)).unwrap();
        assert_eq!(
            outcome,
            SaveOutcome::Skipped {
                reason: SaveSkip::NoPreviousQueries
            }
        );
        assert_eq!(f.store.total_rows().unwrap(), 0);
    }

    #[test]
    fn test_save_non_entity_select_is_noop() {
        let f = fixture();
        let session = f.registry.open();
        let ctx = LoadContext::new("Order", 1)
            .with_query(QuerySignature::new("select o.amount from orders o"));
        let outcome = f.manager.save(&session, &ctx).unwrap();
        assert_eq!(
            outcome,
            SaveOutcome::Skipped {
                reason: SaveSkip::NotEntitySelect
            }
        );
        assert!(session.recent_queries().is_empty());
    }

    #[test]
    fn test_save_of_unparsable_or_non_select_text_is_noop() {
        let f = fixture();
        let session = f.registry.open();
        for text in [
            "select 1",
            "with x as (select * from orders) select * from x",
            "delete from orders",
            "this is not sql",
            "select * from orders; select * from orders",
        ] {
            let ctx = LoadContext::new("Order", 1).with_query(QuerySignature::new(text));
            let outcome = f.manager.save(&session, &ctx).unwrap();
            assert_eq!(
                outcome,
                SaveOutcome::Skipped {
                    reason: SaveSkip::NotEntitySelect
                },
                "{text}"
            );
        }
        assert!(session.recent_queries().is_empty());
        assert_eq!(f.store.total_rows().unwrap(), 0);
    }

    #[test]
    fn test_save_with_quoted_table_name() {
        let f = fixture();
        let session = f.registry.open();
        let ctx = LoadContext::new("Order", 2).with_query(QuerySignature::new(
            r#"SELECT * FROM "orders" /* every open order */ WHERE status = 'open'"#,
        ));

        let outcome = f.manager.save(&session, &ctx).unwrap();
        assert_eq!(outcome, SaveOutcome::Saved { rows: 3 });
    }

    #[test]
    fn test_save_rejects_condition_with_trailing_statement() {
        let f = fixture();
        let session = f.registry.open();
        let ctx = LoadContext::new("Order", 1).with_query(
            QuerySignature::new("select * from orders").with_condition("amount > 1; drop table orders"),
        );
        assert!(f.manager.save(&session, &ctx).is_err());
        assert!(session.recent_queries().is_empty());
        assert_eq!(f.store.count(session.id(), 1).unwrap(), 0);
    }

    #[test]
    fn test_save_unknown_entity_fails() {
        let f = fixture();
        let session = f.registry.open();
        let ctx = LoadContext::new("Invoice", 1).with_query(QuerySignature::new("select * from invoices"));
        assert!(matches!(
            f.manager.save(&session, &ctx),
            Err(QueryCacheError::UnknownEntity(_))
        ));
    }

    #[test]
    fn test_second_identical_save_is_skipped() {
        let f = fixture();
        let session = f.registry.open();
        let ctx = LoadContext::new("Order", 1).with_query(QuerySignature::new("select * from orders"));

        assert_eq!(f.manager.save(&session, &ctx).unwrap(), SaveOutcome::Saved { rows: 4 });

        // Storage changes made behind the cache's back stay untouched by a repeat save
        f.store.delete(session.id(), 1).unwrap();
        assert_eq!(
            f.manager.save(&session, &ctx).unwrap(),
            SaveOutcome::Skipped {
                reason: SaveSkip::AlreadySaved
            }
        );
        assert_eq!(f.manager.count(&session, 1).unwrap(), 0);
    }

    #[test]
    fn test_changed_signature_is_saved_again() {
        let f = fixture();
        let session = f.registry.open();
        let first = LoadContext::new("Order", 1).with_query(QuerySignature::new("select * from orders"));
        let second = LoadContext::new("Order", 1)
            .with_query(QuerySignature::new("select * from orders").with_condition("amount >= 300"));

        f.manager.save(&session, &first).unwrap();
        assert_eq!(f.manager.save(&session, &second).unwrap(), SaveOutcome::Saved { rows: 2 });
        assert_eq!(f.manager.count(&session, 1).unwrap(), 2);
    }

    #[test]
    fn test_chained_save_narrows_to_previous_results() {
        let f = fixture();
        let session = f.registry.open();
        let first = QuerySignature::new("select o from orders o").with_condition("o.amount >= 200");
        let ctx = LoadContext::new("Order", 9).with_query(first.clone());
        assert_eq!(f.manager.save(&session, &ctx).unwrap(), SaveOutcome::Saved { rows: 3 });

        // second link: open orders, but only among the ones selected before
        let ctx = LoadContext::new("Order", 9)
            .with_query(first)
            .with_query(QuerySignature::new("select o from orders o where o.status = 'open'"));
        assert_eq!(f.manager.save(&session, &ctx).unwrap(), SaveOutcome::Saved { rows: 2 });

        let mut ids = f.manager.load(&session, 9).unwrap();
        ids.sort_by_key(|id| format!("{id:?}"));
        assert_eq!(ids, longs(&[2, 4]));
    }

    #[test]
    fn test_chain_does_not_see_other_sessions_results() {
        let f = fixture();
        let owner = f.registry.open();
        let other = f.registry.open();
        f.manager.insert(&owner, 3, &longs(&[1, 2, 3, 4])).unwrap();

        let ctx = LoadContext::new("Order", 3)
            .with_query(QuerySignature::new("select * from orders"))
            .with_query(QuerySignature::new("select * from orders where status = 'open'"));
        assert_eq!(f.manager.save(&other, &ctx).unwrap(), SaveOutcome::Saved { rows: 0 });
        assert_eq!(f.manager.count(&owner, 3).unwrap(), 4);
    }

    #[test]
    fn test_string_keys_round_through_save() {
        let f = fixture();
        let session = f.registry.open();
        let ctx = LoadContext::new("Tag", 2).with_query(QuerySignature::new("select t from tags t"));
        assert_eq!(f.manager.save(&session, &ctx).unwrap(), SaveOutcome::Saved { rows: 2 });
        let ids = f.manager.load(&session, 2).unwrap();
        assert!(ids.contains(&EntityId::from("a")));
        assert!(ids.contains(&EntityId::from("b")));
    }

    #[test]
    fn test_failed_save_is_not_remembered() {
        let f = fixture();
        let session = f.registry.open();
        let ctx = LoadContext::new("Order", 1)
            .with_query(QuerySignature::new("select * from orders").with_condition("no_such_column = 1"));

        assert!(f.manager.save(&session, &ctx).is_err());
        assert!(session.recent_queries().get(1).is_none());
        assert!(f.manager.save(&session, &ctx).is_err());
    }

    #[test]
    fn test_insert_count_delete() {
        let f = fixture();
        let session = f.registry.open();
        assert_eq!(f.manager.insert(&session, 7, &longs(&[1, 2, 3])).unwrap(), 3);
        assert_eq!(f.manager.count(&session, 7).unwrap(), 3);

        assert_eq!(f.manager.delete(&session, 7).unwrap(), 3);
        assert_eq!(f.manager.count(&session, 7).unwrap(), 0);

        assert_eq!(f.manager.insert(&session, 7, &[]).unwrap(), 0);
        assert_eq!(f.manager.count(&session, 7).unwrap(), 0);
    }

    #[test]
    fn test_delete_for_session() {
        let f = fixture();
        let s1 = f.registry.open();
        let s2 = f.registry.open();
        f.manager.insert(&s1, 1, &longs(&[1, 2])).unwrap();
        f.manager.insert(&s1, 2, &longs(&[3])).unwrap();
        f.manager.insert(&s2, 1, &longs(&[1])).unwrap();

        assert_eq!(f.manager.delete_for_session(s1.id()).unwrap(), 3);
        assert_eq!(f.manager.count(&s2, 1).unwrap(), 1);
    }

    #[test]
    fn test_sweep_removes_only_inactive_sessions() {
        let f = fixture();
        f.manager.mark_started();
        let gone = f.registry.open();
        let alive = f.registry.open();
        f.manager.insert(&gone, 7, &longs(&[1, 2])).unwrap();
        f.manager.insert(&alive, 7, &longs(&[1, 2, 3])).unwrap();
        f.registry.close(gone.id());

        let outcome = f.manager.delete_for_inactive_sessions().unwrap();
        assert_eq!(
            outcome,
            SweepOutcome::Completed(SweepReport {
                scanned: 5,
                deleted: 2,
                truncated: false,
            })
        );
        assert_eq!(f.manager.count(&gone, 7).unwrap(), 0);
        assert_eq!(f.manager.count(&alive, 7).unwrap(), 3);
    }

    #[test]
    fn test_sweep_guards() {
        let role = Arc::new(StaticRole::new(false));
        let f = fixture_with(role.clone(), QueryResultsConfig::default());
        let gone = f.registry.open();
        f.manager.insert(&gone, 1, &longs(&[1])).unwrap();
        f.registry.close(gone.id());

        assert_eq!(
            f.manager.delete_for_inactive_sessions().unwrap(),
            SweepOutcome::Skipped {
                reason: SweepSkip::NotStarted
            }
        );
        f.manager.mark_started();
        assert_eq!(
            f.manager.delete_for_inactive_sessions().unwrap(),
            SweepOutcome::Skipped {
                reason: SweepSkip::NotCoordinator
            }
        );
        assert_eq!(f.store.total_rows().unwrap(), 1);

        role.set_coordinator(true);
        assert!(matches!(
            f.manager.delete_for_inactive_sessions().unwrap(),
            SweepOutcome::Completed(SweepReport { deleted: 1, .. })
        ));
    }

    #[test]
    fn test_sweep_disabled_by_flag() {
        let config = QueryResultsConfig {
            allow_query_from_selected: false,
            ..QueryResultsConfig::default()
        };
        let f = fixture_with(Arc::new(SingleNode), config);
        f.manager.mark_started();
        assert_eq!(
            f.manager.delete_for_inactive_sessions().unwrap(),
            SweepOutcome::Skipped {
                reason: SweepSkip::Disabled
            }
        );
    }

    #[test]
    fn test_truncated_sweep_needs_another_pass() {
        let config = QueryResultsConfig {
            sweep_scan_limit: 4,
            delete_batch_size: 3,
            ..QueryResultsConfig::default()
        };
        let f = fixture_with(Arc::new(SingleNode), config);
        let gone = Uuid::new_v4();
        let ids: Vec<EntityId> = (0..6).map(EntityId::Long).collect();
        f.store.insert(gone, 1, &ids, 100).unwrap();

        let first = f.manager.purge_inactive_sessions().unwrap();
        assert_eq!(
            first,
            SweepReport {
                scanned: 4,
                deleted: 4,
                truncated: true,
            }
        );
        let second = f.manager.purge_inactive_sessions().unwrap();
        assert_eq!(
            second,
            SweepReport {
                scanned: 2,
                deleted: 2,
                truncated: false,
            }
        );
        assert_eq!(f.store.total_rows().unwrap(), 0);
    }
}
