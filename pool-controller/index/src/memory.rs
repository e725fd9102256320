//! An in-process store. Tests run on it, and so do single-node
//! deployments that keep pool state in a config bundle.

use crate::store::{
    ConstraintQuery, ConstraintStore, PoolFilter, PoolPatch, PoolStore, StoreError,
};
use armada_pool_controller_core::{ConstraintKind, Pool, PoolConstraint};
use parking_lot::RwLock;
use std::collections::BTreeMap;

/// Implements both store contracts over process memory. Rows live in
/// ordered maps, so listings come back in key order and results are
/// deterministic.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<State>,
}

#[derive(Debug, Default)]
struct State {
    pools: BTreeMap<String, Pool>,
    constraints: BTreeMap<(String, ConstraintKind), PoolConstraint>,
}

// === impl MemoryStore ===

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl PoolStore for MemoryStore {
    async fn insert(&self, pool: Pool) -> Result<bool, StoreError> {
        let mut state = self.state.write();
        if state.pools.contains_key(&pool.name) {
            return Ok(false);
        }
        state.pools.insert(pool.name.clone(), pool);
        Ok(true)
    }

    async fn update(&self, name: &str, patch: PoolPatch) -> Result<bool, StoreError> {
        let mut state = self.state.write();
        let pool = match state.pools.get_mut(name) {
            Some(pool) => pool,
            None => return Ok(false),
        };
        if let Some(default) = patch.default {
            pool.default = default;
        }
        if let Some(labels) = patch.labels {
            pool.labels = labels;
        }
        Ok(true)
    }

    async fn delete(&self, name: &str) -> Result<bool, StoreError> {
        Ok(self.state.write().pools.remove(name).is_some())
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Pool>, StoreError> {
        Ok(self.state.read().pools.get(name).cloned())
    }

    async fn find(&self, filter: &PoolFilter) -> Result<Vec<Pool>, StoreError> {
        let state = self.state.read();
        let pools = state
            .pools
            .values()
            .filter(|p| {
                filter
                    .names
                    .as_ref()
                    .map_or(true, |names| names.iter().any(|n| *n == p.name))
            })
            .filter(|p| filter.default.map_or(true, |d| p.default == d))
            .cloned()
            .collect();
        Ok(pools)
    }
}

#[async_trait::async_trait]
impl ConstraintStore for MemoryStore {
    async fn upsert(&self, constraint: PoolConstraint) -> Result<(), StoreError> {
        let key = (constraint.pool_expr.clone(), constraint.kind);
        self.state.write().constraints.insert(key, constraint);
        Ok(())
    }

    async fn delete(&self, pool_expr: &str, kind: ConstraintKind) -> Result<bool, StoreError> {
        let key = (pool_expr.to_string(), kind);
        Ok(self.state.write().constraints.remove(&key).is_some())
    }

    async fn add_values(
        &self,
        pool_expr: &str,
        kind: ConstraintKind,
        values: &[String],
        blacklist_on_create: bool,
    ) -> Result<(), StoreError> {
        let mut state = self.state.write();
        let row = state
            .constraints
            .entry((pool_expr.to_string(), kind))
            .or_insert_with(|| PoolConstraint {
                pool_expr: pool_expr.to_string(),
                kind,
                values: Vec::new(),
                blacklist: blacklist_on_create,
            });
        for value in values {
            if !row.values.contains(value) {
                row.values.push(value.clone());
            }
        }
        Ok(())
    }

    async fn remove_values(
        &self,
        pool_expr: &str,
        kind: ConstraintKind,
        values: &[String],
    ) -> Result<(), StoreError> {
        let mut state = self.state.write();
        if let Some(row) = state.constraints.get_mut(&(pool_expr.to_string(), kind)) {
            row.values.retain(|v| !values.contains(v));
        }
        Ok(())
    }

    async fn list(&self, query: &ConstraintQuery) -> Result<Vec<PoolConstraint>, StoreError> {
        let state = self.state.read();
        let rows = state
            .constraints
            .values()
            .filter(|c| {
                query
                    .pool_expr
                    .as_ref()
                    .map_or(true, |expr| *expr == c.pool_expr)
            })
            .filter(|c| query.kinds.as_ref().map_or(true, |kinds| kinds.contains(&c.kind)))
            .filter(|c| query.has_value.as_ref().map_or(true, |v| c.values.contains(v)))
            .cloned()
            .collect();
        Ok(rows)
    }

    async fn rename_value(
        &self,
        kind: ConstraintKind,
        old: &str,
        new: &str,
    ) -> Result<(), StoreError> {
        let mut state = self.state.write();
        for row in state.constraints.values_mut() {
            if row.kind != kind || !row.values.iter().any(|v| v == old) {
                continue;
            }
            if !row.values.iter().any(|v| v == new) {
                row.values.push(new.to_string());
            }
            row.values.retain(|v| v != old);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use armada_pool_controller_core::ConstraintKind::{Router, Team};

    fn row(expr: &str, kind: ConstraintKind, values: &[&str], blacklist: bool) -> PoolConstraint {
        PoolConstraint {
            pool_expr: expr.to_string(),
            kind,
            values: values.iter().map(|v| v.to_string()).collect(),
            blacklist,
        }
    }

    #[tokio::test]
    async fn insert_rejects_duplicate_names() {
        let store = MemoryStore::new();
        let pool = Pool {
            name: "pool1".to_string(),
            ..Default::default()
        };
        assert!(store.insert(pool.clone()).await.unwrap());
        assert!(!store.insert(pool).await.unwrap());
    }

    #[tokio::test]
    async fn update_reports_missing_rows() {
        let store = MemoryStore::new();
        assert!(!store.update("nope", PoolPatch::default()).await.unwrap());
    }

    #[tokio::test]
    async fn add_values_unions_and_keeps_the_creation_flag() {
        let store = MemoryStore::new();
        let values = vec!["a".to_string(), "b".to_string()];
        store.add_values("pool*", Router, &values, true).await.unwrap();

        // A second append neither duplicates values nor flips the flag.
        let more = vec!["b".to_string(), "c".to_string()];
        store.add_values("pool*", Router, &more, false).await.unwrap();

        let rows = store.list(&ConstraintQuery::default()).await.unwrap();
        assert_eq!(rows, vec![row("pool*", Router, &["a", "b", "c"], true)]);
    }

    #[tokio::test]
    async fn remove_values_leaves_an_empty_row_behind() {
        let store = MemoryStore::new();
        store
            .upsert(row("pool1", Team, &["t1", "t2"], false))
            .await
            .unwrap();
        let both = vec!["t1".to_string(), "t2".to_string()];
        store.remove_values("pool1", Team, &both).await.unwrap();

        let rows = store.list(&ConstraintQuery::default()).await.unwrap();
        assert_eq!(rows, vec![row("pool1", Team, &[], false)]);
    }

    #[tokio::test]
    async fn remove_values_on_a_missing_row_is_a_no_op() {
        let store = MemoryStore::new();
        let values = vec!["t1".to_string()];
        store.remove_values("pool1", Team, &values).await.unwrap();
        assert_eq!(store.list(&ConstraintQuery::default()).await.unwrap(), vec![]);
    }

    #[tokio::test]
    async fn list_filters_compose() {
        let store = MemoryStore::new();
        store.upsert(row("pool1", Team, &["t1"], false)).await.unwrap();
        store.upsert(row("pool1", Router, &["r1"], false)).await.unwrap();
        store.upsert(row("pool2", Team, &["t2"], false)).await.unwrap();

        let query = ConstraintQuery {
            kinds: Some(vec![Team]),
            has_value: Some("t2".to_string()),
            ..Default::default()
        };
        let rows = store.list(&query).await.unwrap();
        assert_eq!(rows, vec![row("pool2", Team, &["t2"], false)]);
    }

    #[tokio::test]
    async fn rename_value_rewrites_matching_rows_of_that_kind_only() {
        let store = MemoryStore::new();
        store.upsert(row("e1", Router, &["t1", "t2"], false)).await.unwrap();
        store.upsert(row("e2", Team, &["t1", "t2"], false)).await.unwrap();
        store.upsert(row("e3", Team, &["t2", "t3"], false)).await.unwrap();

        store.rename_value(Team, "t2", "t9000").await.unwrap();

        let rows = store.list(&ConstraintQuery::default()).await.unwrap();
        assert_eq!(
            rows,
            vec![
                row("e1", Router, &["t1", "t2"], false),
                row("e2", Team, &["t1", "t9000"], false),
                row("e3", Team, &["t3", "t9000"], false),
            ],
        );
    }
}
