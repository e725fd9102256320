//! Contracts for the durable state behind the engine: pool rows and
//! constraint rows live behind these traits so deployments can swap the
//! backing database without touching resolution logic.

use armada_pool_controller_core::{ConstraintKind, Labels, Pool, PoolConstraint};
use thiserror::Error;

/// A failure inside a backing store. Absent rows are not failures;
/// operations report those through their return values.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("backing store: {0}")]
    Backend(String),
}

/// Selects pool rows. An empty filter selects everything.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PoolFilter {
    /// Restrict to pools with one of these names.
    pub names: Option<Vec<String>>,
    /// Restrict on the default flag.
    pub default: Option<bool>,
}

/// A partial update of a pool row. `None` fields are left untouched.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PoolPatch {
    pub default: Option<bool>,
    pub labels: Option<Labels>,
}

/// Selects constraint rows. An empty query selects everything.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ConstraintQuery {
    /// Restrict to rows with exactly this expression.
    pub pool_expr: Option<String>,
    /// Restrict to rows of one of these kinds.
    pub kinds: Option<Vec<ConstraintKind>>,
    /// Restrict to rows whose values contain this entry.
    pub has_value: Option<String>,
}

/// Storage for pool rows, keyed by name.
#[async_trait::async_trait]
pub trait PoolStore: Send + Sync {
    /// Inserts a new pool. Returns `false` when the name is taken.
    async fn insert(&self, pool: Pool) -> Result<bool, StoreError>;

    /// Applies a partial update. Returns `false` when no row matches.
    async fn update(&self, name: &str, patch: PoolPatch) -> Result<bool, StoreError>;

    /// Deletes by name. Returns `false` when no row matches.
    async fn delete(&self, name: &str) -> Result<bool, StoreError>;

    async fn find_by_name(&self, name: &str) -> Result<Option<Pool>, StoreError>;

    /// Lists matching pools, ordered by name.
    async fn find(&self, filter: &PoolFilter) -> Result<Vec<Pool>, StoreError>;
}

/// Storage for constraint rows, keyed by `(pool_expr, kind)`.
#[async_trait::async_trait]
pub trait ConstraintStore: Send + Sync {
    /// Replaces the row keyed by the constraint's expression and kind,
    /// creating it if absent.
    async fn upsert(&self, constraint: PoolConstraint) -> Result<(), StoreError>;

    /// Deletes a row. Returns whether one existed; deleting a missing
    /// row is a successful no-op.
    async fn delete(&self, pool_expr: &str, kind: ConstraintKind) -> Result<bool, StoreError>;

    /// Set-union append: existing values keep their positions and new
    /// values land at the end, in the order given. A missing row is
    /// created with `blacklist_on_create`; an existing row keeps its
    /// flag.
    async fn add_values(
        &self,
        pool_expr: &str,
        kind: ConstraintKind,
        values: &[String],
        blacklist_on_create: bool,
    ) -> Result<(), StoreError>;

    /// Drops every listed value from a row. The row survives even when
    /// emptied, and a missing row is a no-op.
    async fn remove_values(
        &self,
        pool_expr: &str,
        kind: ConstraintKind,
        values: &[String],
    ) -> Result<(), StoreError>;

    /// Lists matching rows in a stable order.
    async fn list(&self, query: &ConstraintQuery) -> Result<Vec<PoolConstraint>, StoreError>;

    /// For every row of `kind` whose values contain `old`, adds `new`
    /// and then drops `old`. Each row moves in one step, so readers
    /// never observe a row holding neither name.
    async fn rename_value(
        &self,
        kind: ConstraintKind,
        old: &str,
        new: &str,
    ) -> Result<(), StoreError>;
}
