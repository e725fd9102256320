//! Constraint maintenance and the resolution rules that pick which row
//! governs a pool.

use crate::error::Error;
use crate::index::Index;
use crate::store::ConstraintQuery;
use ahash::AHashMap as HashMap;
use armada_pool_controller_core::{
    compare_specificity, pool_match, ConstraintKind, Pool, PoolConstraint,
};

/// How a queried value is tested against a row's stored values.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum ValueMatch {
    /// Literal membership.
    Exact,
    /// Stored values act as glob patterns.
    Pattern,
}

impl Index {
    /// Replaces a constraint row wholesale. Writing no values, or the
    /// single empty string, deletes the row instead; deleting a missing
    /// row still succeeds.
    pub async fn set_constraint(&self, constraint: PoolConstraint) -> Result<(), Error> {
        let emptied = constraint.values.is_empty()
            || (constraint.values.len() == 1 && constraint.values[0].is_empty());
        if emptied {
            self.constraints
                .delete(&constraint.pool_expr, constraint.kind)
                .await?;
            tracing::debug!(
                expr = %constraint.pool_expr,
                kind = %constraint.kind,
                "constraint cleared",
            );
            return Ok(());
        }
        tracing::debug!(
            expr = %constraint.pool_expr,
            kind = %constraint.kind,
            values = ?constraint.values,
            blacklist = constraint.blacklist,
            "constraint set",
        );
        Ok(self.constraints.upsert(constraint).await?)
    }

    /// Unions values into a row. A row created by this call takes the
    /// given blacklist flag; an existing row keeps its own.
    pub async fn append_constraint(&self, constraint: PoolConstraint) -> Result<(), Error> {
        let PoolConstraint {
            pool_expr,
            kind,
            values,
            blacklist,
        } = constraint;
        self.constraints
            .add_values(&pool_expr, kind, &values, blacklist)
            .await?;
        tracing::debug!(expr = %pool_expr, %kind, ?values, "constraint appended");
        Ok(())
    }

    /// Drops values from a row. The row survives even when emptied, and
    /// a missing row is a no-op.
    pub async fn remove_constraint_values(
        &self,
        pool_expr: &str,
        kind: ConstraintKind,
        values: &[String],
    ) -> Result<(), Error> {
        self.constraints
            .remove_values(pool_expr, kind, values)
            .await?;
        Ok(())
    }

    /// Lists stored rows as-is, with none of the resolution rules
    /// applied.
    pub async fn list_constraints(
        &self,
        query: &ConstraintQuery,
    ) -> Result<Vec<PoolConstraint>, Error> {
        Ok(self.constraints.list(query).await?)
    }

    /// Moves every team grant from `old` to `new` across all team rows.
    /// Rows not mentioning `old`, and rows of other kinds, are left
    /// alone.
    pub async fn rename_pool_team(&self, old: &str, new: &str) -> Result<(), Error> {
        self.constraints
            .rename_value(ConstraintKind::Team, old, new)
            .await?;
        tracing::info!(%old, %new, "team renamed across pool constraints");
        Ok(())
    }

    /// The governing constraint per kind for `pool`: among the rows
    /// whose expression matches the name, the most specific one wins
    /// each kind. Passing no kinds considers every row.
    pub async fn constraints_for_pool(
        &self,
        pool: &str,
        kinds: &[ConstraintKind],
    ) -> Result<HashMap<ConstraintKind, PoolConstraint>, Error> {
        let query = if kinds.is_empty() {
            ConstraintQuery::default()
        } else {
            ConstraintQuery {
                kinds: Some(kinds.to_vec()),
                ..Default::default()
            }
        };
        let mut rows: Vec<PoolConstraint> = self
            .constraints
            .list(&query)
            .await?
            .into_iter()
            .filter(|c| pool_match::matches(&c.pool_expr, pool))
            .collect();
        rows.sort_by(compare_specificity);

        let mut governing = HashMap::default();
        for row in rows {
            governing.entry(row.kind).or_insert(row);
        }
        Ok(governing)
    }

    /// The row whose expression is exactly `pool`, if one exists. Rows
    /// that merely match the name by glob don't count here.
    pub async fn exact_constraint_for_pool(
        &self,
        pool: &str,
        kind: ConstraintKind,
    ) -> Result<Option<PoolConstraint>, Error> {
        let rows = self
            .constraints
            .list(&ConstraintQuery {
                pool_expr: Some(pool.to_string()),
                kinds: Some(vec![kind]),
                ..Default::default()
            })
            .await?;
        Ok(rows.into_iter().next())
    }

    /// Pools whose governing row of `kind` is exact-named and approves
    /// every queried value. With no values, having such a row is
    /// enough.
    pub(crate) async fn pools_satisfying(
        &self,
        mode: ValueMatch,
        kind: ConstraintKind,
        values: &[String],
    ) -> Result<Vec<Pool>, Error> {
        let pools = self.list_all_pools().await?;
        let mut satisfying = Vec::new();
        for pool in pools {
            let mut governing = self.constraints_for_pool(&pool.name, &[kind]).await?;
            let constraint = match governing.remove(&kind) {
                Some(c) if c.pool_expr == pool.name => c,
                _ => continue,
            };
            let approved = values.iter().all(|value| match mode {
                ValueMatch::Exact => constraint.check_exact(value),
                ValueMatch::Pattern => constraint.check(value),
            });
            if approved {
                satisfying.push(pool);
            }
        }
        Ok(satisfying)
    }

    /// Pools whose exact team row approves `*`, meaning any team may
    /// deploy there.
    pub async fn list_public_pools(&self) -> Result<Vec<Pool>, Error> {
        self.pools_satisfying(ValueMatch::Exact, ConstraintKind::Team, &["*".to_string()])
            .await
    }

    /// Pools whose team constraint names `team` outright.
    pub async fn list_pools_for_team(&self, team: &str) -> Result<Vec<Pool>, Error> {
        self.pools_satisfying(ValueMatch::Exact, ConstraintKind::Team, &[team.to_string()])
            .await
    }

    /// Pools any of whose team grants cover the given teams, treating
    /// stored grants as patterns. With no teams, every pool holding a
    /// team row qualifies.
    pub async fn list_possible_pools(&self, teams: &[String]) -> Result<Vec<Pool>, Error> {
        self.pools_satisfying(ValueMatch::Pattern, ConstraintKind::Team, teams)
            .await
    }

    /// Pools whose volume-plan constraint covers the named plan.
    pub async fn list_pools_for_volume_plan(&self, plan: &str) -> Result<Vec<Pool>, Error> {
        self.pools_satisfying(
            ValueMatch::Pattern,
            ConstraintKind::VolumePlan,
            &[plan.to_string()],
        )
        .await
    }
}
