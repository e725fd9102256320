//! One-shot migration of pool rows that predate constraints, where
//! team access was embedded in the pool row itself.

use crate::error::Error;
use crate::index::Index;
use armada_pool_controller_core::{ConstraintKind, PoolConstraint};
use serde::Deserialize;

/// A pool row in its pre-constraint shape.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct LegacyPoolRow {
    pub name: String,
    #[serde(default)]
    pub teams: Vec<String>,
    #[serde(default)]
    pub public: bool,
}

impl Index {
    /// Rewrites each legacy row's embedded access as an exact team
    /// constraint: a wildcard grant for public pools, the team list
    /// otherwise. Each row overwrites whatever constraint is already
    /// there, so re-running the migration converges on the same state.
    /// Stripping the legacy fields afterwards is the caller's job.
    pub async fn migrate_legacy_teams(&self, rows: &[LegacyPoolRow]) -> Result<(), Error> {
        for row in rows {
            let values = if row.public {
                vec!["*".to_string()]
            } else {
                row.teams.clone()
            };
            self.set_constraint(PoolConstraint::new(&row.name, ConstraintKind::Team, values))
                .await?;
            tracing::info!(pool = %row.name, public = row.public, "legacy team access migrated");
        }
        Ok(())
    }
}
