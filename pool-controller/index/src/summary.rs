//! The serialized pool view handed to API consumers.

use crate::error::Error;
use crate::index::Index;
use armada_pool_controller_core::{ConstraintKind, Labels, PoolConstraint};
use serde::Serialize;
use std::collections::BTreeMap;

/// A pool with its resolved allowances, shaped for serialization. The
/// `public` flag is derived, not stored: it reports whether the pool's
/// exact team constraint admits every team.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PoolSummary {
    pub name: String,
    pub public: bool,
    pub default: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provisioner: Option<String>,
    #[serde(skip_serializing_if = "Labels::is_empty")]
    pub labels: Labels,
    pub teams: Vec<String>,
    pub allowed: BTreeMap<ConstraintKind, Vec<String>>,
}

// === impl Index ===

impl Index {
    /// Resolves a pool into its API shape. Registry failures surface to
    /// the caller rather than producing a partial view.
    pub async fn pool_summary(&self, name: &str) -> Result<PoolSummary, Error> {
        let pool = self.get_pool(name).await?;
        let exact_team = self
            .exact_constraint_for_pool(name, ConstraintKind::Team)
            .await?;
        let allowed = self.allowed_values(name).await?;
        let teams = allowed
            .get(&ConstraintKind::Team)
            .cloned()
            .unwrap_or_default();
        Ok(PoolSummary {
            name: pool.name,
            public: exact_team.as_ref().map_or(false, PoolConstraint::allows_all),
            default: pool.default,
            provisioner: pool.provisioner,
            labels: pool.labels,
            teams,
            allowed,
        })
    }
}
