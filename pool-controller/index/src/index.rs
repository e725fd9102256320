//! The engine itself: pool lifecycle over the stores, with the
//! constraint coupling rules for public and default pools.

use crate::cache::ProvisionerCache;
use crate::error::Error;
use crate::store::{ConstraintStore, PoolFilter, PoolPatch, PoolStore};
use armada_pool_controller_core::labels::validate_labels;
use armada_pool_controller_core::registry::{
    PlanRegistry, ProvisionerRegistry, RouterRegistry, ServiceRegistry, TeamRegistry,
    VolumePlanRegistry,
};
use armada_pool_controller_core::{
    pool, ConstraintKind, Labels, Pool, PoolConstraint, ValidationError,
};
use std::sync::Arc;

/// The live catalogs that constraints are intersected with.
#[derive(Clone)]
pub struct Registries {
    pub teams: Arc<dyn TeamRegistry>,
    pub routers: Arc<dyn RouterRegistry>,
    pub services: Arc<dyn ServiceRegistry>,
    pub plans: Arc<dyn PlanRegistry>,
    pub volume_plans: Arc<dyn VolumePlanRegistry>,
    pub provisioners: Arc<dyn ProvisionerRegistry>,
}

/// Options for creating a pool.
#[derive(Clone, Debug, Default)]
pub struct AddPoolOptions {
    pub name: String,
    /// Public pools admit every team through a wildcard constraint.
    pub public: bool,
    /// At most one pool holds the default flag at a time.
    pub default: bool,
    /// Steal the default flag from the current holder instead of
    /// failing.
    pub force: bool,
    pub provisioner: Option<String>,
    pub labels: Labels,
}

/// Options for updating a pool. `None` leaves that aspect untouched.
#[derive(Clone, Debug, Default)]
pub struct PoolUpdateOptions {
    pub default: Option<bool>,
    pub public: Option<bool>,
    pub force: bool,
    pub labels: Option<Labels>,
}

/// Decides which teams, routers, services, plans, volume plans, and
/// certificate issuers each pool may use. Cheap to clone; clones share
/// the stores and the provisioner memo.
#[derive(Clone)]
pub struct Index {
    pub(crate) pools: Arc<dyn PoolStore>,
    pub(crate) constraints: Arc<dyn ConstraintStore>,
    pub(crate) registries: Registries,
    pub(crate) cache: ProvisionerCache,
}

// === impl Index ===

impl Index {
    pub fn new(
        pools: Arc<dyn PoolStore>,
        constraints: Arc<dyn ConstraintStore>,
        registries: Registries,
    ) -> Self {
        Self {
            pools,
            constraints,
            registries,
            cache: ProvisionerCache::new(),
        }
    }

    /// Creates a pool. Public and default pools also get the exact team
    /// constraint `["*"]` admitting every team.
    pub async fn add_pool(&self, opts: AddPoolOptions) -> Result<(), Error> {
        let AddPoolOptions {
            name,
            public,
            default,
            force,
            provisioner,
            labels,
        } = opts;
        let pool = Pool {
            name,
            default,
            provisioner,
            labels,
        };
        validate_pool(&pool)?;
        if pool.default {
            self.take_default_flag(force).await?;
        }
        if !self.pools.insert(pool.clone()).await? {
            return Err(Error::PoolAlreadyExists);
        }
        tracing::debug!(pool = %pool.name, public, default, "pool created");
        if public || pool.default {
            self.set_constraint(PoolConstraint::new(&pool.name, ConstraintKind::Team, ["*"]))
                .await?;
        }
        Ok(())
    }

    /// Updates flags and labels on an existing pool, maintaining the
    /// wildcard team constraint when the public or default flag moves.
    pub async fn update_pool(&self, name: &str, opts: PoolUpdateOptions) -> Result<(), Error> {
        self.get_pool(name).await?;
        if opts.default == Some(true) {
            self.take_default_flag(opts.force).await?;
        }
        if let Some(labels) = &opts.labels {
            if !labels.is_empty() {
                validate_labels(labels)?;
            }
        }
        let patch = PoolPatch {
            default: opts.default,
            labels: opts.labels,
        };
        if patch != PoolPatch::default() {
            if !self.pools.update(name, patch).await? {
                return Err(Error::PoolNotFound);
            }
            tracing::debug!(pool = %name, "pool updated");
        }
        if opts.public == Some(true) || opts.default == Some(true) {
            self.set_constraint(PoolConstraint::new(name, ConstraintKind::Team, ["*"]))
                .await?;
        }
        if opts.public == Some(false) || opts.default == Some(false) {
            self.remove_constraint_values(name, ConstraintKind::Team, &["*".to_string()])
                .await?;
        }
        Ok(())
    }

    /// Deletes the pool row. Its constraints are left in place, dormant
    /// until a pool matching them exists again.
    pub async fn remove_pool(&self, name: &str) -> Result<(), Error> {
        if !self.pools.delete(name).await? {
            return Err(Error::PoolNotFound);
        }
        tracing::debug!(pool = %name, "pool removed");
        Ok(())
    }

    pub async fn get_pool(&self, name: &str) -> Result<Pool, Error> {
        self.pools
            .find_by_name(name)
            .await?
            .ok_or(Error::PoolNotFound)
    }

    /// The pool currently holding the default flag.
    pub async fn get_default_pool(&self) -> Result<Pool, Error> {
        let pools = self
            .pools
            .find(&PoolFilter {
                default: Some(true),
                ..Default::default()
            })
            .await?;
        pools.into_iter().next().ok_or(Error::PoolNotFound)
    }

    pub async fn list_all_pools(&self) -> Result<Vec<Pool>, Error> {
        Ok(self.pools.find(&PoolFilter::default()).await?)
    }

    pub async fn list_pools(&self, names: &[String]) -> Result<Vec<Pool>, Error> {
        Ok(self
            .pools
            .find(&PoolFilter {
                names: Some(names.to_vec()),
                ..Default::default()
            })
            .await?)
    }

    /// Hands the named teams access to the pool through its exact team
    /// constraint. Blacklist-governed, public, and default pools refuse.
    pub async fn add_teams_to_pool(&self, name: &str, teams: &[String]) -> Result<(), Error> {
        let pool = self.get_pool(name).await?;
        let constraint = self
            .exact_constraint_for_pool(name, ConstraintKind::Team)
            .await?;
        if let Some(c) = &constraint {
            if c.blacklist {
                return Err(Error::AddTeamsToBlacklist);
            }
        }
        let allows_all = constraint.as_ref().map_or(false, PoolConstraint::allows_all);
        if allows_all || pool.default {
            return Err(Error::PublicDefaultPoolCantHaveTeams);
        }
        if let Some(c) = &constraint {
            for team in teams {
                if c.check(team) {
                    return Err(Error::TeamAlreadyExists(team.clone()));
                }
            }
        }
        self.append_constraint(PoolConstraint::new(
            name,
            ConstraintKind::Team,
            teams.iter().cloned(),
        ))
        .await?;
        tracing::debug!(pool = %name, ?teams, "teams added");
        Ok(())
    }

    /// Withdraws the named teams from the pool's exact team constraint.
    /// Teams that were never present are ignored.
    pub async fn remove_teams_from_pool(&self, name: &str, teams: &[String]) -> Result<(), Error> {
        self.get_pool(name).await?;
        let constraint = self
            .exact_constraint_for_pool(name, ConstraintKind::Team)
            .await?;
        if let Some(c) = &constraint {
            if c.blacklist {
                return Err(Error::RemoveTeamsFromBlacklist);
            }
        }
        self.remove_constraint_values(name, ConstraintKind::Team, teams)
            .await?;
        tracing::debug!(pool = %name, ?teams, "teams removed");
        Ok(())
    }

    /// Clears the default flag on whichever pool holds it, or fails if
    /// one does and `force` is unset.
    async fn take_default_flag(&self, force: bool) -> Result<(), Error> {
        let holders = self
            .pools
            .find(&PoolFilter {
                default: Some(true),
                ..Default::default()
            })
            .await?;
        let holder = match holders.first() {
            Some(holder) => holder,
            None => return Ok(()),
        };
        if !force {
            return Err(Error::DefaultPoolAlreadyExists);
        }
        tracing::info!(pool = %holder.name, "taking over the default flag");
        self.pools
            .update(
                &holder.name,
                PoolPatch {
                    default: Some(false),
                    ..Default::default()
                },
            )
            .await?;
        Ok(())
    }
}

fn validate_pool(pool: &Pool) -> Result<(), Error> {
    if pool.name.is_empty() {
        return Err(Error::PoolNameRequired);
    }
    if !pool::valid_name(&pool.name) {
        return Err(ValidationError::new(
            "Invalid pool name, pool name should have at most 63 characters, containing \
             only lower case letters, numbers or dashes, starting with a letter.",
        )
        .into());
    }
    if !pool.labels.is_empty() {
        validate_labels(&pool.labels)?;
    }
    Ok(())
}
