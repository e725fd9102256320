use crate::store::StoreError;
use armada_pool_controller_core::{ConstraintKind, InvalidConstraintKind, ValidationError};
use thiserror::Error;

/// Engine failures. Callers branch on the sentinel variants; everything
/// operational folds into `Store` or `Registry`.
#[derive(Debug, Error)]
pub enum Error {
    #[error("pool does not exist")]
    PoolNotFound,

    #[error("pool already exists")]
    PoolAlreadyExists,

    #[error("pool name is required")]
    PoolNameRequired,

    #[error("default pool already exists")]
    DefaultPoolAlreadyExists,

    #[error("public pool or default pool can't have teams")]
    PublicDefaultPoolCantHaveTeams,

    /// The pool resolves to an empty allowance for this kind, e.g.
    /// "no team found for pool".
    #[error("no {0} found for pool")]
    NoneAllowed(ConstraintKind),

    #[error("the default router is undefined")]
    DefaultRouterNotFound,

    #[error("unable to add teams to blacklist constraint")]
    AddTeamsToBlacklist,

    #[error("unable to remove teams from blacklist constraint")]
    RemoveTeamsFromBlacklist,

    #[error("team {0:?} already exists in pool")]
    TeamAlreadyExists(String),

    #[error("provisioner {0:?} does not exist")]
    UnknownProvisioner(String),

    #[error(transparent)]
    InvalidConstraintKind(#[from] InvalidConstraintKind),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Registry(#[from] anyhow::Error),
}
