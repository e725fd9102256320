//! Keeps track of which teams, routers, services, plans, volume plans,
//! and certificate issuers every pool may use.
//!
//! Constraints are rows keyed by `(pool_expr, kind)`. A row applies to
//! every pool whose name its expression matches, and when several rows
//! of one kind apply, the most specific expression governs. On top of
//! the rows, [`Index`] layers the lifecycle rules: single default pool,
//! the wildcard team constraint coupled to public and default pools,
//! and memoized provisioner resolution.

#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

mod allowed;
mod cache;
mod constraints;
mod defaults;
mod error;
mod index;
mod memory;
mod migrate;
mod store;
mod summary;


pub use self::cache::ProvisionerCache;
pub use self::error::Error;
pub use self::index::{AddPoolOptions, Index, PoolUpdateOptions, Registries};
pub use self::memory::MemoryStore;
pub use self::migrate::LegacyPoolRow;
pub use self::store::{
    ConstraintQuery, ConstraintStore, PoolFilter, PoolPatch, PoolStore, StoreError,
};
pub use self::summary::PoolSummary;
