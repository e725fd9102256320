#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

pub mod constraint;
pub mod labels;
pub mod pool;
pub mod pool_match;
pub mod registry;

pub use self::constraint::{
    compare_specificity, ConstraintKind, InvalidConstraintKind, PoolConstraint,
};
pub use self::labels::{Affinity, Labels, AFFINITY_LABEL};
pub use self::pool::Pool;
pub use self::registry::{
    Plan, PlanRegistry, Provisioner, ProvisionerRegistry, Router, RouterRegistry, Service,
    ServiceRegistry, Team, TeamRegistry, VolumePlan, VolumePlanRegistry,
};

use thiserror::Error;

/// A human-readable rejection of caller-supplied input.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ValidationError {
    pub message: String,
}

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
