//! Constraint rows and the rules for deciding which row governs a pool.

use crate::pool_match;
use serde::{Deserialize, Serialize};
use std::{cmp::Ordering, fmt, str::FromStr};
use thiserror::Error;

/// The closed set of domains a constraint can govern. The serialized
/// names are part of the wire format and never change.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ConstraintKind {
    #[serde(rename = "team")]
    Team,
    #[serde(rename = "router")]
    Router,
    #[serde(rename = "service")]
    Service,
    #[serde(rename = "plan")]
    Plan,
    #[serde(rename = "volume-plan")]
    VolumePlan,
    #[serde(rename = "cert-issuer")]
    CertIssuer,
}

/// The field name was not one of the six recognized constraint kinds.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error(
    "invalid constraint type. Valid types are: team, router, service, plan, volume-plan, \
     cert-issuer"
)]
pub struct InvalidConstraintKind(pub String);

/// A constraint row: bounds which `values` of `kind` are permitted for
/// pools whose name matches `pool_expr`. Identified by
/// `(pool_expr, kind)`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolConstraint {
    #[serde(rename = "poolExpr")]
    pub pool_expr: String,
    #[serde(rename = "field")]
    pub kind: ConstraintKind,
    pub values: Vec<String>,
    #[serde(default)]
    pub blacklist: bool,
}

// === impl ConstraintKind ===

impl ConstraintKind {
    pub const ALL: [Self; 6] = [
        Self::Team,
        Self::Router,
        Self::Service,
        Self::Plan,
        Self::VolumePlan,
        Self::CertIssuer,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Team => "team",
            Self::Router => "router",
            Self::Service => "service",
            Self::Plan => "plan",
            Self::VolumePlan => "volume-plan",
            Self::CertIssuer => "cert-issuer",
        }
    }
}

impl FromStr for ConstraintKind {
    type Err = InvalidConstraintKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "team" => Ok(Self::Team),
            "router" => Ok(Self::Router),
            "service" => Ok(Self::Service),
            "plan" => Ok(Self::Plan),
            "volume-plan" => Ok(Self::VolumePlan),
            "cert-issuer" => Ok(Self::CertIssuer),
            s => Err(InvalidConstraintKind(s.to_string())),
        }
    }
}

impl fmt::Display for ConstraintKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.as_str().fmt(f)
    }
}

// === impl PoolConstraint ===

impl PoolConstraint {
    pub fn new<T: Into<String>>(
        pool_expr: impl Into<String>,
        kind: ConstraintKind,
        values: impl IntoIterator<Item = T>,
    ) -> Self {
        Self {
            pool_expr: pool_expr.into(),
            kind,
            values: values.into_iter().map(Into::into).collect(),
            blacklist: false,
        }
    }

    /// Exact membership check: a whitelist approves exactly its listed
    /// values; a blacklist approves everything else.
    pub fn check_exact(&self, value: &str) -> bool {
        if self.values.iter().any(|v| v == value) {
            return !self.blacklist;
        }
        self.blacklist
    }

    /// Glob membership check: each stored value is itself a pool
    /// expression, so `py*` approves `python` on a whitelist and rejects
    /// it on a blacklist.
    pub fn check(&self, value: &str) -> bool {
        if self.values.iter().any(|v| pool_match::matches(v, value)) {
            return !self.blacklist;
        }
        self.blacklist
    }

    /// Whether this row is a whitelist explicitly admitting every value.
    pub fn allows_all(&self) -> bool {
        !self.blacklist && self.check_exact("*")
    }

    /// Whether any stored value carries a `*` wildcard.
    pub fn has_wildcard(&self) -> bool {
        self.values.iter().any(|v| v.contains('*'))
    }
}

/// Total specificity order for governing-constraint resolution: longer
/// expressions sort first, then fewer wildcards, then lexically by
/// `(pool_expr, kind)` so equal-specificity rows order stably.
pub fn compare_specificity(a: &PoolConstraint, b: &PoolConstraint) -> Ordering {
    b.pool_expr
        .len()
        .cmp(&a.pool_expr.len())
        .then_with(|| {
            pool_match::wildcards(&a.pool_expr).cmp(&pool_match::wildcards(&b.pool_expr))
        })
        .then_with(|| a.pool_expr.cmp(&b.pool_expr))
        .then_with(|| a.kind.as_str().cmp(b.kind.as_str()))
}
