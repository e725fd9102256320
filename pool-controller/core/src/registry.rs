//! Contracts consumed from the surrounding platform.
//!
//! The engine never owns teams, routers, services, plans, or
//! provisioners; it only intersects its constraints with whatever these
//! registries report. Implementations are expected to be safe for
//! concurrent use.

use ahash::AHashMap as HashMap;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Router {
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    pub name: String,
}

/// A compute plan: resource limits a deployment runs under.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    pub name: String,
    #[serde(default)]
    pub memory: i64,
    #[serde(default)]
    pub swap: i64,
    #[serde(default)]
    pub cpushare: i32,
    #[serde(default)]
    pub default: bool,
}

/// A storage plan offered by a volume driver.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumePlan {
    pub name: String,
}

#[async_trait::async_trait]
pub trait TeamRegistry: Send + Sync {
    async fn list(&self) -> Result<Vec<Team>>;
    async fn find_by_name(&self, name: &str) -> Result<Option<Team>>;
}

#[async_trait::async_trait]
pub trait RouterRegistry: Send + Sync {
    async fn list(&self) -> Result<Vec<Router>>;

    /// The globally configured default router, if one is configured.
    async fn default_router(&self) -> Result<Option<String>>;
}

#[async_trait::async_trait]
pub trait ServiceRegistry: Send + Sync {
    async fn get_services(&self) -> Result<Vec<Service>>;
}

#[async_trait::async_trait]
pub trait PlanRegistry: Send + Sync {
    async fn list(&self) -> Result<Vec<Plan>>;
    async fn default_plan(&self) -> Result<Plan>;
    async fn find_by_name(&self, name: &str) -> Result<Option<Plan>>;
}

#[async_trait::async_trait]
pub trait VolumePlanRegistry: Send + Sync {
    /// Volume plans grouped by their provisioning driver.
    async fn list_plans(&self) -> Result<HashMap<String, Vec<VolumePlan>>>;
}

/// A handle to a provisioner backend. The engine only needs identity;
/// callers carry richer behavior behind the same handle.
pub trait Provisioner: Send + Sync + std::fmt::Debug {
    fn name(&self) -> &str;
}

#[async_trait::async_trait]
pub trait ProvisionerRegistry: Send + Sync {
    async fn get(&self, name: &str) -> Result<Option<Arc<dyn Provisioner>>>;
    async fn get_default(&self) -> Result<Arc<dyn Provisioner>>;
}
