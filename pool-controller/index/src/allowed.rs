//! Effective allowances: the live registry catalogs filtered through
//! each pool's governing constraints.

use crate::error::Error;
use crate::index::Index;
use armada_pool_controller_core::{ConstraintKind, PoolConstraint};
use std::collections::BTreeMap;

impl Index {
    /// Computes, per kind, the values the pool actually admits. Each
    /// registry-backed kind starts from the live catalog and keeps the
    /// names its governing constraint approves. `cert-issuer` has no
    /// catalog: a whitelist row contributes its values verbatim and a
    /// blacklist row contributes nothing.
    pub async fn allowed_values(
        &self,
        pool: &str,
    ) -> Result<BTreeMap<ConstraintKind, Vec<String>>, Error> {
        let (teams, routers, services, plans, volume_plans) = futures::try_join!(
            self.team_names(),
            self.router_names(),
            self.service_names(),
            self.plan_names(),
            self.volume_plan_names(),
        )?;

        let mut resolved = BTreeMap::new();
        resolved.insert(ConstraintKind::Team, teams);
        resolved.insert(ConstraintKind::Router, routers);
        resolved.insert(ConstraintKind::Service, services);
        resolved.insert(ConstraintKind::Plan, plans);
        resolved.insert(ConstraintKind::VolumePlan, volume_plans);

        let governing = self.constraints_for_pool(pool, &ConstraintKind::ALL).await?;
        for (kind, constraint) in governing {
            if kind == ConstraintKind::CertIssuer {
                if !constraint.blacklist {
                    resolved.insert(kind, constraint.values);
                }
                continue;
            }
            if let Some(names) = resolved.get_mut(&kind) {
                names.retain(|name| constraint.check(name));
            }
        }
        Ok(resolved)
    }

    /// Teams allowed to deploy to the pool.
    pub async fn get_teams(&self, pool: &str) -> Result<Vec<String>, Error> {
        self.allowed(pool, ConstraintKind::Team).await
    }

    /// Routers the pool's apps may bind.
    pub async fn get_routers(&self, pool: &str) -> Result<Vec<String>, Error> {
        self.allowed(pool, ConstraintKind::Router).await
    }

    /// Service kinds that may be bound in the pool.
    pub async fn get_services(&self, pool: &str) -> Result<Vec<String>, Error> {
        self.allowed(pool, ConstraintKind::Service).await
    }

    /// Plans apps in the pool may run under.
    pub async fn get_plans(&self, pool: &str) -> Result<Vec<String>, Error> {
        self.allowed(pool, ConstraintKind::Plan).await
    }

    /// Volume plans usable in the pool.
    pub async fn get_volume_plans(&self, pool: &str) -> Result<Vec<String>, Error> {
        self.allowed(pool, ConstraintKind::VolumePlan).await
    }

    /// Certificate issuers usable in the pool.
    pub async fn get_cert_issuers(&self, pool: &str) -> Result<Vec<String>, Error> {
        self.allowed(pool, ConstraintKind::CertIssuer).await
    }

    /// The governing cert-issuer row itself, for callers that enforce
    /// deny rules rather than pick from an allowance.
    pub async fn cert_issuer_constraint(
        &self,
        pool: &str,
    ) -> Result<Option<PoolConstraint>, Error> {
        let mut governing = self
            .constraints_for_pool(pool, &[ConstraintKind::CertIssuer])
            .await?;
        Ok(governing.remove(&ConstraintKind::CertIssuer))
    }

    async fn allowed(&self, pool: &str, kind: ConstraintKind) -> Result<Vec<String>, Error> {
        let mut resolved = self.allowed_values(pool).await?;
        match resolved.remove(&kind) {
            Some(values) if !values.is_empty() => Ok(values),
            _ => Err(Error::NoneAllowed(kind)),
        }
    }

    pub(crate) async fn team_names(&self) -> anyhow::Result<Vec<String>> {
        let teams = self.registries.teams.list().await?;
        Ok(teams.into_iter().map(|t| t.name).collect())
    }

    pub(crate) async fn router_names(&self) -> anyhow::Result<Vec<String>> {
        let routers = self.registries.routers.list().await?;
        Ok(routers.into_iter().map(|r| r.name).collect())
    }

    async fn service_names(&self) -> anyhow::Result<Vec<String>> {
        let services = self.registries.services.get_services().await?;
        Ok(services.into_iter().map(|s| s.name).collect())
    }

    async fn plan_names(&self) -> anyhow::Result<Vec<String>> {
        let plans = self.registries.plans.list().await?;
        Ok(plans.into_iter().map(|p| p.name).collect())
    }

    // Volume plans come back keyed by provisioner driver; the allowance
    // cares about names. Sorted because map order isn't stable.
    async fn volume_plan_names(&self) -> anyhow::Result<Vec<String>> {
        let by_driver = self.registries.volume_plans.list_plans().await?;
        let mut names: Vec<String> = by_driver
            .into_iter()
            .flat_map(|(_, plans)| plans)
            .map(|p| p.name)
            .collect();
        names.sort();
        Ok(names)
    }
}
