//! Picking the router and plan an app lands on when its owner didn't
//! choose one.

use crate::error::Error;
use crate::index::Index;
use armada_pool_controller_core::{ConstraintKind, Plan, ValidationError};

impl Index {
    /// The router for apps created without one. A plain whitelist's
    /// first value wins if that router is live; blacklists and wildcard
    /// grants fall through to the effective allowance, which decides
    /// only when it is unambiguous.
    pub async fn get_default_router(&self, pool: &str) -> Result<String, Error> {
        let mut governing = self
            .constraints_for_pool(pool, &[ConstraintKind::Router])
            .await?;
        let constraint = match governing.remove(&ConstraintKind::Router) {
            Some(c) if !c.values.is_empty() => c,
            _ => return self.configured_default_router().await,
        };

        if constraint.blacklist || constraint.has_wildcard() {
            let allowed = self.allowed_values(pool).await?;
            let routers = allowed
                .get(&ConstraintKind::Router)
                .map(Vec::as_slice)
                .unwrap_or_default();
            if let [only] = routers {
                return Ok(only.clone());
            }
            return self.configured_default_router().await;
        }

        let live = self.router_names().await?;
        if live.iter().any(|r| *r == constraint.values[0]) {
            return Ok(constraint.values[0].clone());
        }
        self.configured_default_router().await
    }

    /// The plan for apps created without one, following the same shape
    /// as router selection except that the registry's default plan is
    /// the fallback.
    pub async fn get_default_plan(&self, pool: &str) -> Result<Plan, Error> {
        let mut governing = self
            .constraints_for_pool(pool, &[ConstraintKind::Plan])
            .await?;
        let default_plan = self.registries.plans.default_plan().await?;
        let constraint = match governing.remove(&ConstraintKind::Plan) {
            Some(c) if !c.values.is_empty() => c,
            _ => return Ok(default_plan),
        };

        if constraint.blacklist || constraint.has_wildcard() {
            let allowed = self.allowed_values(pool).await?;
            let first = allowed
                .get(&ConstraintKind::Plan)
                .and_then(|plans| plans.first());
            let first = match first {
                Some(first) => first,
                None => return Ok(default_plan),
            };
            return self
                .registries
                .plans
                .find_by_name(first)
                .await?
                .ok_or_else(|| Error::Registry(anyhow::anyhow!("plan {:?} not found", first)));
        }

        match self.registries.plans.find_by_name(&constraint.values[0]).await? {
            Some(plan) => Ok(plan),
            None => Ok(default_plan),
        }
    }

    /// Rejects any proposed router the pool doesn't allow. An empty
    /// proposal passes.
    pub async fn validate_routers(&self, pool: &str, proposed: &[String]) -> Result<(), Error> {
        if proposed.is_empty() {
            return Ok(());
        }
        let available = match self.get_routers(pool).await {
            Ok(available) => available,
            Err(e) => return Err(ValidationError::new(e.to_string()).into()),
        };
        for name in proposed {
            if !available.contains(name) {
                let message = format!(
                    "router {:?} is not available for pool {:?}. Available routers are: {:?}",
                    name,
                    pool,
                    available.join(", "),
                );
                return Err(ValidationError::new(message).into());
            }
        }
        Ok(())
    }

    /// Rejects any proposed service the pool doesn't allow.
    pub async fn validate_pool_service(
        &self,
        pool: &str,
        services: &[String],
    ) -> Result<(), Error> {
        let available = self.get_services(pool).await?;
        for service in services {
            if !available.contains(service) {
                let message = format!(
                    "service {:?} is not available for pool {:?}. Available services are: {:?}",
                    service,
                    pool,
                    available.join(", "),
                );
                return Err(ValidationError::new(message).into());
            }
        }
        Ok(())
    }

    async fn configured_default_router(&self) -> Result<String, Error> {
        self.registries
            .routers
            .default_router()
            .await?
            .ok_or(Error::DefaultRouterNotFound)
    }
}
