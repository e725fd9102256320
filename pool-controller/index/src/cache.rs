//! Memoized pool-to-provisioner resolution.

use crate::error::Error;
use crate::index::Index;
use ahash::AHashMap as HashMap;
use armada_pool_controller_core::{Pool, Provisioner};
use parking_lot::RwLock;
use std::sync::Arc;

/// A shared memo of resolved provisioner handles, keyed by pool name.
/// Clones share the same map.
#[derive(Clone, Default)]
pub struct ProvisionerCache(Arc<RwLock<HashMap<String, Arc<dyn Provisioner>>>>);

// === impl ProvisionerCache ===

impl ProvisionerCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, pool: &str) -> Option<Arc<dyn Provisioner>> {
        self.0.read().get(pool).cloned()
    }

    pub fn set(&self, pool: String, provisioner: Arc<dyn Provisioner>) {
        self.0.write().insert(pool, provisioner);
    }

    /// Drops every memoized handle, forcing the next lookup of each
    /// pool to resolve afresh.
    pub fn reset(&self) {
        self.0.write().clear();
    }
}

impl std::fmt::Debug for ProvisionerCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let pools = self.0.read().keys().cloned().collect::<Vec<_>>();
        f.debug_tuple("ProvisionerCache").field(&pools).finish()
    }
}

// === impl Index ===

impl Index {
    /// Resolves the provisioner for a pool record. A pool that names no
    /// provisioner runs on the platform default.
    pub async fn provisioner_for(&self, pool: &Pool) -> Result<Arc<dyn Provisioner>, Error> {
        match &pool.provisioner {
            Some(name) => self
                .registries
                .provisioners
                .get(name)
                .await?
                .ok_or_else(|| Error::UnknownProvisioner(name.clone())),
            None => Ok(self.registries.provisioners.get_default().await?),
        }
    }

    /// Cached name-to-provisioner resolution. The empty name stands for
    /// the platform default and is never cached.
    pub async fn get_provisioner_for_pool(
        &self,
        name: &str,
    ) -> Result<Arc<dyn Provisioner>, Error> {
        if name.is_empty() {
            return Ok(self.registries.provisioners.get_default().await?);
        }
        if let Some(provisioner) = self.cache.get(name) {
            return Ok(provisioner);
        }
        let pool = self.get_pool(name).await?;
        let provisioner = self.provisioner_for(&pool).await?;
        self.cache.set(name.to_string(), provisioner.clone());
        Ok(provisioner)
    }

    /// Empties the provisioner memo. Admin flows call this after
    /// rewiring provisioners so stale handles don't linger.
    pub fn reset_provisioner_cache(&self) {
        self.cache.reset();
    }
}
