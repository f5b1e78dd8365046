//! Role → permission resolution with a lazily populated cache.
//!
//! The cache maps a role name to a slot holding the resolved set and an
//! invalidation epoch. A global epoch covers "invalidate everything".
//! A population records both epochs before it reads the store and only
//! commits if neither moved, so an invalidation that races a population
//! always wins and the role ends up uncached.
//!
//! Populations run on their own tokio task: a caller that is cancelled
//! mid-fetch does not abort the fetch, and the result still lands in the
//! cache for the next caller.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use valyan_storage::{PermissionStore, StoreError};

use crate::error::AuthzError;

/// A resolved, immutable permission set shared between cache and callers.
pub type PermissionSet = Arc<BTreeSet<String>>;

/// Answers "does role R hold permission P".
#[async_trait]
pub trait PermissionResolver: Send + Sync {
    /// Exact, case-sensitive membership. Unknown roles hold nothing.
    async fn has_permission(&self, role: &str, code: &str) -> Result<bool, AuthzError>;

    /// The full resolved set for `role`; empty for unknown roles. Warms the cache.
    async fn permissions_for_role(&self, role: &str) -> Result<PermissionSet, AuthzError>;

    /// Drop the cached entry for `role`, or every entry when `None`.
    ///
    /// Mutators call this right after their change is committed.
    fn invalidate_cache(&self, role: Option<&str>);

    /// When `role`'s entry was populated, if it is cached.
    fn cached_at(&self, role: &str) -> Option<DateTime<Utc>>;

    /// Names of all currently cached roles, sorted.
    fn cached_roles(&self) -> Vec<String>;
}

#[derive(Clone, Debug)]
struct CachedPermissions {
    set: PermissionSet,
    populated_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct RoleSlot {
    permissions: Option<CachedPermissions>,
    /// Bumped by every per-role invalidation. Slots are never removed so the
    /// epoch never goes backwards.
    epoch: u64,
}

/// Epochs observed when a population started.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct PopulationToken {
    global: u64,
    role: u64,
}

struct Shared {
    store: Arc<dyn PermissionStore>,
    /// One slot per role name that was resolved, or invalidated mid-population.
    /// Role names come from the principals' role claims, a small closed set,
    /// so the map stays bounded without eviction.
    slots: DashMap<String, RoleSlot>,
    global_epoch: AtomicU64,
    /// One gate per role with a population in flight.
    inflight: DashMap<String, Arc<Mutex<()>>>,
}

impl Shared {
    fn lookup(&self, role: &str) -> Option<PermissionSet> {
        self.slots
            .get(role)
            .and_then(|slot| slot.permissions.as_ref().map(|p| p.set.clone()))
    }

    fn token(&self, role: &str) -> PopulationToken {
        // Global first: a global invalidation bumps it before clearing slots.
        let global = self.global_epoch.load(Ordering::SeqCst);
        let role = self.slots.get(role).map(|slot| slot.epoch).unwrap_or(0);
        PopulationToken { global, role }
    }

    /// Store `set` for `role` unless an invalidation happened since `token` was taken.
    fn commit(&self, role: &str, token: PopulationToken, set: PermissionSet) -> bool {
        let mut slot = self.slots.entry(role.to_string()).or_default();
        if slot.epoch != token.role || self.global_epoch.load(Ordering::SeqCst) != token.global {
            return false;
        }
        slot.permissions = Some(CachedPermissions {
            set,
            populated_at: Utc::now(),
        });
        true
    }

    fn gate(&self, role: &str) -> Arc<Mutex<()>> {
        self.inflight
            .entry(role.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    async fn populate(self: Arc<Self>, role: String) -> Result<PermissionSet, AuthzError> {
        let gate = self.gate(&role);
        let _guard = gate.lock().await;

        let result = self.populate_locked(&role).await;

        // Only the map and this task hold the gate: nobody else is waiting on it.
        self.inflight
            .remove_if(&role, |_, g| Arc::strong_count(g) == 2);
        result
    }

    async fn populate_locked(&self, role: &str) -> Result<PermissionSet, AuthzError> {
        // Whoever held the gate before us may have filled the entry already.
        if let Some(set) = self.lookup(role) {
            return Ok(set);
        }

        let token = self.token(role);
        let codes = match self.store.get_permissions_for_role(role).await {
            Ok(codes) => codes,
            Err(StoreError::NotFound) => Vec::new(),
            Err(e) => {
                warn!(role, error = %e, "Permission store lookup failed");
                return Err(AuthzError::ServiceUnavailable(e.to_string()));
            }
        };

        let set: PermissionSet = Arc::new(codes.into_iter().collect());
        if self.commit(role, token, set.clone()) {
            debug!(role, permissions = set.len(), "Permission cache populated");
        } else {
            debug!(role, "Permission cache invalidated during population; result not cached");
        }
        Ok(set)
    }
}

/// The cache-backed [`PermissionResolver`].
///
/// Cheap to clone; clones share one cache. Construct one per process and
/// hand it to everything that evaluates or mutates permissions.
#[derive(Clone)]
pub struct PermissionService {
    shared: Arc<Shared>,
}

impl PermissionService {
    pub fn new(store: Arc<dyn PermissionStore>) -> Self {
        Self {
            shared: Arc::new(Shared {
                store,
                slots: DashMap::new(),
                global_epoch: AtomicU64::new(0),
                inflight: DashMap::new(),
            }),
        }
    }
}

#[async_trait]
impl PermissionResolver for PermissionService {
    async fn has_permission(&self, role: &str, code: &str) -> Result<bool, AuthzError> {
        if code.is_empty() {
            return Err(AuthzError::invalid("permission code must not be empty"));
        }
        let set = self.permissions_for_role(role).await?;
        Ok(set.contains(code))
    }

    async fn permissions_for_role(&self, role: &str) -> Result<PermissionSet, AuthzError> {
        if role.is_empty() {
            return Err(AuthzError::invalid("role must not be empty"));
        }
        if let Some(set) = self.shared.lookup(role) {
            return Ok(set);
        }

        let shared = self.shared.clone();
        let task = tokio::spawn(shared.populate(role.to_string()));
        task.await.map_err(|e| {
            warn!(role, error = %e, "Permission population task failed");
            AuthzError::ServiceUnavailable(format!("population task failed: {}", e))
        })?
    }

    fn invalidate_cache(&self, role: Option<&str>) {
        match role {
            Some(role) => {
                if let Some(mut slot) = self.shared.slots.get_mut(role) {
                    slot.epoch += 1;
                    slot.permissions = None;
                } else if self.shared.inflight.contains_key(role) {
                    // A population took its token before any slot existed.
                    let mut slot = self.shared.slots.entry(role.to_string()).or_default();
                    slot.epoch += 1;
                    slot.permissions = None;
                }
                info!(role, "Permission cache invalidated");
            }
            None => {
                self.shared.global_epoch.fetch_add(1, Ordering::SeqCst);
                for mut slot in self.shared.slots.iter_mut() {
                    slot.permissions = None;
                }
                info!("Permission cache invalidated for all roles");
            }
        }
    }

    fn cached_at(&self, role: &str) -> Option<DateTime<Utc>> {
        self.shared
            .slots
            .get(role)
            .and_then(|slot| slot.permissions.as_ref().map(|p| p.populated_at))
    }

    fn cached_roles(&self) -> Vec<String> {
        let mut roles: Vec<String> = self
            .shared
            .slots
            .iter()
            .filter(|slot| slot.permissions.is_some())
            .map(|slot| slot.key().clone())
            .collect();
        roles.sort();
        roles
    }
}
