//! In-memory role, permission, ownership and audit storage.
//!
//! This implementation is suitable for:
//! - Single process deployments
//! - Development and testing
//!
//! Nothing survives a restart. Use valyan-store-sqlite for persistent data.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use valyan_audit::{AuditEvent, AuditLog, AuditLogError, AuditLogFilter, AuditLogId};
use valyan_storage::{
    AssignOwnerParams, CreateRoleParams, OwnershipLookup, PermissionStore, PrincipalId,
    ResourceOwner, Role, RoleId, RolePermission, RoleStore, RoleSummary, StoreError,
};

/// Roles, role permissions and resource owners held in concurrent maps.
pub struct MemoryStore {
    /// Keyed by role name.
    roles: DashMap<String, Role>,
    /// Permission code → granted_at, per role.
    permissions: DashMap<RoleId, BTreeMap<String, DateTime<Utc>>>,
    /// Keyed by (resource_type, resource_id).
    owners: DashMap<(String, String), ResourceOwner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            roles: DashMap::new(),
            permissions: DashMap::new(),
            owners: DashMap::new(),
        }
    }

    fn role_id(&self, name: &str) -> Result<RoleId, StoreError> {
        self.roles
            .get(name)
            .map(|role| role.id)
            .ok_or(StoreError::NotFound)
    }

    fn touch(&self, name: &str) {
        if let Some(mut role) = self.roles.get_mut(name) {
            role.updated_at = Utc::now();
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PermissionStore for MemoryStore {
    async fn get_permissions_for_role(&self, role_name: &str) -> Result<Vec<String>, StoreError> {
        let Some(role) = self.roles.get(role_name).map(|r| r.value().clone()) else {
            return Ok(Vec::new());
        };
        if !role.is_active {
            return Ok(Vec::new());
        }
        Ok(self
            .permissions
            .get(&role.id)
            .map(|codes| codes.keys().cloned().collect())
            .unwrap_or_default())
    }
}

#[async_trait]
impl RoleStore for MemoryStore {
    async fn create_role(&self, params: &CreateRoleParams) -> Result<Role, StoreError> {
        match self.roles.entry(params.name.clone()) {
            Entry::Occupied(_) => Err(StoreError::AlreadyExists),
            Entry::Vacant(slot) => {
                let now = Utc::now();
                let role = Role {
                    id: RoleId::new(),
                    name: params.name.clone(),
                    description: params.description.clone(),
                    is_active: true,
                    created_at: now,
                    updated_at: now,
                };
                slot.insert(role.clone());
                Ok(role)
            }
        }
    }

    async fn get_role_by_name(&self, name: &str) -> Result<Role, StoreError> {
        self.roles
            .get(name)
            .map(|role| role.value().clone())
            .ok_or(StoreError::NotFound)
    }

    async fn list_roles(&self) -> Result<Vec<RoleSummary>, StoreError> {
        let mut summaries: Vec<RoleSummary> = self
            .roles
            .iter()
            .map(|role| RoleSummary {
                role: role.value().clone(),
                permission_count: self
                    .permissions
                    .get(&role.id)
                    .map(|codes| codes.len())
                    .unwrap_or(0),
            })
            .collect();
        summaries.sort_by(|a, b| a.role.name.cmp(&b.role.name));
        Ok(summaries)
    }

    async fn rename_role(&self, name: &str, new_name: &str) -> Result<(), StoreError> {
        if name == new_name {
            return self.role_id(name).map(|_| ());
        }
        if self.roles.contains_key(new_name) {
            return Err(StoreError::AlreadyExists);
        }
        let (_, mut role) = self.roles.remove(name).ok_or(StoreError::NotFound)?;
        let lost = match self.roles.entry(new_name.to_string()) {
            Entry::Occupied(_) => Some(role),
            Entry::Vacant(slot) => {
                role.name = new_name.to_string();
                role.updated_at = Utc::now();
                slot.insert(role);
                None
            }
        };
        match lost {
            // Lost a race for the new name; put the role back.
            Some(role) => {
                self.roles.insert(name.to_string(), role);
                Err(StoreError::AlreadyExists)
            }
            None => Ok(()),
        }
    }

    async fn set_role_active(&self, name: &str, active: bool) -> Result<(), StoreError> {
        let mut role = self.roles.get_mut(name).ok_or(StoreError::NotFound)?;
        role.is_active = active;
        role.updated_at = Utc::now();
        Ok(())
    }

    async fn delete_role(&self, name: &str) -> Result<(), StoreError> {
        let (_, role) = self.roles.remove(name).ok_or(StoreError::NotFound)?;
        self.permissions.remove(&role.id);
        Ok(())
    }

    async fn list_role_permissions(&self, name: &str) -> Result<Vec<RolePermission>, StoreError> {
        let role_id = self.role_id(name)?;
        Ok(self
            .permissions
            .get(&role_id)
            .map(|codes| {
                codes
                    .iter()
                    .map(|(code, granted_at)| RolePermission {
                        role_id,
                        permission_code: code.clone(),
                        granted_at: *granted_at,
                    })
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn set_role_permissions(&self, name: &str, codes: &[String]) -> Result<(), StoreError> {
        let role_id = self.role_id(name)?;
        let now = Utc::now();
        let mut entry = self.permissions.entry(role_id).or_default();
        let previous = std::mem::take(&mut *entry);
        for code in codes {
            // Keep the original grant time for codes the role already had.
            let granted_at = previous.get(code).copied().unwrap_or(now);
            entry.insert(code.clone(), granted_at);
        }
        drop(entry);
        self.touch(name);
        Ok(())
    }

    async fn add_role_permission(&self, name: &str, code: &str) -> Result<bool, StoreError> {
        let role_id = self.role_id(name)?;
        let added = {
            let mut entry = self.permissions.entry(role_id).or_default();
            match entry.entry(code.to_string()) {
                std::collections::btree_map::Entry::Occupied(_) => false,
                std::collections::btree_map::Entry::Vacant(slot) => {
                    slot.insert(Utc::now());
                    true
                }
            }
        };
        if added {
            self.touch(name);
        }
        Ok(added)
    }

    async fn remove_role_permission(&self, name: &str, code: &str) -> Result<bool, StoreError> {
        let role_id = self.role_id(name)?;
        let removed = self
            .permissions
            .get_mut(&role_id)
            .map(|mut codes| codes.remove(code).is_some())
            .unwrap_or(false);
        if removed {
            self.touch(name);
        }
        Ok(removed)
    }
}

#[async_trait]
impl OwnershipLookup for MemoryStore {
    async fn is_owner(
        &self,
        principal_id: &PrincipalId,
        resource_type: &str,
        resource_id: &str,
    ) -> Result<bool, StoreError> {
        self.owners
            .get(&(resource_type.to_string(), resource_id.to_string()))
            .map(|owner| owner.principal_id == *principal_id)
            .ok_or(StoreError::NotFound)
    }

    async fn assign_owner(&self, params: &AssignOwnerParams) -> Result<(), StoreError> {
        self.owners.insert(
            (params.resource_type.clone(), params.resource_id.clone()),
            ResourceOwner {
                resource_type: params.resource_type.clone(),
                resource_id: params.resource_id.clone(),
                principal_id: params.principal_id,
                assigned_at: Utc::now(),
            },
        );
        Ok(())
    }
}

/// Audit log kept in memory, newest first on query.
pub struct MemoryAuditLog {
    events: DashMap<AuditLogId, AuditEvent>,
}

impl MemoryAuditLog {
    pub fn new() -> Self {
        Self {
            events: DashMap::new(),
        }
    }

    fn matching(&self, filter: &AuditLogFilter) -> Result<Vec<AuditEvent>, AuditLogError> {
        filter.validate()?;
        let mut events: Vec<AuditEvent> = self
            .events
            .iter()
            .filter(|e| filter.matches(e.value()))
            .map(|e| e.value().clone())
            .collect();
        // Ids are v7 UUIDs, so they break timestamp ties in creation order.
        events.sort_by(|a, b| {
            b.timestamp
                .cmp(&a.timestamp)
                .then_with(|| b.id.0.cmp(&a.id.0))
        });
        Ok(events)
    }
}

impl Default for MemoryAuditLog {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AuditLog for MemoryAuditLog {
    async fn record(&self, event: AuditEvent) -> Result<(), AuditLogError> {
        self.events.insert(event.id, event);
        Ok(())
    }

    async fn query(&self, filter: AuditLogFilter) -> Result<Vec<AuditEvent>, AuditLogError> {
        let offset = filter.offset.unwrap_or(0) as usize;
        let limit = filter.limit.map(|l| l as usize).unwrap_or(usize::MAX);
        Ok(self
            .matching(&filter)?
            .into_iter()
            .skip(offset)
            .take(limit)
            .collect())
    }

    async fn get(&self, id: AuditLogId) -> Result<AuditEvent, AuditLogError> {
        self.events
            .get(&id)
            .map(|e| e.value().clone())
            .ok_or(AuditLogError::NotFound(id))
    }

    async fn count(&self, filter: AuditLogFilter) -> Result<u64, AuditLogError> {
        Ok(self.matching(&filter)?.len() as u64)
    }
}
