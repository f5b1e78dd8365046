use std::sync::Arc;
use valyan_audit::{AuditEvent, AuditLog, AuditLogError, AuditLogFilter, AuditLogId};
use valyan_storage::*;
use valyan_store_memory::{MemoryAuditLog, MemoryStore};
use valyan_store_sqlite::SqliteStore;

/// URL that selects the in-memory backend.
pub const MEMORY_URL: &str = "memory";

/// StoreBackend abstracts over the SQLite and in-memory implementations
pub enum StoreBackend {
    Sqlite(Arc<SqliteStore>),
    Memory {
        store: Arc<MemoryStore>,
        audit: Arc<MemoryAuditLog>,
    },
}

impl StoreBackend {
    /// Open the backend a URL names. `None` means the default SQLite file.
    pub async fn open(database_url: Option<&str>) -> Result<Self, StoreError> {
        match database_url {
            Some(MEMORY_URL) => Ok(Self::memory()),
            Some(url) => Ok(StoreBackend::Sqlite(Arc::new(SqliteStore::open(url).await?))),
            None => Ok(StoreBackend::Sqlite(Arc::new(
                SqliteStore::open_default().await?,
            ))),
        }
    }

    pub fn memory() -> Self {
        StoreBackend::Memory {
            store: Arc::new(MemoryStore::new()),
            audit: Arc::new(MemoryAuditLog::new()),
        }
    }

    pub fn is_memory(&self) -> bool {
        matches!(self, StoreBackend::Memory { .. })
    }
}

#[async_trait::async_trait]
impl PermissionStore for StoreBackend {
    async fn get_permissions_for_role(&self, role_name: &str) -> Result<Vec<String>, StoreError> {
        match self {
            StoreBackend::Sqlite(s) => s.get_permissions_for_role(role_name).await,
            StoreBackend::Memory { store, .. } => store.get_permissions_for_role(role_name).await,
        }
    }
}

#[async_trait::async_trait]
impl RoleStore for StoreBackend {
    async fn create_role(&self, params: &CreateRoleParams) -> Result<Role, StoreError> {
        match self {
            StoreBackend::Sqlite(s) => s.create_role(params).await,
            StoreBackend::Memory { store, .. } => store.create_role(params).await,
        }
    }

    async fn get_role_by_name(&self, name: &str) -> Result<Role, StoreError> {
        match self {
            StoreBackend::Sqlite(s) => s.get_role_by_name(name).await,
            StoreBackend::Memory { store, .. } => store.get_role_by_name(name).await,
        }
    }

    async fn list_roles(&self) -> Result<Vec<RoleSummary>, StoreError> {
        match self {
            StoreBackend::Sqlite(s) => s.list_roles().await,
            StoreBackend::Memory { store, .. } => store.list_roles().await,
        }
    }

    async fn rename_role(&self, name: &str, new_name: &str) -> Result<(), StoreError> {
        match self {
            StoreBackend::Sqlite(s) => s.rename_role(name, new_name).await,
            StoreBackend::Memory { store, .. } => store.rename_role(name, new_name).await,
        }
    }

    async fn set_role_active(&self, name: &str, active: bool) -> Result<(), StoreError> {
        match self {
            StoreBackend::Sqlite(s) => s.set_role_active(name, active).await,
            StoreBackend::Memory { store, .. } => store.set_role_active(name, active).await,
        }
    }

    async fn delete_role(&self, name: &str) -> Result<(), StoreError> {
        match self {
            StoreBackend::Sqlite(s) => s.delete_role(name).await,
            StoreBackend::Memory { store, .. } => store.delete_role(name).await,
        }
    }

    async fn list_role_permissions(&self, name: &str) -> Result<Vec<RolePermission>, StoreError> {
        match self {
            StoreBackend::Sqlite(s) => s.list_role_permissions(name).await,
            StoreBackend::Memory { store, .. } => store.list_role_permissions(name).await,
        }
    }

    async fn set_role_permissions(&self, name: &str, codes: &[String]) -> Result<(), StoreError> {
        match self {
            StoreBackend::Sqlite(s) => s.set_role_permissions(name, codes).await,
            StoreBackend::Memory { store, .. } => store.set_role_permissions(name, codes).await,
        }
    }

    async fn add_role_permission(&self, name: &str, code: &str) -> Result<bool, StoreError> {
        match self {
            StoreBackend::Sqlite(s) => s.add_role_permission(name, code).await,
            StoreBackend::Memory { store, .. } => store.add_role_permission(name, code).await,
        }
    }

    async fn remove_role_permission(&self, name: &str, code: &str) -> Result<bool, StoreError> {
        match self {
            StoreBackend::Sqlite(s) => s.remove_role_permission(name, code).await,
            StoreBackend::Memory { store, .. } => store.remove_role_permission(name, code).await,
        }
    }
}

#[async_trait::async_trait]
impl OwnershipLookup for StoreBackend {
    async fn is_owner(
        &self,
        principal_id: &PrincipalId,
        resource_type: &str,
        resource_id: &str,
    ) -> Result<bool, StoreError> {
        match self {
            StoreBackend::Sqlite(s) => s.is_owner(principal_id, resource_type, resource_id).await,
            StoreBackend::Memory { store, .. } => {
                store.is_owner(principal_id, resource_type, resource_id).await
            }
        }
    }

    async fn assign_owner(&self, params: &AssignOwnerParams) -> Result<(), StoreError> {
        match self {
            StoreBackend::Sqlite(s) => s.assign_owner(params).await,
            StoreBackend::Memory { store, .. } => store.assign_owner(params).await,
        }
    }
}

#[async_trait::async_trait]
impl AuditLog for StoreBackend {
    async fn record(&self, event: AuditEvent) -> Result<(), AuditLogError> {
        match self {
            StoreBackend::Sqlite(s) => s.record(event).await,
            StoreBackend::Memory { audit, .. } => audit.record(event).await,
        }
    }

    async fn query(&self, filter: AuditLogFilter) -> Result<Vec<AuditEvent>, AuditLogError> {
        match self {
            StoreBackend::Sqlite(s) => s.query(filter).await,
            StoreBackend::Memory { audit, .. } => audit.query(filter).await,
        }
    }

    async fn get(&self, id: AuditLogId) -> Result<AuditEvent, AuditLogError> {
        match self {
            StoreBackend::Sqlite(s) => s.get(id).await,
            StoreBackend::Memory { audit, .. } => audit.get(id).await,
        }
    }

    async fn count(&self, filter: AuditLogFilter) -> Result<u64, AuditLogError> {
        match self {
            StoreBackend::Sqlite(s) => s.count(filter).await,
            StoreBackend::Memory { audit, .. } => audit.count(filter).await,
        }
    }
}
