//! The store traits that backends implement.

use crate::types::*;
use crate::StoreError;

/// Role → permission lookup consumed by the permission resolution service.
///
/// This is the "expensive" call the authorization cache sits in front of,
/// so implementations should answer with a single round-trip.
#[cfg_attr(feature = "test-support", mockall::automock)]
#[async_trait::async_trait]
pub trait PermissionStore: Send + Sync {
    /// Permission codes granted to the role with this exact (case-sensitive) name.
    ///
    /// Unknown and inactive roles yield an empty list, not `NotFound`.
    async fn get_permissions_for_role(&self, role_name: &str) -> Result<Vec<String>, StoreError>;
}

/// Role administration.
///
/// All methods address roles by their unique name.
#[cfg_attr(feature = "test-support", mockall::automock)]
#[async_trait::async_trait]
pub trait RoleStore: Send + Sync {
    // ───────────────────────────────────── Roles ──────────────────────────────────────────

    /// Create a role. `AlreadyExists` if the name is taken.
    async fn create_role(&self, params: &CreateRoleParams) -> Result<Role, StoreError>;

    /// Get role by name.
    async fn get_role_by_name(&self, name: &str) -> Result<Role, StoreError>;

    /// List all roles ordered by name, with their permission counts.
    async fn list_roles(&self) -> Result<Vec<RoleSummary>, StoreError>;

    /// Rename a role. `NotFound` for an unknown role, `AlreadyExists` if `new_name` is taken.
    async fn rename_role(&self, name: &str, new_name: &str) -> Result<(), StoreError>;

    /// Activate or deactivate a role.
    async fn set_role_active(&self, name: &str, active: bool) -> Result<(), StoreError>;

    /// Delete a role and its permission assignments.
    async fn delete_role(&self, name: &str) -> Result<(), StoreError>;

    // ───────────────────────────────────── Permissions ────────────────────────────────────

    /// List the permission rows of a role, ordered by code.
    async fn list_role_permissions(&self, name: &str) -> Result<Vec<RolePermission>, StoreError>;

    /// Replace the whole permission set of a role atomically.
    async fn set_role_permissions(&self, name: &str, codes: &[String]) -> Result<(), StoreError>;

    /// Grant one permission. Returns `false` if the role already had it.
    async fn add_role_permission(&self, name: &str, code: &str) -> Result<bool, StoreError>;

    /// Revoke one permission. Returns `false` if the role didn't have it.
    async fn remove_role_permission(&self, name: &str, code: &str) -> Result<bool, StoreError>;
}

/// Resource ownership lookup used by resource-owner authorization checks.
#[cfg_attr(feature = "test-support", mockall::automock)]
#[async_trait::async_trait]
pub trait OwnershipLookup: Send + Sync {
    /// Whether `principal_id` owns (created or is assigned) the resource instance.
    ///
    /// `NotFound` if no ownership record exists for the resource at all.
    async fn is_owner(
        &self,
        principal_id: &PrincipalId,
        resource_type: &str,
        resource_id: &str,
    ) -> Result<bool, StoreError>;

    /// Record (or replace) the owner of a resource instance.
    async fn assign_owner(&self, params: &AssignOwnerParams) -> Result<(), StoreError>;
}
