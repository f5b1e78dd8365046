//! Role types for RBAC.

use chrono::{DateTime, Utc};

use super::RoleId;

/// A named collection of permissions (e.g. "Admin", "Doctor").
///
/// Role names are unique and compared case-sensitively.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Role {
    pub id: RoleId,
    pub name: String,
    pub description: Option<String>,
    /// Inactive roles resolve to an empty permission set.
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Parameters for creating a role.
#[derive(Clone, Debug)]
pub struct CreateRoleParams {
    pub name: String,
    pub description: Option<String>,
}

impl CreateRoleParams {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Role plus the number of permissions assigned to it (for listings).
#[derive(Clone, Debug)]
pub struct RoleSummary {
    pub role: Role,
    pub permission_count: usize,
}
