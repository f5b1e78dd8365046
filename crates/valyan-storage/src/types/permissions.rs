//! Role → permission assignment rows.

use chrono::{DateTime, Utc};

use super::RoleId;

/// A single permission code granted to a role.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RolePermission {
    pub role_id: RoleId,
    pub permission_code: String,
    pub granted_at: DateTime<Utc>,
}
