//! Resource ownership records (who created or is assigned a resource instance).

use chrono::{DateTime, Utc};

use super::PrincipalId;

/// Ownership of one resource instance, e.g. a consultation assigned to a doctor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResourceOwner {
    /// Resource kind, e.g. "Consultation" or "Appointment" (case-sensitive).
    pub resource_type: String,
    pub resource_id: String,
    pub principal_id: PrincipalId,
    pub assigned_at: DateTime<Utc>,
}

/// Parameters for recording ownership of a resource instance.
#[derive(Clone, Debug)]
pub struct AssignOwnerParams {
    pub resource_type: String,
    pub resource_id: String,
    pub principal_id: PrincipalId,
}
