//! Audit logging abstraction for Valyan.
//!
//! This crate defines the `AuditLog` trait for persisting audit events
//! and the types representing auditable actions: break-glass (emergency)
//! access grants and role/permission administration.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;
use valyan_storage::PrincipalId;

/// Marker stored as the reason of an emergency access grant when the caller gave none.
pub const UNSPECIFIED_REASON: &str = "unspecified";

/// Unique identifier for an audit log entry
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AuditLogId(pub Uuid);

impl AuditLogId {
    /// Generate a new audit log ID using UUID v7 (time-ordered)
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for AuditLogId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for AuditLogId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for AuditLogId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Categories of auditable actions
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    // Break-glass
    EmergencyAccess,

    // Role administration
    RoleCreate,
    RoleRename,
    RoleDelete,
    RoleActivate,
    RoleDeactivate,

    // Role permission assignment
    RoleSetPermissions,
    RoleGrantPermission,
    RoleRevokePermission,
}

impl std::fmt::Display for AuditAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            AuditAction::EmergencyAccess => "emergency_access",
            AuditAction::RoleCreate => "role.create",
            AuditAction::RoleRename => "role.rename",
            AuditAction::RoleDelete => "role.delete",
            AuditAction::RoleActivate => "role.activate",
            AuditAction::RoleDeactivate => "role.deactivate",
            AuditAction::RoleSetPermissions => "role.set_permissions",
            AuditAction::RoleGrantPermission => "role.grant_permission",
            AuditAction::RoleRevokePermission => "role.revoke_permission",
        };
        write!(f, "{}", s)
    }
}

impl std::str::FromStr for AuditAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "emergency_access" => Ok(AuditAction::EmergencyAccess),
            "role.create" => Ok(AuditAction::RoleCreate),
            "role.rename" => Ok(AuditAction::RoleRename),
            "role.delete" => Ok(AuditAction::RoleDelete),
            "role.activate" => Ok(AuditAction::RoleActivate),
            "role.deactivate" => Ok(AuditAction::RoleDeactivate),
            "role.set_permissions" => Ok(AuditAction::RoleSetPermissions),
            "role.grant_permission" => Ok(AuditAction::RoleGrantPermission),
            "role.revoke_permission" => Ok(AuditAction::RoleRevokePermission),
            _ => Err(format!("Unknown audit action: {}", s)),
        }
    }
}

/// Result of an audited operation
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditResult {
    Success,
    PermissionDenied,
    NotFound,
    InvalidRequest,
    Error,
}

impl std::fmt::Display for AuditResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            AuditResult::Success => "success",
            AuditResult::PermissionDenied => "permission_denied",
            AuditResult::NotFound => "not_found",
            AuditResult::InvalidRequest => "invalid_request",
            AuditResult::Error => "error",
        };
        write!(f, "{}", s)
    }
}

impl std::str::FromStr for AuditResult {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "success" => Ok(AuditResult::Success),
            "permission_denied" => Ok(AuditResult::PermissionDenied),
            "not_found" => Ok(AuditResult::NotFound),
            "invalid_request" => Ok(AuditResult::InvalidRequest),
            "error" => Ok(AuditResult::Error),
            _ => Err(format!("Unknown audit result: {}", s)),
        }
    }
}

/// An audit log entry representing a single auditable action.
///
/// Uses raw UUIDs for serialization compatibility. Use the builder
/// to construct events from typed IDs.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Unique identifier for this audit entry
    pub id: AuditLogId,
    /// When the action occurred
    pub timestamp: DateTime<Utc>,
    /// Principal that performed the action (UUID)
    pub principal_id: Uuid,
    /// The action that was performed
    pub action: AuditAction,
    /// Type of resource affected (e.g., "Consultation", "role")
    pub resource_type: String,
    /// Identifier of the affected resource
    pub resource_id: String,
    /// Route or operation the action was performed through (if known)
    pub route: Option<String>,
    /// Result of the operation
    pub result: AuditResult,
    /// Stated reason, error message or additional context
    pub reason: Option<String>,
    /// Additional details as JSON (e.g., old/new permission sets)
    pub details: Option<serde_json::Value>,
    /// Client IP address (if available)
    pub client_ip: Option<String>,
}

impl AuditEvent {
    /// Create a new audit event builder
    pub fn builder(principal_id: &PrincipalId, action: AuditAction) -> AuditEventBuilder {
        AuditEventBuilder::new(principal_id, action)
    }

    /// Get the principal ID as a typed ID
    pub fn get_principal_id(&self) -> PrincipalId {
        PrincipalId(self.principal_id)
    }
}

/// Builder for constructing audit events
pub struct AuditEventBuilder {
    principal_id: Uuid,
    action: AuditAction,
    resource_type: String,
    resource_id: String,
    route: Option<String>,
    result: AuditResult,
    reason: Option<String>,
    details: Option<serde_json::Value>,
    client_ip: Option<String>,
}

impl AuditEventBuilder {
    pub fn new(principal_id: &PrincipalId, action: AuditAction) -> Self {
        Self {
            principal_id: principal_id.0,
            action,
            resource_type: String::new(),
            resource_id: String::new(),
            route: None,
            result: AuditResult::Success,
            reason: None,
            details: None,
            client_ip: None,
        }
    }

    pub fn resource(
        mut self,
        resource_type: impl Into<String>,
        resource_id: impl Into<String>,
    ) -> Self {
        self.resource_type = resource_type.into();
        self.resource_id = resource_id.into();
        self
    }

    pub fn route(mut self, route: Option<&str>) -> Self {
        self.route = route.map(str::to_string);
        self
    }

    pub fn result(mut self, result: AuditResult) -> Self {
        self.result = result;
        self
    }

    pub fn reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    pub fn details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn client_ip(mut self, client_ip: Option<&str>) -> Self {
        self.client_ip = client_ip.map(str::to_string);
        self
    }

    pub fn build(self) -> AuditEvent {
        AuditEvent {
            id: AuditLogId::new(),
            timestamp: Utc::now(),
            principal_id: self.principal_id,
            action: self.action,
            resource_type: self.resource_type,
            resource_id: self.resource_id,
            route: self.route,
            result: self.result,
            reason: self.reason,
            details: self.details,
            client_ip: self.client_ip,
        }
    }
}

/// Filter for querying audit logs
#[derive(Clone, Debug, Default)]
pub struct AuditLogFilter {
    /// Filter by principal ID
    pub principal_id: Option<PrincipalId>,
    /// Filter by action
    pub action: Option<AuditAction>,
    /// Filter by result
    pub result: Option<AuditResult>,
    /// Filter by start timestamp (inclusive)
    pub from: Option<DateTime<Utc>>,
    /// Filter by end timestamp (exclusive)
    pub to: Option<DateTime<Utc>>,
    /// Maximum number of results to return
    pub limit: Option<u32>,
    /// Number of results to skip (for pagination)
    pub offset: Option<u32>,
}

impl AuditLogFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn principal_id(mut self, principal_id: PrincipalId) -> Self {
        self.principal_id = Some(principal_id);
        self
    }

    pub fn action(mut self, action: AuditAction) -> Self {
        self.action = Some(action);
        self
    }

    pub fn result(mut self, result: AuditResult) -> Self {
        self.result = Some(result);
        self
    }

    pub fn from(mut self, from: DateTime<Utc>) -> Self {
        self.from = Some(from);
        self
    }

    pub fn to(mut self, to: DateTime<Utc>) -> Self {
        self.to = Some(to);
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: u32) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Whether an event passes every criterion except pagination.
    ///
    /// Backends that filter in process (rather than in SQL) use this.
    pub fn matches(&self, event: &AuditEvent) -> bool {
        if let Some(principal_id) = &self.principal_id {
            if event.principal_id != principal_id.0 {
                return false;
            }
        }
        if let Some(action) = &self.action {
            if &event.action != action {
                return false;
            }
        }
        if let Some(result) = &self.result {
            if &event.result != result {
                return false;
            }
        }
        if let Some(from) = self.from {
            if event.timestamp < from {
                return false;
            }
        }
        if let Some(to) = self.to {
            if event.timestamp >= to {
                return false;
            }
        }
        true
    }

    /// Reject filters that can never match anything.
    pub fn validate(&self) -> Result<(), AuditLogError> {
        if let (Some(from), Some(to)) = (self.from, self.to) {
            if from > to {
                return Err(AuditLogError::InvalidFilter(format!(
                    "from ({}) is after to ({})",
                    from, to
                )));
            }
        }
        Ok(())
    }
}

/// Error type for audit log operations
#[derive(Debug, Error)]
pub enum AuditLogError {
    #[error("database error: {0}")]
    Database(String),

    #[error("audit log not found: {0}")]
    NotFound(AuditLogId),

    #[error("invalid filter: {0}")]
    InvalidFilter(String),
}

/// Trait for audit log persistence.
///
/// Implementations store audit events and provide query capabilities
/// for compliance and security monitoring.
#[async_trait]
pub trait AuditLog: Send + Sync {
    /// Record an audit event.
    ///
    /// Emergency access grants call this before the decision is returned.
    /// Failures are reported to the caller, which logs them; they never
    /// revoke a grant that was already decided.
    async fn record(&self, event: AuditEvent) -> Result<(), AuditLogError>;

    /// Query audit logs with optional filters.
    ///
    /// Returns events matching the filter criteria, ordered by timestamp descending.
    async fn query(&self, filter: AuditLogFilter) -> Result<Vec<AuditEvent>, AuditLogError>;

    /// Get a specific audit log entry by ID.
    async fn get(&self, id: AuditLogId) -> Result<AuditEvent, AuditLogError>;

    /// Count audit logs matching the filter criteria.
    async fn count(&self, filter: AuditLogFilter) -> Result<u64, AuditLogError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audit_action_display() {
        assert_eq!(AuditAction::EmergencyAccess.to_string(), "emergency_access");
        assert_eq!(AuditAction::RoleCreate.to_string(), "role.create");
        assert_eq!(
            AuditAction::RoleSetPermissions.to_string(),
            "role.set_permissions"
        );
    }

    #[test]
    fn test_audit_action_parse() {
        assert_eq!(
            "emergency_access".parse::<AuditAction>().unwrap(),
            AuditAction::EmergencyAccess
        );
        assert_eq!(
            "role.revoke_permission".parse::<AuditAction>().unwrap(),
            AuditAction::RoleRevokePermission
        );
        assert!("secret.create".parse::<AuditAction>().is_err());
    }

    #[test]
    fn test_audit_action_all_variants_roundtrip() {
        let actions = vec![
            AuditAction::EmergencyAccess,
            AuditAction::RoleCreate,
            AuditAction::RoleRename,
            AuditAction::RoleDelete,
            AuditAction::RoleActivate,
            AuditAction::RoleDeactivate,
            AuditAction::RoleSetPermissions,
            AuditAction::RoleGrantPermission,
            AuditAction::RoleRevokePermission,
        ];

        for action in actions {
            let display = action.to_string();
            let parsed: AuditAction = display.parse().unwrap();
            assert_eq!(action, parsed, "Roundtrip failed for {:?}", action);
        }
    }

    #[test]
    fn test_audit_result_display() {
        assert_eq!(AuditResult::Success.to_string(), "success");
        assert_eq!(
            AuditResult::PermissionDenied.to_string(),
            "permission_denied"
        );
    }

    #[test]
    fn test_audit_result_parse_error() {
        let result = "unknown_result".parse::<AuditResult>();
        assert!(result.is_err());
        assert!(result.unwrap_err().contains("Unknown audit result"));
    }

    #[test]
    fn test_emergency_event_builder() {
        let principal_id = PrincipalId(Uuid::new_v4());
        let event = AuditEvent::builder(&principal_id, AuditAction::EmergencyAccess)
            .resource("Patient", "42")
            .route(Some("/patients/42"))
            .reason("Cardiac arrest override")
            .client_ip(Some("10.0.0.7"))
            .build();

        assert_eq!(event.get_principal_id(), principal_id);
        assert_eq!(event.action, AuditAction::EmergencyAccess);
        assert_eq!(event.resource_type, "Patient");
        assert_eq!(event.resource_id, "42");
        assert_eq!(event.route.as_deref(), Some("/patients/42"));
        assert_eq!(event.reason.as_deref(), Some("Cardiac arrest override"));
        assert_eq!(event.client_ip.as_deref(), Some("10.0.0.7"));
        assert_eq!(event.result, AuditResult::Success);
    }

    #[test]
    fn test_audit_event_serialization() {
        let principal_id = PrincipalId(Uuid::new_v4());
        let event = AuditEvent::builder(&principal_id, AuditAction::RoleGrantPermission)
            .resource("role", "Doctor")
            .details(serde_json::json!({ "permission": "Patient.View" }))
            .build();

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"role_grant_permission\""));

        let deserialized: AuditEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(event.id, deserialized.id);
        assert_eq!(event.action, deserialized.action);
        assert_eq!(event.details, deserialized.details);
    }

    #[test]
    fn test_audit_log_id_parse_invalid() {
        assert!("not-a-uuid".parse::<AuditLogId>().is_err());
    }

    #[test]
    fn test_filter_matches() {
        let principal_id = PrincipalId(Uuid::new_v4());
        let event = AuditEvent::builder(&principal_id, AuditAction::EmergencyAccess).build();

        assert!(AuditLogFilter::new().matches(&event));
        assert!(AuditLogFilter::new()
            .principal_id(principal_id)
            .action(AuditAction::EmergencyAccess)
            .matches(&event));
        assert!(!AuditLogFilter::new()
            .action(AuditAction::RoleCreate)
            .matches(&event));
        assert!(!AuditLogFilter::new()
            .principal_id(PrincipalId(Uuid::new_v4()))
            .matches(&event));
        assert!(!AuditLogFilter::new()
            .result(AuditResult::Error)
            .matches(&event));
        assert!(!AuditLogFilter::new()
            .to(event.timestamp)
            .matches(&event));
        assert!(AuditLogFilter::new()
            .from(event.timestamp)
            .matches(&event));
    }

    #[test]
    fn test_filter_validate_rejects_inverted_range() {
        let now = Utc::now();
        let filter = AuditLogFilter::new()
            .from(now)
            .to(now - chrono::Duration::hours(1));
        assert!(matches!(
            filter.validate(),
            Err(AuditLogError::InvalidFilter(_))
        ));
        assert!(AuditLogFilter::new().validate().is_ok());
    }
}
