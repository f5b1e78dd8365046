use thiserror::Error;
use valyan_storage::StoreError;

/// Errors raised by the authorization core.
///
/// `ServiceUnavailable` and `AuditWriteFailed` never escape an evaluation:
/// the evaluator folds them into [`crate::Evaluation::failures`].
#[derive(Debug, Error)]
pub enum AuthzError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("permission store unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("audit write failed: {0}")]
    AuditWriteFailed(String),

    #[error("unknown policy: {0}")]
    UnknownPolicy(String),

    #[error("role not found: {0}")]
    RoleNotFound(String),

    #[error("role already exists: {0}")]
    RoleExists(String),
}

impl AuthzError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        AuthzError::InvalidArgument(msg.into())
    }

    /// Map a store error raised while operating on `role`.
    pub(crate) fn from_store(err: StoreError, role: &str) -> Self {
        match err {
            StoreError::NotFound => AuthzError::RoleNotFound(role.to_string()),
            StoreError::AlreadyExists => AuthzError::RoleExists(role.to_string()),
            other => AuthzError::ServiceUnavailable(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_errors_map_to_role_errors() {
        assert!(matches!(
            AuthzError::from_store(StoreError::NotFound, "Nurse"),
            AuthzError::RoleNotFound(r) if r == "Nurse"
        ));
        assert!(matches!(
            AuthzError::from_store(StoreError::AlreadyExists, "Nurse"),
            AuthzError::RoleExists(r) if r == "Nurse"
        ));
        assert!(matches!(
            AuthzError::from_store(StoreError::Backend("timeout".into()), "Nurse"),
            AuthzError::ServiceUnavailable(msg) if msg.contains("timeout")
        ));
        assert!(matches!(
            AuthzError::from_store(StoreError::Conflict, "Nurse"),
            AuthzError::ServiceUnavailable(_)
        ));
    }

    #[test]
    fn display() {
        assert_eq!(
            AuthzError::UnknownPolicy("CanFly".into()).to_string(),
            "unknown policy: CanFly"
        );
    }
}
