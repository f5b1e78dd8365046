//! Role and role-permission administration.
//!
//! Every mutation is committed to the store first, then the permission
//! cache is invalidated for the affected role(s), then an audit event is
//! recorded. Audit failures are logged and never fail the mutation.

use std::collections::BTreeSet;
use std::sync::Arc;

use serde_json::json;
use tracing::{error, info};
use valyan_audit::{AuditAction, AuditEvent, AuditLog, AuditResult};
use valyan_storage::{
    CreateRoleParams, PrincipalId, Role, RolePermission, RoleStore, RoleSummary, StoreError,
};

use crate::catalog::{default_roles, is_known_permission};
use crate::error::AuthzError;
use crate::evaluator::AUDIT_FAILURE_TARGET;
use crate::resolver::PermissionResolver;

const ROLE_RESOURCE: &str = "role";

/// Outcome of [`RoleAdministration::seed_default_roles`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub created: Vec<String>,
    /// Roles that already existed and were left untouched.
    pub skipped: Vec<String>,
}

#[derive(Clone)]
pub struct RoleAdministration {
    store: Arc<dyn RoleStore>,
    resolver: Arc<dyn PermissionResolver>,
    audit: Arc<dyn AuditLog>,
    allow_custom_codes: bool,
}

impl RoleAdministration {
    pub fn new(
        store: Arc<dyn RoleStore>,
        resolver: Arc<dyn PermissionResolver>,
        audit: Arc<dyn AuditLog>,
    ) -> Self {
        Self {
            store,
            resolver,
            audit,
            allow_custom_codes: false,
        }
    }

    /// Accept permission codes that are not in the catalog.
    pub fn allow_custom_codes(mut self, allow: bool) -> Self {
        self.allow_custom_codes = allow;
        self
    }

    pub async fn list_roles(&self) -> Result<Vec<RoleSummary>, AuthzError> {
        self.store
            .list_roles()
            .await
            .map_err(|e| AuthzError::ServiceUnavailable(e.to_string()))
    }

    /// A role and its permission rows.
    pub async fn get_role(&self, name: &str) -> Result<(Role, Vec<RolePermission>), AuthzError> {
        validate_role_name(name)?;
        let role = self
            .store
            .get_role_by_name(name)
            .await
            .map_err(|e| AuthzError::from_store(e, name))?;
        let permissions = self
            .store
            .list_role_permissions(name)
            .await
            .map_err(|e| AuthzError::from_store(e, name))?;
        Ok((role, permissions))
    }

    pub async fn create_role(
        &self,
        actor: &PrincipalId,
        params: CreateRoleParams,
    ) -> Result<Role, AuthzError> {
        validate_role_name(&params.name)?;
        let name = params.name.clone();

        let result = self
            .store
            .create_role(&params)
            .await
            .map_err(|e| AuthzError::from_store(e, &name));
        if result.is_ok() {
            // A lookup before creation may have cached the name as empty.
            self.resolver.invalidate_cache(Some(&name));
            info!(role = %name, "Role created");
        }
        self.audit_outcome(
            actor,
            AuditAction::RoleCreate,
            &name,
            result.as_ref().map(|_| ()),
            params.description.as_ref().map(|d| json!({ "description": d })),
        )
        .await;
        result
    }

    /// Rename a role. Cached entries for both names are dropped.
    pub async fn rename_role(
        &self,
        actor: &PrincipalId,
        name: &str,
        new_name: &str,
    ) -> Result<(), AuthzError> {
        validate_role_name(name)?;
        validate_role_name(new_name)?;

        let result = self
            .store
            .rename_role(name, new_name)
            .await
            .map_err(|e| match e {
                StoreError::AlreadyExists => AuthzError::RoleExists(new_name.to_string()),
                other => AuthzError::from_store(other, name),
            });
        if result.is_ok() {
            self.resolver.invalidate_cache(Some(name));
            self.resolver.invalidate_cache(Some(new_name));
            info!(role = %name, new_name, "Role renamed");
        }
        self.audit_outcome(
            actor,
            AuditAction::RoleRename,
            name,
            result.as_ref().map(|_| ()),
            Some(json!({ "old_name": name, "new_name": new_name })),
        )
        .await;
        result
    }

    /// Activate or deactivate a role. Inactive roles resolve to no permissions.
    pub async fn set_role_active(
        &self,
        actor: &PrincipalId,
        name: &str,
        active: bool,
    ) -> Result<(), AuthzError> {
        validate_role_name(name)?;

        let result = self
            .store
            .set_role_active(name, active)
            .await
            .map_err(|e| AuthzError::from_store(e, name));
        if result.is_ok() {
            self.resolver.invalidate_cache(Some(name));
            info!(role = %name, active, "Role activation changed");
        }
        let action = if active {
            AuditAction::RoleActivate
        } else {
            AuditAction::RoleDeactivate
        };
        self.audit_outcome(actor, action, name, result.as_ref().map(|_| ()), None)
            .await;
        result
    }

    pub async fn delete_role(&self, actor: &PrincipalId, name: &str) -> Result<(), AuthzError> {
        validate_role_name(name)?;

        let result = self
            .store
            .delete_role(name)
            .await
            .map_err(|e| AuthzError::from_store(e, name));
        if result.is_ok() {
            self.resolver.invalidate_cache(Some(name));
            info!(role = %name, "Role deleted");
        }
        self.audit_outcome(
            actor,
            AuditAction::RoleDelete,
            name,
            result.as_ref().map(|_| ()),
            None,
        )
        .await;
        result
    }

    /// Replace the role's whole permission set. Duplicates are collapsed.
    pub async fn set_permissions(
        &self,
        actor: &PrincipalId,
        name: &str,
        codes: &[String],
    ) -> Result<(), AuthzError> {
        validate_role_name(name)?;
        for code in codes {
            self.validate_code(code)?;
        }
        let codes: Vec<String> = codes
            .iter()
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let result = self
            .store
            .set_role_permissions(name, &codes)
            .await
            .map_err(|e| AuthzError::from_store(e, name));
        if result.is_ok() {
            self.resolver.invalidate_cache(Some(name));
            info!(role = %name, permissions = codes.len(), "Role permissions replaced");
        }
        self.audit_outcome(
            actor,
            AuditAction::RoleSetPermissions,
            name,
            result.as_ref().map(|_| ()),
            Some(json!({ "permissions": codes })),
        )
        .await;
        result
    }

    /// Grant one permission. Returns `false` if the role already held it.
    pub async fn grant_permission(
        &self,
        actor: &PrincipalId,
        name: &str,
        code: &str,
    ) -> Result<bool, AuthzError> {
        validate_role_name(name)?;
        self.validate_code(code)?;

        let result = self
            .store
            .add_role_permission(name, code)
            .await
            .map_err(|e| AuthzError::from_store(e, name));
        if let Ok(true) = result {
            self.resolver.invalidate_cache(Some(name));
            info!(role = %name, permission = code, "Permission granted");
        }
        self.audit_outcome(
            actor,
            AuditAction::RoleGrantPermission,
            name,
            result.as_ref().map(|_| ()),
            Some(json!({ "permission": code, "changed": result.as_ref().ok() })),
        )
        .await;
        result
    }

    /// Revoke one permission. Returns `false` if the role did not hold it.
    pub async fn revoke_permission(
        &self,
        actor: &PrincipalId,
        name: &str,
        code: &str,
    ) -> Result<bool, AuthzError> {
        validate_role_name(name)?;
        // Revoking an unknown code is allowed so stale custom codes can be cleaned up.
        if code.is_empty() {
            return Err(AuthzError::invalid("permission code must not be empty"));
        }

        let result = self
            .store
            .remove_role_permission(name, code)
            .await
            .map_err(|e| AuthzError::from_store(e, name));
        if let Ok(true) = result {
            self.resolver.invalidate_cache(Some(name));
            info!(role = %name, permission = code, "Permission revoked");
        }
        self.audit_outcome(
            actor,
            AuditAction::RoleRevokePermission,
            name,
            result.as_ref().map(|_| ()),
            Some(json!({ "permission": code, "changed": result.as_ref().ok() })),
        )
        .await;
        result
    }

    /// Create the default clinic roles that don't exist yet.
    ///
    /// Existing roles are left alone, including their permissions.
    pub async fn seed_default_roles(&self, actor: &PrincipalId) -> Result<SeedReport, AuthzError> {
        let mut report = SeedReport::default();

        for seed in default_roles() {
            let params = CreateRoleParams::new(seed.name).description(seed.description);
            match self.store.create_role(&params).await {
                Ok(_) => self.resolver.invalidate_cache(Some(seed.name)),
                Err(StoreError::AlreadyExists) => {
                    report.skipped.push(seed.name.to_string());
                    continue;
                }
                Err(e) => return Err(AuthzError::ServiceUnavailable(e.to_string())),
            }
            report.created.push(seed.name.to_string());

            let codes: Vec<String> = seed.permissions.iter().map(|c| c.to_string()).collect();
            self.store
                .set_role_permissions(seed.name, &codes)
                .await
                .map_err(|e| AuthzError::ServiceUnavailable(e.to_string()))?;
            self.resolver.invalidate_cache(Some(seed.name));

            self.audit_outcome(
                actor,
                AuditAction::RoleCreate,
                seed.name,
                Ok(()),
                Some(json!({ "seeded": true, "permissions": codes })),
            )
            .await;
        }

        info!(
            created = report.created.len(),
            skipped = report.skipped.len(),
            "Default roles seeded"
        );
        Ok(report)
    }

    fn validate_code(&self, code: &str) -> Result<(), AuthzError> {
        if code.is_empty() {
            return Err(AuthzError::invalid("permission code must not be empty"));
        }
        if !self.allow_custom_codes && !is_known_permission(code) {
            return Err(AuthzError::invalid(format!(
                "unknown permission code: {}",
                code
            )));
        }
        Ok(())
    }

    /// Record the outcome of a mutation. Failures are logged, not returned.
    async fn audit_outcome(
        &self,
        actor: &PrincipalId,
        action: AuditAction,
        role: &str,
        outcome: Result<(), &AuthzError>,
        details: Option<serde_json::Value>,
    ) {
        let mut builder = AuditEvent::builder(actor, action).resource(ROLE_RESOURCE, role);
        builder = match outcome {
            Ok(()) => builder.result(AuditResult::Success),
            Err(e) => builder.result(audit_result(e)).reason(e.to_string()),
        };
        if let Some(details) = details {
            builder = builder.details(details);
        }

        if let Err(e) = self.audit.record(builder.build()).await {
            error!(
                target: AUDIT_FAILURE_TARGET,
                role,
                error = %e,
                "AuditWriteFailed: role administration audit record was not written"
            );
        }
    }
}

fn audit_result(err: &AuthzError) -> AuditResult {
    match err {
        AuthzError::RoleNotFound(_) => AuditResult::NotFound,
        AuthzError::RoleExists(_) | AuthzError::InvalidArgument(_) => AuditResult::InvalidRequest,
        _ => AuditResult::Error,
    }
}

fn validate_role_name(name: &str) -> Result<(), AuthzError> {
    if name.trim().is_empty() {
        return Err(AuthzError::invalid("role name must not be empty"));
    }
    if name.trim() != name {
        return Err(AuthzError::invalid(
            "role name must not have leading or trailing whitespace",
        ));
    }
    Ok(())
}
