//! Evaluation of a single requirement against a request.
//!
//! Every evaluation ends in `Allow` or `Deny`. Store outages and audit-write
//! failures are reported next to the decision in [`Evaluation::failures`],
//! never as an error.

use std::sync::Arc;

use tracing::{debug, error, info, warn};
use valyan_audit::{AuditAction, AuditEvent, AuditLog, UNSPECIFIED_REASON};
use valyan_storage::{OwnershipLookup, StoreError};

use crate::error::AuthzError;
use crate::principal::AuthorizationContext;
use crate::requirement::{
    AnyOfPermissions, EmergencyAccess, MedicalStaffMembership, PermissionRequirement,
    ResourceOwnership, SinglePermission,
};
use crate::resolver::PermissionResolver;

/// Log target for audit-sink failures.
pub const AUDIT_FAILURE_TARGET: &str = "valyan_authz::audit";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(DenyReason),
}

/// Why a request was denied. Kept server-side; callers only need `Deny`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DenyReason {
    /// The principal carries no role.
    NoRole,
    /// The role holds none of the required permissions.
    MissingPermission,
    NotMedicalStaff,
    /// Medical staff without a valid license id claim.
    MissingLicenseId,
    /// No resource of the required type in the request context.
    MissingResource,
    /// No ownership record exists for the resource.
    ResourceNotFound,
    NotOwner,
    /// The permission store or ownership lookup failed; fail closed.
    ServiceUnavailable,
}

impl std::fmt::Display for DenyReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            DenyReason::NoRole => "principal has no role",
            DenyReason::MissingPermission => "missing permission",
            DenyReason::NotMedicalStaff => "not medical staff",
            DenyReason::MissingLicenseId => "missing or invalid license id",
            DenyReason::MissingResource => "no resource in request",
            DenyReason::ResourceNotFound => "resource not found",
            DenyReason::NotOwner => "not the resource owner",
            DenyReason::ServiceUnavailable => "authorization service unavailable",
        };
        write!(f, "{}", s)
    }
}

/// Outcome of one evaluation.
#[derive(Debug)]
pub struct Evaluation {
    pub decision: Decision,
    /// `ServiceUnavailable` / `AuditWriteFailed` conditions met along the way.
    pub failures: Vec<AuthzError>,
}

impl Evaluation {
    pub fn allow() -> Self {
        Self {
            decision: Decision::Allow,
            failures: Vec::new(),
        }
    }

    pub fn deny(reason: DenyReason) -> Self {
        Self {
            decision: Decision::Deny(reason),
            failures: Vec::new(),
        }
    }

    fn with_failures(mut self, failures: Vec<AuthzError>) -> Self {
        self.failures.extend(failures);
        self
    }

    pub fn is_allowed(&self) -> bool {
        self.decision == Decision::Allow
    }

    pub fn deny_reason(&self) -> Option<&DenyReason> {
        match &self.decision {
            Decision::Allow => None,
            Decision::Deny(reason) => Some(reason),
        }
    }
}

/// Turns a requirement plus request context into a decision.
#[derive(Clone)]
pub struct Evaluator {
    resolver: Arc<dyn PermissionResolver>,
    ownership: Arc<dyn OwnershipLookup>,
    audit: Arc<dyn AuditLog>,
}

impl Evaluator {
    pub fn new(
        resolver: Arc<dyn PermissionResolver>,
        ownership: Arc<dyn OwnershipLookup>,
        audit: Arc<dyn AuditLog>,
    ) -> Self {
        Self {
            resolver,
            ownership,
            audit,
        }
    }

    pub fn resolver(&self) -> &Arc<dyn PermissionResolver> {
        &self.resolver
    }

    pub async fn evaluate(
        &self,
        requirement: &PermissionRequirement,
        ctx: &AuthorizationContext,
    ) -> Evaluation {
        let evaluation = match requirement {
            PermissionRequirement::SinglePermission(req) => self.single(req, ctx).await,
            PermissionRequirement::AnyOfPermissions(req) => self.any_of(req, ctx).await,
            PermissionRequirement::MedicalStaffMembership(req) => medical_staff(req, ctx),
            PermissionRequirement::ResourceOwnership(req) => self.resource_owner(req, ctx).await,
            PermissionRequirement::EmergencyAccess(req) => self.emergency(req, ctx).await,
        };

        let principal = &ctx.principal;
        match &evaluation.decision {
            Decision::Allow => debug!(
                principal = %principal.id,
                role = principal.role.as_deref().unwrap_or(""),
                requirement = requirement.kind(),
                "Authorization allowed"
            ),
            Decision::Deny(reason) => warn!(
                principal = %principal.id,
                role = principal.role.as_deref().unwrap_or(""),
                requirement = requirement.kind(),
                %reason,
                "Authorization denied"
            ),
        }
        evaluation
    }

    async fn single(&self, req: &SinglePermission, ctx: &AuthorizationContext) -> Evaluation {
        let Some(role) = ctx.principal.role.as_deref().filter(|r| !r.is_empty()) else {
            return Evaluation::deny(DenyReason::NoRole);
        };
        match self.resolver.has_permission(role, req.code()).await {
            Ok(true) => Evaluation::allow(),
            Ok(false) => Evaluation::deny(DenyReason::MissingPermission),
            Err(e) => {
                warn!(role, permission = req.code(), error = %e, "Permission check failed");
                Evaluation::deny(DenyReason::ServiceUnavailable).with_failures(vec![e])
            }
        }
    }

    async fn any_of(&self, req: &AnyOfPermissions, ctx: &AuthorizationContext) -> Evaluation {
        let Some(role) = ctx.principal.role.as_deref().filter(|r| !r.is_empty()) else {
            return Evaluation::deny(DenyReason::NoRole);
        };

        let mut failures = Vec::new();
        for code in req.codes() {
            match self.resolver.has_permission(role, code).await {
                Ok(true) => return Evaluation::allow().with_failures(failures),
                Ok(false) => {}
                Err(e) => {
                    warn!(role, permission = %code, error = %e, "Permission check failed");
                    failures.push(e);
                }
            }
        }

        let reason = if failures.len() == req.codes().len() {
            DenyReason::ServiceUnavailable
        } else {
            DenyReason::MissingPermission
        };
        Evaluation::deny(reason).with_failures(failures)
    }

    async fn resource_owner(&self, req: &ResourceOwnership, ctx: &AuthorizationContext) -> Evaluation {
        let Some(resource) = ctx
            .resource
            .as_ref()
            .filter(|r| r.resource_type == req.resource_type() && !r.resource_id.is_empty())
        else {
            return Evaluation::deny(DenyReason::MissingResource);
        };

        match self
            .ownership
            .is_owner(
                &ctx.principal.id,
                &resource.resource_type,
                &resource.resource_id,
            )
            .await
        {
            Ok(true) => Evaluation::allow(),
            Ok(false) => Evaluation::deny(DenyReason::NotOwner),
            Err(StoreError::NotFound) => Evaluation::deny(DenyReason::ResourceNotFound),
            Err(e) => {
                warn!(
                    resource_type = %resource.resource_type,
                    resource_id = %resource.resource_id,
                    error = %e,
                    "Ownership lookup failed"
                );
                Evaluation::deny(DenyReason::ServiceUnavailable)
                    .with_failures(vec![AuthzError::ServiceUnavailable(e.to_string())])
            }
        }
    }

    /// Break-glass: granted unconditionally, recorded before returning.
    async fn emergency(&self, req: &EmergencyAccess, ctx: &AuthorizationContext) -> Evaluation {
        let reason = req.reason().unwrap_or(UNSPECIFIED_REASON);
        let (resource_type, resource_id) = ctx
            .resource
            .as_ref()
            .map(|r| (r.resource_type.as_str(), r.resource_id.as_str()))
            .unwrap_or(("", ""));

        let event = AuditEvent::builder(&ctx.principal.id, AuditAction::EmergencyAccess)
            .resource(resource_type, resource_id)
            .route(ctx.route.as_deref())
            .client_ip(ctx.client_ip.as_deref())
            .reason(reason)
            .build();

        info!(
            target: "audit",
            principal = %ctx.principal.id,
            resource_type,
            resource_id,
            route = ctx.route.as_deref().unwrap_or(""),
            reason,
            "Emergency access granted"
        );

        match self.audit.record(event).await {
            Ok(()) => Evaluation::allow(),
            Err(e) => {
                error!(
                    target: AUDIT_FAILURE_TARGET,
                    principal = %ctx.principal.id,
                    reason,
                    error = %e,
                    "AuditWriteFailed: emergency access audit record was not written"
                );
                Evaluation::allow().with_failures(vec![AuthzError::AuditWriteFailed(e.to_string())])
            }
        }
    }
}

fn medical_staff(req: &MedicalStaffMembership, ctx: &AuthorizationContext) -> Evaluation {
    let principal = &ctx.principal;
    if !principal.is_medical_staff() {
        return Evaluation::deny(DenyReason::NotMedicalStaff);
    }
    if req.require_license_id() && principal.license_id().is_none() {
        return Evaluation::deny(DenyReason::MissingLicenseId);
    }
    Evaluation::allow()
}
