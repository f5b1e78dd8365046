//! Permission checks and policy evaluation.
//!
//! Both commands return whether access was allowed so the caller can pick an exit code.

use uuid::Uuid;
use valyan_authz::{AuthorizationContext, Decision, PermissionResolver, Principal, ResourceRef};
use valyan_storage::PrincipalId;

use crate::app::App;
use crate::cli::AuthorizeArgs;

pub async fn cmd_check(
    app: &App,
    role: &str,
    code: &str,
) -> Result<bool, Box<dyn std::error::Error>> {
    let allowed = app.resolver.has_permission(role, code).await?;
    if allowed {
        println!("ALLOW: role '{}' has {}", role, code);
    } else {
        println!("DENY: role '{}' does not have {}", role, code);
    }
    Ok(allowed)
}

fn principal_from_args(args: &AuthorizeArgs) -> Result<Principal, Box<dyn std::error::Error>> {
    let id = match &args.principal_id {
        Some(id) => id
            .parse::<PrincipalId>()
            .map_err(|e| format!("Invalid principal id '{}': {}", id, e))?,
        None => PrincipalId(Uuid::new_v4()),
    };

    let mut principal = Principal::new(id, args.name.as_str());
    if let Some(role) = &args.role {
        principal = principal.with_role(role.as_str());
    }
    if args.medical_staff || args.license_id.is_some() {
        principal = principal.with_medical_staff(args.license_id.as_deref());
    }
    Ok(principal)
}

pub async fn cmd_authorize(
    app: &App,
    args: &AuthorizeArgs,
) -> Result<bool, Box<dyn std::error::Error>> {
    let mut ctx = AuthorizationContext::new(principal_from_args(args)?);
    if let (Some(resource_type), Some(resource_id)) = (&args.resource_type, &args.resource_id) {
        ctx = ctx.resource(ResourceRef::new(resource_type.as_str(), resource_id.as_str()));
    }
    if let Some(route) = &args.route {
        ctx = ctx.route(route.as_str());
    }
    if let Some(client_ip) = &args.client_ip {
        ctx = ctx.client_ip(client_ip.as_str());
    }

    let evaluation = match &args.reason {
        Some(reason) => {
            app.authorizer
                .authorize_with_reason(&args.policy, &ctx, Some(reason.clone()))
                .await?
        }
        None => app.authorizer.authorize(&args.policy, &ctx).await?,
    };

    match &evaluation.decision {
        Decision::Allow => println!("ALLOW: {}", args.policy),
        Decision::Deny(reason) => println!("DENY: {} ({})", args.policy, reason),
    }
    for failure in &evaluation.failures {
        println!("  warning: {}", failure);
    }

    Ok(evaluation.is_allowed())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::StoreBackend;
    use crate::commands::cmd_owner_assign;
    use valyan_audit::{AuditAction, AuditLog, AuditLogFilter};
    use valyan_config::AdminConfig;

    async fn memory_app() -> App {
        App::new(StoreBackend::memory(), &AdminConfig::default(), None)
            .await
            .unwrap()
    }

    fn args(policy: &str) -> AuthorizeArgs {
        AuthorizeArgs {
            policy: policy.to_string(),
            principal_id: None,
            name: "test".to_string(),
            role: None,
            medical_staff: false,
            license_id: None,
            resource_type: None,
            resource_id: None,
            route: None,
            client_ip: None,
            reason: None,
        }
    }

    #[tokio::test]
    async fn check_against_seeded_roles() {
        let app = memory_app().await;
        assert!(cmd_check(&app, "Doctor", "Consultation.Prescribe").await.unwrap());
        assert!(!cmd_check(&app, "Receptionist", "Consultation.Prescribe")
            .await
            .unwrap());
        assert!(!cmd_check(&app, "Ghost", "Patient.View").await.unwrap());
    }

    #[tokio::test]
    async fn prescribing_needs_license() {
        let app = memory_app().await;

        let mut a = args("CanPrescribe");
        a.role = Some("Doctor".into());
        a.medical_staff = true;
        assert!(!cmd_authorize(&app, &a).await.unwrap());

        a.license_id = Some(Uuid::new_v4().to_string());
        assert!(cmd_authorize(&app, &a).await.unwrap());
    }

    #[tokio::test]
    async fn ownership_and_emergency() {
        let app = memory_app().await;
        let doctor = Uuid::new_v4();
        cmd_owner_assign(&app, "Consultation", "c-9", &doctor.to_string())
            .await
            .unwrap();

        let mut a = args("CanEditOwnConsultations");
        a.role = Some("Doctor".into());
        a.principal_id = Some(doctor.to_string());
        a.resource_type = Some("Consultation".into());
        a.resource_id = Some("c-9".into());
        assert!(cmd_authorize(&app, &a).await.unwrap());

        a.principal_id = Some(Uuid::new_v4().to_string());
        assert!(!cmd_authorize(&app, &a).await.unwrap());

        let mut e = args("EmergencyOverride");
        e.role = Some("Doctor".into());
        e.reason = Some("cardiac arrest".into());
        e.route = Some("/patients/1".into());
        assert!(cmd_authorize(&app, &e).await.unwrap());

        let events = app
            .backend
            .query(AuditLogFilter::default().action(AuditAction::EmergencyAccess))
            .await
            .unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].reason.as_deref(), Some("cardiac arrest"));
    }

    #[tokio::test]
    async fn unknown_policy_and_bad_ids_are_errors() {
        let app = memory_app().await;
        assert!(cmd_authorize(&app, &args("NoSuchPolicy")).await.is_err());

        let mut a = args("CanViewPatients");
        a.principal_id = Some("not-a-uuid".into());
        assert!(cmd_authorize(&app, &a).await.is_err());

        assert!(cmd_owner_assign(&app, "Consultation", "c-1", "nope")
            .await
            .is_err());
    }
}
