//! Named policies: ordered requirement lists attached to protected operations.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::catalog::{admin, appointment, consultation, patient, special};
use crate::error::AuthzError;
use crate::evaluator::{Decision, Evaluation, Evaluator};
use crate::principal::AuthorizationContext;
use crate::requirement::PermissionRequirement;

/// Names of the policies in [`PolicyRegistry::clinic_defaults`].
pub mod names {
    pub const CAN_VIEW_PATIENTS: &str = "CanViewPatients";
    pub const CAN_MANAGE_PATIENTS: &str = "CanManagePatients";
    pub const CAN_VIEW_SENSITIVE_PATIENT_DATA: &str = "CanViewSensitivePatientData";
    pub const CAN_VIEW_CONSULTATIONS: &str = "CanViewConsultations";
    pub const CAN_CREATE_CONSULTATIONS: &str = "CanCreateConsultations";
    pub const CAN_EDIT_OWN_CONSULTATIONS: &str = "CanEditOwnConsultations";
    pub const CAN_PRESCRIBE: &str = "CanPrescribe";
    pub const CAN_VIEW_APPOINTMENTS: &str = "CanViewAppointments";
    pub const CAN_MANAGE_APPOINTMENTS: &str = "CanManageAppointments";
    pub const CAN_ACCESS_ADMIN: &str = "CanAccessAdmin";
    pub const CAN_VIEW_AUDIT_LOG: &str = "CanViewAuditLog";
    pub const CAN_MANAGE_USERS: &str = "CanManageUsers";
    pub const CAN_MANAGE_ROLES: &str = "CanManageRoles";
    pub const REQUIRES_DOCTOR: &str = "RequiresDoctor";
    pub const REQUIRES_MEDICAL_STAFF: &str = "RequiresMedicalStaff";
    pub const REQUIRES_ADMIN: &str = "RequiresAdmin";
    pub const EMERGENCY_OVERRIDE: &str = "EmergencyOverride";
}

#[derive(Clone, Debug, Default)]
pub struct PolicyRegistry {
    policies: BTreeMap<String, Vec<PermissionRequirement>>,
}

impl PolicyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) a policy. Both the name and the list must be non-empty.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        requirements: Vec<PermissionRequirement>,
    ) -> Result<(), AuthzError> {
        let name = name.into();
        if name.is_empty() {
            return Err(AuthzError::invalid("policy name must not be empty"));
        }
        if requirements.is_empty() {
            return Err(AuthzError::invalid(format!(
                "policy {} has no requirements",
                name
            )));
        }
        self.policies.insert(name, requirements);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&[PermissionRequirement]> {
        self.policies.get(name).map(Vec::as_slice)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.policies.keys().map(String::as_str)
    }

    /// The policies the clinic application protects its operations with.
    pub fn clinic_defaults() -> Result<Self, AuthzError> {
        use PermissionRequirement as R;

        let mut registry = Self::new();
        registry.register(names::CAN_VIEW_PATIENTS, vec![R::single(patient::VIEW)?])?;
        registry.register(
            names::CAN_MANAGE_PATIENTS,
            vec![R::any_of([patient::CREATE, patient::EDIT, patient::DELETE])?],
        )?;
        registry.register(
            names::CAN_VIEW_SENSITIVE_PATIENT_DATA,
            vec![R::single(patient::VIEW_SENSITIVE_DATA)?],
        )?;
        registry.register(
            names::CAN_VIEW_CONSULTATIONS,
            vec![R::any_of([
                consultation::VIEW,
                consultation::VIEW_OWN,
                consultation::VIEW_DEPARTMENT,
            ])?],
        )?;
        registry.register(
            names::CAN_CREATE_CONSULTATIONS,
            vec![R::single(consultation::CREATE)?, R::medical_staff(true)],
        )?;
        registry.register(
            names::CAN_EDIT_OWN_CONSULTATIONS,
            vec![
                R::single(consultation::EDIT_OWN)?,
                R::resource_owner("Consultation")?,
            ],
        )?;
        registry.register(
            names::CAN_PRESCRIBE,
            vec![R::single(consultation::PRESCRIBE)?, R::medical_staff(true)],
        )?;
        registry.register(
            names::CAN_VIEW_APPOINTMENTS,
            vec![R::single(appointment::VIEW)?],
        )?;
        registry.register(
            names::CAN_MANAGE_APPOINTMENTS,
            vec![R::any_of([
                appointment::CREATE,
                appointment::EDIT,
                appointment::DELETE,
                appointment::CANCEL,
            ])?],
        )?;
        registry.register(
            names::CAN_ACCESS_ADMIN,
            vec![R::single(admin::ACCESS_DASHBOARD)?],
        )?;
        registry.register(
            names::CAN_VIEW_AUDIT_LOG,
            vec![R::single(admin::VIEW_AUDIT_LOG)?],
        )?;
        registry.register(
            names::CAN_MANAGE_USERS,
            vec![R::single(admin::MANAGE_USERS)?],
        )?;
        registry.register(
            names::CAN_MANAGE_ROLES,
            vec![R::single(admin::roles::ASSIGN_PERMISSIONS)?],
        )?;
        registry.register(names::REQUIRES_DOCTOR, vec![R::medical_staff(true)])?;
        registry.register(names::REQUIRES_MEDICAL_STAFF, vec![R::medical_staff(false)])?;
        registry.register(names::REQUIRES_ADMIN, vec![R::single(special::FULL_ACCESS)?])?;
        registry.register(
            names::EMERGENCY_OVERRIDE,
            vec![R::single(special::EMERGENCY_ACCESS)?, R::emergency(None)],
        )?;
        Ok(registry)
    }
}

/// Policy entry point: evaluates every requirement of a named policy.
#[derive(Clone)]
pub struct Authorizer {
    evaluator: Evaluator,
    registry: Arc<PolicyRegistry>,
}

impl Authorizer {
    pub fn new(evaluator: Evaluator, registry: Arc<PolicyRegistry>) -> Self {
        Self {
            evaluator,
            registry,
        }
    }

    pub fn registry(&self) -> &PolicyRegistry {
        &self.registry
    }

    pub fn evaluator(&self) -> &Evaluator {
        &self.evaluator
    }

    /// Allow iff every requirement allows. Stops at the first deny.
    ///
    /// An unknown policy name is a programming error and returns `UnknownPolicy`.
    pub async fn authorize(
        &self,
        policy: &str,
        ctx: &AuthorizationContext,
    ) -> Result<Evaluation, AuthzError> {
        let requirements = self.requirements(policy)?;
        Ok(self.run(policy, requirements.iter(), ctx).await)
    }

    /// Like [`Authorizer::authorize`], with `reason` attached to the policy's
    /// emergency-access requirements.
    pub async fn authorize_with_reason(
        &self,
        policy: &str,
        ctx: &AuthorizationContext,
        reason: Option<String>,
    ) -> Result<Evaluation, AuthzError> {
        let requirements: Vec<PermissionRequirement> = self
            .requirements(policy)?
            .iter()
            .map(|req| match req {
                PermissionRequirement::EmergencyAccess(_) => {
                    PermissionRequirement::emergency(reason.clone())
                }
                other => other.clone(),
            })
            .collect();
        Ok(self.run(policy, requirements.iter(), ctx).await)
    }

    fn requirements(&self, policy: &str) -> Result<&[PermissionRequirement], AuthzError> {
        self.registry
            .get(policy)
            .ok_or_else(|| AuthzError::UnknownPolicy(policy.to_string()))
    }

    async fn run<'a>(
        &self,
        policy: &str,
        requirements: impl Iterator<Item = &'a PermissionRequirement>,
        ctx: &AuthorizationContext,
    ) -> Evaluation {
        let mut failures = Vec::new();
        for requirement in requirements {
            let evaluation = self.evaluator.evaluate(requirement, ctx).await;
            failures.extend(evaluation.failures);
            if let Decision::Deny(reason) = evaluation.decision {
                warn!(policy, principal = %ctx.principal.id, %reason, "Policy denied");
                return Evaluation {
                    decision: Decision::Deny(reason),
                    failures,
                };
            }
        }
        debug!(policy, principal = %ctx.principal.id, "Policy allowed");
        Evaluation {
            decision: Decision::Allow,
            failures,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluator::DenyReason;
    use crate::principal::{Principal, ResourceRef};
    use crate::resolver::PermissionService;
    use crate::test_support::{FakeOwnership, FakePermissionStore, RecordingAuditLog};
    use uuid::Uuid;
    use valyan_storage::PrincipalId;

    fn authorizer(
        store: FakePermissionStore,
        ownership: FakeOwnership,
    ) -> (Authorizer, Arc<FakePermissionStore>, Arc<RecordingAuditLog>) {
        let store = Arc::new(store);
        let audit = Arc::new(RecordingAuditLog::new());
        let evaluator = Evaluator::new(
            Arc::new(PermissionService::new(store.clone())),
            Arc::new(ownership),
            audit.clone(),
        );
        let registry = Arc::new(PolicyRegistry::clinic_defaults().unwrap());
        (Authorizer::new(evaluator, registry), store, audit)
    }

    fn doctor(license: bool) -> Principal {
        let principal = Principal::new(PrincipalId(Uuid::new_v4()), "dr.popescu").with_role("Doctor");
        if license {
            principal.with_medical_staff(Some(&Uuid::new_v4().to_string()))
        } else {
            principal.with_medical_staff(None)
        }
    }

    #[test]
    fn clinic_defaults_registers_every_policy() {
        let registry = PolicyRegistry::clinic_defaults().unwrap();
        assert_eq!(registry.names().count(), 17);
        assert_eq!(registry.get(names::CAN_PRESCRIBE).unwrap().len(), 2);
        assert!(registry.get("CanFly").is_none());
    }

    #[test]
    fn register_rejects_empty() {
        let mut registry = PolicyRegistry::new();
        assert!(matches!(
            registry.register("", vec![PermissionRequirement::medical_staff(false)]),
            Err(AuthzError::InvalidArgument(_))
        ));
        assert!(matches!(
            registry.register("Nothing", vec![]),
            Err(AuthzError::InvalidArgument(_))
        ));
    }

    #[tokio::test]
    async fn unknown_policy_is_an_error() {
        let (authorizer, _, _) = authorizer(FakePermissionStore::new(), FakeOwnership::new());
        let ctx = AuthorizationContext::new(doctor(true));
        assert!(matches!(
            authorizer.authorize("CanFly", &ctx).await,
            Err(AuthzError::UnknownPolicy(name)) if name == "CanFly"
        ));
    }

    #[tokio::test]
    async fn every_requirement_must_pass() {
        let (authorizer, _, _) = authorizer(
            FakePermissionStore::new().with_role("Doctor", &["Consultation.Prescribe"]),
            FakeOwnership::new(),
        );

        let licensed = AuthorizationContext::new(doctor(true));
        let evaluation = authorizer.authorize(names::CAN_PRESCRIBE, &licensed).await.unwrap();
        assert!(evaluation.is_allowed());

        let unlicensed = AuthorizationContext::new(doctor(false));
        let evaluation = authorizer.authorize(names::CAN_PRESCRIBE, &unlicensed).await.unwrap();
        assert_eq!(evaluation.deny_reason(), Some(&DenyReason::MissingLicenseId));
    }

    #[tokio::test]
    async fn stops_at_first_deny() {
        let owner = PrincipalId(Uuid::new_v4());
        let ownership = FakeOwnership::new().with_owner(owner, "Consultation", "7");
        let (authorizer, _, _) = authorizer(FakePermissionStore::new(), ownership);

        // Role lacks Consultation.EditOwn, so ownership is never consulted.
        let ctx = AuthorizationContext::new(Principal::new(owner, "dr.owner").with_role("Doctor"))
            .resource(ResourceRef::new("Consultation", "7"));
        let evaluation = authorizer
            .authorize(names::CAN_EDIT_OWN_CONSULTATIONS, &ctx)
            .await
            .unwrap();
        assert_eq!(evaluation.deny_reason(), Some(&DenyReason::MissingPermission));
    }

    #[tokio::test]
    async fn edit_own_consultation() {
        let owner = PrincipalId(Uuid::new_v4());
        let ownership = FakeOwnership::new().with_owner(owner, "Consultation", "7");
        let (authorizer, _, _) = authorizer(
            FakePermissionStore::new().with_role("Doctor", &["Consultation.EditOwn"]),
            ownership,
        );

        let ctx = AuthorizationContext::new(Principal::new(owner, "dr.owner").with_role("Doctor"))
            .resource(ResourceRef::new("Consultation", "7"));
        assert!(authorizer
            .authorize(names::CAN_EDIT_OWN_CONSULTATIONS, &ctx)
            .await
            .unwrap()
            .is_allowed());

        let other = AuthorizationContext::new(
            Principal::new(PrincipalId(Uuid::new_v4()), "dr.other").with_role("Doctor"),
        )
        .resource(ResourceRef::new("Consultation", "7"));
        assert_eq!(
            authorizer
                .authorize(names::CAN_EDIT_OWN_CONSULTATIONS, &other)
                .await
                .unwrap()
                .deny_reason(),
            Some(&DenyReason::NotOwner)
        );
    }

    #[tokio::test]
    async fn emergency_override_requires_permission_then_audits() {
        let (authorizer, _, audit) = authorizer(
            FakePermissionStore::new()
                .with_role("Doctor", &["Special.EmergencyAccess"])
                .with_role("Receptionist", &["Patient.View"]),
            FakeOwnership::new(),
        );

        let ctx = AuthorizationContext::new(doctor(true))
            .resource(ResourceRef::new("Patient", "99"))
            .route("/patients/99");
        let evaluation = authorizer
            .authorize_with_reason(
                names::EMERGENCY_OVERRIDE,
                &ctx,
                Some("Unconscious patient".into()),
            )
            .await
            .unwrap();
        assert!(evaluation.is_allowed());
        assert_eq!(audit.events().len(), 1);
        assert_eq!(
            audit.events()[0].reason.as_deref(),
            Some("Unconscious patient")
        );

        let receptionist = AuthorizationContext::new(
            Principal::new(PrincipalId(Uuid::new_v4()), "front.desk").with_role("Receptionist"),
        );
        let evaluation = authorizer
            .authorize(names::EMERGENCY_OVERRIDE, &receptionist)
            .await
            .unwrap();
        assert!(!evaluation.is_allowed());
        assert_eq!(audit.events().len(), 1);
    }

    #[tokio::test]
    async fn failures_are_collected_across_requirements() {
        let store = FakePermissionStore::new().with_role("Doctor", &["Consultation.Create"]);
        store.set_unavailable(true);
        let (authorizer, _, _) = authorizer(store, FakeOwnership::new());

        let evaluation = authorizer
            .authorize(names::CAN_CREATE_CONSULTATIONS, &AuthorizationContext::new(doctor(true)))
            .await
            .unwrap();
        assert_eq!(evaluation.deny_reason(), Some(&DenyReason::ServiceUnavailable));
        assert_eq!(evaluation.failures.len(), 1);
    }
}
