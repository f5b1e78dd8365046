//! Field-level view/edit decisions for forms, derived from a role's permission set.

use crate::catalog::special;
use crate::error::AuthzError;
use crate::resolver::{PermissionResolver, PermissionSet};

/// How a form field is rendered for the current principal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldState {
    Hidden,
    ReadOnly,
    Editable,
}

const SENSITIVE_FIELDS: &[(&str, &[&str])] = &[
    (
        "Patient",
        &["CNP", "Allergies", "ChronicDiseases", "BloodType", "Notes"],
    ),
    ("Staff", &["CNP", "Salary"]),
    ("Consultation", &["Diagnosis", "Treatment", "Prescription"]),
];

/// Whether `field` of `entity` holds sensitive personal or medical data.
///
/// Names compare case-insensitively.
pub fn is_sensitive_field(entity: &str, field: &str) -> bool {
    SENSITIVE_FIELDS
        .iter()
        .find(|(e, _)| e.eq_ignore_ascii_case(entity))
        .is_some_and(|(_, fields)| fields.iter().any(|f| f.eq_ignore_ascii_case(field)))
}

/// A role's resolved permissions, queried per field.
#[derive(Clone, Debug)]
pub struct FieldPermissions {
    permissions: PermissionSet,
}

impl FieldPermissions {
    pub fn new(permissions: PermissionSet) -> Self {
        Self { permissions }
    }

    /// Resolve `role` through the cache.
    pub async fn load(resolver: &dyn PermissionResolver, role: &str) -> Result<Self, AuthzError> {
        Ok(Self::new(resolver.permissions_for_role(role).await?))
    }

    pub fn permissions(&self) -> &PermissionSet {
        &self.permissions
    }

    fn full_access(&self) -> bool {
        self.permissions.contains(special::FULL_ACCESS)
    }

    fn holds(&self, code: &str) -> bool {
        self.permissions.contains(code)
    }

    pub fn has_permission(&self, code: &str) -> bool {
        !code.is_empty() && (self.full_access() || self.holds(code))
    }

    /// False for an empty list.
    pub fn has_any(&self, codes: &[&str]) -> bool {
        !codes.is_empty() && (self.full_access() || codes.iter().any(|c| self.holds(c)))
    }

    /// True for an empty list.
    pub fn has_all(&self, codes: &[&str]) -> bool {
        codes.is_empty() || self.full_access() || codes.iter().all(|c| self.holds(c))
    }

    /// `Entity.View.Field`, then `Entity.ViewSensitiveData` for sensitive fields,
    /// then `Entity.View`.
    pub fn can_view_field(&self, entity: &str, field: &str) -> bool {
        if self.full_access() || self.holds(&format!("{}.View.{}", entity, field)) {
            return true;
        }
        if is_sensitive_field(entity, field)
            && self.holds(&format!("{}.ViewSensitiveData", entity))
        {
            return true;
        }
        self.holds(&format!("{}.View", entity))
    }

    /// `Entity.Edit.Field`, else `Entity.Edit`; sensitive fields additionally
    /// need `Entity.ViewSensitiveData` to fall back to `Entity.Edit`.
    pub fn can_edit_field(&self, entity: &str, field: &str) -> bool {
        if self.full_access() || self.holds(&format!("{}.Edit.{}", entity, field)) {
            return true;
        }
        if is_sensitive_field(entity, field)
            && !self.holds(&format!("{}.ViewSensitiveData", entity))
        {
            return false;
        }
        self.holds(&format!("{}.Edit", entity))
    }

    pub fn field_state(&self, entity: &str, field: &str, edit_mode: bool) -> FieldState {
        if !self.can_view_field(entity, field) {
            FieldState::Hidden
        } else if edit_mode && self.can_edit_field(entity, field) {
            FieldState::Editable
        } else {
            FieldState::ReadOnly
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn perms(codes: &[&str]) -> FieldPermissions {
        FieldPermissions::new(Arc::new(codes.iter().map(|c| c.to_string()).collect()))
    }

    #[test]
    fn sensitive_fields_case_insensitive() {
        assert!(is_sensitive_field("Patient", "CNP"));
        assert!(is_sensitive_field("patient", "cnp"));
        assert!(is_sensitive_field("Staff", "Salary"));
        assert!(is_sensitive_field("Consultation", "diagnosis"));
        assert!(!is_sensitive_field("Patient", "Phone"));
        assert!(!is_sensitive_field("Appointment", "Notes"));
    }

    #[test]
    fn full_access_grants_everything() {
        let p = perms(&["Special.FullAccess"]);
        assert!(p.has_permission("Patient.Delete"));
        assert!(p.has_any(&["Anything.At.All"]));
        assert!(p.can_edit_field("Patient", "CNP"));
        assert_eq!(p.field_state("Staff", "Salary", true), FieldState::Editable);
        assert!(!p.has_permission(""));
    }

    #[test]
    fn any_and_all_on_empty_lists() {
        let p = perms(&["Patient.View"]);
        assert!(!p.has_any(&[]));
        assert!(p.has_all(&[]));
        assert!(p.has_any(&["Patient.Edit", "Patient.View"]));
        assert!(!p.has_all(&["Patient.Edit", "Patient.View"]));
    }

    #[test]
    fn codes_stay_case_sensitive() {
        let p = perms(&["Patient.View"]);
        assert!(p.has_permission("Patient.View"));
        assert!(!p.has_permission("patient.view"));
    }

    #[test]
    fn view_field_fallbacks() {
        let receptionist = perms(&["Patient.View", "Patient.Edit"]);
        assert!(receptionist.can_view_field("Patient", "Phone"));
        // Sensitive fields still fall back to the general view permission.
        assert!(receptionist.can_view_field("Patient", "CNP"));

        let specific = perms(&["Patient.View.Allergies"]);
        assert!(specific.can_view_field("Patient", "Allergies"));
        assert!(!specific.can_view_field("Patient", "Phone"));

        let sensitive = perms(&["Patient.ViewSensitiveData"]);
        assert!(sensitive.can_view_field("Patient", "BloodType"));
        assert!(!sensitive.can_view_field("Patient", "Phone"));
    }

    #[test]
    fn edit_sensitive_field_needs_sensitive_permission() {
        let receptionist = perms(&["Patient.View", "Patient.Edit"]);
        assert!(receptionist.can_edit_field("Patient", "Phone"));
        assert!(!receptionist.can_edit_field("Patient", "CNP"));

        let doctor = perms(&["Patient.View", "Patient.Edit", "Patient.ViewSensitiveData"]);
        assert!(doctor.can_edit_field("Patient", "CNP"));

        let explicit = perms(&["Patient.View", "Patient.Edit.CNP"]);
        assert!(explicit.can_edit_field("Patient", "CNP"));
        assert!(!explicit.can_edit_field("Patient", "Phone"));
    }

    #[test]
    fn field_states() {
        let receptionist = perms(&["Patient.View", "Patient.Edit"]);
        assert_eq!(
            receptionist.field_state("Patient", "Phone", true),
            FieldState::Editable
        );
        assert_eq!(
            receptionist.field_state("Patient", "Phone", false),
            FieldState::ReadOnly
        );
        assert_eq!(
            receptionist.field_state("Patient", "CNP", true),
            FieldState::ReadOnly
        );
        assert_eq!(
            receptionist.field_state("Consultation", "Diagnosis", true),
            FieldState::Hidden
        );
    }

    #[tokio::test]
    async fn load_through_resolver() {
        use crate::resolver::PermissionService;
        use crate::test_support::FakePermissionStore;

        let store = Arc::new(FakePermissionStore::new().with_role("Nurse", &["Patient.View"]));
        let resolver = PermissionService::new(store.clone());

        let fields = FieldPermissions::load(&resolver, "Nurse").await.unwrap();
        assert_eq!(fields.field_state("Patient", "Phone", true), FieldState::ReadOnly);
        FieldPermissions::load(&resolver, "Nurse").await.unwrap();
        assert_eq!(store.fetches(), 1);
    }
}
