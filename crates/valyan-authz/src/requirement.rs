//! Declarative authorization rules attached to protected operations.

use crate::error::AuthzError;

/// One authorization rule. The variant set is closed; the evaluator matches it exhaustively.
///
/// Values are immutable once built. Construct them through the associated
/// functions, which reject empty codes and resource types.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PermissionRequirement {
    SinglePermission(SinglePermission),
    AnyOfPermissions(AnyOfPermissions),
    MedicalStaffMembership(MedicalStaffMembership),
    ResourceOwnership(ResourceOwnership),
    EmergencyAccess(EmergencyAccess),
}

/// The principal's role must hold exactly this permission code.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SinglePermission {
    code: String,
}

impl SinglePermission {
    pub fn code(&self) -> &str {
        &self.code
    }
}

/// The principal's role must hold at least one code; checked in list order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AnyOfPermissions {
    codes: Vec<String>,
}

impl AnyOfPermissions {
    pub fn codes(&self) -> &[String] {
        &self.codes
    }
}

/// The principal must carry the medical-staff claim, and a valid license id if required.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MedicalStaffMembership {
    require_license_id: bool,
}

impl MedicalStaffMembership {
    pub fn require_license_id(&self) -> bool {
        self.require_license_id
    }
}

/// The principal must own the resource instance named in the context.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResourceOwnership {
    resource_type: String,
}

impl ResourceOwnership {
    pub fn resource_type(&self) -> &str {
        &self.resource_type
    }
}

/// Break-glass access: always granted, always audited.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EmergencyAccess {
    reason: Option<String>,
}

impl EmergencyAccess {
    pub fn reason(&self) -> Option<&str> {
        self.reason.as_deref()
    }
}

impl PermissionRequirement {
    /// Require a single permission code, e.g. `"Patient.View"`.
    pub fn single(code: impl Into<String>) -> Result<Self, AuthzError> {
        let code = code.into();
        if code.is_empty() {
            return Err(AuthzError::invalid("permission code must not be empty"));
        }
        Ok(PermissionRequirement::SinglePermission(SinglePermission {
            code,
        }))
    }

    /// Require any one of `codes`. The list and each code must be non-empty.
    pub fn any_of<I, S>(codes: I) -> Result<Self, AuthzError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let codes: Vec<String> = codes.into_iter().map(Into::into).collect();
        if codes.is_empty() {
            return Err(AuthzError::invalid(
                "permission code list must not be empty",
            ));
        }
        if codes.iter().any(String::is_empty) {
            return Err(AuthzError::invalid("permission code must not be empty"));
        }
        Ok(PermissionRequirement::AnyOfPermissions(AnyOfPermissions {
            codes,
        }))
    }

    pub fn medical_staff(require_license_id: bool) -> Self {
        PermissionRequirement::MedicalStaffMembership(MedicalStaffMembership {
            require_license_id,
        })
    }

    pub fn resource_owner(resource_type: impl Into<String>) -> Result<Self, AuthzError> {
        let resource_type = resource_type.into();
        if resource_type.is_empty() {
            return Err(AuthzError::invalid("resource type must not be empty"));
        }
        Ok(PermissionRequirement::ResourceOwnership(ResourceOwnership {
            resource_type,
        }))
    }

    pub fn emergency(reason: Option<String>) -> Self {
        PermissionRequirement::EmergencyAccess(EmergencyAccess { reason })
    }

    /// Short label used in log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            PermissionRequirement::SinglePermission(_) => "single_permission",
            PermissionRequirement::AnyOfPermissions(_) => "any_of_permissions",
            PermissionRequirement::MedicalStaffMembership(_) => "medical_staff",
            PermissionRequirement::ResourceOwnership(_) => "resource_ownership",
            PermissionRequirement::EmergencyAccess(_) => "emergency_access",
        }
    }
}

impl Default for MedicalStaffMembership {
    fn default() -> Self {
        Self {
            require_license_id: true,
        }
    }
}

impl From<MedicalStaffMembership> for PermissionRequirement {
    fn from(value: MedicalStaffMembership) -> Self {
        PermissionRequirement::MedicalStaffMembership(value)
    }
}
