//! The authenticated caller and the per-request data an evaluation needs.

use std::collections::BTreeMap;

use uuid::Uuid;
use valyan_storage::PrincipalId;

/// Claim marking medical-staff membership; the value must be `"true"`.
pub const MEDICAL_STAFF_CLAIM: &str = "MedicalStaff";
/// Claim carrying the staff member's medical-personnel (license) id.
pub const LICENSE_ID_CLAIM: &str = "PersonalMedicalID";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Principal {
    pub id: PrincipalId,
    pub name: String,
    /// The single role the principal acts under. `None` is denied every permission check.
    pub role: Option<String>,
    pub claims: BTreeMap<String, String>,
}

impl Principal {
    pub fn new(id: PrincipalId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            role: None,
            claims: BTreeMap::new(),
        }
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }

    pub fn with_claim(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.claims.insert(key.into(), value.into());
        self
    }

    /// Mark as medical staff, optionally with a license id.
    pub fn with_medical_staff(self, license_id: Option<&str>) -> Self {
        let principal = self.with_claim(MEDICAL_STAFF_CLAIM, "true");
        match license_id {
            Some(id) => principal.with_claim(LICENSE_ID_CLAIM, id),
            None => principal,
        }
    }

    pub fn claim(&self, key: &str) -> Option<&str> {
        self.claims.get(key).map(String::as_str)
    }

    pub fn is_medical_staff(&self) -> bool {
        self.claim(MEDICAL_STAFF_CLAIM)
            .is_some_and(|v| v.eq_ignore_ascii_case("true"))
    }

    /// The license id, if present and a non-nil UUID.
    pub fn license_id(&self) -> Option<Uuid> {
        self.claim(LICENSE_ID_CLAIM)
            .and_then(|v| Uuid::parse_str(v).ok())
            .filter(|id| !id.is_nil())
    }
}

/// A concrete resource instance, e.g. consultation `42`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResourceRef {
    pub resource_type: String,
    pub resource_id: String,
}

impl ResourceRef {
    pub fn new(resource_type: impl Into<String>, resource_id: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            resource_id: resource_id.into(),
        }
    }
}

/// Everything an evaluation knows about the request.
#[derive(Clone, Debug)]
pub struct AuthorizationContext {
    pub principal: Principal,
    pub resource: Option<ResourceRef>,
    pub route: Option<String>,
    pub client_ip: Option<String>,
}

impl AuthorizationContext {
    pub fn new(principal: Principal) -> Self {
        Self {
            principal,
            resource: None,
            route: None,
            client_ip: None,
        }
    }

    pub fn resource(mut self, resource: ResourceRef) -> Self {
        self.resource = Some(resource);
        self
    }

    pub fn route(mut self, route: impl Into<String>) -> Self {
        self.route = Some(route.into());
        self
    }

    pub fn client_ip(mut self, client_ip: impl Into<String>) -> Self {
        self.client_ip = Some(client_ip.into());
        self
    }
}
