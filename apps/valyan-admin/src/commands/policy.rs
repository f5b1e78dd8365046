//! Named policy listing

use valyan_authz::PermissionRequirement;

use crate::app::App;

fn describe(req: &PermissionRequirement) -> String {
    match req {
        PermissionRequirement::SinglePermission(r) => format!("permission {}", r.code()),
        PermissionRequirement::AnyOfPermissions(r) => {
            format!("any of [{}]", r.codes().join(", "))
        }
        PermissionRequirement::MedicalStaffMembership(r) if r.require_license_id() => {
            "medical staff with license id".to_string()
        }
        PermissionRequirement::MedicalStaffMembership(_) => "medical staff".to_string(),
        PermissionRequirement::ResourceOwnership(r) => {
            format!("owner of the {}", r.resource_type())
        }
        PermissionRequirement::EmergencyAccess(_) => "audited emergency access".to_string(),
    }
}

pub fn cmd_policy_list(app: &App) -> Result<(), Box<dyn std::error::Error>> {
    let registry = app.authorizer.registry();
    for name in registry.names() {
        let requirements = registry.get(name).unwrap_or_default();
        let described: Vec<String> = requirements.iter().map(describe).collect();
        println!("{:<30} {}", name, described.join(" AND "));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn describes_each_requirement_kind() {
        assert_eq!(
            describe(&PermissionRequirement::single("Patient.View").unwrap()),
            "permission Patient.View"
        );
        assert_eq!(
            describe(&PermissionRequirement::any_of(["A.B", "C.D"]).unwrap()),
            "any of [A.B, C.D]"
        );
        assert_eq!(
            describe(&PermissionRequirement::medical_staff(false)),
            "medical staff"
        );
        assert_eq!(
            describe(&PermissionRequirement::resource_owner("Consultation").unwrap()),
            "owner of the Consultation"
        );
        assert_eq!(
            describe(&PermissionRequirement::emergency(None)),
            "audited emergency access"
        );
    }
}
