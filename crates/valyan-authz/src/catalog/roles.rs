//! Default role seeds.
//!
//! Role permissions live in the store. These sets are only what
//! `RoleAdministration::seed_default_roles` writes into an empty install.

use super::permissions::{admin, appointment, consultation, patient, special, staff};

/// A role to create on first install, with its initial permissions.
#[derive(Clone, Copy, Debug)]
pub struct RoleSeed {
    pub name: &'static str,
    pub description: &'static str,
    pub permissions: &'static [&'static str],
}

const ADMIN: &[&str] = &[
    patient::VIEW,
    patient::CREATE,
    patient::EDIT,
    patient::DELETE,
    patient::VIEW_SENSITIVE_DATA,
    patient::EXPORT,
    consultation::VIEW,
    consultation::VIEW_OWN,
    consultation::VIEW_DEPARTMENT,
    consultation::CREATE,
    consultation::EDIT,
    consultation::EDIT_OWN,
    consultation::DELETE,
    consultation::FINALIZE,
    consultation::PRESCRIBE,
    appointment::VIEW,
    appointment::CREATE,
    appointment::EDIT,
    appointment::DELETE,
    appointment::CANCEL,
    appointment::CONFIRM,
    staff::VIEW,
    staff::CREATE,
    staff::EDIT,
    staff::DELETE,
    staff::MANAGE_ROLES,
    admin::ACCESS_DASHBOARD,
    admin::VIEW_AUDIT_LOG,
    admin::MANAGE_SETTINGS,
    admin::MANAGE_USERS,
    admin::VIEW_REPORTS,
    admin::EXPORT_DATA,
    admin::roles::VIEW,
    admin::roles::CREATE,
    admin::roles::EDIT,
    admin::roles::DELETE,
    admin::roles::ASSIGN_PERMISSIONS,
    special::FULL_ACCESS,
    special::EMERGENCY_ACCESS,
];

const DOCTOR: &[&str] = &[
    patient::VIEW,
    patient::CREATE,
    patient::EDIT,
    patient::VIEW_SENSITIVE_DATA,
    consultation::VIEW,
    consultation::VIEW_OWN,
    consultation::VIEW_DEPARTMENT,
    consultation::CREATE,
    consultation::EDIT_OWN,
    consultation::FINALIZE,
    consultation::PRESCRIBE,
    appointment::VIEW,
    appointment::CREATE,
    appointment::EDIT,
    appointment::CONFIRM,
    staff::VIEW,
    special::EMERGENCY_ACCESS,
];

const NURSE: &[&str] = &[
    patient::VIEW,
    patient::CREATE,
    patient::EDIT,
    consultation::VIEW,
    consultation::VIEW_DEPARTMENT,
    appointment::VIEW,
    appointment::CREATE,
    appointment::EDIT,
    appointment::CANCEL,
    appointment::CONFIRM,
    staff::VIEW,
];

// No sensitive data and no consultations.
const RECEPTIONIST: &[&str] = &[
    patient::VIEW,
    patient::CREATE,
    patient::EDIT,
    appointment::VIEW,
    appointment::CREATE,
    appointment::EDIT,
    appointment::DELETE,
    appointment::CANCEL,
    appointment::CONFIRM,
    staff::VIEW,
];

const MANAGER: &[&str] = &[
    patient::VIEW,
    patient::EXPORT,
    appointment::VIEW,
    staff::VIEW,
    staff::CREATE,
    staff::EDIT,
    admin::ACCESS_DASHBOARD,
    admin::VIEW_REPORTS,
    admin::EXPORT_DATA,
];

const USER: &[&str] = &[patient::VIEW];

static SEEDS: &[RoleSeed] = &[
    RoleSeed {
        name: "Admin",
        description: "Full access to every feature",
        permissions: ADMIN,
    },
    RoleSeed {
        name: "Doctor",
        description: "Patients, own consultations and prescriptions",
        permissions: DOCTOR,
    },
    RoleSeed {
        name: "Nurse",
        description: "Assists doctors; manages appointments",
        permissions: NURSE,
    },
    RoleSeed {
        name: "Receptionist",
        description: "Patient registration and appointments",
        permissions: RECEPTIONIST,
    },
    RoleSeed {
        name: "Manager",
        description: "Reports and staff administration without medical access",
        permissions: MANAGER,
    },
    RoleSeed {
        name: "User",
        description: "Minimal access",
        permissions: USER,
    },
];

pub fn default_roles() -> &'static [RoleSeed] {
    SEEDS
}
