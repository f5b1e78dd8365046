//! Permission codes known to the clinic.
//!
//! Codes follow `{Entity}.{Action}` or, for field-level permissions,
//! `{Entity}.{Action}.{Field}`. They are compared case-sensitively.

use std::collections::BTreeMap;

use serde::Serialize;

pub mod patient {
    pub const VIEW: &str = "Patient.View";
    pub const CREATE: &str = "Patient.Create";
    pub const EDIT: &str = "Patient.Edit";
    pub const DELETE: &str = "Patient.Delete";
    /// CNP and medical data.
    pub const VIEW_SENSITIVE_DATA: &str = "Patient.ViewSensitiveData";
    pub const EXPORT: &str = "Patient.Export";

    pub mod view_field {
        pub const CNP: &str = "Patient.View.CNP";
        pub const BIRTH_DATE: &str = "Patient.View.BirthDate";
        pub const GENDER: &str = "Patient.View.Gender";
        pub const PHONE: &str = "Patient.View.Phone";
        pub const EMAIL: &str = "Patient.View.Email";
        pub const EMERGENCY_CONTACT: &str = "Patient.View.EmergencyContact";
        pub const ADDRESS: &str = "Patient.View.Address";
        pub const ALLERGIES: &str = "Patient.View.Allergies";
        pub const CHRONIC_DISEASES: &str = "Patient.View.ChronicDiseases";
        pub const BLOOD_TYPE: &str = "Patient.View.BloodType";
        pub const WEIGHT: &str = "Patient.View.Weight";
        pub const HEIGHT: &str = "Patient.View.Height";
        pub const NOTES: &str = "Patient.View.Notes";
        pub const INSURANCE: &str = "Patient.View.Insurance";
        pub const HEALTH_FUND: &str = "Patient.View.HealthFund";
    }

    pub mod edit_field {
        pub const CNP: &str = "Patient.Edit.CNP";
        pub const LAST_NAME: &str = "Patient.Edit.LastName";
        pub const FIRST_NAME: &str = "Patient.Edit.FirstName";
        pub const BIRTH_DATE: &str = "Patient.Edit.BirthDate";
        pub const GENDER: &str = "Patient.Edit.Gender";
        pub const ACTIVE: &str = "Patient.Edit.Active";
        pub const PHONE: &str = "Patient.Edit.Phone";
        pub const SECONDARY_PHONE: &str = "Patient.Edit.SecondaryPhone";
        pub const EMAIL: &str = "Patient.Edit.Email";
        pub const CONTACT_PERSON: &str = "Patient.Edit.ContactPerson";
        pub const CONTACT_RELATION: &str = "Patient.Edit.ContactRelation";
        pub const EMERGENCY_PHONE: &str = "Patient.Edit.EmergencyPhone";
        pub const ADDRESS: &str = "Patient.Edit.Address";
        pub const CITY: &str = "Patient.Edit.City";
        pub const COUNTY: &str = "Patient.Edit.County";
        pub const POSTAL_CODE: &str = "Patient.Edit.PostalCode";
        pub const ALLERGIES: &str = "Patient.Edit.Allergies";
        pub const CHRONIC_DISEASES: &str = "Patient.Edit.ChronicDiseases";
        pub const BLOOD_TYPE: &str = "Patient.Edit.BloodType";
        pub const WEIGHT: &str = "Patient.Edit.Weight";
        pub const HEIGHT: &str = "Patient.Edit.Height";
        pub const NOTES: &str = "Patient.Edit.Notes";
        pub const INSURANCE_TYPE: &str = "Patient.Edit.InsuranceType";
        pub const INSURANCE_NUMBER: &str = "Patient.Edit.InsuranceNumber";
        pub const HEALTH_FUND: &str = "Patient.Edit.HealthFund";
        pub const INSURANCE_EXPIRY: &str = "Patient.Edit.InsuranceExpiry";
    }
}

pub mod consultation {
    pub const VIEW: &str = "Consultation.View";
    /// Only the principal's own consultations.
    pub const VIEW_OWN: &str = "Consultation.ViewOwn";
    pub const VIEW_DEPARTMENT: &str = "Consultation.ViewDepartment";
    pub const CREATE: &str = "Consultation.Create";
    pub const EDIT: &str = "Consultation.Edit";
    pub const EDIT_OWN: &str = "Consultation.EditOwn";
    pub const DELETE: &str = "Consultation.Delete";
    pub const FINALIZE: &str = "Consultation.Finalize";
    pub const PRESCRIBE: &str = "Consultation.Prescribe";

    pub mod edit_field {
        pub const DIAGNOSIS: &str = "Consultation.Edit.Diagnosis";
        pub const SYMPTOMS: &str = "Consultation.Edit.Symptoms";
        pub const CLINICAL_EXAM: &str = "Consultation.Edit.ClinicalExam";
        pub const TREATMENT: &str = "Consultation.Edit.Treatment";
        pub const RECOMMENDATIONS: &str = "Consultation.Edit.Recommendations";
        pub const PRESCRIPTION: &str = "Consultation.Edit.Prescription";
        pub const INVESTIGATIONS: &str = "Consultation.Edit.Investigations";
        pub const FOLLOW_UP_DATE: &str = "Consultation.Edit.FollowUpDate";
        pub const CONSULTATION_TYPE: &str = "Consultation.Edit.ConsultationType";
    }
}

pub mod appointment {
    pub const VIEW: &str = "Appointment.View";
    pub const CREATE: &str = "Appointment.Create";
    pub const EDIT: &str = "Appointment.Edit";
    pub const DELETE: &str = "Appointment.Delete";
    pub const CANCEL: &str = "Appointment.Cancel";
    pub const CONFIRM: &str = "Appointment.Confirm";

    pub mod edit_field {
        pub const DATE: &str = "Appointment.Edit.Date";
        pub const TIME: &str = "Appointment.Edit.Time";
        pub const DURATION: &str = "Appointment.Edit.Duration";
        pub const DOCTOR: &str = "Appointment.Edit.Doctor";
        pub const APPOINTMENT_TYPE: &str = "Appointment.Edit.AppointmentType";
        pub const REASON: &str = "Appointment.Edit.Reason";
        pub const NOTES: &str = "Appointment.Edit.Notes";
        pub const STATUS: &str = "Appointment.Edit.Status";
    }
}

pub mod staff {
    pub const VIEW: &str = "Staff.View";
    pub const CREATE: &str = "Staff.Create";
    pub const EDIT: &str = "Staff.Edit";
    pub const DELETE: &str = "Staff.Delete";
    pub const MANAGE_ROLES: &str = "Staff.ManageRoles";

    pub mod edit_field {
        pub const CNP: &str = "Staff.Edit.CNP";
        pub const LAST_NAME: &str = "Staff.Edit.LastName";
        pub const FIRST_NAME: &str = "Staff.Edit.FirstName";
        pub const EMAIL: &str = "Staff.Edit.Email";
        pub const PHONE: &str = "Staff.Edit.Phone";
        pub const SPECIALTY: &str = "Staff.Edit.Specialty";
        pub const DEPARTMENT: &str = "Staff.Edit.Department";
        pub const STAMP_CODE: &str = "Staff.Edit.StampCode";
        pub const SCHEDULE: &str = "Staff.Edit.Schedule";
        pub const SALARY: &str = "Staff.Edit.Salary";
    }
}

pub mod admin {
    pub const ACCESS_DASHBOARD: &str = "Admin.AccessDashboard";
    pub const VIEW_AUDIT_LOG: &str = "Admin.ViewAuditLog";
    pub const MANAGE_SETTINGS: &str = "Admin.ManageSettings";
    pub const MANAGE_USERS: &str = "Admin.ManageUsers";
    pub const VIEW_REPORTS: &str = "Admin.ViewReports";
    pub const EXPORT_DATA: &str = "Admin.ExportData";

    pub mod roles {
        pub const VIEW: &str = "Admin.Roles.View";
        pub const CREATE: &str = "Admin.Roles.Create";
        pub const EDIT: &str = "Admin.Roles.Edit";
        pub const DELETE: &str = "Admin.Roles.Delete";
        pub const ASSIGN_PERMISSIONS: &str = "Admin.Roles.AssignPermissions";
    }
}

pub mod special {
    /// Break-glass access. Every use is audited.
    pub const EMERGENCY_ACCESS: &str = "Special.EmergencyAccess";
    /// Grants every permission; system administrators only.
    pub const FULL_ACCESS: &str = "Special.FullAccess";
}

/// Display metadata for a permission code, used by role administration UIs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct PermissionDefinition {
    pub code: &'static str,
    pub category: &'static str,
    pub display_name: &'static str,
    pub description: &'static str,
    pub is_field_level: bool,
}

const fn def(
    code: &'static str,
    category: &'static str,
    display_name: &'static str,
    description: &'static str,
) -> PermissionDefinition {
    PermissionDefinition {
        code,
        category,
        display_name,
        description,
        is_field_level: false,
    }
}

const fn field(
    code: &'static str,
    category: &'static str,
    display_name: &'static str,
    description: &'static str,
) -> PermissionDefinition {
    PermissionDefinition {
        code,
        category,
        display_name,
        description,
        is_field_level: true,
    }
}

static DEFINITIONS: &[PermissionDefinition] = &[
    // Patient
    def(patient::VIEW, "Patient", "View patients", "View the patient list"),
    def(patient::CREATE, "Patient", "Create patient", "Register a new patient"),
    def(patient::EDIT, "Patient", "Edit patient", "Edit patient data"),
    def(patient::DELETE, "Patient", "Delete patient", "Delete a patient"),
    def(
        patient::VIEW_SENSITIVE_DATA,
        "Patient",
        "Sensitive data",
        "View CNP and medical data",
    ),
    def(patient::EXPORT, "Patient", "Export patients", "Export the patient list"),
    field(patient::view_field::CNP, "Patient.View", "View CNP", "View the patient's CNP"),
    field(patient::view_field::BIRTH_DATE, "Patient.View", "View birth date", "View the date of birth"),
    field(patient::view_field::PHONE, "Patient.View", "View phone", "View the phone number"),
    field(patient::view_field::EMAIL, "Patient.View", "View email", "View the email address"),
    field(patient::view_field::ADDRESS, "Patient.View", "View address", "View the full address"),
    field(patient::view_field::ALLERGIES, "Patient.View", "View allergies", "View allergies (sensitive)"),
    field(
        patient::view_field::CHRONIC_DISEASES,
        "Patient.View",
        "View chronic diseases",
        "View chronic diseases (sensitive)",
    ),
    field(patient::view_field::INSURANCE, "Patient.View", "View insurance", "View insurance data"),
    field(patient::edit_field::CNP, "Patient.Edit", "Edit CNP", "Change the patient's CNP"),
    field(patient::edit_field::LAST_NAME, "Patient.Edit", "Edit last name", "Change the last name"),
    field(patient::edit_field::FIRST_NAME, "Patient.Edit", "Edit first name", "Change the first name"),
    field(patient::edit_field::BIRTH_DATE, "Patient.Edit", "Edit birth date", "Change the date of birth"),
    field(patient::edit_field::PHONE, "Patient.Edit", "Edit phone", "Change the main phone number"),
    field(patient::edit_field::EMAIL, "Patient.Edit", "Edit email", "Change the email address"),
    field(patient::edit_field::ADDRESS, "Patient.Edit", "Edit address", "Change the full address"),
    field(patient::edit_field::ALLERGIES, "Patient.Edit", "Edit allergies", "Change allergies (medical data)"),
    field(
        patient::edit_field::CHRONIC_DISEASES,
        "Patient.Edit",
        "Edit chronic diseases",
        "Change chronic diseases (medical data)",
    ),
    field(patient::edit_field::INSURANCE_TYPE, "Patient.Edit", "Edit insurance", "Change insurance data"),
    // Consultation
    def(consultation::VIEW, "Consultation", "View consultations", "View consultations"),
    def(consultation::VIEW_OWN, "Consultation", "Own consultations", "Only the user's own consultations"),
    def(
        consultation::VIEW_DEPARTMENT,
        "Consultation",
        "Department consultations",
        "Consultations of the user's department",
    ),
    def(consultation::CREATE, "Consultation", "Create consultation", "Start a consultation"),
    def(consultation::EDIT, "Consultation", "Edit consultation", "Edit any consultation"),
    def(consultation::EDIT_OWN, "Consultation", "Edit own", "Edit only the user's own consultations"),
    def(consultation::DELETE, "Consultation", "Delete consultation", "Delete consultations"),
    def(consultation::FINALIZE, "Consultation", "Finalize", "Finalize a consultation"),
    def(consultation::PRESCRIBE, "Consultation", "Prescribe", "Prescribe medication"),
    field(consultation::edit_field::DIAGNOSIS, "Consultation.Edit", "Edit diagnosis", "Change the diagnosis"),
    field(consultation::edit_field::SYMPTOMS, "Consultation.Edit", "Edit symptoms", "Change the symptoms"),
    field(consultation::edit_field::TREATMENT, "Consultation.Edit", "Edit treatment", "Change the treatment"),
    field(
        consultation::edit_field::PRESCRIPTION,
        "Consultation.Edit",
        "Edit prescription",
        "Change the prescription",
    ),
    field(
        consultation::edit_field::RECOMMENDATIONS,
        "Consultation.Edit",
        "Edit recommendations",
        "Change the recommendations",
    ),
    // Appointment
    def(appointment::VIEW, "Appointment", "View appointments", "View the appointment calendar"),
    def(appointment::CREATE, "Appointment", "Create appointment", "Book a new appointment"),
    def(appointment::EDIT, "Appointment", "Edit appointment", "Change an existing appointment"),
    def(appointment::DELETE, "Appointment", "Delete appointment", "Delete an appointment"),
    def(appointment::CANCEL, "Appointment", "Cancel appointment", "Cancel an appointment"),
    def(appointment::CONFIRM, "Appointment", "Confirm appointment", "Confirm an appointment"),
    // Staff
    def(staff::VIEW, "Staff", "View staff", "View the staff list"),
    def(staff::CREATE, "Staff", "Create staff", "Add a staff member"),
    def(staff::EDIT, "Staff", "Edit staff", "Change staff data"),
    def(staff::DELETE, "Staff", "Delete staff", "Remove a staff member"),
    def(staff::MANAGE_ROLES, "Staff", "Manage roles", "Assign roles to staff"),
    // Admin
    def(admin::ACCESS_DASHBOARD, "Admin", "Dashboard access", "Access the admin dashboard"),
    def(admin::VIEW_AUDIT_LOG, "Admin", "Audit log", "View the audit log"),
    def(admin::MANAGE_SETTINGS, "Admin", "System settings", "Change system settings"),
    def(admin::MANAGE_USERS, "Admin", "Manage users", "Administer user accounts"),
    def(admin::VIEW_REPORTS, "Admin", "Reports", "View reports"),
    def(admin::EXPORT_DATA, "Admin", "Export data", "Export system data"),
    def(admin::roles::VIEW, "Admin.Roles", "View roles", "View the role list"),
    def(admin::roles::CREATE, "Admin.Roles", "Create role", "Create a new role"),
    def(admin::roles::EDIT, "Admin.Roles", "Edit role", "Change an existing role"),
    def(admin::roles::DELETE, "Admin.Roles", "Delete role", "Delete a role"),
    def(
        admin::roles::ASSIGN_PERMISSIONS,
        "Admin.Roles",
        "Assign permissions",
        "Assign permissions to a role",
    ),
    // Special
    def(special::EMERGENCY_ACCESS, "Special", "Emergency access", "Break-glass access for emergencies"),
    def(special::FULL_ACCESS, "Special", "Full access", "Access to every feature"),
];

/// Every permission in the catalog, flat, in display order.
pub fn all_permissions() -> &'static [PermissionDefinition] {
    DEFINITIONS
}

/// Catalog entries grouped by category.
pub fn permissions_grouped() -> BTreeMap<&'static str, Vec<&'static PermissionDefinition>> {
    let mut grouped: BTreeMap<&'static str, Vec<&'static PermissionDefinition>> = BTreeMap::new();
    for definition in DEFINITIONS {
        grouped.entry(definition.category).or_default().push(definition);
    }
    grouped
}

/// Look up the catalog entry for `code`.
pub fn find_permission(code: &str) -> Option<&'static PermissionDefinition> {
    DEFINITIONS.iter().find(|d| d.code == code)
}

pub fn is_known_permission(code: &str) -> bool {
    find_permission(code).is_some()
}
