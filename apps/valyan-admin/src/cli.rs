use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "valyan-admin")]
#[command(about = "Valyan clinic role and permission administration")]
pub struct Cli {
    /// Database URL (sqlite://path/to/db.db?mode=rwc, or "memory" for a seeded throwaway store)
    #[arg(long, global = true, env = "DATABASE_URL")]
    pub database_url: Option<String>,

    /// Path to the config file (defaults to ~/.valyan/config.json)
    #[arg(long, global = true, env = "VALYAN_CONFIG")]
    pub config: Option<PathBuf>,

    /// Principal UUID recorded as the actor of administrative changes
    #[arg(long, global = true, env = "VALYAN_OPERATOR")]
    pub operator: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Role commands
    Role {
        #[command(subcommand)]
        role_cmd: RoleCommand,
    },
    /// Permission catalog commands
    Permission {
        #[command(subcommand)]
        permission_cmd: PermissionCommand,
    },
    /// Named authorization policies
    Policy {
        #[command(subcommand)]
        policy_cmd: PolicyCommand,
    },
    /// Resource ownership records
    Owner {
        #[command(subcommand)]
        owner_cmd: OwnerCommand,
    },
    /// Check whether a role holds a permission code
    Check {
        /// Role name (case-sensitive)
        role: String,
        /// Permission code, e.g. Patient.View
        code: String,
    },
    /// Evaluate a named policy for a principal
    Authorize(AuthorizeArgs),
    /// Audit log commands
    Audit {
        #[command(subcommand)]
        audit_cmd: AuditCommand,
    },
    /// Config file commands
    Config {
        #[command(subcommand)]
        config_cmd: ConfigCommand,
    },
}

#[derive(Subcommand)]
pub enum RoleCommand {
    /// List roles with their permission counts
    List,
    /// Show a role and its permissions
    Show {
        /// Role name
        name: String,
    },
    /// Create a role
    Create {
        /// Role name
        name: String,
        /// Role description
        #[arg(long)]
        description: Option<String>,
    },
    /// Rename a role
    Rename {
        /// Current name
        name: String,
        /// New name
        new_name: String,
    },
    /// Delete a role and its permission assignments
    Delete {
        /// Role name
        name: String,
    },
    /// Reactivate a role
    Activate {
        /// Role name
        name: String,
    },
    /// Deactivate a role (it then resolves to no permissions)
    Deactivate {
        /// Role name
        name: String,
    },
    /// Grant one permission to a role
    Grant {
        /// Role name
        name: String,
        /// Permission code
        code: String,
    },
    /// Revoke one permission from a role
    Revoke {
        /// Role name
        name: String,
        /// Permission code
        code: String,
    },
    /// Replace the whole permission set of a role
    Set {
        /// Role name
        name: String,
        /// Permission codes (none clears the set)
        codes: Vec<String>,
    },
    /// Create the default clinic roles that don't exist yet
    Seed,
}

#[derive(Subcommand)]
pub enum PermissionCommand {
    /// List the permission catalog grouped by category
    List {
        /// Only this category
        #[arg(long)]
        category: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum PolicyCommand {
    /// List the registered policy names and their requirements
    List,
}

#[derive(Subcommand)]
pub enum OwnerCommand {
    /// Record (or replace) the owner of a resource instance
    Assign {
        /// Resource type, e.g. Consultation
        resource_type: String,
        /// Resource id
        resource_id: String,
        /// Owning principal UUID
        principal_id: String,
    },
}

#[derive(clap::Args)]
pub struct AuthorizeArgs {
    /// Policy name, e.g. CanEditOwnConsultations
    pub policy: String,

    /// Principal UUID (random if omitted)
    #[arg(long)]
    pub principal_id: Option<String>,

    /// Principal display name
    #[arg(long, default_value = "cli")]
    pub name: String,

    /// Role claim of the principal
    #[arg(long)]
    pub role: Option<String>,

    /// Mark the principal as medical staff
    #[arg(long)]
    pub medical_staff: bool,

    /// Personal medical license id (UUID) claim
    #[arg(long)]
    pub license_id: Option<String>,

    /// Resource type of the target resource
    #[arg(long, requires = "resource_id")]
    pub resource_type: Option<String>,

    /// Resource id of the target resource
    #[arg(long, requires = "resource_type")]
    pub resource_id: Option<String>,

    /// Route the request came through
    #[arg(long)]
    pub route: Option<String>,

    /// Client IP address
    #[arg(long)]
    pub client_ip: Option<String>,

    /// Reason recorded for emergency access
    #[arg(long)]
    pub reason: Option<String>,
}

#[derive(Subcommand)]
pub enum AuditCommand {
    /// List audit log entries, newest first
    List {
        /// Filter by action (e.g. emergency_access, role.create)
        #[arg(long)]
        action: Option<String>,
        /// Filter by result (e.g. success, not_found)
        #[arg(long)]
        result: Option<String>,
        /// Filter by principal UUID
        #[arg(long)]
        principal_id: Option<String>,
        /// Maximum number of entries
        #[arg(long)]
        limit: Option<u32>,
        /// Entries to skip
        #[arg(long)]
        offset: Option<u32>,
    },
    /// Show one audit log entry
    Get {
        /// Audit log entry id
        id: String,
    },
    /// Count audit log entries
    Count {
        /// Filter by action
        #[arg(long)]
        action: Option<String>,
        /// Filter by result
        #[arg(long)]
        result: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Write a config file with the given settings
    Init {
        /// Database URL to store
        #[arg(long)]
        database_url: Option<String>,
        /// Log filter to store
        #[arg(long)]
        log_filter: Option<String>,
        /// Accept permission codes outside the catalog
        #[arg(long)]
        allow_custom_permission_codes: bool,
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Print the effective config
    Show,
}
