pub mod audit;
pub mod check;
pub mod config;
pub mod owner;
pub mod permission;
pub mod policy;
pub mod role;

pub use audit::{cmd_audit_count, cmd_audit_get, cmd_audit_list};
pub use check::{cmd_authorize, cmd_check};
pub use config::{cmd_config_init, cmd_config_show};
pub use owner::cmd_owner_assign;
pub use permission::cmd_permission_list;
pub use policy::cmd_policy_list;
pub use role::{
    cmd_role_create, cmd_role_delete, cmd_role_grant, cmd_role_list, cmd_role_rename,
    cmd_role_revoke, cmd_role_seed, cmd_role_set, cmd_role_set_active, cmd_role_show,
};
