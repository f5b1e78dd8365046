//! The clinic's permission catalog and default role seeds.

mod permissions;
mod roles;

pub use permissions::*;
pub use roles::{default_roles, RoleSeed};
