//! Authorization core for the Valyan clinic.
//!
//! Building blocks, leaves first:
//! - [`PermissionRequirement`]: declarative rules attached to protected operations.
//! - [`PermissionService`]: role → permission resolution with a cache and
//!   explicit invalidation.
//! - [`Evaluator`] / [`Authorizer`]: turn a requirement (or a named policy)
//!   plus the request context into `Allow` or `Deny`, including the audited
//!   break-glass path.
//! - [`RoleAdministration`]: role and permission mutations that keep the
//!   cache coherent.
//! - [`FieldPermissions`]: per-field view/edit decisions.

pub mod admin;
pub mod catalog;
mod error;
pub mod evaluator;
pub mod field;
pub mod policy;
pub mod principal;
pub mod requirement;
pub mod resolver;

#[cfg(test)]
mod test_support;

pub use admin::{RoleAdministration, SeedReport};
pub use error::AuthzError;
pub use evaluator::{Decision, DenyReason, Evaluation, Evaluator};
pub use field::{FieldPermissions, FieldState};
pub use policy::{Authorizer, PolicyRegistry};
pub use principal::{AuthorizationContext, Principal, ResourceRef};
pub use requirement::PermissionRequirement;
pub use resolver::{PermissionResolver, PermissionService, PermissionSet};
