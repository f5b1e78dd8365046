//! Type definitions for Valyan storage.

mod ids;
mod ownership;
mod permissions;
mod roles;

// Re-export all types from submodules
pub use ids::*;
pub use ownership::*;
pub use permissions::*;
pub use roles::*;
