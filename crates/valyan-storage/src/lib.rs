//! Storage abstraction for the Valyan authorization core.
//!
//! Backend crates (e.g., valyan-store-sqlite, valyan-store-memory) implement these traits so
//! `valyan-authz` doesn't depend on any specific database engine or schema details.

use thiserror::Error;

mod store;
mod types;

pub use store::*;
pub use types::*;

/// Uniform error type for all storage backends.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("not found")]
    NotFound,
    #[error("already exists")]
    AlreadyExists,
    #[error("conflict")]
    Conflict,
    #[error("backend error: {0}")]
    Backend(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_display() {
        assert_eq!(StoreError::NotFound.to_string(), "not found");
        assert_eq!(StoreError::AlreadyExists.to_string(), "already exists");
        assert_eq!(StoreError::Conflict.to_string(), "conflict");
        assert_eq!(
            StoreError::Backend("connection refused".into()).to_string(),
            "backend error: connection refused"
        );
    }
}
