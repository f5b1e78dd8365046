//! Resource ownership records

use valyan_storage::{AssignOwnerParams, OwnershipLookup, PrincipalId};

use crate::app::App;

pub async fn cmd_owner_assign(
    app: &App,
    resource_type: &str,
    resource_id: &str,
    principal_id: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    if resource_type.is_empty() || resource_id.is_empty() {
        return Err("resource type and id must not be empty".into());
    }
    let principal_id: PrincipalId = principal_id
        .parse()
        .map_err(|e| format!("Invalid principal id '{}': {}", principal_id, e))?;

    app.backend
        .assign_owner(&AssignOwnerParams {
            resource_type: resource_type.to_string(),
            resource_id: resource_id.to_string(),
            principal_id,
        })
        .await?;

    println!(
        "✓ {} {} is owned by {}",
        resource_type, resource_id, principal_id
    );
    Ok(())
}
