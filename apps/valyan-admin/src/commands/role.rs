//! Role commands: list, show, create, rename, delete, activate/deactivate, grant, revoke, set, seed

use valyan_authz::catalog::find_permission;
use valyan_storage::CreateRoleParams;

use crate::app::App;

pub async fn cmd_role_list(app: &App) -> Result<(), Box<dyn std::error::Error>> {
    let roles = app.admin.list_roles().await?;

    if roles.is_empty() {
        println!("No roles found. Run 'valyan-admin role seed' to create the default roles.");
        return Ok(());
    }

    println!("Roles:");
    for summary in roles {
        let status = if summary.role.is_active { "" } else { " [inactive]" };
        println!(
            "  {} ({} permissions){}",
            summary.role.name, summary.permission_count, status
        );
        if let Some(description) = &summary.role.description {
            println!("    {}", description);
        }
    }

    Ok(())
}

pub async fn cmd_role_show(app: &App, name: &str) -> Result<(), Box<dyn std::error::Error>> {
    let (role, permissions) = app.admin.get_role(name).await?;

    println!("Name:        {}", role.name);
    println!("ID:          {}", role.id);
    if let Some(description) = &role.description {
        println!("Description: {}", description);
    }
    println!("Active:      {}", role.is_active);
    println!("Created:     {}", role.created_at);
    println!("Updated:     {}", role.updated_at);

    if permissions.is_empty() {
        println!("Permissions: none");
    } else {
        println!("Permissions ({}):", permissions.len());
        for p in permissions {
            match find_permission(&p.permission_code) {
                Some(def) => println!("  {:<40} {}", p.permission_code, def.display_name),
                None => println!("  {:<40} (custom)", p.permission_code),
            }
        }
    }

    Ok(())
}

pub async fn cmd_role_create(
    app: &App,
    name: &str,
    description: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut params = CreateRoleParams::new(name);
    if let Some(description) = description {
        params = params.description(description);
    }
    let role = app.admin.create_role(&app.operator, params).await?;
    println!("✓ Role '{}' created (ID: {})", role.name, role.id);
    Ok(())
}

pub async fn cmd_role_rename(
    app: &App,
    name: &str,
    new_name: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    app.admin.rename_role(&app.operator, name, new_name).await?;
    println!("✓ Role '{}' renamed to '{}'", name, new_name);
    Ok(())
}

pub async fn cmd_role_delete(app: &App, name: &str) -> Result<(), Box<dyn std::error::Error>> {
    app.admin.delete_role(&app.operator, name).await?;
    println!("✓ Role '{}' deleted", name);
    Ok(())
}

pub async fn cmd_role_set_active(
    app: &App,
    name: &str,
    active: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    app.admin.set_role_active(&app.operator, name, active).await?;
    let state = if active { "activated" } else { "deactivated" };
    println!("✓ Role '{}' {}", name, state);
    Ok(())
}

pub async fn cmd_role_grant(
    app: &App,
    name: &str,
    code: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    if app.admin.grant_permission(&app.operator, name, code).await? {
        println!("✓ Granted {} to '{}'", code, name);
    } else {
        println!("Role '{}' already has {}", name, code);
    }
    Ok(())
}

pub async fn cmd_role_revoke(
    app: &App,
    name: &str,
    code: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    if app.admin.revoke_permission(&app.operator, name, code).await? {
        println!("✓ Revoked {} from '{}'", code, name);
    } else {
        println!("Role '{}' does not have {}", name, code);
    }
    Ok(())
}

pub async fn cmd_role_set(
    app: &App,
    name: &str,
    codes: &[String],
) -> Result<(), Box<dyn std::error::Error>> {
    app.admin.set_permissions(&app.operator, name, codes).await?;
    println!("✓ Role '{}' now has {} permission(s)", name, codes.len());
    Ok(())
}

pub async fn cmd_role_seed(app: &App) -> Result<(), Box<dyn std::error::Error>> {
    let report = app.admin.seed_default_roles(&app.operator).await?;

    for name in &report.created {
        println!("✓ Created role '{}'", name);
    }
    for name in &report.skipped {
        println!("  Skipped existing role '{}'", name);
    }
    if report.created.is_empty() {
        println!("All default roles already exist.");
    }

    Ok(())
}
