mod app;
mod backend;
mod cli;
mod commands;

use clap::Parser;
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;
use valyan_config::AdminConfig;

use app::App;
use backend::StoreBackend;
use cli::{
    AuditCommand, Cli, Command, ConfigCommand, OwnerCommand, PermissionCommand, PolicyCommand,
    RoleCommand,
};
use commands::*;

/// RUST_LOG wins over the config file, which wins over "info".
fn init_tracing(config: &AdminConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(config.log_filter.as_deref().unwrap_or("info"))
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn config_path(cli: &Cli) -> Result<PathBuf, Box<dyn std::error::Error>> {
    match &cli.config {
        Some(path) => Ok(path.clone()),
        None => Ok(AdminConfig::default_path()?),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config_path = config_path(&cli)?;
    let config = AdminConfig::load_or_default(&config_path)?;
    init_tracing(&config);
    debug!(path = %config_path.display(), "Config loaded");

    // Commands that don't touch the database.
    match &cli.command {
        Command::Config { config_cmd } => {
            match config_cmd {
                ConfigCommand::Init {
                    database_url,
                    log_filter,
                    allow_custom_permission_codes,
                    force,
                } => {
                    cmd_config_init(
                        &config_path,
                        database_url.as_deref(),
                        log_filter.as_deref(),
                        *allow_custom_permission_codes,
                        *force,
                    )?;
                }
                ConfigCommand::Show => cmd_config_show(&config_path, &config)?,
            }
            return Ok(());
        }
        Command::Permission { permission_cmd } => {
            match permission_cmd {
                PermissionCommand::List { category } => cmd_permission_list(category.as_deref())?,
            }
            return Ok(());
        }
        _ => {}
    }

    let operator = cli
        .operator
        .as_deref()
        .map(Uuid::parse_str)
        .transpose()
        .map_err(|e| format!("Invalid operator id: {}", e))?;
    let database_url = cli.database_url.as_deref().or(config.database_url.as_deref());
    let backend = StoreBackend::open(database_url).await?;
    let app = App::new(backend, &config, operator).await?;

    let allowed = match cli.command {
        Command::Role { role_cmd } => {
            match role_cmd {
                RoleCommand::List => cmd_role_list(&app).await?,
                RoleCommand::Show { name } => cmd_role_show(&app, &name).await?,
                RoleCommand::Create { name, description } => {
                    cmd_role_create(&app, &name, description.as_deref()).await?
                }
                RoleCommand::Rename { name, new_name } => {
                    cmd_role_rename(&app, &name, &new_name).await?
                }
                RoleCommand::Delete { name } => cmd_role_delete(&app, &name).await?,
                RoleCommand::Activate { name } => cmd_role_set_active(&app, &name, true).await?,
                RoleCommand::Deactivate { name } => {
                    cmd_role_set_active(&app, &name, false).await?
                }
                RoleCommand::Grant { name, code } => cmd_role_grant(&app, &name, &code).await?,
                RoleCommand::Revoke { name, code } => cmd_role_revoke(&app, &name, &code).await?,
                RoleCommand::Set { name, codes } => cmd_role_set(&app, &name, &codes).await?,
                RoleCommand::Seed => cmd_role_seed(&app).await?,
            }
            true
        }
        Command::Policy { policy_cmd } => {
            match policy_cmd {
                PolicyCommand::List => cmd_policy_list(&app)?,
            }
            true
        }
        Command::Owner { owner_cmd } => {
            match owner_cmd {
                OwnerCommand::Assign {
                    resource_type,
                    resource_id,
                    principal_id,
                } => cmd_owner_assign(&app, &resource_type, &resource_id, &principal_id).await?,
            }
            true
        }
        Command::Check { role, code } => cmd_check(&app, &role, &code).await?,
        Command::Authorize(args) => cmd_authorize(&app, &args).await?,
        Command::Audit { audit_cmd } => {
            match audit_cmd {
                AuditCommand::List {
                    action,
                    result,
                    principal_id,
                    limit,
                    offset,
                } => {
                    cmd_audit_list(
                        &app,
                        action.as_deref(),
                        result.as_deref(),
                        principal_id.as_deref(),
                        limit,
                        offset,
                    )
                    .await?
                }
                AuditCommand::Get { id } => cmd_audit_get(&app, &id).await?,
                AuditCommand::Count { action, result } => {
                    cmd_audit_count(&app, action.as_deref(), result.as_deref()).await?
                }
            }
            true
        }
        Command::Config { .. } | Command::Permission { .. } => true,
    };

    if !allowed {
        std::process::exit(2);
    }
    Ok(())
}
