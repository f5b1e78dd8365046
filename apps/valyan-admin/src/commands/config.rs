//! Config file commands

use std::path::Path;

use valyan_config::AdminConfig;

pub fn cmd_config_init(
    path: &Path,
    database_url: Option<&str>,
    log_filter: Option<&str>,
    allow_custom_permission_codes: bool,
    force: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if path.exists() && !force {
        return Err(format!(
            "Config file {} already exists (use --force to overwrite)",
            path.display()
        )
        .into());
    }

    let config = AdminConfig {
        database_url: database_url.map(str::to_string),
        log_filter: log_filter.map(str::to_string),
        allow_custom_permission_codes,
        operator_id: None,
    };
    config.save_to(path)?;
    println!("✓ Config written to {}", path.display());
    Ok(())
}

pub fn cmd_config_show(
    path: &Path,
    config: &AdminConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    println!("Config file: {}", path.display());
    println!("{}", serde_json::to_string_pretty(config)?);
    Ok(())
}
