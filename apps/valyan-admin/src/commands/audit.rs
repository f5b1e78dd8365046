//! Audit log commands: list, get, count

use valyan_audit::{AuditAction, AuditLog, AuditLogFilter, AuditLogId, AuditResult};
use valyan_storage::PrincipalId;

use crate::app::App;

fn build_filter(
    action: Option<&str>,
    result: Option<&str>,
    principal_id: Option<&str>,
) -> Result<AuditLogFilter, Box<dyn std::error::Error>> {
    let mut filter = AuditLogFilter::default();
    if let Some(action) = action {
        filter = filter.action(action.parse::<AuditAction>()?);
    }
    if let Some(result) = result {
        filter = filter.result(result.parse::<AuditResult>()?);
    }
    if let Some(principal_id) = principal_id {
        let id: PrincipalId = principal_id
            .parse()
            .map_err(|e| format!("Invalid principal id '{}': {}", principal_id, e))?;
        filter = filter.principal_id(id);
    }
    Ok(filter)
}

pub async fn cmd_audit_list(
    app: &App,
    action: Option<&str>,
    result: Option<&str>,
    principal_id: Option<&str>,
    limit: Option<u32>,
    offset: Option<u32>,
) -> Result<(), Box<dyn std::error::Error>> {
    let filter = build_filter(action, result, principal_id)?;
    let total = app.backend.count(filter.clone()).await?;

    let mut page = filter;
    if let Some(limit) = limit {
        page = page.limit(limit);
    }
    if let Some(offset) = offset {
        page = page.offset(offset);
    }
    let entries = app.backend.query(page).await?;

    if entries.is_empty() {
        println!("No audit log entries found.");
        return Ok(());
    }

    println!("Audit logs ({} of {} total):\n", entries.len(), total);
    for entry in entries {
        println!("ID:        {}", entry.id);
        println!("Timestamp: {}", entry.timestamp);
        println!("Principal: {}", entry.principal_id);
        println!("Action:    {}", entry.action);
        println!("Resource:  {} ({})", entry.resource_type, entry.resource_id);
        println!("Result:    {}", entry.result);
        if let Some(reason) = entry.reason {
            println!("Reason:    {}", reason);
        }
        println!();
    }

    Ok(())
}

pub async fn cmd_audit_get(app: &App, id: &str) -> Result<(), Box<dyn std::error::Error>> {
    let id: AuditLogId = id
        .parse()
        .map_err(|e| format!("Invalid audit log id '{}': {}", id, e))?;
    let entry = app.backend.get(id).await?;

    println!("ID:           {}", entry.id);
    println!("Timestamp:    {}", entry.timestamp);
    println!("Principal ID: {}", entry.principal_id);
    println!("Action:       {}", entry.action);
    println!(
        "Resource:     {} ({})",
        entry.resource_type, entry.resource_id
    );
    if let Some(route) = entry.route {
        println!("Route:        {}", route);
    }
    println!("Result:       {}", entry.result);
    if let Some(reason) = entry.reason {
        println!("Reason:       {}", reason);
    }
    if let Some(details) = entry.details {
        println!("Details:      {}", details);
    }
    if let Some(client_ip) = entry.client_ip {
        println!("Client IP:    {}", client_ip);
    }

    Ok(())
}

pub async fn cmd_audit_count(
    app: &App,
    action: Option<&str>,
    result: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    let filter = build_filter(action, result, None)?;
    let total = app.backend.count(filter).await?;
    println!("Total audit log entries: {}", total);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::StoreBackend;
    use valyan_config::AdminConfig;

    #[test]
    fn filter_parsing() {
        let filter = build_filter(Some("role.create"), Some("success"), None).unwrap();
        assert_eq!(filter.action, Some(AuditAction::RoleCreate));
        assert_eq!(filter.result, Some(AuditResult::Success));

        assert!(build_filter(Some("role.explode"), None, None).is_err());
        assert!(build_filter(None, Some("maybe"), None).is_err());
        assert!(build_filter(None, None, Some("nope")).is_err());
    }

    #[tokio::test]
    async fn seeded_store_has_role_create_entries() {
        let app = App::new(StoreBackend::memory(), &AdminConfig::default(), None)
            .await
            .unwrap();
        let seeded = app
            .backend
            .query(AuditLogFilter::default().action(AuditAction::RoleCreate))
            .await
            .unwrap();
        assert_eq!(seeded.len(), 6);

        cmd_audit_list(&app, Some("role.create"), None, None, Some(2), Some(1))
            .await
            .unwrap();
        cmd_audit_count(&app, None, Some("success")).await.unwrap();
        cmd_audit_get(&app, &seeded[0].id.to_string()).await.unwrap();
        assert!(cmd_audit_get(&app, &AuditLogId::new().to_string())
            .await
            .is_err());
        assert!(cmd_audit_get(&app, "garbage").await.is_err());
    }
}
