//! SQLite backend for roles, role permissions, resource ownership and the audit log.
//!
//! Timestamps are stored as milliseconds since the Unix epoch.

use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Sqlite, SqlitePool, sqlite::SqlitePoolOptions};
use uuid::Uuid;
use valyan_audit::{AuditEvent, AuditLog, AuditLogError, AuditLogFilter, AuditLogId};
use valyan_storage::{
    AssignOwnerParams, CreateRoleParams, OwnershipLookup, PermissionStore, PrincipalId, Role,
    RoleId, RolePermission, RoleStore, RoleSummary, StoreError,
};

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

pub struct SqliteStore {
    pool: SqlitePool,
}

type RoleRow = (String, String, Option<String>, bool, i64, i64);

type AuditRow = (
    String,
    i64,
    String,
    String,
    String,
    String,
    Option<String>,
    String,
    Option<String>,
    Option<String>,
    Option<String>,
);

const AUDIT_COLUMNS: &str = "id,timestamp,principal_id,action,resource_type,resource_id,route,result,reason,details,client_ip";

fn backend(e: impl std::fmt::Display) -> StoreError {
    StoreError::Backend(e.to_string())
}

fn unique_or_backend(e: sqlx::Error) -> StoreError {
    let s = e.to_string();
    if s.contains("UNIQUE") {
        StoreError::AlreadyExists
    } else {
        StoreError::Backend(s)
    }
}

fn from_millis(ms: i64) -> Result<DateTime<Utc>, StoreError> {
    DateTime::from_timestamp_millis(ms)
        .ok_or_else(|| StoreError::Backend(format!("invalid timestamp: {}", ms)))
}

/// Current time at the precision the database keeps.
fn now() -> DateTime<Utc> {
    let ms = Utc::now().timestamp_millis();
    DateTime::from_timestamp_millis(ms).unwrap_or_else(Utc::now)
}

fn parse_uuid(s: &str) -> Result<Uuid, StoreError> {
    Uuid::try_parse(s).map_err(backend)
}

fn role_from_row(row: RoleRow) -> Result<Role, StoreError> {
    let (id, name, description, is_active, created_at, updated_at) = row;
    Ok(Role {
        id: RoleId(parse_uuid(&id)?),
        name,
        description,
        is_active,
        created_at: from_millis(created_at)?,
        updated_at: from_millis(updated_at)?,
    })
}

fn audit_from_row(row: AuditRow) -> Result<AuditEvent, AuditLogError> {
    let (id, ts, principal_id, action, resource_type, resource_id, route, result, reason, details, client_ip) =
        row;
    let db = |e: String| AuditLogError::Database(e);
    Ok(AuditEvent {
        id: AuditLogId(Uuid::try_parse(&id).map_err(|e| db(e.to_string()))?),
        timestamp: DateTime::from_timestamp_millis(ts)
            .ok_or_else(|| db(format!("invalid timestamp: {}", ts)))?,
        principal_id: Uuid::try_parse(&principal_id).map_err(|e| db(e.to_string()))?,
        action: action.parse().map_err(db)?,
        resource_type,
        resource_id,
        route,
        result: result.parse().map_err(db)?,
        reason,
        details: details
            .map(|d| serde_json::from_str(&d))
            .transpose()
            .map_err(|e| db(e.to_string()))?,
        client_ip,
    })
}

fn push_audit_filter(qb: &mut QueryBuilder<'_, Sqlite>, filter: &AuditLogFilter) {
    qb.push(" WHERE 1=1");
    if let Some(principal_id) = &filter.principal_id {
        qb.push(" AND principal_id = ").push_bind(principal_id.0.to_string());
    }
    if let Some(action) = &filter.action {
        qb.push(" AND action = ").push_bind(action.to_string());
    }
    if let Some(result) = &filter.result {
        qb.push(" AND result = ").push_bind(result.to_string());
    }
    if let Some(from) = filter.from {
        qb.push(" AND timestamp >= ").push_bind(from.timestamp_millis());
    }
    if let Some(to) = filter.to {
        qb.push(" AND timestamp < ").push_bind(to.timestamp_millis());
    }
}

impl SqliteStore {
    /// `~/.valyan/valyan.db` (creates dir with 0700 perms on unix)
    pub async fn open_default() -> Result<Self, StoreError> {
        let dir = dirs::home_dir()
            .ok_or_else(|| StoreError::Backend("no home dir".into()))?
            .join(".valyan");
        std::fs::create_dir_all(&dir).map_err(backend)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&dir, std::fs::Permissions::from_mode(0o700))
                .map_err(backend)?;
        }
        let path = dir.join("valyan.db");
        let url = format!("sqlite://{}?mode=rwc", path.to_string_lossy());
        Self::open(&url).await
    }

    pub async fn open_in_memory() -> Result<Self, StoreError> {
        Self::open("sqlite::memory:").await
    }

    pub async fn open(url: &str) -> Result<Self, StoreError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect(url)
            .await
            .map_err(backend)?;

        MIGRATOR.run(&pool).await.map_err(backend)?;

        Ok(Self { pool })
    }

    async fn role_id(&self, name: &str) -> Result<String, StoreError> {
        sqlx::query_as::<_, (String,)>("SELECT id FROM roles WHERE name=?")
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(backend)?
            .map(|(id,)| id)
            .ok_or(StoreError::NotFound)
    }

    async fn touch(&self, role_id: &str) -> Result<(), StoreError> {
        sqlx::query("UPDATE roles SET updated_at=? WHERE id=?")
            .bind(now().timestamp_millis())
            .bind(role_id)
            .execute(&self.pool)
            .await
            .map_err(backend)?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl PermissionStore for SqliteStore {
    async fn get_permissions_for_role(&self, role_name: &str) -> Result<Vec<String>, StoreError> {
        let rows = sqlx::query_as::<_, (String,)>(
            "SELECT rp.permission_code FROM role_permissions rp
             JOIN roles r ON r.id = rp.role_id
             WHERE r.name=? AND r.is_active=1
             ORDER BY rp.permission_code",
        )
        .bind(role_name)
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;
        Ok(rows.into_iter().map(|(code,)| code).collect())
    }
}

#[async_trait::async_trait]
impl RoleStore for SqliteStore {
    // ───────────────────────────────────── Roles ──────────────────────────────────────────

    async fn create_role(&self, params: &CreateRoleParams) -> Result<Role, StoreError> {
        let id = RoleId::new();
        let now = now();
        sqlx::query(
            "INSERT INTO roles(id,name,description,is_active,created_at,updated_at)
             VALUES(?,?,?,1,?,?)",
        )
        .bind(id.0.to_string())
        .bind(&params.name)
        .bind(&params.description)
        .bind(now.timestamp_millis())
        .bind(now.timestamp_millis())
        .execute(&self.pool)
        .await
        .map_err(unique_or_backend)?;

        Ok(Role {
            id,
            name: params.name.clone(),
            description: params.description.clone(),
            is_active: true,
            created_at: now,
            updated_at: now,
        })
    }

    async fn get_role_by_name(&self, name: &str) -> Result<Role, StoreError> {
        let row = sqlx::query_as::<_, RoleRow>(
            "SELECT id,name,description,is_active,created_at,updated_at FROM roles WHERE name=?",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;
        match row {
            None => Err(StoreError::NotFound),
            Some(row) => role_from_row(row),
        }
    }

    async fn list_roles(&self) -> Result<Vec<RoleSummary>, StoreError> {
        let rows = sqlx::query_as::<_, (String, String, Option<String>, bool, i64, i64, i64)>(
            "SELECT r.id,r.name,r.description,r.is_active,r.created_at,r.updated_at,
                    (SELECT COUNT(*) FROM role_permissions rp WHERE rp.role_id = r.id)
             FROM roles r ORDER BY r.name",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;

        let mut out = Vec::with_capacity(rows.len());
        for (id, name, description, is_active, created_at, updated_at, count) in rows {
            out.push(RoleSummary {
                role: role_from_row((id, name, description, is_active, created_at, updated_at))?,
                permission_count: count as usize,
            });
        }
        Ok(out)
    }

    async fn rename_role(&self, name: &str, new_name: &str) -> Result<(), StoreError> {
        let res = sqlx::query("UPDATE roles SET name=?, updated_at=? WHERE name=?")
            .bind(new_name)
            .bind(now().timestamp_millis())
            .bind(name)
            .execute(&self.pool)
            .await
            .map_err(unique_or_backend)?;
        if res.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn set_role_active(&self, name: &str, active: bool) -> Result<(), StoreError> {
        let res = sqlx::query("UPDATE roles SET is_active=?, updated_at=? WHERE name=?")
            .bind(active)
            .bind(now().timestamp_millis())
            .bind(name)
            .execute(&self.pool)
            .await
            .map_err(backend)?;
        if res.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn delete_role(&self, name: &str) -> Result<(), StoreError> {
        let role_id = self.role_id(name).await?;
        let mut tx = self.pool.begin().await.map_err(backend)?;
        sqlx::query("DELETE FROM role_permissions WHERE role_id=?")
            .bind(&role_id)
            .execute(&mut *tx)
            .await
            .map_err(backend)?;
        let res = sqlx::query("DELETE FROM roles WHERE id=?")
            .bind(&role_id)
            .execute(&mut *tx)
            .await
            .map_err(backend)?;
        if res.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        tx.commit().await.map_err(backend)?;
        Ok(())
    }

    // ───────────────────────────────────── Permissions ────────────────────────────────────

    async fn list_role_permissions(&self, name: &str) -> Result<Vec<RolePermission>, StoreError> {
        let role_id = self.role_id(name).await?;
        let role_uuid = RoleId(parse_uuid(&role_id)?);
        let rows = sqlx::query_as::<_, (String, i64)>(
            "SELECT permission_code, granted_at FROM role_permissions
             WHERE role_id=? ORDER BY permission_code",
        )
        .bind(&role_id)
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;

        rows.into_iter()
            .map(|(permission_code, granted_at)| {
                Ok(RolePermission {
                    role_id: role_uuid,
                    permission_code,
                    granted_at: from_millis(granted_at)?,
                })
            })
            .collect()
    }

    async fn set_role_permissions(&self, name: &str, codes: &[String]) -> Result<(), StoreError> {
        let role_id = self.role_id(name).await?;
        let now = now().timestamp_millis();
        let mut tx = self.pool.begin().await.map_err(backend)?;

        // Drop what is no longer granted; keep grant times of codes that stay.
        let mut delete = QueryBuilder::<Sqlite>::new("DELETE FROM role_permissions WHERE role_id=");
        delete.push_bind(role_id.clone());
        if !codes.is_empty() {
            delete.push(" AND permission_code NOT IN (");
            let mut separated = delete.separated(",");
            for code in codes {
                separated.push_bind(code.clone());
            }
            separated.push_unseparated(")");
        }
        delete
            .build()
            .execute(&mut *tx)
            .await
            .map_err(backend)?;

        for code in codes {
            sqlx::query(
                "INSERT OR IGNORE INTO role_permissions(role_id,permission_code,granted_at)
                 VALUES(?,?,?)",
            )
            .bind(&role_id)
            .bind(code)
            .bind(now)
            .execute(&mut *tx)
            .await
            .map_err(backend)?;
        }

        sqlx::query("UPDATE roles SET updated_at=? WHERE id=?")
            .bind(now)
            .bind(&role_id)
            .execute(&mut *tx)
            .await
            .map_err(backend)?;

        tx.commit().await.map_err(backend)?;
        Ok(())
    }

    async fn add_role_permission(&self, name: &str, code: &str) -> Result<bool, StoreError> {
        let role_id = self.role_id(name).await?;
        let res = sqlx::query(
            "INSERT OR IGNORE INTO role_permissions(role_id,permission_code,granted_at)
             VALUES(?,?,?)",
        )
        .bind(&role_id)
        .bind(code)
        .bind(now().timestamp_millis())
        .execute(&self.pool)
        .await
        .map_err(backend)?;
        let added = res.rows_affected() > 0;
        if added {
            self.touch(&role_id).await?;
        }
        Ok(added)
    }

    async fn remove_role_permission(&self, name: &str, code: &str) -> Result<bool, StoreError> {
        let role_id = self.role_id(name).await?;
        let res = sqlx::query("DELETE FROM role_permissions WHERE role_id=? AND permission_code=?")
            .bind(&role_id)
            .bind(code)
            .execute(&self.pool)
            .await
            .map_err(backend)?;
        let removed = res.rows_affected() > 0;
        if removed {
            self.touch(&role_id).await?;
        }
        Ok(removed)
    }
}

#[async_trait::async_trait]
impl OwnershipLookup for SqliteStore {
    async fn is_owner(
        &self,
        principal_id: &PrincipalId,
        resource_type: &str,
        resource_id: &str,
    ) -> Result<bool, StoreError> {
        let row = sqlx::query_as::<_, (String,)>(
            "SELECT principal_id FROM resource_owners WHERE resource_type=? AND resource_id=?",
        )
        .bind(resource_type)
        .bind(resource_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;

        match row {
            None => Err(StoreError::NotFound),
            Some((owner,)) => Ok(parse_uuid(&owner)? == principal_id.0),
        }
    }

    async fn assign_owner(&self, params: &AssignOwnerParams) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO resource_owners(resource_type,resource_id,principal_id,assigned_at)
             VALUES(?,?,?,?)
             ON CONFLICT(resource_type,resource_id)
             DO UPDATE SET principal_id=excluded.principal_id, assigned_at=excluded.assigned_at",
        )
        .bind(&params.resource_type)
        .bind(&params.resource_id)
        .bind(params.principal_id.0.to_string())
        .bind(now().timestamp_millis())
        .execute(&self.pool)
        .await
        .map_err(backend)?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl AuditLog for SqliteStore {
    async fn record(&self, event: AuditEvent) -> Result<(), AuditLogError> {
        let details = event
            .details
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(|e| AuditLogError::Database(e.to_string()))?;

        sqlx::query(
            "INSERT INTO audit_log(id,timestamp,principal_id,action,resource_type,resource_id,
                                   route,result,reason,details,client_ip)
             VALUES(?,?,?,?,?,?,?,?,?,?,?)",
        )
        .bind(event.id.to_string())
        .bind(event.timestamp.timestamp_millis())
        .bind(event.principal_id.to_string())
        .bind(event.action.to_string())
        .bind(&event.resource_type)
        .bind(&event.resource_id)
        .bind(&event.route)
        .bind(event.result.to_string())
        .bind(&event.reason)
        .bind(details)
        .bind(&event.client_ip)
        .execute(&self.pool)
        .await
        .map_err(|e| AuditLogError::Database(e.to_string()))?;
        Ok(())
    }

    async fn query(&self, filter: AuditLogFilter) -> Result<Vec<AuditEvent>, AuditLogError> {
        filter.validate()?;
        let mut qb = QueryBuilder::<Sqlite>::new(format!("SELECT {} FROM audit_log", AUDIT_COLUMNS));
        push_audit_filter(&mut qb, &filter);
        // v7 ids sort in creation order, so they break timestamp ties.
        qb.push(" ORDER BY timestamp DESC, id DESC");
        qb.push(" LIMIT ").push_bind(filter.limit.map(i64::from).unwrap_or(-1));
        qb.push(" OFFSET ").push_bind(i64::from(filter.offset.unwrap_or(0)));

        let rows = qb
            .build_query_as::<AuditRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AuditLogError::Database(e.to_string()))?;
        rows.into_iter().map(audit_from_row).collect()
    }

    async fn get(&self, id: AuditLogId) -> Result<AuditEvent, AuditLogError> {
        let row = sqlx::query_as::<_, AuditRow>(&format!(
            "SELECT {} FROM audit_log WHERE id=?",
            AUDIT_COLUMNS
        ))
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AuditLogError::Database(e.to_string()))?;

        match row {
            None => Err(AuditLogError::NotFound(id)),
            Some(row) => audit_from_row(row),
        }
    }

    async fn count(&self, filter: AuditLogFilter) -> Result<u64, AuditLogError> {
        filter.validate()?;
        let mut qb = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM audit_log");
        push_audit_filter(&mut qb, &filter);
        let (count,) = qb
            .build_query_as::<(i64,)>()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AuditLogError::Database(e.to_string()))?;
        Ok(count as u64)
    }
}
