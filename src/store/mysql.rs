use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use futures_util::StreamExt;
use sqlx::{FromRow, MySql, MySqlPool, QueryBuilder};
use uuid::Uuid;

use crate::error::StoreError;
use crate::model::audit_log::{AuditFilter, AuditLogEntry};
use crate::model::department::Department;
use crate::model::leave_request::{LeaveRequest, LeaveStats, LeaveStatus, LeaveType};
use crate::model::role::Role;
use crate::model::user::{User, UserChanges};
use crate::models::RefreshToken;
use crate::store::{
    AuditStore, DepartmentStore, LeaveQuery, LeaveStore, StoreResult, TokenStore, UserStore,
};

/// MySQL backend. Identifiers are stored as `CHAR(36)`; enums as their wire names.
pub struct MySqlStore {
    pool: MySqlPool,
}

impl MySqlStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

fn parse_id(raw: &str) -> StoreResult<Uuid> {
    Uuid::parse_str(raw).map_err(|e| StoreError::Corrupt(format!("bad id {}: {}", raw, e)))
}

fn parse_opt_id(raw: Option<String>) -> StoreResult<Option<Uuid>> {
    raw.as_deref().map(parse_id).transpose()
}

fn parse_enum<T: FromStr>(raw: &str, what: &str) -> StoreResult<T> {
    T::from_str(raw).map_err(|_| StoreError::Corrupt(format!("bad {} {}", what, raw)))
}

fn id_list(ids: &[Uuid]) -> Vec<String> {
    ids.iter().map(|id| id.to_string()).collect()
}

// ---------- rows ----------

#[derive(FromRow)]
struct UserRow {
    id: String,
    name: String,
    email: String,
    password_hash: String,
    role: String,
    department_id: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = StoreError;

    fn try_from(row: UserRow) -> StoreResult<Self> {
        Ok(User {
            id: parse_id(&row.id)?,
            name: row.name,
            email: row.email,
            password_hash: row.password_hash,
            role: parse_enum::<Role>(&row.role, "role")?,
            department_id: parse_opt_id(row.department_id)?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(FromRow)]
struct DepartmentRow {
    id: String,
    name: String,
    description: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<DepartmentRow> for Department {
    type Error = StoreError;

    fn try_from(row: DepartmentRow) -> StoreResult<Self> {
        Ok(Department {
            id: parse_id(&row.id)?,
            name: row.name,
            description: row.description,
            created_at: row.created_at,
        })
    }
}

#[derive(FromRow)]
struct LeaveRow {
    id: String,
    owner_id: String,
    leave_type: String,
    start_date: NaiveDate,
    end_date: NaiveDate,
    reason: String,
    status: String,
    approver_id: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<LeaveRow> for LeaveRequest {
    type Error = StoreError;

    fn try_from(row: LeaveRow) -> StoreResult<Self> {
        Ok(LeaveRequest {
            id: parse_id(&row.id)?,
            owner_id: parse_id(&row.owner_id)?,
            leave_type: parse_enum::<LeaveType>(&row.leave_type, "leave type")?,
            start_date: row.start_date,
            end_date: row.end_date,
            reason: row.reason,
            status: parse_enum::<LeaveStatus>(&row.status, "leave status")?,
            approver_id: parse_opt_id(row.approver_id)?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(FromRow)]
struct AuditRow {
    id: String,
    action: String,
    performed_by: String,
    metadata: Option<String>,
    timestamp: DateTime<Utc>,
}

impl TryFrom<AuditRow> for AuditLogEntry {
    type Error = StoreError;

    fn try_from(row: AuditRow) -> StoreResult<Self> {
        let metadata = row
            .metadata
            .map(|raw| serde_json::from_str(&raw))
            .transpose()
            .map_err(|e| StoreError::Corrupt(format!("bad audit metadata: {}", e)))?;
        Ok(AuditLogEntry {
            id: parse_id(&row.id)?,
            action: row.action,
            performed_by: parse_id(&row.performed_by)?,
            metadata,
            timestamp: row.timestamp,
        })
    }
}

#[derive(FromRow)]
struct TokenRow {
    jti: String,
    user_id: String,
    expires_at: DateTime<Utc>,
    revoked: bool,
}

fn convert_all<R, T>(rows: Vec<R>) -> StoreResult<Vec<T>>
where
    T: TryFrom<R, Error = StoreError>,
{
    rows.into_iter().map(T::try_from).collect()
}

const USER_COLUMNS: &str =
    "id, name, email, password_hash, role, department_id, created_at, updated_at";
const LEAVE_COLUMNS: &str = "id, owner_id, leave_type, start_date, end_date, reason, status, \
     approver_id, created_at, updated_at";

// ---------- users ----------

#[async_trait]
impl UserStore for MySqlStore {
    async fn insert(&self, user: &User) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO users
                (id, name, email, password_hash, role, department_id, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(user.id.to_string())
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .bind(user.department_id.map(|id| id.to_string()))
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS);
        sqlx::query_as::<_, UserRow>(&sql)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?
            .map(User::try_from)
            .transpose()
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE email = ?", USER_COLUMNS);
        sqlx::query_as::<_, UserRow>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?
            .map(User::try_from)
            .transpose()
    }

    async fn find_many(&self, ids: &[Uuid]) -> StoreResult<Vec<User>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut qb = QueryBuilder::<MySql>::new(format!("SELECT {} FROM users WHERE id IN (", USER_COLUMNS));
        let mut list = qb.separated(", ");
        for id in id_list(ids) {
            list.push_bind(id);
        }
        qb.push(")");
        let rows = qb.build_query_as::<UserRow>().fetch_all(&self.pool).await?;
        convert_all(rows)
    }

    async fn list(&self) -> StoreResult<Vec<User>> {
        let sql = format!("SELECT {} FROM users ORDER BY created_at DESC", USER_COLUMNS);
        let rows = sqlx::query_as::<_, UserRow>(&sql).fetch_all(&self.pool).await?;
        convert_all(rows)
    }

    async fn list_by_department(&self, department_id: Uuid) -> StoreResult<Vec<User>> {
        let sql = format!(
            "SELECT {} FROM users WHERE department_id = ? ORDER BY name",
            USER_COLUMNS
        );
        let rows = sqlx::query_as::<_, UserRow>(&sql)
            .bind(department_id.to_string())
            .fetch_all(&self.pool)
            .await?;
        convert_all(rows)
    }

    async fn count_by_department(&self) -> StoreResult<Vec<(Uuid, u64)>> {
        let rows = sqlx::query_as::<_, (String, i64)>(
            r#"
            SELECT department_id, COUNT(*)
            FROM users
            WHERE department_id IS NOT NULL
            GROUP BY department_id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|(id, count)| Ok((parse_id(&id)?, count as u64)))
            .collect()
    }

    async fn count(&self) -> StoreResult<u64> {
        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(total as u64)
    }

    async fn all_emails(&self) -> StoreResult<Vec<String>> {
        let mut stream = sqlx::query_scalar::<_, String>("SELECT email FROM users").fetch(&self.pool);

        let mut emails = Vec::new();
        while let Some(row) = stream.next().await {
            emails.push(row?);
        }
        Ok(emails)
    }

    async fn update(&self, id: Uuid, changes: &UserChanges) -> StoreResult<bool> {
        let mut qb = QueryBuilder::<MySql>::new("UPDATE users SET ");
        let mut set = qb.separated(", ");

        if let Some(name) = &changes.name {
            set.push("name = ").push_bind_unseparated(name.clone());
        }
        if let Some(email) = &changes.email {
            set.push("email = ").push_bind_unseparated(email.clone());
        }
        if let Some(hash) = &changes.password_hash {
            set.push("password_hash = ").push_bind_unseparated(hash.clone());
        }
        if let Some(role) = changes.role {
            set.push("role = ").push_bind_unseparated(role.as_str().to_string());
        }
        if let Some(department_id) = changes.department_id {
            set.push("department_id = ")
                .push_bind_unseparated(department_id.map(|d| d.to_string()));
        }
        set.push("updated_at = ").push_bind_unseparated(Utc::now());

        qb.push(" WHERE id = ").push_bind(id.to_string());

        let result = qb.build().execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn clear_department(&self, department_id: Uuid) -> StoreResult<u64> {
        let result = sqlx::query(
            "UPDATE users SET department_id = NULL, updated_at = ? WHERE department_id = ?",
        )
        .bind(Utc::now())
        .bind(department_id.to_string())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}

// ---------- departments ----------

#[async_trait]
impl DepartmentStore for MySqlStore {
    async fn insert(&self, department: &Department) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO departments (id, name, description, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(department.id.to_string())
        .bind(&department.name)
        .bind(&department.description)
        .bind(department.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Department>> {
        sqlx::query_as::<_, DepartmentRow>(
            "SELECT id, name, description, created_at FROM departments WHERE id = ?",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?
        .map(Department::try_from)
        .transpose()
    }

    async fn find_many(&self, ids: &[Uuid]) -> StoreResult<Vec<Department>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut qb = QueryBuilder::<MySql>::new(
            "SELECT id, name, description, created_at FROM departments WHERE id IN (",
        );
        let mut list = qb.separated(", ");
        for id in id_list(ids) {
            list.push_bind(id);
        }
        qb.push(")");
        let rows = qb
            .build_query_as::<DepartmentRow>()
            .fetch_all(&self.pool)
            .await?;
        convert_all(rows)
    }

    async fn list(&self) -> StoreResult<Vec<Department>> {
        let rows = sqlx::query_as::<_, DepartmentRow>(
            "SELECT id, name, description, created_at FROM departments ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        convert_all(rows)
    }

    async fn count(&self) -> StoreResult<u64> {
        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM departments")
            .fetch_one(&self.pool)
            .await?;
        Ok(total as u64)
    }

    async fn update(
        &self,
        id: Uuid,
        name: Option<&str>,
        description: Option<&str>,
    ) -> StoreResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE departments
            SET name = COALESCE(?, name),
                description = COALESCE(?, description)
            WHERE id = ?
            "#,
        )
        .bind(name)
        .bind(description)
        .bind(id.to_string())
        .execute(&self.pool)
        .await?;
        // MySQL reports 0 affected rows when values are unchanged, so check existence instead.
        if result.rows_affected() > 0 {
            return Ok(true);
        }
        Ok(DepartmentStore::find_by_id(self, id).await?.is_some())
    }

    async fn delete(&self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM departments WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

// ---------- leave requests ----------

#[async_trait]
impl LeaveStore for MySqlStore {
    async fn insert(&self, leave: &LeaveRequest) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO leave_requests
                (id, owner_id, leave_type, start_date, end_date, reason, status,
                 approver_id, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(leave.id.to_string())
        .bind(leave.owner_id.to_string())
        .bind(leave.leave_type.as_ref())
        .bind(leave.start_date)
        .bind(leave.end_date)
        .bind(&leave.reason)
        .bind(leave.status.as_ref())
        .bind(leave.approver_id.map(|id| id.to_string()))
        .bind(leave.created_at)
        .bind(leave.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<LeaveRequest>> {
        let sql = format!("SELECT {} FROM leave_requests WHERE id = ?", LEAVE_COLUMNS);
        sqlx::query_as::<_, LeaveRow>(&sql)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?
            .map(LeaveRequest::try_from)
            .transpose()
    }

    async fn list(&self, query: &LeaveQuery) -> StoreResult<Vec<LeaveRequest>> {
        let mut qb = QueryBuilder::<MySql>::new(format!(
            "SELECT {} FROM leave_requests WHERE 1=1",
            LEAVE_COLUMNS
        ));
        if let Some(owner_id) = query.owner_id {
            qb.push(" AND owner_id = ").push_bind(owner_id.to_string());
        }
        if let Some(status) = query.status {
            qb.push(" AND status = ").push_bind(status.as_ref().to_string());
        }
        qb.push(" ORDER BY created_at DESC");

        let rows = qb.build_query_as::<LeaveRow>().fetch_all(&self.pool).await?;
        convert_all(rows)
    }

    async fn transition(&self, id: Uuid, to: LeaveStatus, approver: Uuid) -> StoreResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE leave_requests
            SET status = ?, approver_id = ?, updated_at = ?
            WHERE id = ?
            AND status = 'Pending'
            "#,
        )
        .bind(to.as_ref())
        .bind(approver.to_string())
        .bind(Utc::now())
        .bind(id.to_string())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn delete_pending(&self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM leave_requests WHERE id = ? AND status = 'Pending'")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn stats(&self) -> StoreResult<LeaveStats> {
        let rows = sqlx::query_as::<_, (String, i64)>(
            "SELECT status, COUNT(*) FROM leave_requests GROUP BY status",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut stats = LeaveStats::default();
        for (status, count) in rows {
            stats.add(parse_enum::<LeaveStatus>(&status, "leave status")?, count as u64);
        }
        Ok(stats)
    }
}

// ---------- audit log ----------

#[async_trait]
impl AuditStore for MySqlStore {
    async fn append(&self, entry: &AuditLogEntry) -> StoreResult<()> {
        let metadata = entry
            .metadata
            .as_ref()
            .map(|m| m.to_string());
        sqlx::query(
            r#"
            INSERT INTO audit_logs (id, action, performed_by, metadata, timestamp)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(entry.id.to_string())
        .bind(&entry.action)
        .bind(entry.performed_by.to_string())
        .bind(metadata)
        .bind(entry.timestamp)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn query(&self, filter: &AuditFilter) -> StoreResult<Vec<AuditLogEntry>> {
        let mut qb = QueryBuilder::<MySql>::new(
            "SELECT id, action, performed_by, metadata, timestamp FROM audit_logs WHERE 1=1",
        );
        if let Some(action) = &filter.action {
            qb.push(" AND action = ").push_bind(action.clone());
        }
        if let Some(performed_by) = filter.performed_by {
            qb.push(" AND performed_by = ").push_bind(performed_by.to_string());
        }
        qb.push(" ORDER BY timestamp DESC LIMIT ")
            .push_bind(filter.limit as u64);

        let rows = qb.build_query_as::<AuditRow>().fetch_all(&self.pool).await?;
        convert_all(rows)
    }
}

// ---------- refresh tokens ----------

#[async_trait]
impl TokenStore for MySqlStore {
    async fn insert(&self, token: &RefreshToken) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO refresh_tokens (jti, user_id, expires_at, revoked)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(&token.jti)
        .bind(token.user_id.to_string())
        .bind(token.expires_at)
        .bind(token.revoked)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find(&self, jti: &str) -> StoreResult<Option<RefreshToken>> {
        let row = sqlx::query_as::<_, TokenRow>(
            "SELECT jti, user_id, expires_at, revoked FROM refresh_tokens WHERE jti = ?",
        )
        .bind(jti)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| {
            Ok(RefreshToken {
                jti: r.jti,
                user_id: parse_id(&r.user_id)?,
                expires_at: r.expires_at,
                revoked: r.revoked,
            })
        })
        .transpose()
    }

    async fn revoke(&self, jti: &str) -> StoreResult<bool> {
        let result =
            sqlx::query("UPDATE refresh_tokens SET revoked = TRUE WHERE jti = ? AND revoked = FALSE")
                .bind(jti)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected() == 1)
    }
}
