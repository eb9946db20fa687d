//! Persistence seams. Each entity has its own trait so services depend only on
//! what they touch; [`Store`] bundles one implementation of each.

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::MySqlPool;
use uuid::Uuid;

use crate::error::StoreError;
use crate::model::audit_log::{AuditFilter, AuditLogEntry};
use crate::model::department::Department;
use crate::model::leave_request::{LeaveRequest, LeaveStats, LeaveStatus};
use crate::model::user::{User, UserChanges};
use crate::models::RefreshToken;

pub mod memory;
pub mod mysql;

pub use memory::MemoryStore;
pub use mysql::MySqlStore;

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn insert(&self, user: &User) -> StoreResult<()>;
    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<User>>;
    /// `email` must already be normalized.
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>>;
    async fn find_many(&self, ids: &[Uuid]) -> StoreResult<Vec<User>>;
    async fn list(&self) -> StoreResult<Vec<User>>;
    async fn list_by_department(&self, department_id: Uuid) -> StoreResult<Vec<User>>;
    async fn count_by_department(&self) -> StoreResult<Vec<(Uuid, u64)>>;
    async fn count(&self) -> StoreResult<u64>;
    async fn all_emails(&self) -> StoreResult<Vec<String>>;
    /// Applies every change in one write. Returns false when the user is absent.
    async fn update(&self, id: Uuid, changes: &UserChanges) -> StoreResult<bool>;
    async fn delete(&self, id: Uuid) -> StoreResult<bool>;
    async fn clear_department(&self, department_id: Uuid) -> StoreResult<u64>;
}

#[async_trait]
pub trait DepartmentStore: Send + Sync {
    async fn insert(&self, department: &Department) -> StoreResult<()>;
    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Department>>;
    async fn find_many(&self, ids: &[Uuid]) -> StoreResult<Vec<Department>>;
    async fn list(&self) -> StoreResult<Vec<Department>>;
    async fn count(&self) -> StoreResult<u64>;
    async fn update(
        &self,
        id: Uuid,
        name: Option<&str>,
        description: Option<&str>,
    ) -> StoreResult<bool>;
    async fn delete(&self, id: Uuid) -> StoreResult<bool>;
}

#[derive(Debug, Clone, Default)]
pub struct LeaveQuery {
    pub owner_id: Option<Uuid>,
    pub status: Option<LeaveStatus>,
}

#[async_trait]
pub trait LeaveStore: Send + Sync {
    async fn insert(&self, leave: &LeaveRequest) -> StoreResult<()>;
    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<LeaveRequest>>;
    /// Newest first.
    async fn list(&self, query: &LeaveQuery) -> StoreResult<Vec<LeaveRequest>>;
    /// Conditional write: only succeeds while the request is still `Pending`.
    async fn transition(&self, id: Uuid, to: LeaveStatus, approver: Uuid) -> StoreResult<bool>;
    /// Conditional delete: only succeeds while the request is still `Pending`.
    async fn delete_pending(&self, id: Uuid) -> StoreResult<bool>;
    async fn stats(&self) -> StoreResult<LeaveStats>;
}

#[async_trait]
pub trait AuditStore: Send + Sync {
    async fn append(&self, entry: &AuditLogEntry) -> StoreResult<()>;
    /// Newest first, at most `filter.limit` entries.
    async fn query(&self, filter: &AuditFilter) -> StoreResult<Vec<AuditLogEntry>>;
}

#[async_trait]
pub trait TokenStore: Send + Sync {
    async fn insert(&self, token: &RefreshToken) -> StoreResult<()>;
    async fn find(&self, jti: &str) -> StoreResult<Option<RefreshToken>>;
    /// Idempotent. Returns true when a live token was revoked by this call.
    async fn revoke(&self, jti: &str) -> StoreResult<bool>;
}

#[derive(Clone)]
pub struct Store {
    pub users: Arc<dyn UserStore>,
    pub departments: Arc<dyn DepartmentStore>,
    pub leaves: Arc<dyn LeaveStore>,
    pub audit: Arc<dyn AuditStore>,
    pub tokens: Arc<dyn TokenStore>,
}

impl Store {
    pub fn from_backend<B>(backend: Arc<B>) -> Self
    where
        B: UserStore + DepartmentStore + LeaveStore + AuditStore + TokenStore + 'static,
    {
        Self {
            users: backend.clone(),
            departments: backend.clone(),
            leaves: backend.clone(),
            audit: backend.clone(),
            tokens: backend,
        }
    }

    pub fn memory() -> Self {
        Self::from_backend(Arc::new(MemoryStore::default()))
    }

    pub fn mysql(pool: MySqlPool) -> Self {
        Self::from_backend(Arc::new(MySqlStore::new(pool)))
    }
}
