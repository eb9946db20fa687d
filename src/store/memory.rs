use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::error::StoreError;
use crate::model::audit_log::{AuditFilter, AuditLogEntry};
use crate::model::department::Department;
use crate::model::leave_request::{LeaveRequest, LeaveStats, LeaveStatus};
use crate::model::user::{User, UserChanges};
use crate::models::RefreshToken;
use crate::store::{
    AuditStore, DepartmentStore, LeaveQuery, LeaveStore, StoreResult, TokenStore, UserStore,
};

/// Process-local store. Records are kept in insertion order so "newest first"
/// is a reverse scan.
#[derive(Default)]
pub struct MemoryStore {
    users: RwLock<Vec<User>>,
    departments: RwLock<Vec<Department>>,
    leaves: RwLock<Vec<LeaveRequest>>,
    audit: RwLock<Vec<AuditLogEntry>>,
    tokens: RwLock<HashMap<String, RefreshToken>>,
    writes: AtomicU64,
}

fn read<T>(lock: &RwLock<T>) -> StoreResult<RwLockReadGuard<'_, T>> {
    lock.read()
        .map_err(|_| StoreError::Unavailable("memory store lock poisoned".into()))
}

fn write<T>(lock: &RwLock<T>) -> StoreResult<RwLockWriteGuard<'_, T>> {
    lock.write()
        .map_err(|_| StoreError::Unavailable("memory store lock poisoned".into()))
}

impl MemoryStore {
    /// Number of mutating calls that changed something.
    pub fn write_count(&self) -> u64 {
        self.writes.load(Ordering::SeqCst)
    }

    fn wrote(&self) {
        self.writes.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn insert(&self, user: &User) -> StoreResult<()> {
        let mut users = write(&self.users)?;
        if users.iter().any(|u| u.email == user.email) {
            return Err(StoreError::Duplicate(format!("email {}", user.email)));
        }
        users.push(user.clone());
        self.wrote();
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(read(&self.users)?.iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(read(&self.users)?
            .iter()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn find_many(&self, ids: &[Uuid]) -> StoreResult<Vec<User>> {
        Ok(read(&self.users)?
            .iter()
            .filter(|u| ids.contains(&u.id))
            .cloned()
            .collect())
    }

    async fn list(&self) -> StoreResult<Vec<User>> {
        Ok(read(&self.users)?.iter().rev().cloned().collect())
    }

    async fn list_by_department(&self, department_id: Uuid) -> StoreResult<Vec<User>> {
        Ok(read(&self.users)?
            .iter()
            .filter(|u| u.department_id == Some(department_id))
            .cloned()
            .collect())
    }

    async fn count_by_department(&self) -> StoreResult<Vec<(Uuid, u64)>> {
        let mut counts: HashMap<Uuid, u64> = HashMap::new();
        for department_id in read(&self.users)?.iter().filter_map(|u| u.department_id) {
            *counts.entry(department_id).or_default() += 1;
        }
        Ok(counts.into_iter().collect())
    }

    async fn count(&self) -> StoreResult<u64> {
        Ok(read(&self.users)?.len() as u64)
    }

    async fn all_emails(&self) -> StoreResult<Vec<String>> {
        Ok(read(&self.users)?.iter().map(|u| u.email.clone()).collect())
    }

    async fn update(&self, id: Uuid, changes: &UserChanges) -> StoreResult<bool> {
        let mut users = write(&self.users)?;
        if let Some(email) = &changes.email {
            if users.iter().any(|u| u.id != id && &u.email == email) {
                return Err(StoreError::Duplicate(format!("email {}", email)));
            }
        }
        let Some(user) = users.iter_mut().find(|u| u.id == id) else {
            return Ok(false);
        };
        changes.apply(user);
        user.updated_at = Utc::now();
        self.wrote();
        Ok(true)
    }

    async fn delete(&self, id: Uuid) -> StoreResult<bool> {
        let mut users = write(&self.users)?;
        let before = users.len();
        users.retain(|u| u.id != id);
        let removed = users.len() != before;
        if removed {
            self.wrote();
        }
        Ok(removed)
    }

    async fn clear_department(&self, department_id: Uuid) -> StoreResult<u64> {
        let mut users = write(&self.users)?;
        let mut cleared = 0;
        for user in users
            .iter_mut()
            .filter(|u| u.department_id == Some(department_id))
        {
            user.department_id = None;
            user.updated_at = Utc::now();
            cleared += 1;
        }
        if cleared > 0 {
            self.wrote();
        }
        Ok(cleared)
    }
}

#[async_trait]
impl DepartmentStore for MemoryStore {
    async fn insert(&self, department: &Department) -> StoreResult<()> {
        write(&self.departments)?.push(department.clone());
        self.wrote();
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Department>> {
        Ok(read(&self.departments)?
            .iter()
            .find(|d| d.id == id)
            .cloned())
    }

    async fn find_many(&self, ids: &[Uuid]) -> StoreResult<Vec<Department>> {
        Ok(read(&self.departments)?
            .iter()
            .filter(|d| ids.contains(&d.id))
            .cloned()
            .collect())
    }

    async fn list(&self) -> StoreResult<Vec<Department>> {
        Ok(read(&self.departments)?.iter().rev().cloned().collect())
    }

    async fn count(&self) -> StoreResult<u64> {
        Ok(read(&self.departments)?.len() as u64)
    }

    async fn update(
        &self,
        id: Uuid,
        name: Option<&str>,
        description: Option<&str>,
    ) -> StoreResult<bool> {
        let mut departments = write(&self.departments)?;
        let Some(department) = departments.iter_mut().find(|d| d.id == id) else {
            return Ok(false);
        };
        if let Some(name) = name {
            department.name = name.to_string();
        }
        if let Some(description) = description {
            department.description = description.to_string();
        }
        self.wrote();
        Ok(true)
    }

    async fn delete(&self, id: Uuid) -> StoreResult<bool> {
        let mut departments = write(&self.departments)?;
        let before = departments.len();
        departments.retain(|d| d.id != id);
        let removed = departments.len() != before;
        if removed {
            self.wrote();
        }
        Ok(removed)
    }
}

#[async_trait]
impl LeaveStore for MemoryStore {
    async fn insert(&self, leave: &LeaveRequest) -> StoreResult<()> {
        write(&self.leaves)?.push(leave.clone());
        self.wrote();
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<LeaveRequest>> {
        Ok(read(&self.leaves)?.iter().find(|l| l.id == id).cloned())
    }

    async fn list(&self, query: &LeaveQuery) -> StoreResult<Vec<LeaveRequest>> {
        Ok(read(&self.leaves)?
            .iter()
            .rev()
            .filter(|l| query.owner_id.map_or(true, |owner| l.owner_id == owner))
            .filter(|l| query.status.map_or(true, |status| l.status == status))
            .cloned()
            .collect())
    }

    async fn transition(&self, id: Uuid, to: LeaveStatus, approver: Uuid) -> StoreResult<bool> {
        let mut leaves = write(&self.leaves)?;
        match leaves
            .iter_mut()
            .find(|l| l.id == id && l.status == LeaveStatus::Pending)
        {
            Some(leave) => {
                leave.status = to;
                leave.approver_id = Some(approver);
                leave.updated_at = Utc::now();
                self.wrote();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_pending(&self, id: Uuid) -> StoreResult<bool> {
        let mut leaves = write(&self.leaves)?;
        let before = leaves.len();
        leaves.retain(|l| !(l.id == id && l.status == LeaveStatus::Pending));
        let removed = leaves.len() != before;
        if removed {
            self.wrote();
        }
        Ok(removed)
    }

    async fn stats(&self) -> StoreResult<LeaveStats> {
        let mut stats = LeaveStats::default();
        for leave in read(&self.leaves)?.iter() {
            stats.add(leave.status, 1);
        }
        Ok(stats)
    }
}

#[async_trait]
impl AuditStore for MemoryStore {
    async fn append(&self, entry: &AuditLogEntry) -> StoreResult<()> {
        write(&self.audit)?.push(entry.clone());
        self.wrote();
        Ok(())
    }

    async fn query(&self, filter: &AuditFilter) -> StoreResult<Vec<AuditLogEntry>> {
        Ok(read(&self.audit)?
            .iter()
            .rev()
            .filter(|e| filter.action.as_deref().map_or(true, |a| e.action == a))
            .filter(|e| filter.performed_by.map_or(true, |p| e.performed_by == p))
            .take(filter.limit)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl TokenStore for MemoryStore {
    async fn insert(&self, token: &RefreshToken) -> StoreResult<()> {
        write(&self.tokens)?.insert(token.jti.clone(), token.clone());
        self.wrote();
        Ok(())
    }

    async fn find(&self, jti: &str) -> StoreResult<Option<RefreshToken>> {
        Ok(read(&self.tokens)?.get(jti).cloned())
    }

    async fn revoke(&self, jti: &str) -> StoreResult<bool> {
        let mut tokens = write(&self.tokens)?;
        match tokens.get_mut(jti) {
            Some(token) if !token.revoked => {
                token.revoked = true;
                self.wrote();
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::leave_request::{LeaveType, NewLeave};
    use chrono::NaiveDate;

    fn leave(owner: Uuid) -> LeaveRequest {
        LeaveRequest::new(
            owner,
            NewLeave {
                leave_type: LeaveType::Annual,
                start_date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
                end_date: NaiveDate::from_ymd_opt(2024, 3, 5).unwrap(),
                reason: "trip".into(),
            },
        )
    }

    #[actix_web::test]
    async fn transition_only_applies_once() {
        let store = MemoryStore::default();
        let l = leave(Uuid::new_v4());
        LeaveStore::insert(&store, &l).await.unwrap();

        let hr = Uuid::new_v4();
        assert!(store.transition(l.id, LeaveStatus::Approved, hr).await.unwrap());
        assert!(!store.transition(l.id, LeaveStatus::Rejected, hr).await.unwrap());

        let stored = LeaveStore::find_by_id(&store, l.id).await.unwrap().unwrap();
        assert_eq!(stored.status, LeaveStatus::Approved);
        assert_eq!(stored.approver_id, Some(hr));
    }

    #[actix_web::test]
    async fn terminal_requests_are_not_deleted() {
        let store = MemoryStore::default();
        let l = leave(Uuid::new_v4());
        LeaveStore::insert(&store, &l).await.unwrap();
        store
            .transition(l.id, LeaveStatus::Rejected, Uuid::new_v4())
            .await
            .unwrap();

        assert!(!store.delete_pending(l.id).await.unwrap());
        assert!(LeaveStore::find_by_id(&store, l.id).await.unwrap().is_some());
    }

    #[actix_web::test]
    async fn list_is_newest_first_and_filtered() {
        let store = MemoryStore::default();
        let owner = Uuid::new_v4();
        let first = leave(owner);
        let second = leave(owner);
        let other = leave(Uuid::new_v4());
        for l in [&first, &second, &other] {
            LeaveStore::insert(&store, l).await.unwrap();
        }

        let mine = LeaveStore::list(
            &store,
            &LeaveQuery {
                owner_id: Some(owner),
                status: None,
            },
        )
        .await
        .unwrap();
        let ids: Vec<_> = mine.iter().map(|l| l.id).collect();
        assert_eq!(ids, vec![second.id, first.id]);
    }

    #[actix_web::test]
    async fn revoke_is_idempotent() {
        let store = MemoryStore::default();
        let token = RefreshToken {
            jti: "abc".into(),
            user_id: Uuid::new_v4(),
            expires_at: Utc::now(),
            revoked: false,
        };
        TokenStore::insert(&store, &token).await.unwrap();
        assert!(store.revoke("abc").await.unwrap());
        assert!(!store.revoke("abc").await.unwrap());
        assert!(!store.revoke("missing").await.unwrap());
    }
}
