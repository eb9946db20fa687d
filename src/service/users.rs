//! Account creation (self-registration and admin), admin edits and removal.

use std::collections::HashMap;

use chrono::Utc;
use serde::{Deserialize, Deserializer};
use serde_json::json;
use tracing::info;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::access::{Actor, Capability, authorize};
use crate::auth::password::{hash_password, validate_new_password};
use crate::error::{ServiceError, StoreError};
use crate::model::department::DepartmentRef;
use crate::model::role::Role;
use crate::model::user::{User, UserChanges, UserResponse, normalize_email};
use crate::service::audit::AuditRecorder;
use crate::store::Store;
use crate::utils::email_registry::EmailRegistry;

const NOT_FOUND: ServiceError = ServiceError::NotFound("User");

/// Distinguishes an absent field from an explicit `null`.
fn double_option<'de, D, T>(de: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(de).map(Some)
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateUser {
    #[schema(example = "Jane Doe")]
    pub name: String,
    #[schema(example = "jane@company.com")]
    pub email: String,
    #[schema(example = "secret123")]
    pub password: String,
    #[serde(default = "default_role")]
    pub role: Role,
    /// Department id; empty string means none
    pub department: Option<String>,
}

fn default_role() -> Role {
    Role::User
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateUser {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<Role>,
    /// `null` or empty string clears the department
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub department: Option<Option<String>>,
    pub password: Option<String>,
}

fn valid_name(name: &str) -> Result<String, ServiceError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ServiceError::validation("Name is required"));
    }
    Ok(name.to_string())
}

fn valid_email(email: &str) -> Result<String, ServiceError> {
    let email = normalize_email(email);
    let well_formed = email
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && !domain.is_empty())
        && !email.contains(char::is_whitespace);
    if !well_formed {
        return Err(ServiceError::validation("A valid email is required"));
    }
    Ok(email)
}

/// `""` and absent mean no department; anything else must name a stored one.
async fn resolve_department(store: &Store, raw: Option<&str>) -> Result<Option<Uuid>, ServiceError> {
    let Some(raw) = raw.map(str::trim).filter(|r| !r.is_empty()) else {
        return Ok(None);
    };
    let id = Uuid::parse_str(raw)
        .map_err(|_| ServiceError::validation("Invalid department id"))?;
    if store.departments.find_by_id(id).await?.is_none() {
        return Err(ServiceError::NotFound("Department"));
    }
    Ok(Some(id))
}

async fn ensure_email_available(
    store: &Store,
    emails: &EmailRegistry,
    email: &str,
) -> Result<(), ServiceError> {
    if !emails.is_available(email, store.users.as_ref()).await? {
        return Err(ServiceError::Conflict("Email already registered".into()));
    }
    Ok(())
}

fn email_conflict(e: StoreError) -> ServiceError {
    match e {
        StoreError::Duplicate(_) => ServiceError::Conflict("Email already registered".into()),
        other => other.into(),
    }
}

async fn insert_user(
    store: &Store,
    emails: &EmailRegistry,
    name: &str,
    email: &str,
    password: &str,
    role: Role,
    department: Option<&str>,
) -> Result<User, ServiceError> {
    let name = valid_name(name)?;
    let email = valid_email(email)?;
    validate_new_password(password)?;
    ensure_email_available(store, emails, &email).await?;
    let department_id = resolve_department(store, department).await?;

    let now = Utc::now();
    let user = User {
        id: Uuid::new_v4(),
        name,
        email,
        password_hash: hash_password(password)?,
        role,
        department_id,
        created_at: now,
        updated_at: now,
    };
    store.users.insert(&user).await.map_err(email_conflict)?;
    emails.register(&user.email).await;

    Ok(user)
}

async fn department_refs(
    store: &Store,
    users: &[User],
) -> Result<HashMap<Uuid, DepartmentRef>, ServiceError> {
    let mut ids: Vec<Uuid> = users.iter().filter_map(|u| u.department_id).collect();
    ids.sort();
    ids.dedup();
    Ok(store
        .departments
        .find_many(&ids)
        .await?
        .iter()
        .map(|d| (d.id, DepartmentRef::from(d)))
        .collect())
}

async fn respond(store: &Store, user: &User) -> Result<UserResponse, ServiceError> {
    let departments = department_refs(store, std::slice::from_ref(user)).await?;
    let department = user.department_id.and_then(|d| departments.get(&d).cloned());
    Ok(UserResponse::new(user, department))
}

/// Public self-registration. Always creates a plain `User`.
pub async fn register(
    store: &Store,
    audit: &AuditRecorder,
    emails: &EmailRegistry,
    name: &str,
    email: &str,
    password: &str,
) -> Result<UserResponse, ServiceError> {
    let user = insert_user(store, emails, name, email, password, Role::User, None).await?;

    info!(user_id = %user.id, "User registered");
    audit
        .record("user.registered", user.id, Some(json!({ "email": user.email })))
        .await;

    respond(store, &user).await
}

pub async fn list(store: &Store, actor: &Actor) -> Result<Vec<UserResponse>, ServiceError> {
    authorize(actor, Capability::ManageUsers)?;

    let users = store.users.list().await?;
    let departments = department_refs(store, &users).await?;
    Ok(users
        .iter()
        .map(|u| {
            let department = u.department_id.and_then(|d| departments.get(&d).cloned());
            UserResponse::new(u, department)
        })
        .collect())
}

pub async fn create(
    store: &Store,
    audit: &AuditRecorder,
    emails: &EmailRegistry,
    actor: &Actor,
    input: CreateUser,
) -> Result<UserResponse, ServiceError> {
    authorize(actor, Capability::ManageUsers)?;

    let user = insert_user(
        store,
        emails,
        &input.name,
        &input.email,
        &input.password,
        input.role,
        input.department.as_deref(),
    )
    .await?;

    info!(user_id = %user.id, created_by = %actor.id, "User created");
    audit
        .record(
            "user.created",
            actor.id,
            Some(json!({ "userId": user.id, "email": user.email, "role": user.role })),
        )
        .await;

    respond(store, &user).await
}

pub async fn update(
    store: &Store,
    audit: &AuditRecorder,
    emails: &EmailRegistry,
    actor: &Actor,
    id: Uuid,
    input: UpdateUser,
) -> Result<UserResponse, ServiceError> {
    authorize(actor, Capability::ManageUsers)?;

    let mut user = store.users.find_by_id(id).await?.ok_or(NOT_FOUND)?;
    let mut changes = UserChanges::default();

    if let Some(name) = input.name.as_deref() {
        let name = valid_name(name)?;
        if name != user.name {
            changes.name = Some(name);
        }
    }
    if let Some(email) = input.email.as_deref() {
        let email = valid_email(email)?;
        if email != user.email {
            ensure_email_available(store, emails, &email).await?;
            changes.email = Some(email);
        }
    }
    if let Some(role) = input.role.filter(|r| *r != user.role) {
        changes.role = Some(role);
    }
    if let Some(department) = &input.department {
        let department_id = resolve_department(store, department.as_deref()).await?;
        if department_id != user.department_id {
            changes.department_id = Some(department_id);
        }
    }
    if let Some(password) = input.password.as_deref().filter(|p| !p.is_empty()) {
        validate_new_password(password)?;
        changes.password_hash = Some(hash_password(password)?);
    }

    if changes.is_empty() {
        return Err(ServiceError::NoOp);
    }

    if !store.users.update(id, &changes).await.map_err(email_conflict)? {
        return Err(NOT_FOUND);
    }
    if let Some(email) = &changes.email {
        emails.release(&user.email).await;
        emails.register(email).await;
    }
    changes.apply(&mut user);

    info!(user_id = %id, updated_by = %actor.id, "User updated");
    audit
        .record(
            "user.updated",
            actor.id,
            Some(json!({ "userId": id, "fields": changes.field_names() })),
        )
        .await;

    respond(store, &user).await
}

/// Removes an account. Its leave requests stay, with the owner unresolved.
pub async fn delete(
    store: &Store,
    audit: &AuditRecorder,
    emails: &EmailRegistry,
    actor: &Actor,
    id: Uuid,
) -> Result<(), ServiceError> {
    authorize(actor, Capability::ManageUsers)?;

    if id == actor.id {
        return Err(ServiceError::validation("You cannot delete your own account"));
    }
    let user = store.users.find_by_id(id).await?.ok_or(NOT_FOUND)?;
    if !store.users.delete(id).await? {
        return Err(NOT_FOUND);
    }
    emails.release(&user.email).await;

    info!(user_id = %id, deleted_by = %actor.id, "User deleted");
    audit
        .record(
            "user.deleted",
            actor.id,
            Some(json!({ "userId": id, "email": user.email })),
        )
        .await;

    Ok(())
}

/// Seeds a SuperAdmin account unless the email is already registered.
pub async fn ensure_superadmin(
    store: &Store,
    emails: &EmailRegistry,
    email: &str,
    password: &str,
) -> Result<bool, ServiceError> {
    let normalized = valid_email(email)?;
    if store.users.find_by_email(&normalized).await?.is_some() {
        return Ok(false);
    }
    let user = insert_user(
        store,
        emails,
        "Super Admin",
        &normalized,
        password,
        Role::SuperAdmin,
        None,
    )
    .await?;
    info!(user_id = %user.id, "Bootstrap SuperAdmin created");
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_shape() {
        assert_eq!(valid_email("  Jane@Company.COM ").unwrap(), "jane@company.com");
        assert!(valid_email("jane").is_err());
        assert!(valid_email("@company.com").is_err());
        assert!(valid_email("ja ne@company.com").is_err());
    }

    #[test]
    fn explicit_null_department_is_distinct_from_absent() {
        let absent: UpdateUser = serde_json::from_str("{}").unwrap();
        assert!(absent.department.is_none());

        let cleared: UpdateUser = serde_json::from_str(r#"{"department": null}"#).unwrap();
        assert_eq!(cleared.department, Some(None));
    }
}
