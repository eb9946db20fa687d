use std::collections::HashMap;

use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use tracing::info;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::access::{Actor, Capability, authorize};
use crate::error::ServiceError;
use crate::model::department::{
    Department, DepartmentDetail, DepartmentMember, DepartmentSummary,
};
use crate::service::audit::AuditRecorder;
use crate::store::Store;

const NOT_FOUND: ServiceError = ServiceError::NotFound("Department");

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateDepartment {
    #[schema(example = "Engineering")]
    pub name: String,
    #[serde(default)]
    #[schema(example = "Product and platform teams")]
    pub description: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateDepartment {
    pub name: Option<String>,
    pub description: Option<String>,
}

fn valid_name(name: &str) -> Result<String, ServiceError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ServiceError::validation("Department name is required"));
    }
    Ok(name.to_string())
}

pub async fn list(store: &Store) -> Result<Vec<DepartmentSummary>, ServiceError> {
    let departments = store.departments.list().await?;
    let counts: HashMap<Uuid, u64> = store.users.count_by_department().await?.into_iter().collect();

    Ok(departments
        .into_iter()
        .map(|d| DepartmentSummary {
            member_count: counts.get(&d.id).copied().unwrap_or(0),
            id: d.id,
            name: d.name,
            description: d.description,
            created_at: d.created_at,
        })
        .collect())
}

pub async fn get(store: &Store, id: Uuid) -> Result<DepartmentDetail, ServiceError> {
    let department = store.departments.find_by_id(id).await?.ok_or(NOT_FOUND)?;
    let members = store
        .users
        .list_by_department(id)
        .await?
        .into_iter()
        .map(|u| DepartmentMember {
            id: u.id,
            name: u.name,
            email: u.email,
            role: u.role,
        })
        .collect();

    Ok(DepartmentDetail {
        id: department.id,
        name: department.name,
        description: department.description,
        members,
        created_at: department.created_at,
    })
}

pub async fn create(
    store: &Store,
    audit: &AuditRecorder,
    actor: &Actor,
    input: CreateDepartment,
) -> Result<DepartmentSummary, ServiceError> {
    authorize(actor, Capability::ManageDepartments)?;

    let department = Department {
        id: Uuid::new_v4(),
        name: valid_name(&input.name)?,
        description: input.description.unwrap_or_default().trim().to_string(),
        created_at: Utc::now(),
    };
    store.departments.insert(&department).await?;

    info!(department_id = %department.id, "Department created");
    audit
        .record(
            "department.created",
            actor.id,
            Some(json!({ "departmentId": department.id, "name": department.name })),
        )
        .await;

    Ok(DepartmentSummary {
        id: department.id,
        name: department.name,
        description: department.description,
        member_count: 0,
        created_at: department.created_at,
    })
}

pub async fn update(
    store: &Store,
    audit: &AuditRecorder,
    actor: &Actor,
    id: Uuid,
    input: UpdateDepartment,
) -> Result<DepartmentDetail, ServiceError> {
    authorize(actor, Capability::ManageDepartments)?;

    let current = store.departments.find_by_id(id).await?.ok_or(NOT_FOUND)?;

    let name = match input.name.as_deref() {
        Some(name) => Some(valid_name(name)?).filter(|n| *n != current.name),
        None => None,
    };
    let description = input
        .description
        .as_deref()
        .map(str::trim)
        .filter(|d| *d != current.description);

    if name.is_none() && description.is_none() {
        return Err(ServiceError::NoOp);
    }
    if !store
        .departments
        .update(id, name.as_deref(), description)
        .await?
    {
        return Err(NOT_FOUND);
    }

    info!(department_id = %id, "Department updated");
    audit
        .record(
            "department.updated",
            actor.id,
            Some(json!({ "departmentId": id, "name": name, "description": description })),
        )
        .await;

    get(store, id).await
}

/// Deletes the department and detaches its members.
pub async fn delete(
    store: &Store,
    audit: &AuditRecorder,
    actor: &Actor,
    id: Uuid,
) -> Result<(), ServiceError> {
    authorize(actor, Capability::ManageDepartments)?;

    let department = store.departments.find_by_id(id).await?.ok_or(NOT_FOUND)?;
    let detached = store.users.clear_department(id).await?;
    if !store.departments.delete(id).await? {
        return Err(NOT_FOUND);
    }

    info!(department_id = %id, detached, "Department deleted");
    audit
        .record(
            "department.deleted",
            actor.id,
            Some(json!({ "departmentId": id, "name": department.name, "detachedMembers": detached })),
        )
        .await;

    Ok(())
}
