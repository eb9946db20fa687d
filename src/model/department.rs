use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::model::role::Role;

#[derive(Debug, Clone)]
pub struct Department {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DepartmentRef {
    #[schema(value_type = String)]
    pub id: Uuid,
    #[schema(example = "Engineering")]
    pub name: String,
}

impl From<&Department> for DepartmentRef {
    fn from(department: &Department) -> Self {
        Self {
            id: department.id,
            name: department.name.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentSummary {
    #[schema(value_type = String)]
    pub id: Uuid,
    #[schema(example = "Engineering")]
    pub name: String,
    #[schema(example = "Product and platform teams")]
    pub description: String,
    #[schema(example = 12)]
    pub member_count: u64,
    #[schema(example = "2026-01-01T00:00:00Z", format = "date-time", value_type = String)]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DepartmentMember {
    #[schema(value_type = String)]
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentDetail {
    #[schema(value_type = String)]
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub members: Vec<DepartmentMember>,
    #[schema(format = "date-time", value_type = String)]
    pub created_at: DateTime<Utc>,
}
